//! Time-ordered and composite stream operators (spec.md §4.3). None of these are
//! fusion-eligible `Op` tags — each one crosses a `nagare_core::stream::Segment` boundary and
//! drives its parent to an async stream, matching the "independent stream over an internal
//! queue" shape the spec describes. In this single-threaded-cooperative scheduling model
//! (spec.md §5), the "background producer task" is simply the other branch of whatever
//! `tokio::select!` drives the operator — no task is actually spawned.

pub mod buffer;
pub mod buffer_time;
pub mod combine;
pub mod concat_map;
pub mod debounce;
pub mod distinct;
pub mod merge;
pub mod pairwise;
pub mod retry;
pub mod start_with;
pub mod switch_map;
pub mod throttle;

pub use buffer::{buffer, BufferExt};
pub use buffer_time::{buffer_time, BufferTimeExt};
pub use combine::{combine_latest, zip};
pub use concat_map::{concat_map, ConcatMapExt};
pub use debounce::{debounce, DebounceExt};
pub use distinct::{distinct_until_changed, DistinctUntilChangedExt};
pub use merge::merge;
pub use pairwise::{pairwise, PairwiseExt};
pub use retry::{retry, RetryExt};
pub use start_with::{start_with, StartWithExt};
pub use switch_map::{switch_map, SwitchMapExt};
pub use throttle::{throttle, ThrottleExt};
