//! Credit-based and adaptive-rate backpressure primitives (spec.md §4.5). Independent of
//! `nagare-core`: these are plain, reusable concurrency primitives a transport layer wires
//! up around a stream, not operators in the fusion sense.

pub mod adaptive;
pub mod credit;
pub mod dynamic;
pub mod error;
pub mod rate_limiter;

pub use adaptive::AdaptiveBackpressure;
pub use credit::{CreditController, MultiStreamCreditManager};
pub use dynamic::{DynamicBackpressure, Metrics};
pub use error::{BackpressureError, Result};
pub use rate_limiter::WindowedRateLimiter;
