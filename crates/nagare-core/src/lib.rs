//! `nagare-core`: the lazy `Stream<T>` abstraction, the operator tag model, the
//! operator-fusion compiler, and the execution dispatch that ties them together.
//!
//! This crate has no opinion on *what* a pipeline does — only on how one is represented,
//! fused, and driven. Concrete operator libraries (`nagare-ops`, `nagare-windowed`) and the
//! public builder surface (`nagare`) are built on top of it.

pub mod config;
pub mod error;
pub mod exec;
pub mod finalizers;
pub mod fusion;
pub mod kernel_registry;
pub mod op;
pub mod stream;

pub use error::{NagareError, Result};
pub use op::{ErrorPolicy, FilterOutcome, Op, OpKind, OpState, StepOutcome};
pub use stream::{Source, Stream, TypedBatch};
