//! The `Stream<T>` data model (spec.md §3) and chain flattening (spec.md §4.1).
//!
//! A stream is consumed at most once. `ops` holds only the operators added *at this
//! level*; ancestors are reached through `source`. [`Stream::flatten`] walks that chain at
//! finalizer entry and never walks it twice (see `DESIGN.md`, "Nested parent/child
//! streams").

use crate::error::{NagareError, Result};
use crate::op::{ErrorPolicy, Op, StepOutcome};
use futures::Stream as FuturesStream;
use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;

/// A dense numeric batch with an element stride, e.g. interleaved multi-channel samples.
/// `stride == 1` is the common case and is what the array-kernel fast path (fusion::kernel)
/// specializes for; `stride > 1` falls back to generic iteration.
#[derive(Debug, Clone)]
pub struct TypedBatch<T> {
    pub data: Vec<T>,
    pub stride: usize,
}

impl<T> TypedBatch<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { data, stride: 1 }
    }

    pub fn with_stride(data: Vec<T>, stride: usize) -> Self {
        assert!(stride > 0, "stride must be positive");
        Self { data, stride }
    }
}

pub type FallibleIter<T> = Box<dyn Iterator<Item = Result<T>> + Send>;
pub type FallibleAsyncStream<T> = Pin<Box<dyn FuturesStream<Item = Result<T>> + Send>>;

/// One of the six base-source shapes a stream may rest on.
pub enum Source<T> {
    Array(Vec<T>),
    TypedBatch(TypedBatch<T>),
    SyncIter(FallibleIter<T>),
    AsyncIter(FallibleAsyncStream<T>),
    /// A transport-backed byte stream, already decoded to `T` by a pluggable frame codec
    /// upstream of the core (see `nagare-frame`). Kept as a distinct tag from `AsyncIter`
    /// for data-model fidelity even though the core treats both identically.
    Bytes(FallibleAsyncStream<T>),
    /// A type-changing boundary: the output of a fully-finalized parent pipeline over some
    /// other item type `U`, post-mapped into `T`. See [`Boundary`].
    Parent(Box<dyn Segment<T>>),
}

/// The materialized output of running a parent pipeline segment: either a synchronous
/// iterator (when the parent never needed to suspend) or an async stream.
pub enum SegmentOutput<T> {
    Sync(FallibleIter<T>),
    Async(FallibleAsyncStream<T>),
}

/// Implemented by pipeline-segment boundaries created by type-changing operators
/// (`map_into`, `pairwise`, `distinct_until_changed`, ...). Running a boundary finalizes
/// and executes its parent pipeline, then applies the boundary's own transform.
pub trait Segment<T>: Send {
    fn run(self: Box<Self>) -> SegmentOutput<T>;
}

/// A stream's public, per-level state: its base source, its own newly-added operators, and
/// its error-handling policy. Chaining transfers ownership of `self` to the child —
/// `Stream` carries no `Clone` impl, enforcing single-consumption at the type level.
pub struct Stream<T> {
    pub(crate) source: Source<T>,
    pub(crate) ops: Vec<Op<T>>,
    pub(crate) policy: ErrorPolicy<T>,
}

impl<T> std::fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}

/// The result of flattening a chain: a single base source, the concatenated operator list
/// (inner-most ancestor first), and the outer-most policy governing the whole pipeline.
pub struct Pipeline<T> {
    pub source: Source<T>,
    pub ops: Vec<Op<T>>,
    pub policy: ErrorPolicy<T>,
}

impl<T> Stream<T> {
    pub fn from_source(source: Source<T>) -> Self {
        Self {
            source,
            ops: Vec::new(),
            policy: ErrorPolicy::default(),
        }
    }

    /// Walk `source` links until a non-`Parent` base is reached, concatenating each level's
    /// `ops` inner (ancestor) to outer (this stream). The outer-most policy wins per
    /// spec.md §4.1: "the outer-most policy governs the whole flattened pipeline."
    ///
    /// `Source::Parent` boundaries are *not* walked through here — they are opaque type
    /// boundaries that get executed independently when the returned pipeline runs. Only
    /// same-type ancestors chained through repeated `.map()`/`.filter()`/etc. calls are
    /// flattened into one operator list.
    pub fn flatten(self) -> Pipeline<T> {
        Pipeline {
            source: self.source,
            ops: self.ops,
            policy: self.policy,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Stream<T> {
    pub fn from_array(items: Vec<T>) -> Self {
        Self::from_source(Source::Array(items))
    }

    pub fn from_typed_batch(batch: TypedBatch<T>) -> Self {
        Self::from_source(Source::TypedBatch(batch))
    }

    pub fn from_sync_iter(iter: impl Iterator<Item = T> + Send + 'static) -> Self {
        Self::from_source(Source::SyncIter(Box::new(iter.map(Ok))))
    }

    pub fn from_fallible_sync_iter(iter: impl Iterator<Item = Result<T>> + Send + 'static) -> Self {
        Self::from_source(Source::SyncIter(Box::new(iter)))
    }

    pub fn from_async_stream(stream: impl FuturesStream<Item = T> + Send + 'static) -> Self {
        use futures::StreamExt;
        Self::from_source(Source::AsyncIter(Box::pin(stream.map(Ok))))
    }

    pub fn from_bytes_stream(stream: impl FuturesStream<Item = Result<T>> + Send + 'static) -> Self {
        Self::from_source(Source::Bytes(Box::pin(stream)))
    }

    /// Fusion-eligible endofunction map: `T -> T`. Pushes an `Op::Map` tag onto this
    /// stream's own operator list without crossing a pipeline segment boundary, so the
    /// fusion compiler can inline it alongside sibling `filter`/`scan`/`take`/`skip` calls.
    pub fn map(mut self, f: impl Fn(T) -> T + Send + Sync + 'static) -> Self {
        self.ops.push(Op::Map(Arc::new(move |v| StepOutcome::Value(f(v)))));
        self
    }

    /// Like [`map`](Self::map), but `f` may itself be asynchronous; wrap the future by
    /// returning `StepOutcome::Async` directly for full control, or use this helper when
    /// `f` always produces a future.
    pub fn map_async<Fut>(mut self, f: impl Fn(T) -> Fut + Send + Sync + 'static) -> Self
    where
        Fut: std::future::Future<Output = T> + Send + 'static,
    {
        self.ops.push(Op::Map(Arc::new(move |v| {
            let fut = f(v);
            StepOutcome::Async(Box::pin(async move { Ok(Some(fut.await)) }))
        })));
        self
    }

    /// Like [`map`](Self::map), but `f` may raise an `OperatorFault` instead of always
    /// producing a value; the pipeline's `ErrorPolicy` decides what happens next.
    pub fn try_map(mut self, f: impl Fn(T) -> Result<T> + Send + Sync + 'static) -> Self {
        self.ops.push(Op::Map(Arc::new(move |v| match f(v) {
            Ok(v) => StepOutcome::Value(v),
            Err(e) => StepOutcome::Fault(e),
        })));
        self
    }

    pub fn filter(mut self, pred: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        use crate::op::FilterOutcome;
        self.ops.push(Op::Filter(Arc::new(move |v| {
            if pred(v) {
                FilterOutcome::Keep
            } else {
                FilterOutcome::Drop
            }
        })));
        self
    }

    /// `scan(seed, f)` emits `f(seed, x1)`, then `f(.., x2)`, ... — the seed itself is never
    /// emitted (spec.md §4.2's determinism table, "Scan").
    pub fn scan(mut self, seed: T, f: impl Fn(T, T) -> T + Send + Sync + 'static) -> Self {
        self.ops.push(Op::Scan {
            seed,
            f: Arc::new(move |acc, x| StepOutcome::Value(f(acc, x))),
        });
        self
    }

    pub fn try_scan(mut self, seed: T, f: impl Fn(T, T) -> Result<T> + Send + Sync + 'static) -> Self {
        self.ops.push(Op::Scan {
            seed,
            f: Arc::new(move |acc, x| match f(acc, x) {
                Ok(v) => StepOutcome::Value(v),
                Err(e) => StepOutcome::Fault(e),
            }),
        });
        self
    }

    pub fn take(mut self, n: u64) -> Self {
        self.ops.push(Op::Take(n));
        self
    }

    pub fn skip(mut self, n: u64) -> Self {
        self.ops.push(Op::Skip(n));
        self
    }

    /// Delegates to an external numeric kernel (spec.md §4.6). Per spec, "if the
    /// implementation cannot provide a kernel, `mapWasm` MUST fail with a recoverable error
    /// at pipeline construction" — so this checks the registry eagerly rather than waiting
    /// for the first poll. The actual kernel implementations live in `nagare-kernel`, which
    /// registers into this crate's registry at startup; this crate only owns the contract.
    pub fn wasm(mut self, kernel: impl Into<String>, params: BTreeMap<String, f64>) -> Result<Self> {
        let kernel = kernel.into();
        if !crate::kernel_registry::is_registered(&kernel) {
            return Err(NagareError::KernelFault(format!("kernel '{kernel}' not registered")));
        }
        self.ops.push(Op::Wasm { kernel, params });
        Ok(self)
    }

    /// Escape hatch for a transform the fusion compiler cannot specialize (still
    /// endofunction-typed). Always runs through the guarded per-item path (Variant A).
    pub fn opaque(mut self, f: impl Fn(T) -> T + Send + Sync + 'static) -> Self {
        self.ops.push(Op::Opaque(Arc::new(move |v| StepOutcome::Value(f(v)))));
        self
    }

    /// Attaches a recovery handler with no added operator. Per spec.md §4.1, type-changing
    /// operators do not propagate a parent's rescue — only operators added *after* this
    /// call (at or above it) are covered.
    pub fn rescue(mut self, handler: impl Fn(&NagareError) -> Option<T> + Send + Sync + 'static) -> Self {
        self.policy = ErrorPolicy::Rescue(Arc::new(handler));
        self
    }

    pub fn terminate_on_error_mode(mut self) -> Self {
        self.policy = ErrorPolicy::Terminate;
        self
    }

    pub fn propagate_on_error_mode(mut self) -> Self {
        self.policy = ErrorPolicy::Propagate;
        self
    }

    /// Type-changing transform: always crosses a pipeline-segment boundary. The parent
    /// pipeline (everything built so far) is finalized and driven to completion, then each
    /// resulting `T` is mapped to `U`. Per spec.md §4.1, the parent's `rescue` does not
    /// carry forward across this boundary — only errors raised by `f` itself are subject to
    /// the *new* stream's (default `Drop`) policy.
    pub fn map_into<U: Clone + Send + Sync + 'static>(
        self,
        f: impl Fn(T) -> U + Send + Sync + 'static,
    ) -> Stream<U> {
        Stream::from_source(Source::Parent(Box::new(Boundary {
            parent: self,
            f: Arc::new(f),
        })))
    }
}

/// A type-changing pipeline-segment boundary: runs `parent` to completion, then maps each
/// item through `f`. See [`Stream::map_into`] and `SPEC_FULL.md` §12.4.
pub struct Boundary<U, T> {
    pub(crate) parent: Stream<U>,
    pub(crate) f: Arc<dyn Fn(U) -> T + Send + Sync>,
}

impl<U, T> Segment<T> for Boundary<U, T>
where
    U: Clone + Send + Sync + 'static,
    T: Send + 'static,
{
    fn run(self: Box<Self>) -> SegmentOutput<T> {
        use futures::StreamExt;
        let Boundary { parent, f } = *self;
        match crate::exec::run_to_segment(parent) {
            SegmentOutput::Sync(it) => {
                SegmentOutput::Sync(Box::new(it.map(move |r| r.map(|u| f(u)))))
            }
            SegmentOutput::Async(st) => {
                SegmentOutput::Async(Box::pin(st.map(move |r| r.map(|u| f(u)))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_ops_at_this_level_only() {
        let parent = Stream::from_array(vec![1, 2, 3]).map(|x| x + 1);
        let child = parent.filter(|x| *x > 1);
        // flatten on the child must see both ops, inner (map) before outer (filter)
        let pipeline = child.flatten();
        assert_eq!(pipeline.ops.len(), 2);
        assert!(matches!(pipeline.ops[0], Op::Map(_)));
        assert!(matches!(pipeline.ops[1], Op::Filter(_)));
    }

    #[test]
    fn wasm_fails_at_construction_when_kernel_unregistered() {
        let err = Stream::from_array(vec![1.0_f64])
            .wasm("definitely-not-registered", BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, NagareError::KernelFault(_)));
    }

    #[test]
    fn map_into_creates_a_parent_boundary() {
        let s = Stream::from_array(vec![1, 2, 3]).map_into(|x: i64| x.to_string());
        let pipeline = s.flatten();
        assert!(pipeline.ops.is_empty());
        assert!(matches!(pipeline.source, Source::Parent(_)));
    }
}
