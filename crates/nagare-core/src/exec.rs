//! Execution dispatch (spec.md §4.2): picks a fusion variant for a flattened pipeline and
//! drives it to a [`SegmentOutput`], switching from synchronous to asynchronous driving the
//! moment (and only if) a stage actually produces an async outcome.
//!
//! Every finalizer and every type-changing [`crate::stream::Boundary`] goes through
//! [`run_to_segment`] — there is exactly one execution path in this crate.

use crate::error::{NagareError, Result};
use crate::op::{self, BoxFuture, ErrorPolicy, Op, OpState};
use crate::stream::{FallibleIter, Pipeline, Source, Stream};
use crate::{config, fusion};
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;

pub use crate::stream::SegmentOutput;

pub fn run_to_segment<T: Clone + Send + Sync + 'static>(stream: Stream<T>) -> SegmentOutput<T> {
    let Pipeline { source, ops, policy } = stream.flatten();
    run_pipeline(source, ops, policy)
}

fn run_pipeline<T: Clone + Send + Sync + 'static>(
    source: Source<T>,
    ops: Vec<Op<T>>,
    policy: ErrorPolicy<T>,
) -> SegmentOutput<T> {
    if ops.is_empty() {
        return source_to_segment(source);
    }

    let array_fast_path = config::fusion_enabled() && fusion::array_kernel_eligible(&ops);

    match source {
        Source::Array(items) if array_fast_path && items.len() >= config::unroll_threshold() => {
            tracing::debug!(len = items.len(), "dispatching to array kernel (Variant C)");
            run_array_source(items, ops, policy)
        }
        Source::TypedBatch(batch) if batch.stride == 1 && array_fast_path && batch.data.len() >= config::unroll_threshold() => {
            tracing::debug!(len = batch.data.len(), "dispatching to array kernel (Variant C)");
            run_array_source(batch.data, ops, policy)
        }
        Source::Array(items) => run_sync_items(Box::new(items.into_iter().map(Ok)), ops, policy),
        Source::TypedBatch(batch) => run_sync_items(Box::new(batch.data.into_iter().map(Ok)), ops, policy),
        Source::SyncIter(it) => run_sync_items(it, ops, policy),
        Source::AsyncIter(st) | Source::Bytes(st) => run_async_items(st, ops, policy),
        Source::Parent(seg) => match seg.run() {
            SegmentOutput::Sync(it) => run_sync_items(it, ops, policy),
            SegmentOutput::Async(st) => run_async_items(st, ops, policy),
        },
    }
}

fn source_to_segment<T: Clone + Send + Sync + 'static>(source: Source<T>) -> SegmentOutput<T> {
    match source {
        Source::Array(items) => SegmentOutput::Sync(Box::new(items.into_iter().map(Ok))),
        Source::TypedBatch(batch) => SegmentOutput::Sync(Box::new(batch.data.into_iter().map(Ok))),
        Source::SyncIter(it) => SegmentOutput::Sync(it),
        Source::AsyncIter(st) | Source::Bytes(st) => SegmentOutput::Async(st),
        Source::Parent(seg) => seg.run(),
    }
}

/// What to do with an item that faulted, per the pipeline's [`ErrorPolicy`].
enum FaultAction<T> {
    /// `Rescue` produced a replacement value: emit it in place of the faulted item.
    EmitRecovered(T),
    /// `Propagate`: skip the item but surface the fault itself as an `Err` in the output.
    EmitError(NagareError),
    /// `Drop` (or a `Rescue` that declined): skip the item silently.
    Skip,
    /// `Terminate`: surface the fault and stop pulling further items.
    Stop(NagareError),
}

fn apply_item_fault<T>(policy: &ErrorPolicy<T>, err: NagareError) -> FaultAction<T> {
    match policy {
        ErrorPolicy::Drop => FaultAction::Skip,
        ErrorPolicy::Propagate => FaultAction::EmitError(err),
        ErrorPolicy::Terminate => FaultAction::Stop(err),
        ErrorPolicy::Rescue(handler) => match handler(&err) {
            Some(v) => FaultAction::EmitRecovered(v),
            None => FaultAction::Skip,
        },
    }
}

/// Variant C entry point: run the array kernel, then fall back to Variant A for whatever it
/// didn't finish (an async-producing item, or simply a fault).
fn run_array_source<T: Clone + Send + Sync + 'static>(
    data: Vec<T>,
    ops: Vec<Op<T>>,
    policy: ErrorPolicy<T>,
) -> SegmentOutput<T> {
    let mut states = op::fresh_states(&ops);
    let result = fusion::run_array_kernel(&ops, &mut states, &data);
    match result.stop {
        fusion::ArrayKernelStop::Exhausted | fusion::ArrayKernelStop::Stopped => {
            SegmentOutput::Sync(Box::new(result.emitted.into_iter().map(Ok)))
        }
        fusion::ArrayKernelStop::Faulted(e) => {
            let mut emitted: Vec<Result<T>> = result.emitted.into_iter().map(Ok).collect();
            match apply_item_fault(&policy, e) {
                FaultAction::EmitRecovered(v) => emitted.push(Ok(v)),
                FaultAction::EmitError(e) => emitted.push(Err(e)),
                FaultAction::Skip => {}
                FaultAction::Stop(e) => emitted.push(Err(e)),
            }
            SegmentOutput::Sync(Box::new(emitted.into_iter()))
        }
        fusion::ArrayKernelStop::NeedsAsync { from_stage, future } => {
            let remaining: VecDeque<Result<T>> = data[result.consumed + 1..].iter().cloned().map(Ok).collect();
            let drive_state = AsyncDriveState {
                emitted_queue: result.emitted.into_iter().map(Ok).collect(),
                pending: Some((from_stage, future)),
                items: ItemSource::Sync(Box::new(remaining.into_iter())),
                ops,
                states,
                policy,
                done: false,
            };
            SegmentOutput::Async(Box::pin(stream::unfold(drive_state, step)))
        }
    }
}

/// Variant A/B shared sync driver: runs items one at a time until exhaustion, a terminal
/// fault, or the first async outcome (at which point the remainder hands off to the async
/// driver in [`step`]).
fn run_sync_items<T: Clone + Send + Sync + 'static>(
    mut it: FallibleIter<T>,
    ops: Vec<Op<T>>,
    policy: ErrorPolicy<T>,
) -> SegmentOutput<T> {
    let mut states = op::fresh_states(&ops);
    let mut emitted: Vec<Result<T>> = Vec::new();
    loop {
        let item = match it.next() {
            None => return SegmentOutput::Sync(Box::new(emitted.into_iter())),
            Some(Err(e)) => {
                emitted.push(Err(e));
                return SegmentOutput::Sync(Box::new(emitted.into_iter()));
            }
            Some(Ok(item)) => item,
        };
        match fusion::run_item(&ops, &mut states, item, 0) {
            fusion::ItemOutcome::Emitted(v) => emitted.push(Ok(v)),
            fusion::ItemOutcome::Dropped => {}
            fusion::ItemOutcome::Stopped => return SegmentOutput::Sync(Box::new(emitted.into_iter())),
            fusion::ItemOutcome::Faulted(e) => match apply_item_fault(&policy, e) {
                FaultAction::EmitRecovered(v) => emitted.push(Ok(v)),
                FaultAction::EmitError(e) => emitted.push(Err(e)),
                FaultAction::Skip => {}
                FaultAction::Stop(e) => {
                    emitted.push(Err(e));
                    return SegmentOutput::Sync(Box::new(emitted.into_iter()));
                }
            },
            fusion::ItemOutcome::NeedsAsync { from_stage, future } => {
                let drive_state = AsyncDriveState {
                    emitted_queue: emitted.into_iter().collect(),
                    pending: Some((from_stage, future)),
                    items: ItemSource::Sync(it),
                    ops,
                    states,
                    policy,
                    done: false,
                };
                return SegmentOutput::Async(Box::pin(stream::unfold(drive_state, step)));
            }
        }
    }
}

fn run_async_items<T: Clone + Send + Sync + 'static>(
    st: crate::stream::FallibleAsyncStream<T>,
    ops: Vec<Op<T>>,
    policy: ErrorPolicy<T>,
) -> SegmentOutput<T> {
    let states = op::fresh_states(&ops);
    let drive_state = AsyncDriveState {
        emitted_queue: VecDeque::new(),
        pending: None,
        items: ItemSource::Async(st),
        ops,
        states,
        policy,
        done: false,
    };
    SegmentOutput::Async(Box::pin(stream::unfold(drive_state, step)))
}

enum ItemSource<T> {
    Sync(FallibleIter<T>),
    Async(crate::stream::FallibleAsyncStream<T>),
}

struct AsyncDriveState<T: Clone + Send + 'static> {
    /// Fully-resolved items (or surfaced faults) waiting to be yielded, oldest first.
    emitted_queue: VecDeque<Result<T>>,
    pending: Option<(usize, BoxFuture<Result<Option<T>>>)>,
    items: ItemSource<T>,
    ops: Vec<Op<T>>,
    states: Vec<OpState<T>>,
    policy: ErrorPolicy<T>,
    done: bool,
}

impl<T: Clone + Send + 'static> AsyncDriveState<T> {
    fn apply_fault(&mut self, e: NagareError) {
        match apply_item_fault(&self.policy, e) {
            FaultAction::EmitRecovered(v) => self.emitted_queue.push_back(Ok(v)),
            FaultAction::EmitError(e) => self.emitted_queue.push_back(Err(e)),
            FaultAction::Skip => {}
            FaultAction::Stop(e) => {
                self.emitted_queue.push_back(Err(e));
                self.done = true;
            }
        }
    }
}

/// The single per-item generator step shared by every async-driven pipeline, regardless of
/// which variant produced the hand-off.
async fn step<T: Clone + Send + Sync + 'static>(
    mut st: AsyncDriveState<T>,
) -> Option<(Result<T>, AsyncDriveState<T>)> {
    loop {
        if let Some(v) = st.emitted_queue.pop_front() {
            return Some((v, st));
        }
        if st.done {
            return None;
        }
        if let Some((from_stage, future)) = st.pending.take() {
            match future.await {
                Ok(Some(v)) => match fusion::run_item(&st.ops, &mut st.states, v, from_stage) {
                    fusion::ItemOutcome::Emitted(v) => st.emitted_queue.push_back(Ok(v)),
                    fusion::ItemOutcome::Dropped => {}
                    fusion::ItemOutcome::Stopped => st.done = true,
                    fusion::ItemOutcome::Faulted(e) => st.apply_fault(e),
                    fusion::ItemOutcome::NeedsAsync { from_stage, future } => {
                        st.pending = Some((from_stage, future));
                    }
                },
                Ok(None) => {}
                Err(e) => st.apply_fault(e),
            }
            continue;
        }
        let next = match &mut st.items {
            ItemSource::Sync(it) => it.next(),
            ItemSource::Async(s) => s.next().await,
        };
        match next {
            None => st.done = true,
            Some(Err(e)) => {
                st.done = true;
                st.emitted_queue.push_back(Err(e));
            }
            Some(Ok(item)) => match fusion::run_item(&st.ops, &mut st.states, item, 0) {
                fusion::ItemOutcome::Emitted(v) => st.emitted_queue.push_back(Ok(v)),
                fusion::ItemOutcome::Dropped => {}
                fusion::ItemOutcome::Stopped => st.done = true,
                fusion::ItemOutcome::Faulted(e) => st.apply_fault(e),
                fusion::ItemOutcome::NeedsAsync { from_stage, future } => {
                    st.pending = Some((from_stage, future));
                }
            },
        }
    }
}
