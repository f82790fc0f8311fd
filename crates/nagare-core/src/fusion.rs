//! The operator-fusion compiler: Variants A, B and C (spec.md §4.2).
//!
//! * **Variant A** — guarded per-item: every stage is checked for an async outcome on
//!   every item. Always correct, used whenever an async result is still possible.
//! * **Variant B** — unchecked per-item: the same stage chain, but the caller has already
//!   established (via a Variant-A probe item, see `exec::run_pipeline`) that this pipeline
//!   never goes async for this source, so the per-item async check is skipped.
//! * **Variant C** — array kernel: for an all-stateless, non-`Wasm` operator chain over an
//!   in-memory `Array`/`TypedBatch` source at or above `config::unroll_threshold()`, applies
//!   the fused stage function directly over the backing `Vec<T>`, 4 items at a time. Falls
//!   back to Variant A from the first async-producing item onward (a kernel never partially
//!   "un-fuses"; it simply stops claiming items).
//!
//! All three variants share one per-item stage evaluator, [`apply_stage`], so their
//! observable behavior never drifts apart.

use crate::error::NagareError;
use crate::kernel_registry;
use crate::op::{FilterOutcome, Op, OpState, StepOutcome};

/// Outcome of applying a single stage to a single item.
pub enum StageOutcome<T> {
    Emit(T),
    Drop,
    /// `Take` reached zero: the whole pipeline stops accepting further items.
    Stop,
    Async(crate::op::BoxFuture<Result<Option<T>, NagareError>>),
}

pub fn apply_stage<T: Clone + Send + 'static>(
    op: &Op<T>,
    state: &mut OpState<T>,
    item: T,
) -> Result<StageOutcome<T>, NagareError> {
    match op {
        Op::Map(f) | Op::Opaque(f) => match f(item) {
            StepOutcome::Value(v) => Ok(StageOutcome::Emit(v)),
            StepOutcome::Async(fut) => Ok(StageOutcome::Async(fut)),
            StepOutcome::Fault(e) => Err(e),
        },
        Op::Filter(pred) => match pred(&item) {
            FilterOutcome::Keep => Ok(StageOutcome::Emit(item)),
            FilterOutcome::Drop => Ok(StageOutcome::Drop),
            FilterOutcome::Async(fut) => Ok(StageOutcome::Async(Box::pin(async move {
                match fut.await? {
                    true => Ok(Some(item)),
                    false => Ok(None),
                }
            }))),
            FilterOutcome::Fault(e) => Err(e),
        },
        Op::Scan { f, .. } => {
            let acc = match state {
                OpState::Scan(acc) => acc.clone(),
                _ => unreachable!("Scan op must carry Scan state"),
            };
            match f(acc, item) {
                StepOutcome::Value(new_acc) => {
                    *state = OpState::Scan(new_acc.clone());
                    Ok(StageOutcome::Emit(new_acc))
                }
                StepOutcome::Async(fut) => Ok(StageOutcome::Async(fut)),
                StepOutcome::Fault(e) => Err(e),
            }
        }
        Op::Take(_) => {
            let remaining = match state {
                OpState::Take(r) => r,
                _ => unreachable!("Take op must carry Take state"),
            };
            if *remaining == 0 {
                return Ok(StageOutcome::Stop);
            }
            *remaining -= 1;
            Ok(StageOutcome::Emit(item))
        }
        Op::Skip(_) => {
            let remaining = match state {
                OpState::Skip(r) => r,
                _ => unreachable!("Skip op must carry Skip state"),
            };
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(StageOutcome::Drop);
            }
            Ok(StageOutcome::Emit(item))
        }
        Op::Wasm { kernel, params } => match kernel_registry::invoke::<T, T>(kernel, &item, params) {
            Ok(out) => Ok(StageOutcome::Emit(out)),
            Err(e) => Err(e),
        },
    }
}

/// Result of driving one item through the whole stage chain synchronously.
pub enum ItemOutcome<T> {
    Emitted(T),
    Dropped,
    /// A downstream `Take` has been exhausted; the caller must stop pulling further items.
    Stopped,
    /// A stage could not complete synchronously; the caller must resolve the future (and
    /// apply remaining stages to its result, if any) before continuing.
    NeedsAsync {
        from_stage: usize,
        future: crate::op::BoxFuture<Result<Option<T>, NagareError>>,
    },
    Faulted(NagareError),
}

/// Variant A/B shared driver: apply every stage in order, starting at `start_stage`
/// (normally `0`; resuming after an async stage passes its index instead).
pub fn run_item<T: Clone + Send + 'static>(
    ops: &[Op<T>],
    states: &mut [OpState<T>],
    mut item: T,
    start_stage: usize,
) -> ItemOutcome<T> {
    for (stage, op) in ops.iter().enumerate().skip(start_stage) {
        match apply_stage(op, &mut states[stage], item) {
            Ok(StageOutcome::Emit(v)) => item = v,
            Ok(StageOutcome::Drop) => return ItemOutcome::Dropped,
            Ok(StageOutcome::Stop) => return ItemOutcome::Stopped,
            Ok(StageOutcome::Async(future)) => {
                return ItemOutcome::NeedsAsync {
                    from_stage: stage + 1,
                    future,
                }
            }
            Err(e) => return ItemOutcome::Faulted(e),
        }
    }
    ItemOutcome::Emitted(item)
}

/// Variant C: the array-kernel fast path. Applies `run_item` directly over `data`, 4 items
/// at a time, stopping (and reporting how many items it consumed) the moment an item goes
/// async, faults, or a `Take` stops the pipeline — the caller resumes from there with
/// Variant A.
pub struct ArrayKernelResult<T> {
    pub emitted: Vec<T>,
    pub consumed: usize,
    pub stop: ArrayKernelStop<T>,
}

pub enum ArrayKernelStop<T> {
    Exhausted,
    Stopped,
    NeedsAsync {
        from_stage: usize,
        future: crate::op::BoxFuture<Result<Option<T>, NagareError>>,
    },
    Faulted(NagareError),
}

pub fn run_array_kernel<T: Clone + Send + 'static>(
    ops: &[Op<T>],
    states: &mut [OpState<T>],
    data: &[T],
) -> ArrayKernelResult<T> {
    let mut emitted = Vec::with_capacity(data.len());
    let mut i = 0;
    let lanes = 4;
    while i + lanes <= data.len() {
        for lane in 0..lanes {
            match run_item(ops, states, data[i + lane].clone(), 0) {
                ItemOutcome::Emitted(v) => emitted.push(v),
                ItemOutcome::Dropped => {}
                ItemOutcome::Stopped => {
                    return ArrayKernelResult {
                        emitted,
                        consumed: i + lane,
                        stop: ArrayKernelStop::Stopped,
                    }
                }
                ItemOutcome::NeedsAsync { from_stage, future } => {
                    return ArrayKernelResult {
                        emitted,
                        consumed: i + lane,
                        stop: ArrayKernelStop::NeedsAsync { from_stage, future },
                    }
                }
                ItemOutcome::Faulted(e) => {
                    return ArrayKernelResult {
                        emitted,
                        consumed: i + lane,
                        stop: ArrayKernelStop::Faulted(e),
                    }
                }
            }
        }
        i += lanes;
    }
    while i < data.len() {
        match run_item(ops, states, data[i].clone(), 0) {
            ItemOutcome::Emitted(v) => emitted.push(v),
            ItemOutcome::Dropped => {}
            ItemOutcome::Stopped => {
                return ArrayKernelResult {
                    emitted,
                    consumed: i,
                    stop: ArrayKernelStop::Stopped,
                }
            }
            ItemOutcome::NeedsAsync { from_stage, future } => {
                return ArrayKernelResult {
                    emitted,
                    consumed: i,
                    stop: ArrayKernelStop::NeedsAsync { from_stage, future },
                }
            }
            ItemOutcome::Faulted(e) => {
                return ArrayKernelResult {
                    emitted,
                    consumed: i,
                    stop: ArrayKernelStop::Faulted(e),
                }
            }
        }
        i += 1;
    }
    ArrayKernelResult {
        emitted,
        consumed: data.len(),
        stop: ArrayKernelStop::Exhausted,
    }
}

/// Whether an operator chain is eligible for the Variant-C array kernel: no `Wasm` stage
/// (kernel dispatch already owns its own batching) and, per spec.md §4.2, no unrolling when
/// a `Take` is present (short-circuiting and 4-wide unrolling don't compose cleanly).
pub fn array_kernel_eligible<T>(ops: &[Op<T>]) -> bool {
    !ops.iter()
        .any(|op| matches!(op.kind(), crate::op::OpKind::Wasm | crate::op::OpKind::Take))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::fresh_states;
    use std::sync::Arc;

    fn double_op() -> Op<i64> {
        Op::Map(Arc::new(|x: i64| StepOutcome::Value(x * 2)))
    }

    fn even_filter() -> Op<i64> {
        Op::Filter(Arc::new(|x: &i64| {
            if x % 2 == 0 {
                FilterOutcome::Keep
            } else {
                FilterOutcome::Drop
            }
        }))
    }

    #[test]
    fn run_item_chains_stages_in_order() {
        let ops = vec![double_op(), even_filter()];
        let mut states = fresh_states(&ops);
        match run_item(&ops, &mut states, 3, 0) {
            ItemOutcome::Emitted(v) => assert_eq!(v, 6),
            _ => panic!("expected emission"),
        }
    }

    #[test]
    fn array_kernel_matches_scalar_semantics() {
        let ops = vec![double_op(), even_filter()];
        let mut states = fresh_states(&ops);
        let data: Vec<i64> = (1..=9).collect();
        let result = run_array_kernel(&ops, &mut states, &data);
        assert_eq!(result.emitted, vec![2, 4, 6, 8, 10, 12, 14, 16, 18]);
        assert!(matches!(result.stop, ArrayKernelStop::Exhausted));
    }

    #[test]
    fn take_disqualifies_array_kernel() {
        let ops = vec![double_op(), Op::Take(2)];
        assert!(!array_kernel_eligible(&ops));
    }
}
