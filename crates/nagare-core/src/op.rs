//! The operator tag model: structured, runtime-introspectable metadata for the five
//! fusion-eligible operator kinds plus an `Opaque` escape hatch, matching spec.md §3's
//! `Op` record.
//!
//! Every fusion-eligible operator (`Map`, `Filter`, `Scan`, `Take`, `Skip`) is an
//! *endofunction* on a single item type `T` — see `DESIGN.md` and `SPEC_FULL.md` §12.4 for
//! why genuinely type-changing transforms (`map_into`, `pairwise`, ...) live outside this
//! enum as pipeline-segment boundaries instead.

use crate::error::NagareError;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Outcome of applying one stage (`Map`/`Scan`/`Opaque`) to a single item.
pub enum StepOutcome<T> {
    /// The stage produced a value; continue to the next stage.
    Value(T),
    /// The stage's closure returned a future: the synchronous fused path cannot continue
    /// for this item and must hand off to async iteration, carrying forward whatever state
    /// earlier stages already mutated (spec.md's "async-detected" sentinel).
    Async(BoxFuture<Result<Option<T>, NagareError>>),
    /// The stage's closure raised an `OperatorFault`; handled per the pipeline's
    /// `ErrorPolicy` rather than unwinding the Rust call stack.
    Fault(NagareError),
}

/// Outcome of applying a `Filter` predicate to a single item.
pub enum FilterOutcome {
    Keep,
    Drop,
    Async(BoxFuture<Result<bool, NagareError>>),
    Fault(NagareError),
}

/// A tagged, structured operator. Cloning an `Op` is cheap (`Arc` clone of its closure);
/// the mutable per-run state lives separately in [`OpState`].
#[derive(Clone)]
pub enum Op<T> {
    Map(Arc<dyn Fn(T) -> StepOutcome<T> + Send + Sync>),
    Filter(Arc<dyn Fn(&T) -> FilterOutcome + Send + Sync>),
    /// `seed` is the initial accumulator; `f` computes `(acc, item) -> new_acc` and is
    /// itself a `StepOutcome` producer so scan functions may be async.
    Scan {
        seed: T,
        f: Arc<dyn Fn(T, T) -> StepOutcome<T> + Send + Sync>,
    },
    /// Stateful: cursor initialized to `n` on first use, decremented per emitted item.
    Take(u64),
    /// Stateful: cursor initialized to `n` on first use, decremented per consumed item.
    Skip(u64),
    /// Delegates to an out-of-process numeric kernel (spec.md §4.6); the core never
    /// inspects `params`, only forwards them at the kernel-contract boundary.
    Wasm {
        kernel: String,
        params: BTreeMap<String, f64>,
    },
    /// Unrecognized or user-provided transform that the fusion compiler cannot specialize
    /// over; still endofunction-typed, but always runs through the guarded per-item path.
    Opaque(Arc<dyn Fn(T) -> StepOutcome<T> + Send + Sync>),
}

impl<T> Op<T> {
    pub fn kind(&self) -> OpKind {
        match self {
            Op::Map(_) => OpKind::Map,
            Op::Filter(_) => OpKind::Filter,
            Op::Scan { .. } => OpKind::Scan,
            Op::Take(_) => OpKind::Take,
            Op::Skip(_) => OpKind::Skip,
            Op::Wasm { .. } => OpKind::Wasm,
            Op::Opaque(_) => OpKind::Opaque,
        }
    }

    /// Whether this stage can ever short-circuit the *remaining* stream (only `Take`).
    pub fn is_short_circuiting(&self) -> bool {
        matches!(self, Op::Take(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Map,
    Filter,
    Scan,
    Take,
    Skip,
    Wasm,
    Opaque,
}

/// Fresh mutable state for one operator stage, instantiated once per pipeline
/// instantiation per spec.md §3: "Stateful kinds carry a fresh state instance per compiled
/// pipeline instantiation; re-iteration MUST re-instantiate state."
#[derive(Clone)]
pub enum OpState<T> {
    Stateless,
    Scan(T),
    Take(u64),
    Skip(u64),
}

impl<T: Clone> Op<T> {
    pub fn fresh_state(&self) -> OpState<T> {
        match self {
            Op::Scan { seed, .. } => OpState::Scan(seed.clone()),
            Op::Take(n) => OpState::Take(*n),
            Op::Skip(n) => OpState::Skip(*n),
            Op::Map(_) | Op::Filter(_) | Op::Wasm { .. } | Op::Opaque(_) => OpState::Stateless,
        }
    }
}

/// Build a fresh state vector for a whole flattened operator list.
pub fn fresh_states<T: Clone>(ops: &[Op<T>]) -> Vec<OpState<T>> {
    ops.iter().map(Op::fresh_state).collect()
}

/// The pipeline's error-handling policy (spec.md §3/§4.1/§7).
#[derive(Clone)]
pub enum ErrorPolicy<T> {
    /// On fault, skip the offending item but surface the error itself as an `Err` item in
    /// the output sequence, then continue with the next item.
    Propagate,
    /// On fault, skip the offending item and continue; the error never reaches the
    /// consumer. See `exec::run_pipeline`.
    Drop,
    /// Call the handler; if it returns `Some`, emit that value and short-circuit the
    /// remaining stages for this item (the recovered value is not re-processed).
    Rescue(Arc<dyn Fn(&NagareError) -> Option<T> + Send + Sync>),
    /// Propagate the error to the consumer and close the stream.
    Terminate,
}

impl<T> Default for ErrorPolicy<T> {
    fn default() -> Self {
        ErrorPolicy::Drop
    }
}

impl<T> std::fmt::Debug for ErrorPolicy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorPolicy::Propagate => "Propagate",
            ErrorPolicy::Drop => "Drop",
            ErrorPolicy::Rescue(_) => "Rescue",
            ErrorPolicy::Terminate => "Terminate",
        };
        f.write_str(name)
    }
}

/// Whether a flattened pipeline's operators are all stateless (no `Scan`/`Take`/`Skip`),
/// used by the execution dispatch to decide whether the Variant-A probe item is required
/// (spec.md §4.2, dispatch step 2 vs 3).
pub fn is_stateless<T>(ops: &[Op<T>]) -> bool {
    ops.iter()
        .all(|op| matches!(op.kind(), OpKind::Map | OpKind::Filter | OpKind::Wasm | OpKind::Opaque))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_reinstantiates_scan_seed() {
        let op: Op<i64> = Op::Scan {
            seed: 0,
            f: Arc::new(|acc, x| StepOutcome::Value(acc + x)),
        };
        match op.fresh_state() {
            OpState::Scan(v) => assert_eq!(v, 0),
            _ => panic!("expected Scan state"),
        }
    }

    #[test]
    fn take_is_short_circuiting_only() {
        assert!(Op::<i64>::Take(3).is_short_circuiting());
        assert!(!Op::<i64>::Skip(3).is_short_circuiting());
    }

    #[test]
    fn stateless_detection() {
        let ops: Vec<Op<i64>> = vec![
            Op::Map(Arc::new(StepOutcome::Value)),
            Op::Filter(Arc::new(|_| FilterOutcome::Keep)),
        ];
        assert!(is_stateless(&ops));
        let ops2: Vec<Op<i64>> = vec![Op::Take(1)];
        assert!(!is_stateless(&ops2));
    }
}
