//! Nagare: a lazy, composable, RxJS-style stream-processing engine (see `SPEC_FULL.md`).
//!
//! This crate is the public facade: it re-exports the stream core, the operator crates, and
//! adds the factory entry points from spec.md §6 (`from`, `of`, `range`, `interval`,
//! `empty`, `merge`, `combine`, `combineLatest`, `fromReadableStream`).

pub use nagare_core::{
    config, error::NagareError, exec, finalizers, kernel_registry, op, stream, ErrorPolicy,
    FilterOutcome, Op, OpKind, OpState, Result, Source, StepOutcome, Stream, TypedBatch,
};

pub use nagare_backpressure as backpressure;
pub use nagare_frame as frame;
pub use nagare_kernel as kernel;
pub use nagare_ops as ops;
pub use nagare_windowed as windowed;

pub use nagare_ops::{
    buffer, buffer_time, combine_latest as combine_latest_fn, concat_map, debounce, distinct_until_changed,
    merge as merge_fn, pairwise, retry, start_with, switch_map, throttle, zip as zip_fn,
    BufferExt, BufferTimeExt, ConcatMapExt, DebounceExt, DistinctUntilChangedExt, PairwiseExt, RetryExt,
    StartWithExt, SwitchMapExt, ThrottleExt,
};
pub use nagare_windowed::{windowed_aggregate, AggOp, WindowedAggregator, WindowedStreamExt};

use std::time::Duration;

/// `from(array)` — the common case; use `Stream::from_sync_iter`/`from_async_stream`/
/// `from_bytes_stream` directly for the iterable/async-iterable/byte-stream forms.
pub fn from<T: Clone + Send + Sync + 'static>(items: Vec<T>) -> Stream<T> {
    Stream::from_array(items)
}

/// `of(...values)` — a variadic-flavored alias of `from` for a fixed small set of values.
pub fn of<T: Clone + Send + Sync + 'static>(values: impl IntoIterator<Item = T>) -> Stream<T> {
    Stream::from_array(values.into_iter().collect())
}

/// `range(start, end, step)`. `step` must be non-zero; `end` is exclusive, matching a
/// half-open range regardless of direction.
pub fn range(start: i64, end: i64, step: i64) -> Stream<i64> {
    assert!(step != 0, "range step must be non-zero");
    let items: Vec<i64> = if step > 0 {
        (start..end).step_by(step as usize).collect()
    } else {
        let mut v = Vec::new();
        let mut cur = start;
        while cur > end {
            v.push(cur);
            cur += step;
        }
        v
    };
    Stream::from_array(items)
}

pub fn empty<T: Clone + Send + Sync + 'static>() -> Stream<T> {
    Stream::from_array(Vec::new())
}

/// `interval(ms)`: an unbounded tick stream, `0, 1, 2, ...` at `period` spacing. Pair with
/// `.take(n)` for a bounded run, or poll `cancel` (per spec.md §6's optional abort argument)
/// for cooperative cancellation.
pub fn interval(period: Duration) -> Stream<u64> {
    use futures::StreamExt;
    let ticks = futures::stream::unfold(0u64, move |n| async move {
        tokio::time::sleep(period).await;
        Some((n, n + 1))
    });
    Stream::from_async_stream(ticks)
}

/// Like [`interval`], but stops as soon as `cancel` reports `true` — the cooperative abort
/// signal referenced by spec.md §6's `interval(ms, abort?)`.
pub fn interval_with_cancel(period: Duration, cancel: tokio::sync::watch::Receiver<bool>) -> Stream<u64> {
    let ticks = futures::stream::unfold((0u64, cancel), move |(n, mut cancel)| async move {
        if *cancel.borrow() {
            return None;
        }
        tokio::select! {
            _ = tokio::time::sleep(period) => Some((n, (n + 1, cancel))),
            _ = cancel.changed() => None,
        }
    });
    Stream::from_async_stream(ticks)
}

pub fn merge<T: Clone + Send + Sync + 'static>(sources: Vec<Stream<T>>) -> Stream<T> {
    nagare_ops::merge(sources)
}

pub fn combine<A, B>(a: Stream<A>, b: Stream<B>) -> Stream<(A, B)>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    nagare_ops::zip(a, b)
}

pub fn combine_latest<A, B>(a: Stream<A>, b: Stream<B>) -> Stream<(A, B)>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    nagare_ops::combine_latest(a, b)
}

/// `fromReadableStream(s)`: lifts an existing fallible async stream (e.g. a decoded
/// `nagare-frame` transport) into a `Stream`.
pub fn from_readable_stream<T: Clone + Send + Sync + 'static>(
    s: impl futures::Stream<Item = Result<T>> + Send + 'static,
) -> Stream<T> {
    Stream::from_bytes_stream(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn range_is_half_open_and_steps() {
        assert_eq!(
            finalizers::to_array(range(0, 10, 2)).await.unwrap(),
            vec![0, 2, 4, 6, 8]
        );
        assert_eq!(finalizers::to_array(range(5, 0, -1)).await.unwrap(), vec![5, 4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn empty_yields_nothing() {
        assert_eq!(finalizers::to_array(empty::<i64>()).await.unwrap(), Vec::<i64>::new());
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticks_forever_until_taken() {
        let out = finalizers::to_array(interval(Duration::from_millis(5)).take(3)).await.unwrap();
        assert_eq!(out, vec![0, 1, 2]);
    }
}
