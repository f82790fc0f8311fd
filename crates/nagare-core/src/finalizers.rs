//! Finalizers (spec.md §4.5): the operations that actually drive a pipeline and produce a
//! plain Rust value or a `futures::Stream` handle to the caller. Every finalizer goes
//! through [`exec::run_to_segment`] — none of them know about fusion variants.

use crate::error::{NagareError, Result};
use crate::exec::{self, SegmentOutput};
use crate::stream::{FallibleAsyncStream, Stream};
use futures::stream::{self, StreamExt};

/// Collects the whole pipeline into a `Vec`, driving async segments to completion with
/// bounded concurrency (`config::async_concurrency()`) via buffered polling — matching
/// spec.md §4.5's "`toArray` MAY pipeline up to N in-flight async steps".
pub async fn to_array<T: Clone + Send + Sync + 'static>(stream: Stream<T>) -> Result<Vec<T>> {
    match exec::run_to_segment(stream) {
        SegmentOutput::Sync(it) => it.collect(),
        SegmentOutput::Async(st) => st.collect::<Vec<Result<T>>>().await.into_iter().collect(),
    }
}

pub async fn first<T: Clone + Send + Sync + 'static>(stream: Stream<T>) -> Result<Option<T>> {
    match exec::run_to_segment(stream) {
        SegmentOutput::Sync(mut it) => it.next().transpose(),
        SegmentOutput::Async(mut st) => st.next().await.transpose(),
    }
}

pub async fn last<T: Clone + Send + Sync + 'static>(stream: Stream<T>) -> Result<Option<T>> {
    let items = to_array(stream).await?;
    Ok(items.into_iter().last())
}

pub async fn count<T: Clone + Send + Sync + 'static>(stream: Stream<T>) -> Result<u64> {
    Ok(to_array(stream).await?.len() as u64)
}

pub async fn all<T: Clone + Send + Sync + 'static>(
    stream: Stream<T>,
    pred: impl Fn(&T) -> bool,
) -> Result<bool> {
    Ok(to_array(stream).await?.iter().all(pred))
}

pub async fn some<T: Clone + Send + Sync + 'static>(
    stream: Stream<T>,
    pred: impl Fn(&T) -> bool,
) -> Result<bool> {
    Ok(to_array(stream).await?.iter().any(pred))
}

/// `reduce` is `scan` followed by `last`: the accumulator chain is identical, only the
/// emission policy differs (spec.md §12's Open Question 3 resolution).
pub async fn reduce<T: Clone + Send + Sync + 'static>(
    stream: Stream<T>,
    seed: T,
    f: impl Fn(T, T) -> T + Send + Sync + 'static,
) -> Result<T> {
    let scanned = stream.scan(seed.clone(), f);
    Ok(last(scanned).await?.unwrap_or(seed))
}

/// Hands the pipeline to the caller as a boxed `futures::Stream`, converting a synchronous
/// segment into one eagerly via `stream::iter` (cheap: sync segments are already fully
/// materialized by the time [`exec::run_to_segment`] returns).
pub fn to_readable_stream<T: Clone + Send + Sync + 'static>(s: Stream<T>) -> FallibleAsyncStream<T> {
    match exec::run_to_segment(s) {
        SegmentOutput::Sync(it) => Box::pin(stream::iter(it)),
        SegmentOutput::Async(st) => st,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn to_array_collects_all_items() {
        let s = Stream::from_array(vec![1, 2, 3]).map(|x| x + 1);
        assert_eq!(to_array(s).await.unwrap(), vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn first_and_last() {
        let s = Stream::from_array(vec![1, 2, 3]);
        assert_eq!(first(Stream::from_array(vec![1, 2, 3])).await.unwrap(), Some(1));
        assert_eq!(last(s).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn reduce_matches_fold() {
        let s = Stream::from_array(vec![1, 2, 3, 4]);
        let sum = reduce(s, 0, |acc, x| acc + x).await.unwrap();
        assert_eq!(sum, 10);
    }

    #[tokio::test]
    async fn all_and_some() {
        assert!(all(Stream::from_array(vec![2, 4, 6]), |x| x % 2 == 0).await.unwrap());
        assert!(!some(Stream::from_array(vec![1, 3, 5]), |x| x % 2 == 0).await.unwrap());
    }
}
