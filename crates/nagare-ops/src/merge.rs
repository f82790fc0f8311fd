//! `merge(other...)` (spec.md §4.3): interleave all sources in arrival order (Promise.race-
//! like); completes once every source has completed. Grounded on `futures::stream::select_all`,
//! which polls every input round-robin and yields from whichever is ready first — the same
//! "whichever source produces next" fairness the spec calls for.

use nagare_core::exec;
use nagare_core::stream::{FallibleAsyncStream, Segment, SegmentOutput, Source, Stream};

struct MergeSegment<T> {
    sources: Vec<Stream<T>>,
}

impl<T> Segment<T> for MergeSegment<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn run(self: Box<Self>) -> SegmentOutput<T> {
        use futures::StreamExt;
        let streams: Vec<FallibleAsyncStream<T>> = self
            .sources
            .into_iter()
            .map(|s| match exec::run_to_segment(s) {
                SegmentOutput::Sync(it) => Box::pin(futures::stream::iter(it)) as FallibleAsyncStream<T>,
                SegmentOutput::Async(st) => st,
            })
            .collect();
        SegmentOutput::Async(Box::pin(futures::stream::select_all(streams)))
    }
}

pub fn merge<T>(sources: Vec<Stream<T>>) -> Stream<T>
where
    T: Clone + Send + Sync + 'static,
{
    Stream::from_source(Source::Parent(Box::new(MergeSegment { sources })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nagare_core::finalizers::to_array;

    #[tokio::test]
    async fn merges_two_arrays_preserving_per_source_order() {
        let a = Stream::from_array(vec![1, 3, 5]);
        let b = Stream::from_array(vec![2, 4, 6]);
        let mut out = to_array(merge(vec![a, b])).await.unwrap();
        out.sort();
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn completes_when_all_sources_complete() {
        let a = Stream::from_array(Vec::<i64>::new());
        let b = Stream::from_array(vec![1]);
        assert_eq!(to_array(merge(vec![a, b])).await.unwrap(), vec![1]);
    }
}
