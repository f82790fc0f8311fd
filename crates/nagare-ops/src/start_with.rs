//! `startWith(...vals)` (spec.md §4.3): prepend values before delegating to upstream.

use nagare_core::exec;
use nagare_core::stream::{Segment, SegmentOutput, Source, Stream};

struct StartWithSegment<T> {
    values: Vec<T>,
    parent: Stream<T>,
}

impl<T> Segment<T> for StartWithSegment<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn run(self: Box<Self>) -> SegmentOutput<T> {
        use futures::StreamExt;
        let StartWithSegment { values, parent } = *self;
        let prefix: Vec<nagare_core::Result<T>> = values.into_iter().map(Ok).collect();
        match exec::run_to_segment(parent) {
            SegmentOutput::Sync(it) => SegmentOutput::Sync(Box::new(prefix.into_iter().chain(it))),
            SegmentOutput::Async(st) => {
                SegmentOutput::Async(Box::pin(futures::stream::iter(prefix).chain(st)))
            }
        }
    }
}

pub fn start_with<T>(parent: Stream<T>, values: Vec<T>) -> Stream<T>
where
    T: Clone + Send + Sync + 'static,
{
    Stream::from_source(Source::Parent(Box::new(StartWithSegment { values, parent })))
}

pub trait StartWithExt<T> {
    fn start_with(self, values: Vec<T>) -> Stream<T>;
}

impl<T> StartWithExt<T> for Stream<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn start_with(self, values: Vec<T>) -> Stream<T> {
        start_with(self, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distinct::DistinctUntilChangedExt;
    use nagare_core::finalizers::to_array;

    #[tokio::test]
    async fn prepends_values() {
        let s = Stream::from_array(vec![1, 2, 3]).start_with(vec![-1, 0]);
        assert_eq!(to_array(s).await.unwrap(), vec![-1, 0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn scenario_s4_distinct_then_start_with() {
        let s = Stream::from_array(vec![1, 1, 2, 2, 3, 3])
            .distinct_until_changed()
            .start_with(vec![0]);
        assert_eq!(to_array(s).await.unwrap(), vec![0, 1, 2, 3]);
    }
}
