//! `concatMap(fn)` (spec.md §4.3): for each outer item, fully drain the inner stream before
//! advancing to the next outer item. Grounded on `futures::StreamExt::flatten`, whose
//! `Flatten` combinator already drains one inner stream to completion before polling the
//! outer stream for the next one — exactly the sequential semantics the spec calls for.

use nagare_core::exec;
use nagare_core::stream::{FallibleAsyncStream, Segment, SegmentOutput, Source, Stream};
use std::sync::Arc;

struct ConcatMapSegment<T, U> {
    parent: Stream<T>,
    f: Arc<dyn Fn(T) -> Stream<U> + Send + Sync>,
}

fn to_async<U: Clone + Send + Sync + 'static>(s: Stream<U>) -> FallibleAsyncStream<U> {
    match exec::run_to_segment(s) {
        SegmentOutput::Sync(it) => Box::pin(futures::stream::iter(it)),
        SegmentOutput::Async(st) => st,
    }
}

impl<T, U> Segment<U> for ConcatMapSegment<T, U>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    fn run(self: Box<Self>) -> SegmentOutput<U> {
        use futures::StreamExt;
        let ConcatMapSegment { parent, f } = *self;
        let outer = to_async(parent);
        let inner_streams = outer.map(move |r| match r {
            Ok(v) => to_async(f(v)),
            Err(e) => Box::pin(futures::stream::once(async move { Err(e) })) as FallibleAsyncStream<U>,
        });
        SegmentOutput::Async(Box::pin(inner_streams.flatten()))
    }
}

pub fn concat_map<T, U>(parent: Stream<T>, f: impl Fn(T) -> Stream<U> + Send + Sync + 'static) -> Stream<U>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    Stream::from_source(Source::Parent(Box::new(ConcatMapSegment { parent, f: Arc::new(f) })))
}

pub trait ConcatMapExt<T> {
    fn concat_map<U: Clone + Send + Sync + 'static>(
        self,
        f: impl Fn(T) -> Stream<U> + Send + Sync + 'static,
    ) -> Stream<U>;
}

impl<T: Clone + Send + Sync + 'static> ConcatMapExt<T> for Stream<T> {
    fn concat_map<U: Clone + Send + Sync + 'static>(
        self,
        f: impl Fn(T) -> Stream<U> + Send + Sync + 'static,
    ) -> Stream<U> {
        concat_map(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nagare_core::finalizers::to_array;

    #[tokio::test]
    async fn drains_each_inner_before_the_next() {
        let s = Stream::from_array(vec![1, 2, 3]).concat_map(|x| Stream::from_array(vec![x, x * 10]));
        let out = to_array(s).await.unwrap();
        assert_eq!(out, vec![1, 10, 2, 20, 3, 30]);
    }
}
