//! `pairwise()` (spec.md §4.3): emit `(prev, curr)`; the first item produces no emission.
//! Type-changing (`T -> (T, T)`), so this always crosses a pipeline-segment boundary, the
//! same way `nagare_core::stream::Boundary` does for `map_into`.

use nagare_core::exec;
use nagare_core::stream::{Segment, SegmentOutput, Source, Stream};

struct PairwiseSegment<T> {
    parent: Stream<T>,
}

impl<T> Segment<(T, T)> for PairwiseSegment<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn run(self: Box<Self>) -> SegmentOutput<(T, T)> {
        use futures::StreamExt;
        let mut prev: Option<T> = None;
        match exec::run_to_segment(self.parent) {
            SegmentOutput::Sync(it) => SegmentOutput::Sync(Box::new(it.filter_map(move |r| match r {
                Ok(v) => match prev.replace(v.clone()) {
                    Some(p) => Some(Ok((p, v))),
                    None => None,
                },
                Err(e) => Some(Err(e)),
            }))),
            SegmentOutput::Async(st) => SegmentOutput::Async(Box::pin(st.filter_map(move |r| {
                let out = match r {
                    Ok(v) => match prev.replace(v.clone()) {
                        Some(p) => Some(Ok((p, v))),
                        None => None,
                    },
                    Err(e) => Some(Err(e)),
                };
                async move { out }
            }))),
        }
    }
}

pub fn pairwise<T>(parent: Stream<T>) -> Stream<(T, T)>
where
    T: Clone + Send + Sync + 'static,
{
    Stream::from_source(Source::Parent(Box::new(PairwiseSegment { parent })))
}

pub trait PairwiseExt<T> {
    fn pairwise(self) -> Stream<(T, T)>;
}

impl<T> PairwiseExt<T> for Stream<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn pairwise(self) -> Stream<(T, T)> {
        pairwise(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nagare_core::finalizers::to_array;

    #[tokio::test]
    async fn emits_consecutive_pairs() {
        let s = Stream::from_array(vec![1, 2, 3, 4]).pairwise();
        assert_eq!(to_array(s).await.unwrap(), vec![(1, 2), (2, 3), (3, 4)]);
    }

    #[tokio::test]
    async fn single_item_emits_nothing() {
        let s = Stream::from_array(vec![1]).pairwise();
        assert_eq!(to_array(s).await.unwrap(), Vec::<(i64, i64)>::new());
    }
}
