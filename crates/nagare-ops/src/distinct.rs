//! `distinctUntilChanged()` (spec.md §4.3): drop items equal to the immediately previous
//! emitted value. Grounded on `nagare-windowed`'s `WindowSegment`: a `Source::Parent`
//! boundary that drains the parent and filters, carrying one extra piece of state (the last
//! emitted value) across the filter closure.

use nagare_core::exec;
use nagare_core::stream::{Segment, SegmentOutput, Source, Stream};

struct DistinctSegment<T> {
    parent: Stream<T>,
}

impl<T> Segment<T> for DistinctSegment<T>
where
    T: Clone + Send + Sync + PartialEq + 'static,
{
    fn run(self: Box<Self>) -> SegmentOutput<T> {
        use futures::StreamExt;
        let mut last: Option<T> = None;
        match exec::run_to_segment(self.parent) {
            SegmentOutput::Sync(it) => SegmentOutput::Sync(Box::new(it.filter_map(move |r| match r {
                Ok(v) => {
                    if last.as_ref() == Some(&v) {
                        None
                    } else {
                        last = Some(v.clone());
                        Some(Ok(v))
                    }
                }
                Err(e) => Some(Err(e)),
            }))),
            SegmentOutput::Async(st) => SegmentOutput::Async(Box::pin(st.filter_map(move |r| {
                let out = match r {
                    Ok(v) => {
                        if last.as_ref() == Some(&v) {
                            None
                        } else {
                            last = Some(v.clone());
                            Some(Ok(v))
                        }
                    }
                    Err(e) => Some(Err(e)),
                };
                async move { out }
            }))),
        }
    }
}

pub fn distinct_until_changed<T>(parent: Stream<T>) -> Stream<T>
where
    T: Clone + Send + Sync + PartialEq + 'static,
{
    Stream::from_source(Source::Parent(Box::new(DistinctSegment { parent })))
}

pub trait DistinctUntilChangedExt<T> {
    fn distinct_until_changed(self) -> Stream<T>;
}

impl<T> DistinctUntilChangedExt<T> for Stream<T>
where
    T: Clone + Send + Sync + PartialEq + 'static,
{
    fn distinct_until_changed(self) -> Stream<T> {
        distinct_until_changed(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nagare_core::finalizers::to_array;

    #[tokio::test]
    async fn drops_consecutive_duplicates() {
        let s = Stream::from_array(vec![1, 1, 2, 2, 3, 3]).distinct_until_changed();
        assert_eq!(to_array(s).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn non_consecutive_duplicates_survive() {
        let s = Stream::from_array(vec![1, 2, 1, 2]).distinct_until_changed();
        assert_eq!(to_array(s).await.unwrap(), vec![1, 2, 1, 2]);
    }
}
