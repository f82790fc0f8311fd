//! `combineLatest(A, B)` and `zip/combine` (spec.md §4.3), specialized to two sources — the
//! arity the spec's own scenario S8 exercises. `zip` reuses `futures::StreamExt::zip`
//! directly since its "complete when either source completes" semantics already match the
//! spec verbatim.

use nagare_core::exec;
use nagare_core::stream::{FallibleAsyncStream, Segment, SegmentOutput, Source, Stream};

struct CombineLatestSegment<A, B> {
    a: Stream<A>,
    b: Stream<B>,
}

struct CombineLatestState<A, B> {
    a: FallibleAsyncStream<A>,
    b: FallibleAsyncStream<B>,
    latest_a: Option<A>,
    latest_b: Option<B>,
    a_done: bool,
    b_done: bool,
}

async fn combine_latest_step<A, B>(
    mut st: CombineLatestState<A, B>,
) -> Option<(nagare_core::Result<(A, B)>, CombineLatestState<A, B>)>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
{
    use futures::StreamExt;
    loop {
        if st.a_done && st.b_done {
            return None;
        }
        tokio::select! {
            next_a = st.a.next(), if !st.a_done => match next_a {
                Some(Ok(v)) => {
                    st.latest_a = Some(v);
                    if let Some(b) = st.latest_b.clone() {
                        let a = st.latest_a.clone().expect("just set");
                        return Some((Ok((a, b)), st));
                    }
                }
                Some(Err(e)) => return Some((Err(e), st)),
                None => st.a_done = true,
            },
            next_b = st.b.next(), if !st.b_done => match next_b {
                Some(Ok(v)) => {
                    st.latest_b = Some(v);
                    if let Some(a) = st.latest_a.clone() {
                        let b = st.latest_b.clone().expect("just set");
                        return Some((Ok((a, b)), st));
                    }
                }
                Some(Err(e)) => return Some((Err(e), st)),
                None => st.b_done = true,
            },
        }
    }
}

impl<A, B> Segment<(A, B)> for CombineLatestSegment<A, B>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    fn run(self: Box<Self>) -> SegmentOutput<(A, B)> {
        let a = match exec::run_to_segment(self.a) {
            SegmentOutput::Sync(it) => Box::pin(futures::stream::iter(it)) as FallibleAsyncStream<A>,
            SegmentOutput::Async(st) => st,
        };
        let b = match exec::run_to_segment(self.b) {
            SegmentOutput::Sync(it) => Box::pin(futures::stream::iter(it)) as FallibleAsyncStream<B>,
            SegmentOutput::Async(st) => st,
        };
        let state = CombineLatestState {
            a,
            b,
            latest_a: None,
            latest_b: None,
            a_done: false,
            b_done: false,
        };
        SegmentOutput::Async(Box::pin(futures::stream::unfold(state, combine_latest_step)))
    }
}

pub fn combine_latest<A, B>(a: Stream<A>, b: Stream<B>) -> Stream<(A, B)>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    Stream::from_source(Source::Parent(Box::new(CombineLatestSegment { a, b })))
}

struct ZipSegment<A, B> {
    a: Stream<A>,
    b: Stream<B>,
}

impl<A, B> Segment<(A, B)> for ZipSegment<A, B>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    fn run(self: Box<Self>) -> SegmentOutput<(A, B)> {
        use futures::StreamExt;
        let a = match exec::run_to_segment(self.a) {
            SegmentOutput::Sync(it) => Box::pin(futures::stream::iter(it)) as FallibleAsyncStream<A>,
            SegmentOutput::Async(st) => st,
        };
        let b = match exec::run_to_segment(self.b) {
            SegmentOutput::Sync(it) => Box::pin(futures::stream::iter(it)) as FallibleAsyncStream<B>,
            SegmentOutput::Async(st) => st,
        };
        SegmentOutput::Async(Box::pin(a.zip(b).map(|(ra, rb)| match (ra, rb) {
            (Ok(a), Ok(b)) => Ok((a, b)),
            (Err(e), _) | (_, Err(e)) => Err(e),
        })))
    }
}

pub fn zip<A, B>(a: Stream<A>, b: Stream<B>) -> Stream<(A, B)>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    Stream::from_source(Source::Parent(Box::new(ZipSegment { a, b })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nagare_core::finalizers::to_array;

    #[tokio::test(start_paused = true)]
    async fn scenario_s8_combine_latest() {
        use std::time::Duration;
        let a = futures::stream::unfold(0u8, |step| async move {
            match step {
                0 => {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Some(("a1", 1))
                }
                1 => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Some(("a2", 2))
                }
                _ => None,
            }
        });
        let b = futures::stream::unfold(0u8, |step| async move {
            match step {
                0 => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Some((1, 1))
                }
                1 => {
                    tokio::time::sleep(Duration::from_millis(40)).await;
                    Some((2, 2))
                }
                _ => None,
            }
        });
        let s = combine_latest(Stream::from_async_stream(a), Stream::from_async_stream(b));
        let out = to_array(s).await.unwrap();
        assert_eq!(out, vec![("a1", 1), ("a2", 1), ("a2", 2)]);
    }

    #[tokio::test]
    async fn zip_pairs_by_index_and_stops_at_shorter() {
        let a = Stream::from_array(vec![1, 2, 3]);
        let b = Stream::from_array(vec!["x", "y"]);
        let out = to_array(zip(a, b)).await.unwrap();
        assert_eq!(out, vec![(1, "x"), (2, "y")]);
    }
}
