//! `switchMap(fn)` (spec.md §4.3): on each outer item, cancel the previous inner (by simply
//! dropping its stream — in Rust, dropping an in-flight future/stream is itself the
//! cancellation signal, there is no separate cancellation-token plumbing needed) and switch
//! to the new one.

use nagare_core::exec;
use nagare_core::stream::{FallibleAsyncStream, Segment, SegmentOutput, Source, Stream};
use std::sync::Arc;

struct SwitchMapSegment<T, U> {
    parent: Stream<T>,
    f: Arc<dyn Fn(T) -> Stream<U> + Send + Sync>,
}

fn to_async<U: Clone + Send + Sync + 'static>(s: Stream<U>) -> FallibleAsyncStream<U> {
    match exec::run_to_segment(s) {
        SegmentOutput::Sync(it) => Box::pin(futures::stream::iter(it)),
        SegmentOutput::Async(st) => st,
    }
}

struct SwitchMapState<T, U> {
    outer: FallibleAsyncStream<T>,
    outer_done: bool,
    inner: Option<FallibleAsyncStream<U>>,
    f: Arc<dyn Fn(T) -> Stream<U> + Send + Sync>,
}

async fn step<T, U>(mut st: SwitchMapState<T, U>) -> Option<(nagare_core::Result<U>, SwitchMapState<T, U>)>
where
    T: Send + 'static,
    U: Clone + Send + Sync + 'static,
{
    use futures::StreamExt;
    loop {
        match st.inner.take() {
            Some(mut cur) => {
                if st.outer_done {
                    match cur.next().await {
                        Some(Ok(v)) => {
                            st.inner = Some(cur);
                            return Some((Ok(v), st));
                        }
                        Some(Err(e)) => {
                            st.inner = Some(cur);
                            return Some((Err(e), st));
                        }
                        None => {}
                    }
                } else {
                    tokio::select! {
                        next_outer = st.outer.next() => match next_outer {
                            Some(Ok(v)) => {
                                // dropping `cur` here is the cancellation of the previous inner
                                st.inner = Some(to_async((st.f)(v)));
                            }
                            Some(Err(e)) => {
                                st.inner = Some(cur);
                                return Some((Err(e), st));
                            }
                            None => {
                                st.outer_done = true;
                                st.inner = Some(cur);
                            }
                        },
                        next_inner = cur.next() => match next_inner {
                            Some(Ok(v)) => {
                                st.inner = Some(cur);
                                return Some((Ok(v), st));
                            }
                            Some(Err(e)) => {
                                st.inner = Some(cur);
                                return Some((Err(e), st));
                            }
                            None => {}
                        },
                    }
                }
            }
            None => {
                if st.outer_done {
                    return None;
                }
                match st.outer.next().await {
                    Some(Ok(v)) => st.inner = Some(to_async((st.f)(v))),
                    Some(Err(e)) => return Some((Err(e), st)),
                    None => st.outer_done = true,
                }
            }
        }
    }
}

impl<T, U> Segment<U> for SwitchMapSegment<T, U>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    fn run(self: Box<Self>) -> SegmentOutput<U> {
        let SwitchMapSegment { parent, f } = *self;
        let state = SwitchMapState {
            outer: to_async(parent),
            outer_done: false,
            inner: None,
            f,
        };
        SegmentOutput::Async(Box::pin(futures::stream::unfold(state, step)))
    }
}

pub fn switch_map<T, U>(parent: Stream<T>, f: impl Fn(T) -> Stream<U> + Send + Sync + 'static) -> Stream<U>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    Stream::from_source(Source::Parent(Box::new(SwitchMapSegment { parent, f: Arc::new(f) })))
}

pub trait SwitchMapExt<T> {
    fn switch_map<U: Clone + Send + Sync + 'static>(
        self,
        f: impl Fn(T) -> Stream<U> + Send + Sync + 'static,
    ) -> Stream<U>;
}

impl<T: Clone + Send + Sync + 'static> SwitchMapExt<T> for Stream<T> {
    fn switch_map<U: Clone + Send + Sync + 'static>(
        self,
        f: impl Fn(T) -> Stream<U> + Send + Sync + 'static,
    ) -> Stream<U> {
        switch_map(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nagare_core::finalizers::to_array;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn switching_cancels_the_previous_inner() {
        let outer = futures::stream::unfold(0u8, |step| async move {
            match step {
                0 => Some((1, 1)),
                1 => {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Some((2, 2))
                }
                _ => None,
            }
        });
        let s = Stream::from_async_stream(outer).switch_map(|x: i64| {
            Stream::from_async_stream(futures::stream::unfold(0u8, move |tick| async move {
                if tick >= 3 {
                    return None;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
                Some((x * 100 + tick as i64, tick + 1))
            }))
        });
        let out = to_array(s).await.unwrap();
        // the first inner (x=1) never gets to emit before x=2 arrives and cancels it
        assert_eq!(out, vec![200, 201, 202]);
    }
}
