//! `debounce(ms)` (spec.md §4.3): on each upstream item, reset a one-shot timer to `ms`;
//! when the timer fires, emit the last value. On upstream completion, flush the pending
//! value. Unlike the fusion-eligible operators, this always drives the parent to an async
//! segment and interleaves it with a `tokio::time::Sleep`, following the "background
//! producer, single consumer" scheduling contract of spec.md §4.3/§5 — in this
//! single-threaded-cooperative implementation, the producer and the timer are just two
//! branches of the same `tokio::select!` rather than a separate spawned task.

use nagare_core::exec;
use nagare_core::stream::{FallibleAsyncStream, Segment, SegmentOutput, Source, Stream};
use std::time::Duration;

struct DebounceSegment<T> {
    parent: Stream<T>,
    duration: Duration,
}

struct DebounceState<T> {
    upstream: FallibleAsyncStream<T>,
    pending: Option<T>,
    sleep: Option<std::pin::Pin<Box<tokio::time::Sleep>>>,
    duration: Duration,
}

async fn step<T: Send + 'static>(mut st: DebounceState<T>) -> Option<(nagare_core::Result<T>, DebounceState<T>)> {
    use futures::StreamExt;
    loop {
        if let Some(mut sleep) = st.sleep.take() {
            tokio::select! {
                item = st.upstream.next() => match item {
                    Some(Ok(v)) => {
                        st.pending = Some(v);
                        st.sleep = Some(Box::pin(tokio::time::sleep(st.duration)));
                    }
                    Some(Err(e)) => return Some((Err(e), st)),
                    None => {
                        if let Some(v) = st.pending.take() {
                            return Some((Ok(v), st));
                        }
                        return None;
                    }
                },
                _ = sleep.as_mut() => {
                    if let Some(v) = st.pending.take() {
                        return Some((Ok(v), st));
                    }
                }
            }
        } else {
            match st.upstream.next().await {
                Some(Ok(v)) => {
                    st.pending = Some(v);
                    st.sleep = Some(Box::pin(tokio::time::sleep(st.duration)));
                }
                Some(Err(e)) => return Some((Err(e), st)),
                None => return None,
            }
        }
    }
}

impl<T> Segment<T> for DebounceSegment<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn run(self: Box<Self>) -> SegmentOutput<T> {
        let DebounceSegment { parent, duration } = *self;
        let upstream = match exec::run_to_segment(parent) {
            SegmentOutput::Sync(it) => Box::pin(futures::stream::iter(it)) as FallibleAsyncStream<T>,
            SegmentOutput::Async(st) => st,
        };
        let state = DebounceState {
            upstream,
            pending: None,
            sleep: None,
            duration,
        };
        SegmentOutput::Async(Box::pin(futures::stream::unfold(state, step)))
    }
}

pub fn debounce<T>(parent: Stream<T>, duration: Duration) -> Stream<T>
where
    T: Clone + Send + Sync + 'static,
{
    Stream::from_source(Source::Parent(Box::new(DebounceSegment { parent, duration })))
}

pub trait DebounceExt<T> {
    fn debounce(self, duration: Duration) -> Stream<T>;
}

impl<T> DebounceExt<T> for Stream<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn debounce(self, duration: Duration) -> Stream<T> {
        debounce(self, duration)
    }
}
