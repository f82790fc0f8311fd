//! `throttle(ms)` (spec.md §4.3): emit the first item, then drop items arriving within `ms`
//! of the last emission.

use nagare_core::exec;
use nagare_core::stream::{FallibleAsyncStream, Segment, SegmentOutput, Source, Stream};
use std::time::Duration;
use tokio::time::Instant;

struct ThrottleSegment<T> {
    parent: Stream<T>,
    duration: Duration,
}

struct ThrottleState<T> {
    upstream: FallibleAsyncStream<T>,
    last_emit: Option<Instant>,
    duration: Duration,
}

async fn step<T: Send + 'static>(mut st: ThrottleState<T>) -> Option<(nagare_core::Result<T>, ThrottleState<T>)> {
    use futures::StreamExt;
    loop {
        match st.upstream.next().await {
            None => return None,
            Some(Err(e)) => return Some((Err(e), st)),
            Some(Ok(v)) => {
                let now = Instant::now();
                let allow = match st.last_emit {
                    None => true,
                    Some(t) => now.duration_since(t) >= st.duration,
                };
                if allow {
                    st.last_emit = Some(now);
                    return Some((Ok(v), st));
                }
            }
        }
    }
}

impl<T> Segment<T> for ThrottleSegment<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn run(self: Box<Self>) -> SegmentOutput<T> {
        let ThrottleSegment { parent, duration } = *self;
        let upstream = match exec::run_to_segment(parent) {
            SegmentOutput::Sync(it) => Box::pin(futures::stream::iter(it)) as FallibleAsyncStream<T>,
            SegmentOutput::Async(st) => st,
        };
        let state = ThrottleState {
            upstream,
            last_emit: None,
            duration,
        };
        SegmentOutput::Async(Box::pin(futures::stream::unfold(state, step)))
    }
}

pub fn throttle<T>(parent: Stream<T>, duration: Duration) -> Stream<T>
where
    T: Clone + Send + Sync + 'static,
{
    Stream::from_source(Source::Parent(Box::new(ThrottleSegment { parent, duration })))
}

pub trait ThrottleExt<T> {
    fn throttle(self, duration: Duration) -> Stream<T>;
}

impl<T> ThrottleExt<T> for Stream<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn throttle(self, duration: Duration) -> Stream<T> {
        throttle(self, duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nagare_core::finalizers::to_array;

    #[tokio::test(start_paused = true)]
    async fn emits_first_then_drops_within_window() {
        let source = futures::stream::unfold(0u8, |step| async move {
            let delay = match step {
                0 => 0,
                1 => 2,
                2 => 15,
                _ => return None,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Some((step + 1, step + 1))
        });
        let s = Stream::from_async_stream(source).throttle(Duration::from_millis(10));
        let out = to_array(s).await.unwrap();
        assert_eq!(out, vec![1, 3]);
    }
}
