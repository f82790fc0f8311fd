//! `bufferTime(ms)` (spec.md §4.3): open a window on first arrival; emit on every interval
//! tick if non-empty; emit the remainder on completion.

use nagare_core::exec;
use nagare_core::stream::{FallibleAsyncStream, Segment, SegmentOutput, Source, Stream};
use std::time::Duration;

struct BufferTimeSegment<T> {
    parent: Stream<T>,
    duration: Duration,
}

struct BufferTimeState<T> {
    upstream: FallibleAsyncStream<T>,
    pending: Vec<T>,
    sleep: Option<std::pin::Pin<Box<tokio::time::Sleep>>>,
    duration: Duration,
}

async fn step<T: Send + 'static>(mut st: BufferTimeState<T>) -> Option<(nagare_core::Result<Vec<T>>, BufferTimeState<T>)> {
    use futures::StreamExt;
    loop {
        if let Some(mut sleep) = st.sleep.take() {
            tokio::select! {
                item = st.upstream.next() => match item {
                    Some(Ok(v)) => {
                        st.pending.push(v);
                        st.sleep = Some(sleep);
                    }
                    Some(Err(e)) => {
                        st.sleep = Some(sleep);
                        return Some((Err(e), st));
                    }
                    None => {
                        if !st.pending.is_empty() {
                            let chunk = std::mem::take(&mut st.pending);
                            return Some((Ok(chunk), st));
                        }
                        return None;
                    }
                },
                _ = sleep.as_mut() => {
                    if !st.pending.is_empty() {
                        let chunk = std::mem::take(&mut st.pending);
                        st.sleep = Some(Box::pin(tokio::time::sleep(st.duration)));
                        return Some((Ok(chunk), st));
                    }
                    st.sleep = Some(Box::pin(tokio::time::sleep(st.duration)));
                }
            }
        } else {
            match st.upstream.next().await {
                Some(Ok(v)) => {
                    st.pending.push(v);
                    st.sleep = Some(Box::pin(tokio::time::sleep(st.duration)));
                }
                Some(Err(e)) => return Some((Err(e), st)),
                None => return None,
            }
        }
    }
}

impl<T> Segment<Vec<T>> for BufferTimeSegment<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn run(self: Box<Self>) -> SegmentOutput<Vec<T>> {
        let BufferTimeSegment { parent, duration } = *self;
        let upstream = match exec::run_to_segment(parent) {
            SegmentOutput::Sync(it) => Box::pin(futures::stream::iter(it)) as FallibleAsyncStream<T>,
            SegmentOutput::Async(st) => st,
        };
        let state = BufferTimeState {
            upstream,
            pending: Vec::new(),
            sleep: None,
            duration,
        };
        SegmentOutput::Async(Box::pin(futures::stream::unfold(state, step)))
    }
}

pub fn buffer_time<T>(parent: Stream<T>, duration: Duration) -> Stream<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    Stream::from_source(Source::Parent(Box::new(BufferTimeSegment { parent, duration })))
}

pub trait BufferTimeExt<T> {
    fn buffer_time(self, duration: Duration) -> Stream<Vec<T>>;
}

impl<T> BufferTimeExt<T> for Stream<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn buffer_time(self, duration: Duration) -> Stream<Vec<T>> {
        buffer_time(self, duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nagare_core::finalizers::to_array;

    #[tokio::test(start_paused = true)]
    async fn windows_on_interval_and_flushes_remainder() {
        let source = futures::stream::unfold(0u8, |step| async move {
            let delay = match step {
                0 => 0,
                1 => 3,
                2 => 3,
                3 => 12,
                4 => 3,
                _ => return None,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Some((step + 1, step + 1))
        });
        let s = Stream::from_async_stream(source).buffer_time(Duration::from_millis(10));
        let out = to_array(s).await.unwrap();
        assert_eq!(out, vec![vec![1, 2, 3], vec![4], vec![5]]);
    }
}
