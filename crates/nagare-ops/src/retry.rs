//! `retry(max, delay)` (spec.md §4.3/§7): on a fault while producing an item, re-attempt
//! that same item up to `max` times with linear backoff `delay · attempt`. Per §7, "retry
//! wrapping applies only to the final emit step; it cannot recover from state-corrupting
//! upstream errors" — so this wraps a single retryable step `f`, not the whole upstream
//! subscription (resubscribing a stateful source from scratch is a different, riskier
//! operator the spec does not actually ask for).

use nagare_core::error::NagareError;
use nagare_core::exec;
use nagare_core::stream::{FallibleAsyncStream, Segment, SegmentOutput, Source, Stream};
use std::sync::Arc;
use std::time::Duration;

struct RetrySegment<T> {
    parent: Stream<T>,
    f: Arc<dyn Fn(T) -> nagare_core::Result<T> + Send + Sync>,
    max: u32,
    delay: Duration,
}

async fn attempt<T: Clone + Send + 'static>(
    item: T,
    f: &Arc<dyn Fn(T) -> nagare_core::Result<T> + Send + Sync>,
    max: u32,
    delay: Duration,
) -> nagare_core::Result<T> {
    let mut last_err: Option<NagareError> = None;
    for n in 0..=max {
        match f(item.clone()) {
            Ok(v) => return Ok(v),
            Err(e) => {
                last_err = Some(e);
                if n < max {
                    tokio::time::sleep(delay * (n + 1)).await;
                }
            }
        }
    }
    Err(last_err.expect("loop runs at least once"))
}

impl<T> Segment<T> for RetrySegment<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn run(self: Box<Self>) -> SegmentOutput<T> {
        use futures::StreamExt;
        let RetrySegment { parent, f, max, delay } = *self;
        let upstream = match exec::run_to_segment(parent) {
            SegmentOutput::Sync(it) => Box::pin(futures::stream::iter(it)) as FallibleAsyncStream<T>,
            SegmentOutput::Async(st) => st,
        };
        SegmentOutput::Async(Box::pin(upstream.then(move |r| {
            let f = f.clone();
            async move {
                match r {
                    Ok(v) => attempt(v, &f, max, delay).await,
                    Err(e) => Err(e),
                }
            }
        })))
    }
}

pub fn retry<T>(
    parent: Stream<T>,
    f: impl Fn(T) -> nagare_core::Result<T> + Send + Sync + 'static,
    max: u32,
    delay: Duration,
) -> Stream<T>
where
    T: Clone + Send + Sync + 'static,
{
    Stream::from_source(Source::Parent(Box::new(RetrySegment {
        parent,
        f: Arc::new(f),
        max,
        delay,
    })))
}

pub trait RetryExt<T> {
    fn retry(self, f: impl Fn(T) -> nagare_core::Result<T> + Send + Sync + 'static, max: u32, delay: Duration) -> Stream<T>;
}

impl<T: Clone + Send + Sync + 'static> RetryExt<T> for Stream<T> {
    fn retry(self, f: impl Fn(T) -> nagare_core::Result<T> + Send + Sync + 'static, max: u32, delay: Duration) -> Stream<T> {
        retry(self, f, max, delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nagare_core::finalizers::to_array;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();
        let s = Stream::from_array(vec![5]).retry(
            move |x| {
                let n = calls2.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(NagareError::operator_fault(0, "transient"))
                } else {
                    Ok(x)
                }
            },
            5,
            Duration::from_millis(1),
        );
        assert_eq!(to_array(s).await.unwrap(), vec![5]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let s = Stream::from_array(vec![5]).retry(
            |_| Err(NagareError::operator_fault(0, "permanent")),
            2,
            Duration::from_millis(1),
        );
        assert!(to_array(s).await.is_err());
    }
}
