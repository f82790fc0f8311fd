//! `buffer(size)` (spec.md §4.3): accumulate and emit fixed-size chunks; flush the remainder
//! on completion. Type-changing (`T -> Vec<T>`), so — like `pairwise` — it is always a
//! pipeline-segment boundary rather than a fusable `Op`.

use nagare_core::error::NagareError;
use nagare_core::exec;
use nagare_core::stream::{Segment, SegmentOutput, Source, Stream};

struct BufferSegment<T> {
    parent: Stream<T>,
    size: usize,
}

impl<T> Segment<Vec<T>> for BufferSegment<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn run(self: Box<Self>) -> SegmentOutput<Vec<T>> {
        use futures::StreamExt;
        let BufferSegment { parent, size } = *self;
        if size == 0 {
            return SegmentOutput::Sync(Box::new(std::iter::once(Err(NagareError::TypeFault {
                expected: "buffer size > 0",
                stage: 0,
            }))));
        }
        let mut pending: Vec<T> = Vec::with_capacity(size);
        match exec::run_to_segment(parent) {
            SegmentOutput::Sync(it) => {
                let mut chunks: Vec<nagare_core::Result<Vec<T>>> = Vec::new();
                for r in it {
                    match r {
                        Ok(v) => {
                            pending.push(v);
                            if pending.len() == size {
                                chunks.push(Ok(std::mem::replace(&mut pending, Vec::with_capacity(size))));
                            }
                        }
                        Err(e) => {
                            chunks.push(Err(e));
                            pending.clear();
                        }
                    }
                }
                if !pending.is_empty() {
                    chunks.push(Ok(pending));
                }
                SegmentOutput::Sync(Box::new(chunks.into_iter()))
            }
            SegmentOutput::Async(st) => {
                let state = (st, pending, size, false);
                SegmentOutput::Async(Box::pin(futures::stream::unfold(state, move |(mut st, mut pending, size, mut done)| async move {
                    loop {
                        if done {
                            return None;
                        }
                        match st.next().await {
                            Some(Ok(v)) => {
                                pending.push(v);
                                if pending.len() == size {
                                    let chunk = std::mem::replace(&mut pending, Vec::with_capacity(size));
                                    return Some((Ok(chunk), (st, pending, size, done)));
                                }
                            }
                            Some(Err(e)) => {
                                pending.clear();
                                return Some((Err(e), (st, pending, size, done)));
                            }
                            None => {
                                done = true;
                                if !pending.is_empty() {
                                    let chunk = std::mem::replace(&mut pending, Vec::new());
                                    return Some((Ok(chunk), (st, pending, size, done)));
                                }
                                return None;
                            }
                        }
                    }
                })))
            }
        }
    }
}

pub fn buffer<T>(parent: Stream<T>, size: usize) -> Stream<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    Stream::from_source(Source::Parent(Box::new(BufferSegment { parent, size })))
}

pub trait BufferExt<T> {
    fn buffer(self, size: usize) -> Stream<Vec<T>>;
}

impl<T> BufferExt<T> for Stream<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn buffer(self, size: usize) -> Stream<Vec<T>> {
        buffer(self, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nagare_core::finalizers::to_array;

    #[tokio::test]
    async fn chunks_and_flushes_remainder() {
        let s = Stream::from_array(vec![1, 2, 3, 4, 5]).buffer(2);
        assert_eq!(to_array(s).await.unwrap(), vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[tokio::test]
    async fn exact_multiple_has_no_remainder() {
        let s = Stream::from_array(vec![1, 2, 3, 4]).buffer(2);
        assert_eq!(to_array(s).await.unwrap(), vec![vec![1, 2], vec![3, 4]]);
    }
}
