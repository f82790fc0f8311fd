//! Sliding-window aggregation (spec.md §4.4): circular buffer plus incremental sum and two
//! monotonic deques, amortized O(1) per element for `sum`/`mean`/`min`/`max`.

use nagare_core::error::{NagareError, Result};
use nagare_core::stream::{SegmentOutput, Segment, Source, Stream};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggOp {
    Sum,
    Mean,
    Min,
    Max,
}

/// Fixed-capacity sliding window over `f64`. `push` returns `None` until the window fills
/// (`count == W`), then `Some(aggregate)` on every subsequent item, per spec.md §4.4.
pub struct WindowedAggregator {
    window: usize,
    op: AggOp,
    buf: VecDeque<f64>,
    sum: f64,
    dq_max: VecDeque<(f64, u64)>,
    dq_min: VecDeque<(f64, u64)>,
    index: u64,
}

impl WindowedAggregator {
    pub fn new(window: usize, op: AggOp) -> Result<Self> {
        if window == 0 {
            return Err(NagareError::TypeFault {
                expected: "window size > 0",
                stage: 0,
            });
        }
        Ok(Self {
            window,
            op,
            buf: VecDeque::with_capacity(window),
            sum: 0.0,
            dq_max: VecDeque::new(),
            dq_min: VecDeque::new(),
            index: 0,
        })
    }

    pub fn push(&mut self, value: f64) -> Option<f64> {
        let idx = self.index;
        self.index += 1;

        self.buf.push_back(value);
        self.sum += value;

        while matches!(self.dq_max.back(), Some(&(v, _)) if v <= value) {
            self.dq_max.pop_back();
        }
        self.dq_max.push_back((value, idx));

        while matches!(self.dq_min.back(), Some(&(v, _)) if v >= value) {
            self.dq_min.pop_back();
        }
        self.dq_min.push_back((value, idx));

        if self.buf.len() > self.window {
            let evicted = self.buf.pop_front().expect("buf non-empty");
            self.sum -= evicted;
        }

        let window_start = idx.saturating_sub(self.window as u64 - 1);
        while matches!(self.dq_max.front(), Some(&(_, i)) if i < window_start) {
            self.dq_max.pop_front();
        }
        while matches!(self.dq_min.front(), Some(&(_, i)) if i < window_start) {
            self.dq_min.pop_front();
        }

        if self.buf.len() < self.window {
            return None;
        }

        Some(match self.op {
            AggOp::Sum => self.sum,
            AggOp::Mean => self.sum / self.window as f64,
            AggOp::Max => self.dq_max.front().expect("window full").0,
            AggOp::Min => self.dq_min.front().expect("window full").0,
        })
    }
}

/// A `Source::Parent` boundary that drains its parent stream through a fresh
/// [`WindowedAggregator`], emitting only once the window fills. Mirrors the structure of
/// `nagare_core::stream::Boundary` but, unlike a plain `map`, may drop items (the warm-up
/// prefix shorter than `W - 1`).
struct WindowSegment {
    parent: Stream<f64>,
    window: usize,
    op: AggOp,
}

impl Segment<f64> for WindowSegment {
    fn run(self: Box<Self>) -> SegmentOutput<f64> {
        use futures::StreamExt;
        let WindowSegment { parent, window, op } = *self;
        let mut agg = match WindowedAggregator::new(window, op) {
            Ok(agg) => agg,
            Err(e) => return SegmentOutput::Sync(Box::new(std::iter::once(Err(e)))),
        };
        match nagare_core::exec::run_to_segment(parent) {
            SegmentOutput::Sync(it) => SegmentOutput::Sync(Box::new(it.filter_map(move |r| match r {
                Ok(v) => agg.push(v).map(Ok),
                Err(e) => Some(Err(e)),
            }))),
            SegmentOutput::Async(st) => SegmentOutput::Async(Box::pin(st.filter_map(move |r| {
                let out = match r {
                    Ok(v) => agg.push(v).map(Ok),
                    Err(e) => Some(Err(e)),
                };
                async move { out }
            }))),
        }
    }
}

/// `Stream<f64>::windowed_aggregate(window, op)` — always crosses a pipeline-segment
/// boundary since it is not part of the fusion-eligible operator set (spec.md §4.4 is its
/// own subsystem, not a tagged `Op`).
pub fn windowed_aggregate(parent: Stream<f64>, window: usize, op: AggOp) -> Stream<f64> {
    Stream::from_source(Source::Parent(Box::new(WindowSegment { parent, window, op })))
}

pub trait WindowedStreamExt {
    fn windowed_aggregate(self, window: usize, op: AggOp) -> Stream<f64>;
}

impl WindowedStreamExt for Stream<f64> {
    fn windowed_aggregate(self, window: usize, op: AggOp) -> Stream<f64> {
        windowed_aggregate(self, window, op)
    }
}
