//! `DynamicBackpressure`: a composite admission policy combining a queue-depth bound, a
//! latency ceiling, and the [`AdaptiveBackpressure`] throughput check (spec.md §4.5).

use crate::adaptive::AdaptiveBackpressure;

#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    pub queue_size: usize,
    pub processing_rate: f64,
    pub input_rate: f64,
    pub latency_ms: f64,
    pub memory_usage: f64,
}

pub struct DynamicBackpressure {
    max_queue: usize,
    target_latency_ms: f64,
    adaptive: AdaptiveBackpressure,
}

impl DynamicBackpressure {
    pub fn new(max_queue: usize, adaptive: AdaptiveBackpressure, target_latency_ms: f64) -> Self {
        Self {
            max_queue,
            target_latency_ms,
            adaptive,
        }
    }

    /// Accepts or rejects based on `metrics`, feeding the observed latency back into the
    /// adaptive controller on either path.
    pub fn admit(&self, metrics: Metrics) -> bool {
        let reject = metrics.queue_size >= self.max_queue
            || metrics.latency_ms > 2.0 * self.target_latency_ms
            || self.adaptive.should_throttle(metrics.input_rate);
        self.adaptive.update(metrics.latency_ms);
        !reject
    }

    pub fn adaptive(&self) -> &AdaptiveBackpressure {
        &self.adaptive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(queue_size: usize, latency_ms: f64, input_rate: f64) -> Metrics {
        Metrics {
            queue_size,
            processing_rate: input_rate,
            input_rate,
            latency_ms,
            memory_usage: 0.0,
        }
    }

    #[test]
    fn rejects_when_queue_is_full() {
        let bp = DynamicBackpressure::new(10, AdaptiveBackpressure::new(100.0, 50.0, 10.0, 1000.0), 50.0);
        assert!(!bp.admit(metrics(10, 10.0, 10.0)));
    }

    #[test]
    fn rejects_when_latency_exceeds_double_target() {
        let bp = DynamicBackpressure::new(100, AdaptiveBackpressure::new(100.0, 50.0, 10.0, 1000.0), 50.0);
        assert!(!bp.admit(metrics(1, 200.0, 10.0)));
    }

    #[test]
    fn accepts_under_normal_conditions() {
        let bp = DynamicBackpressure::new(100, AdaptiveBackpressure::new(1000.0, 50.0, 10.0, 2000.0), 50.0);
        assert!(bp.admit(metrics(1, 10.0, 10.0)));
    }
}
