//! `AdaptiveBackpressure`: a target-latency feedback rate controller (spec.md §4.5).

use parking_lot::Mutex;

pub struct AdaptiveBackpressure {
    rate: Mutex<f64>,
    target_latency_ms: f64,
    min_rate: f64,
    max_rate: f64,
    gain: f64,
}

impl AdaptiveBackpressure {
    pub fn new(initial_rate: f64, target_latency_ms: f64, min_rate: f64, max_rate: f64) -> Self {
        Self::with_gain(initial_rate, target_latency_ms, min_rate, max_rate, 0.2)
    }

    pub fn with_gain(initial_rate: f64, target_latency_ms: f64, min_rate: f64, max_rate: f64, gain: f64) -> Self {
        Self {
            rate: Mutex::new(initial_rate.clamp(min_rate, max_rate)),
            target_latency_ms,
            min_rate,
            max_rate,
            gain,
        }
    }

    /// `error = target - observed`; `rate <- clamp(rate * (1 + gain*error/target), min, max)`.
    pub fn update(&self, observed_latency_ms: f64) -> f64 {
        let mut rate = self.rate.lock();
        let error = self.target_latency_ms - observed_latency_ms;
        let adjusted = *rate * (1.0 + self.gain * error / self.target_latency_ms);
        *rate = adjusted.clamp(self.min_rate, self.max_rate);
        *rate
    }

    pub fn rate(&self) -> f64 {
        *self.rate.lock()
    }

    pub fn should_throttle(&self, current_throughput: f64) -> bool {
        current_throughput > self.rate()
    }

    pub fn delay_ms(&self) -> u64 {
        (1000.0 / self.rate()).floor() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_increases_rate_when_latency_below_target() {
        let ctrl = AdaptiveBackpressure::new(100.0, 50.0, 10.0, 1000.0);
        let rate = ctrl.update(25.0);
        assert!(rate > 100.0);
    }

    #[test]
    fn update_decreases_rate_when_latency_above_target() {
        let ctrl = AdaptiveBackpressure::new(100.0, 50.0, 10.0, 1000.0);
        let rate = ctrl.update(100.0);
        assert!(rate < 100.0);
    }

    #[test]
    fn rate_is_clamped_to_bounds() {
        let ctrl = AdaptiveBackpressure::new(100.0, 50.0, 90.0, 110.0);
        for _ in 0..50 {
            ctrl.update(1000.0);
        }
        assert!(ctrl.rate() >= 90.0);
    }

    #[test]
    fn should_throttle_compares_against_current_rate() {
        let ctrl = AdaptiveBackpressure::new(100.0, 50.0, 10.0, 1000.0);
        assert!(ctrl.should_throttle(150.0));
        assert!(!ctrl.should_throttle(50.0));
    }

    #[test]
    fn delay_ms_is_inverse_of_rate() {
        let ctrl = AdaptiveBackpressure::new(100.0, 50.0, 10.0, 1000.0);
        assert_eq!(ctrl.delay_ms(), 10);
    }
}
