//! `WindowedRateLimiter`: a sliding-time-window event limiter (spec.md §4.5).

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub struct WindowedRateLimiter {
    window: Duration,
    max_events: usize,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl WindowedRateLimiter {
    pub fn new(window_ms: u64, max_events: usize) -> Self {
        Self {
            window: Duration::from_millis(window_ms),
            max_events,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    fn evict_expired(&self, timestamps: &mut VecDeque<Instant>, now: Instant) {
        while matches!(timestamps.front(), Some(&t) if now.duration_since(t) > self.window) {
            timestamps.pop_front();
        }
    }

    pub fn try_acquire(&self, now: Instant) -> bool {
        let mut timestamps = self.timestamps.lock();
        self.evict_expired(&mut timestamps, now);
        if timestamps.len() < self.max_events {
            timestamps.push_back(now);
            true
        } else {
            false
        }
    }

    pub fn current_rate(&self, now: Instant) -> f64 {
        let mut timestamps = self.timestamps.lock();
        self.evict_expired(&mut timestamps, now);
        timestamps.len() as f64 * 1000.0 / self.window.as_millis() as f64
    }

    pub fn available_slots(&self, now: Instant) -> usize {
        let mut timestamps = self.timestamps.lock();
        self.evict_expired(&mut timestamps, now);
        self.max_events.saturating_sub(timestamps.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_the_bound_within_a_window() {
        let limiter = WindowedRateLimiter::new(1000, 3);
        let t0 = Instant::now();
        assert!(limiter.try_acquire(t0));
        assert!(limiter.try_acquire(t0));
        assert!(limiter.try_acquire(t0));
        assert!(!limiter.try_acquire(t0));
    }

    #[test]
    fn expired_events_free_up_slots() {
        let limiter = WindowedRateLimiter::new(100, 1);
        let t0 = Instant::now();
        assert!(limiter.try_acquire(t0));
        assert!(!limiter.try_acquire(t0));
        let t1 = t0 + Duration::from_millis(200);
        assert!(limiter.try_acquire(t1));
    }

    #[test]
    fn available_slots_tracks_occupancy() {
        let limiter = WindowedRateLimiter::new(1000, 5);
        let t0 = Instant::now();
        limiter.try_acquire(t0);
        limiter.try_acquire(t0);
        assert_eq!(limiter.available_slots(t0), 3);
    }
}
