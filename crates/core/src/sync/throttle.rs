use std::time::Duration;

use tokio::time::Instant;

/// Leading-edge throttle: lets a value through at most once per `interval`.
///
/// Values arriving inside the window are remembered, and `flush` hands the
/// most recent one out so a final position (pause, end) is never lost.
/// `cancel` drops the pending value and closes the throttle for good.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    last_emit: Option<Instant>,
    pending: Option<T>,
    cancelled: bool,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            pending: None,
            cancelled: false,
        }
    }

    /// Returns the value if it may be emitted now, otherwise keeps it pending.
    pub fn offer(&mut self, value: T, now: Instant) -> Option<T> {
        if self.cancelled {
            return None;
        }
        let due = self
            .last_emit
            .is_none_or(|last| now.duration_since(last) >= self.interval);

        if due {
            self.last_emit = Some(now);
            self.pending = None;
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// Emits whatever was held back, ignoring the interval.
    pub fn flush(&mut self, now: Instant) -> Option<T> {
        if self.cancelled {
            return None;
        }
        let value = self.pending.take()?;
        self.last_emit = Some(now);
        Some(value)
    }

    /// Forgets the window so the next offer goes straight through.
    pub fn reset(&mut self) {
        self.last_emit = None;
        self.pending = None;
    }

    /// Starts a new window at `now` for a value emitted outside `offer`,
    /// dropping anything held from before it.
    pub fn mark(&mut self, now: Instant) {
        self.last_emit = Some(now);
        self.pending = None;
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.pending = None;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn emits_at_most_once_per_interval() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(SECOND);

        let emitted: Vec<f64> = (0..12)
            .filter_map(|i| {
                let now = t0 + Duration::from_millis(250 * i);
                throttle.offer(i as f64 * 0.25, now)
            })
            .collect();

        assert_eq!(emitted, vec![0.0, 1.0, 2.0]);
        assert!(throttle.has_pending());
    }

    #[test]
    fn flush_releases_latest_held_value() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(SECOND);
        assert_eq!(throttle.offer(1, t0), Some(1));
        assert_eq!(throttle.offer(2, t0 + Duration::from_millis(100)), None);
        assert_eq!(throttle.offer(3, t0 + Duration::from_millis(200)), None);
        assert_eq!(throttle.flush(t0 + Duration::from_millis(300)), Some(3));
        assert_eq!(throttle.flush(t0 + Duration::from_millis(400)), None);
    }

    #[test]
    fn reset_lets_next_value_through() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(SECOND);
        throttle.offer(1, t0);
        throttle.reset();
        assert_eq!(throttle.offer(2, t0 + Duration::from_millis(10)), Some(2));
    }

    #[test]
    fn mark_opens_a_fresh_window() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(SECOND);
        throttle.offer(1.0, t0);
        throttle.offer(1.5, t0 + Duration::from_millis(500));

        let jump = t0 + Duration::from_millis(600);
        throttle.mark(jump);
        assert!(!throttle.has_pending());
        assert_eq!(throttle.offer(2.0, jump + Duration::from_millis(250)), None);
        assert_eq!(throttle.offer(3.0, jump + SECOND), Some(3.0));
    }

    #[test]
    fn cancelled_throttle_emits_nothing() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(SECOND);
        throttle.offer(1, t0);
        throttle.offer(2, t0 + Duration::from_millis(10));
        throttle.cancel();
        assert!(throttle.is_cancelled());
        assert_eq!(throttle.flush(t0 + SECOND), None);
        assert_eq!(throttle.offer(3, t0 + SECOND * 5), None);
    }
}
