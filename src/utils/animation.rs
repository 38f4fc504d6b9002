use std::time::{Duration, Instant};

/// Default length of a KPI count-up
pub const COUNT_UP_DURATION: Duration = Duration::from_millis(2000);

/// `1 - (1 - p)^3`, clamped to `[0, 1]`
pub fn ease_out_cubic(progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

/// Counts a KPI up from zero to its value.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterAnimation {
    target: f64,
    duration: Duration,
    started: Option<Instant>,
}

impl CounterAnimation {
    pub fn new(target: f64, duration: Duration) -> Self {
        Self {
            target,
            duration,
            started: None,
        }
    }

    /// Start counting. Calling again after the start has no effect.
    pub fn start(&mut self, now: Instant) {
        self.started.get_or_insert(now);
    }

    pub fn is_started(&self) -> bool {
        self.started.is_some()
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Jump to a new value, restarting from zero on the next `start`
    pub fn retarget(&mut self, target: f64) {
        if target != self.target {
            self.target = target;
            self.started = None;
        }
    }

    /// Value after `elapsed`. The final frame is exactly the target.
    pub fn value_at(&self, elapsed: Duration) -> f64 {
        if self.duration.is_zero() || elapsed >= self.duration {
            return self.target;
        }
        let progress = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        ease_out_cubic(progress) * self.target
    }

    pub fn current(&self, now: Instant) -> f64 {
        match self.started {
            Some(start) => self.value_at(now.saturating_duration_since(start)),
            None => 0.0,
        }
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.started
            .map(|start| now.saturating_duration_since(start) >= self.duration)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ease_out_cubic() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_cubic(0.5), 0.875);
        assert_eq!(ease_out_cubic(3.0), 1.0);
    }

    #[test]
    fn test_counter_ends_on_exact_value() {
        let counter = CounterAnimation::new(440962.0, COUNT_UP_DURATION);
        assert_eq!(counter.value_at(Duration::ZERO), 0.0);
        assert_eq!(counter.value_at(Duration::from_millis(1000)), 0.875 * 440962.0);
        assert_eq!(counter.value_at(COUNT_UP_DURATION), 440962.0);
        assert_eq!(counter.value_at(Duration::from_secs(60)), 440962.0);
    }

    #[test]
    fn test_counter_before_start_is_zero() {
        let mut counter = CounterAnimation::new(10.0, Duration::from_millis(100));
        let now = Instant::now();
        assert_eq!(counter.current(now), 0.0);
        assert!(!counter.is_finished(now));

        counter.start(now);
        counter.start(now + Duration::from_millis(50));
        assert!(counter.is_finished(now + Duration::from_millis(100)));
        assert_eq!(counter.current(now + Duration::from_millis(100)), 10.0);
    }

    #[test]
    fn test_zero_duration_is_instant() {
        let counter = CounterAnimation::new(1.7, Duration::ZERO);
        assert_eq!(counter.value_at(Duration::ZERO), 1.7);
    }

    #[test]
    fn test_retarget_restarts() {
        let mut counter = CounterAnimation::new(1.0, COUNT_UP_DURATION);
        counter.start(Instant::now());
        counter.retarget(2.0);
        assert!(!counter.is_started());
        assert_eq!(counter.target(), 2.0);
    }
}
