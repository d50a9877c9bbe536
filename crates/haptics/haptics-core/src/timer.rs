//! Cancellable scheduled-repeat task driven by host time.
//!
//! The host advances the timer with elapsed time (a frame tick, an interval
//! callback, ...). A timer holds at most one task; scheduling replaces it.

use std::time::Duration;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RepeatTask {
    generation: u64,
    interval: Duration,
    elapsed: Duration,
}

#[derive(Clone, Debug, Default)]
pub struct RepeatTimer {
    task: Option<RepeatTask>,
    generation: u64,
}

impl RepeatTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any pending task with one firing every `interval`. Returns the
    /// new task's generation.
    pub fn schedule(&mut self, interval: Duration) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.task = Some(RepeatTask {
            generation: self.generation,
            interval: interval.max(MIN_INTERVAL),
            elapsed: Duration::ZERO,
        });
        self.generation
    }

    /// Drop the pending task. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.task.take().is_some()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    /// Generation of the active task, if any.
    pub fn active_generation(&self) -> Option<u64> {
        self.task.map(|t| t.generation)
    }

    pub fn interval(&self) -> Option<Duration> {
        self.task.map(|t| t.interval)
    }

    pub fn until_next_fire(&self) -> Option<Duration> {
        self.task.map(|t| t.interval.saturating_sub(t.elapsed))
    }

    /// Advance by `dt`. Fires at most once per call; intervals missed within a
    /// single large step are coalesced into that one fire.
    pub fn advance(&mut self, dt: Duration) -> bool {
        let Some(task) = self.task.as_mut() else {
            return false;
        };
        task.elapsed += dt;
        if task.elapsed < task.interval {
            return false;
        }
        let rem = task.elapsed.as_nanos() % task.interval.as_nanos();
        task.elapsed = Duration::from_nanos(rem as u64);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn fires_on_each_interval() {
        let mut t = RepeatTimer::new();
        t.schedule(ms(100));
        assert!(!t.advance(ms(60)));
        assert!(t.advance(ms(40)));
        assert!(!t.advance(ms(99)));
        assert!(t.advance(ms(1)));
    }

    #[test]
    fn large_steps_coalesce_into_one_fire() {
        let mut t = RepeatTimer::new();
        t.schedule(ms(100));
        assert!(t.advance(ms(350)));
        assert_eq!(t.until_next_fire(), Some(ms(50)));
        assert!(t.advance(ms(50)));
    }

    #[test]
    fn cancel_stops_all_future_fires() {
        let mut t = RepeatTimer::new();
        t.schedule(ms(10));
        assert!(t.cancel());
        assert!(!t.cancel());
        for _ in 0..10 {
            assert!(!t.advance(ms(10)));
        }
    }

    #[test]
    fn schedule_replaces_instead_of_stacking() {
        let mut t = RepeatTimer::new();
        let first = t.schedule(ms(100));
        t.advance(ms(90));
        let second = t.schedule(ms(100));
        assert_ne!(first, second);
        assert_eq!(t.active_generation(), Some(second));
        // the elapsed time of the replaced task is gone
        assert!(!t.advance(ms(20)));
    }

    #[test]
    fn zero_interval_is_floored() {
        let mut t = RepeatTimer::new();
        t.schedule(Duration::ZERO);
        assert_eq!(t.interval(), Some(MIN_INTERVAL));
        assert!(!t.advance(Duration::ZERO));
    }
}
