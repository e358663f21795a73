/// Milliseconds on the tick source's monotonic clock.
pub type Millis = u64;

/// A pausable deadline. Every timed wait in the state machines is one of these.
///
/// `passed` is true iff the clock is scheduled, not paused, and `now` reached
/// `scheduled_at + duration`.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    scheduled_at: Option<Millis>,
    duration: Millis,
    paused_at: Option<Millis>,
}

impl Clock {
    pub fn new() -> Clock {
        Clock::default()
    }

    pub fn schedule(&mut self, now: Millis, duration: Millis) {
        self.scheduled_at = Some(now);
        self.duration = duration;
        self.paused_at = None;
    }

    pub fn passed(&self, now: Millis) -> bool {
        match self.scheduled_at {
            Some(at) if self.paused_at.is_none() => now >= at.saturating_add(self.duration),
            _ => false,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled_at.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn pause(&mut self, now: Millis) {
        if self.scheduled_at.is_some() && self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    /// Shifts the deadline by the time spent paused.
    pub fn resume(&mut self, now: Millis) {
        if let (Some(at), Some(paused_at)) = (self.scheduled_at, self.paused_at.take()) {
            self.scheduled_at = Some(at + now.saturating_sub(paused_at));
        }
    }

    pub fn reset(&mut self) {
        *self = Clock::default();
    }

    pub fn remaining(&self, now: Millis) -> Millis {
        let at = match self.scheduled_at {
            Some(at) => at,
            None => return 0,
        };
        let reference = self.paused_at.unwrap_or(now);
        (at + self.duration).saturating_sub(reference)
    }

    /// Time since the clock was scheduled, frozen while paused.
    pub fn elapsed(&self, now: Millis) -> Millis {
        match self.scheduled_at {
            Some(at) => self.paused_at.unwrap_or(now).saturating_sub(at),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscheduled_never_passes() {
        let clock = Clock::new();
        assert!(!clock.passed(0));
        assert!(!clock.passed(u64::MAX));
        assert!(!clock.is_scheduled());
    }

    #[test]
    fn passes_after_duration() {
        let mut clock = Clock::new();
        clock.schedule(1_000, 500);
        assert!(!clock.passed(1_000));
        assert!(!clock.passed(1_499));
        assert!(clock.passed(1_500));
    }

    #[test]
    fn pause_keeps_remaining_time() {
        let mut clock = Clock::new();
        clock.schedule(0, 1_000);
        clock.pause(300);
        assert!(!clock.passed(5_000));
        assert_eq!(clock.remaining(5_000), 700);
        clock.resume(5_000);
        assert!(clock.remaining(5_000) >= 700);
        assert!(!clock.passed(5_699));
        assert!(clock.passed(5_700));
    }

    #[test]
    fn reset_clears_schedule() {
        let mut clock = Clock::new();
        clock.schedule(0, 10);
        clock.reset();
        assert!(!clock.is_scheduled());
        assert!(!clock.passed(100));
    }
}
