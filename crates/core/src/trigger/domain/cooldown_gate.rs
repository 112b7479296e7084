use std::time::{Duration, Instant};

/// Wall-clock suppression window.
///
/// Active while `now < until`. There is no exit event: once the deadline
/// passes, the gate is simply open again.
#[derive(Debug, Clone)]
pub struct CooldownGate {
    duration: Duration,
    until: Option<Instant>,
}

impl CooldownGate {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            until: None,
        }
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now < until)
    }

    /// Starts (or restarts) the window at `now`, returning its deadline.
    pub fn enter(&mut self, now: Instant) -> Instant {
        let until = now + self.duration;
        self.until = Some(until);
        until
    }

    pub fn until(&self) -> Option<Instant> {
        self.until
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_before_first_entry() {
        let gate = CooldownGate::new(Duration::from_millis(2000));
        assert!(!gate.is_active(Instant::now()));
        assert!(gate.until().is_none());
    }

    #[test]
    fn test_active_window_is_half_open() {
        let t0 = Instant::now();
        let mut gate = CooldownGate::new(Duration::from_millis(2000));
        let until = gate.enter(t0);

        assert_eq!(until, t0 + Duration::from_millis(2000));
        assert!(gate.is_active(t0));
        assert!(gate.is_active(t0 + Duration::from_millis(1999)));
        assert!(!gate.is_active(t0 + Duration::from_millis(2000)));
        assert!(!gate.is_active(t0 + Duration::from_millis(5000)));
    }

    #[test]
    fn test_earlier_timestamps_are_suppressed() {
        // Late-arriving results for frames captured before entry still fall
        // inside the window.
        let t0 = Instant::now() + Duration::from_secs(1);
        let mut gate = CooldownGate::new(Duration::from_millis(500));
        gate.enter(t0);
        assert!(gate.is_active(t0 - Duration::from_millis(100)));
    }

    #[test]
    fn test_zero_duration_never_active() {
        let t0 = Instant::now();
        let mut gate = CooldownGate::new(Duration::ZERO);
        gate.enter(t0);
        assert!(!gate.is_active(t0));
    }
}
