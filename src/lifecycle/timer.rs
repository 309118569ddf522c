//! Single-shot grace deadline.

use std::time::{Duration, Instant};

/// A cancellable, single-shot deadline.
///
/// Arming an armed timer moves the deadline; there is never more than one.
#[derive(Clone, Copy, Debug, Default)]
pub struct GraceTimer {
    deadline: Option<Instant>,
}

impl GraceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) to fire `duration` after `now`.
    pub fn arm(&mut self, now: Instant, duration: Duration) {
        self.deadline = Some(now + duration);
    }

    /// Disarm. Returns whether the timer was armed.
    pub fn disarm(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once an armed deadline has been reached.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_and_expire() {
        let t0 = Instant::now();
        let mut timer = GraceTimer::new();
        assert!(!timer.is_expired(t0 + Duration::from_secs(100)));

        timer.arm(t0, Duration::from_secs(10));
        assert!(timer.is_armed());
        assert!(!timer.is_expired(t0 + Duration::from_secs(9)));
        assert!(timer.is_expired(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn test_rearm_resets_instead_of_stacking() {
        let t0 = Instant::now();
        let mut timer = GraceTimer::new();

        timer.arm(t0, Duration::from_secs(10));
        timer.arm(t0 + Duration::from_secs(8), Duration::from_secs(10));

        assert_eq!(timer.deadline(), Some(t0 + Duration::from_secs(18)));
        assert!(!timer.is_expired(t0 + Duration::from_secs(12)));
    }

    #[test]
    fn test_disarm() {
        let t0 = Instant::now();
        let mut timer = GraceTimer::new();
        assert!(!timer.disarm());

        timer.arm(t0, Duration::from_secs(1));
        assert!(timer.disarm());
        assert!(!timer.is_armed());
        assert!(!timer.is_expired(t0 + Duration::from_secs(5)));
    }
}
