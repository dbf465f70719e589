//! Heartbeat watchdog
//!
//! The hub sends a `_0` heartbeat event periodically. If none arrives within
//! the timeout the TCP connection is presumed dead even though reads are
//! still only timing out. The watchdog is a deadline the receive loop checks
//! on every iteration; because reads time out, expiry is noticed within one
//! read timeout.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct HeartbeatWatchdog {
    timeout: Duration,
    deadline: Option<Instant>,
}

impl HeartbeatWatchdog {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
        }
    }

    /// Start or restart the countdown from `now`
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.timeout);
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether an armed watchdog has passed its deadline
    pub fn expired(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(deadline) if now >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(250);

    #[test]
    fn test_disarmed_never_expires() {
        let watchdog = HeartbeatWatchdog::new(TIMEOUT);
        assert!(!watchdog.expired(Instant::now() + Duration::from_secs(10_000)));
    }

    #[test]
    fn test_expires_at_deadline() {
        let start = Instant::now();
        let mut watchdog = HeartbeatWatchdog::new(TIMEOUT);
        watchdog.arm(start);

        assert!(!watchdog.expired(start + Duration::from_secs(249)));
        assert!(watchdog.expired(start + TIMEOUT));
    }

    #[test]
    fn test_rearm_pushes_deadline_forward() {
        let start = Instant::now();
        let mut watchdog = HeartbeatWatchdog::new(TIMEOUT);
        watchdog.arm(start);
        let first = watchdog.deadline().unwrap();

        watchdog.arm(start + Duration::from_secs(120));
        let second = watchdog.deadline().unwrap();

        assert!(second > first);
        assert!(!watchdog.expired(start + Duration::from_secs(300)));
        assert!(watchdog.expired(start + Duration::from_secs(370)));
    }

    #[test]
    fn test_disarm() {
        let start = Instant::now();
        let mut watchdog = HeartbeatWatchdog::new(TIMEOUT);
        watchdog.arm(start);
        watchdog.disarm();
        assert!(!watchdog.expired(start + TIMEOUT * 2));
        assert!(watchdog.deadline().is_none());
    }
}
