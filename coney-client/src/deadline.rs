//! Deadline values and composition.
//!
//! Every blocking wait in the engine is bounded by the earliest of up to
//! three deadlines: the caller's timeout, the next heartbeat send, and the
//! heartbeat receive cutoff. `Immediate` and `Never` are the sentinel
//! extremes, ordered below and above every concrete instant.

use std::time::Duration;
use tokio::time::Instant;

/// A point on the monotonic clock, with sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Already expired.
    Immediate,
    At(Instant),
    /// Never expires.
    Never,
}

impl Deadline {
    /// A deadline `timeout` from now; `None` means no deadline.
    pub fn after(timeout: Option<Duration>) -> Self {
        match timeout {
            Some(t) => Deadline::At(Instant::now() + t),
            None => Deadline::Never,
        }
    }

    pub fn expired(&self, now: Instant) -> bool {
        match self {
            Deadline::Immediate => true,
            Deadline::At(at) => *at <= now,
            Deadline::Never => false,
        }
    }

    /// The instant to sleep until, if any.
    pub fn instant(&self) -> Option<Instant> {
        match self {
            Deadline::Immediate => Some(Instant::now()),
            Deadline::At(at) => Some(*at),
            Deadline::Never => None,
        }
    }

    /// The earlier of two deadlines.
    pub fn earliest(self, other: Deadline) -> Deadline {
        std::cmp::min(self, other)
    }
}

impl PartialOrd for Deadline {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Deadline {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (Deadline::Immediate, Deadline::Immediate) => Ordering::Equal,
            (Deadline::Immediate, _) => Ordering::Less,
            (_, Deadline::Immediate) => Ordering::Greater,
            (Deadline::Never, Deadline::Never) => Ordering::Equal,
            (Deadline::Never, _) => Ordering::Greater,
            (_, Deadline::Never) => Ordering::Less,
            (Deadline::At(a), Deadline::At(b)) => a.cmp(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_ordering() {
        let at = Deadline::At(Instant::now());
        assert!(Deadline::Immediate < at);
        assert!(at < Deadline::Never);
        assert!(Deadline::Immediate < Deadline::Never);
    }

    #[test]
    fn test_earliest_composition() {
        let now = Instant::now();
        let soon = Deadline::At(now + Duration::from_secs(1));
        let later = Deadline::At(now + Duration::from_secs(60));

        assert_eq!(soon.earliest(later), soon);
        assert_eq!(later.earliest(soon), soon);
        assert_eq!(soon.earliest(Deadline::Never), soon);
        assert_eq!(Deadline::Immediate.earliest(soon), Deadline::Immediate);

        // Folding three timers picks the single earliest.
        let composed = Deadline::Never.earliest(later).earliest(soon);
        assert_eq!(composed, soon);
    }

    #[test]
    fn test_expiry() {
        let now = Instant::now();
        assert!(Deadline::Immediate.expired(now));
        assert!(!Deadline::Never.expired(now));
        assert!(Deadline::At(now).expired(now));
        assert!(!Deadline::At(now + Duration::from_secs(5)).expired(now));
    }

    #[test]
    fn test_after_none_is_never() {
        assert_eq!(Deadline::after(None), Deadline::Never);
        assert!(matches!(
            Deadline::after(Some(Duration::from_secs(1))),
            Deadline::At(_)
        ));
    }
}
