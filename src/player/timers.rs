use std::collections::BTreeMap;
use std::time::Instant;

/// Every bounded wait the controller can have pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    SdkReady,
    SdkRetry,
    GlobalLoading,
    Startup,
    BufferingNudge,
    BufferingSkip,
    ProgressSample,
}

impl TimerKind {
    /// Timers guarding the current track; superseded by any track change
    pub const TRACK_SCOPED: [TimerKind; 4] = [
        TimerKind::Startup,
        TimerKind::BufferingNudge,
        TimerKind::BufferingSkip,
        TimerKind::ProgressSample,
    ];

    pub const WATCHDOGS: [TimerKind; 3] = [
        TimerKind::Startup,
        TimerKind::BufferingNudge,
        TimerKind::BufferingSkip,
    ];
}

/// Deadlines owned by the controller, at most one per kind
#[derive(Debug, Default)]
pub struct Timers {
    deadlines: BTreeMap<TimerKind, Instant>,
}

impl Timers {
    /// Arms `kind`, replacing any pending deadline of the same kind
    pub fn arm(&mut self, kind: TimerKind, at: Instant) {
        self.deadlines.insert(kind, at);
    }

    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.deadlines.remove(&kind).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.deadlines.clear();
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.deadlines.contains_key(&kind)
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.deadlines.get(&kind).copied()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Removes and returns the earliest expired timer. Ties resolve in
    /// declaration order of [`TimerKind`].
    pub fn pop_due(&mut self, now: Instant) -> Option<TimerKind> {
        let (kind, _) = self
            .deadlines
            .iter()
            .filter(|(_, at)| **at <= now)
            .min_by_key(|(kind, at)| (**at, **kind))?;
        let kind = *kind;
        self.deadlines.remove(&kind);
        Some(kind)
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn pops_in_deadline_order() {
        let t0 = Instant::now();
        let mut timers = Timers::default();
        timers.arm(TimerKind::GlobalLoading, t0 + Duration::from_secs(8));
        timers.arm(TimerKind::Startup, t0 + Duration::from_secs(4));
        timers.arm(TimerKind::ProgressSample, t0 + Duration::from_millis(700));

        let now = t0 + Duration::from_secs(5);
        assert_eq!(timers.pop_due(now), Some(TimerKind::ProgressSample));
        assert_eq!(timers.pop_due(now), Some(TimerKind::Startup));
        assert_eq!(timers.pop_due(now), None);
        assert_eq!(timers.next_deadline(), Some(t0 + Duration::from_secs(8)));
    }

    #[test]
    fn rearming_replaces_and_cancel_removes() {
        let t0 = Instant::now();
        let mut timers = Timers::default();
        timers.arm(TimerKind::BufferingNudge, t0 + Duration::from_secs(6));
        timers.arm(TimerKind::BufferingNudge, t0 + Duration::from_secs(9));
        assert_eq!(timers.pop_due(t0 + Duration::from_secs(7)), None);

        assert!(timers.cancel(TimerKind::BufferingNudge));
        assert!(!timers.cancel(TimerKind::BufferingNudge));
        assert!(timers.is_empty());
    }

    #[test]
    fn equal_deadlines_follow_declaration_order() {
        let at = Instant::now();
        let mut timers = Timers::default();
        timers.arm(TimerKind::BufferingSkip, at);
        timers.arm(TimerKind::SdkReady, at);
        assert_eq!(timers.pop_due(at), Some(TimerKind::SdkReady));
        assert_eq!(timers.pop_due(at), Some(TimerKind::BufferingSkip));
    }
}
