use chrono::{DateTime, Duration, Utc};

/// Collapses near-simultaneous duplicate triggers (double-tapped reveal,
/// a visibility sentinel firing twice while the next page lays out).
#[derive(Debug, Clone)]
pub struct SettleGate {
    settle: Duration,
    pub last_at: Option<DateTime<Utc>>,
}

impl SettleGate {
    pub fn new(settle_ms: i64) -> Self {
        Self {
            settle: Duration::milliseconds(settle_ms.max(0)),
            last_at: None,
        }
    }

    /// True if a trigger at `now` should go through.
    pub fn should_pass(&self, now: DateTime<Utc>) -> bool {
        match self.last_at {
            None => true,
            Some(last) => now - last >= self.settle,
        }
    }

    /// Still inside the settle window of the last accepted trigger.
    pub fn is_busy(&self, now: DateTime<Utc>) -> bool {
        !self.should_pass(now)
    }

    pub fn record(&mut self, now: DateTime<Utc>) {
        self.last_at = Some(now);
    }

    /// `should_pass` + `record` in one step.
    pub fn try_pass(&mut self, now: DateTime<Utc>) -> bool {
        if !self.should_pass(now) {
            return false;
        }
        self.record(now);
        true
    }
}
