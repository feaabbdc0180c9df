// Monitor Types - Outcomes of a monitoring cycle

use crate::certificates::{ExpirySeverity, ExpiryStatus};
use crate::error::ErrorKind;
use chrono::{DateTime, Utc};

/// Result of checking a single host
#[derive(Debug, Clone)]
pub enum HostOutcome {
    /// Certificate retrieved and evaluated
    Checked(ExpiryStatus),
    /// Host check aborted, the cycle went on with the next host
    Skipped {
        host: String,
        kind: ErrorKind,
        reason: String,
    },
}

impl HostOutcome {
    pub fn host(&self) -> &str {
        match self {
            HostOutcome::Checked(status) => &status.host,
            HostOutcome::Skipped { host, .. } => host,
        }
    }

    pub fn severity(&self) -> Option<ExpirySeverity> {
        match self {
            HostOutcome::Checked(status) => Some(status.severity),
            HostOutcome::Skipped { .. } => None,
        }
    }
}

/// Everything that happened during one pass over the site list
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<HostOutcome>,
    pub override_sleep_seconds: Option<u64>,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

impl CycleReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            outcomes: Vec::new(),
            override_sleep_seconds: None,
            notifications_sent: 0,
            notifications_failed: 0,
        }
    }

    pub fn count(&self, severity: ExpirySeverity) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.severity() == Some(severity))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, HostOutcome::Skipped { .. }))
            .count()
    }

    pub fn outcome_for(&self, host: &str) -> Option<&HostOutcome> {
        self.outcomes.iter().find(|o| o.host() == host)
    }

    /// One-line summary for the end-of-cycle log entry
    pub fn summary(&self) -> String {
        format!(
            "{} host(s) checked: {} healthy, {} warning, {} expiring today, {} expired, {} skipped; {} notification(s) sent, {} failed",
            self.outcomes.len(),
            self.count(ExpirySeverity::Healthy),
            self.count(ExpirySeverity::Warning),
            self.count(ExpirySeverity::ExpiringToday),
            self.count(ExpirySeverity::Expired),
            self.skipped(),
            self.notifications_sent,
            self.notifications_failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_summary_counts() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let mut report = CycleReport::new(now);
        report.outcomes.push(HostOutcome::Checked(ExpiryStatus {
            host: "a.example".to_string(),
            severity: ExpirySeverity::Warning,
            days_from_expiry: 3,
            expires_at: now,
            message: String::new(),
        }));
        report.outcomes.push(HostOutcome::Skipped {
            host: "b.example".to_string(),
            kind: ErrorKind::Unreachable,
            reason: "refused".to_string(),
        });
        report.notifications_sent = 2;

        assert_eq!(report.count(ExpirySeverity::Warning), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.outcome_for("b.example").unwrap().severity(), None);
        assert_eq!(
            report.summary(),
            "2 host(s) checked: 0 healthy, 1 warning, 0 expiring today, 0 expired, 1 skipped; 2 notification(s) sent, 0 failed"
        );
    }
}
