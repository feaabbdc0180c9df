// Cycle Scheduler - Decides how long to wait before the next monitoring cycle

use crate::certificates::{ExpirySeverity, ExpiryStatus};
use crate::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Re-check delay once any certificate needs attention
pub const URGENT_RECHECK_SECONDS: u64 = SECONDS_PER_DAY;

/// How competing sleep proposals within one cycle are resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverridePolicy {
    /// The first proposal of the cycle sticks
    #[default]
    First,
    /// The shortest proposal of the cycle wins
    Minimum,
}

impl std::fmt::Display for OverridePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverridePolicy::First => write!(f, "first"),
            OverridePolicy::Minimum => write!(f, "minimum"),
        }
    }
}

/// Why the sleep of the current cycle was shortened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideReason {
    /// A certificate is expired, expiring today or inside the buffer
    Urgent,
    /// A healthy certificate expires before the regular interval elapses
    ShrinkToExpiry,
}

/// Per-cycle scheduling state, reset at the start of every cycle
#[derive(Debug, Clone)]
pub struct CycleState {
    policy: OverridePolicy,
    override_sleep_seconds: Option<u64>,
    reason: Option<OverrideReason>,
}

impl CycleState {
    pub fn new(policy: OverridePolicy) -> Self {
        Self {
            policy,
            override_sleep_seconds: None,
            reason: None,
        }
    }

    pub fn override_sleep_seconds(&self) -> Option<u64> {
        self.override_sleep_seconds
    }

    pub fn reason(&self) -> Option<OverrideReason> {
        self.reason
    }

    /// Offer a shorter sleep; returns true when it was taken
    ///
    /// An accepted proposal never lengthens the sleep already recorded.
    pub fn propose(&mut self, seconds: u64, reason: OverrideReason) -> bool {
        let accepted = match (self.override_sleep_seconds, self.policy) {
            (None, _) => true,
            (Some(_), OverridePolicy::First) => false,
            (Some(current), OverridePolicy::Minimum) => seconds < current,
        };

        if accepted {
            self.override_sleep_seconds = Some(seconds);
            self.reason = Some(reason);
        }

        accepted
    }

    /// Feed one evaluated certificate into the cycle
    pub fn observe(
        &mut self,
        status: &ExpiryStatus,
        monitor_sleep_seconds: u64,
        continuous_monitoring: bool,
    ) -> bool {
        if status.severity.is_alerting() {
            let accepted = self.propose(URGENT_RECHECK_SECONDS, OverrideReason::Urgent);
            if accepted {
                tracing::info!(
                    host = %status.host,
                    "Setting the sleep override to 24 hours so {} is checked again tomorrow",
                    status.host
                );
            } else {
                tracing::debug!(
                    host = %status.host,
                    "Sleep override is already set to {:?} seconds",
                    self.override_sleep_seconds
                );
            }
            return accepted;
        }

        if status.severity == ExpirySeverity::Healthy
            && continuous_monitoring
            && let Some(seconds) = healthy_shrink(monitor_sleep_seconds, status.days_from_expiry)
        {
            let accepted = self.propose(seconds, OverrideReason::ShrinkToExpiry);
            if accepted {
                tracing::info!(
                    host = %status.host,
                    "The certificate for {} expires before the next scheduled check, the next check will happen in {}",
                    status.host,
                    humanize_seconds(seconds)
                );
            }
            return accepted;
        }

        false
    }
}

/// Sleep that lands a re-check on the expiry day of a healthy certificate
///
/// Only applies when the regular interval is strictly longer than the days
/// left, so the result is always at least one day.
pub fn healthy_shrink(monitor_sleep_seconds: u64, days_from_expiry: i64) -> Option<u64> {
    let interval_days = i64::try_from(monitor_sleep_seconds / SECONDS_PER_DAY).ok()?;
    if interval_days > days_from_expiry && days_from_expiry >= 0 {
        let days = u64::try_from(interval_days - days_from_expiry).ok()?;
        days.checked_mul(SECONDS_PER_DAY)
    } else {
        None
    }
}

/// What the loop does after a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepPlan {
    /// Single-pass mode, stop after this cycle
    Exit,
    Sleep { duration: Duration, overridden: bool },
}

/// Choose the sleep after a cycle
///
/// Fails when the deadline cannot be represented by the runtime clock.
pub fn plan_sleep(
    continuous_monitoring: bool,
    monitor_sleep_seconds: u64,
    override_sleep_seconds: Option<u64>,
) -> Result<SleepPlan> {
    if !continuous_monitoring {
        return Ok(SleepPlan::Exit);
    }

    let seconds = override_sleep_seconds.unwrap_or(monitor_sleep_seconds);
    let duration = Duration::from_secs(seconds);

    if tokio::time::Instant::now().checked_add(duration).is_none() {
        return Err(MonitorError::SleepComputation { seconds });
    }

    Ok(SleepPlan::Sleep {
        duration,
        overridden: override_sleep_seconds.is_some(),
    })
}

/// Render seconds as `N day(s), HH:MM:SS`
pub fn humanize_seconds(seconds: u64) -> String {
    let days = seconds / SECONDS_PER_DAY;
    let rest = seconds % SECONDS_PER_DAY;
    let (hours, minutes, secs) = (rest / 3600, (rest % 3600) / 60, rest % 60);

    match days {
        0 => format!("{}:{:02}:{:02}", hours, minutes, secs),
        1 => format!("1 day, {}:{:02}:{:02}", hours, minutes, secs),
        n => format!("{} days, {}:{:02}:{:02}", n, hours, minutes, secs),
    }
}
