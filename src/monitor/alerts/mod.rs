// Alert System - Certificate and program-error notifications

pub mod channels;
pub mod email;

use crate::certificates::{ExpirySeverity, ExpiryStatus};
use crate::monitor::config::MonitorConfig;
use crate::{MonitorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use channels::AlertChannel;

pub const SUBJECT_EXPIRING_SOON: &str = "Website Certificate Expiring Soon";
pub const SUBJECT_EXPIRED: &str = "Website Certificate Expired";
pub const SUBJECT_VALIDATION_SKIPPED: &str = "Website Certificate Validation Skipped";
pub const SUBJECT_TEST: &str = "CertMonitor Test Notification";

/// Alert type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    ExpiringSoon,
    Expired,
    ValidationSkipped,
    Test,
}

impl AlertKind {
    pub fn subject(&self) -> &'static str {
        match self {
            AlertKind::ExpiringSoon => SUBJECT_EXPIRING_SOON,
            AlertKind::Expired => SUBJECT_EXPIRED,
            AlertKind::ValidationSkipped => SUBJECT_VALIDATION_SKIPPED,
            AlertKind::Test => SUBJECT_TEST,
        }
    }

    /// Whether the alert reports a program error rather than a certificate state
    pub fn is_program_error(&self) -> bool {
        matches!(self, AlertKind::ValidationSkipped)
    }
}

/// Alert message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub hostname: String,
    pub kind: AlertKind,
    pub subject: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    fn new(hostname: String, kind: AlertKind, body: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            hostname,
            kind,
            subject: kind.subject().to_string(),
            body,
            timestamp,
        }
    }

    /// Certificate alert for an evaluated host, `None` when the host is healthy
    pub fn for_status(status: &ExpiryStatus, timestamp: DateTime<Utc>) -> Option<Self> {
        let kind = match status.severity {
            ExpirySeverity::Expired => AlertKind::Expired,
            ExpirySeverity::ExpiringToday | ExpirySeverity::Warning => AlertKind::ExpiringSoon,
            ExpirySeverity::Healthy => return None,
        };

        Some(Self::new(
            status.host.clone(),
            kind,
            status.message.clone(),
            timestamp,
        ))
    }

    /// Program-error alert for a host whose check was aborted
    pub fn validation_skipped(host: &str, error: &MonitorError, timestamp: DateTime<Utc>) -> Self {
        let body = format!(
            "The certificate check for {} was skipped. {} {}",
            host,
            error,
            error.remediation()
        );

        Self::new(host.to_string(), AlertKind::ValidationSkipped, body, timestamp)
    }

    /// Alert sent by the `--test-alert` command
    pub fn test(timestamp: DateTime<Utc>) -> Self {
        Self::new(
            "localhost".to_string(),
            AlertKind::Test,
            "This is a test notification from CertMonitor. The notification settings are working."
                .to_string(),
            timestamp,
        )
    }
}

/// Alert manager - fans an alert out to every configured channel
pub struct AlertManager {
    channels: Vec<Box<dyn AlertChannel>>,
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertManager {
    /// Create new alert manager
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    /// Create from configuration
    ///
    /// No channel is built when both certificate and program-error alerts
    /// are disabled.
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        let mut manager = Self::new();

        if config.notifications_enabled() {
            let channel = email::EmailChannel::new(config.email.clone())?;
            manager.add_channel(Box::new(channel));
        }

        Ok(manager)
    }

    /// Add an alert channel
    pub fn add_channel(&mut self, channel: Box<dyn AlertChannel>) {
        self.channels.push(channel);
    }

    /// Get channel count
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Send alert through all channels
    ///
    /// Succeeds when at least one channel delivered it. A failure is only
    /// returned to the caller; no further alert is raised about it.
    pub async fn send_alert(&self, alert: &Alert) -> Result<()> {
        let tasks = self.channels.iter().map(|channel| async move {
            let result = channel.send_alert(alert).await;
            match &result {
                Ok(()) => tracing::info!(
                    "Alert sent via {} for {}: {}",
                    channel.channel_name(),
                    alert.hostname,
                    alert.subject
                ),
                Err(e) => tracing::error!(
                    "Failed to send alert via {} for {}: {}",
                    channel.channel_name(),
                    alert.hostname,
                    e
                ),
            }
            result
        });

        let results = futures::future::join_all(tasks).await;
        let success_count = results.iter().filter(|r| r.is_ok()).count();

        if success_count == 0 && !self.channels.is_empty() {
            let details = results
                .into_iter()
                .filter_map(|r| r.err())
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(MonitorError::Notification { details });
        }

        Ok(())
    }

    /// Test all channels
    pub async fn test_channels(&self) -> Vec<(String, Result<()>)> {
        let test_alert = Alert::test(Utc::now());
        let mut results = Vec::new();

        for channel in &self.channels {
            let result = match channel.test_connection().await {
                Ok(()) => channel.send_alert(&test_alert).await,
                Err(e) => Err(e),
            };
            results.push((channel.channel_name().to_string(), result));
        }

        results
    }
}
