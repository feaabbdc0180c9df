// Expiry Evaluator - classify a certificate against "now" and the alert buffer

use crate::certificates::parser::CertificateInfo;
use crate::{MonitorError, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const SECONDS_PER_DAY: i64 = 86_400;

/// Display-only time zone label
///
/// Comparisons always happen in UTC. The label only changes how the expiry
/// instant is rendered in messages and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimeZoneLabel {
    Cst,
    #[default]
    Utc,
    Est,
    Mst,
    Pst,
}

impl TimeZoneLabel {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            TimeZoneLabel::Cst => "CST",
            TimeZoneLabel::Utc => "UTC",
            TimeZoneLabel::Est => "EST",
            TimeZoneLabel::Mst => "MST",
            TimeZoneLabel::Pst => "PST",
        }
    }

    /// Standard-time offset used when rendering
    pub fn offset(&self) -> FixedOffset {
        let hours_west = match self {
            TimeZoneLabel::Utc => 0,
            TimeZoneLabel::Est => 5,
            TimeZoneLabel::Cst => 6,
            TimeZoneLabel::Mst => 7,
            TimeZoneLabel::Pst => 8,
        };
        FixedOffset::west_opt(hours_west * 3600).unwrap_or_else(|| Utc.fix())
    }

    /// Render an instant as `Mon, 15 Jun 2030 00:00:00 UTC`
    pub fn format(&self, instant: DateTime<Utc>) -> String {
        format!(
            "{} {}",
            instant
                .with_timezone(&self.offset())
                .format("%a, %d %b %Y %H:%M:%S"),
            self.abbreviation()
        )
    }
}

impl FromStr for TimeZoneLabel {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CST" => Ok(TimeZoneLabel::Cst),
            "UTC" => Ok(TimeZoneLabel::Utc),
            "EST" => Ok(TimeZoneLabel::Est),
            "MST" => Ok(TimeZoneLabel::Mst),
            "PST" => Ok(TimeZoneLabel::Pst),
            other => Err(MonitorError::config(format!(
                "An incorrect time zone format was sent ('{}'). Currently supported time zones are CST, UTC, EST, MST, and PST",
                other
            ))),
        }
    }
}

impl std::fmt::Display for TimeZoneLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Severity band of an evaluated certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpirySeverity {
    /// Past expiry
    Expired,
    /// Less than one whole day left
    ExpiringToday,
    /// Inside the alert buffer
    Warning,
    /// Outside the alert buffer
    Healthy,
}

impl ExpirySeverity {
    /// Whether the severity requires an alert and a short re-check
    pub fn is_alerting(&self) -> bool {
        !matches!(self, ExpirySeverity::Healthy)
    }
}

impl std::fmt::Display for ExpirySeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpirySeverity::Expired => write!(f, "Expired"),
            ExpirySeverity::ExpiringToday => write!(f, "Expiring Today"),
            ExpirySeverity::Warning => write!(f, "Warning"),
            ExpirySeverity::Healthy => write!(f, "Healthy"),
        }
    }
}

/// Result of evaluating one certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryStatus {
    pub host: String,
    pub severity: ExpirySeverity,
    /// Negative when expired, zero on the expiry day, positive otherwise
    pub days_from_expiry: i64,
    pub expires_at: DateTime<Utc>,
    pub message: String,
}

/// Parse a certificate validity timestamp into a UTC instant
///
/// Accepts the certificate form (`Jul 13 15:59:44 2022 GMT`, with `GMT` or
/// `UTC` suffix and any run of spaces) and RFC 3339.
pub fn parse_cert_time(host: &str, raw: &str) -> Result<DateTime<Utc>> {
    let malformed = || MonitorError::MalformedCertificate {
        host: host.to_string(),
        details: format!("Unreadable notAfter value '{}'", raw),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Ok(dt.with_timezone(&Utc));
    }

    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let without_zone = normalized
        .strip_suffix(" GMT")
        .or_else(|| normalized.strip_suffix(" UTC"))
        .ok_or_else(malformed)?;

    let naive =
        NaiveDateTime::parse_from_str(without_zone, "%b %d %H:%M:%S %Y").map_err(|_| malformed())?;

    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// Whole days between `now` and `expiry`, rounded toward negative infinity
pub fn floor_days(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expiry - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Map a day offset to its severity band
pub fn classify(days_from_expiry: i64, buffer_days: u32) -> ExpirySeverity {
    if days_from_expiry == 0 {
        ExpirySeverity::ExpiringToday
    } else if days_from_expiry < 0 {
        ExpirySeverity::Expired
    } else if days_from_expiry <= i64::from(buffer_days) {
        ExpirySeverity::Warning
    } else {
        ExpirySeverity::Healthy
    }
}

/// Evaluate a certificate against `now`
pub fn evaluate(
    host: &str,
    cert: &CertificateInfo,
    buffer_days: u32,
    now: DateTime<Utc>,
    zone: TimeZoneLabel,
) -> Result<ExpiryStatus> {
    let expires_at = parse_cert_time(host, &cert.not_after)?;
    let days_from_expiry = floor_days(expires_at, now);
    let severity = classify(days_from_expiry, buffer_days);
    let shown = zone.format(expires_at);

    let message = match severity {
        ExpirySeverity::ExpiringToday => format!(
            "Certificate for {} is expiring soon. The certificate will expire today (0 days remaining, {}).",
            host, shown
        ),
        ExpirySeverity::Expired => format!(
            "Certificate for {} has expired! The certificate has been expired for {} days (since {}).",
            host,
            days_from_expiry.unsigned_abs(),
            shown
        ),
        ExpirySeverity::Warning => format!(
            "Certificate for {} is expiring soon. The certificate will expire in {} days ({}).",
            host, days_from_expiry, shown
        ),
        ExpirySeverity::Healthy => format!(
            "Certificate for {} is good. The certificate does not expire for {} days ({}).",
            host, days_from_expiry, shown
        ),
    };

    tracing::debug!(
        host,
        days_from_expiry,
        severity = %severity,
        "Calculated how many days remain before the certificate expires"
    );

    Ok(ExpiryStatus {
        host: host.to_string(),
        severity,
        days_from_expiry,
        expires_at,
        message,
    })
}
