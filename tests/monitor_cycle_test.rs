// Monitoring cycle tests with an in-memory certificate source and alert channel

use async_trait::async_trait;
use certmonitor::certificates::parser::format_cert_time;
use certmonitor::certificates::{CertificateInfo, CertificateSource, ExpirySeverity};
use certmonitor::error::ErrorKind;
use certmonitor::monitor::alerts::{
    SUBJECT_EXPIRED, SUBJECT_EXPIRING_SOON, SUBJECT_VALIDATION_SKIPPED,
};
use certmonitor::monitor::{
    Alert, AlertChannel, AlertManager, HostOutcome, MonitorConfig, MonitorDaemon, RunOutcome,
};
use certmonitor::utils::network::Target;
use certmonitor::{MonitorError, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

enum FakeCert {
    ExpiresAt(DateTime<Utc>),
    Unreachable,
    NotHttps,
    Malformed,
}

struct FakeSource {
    certs: HashMap<String, FakeCert>,
}

#[async_trait]
impl CertificateSource for FakeSource {
    async fn fetch(&self, target: &Target) -> Result<CertificateInfo> {
        let host = target.identifier();
        match self.certs.get(&host) {
            Some(FakeCert::ExpiresAt(expiry)) => Ok(CertificateInfo {
                subject: format!("CN={}", target.hostname),
                not_after: format_cert_time(expiry.timestamp()).unwrap(),
                ..Default::default()
            }),
            Some(FakeCert::Malformed) => Ok(CertificateInfo {
                subject: format!("CN={}", target.hostname),
                not_after: "garbage".to_string(),
                ..Default::default()
            }),
            Some(FakeCert::NotHttps) => Err(MonitorError::Protocol {
                host,
                details: "received corrupt message".to_string(),
            }),
            Some(FakeCert::Unreachable) | None => Err(MonitorError::Connection {
                host,
                details: "connection refused".to_string(),
            }),
        }
    }
}

#[derive(Clone, Default)]
struct RecordingChannel {
    sent: Arc<Mutex<Vec<Alert>>>,
    fail: bool,
}

impl RecordingChannel {
    fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|a| a.subject.clone())
            .collect()
    }
}

#[async_trait]
impl AlertChannel for RecordingChannel {
    async fn send_alert(&self, alert: &Alert) -> Result<()> {
        if self.fail {
            return Err(MonitorError::Notification {
                details: "535 authentication failed".to_string(),
            });
        }
        self.sent.lock().unwrap().push(alert.clone());
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
}

fn config(sites: &[&str], continuous: bool, monitor_sleep: u64, program_errors: bool) -> MonitorConfig {
    let site_list = sites
        .iter()
        .map(|s| format!("  - {}\n", s))
        .collect::<String>();
    let yaml = format!(
        r#"
general:
  continuous_monitoring: {continuous}
  monitor_sleep: {monitor_sleep}
  email_alerts: true
  alert_program_errors: {program_errors}
  buffer_days: 30
  time_zone: UTC
site_urls:
{site_list}notification_handler:
  email:
    smtp: smtp.example.com
    authentication_required: false
    use_tls: true
    username: ""
    password: ""
    from_email: alerts@example.com
    to_email: ops@example.com
"#
    );
    MonitorConfig::from_yaml_str(&yaml).unwrap()
}

fn daemon(
    config: &MonitorConfig,
    certs: Vec<(&str, FakeCert)>,
    channel: &RecordingChannel,
) -> MonitorDaemon {
    let source = FakeSource {
        certs: certs
            .into_iter()
            .map(|(host, cert)| (host.to_string(), cert))
            .collect(),
    };
    let mut alerts = AlertManager::new();
    alerts.add_channel(Box::new(channel.clone()));

    MonitorDaemon::new(Arc::new(config.clone()), Arc::new(source)).with_alert_manager(alerts)
}

#[tokio::test]
async fn test_healthy_certificate_sends_nothing() {
    let config = config(&["healthy.example"], true, 86400, true);
    let channel = RecordingChannel::default();
    let daemon = daemon(
        &config,
        vec![("healthy.example", FakeCert::ExpiresAt(now() + Duration::days(45)))],
        &channel,
    );

    let report = daemon.run_cycle(&config, now()).await.unwrap();

    assert_eq!(report.count(ExpirySeverity::Healthy), 1);
    assert_eq!(report.override_sleep_seconds, None);
    assert!(channel.subjects().is_empty());
}

#[tokio::test]
async fn test_warning_sends_alert_and_sets_override() {
    let config = config(&["soon.example"], true, 86400, true);
    let channel = RecordingChannel::default();
    let daemon = daemon(
        &config,
        vec![("soon.example", FakeCert::ExpiresAt(now() + Duration::days(10)))],
        &channel,
    );

    let report = daemon.run_cycle(&config, now()).await.unwrap();

    assert_eq!(report.count(ExpirySeverity::Warning), 1);
    assert_eq!(report.override_sleep_seconds, Some(86_400));
    assert_eq!(report.notifications_sent, 1);
    assert_eq!(channel.subjects(), vec![SUBJECT_EXPIRING_SOON.to_string()]);
}

#[tokio::test]
async fn test_expired_reports_days_since_expiry() {
    let config = config(&["old.example"], true, 86400, true);
    let channel = RecordingChannel::default();
    let daemon = daemon(
        &config,
        vec![("old.example", FakeCert::ExpiresAt(now() - Duration::days(5)))],
        &channel,
    );

    let report = daemon.run_cycle(&config, now()).await.unwrap();

    match report.outcome_for("old.example") {
        Some(HostOutcome::Checked(status)) => {
            assert_eq!(status.severity, ExpirySeverity::Expired);
            assert_eq!(status.days_from_expiry, -5);
            assert!(status.message.contains("expired for 5 days"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(report.override_sleep_seconds, Some(86_400));
    assert_eq!(channel.subjects(), vec![SUBJECT_EXPIRED.to_string()]);
}

#[tokio::test]
async fn test_expiring_within_the_day() {
    let config = config(&["today.example"], true, 86400, true);
    let channel = RecordingChannel::default();
    let daemon = daemon(
        &config,
        vec![("today.example", FakeCert::ExpiresAt(now() + Duration::hours(6)))],
        &channel,
    );

    let report = daemon.run_cycle(&config, now()).await.unwrap();

    assert_eq!(report.count(ExpirySeverity::ExpiringToday), 1);
    assert_eq!(channel.subjects(), vec![SUBJECT_EXPIRING_SOON.to_string()]);
}

#[tokio::test]
async fn test_unreachable_host_is_skipped_and_cycle_continues() {
    let config = config(&["down.example", "plain.example", "fine.example"], true, 86400, true);
    let channel = RecordingChannel::default();
    let daemon = daemon(
        &config,
        vec![
            ("down.example", FakeCert::Unreachable),
            ("plain.example", FakeCert::NotHttps),
            ("fine.example", FakeCert::ExpiresAt(now() + Duration::days(200))),
        ],
        &channel,
    );

    let report = daemon.run_cycle(&config, now()).await.unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.skipped(), 2);
    assert_eq!(report.count(ExpirySeverity::Healthy), 1);
    match report.outcome_for("down.example") {
        Some(HostOutcome::Skipped { kind, .. }) => assert_eq!(*kind, ErrorKind::Unreachable),
        other => panic!("unexpected outcome: {:?}", other),
    }
    match report.outcome_for("plain.example") {
        Some(HostOutcome::Skipped { kind, .. }) => assert_eq!(*kind, ErrorKind::Protocol),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(
        channel.subjects(),
        vec![
            SUBJECT_VALIDATION_SKIPPED.to_string(),
            SUBJECT_VALIDATION_SKIPPED.to_string()
        ]
    );
    // Skipped hosts do not shorten the sleep
    assert_eq!(report.override_sleep_seconds, None);
}

#[tokio::test]
async fn test_malformed_expiry_is_skipped_and_cycle_continues() {
    let config = config(&["broken.example", "fine.example"], true, 86400, true);
    let channel = RecordingChannel::default();
    let daemon = daemon(
        &config,
        vec![
            ("broken.example", FakeCert::Malformed),
            ("fine.example", FakeCert::ExpiresAt(now() + Duration::days(200))),
        ],
        &channel,
    );

    let report = daemon.run_cycle(&config, now()).await.unwrap();

    match report.outcome_for("broken.example") {
        Some(HostOutcome::Skipped { kind, .. }) => {
            assert_eq!(*kind, ErrorKind::MalformedCertificate)
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    match report.outcome_for("fine.example") {
        Some(HostOutcome::Checked(status)) => assert_eq!(status.severity, ExpirySeverity::Healthy),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(channel.subjects(), vec![SUBJECT_VALIDATION_SKIPPED.to_string()]);
    assert_eq!(report.override_sleep_seconds, None);
}

#[tokio::test]
async fn test_program_error_alerts_can_be_disabled() {
    let config = config(&["down.example"], true, 86400, false);
    let channel = RecordingChannel::default();
    let daemon = daemon(&config, vec![("down.example", FakeCert::Unreachable)], &channel);

    let report = daemon.run_cycle(&config, now()).await.unwrap();

    assert_eq!(report.skipped(), 1);
    assert!(channel.subjects().is_empty());
}

#[tokio::test]
async fn test_notification_failure_is_not_reported_by_email() {
    let config = config(&["soon.example", "down.example"], true, 86400, true);
    let channel = RecordingChannel {
        fail: true,
        ..Default::default()
    };
    let daemon = daemon(
        &config,
        vec![
            ("soon.example", FakeCert::ExpiresAt(now() + Duration::days(3))),
            ("down.example", FakeCert::Unreachable),
        ],
        &channel,
    );

    let report = daemon.run_cycle(&config, now()).await.unwrap();

    // One certificate alert and one skip alert attempted, nothing more
    assert_eq!(report.notifications_failed, 2);
    assert_eq!(report.notifications_sent, 0);
    assert_eq!(report.outcomes.len(), 2);
}

#[tokio::test]
async fn test_single_pass_exits_after_one_cycle() {
    let config = config(&["healthy.example"], false, 86400, true);
    let channel = RecordingChannel::default();
    let daemon = daemon(
        &config,
        vec![(
            "healthy.example",
            FakeCert::ExpiresAt(Utc::now() + Duration::days(45)),
        )],
        &channel,
    );

    let outcome = daemon.run_until(std::future::pending()).await.unwrap();
    assert_eq!(outcome, RunOutcome::SinglePass);
}

#[tokio::test]
async fn test_healthy_shrink_when_interval_exceeds_remaining_days() {
    // 60 day interval, certificate healthy with 45 days left
    let config = config(&["healthy.example"], true, 60 * 86_400, true);
    let channel = RecordingChannel::default();
    let daemon = daemon(
        &config,
        vec![("healthy.example", FakeCert::ExpiresAt(now() + Duration::days(45)))],
        &channel,
    );

    let report = daemon.run_cycle(&config, now()).await.unwrap();

    assert_eq!(report.override_sleep_seconds, Some(15 * 86_400));
    assert!(channel.subjects().is_empty());
}

#[tokio::test]
async fn test_first_alerting_host_wins_by_default() {
    let config = config(&["healthy.example", "old.example"], true, 60 * 86_400, true);
    let channel = RecordingChannel::default();
    let daemon = daemon(
        &config,
        vec![
            ("healthy.example", FakeCert::ExpiresAt(now() + Duration::days(45))),
            ("old.example", FakeCert::ExpiresAt(now() - Duration::days(1))),
        ],
        &channel,
    );

    let report = daemon.run_cycle(&config, now()).await.unwrap();
    assert_eq!(report.override_sleep_seconds, Some(15 * 86_400));

    let mut minimum = config.clone();
    minimum.override_policy = certmonitor::monitor::OverridePolicy::Minimum;
    let report = daemon.run_cycle(&minimum, now()).await.unwrap();
    assert_eq!(report.override_sleep_seconds, Some(86_400));
}

#[tokio::test]
async fn test_port_is_part_of_the_host_label() {
    let config = config(&["https://alt.example:8443/login"], true, 86400, true);
    let channel = RecordingChannel::default();
    let daemon = daemon(
        &config,
        vec![("alt.example:8443", FakeCert::ExpiresAt(now() + Duration::days(2)))],
        &channel,
    );

    let report = daemon.run_cycle(&config, now()).await.unwrap();

    assert!(report.outcome_for("alt.example:8443").is_some());
    let sent = channel.sent.lock().unwrap();
    assert_eq!(sent[0].hostname, "alt.example:8443");
    assert!(sent[0].body.contains("alt.example:8443"));
}
