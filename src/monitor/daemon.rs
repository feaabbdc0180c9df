// Monitoring Daemon - Main orchestration

use crate::certificates::{CertificateSource, ExpirySeverity, ExpiryStatus, evaluate};
use crate::monitor::alerts::{Alert, AlertManager};
use crate::monitor::config::{ConfigProvider, MonitorConfig};
use crate::monitor::scheduler::{CycleState, SleepPlan, humanize_seconds, plan_sleep};
use crate::monitor::types::{CycleReport, HostOutcome};
use crate::utils::network::Target;
use crate::Result;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;

const BANNER_WIDTH: usize = 80;

/// How the monitoring loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// `continuous_monitoring` was off and the single cycle finished
    SinglePass,
    /// A shutdown signal arrived while sleeping
    Shutdown,
}

/// Main monitoring daemon
pub struct MonitorDaemon {
    provider: Arc<dyn ConfigProvider>,
    source: Arc<dyn CertificateSource>,
    alert_manager: Option<Arc<AlertManager>>,
}

impl MonitorDaemon {
    /// Create new monitoring daemon
    pub fn new(provider: Arc<dyn ConfigProvider>, source: Arc<dyn CertificateSource>) -> Self {
        Self {
            provider,
            source,
            alert_manager: None,
        }
    }

    /// Use a fixed alert manager instead of building one from each configuration
    pub fn with_alert_manager(mut self, manager: AlertManager) -> Self {
        self.alert_manager = Some(Arc::new(manager));
        self
    }

    fn alerts_for(&self, config: &MonitorConfig) -> Result<Arc<AlertManager>> {
        match &self.alert_manager {
            Some(manager) => Ok(Arc::clone(manager)),
            None => Ok(Arc::new(AlertManager::from_config(config)?)),
        }
    }

    fn prepare(&self) -> Result<(MonitorConfig, Arc<AlertManager>)> {
        let config = self.provider.load()?;
        let alerts = self.alerts_for(&config)?;
        Ok((config, alerts))
    }

    /// Start the monitoring loop, stopping on SIGTERM/SIGINT
    pub async fn start(&self) -> Result<RunOutcome> {
        self.run_until(shutdown_signal()).await
    }

    /// Run cycles until single-pass completion or until `shutdown` resolves
    ///
    /// The configuration is read again before every cycle. A configuration
    /// error before the first cycle is returned; later ones keep the last
    /// good configuration.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<RunOutcome>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut current: Option<(MonitorConfig, Arc<AlertManager>)> = None;

        loop {
            let (config, alerts) = match (self.prepare(), current.take()) {
                (Ok(fresh), _) => fresh,
                (Err(e), Some(previous)) => {
                    tracing::error!(
                        "Reloading the configuration from {} failed, keeping the previous values: {}",
                        self.provider.describe(),
                        e
                    );
                    previous
                }
                (Err(e), None) => return Err(e),
            };

            log_banner();
            let report = self.check_all(&config, &alerts, Utc::now()).await;
            tracing::info!("{}", report.summary());

            match plan_sleep(
                config.continuous_monitoring,
                config.monitor_sleep_seconds,
                report.override_sleep_seconds,
            )? {
                SleepPlan::Exit => {
                    tracing::info!("Continuous monitoring is disabled, exiting after a single pass");
                    return Ok(RunOutcome::SinglePass);
                }
                SleepPlan::Sleep {
                    duration,
                    overridden,
                } => {
                    tracing::info!(
                        "The next certificate check will run in {}{}",
                        humanize_seconds(duration.as_secs()),
                        if overridden { " (sleep override)" } else { "" }
                    );

                    tokio::select! {
                        _ = tokio::time::sleep(duration) => {}
                        _ = &mut shutdown => {
                            tracing::info!("Shutdown requested, stopping certificate monitoring");
                            return Ok(RunOutcome::Shutdown);
                        }
                    }
                }
            }

            current = Some((config, alerts));
        }
    }

    /// Run a single cycle over every configured site
    pub async fn run_cycle(
        &self,
        config: &MonitorConfig,
        now: DateTime<Utc>,
    ) -> Result<CycleReport> {
        let alerts = self.alerts_for(config)?;
        Ok(self.check_all(config, &alerts, now).await)
    }

    async fn check_all(
        &self,
        config: &MonitorConfig,
        alerts: &AlertManager,
        now: DateTime<Utc>,
    ) -> CycleReport {
        let mut state = CycleState::new(config.override_policy);
        let mut report = CycleReport::new(now);

        for target in &config.targets {
            let host = target.identifier();

            let outcome = match self.check_host(config, target, now).await {
                Ok(status) => {
                    log_status(&status);
                    state.observe(
                        &status,
                        config.monitor_sleep_seconds,
                        config.continuous_monitoring,
                    );

                    if config.email_alerts
                        && let Some(alert) = Alert::for_status(&status, now)
                    {
                        deliver(alerts, &alert, &mut report).await;
                    }

                    HostOutcome::Checked(status)
                }
                Err(e) => {
                    tracing::error!(host = %host, kind = %e.kind(), "{} {}", e, e.remediation());

                    if config.alert_program_errors {
                        let alert = Alert::validation_skipped(&host, &e, now);
                        deliver(alerts, &alert, &mut report).await;
                    }

                    HostOutcome::Skipped {
                        host,
                        kind: e.kind(),
                        reason: e.to_string(),
                    }
                }
            };

            report.outcomes.push(outcome);
        }

        report.override_sleep_seconds = state.override_sleep_seconds();
        report
    }

    async fn check_host(
        &self,
        config: &MonitorConfig,
        target: &Target,
        now: DateTime<Utc>,
    ) -> Result<ExpiryStatus> {
        let host = target.identifier();
        let cert = self.source.fetch(target).await?;
        evaluate(&host, &cert, config.buffer_days, now, config.time_zone)
    }
}

async fn deliver(alerts: &AlertManager, alert: &Alert, report: &mut CycleReport) {
    if alerts.channel_count() == 0 {
        tracing::debug!(
            "No alert channel configured, dropping '{}' for {}",
            alert.subject,
            alert.hostname
        );
        return;
    }

    match alerts.send_alert(alert).await {
        Ok(()) => report.notifications_sent += 1,
        Err(e) => {
            report.notifications_failed += 1;
            tracing::error!("{} {}", e, e.remediation());
        }
    }
}

fn log_status(status: &ExpiryStatus) {
    match status.severity {
        ExpirySeverity::Healthy => tracing::info!(host = %status.host, "{}", status.message),
        ExpirySeverity::Warning | ExpirySeverity::ExpiringToday => {
            tracing::warn!(host = %status.host, "{}", status.message)
        }
        ExpirySeverity::Expired => tracing::error!(host = %status.host, "{}", status.message),
    }
}

fn log_banner() {
    let rule = "#".repeat(BANNER_WIDTH);
    tracing::info!("{}", rule);
    let title = format!("{:^width$}", "CertMonitor", width = BANNER_WIDTH);
    tracing::info!("{}", title.trim_end());
    tracing::info!("{}", rule);
}

/// Resolves on SIGTERM or SIGINT (Ctrl+C elsewhere)
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM");
                    }
                    _ = sigint.recv() => {
                        tracing::info!("Received SIGINT");
                    }
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Failed to install signal handlers: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MonitorError;
    use crate::certificates::CertificateInfo;
    use crate::certificates::parser::format_cert_time;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FarFutureSource;

    #[async_trait]
    impl CertificateSource for FarFutureSource {
        async fn fetch(&self, _target: &Target) -> Result<CertificateInfo> {
            let expiry = Utc::now() + chrono::Duration::days(400);
            Ok(CertificateInfo {
                not_after: format_cert_time(expiry.timestamp()).unwrap_or_default(),
                ..Default::default()
            })
        }
    }

    struct FlakyProvider {
        good: MonitorConfig,
        loads: AtomicUsize,
    }

    impl ConfigProvider for FlakyProvider {
        fn load(&self) -> Result<MonitorConfig> {
            if self.loads.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(self.good.clone())
            } else {
                Err(MonitorError::config("configuration file vanished"))
            }
        }

        fn describe(&self) -> String {
            "flaky".to_string()
        }
    }

    fn config(continuous: bool, monitor_sleep: u64) -> MonitorConfig {
        let yaml = format!(
            r#"
general:
  continuous_monitoring: {continuous}
  monitor_sleep: {monitor_sleep}
  email_alerts: true
  alert_program_errors: true
  buffer_days: 30
  time_zone: utc
site_urls:
  - example.com
notification_handler:
  email:
    smtp: smtp.example.com
    authentication_required: false
    use_tls: false
    username: ""
    password: ""
    from_email: alerts@example.com
    to_email: ops@example.com
"#
        );
        MonitorConfig::from_yaml_str(&yaml).unwrap()
    }

    fn daemon(provider: Arc<dyn ConfigProvider>) -> MonitorDaemon {
        MonitorDaemon::new(provider, Arc::new(FarFutureSource)).with_alert_manager(AlertManager::new())
    }

    #[tokio::test]
    async fn test_single_pass_exits() {
        let daemon = daemon(Arc::new(config(false, 60)));
        let outcome = daemon.run_until(std::future::pending()).await.unwrap();
        assert_eq!(outcome, RunOutcome::SinglePass);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_sleep() {
        let daemon = daemon(Arc::new(config(true, 3600)));
        let outcome = daemon
            .run_until(tokio::time::sleep(Duration::from_secs(10)))
            .await
            .unwrap();
        assert_eq!(outcome, RunOutcome::Shutdown);
    }

    #[tokio::test]
    async fn test_startup_config_error_is_returned() {
        let provider = FlakyProvider {
            good: config(true, 60),
            loads: AtomicUsize::new(1),
        };
        let err = daemon(Arc::new(provider))
            .run_until(std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::Configuration { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_failure_keeps_previous_config() {
        let provider = Arc::new(FlakyProvider {
            good: config(true, 60),
            loads: AtomicUsize::new(0),
        });
        let daemon = daemon(provider.clone());

        let outcome = daemon
            .run_until(tokio::time::sleep(Duration::from_secs(150)))
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Shutdown);
        assert_eq!(provider.loads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unrepresentable_sleep_is_error() {
        let daemon = daemon(Arc::new(config(true, u64::MAX)));
        let err = daemon.run_until(std::future::pending()).await.unwrap_err();
        assert!(matches!(err, MonitorError::SleepComputation { .. }));
    }

    #[tokio::test]
    async fn test_run_cycle_healthy_host() {
        let config = config(true, 60);
        let report = daemon(Arc::new(config.clone()))
            .run_cycle(&config, Utc::now())
            .await
            .unwrap();

        assert_eq!(report.count(ExpirySeverity::Healthy), 1);
        assert_eq!(report.override_sleep_seconds, None);
        assert_eq!(report.notifications_sent, 0);
    }
}
