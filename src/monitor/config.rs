// Monitoring configuration

use crate::certificates::TimeZoneLabel;
use crate::monitor::scheduler::OverridePolicy;
use crate::utils::network::Target;
use crate::{MonitorError, Result};
use lettre::message::Mailbox;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "certmonitor.yaml";

/// YAML document as written by the user
#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    general: RawGeneral,
    site_urls: Vec<String>,
    notification_handler: RawNotificationHandler,
}

#[derive(Debug, Clone, Deserialize)]
struct RawGeneral {
    continuous_monitoring: bool,
    monitor_sleep: u64,
    email_alerts: bool,
    alert_program_errors: bool,
    buffer_days: i64,
    #[serde(alias = "time_zome")]
    time_zone: String,
    #[serde(default)]
    override_policy: OverridePolicy,
}

#[derive(Debug, Clone, Deserialize)]
struct RawNotificationHandler {
    email: RawEmail,
}

#[derive(Debug, Clone, Deserialize)]
struct RawEmail {
    smtp: String,
    authentication_required: bool,
    use_tls: bool,
    username: String,
    password: String,
    from_email: String,
    to_email: String,
}

/// Validated SMTP settings
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub authentication_required: bool,
    pub use_tls: bool,
    pub username: String,
    pub password: String,
    pub from_address: Mailbox,
    pub to_addresses: Vec<Mailbox>,
}

/// Validated monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub targets: Vec<Target>,
    pub buffer_days: u32,
    pub monitor_sleep_seconds: u64,
    pub continuous_monitoring: bool,
    pub email_alerts: bool,
    pub alert_program_errors: bool,
    pub time_zone: TimeZoneLabel,
    pub override_policy: OverridePolicy,
    pub email: EmailConfig,
}

impl MonitorConfig {
    /// Load configuration from YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            MonitorError::config(format!(
                "Failed to read config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(contents)?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self> {
        let general = raw.general;

        let buffer_days = u32::try_from(general.buffer_days).map_err(|_| {
            MonitorError::config(format!(
                "buffer_days must be a non-negative number of days, got {}",
                general.buffer_days
            ))
        })?;

        if general.continuous_monitoring && general.monitor_sleep == 0 {
            return Err(MonitorError::config(
                "monitor_sleep must be at least 1 second when continuous_monitoring is enabled",
            ));
        }

        let time_zone: TimeZoneLabel = general.time_zone.parse()?;

        if raw.site_urls.is_empty() {
            return Err(MonitorError::config("site_urls must list at least one website"));
        }

        let targets = raw
            .site_urls
            .iter()
            .map(|url| Target::parse(url))
            .collect::<Result<Vec<_>>>()?;

        let email = EmailConfig::validate(raw.notification_handler.email)?;

        Ok(Self {
            targets,
            buffer_days,
            monitor_sleep_seconds: general.monitor_sleep,
            continuous_monitoring: general.continuous_monitoring,
            email_alerts: general.email_alerts,
            alert_program_errors: general.alert_program_errors,
            time_zone,
            override_policy: general.override_policy,
            email,
        })
    }

    /// Whether any notification can be produced with this configuration
    pub fn notifications_enabled(&self) -> bool {
        self.email_alerts || self.alert_program_errors
    }
}

impl EmailConfig {
    fn validate(raw: RawEmail) -> Result<Self> {
        let (smtp_server, smtp_port) = split_smtp(&raw.smtp, raw.use_tls)?;

        let from_address: Mailbox = raw.from_email.trim().parse().map_err(|e| {
            MonitorError::config(format!("Invalid from_email '{}': {}", raw.from_email, e))
        })?;

        let to_addresses = raw
            .to_email
            .split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(|addr| {
                addr.parse::<Mailbox>()
                    .map_err(|e| MonitorError::config(format!("Invalid to_email '{}': {}", addr, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        if to_addresses.is_empty() {
            return Err(MonitorError::config("to_email must contain at least one address"));
        }

        Ok(Self {
            smtp_server,
            smtp_port,
            authentication_required: raw.authentication_required,
            use_tls: raw.use_tls,
            username: raw.username,
            password: raw.password,
            from_address,
            to_addresses,
        })
    }
}

/// Split `host[:port]`, defaulting to 587 with STARTTLS and 25 without
fn split_smtp(smtp: &str, use_tls: bool) -> Result<(String, u16)> {
    let smtp = smtp.trim();
    if smtp.is_empty() {
        return Err(MonitorError::config("smtp server must not be empty"));
    }

    match smtp.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => {
            let port = port
                .parse::<u16>()
                .map_err(|_| MonitorError::config(format!("Invalid smtp port in '{}'", smtp)))?;
            Ok((host.to_string(), port))
        }
        Some(_) => Err(MonitorError::config(format!("Invalid smtp server '{}'", smtp))),
        None => Ok((smtp.to_string(), if use_tls { 587 } else { 25 })),
    }
}

/// Supplies the configuration at the top of every cycle
pub trait ConfigProvider: Send + Sync {
    fn load(&self) -> Result<MonitorConfig>;

    /// Where the configuration comes from, for logging
    fn describe(&self) -> String;
}

/// Reads the YAML file each time it is asked, so edits apply on the next cycle
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for FileConfigProvider {
    fn load(&self) -> Result<MonitorConfig> {
        tracing::debug!("Loading YAML configuration values from {}", self.path.display());
        MonitorConfig::from_file(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl ConfigProvider for MonitorConfig {
    fn load(&self) -> Result<MonitorConfig> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        "in-memory configuration".to_string()
    }
}
