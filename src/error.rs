// Error types for CertMonitor
//
// Every failure is carried as a typed variant. Per-host variants are caught at
// the host-iteration boundary by the scheduler; configuration and sleep errors
// escalate to process termination.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Main error type for CertMonitor operations
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Invalid or missing configuration value
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    /// Host could not be resolved or reached
    #[error("Host {host} is not reachable: {details}")]
    Connection { host: String, details: String },

    /// Connection timed out before the handshake could complete
    #[error("Connection to {host} timed out after {duration:?}")]
    Timeout { host: String, duration: Duration },

    /// TLS handshake failed, the endpoint is probably not serving HTTPS
    #[error("TLS handshake with {host} failed: {details}")]
    Protocol { host: String, details: String },

    /// Certificate could not be parsed or carries an unreadable validity field
    #[error("Malformed certificate for {host}: {details}")]
    MalformedCertificate { host: String, details: String },

    /// Notification delivery failed
    #[error("Failed to send the notification: {details}")]
    Notification { details: String },

    /// The requested sleep cannot be represented
    #[error("Sleep of {seconds} seconds cannot be scheduled")]
    SleepComputation { seconds: u64 },

    /// Generic I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// Coarse classification used for log fields and outcome reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Unreachable,
    Protocol,
    MalformedCertificate,
    Notification,
    SleepComputation,
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Unreachable => write!(f, "unreachable"),
            ErrorKind::Protocol => write!(f, "protocol"),
            ErrorKind::MalformedCertificate => write!(f, "malformed-certificate"),
            ErrorKind::Notification => write!(f, "notification"),
            ErrorKind::SleepComputation => write!(f, "sleep-computation"),
            ErrorKind::Io => write!(f, "io"),
        }
    }
}

impl MonitorError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        MonitorError::Configuration {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MonitorError::Configuration { .. } => ErrorKind::Configuration,
            MonitorError::Connection { .. } | MonitorError::Timeout { .. } => {
                ErrorKind::Unreachable
            }
            MonitorError::Protocol { .. } => ErrorKind::Protocol,
            MonitorError::MalformedCertificate { .. } => ErrorKind::MalformedCertificate,
            MonitorError::Notification { .. } => ErrorKind::Notification,
            MonitorError::SleepComputation { .. } => ErrorKind::SleepComputation,
            MonitorError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Whether the error only affects a single host check
    pub fn is_per_host(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Unreachable | ErrorKind::Protocol | ErrorKind::MalformedCertificate
        )
    }

    /// Process exit status for an error that ends the program
    ///
    /// 1 for configuration problems, 2 for anything else.
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Configuration => 1,
            _ => 2,
        }
    }

    /// Plain-language remediation logged next to the error
    pub fn remediation(&self) -> &'static str {
        match self {
            MonitorError::Configuration { .. } => {
                "Please verify the YAML configuration file. Supported time zones are CST, UTC, EST, MST, and PST."
            }
            MonitorError::Connection { .. } | MonitorError::Timeout { .. } => {
                "Please validate that the website address is reachable. If the website is no longer available, remove it from the configuration file to stop these alerts."
            }
            MonitorError::Protocol { .. } => {
                "Please validate that the website is an HTTPS supported website."
            }
            MonitorError::MalformedCertificate { .. } => {
                "The server returned a certificate that could not be read. Please inspect the certificate installed on the website."
            }
            MonitorError::Notification { .. } => {
                "Please verify the SMTP settings in the notification_handler section."
            }
            MonitorError::SleepComputation { .. } => {
                "Please lower the monitor_sleep value in the configuration file."
            }
            MonitorError::Io { .. } => "Please check file permissions and paths.",
        }
    }
}

impl From<serde_yaml::Error> for MonitorError {
    fn from(err: serde_yaml::Error) -> Self {
        MonitorError::Configuration {
            message: format!("Failed to parse YAML: {}", err),
        }
    }
}

impl From<lettre::address::AddressError> for MonitorError {
    fn from(err: lettre::address::AddressError) -> Self {
        MonitorError::Notification {
            details: format!("Email address error: {}", err),
        }
    }
}

impl From<lettre::error::Error> for MonitorError {
    fn from(err: lettre::error::Error) -> Self {
        MonitorError::Notification {
            details: format!("Email error: {}", err),
        }
    }
}

impl From<lettre::transport::smtp::Error> for MonitorError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        MonitorError::Notification {
            details: format!("SMTP error: {}", err),
        }
    }
}

impl From<tokio::task::JoinError> for MonitorError {
    fn from(err: tokio::task::JoinError) -> Self {
        MonitorError::Io {
            source: io::Error::other(format!("Task join error: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_message() {
        let err = MonitorError::Connection {
            host: "unreachable.example".to_string(),
            details: "DNS lookup failed".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("unreachable.example"));
        assert!(msg.contains("not reachable"));
        assert_eq!(err.kind(), ErrorKind::Unreachable);
    }

    #[test]
    fn test_timeout_counts_as_unreachable() {
        let err = MonitorError::Timeout {
            host: "slow.example".to_string(),
            duration: Duration::from_secs(10),
        };
        assert_eq!(err.kind(), ErrorKind::Unreachable);
        assert!(err.is_per_host());
    }

    #[test]
    fn test_protocol_remediation_mentions_https() {
        let err = MonitorError::Protocol {
            host: "plain.example".to_string(),
            details: "received corrupt message".to_string(),
        };
        assert!(err.remediation().contains("HTTPS"));
        assert!(err.is_per_host());
    }

    #[test]
    fn test_fatal_errors_are_not_per_host() {
        assert!(!MonitorError::config("bad").is_per_host());
        assert!(!MonitorError::SleepComputation { seconds: u64::MAX }.is_per_host());
        assert!(
            !MonitorError::Notification {
                details: "smtp down".to_string()
            }
            .is_per_host()
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(MonitorError::config("bad").exit_code(), 1);
        assert_eq!(MonitorError::SleepComputation { seconds: 1 }.exit_code(), 2);
    }

    #[test]
    fn test_yaml_error_becomes_configuration() {
        let yaml_err = serde_yaml::from_str::<u64>("not a number").unwrap_err();
        let err: MonitorError = yaml_err.into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_error_conversion_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: MonitorError = io_err.into();
        assert!(matches!(err, MonitorError::Io { .. }));
    }
}
