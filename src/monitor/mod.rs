// Certificate Expiry Monitoring
//
// Each cycle reloads the YAML configuration, fetches the certificate of every
// configured website, classifies how close it is to expiry and emails an
// alert when it needs attention. Between cycles the daemon sleeps for the
// configured interval, shortened to one day while any certificate is in
// trouble, and stops cleanly on SIGTERM/SIGINT.

pub mod alerts;
pub mod config;
pub mod daemon;
pub mod scheduler;
pub mod types;

// Re-export commonly used types
pub use alerts::{Alert, AlertChannel, AlertKind, AlertManager};
pub use config::{ConfigProvider, EmailConfig, FileConfigProvider, MonitorConfig};
pub use daemon::{MonitorDaemon, RunOutcome};
pub use scheduler::{CycleState, OverridePolicy, SleepPlan};
pub use types::{CycleReport, HostOutcome};
