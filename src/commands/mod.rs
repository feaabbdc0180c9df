// Commands module - Command Pattern implementation
// Copyright (C) 2025 The CertMonitor Authors
// Licensed under GPL-3.0

mod command;
mod router;

// Individual command implementations
mod check_config;
mod monitor;
mod test_alert;

pub use command::Command;
pub use router::CommandRouter;

pub use check_config::CheckConfigCommand;
pub use monitor::MonitorCommand;
pub use test_alert::TestAlertCommand;
