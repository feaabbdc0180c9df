// Monitoring operation arguments
// Copyright (C) 2025 The CertMonitor Authors
// Licensed under GPL-3.0

use clap::Args;

/// One-shot operations that run instead of the monitoring loop
#[derive(Args, Debug, Clone, Default)]
pub struct MonitoringArgs {
    /// Validate the configuration file, print a summary and exit
    #[arg(long = "check-config")]
    pub check_config: bool,

    /// Send a test notification through the configured email settings and exit
    #[arg(long = "test-alert")]
    pub test_alert: bool,
}
