// CLI module - Command line interface and argument parsing
// Copyright (C) 2025 The CertMonitor Authors
// Licensed under GPL-3.0

use crate::monitor::config::DEFAULT_CONFIG_FILE;
use clap::Parser;
use std::path::PathBuf;

mod monitoring_args;

pub use monitoring_args::MonitoringArgs;

/// CertMonitor - Periodic TLS certificate expiry monitor
///
/// Without flags the monitor runs its cycle loop against the YAML
/// configuration file; `--check-config` and `--test-alert` run once and exit.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "certmonitor", version, about, long_about = None)]
pub struct Args {
    /// YAML configuration file
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    #[command(flatten)]
    pub monitoring: MonitoringArgs,

    /// Do not print the startup banner
    #[arg(long = "no-banner")]
    pub no_banner: bool,
}
