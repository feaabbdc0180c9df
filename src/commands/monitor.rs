// MonitorCommand - Certificate monitoring loop
// Copyright (C) 2025 The CertMonitor Authors
// Licensed under GPL-3.0

use super::Command;
use crate::certificates::TlsCertificateFetcher;
use crate::monitor::{FileConfigProvider, MonitorDaemon, RunOutcome};
use crate::{Args, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// MonitorCommand runs the monitoring cycles until single-pass completion
/// or until SIGTERM/SIGINT
pub struct MonitorCommand {
    args: Args,
}

impl MonitorCommand {
    /// Create a new MonitorCommand with the given arguments
    pub fn new(args: Args) -> Self {
        Self { args }
    }
}

#[async_trait]
impl Command for MonitorCommand {
    async fn execute(&self) -> Result<()> {
        let provider = Arc::new(FileConfigProvider::new(&self.args.config));
        let fetcher = Arc::new(TlsCertificateFetcher::new()?);

        info!(
            "Starting certificate monitoring with configuration {}",
            provider.path().display()
        );

        let daemon = MonitorDaemon::new(provider, fetcher);
        match daemon.start().await? {
            RunOutcome::SinglePass => info!("Certificate check complete"),
            RunOutcome::Shutdown => info!("Certificate monitoring stopped"),
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "MonitorCommand"
    }
}
