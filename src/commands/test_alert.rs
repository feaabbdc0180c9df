// TestAlertCommand - Send a test notification
// Copyright (C) 2025 The CertMonitor Authors
// Licensed under GPL-3.0

use super::Command;
use crate::monitor::MonitorConfig;
use crate::monitor::alerts::AlertManager;
use crate::monitor::alerts::email::EmailChannel;
use crate::{Args, MonitorError, Result};
use async_trait::async_trait;
use colored::*;
use tracing::info;

/// TestAlertCommand sends one test email with the configured SMTP settings,
/// regardless of the alert flags
pub struct TestAlertCommand {
    args: Args,
}

impl TestAlertCommand {
    pub fn new(args: Args) -> Self {
        Self { args }
    }
}

#[async_trait]
impl Command for TestAlertCommand {
    async fn execute(&self) -> Result<()> {
        let config = MonitorConfig::from_file(&self.args.config)?;

        let mut manager = AlertManager::new();
        manager.add_channel(Box::new(EmailChannel::new(config.email.clone())?));

        info!("Testing alert channels...");
        let results = manager.test_channels().await;

        println!("\nAlert Channel Tests:");
        println!("{}", "=".repeat(80));

        let mut failures = Vec::new();
        for (channel_name, result) in results {
            match result {
                Ok(()) => println!("  {} {} - Success", "✓".green().bold(), channel_name),
                Err(e) => {
                    println!("  {} {} - Failed: {}", "✗".red().bold(), channel_name, e);
                    failures.push(format!("{}: {}", channel_name, e));
                }
            }
        }
        println!();

        if !failures.is_empty() {
            return Err(MonitorError::Notification {
                details: failures.join("; "),
            });
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "TestAlertCommand"
    }
}
