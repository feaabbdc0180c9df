// CheckConfigCommand - Validate the YAML configuration and print a summary
// Copyright (C) 2025 The CertMonitor Authors
// Licensed under GPL-3.0

use super::Command;
use crate::monitor::MonitorConfig;
use crate::monitor::scheduler::humanize_seconds;
use crate::{Args, Result};
use async_trait::async_trait;
use colored::*;

/// CheckConfigCommand loads the configuration exactly as the monitor would
pub struct CheckConfigCommand {
    args: Args,
}

impl CheckConfigCommand {
    pub fn new(args: Args) -> Self {
        Self { args }
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag { "enabled" } else { "disabled" }
}

/// Human-readable description of a validated configuration
pub fn summary_lines(config: &MonitorConfig) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!("Websites ({}):", config.targets.len()));
    for target in &config.targets {
        lines.push(format!("  - {}", target.identifier()));
    }

    lines.push(format!("Buffer days: {}", config.buffer_days));
    if config.continuous_monitoring {
        lines.push(format!(
            "Continuous monitoring: every {}",
            humanize_seconds(config.monitor_sleep_seconds)
        ));
    } else {
        lines.push("Continuous monitoring: disabled (single pass)".to_string());
    }
    lines.push(format!("Time zone: {}", config.time_zone));
    lines.push(format!("Sleep override policy: {}", config.override_policy));
    lines.push(format!("Certificate alerts: {}", enabled(config.email_alerts)));
    lines.push(format!(
        "Program error alerts: {}",
        enabled(config.alert_program_errors)
    ));

    let email = &config.email;
    lines.push(format!(
        "SMTP: {}:{} ({}, {})",
        email.smtp_server,
        email.smtp_port,
        if email.use_tls { "STARTTLS" } else { "plain" },
        if email.authentication_required {
            "authenticated"
        } else {
            "anonymous"
        }
    ));
    lines.push(format!("From: {}", email.from_address));
    lines.push(format!(
        "To: {}",
        email
            .to_addresses
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    ));

    lines
}

#[async_trait]
impl Command for CheckConfigCommand {
    async fn execute(&self) -> Result<()> {
        let config = MonitorConfig::from_file(&self.args.config)?;

        println!(
            "{} Configuration {} is valid\n",
            "✓".green().bold(),
            self.args.config.display()
        );
        for line in summary_lines(&config) {
            println!("  {}", line);
        }
        println!();

        Ok(())
    }

    fn name(&self) -> &'static str {
        "CheckConfigCommand"
    }
}
