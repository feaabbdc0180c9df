// CommandRouter - Routes CLI arguments to appropriate Command
// Copyright (C) 2025 The CertMonitor Authors
// Licensed under GPL-3.0

use super::{CheckConfigCommand, Command, MonitorCommand, TestAlertCommand};
use crate::{Args, MonitorError, Result};

/// CommandRouter determines which Command to execute based on CLI arguments
///
/// Priority order:
/// 1. Alert test (--test-alert)
/// 2. Configuration check (--check-config)
/// 3. Monitoring loop (default)
pub struct CommandRouter;

impl CommandRouter {
    /// Route CLI arguments to the appropriate Command
    pub fn route(args: Args) -> Result<Box<dyn Command>> {
        Self::validate_routing(&args)?;

        if args.monitoring.test_alert {
            return Ok(Box::new(TestAlertCommand::new(args)));
        }

        if args.monitoring.check_config {
            return Ok(Box::new(CheckConfigCommand::new(args)));
        }

        Ok(Box::new(MonitorCommand::new(args)))
    }

    /// Reject argument combinations that select more than one mode
    pub fn validate_routing(args: &Args) -> Result<()> {
        if args.monitoring.test_alert && args.monitoring.check_config {
            return Err(MonitorError::config(
                "Cannot combine --test-alert and --check-config. Choose one operation.",
            ));
        }

        Ok(())
    }
}
