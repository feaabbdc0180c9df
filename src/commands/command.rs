// Command trait - Defines the interface for all command implementations
// Copyright (C) 2025 The CertMonitor Authors
// Licensed under GPL-3.0

use crate::Result;
use async_trait::async_trait;

/// Command trait - one operational mode of CertMonitor
///
/// `main` routes the parsed arguments to a command, executes it and turns
/// the returned error into the process exit status.
#[async_trait]
pub trait Command: Send + Sync {
    /// Execute the command asynchronously
    async fn execute(&self) -> Result<()>;

    /// Get a human-readable name for this command (for logging/debugging)
    fn name(&self) -> &'static str;
}
