// CertMonitor - Periodic TLS certificate expiry monitor
// Copyright (C) 2025 The CertMonitor Authors
// Licensed under GPL-3.0
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.

//! CertMonitor watches the TLS certificates of a list of websites and emails
//! an alert when one is about to expire, has expired, or cannot be checked.
//! It can run once or as a long-lived loop that re-reads its YAML
//! configuration before every cycle.

pub mod certificates;
pub mod cli;
pub mod commands;
pub mod error;
pub mod monitor;
pub mod utils;

// Re-export commonly used types
pub use crate::cli::Args;
pub use crate::error::MonitorError;

/// Result type for CertMonitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;
