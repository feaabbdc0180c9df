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

use certmonitor::Args;
use certmonitor::commands::CommandRouter;
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use tracing::{Level, debug, error};
use tracing_subscriber::FmtSubscriber;

fn print_banner() {
    println!("{}", "#".repeat(80).cyan());
    println!("  {} v{}", "CertMonitor".bold(), env!("CARGO_PKG_VERSION"));
    println!("  Periodic TLS Certificate Expiry Monitor");
    println!("  Copyright (C) 2025 The CertMonitor Authors");
    println!("  Licensed under GPL-3.0");
    println!("{}", "#".repeat(80).cyan());
}

#[tokio::main]
async fn main() -> ExitCode {
    // Install rustls crypto provider (required for rustls 0.23+)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    // Initialize logging - respect RUST_LOG environment variable
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let args = Args::parse();

    if !args.no_banner {
        print_banner();
    }

    let command = match CommandRouter::route(args) {
        Ok(command) => command,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    debug!("Executing {}", command.name());

    match command.execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{} {}", e, e.remediation());
            ExitCode::from(e.exit_code())
        }
    }
}
