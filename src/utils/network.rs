// Network utilities - target parsing, DNS resolution, socket helpers

use crate::{MonitorError, Result};
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::*;
use hickory_resolver::system_conf;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Standard HTTPS port
pub const HTTPS_PORT: u16 = 443;

/// Host and port of a configured site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub hostname: String,
    pub port: u16,
}

impl Target {
    /// Parse a configured site entry
    ///
    /// Accepts `example.com`, `example.com:8443`, and full URLs such as
    /// `https://example.com/login`. Scheme and path are dropped; the port
    /// defaults to 443.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(MonitorError::config("Empty site URL entry"));
        }

        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        let url = url::Url::parse(&with_scheme)
            .map_err(|e| MonitorError::config(format!("Invalid site URL '{}': {}", input, e)))?;

        let hostname = url
            .host_str()
            .ok_or_else(|| MonitorError::config(format!("No hostname in site URL '{}'", input)))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();

        let port = url.port().unwrap_or(HTTPS_PORT);

        Ok(Self { hostname, port })
    }

    /// Identifier used in logs and messages (`host` or `host:port`)
    pub fn identifier(&self) -> String {
        if self.port == HTTPS_PORT {
            self.hostname.clone()
        } else {
            format!("{}:{}", self.hostname, self.port)
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

/// Resolver settings from the host (`/etc/resolv.conf` on Unix)
///
/// Falls back to the built-in public nameservers only when the system
/// configuration cannot be read.
pub fn resolver_config() -> (ResolverConfig, ResolverOpts) {
    match system_conf::read_system_conf() {
        Ok(conf) => conf,
        Err(e) => {
            tracing::warn!(
                "Could not read system resolver configuration, using public DNS: {}",
                e
            );
            (ResolverConfig::default(), ResolverOpts::default())
        }
    }
}

/// Resolve hostname to IP addresses
pub async fn resolve_hostname(hostname: &str) -> Result<Vec<IpAddr>> {
    // Check if it's already an IP address
    if let Ok(ip) = hostname.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }

    let (config, opts) = resolver_config();
    let resolver = TokioAsyncResolver::tokio(config, opts);

    let response = resolver
        .lookup_ip(hostname)
        .await
        .map_err(|e| MonitorError::Connection {
            host: hostname.to_string(),
            details: format!("DNS lookup failed: {}", e),
        })?;

    let ips: Vec<IpAddr> = response.iter().collect();

    if ips.is_empty() {
        return Err(MonitorError::Connection {
            host: hostname.to_string(),
            details: "No IP addresses found".to_string(),
        });
    }

    Ok(ips)
}

/// Connect to the first reachable address of a target
pub async fn connect_with_timeout(
    target: &Target,
    addrs: &[IpAddr],
    connect_timeout: Duration,
) -> Result<TcpStream> {
    let mut last_error = None;

    for ip in addrs {
        let addr = SocketAddr::new(*ip, target.port);
        match timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => return Ok(stream),
            Ok(Err(e)) => {
                tracing::debug!("Connection to {} failed: {}", addr, e);
                last_error = Some(MonitorError::Connection {
                    host: target.identifier(),
                    details: format!("{}: {}", addr, e),
                });
            }
            Err(_) => {
                tracing::debug!("Connection to {} timed out", addr);
                last_error = Some(MonitorError::Timeout {
                    host: target.identifier(),
                    duration: connect_timeout,
                });
            }
        }
    }

    Err(last_error.unwrap_or_else(|| MonitorError::Connection {
        host: target.identifier(),
        details: "No addresses to connect to".to_string(),
    }))
}
