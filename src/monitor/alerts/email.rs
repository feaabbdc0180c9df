// Email Alert Channel - Using lettre

use crate::monitor::alerts::{Alert, AlertChannel, AlertKind};
use crate::monitor::config::EmailConfig;
use crate::{MonitorError, Result};
use async_trait::async_trait;
use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Email alert channel
pub struct EmailChannel {
    config: EmailConfig,
}

impl EmailChannel {
    /// Create new email channel
    pub fn new(config: EmailConfig) -> Result<Self> {
        if config.authentication_required && config.username.is_empty() {
            return Err(MonitorError::config(
                "username must be set when authentication_required is enabled",
            ));
        }

        Ok(Self { config })
    }

    /// Build email message from alert
    fn build_message(&self, alert: &Alert) -> Result<Message> {
        let mut message_builder = Message::builder()
            .from(self.config.from_address.clone())
            .subject(alert.subject.clone());

        for to_addr in &self.config.to_addresses {
            message_builder = message_builder.to(to_addr.clone());
        }

        let message = message_builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_PLAIN)
                        .body(self.format_text_body(alert)),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_HTML)
                        .body(self.format_html_body(alert)),
                ),
        )?;

        Ok(message)
    }

    fn format_text_body(&self, alert: &Alert) -> String {
        format!(
            "{}\n\nWebsite: {}\nChecked: {}\n\n---\nGenerated by CertMonitor",
            alert.body,
            alert.hostname,
            alert.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }

    fn format_html_body(&self, alert: &Alert) -> String {
        let header_color = match alert.kind {
            AlertKind::Expired => "#dc3545",
            AlertKind::ExpiringSoon => "#fd7e14",
            AlertKind::ValidationSkipped => "#6c757d",
            AlertKind::Test => "#0dcaf0",
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #333;">
    <div style="background: {}; color: white; padding: 16px;">
        <h2 style="margin: 0;">{}</h2>
    </div>
    <div style="padding: 16px;">
        <p>{}</p>
        <p><strong>Website:</strong> {}<br><strong>Checked:</strong> {}</p>
    </div>
    <p style="font-size: 12px; color: #666;">Generated by CertMonitor</p>
</body>
</html>"#,
            header_color,
            escape_html(&alert.subject),
            escape_html(&alert.body),
            escape_html(&alert.hostname),
            alert.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }

    /// Get SMTP transport
    fn get_transport(&self) -> Result<SmtpTransport> {
        let builder = if self.config.use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_server)?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_server)
        };

        let mut builder = builder
            .port(self.config.smtp_port)
            .timeout(Some(SMTP_TIMEOUT));

        if self.config.authentication_required {
            builder = builder.credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ));
        }

        Ok(builder.build())
    }
}

/// Escape text placed inside the HTML body
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[async_trait]
impl AlertChannel for EmailChannel {
    async fn send_alert(&self, alert: &Alert) -> Result<()> {
        let message = self.build_message(alert)?;
        let transport = self.get_transport()?;

        tracing::debug!(
            "Sending '{}' to {} recipient(s) via {}:{}",
            alert.subject,
            self.config.to_addresses.len(),
            self.config.smtp_server,
            self.config.smtp_port
        );

        // SMTP is blocking, keep it off the runtime threads
        tokio::task::spawn_blocking(move || transport.send(&message)).await??;

        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }

    async fn test_connection(&self) -> Result<()> {
        let transport = self.get_transport()?;

        let reachable = tokio::task::spawn_blocking(move || transport.test_connection()).await??;
        if !reachable {
            return Err(MonitorError::Notification {
                details: format!(
                    "SMTP server {}:{} did not accept the connection",
                    self.config.smtp_server, self.config.smtp_port
                ),
            });
        }

        Ok(())
    }
}
