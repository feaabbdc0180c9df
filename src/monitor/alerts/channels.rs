// Alert Channel Trait

use crate::Result;
use crate::monitor::alerts::Alert;
use async_trait::async_trait;

/// Alert channel trait - implement this for custom alert channels
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Deliver an alert; failures are reported back, never retried here
    async fn send_alert(&self, alert: &Alert) -> Result<()>;

    /// Get the channel name for logging
    fn channel_name(&self) -> &str;

    /// Check that the channel can reach its backend
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }
}
