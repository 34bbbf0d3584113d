use crate::error::PulseError;
use async_trait::async_trait;

/// Outbound SMS gateway.
///
/// Every SMS provider (Twilio in production, a mock in tests) implements this
/// trait. Delivery is fire-and-forget from the engine's point of view:
/// `send` resolves once the provider has accepted the message, and the
/// provider message id it returns is later reconciled against delivery-status
/// callbacks.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Send `body` to the destination phone number.
    /// Returns the provider message id on acceptance.
    async fn send(&self, to: &str, body: &str) -> Result<String, PulseError>;

    /// Whether the provider has the credentials it needs to send.
    fn is_configured(&self) -> bool;
}
