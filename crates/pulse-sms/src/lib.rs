//! # pulse-sms
//!
//! Twilio implementation of the [`Messenger`] trait. Messages are posted
//! form-encoded to the Twilio Messages API with basic auth; the returned
//! message sid is handed back to the caller for later delivery-status
//! reconciliation.

use async_trait::async_trait;
use pulse_core::config::TwilioConfig;
use pulse_core::error::PulseError;
use pulse_core::traits::Messenger;
use serde::Deserialize;
use tracing::info;

const TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Outbound SMS via the Twilio REST API.
pub struct TwilioMessenger {
    client: reqwest::Client,
    config: TwilioConfig,
    base_url: String,
}

/// The subset of Twilio's message resource we care about.
#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorResponse {
    message: Option<String>,
}

impl TwilioMessenger {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            base_url: TWILIO_API_BASE.to_string(),
        }
    }

    /// Point the messenger at a different API host. Used by tests.
    pub fn with_base_url(config: TwilioConfig, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            base_url: base_url.into(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.config.account_sid
        )
    }
}

#[async_trait]
impl Messenger for TwilioMessenger {
    fn name(&self) -> &str {
        "twilio"
    }

    async fn send(&self, to: &str, body: &str) -> Result<String, PulseError> {
        if !self.config.is_configured() {
            return Err(PulseError::Delivery(
                "twilio credentials not configured".to_string(),
            ));
        }

        let params = [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Body", body),
        ];

        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| PulseError::Delivery(format!("twilio request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp
                .json::<TwilioErrorResponse>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| "no error detail".to_string());
            return Err(PulseError::Delivery(format!(
                "twilio rejected message ({status}): {detail}"
            )));
        }

        let message: TwilioMessageResponse = resp
            .json()
            .await
            .map_err(|e| PulseError::Delivery(format!("twilio response parse failed: {e}")))?;

        info!("SMS accepted by twilio: {}", message.sid);
        Ok(message.sid)
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TwilioConfig {
        TwilioConfig {
            account_sid: "AC00000000000000000000000000000000".into(),
            auth_token: "token".into(),
            from_number: "+15550006666".into(),
        }
    }

    #[test]
    fn test_messages_url_includes_account_sid() {
        let messenger = TwilioMessenger::new(config());
        assert_eq!(
            messenger.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC00000000000000000000000000000000/Messages.json"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_send_is_delivery_error() {
        let messenger = TwilioMessenger::new(TwilioConfig::default());
        assert!(!messenger.is_configured());
        let err = messenger.send("+15551230001", "hello").await.unwrap_err();
        assert!(matches!(err, PulseError::Delivery(_)), "got: {err}");
    }
}
