//! WhatsApp welcome messages through the Twilio Messages API

use std::env;
use std::time::Duration;
use async_trait::async_trait;
use serde::Serialize;

use shared::component_debug;
use shared::{ComponentId, NormalizedPhone};
use crate::error::{ScannerError, ScannerResult};
use crate::traits::Notifier;

/// Twilio WhatsApp sandbox sender
pub const DEFAULT_WHATSAPP_FROM: &str = "whatsapp:+14155238886";

pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";

/// Twilio account settings
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender address, `whatsapp:+<number>`
    pub from: String,
    pub api_base: String,
    pub request_timeout: Duration,
}

impl TwilioConfig {
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from: DEFAULT_WHATSAPP_FROM.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Read `TWILIO_SID` / `TWILIO_TOKEN` (plus optional `TWILIO_FROM` and
    /// `TWILIO_API_BASE`); `None` when the credentials are not set
    pub fn from_env() -> Option<Self> {
        let account_sid = env::var("TWILIO_SID").ok().filter(|v| !v.is_empty())?;
        let auth_token = env::var("TWILIO_TOKEN").ok().filter(|v| !v.is_empty())?;

        let mut config = Self::new(account_sid, auth_token);
        if let Ok(from) = env::var("TWILIO_FROM") {
            config.from = whatsapp_address(&from);
        }
        if let Ok(api_base) = env::var("TWILIO_API_BASE") {
            config.api_base = api_base;
        }
        Some(config)
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        )
    }
}

/// Prefix an address with `whatsapp:` unless it already has it
pub fn whatsapp_address(address: &str) -> String {
    if address.starts_with("whatsapp:") {
        address.to_string()
    } else {
        format!("whatsapp:{address}")
    }
}

#[derive(Serialize)]
struct MessageForm<'a> {
    #[serde(rename = "From")]
    from: &'a str,
    #[serde(rename = "To")]
    to: String,
    #[serde(rename = "Body")]
    body: &'a str,
}

/// Notifier that posts to the Twilio Messages endpoint
pub struct WhatsAppNotifier {
    config: TwilioConfig,
    client: reqwest::Client,
}

impl WhatsAppNotifier {
    pub fn new(config: TwilioConfig) -> ScannerResult<Self> {
        let client = reqwest::Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    async fn send_message(&self, to: &NormalizedPhone, body: &str) -> ScannerResult<()> {
        let form = MessageForm {
            from: &self.config.from,
            to: whatsapp_address(to.as_str()),
            body,
        };

        let response = self
            .client
            .post(self.config.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let response_json: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);

        if !status.is_success() {
            let message = response_json
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("no error message");
            return Err(ScannerError::notification(format!("HTTP {}: {}", status.as_u16(), message)));
        }

        let sid = response_json.get("sid").and_then(|s| s.as_str()).unwrap_or("unknown");
        component_debug!(ComponentId::Dispatcher, message_sid = sid, "Twilio accepted message to {}", to);
        Ok(())
    }
}
