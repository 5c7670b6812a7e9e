//! SMS delivery adapters.
//!
//! The OTP flow only depends on a send capability; delivery itself is the
//! provider's problem. `LogSmsSender` is the development default and simply
//! logs the message.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::info;

/// SMS delivery errors.
#[derive(Debug, Error)]
pub enum SmsError {
    #[error("SMS request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("SMS provider returned an error: {0}")]
    Provider(String),
}

/// A channel that can deliver a text message to a phone number.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, phone: &str, message: &str) -> Result<(), SmsError>;
}

/// Logs outgoing messages instead of delivering them (development default).
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send(&self, phone: &str, message: &str) -> Result<(), SmsError> {
        info!(%phone, %message, "SMS (log only)");
        Ok(())
    }
}

/// Configuration for an HTTP SMS provider.
#[derive(Debug, Clone)]
pub struct SmsGatewayOptions {
    pub api_url: String,
    pub api_key: String,
    pub sender_id: String,
}

impl SmsGatewayOptions {
    /// Read provider settings from `SMS_API_URL` / `SMS_API_KEY` /
    /// `SMS_SENDER_ID`. Returns `None` when no provider is configured.
    pub fn from_env() -> Option<Self> {
        let api_url = std::env::var("SMS_API_URL").ok().filter(|v| !v.is_empty())?;
        Some(Self {
            api_url,
            api_key: std::env::var("SMS_API_KEY").unwrap_or_default(),
            sender_id: std::env::var("SMS_SENDER_ID").unwrap_or_default(),
        })
    }
}

/// Delivers messages through an HTTP SMS provider (form POST).
pub struct HttpSmsGateway {
    options: SmsGatewayOptions,
    client: Client,
}

impl HttpSmsGateway {
    pub fn new(options: SmsGatewayOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SmsSender for HttpSmsGateway {
    async fn send(&self, phone: &str, message: &str) -> Result<(), SmsError> {
        let mut form: HashMap<&str, &str> = HashMap::new();
        form.insert("api_key", &self.options.api_key);
        form.insert("senderid", &self.options.sender_id);
        form.insert("number", phone);
        form.insert("message", message);

        let response = self
            .client
            .post(&self.options.api_url)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SmsError::Provider(format!("{status}: {body}")));
        }

        Ok(())
    }
}
