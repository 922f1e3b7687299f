//! Telegram delivery through the Bot API `sendMessage` method.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{Transport, TransportError};
use crate::config::TelegramConfig;

pub struct TelegramTransport {
  client: Client,
  config: TelegramConfig,
}

impl TelegramTransport {
  pub fn new(config: TelegramConfig) -> Result<Self, TransportError> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  fn endpoint(&self) -> String {
    format!(
      "{}/bot{}/sendMessage",
      self.config.api_base.trim_end_matches('/'),
      self.config.bot_token
    )
  }
}

#[async_trait]
impl Transport for TelegramTransport {
  async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), TransportError> {
    let payload = json!({
      "chat_id": recipient,
      "text": format!("{subject}\n\n{body}"),
      "disable_web_page_preview": true,
    });

    let resp = self.client.post(self.endpoint()).json(&payload).send().await?;
    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(TransportError::Rejected { status: status.as_u16(), body });
    }
    tracing::debug!(chat_id = recipient, "telegram message accepted");
    Ok(())
  }
}
