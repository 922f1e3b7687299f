//! Email delivery through Brevo's transactional email API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{Transport, TransportError};
use crate::config::EmailConfig;

pub struct BrevoTransport {
  client: Client,
  config: EmailConfig,
}

impl BrevoTransport {
  pub fn new(config: EmailConfig) -> Result<Self, TransportError> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }
}

/// Frame an alert as a plain-text email.
pub fn email_body(message: &str) -> String {
  let rule = "=".repeat(50);
  format!(
    "Showwatch movie alert\n{rule}\n\n{message}\n\n{rule}\n\
     You received this email because you subscribed to movie notifications.\n"
  )
}

#[async_trait]
impl Transport for BrevoTransport {
  async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), TransportError> {
    let name = recipient.split('@').next().unwrap_or(recipient);
    let payload = json!({
      "sender": { "name": self.config.from_name, "email": self.config.from_address },
      "to": [{ "email": recipient, "name": name }],
      "subject": subject,
      "textContent": email_body(body),
    });

    let resp = self
      .client
      .post(&self.config.api_url)
      .header("api-key", &self.config.api_key)
      .header("accept", "application/json")
      .json(&payload)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(TransportError::Rejected { status: status.as_u16(), body });
    }
    tracing::debug!(recipient, "email accepted");
    Ok(())
  }
}
