//! Runtime configuration, deserialised from `config.toml` layered with
//! `SHOWWATCH_*` environment variables. Every key has a default.

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

pub const BREVO_API_URL: &str = "https://api.brevo.com/v3/smtp/email";
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
  AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
  pub host:                    String,
  pub port:                    u16,
  pub store_path:              PathBuf,
  pub site_base_url:           String,
  pub webdriver_url:           String,
  pub user_agent:              String,
  pub scrape_interval_minutes: u64,
  pub notify_interval_secs:    u64,
  pub group_spacing_secs:      u64,
  pub match_threshold:         u8,
  pub shutdown_grace_secs:     u64,
  pub session:                 SessionConfig,
  pub notify:                  NotifyConfig,
  pub email:                   Option<EmailConfig>,
  pub telegram:                Option<TelegramConfig>,
}

impl Default for TrackerConfig {
  fn default() -> Self {
    Self {
      host:                    "127.0.0.1".into(),
      port:                    8000,
      store_path:              PathBuf::from("showwatch.db"),
      site_base_url:           "https://in.bookmyshow.com".into(),
      webdriver_url:           "http://localhost:9515".into(),
      user_agent:              DEFAULT_USER_AGENT.into(),
      scrape_interval_minutes: 2,
      notify_interval_secs:    60,
      group_spacing_secs:      2,
      match_threshold:         showwatch_core::matcher::DEFAULT_THRESHOLD,
      shutdown_grace_secs:     10,
      session:                 SessionConfig::default(),
      notify:                  NotifyConfig::default(),
      email:                   None,
      telegram:                None,
    }
  }
}

impl TrackerConfig {
  pub fn scrape_interval(&self) -> Duration { Duration::from_secs(self.scrape_interval_minutes * 60) }

  pub fn notify_interval(&self) -> Duration { Duration::from_secs(self.notify_interval_secs) }

  pub fn group_spacing(&self) -> Duration { Duration::from_secs(self.group_spacing_secs) }

  pub fn shutdown_grace(&self) -> Duration { Duration::from_secs(self.shutdown_grace_secs) }
}

/// Browser session tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
  /// Recycle the browser once it is this old.
  pub max_age_secs:           u64,
  /// Attempts per acquisition, including the first.
  pub max_attempts:           u32,
  pub retry_backoff_secs:     u64,
  pub page_load_timeout_secs: u64,
  /// Pause after the listing container appears.
  pub settle_delay_ms:        u64,
  /// Extra pause when the settled page has no listing cells.
  pub empty_grace_ms:         u64,
  pub poll_interval_ms:       u64,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      max_age_secs:           30 * 60,
      max_attempts:           2,
      retry_backoff_secs:     2,
      page_load_timeout_secs: 30,
      settle_delay_ms:        3000,
      empty_grace_ms:         5000,
      poll_interval_ms:       250,
    }
  }
}

impl SessionConfig {
  pub fn max_age(&self) -> Duration { Duration::from_secs(self.max_age_secs) }

  pub fn retry_backoff(&self) -> Duration { Duration::from_secs(self.retry_backoff_secs) }

  pub fn page_load_timeout(&self) -> Duration { Duration::from_secs(self.page_load_timeout_secs) }

  pub fn settle_delay(&self) -> Duration { Duration::from_millis(self.settle_delay_ms) }

  pub fn empty_grace(&self) -> Duration { Duration::from_millis(self.empty_grace_ms) }

  pub fn poll_interval(&self) -> Duration { Duration::from_millis(self.poll_interval_ms) }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
  pub batch_size:       usize,
  pub message_delay_ms: u64,
}

impl Default for NotifyConfig {
  fn default() -> Self { Self { batch_size: 50, message_delay_ms: 500 } }
}

impl NotifyConfig {
  pub fn message_delay(&self) -> Duration { Duration::from_millis(self.message_delay_ms) }
}

/// Brevo transactional email.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
  pub api_key:      String,
  #[serde(default = "default_brevo_url")]
  pub api_url:      String,
  pub from_address: String,
  #[serde(default = "default_from_name")]
  pub from_name:    String,
}

fn default_brevo_url() -> String { BREVO_API_URL.into() }

fn default_from_name() -> String { "Showwatch".into() }

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
  pub bot_token: String,
  #[serde(default = "default_telegram_base")]
  pub api_base:  String,
}

fn default_telegram_base() -> String { TELEGRAM_API_BASE.into() }
