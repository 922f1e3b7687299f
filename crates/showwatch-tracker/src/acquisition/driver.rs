//! The browser seam. [`PageDriver`] is one live browser session;
//! [`DriverFactory`] starts new ones.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The remote end answered with a WebDriver error object.
  #[error("webdriver error {error}: {message}")]
  Remote { error: String, message: String },

  #[error("unexpected webdriver response: {0}")]
  Protocol(String),

  #[error("browser session is gone")]
  SessionGone,
}

/// One live browser session.
#[async_trait]
pub trait PageDriver: Send + Sync {
  /// Load `url` and block until the browser reports the navigation done.
  async fn navigate(&self, url: &str) -> Result<(), DriverError>;

  /// The URL the browser is on now, after any redirects.
  async fn current_url(&self) -> Result<String, DriverError>;

  /// The rendered document.
  async fn page_source(&self) -> Result<String, DriverError>;

  /// Whether at least one element matches the CSS `selector`.
  async fn element_exists(&self, selector: &str) -> Result<bool, DriverError>;

  /// End the session. The driver must not be used afterwards.
  async fn quit(&self) -> Result<(), DriverError>;
}

#[async_trait]
pub trait DriverFactory: Send + Sync {
  async fn create(&self) -> Result<Box<dyn PageDriver>, DriverError>;
}
