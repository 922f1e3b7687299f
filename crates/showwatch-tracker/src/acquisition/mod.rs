//! The acquisition session: one long-lived browser session that loads a
//! theater's listing page for a date and hands back what it shows.
//!
//! The session is health-checked before every use, recycled once it passes
//! its maximum age, and discarded and recreated after any driver failure.
//! It never touches persisted state.

pub mod driver;
pub mod webdriver;

use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use showwatch_core::{listing::MovieSnapshot, listing_url::ListingUrl, message::format_date};
use showwatch_extract::{LISTING_CELL_SELECTOR, LISTING_CONTAINER_CLASS};
use thiserror::Error;
use tokio::time::Instant;

pub use driver::{DriverError, DriverFactory, PageDriver};

use crate::config::SessionConfig;

// ─── Results ─────────────────────────────────────────────────────────────────

/// What one successful acquisition saw.
#[derive(Debug, Clone)]
pub struct Acquisition {
  pub target:      ListingUrl,
  /// The URL the browser ended up on.
  pub final_url:   String,
  /// The date the site actually served; differs from `target.date` when the
  /// site redirected.
  pub actual_date: NaiveDate,
  pub redirected:  bool,
  pub document:    String,
  pub movies:      Vec<MovieSnapshot>,
}

#[derive(Debug, Error)]
pub enum AcquisitionError {
  /// The site redirected to another date and listed nothing: bookings for
  /// the requested date are not open yet. Never retried.
  #[error("{}", not_yet_open(.requested, .actual))]
  NotYetOpen { requested: NaiveDate, actual: NaiveDate },

  #[error("browser failed after {attempts} attempt(s): {source}")]
  Exhausted {
    attempts: u32,
    #[source]
    source:   DriverError,
  },

  #[error("extract error: {0}")]
  Extract(#[from] showwatch_extract::Error),
}

fn not_yet_open(requested: &NaiveDate, actual: &NaiveDate) -> String {
  format!(
    "Date {} is not available. The site redirected to {}. Movies may not be opened for booking yet.",
    format_date(*requested),
    format_date(*actual),
  )
}

// ─── Session ─────────────────────────────────────────────────────────────────

struct LiveDriver {
  driver:  Box<dyn PageDriver>,
  started: Instant,
}

struct LoadedPage {
  final_url: String,
  document:  String,
}

/// Owns at most one browser session at a time. Not shareable by itself;
/// callers serialise access (the orchestrator keeps it behind a mutex).
pub struct AcquisitionSession {
  factory:  Arc<dyn DriverFactory>,
  settings: SessionConfig,
  base_url: String,
  live:     Option<LiveDriver>,
}

impl AcquisitionSession {
  pub fn new(factory: Arc<dyn DriverFactory>, settings: SessionConfig, base_url: &str) -> Self {
    Self { factory, settings, base_url: base_url.to_owned(), live: None }
  }

  /// Load the listing page for `target` and extract its movies.
  ///
  /// Driver failures are retried up to `max_attempts` times with a fresh
  /// browser each time. A redirect to another date with nothing listed is
  /// reported as [`AcquisitionError::NotYetOpen`].
  pub async fn acquire(&mut self, target: &ListingUrl) -> Result<Acquisition, AcquisitionError> {
    let url = target.to_url(&self.base_url);
    let page = self.load_with_retry(&url).await?;
    let movies = showwatch_extract::extract(&page.document)?;

    let actual_date = match ListingUrl::parse(&page.final_url) {
      Ok(actual) => actual.date,
      Err(e) => {
        tracing::debug!(final_url = %page.final_url, "unparseable final url, assuming no redirect: {e}");
        target.date
      }
    };
    let redirected = actual_date != target.date;

    if redirected && movies.is_empty() {
      return Err(AcquisitionError::NotYetOpen { requested: target.date, actual: actual_date });
    }
    if redirected {
      tracing::warn!(
        requested = %target.date,
        actual = %actual_date,
        movies = movies.len(),
        "listing redirected to another date"
      );
    }

    Ok(Acquisition {
      target: target.clone(),
      final_url: page.final_url,
      actual_date,
      redirected,
      document: page.document,
      movies,
    })
  }

  /// Quit the browser, if one is running.
  pub async fn close(&mut self) {
    if let Some(live) = self.live.take()
      && let Err(e) = live.driver.quit().await
    {
      tracing::debug!("error quitting browser session: {e}");
    }
  }

  async fn load_with_retry(&mut self, url: &str) -> Result<LoadedPage, AcquisitionError> {
    let attempts = self.settings.max_attempts.max(1);
    let mut attempt = 1;
    loop {
      match self.load(url).await {
        Ok(page) => return Ok(page),
        Err(source) if attempt >= attempts => {
          self.close().await;
          return Err(AcquisitionError::Exhausted { attempts, source });
        }
        Err(e) => {
          tracing::warn!(url, attempt, "browser error, retrying with a new session: {e}");
          self.close().await;
          tokio::time::sleep(self.settings.retry_backoff()).await;
          attempt += 1;
        }
      }
    }
  }

  async fn load(&mut self, url: &str) -> Result<LoadedPage, DriverError> {
    self.ensure_driver().await?;
    let driver = match &self.live {
      Some(live) => live.driver.as_ref(),
      None => return Err(DriverError::SessionGone),
    };

    tracing::debug!(url, "loading listing page");
    driver.navigate(url).await?;
    wait_for_listing(driver, &self.settings).await?;

    Ok(LoadedPage {
      final_url: driver.current_url().await?,
      document:  driver.page_source().await?,
    })
  }

  /// Make sure a healthy, young-enough browser is running.
  async fn ensure_driver(&mut self) -> Result<(), DriverError> {
    if let Some(live) = &self.live {
      if live.started.elapsed() >= self.settings.max_age() {
        tracing::info!("recycling browser session after {:?}", live.started.elapsed());
        self.close().await;
      } else if let Err(e) = live.driver.current_url().await {
        tracing::warn!("browser session failed liveness check, recreating: {e}");
        self.close().await;
      }
    }

    if self.live.is_none() {
      let driver = self.factory.create().await?;
      self.live = Some(LiveDriver { driver, started: Instant::now() });
    }
    Ok(())
  }
}

/// Wait for the listing grid to hydrate. A timeout is logged and the page is
/// read as-is.
async fn wait_for_listing(driver: &dyn PageDriver, settings: &SessionConfig) -> Result<(), DriverError> {
  let container = format!(".{LISTING_CONTAINER_CLASS}");
  let appeared = tokio::time::timeout(settings.page_load_timeout(), async {
    loop {
      if driver.element_exists(&container).await? {
        return Ok::<_, DriverError>(());
      }
      tokio::time::sleep(settings.poll_interval().max(Duration::from_millis(1))).await;
    }
  })
  .await;

  match appeared {
    Ok(result) => result?,
    Err(_) => tracing::warn!("timed out waiting for the listing grid"),
  }

  tokio::time::sleep(settings.settle_delay()).await;
  if !driver.element_exists(LISTING_CELL_SELECTOR).await? {
    tokio::time::sleep(settings.empty_grace()).await;
  }
  Ok(())
}

#[cfg(test)]
pub(crate) mod fake;
