//! A store wrapper for tests that can be told to fail specific writes.

use std::sync::{
  Mutex,
  atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, NaiveDate, Utc};
use showwatch_core::{
  listing::{ListedMovie, MovieSnapshot},
  notification::{Notification, PendingNotification},
  store::{CommitSummary, CycleCommit, MovieQuery, StoreError, TheaterQuery, TrackerStore},
  subscription::{NewSubscription, Subscription},
  theater::{NewTheater, Theater},
  user::{Channel, Contact, User},
};
use showwatch_store_sqlite::SqliteStore;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FaultError {
  #[error(transparent)]
  Store(#[from] showwatch_store_sqlite::Error),

  #[error("injected failure: {0}")]
  Injected(&'static str),
}

impl StoreError for FaultError {
  fn domain(&self) -> Option<&showwatch_core::Error> {
    match self {
      FaultError::Store(e) => e.domain(),
      FaultError::Injected(_) => None,
    }
  }
}

/// Delegates to an in-memory [`SqliteStore`] except where a fault is armed.
pub struct FaultyStore {
  pub inner:      SqliteStore,
  fail_mark_sent: AtomicBool,
  fail_commit:    Mutex<Option<Uuid>>,
}

impl FaultyStore {
  pub async fn open() -> Self {
    Self {
      inner:          SqliteStore::open_in_memory().await.expect("in-memory store"),
      fail_mark_sent: AtomicBool::new(false),
      fail_commit:    Mutex::new(None),
    }
  }

  /// Every `mark_sent` fails from now on.
  pub fn fail_mark_sent(&self) { self.fail_mark_sent.store(true, Ordering::SeqCst); }

  /// `commit_cycle` fails for this theater from now on.
  pub fn fail_commit_for(&self, theater_id: Uuid) {
    *self.fail_commit.lock().expect("fault lock") = Some(theater_id);
  }
}

impl TrackerStore for FaultyStore {
  type Error = FaultError;

  async fn ensure_theater(&self, input: NewTheater) -> Result<Theater, FaultError> {
    Ok(self.inner.ensure_theater(input).await?)
  }

  async fn get_theater(&self, id: Uuid) -> Result<Option<Theater>, FaultError> {
    Ok(self.inner.get_theater(id).await?)
  }

  async fn search_theaters(&self, query: TheaterQuery) -> Result<Vec<Theater>, FaultError> {
    Ok(self.inner.search_theaters(query).await?)
  }

  async fn ensure_user(&self, contact: Contact) -> Result<User, FaultError> {
    Ok(self.inner.ensure_user(contact).await?)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>, FaultError> {
    Ok(self.inner.get_user(id).await?)
  }

  async fn subscribe(&self, input: NewSubscription) -> Result<Subscription, FaultError> {
    Ok(self.inner.subscribe(input).await?)
  }

  async fn cancel_subscription(&self, id: Uuid) -> Result<Subscription, FaultError> {
    Ok(self.inner.cancel_subscription(id).await?)
  }

  async fn get_subscription(&self, id: Uuid) -> Result<Option<Subscription>, FaultError> {
    Ok(self.inner.get_subscription(id).await?)
  }

  async fn list_user_subscriptions(
    &self,
    user_id: Uuid,
    include_inactive: bool,
  ) -> Result<Vec<Subscription>, FaultError> {
    Ok(self.inner.list_user_subscriptions(user_id, include_inactive).await?)
  }

  async fn active_subscriptions(&self, on_or_after: NaiveDate) -> Result<Vec<Subscription>, FaultError> {
    Ok(self.inner.active_subscriptions(on_or_after).await?)
  }

  async fn current_snapshot(&self, theater_id: Uuid, date: NaiveDate) -> Result<Vec<MovieSnapshot>, FaultError> {
    Ok(self.inner.current_snapshot(theater_id, date).await?)
  }

  async fn search_movies(&self, query: MovieQuery) -> Result<Vec<ListedMovie>, FaultError> {
    Ok(self.inner.search_movies(query).await?)
  }

  async fn commit_cycle(&self, commit: CycleCommit) -> Result<CommitSummary, FaultError> {
    let armed = *self.fail_commit.lock().expect("fault lock");
    if armed == Some(commit.theater_id) {
      return Err(FaultError::Injected("commit_cycle"));
    }
    Ok(self.inner.commit_cycle(commit).await?)
  }

  async fn pending_notifications(
    &self,
    channels: Vec<Channel>,
    limit: usize,
  ) -> Result<Vec<PendingNotification>, FaultError> {
    Ok(self.inner.pending_notifications(channels, limit).await?)
  }

  async fn record_failed_attempt(&self, notification_id: Uuid) -> Result<(), FaultError> {
    Ok(self.inner.record_failed_attempt(notification_id).await?)
  }

  async fn mark_sent(&self, notification_id: Uuid, channel: Channel, at: DateTime<Utc>) -> Result<(), FaultError> {
    if self.fail_mark_sent.load(Ordering::SeqCst) {
      return Err(FaultError::Injected("mark_sent"));
    }
    Ok(self.inner.mark_sent(notification_id, channel, at).await?)
  }

  async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, FaultError> {
    Ok(self.inner.list_notifications(user_id).await?)
  }
}
