//! The `TrackerStore` trait and the write bundles it accepts.
//!
//! The trait is implemented by storage backends (e.g.
//! `showwatch-store-sqlite`). The orchestrator and the HTTP layer depend on
//! this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  listing::{ListedMovie, MovieSnapshot},
  notification::{NewNotification, Notification, PendingNotification},
  subscription::{NewSubscription, Subscription},
  theater::{NewTheater, Theater},
  user::{Channel, Contact, User},
};

// ─── Write bundles ───────────────────────────────────────────────────────────

/// Notifications earned by one subscription in one cycle. Committing it
/// deactivates the subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deactivation {
  pub subscription_id: Uuid,
  pub at:              DateTime<Utc>,
  pub notifications:   Vec<NewNotification>,
}

/// Everything one (theater, date) group writes after a successful
/// acquisition. Applied atomically by [`TrackerStore::commit_cycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleCommit {
  pub theater_id:    Uuid,
  pub date:          NaiveDate,
  /// The new snapshot, replacing the current one wholesale.
  pub movies:        Vec<MovieSnapshot>,
  pub deactivations: Vec<Deactivation>,
}

/// What [`TrackerStore::commit_cycle`] actually wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
  pub movies:        usize,
  pub notifications: usize,
  pub deactivated:   usize,
  /// Deactivations dropped because the subscription was no longer active
  /// when the commit ran (e.g. cancelled mid-cycle).
  pub stale:         Vec<Uuid>,
}

// ─── Read filters ────────────────────────────────────────────────────────────

/// Filters for [`TrackerStore::search_theaters`]. Each is a case-insensitive
/// substring match; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TheaterQuery {
  pub city: Option<String>,
  pub name: Option<String>,
}

/// Filters for [`TrackerStore::search_movies`]. `title` and `language` are
/// case-insensitive substring matches, `city` is a case-insensitive exact
/// match, and `show_date` is exact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MovieQuery {
  pub title:     Option<String>,
  pub city:      Option<String>,
  pub language:  Option<String>,
  pub show_date: Option<NaiveDate>,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Backend errors that can carry a domain [`crate::Error`], so callers can
/// tell a rejected operation (unknown id, already active) from a storage
/// failure.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn domain(&self) -> Option<&crate::Error>;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Showwatch store backend.
///
/// Subscriptions and notifications are never deleted. Snapshots are replaced
/// wholesale per (theater, date).
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait TrackerStore: Send + Sync {
  type Error: StoreError;

  // ── Theaters ──────────────────────────────────────────────────────────

  /// Return the theater with `input.external_code`, creating it if absent.
  fn ensure_theater(
    &self,
    input: NewTheater,
  ) -> impl Future<Output = Result<Theater, Self::Error>> + Send + '_;

  fn get_theater(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Theater>, Self::Error>> + Send + '_;

  /// Theaters matching every given filter, ordered by city then name.
  fn search_theaters(
    &self,
    query: TheaterQuery,
  ) -> impl Future<Output = Result<Vec<Theater>, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Return the user identified by `contact`, creating it if absent. A new
  /// user's channel is the contact's channel.
  fn ensure_user(
    &self,
    contact: Contact,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Subscriptions ─────────────────────────────────────────────────────

  /// Create a subscription, or reactivate the inactive one for the same
  /// (user, theater, query, date). Fails if that subscription is active.
  fn subscribe(
    &self,
    input: NewSubscription,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  /// Deactivate on user request. Fails if unknown or already inactive.
  fn cancel_subscription(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  fn get_subscription(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  fn list_user_subscriptions(
    &self,
    user_id: Uuid,
    include_inactive: bool,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + '_;

  /// Active subscriptions whose target date is `on_or_after` or later.
  fn active_subscriptions(
    &self,
    on_or_after: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + '_;

  // ── Snapshots ─────────────────────────────────────────────────────────

  /// The current snapshot for (theater, date), in page order. Empty if the
  /// pair has never been acquired.
  fn current_snapshot(
    &self,
    theater_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<MovieSnapshot>, Self::Error>> + Send + '_;

  /// Movies in current snapshots matching every given filter, ordered by
  /// date, theater, then page position.
  fn search_movies(
    &self,
    query: MovieQuery,
  ) -> impl Future<Output = Result<Vec<ListedMovie>, Self::Error>> + Send + '_;

  /// Replace the snapshot, insert notifications, and deactivate the
  /// subscriptions that earned them, all in one transaction. A deactivation
  /// whose subscription is no longer active is dropped with its
  /// notifications.
  fn commit_cycle(
    &self,
    commit: CycleCommit,
  ) -> impl Future<Output = Result<CommitSummary, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  /// Up to `limit` unsent notifications with their users, restricted to
  /// users whose channel is in `channels` and who have an address on it.
  /// Fewest failed attempts first, then oldest first, so a row that keeps
  /// failing cannot hold back the rest of the queue.
  fn pending_notifications(
    &self,
    channels: Vec<Channel>,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<PendingNotification>, Self::Error>> + Send + '_;

  /// Count one failed delivery. The row stays unsent.
  fn record_failed_attempt(
    &self,
    notification_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn mark_sent(
    &self,
    notification_id: Uuid,
    channel: Channel,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_notifications(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;
}
