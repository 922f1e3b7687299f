//! Error types for `showwatch-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("subscription not found: {0}")]
  SubscriptionNotFound(Uuid),

  #[error("subscription {0} is already inactive")]
  AlreadyInactive(Uuid),

  #[error("subscription {0} is already active")]
  AlreadyActive(Uuid),

  #[error("invalid listing url {url:?}: {reason}")]
  InvalidListingUrl { url: String, reason: String },

  #[error("unknown notification kind: {0:?}")]
  UnknownNotificationKind(String),

  #[error("unknown channel: {0:?}")]
  UnknownChannel(String),

  #[error("unknown deactivation reason: {0:?}")]
  UnknownDeactivationReason(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
