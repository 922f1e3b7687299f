//! Notifications: the outbox drained by the notifier.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error,
  user::{Channel, User},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  NewMovie,
  NewShowtime,
  MovieRemoved,
}

impl NotificationKind {
  pub fn as_str(self) -> &'static str {
    match self {
      NotificationKind::NewMovie => "new_movie",
      NotificationKind::NewShowtime => "new_showtime",
      NotificationKind::MovieRemoved => "movie_removed",
    }
  }
}

impl fmt::Display for NotificationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for NotificationKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "new_movie" => Ok(NotificationKind::NewMovie),
      "new_showtime" => Ok(NotificationKind::NewShowtime),
      "movie_removed" => Ok(NotificationKind::MovieRemoved),
      other => Err(Error::UnknownNotificationKind(other.to_owned())),
    }
  }
}

/// A notification produced by the matcher, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
  pub user_id:         Uuid,
  pub subscription_id: Uuid,
  pub kind:            NotificationKind,
  pub message:         String,
}

/// A persisted notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  pub user_id:         Uuid,
  pub subscription_id: Option<Uuid>,
  pub kind:            NotificationKind,
  pub message:         String,
  pub sent:            bool,
  pub channel:         Option<Channel>,
  pub created_at:      DateTime<Utc>,
  pub sent_at:         Option<DateTime<Utc>>,
}

/// An unsent notification joined with its recipient.
#[derive(Debug, Clone)]
pub struct PendingNotification {
  pub notification: Notification,
  pub user:         User,
}
