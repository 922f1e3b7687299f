//! Subscriptions: one user's intent to hear about one movie at one theater
//! on one date.
//!
//! A subscription is never deleted. It moves between two states:
//!
//! ```text
//! active ──(qualifying notification)──▶ inactive
//! active ──(user cancels)─────────────▶ inactive
//! inactive ──(re-subscribe)───────────▶ active
//! ```

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Why a subscription stopped being active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeactivationReason {
  /// Auto-unsubscribe after a notification was queued.
  NotificationSent,
  UserUnsubscribed,
}

impl DeactivationReason {
  pub fn as_str(self) -> &'static str {
    match self {
      DeactivationReason::NotificationSent => "notification_sent",
      DeactivationReason::UserUnsubscribed => "user_unsubscribed",
    }
  }
}

impl fmt::Display for DeactivationReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for DeactivationReason {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "notification_sent" => Ok(DeactivationReason::NotificationSent),
      "user_unsubscribed" => Ok(DeactivationReason::UserUnsubscribed),
      other => Err(Error::UnknownDeactivationReason(other.to_owned())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
  pub subscription_id:    Uuid,
  pub user_id:            Uuid,
  pub theater_id:         Uuid,
  /// Free-text movie name, matched fuzzily against listing titles.
  pub movie_query:        String,
  pub target_date:        NaiveDate,
  pub active:             bool,
  pub notify_new_shows:   bool,
  pub notify_new_times:   bool,
  pub deactivated_reason: Option<DeactivationReason>,
  pub deactivated_at:     Option<DateTime<Utc>>,
  pub created_at:         DateTime<Utc>,
}

impl Subscription {
  /// `active → inactive`. Fails if already inactive.
  pub fn deactivate(&mut self, reason: DeactivationReason, at: DateTime<Utc>) -> Result<()> {
    if !self.active {
      return Err(Error::AlreadyInactive(self.subscription_id));
    }
    self.active = false;
    self.deactivated_reason = Some(reason);
    self.deactivated_at = Some(at);
    Ok(())
  }

  /// `inactive → active`, replacing the notification flags and clearing the
  /// deactivation metadata. Fails if already active.
  pub fn reactivate(&mut self, notify_new_shows: bool, notify_new_times: bool) -> Result<()> {
    if self.active {
      return Err(Error::AlreadyActive(self.subscription_id));
    }
    self.active = true;
    self.notify_new_shows = notify_new_shows;
    self.notify_new_times = notify_new_times;
    self.deactivated_reason = None;
    self.deactivated_at = None;
    Ok(())
  }

  /// The (theater, date) group this subscription is scraped under.
  pub fn group_key(&self) -> (Uuid, NaiveDate) {
    (self.theater_id, self.target_date)
  }
}

/// Input for [`crate::store::TrackerStore::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubscription {
  pub user_id:          Uuid,
  pub theater_id:       Uuid,
  pub movie_query:      String,
  pub target_date:      NaiveDate,
  pub notify_new_shows: bool,
  pub notify_new_times: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn active() -> Subscription {
    Subscription {
      subscription_id:    Uuid::new_v4(),
      user_id:            Uuid::new_v4(),
      theater_id:         Uuid::new_v4(),
      movie_query:        "movie b".into(),
      target_date:        NaiveDate::from_ymd_opt(2025, 9, 24).unwrap(),
      active:             true,
      notify_new_shows:   true,
      notify_new_times:   true,
      deactivated_reason: None,
      deactivated_at:     None,
      created_at:         Utc::now(),
    }
  }

  #[test]
  fn deactivate_records_reason_and_time() {
    let mut sub = active();
    let at = Utc::now();
    sub.deactivate(DeactivationReason::NotificationSent, at).unwrap();
    assert!(!sub.active);
    assert_eq!(sub.deactivated_reason, Some(DeactivationReason::NotificationSent));
    assert_eq!(sub.deactivated_at, Some(at));
  }

  #[test]
  fn deactivate_twice_fails() {
    let mut sub = active();
    sub.deactivate(DeactivationReason::UserUnsubscribed, Utc::now()).unwrap();
    let err = sub
      .deactivate(DeactivationReason::NotificationSent, Utc::now())
      .unwrap_err();
    assert!(matches!(err, Error::AlreadyInactive(_)));
    assert_eq!(sub.deactivated_reason, Some(DeactivationReason::UserUnsubscribed));
  }

  #[test]
  fn reactivate_clears_deactivation_fields() {
    let mut sub = active();
    sub.deactivate(DeactivationReason::NotificationSent, Utc::now()).unwrap();
    sub.reactivate(false, true).unwrap();
    assert!(sub.active);
    assert!(!sub.notify_new_shows);
    assert!(sub.notify_new_times);
    assert!(sub.deactivated_reason.is_none());
    assert!(sub.deactivated_at.is_none());
  }

  #[test]
  fn reactivate_active_fails() {
    let mut sub = active();
    assert!(matches!(sub.reactivate(true, true), Err(Error::AlreadyActive(_))));
  }

  #[test]
  fn reason_round_trips_through_str() {
    for reason in [DeactivationReason::NotificationSent, DeactivationReason::UserUnsubscribed] {
      assert_eq!(reason.as_str().parse::<DeactivationReason>().unwrap(), reason);
    }
  }
}
