//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that lexical order is chronological. Calendar
//! dates are `YYYY-MM-DD`. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Row;
use showwatch_core::{
  listing::{MovieSnapshot, ShowtimeEntry},
  notification::Notification,
  subscription::Subscription,
  theater::Theater,
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const THEATER_COLUMNS: &str =
  "theater_id, name, city, external_code, external_path, address, created_at";

/// Raw strings read directly from a `theaters` row.
pub struct RawTheater {
  pub theater_id:    String,
  pub name:          String,
  pub city:          String,
  pub external_code: String,
  pub external_path: String,
  pub address:       Option<String>,
  pub created_at:    String,
}

impl RawTheater {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      theater_id:    row.get(0)?,
      name:          row.get(1)?,
      city:          row.get(2)?,
      external_code: row.get(3)?,
      external_path: row.get(4)?,
      address:       row.get(5)?,
      created_at:    row.get(6)?,
    })
  }

  pub fn into_theater(self) -> Result<Theater> {
    Ok(Theater {
      theater_id:    decode_uuid(&self.theater_id)?,
      name:          self.name,
      city:          self.city,
      external_code: self.external_code,
      external_path: self.external_path,
      address:       self.address,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub const USER_COLUMNS: &str = "user_id, email, telegram_chat_id, channel, created_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:          String,
  pub email:            Option<String>,
  pub telegram_chat_id: Option<String>,
  pub channel:          String,
  pub created_at:       String,
}

impl RawUser {
  /// Read the user columns starting at `offset`, so joined rows can reuse it.
  pub fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:          row.get(offset)?,
      email:            row.get(offset + 1)?,
      telegram_chat_id: row.get(offset + 2)?,
      channel:          row.get(offset + 3)?,
      created_at:       row.get(offset + 4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:          decode_uuid(&self.user_id)?,
      email:            self.email,
      telegram_chat_id: self.telegram_chat_id,
      channel:          self.channel.parse()?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

pub const SUBSCRIPTION_COLUMNS: &str = "subscription_id, user_id, theater_id, movie_query, \
  target_date, active, notify_new_shows, notify_new_times, deactivated_reason, \
  deactivated_at, created_at";

/// Raw values read directly from a `subscriptions` row.
pub struct RawSubscription {
  pub subscription_id:    String,
  pub user_id:            String,
  pub theater_id:         String,
  pub movie_query:        String,
  pub target_date:        String,
  pub active:             bool,
  pub notify_new_shows:   bool,
  pub notify_new_times:   bool,
  pub deactivated_reason: Option<String>,
  pub deactivated_at:     Option<String>,
  pub created_at:         String,
}

impl RawSubscription {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subscription_id:    row.get(0)?,
      user_id:            row.get(1)?,
      theater_id:         row.get(2)?,
      movie_query:        row.get(3)?,
      target_date:        row.get(4)?,
      active:             row.get(5)?,
      notify_new_shows:   row.get(6)?,
      notify_new_times:   row.get(7)?,
      deactivated_reason: row.get(8)?,
      deactivated_at:     row.get(9)?,
      created_at:         row.get(10)?,
    })
  }

  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      subscription_id:    decode_uuid(&self.subscription_id)?,
      user_id:            decode_uuid(&self.user_id)?,
      theater_id:         decode_uuid(&self.theater_id)?,
      movie_query:        self.movie_query,
      target_date:        decode_date(&self.target_date)?,
      active:             self.active,
      notify_new_shows:   self.notify_new_shows,
      notify_new_times:   self.notify_new_times,
      deactivated_reason: self.deactivated_reason.as_deref().map(str::parse).transpose()?,
      deactivated_at:     self.deactivated_at.as_deref().map(decode_dt).transpose()?,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

pub const NOTIFICATION_COLUMNS: &str = "n.notification_id, n.user_id, n.subscription_id, \
  n.kind, n.message, n.sent, n.channel, n.created_at, n.sent_at";

/// Raw values read directly from a `notifications` row (aliased `n`).
pub struct RawNotification {
  pub notification_id: String,
  pub user_id:         String,
  pub subscription_id: Option<String>,
  pub kind:            String,
  pub message:         String,
  pub sent:            bool,
  pub channel:         Option<String>,
  pub created_at:      String,
  pub sent_at:         Option<String>,
}

impl RawNotification {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id: row.get(0)?,
      user_id:         row.get(1)?,
      subscription_id: row.get(2)?,
      kind:            row.get(3)?,
      message:         row.get(4)?,
      sent:            row.get(5)?,
      channel:         row.get(6)?,
      created_at:      row.get(7)?,
      sent_at:         row.get(8)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      user_id:         decode_uuid(&self.user_id)?,
      subscription_id: self.subscription_id.as_deref().map(decode_uuid).transpose()?,
      kind:            self.kind.parse()?,
      message:         self.message,
      sent:            self.sent,
      channel:         self.channel.as_deref().map(str::parse).transpose()?,
      created_at:      decode_dt(&self.created_at)?,
      sent_at:         self.sent_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// A `movies` row with its `showtimes` rows already attached.
pub struct RawMovie {
  pub title:       String,
  pub full_title:  String,
  pub language:    Option<String>,
  pub rating:      Option<String>,
  pub format:      Option<String>,
  pub external_id: Option<String>,
  pub url_path:    Option<String>,
  pub showtimes:   Vec<(String, Option<String>)>,
}

impl RawMovie {
  pub fn into_snapshot(self) -> MovieSnapshot {
    MovieSnapshot {
      title:       self.title,
      full_title:  self.full_title,
      language:    self.language,
      rating:      self.rating,
      format:      self.format,
      external_id: self.external_id,
      url_path:    self.url_path,
      showtimes:   self
        .showtimes
        .into_iter()
        .map(|(start, screen)| ShowtimeEntry { start, screen })
        .collect(),
    }
  }
}
