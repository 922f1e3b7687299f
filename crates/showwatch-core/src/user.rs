//! Users and their delivery preferences.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// An outbound delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
  Email,
  Telegram,
}

impl Channel {
  pub fn as_str(self) -> &'static str {
    match self {
      Channel::Email => "email",
      Channel::Telegram => "telegram",
    }
  }
}

impl fmt::Display for Channel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Channel {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "email" => Ok(Channel::Email),
      "telegram" => Ok(Channel::Telegram),
      other => Err(Error::UnknownChannel(other.to_owned())),
    }
  }
}

/// A subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:          Uuid,
  pub email:            Option<String>,
  pub telegram_chat_id: Option<String>,
  /// The channel notifications are delivered through.
  pub channel:          Channel,
  pub created_at:       DateTime<Utc>,
}

impl User {
  /// The recipient address for `channel`, if the user has one.
  pub fn address_for(&self, channel: Channel) -> Option<&str> {
    match channel {
      Channel::Email => self.email.as_deref(),
      Channel::Telegram => self.telegram_chat_id.as_deref(),
    }
  }
}

/// How a user is identified when subscribing. Email wins when both are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contact {
  Email(String),
  Telegram(String),
}

impl Contact {
  pub fn channel(&self) -> Channel {
    match self {
      Contact::Email(_) => Channel::Email,
      Contact::Telegram(_) => Channel::Telegram,
    }
  }

  /// Pick a contact from optional request fields, ignoring blanks.
  pub fn from_parts(email: Option<&str>, telegram_chat_id: Option<&str>) -> Option<Self> {
    let non_blank = |s: Option<&str>| s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned);
    non_blank(email)
      .map(Contact::Email)
      .or_else(|| non_blank(telegram_chat_id).map(Contact::Telegram))
  }
}
