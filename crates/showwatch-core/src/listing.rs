//! Listing snapshots: what the site shows for one theater on one date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One bookable slot. The start time is kept as the site displays it
/// (`"09:20 AM"`); it is compared as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowtimeEntry {
  pub start:  String,
  /// Screen or format label (e.g. `"PCX SCREEN"`), when shown.
  pub screen: Option<String>,
}

impl ShowtimeEntry {
  pub fn new(start: impl Into<String>) -> Self {
    Self { start: start.into(), screen: None }
  }
}

/// The system's belief about one movie at a theater on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieSnapshot {
  /// Title with the trailing rating stripped. This is the diff key.
  pub title:       String,
  /// Title as displayed, including the rating (`"Movie A (UA13+)"`).
  pub full_title:  String,
  pub language:    Option<String>,
  pub rating:      Option<String>,
  pub format:      Option<String>,
  /// The site's movie identifier (`ET00436673`).
  pub external_id: Option<String>,
  pub url_path:    Option<String>,
  pub showtimes:   Vec<ShowtimeEntry>,
}

impl MovieSnapshot {
  /// A bare snapshot with only a title and showtimes.
  pub fn new<I, T>(title: impl Into<String>, showtimes: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: Into<String>,
  {
    let title = title.into();
    Self {
      full_title:  title.clone(),
      title,
      language:    None,
      rating:      None,
      format:      None,
      external_id: None,
      url_path:    None,
      showtimes:   showtimes.into_iter().map(ShowtimeEntry::new).collect(),
    }
  }

  /// Compose the displayed title from a clean title and optional rating.
  pub fn compose_full_title(title: &str, rating: Option<&str>) -> String {
    match rating {
      Some(r) => format!("{title} ({r})"),
      None => title.to_owned(),
    }
  }

  /// Showtime display strings, in page order.
  pub fn times(&self) -> impl Iterator<Item = &str> {
    self.showtimes.iter().map(|s| s.start.as_str())
  }
}

/// A movie from a stored snapshot, with the theater and date it is listed
/// under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedMovie {
  pub theater_id:   Uuid,
  pub theater_name: String,
  pub theater_city: String,
  pub show_date:    NaiveDate,
  #[serde(flatten)]
  pub movie:        MovieSnapshot,
}
