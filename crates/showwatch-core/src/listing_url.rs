//! Listing page URLs.
//!
//! A listing URL identifies one theater on one date:
//!
//! ```text
//! https://in.bookmyshow.com/cinemas/{city}/{slug}/buytickets/{code}/{YYYYMMDD}
//! ```
//!
//! The site redirects to a different date when the requested one is not yet
//! open for booking, so the date of the *final* URL is what the acquisition
//! session compares against.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y%m%d";

/// The components of a theater listing URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingUrl {
  pub city:         String,
  pub theater_slug: String,
  pub theater_code: String,
  pub date:         NaiveDate,
}

impl ListingUrl {
  /// Parse a full listing URL.
  pub fn parse(input: &str) -> Result<Self> {
    let invalid = |reason: &str| Error::InvalidListingUrl {
      url:    input.to_owned(),
      reason: reason.to_owned(),
    };

    let url = Url::parse(input).map_err(|e| invalid(&e.to_string()))?;
    let segments: Vec<&str> = url
      .path_segments()
      .map(|s| s.filter(|seg| !seg.is_empty()).collect())
      .unwrap_or_default();

    let start = segments
      .iter()
      .position(|s| *s == "cinemas")
      .ok_or_else(|| invalid("missing `cinemas` segment"))?;

    // cinemas / city / slug / buytickets / code / date
    let [city, slug, _, code, date] = segments
      .get(start + 1..start + 6)
      .and_then(|s| <[&str; 5]>::try_from(s).ok())
      .ok_or_else(|| invalid("expected city, theater, code and date segments"))?;

    let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
      .map_err(|_| invalid(&format!("bad date segment {date:?}")))?;

    Ok(Self {
      city: city.to_owned(),
      theater_slug: slug.to_owned(),
      theater_code: code.to_owned(),
      date,
    })
  }

  /// `city/slug`, the path stored on [`crate::theater::Theater`].
  pub fn theater_path(&self) -> String {
    format!("{}/{}", self.city, self.theater_slug)
  }

  /// Human-readable theater name derived from the slug
  /// (`prasads-multiplex` → `Prasads Multiplex`).
  pub fn display_name(&self) -> String {
    self
      .theater_slug
      .split('-')
      .filter(|w| !w.is_empty())
      .map(|w| {
        let mut chars = w.chars();
        match chars.next() {
          Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
          None => String::new(),
        }
      })
      .collect::<Vec<String>>()
      .join(" ")
  }

  /// Render against `base` (e.g. `https://in.bookmyshow.com`).
  pub fn to_url(&self, base: &str) -> String {
    format!(
      "{}/cinemas/{}/buytickets/{}/{}",
      base.trim_end_matches('/'),
      self.theater_path(),
      self.theater_code,
      self.date.format(DATE_FORMAT),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const URL: &str = "https://in.bookmyshow.com/cinemas/hyderabad/prasads-multiplex-hyderabad/buytickets/PRHN/20250924";

  #[test]
  fn parses_all_components() {
    let parsed = ListingUrl::parse(URL).unwrap();
    assert_eq!(parsed.city, "hyderabad");
    assert_eq!(parsed.theater_slug, "prasads-multiplex-hyderabad");
    assert_eq!(parsed.theater_code, "PRHN");
    assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2025, 9, 24).unwrap());
  }

  #[test]
  fn renders_back_to_the_same_url() {
    let parsed = ListingUrl::parse(URL).unwrap();
    assert_eq!(parsed.to_url("https://in.bookmyshow.com/"), URL);
  }

  #[test]
  fn tolerates_trailing_slash_and_query() {
    let parsed = ListingUrl::parse(&format!("{URL}/?utm=x")).unwrap();
    assert_eq!(parsed.theater_code, "PRHN");
  }

  #[test]
  fn rejects_short_paths() {
    let err = ListingUrl::parse("https://in.bookmyshow.com/cinemas/hyderabad/x").unwrap_err();
    assert!(matches!(err, Error::InvalidListingUrl { .. }));
  }

  #[test]
  fn rejects_bad_dates() {
    let bad = URL.replace("20250924", "2025-09-24");
    assert!(ListingUrl::parse(&bad).is_err());
  }

  #[test]
  fn display_name_title_cases_slug() {
    let parsed = ListingUrl::parse(URL).unwrap();
    assert_eq!(parsed.display_name(), "Prasads Multiplex Hyderabad");
  }
}
