//! Theater: a physical venue with a stable external identifier.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::listing_url::ListingUrl;

/// A venue as known to the ticketing site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theater {
  pub theater_id:    Uuid,
  pub name:          String,
  pub city:          String,
  /// The site's short venue code (e.g. `PRHN`). Unique per theater.
  pub external_code: String,
  /// `city/slug` path segment used to build listing URLs.
  pub external_path: String,
  pub address:       Option<String>,
  pub created_at:    DateTime<Utc>,
}

impl Theater {
  /// The listing page for this theater on `date`.
  pub fn listing_url(&self, date: NaiveDate) -> ListingUrl {
    let (city, slug) = match self.external_path.split_once('/') {
      Some((city, slug)) => (city.to_owned(), slug.to_owned()),
      None => (self.city.clone(), self.external_path.clone()),
    };
    ListingUrl {
      city,
      theater_slug: slug,
      theater_code: self.external_code.clone(),
      date,
    }
  }
}

/// Input for [`crate::store::TrackerStore::ensure_theater`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTheater {
  pub name:          String,
  pub city:          String,
  pub external_code: String,
  pub external_path: String,
  pub address:       Option<String>,
}

impl NewTheater {
  /// Derive theater metadata from a listing URL the user pasted.
  pub fn from_listing_url(url: &ListingUrl) -> Self {
    Self {
      name:          url.display_name(),
      city:          url.city.clone(),
      external_code: url.theater_code.clone(),
      external_path: url.theater_path(),
      address:       None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn listing_url_round_trips_through_theater() {
    let url = ListingUrl::parse(
      "https://in.bookmyshow.com/cinemas/hyderabad/prasads-multiplex-hyderabad/buytickets/PRHN/20250924",
    )
    .unwrap();
    let new = NewTheater::from_listing_url(&url);
    assert_eq!(new.name, "Prasads Multiplex Hyderabad");
    assert_eq!(new.external_path, "hyderabad/prasads-multiplex-hyderabad");

    let theater = Theater {
      theater_id:    Uuid::new_v4(),
      name:          new.name,
      city:          new.city,
      external_code: new.external_code,
      external_path: new.external_path,
      address:       None,
      created_at:    Utc::now(),
    };
    assert_eq!(theater.listing_url(url.date), url);
  }
}
