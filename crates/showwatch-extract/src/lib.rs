//! Listing-page extractor for Showwatch.
//!
//! Turns the rendered HTML of a theater's listing page into an ordered list
//! of [`MovieSnapshot`]s. Pure and synchronous; the browser session that
//! produces the HTML lives in `showwatch-tracker`.
//!
//! # Quick start
//!
//! ```no_run
//! let html = std::fs::read_to_string("listing.html").unwrap();
//! for movie in showwatch_extract::extract(&html).unwrap() {
//!   println!("{} ({} shows)", movie.full_title, movie.showtimes.len());
//! }
//! ```

pub mod error;
mod parse;

pub use error::{Error, Result};
use showwatch_core::listing::MovieSnapshot;

// ─── Page markers ────────────────────────────────────────────────────────────

/// Class of the virtualised grid the site renders listings into. Its
/// presence means the page has hydrated.
pub const LISTING_CONTAINER_CLASS: &str = "ReactVirtualized__Grid__innerScrollContainer";

/// CSS selector for one listing cell. Each movie occupies one cell.
pub const LISTING_CELL_SELECTOR: &str = "[role='gridcell']";

// ─── Public API ──────────────────────────────────────────────────────────────

/// Extract every movie from a rendered listing page, in page order.
///
/// Cells that are not movie cards (headers, spacers, promos) are skipped, as
/// are cards missing a title. A page with no cells yields an empty list.
pub fn extract(html: &str) -> Result<Vec<MovieSnapshot>> {
  let selectors = parse::Selectors::new()?;
  Ok(parse::extract_with(&selectors, html))
}
