//! Selector-driven parsing of listing cells.

use scraper::{ElementRef, Html, Selector};
use showwatch_core::listing::{MovieSnapshot, ShowtimeEntry};

use crate::{Error, LISTING_CELL_SELECTOR, Result};

const CARD: &str = "div.sc-1412vr2-0";
const TITLE_LINK: &str = "a.sc-1412vr2-2";
const LANGUAGE_BLOCK: &str = "div.sc-1412vr2-4";
const LANGUAGE_LINK: &str = "a.sc-1412vr2-5";
const FORMAT_SPAN: &str = "span.sc-1412vr2-6";
const SHOWTIME_BLOCK: &str = "div.sc-19dkgz1-0";
const SHOWTIME_ENTRY: &str = "div.sc-1skzbbo-0";
const SHOWTIME_START: &str = "span.sc-yr56qh-1";
const SHOWTIME_SCREEN: &str = "span.sc-yr56qh-2";

fn compile(selector: &'static str) -> Result<Selector> {
  Selector::parse(selector).map_err(|e| Error::Selector { selector, reason: e.to_string() })
}

/// Compiled selectors for one extraction pass.
pub struct Selectors {
  cell:            Selector,
  card:            Selector,
  title_link:      Selector,
  language_block:  Selector,
  language_link:   Selector,
  format_span:     Selector,
  showtime_block:  Selector,
  showtime_entry:  Selector,
  showtime_start:  Selector,
  showtime_screen: Selector,
}

impl Selectors {
  pub fn new() -> Result<Self> {
    Ok(Self {
      cell:            compile(LISTING_CELL_SELECTOR)?,
      card:            compile(CARD)?,
      title_link:      compile(TITLE_LINK)?,
      language_block:  compile(LANGUAGE_BLOCK)?,
      language_link:   compile(LANGUAGE_LINK)?,
      format_span:     compile(FORMAT_SPAN)?,
      showtime_block:  compile(SHOWTIME_BLOCK)?,
      showtime_entry:  compile(SHOWTIME_ENTRY)?,
      showtime_start:  compile(SHOWTIME_START)?,
      showtime_screen: compile(SHOWTIME_SCREEN)?,
    })
  }
}

pub fn extract_with(sel: &Selectors, html: &str) -> Vec<MovieSnapshot> {
  let doc = Html::parse_document(html);
  let mut movies = Vec::new();

  for (index, cell) in doc.select(&sel.cell).enumerate() {
    match parse_cell(sel, cell) {
      Some(movie) => movies.push(movie),
      None => tracing::trace!(index, "skipping non-movie listing cell"),
    }
  }

  tracing::debug!(count = movies.len(), "extracted listing");
  movies
}

fn parse_cell(sel: &Selectors, cell: ElementRef<'_>) -> Option<MovieSnapshot> {
  let card = cell.select(&sel.card).next()?;
  let link = card.select(&sel.title_link).next()?;

  let full_title = text_of(link);
  if full_title.is_empty() {
    return None;
  }
  let (title, rating) = split_rating(&full_title);
  let url_path = link.value().attr("href").map(str::to_owned).filter(|h| !h.is_empty());
  let external_id = url_path.as_deref().and_then(movie_id);

  let language_block = card.select(&sel.language_block).next();
  let language = language_block
    .and_then(|b| b.select(&sel.language_link).next())
    .map(text_of)
    .filter(|s| !s.is_empty());
  let format = language_block
    .and_then(|b| b.select(&sel.format_span).next())
    .map(|span| text_of(span).replace(',', "").trim().to_owned())
    .filter(|s| !s.is_empty());

  Some(MovieSnapshot {
    title,
    full_title,
    language,
    rating,
    format,
    external_id,
    url_path,
    showtimes: parse_showtimes(sel, card),
  })
}

fn parse_showtimes(sel: &Selectors, card: ElementRef<'_>) -> Vec<ShowtimeEntry> {
  let Some(block) = card.select(&sel.showtime_block).next() else {
    return Vec::new();
  };

  block
    .select(&sel.showtime_entry)
    .filter_map(|entry| {
      let start = entry.select(&sel.showtime_start).next().map(text_of)?;
      if start.is_empty() {
        return None;
      }
      let screen = entry
        .select(&sel.showtime_screen)
        .next()
        .map(text_of)
        .filter(|s| !s.is_empty());
      Some(ShowtimeEntry { start, screen })
    })
    .collect()
}

fn text_of(el: ElementRef<'_>) -> String { el.text().collect::<String>().trim().to_owned() }

/// Split `"Movie A (UA13+)"` into `("Movie A", Some("UA13+"))`. Only a
/// trailing, non-empty parenthesised group counts as a rating.
pub(crate) fn split_rating(full_title: &str) -> (String, Option<String>) {
  let trimmed = full_title.trim();
  let split = trimmed.strip_suffix(')').and_then(|rest| {
    let open = rest.rfind('(')?;
    let rating = &rest[open + 1..];
    (!rating.is_empty() && !rating.contains(')')).then(|| (&rest[..open], rating))
  });

  match split {
    Some((title, rating)) => (title.trim_end().to_owned(), Some(rating.to_owned())),
    None => (trimmed.to_owned(), None),
  }
}

/// The site's movie id (`ET00436673`) from a movie link such as
/// `/movies/hyderabad/movie-a/ET00436673`.
pub(crate) fn movie_id(href: &str) -> Option<String> {
  href.match_indices("/ET").find_map(|(at, _)| {
    let digits: String = href[at + 3..].chars().take_while(char::is_ascii_digit).collect();
    (!digits.is_empty()).then(|| format!("ET{digits}"))
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::extract;

  fn card(title: &str, href: &str, times: &[(&str, Option<&str>)]) -> String {
    let entries: String = times
      .iter()
      .map(|(start, screen)| {
        let screen = screen
          .map(|s| format!(r#"<span class="sc-yr56qh-2">{s}</span>"#))
          .unwrap_or_default();
        format!(
          r#"<div class="sc-1skzbbo-0"><span class="sc-yr56qh-1">{start}</span>{screen}</div>"#
        )
      })
      .collect();
    format!(
      r#"<div role="gridcell"><div class="sc-1412vr2-0">
           <a class="sc-1412vr2-2" href="{href}">{title}</a>
           <div class="sc-1412vr2-4">
             <a class="sc-1412vr2-5">Telugu</a><span class="sc-1412vr2-6">2D, </span>
           </div>
           <div class="sc-19dkgz1-0">{entries}</div>
         </div></div>"#
    )
  }

  fn page(cells: &[String]) -> String {
    format!(
      r#"<html><body><div class="ReactVirtualized__Grid__innerScrollContainer">{}</div></body></html>"#,
      cells.concat()
    )
  }

  #[test]
  fn extracts_movies_in_page_order() {
    let html = page(&[
      card("Movie A (UA13+)", "/movies/hyderabad/movie-a/ET00436673", &[
        ("09:20 AM", Some("PCX SCREEN")),
        ("01:00 PM", None),
      ]),
      r#"<div role="gridcell"><h3>Tomorrow</h3></div>"#.to_owned(),
      card("Movie B", "/movies/hyderabad/movie-b/ET00000042", &[("06:00 PM", None)]),
    ]);

    let movies = extract(&html).unwrap();
    assert_eq!(movies.len(), 2);

    let a = &movies[0];
    assert_eq!(a.title, "Movie A");
    assert_eq!(a.full_title, "Movie A (UA13+)");
    assert_eq!(a.rating.as_deref(), Some("UA13+"));
    assert_eq!(a.language.as_deref(), Some("Telugu"));
    assert_eq!(a.format.as_deref(), Some("2D"));
    assert_eq!(a.external_id.as_deref(), Some("ET00436673"));
    assert_eq!(a.times().collect::<Vec<_>>(), ["09:20 AM", "01:00 PM"]);
    assert_eq!(a.showtimes[0].screen.as_deref(), Some("PCX SCREEN"));
    assert_eq!(a.showtimes[1].screen, None);

    assert_eq!(movies[1].title, "Movie B");
    assert_eq!(movies[1].rating, None);
  }

  #[test]
  fn page_without_cells_is_empty() {
    assert!(extract("<html><body><p>Nothing here</p></body></html>").unwrap().is_empty());
    assert!(extract("").unwrap().is_empty());
  }

  #[test]
  fn card_without_showtimes_keeps_movie() {
    let html = page(&[card("Movie C", "/movies/x/movie-c/ET1", &[])]);
    let movies = extract(&html).unwrap();
    assert_eq!(movies.len(), 1);
    assert!(movies[0].showtimes.is_empty());
  }

  #[test]
  fn blank_title_is_skipped() {
    let html = page(&[card("  ", "/movies/x/blank/ET2", &[("10:00 AM", None)])]);
    assert!(extract(&html).unwrap().is_empty());
  }

  #[test]
  fn rating_split() {
    assert_eq!(split_rating("Movie A (UA13+)"), ("Movie A".into(), Some("UA13+".into())));
    assert_eq!(split_rating("Movie A"), ("Movie A".into(), None));
    assert_eq!(split_rating("Movie ()"), ("Movie ()".into(), None));
    assert_eq!(split_rating("Part (1) Return"), ("Part (1) Return".into(), None));
  }

  #[test]
  fn movie_id_from_href() {
    assert_eq!(movie_id("/movies/hyd/movie-a/ET00436673").as_deref(), Some("ET00436673"));
    assert_eq!(movie_id("/movies/hyd/ETA/ET12?x=1").as_deref(), Some("ET12"));
    assert_eq!(movie_id("/movies/hyd/movie-a"), None);
  }
}
