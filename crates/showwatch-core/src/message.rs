//! Notification message templates.

use chrono::NaiveDate;

use crate::{listing::MovieSnapshot, theater::Theater};

/// Subject line used by transports that have one.
pub const SUBJECT: &str = "Movie alert from Showwatch";

/// `September 24, 2025`.
pub fn format_date(date: NaiveDate) -> String { date.format("%B %d, %Y").to_string() }

fn or_unlisted(value: Option<&str>) -> &str { value.unwrap_or("not listed") }

/// A subscribed movie has appeared in the listing.
pub fn new_movie(movie: &MovieSnapshot, theater: &Theater, date: NaiveDate) -> String {
  let times = movie.times().collect::<Vec<_>>().join(", ");
  format!(
    "Movie alert!\n\n\
     '{title}' is now available at {theater}\n\
     Date: {date}\n\
     Language: {language}\n\
     Rating: {rating}\n\
     Showtimes: {times}\n\n\
     Your subscription has been stopped now that the movie is open for booking.",
    title = movie.title,
    theater = theater.name,
    date = format_date(date),
    language = or_unlisted(movie.language.as_deref()),
    rating = or_unlisted(movie.rating.as_deref()),
  )
}

/// A subscribed movie gained showtimes. Only `added_times` are listed.
pub fn new_showtimes(
  movie: &MovieSnapshot,
  added_times: &[String],
  theater: &Theater,
  date: NaiveDate,
) -> String {
  format!(
    "New shows added!\n\n\
     '{title}' - new showtimes: {times}\n\
     Theater: {theater}\n\
     Date: {date}\n\
     Language: {language}\n\n\
     Your subscription has been stopped now that new shows are available.",
    title = movie.title,
    times = added_times.join(", "),
    theater = theater.name,
    date = format_date(date),
    language = or_unlisted(movie.language.as_deref()),
  )
}
