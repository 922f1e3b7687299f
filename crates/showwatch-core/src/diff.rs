//! Change detection between two listing snapshots of the same theater and
//! date.
//!
//! Movies are keyed by their exact [`MovieSnapshot::title`]. Fuzzy matching
//! never happens here; it is reserved for subscription evaluation.
//!
//! If one side lists the same title twice, the later entry in page order
//! replaces the earlier one before comparison.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::listing::MovieSnapshot;

/// Showtimes gained or lost by a movie present on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowtimeUpdate {
  /// The movie as it appears in the newer snapshot.
  pub movie:         MovieSnapshot,
  pub added_times:   Vec<String>,
  pub removed_times: Vec<String>,
}

/// The delta between a previous and a current snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
  /// Present only in the current snapshot, in current page order.
  pub added:   Vec<MovieSnapshot>,
  /// Present only in the previous snapshot, in previous page order.
  pub removed: Vec<MovieSnapshot>,
  /// Present on both sides with differing showtime sets.
  pub updated: Vec<ShowtimeUpdate>,
}

impl DiffResult {
  pub fn is_empty(&self) -> bool {
    self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
  }
}

/// Compare `previous` against `current`.
pub fn diff(previous: &[MovieSnapshot], current: &[MovieSnapshot]) -> DiffResult {
  let prev = Keyed::new(previous);
  let curr = Keyed::new(current);

  let added = curr
    .order
    .iter()
    .filter(|m| !prev.contains(&m.title))
    .map(|m| (*m).clone())
    .collect();

  let removed = prev
    .order
    .iter()
    .filter(|m| !curr.contains(&m.title))
    .map(|m| (*m).clone())
    .collect();

  let updated = curr
    .order
    .iter()
    .filter_map(|new| {
      let old = prev.get(&new.title)?;
      compare_times(old, new)
    })
    .collect();

  DiffResult { added, removed, updated }
}

fn compare_times(old: &MovieSnapshot, new: &MovieSnapshot) -> Option<ShowtimeUpdate> {
  let old_times: HashSet<&str> = old.times().collect();
  let new_times: HashSet<&str> = new.times().collect();
  if old_times == new_times {
    return None;
  }

  let added_times = unique_in_order(new.times())
    .filter(|t| !old_times.contains(t))
    .map(str::to_owned)
    .collect();
  let removed_times = unique_in_order(old.times())
    .filter(|t| !new_times.contains(t))
    .map(str::to_owned)
    .collect();

  Some(ShowtimeUpdate {
    movie: new.clone(),
    added_times,
    removed_times,
  })
}

fn unique_in_order<'a>(times: impl Iterator<Item = &'a str>) -> impl Iterator<Item = &'a str> {
  let mut seen = HashSet::new();
  times.filter(move |t| seen.insert(*t))
}

/// One side of the comparison, with duplicate titles collapsed.
struct Keyed<'a> {
  by_title: HashMap<&'a str, &'a MovieSnapshot>,
  /// Surviving entries in page order (position of the winning duplicate).
  order:    Vec<&'a MovieSnapshot>,
}

impl<'a> Keyed<'a> {
  fn new(movies: &'a [MovieSnapshot]) -> Self {
    let mut last: HashMap<&'a str, usize> = HashMap::new();
    for (i, movie) in movies.iter().enumerate() {
      last.insert(movie.title.as_str(), i);
    }

    let order = movies
      .iter()
      .enumerate()
      .filter(|(i, m)| last.get(m.title.as_str()) == Some(i))
      .map(|(_, m)| m)
      .collect();
    let by_title = last.into_iter().map(|(title, i)| (title, &movies[i])).collect();

    Self { by_title, order }
  }

  fn contains(&self, title: &str) -> bool { self.by_title.contains_key(title) }

  fn get(&self, title: &str) -> Option<&'a MovieSnapshot> {
    self.by_title.get(title).copied()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn movie(title: &str, times: &[&str]) -> MovieSnapshot {
    MovieSnapshot::new(title, times.iter().copied())
  }

  fn titles(movies: &[MovieSnapshot]) -> Vec<&str> {
    movies.iter().map(|m| m.title.as_str()).collect()
  }

  #[test]
  fn new_showtime_and_new_movie() {
    let previous = vec![movie("Movie A", &["10:00"])];
    let current = vec![
      movie("Movie A", &["10:00", "14:00"]),
      movie("Movie B", &["18:00"]),
    ];

    let result = diff(&previous, &current);
    assert_eq!(titles(&result.added), ["Movie B"]);
    assert!(result.removed.is_empty());
    assert_eq!(result.updated.len(), 1);
    assert_eq!(result.updated[0].movie.title, "Movie A");
    assert_eq!(result.updated[0].added_times, ["14:00"]);
    assert!(result.updated[0].removed_times.is_empty());
  }

  #[test]
  fn identical_snapshots_produce_nothing() {
    let snapshot = vec![
      movie("Movie A", &["10:00", "13:00"]),
      movie("Movie B", &["18:00"]),
    ];
    assert!(diff(&snapshot, &snapshot).is_empty());
  }

  #[test]
  fn reordered_showtimes_are_not_a_change() {
    let previous = vec![movie("Movie A", &["10:00", "13:00"])];
    let current = vec![movie("Movie A", &["13:00", "10:00"])];
    assert!(diff(&previous, &current).is_empty());
  }

  #[test]
  fn removed_movie_and_removed_times() {
    let previous = vec![
      movie("Movie A", &["10:00", "13:00"]),
      movie("Movie C", &["21:00"]),
    ];
    let current = vec![movie("Movie A", &["13:00"])];

    let result = diff(&previous, &current);
    assert!(result.added.is_empty());
    assert_eq!(titles(&result.removed), ["Movie C"]);
    assert_eq!(result.updated[0].removed_times, ["10:00"]);
    assert!(result.updated[0].added_times.is_empty());
  }

  #[test]
  fn empty_previous_adds_everything() {
    let current = vec![movie("Movie A", &["10:00"]), movie("Movie B", &[])];
    let result = diff(&[], &current);
    assert_eq!(titles(&result.added), ["Movie A", "Movie B"]);
    assert!(result.updated.is_empty());
  }

  #[test]
  fn titles_are_case_sensitive() {
    let previous = vec![movie("movie a", &["10:00"])];
    let current = vec![movie("Movie A", &["10:00"])];
    let result = diff(&previous, &current);
    assert_eq!(titles(&result.added), ["Movie A"]);
    assert_eq!(titles(&result.removed), ["movie a"]);
  }

  #[test]
  fn duplicate_title_last_entry_wins() {
    let previous = vec![movie("Movie A", &["10:00"])];
    let current = vec![
      movie("Movie A", &["10:00", "14:00"]),
      movie("Movie A", &["10:00"]),
    ];
    // The second entry replaces the first, so nothing changed.
    assert!(diff(&previous, &current).is_empty());

    let current = vec![movie("Movie A", &["10:00"]), movie("Movie A", &["22:00"])];
    let result = diff(&previous, &current);
    assert_eq!(result.updated.len(), 1);
    assert_eq!(result.updated[0].added_times, ["22:00"]);
    assert_eq!(result.updated[0].removed_times, ["10:00"]);
  }

  #[test]
  fn duplicate_times_are_reported_once() {
    let previous = vec![movie("Movie A", &["10:00"])];
    let current = vec![movie("Movie A", &["10:00", "14:00", "14:00"])];
    let result = diff(&previous, &current);
    assert_eq!(result.updated[0].added_times, ["14:00"]);
  }

  #[test]
  fn added_and_removed_partition_symmetric_difference() {
    let cases: Vec<(Vec<&str>, Vec<&str>)> = vec![
      (vec![], vec![]),
      (vec!["A", "B"], vec!["B", "C"]),
      (vec!["A"], vec!["B", "C", "D"]),
      (vec!["A", "B", "C"], vec![]),
      (vec!["A", "A", "B"], vec!["B", "B", "C"]),
    ];

    for (prev_titles, curr_titles) in cases {
      let previous: Vec<_> = prev_titles.iter().map(|t| movie(t, &["10:00"])).collect();
      let current: Vec<_> = curr_titles.iter().map(|t| movie(t, &["10:00"])).collect();
      let result = diff(&previous, &current);

      let prev_set: HashSet<&str> = prev_titles.iter().copied().collect();
      let curr_set: HashSet<&str> = curr_titles.iter().copied().collect();
      let expected: HashSet<&str> = prev_set.symmetric_difference(&curr_set).copied().collect();

      let added: HashSet<&str> = titles(&result.added).into_iter().collect();
      let removed: HashSet<&str> = titles(&result.removed).into_iter().collect();
      assert!(added.is_disjoint(&removed));
      assert_eq!(added.union(&removed).copied().collect::<HashSet<_>>(), expected);
      assert_eq!(result.added.len() + result.removed.len(), expected.len());
    }
  }

  #[test]
  fn deterministic_across_runs() {
    let previous = vec![movie("B", &["1"]), movie("A", &["1"]), movie("C", &["1"])];
    let current = vec![movie("E", &["1"]), movie("D", &["1"]), movie("A", &["2"])];
    let first = diff(&previous, &current);
    for _ in 0..10 {
      assert_eq!(diff(&previous, &current), first);
    }
    assert_eq!(titles(&first.added), ["E", "D"]);
    assert_eq!(titles(&first.removed), ["B", "C"]);
  }
}
