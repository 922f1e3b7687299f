//! Subscription evaluation against a [`DiffResult`].
//!
//! A subscription yields one notification per matching added movie (when
//! `notify_new_shows`) and one per matching movie with newly added
//! showtimes (when `notify_new_times`). Any notification deactivates the
//! subscription: a subscriber hears about a given triple at most once.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{
  diff::DiffResult,
  listing::MovieSnapshot,
  message,
  notification::{NewNotification, NotificationKind},
  similarity::{PartialRatio, Similarity},
  subscription::{DeactivationReason, Subscription},
  theater::Theater,
};

/// Minimum similarity score (inclusive) for a title to match a query.
pub const DEFAULT_THRESHOLD: u8 = 70;

/// A movie that matched a query, with its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieMatch<'a> {
  pub movie: &'a MovieSnapshot,
  pub score: u8,
}

#[derive(Clone)]
pub struct Matcher {
  similarity: Arc<dyn Similarity>,
  threshold:  u8,
}

impl fmt::Debug for Matcher {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Matcher").field("threshold", &self.threshold).finish_non_exhaustive()
  }
}

impl Default for Matcher {
  fn default() -> Self { Self::new(Arc::new(PartialRatio), DEFAULT_THRESHOLD) }
}

impl Matcher {
  pub fn new(similarity: Arc<dyn Similarity>, threshold: u8) -> Self {
    Self { similarity, threshold }
  }

  /// The better of the query's score against the title and the full title.
  pub fn score(&self, query: &str, movie: &MovieSnapshot) -> u8 {
    self
      .similarity
      .score(query, &movie.title)
      .max(self.similarity.score(query, &movie.full_title))
  }

  /// Every movie scoring at or above the threshold, best first. Ties keep
  /// their input order.
  pub fn find_matches<'a>(
    &self,
    query: &str,
    movies: impl IntoIterator<Item = &'a MovieSnapshot>,
  ) -> Vec<MovieMatch<'a>> {
    let mut matches: Vec<MovieMatch<'a>> = movies
      .into_iter()
      .map(|movie| MovieMatch { movie, score: self.score(query, movie) })
      .filter(|m| m.score >= self.threshold)
      .collect();
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
  }

  /// The notifications `subscription` would receive for `diff`. Pure: does
  /// not look at or change the subscription's active state.
  pub fn notifications_for(
    &self,
    subscription: &Subscription,
    theater: &Theater,
    diff: &DiffResult,
  ) -> Vec<NewNotification> {
    let date = subscription.target_date;
    let notify = |kind, message| NewNotification {
      user_id: subscription.user_id,
      subscription_id: subscription.subscription_id,
      kind,
      message,
    };

    let mut out = Vec::new();

    if subscription.notify_new_shows {
      for m in self.find_matches(&subscription.movie_query, &diff.added) {
        out.push(notify(
          NotificationKind::NewMovie,
          message::new_movie(m.movie, theater, date),
        ));
      }
    }

    if subscription.notify_new_times {
      for update in diff.updated.iter().filter(|u| !u.added_times.is_empty()) {
        if self.score(&subscription.movie_query, &update.movie) >= self.threshold {
          out.push(notify(
            NotificationKind::NewShowtime,
            message::new_showtimes(&update.movie, &update.added_times, theater, date),
          ));
        }
      }
    }

    out
  }

  /// Evaluate an active subscription. If it earns any notification it is
  /// deactivated with [`DeactivationReason::NotificationSent`] at `now`.
  /// Inactive subscriptions earn nothing.
  pub fn evaluate(
    &self,
    subscription: &mut Subscription,
    theater: &Theater,
    diff: &DiffResult,
    now: DateTime<Utc>,
  ) -> Vec<NewNotification> {
    let notifications = self.notifications_for(subscription, theater, diff);
    if notifications.is_empty()
      || subscription
        .deactivate(DeactivationReason::NotificationSent, now)
        .is_err()
    {
      return Vec::new();
    }
    notifications
  }
}
