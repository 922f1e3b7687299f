//! [`SqliteStore`]: the SQLite implementation of [`TrackerStore`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{OptionalExtension as _, Transaction};
use uuid::Uuid;

use showwatch_core::{
  Error as CoreError,
  listing::{ListedMovie, MovieSnapshot},
  notification::{Notification, PendingNotification},
  store::{CommitSummary, CycleCommit, MovieQuery, TheaterQuery, TrackerStore},
  subscription::{DeactivationReason, NewSubscription, Subscription},
  theater::{NewTheater, Theater},
  user::{Channel, Contact, User},
};

use crate::{
  Error, Result,
  encode::{
    NOTIFICATION_COLUMNS, RawMovie, RawNotification, RawSubscription, RawTheater, RawUser,
    SUBSCRIPTION_COLUMNS, THEATER_COLUMNS, USER_COLUMNS, decode_date, decode_uuid, encode_date,
    encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

/// What a subscribe transaction found for the requested tuple.
enum SubscribeOutcome {
  Created(RawSubscription),
  Existing(RawSubscription),
}

/// What a cancel transaction found for the requested id.
enum CancelOutcome {
  Cancelled(RawSubscription),
  AlreadyInactive,
  Missing,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Showwatch store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection handle is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn select_subscription(
  tx: &Transaction<'_>,
  id: &str,
) -> rusqlite::Result<Option<RawSubscription>> {
  tx.query_row(
    &format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE subscription_id = ?1"),
    rusqlite::params![id],
    RawSubscription::from_row,
  )
  .optional()
}

fn insert_snapshot(
  tx: &Transaction<'_>,
  theater_id: &str,
  date: &str,
  movies: &[MovieSnapshot],
) -> rusqlite::Result<()> {
  tx.execute(
    "DELETE FROM movies WHERE theater_id = ?1 AND show_date = ?2",
    rusqlite::params![theater_id, date],
  )?;

  let mut movie_stmt = tx.prepare(
    "INSERT INTO movies (
       movie_id, theater_id, show_date, position, title, full_title,
       language, rating, format, external_id, url_path
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
  )?;
  let mut showtime_stmt = tx.prepare(
    "INSERT INTO showtimes (movie_id, position, start_time, screen) VALUES (?1, ?2, ?3, ?4)",
  )?;

  for (position, movie) in movies.iter().enumerate() {
    let movie_id = encode_uuid(Uuid::new_v4());
    movie_stmt.execute(rusqlite::params![
      movie_id,
      theater_id,
      date,
      position as i64,
      movie.title,
      movie.full_title,
      movie.language,
      movie.rating,
      movie.format,
      movie.external_id,
      movie.url_path,
    ])?;
    for (slot, showtime) in movie.showtimes.iter().enumerate() {
      showtime_stmt.execute(rusqlite::params![
        movie_id,
        slot as i64,
        showtime.start,
        showtime.screen,
      ])?;
    }
  }
  Ok(())
}

/// SQL that keeps only users reachable on one of `channels`: their chosen
/// channel is listed and they have an address on it.
fn deliverable_filter(channels: &[Channel]) -> String {
  let clauses: Vec<String> = channels
    .iter()
    .map(|channel| {
      let address = match channel {
        Channel::Email => "u.email",
        Channel::Telegram => "u.telegram_chat_id",
      };
      format!("(u.channel = '{}' AND {address} IS NOT NULL)", channel.as_str())
    })
    .collect();
  format!("({})", clauses.join(" OR "))
}

/// A [`RawMovie`] with the theater and date it is listed under.
struct RawListedMovie {
  theater_id:   String,
  theater_name: String,
  theater_city: String,
  show_date:    String,
  movie:        RawMovie,
}

impl RawListedMovie {
  fn into_listed(self) -> Result<ListedMovie> {
    Ok(ListedMovie {
      theater_id:   decode_uuid(&self.theater_id)?,
      theater_name: self.theater_name,
      theater_city: self.theater_city,
      show_date:    decode_date(&self.show_date)?,
      movie:        self.movie.into_snapshot(),
    })
  }
}

// ─── TrackerStore impl ───────────────────────────────────────────────────────

impl TrackerStore for SqliteStore {
  type Error = Error;

  // ── Theaters ──────────────────────────────────────────────────────────────

  async fn ensure_theater(&self, input: NewTheater) -> Result<Theater> {
    let id_str = encode_uuid(Uuid::new_v4());
    let at_str = encode_dt(Utc::now());

    let raw: RawTheater = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO theaters (
             theater_id, name, city, external_code, external_path, address, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (external_code) DO NOTHING",
          rusqlite::params![
            id_str,
            input.name,
            input.city,
            input.external_code,
            input.external_path,
            input.address,
            at_str,
          ],
        )?;
        let raw = tx.query_row(
          &format!("SELECT {THEATER_COLUMNS} FROM theaters WHERE external_code = ?1"),
          rusqlite::params![input.external_code],
          RawTheater::from_row,
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_theater()
  }

  async fn get_theater(&self, id: Uuid) -> Result<Option<Theater>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawTheater> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {THEATER_COLUMNS} FROM theaters WHERE theater_id = ?1"),
              rusqlite::params![id_str],
              RawTheater::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTheater::into_theater).transpose()
  }

  async fn search_theaters(&self, query: TheaterQuery) -> Result<Vec<Theater>> {
    let raws: Vec<RawTheater> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {THEATER_COLUMNS} FROM theaters
           WHERE (?1 IS NULL OR instr(lower(city), lower(?1)) > 0)
             AND (?2 IS NULL OR instr(lower(name), lower(?2)) > 0)
           ORDER BY city, name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![query.city, query.name], RawTheater::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTheater::into_theater).collect()
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn ensure_user(&self, contact: Contact) -> Result<User> {
    let id_str = encode_uuid(Uuid::new_v4());
    let at_str = encode_dt(Utc::now());
    let channel = contact.channel().as_str();
    let (column, address) = match contact {
      Contact::Email(address) => ("email", address),
      Contact::Telegram(chat_id) => ("telegram_chat_id", chat_id),
    };

    let raw: RawUser = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          &format!(
            "INSERT INTO users (user_id, {column}, channel, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT ({column}) DO NOTHING"
          ),
          rusqlite::params![id_str, address, channel, at_str],
        )?;
        let raw = tx.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
          rusqlite::params![address],
          |row| RawUser::from_row_at(row, 0),
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_user()
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id_str],
              |row| RawUser::from_row_at(row, 0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Subscriptions ─────────────────────────────────────────────────────────

  async fn subscribe(&self, input: NewSubscription) -> Result<Subscription> {
    let id_str      = encode_uuid(Uuid::new_v4());
    let user_str    = encode_uuid(input.user_id);
    let theater_str = encode_uuid(input.theater_id);
    let date_str    = encode_date(input.target_date);
    let at_str      = encode_dt(Utc::now());
    let shows       = input.notify_new_shows;
    let times       = input.notify_new_times;
    let query       = input.movie_query;

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing: Option<RawSubscription> = tx
          .query_row(
            &format!(
              "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
               WHERE user_id = ?1 AND theater_id = ?2
                 AND movie_query = ?3 AND target_date = ?4"
            ),
            rusqlite::params![user_str, theater_str, query, date_str],
            RawSubscription::from_row,
          )
          .optional()?;

        let outcome = match existing {
          Some(raw) => SubscribeOutcome::Existing(raw),
          None => {
            tx.execute(
              "INSERT INTO subscriptions (
                 subscription_id, user_id, theater_id, movie_query, target_date,
                 active, notify_new_shows, notify_new_times, created_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?8)",
              rusqlite::params![id_str, user_str, theater_str, query, date_str, shows, times, at_str],
            )?;
            let raw = select_subscription(&tx, &id_str)?
              .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            SubscribeOutcome::Created(raw)
          }
        };
        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    let raw = match outcome {
      SubscribeOutcome::Created(raw) => return raw.into_subscription(),
      SubscribeOutcome::Existing(raw) => raw,
    };

    let mut sub = raw.into_subscription()?;
    sub.reactivate(shows, times)?;

    // Only an inactive row may flip back; a concurrent reactivation wins.
    let id_str = encode_uuid(sub.subscription_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subscriptions
           SET active = 1, notify_new_shows = ?2, notify_new_times = ?3,
               deactivated_reason = NULL, deactivated_at = NULL
           WHERE subscription_id = ?1 AND active = 0",
          rusqlite::params![id_str, shows, times],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(CoreError::AlreadyActive(sub.subscription_id).into());
    }

    tracing::debug!(subscription_id = %sub.subscription_id, "reactivated subscription");
    Ok(sub)
  }

  async fn cancel_subscription(&self, id: Uuid) -> Result<Subscription> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());
    let reason = DeactivationReason::UserUnsubscribed.as_str();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE subscriptions
           SET active = 0, deactivated_reason = ?2, deactivated_at = ?3
           WHERE subscription_id = ?1 AND active = 1",
          rusqlite::params![id_str, reason, at_str],
        )?;
        let outcome = match select_subscription(&tx, &id_str)? {
          None => CancelOutcome::Missing,
          Some(_) if changed == 0 => CancelOutcome::AlreadyInactive,
          Some(raw) => CancelOutcome::Cancelled(raw),
        };
        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    match outcome {
      CancelOutcome::Cancelled(raw) => raw.into_subscription(),
      CancelOutcome::AlreadyInactive => Err(CoreError::AlreadyInactive(id).into()),
      CancelOutcome::Missing => Err(CoreError::SubscriptionNotFound(id).into()),
    }
  }

  async fn get_subscription(&self, id: Uuid) -> Result<Option<Subscription>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubscription> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE subscription_id = ?1"
              ),
              rusqlite::params![id_str],
              RawSubscription::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubscription::into_subscription).transpose()
  }

  async fn list_user_subscriptions(
    &self,
    user_id:          Uuid,
    include_inactive: bool,
  ) -> Result<Vec<Subscription>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawSubscription> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
           WHERE user_id = ?1 AND (?2 OR active = 1)
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str, include_inactive], RawSubscription::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscription::into_subscription).collect()
  }

  async fn active_subscriptions(&self, on_or_after: NaiveDate) -> Result<Vec<Subscription>> {
    let date_str = encode_date(on_or_after);

    let raws: Vec<RawSubscription> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
           WHERE active = 1 AND target_date >= ?1
           ORDER BY theater_id, target_date, created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![date_str], RawSubscription::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscription::into_subscription).collect()
  }

  // ── Snapshots ─────────────────────────────────────────────────────────────

  async fn current_snapshot(&self, theater_id: Uuid, date: NaiveDate) -> Result<Vec<MovieSnapshot>> {
    let theater_str = encode_uuid(theater_id);
    let date_str    = encode_date(date);

    let raws: Vec<RawMovie> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT m.movie_id, m.title, m.full_title, m.language, m.rating, m.format,
                  m.external_id, m.url_path, s.start_time, s.screen
           FROM movies m
           LEFT JOIN showtimes s ON s.movie_id = m.movie_id
           WHERE m.theater_id = ?1 AND m.show_date = ?2
           ORDER BY m.position, s.position",
        )?;
        let mut rows = stmt.query(rusqlite::params![theater_str, date_str])?;

        let mut movies: Vec<RawMovie> = Vec::new();
        let mut last_id: Option<String> = None;
        while let Some(row) = rows.next()? {
          let movie_id: String = row.get(0)?;
          if last_id.as_deref() != Some(movie_id.as_str()) {
            movies.push(RawMovie {
              title:       row.get(1)?,
              full_title:  row.get(2)?,
              language:    row.get(3)?,
              rating:      row.get(4)?,
              format:      row.get(5)?,
              external_id: row.get(6)?,
              url_path:    row.get(7)?,
              showtimes:   Vec::new(),
            });
            last_id = Some(movie_id);
          }
          let start: Option<String> = row.get(8)?;
          if let (Some(start), Some(movie)) = (start, movies.last_mut()) {
            movie.showtimes.push((start, row.get(9)?));
          }
        }
        Ok(movies)
      })
      .await?;

    Ok(raws.into_iter().map(RawMovie::into_snapshot).collect())
  }

  async fn search_movies(&self, query: MovieQuery) -> Result<Vec<ListedMovie>> {
    let date_str = query.show_date.map(encode_date);

    let raws: Vec<RawListedMovie> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT m.movie_id, m.title, m.full_title, m.language, m.rating, m.format,
                  m.external_id, m.url_path, s.start_time, s.screen,
                  t.theater_id, t.name, t.city, m.show_date
           FROM movies m
           JOIN theaters t ON t.theater_id = m.theater_id
           LEFT JOIN showtimes s ON s.movie_id = m.movie_id
           WHERE (?1 IS NULL OR instr(lower(m.title), lower(?1)) > 0)
             AND (?2 IS NULL OR lower(t.city) = lower(?2))
             AND (?3 IS NULL OR instr(lower(coalesce(m.language, '')), lower(?3)) > 0)
             AND (?4 IS NULL OR m.show_date = ?4)
           ORDER BY m.show_date, t.name, m.theater_id, m.position, s.position",
        )?;
        let mut rows =
          stmt.query(rusqlite::params![query.title, query.city, query.language, date_str])?;

        let mut movies: Vec<RawListedMovie> = Vec::new();
        let mut last_id: Option<String> = None;
        while let Some(row) = rows.next()? {
          let movie_id: String = row.get(0)?;
          if last_id.as_deref() != Some(movie_id.as_str()) {
            movies.push(RawListedMovie {
              theater_id:   row.get(10)?,
              theater_name: row.get(11)?,
              theater_city: row.get(12)?,
              show_date:    row.get(13)?,
              movie:        RawMovie {
                title:       row.get(1)?,
                full_title:  row.get(2)?,
                language:    row.get(3)?,
                rating:      row.get(4)?,
                format:      row.get(5)?,
                external_id: row.get(6)?,
                url_path:    row.get(7)?,
                showtimes:   Vec::new(),
              },
            });
            last_id = Some(movie_id);
          }
          let start: Option<String> = row.get(8)?;
          if let (Some(start), Some(listed)) = (start, movies.last_mut()) {
            listed.movie.showtimes.push((start, row.get(9)?));
          }
        }
        Ok(movies)
      })
      .await?;

    raws.into_iter().map(RawListedMovie::into_listed).collect()
  }

  async fn commit_cycle(&self, commit: CycleCommit) -> Result<CommitSummary> {
    let theater_str = encode_uuid(commit.theater_id);
    let date_str    = encode_date(commit.date);
    let created_str = encode_dt(Utc::now());
    let reason      = DeactivationReason::NotificationSent.as_str();

    let summary = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_snapshot(&tx, &theater_str, &date_str, &commit.movies)?;

        let mut summary = CommitSummary { movies: commit.movies.len(), ..Default::default() };
        for deactivation in commit.deactivations {
          let changed = tx.execute(
            "UPDATE subscriptions
             SET active = 0, deactivated_reason = ?2, deactivated_at = ?3
             WHERE subscription_id = ?1 AND active = 1",
            rusqlite::params![
              encode_uuid(deactivation.subscription_id),
              reason,
              encode_dt(deactivation.at),
            ],
          )?;
          if changed == 0 {
            summary.stale.push(deactivation.subscription_id);
            continue;
          }
          summary.deactivated += 1;

          for n in deactivation.notifications {
            tx.execute(
              "INSERT INTO notifications (
                 notification_id, user_id, subscription_id, kind, message, sent, created_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
              rusqlite::params![
                encode_uuid(Uuid::new_v4()),
                encode_uuid(n.user_id),
                encode_uuid(n.subscription_id),
                n.kind.as_str(),
                n.message,
                created_str,
              ],
            )?;
            summary.notifications += 1;
          }
        }
        tx.commit()?;
        Ok(summary)
      })
      .await?;

    if !summary.stale.is_empty() {
      tracing::debug!(stale = ?summary.stale, "dropped notifications for inactive subscriptions");
    }
    Ok(summary)
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn pending_notifications(
    &self,
    channels: Vec<Channel>,
    limit: usize,
  ) -> Result<Vec<PendingNotification>> {
    if channels.is_empty() {
      return Ok(Vec::new());
    }
    let limit_val   = i64::try_from(limit).unwrap_or(i64::MAX);
    let deliverable = deliverable_filter(&channels);

    let raws: Vec<(RawNotification, RawUser)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NOTIFICATION_COLUMNS},
                  u.user_id, u.email, u.telegram_chat_id, u.channel, u.created_at
           FROM notifications n
           JOIN users u ON u.user_id = n.user_id
           WHERE n.sent = 0 AND {deliverable}
           ORDER BY n.attempts, n.created_at, n.rowid
           LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], |row| {
            Ok((RawNotification::from_row(row)?, RawUser::from_row_at(row, 9)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(n, u)| {
        Ok(PendingNotification {
          notification: n.into_notification()?,
          user:         u.into_user()?,
        })
      })
      .collect()
  }

  async fn mark_sent(&self, notification_id: Uuid, channel: Channel, at: DateTime<Utc>) -> Result<()> {
    let id_str  = encode_uuid(notification_id);
    let at_str  = encode_dt(at);
    let channel = channel.as_str();

    let exists: bool = self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE notifications SET sent = 1, channel = ?2, sent_at = ?3
           WHERE notification_id = ?1 AND sent = 0",
          rusqlite::params![id_str, channel, at_str],
        )?;
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM notifications WHERE notification_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    if exists { Ok(()) } else { Err(Error::NotificationNotFound(notification_id)) }
  }

  async fn record_failed_attempt(&self, notification_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(notification_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET attempts = attempts + 1 WHERE notification_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if changed == 0 { Err(Error::NotificationNotFound(notification_id)) } else { Ok(()) }
  }

    async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NOTIFICATION_COLUMNS} FROM notifications n
           WHERE n.user_id = ?1
           ORDER BY n.created_at, n.rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawNotification::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }
}
