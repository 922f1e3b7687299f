//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, Utc};
use showwatch_core::{
  Error as CoreError,
  listing::MovieSnapshot,
  notification::{NewNotification, NotificationKind},
  store::{CycleCommit, Deactivation, MovieQuery, StoreError as _, TheaterQuery, TrackerStore},
  subscription::{DeactivationReason, NewSubscription, Subscription},
  theater::{NewTheater, Theater},
  user::{Channel, Contact, User},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date() -> NaiveDate { NaiveDate::from_ymd_opt(2025, 9, 24).unwrap() }

fn new_theater(code: &str) -> NewTheater {
  NewTheater {
    name:          "Prasads Multiplex".into(),
    city:          "hyderabad".into(),
    external_code: code.into(),
    external_path: "hyderabad/prasads-multiplex-hyderabad".into(),
    address:       None,
  }
}

async fn fixture(s: &SqliteStore) -> (User, Theater) {
  let user = s
    .ensure_user(Contact::Email("alice@example.com".into()))
    .await
    .unwrap();
  let theater = s.ensure_theater(new_theater("PRHN")).await.unwrap();
  (user, theater)
}

fn new_sub(user: &User, theater: &Theater, query: &str) -> NewSubscription {
  NewSubscription {
    user_id:          user.user_id,
    theater_id:       theater.theater_id,
    movie_query:      query.into(),
    target_date:      date(),
    notify_new_shows: true,
    notify_new_times: true,
  }
}

fn notice(sub: &Subscription, message: &str) -> NewNotification {
  NewNotification {
    user_id:         sub.user_id,
    subscription_id: sub.subscription_id,
    kind:            NotificationKind::NewMovie,
    message:         message.into(),
  }
}

fn commit(theater: &Theater, movies: Vec<MovieSnapshot>, deactivations: Vec<Deactivation>) -> CycleCommit {
  CycleCommit { theater_id: theater.theater_id, date: date(), movies, deactivations }
}

// ─── Theaters & users ────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_theater_is_get_or_create_by_code() {
  let s = store().await;
  let first = s.ensure_theater(new_theater("PRHN")).await.unwrap();
  let again = s.ensure_theater(new_theater("PRHN")).await.unwrap();
  let other = s.ensure_theater(new_theater("AMBH")).await.unwrap();

  assert_eq!(first.theater_id, again.theater_id);
  assert_ne!(first.theater_id, other.theater_id);

  let fetched = s.get_theater(first.theater_id).await.unwrap().unwrap();
  assert_eq!(fetched, first);
  assert!(s.get_theater(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn ensure_user_keys_on_contact() {
  let s = store().await;
  let by_email = s.ensure_user(Contact::Email("a@example.com".into())).await.unwrap();
  let again = s.ensure_user(Contact::Email("a@example.com".into())).await.unwrap();
  let by_chat = s.ensure_user(Contact::Telegram("12345".into())).await.unwrap();

  assert_eq!(by_email.user_id, again.user_id);
  assert_eq!(by_email.channel, Channel::Email);
  assert_eq!(by_chat.channel, Channel::Telegram);
  assert_eq!(by_chat.address_for(Channel::Telegram), Some("12345"));
  assert_eq!(s.get_user(by_chat.user_id).await.unwrap(), Some(by_chat));
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_active_subscription_is_rejected() {
  let s = store().await;
  let (user, theater) = fixture(&s).await;

  let sub = s.subscribe(new_sub(&user, &theater, "movie b")).await.unwrap();
  assert!(sub.active);

  let err = s.subscribe(new_sub(&user, &theater, "movie b")).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::AlreadyActive(id)) if *id == sub.subscription_id));
}

#[tokio::test]
async fn cancel_then_resubscribe_reactivates_same_row() {
  let s = store().await;
  let (user, theater) = fixture(&s).await;
  let sub = s.subscribe(new_sub(&user, &theater, "movie b")).await.unwrap();

  let cancelled = s.cancel_subscription(sub.subscription_id).await.unwrap();
  assert!(!cancelled.active);
  assert_eq!(cancelled.deactivated_reason, Some(DeactivationReason::UserUnsubscribed));

  let err = s.cancel_subscription(sub.subscription_id).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::AlreadyInactive(_))));

  let mut input = new_sub(&user, &theater, "movie b");
  input.notify_new_times = false;
  let back = s.subscribe(input).await.unwrap();
  assert_eq!(back.subscription_id, sub.subscription_id);
  assert!(back.active);
  assert!(!back.notify_new_times);
  assert!(back.deactivated_reason.is_none());
  assert!(back.deactivated_at.is_none());
}

#[tokio::test]
async fn cancel_unknown_subscription_is_not_found() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s.cancel_subscription(id).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::SubscriptionNotFound(x)) if *x == id));
}

#[tokio::test]
async fn active_subscriptions_skip_past_dates_and_inactive() {
  let s = store().await;
  let (user, theater) = fixture(&s).await;
  let keep = s.subscribe(new_sub(&user, &theater, "movie a")).await.unwrap();
  let dropped = s.subscribe(new_sub(&user, &theater, "movie b")).await.unwrap();
  s.cancel_subscription(dropped.subscription_id).await.unwrap();

  let mut past = new_sub(&user, &theater, "movie c");
  past.target_date = date().pred_opt().unwrap();
  s.subscribe(past).await.unwrap();

  let active = s.active_subscriptions(date()).await.unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].subscription_id, keep.subscription_id);

  let mine = s.list_user_subscriptions(user.user_id, false).await.unwrap();
  assert_eq!(mine.len(), 2);
  let all = s.list_user_subscriptions(user.user_id, true).await.unwrap();
  assert_eq!(all.len(), 3);
}

// ─── Snapshots ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn snapshot_round_trips_in_page_order() {
  let s = store().await;
  let (_, theater) = fixture(&s).await;

  let mut b = MovieSnapshot::new("Movie B", ["06:00 PM", "09:00 PM"]);
  b.rating = Some("UA13+".into());
  b.full_title = MovieSnapshot::compose_full_title("Movie B", Some("UA13+"));
  b.showtimes[1].screen = Some("PCX SCREEN".into());
  let movies = vec![b, MovieSnapshot::new("Movie A", ["10:00 AM"]), MovieSnapshot::new("Movie C", Vec::<String>::new())];

  assert!(s.current_snapshot(theater.theater_id, date()).await.unwrap().is_empty());
  s.commit_cycle(commit(&theater, movies.clone(), vec![])).await.unwrap();
  assert_eq!(s.current_snapshot(theater.theater_id, date()).await.unwrap(), movies);
}

#[tokio::test]
async fn commit_replaces_snapshot_wholesale() {
  let s = store().await;
  let (_, theater) = fixture(&s).await;

  s.commit_cycle(commit(&theater, vec![MovieSnapshot::new("Movie A", ["10:00 AM"])], vec![]))
    .await
    .unwrap();
  let next = vec![MovieSnapshot::new("Movie B", ["11:00 AM"])];
  s.commit_cycle(commit(&theater, next.clone(), vec![])).await.unwrap();

  assert_eq!(s.current_snapshot(theater.theater_id, date()).await.unwrap(), next);
  let other_day = date().succ_opt().unwrap();
  assert!(s.current_snapshot(theater.theater_id, other_day).await.unwrap().is_empty());
}

#[tokio::test]
async fn commit_deactivates_and_queues_exactly_once() {
  let s = store().await;
  let (user, theater) = fixture(&s).await;
  let sub = s.subscribe(new_sub(&user, &theater, "movie b")).await.unwrap();
  let at = Utc::now();

  let deactivation = Deactivation {
    subscription_id: sub.subscription_id,
    at,
    notifications:   vec![notice(&sub, "Movie B is out")],
  };
  let summary = s
    .commit_cycle(commit(&theater, vec![MovieSnapshot::new("Movie B", ["06:00 PM"])], vec![deactivation.clone()]))
    .await
    .unwrap();
  assert_eq!(summary.notifications, 1);
  assert_eq!(summary.deactivated, 1);

  let stored = s.get_subscription(sub.subscription_id).await.unwrap().unwrap();
  assert!(!stored.active);
  assert_eq!(stored.deactivated_reason, Some(DeactivationReason::NotificationSent));

  // A second commit for the now-inactive subscription is dropped.
  let summary = s
    .commit_cycle(commit(&theater, vec![], vec![deactivation]))
    .await
    .unwrap();
  assert_eq!(summary.notifications, 0);
  assert_eq!(summary.stale, vec![sub.subscription_id]);

  let sent = s.list_notifications(user.user_id).await.unwrap();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].subscription_id, Some(sub.subscription_id));
}

#[tokio::test]
async fn failed_commit_rolls_back_the_whole_group() {
  let s = store().await;
  let (user, theater) = fixture(&s).await;
  let first = s.subscribe(new_sub(&user, &theater, "movie a")).await.unwrap();
  let second = s.subscribe(new_sub(&user, &theater, "movie b")).await.unwrap();
  let before = vec![MovieSnapshot::new("Movie A", ["10:00 AM"])];
  s.commit_cycle(commit(&theater, before.clone(), vec![])).await.unwrap();

  // The second notification names a user that does not exist, so its insert
  // violates the foreign key after the first deactivation has been written.
  let mut orphan = notice(&second, "Movie B is out");
  orphan.user_id = Uuid::new_v4();
  let deactivations = vec![
    Deactivation { subscription_id: first.subscription_id, at: Utc::now(), notifications: vec![notice(&first, "Movie A")] },
    Deactivation { subscription_id: second.subscription_id, at: Utc::now(), notifications: vec![orphan] },
  ];
  let next = vec![MovieSnapshot::new("Movie A", ["10:00 AM"]), MovieSnapshot::new("Movie B", ["06:00 PM"])];
  assert!(s.commit_cycle(commit(&theater, next, deactivations)).await.is_err());

  assert_eq!(s.current_snapshot(theater.theater_id, date()).await.unwrap(), before);
  for sub in [&first, &second] {
    let stored = s.get_subscription(sub.subscription_id).await.unwrap().unwrap();
    assert!(stored.active);
    assert!(stored.deactivated_reason.is_none());
  }
  assert!(s.list_notifications(user.user_id).await.unwrap().is_empty());
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_theaters_filters_by_city_and_name() {
  let s = store().await;
  s.ensure_theater(new_theater("PRHN")).await.unwrap();
  s.ensure_theater(NewTheater {
    name:          "AMB Cinemas".into(),
    city:          "hyderabad".into(),
    external_code: "AMBH".into(),
    external_path: "hyderabad/amb-cinemas".into(),
    address:       None,
  })
  .await
  .unwrap();
  s.ensure_theater(NewTheater {
    name:          "PVR Forum".into(),
    city:          "bengaluru".into(),
    external_code: "PVRF".into(),
    external_path: "bengaluru/pvr-forum".into(),
    address:       None,
  })
  .await
  .unwrap();

  let names = |theaters: Vec<Theater>| theaters.into_iter().map(|t| t.name).collect::<Vec<_>>();

  let all = s.search_theaters(TheaterQuery::default()).await.unwrap();
  assert_eq!(names(all), ["PVR Forum", "AMB Cinemas", "Prasads Multiplex"]);

  let query = TheaterQuery { city: Some("Hyder".into()), name: Some("amb".into()) };
  assert_eq!(names(s.search_theaters(query).await.unwrap()), ["AMB Cinemas"]);
}

#[tokio::test]
async fn search_movies_spans_snapshots_with_their_theater() {
  let s = store().await;
  let (_, theater) = fixture(&s).await;
  let mut telugu = MovieSnapshot::new("Coolie", ["06:00 PM", "09:30 PM"]);
  telugu.language = Some("Telugu".into());
  s.commit_cycle(commit(&theater, vec![telugu.clone(), MovieSnapshot::new("Kantara", ["10:00 AM"])], vec![]))
    .await
    .unwrap();
  let later = date().succ_opt().unwrap();
  s.commit_cycle(CycleCommit {
    theater_id:    theater.theater_id,
    date:          later,
    movies:        vec![MovieSnapshot::new("Coolie", ["11:00 AM"])],
    deactivations: vec![],
  })
  .await
  .unwrap();

  let found = s
    .search_movies(MovieQuery { title: Some("cool".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(found.len(), 2);
  assert_eq!(found[0].show_date, date());
  assert_eq!(found[0].movie, telugu);
  assert_eq!(found[0].theater_name, "Prasads Multiplex");
  assert_eq!(found[1].show_date, later);

  let query = MovieQuery { language: Some("telugu".into()), city: Some("HYDERABAD".into()), ..Default::default() };
  assert_eq!(s.search_movies(query).await.unwrap().len(), 1);

  let query = MovieQuery { show_date: Some(later), ..Default::default() };
  let on_later = s.search_movies(query).await.unwrap();
  assert_eq!(on_later.len(), 1);
  assert_eq!(on_later[0].movie.times().collect::<Vec<_>>(), ["11:00 AM"]);

  let query = MovieQuery { city: Some("bengaluru".into()), ..Default::default() };
  assert!(s.search_movies(query).await.unwrap().is_empty());
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn pending_is_oldest_first_and_mark_sent_removes() {
  let s = store().await;
  let (user, theater) = fixture(&s).await;
  let first = s.subscribe(new_sub(&user, &theater, "movie a")).await.unwrap();
  let second = s.subscribe(new_sub(&user, &theater, "movie b")).await.unwrap();

  for (sub, msg) in [(&first, "one"), (&second, "two")] {
    let d = Deactivation {
      subscription_id: sub.subscription_id,
      at:              Utc::now(),
      notifications:   vec![notice(sub, msg)],
    };
    s.commit_cycle(commit(&theater, vec![], vec![d])).await.unwrap();
  }

  let pending = s.pending_notifications(vec![Channel::Email], 10).await.unwrap();
  let messages: Vec<&str> = pending.iter().map(|p| p.notification.message.as_str()).collect();
  assert_eq!(messages, ["one", "two"]);
  assert_eq!(pending[0].user.user_id, user.user_id);
  assert_eq!(s.pending_notifications(vec![Channel::Email], 1).await.unwrap().len(), 1);

  let id = pending[0].notification.notification_id;
  s.mark_sent(id, Channel::Email, Utc::now()).await.unwrap();
  // Idempotent.
  s.mark_sent(id, Channel::Email, Utc::now()).await.unwrap();

  let pending = s.pending_notifications(vec![Channel::Email], 10).await.unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].notification.message, "two");

  let all = s.list_notifications(user.user_id).await.unwrap();
  let sent = all.iter().find(|n| n.notification_id == id).unwrap();
  assert!(sent.sent);
  assert_eq!(sent.channel, Some(Channel::Email));
  assert!(sent.sent_at.is_some());
}

#[tokio::test]
async fn mark_sent_unknown_is_an_error() {
  let s = store().await;
  let err = s.mark_sent(Uuid::new_v4(), Channel::Email, Utc::now()).await.unwrap_err();
  assert!(matches!(err, crate::Error::NotificationNotFound(_)));
}

/// Queue one notification for `contact`, each on its own subscription.
async fn queue_for(s: &SqliteStore, theater: &Theater, contact: Contact, message: &str) -> Uuid {
  let user = s.ensure_user(contact).await.unwrap();
  let sub = s.subscribe(new_sub(&user, theater, message)).await.unwrap();
  let d = Deactivation {
    subscription_id: sub.subscription_id,
    at:              Utc::now(),
    notifications:   vec![notice(&sub, message)],
  };
  s.commit_cycle(commit(theater, vec![], vec![d])).await.unwrap();
  s.list_notifications(user.user_id)
    .await
    .unwrap()
    .into_iter()
    .find(|n| n.message == message)
    .unwrap()
    .notification_id
}

#[tokio::test]
async fn pending_only_returns_deliverable_channels() {
  let s = store().await;
  let theater = s.ensure_theater(new_theater("PRHN")).await.unwrap();
  queue_for(&s, &theater, Contact::Telegram("42".into()), "chat").await;
  queue_for(&s, &theater, Contact::Email("a@example.com".into()), "mail").await;

  let messages = |pending: Vec<showwatch_core::notification::PendingNotification>| {
    pending.into_iter().map(|p| p.notification.message).collect::<Vec<_>>()
  };
  assert_eq!(messages(s.pending_notifications(vec![Channel::Email], 10).await.unwrap()), ["mail"]);
  assert_eq!(messages(s.pending_notifications(vec![Channel::Telegram], 10).await.unwrap()), ["chat"]);
  assert_eq!(
    messages(s.pending_notifications(vec![Channel::Email, Channel::Telegram], 10).await.unwrap()),
    ["chat", "mail"]
  );
  assert!(s.pending_notifications(vec![], 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_attempts_move_a_row_behind_fresh_ones() {
  let s = store().await;
  let theater = s.ensure_theater(new_theater("PRHN")).await.unwrap();
  let stuck = queue_for(&s, &theater, Contact::Email("a@example.com".into()), "stuck").await;
  queue_for(&s, &theater, Contact::Email("b@example.com".into()), "fresh").await;

  s.record_failed_attempt(stuck).await.unwrap();

  let pending = s.pending_notifications(vec![Channel::Email], 1).await.unwrap();
  assert_eq!(pending[0].notification.message, "fresh");
  // Still unsent, just later in line.
  let pending = s.pending_notifications(vec![Channel::Email], 10).await.unwrap();
  assert_eq!(pending.len(), 2);
  assert_eq!(pending[1].notification.notification_id, stuck);

  let err = s.record_failed_attempt(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, crate::Error::NotificationNotFound(_)));
}

#[tokio::test]
async fn reactivation_of_an_active_row_is_refused_by_the_state_machine() {
  let s = store().await;
  let (user, theater) = fixture(&s).await;
  let sub = s.subscribe(new_sub(&user, &theater, "movie b")).await.unwrap();
  s.cancel_subscription(sub.subscription_id).await.unwrap();
  s.subscribe(new_sub(&user, &theater, "movie b")).await.unwrap();

  let err = s.subscribe(new_sub(&user, &theater, "movie b")).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::AlreadyActive(id)) if *id == sub.subscription_id));
  let all = s.list_user_subscriptions(user.user_id, true).await.unwrap();
  assert_eq!(all.len(), 1);
}
