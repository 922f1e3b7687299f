//! JSON HTTP surface.
//!
//! | Method   | Path                                  | Notes |
//! |----------|---------------------------------------|-------|
//! | `GET`    | `/health`                             | |
//! | `POST`   | `/api/subscriptions`                  | 201 on create or reactivate, 409 if already active |
//! | `DELETE` | `/api/subscriptions/{id}`             | 404 unknown, 409 already inactive |
//! | `GET`    | `/api/users/{id}/subscriptions`       | `?all=true` includes inactive |
//! | `GET`    | `/api/users/{id}/notifications`       | |
//! | `POST`   | `/api/parse-url`                      | Always 200; `success: false` with an `error` for a bad URL |
//! | `GET`    | `/api/theaters/search`                | `?city=&name=`, substring matches |
//! | `GET`    | `/api/theaters/{id}`                  | |
//! | `GET`    | `/api/theaters/{id}/listings/{date}`  | `date` is `YYYY-MM-DD` |
//! | `GET`    | `/api/movies/search`                  | `?title=&city=&language=&show_date=` |
//! | `POST`   | `/api/acquire`                        | Manual acquisition; persists nothing |

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
  routing::{delete, get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use showwatch_core::{
  listing::{ListedMovie, MovieSnapshot},
  listing_url::ListingUrl,
  message,
  notification::Notification,
  store::{MovieQuery, TheaterQuery, TrackerStore},
  subscription::{NewSubscription, Subscription},
  theater::{NewTheater, Theater},
  user::{Contact, User},
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::{
  acquisition::AcquisitionError,
  error::{Error, Result},
  orchestrator::Orchestrator,
};

// ─── State ───────────────────────────────────────────────────────────────────

pub struct AppState<S> {
  pub store:        Arc<S>,
  pub orchestrator: Arc<Orchestrator<S>>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), orchestrator: self.orchestrator.clone() }
  }
}

/// Build the application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: TrackerStore + 'static,
{
  let api = Router::new()
    .route("/subscriptions", post(create_subscription::<S>))
    .route("/subscriptions/{id}", delete(cancel_subscription::<S>))
    .route("/users/{id}/subscriptions", get(list_subscriptions::<S>))
    .route("/users/{id}/notifications", get(list_notifications::<S>))
    .route("/parse-url", post(parse_url))
    .route("/theaters/search", get(search_theaters::<S>))
    .route("/theaters/{id}", get(get_theater::<S>))
    .route("/theaters/{id}/listings/{date}", get(listing::<S>))
    .route("/movies/search", get(search_movies::<S>))
    .route("/acquire", post(acquire::<S>));

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn health() -> Json<serde_json::Value> { Json(json!({ "status": "ok" })) }

// ─── Subscriptions ───────────────────────────────────────────────────────────

fn default_true() -> bool { true }

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionBody {
  pub listing_url:      String,
  pub movie_name:       String,
  pub email:            Option<String>,
  pub telegram_chat_id: Option<String>,
  #[serde(default = "default_true")]
  pub notify_new_shows: bool,
  #[serde(default = "default_true")]
  pub notify_new_times: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionCreated {
  pub subscription: Subscription,
  pub theater:      Theater,
  pub user:         User,
}

/// `POST /api/subscriptions`
async fn create_subscription<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CreateSubscriptionBody>,
) -> Result<impl IntoResponse>
where
  S: TrackerStore + 'static,
{
  let url = ListingUrl::parse(&body.listing_url)?;
  let movie_query = body.movie_name.trim();
  if movie_query.is_empty() {
    return Err(Error::BadRequest("movie_name must not be empty".into()));
  }
  let contact = Contact::from_parts(body.email.as_deref(), body.telegram_chat_id.as_deref())
    .ok_or_else(|| Error::BadRequest("an email or telegram_chat_id is required".into()))?;

  let store = &state.store;
  let theater = store
    .ensure_theater(NewTheater::from_listing_url(&url))
    .await
    .map_err(Error::from_store)?;
  let user = store.ensure_user(contact).await.map_err(Error::from_store)?;
  let subscription = store
    .subscribe(NewSubscription {
      user_id:          user.user_id,
      theater_id:       theater.theater_id,
      movie_query:      movie_query.to_owned(),
      target_date:      url.date,
      notify_new_shows: body.notify_new_shows,
      notify_new_times: body.notify_new_times,
    })
    .await
    .map_err(Error::from_store)?;

  tracing::info!(
    subscription = %subscription.subscription_id,
    theater = %theater.name,
    date = %url.date,
    "subscribed"
  );
  Ok((StatusCode::CREATED, Json(SubscriptionCreated { subscription, theater, user })))
}

/// `DELETE /api/subscriptions/{id}`
async fn cancel_subscription<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Subscription>>
where
  S: TrackerStore + 'static,
{
  let subscription = state.store.cancel_subscription(id).await.map_err(Error::from_store)?;
  Ok(Json(subscription))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub all: bool,
}

async fn require_user<S: TrackerStore>(store: &S, id: Uuid) -> Result<User> {
  store
    .get_user(id)
    .await
    .map_err(Error::from_store)?
    .ok_or_else(|| Error::NotFound(format!("user {id}")))
}

/// `GET /api/users/{id}/subscriptions[?all=true]`
async fn list_subscriptions<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Subscription>>>
where
  S: TrackerStore + 'static,
{
  require_user(state.store.as_ref(), id).await?;
  let subscriptions = state
    .store
    .list_user_subscriptions(id, params.all)
    .await
    .map_err(Error::from_store)?;
  Ok(Json(subscriptions))
}

/// `GET /api/users/{id}/notifications`
async fn list_notifications<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Notification>>>
where
  S: TrackerStore + 'static,
{
  require_user(state.store.as_ref(), id).await?;
  let notifications = state.store.list_notifications(id).await.map_err(Error::from_store)?;
  Ok(Json(notifications))
}

// ─── URL preview ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ParseUrlBody {
  pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TheaterInfo {
  pub name:           String,
  pub city:           String,
  pub code:           String,
  pub url_path:       String,
  pub date:           NaiveDate,
  pub formatted_date: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParseUrlResponse {
  pub success:      bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub theater_info: Option<TheaterInfo>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:        Option<String>,
}

/// `POST /api/parse-url`
///
/// Lets a client preview what a listing URL resolves to before subscribing.
async fn parse_url(Json(body): Json<ParseUrlBody>) -> Json<ParseUrlResponse> {
  let response = match ListingUrl::parse(&body.url) {
    Ok(url) => ParseUrlResponse {
      success:      true,
      theater_info: Some(TheaterInfo {
        name:           url.display_name(),
        url_path:       url.theater_path(),
        formatted_date: message::format_date(url.date),
        date:           url.date,
        city:           url.city,
        code:           url.theater_code,
      }),
      error:        None,
    },
    Err(e) => ParseUrlResponse { success: false, theater_info: None, error: Some(e.to_string()) },
  };
  Json(response)
}

// ─── Theaters & listings ─────────────────────────────────────────────────────

/// `GET /api/theaters/search[?city=&name=]`
async fn search_theaters<S>(
  State(state): State<AppState<S>>,
  Query(query): Query<TheaterQuery>,
) -> Result<Json<Vec<Theater>>>
where
  S: TrackerStore + 'static,
{
  let theaters = state.store.search_theaters(query).await.map_err(Error::from_store)?;
  Ok(Json(theaters))
}

/// `GET /api/theaters/{id}`
async fn get_theater<S>(State(state): State<AppState<S>>, Path(id): Path<Uuid>) -> Result<Json<Theater>>
where
  S: TrackerStore + 'static,
{
  let theater = state
    .store
    .get_theater(id)
    .await
    .map_err(Error::from_store)?
    .ok_or_else(|| Error::NotFound(format!("theater {id}")))?;
  Ok(Json(theater))
}

/// `GET /api/movies/search[?title=&city=&language=&show_date=]`
async fn search_movies<S>(
  State(state): State<AppState<S>>,
  Query(query): Query<MovieQuery>,
) -> Result<Json<Vec<ListedMovie>>>
where
  S: TrackerStore + 'static,
{
  let movies = state.store.search_movies(query).await.map_err(Error::from_store)?;
  Ok(Json(movies))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListingView {
  pub theater: Theater,
  pub date:    NaiveDate,
  pub movies:  Vec<MovieSnapshot>,
}

/// `GET /api/theaters/{id}/listings/{date}`
async fn listing<S>(
  State(state): State<AppState<S>>,
  Path((id, date)): Path<(Uuid, String)>,
) -> Result<Json<ListingView>>
where
  S: TrackerStore + 'static,
{
  let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
    .map_err(|e| Error::BadRequest(format!("invalid date {date:?}: {e}")))?;
  let theater = state
    .store
    .get_theater(id)
    .await
    .map_err(Error::from_store)?
    .ok_or_else(|| Error::NotFound(format!("theater {id}")))?;
  let movies = state.store.current_snapshot(id, date).await.map_err(Error::from_store)?;
  Ok(Json(ListingView { theater, date, movies }))
}

// ─── Manual acquisition ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AcquireBody {
  pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AcquireOutcome {
  Ok {
    requested_date: NaiveDate,
    actual_date:    NaiveDate,
    redirected:     bool,
    movies:         Vec<MovieSnapshot>,
  },
  NotYetOpen {
    requested_date: NaiveDate,
    actual_date:    NaiveDate,
    message:        String,
  },
}

/// `POST /api/acquire`
async fn acquire<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<AcquireBody>,
) -> Result<Json<AcquireOutcome>>
where
  S: TrackerStore + 'static,
{
  match state.orchestrator.run_acquisition_once(&body.url).await {
    Ok(acquisition) => Ok(Json(AcquireOutcome::Ok {
      requested_date: acquisition.target.date,
      actual_date:    acquisition.actual_date,
      redirected:     acquisition.redirected,
      movies:         acquisition.movies,
    })),
    Err(Error::Acquisition(AcquisitionError::NotYetOpen { requested, actual })) => {
      let message = AcquisitionError::NotYetOpen { requested, actual }.to_string();
      Ok(Json(AcquireOutcome::NotYetOpen { requested_date: requested, actual_date: actual, message }))
    }
    Err(e) => Err(e),
  }
}
