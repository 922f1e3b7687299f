//! The orchestrator: a scrape loop that refreshes every (theater, date) with
//! active subscriptions, and a notify loop that drains the outbox.
//!
//! A group is processed as acquire → diff against the stored snapshot →
//! evaluate each subscription → commit everything in one transaction. Any
//! failure skips the group and leaves stored state as it was.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use showwatch_core::{
  diff::diff,
  listing_url::ListingUrl,
  matcher::Matcher,
  store::{CycleCommit, Deactivation, TrackerStore},
  subscription::Subscription,
};
use tokio::{
  sync::Mutex,
  task::JoinHandle,
  time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
  acquisition::{Acquisition, AcquisitionError, AcquisitionSession},
  config::TrackerConfig,
  error::Result,
  notify::{DrainReport, Notifier},
};

const MIN_TICK: Duration = Duration::from_secs(1);

/// Tallies for one scrape cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
  pub groups:        usize,
  pub refreshed:     usize,
  pub not_yet_open:  usize,
  pub failed:        usize,
  pub notifications: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupOutcome {
  Refreshed { notifications: usize },
  NotYetOpen,
  Failed,
}

#[derive(Debug, Clone, Copy)]
struct Timing {
  scrape_interval: Duration,
  notify_interval: Duration,
  group_spacing:   Duration,
  shutdown_grace:  Duration,
}

/// Join handles for the two background loops.
pub struct Loops {
  scrape: JoinHandle<()>,
  notify: JoinHandle<()>,
}

pub struct Orchestrator<S> {
  store:    Arc<S>,
  session:  Mutex<AcquisitionSession>,
  matcher:  Matcher,
  notifier: Notifier<S>,
  timing:   Timing,
}

impl<S> Orchestrator<S>
where
  S: TrackerStore + 'static,
{
  pub fn new(
    store: Arc<S>,
    session: AcquisitionSession,
    matcher: Matcher,
    notifier: Notifier<S>,
    config: &TrackerConfig,
  ) -> Self {
    Self {
      store,
      session: Mutex::new(session),
      matcher,
      notifier,
      timing: Timing {
        scrape_interval: config.scrape_interval(),
        notify_interval: config.notify_interval(),
        group_spacing:   config.group_spacing(),
        shutdown_grace:  config.shutdown_grace(),
      },
    }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  // ─── Scrape ────────────────────────────────────────────────────────────────

  /// Refresh every (theater, date) that has an active subscription on or
  /// after `today`. Groups run in (theater, date) order, one at a time.
  pub async fn scrape_cycle(
    &self,
    today: NaiveDate,
    cancel: &CancellationToken,
  ) -> Result<CycleReport, S::Error> {
    let active = self.store.active_subscriptions(today).await?;

    let mut groups: BTreeMap<(Uuid, NaiveDate), Vec<Subscription>> = BTreeMap::new();
    for sub in active {
      groups.entry(sub.group_key()).or_default().push(sub);
    }

    let mut report = CycleReport { groups: groups.len(), ..Default::default() };
    tracing::info!(groups = report.groups, "starting scrape cycle");

    for (index, ((theater_id, date), subs)) in groups.into_iter().enumerate() {
      if index > 0 {
        tokio::select! {
          _ = cancel.cancelled() => break,
          _ = tokio::time::sleep(self.timing.group_spacing) => {}
        }
      }
      if cancel.is_cancelled() {
        break;
      }

      match self.process_group(theater_id, date, subs).await {
        GroupOutcome::Refreshed { notifications } => {
          report.refreshed += 1;
          report.notifications += notifications;
        }
        GroupOutcome::NotYetOpen => report.not_yet_open += 1,
        GroupOutcome::Failed => report.failed += 1,
      }
    }

    tracing::info!(
      refreshed = report.refreshed,
      not_yet_open = report.not_yet_open,
      failed = report.failed,
      notifications = report.notifications,
      "scrape cycle finished"
    );
    Ok(report)
  }

  async fn process_group(&self, theater_id: Uuid, date: NaiveDate, subs: Vec<Subscription>) -> GroupOutcome {
    let theater = match self.store.get_theater(theater_id).await {
      Ok(Some(theater)) => theater,
      Ok(None) => {
        tracing::warn!(%theater_id, "subscriptions reference a missing theater");
        return GroupOutcome::Failed;
      }
      Err(e) => {
        tracing::error!(%theater_id, "failed to load theater: {e}");
        return GroupOutcome::Failed;
      }
    };

    let target = theater.listing_url(date);
    let acquired = {
      let mut session = self.session.lock().await;
      session.acquire(&target).await
    };
    let acquisition = match acquired {
      Ok(acquisition) => acquisition,
      Err(e @ AcquisitionError::NotYetOpen { .. }) => {
        tracing::info!(theater = %theater.name, %date, "{e}");
        return GroupOutcome::NotYetOpen;
      }
      Err(e) => {
        tracing::warn!(theater = %theater.name, %date, "acquisition failed: {e}");
        return GroupOutcome::Failed;
      }
    };

    let previous = match self.store.current_snapshot(theater_id, date).await {
      Ok(previous) => previous,
      Err(e) => {
        tracing::error!(theater = %theater.name, %date, "failed to load snapshot: {e}");
        return GroupOutcome::Failed;
      }
    };
    let changes = diff(&previous, &acquisition.movies);
    tracing::debug!(
      theater = %theater.name,
      %date,
      added = changes.added.len(),
      removed = changes.removed.len(),
      updated = changes.updated.len(),
      "listing diff"
    );

    let now = Utc::now();
    let deactivations: Vec<Deactivation> = subs
      .into_iter()
      .filter_map(|mut sub| {
        let notifications = self.matcher.evaluate(&mut sub, &theater, &changes, now);
        (!notifications.is_empty()).then(|| Deactivation {
          subscription_id: sub.subscription_id,
          at: now,
          notifications,
        })
      })
      .collect();

    let commit = CycleCommit {
      theater_id,
      date,
      movies: acquisition.movies,
      deactivations,
    };
    match self.store.commit_cycle(commit).await {
      Ok(summary) => {
        tracing::info!(
          theater = %theater.name,
          %date,
          movies = summary.movies,
          notifications = summary.notifications,
          "listing refreshed"
        );
        GroupOutcome::Refreshed { notifications: summary.notifications }
      }
      Err(e) => {
        tracing::error!(theater = %theater.name, %date, "commit failed, state unchanged: {e}");
        GroupOutcome::Failed
      }
    }
  }

  // ─── Notify ────────────────────────────────────────────────────────────────

  pub async fn notify_cycle(&self, cancel: &CancellationToken) -> Result<DrainReport, S::Error> {
    self.notifier.drain(cancel).await
  }

  // ─── Manual trigger ────────────────────────────────────────────────────────

  /// Acquire one listing URL through the shared session. Queues behind any
  /// group in flight. Persists nothing.
  pub async fn run_acquisition_once(&self, url: &str) -> Result<Acquisition> {
    let target = ListingUrl::parse(url)?;
    let mut session = self.session.lock().await;
    Ok(session.acquire(&target).await?)
  }

  // ─── Lifecycle ─────────────────────────────────────────────────────────────

  /// Start the scrape and notify loops. Both stop when `cancel` fires.
  pub fn spawn(self: &Arc<Self>, cancel: &CancellationToken) -> Loops {
    Loops {
      scrape: tokio::spawn(self.clone().scrape_loop(cancel.clone())),
      notify: tokio::spawn(self.clone().notify_loop(cancel.clone())),
    }
  }

  /// Cancel the loops, give in-flight work a bounded window to finish, then
  /// close the browser.
  pub async fn shutdown(&self, cancel: &CancellationToken, loops: Loops) {
    cancel.cancel();
    let Loops { mut scrape, mut notify } = loops;

    let joined = tokio::time::timeout(self.timing.shutdown_grace, async {
      let _ = (&mut scrape).await;
      let _ = (&mut notify).await;
    })
    .await;
    if joined.is_err() {
      tracing::warn!("loops did not stop within {:?}, abandoning", self.timing.shutdown_grace);
      scrape.abort();
      notify.abort();
    }

    self.session.lock().await.close().await;
    tracing::info!("orchestrator stopped");
  }

  async fn scrape_loop(self: Arc<Self>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(self.timing.scrape_interval.max(MIN_TICK));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
      tokio::select! {
        _ = cancel.cancelled() => break,
        _ = ticker.tick() => {}
      }
      let today = Local::now().date_naive();
      if let Err(e) = self.scrape_cycle(today, &cancel).await {
        tracing::error!("scrape cycle failed: {e}");
      }
    }
  }

  async fn notify_loop(self: Arc<Self>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(self.timing.notify_interval.max(MIN_TICK));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
      tokio::select! {
        _ = cancel.cancelled() => break,
        _ = ticker.tick() => {}
      }
      if let Err(e) = self.notify_cycle(&cancel).await {
        tracing::error!("notify cycle failed: {e}");
      }
    }
  }
}
