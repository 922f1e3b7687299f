//! Outbound delivery: the [`Transport`] seam and the [`Notifier`] that drains
//! the notification outbox through it.

pub mod brevo;
pub mod telegram;

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use showwatch_core::{
  message,
  notification::PendingNotification,
  store::TrackerStore,
  user::Channel,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub use brevo::BrevoTransport;
pub use telegram::TelegramTransport;

use crate::config::NotifyConfig;

#[derive(Debug, Error)]
pub enum TransportError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("rejected with status {status}: {body}")]
  Rejected { status: u16, body: String },
}

/// Delivers one message to one recipient on one channel.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), TransportError>;
}

/// Outcome of one drain pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
  pub attempted:  usize,
  pub sent:       usize,
  pub failed:     usize,
  /// Accepted by the transport but not marked sent; these stay in the outbox
  /// and will be delivered again.
  pub unrecorded: usize,
}

/// What happened to a single notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
  Sent,
  Failed,
  Unrecorded,
}

/// Drains unsent notifications on the channels it has transports for,
/// marking each one sent as soon as its transport accepts it. Rows that have
/// failed before are tried after fresh ones.
pub struct Notifier<S> {
  store:         Arc<S>,
  transports:    HashMap<Channel, Arc<dyn Transport>>,
  batch_size:    usize,
  message_delay: Duration,
}

impl<S: TrackerStore> Notifier<S> {
  pub fn new(store: Arc<S>, config: &NotifyConfig) -> Self {
    Self {
      store,
      transports: HashMap::new(),
      batch_size: config.batch_size,
      message_delay: config.message_delay(),
    }
  }

  pub fn with_transport(mut self, channel: Channel, transport: Arc<dyn Transport>) -> Self {
    self.transports.insert(channel, transport);
    self
  }

  pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ { self.transports.keys().copied() }

  /// Deliver up to one batch. Failures leave the notification unsent for the
  /// next pass. Stops early, between messages, when `cancel` fires.
  pub async fn drain(&self, cancel: &CancellationToken) -> Result<DrainReport, S::Error> {
    let pending = self
      .store
      .pending_notifications(self.channels().collect(), self.batch_size)
      .await?;
    let mut report = DrainReport::default();
    if pending.is_empty() {
      return Ok(report);
    }
    tracing::info!(count = pending.len(), "delivering pending notifications");

    for (index, item) in pending.iter().enumerate() {
      if index > 0 {
        tokio::select! {
          _ = cancel.cancelled() => break,
          _ = tokio::time::sleep(self.message_delay) => {}
        }
      }

      report.attempted += 1;
      match self.deliver(item).await {
        Delivery::Sent => report.sent += 1,
        Delivery::Failed => report.failed += 1,
        Delivery::Unrecorded => report.unrecorded += 1,
      }
    }

    tracing::info!(
      sent = report.sent,
      failed = report.failed,
      unrecorded = report.unrecorded,
      "notification pass finished"
    );
    Ok(report)
  }

  async fn deliver(&self, item: &PendingNotification) -> Delivery {
    let id = item.notification.notification_id;
    let channel = item.user.channel;

    let Some(recipient) = item.user.address_for(channel) else {
      tracing::warn!(notification = %id, user = %item.user.user_id, %channel, "user has no address for their channel");
      return self.failed(id).await;
    };
    let Some(transport) = self.transports.get(&channel) else {
      tracing::warn!(notification = %id, %channel, "no transport configured for channel");
      return self.failed(id).await;
    };

    if let Err(e) = transport.send(recipient, message::SUBJECT, &item.notification.message).await {
      tracing::warn!(notification = %id, %channel, "delivery failed: {e}");
      return self.failed(id).await;
    }

    match self.store.mark_sent(id, channel, Utc::now()).await {
      Ok(()) => Delivery::Sent,
      Err(e) => {
        tracing::error!(notification = %id, "delivered but could not mark sent: {e}");
        Delivery::Unrecorded
      }
    }
  }

  async fn failed(&self, id: Uuid) -> Delivery {
    if let Err(e) = self.store.record_failed_attempt(id).await {
      tracing::error!(notification = %id, "could not record failed attempt: {e}");
    }
    Delivery::Failed
  }
}
