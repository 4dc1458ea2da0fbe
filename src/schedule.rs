//! Daily refresh and subscriber push.
//!
//! Once a day at `schedule.time` the loop refreshes the canonical config,
//! redraws what the refresh invalidated, renders today's combined image and
//! hands it to every subscriber through a [`Dispatch`] implementation.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, NaiveTime};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::AppConfig;
use crate::reconcile::Refresher;
use crate::renderer::{Renderer, Reply};
use crate::selector::Query;
use crate::subscription::{SubscriberKind, SubscriptionStore, Subscriptions};

/// Error from one delivery.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    #[error("{kind} {id} rejected the message: {reason}")]
    Rejected {
        kind: SubscriberKind,
        id: i64,
        reason: String,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Sends a reply to one chat target.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn deliver(&self, kind: SubscriberKind, id: i64, reply: &Reply) -> Result<(), DispatchError>;
}

/// Delivery counts of one push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushReport {
    pub delivered: usize,
    pub failed: usize,
}

/// First instant at `hour:minute` strictly after `now`.
pub fn next_run(now: NaiveDateTime, (hour, minute): (u32, u32)) -> NaiveDateTime {
    let at = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// Deliver `reply` to groups, then private chats, pausing a random
/// `[min, max]` seconds between sends. Failures are logged and skipped.
pub async fn push_to_subscribers(
    dispatch: &dyn Dispatch,
    subscriptions: &Subscriptions,
    reply: &Reply,
    delay_secs: [u64; 2],
) -> PushReport {
    let [min, max] = delay_secs;
    let mut report = PushReport::default();

    for (i, (kind, id)) in subscriptions.targets().enumerate() {
        if i > 0 {
            let secs = rand::rng().random_range(min..=max.max(min));
            tokio::time::sleep(Duration::from_secs(secs)).await;
        }
        match dispatch.deliver(kind, id, reply).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                tracing::error!(kind = %kind, id, error = %e, "Push delivery failed");
                report.failed += 1;
            }
        }
    }

    tracing::info!(delivered = report.delivered, failed = report.failed, "Daily push finished");
    report
}

/// The daily refresh-and-push job.
pub struct DailyPush {
    refresher: Refresher,
    renderer: Arc<Renderer>,
    subscriptions: SubscriptionStore,
    dispatch: Arc<dyn Dispatch>,
    at: (u32, u32),
    delay_secs: [u64; 2],
}

impl DailyPush {
    /// `None` when the schedule is disabled or its time is unusable.
    pub fn new(
        config: &AppConfig,
        refresher: Refresher,
        renderer: Arc<Renderer>,
        dispatch: Arc<dyn Dispatch>,
    ) -> Option<Self> {
        if !config.schedule.enabled {
            return None;
        }
        Some(Self {
            refresher,
            renderer,
            subscriptions: SubscriptionStore::new(config.subscription_path()),
            dispatch,
            at: config.schedule.hour_minute()?,
            delay_secs: config.schedule.push_delay_secs,
        })
    }

    /// One refresh and push, as if triggered at `now`.
    pub async fn run_once(&self, now: NaiveDateTime) -> PushReport {
        match self.refresher.refresh().await {
            Ok(outcome) => {
                for scope in outcome.invalidated() {
                    self.renderer.redraw(scope).await;
                }
            }
            Err(e) => tracing::error!(error = %e, "Scheduled refresh failed"),
        }

        let reply = self.renderer.reply(&Query::Update, now).await;
        let subscriptions = match self.subscriptions.load() {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                tracing::error!(error = %e, "Subscriptions unreadable, push skipped");
                return PushReport::default();
            }
        };
        push_to_subscribers(self.dispatch.as_ref(), &subscriptions, &reply, self.delay_secs).await
    }

    /// Sleep until each trigger and run; never returns.
    pub async fn run(&self) {
        let (hour, minute) = self.at;
        tracing::info!(hour, minute, "Daily push scheduled");
        loop {
            let now = Local::now().naive_local();
            let wait = (next_run(now, self.at) - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
            self.run_once(Local::now().naive_local()).await;
        }
    }
}
