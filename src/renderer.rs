//! Cache-aware rendering and chat replies
//!
//! A render request is served from `cache/` when the file exists. Otherwise
//! the canonical config is loaded, turned into panels, composed on a blocking
//! worker and written back to the cache. Cache entries only disappear through
//! [`RenderCache::invalidate`], which a refresh calls when a schedule changes.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::cache::{CacheScope, DailyPart, RenderCache, RenderKey};
use crate::composition::{compose_all, concat_horizontal, Compose, ComposeError};
use crate::config::AppConfig;
use crate::models::DayBucket;
use crate::output::{self, OutputError};
use crate::panels::{PanelBuilder, PanelError};
use crate::selector::{daily_bucket, Query};
use crate::store::{ConfigStore, StoreError};

/// Reply on Sunday, when every domain is open.
pub const SUNDAY_REPLY: &str = "今天所有天赋培养、武器突破材料都可以获取哦~";

/// Error while producing an image.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RenderError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("config.json does not exist yet, run a refresh first")]
    NoConfig,
    #[error(transparent)]
    Panel(#[from] PanelError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("render worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl RenderError {
    /// Short name shown to chat users.
    pub fn category(&self) -> &'static str {
        match self {
            RenderError::Store(_) => "StoreError",
            RenderError::NoConfig => "ConfigMissing",
            RenderError::Panel(_) => "PanelError",
            RenderError::Compose(_) => "ComposeError",
            RenderError::Output(_) => "OutputError",
            RenderError::Worker(_) => "WorkerError",
        }
    }
}

/// One render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderRequest {
    /// Serve from cache when possible
    Cached(RenderKey),
    /// Redraw the combined daily image of `day` regardless of the cache
    Update(DayBucket),
}

impl RenderRequest {
    pub fn key(&self) -> RenderKey {
        match self {
            RenderRequest::Cached(key) => key.clone(),
            RenderRequest::Update(day) => RenderKey::Daily { day: *day, part: DailyPart::All },
        }
    }

    pub fn forced(&self) -> bool {
        matches!(self, RenderRequest::Update(_))
    }
}

/// What goes back to the chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Reply {
    Image { path: PathBuf, payload: String },
    Text { text: String },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text { text: text.into() }
    }

    fn failure(error: &RenderError) -> Self {
        Reply::text(format!("[{}]原神材料图片生成失败", error.category()))
    }
}

/// Request a query resolves to at local time `now`; `None` for daily
/// queries on Sunday.
pub fn request_for(query: &Query, now: NaiveDateTime) -> Option<RenderRequest> {
    let request = match query {
        Query::Daily(part) => RenderRequest::Cached(RenderKey::Daily { day: daily_bucket(now)?, part: *part }),
        Query::Update => RenderRequest::Update(daily_bucket(now)?),
        Query::Boss(boss) => RenderRequest::Cached(RenderKey::Boss(boss.clone())),
        Query::WeeklyAll => RenderRequest::Cached(RenderKey::WeeklyAll),
    };
    Some(request)
}

/// Owner of the render cache.
pub struct Renderer {
    store: ConfigStore,
    cache: RenderCache,
    panels: PanelBuilder,
    compositor: Arc<dyn Compose>,
}

impl Renderer {
    pub fn new(config: &AppConfig, compositor: Arc<dyn Compose>) -> Self {
        Self {
            store: ConfigStore::new(config.canonical_path()),
            cache: RenderCache::new(config.cache_dir()),
            panels: PanelBuilder::new(config),
            compositor,
        }
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// Path of the rendered image, drawing it when not cached or forced.
    pub async fn get_or_render(&self, request: &RenderRequest) -> Result<PathBuf, RenderError> {
        let key = request.key();
        if !request.forced() {
            if let Some(path) = self.cache.lookup(&key) {
                tracing::info!(file = %key, "Using cached image");
                return Ok(path);
            }
        }
        self.render(&key).await
    }

    async fn render(&self, key: &RenderKey) -> Result<PathBuf, RenderError> {
        let config = self.store.load()?.ok_or(RenderError::NoConfig)?;
        let (keys, panels): (Vec<RenderKey>, Vec<_>) = self.panels.for_key(&config, key)?.into_iter().unzip();

        let compositor = Arc::clone(&self.compositor);
        let cache = self.cache.clone();
        let target = cache.path(key);

        let path = tokio::task::spawn_blocking(move || -> Result<PathBuf, RenderError> {
            let images = compose_all(compositor.as_ref(), &panels)?;
            // Parts of a combined image are cached under their own keys too
            if images.len() > 1 {
                for (part, image) in keys.iter().zip(&images) {
                    output::save_png(image, &cache.path(part))?;
                }
            }
            let joined = concat_horizontal(&images)?;
            output::save_png(&joined, &target)?;
            Ok(target)
        })
        .await??;

        tracing::info!(file = %key, "Image rendered");
        Ok(path)
    }

    /// Answer a query at local time `now`.
    pub async fn reply(&self, query: &Query, now: NaiveDateTime) -> Reply {
        match request_for(query, now) {
            Some(request) => self.reply_to(&request).await,
            None => Reply::text(SUNDAY_REPLY),
        }
    }

    /// Answer an already resolved request.
    pub async fn reply_to(&self, request: &RenderRequest) -> Reply {
        match self.image_reply(request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(request = ?request, error = %e, "Image generation failed");
                Reply::failure(&e)
            }
        }
    }

    async fn image_reply(&self, request: &RenderRequest) -> Result<Reply, RenderError> {
        let path = self.get_or_render(request).await?;
        let file = path.clone();
        let payload = tokio::task::spawn_blocking(move || output::jpeg_payload_from_file(&file)).await??;
        Ok(Reply::Image { path, payload })
    }

    /// Delete every cached image of `scope`.
    pub fn invalidate(&self, scope: CacheScope) -> std::io::Result<usize> {
        self.cache.invalidate(scope)
    }

    /// Re-render the combined images of `scope`; returns how many succeeded.
    pub async fn redraw(&self, scope: CacheScope) -> usize {
        let keys: Vec<RenderKey> = match scope {
            CacheScope::Daily => DayBucket::ALL
                .iter()
                .map(|day| RenderKey::Daily { day: *day, part: DailyPart::All })
                .collect(),
            CacheScope::Weekly => vec![RenderKey::WeeklyAll],
        };

        let mut drawn = 0;
        for key in keys {
            match self.render(&key).await {
                Ok(_) => drawn += 1,
                Err(e) => tracing::warn!(file = %key, error = %e, "Redraw failed"),
            }
        }
        drawn
    }
}
