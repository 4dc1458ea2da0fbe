use std::sync::Arc;
use thiserror::Error;

use crate::assets::AssetCache;
use crate::cache::{CacheScope, RenderCache};
use crate::fetch::{fetch_upstream, DataSource};
use crate::models::CanonicalConfig;
use crate::store::{ConfigStore, StoreError};

use super::{reconcile, ReconcileError};

/// Result of a refresh that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new config was persisted.
    Updated {
        daily_changed: bool,
        weekly_changed: bool,
    },
    /// Upstream data was incomplete; the previous config is kept.
    Skipped(String),
}

impl RefreshOutcome {
    /// Cache halves that were invalidated and need a redraw.
    pub fn invalidated(&self) -> Vec<CacheScope> {
        match self {
            RefreshOutcome::Updated { daily_changed, weekly_changed } => {
                let mut scopes = Vec::new();
                if *daily_changed {
                    scopes.push(CacheScope::Daily);
                }
                if *weekly_changed {
                    scopes.push(CacheScope::Weekly);
                }
                scopes
            }
            RefreshOutcome::Skipped(_) => Vec::new(),
        }
    }
}

/// Error that fails a refresh loudly.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RefreshError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to invalidate {scope} render cache: {source}")]
    Invalidate {
        scope: CacheScope,
        #[source]
        source: std::io::Error,
    },
}

/// Runs the fetch, reconcile, download, diff, persist, invalidate sequence.
pub struct Refresher {
    source: Arc<dyn DataSource>,
    store: ConfigStore,
    cache: RenderCache,
    assets: Option<Arc<AssetCache>>,
}

impl Refresher {
    pub fn new(source: Arc<dyn DataSource>, store: ConfigStore, cache: RenderCache) -> Self {
        Self { source, store, cache, assets: None }
    }

    /// Download icons referenced by each new config.
    pub fn with_assets(mut self, assets: Arc<AssetCache>) -> Self {
        self.assets = Some(assets);
        self
    }

    pub async fn refresh(&self) -> Result<RefreshOutcome, RefreshError> {
        let upstream = match fetch_upstream(self.source.as_ref()).await {
            Ok(upstream) => upstream,
            Err(e) => {
                tracing::warn!(error = %e, "Upstream data incomplete, refresh skipped");
                return Ok(RefreshOutcome::Skipped(e.to_string()));
            }
        };

        let reconciled = reconcile(&upstream, chrono::Utc::now().timestamp())?;
        let config = reconciled.config;

        if let Some(assets) = &self.assets {
            let results = assets.ensure_all(&reconciled.assets).await;
            let missing = results.iter().filter(|r| r.is_none()).count();
            tracing::info!(total = results.len(), missing, "Icon downloads finished");
        }

        let previous = self.previous();
        let daily_changed = previous.as_ref().map_or(true, |p| p.daily_differs(&config));
        let weekly_changed = previous.as_ref().map_or(true, |p| p.weekly_differs(&config));

        // Invalidated entries must re-render from the new config.
        self.store.save(&config)?;

        for (changed, scope) in [(daily_changed, CacheScope::Daily), (weekly_changed, CacheScope::Weekly)] {
            if changed {
                self.cache
                    .invalidate(scope)
                    .map_err(|source| RefreshError::Invalidate { scope, source })?;
            }
        }

        tracing::info!(daily_changed, weekly_changed, time = config.time, "Config refreshed");

        Ok(RefreshOutcome::Updated { daily_changed, weekly_changed })
    }

    /// The persisted config; an unreadable file counts as absent.
    fn previous(&self) -> Option<CanonicalConfig> {
        match self.store.load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Previous config unreadable, treating as absent");
                None
            }
        }
    }
}
