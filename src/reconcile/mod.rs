//! Reconciliation of upstream game data into the canonical config.
//!
//! [`reconcile`] is pure: it turns an [`Upstream`] bundle into a
//! [`CanonicalConfig`] plus the list of icons the renders will need.
//! [`Refresher`] wires it to the network, the asset cache, the config store
//! and render-cache invalidation.

pub mod daily;
mod refresh;
pub mod weekly;

pub use refresh::{RefreshError, RefreshOutcome, Refresher};

use indexmap::IndexSet;
use thiserror::Error;

use crate::assets::{icon_filename, AssetCategory, AssetRequest};
use crate::models::{CanonicalConfig, CatalogItem, Upstream};

/// Error that aborts a refresh after the upstream data was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ReconcileError {
    /// Too few boss-drop materials to give every known boss a full run.
    #[error("found {found} weekly boss materials, need at least {needed}")]
    BossMaterials { found: usize, needed: usize },
}

/// Output of one reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub config: CanonicalConfig,
    /// Icons referenced by the config, deduplicated, in first-use order
    pub assets: Vec<AssetRequest>,
}

/// Build the canonical config stamped with `time`.
pub fn reconcile(upstream: &Upstream, time: i64) -> Result<Reconciliation, ReconcileError> {
    let mut assets = AssetList::default();
    let (avatar, weapon) = daily::build_daily(upstream, &mut assets);
    let weekly = weekly::build_weekly(upstream, &mut assets)?;

    Ok(Reconciliation {
        config: CanonicalConfig { avatar, weapon, weekly, time },
        assets: assets.into_vec(),
    })
}

/// Ordered, deduplicated download list.
#[derive(Debug, Default)]
pub(crate) struct AssetList {
    requests: IndexSet<AssetRequest>,
}

impl AssetList {
    /// Icon of a catalog entry; falls back to the conventional item icon name.
    pub(crate) fn add_icon(&mut self, category: AssetCategory, id: u32, item: &CatalogItem) {
        let icon = if item.icon.is_empty() {
            format!("UI_ItemIcon_{}", id)
        } else {
            item.icon.clone()
        };
        self.requests.insert(AssetRequest::icon(icon, category, icon_filename(id)));
    }

    pub(crate) fn into_vec(self) -> Vec<AssetRequest> {
        self.requests.into_iter().collect()
    }
}
