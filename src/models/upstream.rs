//! Typed views over the upstream data collections.
//!
//! Every map keeps upstream document order; reconciliation relies on it for
//! region sorting ties, boss slot assignment and recipe iteration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One domain entry of the daily dungeon table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dungeon {
    pub name: String,
    /// Reward material ids; the farmable material is the last one
    #[serde(default)]
    pub reward: Vec<u64>,
    /// Region ordinal used for display order
    #[serde(default)]
    pub city: u32,
}

impl Dungeon {
    pub fn reward_material(&self) -> Option<u64> {
        self.reward.last().copied()
    }
}

/// `weekday -> dungeon id -> dungeon`
pub type DailyDungeons = IndexMap<String, IndexMap<String, Dungeon>>;

/// Upgrade recipe of one character or weapon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// `material id -> consumption count`
    #[serde(default)]
    pub items: IndexMap<String, u64>,
}

impl Recipe {
    pub fn uses(&self, material_id: &str) -> bool {
        self.items.contains_key(material_id)
    }
}

/// Upgrade consumption of every character and weapon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpgradeTable {
    #[serde(default)]
    pub avatar: IndexMap<String, Recipe>,
    #[serde(default)]
    pub weapon: IndexMap<String, Recipe>,
}

/// A character, weapon or material as listed by a catalog endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    #[serde(default)]
    pub rank: u64,
    #[serde(default)]
    pub icon: String,
    /// Material category tag, empty for characters and weapons
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Catalog endpoint payload: `{"items": {id: item}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub items: IndexMap<String, CatalogItem>,
}

impl Catalog {
    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.items.get(id)
    }
}

/// All five collections a refresh needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Upstream {
    pub dungeons: DailyDungeons,
    pub upgrade: UpgradeTable,
    pub avatars: Catalog,
    pub weapons: Catalog,
    pub materials: Catalog,
}

/// Whether an upstream id denotes a single entity. Multi-variant entities
/// such as the traveler use ids like `10000005-anemo`.
pub fn is_plain_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}
