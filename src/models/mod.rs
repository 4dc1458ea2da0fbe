//! Data models for material schedules and upstream game data

mod entry;
mod schedule;
mod upstream;

pub use entry::{MaterialEntry, MaterialGroup, MaterialKey, ParseError, Rank};
pub use schedule::{
    CanonicalConfig, DailySchedule, DayBucket, Groups, ItemKind, WeeklySchedule, UNRELEASED_BOSS,
};
pub use upstream::{
    is_plain_id, Catalog, CatalogItem, DailyDungeons, Dungeon, Recipe, UpgradeTable, Upstream,
};
