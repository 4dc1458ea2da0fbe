//! Render cache layout under `{data_dir}/cache`.
//!
//! | Key | File |
//! |-----|------|
//! | daily, one kind | `day{n}.{avatar,weapon}.png` |
//! | daily, both kinds | `day{n}.all.png` |
//! | one boss | `week.{boss}.png` |
//! | all bosses | `week.all.png` |
//!
//! Entries never expire on their own; a refresh that changes a schedule
//! deletes every entry of that schedule.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::{DayBucket, ItemKind};

/// Which kinds a daily image shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DailyPart {
    Avatar,
    Weapon,
    All,
}

impl DailyPart {
    pub fn as_str(self) -> &'static str {
        match self {
            DailyPart::Avatar => "avatar",
            DailyPart::Weapon => "weapon",
            DailyPart::All => "all",
        }
    }

    /// Kinds in panel order.
    pub fn kinds(self) -> &'static [ItemKind] {
        match self {
            DailyPart::Avatar => &[ItemKind::Avatar],
            DailyPart::Weapon => &[ItemKind::Weapon],
            DailyPart::All => &ItemKind::ALL,
        }
    }
}

impl From<ItemKind> for DailyPart {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Avatar => DailyPart::Avatar,
            ItemKind::Weapon => DailyPart::Weapon,
        }
    }
}

/// Identity of one cached render.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RenderKey {
    Daily { day: DayBucket, part: DailyPart },
    Boss(String),
    WeeklyAll,
}

impl RenderKey {
    pub fn file_name(&self) -> String {
        match self {
            RenderKey::Daily { day, part } => format!("day{}.{}.png", day, part.as_str()),
            RenderKey::Boss(boss) => format!("week.{}.png", boss),
            RenderKey::WeeklyAll => "week.all.png".to_string(),
        }
    }

    pub fn scope(&self) -> CacheScope {
        match self {
            RenderKey::Daily { .. } => CacheScope::Daily,
            RenderKey::Boss(_) | RenderKey::WeeklyAll => CacheScope::Weekly,
        }
    }
}

impl fmt::Display for RenderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Half of the cache invalidated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheScope {
    Daily,
    Weekly,
}

impl CacheScope {
    fn prefix(self) -> &'static str {
        match self {
            CacheScope::Daily => "day",
            CacheScope::Weekly => "week.",
        }
    }

    /// Whether a cache file name belongs to this scope.
    pub fn covers(self, file_name: &str) -> bool {
        file_name.starts_with(self.prefix()) && file_name.ends_with(".png")
    }
}

impl fmt::Display for CacheScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheScope::Daily => f.write_str("daily"),
            CacheScope::Weekly => f.write_str("weekly"),
        }
    }
}

/// The `cache/` directory.
#[derive(Debug, Clone)]
pub struct RenderCache {
    dir: PathBuf,
}

impl RenderCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: &RenderKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Path of an existing entry.
    pub fn lookup(&self, key: &RenderKey) -> Option<PathBuf> {
        let path = self.path(key);
        path.is_file().then_some(path)
    }

    /// Delete every entry of `scope`; returns how many files were removed.
    pub fn invalidate(&self, scope: CacheScope) -> io::Result<usize> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            if name.to_str().is_some_and(|name| scope.covers(name)) {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        tracing::info!(scope = %scope, removed, "Render cache invalidated");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_names() {
        let key = RenderKey::Daily { day: DayBucket::TueFri, part: DailyPart::All };
        assert_eq!(key.file_name(), "day2.all.png");
        assert_eq!(RenderKey::Boss("若陀龙王".to_string()).file_name(), "week.若陀龙王.png");
        assert_eq!(RenderKey::WeeklyAll.file_name(), "week.all.png");
        assert_eq!(RenderKey::WeeklyAll.scope(), CacheScope::Weekly);
    }

    #[test]
    fn test_invalidate_only_touches_scope() {
        let temp = TempDir::new().expect("should create temp dir");
        let cache = RenderCache::new(temp.path());
        for name in ["day1.all.png", "day2.avatar.png", "week.all.png", "week.若陀龙王.png", "notes.txt"] {
            std::fs::write(temp.path().join(name), b"x").unwrap();
        }

        assert_eq!(cache.invalidate(CacheScope::Daily).unwrap(), 2);
        assert!(!temp.path().join("day1.all.png").exists());
        assert!(temp.path().join("week.all.png").exists());
        assert!(temp.path().join("notes.txt").exists());

        assert_eq!(cache.invalidate(CacheScope::Weekly).unwrap(), 2);
        assert!(cache.lookup(&RenderKey::WeeklyAll).is_none());
    }

    #[test]
    fn test_invalidate_missing_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let cache = RenderCache::new(temp.path().join("cache"));
        assert_eq!(cache.invalidate(CacheScope::Daily).unwrap(), 0);
    }
}
