//! Builds compositor panels from the canonical config.
//!
//! Icons are referenced by path only; the compositor falls back to a plain
//! tile when a file is missing.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::assets::{icon_filename, AssetCategory};
use crate::cache::{DailyPart, RenderKey};
use crate::composition::{Panel, PanelHeader, PanelLayout, Tile, TileGroup};
use crate::config::AppConfig;
use crate::models::{CanonicalConfig, DayBucket, Groups, ItemKind, Rank};

/// Error when a render key names nothing drawable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PanelError {
    #[error("unknown weekly boss '{0}'")]
    UnknownBoss(String),
    #[error("no weekly boss has any materials")]
    NoBosses,
}

/// Turns schedules into panels for one data directory.
#[derive(Debug, Clone)]
pub struct PanelBuilder {
    data_dir: PathBuf,
    skip_three: bool,
}

impl PanelBuilder {
    pub fn new(config: &AppConfig) -> Self {
        Self { data_dir: config.data_dir().to_path_buf(), skip_three: config.render.skip_three }
    }

    /// Panels for `key`, each paired with its own cache key. A combined key
    /// yields one panel per part.
    pub fn for_key(
        &self,
        config: &CanonicalConfig,
        key: &RenderKey,
    ) -> Result<Vec<(RenderKey, Panel)>, PanelError> {
        match key {
            RenderKey::Daily { day, part } => Ok(part
                .kinds()
                .iter()
                .map(|kind| {
                    let key = RenderKey::Daily { day: *day, part: DailyPart::from(*kind) };
                    (key, self.daily(config, *day, *kind))
                })
                .collect()),
            RenderKey::Boss(boss) => self
                .boss(config, boss)
                .map(|panel| vec![(key.clone(), panel)])
                .ok_or_else(|| PanelError::UnknownBoss(boss.clone())),
            RenderKey::WeeklyAll => {
                let panels: Vec<(RenderKey, Panel)> = config
                    .weekly
                    .keys()
                    .filter_map(|boss| Some((RenderKey::Boss(boss.clone()), self.boss(config, boss)?)))
                    .collect();
                if panels.is_empty() {
                    Err(PanelError::NoBosses)
                } else {
                    Ok(panels)
                }
            }
        }
    }

    /// Daily panel of one kind.
    pub fn daily(&self, config: &CanonicalConfig, day: DayBucket, kind: ItemKind) -> Panel {
        let banner = self.data_dir.join(AssetCategory::Draw.dir_name()).join(format!("{}.png", kind));
        let (title, group_rank) = match kind {
            ItemKind::Avatar => ("今日天赋培养材料", Rank::Four),
            ItemKind::Weapon => ("今日武器突破材料", Rank::Five),
        };
        let drop_rank = self.skip_three.then_some(Rank::Three);

        Panel {
            header: PanelHeader {
                title: title.to_string(),
                banner: banner.is_file().then_some(banner),
            },
            layout: PanelLayout::Daily,
            groups: self.groups(config.daily(kind).day(day), kind.into(), group_rank, drop_rank),
        }
    }

    /// Weekly panel of one boss; `None` when the boss is unknown or has no
    /// consumers at all.
    pub fn boss(&self, config: &CanonicalConfig, boss: &str) -> Option<Panel> {
        let groups = self.groups(config.weekly.get(boss)?, AssetCategory::Avatar, Rank::Five, None);
        if groups.is_empty() {
            return None;
        }
        Some(Panel {
            header: PanelHeader { title: boss.to_string(), banner: None },
            layout: PanelLayout::Weekly,
            groups,
        })
    }

    fn groups(
        &self,
        source: &Groups,
        tiles_from: AssetCategory,
        group_rank: Rank,
        drop_rank: Option<Rank>,
    ) -> Vec<TileGroup> {
        source
            .iter()
            .filter_map(|(key, group)| {
                let group = match drop_rank {
                    Some(rank) => group.without_rank(rank),
                    None => group.clone(),
                };
                if group.is_empty() {
                    return None;
                }
                Some(TileGroup {
                    title: key.name.clone(),
                    rank: group_rank,
                    icon: Some(icon_path(&self.data_dir, AssetCategory::Item, key.id)),
                    tiles: group
                        .entries()
                        .iter()
                        .map(|entry| Tile {
                            label: entry.name.clone(),
                            rank: entry.rank,
                            icon: Some(icon_path(&self.data_dir, tiles_from, entry.id)),
                        })
                        .collect(),
                })
            })
            .collect()
    }
}

fn icon_path(data_dir: &Path, category: AssetCategory, id: u32) -> PathBuf {
    data_dir.join(category.dir_name()).join(icon_filename(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailySchedule, MaterialEntry, MaterialGroup, MaterialKey, WeeklySchedule};
    use tempfile::TempDir;

    fn config() -> CanonicalConfig {
        let mut weapon = DailySchedule::new();
        weapon.day_mut(DayBucket::TueFri).insert(
            MaterialKey::new("狮牙斗士的理想", 114004),
            MaterialGroup::from_entries(vec![
                MaterialEntry::new(Rank::Three, "冷刃", 11301),
                MaterialEntry::new(Rank::Five, "风鹰剑", 11501),
            ]),
        );
        weapon.day_mut(DayBucket::TueFri).insert(
            MaterialKey::new("漆黑陨铁的一块", 114013),
            MaterialGroup::from_entries(vec![MaterialEntry::new(Rank::Three, "黎明神剑", 11302)]),
        );

        let mut weekly = WeeklySchedule::new();
        let mut wolf = Groups::new();
        wolf.insert(
            MaterialKey::new("北风之尾", 113004),
            MaterialGroup::from_entries(vec![MaterialEntry::new(Rank::Five, "琴", 10000003)]),
        );
        wolf.insert(MaterialKey::new("北风之环", 113005), MaterialGroup::new());
        weekly.insert("安德留斯".to_string(), wolf);
        let mut empty = Groups::new();
        empty.insert(MaterialKey::new("未知素材", 113040), MaterialGroup::new());
        weekly.insert("？？？".to_string(), empty);

        CanonicalConfig { avatar: DailySchedule::new(), weapon, weekly, time: 0 }
    }

    fn builder(root: &Path, skip_three: bool) -> PanelBuilder {
        let mut app = AppConfig::with_data_dir(root);
        app.render.skip_three = skip_three;
        PanelBuilder::new(&app)
    }

    #[test]
    fn test_skip_three_drops_entries_and_empty_groups() {
        let temp = TempDir::new().expect("should create temp dir");
        let panel = builder(temp.path(), true).daily(&config(), DayBucket::TueFri, ItemKind::Weapon);
        assert_eq!(panel.groups.len(), 1);
        assert_eq!(panel.groups[0].tiles.len(), 1);
        assert_eq!(panel.groups[0].tiles[0].label, "风鹰剑");
        assert_eq!(
            panel.groups[0].tiles[0].icon,
            Some(temp.path().join("weapon").join("11501.png"))
        );
        assert_eq!(panel.groups[0].icon, Some(temp.path().join("item").join("114004.png")));
    }

    #[test]
    fn test_keep_three_when_disabled() {
        let temp = TempDir::new().expect("should create temp dir");
        let panel = builder(temp.path(), false).daily(&config(), DayBucket::TueFri, ItemKind::Weapon);
        assert_eq!(panel.tile_count(), 3);
    }

    #[test]
    fn test_banner_used_when_present() {
        let temp = TempDir::new().expect("should create temp dir");
        let b = builder(temp.path(), true);
        assert_eq!(b.daily(&config(), DayBucket::MonThu, ItemKind::Avatar).header.banner, None);

        std::fs::create_dir_all(temp.path().join("draw")).unwrap();
        std::fs::write(temp.path().join("draw").join("avatar.png"), b"png").unwrap();
        let panel = b.daily(&config(), DayBucket::MonThu, ItemKind::Avatar);
        assert_eq!(panel.header.banner, Some(temp.path().join("draw").join("avatar.png")));
    }

    #[test]
    fn test_daily_all_yields_two_keyed_panels() {
        let temp = TempDir::new().expect("should create temp dir");
        let key = RenderKey::Daily { day: DayBucket::TueFri, part: DailyPart::All };
        let panels = builder(temp.path(), true).for_key(&config(), &key).unwrap();
        let keys: Vec<String> = panels.iter().map(|(k, _)| k.file_name()).collect();
        assert_eq!(keys, vec!["day2.avatar.png", "day2.weapon.png"]);
    }

    #[test]
    fn test_weekly_skips_empty_bosses() {
        let temp = TempDir::new().expect("should create temp dir");
        let b = builder(temp.path(), true);
        let panels = b.for_key(&config(), &RenderKey::WeeklyAll).unwrap();
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].0, RenderKey::Boss("安德留斯".to_string()));
        assert_eq!(panels[0].1.groups.len(), 1);

        let err = b.for_key(&config(), &RenderKey::Boss("？？？".to_string())).unwrap_err();
        assert_eq!(err, PanelError::UnknownBoss("？？？".to_string()));
    }
}
