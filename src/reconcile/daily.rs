//! Daily domain schedules.
//!
//! Only Monday to Wednesday are read; the upstream table repeats them on
//! Thursday to Saturday. Domains are ordered by region, with three weapon
//! domains whose region ordinal upstream is wrong pinned to the first region.

use crate::assets::AssetCategory;
use crate::models::{
    is_plain_id, Catalog, DailySchedule, DayBucket, Dungeon, ItemKind, MaterialEntry,
    MaterialGroup, MaterialKey, Rank, Recipe, Upstream,
};
use indexmap::IndexMap;

use super::AssetList;

/// Substring marking talent (character) domains.
pub const AVATAR_DOMAIN_MARK: &str = "精通秘境";

/// Weapon domains displayed in the first region slot.
pub const FIRST_REGION_DOMAINS: [&str; 3] = ["塞西莉亚苗圃", "震雷连山密宫", "砂流之庭"];

/// Region ordinal used for display order.
pub fn region_ordinal(dungeon: &Dungeon) -> u32 {
    if FIRST_REGION_DOMAINS.iter().any(|name| dungeon.name.contains(name)) {
        1
    } else {
        dungeon.city
    }
}

/// Whether a domain drops talent or weapon ascension materials.
pub fn dungeon_kind(dungeon: &Dungeon) -> ItemKind {
    if dungeon.name.contains(AVATAR_DOMAIN_MARK) {
        ItemKind::Avatar
    } else {
        ItemKind::Weapon
    }
}

/// Build the avatar and weapon schedules.
pub(crate) fn build_daily(
    upstream: &Upstream,
    assets: &mut AssetList,
) -> (DailySchedule, DailySchedule) {
    let mut avatar = DailySchedule::new();
    let mut weapon = DailySchedule::new();

    for (weekday, dungeons) in &upstream.dungeons {
        let Some(day) = DayBucket::from_weekday_key(weekday) else {
            continue;
        };

        let mut ordered: Vec<&Dungeon> = dungeons.values().collect();
        ordered.sort_by_key(|d| region_ordinal(d));

        for dungeon in ordered {
            let kind = dungeon_kind(dungeon);
            let Some((key, group)) = build_group(upstream, dungeon, kind, assets) else {
                continue;
            };
            let target = match kind {
                ItemKind::Avatar => avatar.day_mut(day),
                ItemKind::Weapon => weapon.day_mut(day),
            };
            if target.contains_key(&key) {
                tracing::warn!(day = %day, material = %key, "Duplicate material in one day, skipping");
                continue;
            }
            target.insert(key, group);
        }
    }

    (avatar, weapon)
}

fn build_group(
    upstream: &Upstream,
    dungeon: &Dungeon,
    kind: ItemKind,
    assets: &mut AssetList,
) -> Option<(MaterialKey, MaterialGroup)> {
    let Some(material_id) = dungeon.reward_material() else {
        tracing::warn!(dungeon = %dungeon.name, "Domain has no reward, skipping");
        return None;
    };
    let id_key = material_id.to_string();
    let Some(material) = upstream.materials.get(&id_key) else {
        tracing::warn!(dungeon = %dungeon.name, material_id, "Reward material not in catalog, skipping");
        return None;
    };
    let Ok(material_id) = u32::try_from(material_id) else {
        tracing::warn!(material_id, "Material id out of range, skipping");
        return None;
    };
    assets.add_icon(AssetCategory::Item, material_id, material);

    let (recipes, catalog) = match kind {
        ItemKind::Avatar => (&upstream.upgrade.avatar, &upstream.avatars),
        ItemKind::Weapon => (&upstream.upgrade.weapon, &upstream.weapons),
    };
    let entries = consumers(recipes, catalog, &id_key, kind, assets);

    Some((MaterialKey::new(material.name.clone(), material_id), MaterialGroup::from_entries(entries)))
}

/// Characters or weapons whose recipe uses `material_id`, in upgrade-table order.
fn consumers(
    recipes: &IndexMap<String, Recipe>,
    catalog: &Catalog,
    material_id: &str,
    kind: ItemKind,
    assets: &mut AssetList,
) -> Vec<MaterialEntry> {
    recipes
        .iter()
        .filter(|(id, recipe)| is_plain_id(id) && recipe.uses(material_id))
        .filter_map(|(id, _)| {
            let item = catalog.get(id)?;
            let rank = Rank::from_stars(item.rank)?;
            let id: u32 = id.parse().ok()?;
            if let Err(e) = MaterialEntry::check_name(&item.name) {
                tracing::warn!(id, error = %e, "Name cannot be stored, skipping");
                return None;
            }
            assets.add_icon(kind.into(), id, item);
            Some(MaterialEntry::new(rank, item.name.clone(), id))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Catalog, CatalogItem, UpgradeTable};

    fn dungeon(name: &str, reward: u64, city: u32) -> Dungeon {
        Dungeon { name: name.to_string(), reward: vec![202, reward], city }
    }

    fn catalog(items: &[(&str, &str, u64)]) -> Catalog {
        Catalog {
            items: items
                .iter()
                .map(|(id, name, rank)| {
                    (
                        id.to_string(),
                        CatalogItem {
                            name: name.to_string(),
                            rank: *rank,
                            icon: format!("UI_{}", id),
                            kind: String::new(),
                        },
                    )
                })
                .collect(),
        }
    }

    fn recipe(material: &str) -> Recipe {
        Recipe { items: [(material.to_string(), 9)].into_iter().collect() }
    }

    fn upstream() -> Upstream {
        let mut monday = IndexMap::new();
        monday.insert("4231".to_string(), dungeon("炼武秘境：震雷连山密宫", 114037, 3));
        monday.insert("4210".to_string(), dungeon("精通秘境：忘却之峡", 104303, 1));
        monday.insert("4230".to_string(), dungeon("炼武秘境：塞西莉亚苗圃", 114004, 2));
        let mut dungeons = IndexMap::new();
        dungeons.insert("monday".to_string(), monday);
        dungeons.insert("thursday".to_string(), IndexMap::new());

        let mut upgrade = UpgradeTable::default();
        upgrade.avatar.insert("10000045".to_string(), recipe("104303"));
        upgrade.avatar.insert("10000003".to_string(), recipe("104303"));
        upgrade.avatar.insert("10000005-anemo".to_string(), recipe("104303"));
        upgrade.avatar.insert("10000099".to_string(), recipe("104303"));
        upgrade.weapon.insert("11501".to_string(), recipe("114004"));
        upgrade.weapon.insert("11301".to_string(), recipe("114004"));
        upgrade.weapon.insert("11401".to_string(), recipe("114037"));

        Upstream {
            dungeons,
            upgrade,
            avatars: catalog(&[
                ("10000045", "罗莎莉亚", 4),
                ("10000003", "琴", 5),
                ("10000005-anemo", "旅行者", 5),
            ]),
            weapons: catalog(&[("11501", "风鹰剑", 5), ("11301", "冷刃", 3), ("11401", "西风剑", 4)]),
            materials: catalog(&[
                ("104303", "「自由」的哲学", 4),
                ("114004", "狮牙斗士的理想", 5),
                ("114037", "远海夷地的金枝", 5),
            ]),
        }
    }

    #[test]
    fn test_pinned_domains_sort_first() {
        let d = dungeon("炼武秘境：砂流之庭", 1, 4);
        assert_eq!(region_ordinal(&d), 1);
        assert_eq!(region_ordinal(&dungeon("炼武秘境：有顶塔", 1, 4)), 4);
    }

    #[test]
    fn test_domain_kind() {
        assert_eq!(dungeon_kind(&dungeon("精通秘境：忘却之峡", 1, 1)), ItemKind::Avatar);
        assert_eq!(dungeon_kind(&dungeon("炼武秘境：塞西莉亚苗圃", 1, 1)), ItemKind::Weapon);
    }

    #[test]
    fn test_build_daily_groups() {
        let mut assets = AssetList::default();
        let (avatar, weapon) = build_daily(&upstream(), &mut assets);

        let day1 = avatar.day(DayBucket::MonThu);
        let group = &day1[&MaterialKey::new("「自由」的哲学", 104303)];
        // Rank-sorted; variant ids and unknown ids are skipped
        assert_eq!(group.to_string(), "5琴10000003,4罗莎莉亚10000045");

        // Both weapon domains end up in region 1; ties keep upstream order
        let keys: Vec<String> = weapon.day(DayBucket::MonThu).keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["远海夷地的金枝-114037", "狮牙斗士的理想-114004"]);

        assert!(avatar.day(DayBucket::TueFri).is_empty());
        assert!(weapon.day(DayBucket::WedSat).is_empty());
    }

    #[test]
    fn test_same_reward_twice_in_one_day() {
        let mut data = upstream();
        let monday = data.dungeons.get_mut("monday").unwrap();
        monday.insert("4211".to_string(), dungeon("精通秘境：忘却之峡（复刻）", 104303, 2));
        let rewards: std::collections::BTreeSet<u64> =
            monday.values().filter_map(|d| d.reward_material()).collect();
        assert_eq!(rewards.len(), 3);

        let mut assets = AssetList::default();
        let (avatar, weapon) = build_daily(&data, &mut assets);
        let avatar_day = avatar.day(DayBucket::MonThu);
        let weapon_day = weapon.day(DayBucket::MonThu);

        assert_eq!(avatar_day.len(), 1);
        assert_eq!(
            avatar_day[&MaterialKey::new("「自由」的哲学", 104303)].to_string(),
            "5琴10000003,4罗莎莉亚10000045"
        );
        let mut ids: Vec<u64> = avatar_day.keys().chain(weapon_day.keys()).map(|k| u64::from(k.id)).collect();
        ids.sort_unstable();
        assert_eq!(ids, rewards.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_unstorable_names_skipped() {
        let mut data = upstream();
        data.avatars.items.get_mut("10000045").unwrap().name = "罗莎莉亚2".to_string();
        data.weapons.items.get_mut("11301").unwrap().name = "冷刃,改".to_string();
        let mut assets = AssetList::default();
        let (avatar, weapon) = build_daily(&data, &mut assets);
        assert_eq!(avatar.day(DayBucket::MonThu)[&MaterialKey::new("「自由」的哲学", 104303)].to_string(), "5琴10000003");
        assert_eq!(weapon.day(DayBucket::MonThu)[&MaterialKey::new("狮牙斗士的理想", 114004)].to_string(), "5风鹰剑11501");
    }

    #[test]
    fn test_build_daily_collects_icons() {
        let mut assets = AssetList::default();
        build_daily(&upstream(), &mut assets);
        let files: Vec<String> = assets
            .into_vec()
            .into_iter()
            .map(|r| format!("{}/{}", r.category.dir_name(), r.filename))
            .collect();
        assert!(files.contains(&"item/104303.png".to_string()));
        assert!(files.contains(&"avatar/10000003.png".to_string()));
        assert!(files.contains(&"weapon/11301.png".to_string()));
    }

    #[test]
    fn test_missing_material_skips_domain() {
        let mut data = upstream();
        data.materials.items.shift_remove("104303");
        let mut assets = AssetList::default();
        let (avatar, _) = build_daily(&data, &mut assets);
        assert!(avatar.day(DayBucket::MonThu).is_empty());
    }
}
