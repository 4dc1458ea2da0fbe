//! Weekly boss drops.
//!
//! Upstream does not say which boss drops which material. Boss materials are
//! listed in release order, three per boss, so the n-th run of three belongs
//! to the n-th boss of [`BOSS_ALIASES`]. Materials past the known bosses go to
//! [`UNRELEASED_BOSS`].

use indexmap::IndexMap;

use crate::assets::AssetCategory;
use crate::models::{
    is_plain_id, CatalogItem, Groups, MaterialEntry, MaterialGroup, MaterialKey, Rank, Upstream,
    WeeklySchedule, UNRELEASED_BOSS,
};

use super::{AssetList, ReconcileError};

/// Known weekly bosses in release order. The first alias is the boss id.
pub const BOSS_ALIASES: [&[&str]; 7] = [
    &["风魔龙·特瓦林", "风魔龙", "特瓦林"],
    &["安德留斯", "北风狼", "狼王"],
    &["「公子」", "公子", "达达利亚"],
    &["若陀龙王", "若陀"],
    &["「女士」", "女士", "罗莎琳"],
    &["祸津御建鸣神命", "雷电将军", "雷神"],
    &["「正机之神」", "正机之神", "散兵", "流浪者"],
];

/// Materials each boss drops.
pub const MATERIALS_PER_BOSS: usize = 3;

/// Material type tag of boss drops (shared with gem stones).
pub const BOSS_MATERIAL_TYPE: &str = "characterLevelUpMaterial";

/// Five-star level-up materials that are not boss drops.
pub const NON_BOSS_MATERIALS: [&str; 8] = [
    "智识之冕",
    "璀璨原钻",
    "燃愿玛瑙",
    "涤净青金",
    "最胜紫晶",
    "自在松石",
    "哀叙冰玉",
    "坚牢黄玉",
];

/// Boss ids in display order, ending with the unreleased bucket.
pub fn boss_ids() -> impl Iterator<Item = &'static str> {
    BOSS_ALIASES.iter().map(|aliases| aliases[0]).chain(std::iter::once(UNRELEASED_BOSS))
}

/// Boss id named by `text`, matching any alias as a substring.
pub fn boss_for_alias(text: &str) -> Option<&'static str> {
    if text.contains(UNRELEASED_BOSS) {
        return Some(UNRELEASED_BOSS);
    }
    BOSS_ALIASES
        .iter()
        .find(|aliases| aliases.iter().any(|alias| text.contains(alias)))
        .map(|aliases| aliases[0])
}

fn is_boss_material(item: &CatalogItem) -> bool {
    item.rank == 5
        && item.kind == BOSS_MATERIAL_TYPE
        && !NON_BOSS_MATERIALS.contains(&item.name.as_str())
}

/// Build the weekly schedule.
pub(crate) fn build_weekly(
    upstream: &Upstream,
    assets: &mut AssetList,
) -> Result<WeeklySchedule, ReconcileError> {
    let candidates: Vec<(u32, &CatalogItem)> = upstream
        .materials
        .items
        .iter()
        .filter(|(_, item)| is_boss_material(item))
        .filter_map(|(id, item)| Some((id.parse::<u32>().ok()?, item)))
        .collect();

    let needed = BOSS_ALIASES.len() * MATERIALS_PER_BOSS;
    if candidates.len() < needed {
        return Err(ReconcileError::BossMaterials { found: candidates.len(), needed });
    }

    // material id -> (boss id, key)
    let mut owner: IndexMap<String, (&'static str, MaterialKey)> = IndexMap::new();
    let mut weekly = WeeklySchedule::new();
    for (index, (id, item)) in candidates.iter().enumerate() {
        let boss = BOSS_ALIASES
            .get(index / MATERIALS_PER_BOSS)
            .map_or(UNRELEASED_BOSS, |aliases| aliases[0]);
        let key = MaterialKey::new(item.name.clone(), *id);
        assets.add_icon(AssetCategory::Item, *id, item);
        weekly
            .entry(boss.to_string())
            .or_insert_with(Groups::new)
            .insert(key.clone(), MaterialGroup::new());
        owner.insert(id.to_string(), (boss, key));
    }

    for (avatar_id, recipe) in &upstream.upgrade.avatar {
        if !is_plain_id(avatar_id) {
            continue;
        }
        let Some(avatar) = upstream.avatars.get(avatar_id) else {
            continue;
        };
        let (Some(rank), Ok(id)) = (Rank::from_stars(avatar.rank), avatar_id.parse::<u32>()) else {
            continue;
        };

        // Highest consumption wins; on equal counts the later recipe entry wins.
        let mut best: Option<(&str, u64)> = None;
        for (material_id, count) in &recipe.items {
            if owner.contains_key(material_id) && best.map_or(true, |(_, c)| *count >= c) {
                best = Some((material_id.as_str(), *count));
            }
        }
        let Some((material_id, _)) = best else {
            continue;
        };
        let Some((boss, key)) = owner.get(material_id) else {
            continue;
        };

        if let Err(e) = MaterialEntry::check_name(&avatar.name) {
            tracing::warn!(id, error = %e, "Name cannot be stored, skipping");
            continue;
        }
        if let Some(group) = weekly.get_mut(*boss).and_then(|groups| groups.get_mut(key)) {
            group.push(MaterialEntry::new(rank, avatar.name.clone(), id));
            assets.add_icon(AssetCategory::Avatar, id, avatar);
        }
    }

    Ok(weekly)
}
