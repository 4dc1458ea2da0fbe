//! Daily and weekly schedules and the persisted canonical config.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::entry::{MaterialGroup, MaterialKey};

/// Materials of one bucket (or one boss), in display order.
pub type Groups = IndexMap<MaterialKey, MaterialGroup>;

/// Kind of item a material is consumed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Avatar,
    Weapon,
}

impl ItemKind {
    pub const ALL: [ItemKind; 2] = [ItemKind::Avatar, ItemKind::Weapon];

    /// Name used for directories, cache files and config keys.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Avatar => "avatar",
            ItemKind::Weapon => "weapon",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weekday pair on which a set of domains is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DayBucket {
    /// Monday and Thursday
    MonThu,
    /// Tuesday and Friday
    TueFri,
    /// Wednesday and Saturday
    WedSat,
}

impl DayBucket {
    pub const ALL: [DayBucket; 3] = [DayBucket::MonThu, DayBucket::TueFri, DayBucket::WedSat];

    pub fn number(self) -> u8 {
        match self {
            DayBucket::MonThu => 1,
            DayBucket::TueFri => 2,
            DayBucket::WedSat => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<DayBucket> {
        match n {
            1 => Some(DayBucket::MonThu),
            2 => Some(DayBucket::TueFri),
            3 => Some(DayBucket::WedSat),
            _ => None,
        }
    }

    /// Bucket for an upstream weekday key. Thursday to Saturday repeat the
    /// first three days and are not mapped.
    pub fn from_weekday_key(key: &str) -> Option<DayBucket> {
        match key {
            "monday" => Some(DayBucket::MonThu),
            "tuesday" => Some(DayBucket::TueFri),
            "wednesday" => Some(DayBucket::WedSat),
            _ => None,
        }
    }
}

impl fmt::Display for DayBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl Serialize for DayBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayBucket {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<u8>()
            .ok()
            .and_then(DayBucket::from_number)
            .ok_or_else(|| de::Error::custom(format!("unknown day bucket '{}'", raw)))
    }
}

/// Material groups for each of the three day buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<DayBucket, Groups>", into = "BTreeMap<DayBucket, Groups>")]
pub struct DailySchedule {
    days: BTreeMap<DayBucket, Groups>,
}

impl DailySchedule {
    /// Schedule with three empty buckets.
    pub fn new() -> Self {
        Self { days: DayBucket::ALL.iter().map(|d| (*d, Groups::new())).collect() }
    }

    pub fn day(&self, day: DayBucket) -> &Groups {
        // All three buckets exist by construction
        &self.days[&day]
    }

    pub fn day_mut(&mut self, day: DayBucket) -> &mut Groups {
        self.days.entry(day).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DayBucket, &Groups)> {
        self.days.iter().map(|(d, g)| (*d, g))
    }
}

impl Default for DailySchedule {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<BTreeMap<DayBucket, Groups>> for DailySchedule {
    type Error = String;

    fn try_from(days: BTreeMap<DayBucket, Groups>) -> Result<Self, Self::Error> {
        if days.len() != DayBucket::ALL.len() {
            return Err(format!("expected 3 day buckets, found {}", days.len()));
        }
        Ok(Self { days })
    }
}

impl From<DailySchedule> for BTreeMap<DayBucket, Groups> {
    fn from(schedule: DailySchedule) -> Self {
        schedule.days
    }
}

/// Id of the synthetic boss holding materials of unreleased bosses.
pub const UNRELEASED_BOSS: &str = "？？？";

/// Material groups per weekly boss, in boss-table order.
pub type WeeklySchedule = IndexMap<String, Groups>;

/// The persisted source of truth, `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalConfig {
    pub avatar: DailySchedule,
    pub weapon: DailySchedule,
    #[serde(default)]
    pub weekly: WeeklySchedule,
    /// Unix timestamp of the refresh that produced this config
    pub time: i64,
}

impl CanonicalConfig {
    pub fn daily(&self, kind: ItemKind) -> &DailySchedule {
        match kind {
            ItemKind::Avatar => &self.avatar,
            ItemKind::Weapon => &self.weapon,
        }
    }

    /// Whether the daily half differs from `other`. Group order counts, since
    /// it is the order the panels draw in.
    pub fn daily_differs(&self, other: &CanonicalConfig) -> bool {
        !daily_eq(&self.avatar, &other.avatar) || !daily_eq(&self.weapon, &other.weapon)
    }

    /// Whether the weekly half differs from `other`, boss and group order
    /// included.
    pub fn weekly_differs(&self, other: &CanonicalConfig) -> bool {
        let (a, b) = (&self.weekly, &other.weekly);
        a.len() != b.len()
            || a.iter().zip(b).any(|((boss_a, groups_a), (boss_b, groups_b))| {
                boss_a != boss_b || !groups_eq(groups_a, groups_b)
            })
    }
}

/// `IndexMap` equality ignores insertion order; this does not.
fn groups_eq(a: &Groups, b: &Groups) -> bool {
    a.iter().eq(b.iter())
}

fn daily_eq(a: &DailySchedule, b: &DailySchedule) -> bool {
    a.days.len() == b.days.len()
        && a.iter().zip(b.iter()).all(|((day_a, groups_a), (day_b, groups_b))| {
            day_a == day_b && groups_eq(groups_a, groups_b)
        })
}
