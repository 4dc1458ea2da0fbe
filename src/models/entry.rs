//! Material entries, keys and groups.
//!
//! A [`MaterialGroup`] is persisted as a single comma-joined string of
//! `{rank}{name}{id}` items, e.g. `"5神里绫华10000002,4罗莎莉亚10000045"`.
//! The id is read from the trailing run of ASCII digits, so character ids
//! (8 digits) and weapon ids (5 digits) parse the same way.

use serde::de::{self, Deserializer, Visitor};
use serde::ser;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error produced when parsing a serialized entry, key or rank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Rank digit outside 3..=5
    #[error("invalid rank '{0}'")]
    Rank(String),
    /// Entry text without a trailing numeric id
    #[error("entry '{0}' has no trailing id")]
    MissingId(String),
    /// Entry text with an empty name
    #[error("entry '{0}' has an empty name")]
    EmptyName(String),
    /// Material key without a `-{id}` suffix
    #[error("material key '{0}' is not of the form name-id")]
    Key(String),
    /// Name that would not survive the string form: empty, ends in an ASCII
    /// digit, or contains a comma
    #[error("name '{0}' cannot be stored in a material group")]
    Name(String),
}

/// Rarity of a character, weapon or material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Three,
    Four,
    Five,
}

impl Rank {
    /// Numeric star count.
    pub fn stars(self) -> u8 {
        match self {
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
        }
    }

    /// Convert a star count. Ranks below 3 or above 5 are not tracked.
    pub fn from_stars(stars: u64) -> Option<Rank> {
        match stars {
            3 => Some(Rank::Three),
            4 => Some(Rank::Four),
            5 => Some(Rank::Five),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stars())
    }
}

impl FromStr for Rank {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .ok()
            .and_then(Rank::from_stars)
            .ok_or_else(|| ParseError::Rank(s.to_string()))
    }
}

/// One character or weapon that consumes a material.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialEntry {
    pub rank: Rank,
    pub name: String,
    pub id: u32,
}

impl MaterialEntry {
    pub fn new(rank: Rank, name: impl Into<String>, id: u32) -> Self {
        Self { rank, name: name.into(), id }
    }

    /// Check that `name` parses back unchanged from `{rank}{name}{id}` inside
    /// a comma-joined group.
    pub fn check_name(name: &str) -> Result<(), ParseError> {
        let ends_in_digit = name.chars().last().is_some_and(|c| c.is_ascii_digit());
        if name.is_empty() || ends_in_digit || name.contains(',') {
            return Err(ParseError::Name(name.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for MaterialEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.rank, self.name, self.id)
    }
}

impl FromStr for MaterialEntry {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let rank_char = chars.next().ok_or_else(|| ParseError::Rank(String::new()))?;
        let rank: Rank = rank_char.to_string().parse()?;
        let rest = chars.as_str();

        let name_end = rest.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        let (name, digits) = rest.split_at(name_end);
        if digits.is_empty() {
            return Err(ParseError::MissingId(s.to_string()));
        }
        if name.is_empty() {
            return Err(ParseError::EmptyName(s.to_string()));
        }
        let id = digits.parse::<u32>().map_err(|_| ParseError::MissingId(s.to_string()))?;

        Ok(MaterialEntry { rank, name: name.to_string(), id })
    }
}

/// Identifies a farmable material: `{name}-{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialKey {
    pub name: String,
    pub id: u32,
}

impl MaterialKey {
    pub fn new(name: impl Into<String>, id: u32) -> Self {
        Self { name: name.into(), id }
    }
}

impl fmt::Display for MaterialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.id)
    }
}

impl FromStr for MaterialKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, id) = s.rsplit_once('-').ok_or_else(|| ParseError::Key(s.to_string()))?;
        let id = id.parse::<u32>().map_err(|_| ParseError::Key(s.to_string()))?;
        if name.is_empty() {
            return Err(ParseError::Key(s.to_string()));
        }
        Ok(MaterialKey { name: name.to_string(), id })
    }
}

impl Serialize for MaterialKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MaterialKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = MaterialKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a material key of the form name-id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MaterialKey, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(KeyVisitor)
    }
}

/// Consumers of one material, kept in rank-descending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialGroup {
    entries: Vec<MaterialEntry>,
}

impl MaterialGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a group from entries in source order; the result is rank-sorted.
    pub fn from_entries(entries: Vec<MaterialEntry>) -> Self {
        let mut group = Self { entries };
        group.sort();
        group
    }

    /// Append an entry at the end, keeping the rank ordering.
    pub fn push(&mut self, entry: MaterialEntry) {
        self.entries.push(entry);
        self.sort();
    }

    /// Stable sort by rank descending; equal ranks keep source order.
    fn sort(&mut self) {
        self.entries.sort_by(|a, b| b.rank.cmp(&a.rank));
    }

    pub fn entries(&self) -> &[MaterialEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of this group without entries of the given rank.
    pub fn without_rank(&self, rank: Rank) -> MaterialGroup {
        MaterialGroup {
            entries: self.entries.iter().filter(|e| e.rank != rank).cloned().collect(),
        }
    }
}

impl fmt::Display for MaterialGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

impl FromStr for MaterialGroup {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(MaterialGroup::new());
        }
        let entries = s.split(',').map(str::parse).collect::<Result<Vec<_>, _>>()?;
        Ok(MaterialGroup::from_entries(entries))
    }
}

impl Serialize for MaterialGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        for entry in &self.entries {
            MaterialEntry::check_name(&entry.name).map_err(ser::Error::custom)?;
        }
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MaterialGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_parse_character_id() {
        let entry: MaterialEntry = "5神里绫华10000002".parse().unwrap();
        assert_eq!(entry, MaterialEntry::new(Rank::Five, "神里绫华", 10000002));
    }

    #[test]
    fn test_entry_parse_weapon_id() {
        let entry: MaterialEntry = "4西风剑11401".parse().unwrap();
        assert_eq!(entry.rank, Rank::Four);
        assert_eq!(entry.name, "西风剑");
        assert_eq!(entry.id, 11401);
    }

    #[test]
    fn test_entry_parse_errors() {
        assert_eq!("2琴10000003".parse::<MaterialEntry>(), Err(ParseError::Rank("2".into())));
        assert_eq!(
            "5琴".parse::<MaterialEntry>(),
            Err(ParseError::MissingId("5琴".into()))
        );
        assert_eq!(
            "510000003".parse::<MaterialEntry>(),
            Err(ParseError::EmptyName("510000003".into()))
        );
    }

    #[test]
    fn test_key_uses_last_dash() {
        let key: MaterialKey = "「自由」的哲学-104303".parse().unwrap();
        assert_eq!(key.name, "「自由」的哲学");
        assert_eq!(key.id, 104303);

        let key: MaterialKey = "a-b-42".parse().unwrap();
        assert_eq!(key.name, "a-b");
        assert!("no-id".parse::<MaterialKey>().is_err());
    }

    #[test]
    fn test_group_sorted_by_rank_stable() {
        let group = MaterialGroup::from_entries(vec![
            MaterialEntry::new(Rank::Four, "香菱", 10000023),
            MaterialEntry::new(Rank::Five, "琴", 10000003),
            MaterialEntry::new(Rank::Four, "班尼特", 10000032),
            MaterialEntry::new(Rank::Five, "迪卢克", 10000016),
        ]);
        let names: Vec<&str> = group.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["琴", "迪卢克", "香菱", "班尼特"]);
    }

    #[test]
    fn test_group_string_form() {
        let group: MaterialGroup = "4香菱10000023,5琴10000003".parse().unwrap();
        assert_eq!(group.to_string(), "5琴10000003,4香菱10000023");
        assert!("".parse::<MaterialGroup>().unwrap().is_empty());
    }

    #[test]
    fn test_group_json_is_comma_string() {
        let group = MaterialGroup::from_entries(vec![
            MaterialEntry::new(Rank::Three, "黎明神剑", 11302),
            MaterialEntry::new(Rank::Five, "风鹰剑", 11501),
        ]);
        let json = serde_json::to_string(&group).unwrap();
        assert_eq!(json, "\"5风鹰剑11501,3黎明神剑11302\"");
        let back: MaterialGroup = serde_json::from_str(&json).unwrap();
        assert_eq!(back, group);
    }

    #[test]
    fn test_unstorable_names_rejected() {
        assert!(MaterialEntry::check_name("神里绫华").is_ok());
        assert_eq!(MaterialEntry::check_name("试作2"), Err(ParseError::Name("试作2".into())));
        assert!(MaterialEntry::check_name("a,b").is_err());
        assert!(MaterialEntry::check_name("").is_err());

        // A trailing digit would merge into the id on the way back
        let entry: MaterialEntry = "4试作210000001".parse().unwrap();
        assert_eq!(entry.name, "试作");

        let digit = MaterialGroup::from_entries(vec![MaterialEntry::new(Rank::Four, "试作2", 10000001)]);
        assert!(serde_json::to_string(&digit).is_err());
        let comma = MaterialGroup::from_entries(vec![MaterialEntry::new(Rank::Four, "a,b", 11401)]);
        assert!(serde_json::to_string(&comma).is_err());
    }

    #[test]
    fn test_without_rank() {
        let group: MaterialGroup = "5风鹰剑11501,3黎明神剑11302".parse().unwrap();
        assert_eq!(group.without_rank(Rank::Three).to_string(), "5风鹰剑11501");
    }
}
