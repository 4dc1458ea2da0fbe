//! Chat selector language and game-day resolution.

use chrono::{Datelike, NaiveDateTime};

use crate::cache::DailyPart;
use crate::models::DayBucket;
use crate::reconcile::weekly::boss_for_alias;

/// What image a user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Today's daily materials
    Daily(DailyPart),
    /// One weekly boss, by id
    Boss(String),
    /// Every weekly boss
    WeeklyAll,
    /// Forced redraw of today's combined daily image
    Update,
}

/// A parsed chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Query(Query),
    Subscribe,
    Unsubscribe,
}

/// Parse the argument text that follows the trigger command.
///
/// Returns `None` for anything unrecognized; such messages get no reply.
pub fn parse_selector(text: &str) -> Option<Selector> {
    let text = text.trim();
    match text {
        "订阅删除" => return Some(Selector::Unsubscribe),
        "订阅" => return Some(Selector::Subscribe),
        "" => return Some(Selector::Query(Query::Daily(DailyPart::All))),
        _ => {}
    }

    let query = if let Some(boss) = boss_for_alias(text) {
        Query::Boss(boss.to_string())
    } else if text.contains("周本") {
        Query::WeeklyAll
    } else if text.contains("天赋") || text.contains("角色") {
        Query::Daily(DailyPart::Avatar)
    } else if text.contains("武器") {
        Query::Daily(DailyPart::Weapon)
    } else {
        return None;
    };
    Some(Selector::Query(query))
}

/// Day bucket open at `now` (local time), or `None` on Sunday when every
/// domain is open. The game day rolls over at 04:00.
pub fn daily_bucket(now: NaiveDateTime) -> Option<DayBucket> {
    let game_day = (now - chrono::Duration::hours(4)).date();
    match game_day.weekday().num_days_from_monday() {
        6 => None,
        n => DayBucket::from_number((n % 3) as u8 + 1),
    }
}
