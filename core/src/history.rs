use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const STATUS_RUNNING: &str = "RUNNING";

/// One automation run as reported by the guided-engineering service.
/// Fields the ranker does not look at are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationHistoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_ts: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AutomationHistoryEntry {
    pub fn is_running(&self) -> bool {
        self.status.as_deref() == Some(STATUS_RUNNING)
    }

    /// Completion time, if present and parseable.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.completed_ts.as_ref()?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RankingMode {
    /// Running first, then newest completion first; a total, stable order.
    #[default]
    Ordered,
    /// Replays the historical comparator, which is not a total order.
    Legacy,
}

impl FromStr for RankingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ordered" => Ok(RankingMode::Ordered),
            "legacy" => Ok(RankingMode::Legacy),
            other => Err(format!("unknown ranking mode '{other}'")),
        }
    }
}

/// Order history entries for display. Empty input is returned untouched.
pub fn rank(
    mut entries: Vec<AutomationHistoryEntry>,
    mode: RankingMode,
) -> Vec<AutomationHistoryEntry> {
    if entries.is_empty() {
        return entries;
    }
    match mode {
        RankingMode::Ordered => {
            // Parse each timestamp once.
            let mut keyed: Vec<(bool, Option<DateTime<Utc>>, AutomationHistoryEntry)> = entries
                .drain(..)
                .map(|e| (e.is_running(), e.completed_at(), e))
                .collect();
            keyed.sort_by(|a, b| ordered_cmp((a.0, a.1), (b.0, b.1)));
            keyed.into_iter().map(|(_, _, e)| e).collect()
        }
        RankingMode::Legacy => {
            binary_insertion_sort(&mut entries, legacy_cmp);
            entries
        }
    }
}

fn ordered_cmp(
    (a_running, a_done): (bool, Option<DateTime<Utc>>),
    (b_running, b_done): (bool, Option<DateTime<Utc>>),
) -> Ordering {
    match (a_running, b_running) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (true, true) => return Ordering::Equal,
        (false, false) => {}
    }
    match (a_done, b_done) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The comparator history views always used: `a` first when either side is
/// running, newer `a` first otherwise, `b` first on anything unparseable.
pub fn legacy_cmp(a: &AutomationHistoryEntry, b: &AutomationHistoryEntry) -> Ordering {
    if a.is_running() || b.is_running() {
        return Ordering::Less;
    }
    match (a.completed_at(), b.completed_at()) {
        (Some(a_done), Some(b_done)) if a_done > b_done => Ordering::Less,
        _ => Ordering::Greater,
    }
}

/// Stable for consistent comparators and panic-free for inconsistent ones.
/// The element being inserted is always the left operand.
fn binary_insertion_sort<T, F>(items: &mut [T], mut cmp: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let mut left = 0;
        let mut right = i;
        while left < right {
            let mid = left + (right - left) / 2;
            if cmp(&items[i], &items[mid]) == Ordering::Less {
                right = mid;
            } else {
                left = mid + 1;
            }
        }
        items[left..=i].rotate_right(1);
    }
}

/// Accepts RFC 3339, naive `YYYY-MM-DD[ T]HH:MM:SS[.f]` (read as UTC),
/// bare dates and epoch milliseconds.
pub fn parse_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?),
        Value::String(s) => parse_timestamp_str(s.trim()),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)
}
