//! Trigger window value type

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A time window centered on `timestamp` with symmetric half-width
/// `timespan_secs`.
///
/// Equality is value-based: two records with the same timestamp and timespan
/// are the same trigger, which drives dedup both in the per-directory cache
/// and on the event's match attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub timestamp: DateTime<Utc>,
    pub timespan_secs: i64,
}

impl TriggerRecord {
    pub fn new(timestamp: DateTime<Utc>, timespan_secs: i64) -> Self {
        Self {
            timestamp,
            // timespan is a half-width, never negative
            timespan_secs: timespan_secs.max(0),
        }
    }

    pub fn window_start(&self) -> DateTime<Utc> {
        self.timestamp - Duration::seconds(self.timespan_secs)
    }

    pub fn window_end(&self) -> DateTime<Utc> {
        self.timestamp + Duration::seconds(self.timespan_secs)
    }

    /// Containment test, inclusive at both bounds
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.window_start() <= ts && ts <= self.window_end()
    }
}

/// Coerce a raw timespan string leniently: leading digits
/// parse, anything else is 0. Negative values clamp to 0.
pub fn parse_timespan_lossy(raw: &str) -> i64 {
    let s = raw.trim();
    let rest = s.strip_prefix('-').or_else(|| s.strip_prefix('+')).unwrap_or(s);
    let negative = s.starts_with('-');

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let value = digits.parse::<i64>().unwrap_or(0);

    if negative {
        0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn trigger_at(secs: i64, timespan: i64) -> TriggerRecord {
        TriggerRecord::new(Utc.timestamp_opt(secs, 0).unwrap(), timespan)
    }

    #[test]
    fn test_containment_inclusive_at_both_bounds() {
        let trigger = trigger_at(1000, 60);

        assert!(trigger.contains(Utc.timestamp_opt(940, 0).unwrap())); // exactly start
        assert!(trigger.contains(Utc.timestamp_opt(1000, 0).unwrap())); // center
        assert!(trigger.contains(Utc.timestamp_opt(1060, 0).unwrap())); // exactly end
        assert!(!trigger.contains(Utc.timestamp_opt(939, 0).unwrap()));
        assert!(!trigger.contains(Utc.timestamp_opt(1061, 0).unwrap()));
    }

    #[test]
    fn test_zero_timespan_degenerates_to_instant() {
        let trigger = trigger_at(1000, 0);

        assert!(trigger.contains(Utc.timestamp_opt(1000, 0).unwrap()));
        assert!(!trigger.contains(Utc.timestamp_opt(999, 0).unwrap()));
        assert!(!trigger.contains(Utc.timestamp_opt(1001, 0).unwrap()));
    }

    #[test]
    fn test_negative_timespan_clamped() {
        let trigger = trigger_at(1000, -30);
        assert_eq!(trigger.timespan_secs, 0);
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(trigger_at(1000, 60), trigger_at(1000, 60));
        assert_ne!(trigger_at(1000, 60), trigger_at(1000, 30));
        assert_ne!(trigger_at(1000, 60), trigger_at(1001, 60));
    }

    #[test]
    fn test_timespan_coercion() {
        assert_eq!(parse_timespan_lossy("60"), 60);
        assert_eq!(parse_timespan_lossy(" 30 "), 30);
        assert_eq!(parse_timespan_lossy("30abc"), 30);
        assert_eq!(parse_timespan_lossy("abc"), 0);
        assert_eq!(parse_timespan_lossy(""), 0);
        assert_eq!(parse_timespan_lossy("-15"), 0);
    }
}
