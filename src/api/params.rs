//! Lenient query-string parsing for the read endpoints.
//!
//! Values that are missing or fail to parse fall back to the defaults;
//! they never produce a 400.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::storage::types::{clamp_limit, DEFAULT_LIMIT};

pub const DEFAULT_HOURS: i64 = 24;

/// Raw query parameters, kept as strings so bad input cannot reject the request.
#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    pub hours: Option<String>,
    pub limit: Option<String>,
}

impl WindowParams {
    /// Look-back in hours. Anything below 1 becomes the default.
    pub fn hours(&self) -> i64 {
        self.hours
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|h| *h >= 1)
            .unwrap_or(DEFAULT_HOURS)
    }

    /// Row cap, clamped to the store's bounds.
    pub fn limit(&self) -> u32 {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(|l| clamp_limit(l.clamp(0, i64::from(u32::MAX)) as u32))
            .unwrap_or(DEFAULT_LIMIT)
    }

    /// Start of the window ending now, never earlier than the Unix epoch
    /// (PostgreSQL rejects timestamps chrono can still represent).
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::try_hours(self.hours())
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
            .max(DateTime::<Utc>::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(hours: Option<&str>, limit: Option<&str>) -> WindowParams {
        WindowParams {
            hours: hours.map(String::from),
            limit: limit.map(String::from),
        }
    }

    #[test]
    fn test_defaults() {
        let p = WindowParams::default();
        assert_eq!(p.hours(), 24);
        assert_eq!(p.limit(), 100);
    }

    #[test]
    fn test_explicit_values() {
        let p = params(Some("48"), Some("50"));
        assert_eq!(p.hours(), 48);
        assert_eq!(p.limit(), 50);
    }

    #[test]
    fn test_hours_below_one_reset() {
        assert_eq!(params(Some("0"), None).hours(), 24);
        assert_eq!(params(Some("-5"), None).hours(), 24);
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let p = params(Some("yesterday"), Some("lots"));
        assert_eq!(p.hours(), 24);
        assert_eq!(p.limit(), 100);
    }

    #[test]
    fn test_limit_clamped() {
        assert_eq!(params(None, Some("0")).limit(), 1);
        assert_eq!(params(None, Some("-3")).limit(), 1);
        assert_eq!(params(None, Some("5000")).limit(), 1000);
        assert_eq!(params(None, Some("99999999999")).limit(), 1000);
    }

    #[test]
    fn test_since_window() {
        let now = Utc::now();
        assert_eq!(params(Some("2"), None).since(now), now - TimeDelta::hours(2));
        // Absurd windows saturate instead of overflowing.
        let since = params(Some(&i64::MAX.to_string()), None).since(now);
        assert_eq!(since, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_since_floors_at_epoch_for_huge_windows() {
        let now = Utc::now();
        // Representable in chrono, but older than any stored timestamp can be.
        let since = params(Some("100000000"), None).since(now);
        assert_eq!(since, DateTime::<Utc>::UNIX_EPOCH);
    }
}
