//! Look-back windows such as `"30 days"` used by the analytics tools.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};

use crate::CoreError;

const HOURS_PER_DAY: i64 = 24;
const DAYS_PER_WEEK: i64 = 7;
/// Months are treated as a flat 30 days.
const DAYS_PER_MONTH: i64 = 30;
/// Upper bound keeps `now - window` far away from chrono's representable range.
const MAX_HOURS: i64 = 100 * 365 * HOURS_PER_DAY;

/// A positive look-back window, stored as whole hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    hours: i64,
}

impl TimeRange {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTimeRange`] if `days` is not positive.
    pub fn days(days: i64) -> Result<Self, CoreError> {
        Self::hours(days.saturating_mul(HOURS_PER_DAY))
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTimeRange`] if `hours` is not positive or
    /// exceeds a century.
    pub fn hours(hours: i64) -> Result<Self, CoreError> {
        if hours <= 0 || hours > MAX_HOURS {
            return Err(CoreError::InvalidTimeRange(format!("{hours} hours")));
        }
        Ok(Self { hours })
    }

    #[must_use]
    pub fn as_duration(&self) -> Duration {
        Duration::hours(self.hours)
    }

    /// The inclusive lower bound of the window ending at `now`.
    #[must_use]
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.as_duration()
    }
}

impl FromStr for TimeRange {
    type Err = CoreError;

    /// Accepts `"<n>"` (days) or `"<n> <unit>"` where unit is one of
    /// `hour(s)`, `day(s)`, `week(s)`, `month(s)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidTimeRange(s.to_string());
        let mut parts = s.split_whitespace();
        let amount: i64 = parts
            .next()
            .ok_or_else(invalid)?
            .parse()
            .map_err(|_| invalid())?;
        let unit = parts.next().map(str::to_lowercase);
        if parts.next().is_some() {
            return Err(invalid());
        }

        let hours = match unit.as_deref() {
            None | Some("day" | "days") => amount.checked_mul(HOURS_PER_DAY),
            Some("hour" | "hours") => Some(amount),
            Some("week" | "weeks") => amount.checked_mul(HOURS_PER_DAY * DAYS_PER_WEEK),
            Some("month" | "months") => amount.checked_mul(HOURS_PER_DAY * DAYS_PER_MONTH),
            Some(_) => None,
        }
        .ok_or_else(invalid)?;

        Self::hours(hours).map_err(|_| invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_days() {
        assert_eq!("30 days".parse::<TimeRange>(), TimeRange::days(30));
        assert_eq!("1 day".parse::<TimeRange>(), TimeRange::days(1));
    }

    #[test]
    fn bare_number_means_days() {
        assert_eq!("7".parse::<TimeRange>(), TimeRange::days(7));
    }

    #[test]
    fn parses_other_units() {
        assert_eq!("12 hours".parse::<TimeRange>(), TimeRange::hours(12));
        assert_eq!("2 weeks".parse::<TimeRange>(), TimeRange::days(14));
        assert_eq!("3 months".parse::<TimeRange>(), TimeRange::days(90));
        assert_eq!("1 Month".parse::<TimeRange>(), TimeRange::days(30));
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<TimeRange>().is_err());
        assert!("thirty days".parse::<TimeRange>().is_err());
        assert!("30 fortnights".parse::<TimeRange>().is_err());
        assert!("30 days ago".parse::<TimeRange>().is_err());
    }

    #[test]
    fn rejects_non_positive() {
        assert!("0 days".parse::<TimeRange>().is_err());
        assert!("-5 days".parse::<TimeRange>().is_err());
    }

    #[test]
    fn rejects_overflowing_amounts() {
        assert!("9223372036854775807 months".parse::<TimeRange>().is_err());
        assert!("2000 months".parse::<TimeRange>().is_err());
    }

    #[test]
    fn since_subtracts_window() {
        let now = Utc::now();
        let range = TimeRange::days(30).expect("valid");
        assert_eq!(now - range.since(now), Duration::days(30));
    }
}
