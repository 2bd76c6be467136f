// Calendar primitives for the availability engine
// Inclusive date ranges, occupied windows and event-date parsing

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Wire format for every date the API accepts or returns
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Days the dress leaves the shop before the event for pickup and fitting
pub const PRE_EVENT_DAYS: u64 = 2;

/// Grace days after the event before the dress has to be back
pub const POST_EVENT_DAYS: u64 = 1;

/// An inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Two inclusive ranges overlap iff `a.start <= b.end && a.end >= b.start`.
    /// Ranges that merely touch on one shared day overlap.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Number of days covered, counting both ends
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// The days a booking for `event_date` keeps the dress out of the shop:
/// `[event_date - 2, event_date + 1]`
pub fn occupied_window(event_date: NaiveDate) -> DateRange {
    DateRange {
        start: event_date
            .checked_sub_days(Days::new(PRE_EVENT_DAYS))
            .unwrap_or(NaiveDate::MIN),
        end: event_date
            .checked_add_days(Days::new(POST_EVENT_DAYS))
            .unwrap_or(NaiveDate::MAX),
    }
}

/// Parse a `YYYY-MM-DD` event date.
///
/// Dates are plain calendar days; no timezone is ever attached, so a date
/// never shifts across midnight on its way through the engine.
pub fn parse_event_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
}

pub fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

/// Same month and day `years` later. Feb 29 rolls over to Mar 1 when the
/// target year is not a leap year.
pub fn add_years(date: NaiveDate, years: i32) -> NaiveDate {
    let year = date.year() + years;
    date.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_occupied_window_spans_buffers() {
        let window = occupied_window(d("2025-06-10"));
        assert_eq!(window, DateRange::new(d("2025-06-08"), d("2025-06-11")));
        assert_eq!(window.len_days(), 4);
    }

    #[test]
    fn test_occupied_window_crosses_year_boundary() {
        let window = occupied_window(d("2026-01-01"));
        assert_eq!(window.start, d("2025-12-30"));
        assert_eq!(window.end, d("2026-01-02"));

        let window = occupied_window(d("2025-12-31"));
        assert_eq!(window.end, d("2026-01-01"));
    }

    #[test]
    fn test_occupied_window_crosses_leap_day() {
        let window = occupied_window(d("2028-03-01"));
        assert_eq!(window.start, d("2028-02-28"));

        let window = occupied_window(d("2028-02-29"));
        assert_eq!(window.end, d("2028-03-01"));
    }

    #[test]
    fn test_touching_ranges_overlap() {
        let a = DateRange::new(d("2025-06-08"), d("2025-06-11"));
        let b = DateRange::new(d("2025-06-11"), d("2025-06-14"));
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_adjacent_ranges_do_not_overlap() {
        let a = DateRange::new(d("2025-06-08"), d("2025-06-11"));
        let b = DateRange::new(d("2025-06-12"), d("2025-06-15"));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_contained_range_overlaps() {
        let outer = DateRange::new(d("2025-06-01"), d("2025-06-30"));
        let inner = DateRange::new(d("2025-06-10"), d("2025-06-10"));
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
        assert!(outer.contains(d("2025-06-30")));
        assert!(!outer.contains(d("2025-07-01")));
    }

    #[test]
    fn test_parse_event_date() {
        assert_eq!(parse_event_date("2025-06-10").unwrap(), d("2025-06-10"));
        assert_eq!(parse_event_date(" 2025-06-10 ").unwrap(), d("2025-06-10"));
        assert!(parse_event_date("10/06/2025").is_err());
        assert!(parse_event_date("2025-02-30").is_err());
        assert!(parse_event_date("").is_err());
    }

    #[test]
    fn test_add_years() {
        assert_eq!(add_years(d("2025-06-10"), 2), d("2027-06-10"));
        assert_eq!(add_years(d("2028-02-29"), 2), d("2030-03-01"));
        assert_eq!(add_years(d("2028-02-29"), 4), d("2032-02-29"));
    }

    fn date_strategy() -> impl Strategy<Value = NaiveDate> {
        // 2000-01-01 plus up to ~55 years
        (0u64..20_000).prop_map(|offset| add_days(d("2000-01-01"), offset))
    }

    fn range_strategy() -> impl Strategy<Value = DateRange> {
        (date_strategy(), 0u64..60).prop_map(|(start, len)| DateRange::new(start, add_days(start, len)))
    }

    proptest! {
        #[test]
        fn prop_overlap_is_symmetric(a in range_strategy(), b in range_strategy()) {
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        #[test]
        fn prop_range_overlaps_itself(a in range_strategy()) {
            prop_assert!(a.overlaps(&a));
        }

        #[test]
        fn prop_overlap_matches_shared_day(a in range_strategy(), b in range_strategy()) {
            let shares_a_day = (0..a.len_days())
                .map(|i| add_days(a.start, i as u64))
                .any(|day| b.contains(day));
            prop_assert_eq!(a.overlaps(&b), shares_a_day);
        }

        #[test]
        fn prop_single_day_windows_clear_after_four_days(event in date_strategy(), gap in 0u64..10) {
            let first = occupied_window(event);
            let second = occupied_window(add_days(event, gap));
            prop_assert_eq!(first.overlaps(&second), gap < 4);
        }
    }
}
