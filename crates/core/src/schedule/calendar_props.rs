//! Property-based tests for billing-cycle calendar rules.

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;

use super::calendar::{closes_on, days_in_month, due_date_for};

/// Strategy for dates between 2000 and 2099.
fn any_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=31).prop_filter_map("valid date", |(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d)
    })
}

proptest! {
    /// The due date always lands in the month after closing.
    #[test]
    fn test_due_date_is_next_month(closing in any_date(), due_day in 1i16..=31) {
        let due = due_date_for(closing, due_day).unwrap();

        let expected_month = if closing.month() == 12 { 1 } else { closing.month() + 1 };
        let expected_year = if closing.month() == 12 { closing.year() + 1 } else { closing.year() };
        prop_assert_eq!(due.month(), expected_month);
        prop_assert_eq!(due.year(), expected_year);
    }

    /// The due day is kept when it exists, otherwise clamped to the last day.
    #[test]
    fn test_due_day_clamped(closing in any_date(), due_day in 1i16..=31) {
        let due = due_date_for(closing, due_day).unwrap();
        let last = days_in_month(due.year(), due.month()).unwrap();
        let wanted = u32::try_from(due_day).unwrap();

        prop_assert_eq!(due.day(), wanted.min(last));
    }

    /// Every closing day fires exactly once per month.
    #[test]
    fn test_each_closing_day_fires_once_a_month(
        year in 2000i32..2100,
        month in 1u32..=12,
        closing_day in 1i16..=31,
    ) {
        let last = days_in_month(year, month).unwrap();
        let fired = (1..=last)
            .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
            .filter(|d| closes_on(closing_day, *d))
            .count();

        prop_assert_eq!(fired, 1);
    }
}
