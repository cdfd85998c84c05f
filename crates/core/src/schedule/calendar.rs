//! Calendar rules for closing, due and successor dates.

use chrono::{Datelike, Month, Months, NaiveDate};

/// Number of days in `month` of `year`.
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
        .map(|last| last.day())
}

/// Due date for a cycle closed on `closing_date`.
///
/// Falls on `due_day` of the following month. When that month is shorter
/// than `due_day`, the last day of the month is used instead.
#[must_use]
pub fn due_date_for(closing_date: NaiveDate, due_day: i16) -> Option<NaiveDate> {
    // chrono clamps the day when the target month is shorter.
    let next_month = closing_date.checked_add_months(Months::new(1))?;
    let last_day = days_in_month(next_month.year(), next_month.month())?;
    let day = u32::try_from(due_day).ok()?.clamp(1, last_day);
    next_month.with_day(day)
}

/// Returns true if an invoice with `closing_day` closes on `today`.
///
/// On the last day of a short month, invoices whose closing day does not
/// exist in that month close as well.
#[must_use]
pub fn closes_on(closing_day: i16, today: NaiveDate) -> bool {
    let Ok(closing_day) = u32::try_from(closing_day) else {
        return false;
    };
    if closing_day == today.day() {
        return true;
    }
    let is_last_day = today.succ_opt().is_some_and(|tomorrow| tomorrow.month() != today.month());
    is_last_day && closing_day > today.day()
}

/// Returns true if a closed invoice due on `due_date` is overdue on `today`.
#[must_use]
pub fn is_past_due(due_date: NaiveDate, today: NaiveDate) -> bool {
    due_date <= today
}

/// Month and year of the billing period following `today`.
#[must_use]
pub fn next_period(today: NaiveDate) -> Option<(Month, i32)> {
    let next = today.checked_add_months(Months::new(1))?;
    let month = Month::try_from(u8::try_from(next.month()).ok()?).ok()?;
    Some((month, next.year()))
}

/// Characters in the longest suffix [`successor_name`] appends,
/// ` September YYYY`.
pub const LONGEST_PERIOD_SUFFIX_LEN: usize = " September 9999".len();

/// Name of the successor invoice, e.g. `Nubank April 2026`.
///
/// A trailing `<Month> <Year>` left by an earlier successor is replaced, so
/// names do not grow with every period.
#[must_use]
pub fn successor_name(name: &str, month: Month, year: i32) -> String {
    format!("{} {} {year}", base_name(name), month.name())
}

fn base_name(name: &str) -> &str {
    let trimmed = name.trim_end();
    let mut parts = trimmed.rsplitn(3, ' ');
    let (Some(year), Some(month), Some(base)) = (parts.next(), parts.next(), parts.next()) else {
        return trimmed;
    };
    let is_year = year.len() == 4 && year.chars().all(|c| c.is_ascii_digit());
    if is_year && month.parse::<Month>().is_ok() && !base.trim().is_empty() {
        base.trim_end()
    } else {
        trimmed
    }
}
