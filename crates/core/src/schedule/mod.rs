//! Billing-cycle calendar math and the daily lifecycle run report.

pub mod calendar;
pub mod lifecycle;
pub mod report;

#[cfg(test)]
mod calendar_props;

pub use calendar::{
    LONGEST_PERIOD_SUFFIX_LEN, closes_on, days_in_month, due_date_for, is_past_due, next_period,
    successor_name,
};
pub use lifecycle::LifecycleRules;
pub use report::{DailyRunReport, ItemFailure, Phase};
