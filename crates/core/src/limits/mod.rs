//! Credit-limit projections: usage bands, per-invoice info and statistics.

pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use service::LimitService;
pub use types::{CardSummary, InvoiceLimitSummary, LimitBand, LimitCheck, LimitInfo, LimitStatistics};
