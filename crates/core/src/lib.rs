//! Core business logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `invoice` - Invoice aggregate, credit-limit arithmetic and status machine
//! - `limits` - Usage bands, limit projections and statistics
//! - `schedule` - Billing-cycle calendar math for the daily lifecycle run
//! - `transaction` - Transaction rules and installment plans

pub mod invoice;
pub mod limits;
pub mod schedule;
pub mod transaction;
