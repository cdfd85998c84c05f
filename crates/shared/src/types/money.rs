//! Monetary amount bounds.
//!
//! Amounts are stored as `NUMERIC(12,2)`: two decimal places, ten integer
//! digits. Values are checked against that shape before they reach the
//! database so a bad amount is a validation error, not a driver error.

use rust_decimal::Decimal;

/// Decimal places kept for any monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Smallest positive amount, one cent.
pub const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, MONEY_SCALE);

/// Largest amount a `NUMERIC(12,2)` column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, MONEY_SCALE);

/// True when `amount` has no more than two significant decimal places.
///
/// Trailing zeros do not count, so `10.500` passes.
#[must_use]
pub fn has_money_scale(amount: Decimal) -> bool {
    amount.normalize().scale() <= MONEY_SCALE
}

/// True when `amount` fits the storage column.
#[must_use]
pub fn fits_money_column(amount: Decimal) -> bool {
    amount.abs() <= MAX_AMOUNT
}
