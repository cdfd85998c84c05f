//! Property-based tests for invoice limit arithmetic.
//!
//! - Used limit stays within `0..=credit_limit`
//! - Release never drives used limit negative
//! - Use followed by release of the same amount restores the prior state

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::UserId;

use super::entity::Invoice;
use super::error::InvoiceError;

/// Strategy to generate positive amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Ledger operations applied in sequence.
#[derive(Debug, Clone)]
enum Op {
    Use(Decimal),
    Release(Decimal),
    Resize(Decimal),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        positive_amount().prop_map(Op::Use),
        positive_amount().prop_map(Op::Release),
        positive_amount().prop_map(Op::Resize),
    ]
}

fn invoice_with_limit(limit: Decimal) -> Invoice {
    let mut invoice = Invoice::new(UserId::new(), "Card", 5, 10).unwrap();
    invoice.credit_limit = Some(limit);
    invoice
}

proptest! {
    /// For any sequence of operations, 0 <= used <= limit.
    #[test]
    fn test_used_limit_stays_within_bounds(
        limit in positive_amount(),
        ops in prop::collection::vec(op_strategy(), 0..50),
    ) {
        let mut invoice = invoice_with_limit(limit);

        for op in ops {
            let before = invoice.used_limit;
            match op {
                Op::Use(amount) => match invoice.use_limit(amount) {
                    Ok(()) => prop_assert_eq!(invoice.used_limit, before + amount),
                    Err(InvoiceError::InsufficientLimit { available, requested }) => {
                        prop_assert!(requested > available);
                        prop_assert_eq!(invoice.used_limit, before);
                    }
                    Err(other) => prop_assert!(false, "unexpected error {other}"),
                },
                Op::Release(amount) => invoice.release_limit(amount),
                Op::Resize(new_limit) => {
                    let result = invoice.update_credit_limit(new_limit);
                    prop_assert_eq!(result.is_ok(), new_limit >= before);
                }
            }

            let limit = invoice.credit_limit.unwrap();
            prop_assert!(invoice.used_limit >= Decimal::ZERO);
            prop_assert!(invoice.used_limit <= limit);
            prop_assert_eq!(invoice.available_limit(), limit - invoice.used_limit);
        }
    }

    /// Releasing any amount never makes used limit negative.
    #[test]
    fn test_release_is_clamped(
        used in 0i64..1_000_000,
        releases in prop::collection::vec(positive_amount(), 1..10),
    ) {
        let mut invoice = invoice_with_limit(Decimal::new(1_000_000, 2));
        invoice.used_limit = Decimal::new(used, 2);

        let total_released: Decimal = releases.iter().copied().sum();
        for amount in releases {
            invoice.release_limit(amount);
            prop_assert!(invoice.used_limit >= Decimal::ZERO);
        }

        let expected = (Decimal::new(used, 2) - total_released).max(Decimal::ZERO);
        prop_assert_eq!(invoice.used_limit, expected);
    }

    /// use(x) then release(x) restores used limit exactly.
    #[test]
    fn test_use_release_round_trip(
        limit in positive_amount(),
        used_share in 0u32..100,
        amount_share in 1u32..=100,
    ) {
        let mut invoice = invoice_with_limit(limit);
        invoice.used_limit = (limit * Decimal::from(used_share) / Decimal::ONE_HUNDRED).round_dp(2);
        let amount = (invoice.available_limit() * Decimal::from(amount_share) / Decimal::ONE_HUNDRED)
            .round_dp(2)
            .min(invoice.available_limit());
        prop_assume!(amount > Decimal::ZERO);

        let before = invoice.used_limit;
        invoice.use_limit(amount).unwrap();
        invoice.release_limit(amount);

        prop_assert_eq!(invoice.used_limit, before);
    }

    /// Usage percentage stays within 0..=100 for valid state.
    #[test]
    fn test_usage_percentage_bounds(limit in positive_amount(), used_share in 0u32..=100) {
        let mut invoice = invoice_with_limit(limit);
        invoice.used_limit = (limit * Decimal::from(used_share) / Decimal::ONE_HUNDRED).round_dp(2).min(limit);

        let pct = invoice.usage_percentage();
        prop_assert!(pct >= Decimal::ZERO);
        prop_assert!(pct <= Decimal::ONE_HUNDRED);
    }
}
