//! Property-based tests for installment plans.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::installment::InstallmentPlan;

proptest! {
    /// Installments always add up to the purchase amount.
    #[test]
    fn test_installments_sum_to_total(cents in 100i64..100_000_000, count in 1i16..=48) {
        let total = Decimal::new(cents, 2);
        let first = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();

        let plan = InstallmentPlan::split(total, count, first, None).unwrap();

        prop_assert_eq!(plan.len(), usize::try_from(count).unwrap());
        prop_assert_eq!(plan.total(), total);
    }

    /// No installment differs from another by more than the leftover cents.
    #[test]
    fn test_installments_are_even(cents in 100i64..100_000_000, count in 2i16..=48) {
        let total = Decimal::new(cents, 2);
        let first = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();

        let plan = InstallmentPlan::split(total, count, first, None).unwrap();
        let tail = plan.installments[1].amount;

        for installment in &plan.installments[1..] {
            prop_assert_eq!(installment.amount, tail);
        }
        let spread = plan.installments[0].amount - tail;
        prop_assert!(spread >= Decimal::ZERO);
        prop_assert!(spread < Decimal::new(i64::from(count), 2));
    }
}
