//! Tests for limit projections.

use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::types::{PaymentMethodId, UserId};

use super::service::LimitService;
use super::types::LimitBand;
use crate::invoice::{AttachedCard, Invoice, InvoiceStatus, PaymentMethodKind};
use crate::transaction::TransactionType;

fn invoice(limit: Option<Decimal>, used: Decimal) -> Invoice {
    let mut invoice = Invoice::new(UserId::new(), "Visa", 5, 10).unwrap();
    invoice.credit_limit = limit;
    invoice.used_limit = used;
    invoice
}

fn card(name: &str, kind: PaymentMethodKind, last_four: Option<&str>) -> AttachedCard {
    AttachedCard {
        id: PaymentMethodId::new(),
        name: name.to_string(),
        kind,
        last_four_digits: last_four.map(str::to_string),
        is_active: true,
    }
}

#[rstest]
#[case(dec!(0), LimitBand::Healthy)]
#[case(dec!(49.99), LimitBand::Healthy)]
#[case(dec!(50), LimitBand::Attention)]
#[case(dec!(74.99), LimitBand::Attention)]
#[case(dec!(75), LimitBand::Warning)]
#[case(dec!(89.99), LimitBand::Warning)]
#[case(dec!(90), LimitBand::Critical)]
#[case(dec!(100), LimitBand::Critical)]
fn test_band_thresholds(#[case] usage: Decimal, #[case] expected: LimitBand) {
    assert_eq!(LimitService::band(usage), expected);
}

#[rstest]
#[case(dec!(49999.99), LimitBand::Healthy)]
#[case(dec!(50000), LimitBand::Attention)]
#[case(dec!(74999.99), LimitBand::Attention)]
#[case(dec!(75000), LimitBand::Warning)]
#[case(dec!(89999.99), LimitBand::Warning)]
#[case(dec!(90000), LimitBand::Critical)]
fn test_band_uses_unrounded_usage(#[case] used: Decimal, #[case] expected: LimitBand) {
    let inv = invoice(Some(dec!(100000)), used);
    assert_eq!(inv.limit_band(), expected);
}

#[test]
fn test_displayed_usage_is_rounded() {
    let inv = invoice(Some(dec!(100000)), dec!(49999.99));
    assert_eq!(inv.usage_percentage(), dec!(50.00));
    assert_eq!(inv.limit_band(), LimitBand::Healthy);
}

#[test]
fn test_statistics_critical_threshold_is_exact() {
    let below = invoice(Some(dec!(100000)), dec!(74999.99));
    let at = invoice(Some(dec!(100000)), dec!(75000));

    let stats = LimitService::statistics([&below]);
    assert_eq!(stats.critical_count, 0);
    assert_eq!(stats.healthy_count, 1);

    let stats = LimitService::statistics([&at]);
    assert_eq!(stats.critical_count, 1);
    assert_eq!(stats.healthy_count, 0);
}

#[test]
fn test_applies_only_to_expenses_with_invoice() {
    assert!(LimitService::applies(TransactionType::Expense, true));
    assert!(!LimitService::applies(TransactionType::Expense, false));
    assert!(!LimitService::applies(TransactionType::Income, true));
}

#[test]
fn test_evaluate_missing_invoice() {
    let check = LimitService::evaluate(None, dec!(10));
    assert!(!check.can_proceed);
    assert_eq!(check.message.as_deref(), Some("Invoice not found"));
}

#[test]
fn test_evaluate_inactive_invoice_counts_as_missing() {
    let mut inv = invoice(Some(dec!(100)), dec!(0));
    inv.is_active = false;
    let check = LimitService::evaluate(Some(&inv), dec!(10));
    assert_eq!(check.message.as_deref(), Some("Invoice not found"));
}

#[test]
fn test_evaluate_without_limit() {
    let inv = invoice(None, dec!(0));
    let check = LimitService::evaluate(Some(&inv), dec!(10));
    assert!(!check.can_proceed);
    assert_eq!(check.available_limit, None);
}

#[test]
fn test_evaluate_insufficient_reports_available() {
    let inv = invoice(Some(dec!(100)), dec!(70));
    let check = LimitService::evaluate(Some(&inv), dec!(50));
    assert!(!check.can_proceed);
    assert_eq!(check.available_limit, Some(dec!(30)));
    assert_eq!(
        check.message.as_deref(),
        Some("Insufficient limit. Available: 30, Required: 50")
    );
}

#[test]
fn test_evaluate_fits() {
    let inv = invoice(Some(dec!(100)), dec!(70));
    assert!(LimitService::evaluate(Some(&inv), dec!(30)).can_proceed);
}

#[test]
fn test_info() {
    let mut inv = invoice(Some(dec!(1000)), dec!(800));
    inv.cards.push(card("Gold", PaymentMethodKind::CreditCard, Some("1111")));
    inv.cards.push(card("Platinum", PaymentMethodKind::CreditCard, Some("2222")));

    let info = LimitService::info(&inv);
    assert!(info.has_limit);
    assert_eq!(info.total, dec!(1000));
    assert_eq!(info.used, dec!(800));
    assert_eq!(info.available, dec!(200));
    assert_eq!(info.usage_percentage, dec!(80));
    assert_eq!(info.limit_status, LimitBand::Warning);
    assert_eq!(info.credit_cards_count, 2);
    assert_eq!(info.status, InvoiceStatus::Open);
}

#[test]
fn test_info_without_limit() {
    let info = LimitService::info(&invoice(None, dec!(0)));
    assert!(!info.has_limit);
    assert_eq!(info.total, Decimal::ZERO);
    assert_eq!(info.available, Decimal::ZERO);
    assert_eq!(info.limit_status, LimitBand::Healthy);
}

#[test]
fn test_summary_lists_only_credit_cards() {
    let mut inv = invoice(Some(dec!(500)), dec!(500));
    inv.cards.push(card("Nubank", PaymentMethodKind::CreditCard, Some("1234")));
    inv.cards.push(card("Checking", PaymentMethodKind::DebitCard, Some("9999")));

    let summary = LimitService::summary(&inv);
    assert_eq!(summary.credit_cards_count, 1);
    assert_eq!(summary.credit_cards[0].display_name, "Nubank (**** 1234)");
    assert_eq!(summary.limit_status, LimitBand::Critical);
    assert!(!summary.can_make_purchases);
}

#[test]
fn test_summary_can_make_purchases() {
    assert!(LimitService::summary(&invoice(Some(dec!(500)), dec!(10))).can_make_purchases);
    assert!(!LimitService::summary(&invoice(None, dec!(0))).can_make_purchases);
}

#[test]
fn test_statistics() {
    let invoices = vec![
        invoice(Some(dec!(1000)), dec!(100)),
        invoice(Some(dec!(1000)), dec!(750)),
        invoice(Some(dec!(2000)), dec!(1950)),
        invoice(None, dec!(0)),
    ];

    let stats = LimitService::statistics(&invoices);
    assert_eq!(stats.invoices_with_limit, 3);
    assert_eq!(stats.total_limit, dec!(4000));
    assert_eq!(stats.total_used, dec!(2800));
    assert_eq!(stats.total_available, dec!(1200));
    assert_eq!(stats.average_usage, dec!(70));
    assert_eq!(stats.critical_count, 2);
    assert_eq!(stats.healthy_count, 1);
}

#[test]
fn test_statistics_empty() {
    let stats = LimitService::statistics(&[]);
    assert_eq!(stats.invoices_with_limit, 0);
    assert_eq!(stats.average_usage, Decimal::ZERO);
}

proptest! {
    /// Bands never go down as usage goes up.
    #[test]
    fn test_band_is_monotonic(a in 0i64..=10_000, b in 0i64..=10_000) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low = LimitService::band(Decimal::new(low, 2));
        let high = LimitService::band(Decimal::new(high, 2));
        prop_assert!(low as u8 <= high as u8);
    }

    /// Totals always satisfy total_used + total_available = total_limit.
    #[test]
    fn test_statistics_totals_balance(
        entries in prop::collection::vec((1i64..1_000_000, 0u32..=100), 0..20),
    ) {
        let invoices: Vec<Invoice> = entries
            .into_iter()
            .map(|(limit, share)| {
                let limit = Decimal::new(limit, 2);
                let used = (limit * Decimal::from(share) / Decimal::ONE_HUNDRED).round_dp(2);
                invoice(Some(limit), used)
            })
            .collect();

        let stats = LimitService::statistics(&invoices);
        prop_assert_eq!(stats.total_used + stats.total_available, stats.total_limit);
        prop_assert_eq!(stats.critical_count + stats.healthy_count, stats.invoices_with_limit);
    }
}
