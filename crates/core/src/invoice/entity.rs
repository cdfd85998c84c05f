//! The invoice aggregate and its credit-limit arithmetic.
//!
//! `used_limit` only changes through [`Invoice::use_limit`],
//! [`Invoice::release_limit`] and [`Invoice::update_credit_limit`]. The
//! persisted counterpart of these rules lives in the database layer, which
//! applies the same checks atomically.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{InvoiceId, UserId, fits_money_column, has_money_scale};

use super::cards::{self, AttachedCard};
use super::error::InvoiceError;
use super::status::InvoiceStatus;
use crate::limits::LimitBand;
use crate::schedule;

/// Color given to invoices created without one.
pub const DEFAULT_COLOR: &str = "#6B7280";

/// Icon given to invoices created without one.
pub const DEFAULT_ICON: &str = "📄";

/// Width of the stored name column.
const NAME_COLUMN_LEN: usize = 100;

/// Longest name a user may give an invoice.
///
/// Successors append ` <Month> <Year>`, so the rest of the column is kept
/// free for the longest such suffix.
pub const MAX_NAME_LEN: usize = NAME_COLUMN_LEN - schedule::LONGEST_PERIOD_SUFFIX_LEN;

/// Longest description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// One billing cycle of a credit facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice id.
    pub id: InvoiceId,
    /// Owner.
    pub user_id: UserId,
    /// Display name, unique among the owner's active invoices.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Day of month the cycle closes (1-31).
    pub closing_day: i16,
    /// Day of month payment is due (1-31).
    pub due_day: i16,
    /// Lifecycle status.
    pub status: InvoiceStatus,
    /// Shared credit limit, if configured.
    pub credit_limit: Option<Decimal>,
    /// Amount reserved by expenses.
    pub used_limit: Decimal,
    /// Billed amount, set when the cycle closes.
    pub total_amount: Option<Decimal>,
    /// Date the cycle closed.
    pub closing_date: Option<NaiveDate>,
    /// Payment due date.
    pub due_date: Option<NaiveDate>,
    /// Date the invoice was paid.
    pub payment_date: Option<NaiveDate>,
    /// Display color.
    pub color: String,
    /// Display icon.
    pub icon: String,
    /// Display order.
    pub order: i32,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Payment methods attached to this invoice.
    #[serde(default)]
    pub cards: Vec<AttachedCard>,
}

impl Invoice {
    /// Creates a fresh open invoice with no limit.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::DayOutOfRange` if either day is outside 1-31.
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        closing_day: i16,
        due_day: i16,
    ) -> Result<Self, InvoiceError> {
        Self::validate_day("closing_day", closing_day)?;
        Self::validate_day("due_day", due_day)?;

        Ok(Self {
            id: InvoiceId::new(),
            user_id,
            name: name.into(),
            description: None,
            closing_day,
            due_day,
            status: InvoiceStatus::Open,
            credit_limit: None,
            used_limit: Decimal::ZERO,
            total_amount: None,
            closing_date: None,
            due_date: None,
            payment_date: None,
            color: DEFAULT_COLOR.to_string(),
            icon: DEFAULT_ICON.to_string(),
            order: 0,
            is_active: true,
            cards: Vec::new(),
        })
    }

    /// Checks that a closing or due day lies within 1-31.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::DayOutOfRange` otherwise.
    pub fn validate_day(field: &'static str, value: i16) -> Result<(), InvoiceError> {
        if (1..=31).contains(&value) {
            Ok(())
        } else {
            Err(InvoiceError::DayOutOfRange { field, value })
        }
    }

    /// Checks a user-given name against [`MAX_NAME_LEN`].
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::NameTooLong` otherwise.
    pub fn validate_name(name: &str) -> Result<(), InvoiceError> {
        if name.trim().chars().count() > MAX_NAME_LEN {
            return Err(InvoiceError::NameTooLong);
        }
        Ok(())
    }

    /// Checks a description against [`MAX_DESCRIPTION_LEN`].
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::DescriptionTooLong` otherwise.
    pub fn validate_description(description: Option<&str>) -> Result<(), InvoiceError> {
        if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN) {
            return Err(InvoiceError::DescriptionTooLong);
        }
        Ok(())
    }

    /// Checks that `amount` is a storable, positive number of cents.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount`, `AmountPrecision` or `AmountTooLarge`.
    pub fn validate_amount(amount: Decimal) -> Result<(), InvoiceError> {
        if amount <= Decimal::ZERO {
            return Err(InvoiceError::NonPositiveAmount);
        }
        Self::validate_money(amount)
    }

    /// Checks that `amount` fits two decimal places and the storage column.
    ///
    /// # Errors
    ///
    /// Returns `AmountPrecision` or `AmountTooLarge`.
    pub fn validate_money(amount: Decimal) -> Result<(), InvoiceError> {
        if !has_money_scale(amount) {
            return Err(InvoiceError::AmountPrecision(amount));
        }
        if !fits_money_column(amount) {
            return Err(InvoiceError::AmountTooLarge(amount));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Limit arithmetic
    // ------------------------------------------------------------------

    /// Headroom left for new purchases. Zero when no limit is configured.
    #[must_use]
    pub fn available_limit(&self) -> Decimal {
        self.credit_limit
            .map_or(Decimal::ZERO, |limit| (limit - self.used_limit).max(Decimal::ZERO))
    }

    /// Returns true if `amount` fits in the available limit.
    #[must_use]
    pub fn has_available_limit(&self, amount: Decimal) -> bool {
        self.available_limit() >= amount
    }

    /// Returns true if a credit limit is configured.
    #[must_use]
    pub const fn has_credit_limit(&self) -> bool {
        self.credit_limit.is_some()
    }

    /// Reserves `amount` against the credit limit.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` if `amount <= 0`
    /// - `AmountPrecision` or `AmountTooLarge` if `amount` cannot be stored
    /// - `NoCreditLimit` if no limit is configured
    /// - `InsufficientLimit` if `amount` exceeds the available limit
    pub fn use_limit(&mut self, amount: Decimal) -> Result<(), InvoiceError> {
        Self::validate_amount(amount)?;
        if self.credit_limit.is_none() {
            return Err(InvoiceError::NoCreditLimit);
        }
        let available = self.available_limit();
        if amount > available {
            return Err(InvoiceError::InsufficientLimit {
                available,
                requested: amount,
            });
        }

        self.used_limit += amount;
        Ok(())
    }

    /// Gives back `amount`, never letting `used_limit` drop below zero.
    pub fn release_limit(&mut self, amount: Decimal) {
        if amount <= Decimal::ZERO {
            return;
        }
        self.used_limit = (self.used_limit - amount).max(Decimal::ZERO);
    }

    /// Resizes the credit limit.
    ///
    /// # Errors
    ///
    /// - `LimitBelowUsage` if `new_limit` is below the used amount
    /// - `NonPositiveLimit` if `new_limit <= 0`
    pub fn update_credit_limit(&mut self, new_limit: Decimal) -> Result<(), InvoiceError> {
        Self::validate_money(new_limit)?;
        if new_limit < self.used_limit {
            return Err(InvoiceError::LimitBelowUsage {
                new_limit,
                used: self.used_limit,
            });
        }
        if new_limit <= Decimal::ZERO {
            return Err(InvoiceError::NonPositiveLimit);
        }

        self.credit_limit = Some(new_limit);
        Ok(())
    }

    /// Used share of the limit in percent, rounded to two places for display.
    #[must_use]
    pub fn usage_percentage(&self) -> Decimal {
        self.exact_usage_percentage().round_dp(2)
    }

    /// Used share of the limit in percent, unrounded.
    ///
    /// Bands and statistics thresholds compare against this value.
    #[must_use]
    pub fn exact_usage_percentage(&self) -> Decimal {
        match self.credit_limit {
            Some(limit) if !limit.is_zero() => self.used_limit / limit * Decimal::ONE_HUNDRED,
            _ => Decimal::ZERO,
        }
    }

    /// Usage band for the current percentage.
    #[must_use]
    pub fn limit_band(&self) -> LimitBand {
        LimitBand::from_usage(self.exact_usage_percentage())
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    /// Returns true if the invoice is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == InvoiceStatus::Open
    }

    /// Returns true if the invoice is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status == InvoiceStatus::Closed
    }

    /// Returns true if the invoice is paid.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    /// Returns true if the invoice is overdue.
    #[must_use]
    pub fn is_overdue(&self) -> bool {
        self.status == InvoiceStatus::Overdue
    }

    /// Open and with a closing date already recorded.
    #[must_use]
    pub fn can_close(&self) -> bool {
        self.is_open() && self.closing_date.is_some()
    }

    /// Checks that a user may close the invoice now.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the invoice is open, or
    /// `ClosingDateNotSet` while it has no closing date.
    pub fn check_manual_close(&self) -> Result<(), InvoiceError> {
        if !self.is_open() {
            return Err(InvoiceError::InvalidTransition {
                from: self.status,
                to: InvoiceStatus::Closed,
            });
        }
        if !self.can_close() {
            return Err(InvoiceError::ClosingDateNotSet);
        }
        Ok(())
    }

    /// Closed or overdue, and not yet paid.
    #[must_use]
    pub fn can_pay(&self) -> bool {
        (self.is_closed() || self.is_overdue()) && !self.is_paid()
    }

    /// Description of the current status.
    #[must_use]
    pub const fn status_description(&self) -> &'static str {
        self.status.description()
    }

    fn transition_to(&mut self, next: InvoiceStatus) -> Result<(), InvoiceError> {
        if !self.status.can_transition_to(next) {
            return Err(InvoiceError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Closes the cycle on `on`, billing `total_amount`.
    ///
    /// The due date falls on `due_day` of the following month, clamped to
    /// that month's last day.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the invoice is open, or
    /// `DateOutOfRange` if the due date overflows the calendar.
    pub fn close(&mut self, on: NaiveDate, total_amount: Decimal) -> Result<(), InvoiceError> {
        if !self.status.can_transition_to(InvoiceStatus::Closed) {
            return Err(InvoiceError::InvalidTransition {
                from: self.status,
                to: InvoiceStatus::Closed,
            });
        }
        let due_date =
            schedule::due_date_for(on, self.due_day).ok_or(InvoiceError::DateOutOfRange)?;
        self.status = InvoiceStatus::Closed;
        self.closing_date = Some(on);
        self.due_date = Some(due_date);
        self.total_amount = Some(total_amount);
        Ok(())
    }

    /// Flags a closed invoice as overdue.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the invoice is closed.
    pub fn mark_overdue(&mut self) -> Result<(), InvoiceError> {
        self.transition_to(InvoiceStatus::Overdue)
    }

    /// Records payment on `on`.
    ///
    /// # Errors
    ///
    /// Returns `NotPayable` unless [`Invoice::can_pay`] holds.
    pub fn pay(&mut self, on: NaiveDate) -> Result<(), InvoiceError> {
        if !self.can_pay() {
            return Err(InvoiceError::NotPayable(self.status));
        }
        self.transition_to(InvoiceStatus::Paid)?;
        self.payment_date = Some(on);
        Ok(())
    }

    /// Builds the next-period invoice named `name`.
    ///
    /// Usage always starts at zero. The credit limit is copied only when
    /// `carry_over_limit` is set.
    #[must_use]
    pub fn successor(&self, name: String, carry_over_limit: bool) -> Self {
        Self {
            id: InvoiceId::new(),
            user_id: self.user_id,
            name,
            description: self.description.clone(),
            closing_day: self.closing_day,
            due_day: self.due_day,
            status: InvoiceStatus::Open,
            credit_limit: if carry_over_limit {
                self.credit_limit
            } else {
                None
            },
            used_limit: Decimal::ZERO,
            total_amount: None,
            closing_date: None,
            due_date: None,
            payment_date: None,
            color: self.color.clone(),
            icon: self.icon.clone(),
            order: self.order,
            is_active: true,
            cards: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Attached cards
    // ------------------------------------------------------------------

    /// Active credit cards attached to this invoice.
    pub fn credit_cards(&self) -> impl Iterator<Item = &AttachedCard> {
        cards::credit_cards(&self.cards)
    }

    /// Returns true if at least one active credit card is attached.
    #[must_use]
    pub fn has_credit_cards(&self) -> bool {
        self.credit_cards().next().is_some()
    }

    /// Number of active credit cards attached.
    #[must_use]
    pub fn credit_cards_count(&self) -> usize {
        self.credit_cards().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::PaymentMethodKind;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use tally_shared::types::PaymentMethodId;

    fn invoice_with_limit(limit: Decimal, used: Decimal) -> Invoice {
        let mut invoice = Invoice::new(UserId::new(), "Visa", 5, 10).unwrap();
        invoice.credit_limit = Some(limit);
        invoice.used_limit = used;
        invoice
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_applies_defaults() {
        let invoice = Invoice::new(UserId::new(), "Visa", 5, 10).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Open);
        assert_eq!(invoice.used_limit, Decimal::ZERO);
        assert_eq!(invoice.color, DEFAULT_COLOR);
        assert_eq!(invoice.icon, DEFAULT_ICON);
        assert!(invoice.is_active);
    }

    #[test]
    fn test_new_rejects_days_out_of_range() {
        assert_eq!(
            Invoice::new(UserId::new(), "Visa", 0, 10).unwrap_err(),
            InvoiceError::DayOutOfRange {
                field: "closing_day",
                value: 0
            }
        );
        assert!(Invoice::new(UserId::new(), "Visa", 5, 32).is_err());
        assert!(Invoice::new(UserId::new(), "Visa", 31, 31).is_ok());
    }

    #[test]
    fn test_available_limit_without_limit_is_zero() {
        let invoice = Invoice::new(UserId::new(), "Visa", 5, 10).unwrap();
        assert_eq!(invoice.available_limit(), Decimal::ZERO);
        assert!(!invoice.has_available_limit(dec!(0.01)));
        assert_eq!(invoice.usage_percentage(), Decimal::ZERO);
    }

    #[test]
    fn test_use_limit_without_limit_fails() {
        let mut invoice = Invoice::new(UserId::new(), "Visa", 5, 10).unwrap();
        assert_eq!(invoice.use_limit(dec!(10)), Err(InvoiceError::NoCreditLimit));
        assert_eq!(invoice.used_limit, Decimal::ZERO);
    }

    #[test]
    fn test_use_limit_reserve_then_overdraw() {
        let mut invoice = invoice_with_limit(dec!(1000), dec!(0));

        invoice.use_limit(dec!(400)).unwrap();
        assert_eq!(invoice.used_limit, dec!(400));
        assert_eq!(invoice.available_limit(), dec!(600));

        let err = invoice.use_limit(dec!(700)).unwrap_err();
        assert_eq!(
            err,
            InvoiceError::InsufficientLimit {
                available: dec!(600),
                requested: dec!(700)
            }
        );
        assert_eq!(
            err.to_string(),
            "Insufficient limit. Available: 600, Required: 700"
        );
        assert_eq!(invoice.used_limit, dec!(400));
    }

    #[test]
    fn test_use_limit_exact_fit() {
        let mut invoice = invoice_with_limit(dec!(100), dec!(40));
        invoice.use_limit(dec!(60)).unwrap();
        assert_eq!(invoice.available_limit(), Decimal::ZERO);
    }

    #[test]
    fn test_use_limit_rejects_non_positive_amount() {
        let mut invoice = invoice_with_limit(dec!(100), dec!(0));
        assert_eq!(
            invoice.use_limit(dec!(0)),
            Err(InvoiceError::NonPositiveAmount)
        );
        assert_eq!(
            invoice.use_limit(dec!(-5)),
            Err(InvoiceError::NonPositiveAmount)
        );
    }

    #[rstest]
    #[case(dec!(0.004), InvoiceError::AmountPrecision(dec!(0.004)))]
    #[case(dec!(10.005), InvoiceError::AmountPrecision(dec!(10.005)))]
    #[case(dec!(10000000000), InvoiceError::AmountTooLarge(dec!(10000000000)))]
    fn test_use_limit_rejects_unstorable_amount(
        #[case] amount: Decimal,
        #[case] expected: InvoiceError,
    ) {
        let mut invoice = invoice_with_limit(dec!(100), dec!(0));
        assert_eq!(invoice.use_limit(amount), Err(expected));
        assert_eq!(invoice.used_limit, Decimal::ZERO);
    }

    #[test]
    fn test_release_limit_clamps_at_zero() {
        let mut invoice = invoice_with_limit(dec!(100), dec!(30));
        invoice.release_limit(dec!(50));
        assert_eq!(invoice.used_limit, Decimal::ZERO);

        invoice.release_limit(dec!(50));
        assert_eq!(invoice.used_limit, Decimal::ZERO);
    }

    #[test]
    fn test_update_credit_limit_shrink_and_grow() {
        let mut invoice = invoice_with_limit(dec!(500), dec!(500));

        let err = invoice.update_credit_limit(dec!(400)).unwrap_err();
        assert!(matches!(err, InvoiceError::LimitBelowUsage { .. }));
        assert_eq!(invoice.credit_limit, Some(dec!(500)));

        invoice.update_credit_limit(dec!(600)).unwrap();
        assert_eq!(invoice.available_limit(), dec!(100));
    }

    #[test]
    fn test_update_credit_limit_rejects_zero() {
        let mut invoice = Invoice::new(UserId::new(), "Visa", 5, 10).unwrap();
        assert_eq!(
            invoice.update_credit_limit(dec!(0)),
            Err(InvoiceError::NonPositiveLimit)
        );
    }

    #[test]
    fn test_update_credit_limit_rejects_fractions_of_a_cent() {
        let mut invoice = invoice_with_limit(dec!(500), dec!(0));
        assert_eq!(
            invoice.update_credit_limit(dec!(1000.005)),
            Err(InvoiceError::AmountPrecision(dec!(1000.005)))
        );
        assert_eq!(
            invoice.update_credit_limit(dec!(10000000000)),
            Err(InvoiceError::AmountTooLarge(dec!(10000000000)))
        );
        assert_eq!(invoice.credit_limit, Some(dec!(500)));

        invoice.update_credit_limit(dec!(1000.50)).unwrap();
        assert_eq!(invoice.credit_limit, Some(dec!(1000.50)));
    }

    #[test]
    fn test_name_leaves_room_for_period_suffix() {
        assert_eq!(MAX_NAME_LEN, 85);
        assert_eq!(Invoice::validate_name(&"n".repeat(MAX_NAME_LEN)), Ok(()));
        assert_eq!(
            Invoice::validate_name(&"n".repeat(MAX_NAME_LEN + 1)),
            Err(InvoiceError::NameTooLong)
        );
    }

    #[test]
    fn test_description_length() {
        assert_eq!(Invoice::validate_description(None), Ok(()));
        assert_eq!(Invoice::validate_description(Some(&"d".repeat(255))), Ok(()));
        assert_eq!(
            Invoice::validate_description(Some(&"d".repeat(300))),
            Err(InvoiceError::DescriptionTooLong)
        );
    }

    #[test]
    fn test_usage_percentage_rounds() {
        let invoice = invoice_with_limit(dec!(300), dec!(100));
        assert_eq!(invoice.usage_percentage(), dec!(33.33));
        assert_eq!(invoice.limit_band(), LimitBand::Healthy);
    }

    #[test]
    fn test_can_close_requires_closing_date() {
        let mut invoice = Invoice::new(UserId::new(), "Visa", 5, 10).unwrap();
        assert!(!invoice.can_close());
        invoice.closing_date = Some(date(2026, 3, 5));
        assert!(invoice.can_close());
    }

    #[test]
    fn test_manual_close_needs_closing_date() {
        let mut invoice = Invoice::new(UserId::new(), "Visa", 5, 10).unwrap();
        assert_eq!(
            invoice.check_manual_close(),
            Err(InvoiceError::ClosingDateNotSet)
        );

        invoice.closing_date = Some(date(2026, 3, 5));
        assert_eq!(invoice.check_manual_close(), Ok(()));

        invoice.close(date(2026, 3, 5), dec!(0)).unwrap();
        assert!(matches!(
            invoice.check_manual_close(),
            Err(InvoiceError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_close_sets_dates_and_total() {
        let mut invoice = Invoice::new(UserId::new(), "Visa", 5, 10).unwrap();
        invoice.close(date(2026, 3, 5), dec!(250.40)).unwrap();

        assert!(invoice.is_closed());
        assert_eq!(invoice.closing_date, Some(date(2026, 3, 5)));
        assert_eq!(invoice.due_date, Some(date(2026, 4, 10)));
        assert_eq!(invoice.total_amount, Some(dec!(250.40)));
        assert!(invoice.can_pay());
    }

    #[test]
    fn test_close_twice_fails() {
        let mut invoice = Invoice::new(UserId::new(), "Visa", 5, 10).unwrap();
        invoice.close(date(2026, 3, 5), dec!(0)).unwrap();
        assert!(matches!(
            invoice.close(date(2026, 3, 6), dec!(0)),
            Err(InvoiceError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_pay_from_overdue() {
        let mut invoice = Invoice::new(UserId::new(), "Visa", 5, 10).unwrap();
        invoice.close(date(2026, 3, 5), dec!(10)).unwrap();
        invoice.mark_overdue().unwrap();
        assert!(invoice.can_pay());

        invoice.pay(date(2026, 4, 20)).unwrap();
        assert!(invoice.is_paid());
        assert_eq!(invoice.payment_date, Some(date(2026, 4, 20)));
        assert!(!invoice.can_pay());
    }

    #[test]
    fn test_pay_open_invoice_fails() {
        let mut invoice = Invoice::new(UserId::new(), "Visa", 5, 10).unwrap();
        assert_eq!(
            invoice.pay(date(2026, 3, 1)),
            Err(InvoiceError::NotPayable(InvoiceStatus::Open))
        );
    }

    #[test]
    fn test_successor_starts_clean() {
        let mut invoice = invoice_with_limit(dec!(1000), dec!(300));
        invoice.description = Some("shared".into());
        invoice.order = 3;
        invoice.close(date(2026, 3, 5), dec!(300)).unwrap();

        let next = invoice.successor("Visa April 2026".into(), false);
        assert_ne!(next.id, invoice.id);
        assert_eq!(next.status, InvoiceStatus::Open);
        assert_eq!(next.credit_limit, None);
        assert_eq!(next.used_limit, Decimal::ZERO);
        assert_eq!(next.closing_day, 5);
        assert_eq!(next.due_day, 10);
        assert_eq!(next.order, 3);
        assert_eq!(next.description.as_deref(), Some("shared"));
        assert_eq!(next.closing_date, None);

        let carried = invoice.successor("Visa April 2026".into(), true);
        assert_eq!(carried.credit_limit, Some(dec!(1000)));
        assert_eq!(carried.used_limit, Decimal::ZERO);
    }

    #[test]
    fn test_credit_card_helpers() {
        let mut invoice = Invoice::new(UserId::new(), "Visa", 5, 10).unwrap();
        assert!(!invoice.has_credit_cards());

        invoice.cards.push(AttachedCard {
            id: PaymentMethodId::new(),
            name: "Visa Gold".into(),
            kind: PaymentMethodKind::CreditCard,
            last_four_digits: Some("4242".into()),
            is_active: true,
        });
        invoice.cards.push(AttachedCard {
            id: PaymentMethodId::new(),
            name: "Pix".into(),
            kind: PaymentMethodKind::Pix,
            last_four_digits: None,
            is_active: true,
        });

        assert!(invoice.has_credit_cards());
        assert_eq!(invoice.credit_cards_count(), 1);
    }
}
