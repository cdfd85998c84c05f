//! Splitting a purchase into monthly installments.

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// One installment of a split purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Installment {
    /// Position, starting at 1.
    pub number: i16,
    /// Amount billed in this installment.
    pub amount: Decimal,
    /// Date the installment is booked.
    pub transaction_date: NaiveDate,
    /// Due date, shifted by the same number of months.
    pub due_date: Option<NaiveDate>,
}

/// Monthly split of a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallmentPlan {
    /// Installments in order.
    pub installments: Vec<Installment>,
}

impl InstallmentPlan {
    /// Splits `total` into `count` monthly installments.
    ///
    /// Amounts are cut to cents; the leftover cents go to the first
    /// installment so the parts always add up to `total`. Dates advance one
    /// calendar month per installment, clamped to the end of shorter months.
    /// Returns `None` for a count below 1, a total too small to give every
    /// installment at least one cent, or dates beyond the calendar.
    #[must_use]
    pub fn split(
        total: Decimal,
        count: i16,
        first_date: NaiveDate,
        first_due: Option<NaiveDate>,
    ) -> Option<Self> {
        if count < 1 {
            return None;
        }
        let n = Decimal::from(count);
        let base = (total / n).round_dp_with_strategy(2, RoundingStrategy::ToZero);
        if base <= Decimal::ZERO {
            return None;
        }
        let remainder = total - base * n;

        let mut installments = Vec::with_capacity(usize::try_from(count).ok()?);
        for number in 1..=count {
            let offset = Months::new(u32::try_from(number - 1).ok()?);
            let transaction_date = first_date.checked_add_months(offset)?;
            let due_date = match first_due {
                Some(due) => Some(due.checked_add_months(offset)?),
                None => None,
            };
            let amount = if number == 1 { base + remainder } else { base };
            installments.push(Installment {
                number,
                amount,
                transaction_date,
                due_date,
            });
        }

        Some(Self { installments })
    }

    /// Sum of all installments.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.installments.iter().map(|i| i.amount).sum()
    }

    /// Number of installments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.installments.len()
    }

    /// Returns true if the plan has no installments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.installments.is_empty()
    }
}
