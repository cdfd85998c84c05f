//! Payment methods attached to an invoice.
//!
//! Several credit cards can share one invoice, and therefore one credit
//! limit. These helpers work on an already-loaded list of attachments.

use serde::{Deserialize, Serialize};
use std::fmt;
use tally_shared::types::PaymentMethodId;

/// Kind of payment channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    /// Credit card, may share an invoice limit.
    CreditCard,
    /// Debit card.
    DebitCard,
    /// Instant transfer.
    Pix,
    /// Cash.
    Cash,
    /// Bank transfer.
    BankTransfer,
    /// Anything else.
    Other,
}

impl PaymentMethodKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::Pix => "pix",
            Self::Cash => "cash",
            Self::BankTransfer => "bank_transfer",
            Self::Other => "other",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "credit_card" => Some(Self::CreditCard),
            "debit_card" => Some(Self::DebitCard),
            "pix" => Some(Self::Pix),
            "cash" => Some(Self::Cash),
            "bank_transfer" => Some(Self::BankTransfer),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment method as seen from the invoice it is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedCard {
    /// Payment method id.
    pub id: PaymentMethodId,
    /// Display name.
    pub name: String,
    /// Kind of payment method.
    pub kind: PaymentMethodKind,
    /// Last four digits of the card number, when known.
    pub last_four_digits: Option<String>,
    /// Soft-delete flag.
    pub is_active: bool,
}

impl AttachedCard {
    /// Returns true for credit cards.
    #[must_use]
    pub fn is_credit_card(&self) -> bool {
        self.kind == PaymentMethodKind::CreditCard
    }

    /// Name with the masked card number, e.g. `Nubank (**** 1234)`.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.last_four_digits.as_deref() {
            Some(last_four) if !last_four.is_empty() => {
                format!("{} (**** {last_four})", self.name)
            }
            _ => self.name.clone(),
        }
    }
}

/// Active credit cards among the attachments.
pub fn credit_cards(cards: &[AttachedCard]) -> impl Iterator<Item = &AttachedCard> {
    cards.iter().filter(|c| c.is_active && c.is_credit_card())
}
