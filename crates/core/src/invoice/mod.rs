//! Invoice aggregate: one billing cycle of a (possibly shared) credit limit.

pub mod cards;
pub mod entity;
pub mod error;
pub mod status;

#[cfg(test)]
mod entity_props;

pub use cards::{AttachedCard, PaymentMethodKind};
pub use entity::{DEFAULT_COLOR, DEFAULT_ICON, Invoice, MAX_DESCRIPTION_LEN, MAX_NAME_LEN};
pub use error::InvoiceError;
pub use status::InvoiceStatus;
