//! Transaction rules that touch the credit limit.

pub mod installment;
pub mod policy;
pub mod types;

#[cfg(test)]
mod installment_props;

pub use installment::{Installment, InstallmentPlan};
pub use policy::{TransactionPolicy, TransactionPolicyError};
pub use types::{TransactionDraft, TransactionStatus, TransactionType};
