//! `SeaORM` active enums mirroring the Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::invoice::{InvoiceStatus as DomainInvoiceStatus, PaymentMethodKind};
use tally_core::transaction::{
    TransactionStatus as DomainTransactionStatus, TransactionType as DomainTransactionType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "invoice_status")]
pub enum InvoiceStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "overdue")]
    Overdue,
    #[sea_orm(string_value = "pending")]
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
pub enum TransactionType {
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "expense")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method_type")]
pub enum PaymentMethodType {
    #[sea_orm(string_value = "credit_card")]
    CreditCard,
    #[sea_orm(string_value = "debit_card")]
    DebitCard,
    #[sea_orm(string_value = "pix")]
    Pix,
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    #[sea_orm(string_value = "other")]
    Other,
}

// ============================================================================
// Domain conversions
// ============================================================================

impl From<InvoiceStatus> for DomainInvoiceStatus {
    fn from(status: InvoiceStatus) -> Self {
        match status {
            InvoiceStatus::Open => Self::Open,
            InvoiceStatus::Closed => Self::Closed,
            InvoiceStatus::Paid => Self::Paid,
            InvoiceStatus::Overdue => Self::Overdue,
            InvoiceStatus::Pending => Self::Pending,
        }
    }
}

impl From<DomainInvoiceStatus> for InvoiceStatus {
    fn from(status: DomainInvoiceStatus) -> Self {
        match status {
            DomainInvoiceStatus::Open => Self::Open,
            DomainInvoiceStatus::Closed => Self::Closed,
            DomainInvoiceStatus::Paid => Self::Paid,
            DomainInvoiceStatus::Overdue => Self::Overdue,
            DomainInvoiceStatus::Pending => Self::Pending,
        }
    }
}

impl From<TransactionType> for DomainTransactionType {
    fn from(kind: TransactionType) -> Self {
        match kind {
            TransactionType::Income => Self::Income,
            TransactionType::Expense => Self::Expense,
        }
    }
}

impl From<DomainTransactionType> for TransactionType {
    fn from(kind: DomainTransactionType) -> Self {
        match kind {
            DomainTransactionType::Income => Self::Income,
            DomainTransactionType::Expense => Self::Expense,
        }
    }
}

impl From<TransactionStatus> for DomainTransactionStatus {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Pending => Self::Pending,
            TransactionStatus::Completed => Self::Completed,
            TransactionStatus::Canceled => Self::Canceled,
        }
    }
}

impl From<DomainTransactionStatus> for TransactionStatus {
    fn from(status: DomainTransactionStatus) -> Self {
        match status {
            DomainTransactionStatus::Pending => Self::Pending,
            DomainTransactionStatus::Completed => Self::Completed,
            DomainTransactionStatus::Canceled => Self::Canceled,
        }
    }
}

impl From<PaymentMethodType> for PaymentMethodKind {
    fn from(kind: PaymentMethodType) -> Self {
        match kind {
            PaymentMethodType::CreditCard => Self::CreditCard,
            PaymentMethodType::DebitCard => Self::DebitCard,
            PaymentMethodType::Pix => Self::Pix,
            PaymentMethodType::Cash => Self::Cash,
            PaymentMethodType::BankTransfer => Self::BankTransfer,
            PaymentMethodType::Other => Self::Other,
        }
    }
}

impl From<PaymentMethodKind> for PaymentMethodType {
    fn from(kind: PaymentMethodKind) -> Self {
        match kind {
            PaymentMethodKind::CreditCard => Self::CreditCard,
            PaymentMethodKind::DebitCard => Self::DebitCard,
            PaymentMethodKind::Pix => Self::Pix,
            PaymentMethodKind::Cash => Self::Cash,
            PaymentMethodKind::BankTransfer => Self::BankTransfer,
            PaymentMethodKind::Other => Self::Other,
        }
    }
}
