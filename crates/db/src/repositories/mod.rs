//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod invoice;
pub mod invoice_limit;
pub mod payment_method;
pub mod transaction;
pub mod user;

pub use invoice::{CreateInvoiceInput, InvoiceRepoError, InvoiceRepository, UpdateInvoiceInput};
pub use invoice_limit::{InvoiceLimitRepository, LimitError};
pub use payment_method::{CreatePaymentMethodInput, PaymentMethodRepoError, PaymentMethodRepository};
pub use transaction::{
    TransactionFilter, TransactionRepoError, TransactionRepository, TransactionWithInstallments,
    UpdateTransactionInput,
};
pub use user::UserRepository;
