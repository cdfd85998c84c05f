//! `SeaORM` entity prelude.

pub use super::invoices::Entity as Invoices;
pub use super::payment_methods::Entity as PaymentMethods;
pub use super::transactions::Entity as Transactions;
pub use super::users::Entity as Users;
