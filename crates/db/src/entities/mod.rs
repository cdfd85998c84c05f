//! `SeaORM` entity definitions.
//!
//! Column fields mirror the migration and carry no docs of their own.

pub mod prelude;

#[allow(missing_docs)]
pub mod invoices;
#[allow(missing_docs)]
pub mod payment_methods;
#[allow(missing_docs)]
pub mod sea_orm_active_enums;
#[allow(missing_docs)]
pub mod transactions;
#[allow(missing_docs)]
pub mod users;
