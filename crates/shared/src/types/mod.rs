//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{MAX_AMOUNT, MIN_AMOUNT, MONEY_SCALE, fits_money_column, has_money_scale};
pub use pagination::{PageMeta, PageRequest, PageResponse};
