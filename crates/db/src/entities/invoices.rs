//! `SeaORM` Entity for invoices table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::invoice::{AttachedCard, Invoice};
use tally_shared::types::{InvoiceId, UserId};

use super::sea_orm_active_enums::InvoiceStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub closing_day: i16,
    pub due_day: i16,
    pub status: InvoiceStatus,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub credit_limit: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub used_limit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub total_amount: Option<Decimal>,
    pub closing_date: Option<Date>,
    pub due_date: Option<Date>,
    pub payment_date: Option<Date>,
    pub color: String,
    pub icon: String,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::payment_methods::Entity")]
    PaymentMethods,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::payment_methods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentMethods.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Converts the row into the domain aggregate with its attached cards.
    #[must_use]
    pub fn into_domain(self, cards: Vec<AttachedCard>) -> Invoice {
        Invoice {
            id: InvoiceId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            name: self.name,
            description: self.description,
            closing_day: self.closing_day,
            due_day: self.due_day,
            status: self.status.into(),
            credit_limit: self.credit_limit,
            used_limit: self.used_limit,
            total_amount: self.total_amount,
            closing_date: self.closing_date,
            due_date: self.due_date,
            payment_date: self.payment_date,
            color: self.color,
            icon: self.icon,
            order: self.display_order,
            is_active: self.is_active,
            cards,
        }
    }
}
