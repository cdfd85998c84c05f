//! `SeaORM` Entity for payment_methods table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::invoice::AttachedCard;
use tally_shared::types::PaymentMethodId;

use super::sea_orm_active_enums::PaymentMethodType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_methods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: PaymentMethodType,
    pub last_four_digits: Option<String>,
    pub invoice_id: Option<Uuid>,
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
    #[sea_orm(
        belongs_to = "super::invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::invoices::Column::Id",
        on_delete = "SetNull"
    )]
    Invoices,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for AttachedCard {
    fn from(model: Model) -> Self {
        Self {
            id: PaymentMethodId::from_uuid(model.id),
            name: model.name,
            kind: model.kind.into(),
            last_four_digits: model.last_four_digits,
            is_active: model.is_active,
        }
    }
}
