use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A property owner with portal access. `identity_id` is the subject
/// assigned by the external identity provider.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub identity_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::property::Entity")]
    Properties,
    #[sea_orm(has_many = "super::invoice_request::Entity")]
    InvoiceRequests,
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Properties.def()
    }
}

impl Related<super::invoice_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvoiceRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
