use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owning client; agency-owned listings have no owner.
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub bedrooms: i16,
    pub bathrooms: i16,
    pub square_meters: i32,
    pub year_built: Option<i16>,
    pub floor: Option<i16>,
    pub property_type: String,
    pub status: String,
    pub address: String,
    pub city: String,
    pub published: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::OwnerId",
        to = "super::client::Column::Id"
    )]
    Owner,
    #[sea_orm(has_many = "super::property_image::Entity")]
    Images,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::property_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
