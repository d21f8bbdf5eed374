use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Catalog product. `price` is in the smallest currency unit; `None` means
/// "price on request".
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "products")]
#[serde(rename_all = "camelCase")]
#[schema(as = Product)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(nullable)]
    pub price: Option<i64>,
    #[sea_orm(nullable)]
    pub category_id: Option<i32>,
    pub image_url: String,
    #[sea_orm(column_type = "Json", nullable)]
    pub gallery: Option<Gallery>,
    #[sea_orm(column_type = "Json", nullable)]
    pub specifications: Option<Specifications>,
    pub is_customizable: bool,
    #[sea_orm(nullable)]
    pub material: Option<String>,
    #[sea_orm(nullable)]
    pub seating_capacity: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Ordered list of gallery image URLs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
#[serde(transparent)]
pub struct Gallery(pub Vec<String>);

/// Free-form specification sheet (e.g. "Backrest" -> "Mesh").
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
#[serde(transparent)]
pub struct Specifications(pub BTreeMap<String, String>);

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::quote_item::Entity")]
    QuoteItems,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::quote_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuoteItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
