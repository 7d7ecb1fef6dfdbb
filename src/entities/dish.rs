//! Dish entity - A sellable entry of the menu catalog.
//!
//! Dishes are keyed by a stable string slug (e.g. `"pho-bo"`) so that carts
//! persisted before a catalog edit still point at the same record.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Dish database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dishes")]
pub struct Model {
    /// Stable unique identifier (slug)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name (e.g., "Phở Bò Đặc Biệt")
    pub name: String,
    /// Short description shown on the dish card
    pub description: String,
    /// Unit price in the smallest currency unit
    pub price: i64,
    /// Image reference (URL or asset path)
    pub image_url: String,
    /// Slug of the category this dish is listed under
    pub category: String,
    /// Whether the dish is highlighted on the landing page
    pub featured: bool,
    /// Staff can hide a dish without deleting it
    pub is_available: bool,
    /// When the dish was added to the catalog
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Dish and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each dish is listed under one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::Category",
        to = "super::category::Column::Slug"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
