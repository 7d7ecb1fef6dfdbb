//! Category entity - Groups dishes for the filtered menu view.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// URL-friendly identifier (e.g., `"do-uong"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub slug: String,
    /// Display name
    pub name: String,
    /// Small icon shown next to the name
    pub icon: String,
    /// Sort position in the category filter
    pub position: i32,
}

/// One category lists many dishes
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Dishes listed under this category
    #[sea_orm(has_many = "super::dish::Entity")]
    Dishes,
}

impl Related<super::dish::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dishes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
