//! Order entity - The shared order table used by the remote-backed deployment.
//!
//! Line snapshots live in [`super::order_item`]. Status is stored as its
//! lower-case wire name and only ever written forward.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Surrogate key used by `order_items`
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-typeable order code, always stored upper case
    #[sea_orm(unique)]
    pub order_code: String,
    /// Customer name as entered at checkout
    pub customer_name: String,
    /// Customer phone as entered at checkout
    pub customer_phone: String,
    /// `"delivery"` or `"table"`
    pub service_kind: String,
    /// Delivery address or table identifier, depending on `service_kind`
    pub location: String,
    /// Optional free-text notes for the kitchen
    pub notes: Option<String>,
    /// Total fixed at creation, smallest currency unit
    pub total: i64,
    /// Last status written (`"received"`, `"preparing"`, ...)
    pub status: String,
    /// `"simulated"` or `"authoritative"`
    pub status_mode: String,
    /// When the order was compiled
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order has many line snapshots
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
