//! Session state entity - Scoped key-value slots for one browsing session.
//! Holds the serialized cart (`cart`), the device-local order log (`orders`)
//! and the remembered order codes (`my_order_codes`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Session state database model - one JSON value per (session, key)
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "session_state")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Browsing session the slot belongs to
    pub session_id: String,
    /// Slot name (e.g., `"cart"`)
    pub key: String,
    /// Slot value serialized as JSON
    pub value: String,
    /// When this slot was last written
    pub updated_at: DateTimeUtc,
}

/// `SessionState` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
