//! Session slots - Scoped key-value storage for one browsing session.
//!
//! Each slot is one row of the `session_state` table holding a JSON value. The
//! cart, the device-local order log and the remembered order codes all live
//! here. Functions take any [`ConnectionTrait`] so they can join a checkout
//! transaction.

use crate::{
    core::order::OrderCode,
    entities::{SessionState, session_state},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};

/// Slot holding the serialized cart
pub const CART_KEY: &str = "cart";
/// Slot holding the device-local order log
pub const ORDERS_KEY: &str = "orders";
/// Slot holding the codes of orders this session placed or looked up
pub const MY_ORDER_CODES_KEY: &str = "my_order_codes";
/// How many order codes a session remembers; the oldest are forgotten first
pub const MAX_REMEMBERED_CODES: usize = 50;

async fn find_slot<C>(db: &C, session_id: &str, key: &str) -> Result<Option<session_state::Model>>
where
    C: ConnectionTrait,
{
    SessionState::find()
        .filter(session_state::Column::SessionId.eq(session_id))
        .filter(session_state::Column::Key.eq(key))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Reads and deserializes a slot; `Ok(None)` when the slot was never written.
///
/// # Errors
/// Returns a database error, or a serialization error if the stored JSON does
/// not match `T`.
pub async fn read_slot<C, T>(db: &C, session_id: &str, key: &str) -> Result<Option<T>>
where
    C: ConnectionTrait,
    T: DeserializeOwned,
{
    match find_slot(db, session_id, key).await? {
        Some(row) => Ok(Some(serde_json::from_str(&row.value)?)),
        None => Ok(None),
    }
}

/// Serializes `value` into a slot, inserting or replacing it.
#[instrument(skip(db, value))]
pub async fn write_slot<C, T>(db: &C, session_id: &str, key: &str, value: &T) -> Result<()>
where
    C: ConnectionTrait,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(value)?;
    let now = Utc::now();

    if let Some(row) = find_slot(db, session_id, key).await? {
        let mut active_model: session_state::ActiveModel = row.into();
        active_model.value = Set(json);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        session_state::ActiveModel {
            session_id: Set(session_id.to_string()),
            key: Set(key.to_string()),
            value: Set(json),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    debug!("Wrote session slot {}", key);
    Ok(())
}

/// Codes remembered by this session, oldest first.
pub async fn remembered_codes<C>(db: &C, session_id: &str) -> Result<Vec<OrderCode>>
where
    C: ConnectionTrait,
{
    Ok(read_slot(db, session_id, MY_ORDER_CODES_KEY)
        .await?
        .unwrap_or_default())
}

/// Adds `code` to the remembered list unless it is already there.
pub async fn remember_code<C>(db: &C, session_id: &str, code: &OrderCode) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut codes = remembered_codes(db, session_id).await?;
    if codes.contains(code) {
        return Ok(());
    }
    codes.push(code.clone());
    if codes.len() > MAX_REMEMBERED_CODES {
        let excess = codes.len() - MAX_REMEMBERED_CODES;
        codes.drain(..excess);
    }
    write_slot(db, session_id, MY_ORDER_CODES_KEY, &codes).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_read_missing_slot() -> Result<()> {
        let db = setup_test_db().await?;
        let value: Option<Vec<String>> = read_slot(&db, "s1", CART_KEY).await?;
        assert!(value.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_write_slot_replaces_existing_row() -> Result<()> {
        let db = setup_test_db().await?;

        write_slot(&db, "s1", "greeting", &"hello").await?;
        write_slot(&db, "s1", "greeting", &"xin chào").await?;

        let value: Option<String> = read_slot(&db, "s1", "greeting").await?;
        assert_eq!(value.as_deref(), Some("xin chào"));

        let count = SessionState::find()
            .filter(session_state::Column::Key.eq("greeting"))
            .count(&db)
            .await?;
        assert_eq!(count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_slots_are_scoped_by_session() -> Result<()> {
        let db = setup_test_db().await?;

        write_slot(&db, "s1", CART_KEY, &vec![1, 2]).await?;
        let other: Option<Vec<i32>> = read_slot(&db, "s2", CART_KEY).await?;
        assert!(other.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_remember_code_deduplicates_and_caps() -> Result<()> {
        let db = setup_test_db().await?;
        let code = OrderCode::parse("AV1").unwrap();

        remember_code(&db, "s1", &code).await?;
        remember_code(&db, "s1", &code).await?;
        assert_eq!(remembered_codes(&db, "s1").await?, vec![code]);

        for n in 0..MAX_REMEMBERED_CODES + 5 {
            let code = OrderCode::parse(&format!("AVX{n}")).unwrap();
            remember_code(&db, "s1", &code).await?;
        }
        let codes = remembered_codes(&db, "s1").await?;
        assert_eq!(codes.len(), MAX_REMEMBERED_CODES);
        assert_eq!(codes.last().unwrap().as_str(), format!("AVX{}", MAX_REMEMBERED_CODES + 4));
        Ok(())
    }
}
