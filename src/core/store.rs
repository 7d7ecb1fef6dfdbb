//! Order lookup store - Persists orders and finds them again by code.
//!
//! A deployment keeps orders in exactly one of two places, picked by
//! [`OrderBacking`]:
//!
//! - [`OrderBacking::LocalLog`]: an append-only JSON array in the session's
//!   `orders` slot. Only the device that placed an order can see it.
//! - [`OrderBacking::RemoteTable`]: the shared `orders` and `order_items`
//!   tables, reachable by code from any session.
//!
//! Codes are matched case-insensitively: every stored code is upper case and
//! every query goes through [`OrderCode::parse`].

use crate::{
    core::{
        order::{CustomerInfo, LineSnapshot, Order, OrderCode, ServiceLocation},
        session::{self, ORDERS_KEY},
        status::{OrderStatus, StatusMode, check_transition},
    },
    entities::{Order as OrderEntity, OrderItem, order, order_item},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, SqlErr, prelude::*, sea_query::Expr};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

/// Where a deployment keeps its orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderBacking {
    /// Append-only log in the session's key-value slot
    LocalLog,
    /// Shared relational tables
    RemoteTable,
}

impl fmt::Display for OrderBacking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LocalLog => "local",
            Self::RemoteTable => "remote",
        })
    }
}

impl FromStr for OrderBacking {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::LocalLog),
            "remote" => Ok(Self::RemoteTable),
            other => Err(Error::validation(format!("Unknown order backing: {other}"))),
        }
    }
}

/// Order persistence for one session.
///
/// `scope` is the session whose slot holds the local log; the remote backing
/// ignores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStore {
    backing: OrderBacking,
    scope: String,
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.code().cmp(a.code()))
    });
}

impl OrderStore {
    /// Creates a store for `backing`, scoped to `session_id` for the local log.
    #[must_use]
    pub fn new(backing: OrderBacking, session_id: impl Into<String>) -> Self {
        Self {
            backing,
            scope: session_id.into(),
        }
    }

    /// The backing this store writes to
    #[must_use]
    pub const fn backing(&self) -> OrderBacking {
        self.backing
    }

    /// Stores a new order.
    ///
    /// The local log appends to the session's `orders` slot. The remote table
    /// inserts the order row and then one `order_items` row per line, keeping
    /// line order in `position`. Pass a transaction as `db` to make the save
    /// part of a larger atomic write.
    ///
    /// # Arguments
    /// * `db` - Connection or open transaction
    /// * `order` - The compiled order; its code must not be stored yet
    ///
    /// # Errors
    /// Returns an error if:
    /// - An order with the same code exists ([`Error::DuplicateCode`]), including
    ///   when a concurrent writer wins the unique index on `order_code`
    /// - The database write or slot serialization fails
    #[instrument(skip(self, db, order), fields(code = %order.code(), backing = %self.backing))]
    pub async fn save<C>(&self, db: &C, order: &Order) -> Result<()>
    where
        C: ConnectionTrait,
    {
        match self.backing {
            OrderBacking::LocalLog => {
                let mut log = self.read_log(db).await?;
                if log.iter().any(|o| o.code() == order.code()) {
                    return Err(Error::DuplicateCode {
                        code: order.code().to_string(),
                    });
                }
                log.push(order.clone());
                session::write_slot(db, &self.scope, ORDERS_KEY, &log).await?;
            }
            OrderBacking::RemoteTable => insert_remote(db, order).await?,
        }
        info!("Saved order {} ({} lines)", order.code(), order.lines().len());
        Ok(())
    }

    /// Finds an order by code, ignoring case. `Ok(None)` when absent.
    pub async fn find_by_code<C>(&self, db: &C, code: &OrderCode) -> Result<Option<Order>>
    where
        C: ConnectionTrait,
    {
        match self.backing {
            OrderBacking::LocalLog => Ok(self
                .read_log(db)
                .await?
                .into_iter()
                .find(|o| o.code() == code)),
            OrderBacking::RemoteTable => {
                let found = OrderEntity::find()
                    .filter(order::Column::OrderCode.eq(code.as_str()))
                    .find_with_related(OrderItem)
                    .all(db)
                    .await?;
                found
                    .into_iter()
                    .next()
                    .map(|(model, items)| order_from_rows(model, items))
                    .transpose()
            }
        }
    }

    /// Orders whose codes are in `codes`, newest first. Unknown codes are skipped.
    pub async fn list_by_codes<C>(&self, db: &C, codes: &[OrderCode]) -> Result<Vec<Order>>
    where
        C: ConnectionTrait,
    {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let mut orders = match self.backing {
            OrderBacking::LocalLog => self
                .read_log(db)
                .await?
                .into_iter()
                .filter(|o| codes.contains(o.code()))
                .collect(),
            OrderBacking::RemoteTable => {
                let rows = OrderEntity::find()
                    .filter(order::Column::OrderCode.is_in(codes.iter().map(OrderCode::as_str)))
                    .order_by_desc(order::Column::CreatedAt)
                    .find_with_related(OrderItem)
                    .all(db)
                    .await?;
                rows.into_iter()
                    .map(|(model, items)| order_from_rows(model, items))
                    .collect::<Result<Vec<_>>>()?
            }
        };
        newest_first(&mut orders);
        Ok(orders)
    }

    /// Every order this store can see, newest first (admin view).
    pub async fn list_all<C>(&self, db: &C) -> Result<Vec<Order>>
    where
        C: ConnectionTrait,
    {
        let mut orders = match self.backing {
            OrderBacking::LocalLog => self.read_log(db).await?,
            OrderBacking::RemoteTable => OrderEntity::find()
                .order_by_desc(order::Column::CreatedAt)
                .find_with_related(OrderItem)
                .all(db)
                .await?
                .into_iter()
                .map(|(model, items)| order_from_rows(model, items))
                .collect::<Result<Vec<_>>>()?,
        };
        newest_first(&mut orders);
        Ok(orders)
    }

    /// Writes a new status for an authoritative-mode order and returns the
    /// updated order. `Ok(None)` when the code is unknown.
    ///
    /// On the remote table the forward-only check is repeated inside the
    /// `UPDATE` itself, so a stale writer cannot move an order back after a
    /// concurrent writer advanced it.
    ///
    /// # Arguments
    /// * `db` - Connection or open transaction
    /// * `code` - Normalized order code
    /// * `status` - Status staff want to record; equal to or ahead of the stored one
    ///
    /// # Errors
    /// - [`Error::Validation`] if the order's status is simulated
    /// - [`Error::StatusRegression`] if `status` is behind the stored one
    #[instrument(skip(self, db), fields(backing = %self.backing))]
    pub async fn update_status<C>(
        &self,
        db: &C,
        code: &OrderCode,
        status: OrderStatus,
    ) -> Result<Option<Order>>
    where
        C: ConnectionTrait,
    {
        match self.backing {
            OrderBacking::LocalLog => {
                let mut log = self.read_log(db).await?;
                let Some(slot) = log.iter_mut().find(|o| o.code() == code) else {
                    return Ok(None);
                };
                ensure_writable(slot, status)?;
                *slot = slot.with_status(status);
                let updated = slot.clone();
                session::write_slot(db, &self.scope, ORDERS_KEY, &log).await?;
                debug!("Order {} status set to {}", code, status);
                Ok(Some(updated))
            }
            OrderBacking::RemoteTable => {
                let found = OrderEntity::find()
                    .filter(order::Column::OrderCode.eq(code.as_str()))
                    .find_with_related(OrderItem)
                    .all(db)
                    .await?;
                let Some((model, items)) = found.into_iter().next() else {
                    return Ok(None);
                };
                let current = order_from_rows(model, items)?;
                ensure_writable(&current, status)?;

                write_remote_status(db, code, status).await?;
                debug!("Order {} status set to {}", code, status);
                Ok(Some(current.with_status(status)))
            }
        }
    }

    async fn read_log<C>(&self, db: &C) -> Result<Vec<Order>>
    where
        C: ConnectionTrait,
    {
        Ok(session::read_slot(db, &self.scope, ORDERS_KEY)
            .await?
            .unwrap_or_default())
    }
}

fn ensure_writable(order: &Order, status: OrderStatus) -> Result<()> {
    if order.status_mode() != StatusMode::Authoritative {
        return Err(Error::validation(format!(
            "Order {} follows the simulated timeline; its status cannot be written",
            order.code()
        )));
    }
    check_transition(order.stored_status(), status)
}

/// Writes `status` only if the stored row is still at or behind it.
///
/// The check and the write are one `UPDATE`, so a concurrent writer that
/// already moved the order further ahead wins and this write reports
/// [`Error::StatusRegression`] against the status it lost to.
async fn write_remote_status<C>(db: &C, code: &OrderCode, status: OrderStatus) -> Result<()>
where
    C: ConnectionTrait,
{
    let not_ahead = OrderStatus::ALL
        .into_iter()
        .filter(|stored| *stored <= status)
        .map(OrderStatus::as_str);

    let result = OrderEntity::update_many()
        .col_expr(order::Column::Status, Expr::value(status.as_str()))
        .filter(order::Column::OrderCode.eq(code.as_str()))
        .filter(order::Column::StatusMode.eq(StatusMode::Authoritative.as_str()))
        .filter(order::Column::Status.is_in(not_ahead))
        .exec(db)
        .await?;
    if result.rows_affected > 0 {
        return Ok(());
    }

    let stored = OrderEntity::find()
        .filter(order::Column::OrderCode.eq(code.as_str()))
        .one(db)
        .await?
        .ok_or_else(|| Error::validation(format!("Order {code} disappeared during update")))?;
    let from: OrderStatus = stored.status.parse()?;
    warn!("Status write {} -> {} lost to a concurrent write", code, status);
    check_transition(from, status)?;
    Err(Error::validation(format!(
        "Order {code} status could not be written"
    )))
}

/// Maps a unique-index violation on `order_code` to [`Error::DuplicateCode`].
fn duplicate_code_or(err: DbErr, code: &OrderCode) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::DuplicateCode {
            code: code.to_string(),
        },
        _ => err.into(),
    }
}

/// Inserts the order row and its lines.
///
/// Uniqueness of the code is left to the `order_code` unique index, so two
/// writers racing on the same code cannot both succeed.
async fn insert_remote<C>(db: &C, order: &Order) -> Result<()>
where
    C: ConnectionTrait,
{
    let customer = order.customer();
    let (service_kind, location) = match &customer.location {
        ServiceLocation::Delivery { address } => ("delivery", address.clone()),
        ServiceLocation::Table { table } => ("table", table.clone()),
    };

    let saved = order::ActiveModel {
        order_code: Set(order.code().to_string()),
        customer_name: Set(customer.name.clone()),
        customer_phone: Set(customer.phone.clone()),
        service_kind: Set(service_kind.to_string()),
        location: Set(location),
        notes: Set(customer.notes.clone()),
        total: Set(order.total()),
        status: Set(order.stored_status().as_str().to_string()),
        status_mode: Set(order.status_mode().as_str().to_string()),
        created_at: Set(order.created_at()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| duplicate_code_or(e, order.code()))?;

    for (position, line) in order.lines().iter().enumerate() {
        order_item::ActiveModel {
            order_id: Set(saved.id),
            position: Set(i32::try_from(position).unwrap_or(i32::MAX)),
            dish_name: Set(line.dish_name.clone()),
            quantity: Set(i32::try_from(line.quantity).unwrap_or(i32::MAX)),
            price: Set(line.unit_price),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

fn order_from_rows(model: order::Model, mut items: Vec<order_item::Model>) -> Result<Order> {
    items.sort_by_key(|item| item.position);
    let lines = items
        .into_iter()
        .map(|item| {
            let quantity = u32::try_from(item.quantity)
                .ok()
                .filter(|quantity| *quantity > 0)
                .ok_or_else(|| {
                    Error::validation(format!(
                        "Order {} has a line with invalid quantity {}",
                        model.order_code, item.quantity
                    ))
                })?;
            Ok(LineSnapshot {
                dish_name: item.dish_name,
                quantity,
                unit_price: item.price,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let location = match model.service_kind.as_str() {
        "delivery" => ServiceLocation::Delivery {
            address: model.location,
        },
        "table" => ServiceLocation::Table {
            table: model.location,
        },
        other => {
            return Err(Error::validation(format!(
                "Order {} has unknown service kind {other}",
                model.order_code
            )));
        }
    };
    let code = OrderCode::parse(&model.order_code).ok_or_else(|| {
        Error::validation(format!("Stored order code is malformed: {}", model.order_code))
    })?;

    Order::from_parts(
        code,
        lines,
        CustomerInfo {
            name: model.customer_name,
            phone: model.customer_phone,
            location,
            notes: model.notes,
        },
        model.total,
        model.status.parse()?,
        model.status_mode.parse()?,
        model.created_at,
    )
}
