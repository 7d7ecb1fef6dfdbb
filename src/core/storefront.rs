//! Storefront session controller.
//!
//! A [`Storefront`] owns everything one browsing session can change: its cart,
//! its remembered order codes and its view of the order store. All cart
//! mutations go through `&mut self`, so there is exactly one writer per
//! session. Each mutation updates memory first and then writes the `cart`
//! slot; if that write fails the error is returned but the in-memory cart
//! stays as the source of truth for the session.

use crate::{
    config::settings::StoreSettings,
    core::{
        cart::Cart,
        catalog::Dish,
        clock::{Clock, SystemClock},
        feed::{StatusChange, StatusFeed, StatusSubscription},
        order::{self, CustomerInfo, Order, OrderCode, OrderCodeGenerator},
        session::{self, CART_KEY},
        status::OrderStatus,
        store::OrderStore,
    },
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// An order together with the status it resolves to right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedOrder {
    /// The stored order
    pub order: Order,
    /// Status resolved at lookup time
    pub status: OrderStatus,
}

/// The session-scoped entry point the UI layer calls.
#[derive(Debug)]
pub struct Storefront {
    db: DatabaseConnection,
    session_id: String,
    settings: StoreSettings,
    store: OrderStore,
    codes: Arc<OrderCodeGenerator>,
    cart: Cart,
    feed: StatusFeed,
    clock: Arc<dyn Clock>,
}

impl Storefront {
    /// Opens a session, restoring its cart from the `cart` slot.
    ///
    /// A slot that cannot be parsed is logged and replaced by an empty cart.
    #[instrument(skip(db, settings))]
    pub async fn open(
        db: DatabaseConnection,
        session_id: &str,
        settings: StoreSettings,
    ) -> Result<Self> {
        let cart = match session::read_slot::<_, Cart>(&db, session_id, CART_KEY).await {
            Ok(saved) => saved.unwrap_or_default(),
            Err(Error::Serialization(e)) => {
                warn!("Discarding unreadable cart for session {}: {}", session_id, e);
                Cart::new()
            }
            Err(e) => return Err(e),
        };
        info!(
            "Opened session {} with {} cart lines",
            session_id,
            cart.len()
        );

        Ok(Self {
            store: OrderStore::new(settings.order_backing, session_id),
            codes: Arc::new(OrderCodeGenerator::new(&settings.order_code_prefix)),
            db,
            session_id: session_id.to_string(),
            settings,
            cart,
            feed: StatusFeed::new(),
            clock: Arc::new(SystemClock),
        })
    }

    /// Uses `clock` instead of the wall clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Publishes status changes on a feed shared with other sessions.
    #[must_use]
    pub fn with_feed(mut self, feed: StatusFeed) -> Self {
        self.feed = feed;
        self
    }

    /// Shares an order code generator with other sessions of the same process.
    #[must_use]
    pub fn with_code_generator(mut self, codes: Arc<OrderCodeGenerator>) -> Self {
        self.codes = codes;
        self
    }

    /// The session id
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The settings this session runs with
    #[must_use]
    pub const fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Read-only view of the cart
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Adds `quantity` of `dish` to the cart and opens the cart view.
    pub async fn add_to_cart(&mut self, dish: &Dish, quantity: u32) -> Result<()> {
        self.cart.add_item(dish, quantity);
        self.persist_cart().await
    }

    /// Sets a line's quantity; zero or less removes the line.
    pub async fn update_cart_quantity(&mut self, dish_id: &str, quantity: i64) -> Result<()> {
        self.cart.update_quantity(dish_id, quantity);
        self.persist_cart().await
    }

    /// Removes a line from the cart.
    pub async fn remove_from_cart(&mut self, dish_id: &str) -> Result<()> {
        self.cart.remove_item(dish_id);
        self.persist_cart().await
    }

    /// Empties the cart.
    pub async fn clear_cart(&mut self) -> Result<()> {
        self.cart.clear();
        self.persist_cart().await
    }

    /// Opens or closes the cart view. Not persisted.
    pub fn set_cart_open(&mut self, open: bool) {
        self.cart.set_open(open);
    }

    async fn persist_cart(&self) -> Result<()> {
        session::write_slot(&self.db, &self.session_id, CART_KEY, &self.cart)
            .await
            .inspect_err(|e| {
                error!(
                    "Cart for session {} may not survive a reload: {}",
                    self.session_id, e
                );
            })
    }

    /// Places an order for the current cart and returns its code.
    ///
    /// # Arguments
    /// * `customer` - Details entered at checkout; validated against the
    ///   storefront's service mode
    ///
    /// The order, the emptied cart and the remembered code are written in one
    /// database transaction. The in-memory cart is cleared only after that
    /// transaction commits, so a failed checkout leaves the cart as it was and
    /// no order visible. A code collision is retried once with a fresh code.
    ///
    /// # Errors
    /// - [`Error::Validation`] for an empty cart or missing customer details
    /// - [`Error::DuplicateCode`] if the retry collides as well
    /// - a persistence error if the transaction fails
    #[instrument(skip(self, customer), fields(session = %self.session_id))]
    pub async fn submit_order(&mut self, customer: &CustomerInfo) -> Result<OrderCode> {
        let now = self.clock.now();
        let mut retried = false;

        let order = loop {
            let code = self.codes.next_code(now);
            let order = order::compile(
                &self.cart,
                customer,
                self.settings.service_mode,
                code,
                self.settings.status_mode,
                now,
            )?;

            match self.commit_order(&order).await {
                Ok(()) => break order,
                Err(Error::DuplicateCode { code }) if !retried => {
                    warn!("Order code {} already taken, regenerating", code);
                    retried = true;
                }
                Err(e) => return Err(e),
            }
        };

        self.cart.clear();
        self.cart.set_open(false);
        info!(
            "Order {} placed: {} lines, total {}",
            order.code(),
            order.lines().len(),
            order.total()
        );
        Ok(order.code().clone())
    }

    async fn commit_order(&self, order: &Order) -> Result<()> {
        let txn = self.db.begin().await?;
        self.store.save(&txn, order).await?;
        session::write_slot(&txn, &self.session_id, CART_KEY, &Cart::new()).await?;
        session::remember_code(&txn, &self.session_id, order.code()).await?;
        txn.commit().await?;
        Ok(())
    }

    fn track(&self, order: Order) -> TrackedOrder {
        let status = order.current_status(self.clock.now());
        TrackedOrder { order, status }
    }

    /// Looks an order up by code, ignoring case and surrounding whitespace.
    ///
    /// A found order is remembered so it shows up in [`Storefront::list_my_orders`].
    pub async fn lookup_order(&self, code: &str) -> Result<Option<TrackedOrder>> {
        let Some(code) = OrderCode::parse(code) else {
            return Ok(None);
        };
        let Some(order) = self.store.find_by_code(&self.db, &code).await? else {
            return Ok(None);
        };
        if let Err(e) = session::remember_code(&self.db, &self.session_id, &code).await {
            warn!("Could not remember order {}: {}", code, e);
        }
        Ok(Some(self.track(order)))
    }

    /// Orders this session placed or looked up, newest first.
    pub async fn list_my_orders(&self) -> Result<Vec<TrackedOrder>> {
        let codes = session::remembered_codes(&self.db, &self.session_id).await?;
        Ok(self
            .store
            .list_by_codes(&self.db, &codes)
            .await?
            .into_iter()
            .map(|order| self.track(order))
            .collect())
    }

    /// Every order visible to this store, newest first (admin view).
    pub async fn list_all_orders(&self) -> Result<Vec<TrackedOrder>> {
        Ok(self
            .store
            .list_all(&self.db)
            .await?
            .into_iter()
            .map(|order| self.track(order))
            .collect())
    }

    /// Number of orders not yet completed (admin view).
    pub async fn active_order_count(&self) -> Result<usize> {
        Ok(self
            .list_all_orders()
            .await?
            .iter()
            .filter(|tracked| tracked.status.is_active())
            .count())
    }

    /// Writes a staff-decided status for an authoritative-mode order and
    /// publishes it on the status feed. `Ok(None)` when the code is unknown.
    /// Nothing is published when the write is rejected.
    ///
    /// # Arguments
    /// * `code` - Order code as typed, any case
    /// * `status` - Status to record
    ///
    /// # Errors
    /// - [`Error::StatusRegression`] if the write would move the order backwards
    /// - [`Error::Validation`] if the order follows the simulated timeline
    #[instrument(skip(self))]
    pub async fn set_order_status(
        &self,
        code: &str,
        status: OrderStatus,
    ) -> Result<Option<TrackedOrder>> {
        let Some(code) = OrderCode::parse(code) else {
            return Ok(None);
        };
        let Some(order) = self.store.update_status(&self.db, &code, status).await? else {
            return Ok(None);
        };
        self.feed.publish(StatusChange {
            code,
            status,
            at: self.clock.now(),
        });
        Ok(Some(self.track(order)))
    }

    /// Subscribes to staff status writes.
    #[must_use]
    pub fn subscribe(&self) -> StatusSubscription {
        self.feed.subscribe()
    }
}
