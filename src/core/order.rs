//! Order compilation - Turns a cart snapshot and customer details into an
//! immutable [`Order`].
//!
//! Line snapshots copy the dish name and unit price at checkout time, so
//! later catalog edits never change what an order says or what it cost.

use crate::{
    core::{
        cart::Cart,
        status::{OrderStatus, StatusMode, StatusSource},
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

/// Whether customers are served at a table or by delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceMode {
    /// Customers give a delivery address
    Delivery,
    /// Customers give a table or seat identifier
    DineIn,
}

impl FromStr for ServiceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delivery" => Ok(Self::Delivery),
            "dine_in" | "dine-in" | "table" => Ok(Self::DineIn),
            other => Err(Error::validation(format!("Unknown service mode: {other}"))),
        }
    }
}

/// Where the order goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceLocation {
    /// Deliver to this address
    Delivery {
        /// Street address
        address: String,
    },
    /// Serve at this table
    Table {
        /// Table or seat identifier
        table: String,
    },
}

impl ServiceLocation {
    /// The service mode this location belongs to
    #[must_use]
    pub const fn mode(&self) -> ServiceMode {
        match self {
            Self::Delivery { .. } => ServiceMode::Delivery,
            Self::Table { .. } => ServiceMode::DineIn,
        }
    }

    /// The address or table identifier
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Delivery { address } => address,
            Self::Table { table } => table,
        }
    }
}

/// Details the customer enters at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    /// Customer name, required
    pub name: String,
    /// Contact phone, required
    pub phone: String,
    /// Delivery address or table, required
    pub location: ServiceLocation,
    /// Free-text notes for the kitchen
    #[serde(default)]
    pub notes: Option<String>,
}

impl CustomerInfo {
    /// Checks the required fields for `mode` and returns a trimmed copy.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] naming the first missing field, or when the
    /// location kind does not match the storefront's service mode.
    pub fn validated(&self, mode: ServiceMode) -> Result<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::validation("Customer name is required"));
        }
        let phone = self.phone.trim();
        if phone.is_empty() {
            return Err(Error::validation("Phone number is required"));
        }
        if self.location.mode() != mode {
            return Err(Error::validation(match mode {
                ServiceMode::Delivery => "A delivery address is required",
                ServiceMode::DineIn => "A table number is required",
            }));
        }
        let location = match &self.location {
            ServiceLocation::Delivery { address } => ServiceLocation::Delivery {
                address: address.trim().to_string(),
            },
            ServiceLocation::Table { table } => ServiceLocation::Table {
                table: table.trim().to_string(),
            },
        };
        if location.value().is_empty() {
            return Err(Error::validation(match mode {
                ServiceMode::Delivery => "A delivery address is required",
                ServiceMode::DineIn => "A table number is required",
            }));
        }
        let notes = self
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            phone: phone.to_string(),
            location,
            notes,
        })
    }
}

/// Short upper-case alphanumeric order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderCode(String);

impl OrderCode {
    /// Normalizes user input (trim, upper case). Returns `None` for input that
    /// cannot be a code: empty, or containing anything but ASCII letters and digits.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let code = raw.trim().to_ascii_uppercase();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(Self(code))
    }

    /// The code text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(char::from(BASE36_DIGITS[(value % 36) as usize]));
        value /= 36;
    }
    digits.iter().rev().collect()
}

/// Issues order codes: a fixed prefix plus the base-36 millisecond timestamp.
///
/// The timestamp part strictly increases across calls on one generator, even
/// when two checkouts land in the same millisecond or the clock steps back.
#[derive(Debug)]
pub struct OrderCodeGenerator {
    prefix: String,
    last_millis: AtomicI64,
}

impl OrderCodeGenerator {
    /// Creates a generator for `prefix` (upper-cased).
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim().to_ascii_uppercase(),
            last_millis: AtomicI64::new(0),
        }
    }

    /// The code prefix
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Produces the next code for a checkout happening at `now`.
    pub fn next_code(&self, now: DateTime<Utc>) -> OrderCode {
        let wanted = now.timestamp_millis().max(0);
        let previous = self
            .last_millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(wanted.max(last + 1))
            })
            .unwrap_or(wanted);
        let millis = wanted.max(previous + 1);
        OrderCode(format!(
            "{}{}",
            self.prefix,
            to_base36(u64::try_from(millis).unwrap_or_default())
        ))
    }
}

/// One line of an order, frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSnapshot {
    /// Dish name at checkout
    pub dish_name: String,
    /// Ordered quantity
    pub quantity: u32,
    /// Unit price at checkout
    pub unit_price: i64,
}

impl LineSnapshot {
    /// Quantity times unit price
    #[must_use]
    pub fn subtotal(&self) -> i64 {
        i64::from(self.quantity) * self.unit_price
    }
}

/// A submitted order. Nothing about it changes after checkout except the
/// stored status of an authoritative-mode order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    code: OrderCode,
    lines: Vec<LineSnapshot>,
    customer: CustomerInfo,
    total: i64,
    status: OrderStatus,
    status_mode: StatusMode,
    created_at: DateTime<Utc>,
}

impl Order {
    /// Rebuilds an order from stored parts.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] if `total` does not match the lines.
    pub fn from_parts(
        code: OrderCode,
        lines: Vec<LineSnapshot>,
        customer: CustomerInfo,
        total: i64,
        status: OrderStatus,
        status_mode: StatusMode,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let computed: i64 = lines.iter().map(LineSnapshot::subtotal).sum();
        if computed != total {
            return Err(Error::validation(format!(
                "Order {code} total {total} does not match its lines ({computed})"
            )));
        }
        Ok(Self {
            code,
            lines,
            customer,
            total,
            status,
            status_mode,
            created_at,
        })
    }

    /// The order code
    #[must_use]
    pub const fn code(&self) -> &OrderCode {
        &self.code
    }

    /// Line snapshots in cart order
    #[must_use]
    pub fn lines(&self) -> &[LineSnapshot] {
        &self.lines
    }

    /// Customer details as validated at checkout
    #[must_use]
    pub const fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    /// Total fixed at checkout
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.total
    }

    /// The status last stored for this order. For simulated orders this stays
    /// `received`; use [`Order::current_status`] for what to show.
    #[must_use]
    pub const fn stored_status(&self) -> OrderStatus {
        self.status
    }

    /// How this order's status is decided
    #[must_use]
    pub const fn status_mode(&self) -> StatusMode {
        self.status_mode
    }

    /// When the order was compiled
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The resolver input for this order.
    #[must_use]
    pub const fn status_source(&self) -> StatusSource {
        match self.status_mode {
            StatusMode::Simulated => StatusSource::Simulated(self.created_at),
            StatusMode::Authoritative => StatusSource::Authoritative(self.status),
        }
    }

    /// Status as of `now`.
    #[must_use]
    pub fn current_status(&self, now: DateTime<Utc>) -> OrderStatus {
        self.status_source().resolve(now)
    }

    /// Copy with a new stored status, used by stores after a checked write.
    pub(crate) fn with_status(&self, status: OrderStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// Compiles `cart` and `customer` into a new order with the given code.
///
/// The cart itself is not touched; clearing it is the caller's job once the
/// order has been stored.
///
/// # Arguments
/// * `cart` - Lines to snapshot; must not be empty
/// * `customer` - Checkout details, validated for `service_mode`
/// * `service_mode` - Whether the storefront delivers or serves at tables
/// * `code` - Code from an [`OrderCodeGenerator`]
/// * `status_mode` - How this order's status will be resolved for its lifetime
/// * `now` - Creation time
///
/// # Errors
/// Returns [`Error::Validation`] when the cart is empty or a customer field is missing.
pub fn compile(
    cart: &Cart,
    customer: &CustomerInfo,
    service_mode: ServiceMode,
    code: OrderCode,
    status_mode: StatusMode,
    now: DateTime<Utc>,
) -> Result<Order> {
    if cart.is_empty() {
        return Err(Error::validation("Cannot place an order with an empty cart"));
    }
    let customer = customer.validated(service_mode)?;

    let lines: Vec<LineSnapshot> = cart
        .lines()
        .iter()
        .map(|line| LineSnapshot {
            dish_name: line.dish.name.clone(),
            quantity: line.quantity,
            unit_price: line.dish.price,
        })
        .collect();
    let total = lines.iter().map(LineSnapshot::subtotal).sum();

    Ok(Order {
        code,
        lines,
        customer,
        total,
        status: OrderStatus::Received,
        status_mode,
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{dine_in_customer, dish, fixed_now};
    use chrono::Duration;

    fn sample_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(&dish("pho-bo", "Phở", 55_000), 2);
        cart.add_item(&dish("ca-phe", "Cà Phê", 25_000), 1);
        cart
    }

    #[test]
    fn test_compile_snapshots_lines_and_total() -> Result<()> {
        let cart = sample_cart();
        let code = OrderCode::parse("AV1A2B3C").unwrap();
        let order = compile(
            &cart,
            &dine_in_customer(),
            ServiceMode::DineIn,
            code.clone(),
            StatusMode::Simulated,
            fixed_now(),
        )?;

        assert_eq!(order.code(), &code);
        assert_eq!(order.total(), 135_000);
        assert_eq!(order.total(), cart.total_price());
        assert_eq!(order.lines().len(), 2);
        assert_eq!(order.lines()[0].dish_name, "Phở");
        assert_eq!(order.lines()[0].quantity, 2);
        assert_eq!(order.lines()[0].unit_price, 55_000);
        assert_eq!(order.current_status(fixed_now()), OrderStatus::Received);
        // The cart is left for the caller to clear
        assert_eq!(cart.len(), 2);
        Ok(())
    }

    #[test]
    fn test_snapshot_is_decoupled_from_catalog() -> Result<()> {
        let mut cart = sample_cart();
        let order = compile(
            &cart,
            &dine_in_customer(),
            ServiceMode::DineIn,
            OrderCode::parse("AV1").unwrap(),
            StatusMode::Simulated,
            fixed_now(),
        )?;

        // A later price change only affects new cart lines
        cart.clear();
        cart.add_item(&dish("pho-bo", "Phở Mới", 99_000), 2);
        assert_eq!(order.lines()[0].dish_name, "Phở");
        assert_eq!(order.total(), 135_000);
        Ok(())
    }

    #[test]
    fn test_compile_rejects_empty_cart() {
        let result = compile(
            &Cart::new(),
            &dine_in_customer(),
            ServiceMode::DineIn,
            OrderCode::parse("AV1").unwrap(),
            StatusMode::Simulated,
            fixed_now(),
        );
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));
    }

    #[test]
    fn test_customer_validation() {
        let mut customer = dine_in_customer();
        assert!(customer.validated(ServiceMode::DineIn).is_ok());
        // Wrong location kind for the service mode
        assert!(customer.validated(ServiceMode::Delivery).is_err());

        customer.name = "  ".to_string();
        assert!(customer.validated(ServiceMode::DineIn).is_err());

        let mut customer = dine_in_customer();
        customer.phone = String::new();
        assert!(customer.validated(ServiceMode::DineIn).is_err());

        let mut customer = dine_in_customer();
        customer.location = ServiceLocation::Table {
            table: " ".to_string(),
        };
        assert!(customer.validated(ServiceMode::DineIn).is_err());

        let delivery = CustomerInfo {
            name: " Lan ".to_string(),
            phone: "0909".to_string(),
            location: ServiceLocation::Delivery {
                address: "12 Lê Lợi".to_string(),
            },
            notes: Some("   ".to_string()),
        };
        let validated = delivery.validated(ServiceMode::Delivery).unwrap();
        assert_eq!(validated.name, "Lan");
        assert_eq!(validated.notes, None);
    }

    #[test]
    fn test_order_code_parse_normalizes() {
        assert_eq!(OrderCode::parse(" av1a2b3c ").unwrap().as_str(), "AV1A2B3C");
        assert!(OrderCode::parse("").is_none());
        assert!(OrderCode::parse("AV-12").is_none());
    }

    #[test]
    fn test_code_generator_is_monotonic() {
        let generator = OrderCodeGenerator::new("av");
        let now = fixed_now();

        let first = generator.next_code(now);
        let second = generator.next_code(now);
        let third = generator.next_code(now - Duration::seconds(5));

        assert!(first.as_str().starts_with("AV"));
        assert_ne!(first, second);
        assert_ne!(second, third);
        assert!(
            first
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn test_from_parts_checks_total() {
        let lines = vec![LineSnapshot {
            dish_name: "Phở".to_string(),
            quantity: 2,
            unit_price: 10,
        }];
        let result = Order::from_parts(
            OrderCode::parse("AV1").unwrap(),
            lines,
            dine_in_customer(),
            21,
            OrderStatus::Received,
            StatusMode::Simulated,
            fixed_now(),
        );
        assert!(result.is_err());
    }
}
