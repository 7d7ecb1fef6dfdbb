//! Shared test utilities for `OrderBuddy`.
//!
//! This module provides helpers for setting up test databases and building
//! dishes, menus, customers and orders with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    config::menu::{CategoryConfig, DishConfig, MenuConfig, parse_menu},
    core::{
        catalog::Dish,
        clock::Clock,
        order::{CustomerInfo, LineSnapshot, Order, OrderCode, ServiceLocation},
        status::{OrderStatus, StatusMode},
    },
    errors::Result,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use std::sync::{Mutex, Once};

static TRACING: Once = Once::new();

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Routes `tracing` output to the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("order_buddy=debug")
            .with_test_writer()
            .try_init();
    });
}

/// A fixed instant: 2025-03-01 12:00:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

/// Creates an available, non-featured dish in the `mon-chinh` category.
pub fn dish(id: &str, name: &str, price: i64) -> Dish {
    Dish {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name} description"),
        price,
        image: String::new(),
        category: "mon-chinh".to_string(),
        featured: false,
        available: true,
    }
}

/// A small menu: two categories and three dishes.
///
/// # Contents
/// * `mon-chinh`: `pho-bo` (55 000, featured), `banh-mi` (30 000)
/// * `do-uong`: `ca-phe` (25 000)
pub fn sample_menu() -> MenuConfig {
    let category = |slug: &str, name: &str| CategoryConfig {
        slug: slug.to_string(),
        name: name.to_string(),
        icon: String::new(),
    };
    let dish = |id: &str, name: &str, price: i64, category: &str, featured: bool| DishConfig {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name} description"),
        price,
        image: String::new(),
        category: category.to_string(),
        featured,
    };
    MenuConfig {
        categories: vec![category("mon-chinh", "Món Chính"), category("do-uong", "Đồ Uống")],
        dishes: vec![
            dish("pho-bo", "Phở Bò", 55_000, "mon-chinh", true),
            dish("banh-mi", "Bánh Mì", 30_000, "mon-chinh", false),
            dish("ca-phe", "Cà Phê Sữa Đá", 25_000, "do-uong", false),
        ],
    }
}

/// Loads the menu.toml shipped at the repository root.
pub fn shipped_menu() -> MenuConfig {
    parse_menu(include_str!("../menu.toml")).unwrap()
}

/// A dine-in customer at table 5.
pub fn dine_in_customer() -> CustomerInfo {
    CustomerInfo {
        name: "Nguyễn Văn A".to_string(),
        phone: "0901234567".to_string(),
        location: ServiceLocation::Table {
            table: "5".to_string(),
        },
        notes: None,
    }
}

/// A received order with one line of two `Phở Bò`.
pub fn sample_order(code: &str, status_mode: StatusMode, created_at: DateTime<Utc>) -> Order {
    let lines = vec![LineSnapshot {
        dish_name: "Phở Bò".to_string(),
        quantity: 2,
        unit_price: 55_000,
    }];
    Order::from_parts(
        OrderCode::parse(code).unwrap(),
        lines,
        dine_in_customer(),
        110_000,
        OrderStatus::Received,
        status_mode,
        created_at,
    )
    .unwrap()
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Starts the clock at `start`.
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Jumps to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap() = instant;
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
