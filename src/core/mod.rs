//! Framework-agnostic storefront logic.
//!
//! Everything here works against a `sea_orm` connection and plain domain types;
//! no UI concerns leak in.

/// Cart lines and totals
pub mod cart;
/// Menu browsing and admin dish management
pub mod catalog;
/// Injectable time source
pub mod clock;
/// Push channel for staff status writes
pub mod feed;
/// Checkout: customer details, order codes, order compilation
pub mod order;
/// Per-session key-value slots
pub mod session;
/// Order status lifecycle
pub mod status;
/// Local-log and remote-table order storage
pub mod store;
/// Session controller tying cart, checkout and tracking together
pub mod storefront;
