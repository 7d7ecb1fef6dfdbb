/// Database configuration and connection management
pub mod database;

/// Menu seed loading from menu.toml
pub mod menu;

/// Storefront settings from environment variables
pub mod settings;
