//! Storefront settings loaded from environment variables.
//!
//! Values are read once at startup (after `.env` has been loaded by the
//! binary). Every variable is optional; unset variables fall back to the
//! dine-in, device-local, simulated-status deployment.

use crate::core::order::ServiceMode;
use crate::core::status::StatusMode;
use crate::core::store::OrderBacking;
use crate::errors::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Default prefix of generated order codes
pub const DEFAULT_ORDER_CODE_PREFIX: &str = "AV";

/// Deployment-wide choices for one storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Prefix of generated order codes (`ORDER_CODE_PREFIX`)
    pub order_code_prefix: String,
    /// Where orders are kept (`ORDER_BACKING`: `local` | `remote`)
    pub order_backing: OrderBacking,
    /// How new orders get their status (`STATUS_MODE`: `simulated` | `authoritative`)
    pub status_mode: StatusMode,
    /// Whether customers give an address or a table (`SERVICE_MODE`: `delivery` | `dine_in`)
    pub service_mode: ServiceMode,
    /// Location of the menu seed file (`MENU_PATH`)
    pub menu_path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            order_code_prefix: DEFAULT_ORDER_CODE_PREFIX.to_string(),
            order_backing: OrderBacking::LocalLog,
            status_mode: StatusMode::Simulated,
            service_mode: ServiceMode::DineIn,
            menu_path: PathBuf::from("menu.toml"),
        }
    }
}

impl StoreSettings {
    /// Reads the settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the settings through an arbitrary lookup function.
    ///
    /// `from_env` is a thin wrapper; tests pass a map instead of touching the
    /// real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let order_code_prefix = match lookup("ORDER_CODE_PREFIX") {
            Some(prefix) => validate_prefix(&prefix)?,
            None => defaults.order_code_prefix,
        };

        Ok(Self {
            order_code_prefix,
            order_backing: parse_var(&lookup, "ORDER_BACKING", defaults.order_backing)?,
            status_mode: parse_var(&lookup, "STATUS_MODE", defaults.status_mode)?,
            service_mode: parse_var(&lookup, "SERVICE_MODE", defaults.service_mode)?,
            menu_path: lookup("MENU_PATH").map_or(defaults.menu_path, PathBuf::from),
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr<Err = Error>,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.parse().map_err(|e: Error| Error::Config {
            message: format!("{key}: {e}"),
        })
    })
}

fn validate_prefix(raw: &str) -> Result<String> {
    let prefix = raw.trim().to_uppercase();
    if prefix.is_empty() || prefix.len() > 4 || !prefix.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(Error::Config {
            message: format!("ORDER_CODE_PREFIX must be 1-4 ASCII letters or digits, got {raw:?}"),
        });
    }
    Ok(prefix)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let settings = StoreSettings::from_lookup(|_| None).unwrap();
        assert_eq!(settings, StoreSettings::default());
        assert_eq!(settings.order_code_prefix, "AV");
    }

    #[test]
    fn test_reads_every_variable() {
        let settings = StoreSettings::from_lookup(lookup_from(&[
            ("ORDER_CODE_PREFIX", "qn"),
            ("ORDER_BACKING", "remote"),
            ("STATUS_MODE", "authoritative"),
            ("SERVICE_MODE", "delivery"),
            ("MENU_PATH", "/etc/menu.toml"),
        ]))
        .unwrap();

        assert_eq!(settings.order_code_prefix, "QN");
        assert_eq!(settings.order_backing, OrderBacking::RemoteTable);
        assert_eq!(settings.status_mode, StatusMode::Authoritative);
        assert_eq!(settings.service_mode, ServiceMode::Delivery);
        assert_eq!(settings.menu_path, PathBuf::from("/etc/menu.toml"));
    }

    #[test]
    fn test_rejects_unknown_values() {
        let result = StoreSettings::from_lookup(lookup_from(&[("STATUS_MODE", "psychic")]));
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));

        let result = StoreSettings::from_lookup(lookup_from(&[("ORDER_CODE_PREFIX", "A-V")]));
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));
    }
}
