//! Menu seed loading from menu.toml
//!
//! The categories and dishes defined in menu.toml seed the catalog on first run,
//! and back the [`StaticCatalog`](crate::core::catalog::StaticCatalog) when no
//! database catalog is wanted.

use crate::core::catalog::NewDish;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire menu.toml file
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MenuConfig {
    /// Categories in display order
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
    /// Dishes offered on the menu
    #[serde(default)]
    pub dishes: Vec<DishConfig>,
}

/// Configuration for a single category
#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    /// URL-friendly identifier, referenced by [`DishConfig::category`]
    pub slug: String,
    /// Display name
    pub name: String,
    /// Icon shown in the category filter
    #[serde(default)]
    pub icon: String,
}

/// Configuration for a single dish
#[derive(Debug, Deserialize, Clone)]
pub struct DishConfig {
    /// Stable identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Description shown on the dish card
    pub description: String,
    /// Unit price in the smallest currency unit
    pub price: i64,
    /// Image reference
    #[serde(default)]
    pub image: String,
    /// Category slug
    pub category: String,
    /// Whether the dish is highlighted on the landing page
    #[serde(default)]
    pub featured: bool,
}

impl DishConfig {
    fn to_new_dish(&self) -> NewDish {
        NewDish {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            image: self.image.clone(),
            category: self.category.clone(),
            featured: self.featured,
        }
    }
}

impl MenuConfig {
    /// Checks that every dish points at a declared category, that ids are
    /// unique, and that each dish passes the same name, description and price
    /// checks as a dish added by staff.
    ///
    /// # Errors
    /// Returns [`Error::Config`] naming the first offending dish.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for dish in &self.dishes {
            if !seen.insert(dish.id.as_str()) {
                return Err(Error::Config {
                    message: format!("Duplicate dish id in menu: {}", dish.id),
                });
            }
            if !self.categories.iter().any(|c| c.slug == dish.category) {
                return Err(Error::Config {
                    message: format!(
                        "Dish {} references unknown category {}",
                        dish.id, dish.category
                    ),
                });
            }
            dish.to_new_dish()
                .validated()
                .map_err(|e| Error::Config {
                    message: format!("Dish {} in menu is invalid: {e}", dish.id),
                })?;
        }
        Ok(())
    }
}

/// Parses a menu from TOML text.
pub fn parse_menu(contents: &str) -> Result<MenuConfig> {
    let menu: MenuConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse menu.toml: {e}"),
    })?;
    menu.validate()?;
    Ok(menu)
}

/// Loads the menu from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid or required fields are missing
/// - A dish references an undeclared category
pub fn load_menu<P: AsRef<Path>>(path: P) -> Result<MenuConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load menu from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read menu file {}: {e}", path_ref.display()),
    })?;
    parse_menu(&contents)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const SAMPLE: &str = r#"
        [[categories]]
        slug = "mon-chinh"
        name = "Món chính"
        icon = "🍜"

        [[categories]]
        slug = "do-uong"
        name = "Đồ uống"

        [[dishes]]
        id = "pho-bo"
        name = "Phở Bò Đặc Biệt"
        description = "Phở bò truyền thống"
        price = 55000
        category = "mon-chinh"
        featured = true

        [[dishes]]
        id = "ca-phe"
        name = "Cà Phê Sữa Đá"
        description = "Cà phê phin"
        price = 25000
        category = "do-uong"
    "#;

    #[test]
    fn test_parse_menu() {
        let menu = parse_menu(SAMPLE).unwrap();
        assert_eq!(menu.categories.len(), 2);
        assert_eq!(menu.categories[1].icon, "");
        assert_eq!(menu.dishes.len(), 2);
        assert_eq!(menu.dishes[0].price, 55000);
        assert!(menu.dishes[0].featured);
        assert!(!menu.dishes[1].featured);
    }

    #[test]
    fn test_parse_menu_rejects_unknown_category() {
        let toml_str = r#"
            [[dishes]]
            id = "banh-mi"
            name = "Bánh Mì"
            description = "Giòn"
            price = 30000
            category = "missing"
        "#;
        let result = parse_menu(toml_str);
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));
    }

    #[test]
    fn test_parse_menu_rejects_duplicate_ids() {
        let toml_str = r#"
            [[categories]]
            slug = "combo"
            name = "Combo"

            [[dishes]]
            id = "combo-1"
            name = "A"
            description = "a"
            price = 1
            category = "combo"

            [[dishes]]
            id = "combo-1"
            name = "B"
            description = "b"
            price = 2
            category = "combo"
        "#;
        assert!(parse_menu(toml_str).is_err());
    }

    #[test]
    fn test_load_menu_missing_file() {
        let result = load_menu("does/not/exist.toml");
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));
    }

    #[test]
    fn test_shipped_menu_is_valid() {
        let menu = crate::test_utils::shipped_menu();
        assert_eq!(menu.categories.len(), 3);
        assert_eq!(menu.dishes.len(), 10);
        let featured: Vec<_> = menu
            .dishes
            .iter()
            .filter(|d| d.featured)
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(featured, ["pho-bo", "bun-bo-hue", "com-tam", "combo-1"]);
    }

    #[test]
    fn test_parse_menu_rejects_out_of_range_dishes() {
        let dish_with = |name: &str, price: i64| {
            format!(
                r#"
                [[categories]]
                slug = "mon-chinh"
                name = "Món chính"

                [[dishes]]
                id = "pho-bo"
                name = "{name}"
                description = "Phở bò"
                price = {price}
                category = "mon-chinh"
                "#
            )
        };

        assert!(parse_menu(&dish_with("Phở", 55_000)).is_ok());
        for bad in [
            dish_with("Phở", 0),
            dish_with("Phở", -5_000),
            dish_with("Phở", 10_000_001),
            dish_with("", 55_000),
            dish_with(&"x".repeat(101), 55_000),
        ] {
            assert!(matches!(
                parse_menu(&bad).unwrap_err(),
                Error::Config { message: _ }
            ));
        }
    }
}
