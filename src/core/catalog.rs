//! Menu catalog - Dish and category lookup for the storefront.
//!
//! The catalog is read-mostly and owns no cart or order state. Two providers
//! are available: [`StaticCatalog`], an in-memory table built from menu.toml,
//! and [`DbCatalog`], backed by the `dishes` and `categories` tables and
//! editable by staff.

use crate::{
    config::menu::MenuConfig,
    entities::{Category as CategoryEntity, Dish as DishEntity, category, dish},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Longest accepted dish name, in characters
pub const MAX_NAME_CHARS: usize = 100;
/// Longest accepted dish description, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 500;
/// Highest accepted unit price
pub const MAX_PRICE: i64 = 10_000_000;
/// Category slug that means "no filter"
pub const ALL_CATEGORIES: &str = "all";
/// Image used when a dish is added without one
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// A sellable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dish {
    /// Stable unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Description shown on the dish card
    pub description: String,
    /// Unit price in the smallest currency unit
    pub price: i64,
    /// Image reference
    pub image: String,
    /// Category slug
    pub category: String,
    /// Highlighted on the landing page
    #[serde(default)]
    pub featured: bool,
    /// Hidden from customers when false
    #[serde(default = "available_by_default")]
    pub available: bool,
}

const fn available_by_default() -> bool {
    true
}

impl From<dish::Model> for Dish {
    fn from(model: dish::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            image: model.image_url,
            category: model.category,
            featured: model.featured,
            available: model.is_available,
        }
    }
}

/// A menu section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// URL-friendly identifier
    pub slug: String,
    /// Display name
    pub name: String,
    /// Icon shown in the filter bar
    pub icon: String,
}

impl From<category::Model> for Category {
    fn from(model: category::Model) -> Self {
        Self {
            slug: model.slug,
            name: model.name,
            icon: model.icon,
        }
    }
}

/// Fields staff fill in when adding a dish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDish {
    /// Display name, 1 to 100 characters after trimming
    pub name: String,
    /// Description, 1 to 500 characters after trimming
    pub description: String,
    /// Unit price, 1 to 10 000 000
    pub price: i64,
    /// Image reference; the placeholder is used when blank
    pub image: String,
    /// Category slug; must exist in the catalog
    pub category: String,
    /// Highlighted on the landing page
    pub featured: bool,
}

impl NewDish {
    /// Checks name, description and price ranges and returns a trimmed copy.
    pub fn validated(&self) -> Result<Self> {
        let name = self.name.trim();
        let name_len = name.chars().count();
        if name_len == 0 || name_len > MAX_NAME_CHARS {
            return Err(Error::validation(format!(
                "Dish name must be 1-{MAX_NAME_CHARS} characters"
            )));
        }

        let description = self.description.trim();
        let description_len = description.chars().count();
        if description_len == 0 || description_len > MAX_DESCRIPTION_CHARS {
            return Err(Error::validation(format!(
                "Dish description must be 1-{MAX_DESCRIPTION_CHARS} characters"
            )));
        }

        if !(1..=MAX_PRICE).contains(&self.price) {
            return Err(Error::validation(format!(
                "Dish price must be between 1 and {MAX_PRICE}"
            )));
        }

        let image = match self.image.trim() {
            "" => PLACEHOLDER_IMAGE,
            other => other,
        };

        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            price: self.price,
            image: image.to_string(),
            category: self.category.trim().to_string(),
            featured: self.featured,
        })
    }

    fn into_dish(self, id: String) -> Dish {
        Dish {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            image: self.image,
            category: self.category,
            featured: self.featured,
            available: true,
        }
    }
}

/// Builds the id for a dish added through the admin flow.
fn custom_dish_id(now: DateTime<Utc>, attempt: u32) -> String {
    match attempt {
        0 => format!("custom-{}", now.timestamp_millis()),
        n => format!("custom-{}-{n}", now.timestamp_millis()),
    }
}

fn matches_category(dish: &Dish, category: Option<&str>) -> bool {
    match category {
        None | Some(ALL_CATEGORIES) => true,
        Some(slug) => dish.category == slug,
    }
}

/// Read access to the menu.
#[allow(async_fn_in_trait)]
pub trait CatalogProvider {
    /// Lists available dishes, optionally restricted to one category slug.
    /// `None` and `Some("all")` both mean every category.
    async fn list_dishes(&self, category: Option<&str>) -> Result<Vec<Dish>>;

    /// Looks up one dish; `Ok(None)` when the id is unknown.
    async fn get_dish(&self, id: &str) -> Result<Option<Dish>>;

    /// Lists categories in display order.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Lists available featured dishes.
    async fn featured_dishes(&self) -> Result<Vec<Dish>> {
        Ok(self
            .list_dishes(None)
            .await?
            .into_iter()
            .filter(|dish| dish.featured)
            .collect())
    }
}

/// In-memory catalog, typically built from menu.toml.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    categories: Vec<Category>,
    dishes: Vec<Dish>,
}

impl StaticCatalog {
    /// Builds a catalog from explicit records.
    #[must_use]
    pub const fn new(categories: Vec<Category>, dishes: Vec<Dish>) -> Self {
        Self { categories, dishes }
    }

    /// Builds a catalog from a menu.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the menu fails [`MenuConfig::validate`].
    pub fn from_menu(menu: &MenuConfig) -> Result<Self> {
        menu.validate()?;
        let categories = menu
            .categories
            .iter()
            .map(|c| Category {
                slug: c.slug.clone(),
                name: c.name.clone(),
                icon: c.icon.clone(),
            })
            .collect();
        let dishes = menu
            .dishes
            .iter()
            .map(|d| Dish {
                id: d.id.clone(),
                name: d.name.clone(),
                description: d.description.clone(),
                price: d.price,
                image: d.image.clone(),
                category: d.category.clone(),
                featured: d.featured,
                available: true,
            })
            .collect();
        Ok(Self::new(categories, dishes))
    }

    /// Adds a dish after validation and returns it.
    pub fn add_dish(&mut self, new_dish: &NewDish, now: DateTime<Utc>) -> Result<Dish> {
        let new_dish = new_dish.validated()?;
        if !self.categories.iter().any(|c| c.slug == new_dish.category) {
            return Err(Error::validation(format!(
                "Unknown category: {}",
                new_dish.category
            )));
        }

        let id = (0..)
            .map(|attempt| custom_dish_id(now, attempt))
            .find(|id| self.dishes.iter().all(|d| &d.id != id))
            .unwrap_or_default();
        let dish = new_dish.into_dish(id);
        self.dishes.push(dish.clone());
        Ok(dish)
    }

    /// Removes a dish; returns whether it existed.
    pub fn remove_dish(&mut self, id: &str) -> bool {
        let before = self.dishes.len();
        self.dishes.retain(|d| d.id != id);
        before != self.dishes.len()
    }
}

impl CatalogProvider for StaticCatalog {
    async fn list_dishes(&self, category: Option<&str>) -> Result<Vec<Dish>> {
        Ok(self
            .dishes
            .iter()
            .filter(|d| d.available && matches_category(d, category))
            .cloned()
            .collect())
    }

    async fn get_dish(&self, id: &str) -> Result<Option<Dish>> {
        Ok(self.dishes.iter().find(|d| d.id == id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.clone())
    }
}

/// Catalog backed by the `dishes` and `categories` tables.
#[derive(Debug, Clone)]
pub struct DbCatalog {
    db: DatabaseConnection,
}

impl DbCatalog {
    /// Wraps an open connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts the menu file's categories and dishes when the catalog is empty.
    ///
    /// The menu is validated first, so a bad seed file never produces a
    /// sellable dish. Categories that already exist are left alone. Dish
    /// creation times are staggered from `now` so listings keep the file's order.
    ///
    /// # Arguments
    /// * `menu` - Parsed menu, usually from [`load_menu`](crate::config::menu::load_menu)
    /// * `now` - Creation time recorded for the seeded dishes
    ///
    /// Returns the number of dishes inserted (zero if the catalog already had data).
    ///
    /// # Errors
    /// Returns an error if:
    /// - The menu fails [`MenuConfig::validate`]
    /// - A database read or insert fails
    #[instrument(skip(self, menu))]
    pub async fn seed_from_menu(&self, menu: &MenuConfig, now: DateTime<Utc>) -> Result<usize> {
        menu.validate()?;
        if DishEntity::find().count(&self.db).await? > 0 {
            debug!("Catalog already populated, skipping seed");
            return Ok(0);
        }

        for (position, entry) in menu.categories.iter().enumerate() {
            if CategoryEntity::find_by_id(entry.slug.clone())
                .one(&self.db)
                .await?
                .is_some()
            {
                continue;
            }
            category::ActiveModel {
                slug: Set(entry.slug.clone()),
                name: Set(entry.name.clone()),
                icon: Set(entry.icon.clone()),
                position: Set(i32::try_from(position).unwrap_or(i32::MAX)),
            }
            .insert(&self.db)
            .await?;
        }

        // Creation times are staggered so listings keep the menu file's order
        for (offset, entry) in (0_i64..).zip(&menu.dishes) {
            dish::ActiveModel {
                id: Set(entry.id.clone()),
                name: Set(entry.name.clone()),
                description: Set(entry.description.clone()),
                price: Set(entry.price),
                image_url: Set(entry.image.clone()),
                category: Set(entry.category.clone()),
                featured: Set(entry.featured),
                is_available: Set(true),
                created_at: Set(now + Duration::milliseconds(offset)),
            }
            .insert(&self.db)
            .await?;
        }

        info!(
            "Seeded catalog with {} categories and {} dishes",
            menu.categories.len(),
            menu.dishes.len()
        );
        Ok(menu.dishes.len())
    }

    /// Lists every dish including hidden ones, newest first (admin view).
    pub async fn list_all_dishes(&self) -> Result<Vec<Dish>> {
        Ok(DishEntity::find()
            .order_by_desc(dish::Column::CreatedAt)
            .order_by_asc(dish::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Dish::from)
            .collect())
    }

    /// Adds a dish after validation and returns it.
    ///
    /// Name and description are trimmed, a blank image falls back to
    /// [`PLACEHOLDER_IMAGE`], and the dish gets a fresh `custom-{millis}` id
    /// (suffixed when another dish added in the same millisecond holds it).
    ///
    /// # Arguments
    /// * `new_dish` - Fields entered by staff
    /// * `now` - Creation time, also the source of the generated id
    ///
    /// # Errors
    /// Returns an error if:
    /// - The name is not 1-100 characters or the description not 1-500
    /// - The price is outside 1..=10 000 000
    /// - The category does not exist
    /// - The database insert fails
    #[instrument(skip(self, new_dish), fields(name = %new_dish.name))]
    pub async fn add_dish(&self, new_dish: &NewDish, now: DateTime<Utc>) -> Result<Dish> {
        let new_dish = new_dish.validated()?;
        if CategoryEntity::find_by_id(new_dish.category.clone())
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(Error::validation(format!(
                "Unknown category: {}",
                new_dish.category
            )));
        }

        let mut attempt = 0;
        let id = loop {
            let candidate = custom_dish_id(now, attempt);
            if DishEntity::find_by_id(candidate.clone())
                .one(&self.db)
                .await?
                .is_none()
            {
                break candidate;
            }
            attempt += 1;
        };

        let model = dish::ActiveModel {
            id: Set(id.clone()),
            name: Set(new_dish.name.clone()),
            description: Set(new_dish.description.clone()),
            price: Set(new_dish.price),
            image_url: Set(new_dish.image.clone()),
            category: Set(new_dish.category.clone()),
            featured: Set(new_dish.featured),
            is_available: Set(true),
            created_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!("Added dish {}", id);
        Ok(Dish::from(model))
    }

    /// Deletes a dish. Past orders keep their own snapshot of it.
    pub async fn remove_dish(&self, id: &str) -> Result<()> {
        let result = DishEntity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(Error::DishNotFound { id: id.to_string() });
        }
        info!("Removed dish {}", id);
        Ok(())
    }

    /// Shows or hides a dish without deleting it.
    pub async fn set_availability(&self, id: &str, available: bool) -> Result<Dish> {
        let mut model: dish::ActiveModel = DishEntity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| Error::DishNotFound { id: id.to_string() })?
            .into();
        model.is_available = Set(available);
        let updated = model.update(&self.db).await?;
        debug!("Dish {} availability set to {}", id, available);
        Ok(Dish::from(updated))
    }
}

impl CatalogProvider for DbCatalog {
    async fn list_dishes(&self, category: Option<&str>) -> Result<Vec<Dish>> {
        let mut query = DishEntity::find().filter(dish::Column::IsAvailable.eq(true));
        if let Some(slug) = category.filter(|slug| *slug != ALL_CATEGORIES) {
            query = query.filter(dish::Column::Category.eq(slug));
        }
        Ok(query
            .order_by_asc(dish::Column::CreatedAt)
            .order_by_asc(dish::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Dish::from)
            .collect())
    }

    async fn get_dish(&self, id: &str) -> Result<Option<Dish>> {
        Ok(DishEntity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(Dish::from))
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(CategoryEntity::find()
            .order_by_asc(category::Column::Position)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Category::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn new_dish(name: &str, price: i64) -> NewDish {
        NewDish {
            name: name.to_string(),
            description: "Tasty".to_string(),
            price,
            image: String::new(),
            category: "mon-chinh".to_string(),
            featured: false,
        }
    }

    #[test]
    fn test_new_dish_validation() {
        assert!(new_dish("Phở", 55_000).validated().is_ok());
        assert!(new_dish("   ", 55_000).validated().is_err());
        assert!(new_dish(&"x".repeat(101), 55_000).validated().is_err());
        assert!(new_dish(&"ở".repeat(100), 55_000).validated().is_ok());
        assert!(new_dish("Phở", 0).validated().is_err());
        assert!(new_dish("Phở", MAX_PRICE + 1).validated().is_err());

        let mut long_description = new_dish("Phở", 1);
        long_description.description = "d".repeat(501);
        assert!(long_description.validated().is_err());

        let trimmed = new_dish("  Phở  ", 1).validated().unwrap();
        assert_eq!(trimmed.name, "Phở");
        assert_eq!(trimmed.image, PLACEHOLDER_IMAGE);
    }

    #[tokio::test]
    async fn test_static_catalog_filters_by_category() -> Result<()> {
        let catalog = StaticCatalog::from_menu(&sample_menu())?;

        assert_eq!(catalog.list_dishes(None).await?.len(), 3);
        assert_eq!(catalog.list_dishes(Some("all")).await?.len(), 3);
        let drinks = catalog.list_dishes(Some("do-uong")).await?;
        assert_eq!(drinks.len(), 1);
        assert_eq!(drinks[0].id, "ca-phe");
        assert!(catalog.list_dishes(Some("combo")).await?.is_empty());

        assert_eq!(catalog.get_dish("pho-bo").await?.unwrap().price, 55_000);
        assert!(catalog.get_dish("missing").await?.is_none());

        let featured = catalog.featured_dishes().await?;
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].id, "pho-bo");
        Ok(())
    }

    #[tokio::test]
    async fn test_static_catalog_add_and_remove() -> Result<()> {
        let mut catalog = StaticCatalog::from_menu(&sample_menu())?;
        let now = fixed_now();

        let first = catalog.add_dish(&new_dish("Chè", 20_000), now)?;
        let second = catalog.add_dish(&new_dish("Xôi", 15_000), now)?;
        assert_ne!(first.id, second.id);
        assert_eq!(catalog.list_dishes(Some("mon-chinh")).await?.len(), 4);

        let mut unknown = new_dish("Kem", 10_000);
        unknown.category = "dessert".to_string();
        assert!(matches!(
            catalog.add_dish(&unknown, now).unwrap_err(),
            Error::Validation { message: _ }
        ));

        assert!(catalog.remove_dish(&first.id));
        assert!(!catalog.remove_dish(&first.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_db_catalog_add_dish_validation_inserts_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = DbCatalog::new(db.clone());
        catalog.seed_from_menu(&sample_menu(), fixed_now()).await?;

        let result = catalog.add_dish(&new_dish("", 10), fixed_now()).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));
        let result = catalog.add_dish(&new_dish("Chè", 0), fixed_now()).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        assert_eq!(DishEntity::find().count(&db).await?, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_db_catalog_seed_and_query() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = DbCatalog::new(db);

        let inserted = catalog.seed_from_menu(&sample_menu(), fixed_now()).await?;
        assert_eq!(inserted, 3);
        // Seeding twice is a no-op
        assert_eq!(catalog.seed_from_menu(&sample_menu(), fixed_now()).await?, 0);

        let categories = catalog.list_categories().await?;
        let slugs: Vec<_> = categories.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, ["mon-chinh", "do-uong"]);

        let dishes = catalog.list_dishes(None).await?;
        let ids: Vec<_> = dishes.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["pho-bo", "banh-mi", "ca-phe"]);
        assert_eq!(catalog.list_dishes(Some("mon-chinh")).await?.len(), 2);
        assert_eq!(catalog.featured_dishes().await?.len(), 1);
        assert!(catalog.get_dish("nope").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_db_catalog_admin_edits() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = DbCatalog::new(db);
        catalog.seed_from_menu(&sample_menu(), fixed_now()).await?;

        let added = catalog.add_dish(&new_dish("Chè Ba Màu", 20_000), fixed_now()).await?;
        assert!(added.id.starts_with("custom-"));
        assert_eq!(catalog.list_all_dishes().await?.len(), 4);

        let hidden = catalog.set_availability("banh-mi", false).await?;
        assert!(!hidden.available);
        assert_eq!(catalog.list_dishes(Some("mon-chinh")).await?.len(), 2);
        assert_eq!(catalog.list_all_dishes().await?.len(), 4);

        catalog.remove_dish(&added.id).await?;
        assert!(matches!(
            catalog.remove_dish(&added.id).await.unwrap_err(),
            Error::DishNotFound { id: _ }
        ));
        assert!(matches!(
            catalog.set_availability("ghost", true).await.unwrap_err(),
            Error::DishNotFound { id: _ }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_menu_is_neither_seeded_nor_served() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = DbCatalog::new(db.clone());
        let mut menu = sample_menu();
        menu.dishes[0].price = -5_000;
        menu.dishes[0].name = String::new();

        let result = catalog.seed_from_menu(&menu, fixed_now()).await;
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));
        assert_eq!(DishEntity::find().count(&db).await?, 0);
        assert!(catalog.get_dish("pho-bo").await?.is_none());

        assert!(StaticCatalog::from_menu(&menu).is_err());
        Ok(())
    }
}
