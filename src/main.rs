use chrono::Utc;
use dotenvy::dotenv;
use order_buddy::{
    config::{
        database::{create_connection, create_tables},
        menu::load_menu,
        settings::StoreSettings,
    },
    core::{
        catalog::{CatalogProvider, DbCatalog},
        storefront::Storefront,
    },
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Session the bootstrap uses to read the order overview.
const ADMIN_SESSION: &str = "admin";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Storefront settings
    let settings = StoreSettings::from_env()
        .inspect_err(|e| error!("Invalid storefront settings: {}", e))?;
    info!(
        "Storefront settings: prefix {}, orders {}, status {}",
        settings.order_code_prefix, settings.order_backing, settings.status_mode
    );

    // 4. Database and schema
    let db = create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect(|()| info!("Database schema ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the catalog from the menu file
    let menu = load_menu(&settings.menu_path)
        .inspect_err(|e| error!("Failed to load menu: {}", e))?;
    let catalog = DbCatalog::new(db.clone());
    let inserted = catalog.seed_from_menu(&menu, Utc::now()).await?;
    info!("Seeded {} dishes from {}", inserted, settings.menu_path.display());

    // 6. Summary
    let categories = catalog.list_categories().await?;
    let dishes = catalog.list_dishes(None).await?;
    let featured = catalog.featured_dishes().await?;
    info!(
        "Catalog: {} categories, {} dishes ({} featured)",
        categories.len(),
        dishes.len(),
        featured.len()
    );

    let admin = Storefront::open(db, ADMIN_SESSION, settings).await?;
    info!("Active orders: {}", admin.active_order_count().await?);

    Ok(())
}
