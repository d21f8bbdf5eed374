//! Persistence contract shared by the relational and in-memory backends.
//!
//! The backend is chosen once at startup by [`select_backend`]: a configured
//! database URL selects [`DatabaseStorage`], otherwise the process falls back
//! to [`MemoryStorage`]. Both present identical semantics to the routes.

mod database;
mod memory;

pub use database::DatabaseStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    db,
    entities::{Category, Inquiry, Product, Quote, QuoteItem},
    errors::ServiceError,
    models::{NewCategory, NewInquiry, NewProduct, NewQuoteItem, ProductFilter},
};

/// Rejection message for a quote line whose product does not exist.
pub(crate) const UNKNOWN_PRODUCT: &str = "items: productId does not reference an existing product";
/// Rejection message for a product whose category does not exist.
pub(crate) const UNKNOWN_CATEGORY: &str = "categoryId does not reference an existing category";

/// Which implementation is serving the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    Database,
    Memory,
}

#[async_trait]
pub trait Storage: Send + Sync {
    fn kind(&self) -> BackendKind;

    // Products
    async fn get_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ServiceError>;
    async fn get_product(&self, id: i32) -> Result<Option<Product>, ServiceError>;
    async fn create_product(&self, product: NewProduct) -> Result<Product, ServiceError>;

    // Categories
    async fn get_categories(&self) -> Result<Vec<Category>, ServiceError>;
    async fn get_category(&self, id: i32) -> Result<Option<Category>, ServiceError>;
    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, ServiceError>;
    /// Fails with `Conflict` when the slug is already taken.
    async fn create_category(&self, category: NewCategory) -> Result<Category, ServiceError>;

    // Quotes
    /// Writes one pending header plus one line per item, all or nothing.
    /// Returns the header only.
    async fn create_quote(
        &self,
        user_id: Option<&str>,
        items: &[NewQuoteItem],
    ) -> Result<Quote, ServiceError>;
    /// Headers owned by `user_id`, newest first.
    async fn get_quotes(&self, user_id: &str) -> Result<Vec<Quote>, ServiceError>;
    async fn get_quote(&self, id: i32) -> Result<Option<Quote>, ServiceError>;
    /// Line items of a quote in insertion order.
    async fn get_quote_items(&self, quote_id: i32) -> Result<Vec<QuoteItem>, ServiceError>;

    // Inquiries
    async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry, ServiceError>;
}

/// Instantiates the storage backend for this process.
///
/// Connection and migration failures are returned to the caller; only the
/// absence of a database URL selects the in-memory fallback.
pub async fn select_backend(config: &AppConfig) -> Result<Arc<dyn Storage>, ServiceError> {
    match config.database_url.as_deref() {
        Some(url) => {
            info!(url = %db::redact_url(url), "using database storage");
            let pool = db::establish_connection_from_app_config(config, url).await?;
            db::check_connection(&pool).await?;
            if config.auto_migrate {
                db::run_migrations(&pool).await?;
            }
            Ok(Arc::new(DatabaseStorage::new(Arc::new(pool))))
        }
        None => {
            warn!(
                "no DATABASE_URL or POSTGRES_URL configured; using in-memory storage, data is lost on restart"
            );
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}
