use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::{BackendKind, Storage, UNKNOWN_CATEGORY, UNKNOWN_PRODUCT};
use crate::{
    entities::{
        Category, Gallery, Inquiry, Product, Quote, QuoteItem, QuoteStatus, Specifications,
    },
    errors::ServiceError,
    models::{NewCategory, NewInquiry, NewProduct, NewQuoteItem, ProductFilter},
};

/// Monotonic id source. Starts at 1; ids are never reused.
#[derive(Debug)]
struct IdSequence(i32);

impl Default for IdSequence {
    fn default() -> Self {
        IdSequence(1)
    }
}

impl IdSequence {
    fn next(&mut self) -> i32 {
        let id = self.0;
        self.0 += 1;
        id
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    products: BTreeMap<i32, Product>,
    categories: BTreeMap<i32, Category>,
    quotes: BTreeMap<i32, Quote>,
    quote_items: BTreeMap<i32, QuoteItem>,
    inquiries: BTreeMap<i32, Inquiry>,
    product_ids: IdSequence,
    category_ids: IdSequence,
    quote_ids: IdSequence,
    quote_item_ids: IdSequence,
    inquiry_ids: IdSequence,
}

/// Process-memory backend used when no database is configured.
///
/// All state sits behind one lock, so a quote header and its items become
/// visible together.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: RwLock<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_filter(product: &Product, filter: &ProductFilter, term: Option<&str>) -> bool {
    if let Some(category_id) = filter.category_id {
        if product.category_id != Some(category_id) {
            return false;
        }
    }
    match term {
        Some(term) => {
            product.name.to_lowercase().contains(term)
                || product.description.to_lowercase().contains(term)
        }
        None => true,
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn get_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ServiceError> {
        let term = filter.search_term();
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .filter(|p| matches_filter(p, filter, term.as_deref()))
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: i32) -> Result<Option<Product>, ServiceError> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, ServiceError> {
        let mut state = self.state.write().await;
        if let Some(category_id) = product.category_id {
            if !state.categories.contains_key(&category_id) {
                return Err(ServiceError::ValidationError(UNKNOWN_CATEGORY.to_string()));
            }
        }
        let id = state.product_ids.next();
        let created = Product {
            id,
            name: product.name,
            description: product.description,
            price: product.price,
            category_id: product.category_id,
            image_url: product.image_url,
            gallery: product.gallery.map(Gallery),
            specifications: product.specifications.map(Specifications),
            is_customizable: product.is_customizable,
            material: product.material,
            seating_capacity: product.seating_capacity,
            created_at: Utc::now(),
        };
        state.products.insert(id, created.clone());
        Ok(created)
    }

    async fn get_categories(&self) -> Result<Vec<Category>, ServiceError> {
        Ok(self.state.read().await.categories.values().cloned().collect())
    }

    async fn get_category(&self, id: i32) -> Result<Option<Category>, ServiceError> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, ServiceError> {
        let state = self.state.read().await;
        Ok(state.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category, ServiceError> {
        let mut state = self.state.write().await;
        if state.categories.values().any(|c| c.slug == category.slug) {
            return Err(ServiceError::Conflict(format!(
                "category slug '{}' already exists",
                category.slug
            )));
        }
        let id = state.category_ids.next();
        let created = Category {
            id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            image_url: category.image_url,
        };
        state.categories.insert(id, created.clone());
        Ok(created)
    }

    async fn create_quote(
        &self,
        user_id: Option<&str>,
        items: &[NewQuoteItem],
    ) -> Result<Quote, ServiceError> {
        let mut state = self.state.write().await;
        if items
            .iter()
            .any(|item| !state.products.contains_key(&item.product_id))
        {
            return Err(ServiceError::ValidationError(UNKNOWN_PRODUCT.to_string()));
        }

        let quote_id = state.quote_ids.next();
        let quote = Quote {
            id: quote_id,
            user_id: user_id.map(str::to_owned),
            status: QuoteStatus::Pending,
            created_at: Utc::now(),
        };
        state.quotes.insert(quote_id, quote.clone());

        for item in items {
            let item_id = state.quote_item_ids.next();
            state.quote_items.insert(
                item_id,
                QuoteItem {
                    id: item_id,
                    quote_id,
                    product_id: item.product_id,
                    quantity: item.quantity_or_default(),
                    customization_notes: item.customization_notes.clone(),
                },
            );
        }

        debug!(quote_id, items = items.len(), "stored quote in memory");
        Ok(quote)
    }

    async fn get_quotes(&self, user_id: &str) -> Result<Vec<Quote>, ServiceError> {
        let state = self.state.read().await;
        let mut quotes: Vec<Quote> = state
            .quotes
            .values()
            .filter(|q| q.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect();
        quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(quotes)
    }

    async fn get_quote(&self, id: i32) -> Result<Option<Quote>, ServiceError> {
        Ok(self.state.read().await.quotes.get(&id).cloned())
    }

    async fn get_quote_items(&self, quote_id: i32) -> Result<Vec<QuoteItem>, ServiceError> {
        let state = self.state.read().await;
        Ok(state
            .quote_items
            .values()
            .filter(|item| item.quote_id == quote_id)
            .cloned()
            .collect())
    }

    async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry, ServiceError> {
        let mut state = self.state.write().await;
        let id = state.inquiry_ids.next();
        let created = Inquiry {
            id,
            name: inquiry.name,
            email: inquiry.email,
            company: inquiry.company,
            message: inquiry.message,
            inquiry_type: inquiry.inquiry_type,
            created_at: Utc::now(),
        };
        state.inquiries.insert(id, created.clone());
        Ok(created)
    }
}
