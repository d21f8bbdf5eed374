use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{BackendKind, Storage, UNKNOWN_CATEGORY, UNKNOWN_PRODUCT};
use crate::{
    db::{db_error, DatabaseAccess, DbPool},
    entities::{
        category, inquiry, product, quote, quote_item, Category, CategoryEntity, Gallery, Inquiry,
        Product, ProductEntity, Quote, QuoteEntity, QuoteItem, QuoteItemEntity, QuoteStatus,
        Specifications,
    },
    errors::ServiceError,
    models::{NewCategory, NewInquiry, NewProduct, NewQuoteItem, ProductFilter},
};

/// Relational backend over a sea-orm pool (PostgreSQL in production,
/// SQLite in tests).
#[derive(Debug, Clone)]
pub struct DatabaseStorage {
    db: DatabaseAccess,
}

impl DatabaseStorage {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self {
            db: DatabaseAccess::new(pool),
        }
    }
}

/// `%term%` with LIKE wildcards in the term itself escaped.
fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Case-insensitive substring match via `lower(col) LIKE '%term%'`. The term
/// arrives already lowercased; see [`ProductFilter::search_term`] for the
/// SQLite folding caveat.
fn product_filter_condition(filter: &ProductFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(category_id) = filter.category_id {
        condition = condition.add(product::Column::CategoryId.eq(category_id));
    }
    if let Some(term) = filter.search_term() {
        condition = condition.add(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col(product::Column::Name)))
                        .like(LikeExpr::new(contains_pattern(&term)).escape('\\')),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col(product::Column::Description)))
                        .like(LikeExpr::new(contains_pattern(&term)).escape('\\')),
                ),
        );
    }
    condition
}

#[async_trait]
impl Storage for DatabaseStorage {
    fn kind(&self) -> BackendKind {
        BackendKind::Database
    }

    #[instrument(skip(self))]
    async fn get_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ServiceError> {
        let condition = product_filter_condition(filter);
        self.db
            .execute("get_products", |db| {
                ProductEntity::find()
                    .filter(condition)
                    .order_by_asc(product::Column::Id)
                    .all(db)
            })
            .await
    }

    async fn get_product(&self, id: i32) -> Result<Option<Product>, ServiceError> {
        self.db
            .execute("get_product", |db| ProductEntity::find_by_id(id).one(db))
            .await
    }

    #[instrument(skip(self, new), fields(name = %new.name))]
    async fn create_product(&self, new: NewProduct) -> Result<Product, ServiceError> {
        let model = product::ActiveModel {
            name: Set(new.name),
            description: Set(new.description),
            price: Set(new.price),
            category_id: Set(new.category_id),
            image_url: Set(new.image_url),
            gallery: Set(new.gallery.map(Gallery)),
            specifications: Set(new.specifications.map(Specifications)),
            is_customizable: Set(new.is_customizable),
            material: Set(new.material),
            seating_capacity: Set(new.seating_capacity),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        self.db
            .execute("create_product", |db| model.insert(db))
            .await
            .map_err(|e| match e {
                ServiceError::ValidationError(_) => {
                    ServiceError::ValidationError(UNKNOWN_CATEGORY.to_string())
                }
                other => other,
            })
    }

    async fn get_categories(&self) -> Result<Vec<Category>, ServiceError> {
        self.db
            .execute("get_categories", |db| {
                CategoryEntity::find()
                    .order_by_asc(category::Column::Id)
                    .all(db)
            })
            .await
    }

    async fn get_category(&self, id: i32) -> Result<Option<Category>, ServiceError> {
        self.db
            .execute("get_category", |db| CategoryEntity::find_by_id(id).one(db))
            .await
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, ServiceError> {
        let slug = slug.to_string();
        self.db
            .execute("get_category_by_slug", |db| {
                CategoryEntity::find()
                    .filter(category::Column::Slug.eq(slug))
                    .one(db)
            })
            .await
    }

    #[instrument(skip(self, new), fields(slug = %new.slug))]
    async fn create_category(&self, new: NewCategory) -> Result<Category, ServiceError> {
        let slug = new.slug.clone();
        let model = category::ActiveModel {
            name: Set(new.name),
            slug: Set(new.slug),
            description: Set(new.description),
            image_url: Set(new.image_url),
            ..Default::default()
        };
        self.db
            .execute("create_category", |db| model.insert(db))
            .await
            .map_err(|err| match err {
                ServiceError::Conflict(_) => {
                    ServiceError::Conflict(format!("category slug '{}' already exists", slug))
                }
                other => other,
            })
    }

    /// Header and items are written in one transaction; any failure rolls
    /// the whole quote back.
    #[instrument(skip(self, items), fields(item_count = items.len()))]
    async fn create_quote(
        &self,
        user_id: Option<&str>,
        items: &[NewQuoteItem],
    ) -> Result<Quote, ServiceError> {
        let txn = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| db_error("create_quote", e))?;

        let header = quote::ActiveModel {
            user_id: Set(user_id.map(str::to_owned)),
            status: Set(QuoteStatus::Pending),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let quote = header
            .insert(&txn)
            .await
            .map_err(|e| db_error("create_quote", e))?;

        if !items.is_empty() {
            let rows = items.iter().map(|item| quote_item::ActiveModel {
                quote_id: Set(quote.id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity_or_default()),
                customization_notes: Set(item.customization_notes.clone()),
                ..Default::default()
            });
            QuoteItemEntity::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(|e| match db_error("create_quote_items", e) {
                    ServiceError::ValidationError(_) => {
                        ServiceError::ValidationError(UNKNOWN_PRODUCT.to_string())
                    }
                    other => other,
                })?;
        }

        txn.commit()
            .await
            .map_err(|e| db_error("create_quote", e))?;

        info!(quote_id = quote.id, "quote created");
        Ok(quote)
    }

    async fn get_quotes(&self, user_id: &str) -> Result<Vec<Quote>, ServiceError> {
        let user_id = user_id.to_string();
        self.db
            .execute("get_quotes", |db| {
                QuoteEntity::find()
                    .filter(quote::Column::UserId.eq(user_id))
                    .order_by_desc(quote::Column::CreatedAt)
                    .order_by_desc(quote::Column::Id)
                    .all(db)
            })
            .await
    }

    async fn get_quote(&self, id: i32) -> Result<Option<Quote>, ServiceError> {
        self.db
            .execute("get_quote", |db| QuoteEntity::find_by_id(id).one(db))
            .await
    }

    async fn get_quote_items(&self, quote_id: i32) -> Result<Vec<QuoteItem>, ServiceError> {
        self.db
            .execute("get_quote_items", |db| {
                QuoteItemEntity::find()
                    .filter(quote_item::Column::QuoteId.eq(quote_id))
                    .order_by_asc(quote_item::Column::Id)
                    .all(db)
            })
            .await
    }

    #[instrument(skip(self, new), fields(inquiry_type = ?new.inquiry_type))]
    async fn create_inquiry(&self, new: NewInquiry) -> Result<Inquiry, ServiceError> {
        let model = inquiry::ActiveModel {
            name: Set(new.name),
            email: Set(new.email),
            company: Set(new.company),
            message: Set(new.message),
            inquiry_type: Set(new.inquiry_type),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        self.db
            .execute("create_inquiry", |db| model.insert(db))
            .await
    }
}
