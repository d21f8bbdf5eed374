use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// Category creation input. Used by seeding and tests; categories have no
/// public write route.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,
    #[validate(custom = "validate_slug")]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            description: None,
            image_url: None,
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// Product creation input (`POST /api/products`).
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "price cannot be negative"))]
    pub price: Option<i64>,
    #[serde(default)]
    pub category_id: Option<i32>,
    #[validate(length(min = 1, message = "imageUrl is required"))]
    pub image_url: String,
    #[serde(default)]
    pub gallery: Option<Vec<String>>,
    #[serde(default)]
    pub specifications: Option<BTreeMap<String, String>>,
    #[serde(default = "default_customizable")]
    pub is_customizable: bool,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub seating_capacity: Option<String>,
}

impl NewProduct {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price: None,
            category_id: None,
            image_url: image_url.into(),
            gallery: None,
            specifications: None,
            is_customizable: true,
            material: None,
            seating_capacity: None,
        }
    }
}

fn default_customizable() -> bool {
    true
}

/// Query parameters for `GET /api/products`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Only products in this category
    pub category_id: Option<i32>,
    /// Case-insensitive match on name or description
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn by_category(category_id: i32) -> Self {
        Self {
            category_id: Some(category_id),
            search: None,
        }
    }

    /// Lowercased search term, `None` when absent or blank.
    ///
    /// Folding is Unicode-aware here and in the in-memory backend, matching
    /// PostgreSQL `lower()`. SQLite's `lower()` folds ASCII only, so on SQLite
    /// an uppercase non-ASCII letter in the stored text matches only itself.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let valid = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("slug");
        err.message = Some(Cow::from(
            "slug must be lowercase letters, digits and inner hyphens",
        ));
        Err(err)
    }
}
