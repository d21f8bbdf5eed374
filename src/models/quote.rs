use crate::entities::{Quote, QuoteItem};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::first_validation_message;

/// Quantity stored when a line item omits it.
pub const DEFAULT_QUANTITY: i32 = 1;

/// One line of a quote submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewQuoteItem {
    pub product_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000, message = "customizationNotes is too long"))]
    pub customization_notes: Option<String>,
}

impl NewQuoteItem {
    pub fn new(product_id: i32, quantity: i32) -> Self {
        Self {
            product_id,
            quantity: Some(quantity),
            customization_notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.customization_notes = Some(notes.into());
        self
    }

    pub fn quantity_or_default(&self) -> i32 {
        self.quantity.unwrap_or(DEFAULT_QUANTITY)
    }
}

/// Body of `POST /api/quotes`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateQuoteRequest {
    #[validate(custom = "validate_quote_items")]
    pub items: Vec<NewQuoteItem>,
}

/// A quote header together with its line items, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuoteWithItems {
    #[serde(flatten)]
    pub quote: Quote,
    pub items: Vec<QuoteItem>,
}

fn validate_quote_items(items: &Vec<NewQuoteItem>) -> Result<(), ValidationError> {
    if items.is_empty() {
        let mut err = ValidationError::new("items");
        err.message = Some(Cow::from("at least one item is required"));
        return Err(err);
    }

    for (index, item) in items.iter().enumerate() {
        if let Err(errors) = item.validate() {
            let mut err = ValidationError::new("items");
            err.message = Some(Cow::from(format!(
                "[{}].{}",
                index,
                first_validation_message(&errors)
            )));
            return Err(err);
        }
    }
    Ok(())
}
