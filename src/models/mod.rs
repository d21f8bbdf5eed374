//! Insert and request schemas.
//!
//! Each type is the validated shape a caller hands to the storage layer. The
//! storage backends trust these values; validation happens at the route.

pub mod catalog;
pub mod inquiry;
pub mod quote;

pub use catalog::{NewCategory, NewProduct, ProductFilter};
pub use inquiry::NewInquiry;
pub use quote::{CreateQuoteRequest, NewQuoteItem, QuoteWithItems};

use validator::{ValidationErrors, ValidationErrorsKind};

/// Returns the first validation failure as `"<field>: <message>"`.
///
/// Fields are visited in name order so the result is stable across runs.
pub fn first_validation_message(errors: &ValidationErrors) -> String {
    first_message(errors, None).unwrap_or_else(|| "Invalid request".to_string())
}

fn first_message(errors: &ValidationErrors, prefix: Option<&str>) -> Option<String> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by_key(|(name, _)| **name);

    for (name, kind) in fields {
        let path = match prefix {
            Some(p) => format!("{}.{}", p, name),
            None => (*name).to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(err) = list.first() {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", err.code));
                    return Some(format!("{}: {}", path, message));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(msg) = first_message(inner, Some(&path)) {
                    return Some(msg);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    let indexed = format!("{}[{}]", path, index);
                    if let Some(msg) = first_message(inner, Some(&indexed)) {
                        return Some(msg);
                    }
                }
            }
        }
    }
    None
}
