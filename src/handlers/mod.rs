//! HTTP handlers. Each module owns one resource; routes are assembled in
//! [`crate::api_routes`].

pub mod auth;
pub mod categories;
pub mod common;
pub mod inquiries;
pub mod products;
pub mod quotes;
pub mod status;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;
