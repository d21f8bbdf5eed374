//! sea-orm entities for the catalog, quote and inquiry tables.
//!
//! The entity `Model`s double as the JSON read-models returned by the API and
//! by both storage backends, so they serialize with camelCase keys.

pub mod category;
pub mod inquiry;
pub mod product;
pub mod quote;
pub mod quote_item;

pub use category::{Entity as CategoryEntity, Model as Category};
pub use inquiry::{Entity as InquiryEntity, InquiryType, Model as Inquiry};
pub use product::{Entity as ProductEntity, Gallery, Model as Product, Specifications};
pub use quote::{Entity as QuoteEntity, Model as Quote, QuoteStatus};
pub use quote_item::{Entity as QuoteItemEntity, Model as QuoteItem};
