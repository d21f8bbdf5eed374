use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ayak API",
        version = "0.1.0",
        description = r#"
# Ayak Workspace Furniture API

Catalog browsing, quote requests and contact inquiries.

## Authentication

Quote endpoints require a bearer token unless the server runs with guest
quotes enabled:

```
Authorization: Bearer <jwt>
```

## Error Handling

Errors share one body shape:

```json
{
  "error": "Bad Request",
  "message": "items: at least one item is required",
  "requestId": "8d0c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::categories::list_categories,
        crate::handlers::categories::get_category,
        crate::handlers::quotes::create_quote,
        crate::handlers::quotes::list_quotes,
        crate::handlers::quotes::get_quote,
        crate::handlers::inquiries::create_inquiry,
        crate::handlers::auth::current_user,
        crate::handlers::status::health,
        crate::handlers::status::status,
    ),
    components(
        schemas(
            crate::entities::Product,
            crate::entities::Category,
            crate::entities::Quote,
            crate::entities::QuoteItem,
            crate::entities::QuoteStatus,
            crate::entities::Inquiry,
            crate::entities::InquiryType,
            crate::models::NewProduct,
            crate::models::NewQuoteItem,
            crate::models::CreateQuoteRequest,
            crate::models::QuoteWithItems,
            crate::models::NewInquiry,
            crate::auth::AuthUser,
            crate::handlers::status::HealthResponse,
            crate::handlers::status::StatusResponse,
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Products", description = "Product catalog"),
        (name = "Categories", description = "Product categories"),
        (name = "Quotes", description = "Quote requests"),
        (name = "Inquiries", description = "Contact form"),
        (name = "Auth", description = "Current user"),
        (name = "Status", description = "Liveness and backend status")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// `GET /api/openapi.json`
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
