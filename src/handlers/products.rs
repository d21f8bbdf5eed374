use crate::handlers::common::{created_response, success_response, IdPath, ValidatedJson};
use crate::{
    auth::AuthUser,
    entities::Product,
    errors::ServiceError,
    models::{NewProduct, ProductFilter},
    AppState,
};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::IntoResponse,
};
use tracing::info;

/// List products, optionally by category and/or search term
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductFilter),
    responses(
        (status = 200, description = "Products in id order", body = [Product]),
        (status = 400, description = "categoryId is not an integer", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ProductFilter>, QueryRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let Query(filter) = query.map_err(|_| {
        ServiceError::ValidationError("categoryId must be an integer".to_string())
    })?;

    let products = state.storage.get_products(&filter).await?;
    Ok(success_response(products))
}

#[utoipa::path(
    get,
    path = "/api/products/:id",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product retrieved", body = Product),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state
        .storage
        .get_product(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;
    Ok(success_response(product))
}

/// Create a product (catalog administration)
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = NewProduct,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<NewProduct>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.storage.create_product(payload).await?;
    info!(product_id = product.id, user_id = %user.id, "product created");
    Ok(created_response(product))
}
