use crate::handlers::common::success_response;
use crate::{entities::Category, errors::ServiceError, AppState};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "All categories", body = [Category])),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.storage.get_categories().await?))
}

#[utoipa::path(
    get,
    path = "/api/categories/:slug",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category retrieved", body = Category),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state
        .storage
        .get_category_by_slug(&slug)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Category not found".to_string()))?;
    Ok(success_response(category))
}
