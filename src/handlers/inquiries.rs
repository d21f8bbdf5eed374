use crate::handlers::common::{created_response, ValidatedJson};
use crate::{entities::Inquiry, errors::ServiceError, models::NewInquiry, AppState};
use axum::{extract::State, response::IntoResponse};
use tracing::info;

/// Contact form submission
#[utoipa::path(
    post,
    path = "/api/inquiries",
    request_body = NewInquiry,
    responses(
        (status = 201, description = "Inquiry recorded", body = Inquiry),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    tag = "Inquiries"
)]
pub async fn create_inquiry(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<NewInquiry>,
) -> Result<impl IntoResponse, ServiceError> {
    let inquiry = state.storage.create_inquiry(payload).await?;
    info!(inquiry_id = inquiry.id, inquiry_type = ?inquiry.inquiry_type, "inquiry received");
    Ok(created_response(inquiry))
}
