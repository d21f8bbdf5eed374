use crate::entities::InquiryType;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Contact form submission (`POST /api/inquiries`).
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewInquiry {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[validate(length(min = 1, max = 5000, message = "message is required"))]
    pub message: String,
    #[serde(rename = "type", default)]
    pub inquiry_type: InquiryType,
}
