use crate::errors::ServiceError;
use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Validate request input, reporting the first failing field
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input.validate().map_err(ServiceError::from)
}

/// Body-shape errors are client errors (400), not axum's default 422.
pub fn json_rejection(rejection: JsonRejection) -> ServiceError {
    let message = match &rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Expected request with `Content-Type: application/json`".to_string()
        }
        _ => rejection.body_text(),
    };
    ServiceError::ValidationError(message)
}

/// Parses and validates a JSON body, turning both failure kinds into
/// `ServiceError::ValidationError`.
pub fn parse_body<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ServiceError> {
    let Json(value) = body.map_err(json_rejection)?;
    validate_input(&value)?;
    Ok(value)
}

/// JSON body extractor that validates its payload.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Json::<T>::from_request(req, state).await;
        parse_body(body).map(ValidatedJson)
    }
}

/// Integer id path segment. Anything else is a 400 with a JSON body.
#[derive(Debug, Clone, Copy)]
pub struct IdPath(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ServiceError::ValidationError(e.body_text()))?;
        raw.trim()
            .parse::<i32>()
            .map(IdPath)
            .map_err(|_| ServiceError::ValidationError("id must be an integer".to_string()))
    }
}
