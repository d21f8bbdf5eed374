use crate::handlers::common::success_response;
use crate::auth::{AuthError, AuthUser, MaybeUser};
use axum::response::IntoResponse;

/// The authenticated caller, or `null`. A bad token also yields `null`.
#[utoipa::path(
    get,
    path = "/api/auth/user",
    responses((status = 200, description = "Current user, or null when anonymous", body = AuthUser)),
    tag = "Auth"
)]
pub async fn current_user(caller: Result<MaybeUser, AuthError>) -> impl IntoResponse {
    let user: Option<AuthUser> = caller.ok().and_then(|c| c.0);
    success_response(user)
}
