use crate::handlers::common::{created_response, parse_body, success_response, IdPath};
use crate::{
    auth::MaybeUser,
    entities::Quote,
    errors::ServiceError,
    models::{CreateQuoteRequest, QuoteWithItems},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use metrics::counter;
use tracing::{info, warn};

/// Who a quote request acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteCaller<'a> {
    User(&'a str),
    Guest,
}

impl<'a> QuoteCaller<'a> {
    fn owner(self) -> Option<&'a str> {
        match self {
            QuoteCaller::User(id) => Some(id),
            QuoteCaller::Guest => None,
        }
    }
}

/// Applies the guest policy. Runs before the body is looked at.
fn authorize<'a>(state: &AppState, caller: &'a MaybeUser) -> Result<QuoteCaller<'a>, ServiceError> {
    match caller.user_id() {
        Some(id) => Ok(QuoteCaller::User(id)),
        None if state.config.allow_guest_quotes => Ok(QuoteCaller::Guest),
        None => Err(ServiceError::Unauthorized(
            "authentication required for quotes".to_string(),
        )),
    }
}

/// Submit a quote request
#[utoipa::path(
    post,
    path = "/api/quotes",
    request_body = CreateQuoteRequest,
    responses(
        (status = 201, description = "Quote created", body = Quote),
        (status = 400, description = "Invalid submission", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Quotes"
)]
pub async fn create_quote(
    State(state): State<AppState>,
    caller: MaybeUser,
    body: Result<Json<CreateQuoteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = authorize(&state, &caller).map_err(|err| {
        warn!("rejected unauthenticated quote submission");
        err
    })?;
    let request = parse_body(body)?;

    let quote = state
        .storage
        .create_quote(caller.owner(), &request.items)
        .await?;

    counter!("ayak_quotes.created", 1, "backend" => state.storage.kind().to_string());
    info!(
        quote_id = quote.id,
        items = request.items.len(),
        guest = caller.owner().is_none(),
        "quote submitted"
    );
    Ok(created_response(quote))
}

/// The caller's quotes, newest first
#[utoipa::path(
    get,
    path = "/api/quotes",
    responses(
        (status = 200, description = "Caller's quotes, newest first", body = [Quote]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Quotes"
)]
pub async fn list_quotes(
    State(state): State<AppState>,
    caller: MaybeUser,
) -> Result<impl IntoResponse, ServiceError> {
    let quotes = match authorize(&state, &caller)? {
        QuoteCaller::User(id) => state.storage.get_quotes(id).await?,
        // Guest quotes have no owner to list them by.
        QuoteCaller::Guest => Vec::new(),
    };
    Ok(success_response(quotes))
}

/// One of the caller's quotes with its line items
#[utoipa::path(
    get,
    path = "/api/quotes/:id",
    params(("id" = i32, Path, description = "Quote ID")),
    responses(
        (status = 200, description = "Quote with items", body = QuoteWithItems),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Quote not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Quotes"
)]
pub async fn get_quote(
    State(state): State<AppState>,
    caller: MaybeUser,
    IdPath(id): IdPath,
) -> Result<impl IntoResponse, ServiceError> {
    let caller = authorize(&state, &caller)?;
    let not_found = || ServiceError::NotFound("Quote not found".to_string());

    let quote = state.storage.get_quote(id).await?.ok_or_else(not_found)?;
    if quote.user_id.as_deref() != caller.owner() {
        return Err(not_found());
    }

    let items = state.storage.get_quote_items(quote.id).await?;
    Ok(success_response(QuoteWithItems { quote, items }))
}
