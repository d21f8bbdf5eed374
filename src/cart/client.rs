use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{instrument, warn};

use crate::{
    entities::{Inquiry, Quote},
    errors::ErrorResponse,
    models::{CreateQuoteRequest, NewInquiry},
};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("the quote is empty")]
    EmptyCart,

    #[error("sign in to submit a quote")]
    Unauthorized,

    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for SubmitError {
    fn from(err: reqwest::Error) -> Self {
        SubmitError::Transport(err.to_string())
    }
}

/// Sends cart contents to the quote API.
#[async_trait]
pub trait QuoteSubmitter: Send + Sync {
    async fn submit_quote(&self, request: &CreateQuoteRequest) -> Result<Quote, SubmitError>;
    async fn submit_inquiry(&self, inquiry: &NewInquiry) -> Result<Inquiry, SubmitError>;
}

/// `QuoteSubmitter` over HTTP, with an optional bearer token. No retries.
#[derive(Debug, Clone)]
pub struct HttpQuoteClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpQuoteClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, SubmitError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(SubmitError::Unauthorized);
        }

        // Prefer the server's error message; fall back to the raw body.
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|err| err.message)
            .unwrap_or(body);
        warn!(status = status.as_u16(), %message, path, "request rejected");
        Err(SubmitError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl QuoteSubmitter for HttpQuoteClient {
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    async fn submit_quote(&self, request: &CreateQuoteRequest) -> Result<Quote, SubmitError> {
        self.post_json("/api/quotes", request).await
    }

    #[instrument(skip(self, inquiry))]
    async fn submit_inquiry(&self, inquiry: &NewInquiry) -> Result<Inquiry, SubmitError> {
        self.post_json("/api/inquiries", inquiry).await
    }
}
