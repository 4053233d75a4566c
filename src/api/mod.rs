//! Order-book service gateway.
//!
//! [`OrderbookApi`] is the typed request/response surface of the remote
//! order-book, [`ApiClient`] its HTTP implementation. Any non-2xx status or
//! transport failure is reported as [`ApiError`], raw `reqwest` errors never
//! leave this module unwrapped.

mod client;
mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use client::{ApiClient, ApiClientOptions};
pub use types::*;

/// Longest response body fragment kept in [`ApiError::Status`].
pub const MAX_ERROR_BODY_LEN: usize = 200;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The configured base url failed to parse or can't carry a path.
    #[error("Failed to parse URL: {0}. Error: {1}")]
    UrlParsing(String, String),

    /// The request data is not correctly formed.
    #[error("Failed to format request: {0}")]
    FormatRequest(String),

    /// Errors forwarded from the HTTP protocol.
    #[error("Unexpected HTTP client error: {0}")]
    HttpClient(String, #[source] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API request failed with status {status}: {reason} - Data: {body}")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },

    /// The response from the server could not be parsed correctly.
    #[error("Failed to parse response: {0}")]
    ParseResponse(String),
}

impl ApiError {
    pub fn status(status: u16, reason: impl Into<String>, body: &str) -> Self {
        Self::Status {
            status,
            reason: reason.into(),
            body: body.chars().take(MAX_ERROR_BODY_LEN).collect(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

#[async_trait]
pub trait OrderbookApi: Send + Sync {
    async fn create_listing(
        &self,
        request: &CreateListingRequest,
    ) -> Result<CreateListingResponse, ApiError>;

    async fn create_offer(
        &self,
        request: &CreateOfferRequest,
    ) -> Result<CreateOfferResponse, ApiError>;

    /// `None` if the order-book has no such listing.
    async fn get_listing(
        &self,
        request: &GetOrderRequest,
    ) -> Result<Option<GetOrderResponse>, ApiError>;

    /// `None` if the order-book has no such offer.
    async fn get_offer(&self, request: &GetOrderRequest)
    -> Result<Option<GetOrderResponse>, ApiError>;

    async fn get_orderbook_fee(
        &self,
        request: &GetOrderbookFeeRequest,
    ) -> Result<GetOrderbookFeeResponse, ApiError>;

    async fn get_supported_currencies(
        &self,
        request: &GetSupportedCurrenciesRequest,
    ) -> Result<GetSupportedCurrenciesResponse, ApiError>;

    async fn cancel_listing(
        &self,
        request: &CancelOrderRequest,
    ) -> Result<CancelOrderResponse, ApiError>;

    async fn cancel_offer(
        &self,
        request: &CancelOrderRequest,
    ) -> Result<CancelOrderResponse, ApiError>;
}
