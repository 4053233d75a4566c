//! Error record surfaced by every public operation.
//!
//! [`OrderbookError`] carries a stable [`ErrorCode`] suitable for branching,
//! the original cause, and the diagnostic context captured where the failure
//! happened. Handler failures are wrapped twice: the outer code names the
//! trading intent, the inner one (see [`OrderbookError::step_error`]) names
//! the pipeline step that broke.

use std::{
    error::Error,
    fmt,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

use crate::{action::ActionKind, chain::Caip2ChainId, progress::ProgressStep};

pub type Result<T, E = OrderbookError> = std::result::Result<T, E>;

/// Underlying cause attached to an [`OrderbookError`].
pub type ErrorDetails = Arc<dyn Error + Send + Sync + 'static>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Generic
    InvalidParameters,
    SignerNotProvided,
    BlockchainError,
    ApiError,
    UnknownError,

    // Exchange steps
    SeaportApprovalFailed,
    SeaportSignatureFailed,
    SeaportTransactionFailed,

    // Listings
    ListingCreationFailed,
    ListingValidationFailed,
    BuyListingFailed,
    ListingCancellationFailed,

    // Offers
    OfferCreationFailed,
    OfferValidationFailed,
    AcceptOfferFailed,
    OfferCancellationFailed,

    // Orders
    OrderNotFound,
    OffchainCancelOrderFailed,

    // Tokens
    TokenConversionFailed,
    InsufficientEthBalance,

    FetchFeesFailed,

    ClientNotInitialized,
    InitializationError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidParameters => "INVALID_PARAMETERS",
            ErrorCode::SignerNotProvided => "SIGNER_NOT_PROVIDED",
            ErrorCode::BlockchainError => "BLOCKCHAIN_ERROR",
            ErrorCode::ApiError => "API_ERROR",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
            ErrorCode::SeaportApprovalFailed => "SEAPORT_APPROVAL_FAILED",
            ErrorCode::SeaportSignatureFailed => "SEAPORT_SIGNATURE_FAILED",
            ErrorCode::SeaportTransactionFailed => "SEAPORT_TRANSACTION_FAILED",
            ErrorCode::ListingCreationFailed => "LISTING_CREATION_FAILED",
            ErrorCode::ListingValidationFailed => "LISTING_VALIDATION_FAILED",
            ErrorCode::BuyListingFailed => "BUY_LISTING_FAILED",
            ErrorCode::ListingCancellationFailed => "LISTING_CANCELLATION_FAILED",
            ErrorCode::OfferCreationFailed => "OFFER_CREATION_FAILED",
            ErrorCode::OfferValidationFailed => "OFFER_VALIDATION_FAILED",
            ErrorCode::AcceptOfferFailed => "ACCEPT_OFFER_FAILED",
            ErrorCode::OfferCancellationFailed => "OFFER_CANCELLATION_FAILED",
            ErrorCode::OrderNotFound => "ORDER_NOT_FOUND",
            ErrorCode::OffchainCancelOrderFailed => "OFFCHAIN_CANCEL_ORDER_FAILED",
            ErrorCode::TokenConversionFailed => "TOKEN_CONVERSION_FAILED",
            ErrorCode::InsufficientEthBalance => "INSUFFICIENT_ETH_BALANCE",
            ErrorCode::FetchFeesFailed => "FETCH_FEES_FAILED",
            ErrorCode::ClientNotInitialized => "CLIENT_NOT_INITIALIZED",
            ErrorCode::InitializationError => "INITIALIZATION_ERROR",
        }
    }

    /// Codes a handler raises on its own before anything is executed.
    /// They cross the handler boundary with their own code, only
    /// gaining the handler context.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ErrorCode::InvalidParameters
                | ErrorCode::SignerNotProvided
                | ErrorCode::OrderNotFound
                | ErrorCode::InsufficientEthBalance
                | ErrorCode::FetchFeesFailed
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic context of a failure.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<Caip2ChainId>,

    /// Intent parameters the failing operation was invoked with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_index: Option<usize>,

    /// Step list as it was when the failure got recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Vec<ProgressStep>>,
}

impl ErrorContext {
    /// Context of a handler invocation.
    pub fn handler<P: Serialize>(chain_id: Caip2ChainId, params: &P) -> Self {
        Self {
            chain_id: Some(chain_id),
            params: serde_json::to_value(params).ok(),
            ..Default::default()
        }
    }

    /// Fills the fields missing from `self` with the ones of `other`.
    pub fn merge(self, other: ErrorContext) -> Self {
        Self {
            chain_id: self.chain_id.or(other.chain_id),
            params: self.params.or(other.params),
            action: self.action.or(other.action),
            action_index: self.action_index.or(other.action_index),
            progress: self.progress.or(other.progress),
        }
    }
}

#[derive(Clone, derive_more::Debug)]
pub struct OrderbookError {
    code: ErrorCode,
    message: String,
    details: Option<ErrorDetails>,
    context: Option<Box<ErrorContext>>,
    timestamp: u64,
}

impl OrderbookError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            context: None,
            timestamp: now_millis(),
        }
    }

    pub fn with_details<E>(mut self, details: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.details = Some(Arc::new(details));
        self
    }

    pub fn with_shared_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(Box::new(context));
        self
    }

    /// Converts arbitrary error into [`OrderbookError`], keeping existing
    /// records untouched.
    pub fn from_error<E>(error: E, default_code: ErrorCode, context: Option<ErrorContext>) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        match error.into().downcast::<OrderbookError>() {
            Ok(known) => *known,
            Err(other) => {
                let err = Self {
                    code: default_code,
                    message: other.to_string(),
                    details: Some(Arc::from(other)),
                    context: None,
                    timestamp: now_millis(),
                };
                match context {
                    Some(context) => err.with_context(context),
                    None => err,
                }
            }
        }
    }

    /// Wraps `inner` under the intent-level `code`, the inner record stays
    /// reachable through [`Error::source`].
    pub fn wrap(inner: OrderbookError, code: ErrorCode, context: ErrorContext) -> Self {
        Self {
            code,
            message: inner.message.clone(),
            details: Some(Arc::new(inner)),
            context: Some(Box::new(context)),
            timestamp: now_millis(),
        }
    }

    /// Applies the handler boundary policy: precondition failures keep their
    /// code and gain the context, everything else gets wrapped under `code`.
    pub(crate) fn into_intent(mut self, code: ErrorCode, context: ErrorContext) -> Self {
        if self.code.is_precondition() || self.code == code {
            let context = match self.context.take() {
                Some(existing) => (*existing).merge(context),
                None => context,
            };
            self.with_context(context)
        } else {
            Self::wrap(self, code, context)
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&ErrorDetails> {
        self.details.as_ref()
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        self.context.as_deref()
    }

    /// Milliseconds since UNIX epoch the error was created at.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Innermost [`OrderbookError`] in the chain, `self` if not wrapped.
    pub fn step_error(&self) -> &OrderbookError {
        let mut current = self;
        while let Some(inner) = current
            .details
            .as_deref()
            .and_then(|d| d.downcast_ref::<OrderbookError>())
        {
            current = inner;
        }
        current
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code,
            "message": self.message,
            "details": self.details.as_ref().map(|d| d.to_string()),
            "context": self.context,
            "timestamp": self.timestamp,
        })
    }
}

impl fmt::Display for OrderbookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl Error for OrderbookError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.details
            .as_deref()
            .map(|d| d as &(dyn Error + 'static))
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
