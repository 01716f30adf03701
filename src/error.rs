use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors raised by the payment core.
///
/// Every variant maps onto one of three caller-facing categories (see
/// [`ErrorCategory`]) so a transport can pick a status code without matching
/// on the variant itself.
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),
    #[error("Invalid payment state: {0}")]
    InvalidPaymentState(String),
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("Unknown gateway: {0}")]
    UnknownGateway(String),
    #[error("Invalid gateway: {0}")]
    InvalidGateway(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PaymentError>;

/// Failure raised by a gateway adapter. The provider's own diagnostic text is
/// always kept in the message.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("provider returned {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("unexpected provider response: {0}")]
    Decode(String),
    #[error("no charge found for payment {0}")]
    ChargeNotFound(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

/// Failure raised by a [`crate::domain::ports::PaymentStore`] backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },
    #[error("record {0} does not exist")]
    NotFound(String),
    #[error("record {id} changed concurrently (expected {expected}, found {actual})")]
    Conflict {
        id: String,
        expected: String,
        actual: String,
    },
    #[error("backend failure: {0}")]
    Backend(String),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    BadRequest,
    Processing,
}

impl PaymentError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PaymentError::PaymentNotFound(_) => ErrorCategory::NotFound,
            PaymentError::InvalidPaymentState(_)
            | PaymentError::UnknownGateway(_)
            | PaymentError::InvalidGateway(_)
            | PaymentError::ValidationError(_) => ErrorCategory::BadRequest,
            PaymentError::Gateway(_) | PaymentError::Store(_) | PaymentError::Config(_) => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            PaymentError::InvalidPaymentState(_) => "INVALID_PAYMENT_STATE",
            PaymentError::Gateway(_) => "PAYMENT_PROCESSING_ERROR",
            PaymentError::UnknownGateway(_) | PaymentError::InvalidGateway(_) => "INVALID_GATEWAY",
            PaymentError::ValidationError(_) => "VALIDATION_ERROR",
            PaymentError::Store(_) | PaymentError::Config(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to hand back to a caller. Internal failures are masked.
    pub fn public_message(&self) -> String {
        match self {
            PaymentError::Store(_) | PaymentError::Config(_) => {
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Serialized failure envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub message: String,
    pub error_code: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl From<&PaymentError> for ErrorResponse {
    fn from(err: &PaymentError) -> Self {
        Self {
            message: err.public_message(),
            error_code: err.code(),
            timestamp: Utc::now(),
        }
    }
}
