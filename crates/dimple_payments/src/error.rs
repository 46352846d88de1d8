// --- File: crates/dimple_payments/src/error.rs ---

use dimple_booking::StoreError;
use dimple_common::HttpStatusCode;
use thiserror::Error;

/// Domain errors of the payment workflow. Like the booking errors these are
/// ordinary synchronous results; only `Storage` represents a fault of the
/// system itself.
#[derive(Error, Debug)]
pub enum PaymentError {
    /// The external gateway call failed or timed out. The payment attempt
    /// stays pending; the caller may retry initiation under a new
    /// reference, but a timeout alone never marks a payment failed.
    #[error("payment gateway is unavailable")]
    GatewayUnavailable,

    #[error("booking is already paid")]
    AlreadyPaid,

    #[error("booking payment is not in a refundable state")]
    NotPaid,

    #[error("actor is not permitted to perform this operation")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl HttpStatusCode for PaymentError {
    fn status_code(&self) -> u16 {
        match self {
            PaymentError::GatewayUnavailable => 502,
            PaymentError::AlreadyPaid | PaymentError::NotPaid => 409,
            PaymentError::Unauthorized => 403,
            PaymentError::NotFound(_) => 404,
            PaymentError::Validation(_) => 400,
            PaymentError::Storage(_) => 500,
        }
    }
}

impl From<StoreError> for PaymentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => PaymentError::NotFound(what),
            other => PaymentError::Storage(other.to_string()),
        }
    }
}
