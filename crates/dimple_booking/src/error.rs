// --- File: crates/dimple_booking/src/error.rs ---

use crate::models::BookingStatus;
use crate::store::StoreError;
use dimple_common::HttpStatusCode;
use thiserror::Error;

/// Domain errors of the booking core. All of these are ordinary synchronous
/// results surfaced to the caller; only `Storage` represents a fault of the
/// system itself.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("requested window is outside the provider's open hours")]
    SlotNotAvailable,

    #[error("requested window overlaps an existing active booking")]
    SlotConflict,

    #[error("transition {from:?} -> {to:?} is not allowed")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("actor is not permitted to perform this operation")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(String),

    #[error("duration of {minutes} minutes is outside the allowed {min}-{max} range")]
    InvalidDuration { minutes: u32, min: u32, max: u32 },

    #[error("a rating already exists for this booking")]
    AlreadyRated,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl HttpStatusCode for BookingError {
    fn status_code(&self) -> u16 {
        match self {
            BookingError::SlotNotAvailable => 422,
            BookingError::SlotConflict
            | BookingError::InvalidTransition { .. }
            | BookingError::AlreadyRated => 409,
            BookingError::Unauthorized => 403,
            BookingError::NotFound(_) => 404,
            BookingError::InvalidDuration { .. } | BookingError::Validation(_) => 400,
            BookingError::Storage(_) => 500,
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => BookingError::SlotConflict,
            StoreError::NotFound(what) => BookingError::NotFound(what),
            StoreError::DuplicateRating(_) => BookingError::AlreadyRated,
            StoreError::Backend(message) => BookingError::Storage(message),
        }
    }
}
