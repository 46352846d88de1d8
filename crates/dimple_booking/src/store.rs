// --- File: crates/dimple_booking/src/store.rs ---
//! Repository traits for the booking domain.
//!
//! These traits define the persistence operations the services need,
//! keeping the domain crates agnostic of the storage backend. The SQL
//! implementations live in `dimple-db`; an in-memory implementation for
//! tests and database-less deployments lives in [`memory`].
//!
//! Two operations carry atomicity requirements the implementations must
//! honor:
//!
//! * [`BookingRepository::insert_booking`] re-validates the window against
//!   blocking bookings inside its own critical section / transaction and
//!   fails with [`StoreError::Conflict`] instead of persisting an overlap.
//! * The payment application methods on [`PaymentRepository`] are guarded
//!   conditional updates: they only move state forward when it still
//!   matches the expected prior state, and report whether anything was
//!   actually applied so side effects can fire at most once.

pub mod memory;

use crate::models::{Booking, BookingStatus, PaymentRecord, ProviderProfile, Rating};
use chrono::NaiveDate;
use dimple_scheduling::WeeklySchedule;
use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Post-insert re-validation found an overlapping active booking.
    #[error("booking window conflicts with an active booking")]
    Conflict,
    #[error("{0} not found")]
    NotFound(String),
    #[error("a rating already exists for booking {0}")]
    DuplicateRating(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Page selection for list queries. Pages are 1-based.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Page { page: 1, limit: 10 }
    }
}

impl Page {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Page {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(10).clamp(1, 100),
        }
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.limit
    }
}

/// Outcome of a guarded payment state application.
#[derive(Debug, Clone)]
pub struct PaymentApplication {
    /// Whether this call actually changed state. `false` means the update
    /// was a replay or raced a concurrent application; callers must not
    /// fire side effects in that case.
    pub applied: bool,
    pub booking: Booking,
}

pub trait BookingRepository: Send + Sync {
    /// Persists a new booking. Implementations must atomically re-check the
    /// window against blocking bookings for the same provider and date and
    /// return [`StoreError::Conflict`] instead of persisting an overlap.
    fn insert_booking(
        &self,
        booking: Booking,
    ) -> impl Future<Output = Result<Booking, StoreError>> + Send;

    fn find_booking(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Booking>, StoreError>> + Send;

    /// Bookings that block the given provider's slots on the given date
    /// (status confirmed or in progress).
    fn blocking_bookings(
        &self,
        provider_id: &str,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Booking>, StoreError>> + Send;

    /// Guarded status update: applies `target` (and, for cancellations, the
    /// optional reason) only when the stored status still equals
    /// `expected`. Returns `None` when the guard fails.
    ///
    /// When the transition enters a blocking state from a non-blocking one,
    /// implementations must re-validate the window against the provider's
    /// other blocking bookings inside the same atomic section and fail with
    /// [`StoreError::Conflict`]; overlapping windows must never both end up
    /// active.
    fn update_status(
        &self,
        id: &str,
        expected: BookingStatus,
        target: BookingStatus,
        reason: Option<String>,
    ) -> impl Future<Output = Result<Option<Booking>, StoreError>> + Send;

    fn list_bookings_for_client(
        &self,
        client_id: &str,
        page: Page,
    ) -> impl Future<Output = Result<Vec<Booking>, StoreError>> + Send;

    fn list_bookings_for_provider(
        &self,
        provider_id: &str,
        page: Page,
    ) -> impl Future<Output = Result<Vec<Booking>, StoreError>> + Send;

    /// Bookings still awaiting payment, newest first (admin view).
    fn list_awaiting_payment(
        &self,
        page: Page,
    ) -> impl Future<Output = Result<Vec<Booking>, StoreError>> + Send;
}

pub trait ProviderRepository: Send + Sync {
    fn upsert_provider(
        &self,
        profile: ProviderProfile,
    ) -> impl Future<Output = Result<ProviderProfile, StoreError>> + Send;

    fn find_provider(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<ProviderProfile>, StoreError>> + Send;

    fn update_schedule(
        &self,
        provider_id: &str,
        schedule: WeeklySchedule,
    ) -> impl Future<Output = Result<ProviderProfile, StoreError>> + Send;

    /// Inserts a rating and updates the provider's materialized rating
    /// aggregate in the same transaction. Fails with
    /// [`StoreError::DuplicateRating`] when the booking already has one.
    fn insert_rating(
        &self,
        rating: Rating,
    ) -> impl Future<Output = Result<Rating, StoreError>> + Send;

    fn list_ratings(
        &self,
        provider_id: &str,
        page: Page,
    ) -> impl Future<Output = Result<Vec<Rating>, StoreError>> + Send;
}

pub trait PaymentRepository: Send + Sync {
    /// Persists a new payment attempt. When the booking's payment had
    /// failed, re-initiating puts it back to pending (the fresh reference
    /// supersedes the failed attempt).
    fn insert_payment(
        &self,
        record: PaymentRecord,
    ) -> impl Future<Output = Result<PaymentRecord, StoreError>> + Send;

    fn find_payment_by_reference(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<Option<PaymentRecord>, StoreError>> + Send;

    /// Applies a successful gateway result for `reference`:
    /// attempt `pending -> success`, booking payment status
    /// `pending -> paid`, and booking status `pending -> confirmed` (only
    /// from pending). Replays are no-ops with `applied == false`.
    ///
    /// The confirmed advance is skipped (booking stays pending, payment
    /// still becomes paid) when another blocking booking has taken the
    /// window in the meantime; the overlap check runs inside the same
    /// atomic section.
    fn apply_payment_success(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<PaymentApplication, StoreError>> + Send;

    /// Applies a failed gateway result for `reference`: attempt
    /// `pending -> failed` and booking payment status `pending -> failed`.
    /// Booking status is never touched.
    fn apply_payment_failure(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<PaymentApplication, StoreError>> + Send;

    /// Admin override: marks the booking paid (and confirmed when still
    /// pending) without a gateway result, settling any pending attempt.
    /// Same one-way guard as the gateway path.
    fn apply_admin_confirmation(
        &self,
        booking_id: &str,
    ) -> impl Future<Output = Result<PaymentApplication, StoreError>> + Send;

    /// Admin-only `paid -> refunded`. `applied == false` when the booking
    /// is not currently paid.
    fn apply_refund(
        &self,
        booking_id: &str,
    ) -> impl Future<Output = Result<PaymentApplication, StoreError>> + Send;

    /// Settled payment attempts of a client, newest first.
    fn payment_history(
        &self,
        client_id: &str,
        page: Page,
    ) -> impl Future<Output = Result<Vec<PaymentRecord>, StoreError>> + Send;
}

/// Convenience alias for a backend implementing the full storage surface.
pub trait Store: BookingRepository + ProviderRepository + PaymentRepository {}

impl<T: BookingRepository + ProviderRepository + PaymentRepository> Store for T {}
