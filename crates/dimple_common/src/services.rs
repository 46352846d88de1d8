// --- File: crates/dimple_common/src/services.rs ---
//! Service abstractions for external services.
//!
//! This module provides trait definitions for external services used by the application.
//! These traits allow for dependency injection and easier testing by decoupling the
//! application logic from specific implementations of external services.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Outcome of asking the gateway to start a mobile-money transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayInitiation {
    /// The opaque transaction reference the transfer runs under.
    pub reference: String,
    /// URL the payer is sent to when the gateway uses a hosted payment page.
    pub payment_url: Option<String>,
}

/// Terminal-or-not transfer state as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayPaymentStatus {
    Success,
    Failed,
    Pending,
}

/// A trait for mobile-money payment gateway operations.
///
/// The gateway protocol itself is opaque to the rest of the system: callers
/// only see "start a transfer under this reference" and "what state is this
/// reference in". Transport failures and timeouts surface as errors so that
/// an ambiguous outcome is never silently treated as a failed payment.
pub trait PaymentGateway: Send + Sync {
    /// Error type returned by gateway operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Ask the gateway to start a transfer of `amount_cents` from `payer_phone`
    /// under the given opaque `reference`.
    fn initiate(
        &self,
        amount_cents: i64,
        payer_phone: &str,
        reference: &str,
        description: &str,
    ) -> BoxFuture<'_, GatewayInitiation, Self::Error>;

    /// Query the gateway for the state of a previously initiated transfer.
    fn verify(&self, reference: &str) -> BoxFuture<'_, GatewayPaymentStatus, Self::Error>;
}

/// A trait for fire-and-forget notification delivery.
///
/// Callers must treat delivery failure as non-fatal: a failed notification
/// never fails the state transition it was announcing.
pub trait ContactNotifier: Send + Sync {
    /// Error type returned by notification operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Announce that payment was confirmed for a booking and the provider's
    /// contact details may be shared with the client.
    fn share_contact(
        &self,
        booking_id: &str,
        client_id: &str,
        provider_id: &str,
    ) -> BoxFuture<'_, NotificationResult, Self::Error>;
}

/// Represents the result of a notification operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    /// The ID of the notification.
    pub id: String,
    /// The status of the notification.
    pub status: String,
}
