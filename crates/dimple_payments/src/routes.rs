// --- File: crates/dimple_payments/src/routes.rs ---

use axum::{
    routing::{get, post},
    Router,
};
use dimple_booking::store::Store;
use dimple_common::services::{ContactNotifier, PaymentGateway};
use dimple_config::AppConfig;
use std::sync::Arc;

use crate::handlers::{
    admin_confirm_payment_handler, initiate_payment_handler, payment_history_handler,
    refund_payment_handler, telebirr_webhook_handler, verify_payment_handler, PaymentsState,
};
use crate::logic::PaymentWorkflow;

/// Creates a router containing all routes for the payment feature.
///
/// # Arguments
/// * `config` - Shared application configuration (`Arc<AppConfig>`).
/// * `workflow` - The payment workflow over whichever store, gateway and
///   notifier the composition root selected.
pub fn routes<S, G, N>(
    config: Arc<AppConfig>,
    workflow: Arc<PaymentWorkflow<S, G, N>>,
) -> Router
where
    S: Store + 'static,
    G: PaymentGateway + 'static,
    N: ContactNotifier + 'static,
{
    let state = Arc::new(PaymentsState { config, workflow });

    Router::new()
        // API endpoints called by our frontend
        .route("/payments/initiate", post(initiate_payment_handler::<S, G, N>))
        .route(
            "/payments/{reference}/verify",
            post(verify_payment_handler::<S, G, N>),
        )
        .route("/payments/history", get(payment_history_handler::<S, G, N>))
        // API endpoint called by the Telebirr SERVER for webhook notifications
        .route(
            "/payments/telebirr/webhook",
            post(telebirr_webhook_handler::<S, G, N>),
        )
        // Admin overrides
        .route(
            "/admin/bookings/{booking_id}/confirm-payment",
            post(admin_confirm_payment_handler::<S, G, N>),
        )
        .route(
            "/admin/bookings/{booking_id}/refund",
            post(refund_payment_handler::<S, G, N>),
        )
        .with_state(state)
}
