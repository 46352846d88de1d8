// --- File: crates/dimple_payments/src/handlers.rs ---
//! Axum handlers for the payment REST surface, including the Telebirr
//! webhook endpoint.

use crate::error::PaymentError;
use crate::logic::{InitiatePaymentRequest, InitiatePaymentResponse, PaymentStatusView, PaymentWorkflow};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use dimple_booking::handlers::actor_from_headers;
use dimple_booking::models::{Booking, PaymentRecord};
use dimple_booking::store::{Page, Store};
use dimple_common::services::{ContactNotifier, PaymentGateway};
use dimple_common::HttpStatusCode;
use dimple_config::AppConfig;
use dimple_telebirr::{
    gateway_status_from_str, telebirr_api_secret, verify_webhook_signature, TelebirrWebhookPayload,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Signature header Telebirr sends with webhook deliveries.
const WEBHOOK_SIGNATURE_HEADER: &str = "x-telebirr-signature";

// Shared state for the payment routes
pub struct PaymentsState<S, G, N> {
    pub config: Arc<AppConfig>,
    pub workflow: Arc<PaymentWorkflow<S, G, N>>,
}

/// Maps domain errors onto the HTTP surface.
pub fn payment_error_response(err: PaymentError) -> (StatusCode, String) {
    let status = StatusCode::from_u16(err.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        info!("storage failure surfaced to client: {}", err);
        (status, "Internal server error".to_string())
    } else {
        (status, err.to_string())
    }
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Admin-only: the client whose history is being audited.
    pub client_id: Option<String>,
}

/// Handler to start a Telebirr transfer for a booking.
pub async fn initiate_payment_handler<S, G, N>(
    State(state): State<Arc<PaymentsState<S, G, N>>>,
    headers: HeaderMap,
    Json(payload): Json<InitiatePaymentRequest>,
) -> Result<(StatusCode, Json<InitiatePaymentResponse>), (StatusCode, String)>
where
    S: Store + 'static,
    G: PaymentGateway + 'static,
    N: ContactNotifier + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let response = state
        .workflow
        .initiate(&actor, payload)
        .await
        .map_err(payment_error_response)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for client-driven verification: polls the gateway and settles
/// the attempt through the same idempotent path as the webhook.
pub async fn verify_payment_handler<S, G, N>(
    State(state): State<Arc<PaymentsState<S, G, N>>>,
    headers: HeaderMap,
    Path(reference): Path<String>,
) -> Result<Json<PaymentStatusView>, (StatusCode, String)>
where
    S: Store + 'static,
    G: PaymentGateway + 'static,
    N: ContactNotifier + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let view = state
        .workflow
        .verify(&actor, &reference)
        .await
        .map_err(payment_error_response)?;
    Ok(Json(view))
}

/// Handler for the asynchronous confirmation Telebirr posts to our
/// callback URL. Deliveries may repeat; settlement is idempotent.
pub async fn telebirr_webhook_handler<S, G, N>(
    State(state): State<Arc<PaymentsState<S, G, N>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, String)>
where
    S: Store + 'static,
    G: PaymentGateway + 'static,
    N: ContactNotifier + 'static,
{
    match telebirr_api_secret() {
        Ok(secret) => {
            let signature = headers
                .get(WEBHOOK_SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok());
            verify_webhook_signature(&secret, &body, signature).map_err(|_| {
                (
                    StatusCode::UNAUTHORIZED,
                    "Invalid webhook signature".to_string(),
                )
            })?;
        }
        Err(_) => {
            // Dev deployments without the shared secret still accept the
            // callback, loudly.
            warn!("TELEBIRR_API_SECRET not set; webhook signature not verified");
        }
    }

    let payload: TelebirrWebhookPayload = serde_json::from_slice(&body).map_err(|err| {
        (
            StatusCode::BAD_REQUEST,
            format!("Malformed webhook payload: {}", err),
        )
    })?;
    info!(
        reference = %payload.reference,
        status = %payload.status,
        "telebirr webhook received"
    );

    let result = gateway_status_from_str(&payload.status);
    state
        .workflow
        .apply_payment_result(&payload.reference, result)
        .await
        .map_err(payment_error_response)?;
    Ok(StatusCode::OK)
}

/// Handler for the admin override: mark a booking paid off out-of-band
/// payment proof.
pub async fn admin_confirm_payment_handler<S, G, N>(
    State(state): State<Arc<PaymentsState<S, G, N>>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Result<Json<Booking>, (StatusCode, String)>
where
    S: Store + 'static,
    G: PaymentGateway + 'static,
    N: ContactNotifier + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let booking = state
        .workflow
        .admin_confirm(&actor, &booking_id)
        .await
        .map_err(payment_error_response)?;
    Ok(Json(booking))
}

/// Handler for the admin-only refund of a paid booking.
pub async fn refund_payment_handler<S, G, N>(
    State(state): State<Arc<PaymentsState<S, G, N>>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Result<Json<Booking>, (StatusCode, String)>
where
    S: Store + 'static,
    G: PaymentGateway + 'static,
    N: ContactNotifier + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let booking = state
        .workflow
        .refund(&actor, &booking_id)
        .await
        .map_err(payment_error_response)?;
    Ok(Json(booking))
}

/// Handler to list settled payment attempts, newest first.
pub async fn payment_history_handler<S, G, N>(
    State(state): State<Arc<PaymentsState<S, G, N>>>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<PaymentRecord>>, (StatusCode, String)>
where
    S: Store + 'static,
    G: PaymentGateway + 'static,
    N: ContactNotifier + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let page = Page::new(query.page, query.limit);
    let records = state
        .workflow
        .history(&actor, query.client_id.as_deref(), page)
        .await
        .map_err(payment_error_response)?;
    Ok(Json(records))
}
