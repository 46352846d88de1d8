// File: crates/dimple_payments/src/doc.rs
#![allow(dead_code)] // Allow dead code for doc functions

#[cfg(feature = "openapi")]
use crate::logic::{InitiatePaymentRequest, InitiatePaymentResponse, PaymentStatusView};
#[cfg(feature = "openapi")]
use dimple_booking::models::{Booking, PaymentAttemptStatus, PaymentRecord};
#[cfg(feature = "openapi")]
use utoipa::OpenApi;

// Dummy functions carrying the handler attributes for utoipa

#[cfg(feature = "openapi")]
#[utoipa::path(
    post,
    path = "/api/payments/initiate",
    request_body = InitiatePaymentRequest,
    responses(
        (status = 201, description = "Transfer started under a fresh reference", body = InitiatePaymentResponse),
        (status = 403, description = "Requester is not the booking's client"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is already paid"),
        (status = 502, description = "Payment gateway unavailable; retry later")
    ),
    tag = "Payments"
)]
fn doc_initiate_payment_handler() {}

#[cfg(feature = "openapi")]
#[utoipa::path(
    post,
    path = "/api/payments/{reference}/verify",
    params(("reference" = String, Path, description = "Opaque transaction reference")),
    responses(
        (status = 200, description = "Current attempt and booking state after polling the gateway", body = PaymentStatusView),
        (status = 404, description = "No payment attempt under this reference"),
        (status = 502, description = "Payment gateway unavailable")
    ),
    tag = "Payments"
)]
fn doc_verify_payment_handler() {}

#[cfg(feature = "openapi")]
#[utoipa::path(
    post,
    path = "/api/payments/telebirr/webhook",
    responses(
        (status = 200, description = "Result settled (idempotent; replays are no-ops)"),
        (status = 400, description = "Malformed payload"),
        (status = 401, description = "Signature verification failed"),
        (status = 404, description = "Unknown transaction reference")
    ),
    tag = "Payments"
)]
fn doc_telebirr_webhook_handler() {}

#[cfg(feature = "openapi")]
#[utoipa::path(
    post,
    path = "/api/admin/bookings/{booking_id}/confirm-payment",
    params(("booking_id" = String, Path, description = "Booking to mark paid")),
    responses(
        (status = 200, description = "Booking marked paid (no-op when already paid)", body = Booking),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Booking not found")
    ),
    tag = "Payments"
)]
fn doc_admin_confirm_payment_handler() {}

#[cfg(feature = "openapi")]
#[utoipa::path(
    post,
    path = "/api/admin/bookings/{booking_id}/refund",
    params(("booking_id" = String, Path, description = "Booking to refund")),
    responses(
        (status = 200, description = "Payment refunded", body = Booking),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Booking is not currently paid")
    ),
    tag = "Payments"
)]
fn doc_refund_payment_handler() {}

#[cfg(feature = "openapi")]
#[derive(OpenApi)]
#[openapi(
    paths(
        doc_initiate_payment_handler,
        doc_verify_payment_handler,
        doc_telebirr_webhook_handler,
        doc_admin_confirm_payment_handler,
        doc_refund_payment_handler
    ),
    components(schemas(
        InitiatePaymentRequest,
        InitiatePaymentResponse,
        PaymentStatusView,
        PaymentRecord,
        PaymentAttemptStatus,
        Booking
    )),
    tags(
        (name = "Payments", description = "Telebirr payment confirmation API")
    )
)]
pub struct PaymentsApiDoc;
