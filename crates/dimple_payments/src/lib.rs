// --- File: crates/dimple_payments/src/lib.rs ---
//! Payment confirmation workflow for Dimple: Telebirr-backed initiation,
//! idempotent settlement of gateway results, admin overrides and the
//! payment REST surface.

pub mod doc;
pub mod error;
pub mod handlers;
pub mod logic;
pub mod routes;

pub use error::PaymentError;
pub use logic::{
    InitiatePaymentRequest, InitiatePaymentResponse, PaymentStatusView, PaymentWorkflow,
};
