// --- File: crates/dimple_telebirr/src/lib.rs ---
//! Telebirr mobile-money gateway integration for Dimple.
//!
//! The gateway protocol is opaque to the rest of the workspace: this crate
//! turns "start a transfer" and "what happened to this reference" into
//! signed HTTP calls and exposes them behind the
//! [`dimple_common::PaymentGateway`] trait.

pub mod logic;
pub mod service;

pub use logic::{
    gateway_status_from_str, initiate_payment, query_payment, telebirr_api_secret,
    verify_webhook_signature, TelebirrError, TelebirrWebhookPayload,
};
pub use service::TelebirrGateway;
