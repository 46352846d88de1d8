// --- File: crates/dimple_common/src/lib.rs ---
//! Shared building blocks for the Dimple workspace: the common error
//! taxonomy, external-service abstractions and logging setup.

pub mod error;
pub mod logging;
pub mod services;

pub use error::{DimpleError, HttpStatusCode};
pub use services::{BoxFuture, ContactNotifier, PaymentGateway};
