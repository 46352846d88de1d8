// --- File: crates/dimple_notify/src/lib.rs ---
//! Fire-and-forget notifications for Dimple.
//!
//! Delivery goes to the operations channel through the Telegram Bot API.
//! Every caller must treat a failed send as non-fatal: a notification
//! announces a state transition that has already committed.

pub mod logic;
pub mod service;

pub use logic::{send_telegram_message, NotifyError};
pub use service::TelegramNotifier;
