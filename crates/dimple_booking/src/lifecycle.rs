// --- File: crates/dimple_booking/src/lifecycle.rs ---
//! The booking lifecycle state machine.
//!
//! Legal transitions, by actor:
//!
//! | From        | Client    | Provider               | Admin |
//! |-------------|-----------|------------------------|-------|
//! | pending     | cancelled | confirmed, rejected    | any   |
//! | confirmed   | cancelled | in_progress, cancelled | any   |
//! | in_progress | —         | completed              | any   |
//! | terminal    | —         | —                      | —     |
//!
//! Terminal states (`completed`, `cancelled`, `rejected`) accept nothing,
//! from anyone.

use crate::models::{BookingStatus, Role};

/// Why a requested transition was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDenied {
    /// The edge does not exist from the current state (terminal state, or
    /// a no-op transition to the same state).
    Invalid,
    /// The edge exists but this role may not take it.
    Unauthorized,
}

/// Checks whether `role` may move a booking from `current` to `target`.
pub fn check_transition(
    current: BookingStatus,
    target: BookingStatus,
    role: Role,
) -> Result<(), TransitionDenied> {
    if current.is_terminal() || current == target {
        return Err(TransitionDenied::Invalid);
    }
    // Admin may force any edge out of a non-terminal state.
    if role == Role::Admin {
        return Ok(());
    }
    let allowed = match (current, role) {
        (BookingStatus::Pending, Role::Client) => matches!(target, BookingStatus::Cancelled),
        (BookingStatus::Pending, Role::Provider) => {
            matches!(target, BookingStatus::Confirmed | BookingStatus::Rejected)
        }
        (BookingStatus::Confirmed, Role::Client) => matches!(target, BookingStatus::Cancelled),
        (BookingStatus::Confirmed, Role::Provider) => {
            matches!(target, BookingStatus::InProgress | BookingStatus::Cancelled)
        }
        (BookingStatus::InProgress, Role::Provider) => {
            matches!(target, BookingStatus::Completed)
        }
        _ => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(TransitionDenied::Unauthorized)
    }
}
