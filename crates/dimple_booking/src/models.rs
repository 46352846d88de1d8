// --- File: crates/dimple_booking/src/models.rs ---
//! Canonical entities of the booking domain.
//!
//! The earlier drafts of this system disagreed on field names (`client` vs
//! `user`, `time` vs `startTime`/`endTime`); this module is the single
//! reconciled schema everything else works against.

use chrono::{DateTime, NaiveDate, Utc};
use dimple_scheduling::{BookingWindow, WeeklySchedule};
use serde::{Deserialize, Serialize};

/// Role attached to an authenticated actor by the upstream auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Role {
    Client,
    Provider,
    Admin,
}

/// An authenticated caller. Identity and role are trusted as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Actor {
            id: id.into(),
            role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Rejected,
}

impl BookingStatus {
    /// Terminal states accept no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Rejected
        )
    }

    /// Whether a booking in this state blocks its time window for others.
    /// Pending bookings hold no claim on the slot until the provider (or a
    /// paid confirmation) accepts them.
    pub fn is_blocking(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "in_progress" => Some(BookingStatus::InProgress),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "rejected" => Some(BookingStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// A booked (or requested) service session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Booking {
    pub id: String,
    pub client_id: String,
    pub provider_id: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2025-06-02"))]
    pub service_date: NaiveDate,
    /// Start of the window, minutes from midnight.
    pub start_minute: u32,
    /// End of the window, minutes from midnight (exclusive).
    pub end_minute: u32,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    /// Provider rate prorated over the duration, fixed at creation.
    pub total_amount_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn window(&self) -> BookingWindow {
        BookingWindow {
            date: self.service_date,
            start_minute: self.start_minute,
            end_minute: self.end_minute,
        }
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end_minute - self.start_minute
    }
}

/// A provider's bookable profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProviderProfile {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub hourly_rate_cents: i64,
    pub is_available: bool,
    pub schedule: WeeklySchedule,
    /// Materialized rating aggregate, maintained alongside rating inserts.
    pub rating_count: i64,
    pub rating_sum: i64,
}

impl ProviderProfile {
    pub fn average_rating(&self) -> Option<f64> {
        if self.rating_count == 0 {
            None
        } else {
            Some(self.rating_sum as f64 / self.rating_count as f64)
        }
    }
}

/// A client's post-service review. At most one per booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Rating {
    pub id: String,
    pub booking_id: String,
    pub client_id: String,
    pub provider_id: String,
    pub score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub created_at: DateTime<Utc>,
}

/// State of one payment attempt as mirrored from the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum PaymentAttemptStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentAttemptStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentAttemptStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentAttemptStatus::Pending => "pending",
            PaymentAttemptStatus::Success => "success",
            PaymentAttemptStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentAttemptStatus::Pending),
            "success" => Some(PaymentAttemptStatus::Success),
            "failed" => Some(PaymentAttemptStatus::Failed),
            _ => None,
        }
    }
}

/// One payment attempt for a booking. Records are an audit trail and are
/// never deleted; a failed attempt is superseded by a new record under a
/// fresh reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaymentRecord {
    /// Opaque transaction reference shared with the gateway. Unique.
    pub reference: String,
    pub booking_id: String,
    pub client_id: String,
    pub amount_cents: i64,
    pub payer_phone: String,
    pub method: String,
    pub status: PaymentAttemptStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub updated_at: DateTime<Utc>,
}
