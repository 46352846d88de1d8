// --- File: crates/dimple_booking/src/handlers.rs ---
//! Axum handlers for the booking REST surface.
//!
//! Authentication happens upstream; the gateway forwards the verified
//! identity in `x-actor-id` / `x-actor-role` headers and the handlers trust
//! them as given.

use crate::error::BookingError;
use crate::logic::{
    BookingService, CreateBookingRequest, CreateRatingRequest, ProviderView, UpdateStatusRequest,
};
use crate::models::{Actor, Booking, ProviderProfile, Rating, Role};
use crate::store::{Page, Store};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use dimple_common::HttpStatusCode;
use dimple_config::AppConfig;
use dimple_scheduling::{DayAvailability, WeeklySchedule};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

// Shared state for the booking routes
pub struct BookingState<S> {
    pub config: Arc<AppConfig>,
    pub service: Arc<BookingService<S>>,
}

/// Reads the trusted actor identity forwarded by the auth layer.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, (StatusCode, String)> {
    let id = headers
        .get("x-actor-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing x-actor-id header".to_string(),
        ))?;
    let role = headers
        .get("x-actor-role")
        .and_then(|v| v.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing x-actor-role header".to_string(),
        ))?;
    let role = match role {
        "client" => Role::Client,
        // "massager" is the legacy spelling of the provider role
        "provider" | "massager" => Role::Provider,
        "admin" => Role::Admin,
        other => {
            return Err((
                StatusCode::UNAUTHORIZED,
                format!("Unknown actor role: {}", other),
            ))
        }
    };
    Ok(Actor::new(id, role))
}

/// Maps domain errors onto the HTTP surface.
pub fn booking_error_response(err: BookingError) -> (StatusCode, String) {
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
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListQuery {
    fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}

/// Payload for creating or replacing a provider profile.
#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpsertProviderRequest {
    pub name: String,
    pub phone: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = 60000))]
    pub hourly_rate_cents: i64,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default)]
    pub days: Vec<DayAvailability>,
}

fn default_available() -> bool {
    true
}

/// Payload for replacing a provider's weekly schedule.
#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScheduleUpdateRequest {
    pub days: Vec<DayAvailability>,
}

/// Handler to create a booking.
pub async fn create_booking_handler<S: Store + 'static>(
    State(state): State<Arc<BookingState<S>>>,
    headers: HeaderMap,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), (StatusCode, String)> {
    let actor = actor_from_headers(&headers)?;
    let booking = state
        .service
        .create_booking(&actor, payload)
        .await
        .map_err(booking_error_response)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Handler to fetch a single booking.
pub async fn get_booking_handler<S: Store + 'static>(
    State(state): State<Arc<BookingState<S>>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Result<Json<Booking>, (StatusCode, String)> {
    let actor = actor_from_headers(&headers)?;
    let booking = state
        .service
        .get_booking(&booking_id, &actor)
        .await
        .map_err(booking_error_response)?;
    Ok(Json(booking))
}

/// Handler to list the caller's bookings, newest first.
pub async fn list_bookings_handler<S: Store + 'static>(
    State(state): State<Arc<BookingState<S>>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Booking>>, (StatusCode, String)> {
    let actor = actor_from_headers(&headers)?;
    let bookings = state
        .service
        .list_own_bookings(&actor, query.page())
        .await
        .map_err(booking_error_response)?;
    Ok(Json(bookings))
}

/// Handler to move a booking to a new status.
pub async fn update_status_handler<S: Store + 'static>(
    State(state): State<Arc<BookingState<S>>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Booking>, (StatusCode, String)> {
    let actor = actor_from_headers(&headers)?;
    let booking = state
        .service
        .set_booking_status(&booking_id, &actor, payload.status, payload.reason)
        .await
        .map_err(booking_error_response)?;
    Ok(Json(booking))
}

/// Handler to fetch a provider profile with its schedule and rating.
pub async fn get_provider_handler<S: Store + 'static>(
    State(state): State<Arc<BookingState<S>>>,
    Path(provider_id): Path<String>,
) -> Result<Json<ProviderView>, (StatusCode, String)> {
    let provider = state
        .service
        .get_provider(&provider_id)
        .await
        .map_err(booking_error_response)?;
    Ok(Json(provider))
}

/// Handler to create or replace a provider profile.
pub async fn upsert_provider_handler<S: Store + 'static>(
    State(state): State<Arc<BookingState<S>>>,
    headers: HeaderMap,
    Path(provider_id): Path<String>,
    Json(payload): Json<UpsertProviderRequest>,
) -> Result<Json<ProviderView>, (StatusCode, String)> {
    let actor = actor_from_headers(&headers)?;
    if payload.hourly_rate_cents <= 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "hourly_rate_cents must be positive".to_string(),
        ));
    }
    let schedule = WeeklySchedule::new(payload.days)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    // A fresh profile starts with an empty rating aggregate; replacing an
    // existing profile keeps it.
    let existing = state
        .service
        .store()
        .find_provider(&provider_id)
        .await
        .map_err(|e| booking_error_response(e.into()))?;
    let (rating_count, rating_sum) = existing
        .map(|p| (p.rating_count, p.rating_sum))
        .unwrap_or((0, 0));
    let profile = ProviderProfile {
        id: provider_id,
        name: payload.name,
        phone: payload.phone,
        hourly_rate_cents: payload.hourly_rate_cents,
        is_available: payload.is_available,
        schedule,
        rating_count,
        rating_sum,
    };
    let profile = state
        .service
        .upsert_provider(&actor, profile)
        .await
        .map_err(booking_error_response)?;
    Ok(Json(profile.into()))
}

/// Handler to replace a provider's weekly schedule.
pub async fn set_schedule_handler<S: Store + 'static>(
    State(state): State<Arc<BookingState<S>>>,
    headers: HeaderMap,
    Path(provider_id): Path<String>,
    Json(payload): Json<ScheduleUpdateRequest>,
) -> Result<Json<ProviderView>, (StatusCode, String)> {
    let actor = actor_from_headers(&headers)?;
    let schedule = WeeklySchedule::new(payload.days)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let profile = state
        .service
        .set_schedule(&actor, &provider_id, schedule)
        .await
        .map_err(booking_error_response)?;
    Ok(Json(profile.into()))
}

/// Handler to rate a completed booking.
pub async fn create_rating_handler<S: Store + 'static>(
    State(state): State<Arc<BookingState<S>>>,
    headers: HeaderMap,
    Json(payload): Json<CreateRatingRequest>,
) -> Result<(StatusCode, Json<Rating>), (StatusCode, String)> {
    let actor = actor_from_headers(&headers)?;
    let rating = state
        .service
        .create_rating(&actor, payload)
        .await
        .map_err(booking_error_response)?;
    Ok((StatusCode::CREATED, Json(rating)))
}

/// Handler to list a provider's ratings, newest first.
pub async fn list_ratings_handler<S: Store + 'static>(
    State(state): State<Arc<BookingState<S>>>,
    Path(provider_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Rating>>, (StatusCode, String)> {
    let ratings = state
        .service
        .list_ratings(&provider_id, query.page())
        .await
        .map_err(booking_error_response)?;
    Ok(Json(ratings))
}

/// Handler for the admin view of bookings awaiting payment.
pub async fn awaiting_payment_handler<S: Store + 'static>(
    State(state): State<Arc<BookingState<S>>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Booking>>, (StatusCode, String)> {
    let actor = actor_from_headers(&headers)?;
    let bookings = state
        .service
        .list_awaiting_payment(&actor, query.page())
        .await
        .map_err(booking_error_response)?;
    Ok(Json(bookings))
}
