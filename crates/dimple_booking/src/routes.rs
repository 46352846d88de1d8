// --- File: crates/dimple_booking/src/routes.rs ---

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use dimple_config::AppConfig;
use std::sync::Arc;

use crate::handlers::{
    awaiting_payment_handler, create_booking_handler, create_rating_handler, get_booking_handler,
    get_provider_handler, list_bookings_handler, list_ratings_handler, set_schedule_handler,
    update_status_handler, upsert_provider_handler, BookingState,
};
use crate::logic::BookingService;
use crate::store::Store;

/// Creates a router containing all routes for the booking feature.
///
/// # Arguments
/// * `config` - Shared application configuration (`Arc<AppConfig>`).
/// * `service` - The booking service over whichever store the composition
///   root selected.
pub fn routes<S: Store + 'static>(
    config: Arc<AppConfig>,
    service: Arc<BookingService<S>>,
) -> Router {
    let state = Arc::new(BookingState { config, service });

    Router::new()
        .route(
            "/bookings",
            post(create_booking_handler::<S>).get(list_bookings_handler::<S>),
        )
        .route("/bookings/{booking_id}", get(get_booking_handler::<S>))
        .route(
            "/bookings/{booking_id}/status",
            patch(update_status_handler::<S>),
        )
        .route(
            "/providers/{provider_id}",
            get(get_provider_handler::<S>).put(upsert_provider_handler::<S>),
        )
        .route(
            "/providers/{provider_id}/schedule",
            put(set_schedule_handler::<S>),
        )
        .route(
            "/providers/{provider_id}/ratings",
            get(list_ratings_handler::<S>),
        )
        .route("/ratings", post(create_rating_handler::<S>))
        .route(
            "/admin/bookings/awaiting-payment",
            get(awaiting_payment_handler::<S>),
        )
        .with_state(state)
}
