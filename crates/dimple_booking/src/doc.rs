// File: crates/dimple_booking/src/doc.rs
#![allow(dead_code)] // Allow dead code for doc functions

#[cfg(feature = "openapi")]
use crate::logic::{CreateBookingRequest, CreateRatingRequest, UpdateStatusRequest};
#[cfg(feature = "openapi")]
use crate::models::{Booking, BookingStatus, PaymentStatus, Rating, Role};
#[cfg(feature = "openapi")]
use utoipa::OpenApi;

// Dummy functions carrying the handler attributes for utoipa

#[cfg(feature = "openapi")]
#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created in pending state", body = Booking),
        (status = 400, description = "Invalid duration or malformed window"),
        (status = 409, description = "Window overlaps an active booking"),
        (status = 422, description = "Window outside the provider's open hours")
    ),
    tag = "Bookings"
)]
fn doc_create_booking_handler() {}

#[cfg(feature = "openapi")]
#[utoipa::path(
    patch,
    path = "/api/bookings/{booking_id}/status",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Booking moved to the new status", body = Booking),
        (status = 403, description = "Actor may not take this transition"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Transition not legal from the current state")
    ),
    tag = "Bookings"
)]
fn doc_update_status_handler() {}

#[cfg(feature = "openapi")]
#[utoipa::path(
    post,
    path = "/api/ratings",
    request_body = CreateRatingRequest,
    responses(
        (status = 201, description = "Rating created", body = Rating),
        (status = 400, description = "Booking not completed or score out of range"),
        (status = 409, description = "Booking already rated")
    ),
    tag = "Ratings"
)]
fn doc_create_rating_handler() {}

#[cfg(feature = "openapi")]
#[derive(OpenApi)]
#[openapi(
    paths(
        doc_create_booking_handler,
        doc_update_status_handler,
        doc_create_rating_handler
    ),
    components(schemas(
        Booking,
        BookingStatus,
        PaymentStatus,
        Rating,
        Role,
        CreateBookingRequest,
        UpdateStatusRequest,
        CreateRatingRequest
    )),
    tags(
        (name = "Bookings", description = "Booking lifecycle API"),
        (name = "Ratings", description = "Post-service ratings API")
    )
)]
pub struct BookingApiDoc;
