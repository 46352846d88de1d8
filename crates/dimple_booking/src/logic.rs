// --- File: crates/dimple_booking/src/logic.rs ---
//! Application service for bookings, schedules and ratings.
//!
//! `BookingService` ties the pure scheduling checks to the repositories and
//! enforces who may do what. Creation runs inside a per-(provider, date)
//! critical section, and the repository re-validates on insert, so two
//! overlapping requests can never both be persisted as active.

use crate::error::BookingError;
use crate::lifecycle::{check_transition, TransitionDenied};
use crate::models::{Actor, Booking, BookingStatus, PaymentStatus, ProviderProfile, Rating, Role};
use crate::store::{Page, Store};
use chrono::{NaiveDate, NaiveTime, Utc};
use dimple_config::BookingConfig;
use dimple_scheduling::{has_conflict, is_within_availability, BookingWindow, WindowError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A request to book a provider's time.
#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateBookingRequest {
    pub provider_id: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2025-06-02"))]
    pub date: NaiveDate,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "10:00:00"))]
    pub start_time: NaiveTime,
    #[cfg_attr(feature = "openapi", schema(example = 60))]
    pub duration_minutes: u32,
}

/// A request to move a booking to a new status.
#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
    #[cfg_attr(feature = "openapi", schema(example = "client asked to move the session"))]
    pub reason: Option<String>,
}

/// A request to rate a completed booking.
#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateRatingRequest {
    pub booking_id: String,
    #[cfg_attr(feature = "openapi", schema(minimum = 1, maximum = 5, example = 5))]
    pub score: u8,
    pub review: Option<String>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProviderView {
    pub id: String,
    pub name: String,
    pub hourly_rate_cents: i64,
    pub is_available: bool,
    pub schedule: dimple_scheduling::WeeklySchedule,
    pub rating_count: i64,
    pub average_rating: Option<f64>,
}

impl From<ProviderProfile> for ProviderView {
    fn from(profile: ProviderProfile) -> Self {
        let average_rating = profile.average_rating();
        ProviderView {
            id: profile.id,
            name: profile.name,
            hourly_rate_cents: profile.hourly_rate_cents,
            is_available: profile.is_available,
            schedule: profile.schedule,
            rating_count: profile.rating_count,
            average_rating,
        }
    }
}

pub struct BookingService<S> {
    store: Arc<S>,
    rules: BookingConfig,
    // One async mutex per (provider, date) serializes check-then-insert for
    // that slot space. The map itself only grows by touched keys.
    slot_locks: Mutex<HashMap<(String, NaiveDate), Arc<Mutex<()>>>>,
}

impl<S: Store> BookingService<S> {
    pub fn new(store: Arc<S>, rules: BookingConfig) -> Self {
        BookingService {
            store,
            rules,
            slot_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    async fn slot_lock(&self, provider_id: &str, date: NaiveDate) -> Arc<Mutex<()>> {
        let mut locks = self.slot_locks.lock().await;
        locks
            .entry((provider_id.to_string(), date))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Creates a booking in `pending`/`pending` after the availability and
    /// conflict checks pass. No external calls happen here; payment is a
    /// separate later step.
    pub async fn create_booking(
        &self,
        actor: &Actor,
        request: CreateBookingRequest,
    ) -> Result<Booking, BookingError> {
        if actor.role != Role::Client {
            return Err(BookingError::Unauthorized);
        }
        let minutes = request.duration_minutes;
        if minutes < self.rules.min_duration_minutes || minutes > self.rules.max_duration_minutes {
            return Err(BookingError::InvalidDuration {
                minutes,
                min: self.rules.min_duration_minutes,
                max: self.rules.max_duration_minutes,
            });
        }
        let window = BookingWindow::new(request.date, request.start_time, minutes).map_err(
            |err| match err {
                WindowError::ZeroDuration => BookingError::InvalidDuration {
                    minutes,
                    min: self.rules.min_duration_minutes,
                    max: self.rules.max_duration_minutes,
                },
                WindowError::CrossesMidnight { .. } => {
                    BookingError::Validation("booking may not cross midnight".to_string())
                }
            },
        )?;

        let provider = self
            .store
            .find_provider(&request.provider_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("provider".to_string()))?;
        if !provider.is_available {
            return Err(BookingError::SlotNotAvailable);
        }
        if !is_within_availability(&provider.schedule, &window) {
            debug!(
                provider = %provider.id,
                date = %window.date,
                "requested window outside declared open hours"
            );
            return Err(BookingError::SlotNotAvailable);
        }

        // Serialize check-then-insert per provider and date.
        let lock = self.slot_lock(&provider.id, window.date).await;
        let _guard = lock.lock().await;

        let blocking = self.store.blocking_bookings(&provider.id, window.date).await?;
        let windows: Vec<BookingWindow> = blocking.iter().map(Booking::window).collect();
        if has_conflict(&window, &windows) {
            return Err(BookingError::SlotConflict);
        }

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            client_id: actor.id.clone(),
            provider_id: provider.id.clone(),
            service_date: window.date,
            start_minute: window.start_minute,
            end_minute: window.end_minute,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            total_amount_cents: provider.hourly_rate_cents * i64::from(minutes) / 60,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };
        let booking = self.store.insert_booking(booking).await?;
        info!(booking = %booking.id, provider = %booking.provider_id, "booking created");
        Ok(booking)
    }

    /// Moves a booking through the lifecycle state machine on behalf of an
    /// actor. The stored update is guarded on the status the caller saw, so
    /// two racing transitions cannot both win.
    pub async fn set_booking_status(
        &self,
        booking_id: &str,
        actor: &Actor,
        target: BookingStatus,
        reason: Option<String>,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("booking".to_string()))?;

        match actor.role {
            Role::Client if booking.client_id != actor.id => {
                return Err(BookingError::Unauthorized)
            }
            Role::Provider if booking.provider_id != actor.id => {
                return Err(BookingError::Unauthorized)
            }
            _ => {}
        }
        check_transition(booking.status, target, actor.role).map_err(|denied| match denied {
            TransitionDenied::Invalid => BookingError::InvalidTransition {
                from: booking.status,
                to: target,
            },
            TransitionDenied::Unauthorized => BookingError::Unauthorized,
        })?;

        let reason = match (target, reason) {
            (BookingStatus::Cancelled, Some(text)) => {
                if text.chars().count() > self.rules.max_cancellation_reason_chars {
                    return Err(BookingError::Validation(format!(
                        "cancellation reason is limited to {} characters",
                        self.rules.max_cancellation_reason_chars
                    )));
                }
                Some(text)
            }
            _ => None,
        };

        match self
            .store
            .update_status(booking_id, booking.status, target, reason)
            .await?
        {
            Some(updated) => {
                info!(
                    booking = %updated.id,
                    from = booking.status.as_str(),
                    to = updated.status.as_str(),
                    "booking status changed"
                );
                Ok(updated)
            }
            None => {
                // Someone else moved the booking between our read and the
                // guarded write; report against the state they left behind.
                warn!(booking = %booking_id, "status transition lost a race");
                let current = self
                    .store
                    .find_booking(booking_id)
                    .await?
                    .ok_or_else(|| BookingError::NotFound("booking".to_string()))?;
                Err(BookingError::InvalidTransition {
                    from: current.status,
                    to: target,
                })
            }
        }
    }

    /// Fetches a booking; only the two parties and admins may see it.
    pub async fn get_booking(
        &self,
        booking_id: &str,
        actor: &Actor,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("booking".to_string()))?;
        let allowed = match actor.role {
            Role::Admin => true,
            Role::Client => booking.client_id == actor.id,
            Role::Provider => booking.provider_id == actor.id,
        };
        if !allowed {
            return Err(BookingError::Unauthorized);
        }
        Ok(booking)
    }

    /// The caller's own bookings, newest first.
    pub async fn list_own_bookings(
        &self,
        actor: &Actor,
        page: Page,
    ) -> Result<Vec<Booking>, BookingError> {
        let bookings = match actor.role {
            Role::Client => self.store.list_bookings_for_client(&actor.id, page).await?,
            Role::Provider => {
                self.store
                    .list_bookings_for_provider(&actor.id, page)
                    .await?
            }
            Role::Admin => return Err(BookingError::Unauthorized),
        };
        Ok(bookings)
    }

    /// Admin view of bookings still awaiting payment.
    pub async fn list_awaiting_payment(
        &self,
        actor: &Actor,
        page: Page,
    ) -> Result<Vec<Booking>, BookingError> {
        if actor.role != Role::Admin {
            return Err(BookingError::Unauthorized);
        }
        Ok(self.store.list_awaiting_payment(page).await?)
    }

    pub async fn get_provider(&self, provider_id: &str) -> Result<ProviderView, BookingError> {
        let profile = self
            .store
            .find_provider(provider_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("provider".to_string()))?;
        Ok(profile.into())
    }

    /// Creates or replaces a provider profile. Providers manage their own;
    /// admins may manage any.
    pub async fn upsert_provider(
        &self,
        actor: &Actor,
        profile: ProviderProfile,
    ) -> Result<ProviderProfile, BookingError> {
        let allowed = actor.role == Role::Admin
            || (actor.role == Role::Provider && actor.id == profile.id);
        if !allowed {
            return Err(BookingError::Unauthorized);
        }
        Ok(self.store.upsert_provider(profile).await?)
    }

    /// Replaces a provider's weekly schedule. The schedule arrives already
    /// validated by `WeeklySchedule::new`.
    pub async fn set_schedule(
        &self,
        actor: &Actor,
        provider_id: &str,
        schedule: dimple_scheduling::WeeklySchedule,
    ) -> Result<ProviderProfile, BookingError> {
        let allowed = actor.role == Role::Admin
            || (actor.role == Role::Provider && actor.id == provider_id);
        if !allowed {
            return Err(BookingError::Unauthorized);
        }
        Ok(self.store.update_schedule(provider_id, schedule).await?)
    }

    /// Rates a completed booking. One rating per booking, client only; the
    /// provider's materialized average moves with the insert.
    pub async fn create_rating(
        &self,
        actor: &Actor,
        request: CreateRatingRequest,
    ) -> Result<Rating, BookingError> {
        if actor.role != Role::Client {
            return Err(BookingError::Unauthorized);
        }
        if !(1..=5).contains(&request.score) {
            return Err(BookingError::Validation(
                "score must be between 1 and 5".to_string(),
            ));
        }
        let booking = self
            .store
            .find_booking(&request.booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("booking".to_string()))?;
        if booking.client_id != actor.id {
            return Err(BookingError::Unauthorized);
        }
        if booking.status != BookingStatus::Completed {
            return Err(BookingError::Validation(
                "only completed bookings can be rated".to_string(),
            ));
        }
        let rating = Rating {
            id: Uuid::new_v4().to_string(),
            booking_id: booking.id,
            client_id: booking.client_id,
            provider_id: booking.provider_id,
            score: request.score,
            review: request.review,
            created_at: Utc::now(),
        };
        Ok(self.store.insert_rating(rating).await?)
    }

    pub async fn list_ratings(
        &self,
        provider_id: &str,
        page: Page,
    ) -> Result<Vec<Rating>, BookingError> {
        Ok(self.store.list_ratings(provider_id, page).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use chrono::Weekday;
    use dimple_scheduling::{AvailabilitySlot, DayAvailability, WeeklySchedule};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // 2025-06-02 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn client(id: &str) -> Actor {
        Actor::new(id, Role::Client)
    }

    fn provider_actor() -> Actor {
        Actor::new("prov-1", Role::Provider)
    }

    fn admin() -> Actor {
        Actor::new("admin-1", Role::Admin)
    }

    async fn service_with_provider() -> BookingService<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let service = BookingService::new(store, BookingConfig::default());
        let schedule = WeeklySchedule::new(vec![DayAvailability {
            day: Weekday::Mon,
            slots: vec![AvailabilitySlot {
                start: t(9, 0),
                end: t(17, 0),
                open: true,
            }],
        }])
        .unwrap();
        service
            .upsert_provider(
                &admin(),
                ProviderProfile {
                    id: "prov-1".to_string(),
                    name: "Hanna".to_string(),
                    phone: Some("+251911000000".to_string()),
                    hourly_rate_cents: 60_000,
                    is_available: true,
                    schedule,
                    rating_count: 0,
                    rating_sum: 0,
                },
            )
            .await
            .unwrap();
        service
    }

    fn booking_request(h: u32, m: u32, duration: u32) -> CreateBookingRequest {
        CreateBookingRequest {
            provider_id: "prov-1".to_string(),
            date: monday(),
            start_time: t(h, m),
            duration_minutes: duration,
        }
    }

    #[tokio::test]
    async fn booking_inside_open_hours_is_created_pending() {
        let service = service_with_provider().await;
        let booking = service
            .create_booking(&client("cli-1"), booking_request(10, 0, 60))
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
        assert_eq!(booking.total_amount_cents, 60_000);
        assert_eq!(booking.end_minute - booking.start_minute, 60);
    }

    #[tokio::test]
    async fn amount_is_prorated_over_duration() {
        let service = service_with_provider().await;
        let booking = service
            .create_booking(&client("cli-1"), booking_request(10, 0, 90))
            .await
            .unwrap();
        assert_eq!(booking.total_amount_cents, 90_000);
    }

    #[tokio::test]
    async fn window_outside_open_hours_is_rejected() {
        let service = service_with_provider().await;
        let err = service
            .create_booking(&client("cli-1"), booking_request(16, 30, 60))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::SlotNotAvailable));
    }

    #[tokio::test]
    async fn duration_bounds_are_enforced() {
        let service = service_with_provider().await;
        for minutes in [15, 300] {
            let err = service
                .create_booking(&client("cli-1"), booking_request(10, 0, minutes))
                .await
                .unwrap_err();
            assert!(matches!(err, BookingError::InvalidDuration { .. }));
        }
    }

    #[tokio::test]
    async fn pending_bookings_do_not_block_but_confirmed_do() {
        let service = service_with_provider().await;

        // First client books 10:00-11:00; stays pending.
        let first = service
            .create_booking(&client("cli-1"), booking_request(10, 0, 60))
            .await
            .unwrap();

        // Second client overlaps 10:30-11:30 while the first is pending.
        let second = service
            .create_booking(&client("cli-2"), booking_request(10, 30, 60))
            .await
            .unwrap();
        assert_eq!(second.status, BookingStatus::Pending);

        // Provider confirms the first booking.
        service
            .set_booking_status(&first.id, &provider_actor(), BookingStatus::Confirmed, None)
            .await
            .unwrap();

        // A third request overlapping the confirmed window now conflicts.
        let err = service
            .create_booking(&client("cli-3"), booking_request(10, 0, 60))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::SlotConflict));
    }

    #[tokio::test]
    async fn back_to_back_bookings_both_succeed() {
        let service = service_with_provider().await;
        let first = service
            .create_booking(&client("cli-1"), booking_request(9, 0, 60))
            .await
            .unwrap();
        service
            .set_booking_status(&first.id, &provider_actor(), BookingStatus::Confirmed, None)
            .await
            .unwrap();
        // Starts exactly where the confirmed one ends.
        let second = service
            .create_booking(&client("cli-2"), booking_request(10, 0, 60))
            .await
            .unwrap();
        assert_eq!(second.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn concurrent_overlapping_requests_only_one_wins_when_confirmed() {
        let service = Arc::new(service_with_provider().await);

        // Confirm a baseline booking, then race two overlapping requests
        // against it; both must lose.
        let base = service
            .create_booking(&client("cli-0"), booking_request(11, 0, 60))
            .await
            .unwrap();
        service
            .set_booking_status(&base.id, &provider_actor(), BookingStatus::Confirmed, None)
            .await
            .unwrap();

        let s1 = service.clone();
        let s2 = service.clone();
        let client1 = client("cli-1");
        let client2 = client("cli-2");
        let req1 = booking_request(11, 30, 60);
        let req2 = booking_request(10, 30, 60);
        let (r1, r2) = tokio::join!(
            s1.create_booking(&client1, req1),
            s2.create_booking(&client2, req2),
        );
        assert!(matches!(r1.unwrap_err(), BookingError::SlotConflict));
        assert!(matches!(r2.unwrap_err(), BookingError::SlotConflict));
    }

    #[tokio::test]
    async fn overlapping_pendings_cannot_both_be_confirmed() {
        let service = service_with_provider().await;
        let first = service
            .create_booking(&client("cli-1"), booking_request(10, 0, 60))
            .await
            .unwrap();
        let second = service
            .create_booking(&client("cli-2"), booking_request(10, 30, 60))
            .await
            .unwrap();

        service
            .set_booking_status(&first.id, &provider_actor(), BookingStatus::Confirmed, None)
            .await
            .unwrap();
        let err = service
            .set_booking_status(&second.id, &provider_actor(), BookingStatus::Confirmed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::SlotConflict));
    }

    #[tokio::test]
    async fn client_cannot_confirm_own_booking() {
        let service = service_with_provider().await;
        let booking = service
            .create_booking(&client("cli-1"), booking_request(10, 0, 60))
            .await
            .unwrap();
        let err = service
            .set_booking_status(&booking.id, &client("cli-1"), BookingStatus::Confirmed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Unauthorized));
    }

    #[tokio::test]
    async fn stranger_cannot_touch_booking() {
        let service = service_with_provider().await;
        let booking = service
            .create_booking(&client("cli-1"), booking_request(10, 0, 60))
            .await
            .unwrap();
        let err = service
            .set_booking_status(&booking.id, &client("cli-9"), BookingStatus::Cancelled, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Unauthorized));
    }

    #[tokio::test]
    async fn terminal_states_reject_all_transitions() {
        let service = service_with_provider().await;
        let booking = service
            .create_booking(&client("cli-1"), booking_request(10, 0, 60))
            .await
            .unwrap();
        service
            .set_booking_status(
                &booking.id,
                &client("cli-1"),
                BookingStatus::Cancelled,
                Some("changed my mind".to_string()),
            )
            .await
            .unwrap();

        for (actor, target) in [
            (admin(), BookingStatus::Confirmed),
            (provider_actor(), BookingStatus::Rejected),
            (client("cli-1"), BookingStatus::Pending),
        ] {
            let err = service
                .set_booking_status(&booking.id, &actor, target, None)
                .await
                .unwrap_err();
            assert!(
                matches!(err, BookingError::InvalidTransition { .. }),
                "expected InvalidTransition for {target:?}"
            );
        }
    }

    #[tokio::test]
    async fn cancellation_stores_bounded_reason() {
        let service = service_with_provider().await;
        let booking = service
            .create_booking(&client("cli-1"), booking_request(10, 0, 60))
            .await
            .unwrap();

        let too_long = "x".repeat(400);
        let err = service
            .set_booking_status(
                &booking.id,
                &client("cli-1"),
                BookingStatus::Cancelled,
                Some(too_long),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        let cancelled = service
            .set_booking_status(
                &booking.id,
                &client("cli-1"),
                BookingStatus::Cancelled,
                Some("running late".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(
            cancelled.cancellation_reason.as_deref(),
            Some("running late")
        );
    }

    async fn complete_booking(service: &BookingService<MemoryStore>, booking: &Booking) {
        service
            .set_booking_status(&booking.id, &provider_actor(), BookingStatus::Confirmed, None)
            .await
            .unwrap();
        service
            .set_booking_status(&booking.id, &provider_actor(), BookingStatus::InProgress, None)
            .await
            .unwrap();
        service
            .set_booking_status(&booking.id, &provider_actor(), BookingStatus::Completed, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rating_requires_completed_booking_and_is_unique() {
        let service = service_with_provider().await;
        let booking = service
            .create_booking(&client("cli-1"), booking_request(10, 0, 60))
            .await
            .unwrap();

        let premature = service
            .create_rating(
                &client("cli-1"),
                CreateRatingRequest {
                    booking_id: booking.id.clone(),
                    score: 5,
                    review: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(premature, BookingError::Validation(_)));

        complete_booking(&service, &booking).await;

        service
            .create_rating(
                &client("cli-1"),
                CreateRatingRequest {
                    booking_id: booking.id.clone(),
                    score: 4,
                    review: Some("great pressure work".to_string()),
                },
            )
            .await
            .unwrap();

        let duplicate = service
            .create_rating(
                &client("cli-1"),
                CreateRatingRequest {
                    booking_id: booking.id.clone(),
                    score: 2,
                    review: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(duplicate, BookingError::AlreadyRated));

        let view = service.get_provider("prov-1").await.unwrap();
        assert_eq!(view.rating_count, 1);
        assert_eq!(view.average_rating, Some(4.0));
    }

    #[tokio::test]
    async fn rating_aggregate_is_scoped_to_the_provider() {
        let service = service_with_provider().await;
        let first = service
            .create_booking(&client("cli-1"), booking_request(9, 0, 60))
            .await
            .unwrap();
        complete_booking(&service, &first).await;
        let second = service
            .create_booking(&client("cli-2"), booking_request(10, 0, 60))
            .await
            .unwrap();
        complete_booking(&service, &second).await;

        for (actor, booking_id, score) in [
            (client("cli-1"), first.id.clone(), 5),
            (client("cli-2"), second.id.clone(), 2),
        ] {
            service
                .create_rating(
                    &actor,
                    CreateRatingRequest {
                        booking_id,
                        score,
                        review: None,
                    },
                )
                .await
                .unwrap();
        }

        let view = service.get_provider("prov-1").await.unwrap();
        assert_eq!(view.rating_count, 2);
        assert_eq!(view.average_rating, Some(3.5));
    }

    #[tokio::test]
    async fn listings_are_scoped_to_the_actor() {
        let service = service_with_provider().await;
        service
            .create_booking(&client("cli-1"), booking_request(9, 0, 60))
            .await
            .unwrap();
        service
            .create_booking(&client("cli-2"), booking_request(10, 0, 60))
            .await
            .unwrap();

        let mine = service
            .list_own_bookings(&client("cli-1"), Page::default())
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);

        let providers_view = service
            .list_own_bookings(&provider_actor(), Page::default())
            .await
            .unwrap();
        assert_eq!(providers_view.len(), 2);

        let pending_payments = service
            .list_awaiting_payment(&admin(), Page::default())
            .await
            .unwrap();
        assert_eq!(pending_payments.len(), 2);
    }
}
