// --- File: crates/dimple_booking/src/store/memory.rs ---
//! In-memory implementation of the booking repositories.
//!
//! Used by tests and by deployments without a database configured. All
//! state sits behind one `RwLock`, which makes the insert-time conflict
//! re-validation and the guarded payment updates naturally atomic.

use crate::models::{
    Booking, BookingStatus, PaymentAttemptStatus, PaymentRecord, PaymentStatus, ProviderProfile,
    Rating,
};
use crate::store::{
    BookingRepository, Page, PaymentApplication, PaymentRepository, ProviderRepository, StoreError,
};
use chrono::{NaiveDate, Utc};
use dimple_scheduling::{windows_overlap, WeeklySchedule};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryInner {
    bookings: HashMap<String, Booking>,
    providers: HashMap<String, ProviderProfile>,
    payments: HashMap<String, PaymentRecord>,
    ratings: Vec<Rating>,
}

/// Thread-safe in-memory store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page_slice<T: Clone>(mut items: Vec<T>, page: Page) -> Vec<T> {
    let offset = page.offset() as usize;
    if offset >= items.len() {
        return Vec::new();
    }
    items.drain(..offset);
    items.truncate(page.limit as usize);
    items
}

impl BookingRepository for MemoryStore {
    async fn insert_booking(&self, booking: Booking) -> Result<Booking, StoreError> {
        let mut inner = self.inner.write().await;
        let conflict = inner.bookings.values().any(|existing| {
            existing.provider_id == booking.provider_id
                && existing.service_date == booking.service_date
                && existing.status.is_blocking()
                && windows_overlap(
                    booking.start_minute,
                    booking.end_minute,
                    existing.start_minute,
                    existing.end_minute,
                )
        });
        if conflict {
            return Err(StoreError::Conflict);
        }
        inner.bookings.insert(booking.id.clone(), booking.clone());
        Ok(booking)
    }

    async fn find_booking(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        Ok(self.inner.read().await.bookings.get(id).cloned())
    }

    async fn blocking_bookings(
        &self,
        provider_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .bookings
            .values()
            .filter(|b| {
                b.provider_id == provider_id && b.service_date == date && b.status.is_blocking()
            })
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: &str,
        expected: BookingStatus,
        target: BookingStatus,
        reason: Option<String>,
    ) -> Result<Option<Booking>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(current) = inner.bookings.get(id) else {
            return Err(StoreError::NotFound("booking".to_string()));
        };
        if current.status != expected {
            return Ok(None);
        }
        // Entering a blocking state re-claims the window; re-validate it.
        if target.is_blocking() && !current.status.is_blocking() {
            let claimed = current.clone();
            let conflict = inner.bookings.values().any(|other| {
                other.id != claimed.id
                    && other.provider_id == claimed.provider_id
                    && other.service_date == claimed.service_date
                    && other.status.is_blocking()
                    && windows_overlap(
                        claimed.start_minute,
                        claimed.end_minute,
                        other.start_minute,
                        other.end_minute,
                    )
            });
            if conflict {
                return Err(StoreError::Conflict);
            }
        }
        let Some(booking) = inner.bookings.get_mut(id) else {
            return Err(StoreError::NotFound("booking".to_string()));
        };
        booking.status = target;
        if target == BookingStatus::Cancelled {
            booking.cancellation_reason = reason;
        }
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }

    async fn list_bookings_for_client(
        &self,
        client_id: &str,
        page: Page,
    ) -> Result<Vec<Booking>, StoreError> {
        let inner = self.inner.read().await;
        let mut items: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.client_id == client_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(page_slice(items, page))
    }

    async fn list_bookings_for_provider(
        &self,
        provider_id: &str,
        page: Page,
    ) -> Result<Vec<Booking>, StoreError> {
        let inner = self.inner.read().await;
        let mut items: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.provider_id == provider_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(page_slice(items, page))
    }

    async fn list_awaiting_payment(&self, page: Page) -> Result<Vec<Booking>, StoreError> {
        let inner = self.inner.read().await;
        let mut items: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.payment_status == PaymentStatus::Pending && !b.status.is_terminal())
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(page_slice(items, page))
    }
}

impl ProviderRepository for MemoryStore {
    async fn upsert_provider(
        &self,
        profile: ProviderProfile,
    ) -> Result<ProviderProfile, StoreError> {
        let mut inner = self.inner.write().await;
        inner.providers.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    async fn find_provider(&self, id: &str) -> Result<Option<ProviderProfile>, StoreError> {
        Ok(self.inner.read().await.providers.get(id).cloned())
    }

    async fn update_schedule(
        &self,
        provider_id: &str,
        schedule: WeeklySchedule,
    ) -> Result<ProviderProfile, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(profile) = inner.providers.get_mut(provider_id) else {
            return Err(StoreError::NotFound("provider".to_string()));
        };
        profile.schedule = schedule;
        Ok(profile.clone())
    }

    async fn insert_rating(&self, rating: Rating) -> Result<Rating, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .ratings
            .iter()
            .any(|r| r.booking_id == rating.booking_id)
        {
            return Err(StoreError::DuplicateRating(rating.booking_id));
        }
        let Some(provider) = inner.providers.get_mut(&rating.provider_id) else {
            return Err(StoreError::NotFound("provider".to_string()));
        };
        provider.rating_count += 1;
        provider.rating_sum += i64::from(rating.score);
        inner.ratings.push(rating.clone());
        Ok(rating)
    }

    async fn list_ratings(&self, provider_id: &str, page: Page) -> Result<Vec<Rating>, StoreError> {
        let inner = self.inner.read().await;
        let mut items: Vec<Rating> = inner
            .ratings
            .iter()
            .filter(|r| r.provider_id == provider_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(page_slice(items, page))
    }
}

impl PaymentRepository for MemoryStore {
    async fn insert_payment(&self, record: PaymentRecord) -> Result<PaymentRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(booking) = inner.bookings.get_mut(&record.booking_id) else {
            return Err(StoreError::NotFound("booking".to_string()));
        };
        // Re-initiating after a failed attempt puts the booking's payment
        // back in flight.
        if booking.payment_status == PaymentStatus::Failed {
            booking.payment_status = PaymentStatus::Pending;
            booking.updated_at = Utc::now();
        }
        inner.payments.insert(record.reference.clone(), record.clone());
        Ok(record)
    }

    async fn find_payment_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        Ok(self.inner.read().await.payments.get(reference).cloned())
    }

    async fn apply_payment_success(
        &self,
        reference: &str,
    ) -> Result<PaymentApplication, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.payments.get_mut(reference) else {
            return Err(StoreError::NotFound("payment".to_string()));
        };
        if record.status == PaymentAttemptStatus::Pending {
            record.status = PaymentAttemptStatus::Success;
            record.updated_at = Utc::now();
        }
        let booking_id = record.booking_id.clone();
        let Some(current) = inner.bookings.get(&booking_id) else {
            return Err(StoreError::NotFound("booking".to_string()));
        };
        // The confirmed advance must not create an overlap with a booking
        // that claimed the window while payment was in flight.
        let window_taken = current.status == BookingStatus::Pending
            && inner.bookings.values().any(|other| {
                other.id != booking_id
                    && other.provider_id == current.provider_id
                    && other.service_date == current.service_date
                    && other.status.is_blocking()
                    && windows_overlap(
                        current.start_minute,
                        current.end_minute,
                        other.start_minute,
                        other.end_minute,
                    )
            });
        let Some(booking) = inner.bookings.get_mut(&booking_id) else {
            return Err(StoreError::NotFound("booking".to_string()));
        };
        // One-way guard: only a pending payment becomes paid, and only a
        // pending booking advances to confirmed. Replays fall through.
        let applied = booking.payment_status == PaymentStatus::Pending;
        if applied {
            booking.payment_status = PaymentStatus::Paid;
            if booking.status == BookingStatus::Pending && !window_taken {
                booking.status = BookingStatus::Confirmed;
            }
            booking.updated_at = Utc::now();
        }
        Ok(PaymentApplication {
            applied,
            booking: booking.clone(),
        })
    }

    async fn apply_payment_failure(
        &self,
        reference: &str,
    ) -> Result<PaymentApplication, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.payments.get_mut(reference) else {
            return Err(StoreError::NotFound("payment".to_string()));
        };
        if record.status == PaymentAttemptStatus::Pending {
            record.status = PaymentAttemptStatus::Failed;
            record.updated_at = Utc::now();
        }
        let booking_id = record.booking_id.clone();
        let Some(booking) = inner.bookings.get_mut(&booking_id) else {
            return Err(StoreError::NotFound("booking".to_string()));
        };
        let applied = booking.payment_status == PaymentStatus::Pending;
        if applied {
            booking.payment_status = PaymentStatus::Failed;
            booking.updated_at = Utc::now();
        }
        Ok(PaymentApplication {
            applied,
            booking: booking.clone(),
        })
    }

    async fn apply_admin_confirmation(
        &self,
        booking_id: &str,
    ) -> Result<PaymentApplication, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(current) = inner.bookings.get(booking_id) else {
            return Err(StoreError::NotFound("booking".to_string()));
        };
        let window_taken = current.status == BookingStatus::Pending
            && inner.bookings.values().any(|other| {
                other.id != booking_id
                    && other.provider_id == current.provider_id
                    && other.service_date == current.service_date
                    && other.status.is_blocking()
                    && windows_overlap(
                        current.start_minute,
                        current.end_minute,
                        other.start_minute,
                        other.end_minute,
                    )
            });
        let Some(booking) = inner.bookings.get_mut(booking_id) else {
            return Err(StoreError::NotFound("booking".to_string()));
        };
        let applied = booking.payment_status != PaymentStatus::Paid
            && booking.payment_status != PaymentStatus::Refunded;
        if applied {
            booking.payment_status = PaymentStatus::Paid;
            if booking.status == BookingStatus::Pending && !window_taken {
                booking.status = BookingStatus::Confirmed;
            }
            booking.updated_at = Utc::now();
        }
        let booking = booking.clone();
        // Settle any in-flight attempt so the audit trail matches.
        if applied {
            for record in inner.payments.values_mut() {
                if record.booking_id == booking_id
                    && record.status == PaymentAttemptStatus::Pending
                {
                    record.status = PaymentAttemptStatus::Success;
                    record.updated_at = Utc::now();
                }
            }
        }
        Ok(PaymentApplication { applied, booking })
    }

    async fn apply_refund(&self, booking_id: &str) -> Result<PaymentApplication, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(booking) = inner.bookings.get_mut(booking_id) else {
            return Err(StoreError::NotFound("booking".to_string()));
        };
        let applied = booking.payment_status == PaymentStatus::Paid;
        if applied {
            booking.payment_status = PaymentStatus::Refunded;
            booking.updated_at = Utc::now();
        }
        Ok(PaymentApplication {
            applied,
            booking: booking.clone(),
        })
    }

    async fn payment_history(
        &self,
        client_id: &str,
        page: Page,
    ) -> Result<Vec<PaymentRecord>, StoreError> {
        let inner = self.inner.read().await;
        let mut items: Vec<PaymentRecord> = inner
            .payments
            .values()
            .filter(|p| p.client_id == client_id && p.status.is_terminal())
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.reference.cmp(&b.reference)));
        Ok(page_slice(items, page))
    }
}
