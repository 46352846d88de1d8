//! SQL implementation of the booking domain repositories
//!
//! One store backs all three repository traits so that cross-entity
//! operations (payment application, rating aggregates) can run in a single
//! transaction. Rows are mapped manually via `try_get`: the Any driver
//! cannot decode `chrono` types, so dates travel as ISO-8601 text and the
//! window boundaries as minutes-of-day integers.

use crate::client::DbClient;
use crate::error::DbError;
use chrono::{DateTime, NaiveDate, Utc};
use dimple_booking::store::{
    BookingRepository, Page, PaymentApplication, PaymentRepository, ProviderRepository, StoreError,
};
use dimple_booking::{
    Booking, BookingStatus, PaymentAttemptStatus, PaymentRecord, PaymentStatus, ProviderProfile,
    Rating,
};
use dimple_scheduling::WeeklySchedule;
use sqlx::any::AnyRow;
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, error, info};

/// SQL implementation of the booking, provider and payment repositories.
#[derive(Debug, Clone)]
pub struct SqlStore {
    /// The database client
    db_client: DbClient,
}

impl SqlStore {
    /// Create a new SQL store.
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    /// Initialize the database schema.
    ///
    /// Creates the tables for providers, bookings, payments and ratings if
    /// they don't already exist. The unique constraint on
    /// `ratings.booking_id` enforces one rating per booking at the storage
    /// level.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing booking domain schema");

        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS providers (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                phone TEXT,
                hourly_rate_cents BIGINT NOT NULL,
                is_available INTEGER NOT NULL DEFAULT 1,
                schedule_json TEXT NOT NULL,
                rating_count BIGINT NOT NULL DEFAULT 0,
                rating_sum BIGINT NOT NULL DEFAULT 0
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                client_id TEXT NOT NULL,
                provider_id TEXT NOT NULL,
                service_date TEXT NOT NULL,
                start_minute INTEGER NOT NULL,
                end_minute INTEGER NOT NULL,
                status TEXT NOT NULL,
                payment_status TEXT NOT NULL,
                total_amount_cents BIGINT NOT NULL,
                cancellation_reason TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_bookings_provider_date
                ON bookings (provider_id, service_date)
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS payments (
                reference TEXT PRIMARY KEY,
                booking_id TEXT NOT NULL,
                client_id TEXT NOT NULL,
                amount_cents BIGINT NOT NULL,
                payer_phone TEXT NOT NULL,
                method TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS ratings (
                id TEXT PRIMARY KEY,
                booking_id TEXT NOT NULL UNIQUE,
                client_id TEXT NOT NULL,
                provider_id TEXT NOT NULL,
                score INTEGER NOT NULL,
                review TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        ];
        for statement in statements {
            self.db_client.execute(statement).await?;
        }

        info!("Booking domain schema initialized successfully");
        Ok(())
    }

    /// Count of blocking bookings overlapping the window, excluding `exclude_id`.
    async fn overlap_count<'e, E>(
        executor: E,
        provider_id: &str,
        service_date: &str,
        start_minute: i64,
        end_minute: i64,
        exclude_id: &str,
    ) -> Result<i64, StoreError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Any>,
    {
        let query = r#"
            SELECT COUNT(*) AS cnt FROM bookings
            WHERE provider_id = $1 AND service_date = $2
              AND status IN ('confirmed', 'in_progress')
              AND id <> $3
              AND start_minute < $4 AND end_minute > $5
        "#;
        let row = sqlx::query(query)
            .bind(provider_id)
            .bind(service_date)
            .bind(exclude_id)
            .bind(end_minute)
            .bind(start_minute)
            .fetch_one(executor)
            .await
            .map_err(backend)?;
        row.try_get::<i64, _>("cnt").map_err(backend)
    }
}

fn backend<E: std::fmt::Display>(err: E) -> StoreError {
    error!("storage backend failure: {}", err);
    StoreError::Backend(err.to_string())
}

fn now_str() -> String {
    Utc::now().to_rfc3339()
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Backend(format!("bad timestamp '{}': {}", value, e)))
}

fn parse_date(value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::from_str(value)
        .map_err(|e| StoreError::Backend(format!("bad date '{}': {}", value, e)))
}

fn booking_from_row(row: &AnyRow) -> Result<Booking, StoreError> {
    let status: String = row.try_get("status").map_err(backend)?;
    let payment_status: String = row.try_get("payment_status").map_err(backend)?;
    let service_date: String = row.try_get("service_date").map_err(backend)?;
    let created_at: String = row.try_get("created_at").map_err(backend)?;
    let updated_at: String = row.try_get("updated_at").map_err(backend)?;
    Ok(Booking {
        id: row.try_get("id").map_err(backend)?,
        client_id: row.try_get("client_id").map_err(backend)?,
        provider_id: row.try_get("provider_id").map_err(backend)?,
        service_date: parse_date(&service_date)?,
        start_minute: row.try_get::<i64, _>("start_minute").map_err(backend)? as u32,
        end_minute: row.try_get::<i64, _>("end_minute").map_err(backend)? as u32,
        status: BookingStatus::parse(&status)
            .ok_or_else(|| StoreError::Backend(format!("unknown booking status '{}'", status)))?,
        payment_status: PaymentStatus::parse(&payment_status).ok_or_else(|| {
            StoreError::Backend(format!("unknown payment status '{}'", payment_status))
        })?,
        total_amount_cents: row.try_get("total_amount_cents").map_err(backend)?,
        cancellation_reason: row.try_get("cancellation_reason").ok(),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn provider_from_row(row: &AnyRow) -> Result<ProviderProfile, StoreError> {
    let schedule_json: String = row.try_get("schedule_json").map_err(backend)?;
    let schedule: WeeklySchedule = serde_json::from_str(&schedule_json)
        .map_err(|e| StoreError::Backend(format!("bad schedule json: {}", e)))?;
    Ok(ProviderProfile {
        id: row.try_get("id").map_err(backend)?,
        name: row.try_get("name").map_err(backend)?,
        phone: row.try_get("phone").ok(),
        hourly_rate_cents: row.try_get("hourly_rate_cents").map_err(backend)?,
        is_available: row.try_get::<i64, _>("is_available").map_err(backend)? != 0,
        schedule,
        rating_count: row.try_get("rating_count").map_err(backend)?,
        rating_sum: row.try_get("rating_sum").map_err(backend)?,
    })
}

fn payment_from_row(row: &AnyRow) -> Result<PaymentRecord, StoreError> {
    let status: String = row.try_get("status").map_err(backend)?;
    let created_at: String = row.try_get("created_at").map_err(backend)?;
    let updated_at: String = row.try_get("updated_at").map_err(backend)?;
    Ok(PaymentRecord {
        reference: row.try_get("reference").map_err(backend)?,
        booking_id: row.try_get("booking_id").map_err(backend)?,
        client_id: row.try_get("client_id").map_err(backend)?,
        amount_cents: row.try_get("amount_cents").map_err(backend)?,
        payer_phone: row.try_get("payer_phone").map_err(backend)?,
        method: row.try_get("method").map_err(backend)?,
        status: PaymentAttemptStatus::parse(&status)
            .ok_or_else(|| StoreError::Backend(format!("unknown attempt status '{}'", status)))?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn rating_from_row(row: &AnyRow) -> Result<Rating, StoreError> {
    let created_at: String = row.try_get("created_at").map_err(backend)?;
    Ok(Rating {
        id: row.try_get("id").map_err(backend)?,
        booking_id: row.try_get("booking_id").map_err(backend)?,
        client_id: row.try_get("client_id").map_err(backend)?,
        provider_id: row.try_get("provider_id").map_err(backend)?,
        score: row.try_get::<i64, _>("score").map_err(backend)? as u8,
        review: row.try_get("review").ok(),
        created_at: parse_timestamp(&created_at)?,
    })
}

const SELECT_BOOKING: &str = r#"
    SELECT id, client_id, provider_id, service_date, start_minute, end_minute,
           status, payment_status, total_amount_cents, cancellation_reason,
           created_at, updated_at
    FROM bookings
"#;

impl BookingRepository for SqlStore {
    async fn insert_booking(&self, booking: Booking) -> Result<Booking, StoreError> {
        debug!("Inserting booking {} for provider {}", booking.id, booking.provider_id);
        let mut tx = self.db_client.begin().await.map_err(backend)?;

        // Re-validate inside the transaction: a booking may have been
        // confirmed between the service's check and this insert.
        let date_str = booking.service_date.to_string();
        let overlaps = Self::overlap_count(
            &mut *tx,
            &booking.provider_id,
            &date_str,
            i64::from(booking.start_minute),
            i64::from(booking.end_minute),
            &booking.id,
        )
        .await?;
        if overlaps > 0 {
            tx.rollback().await.map_err(backend)?;
            return Err(StoreError::Conflict);
        }

        let query = r#"
            INSERT INTO bookings (id, client_id, provider_id, service_date,
                start_minute, end_minute, status, payment_status,
                total_amount_cents, cancellation_reason, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#;
        sqlx::query(query)
            .bind(&booking.id)
            .bind(&booking.client_id)
            .bind(&booking.provider_id)
            .bind(&date_str)
            .bind(i64::from(booking.start_minute))
            .bind(i64::from(booking.end_minute))
            .bind(booking.status.as_str())
            .bind(booking.payment_status.as_str())
            .bind(booking.total_amount_cents)
            .bind(booking.cancellation_reason.as_deref())
            .bind(booking.created_at.to_rfc3339())
            .bind(booking.updated_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(booking)
    }

    async fn find_booking(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        let query = format!("{} WHERE id = $1", SELECT_BOOKING);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(backend)?;
        row.as_ref().map(booking_from_row).transpose()
    }

    async fn blocking_bookings(
        &self,
        provider_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, StoreError> {
        let query = format!(
            "{} WHERE provider_id = $1 AND service_date = $2 \
             AND status IN ('confirmed', 'in_progress')",
            SELECT_BOOKING
        );
        let rows = sqlx::query(&query)
            .bind(provider_id)
            .bind(date.to_string())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(backend)?;
        rows.iter().map(booking_from_row).collect()
    }

    async fn update_status(
        &self,
        id: &str,
        expected: BookingStatus,
        target: BookingStatus,
        reason: Option<String>,
    ) -> Result<Option<Booking>, StoreError> {
        let mut tx = self.db_client.begin().await.map_err(backend)?;

        let select = format!("{} WHERE id = $1", SELECT_BOOKING);
        let row = sqlx::query(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?;
        let Some(row) = row else {
            return Err(StoreError::NotFound("booking".to_string()));
        };
        let current = booking_from_row(&row)?;
        if current.status != expected {
            tx.rollback().await.map_err(backend)?;
            return Ok(None);
        }

        // Entering a blocking state re-claims the window; re-validate it.
        if target.is_blocking() && !current.status.is_blocking() {
            let overlaps = Self::overlap_count(
                &mut *tx,
                &current.provider_id,
                &current.service_date.to_string(),
                i64::from(current.start_minute),
                i64::from(current.end_minute),
                &current.id,
            )
            .await?;
            if overlaps > 0 {
                tx.rollback().await.map_err(backend)?;
                return Err(StoreError::Conflict);
            }
        }

        let now = now_str();
        let affected = if target == BookingStatus::Cancelled {
            sqlx::query(
                "UPDATE bookings SET status = $1, cancellation_reason = $2, updated_at = $3 \
                 WHERE id = $4 AND status = $5",
            )
            .bind(target.as_str())
            .bind(reason.as_deref())
            .bind(&now)
            .bind(id)
            .bind(expected.as_str())
            .execute(&mut *tx)
            .await
            .map_err(backend)?
            .rows_affected()
        } else {
            sqlx::query(
                "UPDATE bookings SET status = $1, updated_at = $2 \
                 WHERE id = $3 AND status = $4",
            )
            .bind(target.as_str())
            .bind(&now)
            .bind(id)
            .bind(expected.as_str())
            .execute(&mut *tx)
            .await
            .map_err(backend)?
            .rows_affected()
        };
        if affected == 0 {
            tx.rollback().await.map_err(backend)?;
            return Ok(None);
        }

        let row = sqlx::query(&select)
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(backend)?;
        let updated = booking_from_row(&row)?;
        tx.commit().await.map_err(backend)?;
        Ok(Some(updated))
    }

    async fn list_bookings_for_client(
        &self,
        client_id: &str,
        page: Page,
    ) -> Result<Vec<Booking>, StoreError> {
        let query = format!(
            "{} WHERE client_id = $1 ORDER BY created_at DESC, id LIMIT $2 OFFSET $3",
            SELECT_BOOKING
        );
        let rows = sqlx::query(&query)
            .bind(client_id)
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset()))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(backend)?;
        rows.iter().map(booking_from_row).collect()
    }

    async fn list_bookings_for_provider(
        &self,
        provider_id: &str,
        page: Page,
    ) -> Result<Vec<Booking>, StoreError> {
        let query = format!(
            "{} WHERE provider_id = $1 ORDER BY created_at DESC, id LIMIT $2 OFFSET $3",
            SELECT_BOOKING
        );
        let rows = sqlx::query(&query)
            .bind(provider_id)
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset()))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(backend)?;
        rows.iter().map(booking_from_row).collect()
    }

    async fn list_awaiting_payment(&self, page: Page) -> Result<Vec<Booking>, StoreError> {
        let query = format!(
            "{} WHERE payment_status = 'pending' \
             AND status NOT IN ('completed', 'cancelled', 'rejected') \
             ORDER BY created_at DESC, id LIMIT $1 OFFSET $2",
            SELECT_BOOKING
        );
        let rows = sqlx::query(&query)
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset()))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(backend)?;
        rows.iter().map(booking_from_row).collect()
    }
}

const SELECT_PROVIDER: &str = r#"
    SELECT id, name, phone, hourly_rate_cents, is_available, schedule_json,
           rating_count, rating_sum
    FROM providers
"#;

impl ProviderRepository for SqlStore {
    async fn upsert_provider(
        &self,
        profile: ProviderProfile,
    ) -> Result<ProviderProfile, StoreError> {
        let schedule_json = serde_json::to_string(&profile.schedule)
            .map_err(|e| StoreError::Backend(format!("schedule serialization: {}", e)))?;
        let existing = self.find_provider(&profile.id).await?;
        if existing.is_some() {
            debug!("Updating provider profile {}", profile.id);
            sqlx::query(
                "UPDATE providers SET name = $1, phone = $2, hourly_rate_cents = $3, \
                 is_available = $4, schedule_json = $5, rating_count = $6, rating_sum = $7 \
                 WHERE id = $8",
            )
            .bind(&profile.name)
            .bind(profile.phone.as_deref())
            .bind(profile.hourly_rate_cents)
            .bind(i64::from(profile.is_available))
            .bind(&schedule_json)
            .bind(profile.rating_count)
            .bind(profile.rating_sum)
            .bind(&profile.id)
            .execute(self.db_client.pool())
            .await
            .map_err(backend)?;
        } else {
            debug!("Creating provider profile {}", profile.id);
            sqlx::query(
                "INSERT INTO providers (id, name, phone, hourly_rate_cents, is_available, \
                 schedule_json, rating_count, rating_sum) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(&profile.id)
            .bind(&profile.name)
            .bind(profile.phone.as_deref())
            .bind(profile.hourly_rate_cents)
            .bind(i64::from(profile.is_available))
            .bind(&schedule_json)
            .bind(profile.rating_count)
            .bind(profile.rating_sum)
            .execute(self.db_client.pool())
            .await
            .map_err(backend)?;
        }
        Ok(profile)
    }

    async fn find_provider(&self, id: &str) -> Result<Option<ProviderProfile>, StoreError> {
        let query = format!("{} WHERE id = $1", SELECT_PROVIDER);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(backend)?;
        row.as_ref().map(provider_from_row).transpose()
    }

    async fn update_schedule(
        &self,
        provider_id: &str,
        schedule: WeeklySchedule,
    ) -> Result<ProviderProfile, StoreError> {
        let schedule_json = serde_json::to_string(&schedule)
            .map_err(|e| StoreError::Backend(format!("schedule serialization: {}", e)))?;
        let affected = sqlx::query("UPDATE providers SET schedule_json = $1 WHERE id = $2")
            .bind(&schedule_json)
            .bind(provider_id)
            .execute(self.db_client.pool())
            .await
            .map_err(backend)?
            .rows_affected();
        if affected == 0 {
            return Err(StoreError::NotFound("provider".to_string()));
        }
        self.find_provider(provider_id)
            .await?
            .ok_or_else(|| StoreError::NotFound("provider".to_string()))
    }

    async fn insert_rating(&self, rating: Rating) -> Result<Rating, StoreError> {
        let mut tx = self.db_client.begin().await.map_err(backend)?;

        let existing = sqlx::query("SELECT id FROM ratings WHERE booking_id = $1")
            .bind(&rating.booking_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?;
        if existing.is_some() {
            tx.rollback().await.map_err(backend)?;
            return Err(StoreError::DuplicateRating(rating.booking_id));
        }

        sqlx::query(
            "INSERT INTO ratings (id, booking_id, client_id, provider_id, score, review, \
             created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&rating.id)
        .bind(&rating.booking_id)
        .bind(&rating.client_id)
        .bind(&rating.provider_id)
        .bind(i64::from(rating.score))
        .bind(rating.review.as_deref())
        .bind(rating.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        // The materialized aggregate moves with the insert, scoped to this
        // provider only.
        let affected = sqlx::query(
            "UPDATE providers SET rating_count = rating_count + 1, \
             rating_sum = rating_sum + $1 WHERE id = $2",
        )
        .bind(i64::from(rating.score))
        .bind(&rating.provider_id)
        .execute(&mut *tx)
        .await
        .map_err(backend)?
        .rows_affected();
        if affected == 0 {
            tx.rollback().await.map_err(backend)?;
            return Err(StoreError::NotFound("provider".to_string()));
        }

        tx.commit().await.map_err(backend)?;
        Ok(rating)
    }

    async fn list_ratings(&self, provider_id: &str, page: Page) -> Result<Vec<Rating>, StoreError> {
        let query = "SELECT id, booking_id, client_id, provider_id, score, review, created_at \
                     FROM ratings WHERE provider_id = $1 \
                     ORDER BY created_at DESC, id LIMIT $2 OFFSET $3";
        let rows = sqlx::query(query)
            .bind(provider_id)
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset()))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(backend)?;
        rows.iter().map(rating_from_row).collect()
    }
}

const SELECT_PAYMENT: &str = r#"
    SELECT reference, booking_id, client_id, amount_cents, payer_phone,
           method, status, created_at, updated_at
    FROM payments
"#;

impl PaymentRepository for SqlStore {
    async fn insert_payment(&self, record: PaymentRecord) -> Result<PaymentRecord, StoreError> {
        let mut tx = self.db_client.begin().await.map_err(backend)?;

        let booking = sqlx::query("SELECT id FROM bookings WHERE id = $1")
            .bind(&record.booking_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?;
        if booking.is_none() {
            tx.rollback().await.map_err(backend)?;
            return Err(StoreError::NotFound("booking".to_string()));
        }

        // Re-initiating after a failed attempt puts the payment back in flight.
        sqlx::query(
            "UPDATE bookings SET payment_status = 'pending', updated_at = $1 \
             WHERE id = $2 AND payment_status = 'failed'",
        )
        .bind(now_str())
        .bind(&record.booking_id)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        sqlx::query(
            "INSERT INTO payments (reference, booking_id, client_id, amount_cents, \
             payer_phone, method, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&record.reference)
        .bind(&record.booking_id)
        .bind(&record.client_id)
        .bind(record.amount_cents)
        .bind(&record.payer_phone)
        .bind(&record.method)
        .bind(record.status.as_str())
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(record)
    }

    async fn find_payment_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        let query = format!("{} WHERE reference = $1", SELECT_PAYMENT);
        let row = sqlx::query(&query)
            .bind(reference)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(backend)?;
        row.as_ref().map(payment_from_row).transpose()
    }

    async fn apply_payment_success(
        &self,
        reference: &str,
    ) -> Result<PaymentApplication, StoreError> {
        let mut tx = self.db_client.begin().await.map_err(backend)?;

        let select_payment = format!("{} WHERE reference = $1", SELECT_PAYMENT);
        let row = sqlx::query(&select_payment)
            .bind(reference)
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?;
        let Some(row) = row else {
            return Err(StoreError::NotFound("payment".to_string()));
        };
        let record = payment_from_row(&row)?;

        // Settle the attempt; one-way, replays fall through.
        sqlx::query(
            "UPDATE payments SET status = 'success', updated_at = $1 \
             WHERE reference = $2 AND status = 'pending'",
        )
        .bind(now_str())
        .bind(reference)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        // Guarded booking payment transition: only pending becomes paid.
        let applied = sqlx::query(
            "UPDATE bookings SET payment_status = 'paid', updated_at = $1 \
             WHERE id = $2 AND payment_status = 'pending'",
        )
        .bind(now_str())
        .bind(&record.booking_id)
        .execute(&mut *tx)
        .await
        .map_err(backend)?
        .rows_affected()
            > 0;

        if applied {
            self.advance_pending_to_confirmed(&mut tx, &record.booking_id)
                .await?;
        }

        let select_booking = format!("{} WHERE id = $1", SELECT_BOOKING);
        let row = sqlx::query(&select_booking)
            .bind(&record.booking_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(backend)?;
        let booking = booking_from_row(&row)?;
        tx.commit().await.map_err(backend)?;
        Ok(PaymentApplication { applied, booking })
    }

    async fn apply_payment_failure(
        &self,
        reference: &str,
    ) -> Result<PaymentApplication, StoreError> {
        let mut tx = self.db_client.begin().await.map_err(backend)?;

        let select_payment = format!("{} WHERE reference = $1", SELECT_PAYMENT);
        let row = sqlx::query(&select_payment)
            .bind(reference)
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?;
        let Some(row) = row else {
            return Err(StoreError::NotFound("payment".to_string()));
        };
        let record = payment_from_row(&row)?;

        sqlx::query(
            "UPDATE payments SET status = 'failed', updated_at = $1 \
             WHERE reference = $2 AND status = 'pending'",
        )
        .bind(now_str())
        .bind(reference)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        // Booking status itself never moves on failure.
        let applied = sqlx::query(
            "UPDATE bookings SET payment_status = 'failed', updated_at = $1 \
             WHERE id = $2 AND payment_status = 'pending'",
        )
        .bind(now_str())
        .bind(&record.booking_id)
        .execute(&mut *tx)
        .await
        .map_err(backend)?
        .rows_affected()
            > 0;

        let select_booking = format!("{} WHERE id = $1", SELECT_BOOKING);
        let row = sqlx::query(&select_booking)
            .bind(&record.booking_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(backend)?;
        let booking = booking_from_row(&row)?;
        tx.commit().await.map_err(backend)?;
        Ok(PaymentApplication { applied, booking })
    }

    async fn apply_admin_confirmation(
        &self,
        booking_id: &str,
    ) -> Result<PaymentApplication, StoreError> {
        let mut tx = self.db_client.begin().await.map_err(backend)?;

        let select_booking = format!("{} WHERE id = $1", SELECT_BOOKING);
        let row = sqlx::query(&select_booking)
            .bind(booking_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?;
        if row.is_none() {
            return Err(StoreError::NotFound("booking".to_string()));
        }

        let applied = sqlx::query(
            "UPDATE bookings SET payment_status = 'paid', updated_at = $1 \
             WHERE id = $2 AND payment_status NOT IN ('paid', 'refunded')",
        )
        .bind(now_str())
        .bind(booking_id)
        .execute(&mut *tx)
        .await
        .map_err(backend)?
        .rows_affected()
            > 0;

        if applied {
            self.advance_pending_to_confirmed(&mut tx, booking_id).await?;
            // Settle any in-flight attempt so the audit trail matches.
            sqlx::query(
                "UPDATE payments SET status = 'success', updated_at = $1 \
                 WHERE booking_id = $2 AND status = 'pending'",
            )
            .bind(now_str())
            .bind(booking_id)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        }

        let row = sqlx::query(&select_booking)
            .bind(booking_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(backend)?;
        let booking = booking_from_row(&row)?;
        tx.commit().await.map_err(backend)?;
        Ok(PaymentApplication { applied, booking })
    }

    async fn apply_refund(&self, booking_id: &str) -> Result<PaymentApplication, StoreError> {
        let mut tx = self.db_client.begin().await.map_err(backend)?;

        let select_booking = format!("{} WHERE id = $1", SELECT_BOOKING);
        let row = sqlx::query(&select_booking)
            .bind(booking_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?;
        if row.is_none() {
            return Err(StoreError::NotFound("booking".to_string()));
        }

        let applied = sqlx::query(
            "UPDATE bookings SET payment_status = 'refunded', updated_at = $1 \
             WHERE id = $2 AND payment_status = 'paid'",
        )
        .bind(now_str())
        .bind(booking_id)
        .execute(&mut *tx)
        .await
        .map_err(backend)?
        .rows_affected()
            > 0;

        let row = sqlx::query(&select_booking)
            .bind(booking_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(backend)?;
        let booking = booking_from_row(&row)?;
        tx.commit().await.map_err(backend)?;
        Ok(PaymentApplication { applied, booking })
    }

    async fn payment_history(
        &self,
        client_id: &str,
        page: Page,
    ) -> Result<Vec<PaymentRecord>, StoreError> {
        let query = format!(
            "{} WHERE client_id = $1 AND status IN ('success', 'failed') \
             ORDER BY created_at DESC, reference LIMIT $2 OFFSET $3",
            SELECT_PAYMENT
        );
        let rows = sqlx::query(&query)
            .bind(client_id)
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset()))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(backend)?;
        rows.iter().map(payment_from_row).collect()
    }
}

impl SqlStore {
    /// Advances a pending booking to confirmed unless another blocking
    /// booking claimed the window while payment was in flight.
    async fn advance_pending_to_confirmed(
        &self,
        tx: &mut crate::client::DbTransaction<'_>,
        booking_id: &str,
    ) -> Result<(), StoreError> {
        let select_booking = format!("{} WHERE id = $1", SELECT_BOOKING);
        let row = sqlx::query(&select_booking)
            .bind(booking_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(backend)?;
        let booking = booking_from_row(&row)?;
        if booking.status != BookingStatus::Pending {
            return Ok(());
        }
        let overlaps = Self::overlap_count(
            &mut **tx,
            &booking.provider_id,
            &booking.service_date.to_string(),
            i64::from(booking.start_minute),
            i64::from(booking.end_minute),
            booking_id,
        )
        .await?;
        if overlaps > 0 {
            debug!(
                "window for booking {} was taken while payment was in flight; \
                 leaving status pending",
                booking_id
            );
            return Ok(());
        }
        sqlx::query(
            "UPDATE bookings SET status = 'confirmed', updated_at = $1 \
             WHERE id = $2 AND status = 'pending'",
        )
        .bind(now_str())
        .bind(booking_id)
        .execute(&mut **tx)
        .await
        .map_err(backend)?;
        Ok(())
    }
}
