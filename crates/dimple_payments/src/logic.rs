// --- File: crates/dimple_payments/src/logic.rs ---
//! The payment confirmation workflow.
//!
//! `PaymentWorkflow` sits between the booking store, the opaque payment
//! gateway and the fire-and-forget notifier. Every settlement funnels
//! through [`PaymentWorkflow::apply_payment_result`], whose store-level
//! guarded updates make replayed and out-of-order gateway callbacks no-ops,
//! and whose contact-sharing notification fires only when an update
//! actually applied.

use crate::error::PaymentError;
use chrono::Utc;
use dimple_booking::models::{
    Actor, Booking, BookingStatus, PaymentAttemptStatus, PaymentRecord, PaymentStatus, Role,
};
use dimple_booking::store::{Page, Store};
use dimple_common::services::{ContactNotifier, GatewayPaymentStatus, PaymentGateway};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A request to start a Telebirr transfer for a booking.
#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InitiatePaymentRequest {
    pub booking_id: String,
    #[cfg_attr(feature = "openapi", schema(example = "+251911000000"))]
    pub payer_phone: String,
}

/// What the client needs to complete the transfer.
#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InitiatePaymentResponse {
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
    pub amount_cents: i64,
}

/// Current state of one payment attempt and its booking.
#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaymentStatusView {
    pub reference: String,
    pub attempt_status: PaymentAttemptStatus,
    pub booking_id: String,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
}

pub struct PaymentWorkflow<S, G, N> {
    store: Arc<S>,
    gateway: Option<Arc<G>>,
    notifier: Option<Arc<N>>,
}

impl<S, G, N> PaymentWorkflow<S, G, N>
where
    S: Store,
    G: PaymentGateway,
    N: ContactNotifier,
{
    /// `gateway`/`notifier` are `None` when the deployment has the
    /// respective integration switched off.
    pub fn new(store: Arc<S>, gateway: Option<Arc<G>>, notifier: Option<Arc<N>>) -> Self {
        PaymentWorkflow {
            store,
            gateway,
            notifier,
        }
    }

    /// A fresh opaque transaction reference. A re-initiated payment gets a
    /// brand-new reference; the failed attempt stays behind as audit trail.
    fn new_reference(booking_id: &str) -> String {
        let short = booking_id.get(..8).unwrap_or(booking_id);
        format!("DIMPLE-{}-{}", short, Uuid::new_v4().simple())
    }

    /// Starts a transfer for a booking on behalf of its client.
    ///
    /// Persists a pending attempt before calling out, so a gateway timeout
    /// leaves a record that a later webhook or verify call can settle. The
    /// ambiguous outcome of a failed call is never written as `failed`.
    pub async fn initiate(
        &self,
        actor: &Actor,
        request: InitiatePaymentRequest,
    ) -> Result<InitiatePaymentResponse, PaymentError> {
        if actor.role != Role::Client {
            return Err(PaymentError::Unauthorized);
        }
        if request.payer_phone.trim().is_empty() {
            return Err(PaymentError::Validation(
                "payer_phone must not be empty".to_string(),
            ));
        }
        let booking = self
            .store
            .find_booking(&request.booking_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound("booking".to_string()))?;
        if booking.client_id != actor.id {
            return Err(PaymentError::Unauthorized);
        }
        if booking.status.is_terminal() {
            return Err(PaymentError::Validation(
                "booking is no longer payable".to_string(),
            ));
        }
        match booking.payment_status {
            PaymentStatus::Paid | PaymentStatus::Refunded => {
                return Err(PaymentError::AlreadyPaid)
            }
            PaymentStatus::Pending | PaymentStatus::Failed => {}
        }

        let Some(gateway) = &self.gateway else {
            return Err(PaymentError::GatewayUnavailable);
        };

        let reference = Self::new_reference(&booking.id);
        let now = Utc::now();
        let record = PaymentRecord {
            reference: reference.clone(),
            booking_id: booking.id.clone(),
            client_id: booking.client_id.clone(),
            amount_cents: booking.total_amount_cents,
            payer_phone: request.payer_phone.clone(),
            method: "telebirr".to_string(),
            status: PaymentAttemptStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_payment(record).await?;

        let description = format!("Dimple massage booking {}", booking.id);
        let initiation = gateway
            .initiate(
                booking.total_amount_cents,
                &request.payer_phone,
                &reference,
                &description,
            )
            .await
            .map_err(|err| {
                warn!(reference = %reference, "gateway initiation failed: {}", err);
                PaymentError::GatewayUnavailable
            })?;

        info!(booking = %booking.id, reference = %reference, "payment initiated");
        Ok(InitiatePaymentResponse {
            reference,
            payment_url: initiation.payment_url,
            amount_cents: booking.total_amount_cents,
        })
    }

    /// Settles a gateway result for a reference. Idempotent: replaying the
    /// same result is a no-op, and the contact-sharing notification fires
    /// at most once per booking payment.
    pub async fn apply_payment_result(
        &self,
        reference: &str,
        result: GatewayPaymentStatus,
    ) -> Result<(), PaymentError> {
        match result {
            GatewayPaymentStatus::Pending => {
                // Nothing to settle yet.
                debug!(reference, "gateway reports payment still pending");
                Ok(())
            }
            GatewayPaymentStatus::Success => {
                let application = self.store.apply_payment_success(reference).await?;
                if application.applied {
                    info!(
                        booking = %application.booking.id,
                        reference,
                        "payment confirmed"
                    );
                    self.share_contact(&application.booking).await;
                } else {
                    debug!(reference, "success result replayed; no state change");
                }
                Ok(())
            }
            GatewayPaymentStatus::Failed => {
                let application = self.store.apply_payment_failure(reference).await?;
                if application.applied {
                    info!(
                        booking = %application.booking.id,
                        reference,
                        "payment failed"
                    );
                }
                Ok(())
            }
        }
    }

    /// Client-driven reconciliation: polls the gateway for the state of a
    /// pending attempt and funnels the answer through the same guarded
    /// settlement path as the webhook.
    pub async fn verify(
        &self,
        actor: &Actor,
        reference: &str,
    ) -> Result<PaymentStatusView, PaymentError> {
        let record = self
            .store
            .find_payment_by_reference(reference)
            .await?
            .ok_or_else(|| PaymentError::NotFound("payment".to_string()))?;
        let allowed = match actor.role {
            Role::Admin => true,
            Role::Client => record.client_id == actor.id,
            Role::Provider => false,
        };
        if !allowed {
            return Err(PaymentError::Unauthorized);
        }

        if !record.status.is_terminal() {
            let Some(gateway) = &self.gateway else {
                return Err(PaymentError::GatewayUnavailable);
            };
            let result = gateway.verify(reference).await.map_err(|err| {
                warn!(reference, "gateway verification failed: {}", err);
                PaymentError::GatewayUnavailable
            })?;
            self.apply_payment_result(reference, result).await?;
        }

        self.status_view(reference).await
    }

    /// Current state of an attempt and its booking, no gateway call.
    pub async fn status_view(&self, reference: &str) -> Result<PaymentStatusView, PaymentError> {
        let record = self
            .store
            .find_payment_by_reference(reference)
            .await?
            .ok_or_else(|| PaymentError::NotFound("payment".to_string()))?;
        let booking = self
            .store
            .find_booking(&record.booking_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound("booking".to_string()))?;
        Ok(PaymentStatusView {
            reference: record.reference,
            attempt_status: record.status,
            booking_id: booking.id,
            booking_status: booking.status,
            payment_status: booking.payment_status,
        })
    }

    /// Admin override: marks a booking paid off out-of-band payment proof,
    /// bypassing the gateway. Same one-way guard as the gateway path, so a
    /// repeated confirmation changes nothing and does not re-notify.
    pub async fn admin_confirm(
        &self,
        actor: &Actor,
        booking_id: &str,
    ) -> Result<Booking, PaymentError> {
        if actor.role != Role::Admin {
            return Err(PaymentError::Unauthorized);
        }
        let application = self.store.apply_admin_confirmation(booking_id).await?;
        if application.applied {
            info!(booking = %booking_id, "payment confirmed by admin override");
            self.share_contact(&application.booking).await;
        } else {
            debug!(booking = %booking_id, "admin confirmation replayed; no state change");
        }
        Ok(application.booking)
    }

    /// Admin-only `paid -> refunded`.
    pub async fn refund(&self, actor: &Actor, booking_id: &str) -> Result<Booking, PaymentError> {
        if actor.role != Role::Admin {
            return Err(PaymentError::Unauthorized);
        }
        let application = self.store.apply_refund(booking_id).await?;
        if !application.applied {
            return Err(PaymentError::NotPaid);
        }
        info!(booking = %booking_id, "payment refunded");
        Ok(application.booking)
    }

    /// Settled payment attempts, newest first. Clients see their own;
    /// admins name the client they are auditing.
    pub async fn history(
        &self,
        actor: &Actor,
        client_id: Option<&str>,
        page: Page,
    ) -> Result<Vec<PaymentRecord>, PaymentError> {
        let client_id = match actor.role {
            Role::Client => {
                if client_id.is_some_and(|id| id != actor.id) {
                    return Err(PaymentError::Unauthorized);
                }
                actor.id.clone()
            }
            Role::Admin => client_id
                .map(str::to_string)
                .ok_or_else(|| PaymentError::Validation("client_id is required".to_string()))?,
            Role::Provider => return Err(PaymentError::Unauthorized),
        };
        Ok(self.store.payment_history(&client_id, page).await?)
    }

    /// Fire-and-forget: announce that contact details may be shared. A
    /// failed send is logged and swallowed; the payment transition has
    /// already committed.
    async fn share_contact(&self, booking: &Booking) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        match notifier
            .share_contact(&booking.id, &booking.client_id, &booking.provider_id)
            .await
        {
            Ok(result) => debug!(
                booking = %booking.id,
                notification = %result.id,
                "contact-sharing notification sent"
            ),
            Err(err) => warn!(
                booking = %booking.id,
                "contact-sharing notification failed: {}",
                err
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dimple_booking::store::{BookingRepository, PaymentRepository};
    use dimple_booking::MemoryStore;
    use dimple_common::services::{BoxFuture, GatewayInitiation, NotificationResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use thiserror::Error;

    #[derive(Error, Debug)]
    #[error("mock gateway failure")]
    struct MockGatewayError;

    /// Scriptable gateway double. Records the references it was handed so
    /// tests can look up the payment attempts they triggered.
    struct MockGateway {
        initiate_ok: bool,
        verify_result: Mutex<GatewayPaymentStatus>,
        initiate_calls: AtomicUsize,
        last_reference: Mutex<Option<String>>,
    }

    impl MockGateway {
        fn working() -> Self {
            MockGateway {
                initiate_ok: true,
                verify_result: Mutex::new(GatewayPaymentStatus::Pending),
                initiate_calls: AtomicUsize::new(0),
                last_reference: Mutex::new(None),
            }
        }

        fn broken() -> Self {
            MockGateway {
                initiate_ok: false,
                ..Self::working()
            }
        }

        fn set_verify_result(&self, result: GatewayPaymentStatus) {
            *self.verify_result.lock().unwrap() = result;
        }

        fn last_reference(&self) -> Option<String> {
            self.last_reference.lock().unwrap().clone()
        }
    }

    impl PaymentGateway for MockGateway {
        type Error = MockGatewayError;

        fn initiate(
            &self,
            _amount_cents: i64,
            _payer_phone: &str,
            reference: &str,
            _description: &str,
        ) -> BoxFuture<'_, GatewayInitiation, Self::Error> {
            self.initiate_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_reference.lock().unwrap() = Some(reference.to_string());
            let ok = self.initiate_ok;
            let reference = reference.to_string();
            Box::pin(async move {
                if ok {
                    Ok(GatewayInitiation {
                        reference,
                        payment_url: Some("https://telebirr.example/pay/abc".to_string()),
                    })
                } else {
                    Err(MockGatewayError)
                }
            })
        }

        fn verify(&self, _reference: &str) -> BoxFuture<'_, GatewayPaymentStatus, Self::Error> {
            let result = *self.verify_result.lock().unwrap();
            Box::pin(async move { Ok(result) })
        }
    }

    #[derive(Error, Debug)]
    #[error("mock notifier failure")]
    struct MockNotifierError;

    struct MockNotifier {
        calls: AtomicUsize,
        fail: bool,
    }

    impl MockNotifier {
        fn new() -> Self {
            MockNotifier {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            MockNotifier {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ContactNotifier for MockNotifier {
        type Error = MockNotifierError;

        fn share_contact(
            &self,
            _booking_id: &str,
            _client_id: &str,
            _provider_id: &str,
        ) -> BoxFuture<'_, NotificationResult, Self::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err(MockNotifierError)
                } else {
                    Ok(NotificationResult {
                        id: "42".to_string(),
                        status: "sent".to_string(),
                    })
                }
            })
        }
    }

    fn client(id: &str) -> Actor {
        Actor::new(id, Role::Client)
    }

    fn admin() -> Actor {
        Actor::new("admin-1", Role::Admin)
    }

    fn pending_booking(id: &str, client_id: &str) -> Booking {
        let now = Utc::now();
        Booking {
            id: id.to_string(),
            client_id: client_id.to_string(),
            provider_id: "prov-1".to_string(),
            service_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            start_minute: 10 * 60,
            end_minute: 11 * 60,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            total_amount_cents: 60_000,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        gateway: Arc<MockGateway>,
        notifier: Arc<MockNotifier>,
        workflow: PaymentWorkflow<MemoryStore, MockGateway, MockNotifier>,
    }

    async fn fixture_with(gateway: MockGateway, notifier: MockNotifier) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_booking(pending_booking("bk-1", "cli-1"))
            .await
            .unwrap();
        let gateway = Arc::new(gateway);
        let notifier = Arc::new(notifier);
        let workflow = PaymentWorkflow::new(
            store.clone(),
            Some(gateway.clone()),
            Some(notifier.clone()),
        );
        Fixture {
            store,
            gateway,
            notifier,
            workflow,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(MockGateway::working(), MockNotifier::new()).await
    }

    fn initiate_request() -> InitiatePaymentRequest {
        InitiatePaymentRequest {
            booking_id: "bk-1".to_string(),
            payer_phone: "+251911000000".to_string(),
        }
    }

    #[tokio::test]
    async fn initiation_records_pending_attempt_and_returns_reference() {
        let f = fixture().await;
        let response = f
            .workflow
            .initiate(&client("cli-1"), initiate_request())
            .await
            .unwrap();
        assert_eq!(response.amount_cents, 60_000);
        assert!(response.payment_url.is_some());

        let record = f
            .store
            .find_payment_by_reference(&response.reference)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, PaymentAttemptStatus::Pending);
        assert_eq!(record.booking_id, "bk-1");

        // Initiation alone settles nothing.
        let booking = f.store.find_booking("bk-1").await.unwrap().unwrap();
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
        assert_eq!(booking.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn only_the_bookings_client_may_initiate() {
        let f = fixture().await;
        let stranger = f
            .workflow
            .initiate(&client("cli-9"), initiate_request())
            .await
            .unwrap_err();
        assert!(matches!(stranger, PaymentError::Unauthorized));

        let provider = f
            .workflow
            .initiate(&Actor::new("prov-1", Role::Provider), initiate_request())
            .await
            .unwrap_err();
        assert!(matches!(provider, PaymentError::Unauthorized));
    }

    #[tokio::test]
    async fn gateway_failure_surfaces_unavailable_and_leaves_attempt_pending() {
        let f = fixture_with(MockGateway::broken(), MockNotifier::new()).await;
        let err = f
            .workflow
            .initiate(&client("cli-1"), initiate_request())
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::GatewayUnavailable));

        // Ambiguous outcome: the attempt stays pending, never failed.
        let reference = f.gateway.last_reference().unwrap();
        let record = f
            .store
            .find_payment_by_reference(&reference)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, PaymentAttemptStatus::Pending);
        let booking = f.store.find_booking("bk-1").await.unwrap().unwrap();
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn missing_gateway_surfaces_unavailable() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_booking(pending_booking("bk-1", "cli-1"))
            .await
            .unwrap();
        let workflow: PaymentWorkflow<MemoryStore, MockGateway, MockNotifier> =
            PaymentWorkflow::new(store, None, None);
        let err = workflow
            .initiate(&client("cli-1"), initiate_request())
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::GatewayUnavailable));
    }

    #[tokio::test]
    async fn success_result_confirms_booking_and_notifies_once() {
        let f = fixture().await;
        let response = f
            .workflow
            .initiate(&client("cli-1"), initiate_request())
            .await
            .unwrap();

        f.workflow
            .apply_payment_result(&response.reference, GatewayPaymentStatus::Success)
            .await
            .unwrap();

        let booking = f.store.find_booking("bk-1").await.unwrap().unwrap();
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(f.notifier.call_count(), 1);
    }

    #[tokio::test]
    async fn replayed_success_result_is_a_no_op() {
        let f = fixture().await;
        let response = f
            .workflow
            .initiate(&client("cli-1"), initiate_request())
            .await
            .unwrap();

        for _ in 0..3 {
            f.workflow
                .apply_payment_result(&response.reference, GatewayPaymentStatus::Success)
                .await
                .unwrap();
        }

        let booking = f.store.find_booking("bk-1").await.unwrap().unwrap();
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
        assert_eq!(booking.status, BookingStatus::Confirmed);
        // Contact sharing fired exactly once despite the replays.
        assert_eq!(f.notifier.call_count(), 1);
    }

    #[tokio::test]
    async fn failure_result_marks_payment_failed_but_not_the_booking() {
        let f = fixture().await;
        let response = f
            .workflow
            .initiate(&client("cli-1"), initiate_request())
            .await
            .unwrap();

        f.workflow
            .apply_payment_result(&response.reference, GatewayPaymentStatus::Failed)
            .await
            .unwrap();

        let booking = f.store.find_booking("bk-1").await.unwrap().unwrap();
        assert_eq!(booking.payment_status, PaymentStatus::Failed);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(f.notifier.call_count(), 0);
    }

    #[tokio::test]
    async fn reinitiation_after_failure_uses_a_fresh_reference() {
        let f = fixture().await;
        let first = f
            .workflow
            .initiate(&client("cli-1"), initiate_request())
            .await
            .unwrap();
        f.workflow
            .apply_payment_result(&first.reference, GatewayPaymentStatus::Failed)
            .await
            .unwrap();

        let second = f
            .workflow
            .initiate(&client("cli-1"), initiate_request())
            .await
            .unwrap();
        assert_ne!(first.reference, second.reference);

        // The retry put the booking's payment back in flight.
        let booking = f.store.find_booking("bk-1").await.unwrap().unwrap();
        assert_eq!(booking.payment_status, PaymentStatus::Pending);

        f.workflow
            .apply_payment_result(&second.reference, GatewayPaymentStatus::Success)
            .await
            .unwrap();
        let booking = f.store.find_booking("bk-1").await.unwrap().unwrap();
        assert_eq!(booking.payment_status, PaymentStatus::Paid);

        // The failed attempt survives as audit trail.
        let failed = f
            .store
            .find_payment_by_reference(&first.reference)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(failed.status, PaymentAttemptStatus::Failed);
    }

    #[tokio::test]
    async fn initiating_a_paid_booking_is_rejected() {
        let f = fixture().await;
        let response = f
            .workflow
            .initiate(&client("cli-1"), initiate_request())
            .await
            .unwrap();
        f.workflow
            .apply_payment_result(&response.reference, GatewayPaymentStatus::Success)
            .await
            .unwrap();

        let err = f
            .workflow
            .initiate(&client("cli-1"), initiate_request())
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::AlreadyPaid));
    }

    #[tokio::test]
    async fn success_after_client_cancellation_does_not_resurrect_the_booking() {
        let f = fixture().await;
        let response = f
            .workflow
            .initiate(&client("cli-1"), initiate_request())
            .await
            .unwrap();

        // Client cancels while the transfer is in flight.
        f.store
            .update_status(
                "bk-1",
                BookingStatus::Pending,
                BookingStatus::Cancelled,
                Some("changed my mind".to_string()),
            )
            .await
            .unwrap()
            .unwrap();

        f.workflow
            .apply_payment_result(&response.reference, GatewayPaymentStatus::Success)
            .await
            .unwrap();

        // The money arrived, but the cancelled booking stays cancelled.
        let booking = f.store.find_booking("bk-1").await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn pending_gateway_result_settles_nothing() {
        let f = fixture().await;
        let response = f
            .workflow
            .initiate(&client("cli-1"), initiate_request())
            .await
            .unwrap();

        f.workflow
            .apply_payment_result(&response.reference, GatewayPaymentStatus::Pending)
            .await
            .unwrap();

        let view = f.workflow.status_view(&response.reference).await.unwrap();
        assert_eq!(view.attempt_status, PaymentAttemptStatus::Pending);
        assert_eq!(view.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn verify_polls_the_gateway_and_settles() {
        let f = fixture().await;
        let response = f
            .workflow
            .initiate(&client("cli-1"), initiate_request())
            .await
            .unwrap();
        f.gateway.set_verify_result(GatewayPaymentStatus::Success);

        let view = f
            .workflow
            .verify(&client("cli-1"), &response.reference)
            .await
            .unwrap();
        assert_eq!(view.payment_status, PaymentStatus::Paid);
        assert_eq!(view.booking_status, BookingStatus::Confirmed);
        assert_eq!(f.notifier.call_count(), 1);
    }

    #[tokio::test]
    async fn verify_is_scoped_to_the_paying_client() {
        let f = fixture().await;
        let response = f
            .workflow
            .initiate(&client("cli-1"), initiate_request())
            .await
            .unwrap();

        let err = f
            .workflow
            .verify(&client("cli-9"), &response.reference)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Unauthorized));

        // Admins may verify anyone's attempt.
        f.gateway.set_verify_result(GatewayPaymentStatus::Pending);
        f.workflow
            .verify(&admin(), &response.reference)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn admin_override_confirms_and_notifies_once() {
        let f = fixture().await;
        let booking = f.workflow.admin_confirm(&admin(), "bk-1").await.unwrap();
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(f.notifier.call_count(), 1);

        // Replaying the override changes nothing and does not re-notify.
        let again = f.workflow.admin_confirm(&admin(), "bk-1").await.unwrap();
        assert_eq!(again.payment_status, PaymentStatus::Paid);
        assert_eq!(f.notifier.call_count(), 1);
    }

    #[tokio::test]
    async fn admin_override_requires_admin() {
        let f = fixture().await;
        let err = f
            .workflow
            .admin_confirm(&client("cli-1"), "bk-1")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Unauthorized));
    }

    #[tokio::test]
    async fn refund_requires_a_paid_booking() {
        let f = fixture().await;
        let err = f.workflow.refund(&admin(), "bk-1").await.unwrap_err();
        assert!(matches!(err, PaymentError::NotPaid));

        f.workflow.admin_confirm(&admin(), "bk-1").await.unwrap();
        let refunded = f.workflow.refund(&admin(), "bk-1").await.unwrap();
        assert_eq!(refunded.payment_status, PaymentStatus::Refunded);

        // Refunds never repeat.
        let err = f.workflow.refund(&admin(), "bk-1").await.unwrap_err();
        assert!(matches!(err, PaymentError::NotPaid));
    }

    #[tokio::test]
    async fn notifier_failure_never_fails_the_settlement() {
        let f = fixture_with(MockGateway::working(), MockNotifier::failing()).await;
        let response = f
            .workflow
            .initiate(&client("cli-1"), initiate_request())
            .await
            .unwrap();

        f.workflow
            .apply_payment_result(&response.reference, GatewayPaymentStatus::Success)
            .await
            .unwrap();

        let booking = f.store.find_booking("bk-1").await.unwrap().unwrap();
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
        assert_eq!(f.notifier.call_count(), 1);
    }

    #[tokio::test]
    async fn history_is_scoped_per_client() {
        let f = fixture().await;
        let response = f
            .workflow
            .initiate(&client("cli-1"), initiate_request())
            .await
            .unwrap();
        f.workflow
            .apply_payment_result(&response.reference, GatewayPaymentStatus::Success)
            .await
            .unwrap();

        let own = f
            .workflow
            .history(&client("cli-1"), None, Page::default())
            .await
            .unwrap();
        assert_eq!(own.len(), 1);

        let err = f
            .workflow
            .history(&client("cli-9"), Some("cli-1"), Page::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Unauthorized));

        let audited = f
            .workflow
            .history(&admin(), Some("cli-1"), Page::default())
            .await
            .unwrap();
        assert_eq!(audited.len(), 1);

        let missing_id = f
            .workflow
            .history(&admin(), None, Page::default())
            .await
            .unwrap_err();
        assert!(matches!(missing_id, PaymentError::Validation(_)));
    }
}
