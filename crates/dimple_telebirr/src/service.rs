// --- File: crates/dimple_telebirr/src/service.rs ---
//! [`PaymentGateway`] implementation backed by the Telebirr API.

use crate::logic::{initiate_payment, query_payment, TelebirrError};
use dimple_common::services::{BoxFuture, GatewayInitiation, GatewayPaymentStatus, PaymentGateway};
use dimple_config::{AppConfig, TelebirrConfig};

/// Telebirr-backed payment gateway.
pub struct TelebirrGateway {
    config: TelebirrConfig,
}

impl TelebirrGateway {
    pub fn new(config: TelebirrConfig) -> Self {
        Self { config }
    }

    /// Builds the gateway from the unified config when the Telebirr
    /// integration is switched on and configured.
    pub fn from_app_config(config: &AppConfig) -> Option<Self> {
        if !config.use_telebirr {
            return None;
        }
        config.telebirr.clone().map(Self::new)
    }
}

impl PaymentGateway for TelebirrGateway {
    type Error = TelebirrError;

    fn initiate(
        &self,
        amount_cents: i64,
        payer_phone: &str,
        reference: &str,
        description: &str,
    ) -> BoxFuture<'_, GatewayInitiation, Self::Error> {
        // Clone the values to avoid lifetime issues
        let payer_phone = payer_phone.to_string();
        let reference = reference.to_string();
        let description = description.to_string();

        Box::pin(async move {
            let transfer = initiate_payment(
                &self.config,
                amount_cents,
                &payer_phone,
                &reference,
                &description,
            )
            .await?;
            Ok(GatewayInitiation {
                reference: transfer.reference,
                payment_url: transfer.payment_url,
            })
        })
    }

    fn verify(&self, reference: &str) -> BoxFuture<'_, GatewayPaymentStatus, Self::Error> {
        let reference = reference.to_string();
        Box::pin(async move { query_payment(&self.config, &reference).await })
    }
}
