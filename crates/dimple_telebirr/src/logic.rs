// --- File: crates/dimple_telebirr/src/logic.rs ---

use chrono::Utc;
use dimple_common::services::GatewayPaymentStatus;
use dimple_config::TelebirrConfig;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error; // Use BTreeMap for ordered params for signing

// Signature generation imports
use base64::{engine::general_purpose::STANDARD as base64_engine, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

// URL encoding import
use serde_urlencoded;

use tracing::{debug, warn};

/// Default per-call timeout when the config does not set one.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

// --- Error Handling ---
#[derive(Error, Debug)]
pub enum TelebirrError {
    #[error("Telebirr API request failed: {0}")]
    Request(String),
    /// The call timed out. The outcome on the gateway side is unknown, so
    /// callers must leave the payment pending rather than mark it failed.
    #[error("Telebirr API call timed out")]
    Timeout,
    #[error("Telebirr API returned an error: Status={status}, Message='{message}'")]
    Api { status: String, message: String },
    #[error("Failed to parse Telebirr API response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Telebirr configuration missing or incomplete")]
    Config,
    #[error("Webhook signature verification failed")]
    WebhookSignature,
    #[error("Failed to encode request body: {0}")]
    Encoding(String),
}

impl From<reqwest::Error> for TelebirrError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TelebirrError::Timeout
        } else {
            TelebirrError::Request(err.to_string())
        }
    }
}

// --- Static HTTP Client ---
// Initialize reqwest client lazily and store it statically
// This client will be reused for all Telebirr API calls within this crate
static HTTP_CLIENT: Lazy<Client> = Lazy::new(Client::new);

// --- Structures for Telebirr API Responses ---
#[derive(Deserialize, Debug)]
struct InitiateApiResponse {
    success: bool,
    #[serde(rename = "paymentUrl")]
    payment_url: Option<String>,
    #[serde(rename = "transactionId")]
    transaction_id: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct VerifyApiResponse {
    success: bool,
    status: Option<String>,
    message: Option<String>,
}

/// Result of asking Telebirr to start a transfer.
#[derive(Debug, Clone)]
pub struct InitiatedTransfer {
    /// The reference the transfer runs under (ours, echoed back).
    pub reference: String,
    /// Hosted payment page the payer is sent to, when the gateway uses one.
    pub payment_url: Option<String>,
}

// --- Webhook Payload Structure ---

/// Asynchronous confirmation event posted by Telebirr to our callback URL.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TelebirrWebhookPayload {
    /// Our opaque transaction reference (Telebirr calls it `outTradeNo`).
    #[serde(rename = "outTradeNo")]
    pub reference: String,
    pub status: String,
    #[serde(rename = "transactionId")]
    pub transaction_id: Option<String>,
    pub amount: Option<String>,
    pub msisdn: Option<String>,
    pub timestamp: Option<String>,
}

// --- Core Logic Functions ---

/// Reads the Telebirr API secret from the environment.
///
/// The secret never lives in config files; deployments provide it via
/// `TELEBIRR_API_SECRET`.
pub fn telebirr_api_secret() -> Result<String, TelebirrError> {
    std::env::var("TELEBIRR_API_SECRET").map_err(|_| TelebirrError::Config)
}

/// Generates the HMAC-SHA256 signature over the urlencoded parameter string.
fn generate_signature(query_string: &str, api_secret: &str) -> String {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(api_secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(query_string.as_bytes());
    let result = mac.finalize();
    base64_engine.encode(result.into_bytes())
}

/// Signs an ordered parameter map and returns the final form-encoded body
/// with the signature appended.
fn signed_form_body(
    mut params: BTreeMap<String, String>,
    api_secret: &str,
) -> Result<String, TelebirrError> {
    // URL-encode the parameters *before* signing so both sides sign the
    // same byte string.
    let query_string_for_sig = serde_urlencoded::to_string(&params).map_err(|e| {
        TelebirrError::Encoding(format!("Failed to urlencode params for signature: {}", e))
    })?;
    let signature = generate_signature(&query_string_for_sig, api_secret);
    params.insert("signature".to_string(), signature);
    serde_urlencoded::to_string(&params)
        .map_err(|e| TelebirrError::Encoding(format!("Failed to urlencode final params: {}", e)))
}

/// Telebirr amounts are birr with two decimals; we hold cents internally.
fn format_amount(amount_cents: i64) -> String {
    format!("{}.{:02}", amount_cents / 100, amount_cents % 100)
}

fn call_timeout(config: &TelebirrConfig) -> Duration {
    Duration::from_secs(config.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS))
}

/// Asks Telebirr to start a transfer of `amount_cents` from `payer_phone`
/// under our opaque `reference`.
///
/// A timeout surfaces as [`TelebirrError::Timeout`]; the outcome is then
/// ambiguous and the payment must stay pending until a webhook or an
/// explicit verify call resolves it.
pub async fn initiate_payment(
    config: &TelebirrConfig,
    amount_cents: i64,
    payer_phone: &str,
    reference: &str,
    description: &str,
) -> Result<InitiatedTransfer, TelebirrError> {
    let api_secret = telebirr_api_secret()?;

    let mut form_params: BTreeMap<String, String> = BTreeMap::new();
    form_params.insert("merchantId".to_string(), config.merchant_id.clone());
    form_params.insert("amount".to_string(), format_amount(amount_cents));
    form_params.insert(
        "currency".to_string(),
        config.currency.clone().unwrap_or_else(|| "ETB".to_string()),
    );
    form_params.insert("msisdn".to_string(), payer_phone.to_string());
    form_params.insert("outTradeNo".to_string(), reference.to_string());
    form_params.insert("subject".to_string(), description.to_string());
    form_params.insert("notifyUrl".to_string(), config.callback_url.clone());
    form_params.insert(
        "timestamp".to_string(),
        Utc::now().timestamp_millis().to_string(),
    );

    let body = signed_form_body(form_params, &api_secret)?;
    let api_url = format!("{}/payment/initiate", config.api_url.trim_end_matches('/'));

    debug!(reference, url = %api_url, "sending Telebirr initiate request");

    let response = HTTP_CLIENT
        .post(&api_url)
        .header(
            reqwest::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .timeout(call_timeout(config))
        .body(body)
        .send()
        .await?;

    let status = response.status();
    let body_text = response.text().await?;

    if !status.is_success() {
        warn!(reference, %status, "Telebirr initiate returned HTTP error");
        return Err(TelebirrError::Api {
            status: status.to_string(),
            message: body_text,
        });
    }

    let parsed: InitiateApiResponse = serde_json::from_str(&body_text)?;
    if parsed.success {
        Ok(InitiatedTransfer {
            reference: parsed
                .transaction_id
                .unwrap_or_else(|| reference.to_string()),
            payment_url: parsed.payment_url,
        })
    } else {
        Err(TelebirrError::Api {
            status: "rejected".to_string(),
            message: parsed
                .message
                .unwrap_or_else(|| "Unknown Telebirr API error".to_string()),
        })
    }
}

/// Queries Telebirr for the state of a previously initiated transfer.
pub async fn query_payment(
    config: &TelebirrConfig,
    reference: &str,
) -> Result<GatewayPaymentStatus, TelebirrError> {
    let api_secret = telebirr_api_secret()?;

    let mut form_params: BTreeMap<String, String> = BTreeMap::new();
    form_params.insert("merchantId".to_string(), config.merchant_id.clone());
    form_params.insert("outTradeNo".to_string(), reference.to_string());
    form_params.insert(
        "timestamp".to_string(),
        Utc::now().timestamp_millis().to_string(),
    );

    let body = signed_form_body(form_params, &api_secret)?;
    let api_url = format!("{}/payment/verify", config.api_url.trim_end_matches('/'));

    debug!(reference, url = %api_url, "sending Telebirr verify request");

    let response = HTTP_CLIENT
        .post(&api_url)
        .header(
            reqwest::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .timeout(call_timeout(config))
        .body(body)
        .send()
        .await?;

    let status = response.status();
    let body_text = response.text().await?;

    if !status.is_success() {
        warn!(reference, %status, "Telebirr verify returned HTTP error");
        return Err(TelebirrError::Api {
            status: status.to_string(),
            message: body_text,
        });
    }

    let parsed: VerifyApiResponse = serde_json::from_str(&body_text)?;
    if parsed.success {
        Ok(gateway_status_from_str(parsed.status.as_deref().unwrap_or("")))
    } else {
        Err(TelebirrError::Api {
            status: "rejected".to_string(),
            message: parsed
                .message
                .unwrap_or_else(|| "Unknown Telebirr API error".to_string()),
        })
    }
}

/// Maps Telebirr's transaction status strings onto the gateway contract.
///
/// Anything unrecognized reads as still pending; only an explicit terminal
/// status may settle a payment.
pub fn gateway_status_from_str(status: &str) -> GatewayPaymentStatus {
    match status.to_ascii_lowercase().as_str() {
        "success" | "completed" | "paid" => GatewayPaymentStatus::Success,
        "failed" | "cancelled" | "expired" => GatewayPaymentStatus::Failed,
        _ => GatewayPaymentStatus::Pending,
    }
}

// --- Webhook Verification ---

/// Verifies the signature of an incoming Telebirr webhook request.
///
/// The signature header carries base64(HMAC-SHA256(raw body)) under the
/// shared API secret.
pub fn verify_webhook_signature(
    api_secret: &str,
    request_body: &[u8],
    signature_header: Option<&str>,
) -> Result<(), TelebirrError> {
    let Some(signature) = signature_header else {
        return Err(TelebirrError::WebhookSignature);
    };
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(api_secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(request_body);
    let expected = base64_engine.encode(mac.finalize().into_bytes());
    if expected == signature {
        Ok(())
    } else {
        Err(TelebirrError::WebhookSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_is_birr_with_two_decimals() {
        assert_eq!(format_amount(60_000), "600.00");
        assert_eq!(format_amount(12_345), "123.45");
        assert_eq!(format_amount(5), "0.05");
    }

    #[test]
    fn signature_is_deterministic_and_key_sensitive() {
        let a = generate_signature("amount=600.00&outTradeNo=ref-1", "secret");
        let b = generate_signature("amount=600.00&outTradeNo=ref-1", "secret");
        let c = generate_signature("amount=600.00&outTradeNo=ref-1", "other");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn signed_body_carries_signature_param() {
        let mut params = BTreeMap::new();
        params.insert("amount".to_string(), "600.00".to_string());
        params.insert("outTradeNo".to_string(), "ref-1".to_string());
        let body = signed_form_body(params, "secret").unwrap();
        assert!(body.contains("amount=600.00"));
        assert!(body.contains("signature="));
    }

    #[test]
    fn webhook_signature_roundtrip() {
        let body = br#"{"outTradeNo":"ref-1","status":"success"}"#;
        type HmacSha256 = Hmac<Sha256>;
        let mut mac = HmacSha256::new_from_slice(b"secret").unwrap();
        mac.update(body);
        let signature = base64_engine.encode(mac.finalize().into_bytes());

        assert!(verify_webhook_signature("secret", body, Some(&signature)).is_ok());
        assert!(matches!(
            verify_webhook_signature("other", body, Some(&signature)),
            Err(TelebirrError::WebhookSignature)
        ));
        assert!(matches!(
            verify_webhook_signature("secret", body, None),
            Err(TelebirrError::WebhookSignature)
        ));
    }

    #[test]
    fn unknown_gateway_status_reads_as_pending() {
        assert_eq!(
            gateway_status_from_str("SUCCESS"),
            GatewayPaymentStatus::Success
        );
        assert_eq!(
            gateway_status_from_str("cancelled"),
            GatewayPaymentStatus::Failed
        );
        assert_eq!(
            gateway_status_from_str("processing"),
            GatewayPaymentStatus::Pending
        );
        assert_eq!(gateway_status_from_str(""), GatewayPaymentStatus::Pending);
    }

    #[test]
    fn webhook_payload_deserializes_gateway_field_names() {
        let payload: TelebirrWebhookPayload = serde_json::from_str(
            r#"{"outTradeNo":"DIMPLE-abc-123","status":"success","transactionId":"TB900","amount":"600.00","msisdn":"+251911000000"}"#,
        )
        .unwrap();
        assert_eq!(payload.reference, "DIMPLE-abc-123");
        assert_eq!(payload.transaction_id.as_deref(), Some("TB900"));
    }
}
