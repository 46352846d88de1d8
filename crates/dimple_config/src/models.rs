// --- File: crates/dimple_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. DATABASE_URL loaded via DIMPLE_DATABASE__URL
}

// --- Telebirr Config ---
// Holds non-secret Telebirr config. API secret loaded directly from env var:
// TELEBIRR_API_SECRET
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TelebirrConfig {
    pub api_url: String,     // Mandatory
    pub merchant_id: String, // Mandatory
    pub callback_url: String,
    pub timeout_seconds: Option<u64>,
    pub currency: Option<String>,
}

// --- Notification Config ---
// Bot token loaded directly from env var: TELEGRAM_BOT_TOKEN
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct NotifyConfig {
    pub admin_chat_id: Option<String>,
}

// --- Booking Rules Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingConfig {
    #[serde(default = "default_min_duration")]
    pub min_duration_minutes: u32,
    #[serde(default = "default_max_duration")]
    pub max_duration_minutes: u32,
    #[serde(default = "default_reason_len")]
    pub max_cancellation_reason_chars: usize,
}

fn default_min_duration() -> u32 {
    30
}
fn default_max_duration() -> u32 {
    240
}
fn default_reason_len() -> usize {
    300
}

impl Default for BookingConfig {
    fn default() -> Self {
        BookingConfig {
            min_duration_minutes: default_min_duration(),
            max_duration_minutes: default_max_duration(),
            max_cancellation_reason_chars: default_reason_len(),
        }
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_telebirr: bool,
    #[serde(default)]
    pub use_notify: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>, // Central DB config
    #[serde(default)]
    pub telebirr: Option<TelebirrConfig>,
    #[serde(default)]
    pub notify: Option<NotifyConfig>,
    #[serde(default)]
    pub booking: BookingConfig,
}
