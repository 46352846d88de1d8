// --- File: crates/dimple_notify/src/logic.rs ---

use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

// --- Error Handling ---
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Telegram API request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Telegram API returned an error: {description}")]
    Api { description: String },
    #[error("Notification configuration missing or incomplete")]
    Config,
}

// --- Static HTTP Client ---
static HTTP_CLIENT: Lazy<Client> = Lazy::new(Client::new);

#[derive(Serialize, Debug)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize, Debug)]
struct SendMessageResult {
    message_id: i64,
}

#[derive(Deserialize, Debug)]
struct SendMessageResponse {
    ok: bool,
    result: Option<SendMessageResult>,
    description: Option<String>,
}

/// Reads the Telegram bot token from the environment.
///
/// Like the Telebirr secret, the token never lives in config files;
/// deployments provide it via `TELEGRAM_BOT_TOKEN`.
pub fn telegram_bot_token() -> Result<String, NotifyError> {
    std::env::var("TELEGRAM_BOT_TOKEN").map_err(|_| NotifyError::Config)
}

/// Escapes user-supplied text inserted into an HTML-mode message.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Sends one message to a Telegram chat via the Bot API, HTML parse mode.
pub async fn send_telegram_message(
    bot_token: &str,
    chat_id: &str,
    text: &str,
) -> Result<String, NotifyError> {
    let url = format!("https://api.telegram.org/bot{}/sendMessage", bot_token);
    let request = SendMessageRequest {
        chat_id,
        text,
        parse_mode: "HTML",
        disable_web_page_preview: true,
    };

    let response = HTTP_CLIENT.post(&url).json(&request).send().await?;
    let parsed: SendMessageResponse = response.json().await?;
    if parsed.ok {
        let message_id = parsed.result.map(|r| r.message_id).unwrap_or_default();
        debug!(chat = chat_id, message_id, "telegram notification sent");
        Ok(message_id.to_string())
    } else {
        Err(NotifyError::Api {
            description: parsed
                .description
                .unwrap_or_else(|| "unknown Telegram API error".to_string()),
        })
    }
}
