// --- File: crates/dimple_notify/src/service.rs ---
//! [`ContactNotifier`] implementation over the Telegram Bot API.

use crate::logic::{escape_html, send_telegram_message, telegram_bot_token, NotifyError};
use dimple_common::services::{BoxFuture, ContactNotifier, NotificationResult};
use dimple_config::{AppConfig, NotifyConfig};

/// Announces payment-confirmed contact sharing to the operations channel.
pub struct TelegramNotifier {
    config: NotifyConfig,
}

impl TelegramNotifier {
    pub fn new(config: NotifyConfig) -> Self {
        Self { config }
    }

    /// Builds the notifier from the unified config when notifications are
    /// switched on.
    pub fn from_app_config(config: &AppConfig) -> Option<Self> {
        if !config.use_notify {
            return None;
        }
        Some(Self::new(config.notify.clone().unwrap_or_default()))
    }
}

impl ContactNotifier for TelegramNotifier {
    type Error = NotifyError;

    fn share_contact(
        &self,
        booking_id: &str,
        client_id: &str,
        provider_id: &str,
    ) -> BoxFuture<'_, NotificationResult, Self::Error> {
        // Clone the values to avoid lifetime issues
        let booking_id = booking_id.to_string();
        let client_id = client_id.to_string();
        let provider_id = provider_id.to_string();

        Box::pin(async move {
            let bot_token = telegram_bot_token()?;
            let chat_id = self
                .config
                .admin_chat_id
                .as_deref()
                .ok_or(NotifyError::Config)?;

            let text = format!(
                "\u{1F4B0} <b>PAYMENT CONFIRMED</b>\n\n\
                 <b>Booking:</b> <code>{}</code>\n\
                 <b>Client:</b> <code>{}</code>\n\
                 <b>Massager:</b> <code>{}</code>\n\n\
                 Massager contact details may now be shared with the client.",
                escape_html(&booking_id),
                escape_html(&client_id),
                escape_html(&provider_id),
            );

            let message_id = send_telegram_message(&bot_token, chat_id, &text).await?;
            Ok(NotificationResult {
                id: message_id,
                status: "sent".to_string(),
            })
        })
    }
}
