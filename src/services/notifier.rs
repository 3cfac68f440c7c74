// src/services/notifier.rs

//! Outbound notifications.
//!
//! Delivery is best-effort: errors are returned to the caller, which logs
//! and counts them but never retries within a cycle. Bodies are HTML and
//! arrive already sized for the limits below; cutting markup here could
//! split an entity or a tag.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::NotifierConfig;
use crate::services::message::OutboundMessage;
use crate::utils::http::create_notify_client;

/// Telegram limit for message text, in UTF-16 units.
pub const MAX_TEXT_UNITS: usize = 4096;

/// Telegram limit for photo captions, in UTF-16 units.
pub const MAX_CAPTION_UNITS: usize = 1024;

/// Channel that accepts text and photo posts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<()>;

    async fn send_photo(&self, caption: &str, image_url: &str) -> Result<()>;

    /// Send a rendered message in its natural form.
    async fn deliver(&self, message: &OutboundMessage) -> Result<()> {
        match message {
            OutboundMessage::Text(text) => self.send_text(text).await,
            OutboundMessage::Photo { caption, image_url } => {
                self.send_photo(caption, image_url).await
            }
        }
    }
}

/// Telegram Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Posts to a Telegram chat through the Bot API.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
    chat_id: String,
    parse_mode: String,
}

impl TelegramNotifier {
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
        parse_mode: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            token: token.into(),
            chat_id: chat_id.into(),
            parse_mode: parse_mode.into(),
        }
    }

    /// Build a notifier from configuration; credentials are required.
    pub fn from_config(config: &NotifierConfig) -> Result<Self> {
        let (Some(token), Some(chat_id)) = (&config.bot_token, &config.chat_id) else {
            return Err(AppError::config("BOT_TOKEN and CHANNEL_ID are required"));
        };
        let client = create_notify_client(config)?;
        Ok(Self::new(
            client,
            &config.api_base,
            token,
            chat_id,
            &config.parse_mode,
        ))
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            self.token,
            method
        )
    }

    async fn call(&self, method: &str, form: &[(&str, &str)]) -> Result<()> {
        let response = self
            .client
            .post(self.method_url(method))
            .form(form)
            .send()
            .await
            // The request URL carries the bot token.
            .map_err(|e| AppError::notify(method, e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::notify(method, e.without_url()))?;

        match serde_json::from_str::<ApiResponse>(&body) {
            Ok(api) if api.ok && status.is_success() => Ok(()),
            Ok(api) => Err(AppError::notify(
                method,
                api.description
                    .unwrap_or_else(|| format!("status {status}")),
            )),
            Err(_) => Err(AppError::notify(method, format!("status {status}"))),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, text: &str) -> Result<()> {
        self.call(
            "sendMessage",
            &[
                ("chat_id", self.chat_id.as_str()),
                ("text", text),
                ("parse_mode", self.parse_mode.as_str()),
                ("disable_web_page_preview", "true"),
            ],
        )
        .await
    }

    async fn send_photo(&self, caption: &str, image_url: &str) -> Result<()> {
        self.call(
            "sendPhoto",
            &[
                ("chat_id", self.chat_id.as_str()),
                ("photo", image_url),
                ("caption", caption),
                ("parse_mode", self.parse_mode.as_str()),
            ],
        )
        .await
    }
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_text(&self, text: &str) -> Result<()> {
        log::info!("[dry-run] text:\n{}", text);
        Ok(())
    }

    async fn send_photo(&self, caption: &str, image_url: &str) -> Result<()> {
        log::info!("[dry-run] photo {}:\n{}", image_url, caption);
        Ok(())
    }
}
