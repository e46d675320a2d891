// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram adapter for the Chaddi bot.
//!
//! Implements [`ChatPlatform`] for the Telegram Bot API via teloxide:
//! long polling into an mpsc queue, HTML replies, edits, deletions and
//! short bans for roll kicks.

pub mod handler;

use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use chaddi_config::model::TelegramConfig;
use chaddi_core::{
    AccountId, ChaddiError, ChatEvent, ChatId, ChatPlatform, HealthStatus, MessageId,
    PluginAdapter,
};
use teloxide::RequestError;
use teloxide::dispatching::ShutdownToken;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, ParseMode, ReplyParameters};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How long a roll kick keeps the victim out. Telegram treats bans shorter
/// than 30 seconds as permanent.
const KICK_BAN_SECS: i64 = 31;

/// Telegram platform implementing [`ChatPlatform`].
pub struct TelegramPlatform {
    bot: Bot,
    timeout: Duration,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<ChatEvent>>,
    inbound_tx: mpsc::Sender<ChatEvent>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
    shutdown_token: StdMutex<Option<ShutdownToken>>,
}

impl TelegramPlatform {
    /// Creates the adapter. Requires `config.bot_token`.
    pub fn new(config: &TelegramConfig) -> Result<Self, ChaddiError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            ChaddiError::Config("telegram.bot_token is required to serve".into())
        })?;
        if token.trim().is_empty() {
            return Err(ChaddiError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let timeout = Duration::from_secs(config.request_timeout_secs);
        let client = teloxide::net::default_reqwest_settings()
            .timeout(timeout)
            .build()
            .map_err(|e| ChaddiError::Platform {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        let bot = Bot::with_client(token, client);
        let (inbound_tx, inbound_rx) = mpsc::channel(256);

        Ok(Self {
            bot,
            timeout,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
            shutdown_token: StdMutex::new(None),
        })
    }

    fn map_error(&self, action: &str, e: RequestError) -> ChaddiError {
        if let RequestError::Network(inner) = &e
            && inner.is_timeout()
        {
            return ChaddiError::Timeout {
                duration: self.timeout,
            };
        }
        let message = e.to_string();
        if is_permission_error(&message) {
            return ChaddiError::PermissionDenied {
                action: action.to_string(),
                message,
            };
        }
        ChaddiError::Platform {
            message: format!("failed to {action}: {message}"),
            source: Some(Box::new(e)),
        }
    }
}

/// Whether a Bot API error means the bot lacks admin rights.
pub fn is_permission_error(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    [
        "not enough rights",
        "chat_admin_required",
        "need administrator rights",
        "message can't be deleted",
        "can't remove chat owner",
        "user is an administrator",
    ]
    .iter()
    .any(|needle| message.contains(needle))
}

fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
    teloxide::types::ChatId(chat_id.0)
}

fn tg_message(message_id: MessageId) -> teloxide::types::MessageId {
    teloxide::types::MessageId(message_id.0)
}

#[async_trait]
impl PluginAdapter for TelegramPlatform {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn health_check(&self) -> Result<HealthStatus, ChaddiError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), ChaddiError> {
        let token = self
            .shutdown_token
            .lock()
            .map_err(|_| ChaddiError::Internal("telegram shutdown token poisoned".into()))?
            .take();
        if let Some(token) = token {
            debug!("stopping Telegram polling");
            match token.shutdown() {
                Ok(done) => done.await,
                Err(_) => debug!("Telegram dispatcher was not running"),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for TelegramPlatform {
    async fn connect(&mut self) -> Result<(), ChaddiError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }

        let tx = self.inbound_tx.clone();
        let handler = Update::filter_message().endpoint(move |msg: Message| {
            let tx = tx.clone();
            async move {
                let event = handler::to_chat_event(&msg);
                if tx.send(event).await.is_err() {
                    warn!("inbound channel closed, dropping message");
                }
                respond(())
            }
        });
        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler)
            .default_handler(|_| async {})
            .build();
        *self
            .shutdown_token
            .lock()
            .map_err(|_| ChaddiError::Internal("telegram shutdown token poisoned".into()))? =
            Some(dispatcher.shutdown_token());

        info!("starting Telegram long polling");
        self.polling_handle = Some(tokio::spawn(async move {
            dispatcher.dispatch().await;
        }));
        Ok(())
    }

    async fn receive(&self) -> Result<ChatEvent, ChaddiError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| ChaddiError::Platform {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, ChaddiError> {
        let mut request = self
            .bot
            .send_message(tg_chat(chat_id), text)
            .parse_mode(ParseMode::Html);
        if let Some(reply_to) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(tg_message(reply_to)));
        }
        let sent = request.await.map_err(|e| self.map_error("send message", e))?;
        Ok(MessageId(sent.id.0))
    }

    async fn send_sticker(
        &self,
        chat_id: ChatId,
        sticker_id: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, ChaddiError> {
        let sticker = InputFile::file_id(FileId(sticker_id.to_string()));
        let mut request = self.bot.send_sticker(tg_chat(chat_id), sticker);
        if let Some(reply_to) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(tg_message(reply_to)));
        }
        let sent = request.await.map_err(|e| self.map_error("send sticker", e))?;
        Ok(MessageId(sent.id.0))
    }

    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), ChaddiError> {
        let result = self
            .bot
            .edit_message_text(tg_chat(chat_id), tg_message(message_id), text)
            .parse_mode(ParseMode::Html)
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("message is not modified") => Ok(()),
            Err(e) => Err(self.map_error("edit message", e)),
        }
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), ChaddiError> {
        self.bot
            .delete_message(tg_chat(chat_id), tg_message(message_id))
            .await
            .map_err(|e| self.map_error("delete message", e))?;
        Ok(())
    }

    async fn kick_member(
        &self,
        chat_id: ChatId,
        account_id: AccountId,
    ) -> Result<(), ChaddiError> {
        let user_id = u64::try_from(account_id.0)
            .map(UserId)
            .map_err(|_| ChaddiError::InvalidInput(format!("invalid user id {account_id}")))?;
        let until = chrono::Utc::now() + chrono::Duration::seconds(KICK_BAN_SECS);
        self.bot
            .ban_chat_member(tg_chat(chat_id), user_id)
            .until_date(until)
            .await
            .map_err(|e| self.map_error("kick member", e))?;
        info!(chat_id = chat_id.0, account_id = account_id.0, "kicked member");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(str::to_string),
            ..TelegramConfig::default()
        }
    }

    #[test]
    fn new_requires_bot_token() {
        assert!(matches!(
            TelegramPlatform::new(&config(None)),
            Err(ChaddiError::Config(_))
        ));
    }

    #[test]
    fn new_rejects_empty_token() {
        assert!(TelegramPlatform::new(&config(Some("  "))).is_err());
    }

    #[test]
    fn new_accepts_valid_token() {
        let platform =
            TelegramPlatform::new(&config(Some("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11")))
                .unwrap();
        assert_eq!(platform.name(), "telegram");
        assert_eq!(platform.timeout, Duration::from_secs(30));
    }

    #[test]
    fn permission_errors_are_recognised() {
        assert!(is_permission_error(
            "A Telegram's error: Bad Request: not enough rights to restrict/unrestrict chat member"
        ));
        assert!(is_permission_error("Bad Request: message can't be deleted"));
        assert!(is_permission_error("Bad Request: CHAT_ADMIN_REQUIRED"));
        assert!(!is_permission_error("Bad Request: chat not found"));
    }
}
