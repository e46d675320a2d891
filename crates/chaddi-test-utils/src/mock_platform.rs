// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat platform for deterministic testing.
//!
//! `MockPlatform` implements `ChatPlatform` with injectable inbound events and
//! captures every outbound call for assertions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use chaddi_core::{
    AccountId, ChaddiError, ChatEvent, ChatId, ChatPlatform, HealthStatus, MessageId,
    PluginAdapter,
};

/// One captured outbound platform call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
        reply_to: Option<MessageId>,
    },
    Sticker {
        chat_id: ChatId,
        sticker_id: String,
        reply_to: Option<MessageId>,
    },
    Edit {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
    },
    Delete {
        chat_id: ChatId,
        message_id: MessageId,
    },
    Kick {
        chat_id: ChatId,
        account_id: AccountId,
    },
}

/// A mock chat platform for testing.
pub struct MockPlatform {
    inbound: Arc<Mutex<VecDeque<ChatEvent>>>,
    inbound_notify: Arc<Notify>,
    sent: Arc<Mutex<Vec<Outbound>>>,
    sent_notify: Arc<Notify>,
    next_message_id: AtomicI32,
    refuse_kicks: AtomicBool,
    refuse_deletes: AtomicBool,
}

impl MockPlatform {
    /// Create a new mock platform with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            inbound_notify: Arc::new(Notify::new()),
            sent: Arc::new(Mutex::new(Vec::new())),
            sent_notify: Arc::new(Notify::new()),
            next_message_id: AtomicI32::new(1000),
            refuse_kicks: AtomicBool::new(false),
            refuse_deletes: AtomicBool::new(false),
        }
    }

    /// Queue an event for `receive()`.
    pub async fn inject_event(&self, event: ChatEvent) {
        self.inbound.lock().await.push_back(event);
        self.inbound_notify.notify_one();
    }

    /// Make `kick_member` fail with `PermissionDenied`.
    pub fn refuse_kicks(&self, refuse: bool) {
        self.refuse_kicks.store(refuse, Ordering::SeqCst);
    }

    /// Make `delete_message` fail with `PermissionDenied`.
    pub fn refuse_deletes(&self, refuse: bool) {
        self.refuse_deletes.store(refuse, Ordering::SeqCst);
    }

    /// Every captured outbound call, in order.
    pub async fn sent(&self) -> Vec<Outbound> {
        self.sent.lock().await.clone()
    }

    /// Texts of every sent message, in order.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|o| match o {
                Outbound::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Text of the most recently sent message.
    pub async fn last_text(&self) -> Option<String> {
        self.sent_texts().await.pop()
    }

    /// Number of captured outbound calls.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Forget all captured calls.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    /// Wait until at least `count` outbound calls were captured.
    ///
    /// Panics after `timeout`, which makes a hung handler fail the test.
    pub async fn wait_for_sent(&self, count: usize, timeout: Duration) -> Vec<Outbound> {
        let wait = async {
            loop {
                let notified = self.sent_notify.notified();
                {
                    let sent = self.sent.lock().await;
                    if sent.len() >= count {
                        return sent.clone();
                    }
                }
                notified.await;
            }
        };
        match tokio::time::timeout(timeout, wait).await {
            Ok(sent) => sent,
            Err(_) => panic!(
                "expected {count} outbound calls, got {:?}",
                self.sent.lock().await
            ),
        }
    }

    async fn record(&self, outbound: Outbound) {
        self.sent.lock().await.push(outbound);
        self.sent_notify.notify_waiters();
    }

    fn next_id(&self) -> MessageId {
        MessageId(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockPlatform {
    fn name(&self) -> &str {
        "mock-platform"
    }

    async fn health_check(&self) -> Result<HealthStatus, ChaddiError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ChaddiError> {
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    async fn connect(&mut self) -> Result<(), ChaddiError> {
        Ok(())
    }

    async fn receive(&self) -> Result<ChatEvent, ChaddiError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            self.inbound_notify.notified().await;
        }
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, ChaddiError> {
        let message_id = self.next_id();
        self.record(Outbound::Text {
            chat_id,
            message_id,
            text: text.to_string(),
            reply_to,
        })
        .await;
        Ok(message_id)
    }

    async fn send_sticker(
        &self,
        chat_id: ChatId,
        sticker_id: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, ChaddiError> {
        self.record(Outbound::Sticker {
            chat_id,
            sticker_id: sticker_id.to_string(),
            reply_to,
        })
        .await;
        Ok(self.next_id())
    }

    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), ChaddiError> {
        self.record(Outbound::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
        })
        .await;
        Ok(())
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), ChaddiError> {
        if self.refuse_deletes.load(Ordering::SeqCst) {
            return Err(ChaddiError::PermissionDenied {
                action: "delete_message".into(),
                message: "not enough rights".into(),
            });
        }
        self.record(Outbound::Delete {
            chat_id,
            message_id,
        })
        .await;
        Ok(())
    }

    async fn kick_member(&self, chat_id: ChatId, account_id: AccountId) -> Result<(), ChaddiError> {
        if self.refuse_kicks.load(Ordering::SeqCst) {
            return Err(ChaddiError::PermissionDenied {
                action: "kick_member".into(),
                message: "not enough rights".into(),
            });
        }
        self.record(Outbound::Kick {
            chat_id,
            account_id,
        })
        .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;

    #[tokio::test]
    async fn receive_returns_injected_events_in_order() {
        let platform = MockPlatform::new();
        platform.inject_event(events::group_text(-1, 1, "first")).await;
        platform.inject_event(events::group_text(-1, 1, "second")).await;
        assert_eq!(platform.receive().await.unwrap().text(), Some("first"));
        assert_eq!(platform.receive().await.unwrap().text(), Some("second"));
    }

    #[tokio::test]
    async fn send_text_captures_and_assigns_ids() {
        let platform = MockPlatform::new();
        let a = platform.send_text(ChatId(-1), "one", None).await.unwrap();
        let b = platform
            .send_text(ChatId(-1), "two", Some(MessageId(5)))
            .await
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(platform.sent_texts().await, vec!["one", "two"]);
        assert_eq!(platform.last_text().await.as_deref(), Some("two"));
        platform.clear_sent().await;
        assert_eq!(platform.sent_count().await, 0);
    }

    #[tokio::test]
    async fn refused_kick_is_permission_denied() {
        let platform = MockPlatform::new();
        platform.refuse_kicks(true);
        let err = platform
            .kick_member(ChatId(-1), AccountId(2))
            .await
            .unwrap_err();
        assert!(matches!(err, ChaddiError::PermissionDenied { .. }));
        assert_eq!(platform.sent_count().await, 0);
    }

    #[tokio::test]
    async fn wait_for_sent_sees_later_sends() {
        let platform = Arc::new(MockPlatform::new());
        let p = platform.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            p.send_text(ChatId(1), "late", None).await.unwrap();
        });
        let sent = platform.wait_for_sent(1, Duration::from_secs(2)).await;
        assert_eq!(sent.len(), 1);
    }
}
