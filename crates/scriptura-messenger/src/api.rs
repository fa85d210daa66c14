//! Messenger Send API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use scriptura_core::{config::MessengerConfig, types::redact_sender};

use crate::error::MessengerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderAction {
    TypingOn,
    TypingOff,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickReply {
    pub title: String,
    pub payload: String,
}

impl QuickReply {
    pub fn new(title: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            payload: payload.into(),
        }
    }
}

/// Outbound calls to the platform. Size limits are the dispatcher's job.
#[async_trait]
pub trait MessengerApi: Send + Sync {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), MessengerError>;

    async fn send_quick_replies(
        &self,
        recipient: &str,
        text: &str,
        replies: &[QuickReply],
    ) -> Result<(), MessengerError>;

    async fn sender_action(&self, recipient: &str, action: SenderAction)
        -> Result<(), MessengerError>;
}

/// Graph API implementation posting to `{base}/{version}/me/messages`.
pub struct GraphApi {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    send_timeout: Duration,
    typing_timeout: Duration,
}

impl GraphApi {
    pub fn new(config: &MessengerConfig) -> Result<Self, MessengerError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}/me/messages",
                config.graph_base_url.trim_end_matches('/'),
                config.graph_version
            ),
            access_token: config.page_access_token.clone(),
            send_timeout: Duration::from_millis(config.send_timeout_ms),
            typing_timeout: Duration::from_millis(config.typing_timeout_ms),
        })
    }

    async fn post(&self, body: Value, timeout: Duration) -> Result<(), MessengerError> {
        if self.access_token.is_empty() {
            return Err(MessengerError::NotConfigured);
        }

        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[("access_token", self.access_token.as_str())])
            .timeout(timeout)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %text, "Graph API error");
            return Err(MessengerError::Api {
                status: status.as_u16(),
                message: text,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MessengerApi for GraphApi {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), MessengerError> {
        debug!(to = %redact_sender(recipient), chars = text.chars().count(), "sending text");
        let body = json!({
            "recipient": { "id": recipient },
            "message": { "text": text },
            "messaging_type": "RESPONSE",
        });
        self.post(body, self.send_timeout).await
    }

    async fn send_quick_replies(
        &self,
        recipient: &str,
        text: &str,
        replies: &[QuickReply],
    ) -> Result<(), MessengerError> {
        debug!(to = %redact_sender(recipient), options = replies.len(), "sending quick replies");
        let quick_replies: Vec<Value> = replies
            .iter()
            .map(|r| {
                json!({
                    "content_type": "text",
                    "title": r.title,
                    "payload": r.payload,
                })
            })
            .collect();
        let body = json!({
            "recipient": { "id": recipient },
            "message": { "text": text, "quick_replies": quick_replies },
            "messaging_type": "RESPONSE",
        });
        self.post(body, self.send_timeout).await
    }

    async fn sender_action(
        &self,
        recipient: &str,
        action: SenderAction,
    ) -> Result<(), MessengerError> {
        let body = json!({
            "recipient": { "id": recipient },
            "sender_action": action,
        });
        self.post(body, self.typing_timeout).await
    }
}
