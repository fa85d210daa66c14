//! Webhook payload → canonical [`InboundEvent`]s.
//!
//! Only the first `messaging` item of each entry is read. A malformed entry
//! is logged and skipped; it never aborts the rest of the batch.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use scriptura_core::{types::redact_sender, Result, ScripturaError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Message,
    Postback,
    Referral,
    Read,
    Delivery,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub sender_id: String,
    pub recipient_id: Option<String>,
    pub kind: EventKind,
    pub text: Option<String>,
    /// Quick-reply payload, postback payload, or referral `ref`.
    pub payload: Option<String>,
    /// Set on copies of messages the page itself sent.
    pub is_echo: bool,
    /// Milliseconds since the epoch, 0 when absent.
    pub timestamp: u64,
}

// Wire shapes (private, deserialization only)

#[derive(Deserialize)]
struct RawEvent {
    sender: Option<Party>,
    recipient: Option<Party>,
    timestamp: Option<u64>,
    message: Option<RawMessage>,
    postback: Option<RawPostback>,
    referral: Option<RawReferral>,
    read: Option<Value>,
    delivery: Option<Value>,
}

#[derive(Deserialize)]
struct Party {
    id: Option<String>,
}

#[derive(Deserialize)]
struct RawMessage {
    text: Option<String>,
    quick_reply: Option<RawQuickReply>,
    #[serde(default)]
    is_echo: bool,
}

#[derive(Deserialize)]
struct RawQuickReply {
    payload: Option<String>,
}

#[derive(Deserialize)]
struct RawPostback {
    payload: Option<String>,
}

#[derive(Deserialize)]
struct RawReferral {
    #[serde(rename = "ref")]
    reference: Option<String>,
}

/// Normalize every entry of a webhook body's `entry` array, in order.
pub fn normalize_batch(entries: &[Value]) -> Vec<InboundEvent> {
    let mut events = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match normalize_entry(entry) {
            Ok(event) => {
                debug!(
                    index,
                    sender = %redact_sender(&event.sender_id),
                    kind = ?event.kind,
                    "event normalized"
                );
                events.push(event);
            }
            Err(e) => warn!(index, code = e.code(), error = %e, "skipping webhook entry"),
        }
    }
    events
}

pub fn normalize_entry(entry: &Value) -> Result<InboundEvent> {
    let first = entry
        .get("messaging")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .ok_or_else(|| ScripturaError::MalformedEvent("entry has no messaging item".into()))?;

    let raw: RawEvent = serde_json::from_value(first.clone())
        .map_err(|e| ScripturaError::MalformedEvent(e.to_string()))?;

    let sender_id = raw
        .sender
        .and_then(|p| p.id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ScripturaError::MalformedEvent("event has no sender id".into()))?;

    let mut event = InboundEvent {
        sender_id,
        recipient_id: raw.recipient.and_then(|p| p.id),
        kind: EventKind::Unknown,
        text: None,
        payload: None,
        is_echo: false,
        timestamp: raw.timestamp.unwrap_or(0),
    };

    if let Some(message) = raw.message {
        event.kind = EventKind::Message;
        event.text = message.text;
        event.payload = message.quick_reply.and_then(|q| q.payload);
        event.is_echo = message.is_echo;
    } else if let Some(postback) = raw.postback {
        event.kind = EventKind::Postback;
        event.payload = postback.payload;
    } else if let Some(referral) = raw.referral {
        event.kind = EventKind::Referral;
        event.payload = referral.reference;
    } else if raw.read.is_some() {
        event.kind = EventKind::Read;
    } else if raw.delivery.is_some() {
        event.kind = EventKind::Delivery;
    }

    Ok(event)
}
