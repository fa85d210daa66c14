//! Dispatcher: platform size limits, chunking and the typing discipline.
//!
//! Messenger rejects text over 2000 characters, so longer replies are split
//! on line boundaries (then spaces) into several sends. Limits count
//! characters, not bytes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use scriptura_core::types::redact_sender;

use crate::api::{MessengerApi, QuickReply};
use crate::error::MessengerError;
use crate::typing::TypingGuard;

/// Plain text message ceiling.
pub const TEXT_MAX: usize = 2000;
/// Text accompanying quick replies.
pub const QUICK_REPLY_TEXT_MAX: usize = 640;
pub const QUICK_REPLY_TITLE_MAX: usize = 20;
pub const QUICK_REPLY_PAYLOAD_MAX: usize = 1000;
pub const QUICK_REPLY_MAX: usize = 13;

/// Pause between consecutive chunks of one reply.
const CHUNK_DELAY: Duration = Duration::from_millis(100);

/// Line-aware splitter: every chunk is at most [`TEXT_MAX`] characters.
pub fn split_chunks(text: &str) -> Vec<String> {
    if text.chars().count() <= TEXT_MAX {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let cost = if current.is_empty() {
            line_len
        } else {
            1 + line_len
        };

        if !current.is_empty() && current_len + cost > TEXT_MAX {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    // Force-split anything still too long (a single line over the limit).
    let mut result = Vec::new();
    for chunk in chunks {
        if chunk.chars().count() <= TEXT_MAX {
            result.push(chunk);
            continue;
        }
        let mut remaining = chunk.as_str();
        while remaining.chars().count() > TEXT_MAX {
            let limit = byte_offset(remaining, TEXT_MAX);
            let head = &remaining[..limit];
            let split_at = head
                .rfind('\n')
                .or_else(|| head.rfind(' '))
                .filter(|&i| i > 0)
                .unwrap_or(limit);
            result.push(remaining[..split_at].to_string());
            remaining = remaining[split_at..].trim_start();
        }
        if !remaining.is_empty() {
            result.push(remaining.to_string());
        }
    }

    result
}

/// First `max` characters of `text`.
pub fn clamp_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// At most [`QUICK_REPLY_MAX`] options with titles and payloads clamped.
pub fn clamp_quick_replies(replies: &[QuickReply]) -> Vec<QuickReply> {
    replies
        .iter()
        .take(QUICK_REPLY_MAX)
        .map(|r| QuickReply {
            title: clamp_chars(&r.title, QUICK_REPLY_TITLE_MAX),
            payload: clamp_chars(&r.payload, QUICK_REPLY_PAYLOAD_MAX),
        })
        .collect()
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

pub struct Dispatcher {
    api: Arc<dyn MessengerApi>,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn MessengerApi>) -> Self {
        Self { api }
    }

    /// Send `text` in as many chunks as needed. The first failing chunk
    /// aborts the rest and is returned.
    pub async fn send_text(&self, recipient: &str, text: &str) -> Result<(), MessengerError> {
        let chunks = split_chunks(text);
        if chunks.len() > 1 {
            debug!(to = %redact_sender(recipient), chunks = chunks.len(), "splitting reply");
        }
        for (i, chunk) in chunks.iter().enumerate() {
            self.api.send_text(recipient, chunk).await?;
            if i + 1 < chunks.len() {
                tokio::time::sleep(CHUNK_DELAY).await;
            }
        }
        Ok(())
    }

    pub async fn send_quick_replies(
        &self,
        recipient: &str,
        text: &str,
        replies: &[QuickReply],
    ) -> Result<(), MessengerError> {
        let text = clamp_chars(text, QUICK_REPLY_TEXT_MAX);
        let replies = clamp_quick_replies(replies);
        self.api.send_quick_replies(recipient, &text, &replies).await
    }

    /// Typing on, produce the reply, send it, typing off. Typing off is
    /// sent whether or not the send succeeded; the send error is returned.
    pub async fn reply_with_typing<F>(&self, recipient: &str, produce: F) -> Result<(), MessengerError>
    where
        F: Future<Output = String>,
    {
        let typing = TypingGuard::start(Arc::clone(&self.api), recipient).await;
        let text = produce.await;
        let result = self.send_text(recipient, &text).await;
        typing.stop().await;
        result
    }
}
