//! Typing indicator scoped to one reply.
//!
//! `TypingGuard::start` sends `typing_on`; `stop()` sends `typing_off`.
//! If the guard is dropped without `stop()` (early return, panic unwinding
//! through the handler), `Drop` spawns the `typing_off` instead. Indicator
//! failures are logged and swallowed.

use std::sync::Arc;

use tracing::warn;

use scriptura_core::types::redact_sender;

use crate::api::{MessengerApi, SenderAction};

pub struct TypingGuard {
    api: Arc<dyn MessengerApi>,
    recipient: String,
    active: bool,
}

impl TypingGuard {
    pub async fn start(api: Arc<dyn MessengerApi>, recipient: &str) -> Self {
        send_action(api.as_ref(), recipient, SenderAction::TypingOn).await;
        Self {
            api,
            recipient: recipient.to_string(),
            active: true,
        }
    }

    pub async fn stop(mut self) {
        self.active = false;
        send_action(self.api.as_ref(), &self.recipient, SenderAction::TypingOff).await;
    }
}

impl Drop for TypingGuard {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let api = Arc::clone(&self.api);
        let recipient = std::mem::take(&mut self.recipient);
        handle.spawn(async move {
            send_action(api.as_ref(), &recipient, SenderAction::TypingOff).await;
        });
    }
}

async fn send_action(api: &dyn MessengerApi, recipient: &str, action: SenderAction) {
    if let Err(e) = api.sender_action(recipient, action).await {
        warn!(
            to = %redact_sender(recipient),
            ?action,
            error = %e,
            "typing indicator failed"
        );
    }
}
