//! In-memory `MessengerApi` for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::api::{MessengerApi, QuickReply, SenderAction};
use crate::error::MessengerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Text(String),
    QuickReplies(String, Vec<QuickReply>),
    Action(SenderAction),
}

#[derive(Default)]
pub struct RecordingApi {
    calls: Mutex<Vec<Call>>,
    fail_sends: bool,
    fail_actions: bool,
}

impl RecordingApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_sends() -> Arc<Self> {
        Arc::new(Self {
            fail_sends: true,
            ..Default::default()
        })
    }

    pub fn failing_actions() -> Arc<Self> {
        Arc::new(Self {
            fail_actions: true,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Text(t) | Call::QuickReplies(t, _) => Some(t),
                Call::Action(_) => None,
            })
            .collect()
    }

    fn record(&self, call: Call, fail: bool) -> Result<(), MessengerError> {
        self.calls.lock().unwrap().push(call);
        if fail {
            return Err(MessengerError::Api {
                status: 500,
                message: "scripted failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MessengerApi for RecordingApi {
    async fn send_text(&self, _recipient: &str, text: &str) -> Result<(), MessengerError> {
        self.record(Call::Text(text.to_string()), self.fail_sends)
    }

    async fn send_quick_replies(
        &self,
        _recipient: &str,
        text: &str,
        replies: &[QuickReply],
    ) -> Result<(), MessengerError> {
        self.record(
            Call::QuickReplies(text.to_string(), replies.to_vec()),
            self.fail_sends,
        )
    }

    async fn sender_action(
        &self,
        _recipient: &str,
        action: SenderAction,
    ) -> Result<(), MessengerError> {
        self.record(Call::Action(action), self.fail_actions)
    }
}
