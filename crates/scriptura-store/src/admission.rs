//! Per-sender admission control: a sliding request window plus a temporary
//! block once the window overflows.
//!
//! State lives behind the [`RateStore`] trait. Every check is a single
//! read-modify-write on one sender's entry, performed while the store holds
//! that entry exclusively, so concurrent checks for the same sender cannot
//! both slip under the limit.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, instrument};

use scriptura_core::config::AdmissionConfig;
use scriptura_core::types::redact_sender;
use scriptura_core::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    RateLimitExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    pub expires_at_ms: u64,
    pub reason: BlockReason,
}

/// Everything remembered about one sender.
#[derive(Debug, Clone, Default)]
pub struct SenderState {
    /// Request timestamps (ms), oldest first.
    pub window: VecDeque<u64>,
    pub block: Option<BlockRecord>,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// This request overflowed the window and started a block.
    Limited { retry_after_ms: u64 },
    /// The sender was already blocked.
    Blocked { retry_after_ms: u64 },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdmissionStats {
    pub active_senders: usize,
    pub blocked_senders: usize,
}

/// Storage for per-sender state.
///
/// `with_entry` must run `f` with exclusive access to the sender's state
/// (creating an empty one if needed).
pub trait RateStore: Send + Sync {
    fn with_entry(&self, sender: &str, f: &mut dyn FnMut(&mut SenderState) -> Decision)
        -> Decision;

    /// Keep only the entries for which `keep` returns true.
    fn retain(&self, keep: &mut dyn FnMut(&mut SenderState) -> bool);

    fn for_each(&self, f: &mut dyn FnMut(&SenderState));
}

/// In-process store backed by a sharded concurrent map.
#[derive(Default)]
pub struct MemoryRateStore {
    senders: DashMap<String, SenderState>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateStore for MemoryRateStore {
    fn with_entry(
        &self,
        sender: &str,
        f: &mut dyn FnMut(&mut SenderState) -> Decision,
    ) -> Decision {
        let mut entry = self.senders.entry(sender.to_string()).or_default();
        f(entry.value_mut())
    }

    fn retain(&self, keep: &mut dyn FnMut(&mut SenderState) -> bool) {
        self.senders.retain(|_, state| keep(state));
    }

    fn for_each(&self, f: &mut dyn FnMut(&SenderState)) {
        for entry in self.senders.iter() {
            f(entry.value());
        }
    }
}

pub struct AdmissionController {
    store: Box<dyn RateStore>,
    clock: Arc<dyn Clock>,
    window_ms: u64,
    max_requests: usize,
    block_ms: u64,
}

impl AdmissionController {
    pub fn new(config: &AdmissionConfig, store: Box<dyn RateStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            window_ms: config.window_ms,
            max_requests: config.max_requests,
            block_ms: config.block_ms,
        }
    }

    /// `true` when the sender may be served now.
    pub fn admit(&self, sender: &str) -> bool {
        self.check(sender).is_allowed()
    }

    /// Record a request from `sender` and decide whether to serve it.
    #[instrument(skip(self, sender), fields(sender = %redact_sender(sender)))]
    pub fn check(&self, sender: &str) -> Decision {
        let now = self.clock.now_ms();
        let window_ms = self.window_ms;
        let max_requests = self.max_requests;
        let block_ms = self.block_ms;

        let decision = self.store.with_entry(sender, &mut |state: &mut SenderState| {
            if let Some(block) = &state.block {
                if block.expires_at_ms > now {
                    return Decision::Blocked {
                        retry_after_ms: block.expires_at_ms - now,
                    };
                }
                state.block = None;
            }

            state.window.retain(|t| now.saturating_sub(*t) < window_ms);

            if state.window.len() >= max_requests {
                state.block = Some(BlockRecord {
                    expires_at_ms: now + block_ms,
                    reason: BlockReason::RateLimitExceeded,
                });
                return Decision::Limited {
                    retry_after_ms: block_ms,
                };
            }

            state.window.push_back(now);
            Decision::Allowed
        });

        match decision {
            Decision::Allowed => debug!("admitted"),
            Decision::Limited { retry_after_ms } => {
                info!(retry_after_ms, "rate limit exceeded, sender blocked")
            }
            Decision::Blocked { retry_after_ms } => debug!(retry_after_ms, "sender still blocked"),
        }
        decision
    }

    /// Drop timestamps older than twice the window, expired blocks, and
    /// senders left with neither. Returns the number of senders still tracked.
    #[instrument(skip(self))]
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_ms();
        let horizon = self.window_ms.saturating_mul(2);
        let mut kept = 0usize;

        self.store.retain(&mut |state: &mut SenderState| {
            if state
                .block
                .as_ref()
                .is_some_and(|b| b.expires_at_ms <= now)
            {
                state.block = None;
            }
            state.window.retain(|t| now.saturating_sub(*t) < horizon);
            let keep = !state.window.is_empty() || state.block.is_some();
            if keep {
                kept += 1;
            }
            keep
        });

        debug!(kept, "admission sweep complete");
        kept
    }

    pub fn stats(&self) -> AdmissionStats {
        let now = self.clock.now_ms();
        let mut stats = AdmissionStats::default();
        self.store.for_each(&mut |state: &SenderState| {
            if !state.window.is_empty() {
                stats.active_senders += 1;
            }
            if state.block.as_ref().is_some_and(|b| b.expires_at_ms > now) {
                stats.blocked_senders += 1;
            }
        });
        stats
    }
}
