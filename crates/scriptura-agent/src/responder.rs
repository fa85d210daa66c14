//! Question → reply pipeline shared by every inbound channel.
//!
//! `Responder::answer` runs one question end to end:
//! 1. Classify the language (keys every later step).
//! 2. Content policy; a violation ends here with a localized rejection.
//! 3. Exact cache lookup, then the similar-question scan.
//! 4. Backend call inside the wall-clock budget.
//! 5. Shape the generated text and cache it.
//!
//! Every failure becomes a localized apology; the error is only logged.

use std::sync::Arc;

use scriptura_core::{types::redact_sender, Language};
use scriptura_store::ResponseCache;
use tracing::{debug, info, instrument, warn};

use crate::invoker::{BackendInvoker, Invocation};
use crate::language;
use crate::locale;
use crate::shaper::ResponseShaper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Cache,
    Generated,
    Rejected,
    Fallback,
}

/// Text ready for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub language: Language,
    pub source: ReplySource,
}

pub struct Responder {
    cache: Arc<ResponseCache>,
    invoker: BackendInvoker,
    shaper: ResponseShaper,
}

impl Responder {
    pub fn new(cache: Arc<ResponseCache>, invoker: BackendInvoker, shaper: ResponseShaper) -> Self {
        Self {
            cache,
            invoker,
            shaper,
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    #[instrument(skip_all, fields(sender = %redact_sender(sender)))]
    pub async fn answer(&self, sender: &str, question: &str) -> Reply {
        let classification = language::classify(question);
        let lang = classification.language;
        debug!(%lang, confidence = classification.confidence, "language classified");

        let reply = |text: &str, source| Reply {
            text: text.to_string(),
            language: lang,
            source,
        };

        if let Err(violation) = self.invoker.policy().check(question) {
            info!(?violation, "question rejected by content policy");
            return reply(locale::rejection(violation, lang), ReplySource::Rejected);
        }

        // The model is the cache context: switching models invalidates keys.
        let context = Some(self.invoker.model());
        if let Some(text) = self.cache.get(question, lang, context) {
            return reply(&text, ReplySource::Cache);
        }
        if let Some(text) = self.cache.get_similar(question, lang, context) {
            return reply(&text, ReplySource::Cache);
        }

        match self.invoker.invoke(question, lang, Some(sender)).await {
            Ok(Invocation::Generated(resp)) => {
                let shaped = self.shaper.shape(&resp.content, question, lang);
                info!(
                    tokens_in = resp.tokens_in,
                    tokens_out = resp.tokens_out,
                    truncated = shaped.truncated,
                    corrected = shaped.language_corrected,
                    enriched = shaped.enriched,
                    chars = shaped.text.chars().count(),
                    "reply generated"
                );
                self.cache.set(question, lang, context, &shaped.text);
                reply(&shaped.text, ReplySource::Generated)
            }
            Ok(Invocation::Rejected { message, .. }) => reply(message, ReplySource::Rejected),
            Err(e) => {
                warn!(err = %e, kind = ?e.kind(), "backend call failed");
                reply(locale::failure(e.kind(), lang), ReplySource::Fallback)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use scriptura_core::config::{BackendConfig, CacheConfig, PolicyConfig, ShapingConfig};
    use scriptura_core::ManualClock;

    use super::*;
    use crate::locale::FailureKind;
    use crate::provider::{ChatRequest, ChatResponse, LlmProvider, ProviderError};

    struct Unauthorized {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for Unauthorized {
        fn name(&self) -> &str {
            "unauthorized"
        }

        async fn send(&self, _req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Api {
                status: 401,
                message: "invalid api key".to_string(),
            })
        }
    }

    fn responder(provider: Arc<dyn LlmProvider>) -> Responder {
        let cache = Arc::new(ResponseCache::in_memory(
            &CacheConfig::default(),
            Arc::new(ManualClock::new(0)),
        ));
        Responder::new(
            cache,
            BackendInvoker::new(provider, &BackendConfig::default(), &PolicyConfig::default()),
            ResponseShaper::new(&ShapingConfig {
                seed: Some(1),
                ..Default::default()
            }),
        )
    }

    #[tokio::test]
    async fn failures_become_localized_fallbacks_and_are_not_cached() {
        let provider = Arc::new(Unauthorized {
            calls: AtomicUsize::new(0),
        });
        let r = responder(provider.clone());

        let reply = r.answer("1234567890", "Inona no atao hoe finoana?").await;
        assert_eq!(reply.source, ReplySource::Fallback);
        assert_eq!(reply.language, Language::Mg);
        assert_eq!(reply.text, locale::failure(FailureKind::Auth, Language::Mg));
        assert!(!reply.text.contains("invalid api key"));

        r.answer("1234567890", "Inona no atao hoe finoana?").await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(r.cache().stats().size, 0);
    }
}
