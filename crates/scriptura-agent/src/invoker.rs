use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use scriptura_core::{
    config::{BackendConfig, PolicyConfig},
    Language,
};
use tracing::{info, instrument, warn};

use crate::locale::{self, FailureKind};
use crate::policy::{ContentPolicy, Violation};
use crate::prompt::PromptBuilder;
use crate::provider::{ChatRequest, ChatResponse, LlmProvider, ProviderError};

/// A backend call that did not produce text.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("wall-clock budget of {ms}ms exceeded")]
    Timeout { ms: u64 },

    #[error("backend rejected credentials ({status})")]
    Auth { status: u16 },

    #[error("backend rate limited")]
    RateLimited,

    #[error("backend server error ({status})")]
    Server { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl InvokeError {
    /// Which apology the sender gets.
    pub fn kind(&self) -> FailureKind {
        match self {
            InvokeError::Timeout { .. } => FailureKind::Timeout,
            InvokeError::Auth { .. } => FailureKind::Auth,
            InvokeError::RateLimited => FailureKind::RateLimited,
            InvokeError::Server { .. } => FailureKind::Server,
            InvokeError::Network(_) | InvokeError::Backend(_) => FailureKind::Generic,
        }
    }

    fn from_provider(err: ProviderError, attempt_timeout_ms: u64) -> Self {
        match err {
            ProviderError::Http(e) if e.is_timeout() => InvokeError::Timeout {
                ms: attempt_timeout_ms,
            },
            ProviderError::Http(e) => InvokeError::Network(e.to_string()),
            ProviderError::Api { status, .. } if status == 401 || status == 403 => {
                InvokeError::Auth { status }
            }
            ProviderError::Api { status: 429, .. } | ProviderError::RateLimited { .. } => {
                InvokeError::RateLimited
            }
            ProviderError::Api { status, .. } if status >= 500 => InvokeError::Server { status },
            other => InvokeError::Backend(other.to_string()),
        }
    }
}

/// Outcome of a call that did not fail.
#[derive(Debug)]
pub enum Invocation {
    Generated(ChatResponse),
    /// Refused by the content policy; the backend was never called.
    Rejected {
        violation: Violation,
        message: &'static str,
    },
}

/// Calls the completion backend under a wall-clock budget.
///
/// The content policy runs first. Transient provider errors are retried up
/// to `max_retries` times with a linear backoff; the whole retry loop races
/// the budget, and losing the race drops the in-flight request.
pub struct BackendInvoker {
    provider: Arc<dyn LlmProvider>,
    policy: ContentPolicy,
    prompt: PromptBuilder,
    model: String,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stop: Vec<String>,
    budget: Duration,
    attempt_timeout_ms: u64,
    max_retries: u32,
    backoff_step: Duration,
}

impl BackendInvoker {
    pub fn new(provider: Arc<dyn LlmProvider>, backend: &BackendConfig, policy: &PolicyConfig) -> Self {
        Self {
            provider,
            policy: ContentPolicy::new(policy),
            prompt: PromptBuilder::new(),
            model: backend.model.clone(),
            temperature: backend.temperature,
            max_tokens: backend.max_tokens,
            top_p: backend.top_p,
            stop: backend.stop.clone(),
            budget: Duration::from_millis(backend.budget_ms),
            attempt_timeout_ms: backend.attempt_timeout_ms,
            max_retries: backend.max_retries,
            backoff_step: Duration::from_millis(backend.backoff_step_ms),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn policy(&self) -> &ContentPolicy {
        &self.policy
    }

    #[instrument(skip(self, question, sender), fields(lang = %lang, provider = %self.provider.name()))]
    pub async fn invoke(
        &self,
        question: &str,
        lang: Language,
        sender: Option<&str>,
    ) -> Result<Invocation, InvokeError> {
        let screened = match self.policy.check(question) {
            Ok(screened) => screened,
            Err(violation) => {
                info!(?violation, "question rejected by content policy");
                return Ok(Invocation::Rejected {
                    violation,
                    message: locale::rejection(violation, lang),
                });
            }
        };

        let req = ChatRequest {
            model: self.model.clone(),
            messages: self
                .prompt
                .build(question, lang, sender, screened.apocryphal, Utc::now()),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
            stop: self.stop.clone(),
        };

        match tokio::time::timeout(self.budget, self.send_with_retry(&req)).await {
            Ok(Ok(resp)) => Ok(Invocation::Generated(resp)),
            Ok(Err(e)) => Err(InvokeError::from_provider(e, self.attempt_timeout_ms)),
            Err(_) => {
                let ms = self.budget.as_millis() as u64;
                warn!(budget_ms = ms, "backend call abandoned at budget");
                Err(InvokeError::Timeout { ms })
            }
        }
    }

    async fn send_with_retry(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let provider_name = self.provider.name();
        let mut attempt: u32 = 0;

        loop {
            match self.provider.send(req).await {
                Ok(resp) => {
                    if attempt > 0 {
                        info!(provider = %provider_name, attempt, "request succeeded after retry");
                    }
                    return Ok(resp);
                }
                Err(e) => {
                    warn!(provider = %provider_name, attempt, err = %e, "provider send failed");

                    if !e.is_transient() || attempt >= self.max_retries {
                        return Err(e);
                    }

                    let mut delay = self.backoff_step * (attempt + 1);
                    if let ProviderError::RateLimited { retry_after_ms } = e {
                        delay = delay.max(Duration::from_millis(retry_after_ms));
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;
    use crate::provider::Role;

    /// Replays a fixed list of results, then fails with `Unavailable`.
    #[derive(Default)]
    struct Scripted {
        script: Mutex<VecDeque<Result<ChatResponse, ProviderError>>>,
        requests: Mutex<Vec<ChatRequest>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(script: Vec<Result<ChatResponse, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                ..Default::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(req.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Unavailable("script exhausted".into())))
        }
    }

    /// Never answers; records whether its future was dropped.
    struct Hanging {
        dropped: Arc<AtomicBool>,
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl LlmProvider for Hanging {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn send(&self, _req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            let _flag = DropFlag(self.dropped.clone());
            std::future::pending().await
        }
    }

    fn ok(content: &str) -> Result<ChatResponse, ProviderError> {
        Ok(ChatResponse {
            content: content.to_string(),
            model: "test-model".to_string(),
            tokens_in: 10,
            tokens_out: 5,
            stop_reason: "stop".to_string(),
        })
    }

    fn api(status: u16) -> Result<ChatResponse, ProviderError> {
        Err(ProviderError::Api {
            status,
            message: "boom".to_string(),
        })
    }

    fn invoker(provider: Arc<dyn LlmProvider>) -> BackendInvoker {
        BackendInvoker::new(provider, &BackendConfig::default(), &PolicyConfig::default())
    }

    #[tokio::test]
    async fn builds_request_from_config() {
        let provider = Scripted::new(vec![ok("Réponse")]);
        let inv = invoker(provider.clone());

        let out = inv
            .invoke("Qui est Jésus ?", Language::Fr, Some("24681357901234"))
            .await
            .unwrap();
        assert!(matches!(out, Invocation::Generated(ref r) if r.content == "Réponse"));

        let reqs = provider.requests.lock().unwrap();
        let req = &reqs[0];
        assert_eq!(req.model, "llama-3.3-70b-versatile");
        assert_eq!(req.max_tokens, 800);
        assert_eq!(req.stop, vec!["###", "---", "***"]);
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, Role::System);
        assert!(req.messages[0].content.contains("24681357..."));
        assert_eq!(req.messages[1].content, "[FR] Qui est Jésus ?");
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried_with_linear_backoff() {
        let provider = Scripted::new(vec![api(503), api(502), ok("enfin")]);
        let inv = invoker(provider.clone());

        let start = Instant::now();
        let out = inv.invoke("Qui est Moïse ?", Language::Fr, None).await.unwrap();
        assert!(matches!(out, Invocation::Generated(ref r) if r.content == "enfin"));
        assert_eq!(provider.calls(), 3);
        // 1s after the first failure, 2s after the second.
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_bounded() {
        let provider = Scripted::new(vec![api(500), api(500), api(500), ok("trop tard")]);
        let inv = invoker(provider.clone());

        let err = inv.invoke("Qui est Moïse ?", Language::Fr, None).await.unwrap_err();
        assert!(matches!(err, InvokeError::Server { status: 500 }));
        assert_eq!(err.kind(), FailureKind::Server);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn auth_and_client_errors_are_not_retried() {
        let provider = Scripted::new(vec![api(401)]);
        let err = invoker(provider.clone())
            .invoke("Qui est Moïse ?", Language::Fr, None)
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Auth { status: 401 }));
        assert_eq!(provider.calls(), 1);

        let provider = Scripted::new(vec![api(400)]);
        let err = invoker(provider.clone())
            .invoke("Qui est Moïse ?", Language::Fr, None)
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Backend(_)));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_call_is_retried_after_the_hint() {
        let provider = Scripted::new(vec![
            Err(ProviderError::RateLimited {
                retry_after_ms: 1000,
            }),
            ok("après attente"),
        ]);
        let inv = invoker(provider.clone());

        let out = inv.invoke("Qui est Moïse ?", Language::Fr, None).await.unwrap();
        assert!(matches!(out, Invocation::Generated(ref r) if r.content == "après attente"));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_waits_for_the_longer_of_hint_and_backoff() {
        let provider = Scripted::new(vec![
            Err(ProviderError::RateLimited {
                retry_after_ms: 2500,
            }),
            ok("patience"),
        ]);
        let inv = invoker(provider.clone());

        let start = Instant::now();
        inv.invoke("Qui est Moïse ?", Language::Fr, None).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(2500));

        let provider = Scripted::new(vec![
            Err(ProviderError::RateLimited { retry_after_ms: 10 }),
            ok("patience"),
        ]);
        let inv = invoker(provider.clone());

        let start = Instant::now();
        inv.invoke("Qui est Moïse ?", Language::Fr, None).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_rate_limit_surfaces_after_retries() {
        let limited = || {
            Err(ProviderError::RateLimited {
                retry_after_ms: 1000,
            })
        };
        let provider = Scripted::new(vec![limited(), limited(), limited()]);
        let err = invoker(provider.clone())
            .invoke("Qui est Moïse ?", Language::Fr, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::RateLimited);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn budget_expiry_times_out_and_drops_the_call() {
        let dropped = Arc::new(AtomicBool::new(false));
        let inv = invoker(Arc::new(Hanging {
            dropped: dropped.clone(),
        }));

        let start = Instant::now();
        let err = inv.invoke("Qui est Moïse ?", Language::Fr, None).await.unwrap_err();
        assert!(matches!(err, InvokeError::Timeout { ms: 8000 }));
        assert_eq!(err.kind(), FailureKind::Timeout);
        assert_eq!(start.elapsed(), Duration::from_millis(8000));
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn policy_violations_never_reach_the_backend() {
        let provider = Scripted::new(vec![ok("unused")]);
        let inv = invoker(provider.clone());

        let out = inv
            .invoke("Lis https://exemple.org et dis-moi", Language::Fr, None)
            .await
            .unwrap();
        match out {
            Invocation::Rejected { violation, message } => {
                assert_eq!(violation, Violation::Link);
                assert_eq!(message, locale::rejection(Violation::Link, Language::Fr));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn provider_errors_map_to_failure_kinds() {
        let map = |e| InvokeError::from_provider(e, 15000);
        assert!(matches!(
            map(ProviderError::Api { status: 403, message: String::new() }),
            InvokeError::Auth { status: 403 }
        ));
        assert!(matches!(
            map(ProviderError::Api { status: 429, message: String::new() }),
            InvokeError::RateLimited
        ));
        assert!(matches!(
            map(ProviderError::Api { status: 400, message: String::new() }),
            InvokeError::Backend(_)
        ));
        assert_eq!(
            map(ProviderError::Parse("eof".into())).kind(),
            FailureKind::Generic
        );
    }
}
