use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use scriptura_agent::{BackendInvoker, LlmProvider, Responder, ResponseShaper};
use scriptura_core::{Clock, ScripturaConfig, SystemClock};
use scriptura_messenger::{Dispatcher, MessengerApi, MessengerAppContext};
use scriptura_store::{AdmissionController, MemoryRateStore, ResponseCache, Sweeper};

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: ScripturaConfig,
    pub responder: Responder,
    /// Shared with the sweeper task.
    pub admission: Arc<AdmissionController>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    /// Wire every component from config around the given backend and
    /// platform clients.
    pub fn new(
        config: ScripturaConfig,
        provider: Arc<dyn LlmProvider>,
        api: Arc<dyn MessengerApi>,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let cache = Arc::new(ResponseCache::in_memory(&config.cache, Arc::clone(&clock)));
        let invoker = BackendInvoker::new(provider, &config.backend, &config.policy);
        let shaper = ResponseShaper::new(&config.shaping);
        let responder = Responder::new(cache, invoker, shaper);

        let admission = Arc::new(AdmissionController::new(
            &config.admission,
            Box::new(MemoryRateStore::new()),
            clock,
        ));

        Self {
            config,
            responder,
            admission,
            dispatcher: Dispatcher::new(api),
        }
    }

    pub fn sweeper(&self) -> Sweeper {
        Sweeper::new(
            Arc::clone(&self.admission),
            Arc::clone(self.responder.cache()),
            Duration::from_millis(self.config.admission.sweep_interval_ms),
            Duration::from_secs(self.config.cache.sweep_interval_secs),
        )
    }
}

impl MessengerAppContext for AppState {
    fn responder(&self) -> &Responder {
        &self.responder
    }

    fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route(
            "/webhook",
            get(crate::http::webhook::verify_handler).post(crate::http::webhook::receive_handler),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
