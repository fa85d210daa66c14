use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_GRAPH_VERSION: &str = "v18.0";
pub const DEFAULT_BACKEND_BASE_URL: &str = "https://api.groq.com/openai";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Deployment variables that predate the `SCRIPTURA_` prefix, and the
/// nested key each one feeds.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("FACEBOOK_PAGE_ACCESS_TOKEN", "messenger.page_access_token"),
    ("FACEBOOK_VERIFY_TOKEN", "messenger.verify_token"),
    ("FACEBOOK_APP_SECRET", "messenger.app_secret"),
    ("GROQ_API_KEY", "backend.api_key"),
    ("PORT", "gateway.port"),
];

/// Top-level config (scriptura.toml + SCRIPTURA_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScripturaConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub messenger: MessengerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub admission: AdmissionConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub shaping: ShapingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Messenger Platform credentials and Graph API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessengerConfig {
    /// Page access token used for every Send API call.
    #[serde(default)]
    pub page_access_token: String,
    /// Token echoed back during the webhook subscription handshake.
    pub verify_token: Option<String>,
    /// App secret for X-Hub-Signature-256. When unset, bodies are not verified.
    pub app_secret: Option<String>,
    #[serde(default = "default_graph_base_url")]
    pub graph_base_url: String,
    #[serde(default = "default_graph_version")]
    pub graph_version: String,
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    #[serde(default = "default_typing_timeout_ms")]
    pub typing_timeout_ms: u64,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            page_access_token: String::new(),
            verify_token: None,
            app_secret: None,
            graph_base_url: default_graph_base_url(),
            graph_version: default_graph_version(),
            send_timeout_ms: default_send_timeout_ms(),
            typing_timeout_ms: default_typing_timeout_ms(),
        }
    }
}

/// OpenAI-compatible completion backend (Groq by default).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub api_key: String,
    /// Base URL without trailing slash; `/v1/chat/completions` is appended.
    #[serde(default = "default_backend_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_stop")]
    pub stop: Vec<String>,
    /// Timeout for a single HTTP attempt.
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
    /// Wall-clock budget for the whole call, retries included.
    #[serde(default = "default_budget_ms")]
    pub budget_ms: u64,
    /// Extra attempts after the first one.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Linear backoff step: the wait after attempt `n` (0-based) is `(n + 1) * step`.
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_backend_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            stop: default_stop(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            budget_ms: default_budget_ms(),
            max_retries: default_max_retries(),
            backoff_step_ms: default_backoff_step_ms(),
        }
    }
}

/// Per-sender sliding-window limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    #[serde(default = "default_block_ms")]
    pub block_ms: u64,
    #[serde(default = "default_admission_sweep_ms")]
    pub sweep_interval_ms: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_requests: default_max_requests(),
            block_ms: default_block_ms(),
            sweep_interval_ms: default_admission_sweep_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Number of question characters kept in a cache key.
    #[serde(default = "default_key_chars")]
    pub key_chars: usize,
    /// Minimum Jaccard similarity for an approximate hit.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_cache_sweep_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
            key_chars: default_key_chars(),
            similarity_threshold: default_similarity_threshold(),
            sweep_interval_secs: default_cache_sweep_secs(),
        }
    }
}

/// Question length bounds enforced before the backend is called.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_min_question_chars")]
    pub min_chars: usize,
    #[serde(default = "default_max_question_chars")]
    pub max_chars: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_chars: default_min_question_chars(),
            max_chars: default_max_question_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapingConfig {
    /// Hard ceiling on the final reply, in characters.
    #[serde(default = "default_max_reply_chars")]
    pub max_chars: usize,
    /// Lines longer than this are wrapped at word boundaries.
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,
    /// Seed for conclusion and verse selection. Random when unset.
    pub seed: Option<u64>,
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_reply_chars(),
            wrap_width: default_wrap_width(),
            seed: None,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_graph_base_url() -> String {
    DEFAULT_GRAPH_BASE_URL.to_string()
}
fn default_graph_version() -> String {
    DEFAULT_GRAPH_VERSION.to_string()
}
fn default_send_timeout_ms() -> u64 {
    10_000
}
fn default_typing_timeout_ms() -> u64 {
    5_000
}
fn default_backend_base_url() -> String {
    DEFAULT_BACKEND_BASE_URL.to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    800
}
fn default_top_p() -> f32 {
    0.9
}
fn default_stop() -> Vec<String> {
    vec!["###".to_string(), "---".to_string(), "***".to_string()]
}
fn default_attempt_timeout_ms() -> u64 {
    15_000
}
fn default_budget_ms() -> u64 {
    8_000
}
fn default_max_retries() -> u32 {
    2
}
fn default_backoff_step_ms() -> u64 {
    1_000
}
fn default_window_ms() -> u64 {
    60_000
}
fn default_max_requests() -> usize {
    30
}
fn default_block_ms() -> u64 {
    300_000
}
fn default_admission_sweep_ms() -> u64 {
    60_000
}
fn default_ttl_secs() -> u64 {
    600
}
fn default_max_entries() -> usize {
    100
}
fn default_key_chars() -> usize {
    100
}
fn default_similarity_threshold() -> f64 {
    0.7
}
fn default_cache_sweep_secs() -> u64 {
    120
}
fn default_min_question_chars() -> usize {
    3
}
fn default_max_question_chars() -> usize {
    500
}
fn default_max_reply_chars() -> usize {
    1900
}
fn default_wrap_width() -> usize {
    80
}

impl ScripturaConfig {
    /// Load config from a TOML file with SCRIPTURA_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ./scriptura.toml
    ///
    /// Nested keys use a double underscore (`SCRIPTURA_BACKEND__MODEL`).
    /// The plain deployment variables (`GROQ_API_KEY`, `FACEBOOK_*`, `PORT`)
    /// are honoured last so hosted environments need no renaming.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or("scriptura.toml");

        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("SCRIPTURA_").split("__"))
            .merge(legacy_env());

        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> crate::error::Result<Self> {
        figment
            .extract()
            .map_err(|e| crate::error::ScripturaError::Config(e.to_string()))
    }
}

fn legacy_env() -> Env {
    let names: Vec<&str> = LEGACY_ENV.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        LEGACY_ENV
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, nested)| *nested)
            .unwrap_or("unused")
            .into()
    })
}
