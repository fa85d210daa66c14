//! Messenger webhook: GET /webhook (subscription handshake) and
//! POST /webhook (event delivery).
//!
//! Deliveries are acknowledged as soon as they are authenticated and
//! parsed. Event handling runs in a background task, so a slow backend
//! never delays the acknowledgment the platform waits for.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::{debug, info, warn};

use scriptura_core::ScripturaError;
use scriptura_messenger::{handler, normalize_batch};

use crate::app::AppState;

type HmacSha256 = Hmac<Sha256>;

type HttpError = (StatusCode, Json<Value>);

// ── Handshake ────────────────────────────────────────────────────────────────

/// GET /webhook?hub.mode=subscribe&hub.verify_token=…&hub.challenge=…
///
/// Echoes the challenge when the token matches (200), 403 on mismatch,
/// 400 when mode or token is missing.
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<String, HttpError> {
    let (Some(mode), Some(token)) = (params.get("hub.mode"), params.get("hub.verify_token"))
    else {
        return Err(error(StatusCode::BAD_REQUEST, "missing hub.mode or hub.verify_token"));
    };

    let expected = state.config.messenger.verify_token.as_deref();
    if mode == "subscribe" && expected == Some(token.as_str()) {
        info!("webhook subscription verified");
        return Ok(params.get("hub.challenge").cloned().unwrap_or_default());
    }

    warn!(mode = %mode, "webhook verification rejected");
    Err(error(StatusCode::FORBIDDEN, "verification failed"))
}

// ── Delivery ─────────────────────────────────────────────────────────────────

/// POST /webhook
///
/// 1. Signature check when an app secret is configured (401)
/// 2. JSON parse (400)
/// 3. `object == "page"` (404 otherwise)
/// 4. Normalize, hand off to the background handler, reply `EVENT_RECEIVED`
pub async fn receive_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, HttpError> {
    match state.config.messenger.app_secret.as_deref() {
        Some(secret) => verify_signature(&headers, &body, secret).map_err(|e| {
            warn!(code = e.code(), error = %e, "webhook signature rejected");
            error(StatusCode::UNAUTHORIZED, "invalid signature")
        })?,
        None => debug!("no app secret configured, body accepted unsigned"),
    }

    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "invalid JSON in webhook body");
        error(StatusCode::BAD_REQUEST, "invalid JSON body")
    })?;

    if payload.get("object").and_then(Value::as_str) != Some("page") {
        warn!(object = ?payload.get("object"), "webhook for unsupported object");
        return Err(error(StatusCode::NOT_FOUND, "unsupported object"));
    }

    let entries = payload
        .get("entry")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let events = normalize_batch(entries);
    info!(entries = entries.len(), events = events.len(), "webhook batch received");

    if !events.is_empty() {
        tokio::spawn(handler::handle_batch(Arc::clone(&state), events));
    }

    Ok("EVENT_RECEIVED")
}

/// Verify `X-Hub-Signature-256: sha256=<hex>` over the raw body.
fn verify_signature(
    headers: &HeaderMap,
    body: &Bytes,
    secret: &str,
) -> scriptura_core::Result<()> {
    let rejected = |reason: &str| ScripturaError::Signature(reason.to_string());

    let sig_header = headers
        .get("x-hub-signature-256")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| rejected("missing X-Hub-Signature-256 header"))?;

    let sig_hex = sig_header
        .strip_prefix("sha256=")
        .ok_or_else(|| rejected("malformed X-Hub-Signature-256 header"))?;

    let expected =
        hex::decode(sig_hex).map_err(|_| rejected("X-Hub-Signature-256 is not valid hex"))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| rejected("invalid HMAC key length"))?;
    mac.update(body);

    mac.verify_slice(&expected)
        .map_err(|_| rejected("HMAC signature mismatch"))
}

fn error(status: StatusCode, message: &str) -> HttpError {
    (status, Json(json!({ "error": message })))
}
