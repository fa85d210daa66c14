//! Per-event handling: admission, commands, menus and questions.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use scriptura_agent::{language, locale};
use scriptura_core::{types::redact_sender, Language};

use crate::context::MessengerAppContext;
use crate::error::MessengerError;
use crate::events::{EventKind, InboundEvent};
use crate::menu::{self, MenuPayload};

/// Handle one normalized event.
///
/// Performs:
/// 1. Echo filter (copies of the page's own messages)
/// 2. Language detection from the message text
/// 3. Admission check for messages and postbacks (denial → notice)
/// 4. Quick-reply payloads → menu content
/// 5. Empty-text guard (attachments, stickers)
/// 6. `/start`, `menu`, `/help`, `/aide` interception
/// 7. Question → `Responder::answer` under a typing indicator
#[instrument(skip_all, fields(sender = %redact_sender(&event.sender_id), kind = ?event.kind))]
pub async fn handle_event<C: MessengerAppContext + ?Sized>(
    ctx: &C,
    event: &InboundEvent,
) -> Result<(), MessengerError> {
    let sender = event.sender_id.as_str();

    match event.kind {
        EventKind::Message => {
            // 1. Echo filter.
            if event.is_echo {
                debug!("ignoring echo");
                return Ok(());
            }

            // 2. Language. Empty text classifies as French.
            let text = event.text.as_deref().unwrap_or("").trim();
            let lang = language::detect(text);

            // 3. Admission.
            if !admit(ctx, sender, lang).await? {
                return Ok(());
            }

            // 4. Quick-reply payload.
            if let Some(payload) = event.payload.as_deref() {
                return handle_payload(ctx, sender, payload, lang).await;
            }

            // 5. Nothing to answer.
            if text.is_empty() {
                return ctx
                    .dispatcher()
                    .send_text(sender, locale::text_only(lang))
                    .await;
            }

            // 6. Commands.
            if let Some(result) = handle_command(ctx, sender, text, lang).await {
                return result;
            }

            // 7. Question.
            let question = text.to_string();
            ctx.dispatcher()
                .reply_with_typing(sender, async {
                    ctx.responder().answer(sender, &question).await.text
                })
                .await
        }

        EventKind::Postback => {
            let lang = Language::default();
            if !admit(ctx, sender, lang).await? {
                return Ok(());
            }
            let payload = event.payload.as_deref().unwrap_or("");
            handle_payload(ctx, sender, payload, lang).await
        }

        EventKind::Referral => {
            info!(referral = ?event.payload, "referral");
            send_welcome(ctx, sender, Language::default()).await
        }

        EventKind::Read | EventKind::Delivery | EventKind::Unknown => {
            debug!("no action for event");
            Ok(())
        }
    }
}

/// Process a batch strictly in order. Each event runs in its own task so a
/// panic is contained; errors and panics are logged and the batch moves on.
pub async fn handle_batch<C: MessengerAppContext + 'static>(ctx: Arc<C>, events: Vec<InboundEvent>) {
    for event in events {
        let sender = redact_sender(&event.sender_id);
        let ctx = Arc::clone(&ctx);
        let outcome = tokio::spawn(async move { handle_event(ctx.as_ref(), &event).await }).await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(%sender, error = %e, "event handling failed"),
            Err(join) if join.is_panic() => error!(%sender, "event handler panicked"),
            Err(join) => warn!(%sender, error = %join, "event task cancelled"),
        }
    }
}

/// Returns `Ok(false)` when the sender was turned away (notice already sent).
async fn admit<C: MessengerAppContext + ?Sized>(
    ctx: &C,
    sender: &str,
    lang: Language,
) -> Result<bool, MessengerError> {
    let decision = ctx.admission().check(sender);
    if decision.is_allowed() {
        return Ok(true);
    }
    info!(?decision, "sender rate limited");
    ctx.dispatcher()
        .send_text(sender, locale::rate_limited(lang))
        .await?;
    Ok(false)
}

async fn handle_command<C: MessengerAppContext + ?Sized>(
    ctx: &C,
    sender: &str,
    text: &str,
    lang: Language,
) -> Option<Result<(), MessengerError>> {
    let lower = text.to_lowercase();
    match lower.as_str() {
        "/start" | "menu" => Some(send_welcome(ctx, sender, lang).await),
        "/help" | "/aide" => Some(ctx.dispatcher().send_text(sender, locale::help(lang)).await),
        _ => None,
    }
}

async fn handle_payload<C: MessengerAppContext + ?Sized>(
    ctx: &C,
    sender: &str,
    payload: &str,
    lang: Language,
) -> Result<(), MessengerError> {
    match MenuPayload::parse(payload) {
        Some(MenuPayload::GetStarted) => send_welcome(ctx, sender, lang).await,
        Some(item) => ctx.dispatcher().send_text(sender, item.text(lang)).await,
        None => {
            debug!(payload, "unrecognized payload");
            ctx.dispatcher()
                .send_text(sender, locale::unknown_option(lang))
                .await
        }
    }
}

async fn send_welcome<C: MessengerAppContext + ?Sized>(
    ctx: &C,
    sender: &str,
    lang: Language,
) -> Result<(), MessengerError> {
    ctx.dispatcher()
        .send_quick_replies(sender, locale::welcome(lang), &menu::main_menu(lang))
        .await
}
