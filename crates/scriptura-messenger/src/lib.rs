pub mod api;
pub mod context;
pub mod error;
pub mod events;
pub mod handler;
pub mod menu;
pub mod send;
pub mod typing;

#[cfg(test)]
mod testing;

pub use api::{GraphApi, MessengerApi, QuickReply, SenderAction};
pub use context::MessengerAppContext;
pub use error::MessengerError;
pub use events::{normalize_batch, EventKind, InboundEvent};
pub use handler::{handle_batch, handle_event};
pub use send::Dispatcher;
pub use typing::TypingGuard;
