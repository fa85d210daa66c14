//! Host interface for the event handler.
//!
//! Implemented by `AppState` in `scriptura-gateway`; tests provide their own.

use scriptura_agent::Responder;
use scriptura_store::AdmissionController;

use crate::send::Dispatcher;

pub trait MessengerAppContext: Send + Sync {
    fn responder(&self) -> &Responder;
    fn admission(&self) -> &AdmissionController;
    fn dispatcher(&self) -> &Dispatcher;
}
