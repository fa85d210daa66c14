pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ScripturaConfig;
pub use error::{Result, ScripturaError};
pub use types::Language;
