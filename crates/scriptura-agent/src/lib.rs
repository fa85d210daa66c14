pub mod invoker;
pub mod language;
pub mod locale;
pub mod openai;
pub mod policy;
pub mod prompt;
pub mod provider;
pub mod responder;
pub mod shaper;

pub use invoker::{BackendInvoker, InvokeError, Invocation};
pub use language::{classify, detect, Classification};
pub use locale::FailureKind;
pub use openai::OpenAiProvider;
pub use policy::{ContentPolicy, Violation};
pub use provider::{ChatRequest, ChatResponse, LlmProvider, Message, ProviderError, Role};
pub use responder::{Reply, ReplySource, Responder};
pub use shaper::{ProcessedResponse, ResponseShaper};
