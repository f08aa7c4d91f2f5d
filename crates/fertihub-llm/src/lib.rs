//! LLM provider abstraction and the Groq and Gemini backends.

pub mod any;
pub mod error;
pub mod extract;
pub mod gemini;
pub mod groq;
pub(crate) mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod provider;
pub(crate) mod retry;

pub use any::{AnyProvider, ProviderSet};
pub use error::LlmError;
pub use extract::extract_json_object;
pub use provider::{ChatOptions, LlmProvider, Message, ProviderKind, Role};
