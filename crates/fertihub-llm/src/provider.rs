use std::fmt;
use std::future::Future;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Per-request generation knobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChatOptions {
    pub max_tokens: u32,
    /// Overrides the provider's configured temperature when set.
    pub temperature: Option<f32>,
    /// Ask the vendor for a bare JSON object instead of prose.
    pub json: bool,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: None,
            json: false,
        }
    }
}

impl ChatOptions {
    #[must_use]
    pub fn with_max_tokens(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }
}

pub trait LlmProvider: Send + Sync {
    /// Send messages to the LLM and return the assistant response text.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not configured, fails to communicate,
    /// or the response carries no content.
    fn chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;

    fn name(&self) -> &str;
}

/// AI vendor selector, stored per clinic and accepted on consultation requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProviderKind {
    #[default]
    #[serde(alias = "groq")]
    Groq,
    #[serde(alias = "gemini")]
    Gemini,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Groq => "GROQ",
            Self::Gemini => "GEMINI",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("groq") {
            Ok(Self::Groq)
        } else if s.eq_ignore_ascii_case("gemini") {
            Ok(Self::Gemini)
        } else {
            Err(LlmError::UnknownProvider(s.to_owned()))
        }
    }
}
