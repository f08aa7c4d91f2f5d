use crate::error::LlmError;
use crate::gemini::GeminiProvider;
use crate::groq::GroqProvider;
#[cfg(feature = "mock")]
use crate::mock::MockProvider;
use crate::provider::{ChatOptions, LlmProvider, Message, ProviderKind};

/// Generates a match over all `AnyProvider` variants, binding the inner provider
/// and evaluating the given expression for each arm.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::Groq($p) => $expr,
            AnyProvider::Gemini($p) => $expr,
            #[cfg(feature = "mock")]
            AnyProvider::Mock($p) => $expr,
        }
    };
}

#[derive(Debug, Clone)]
pub enum AnyProvider {
    Groq(GroqProvider),
    Gemini(GeminiProvider),
    #[cfg(feature = "mock")]
    Mock(MockProvider),
}

impl AnyProvider {
    /// Copy of this provider authenticating with `api_key` instead of the configured key.
    #[must_use]
    pub fn with_api_key(&self, api_key: &str) -> Self {
        match self {
            Self::Groq(p) => Self::Groq(p.clone().with_api_key(api_key.to_owned())),
            Self::Gemini(p) => Self::Gemini(p.clone().with_api_key(api_key.to_owned())),
            #[cfg(feature = "mock")]
            Self::Mock(p) => Self::Mock(p.clone()),
        }
    }
}

impl LlmProvider for AnyProvider {
    async fn chat(&self, messages: &[Message], options: &ChatOptions) -> Result<String, LlmError> {
        delegate_provider!(self, |p| p.chat(messages, options).await)
    }

    fn name(&self) -> &str {
        delegate_provider!(self, |p| p.name())
    }
}

/// One ready provider per vendor.
#[derive(Debug, Clone)]
pub struct ProviderSet {
    groq: AnyProvider,
    gemini: AnyProvider,
}

impl ProviderSet {
    #[must_use]
    pub fn new(groq: AnyProvider, gemini: AnyProvider) -> Self {
        Self { groq, gemini }
    }

    #[must_use]
    pub fn get(&self, kind: ProviderKind) -> &AnyProvider {
        match kind {
            ProviderKind::Groq => &self.groq,
            ProviderKind::Gemini => &self.gemini,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> ProviderSet {
        ProviderSet::new(
            AnyProvider::Groq(GroqProvider::new(
                None,
                "http://127.0.0.1:1".into(),
                "m".into(),
                0.7,
            )),
            AnyProvider::Gemini(GeminiProvider::new(
                None,
                "http://127.0.0.1:1".into(),
                "g".into(),
                0.7,
            )),
        )
    }

    #[test]
    fn get_selects_by_kind() {
        let providers = set();
        assert_eq!(providers.get(ProviderKind::Groq).name(), "groq");
        assert_eq!(providers.get(ProviderKind::Gemini).name(), "gemini");
    }

    #[tokio::test]
    async fn with_api_key_gets_past_missing_key_check() {
        let providers = set();
        let keyed = providers.get(ProviderKind::Groq).with_api_key("k");
        let err = keyed
            .chat(&[Message::user("x")], &ChatOptions::default())
            .await
            .unwrap_err();
        // Unreachable endpoint, not a missing key.
        assert!(matches!(err, LlmError::Http(_)), "{err:?}");
    }

    #[tokio::test]
    async fn unkeyed_provider_reports_missing_key() {
        let providers = set();
        let err = providers
            .get(ProviderKind::Gemini)
            .chat(&[Message::user("x")], &ChatOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey { .. }));
    }
}
