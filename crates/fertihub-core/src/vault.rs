//! Credentials the server needs at startup and where they come from.
//!
//! Four secrets exist: the two AI vendor keys and the object-store key pair.
//! They are looked up by [`SecretKey`] through a [`VaultProvider`]; values
//! copied unchanged from `.env.example` (`YOUR_...`) are treated as unset.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

const PLACEHOLDER_PREFIX: &str = "YOUR_";

/// Credential slots resolved into [`crate::config::ResolvedSecrets`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretKey {
    GroqApiKey,
    GeminiApiKey,
    StorageAccessKeyId,
    StorageSecretAccessKey,
}

impl SecretKey {
    pub const ALL: [Self; 4] = [
        Self::GroqApiKey,
        Self::GeminiApiKey,
        Self::StorageAccessKeyId,
        Self::StorageSecretAccessKey,
    ];

    /// Environment variable holding this secret.
    #[must_use]
    pub fn env_name(self) -> &'static str {
        match self {
            Self::GroqApiKey => "GROQ_API_KEY",
            Self::GeminiApiKey => "GEMINI_API_KEY",
            Self::StorageAccessKeyId => "R2_ACCESS_KEY_ID",
            Self::StorageSecretAccessKey => "R2_SECRET_ACCESS_KEY",
        }
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_name())
    }
}

/// A credential value. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Trimmed secret, or `None` for blank input and `YOUR_...` placeholders.
    #[must_use]
    pub fn from_raw(raw: &str) -> Option<Self> {
        is_real_value(raw).then(|| Self(raw.trim().to_owned()))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Empty strings and `YOUR_...` template placeholders count as unset.
#[must_use]
pub fn is_real_value(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && !trimmed.starts_with(PLACEHOLDER_PREFIX)
}

pub type SecretFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + 'a>>;

/// Source of raw secret values. Filtering of placeholders happens in the caller.
pub trait VaultProvider: Send + Sync {
    fn get_secret(&self, key: SecretKey) -> SecretFuture<'_>;
}

/// Reads each secret from its environment variable.
pub struct EnvVaultProvider;

impl VaultProvider for EnvVaultProvider {
    fn get_secret(&self, key: SecretKey) -> SecretFuture<'_> {
        let value = std::env::var(key.env_name()).ok();
        Box::pin(async move { Ok(value) })
    }
}

/// Fixed in-memory secrets keyed by environment variable name.
#[derive(Default)]
pub struct StaticVaultProvider {
    secrets: HashMap<String, String>,
}

impl StaticVaultProvider {
    #[must_use]
    pub fn with(mut self, env_name: &str, value: &str) -> Self {
        self.secrets.insert(env_name.to_owned(), value.to_owned());
        self
    }
}

impl VaultProvider for StaticVaultProvider {
    fn get_secret(&self, key: SecretKey) -> SecretFuture<'_> {
        let value = self.secrets.get(key.env_name()).cloned();
        Box::pin(async move { Ok(value) })
    }
}
