mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

pub use crate::vault::is_real_value;
use crate::vault::{Secret, SecretKey, VaultProvider};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Resolve vendor API keys and object-store credentials through the vault.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails.
    pub async fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> anyhow::Result<()> {
        for key in SecretKey::ALL {
            let value = lookup(vault, key).await?;
            let slot = match key {
                SecretKey::GroqApiKey => &mut self.secrets.groq_api_key,
                SecretKey::GeminiApiKey => &mut self.secrets.gemini_api_key,
                SecretKey::StorageAccessKeyId => &mut self.secrets.storage_access_key_id,
                SecretKey::StorageSecretAccessKey => {
                    &mut self.secrets.storage_secret_access_key
                }
            };
            *slot = value;
        }
        Ok(())
    }

    /// Reject settings the server cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }
        if self.server.max_body_size == 0 || self.server.max_upload_size == 0 {
            bail!("server body size limits must be non-zero");
        }
        for (name, vendor) in [("groq", &self.ai.groq), ("gemini", &self.ai.gemini)] {
            if !(0.0..=2.0).contains(&vendor.temperature) {
                bail!(
                    "ai.{name}.temperature must be within [0, 2], got {}",
                    vendor.temperature
                );
            }
            if vendor.model.trim().is_empty() {
                bail!("ai.{name}.model must not be empty");
            }
        }
        if self.storage.bucket.trim().is_empty() {
            bail!("storage.bucket must not be empty");
        }
        Ok(())
    }

    /// True when both object-store credentials and the endpoint are present.
    #[must_use]
    pub fn storage_configured(&self) -> bool {
        self.storage.endpoint.as_deref().is_some_and(is_real_value)
            && self.secrets.storage_access_key_id.is_some()
            && self.secrets.storage_secret_access_key.is_some()
    }
}

async fn lookup(vault: &dyn VaultProvider, key: SecretKey) -> anyhow::Result<Option<Secret>> {
    let value = vault
        .get_secret(key)
        .await
        .with_context(|| format!("failed to resolve {key}"))?;
    if value.as_deref().is_some_and(|v| !is_real_value(v)) {
        tracing::debug!(%key, "ignoring placeholder secret");
    }
    Ok(value.as_deref().and_then(Secret::from_raw))
}
