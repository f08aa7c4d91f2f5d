use fertihub_llm::ProviderKind;
use serde::{Deserialize, Serialize};

use crate::vault::Secret;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

fn default_bind() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8765
}

fn default_rate_limit() -> u32 {
    120
}

fn default_max_body_size() -> usize {
    1_048_576
}

fn default_max_upload_size() -> usize {
    25 * 1_048_576
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bearer token required on `/api/*` routes. Disabled when unset.
    #[serde(default, skip_serializing)]
    pub auth_token: Option<String>,
    /// Requests per minute per client IP on `/api/*`; 0 disables limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            auth_token: None,
            rate_limit: default_rate_limit(),
            max_body_size: default_max_body_size(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

fn default_database_url() -> String {
    "data/fertihub.db".into()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// `SQLite` file path, `sqlite:` URL, or `:memory:`.
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_fallback_enabled() -> bool {
    true
}

fn default_temperature() -> f32 {
    0.7
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AiConfig {
    #[serde(default)]
    pub default_provider: ProviderKind,
    /// Substitute the static per-phase payload when a provider call fails.
    #[serde(default = "default_fallback_enabled")]
    pub fallback_enabled: bool,
    #[serde(default = "VendorConfig::groq")]
    pub groq: VendorConfig,
    #[serde(default = "VendorConfig::gemini")]
    pub gemini: VendorConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            default_provider: ProviderKind::default(),
            fallback_enabled: default_fallback_enabled(),
            groq: VendorConfig::groq(),
            gemini: VendorConfig::gemini(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VendorConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl VendorConfig {
    #[must_use]
    pub fn groq() -> Self {
        Self {
            base_url: fertihub_llm::groq::DEFAULT_BASE_URL.into(),
            model: fertihub_llm::groq::DEFAULT_MODEL.into(),
            temperature: default_temperature(),
        }
    }

    #[must_use]
    pub fn gemini() -> Self {
        Self {
            base_url: fertihub_llm::gemini::DEFAULT_BASE_URL.into(),
            model: fertihub_llm::gemini::DEFAULT_MODEL.into(),
            temperature: default_temperature(),
        }
    }
}

fn default_bucket() -> String {
    "fertility-ai-bucket".into()
}

fn default_region() -> String {
    "auto".into()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StorageConfig {
    /// S3-compatible endpoint, e.g. `https://<account>.r2.cloudflarestorage.com`.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Base URL for returned object links; defaults to `{endpoint}/{bucket}`.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            bucket: default_bucket(),
            region: default_region(),
            public_url: None,
        }
    }
}

/// Secrets resolved from the vault at startup; never serialized.
#[derive(Debug, Default)]
pub struct ResolvedSecrets {
    pub groq_api_key: Option<Secret>,
    pub gemini_api_key: Option<Secret>,
    pub storage_access_key_id: Option<Secret>,
    pub storage_secret_access_key: Option<Secret>,
}
