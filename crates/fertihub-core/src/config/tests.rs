use std::io::Write;

use fertihub_llm::ProviderKind;
use serial_test::serial;

use super::*;
use crate::vault::StaticVaultProvider;

const ENV_KEYS: [&str; 12] = [
    "FERTIHUB_BIND",
    "FERTIHUB_PORT",
    "FERTIHUB_AUTH_TOKEN",
    "FERTIHUB_RATE_LIMIT",
    "DATABASE_URL",
    "FERTIHUB_AI_PROVIDER",
    "FERTIHUB_AI_FALLBACK",
    "FERTIHUB_GROQ_MODEL",
    "FERTIHUB_GEMINI_MODEL",
    "R2_ENDPOINT_URL",
    "R2_BUCKET_NAME",
    "R2_PUBLIC_URL",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
fn defaults_when_file_missing() {
    let config = Config::default();
    assert_eq!(config.server.bind, "127.0.0.1");
    assert_eq!(config.server.port, 8765);
    assert_eq!(config.server.rate_limit, 120);
    assert!(config.server.auth_token.is_none());
    assert_eq!(config.database.url, "data/fertihub.db");
    assert_eq!(config.ai.default_provider, ProviderKind::Groq);
    assert!(config.ai.fallback_enabled);
    assert_eq!(config.ai.groq.base_url, "https://api.groq.com/openai/v1");
    assert!((config.ai.gemini.temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(config.storage.bucket, "fertility-ai-bucket");
    assert_eq!(config.storage.region, "auto");
    assert!(config.storage.endpoint.is_none());
}

#[test]
#[serial]
fn load_missing_file_uses_defaults() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/fertihub.toml")).unwrap();
    assert_eq!(config.server.port, 8765);
}

#[test]
#[serial]
fn load_parses_partial_toml() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[server]
port = 9000
auth_token = "s3cret"

[ai]
default_provider = "GEMINI"
fallback_enabled = false

[ai.gemini]
base_url = "http://localhost:9999"
model = "gemini-test"

[storage]
endpoint = "https://acct.r2.cloudflarestorage.com"
bucket = "scans"
"#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.bind, "127.0.0.1");
    assert_eq!(config.server.auth_token.as_deref(), Some("s3cret"));
    assert_eq!(config.ai.default_provider, ProviderKind::Gemini);
    assert!(!config.ai.fallback_enabled);
    assert_eq!(config.ai.gemini.model, "gemini-test");
    assert_eq!(config.ai.groq.model, fertihub_llm::groq::DEFAULT_MODEL);
    assert_eq!(config.storage.bucket, "scans");
}

#[test]
#[serial]
fn load_rejects_invalid_toml() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[server\nport = ").unwrap();
    assert!(Config::load(file.path()).is_err());
}

#[test]
#[serial]
fn env_overrides_apply() {
    clear_env();
    unsafe {
        std::env::set_var("FERTIHUB_PORT", "7000");
        std::env::set_var("DATABASE_URL", ":memory:");
        std::env::set_var("FERTIHUB_AI_PROVIDER", "gemini");
        std::env::set_var("FERTIHUB_AI_FALLBACK", "false");
        std::env::set_var("R2_ENDPOINT_URL", "https://r2.example.com");
        std::env::set_var("R2_BUCKET_NAME", "other-bucket");
    }
    let config = Config::load(Path::new("/nonexistent")).unwrap();
    clear_env();

    assert_eq!(config.server.port, 7000);
    assert_eq!(config.database.url, ":memory:");
    assert_eq!(config.ai.default_provider, ProviderKind::Gemini);
    assert!(!config.ai.fallback_enabled);
    assert_eq!(config.storage.endpoint.as_deref(), Some("https://r2.example.com"));
    assert_eq!(config.storage.bucket, "other-bucket");
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("FERTIHUB_PORT", "not-a-port");
        std::env::set_var("FERTIHUB_AI_PROVIDER", "openai");
        std::env::set_var("FERTIHUB_RATE_LIMIT", "lots");
        std::env::set_var("FERTIHUB_AI_FALLBACK", "maybe");
    }
    let config = Config::load(Path::new("/nonexistent")).unwrap();
    clear_env();

    assert_eq!(config.server.port, 8765);
    assert_eq!(config.ai.default_provider, ProviderKind::Groq);
    assert_eq!(config.server.rate_limit, 120);
    assert!(config.ai.fallback_enabled);
}

#[test]
fn validate_accepts_defaults() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn validate_rejects_zero_port() {
    let mut config = Config::default();
    config.server.port = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_out_of_range_temperature() {
    let mut config = Config::default();
    config.ai.groq.temperature = 2.5;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("ai.groq.temperature"));
}

#[tokio::test]
async fn resolve_secrets_skips_placeholders() {
    let vault = StaticVaultProvider::default()
        .with("GROQ_API_KEY", "gsk_real")
        .with("GEMINI_API_KEY", "YOUR_GEMINI_API_KEY")
        .with("R2_ACCESS_KEY_ID", "")
        .with("R2_SECRET_ACCESS_KEY", "secret");

    let mut config = Config::default();
    config.resolve_secrets(&vault).await.unwrap();

    assert_eq!(
        config.secrets.groq_api_key.as_ref().map(Secret::expose),
        Some("gsk_real")
    );
    assert!(config.secrets.gemini_api_key.is_none());
    assert!(config.secrets.storage_access_key_id.is_none());
    assert!(config.secrets.storage_secret_access_key.is_some());
}

#[tokio::test]
async fn storage_configured_requires_all_parts() {
    let vault = StaticVaultProvider::default()
        .with("R2_ACCESS_KEY_ID", "id")
        .with("R2_SECRET_ACCESS_KEY", "secret");
    let mut config = Config::default();
    config.resolve_secrets(&vault).await.unwrap();
    assert!(!config.storage_configured());

    config.storage.endpoint = Some("YOUR_R2_ENDPOINT_URL".into());
    assert!(!config.storage_configured());

    config.storage.endpoint = Some("https://acct.r2.cloudflarestorage.com".into());
    assert!(config.storage_configured());
}

#[test]
fn is_real_value_rules() {
    assert!(is_real_value("gsk_abc"));
    assert!(!is_real_value("   "));
    assert!(!is_real_value("YOUR_GROQ_API_KEY"));
}

#[test]
fn serialized_config_omits_secrets() {
    let mut config = Config::default();
    config.server.auth_token = Some("token-value".into());
    config.secrets.groq_api_key = Some(Secret::new("gsk_hidden"));
    let out = toml::to_string(&config).unwrap();
    assert!(!out.contains("token-value"));
    assert!(!out.contains("gsk_hidden"));
    assert!(out.contains("fertility-ai-bucket"));
}
