mod check;
mod seed;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use fertihub_core::Config;
use fertihub_core::vault::EnvVaultProvider;
use fertihub_gateway::{AiSettings, GatewayServer};
use fertihub_llm::any::{AnyProvider, ProviderSet};
use fertihub_llm::gemini::GeminiProvider;
use fertihub_llm::groq::GroqProvider;
use fertihub_storage::{ObjectStore, ObjectStoreConfig, StorageError};
use fertihub_store::SqliteStore;
use tokio::sync::watch;

#[derive(Debug, Parser)]
#[command(name = "fertihub", version, about)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(
        long,
        global = true,
        env = "FERTIHUB_CONFIG",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Insert the demo hub, spoke, staff and patients.
    Seed,
    /// Report database connectivity and configured credentials.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_subscriber();

    let config = load_config(&cli.config).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Seed => {
            let store = open_store(&config).await?;
            let report = seed::run(&store).await?;
            println!("{report}");
            Ok(())
        }
        Command::Check => {
            let report = check::run(&config).await;
            println!("{report}");
            if !report.is_healthy() {
                anyhow::bail!("database check failed");
            }
            Ok(())
        }
    }
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

async fn load_config(path: &std::path::Path) -> anyhow::Result<Config> {
    let mut config = Config::load(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    config.resolve_secrets(&EnvVaultProvider).await?;
    config.validate()?;
    Ok(config)
}

async fn open_store(config: &Config) -> anyhow::Result<SqliteStore> {
    let url = config.database.url.as_str();
    if url != ":memory:"
        && !url.starts_with("sqlite:")
        && let Some(parent) = std::path::Path::new(url).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    SqliteStore::new(&config.database.url)
        .await
        .with_context(|| format!("failed to open database {}", config.database.url))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let store = open_store(&config).await?;
    let providers = create_providers(&config);
    let object_store = create_object_store(&config)?;

    tracing::info!(
        default_provider = %config.ai.default_provider,
        groq_key = config.secrets.groq_api_key.is_some(),
        gemini_key = config.secrets.gemini_api_key.is_some(),
        "AI providers ready"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    GatewayServer::new(
        &config.server.bind,
        config.server.port,
        store,
        providers,
        shutdown_rx,
    )
    .with_auth(config.server.auth_token.clone())
    .with_rate_limit(config.server.rate_limit)
    .with_max_body_size(config.server.max_body_size)
    .with_max_upload_size(config.server.max_upload_size)
    .with_object_store(object_store)
    .with_ai(AiSettings {
        default_provider: config.ai.default_provider,
        fallback_enabled: config.ai.fallback_enabled,
    })
    .serve()
    .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

fn create_providers(config: &Config) -> ProviderSet {
    let secrets = &config.secrets;
    let groq = GroqProvider::new(
        secrets.groq_api_key.as_ref().map(|k| k.expose().to_owned()),
        config.ai.groq.base_url.clone(),
        config.ai.groq.model.clone(),
        config.ai.groq.temperature,
    );
    let gemini = GeminiProvider::new(
        secrets.gemini_api_key.as_ref().map(|k| k.expose().to_owned()),
        config.ai.gemini.base_url.clone(),
        config.ai.gemini.model.clone(),
        config.ai.gemini.temperature,
    );
    ProviderSet::new(AnyProvider::Groq(groq), AnyProvider::Gemini(gemini))
}

fn create_object_store(config: &Config) -> anyhow::Result<Option<ObjectStore>> {
    let secrets = &config.secrets;
    let store_config = ObjectStoreConfig {
        endpoint: config.storage.endpoint.clone(),
        bucket: config.storage.bucket.clone(),
        region: config.storage.region.clone(),
        public_url: config.storage.public_url.clone(),
        access_key_id: secrets
            .storage_access_key_id
            .as_ref()
            .map(|s| s.expose().to_owned()),
        secret_access_key: secrets
            .storage_secret_access_key
            .as_ref()
            .map(|s| s.expose().to_owned()),
    };

    match ObjectStore::new(store_config) {
        Ok(store) => {
            tracing::info!(bucket = store.bucket(), "object storage enabled");
            Ok(Some(store))
        }
        Err(StorageError::NotConfigured(missing)) => {
            tracing::info!("object storage disabled: {missing} not set");
            Ok(None)
        }
        Err(e) => Err(e).context("invalid object storage settings"),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["fertihub"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["fertihub", "seed", "--config", "x.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Seed)));
        assert_eq!(cli.config, PathBuf::from("x.toml"));
    }

    #[test]
    fn object_store_disabled_without_endpoint() {
        let config = Config::default();
        assert!(create_object_store(&config).unwrap().is_none());
    }
}
