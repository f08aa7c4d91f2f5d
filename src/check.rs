use std::fmt;

use fertihub_core::Config;
use fertihub_store::{ClinicWithLinks, SqliteStore, StoreError};

#[derive(Debug)]
pub struct DatabaseStatus {
    pub clinic_count: u64,
    pub first_hub: Option<ClinicWithLinks>,
}

#[derive(Debug)]
pub struct CheckReport {
    pub database: Result<DatabaseStatus, String>,
    pub groq_key: bool,
    pub gemini_key: bool,
    pub object_storage: bool,
}

impl CheckReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.database.is_ok()
    }
}

fn mark(present: bool) -> &'static str {
    if present { "configured" } else { "missing" }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Ok(db) => {
                writeln!(f, "database: ok ({} clinic(s))", db.clinic_count)?;
                match &db.first_hub {
                    Some(hub) => {
                        writeln!(
                            f,
                            "  hub: {} ({}) with {} spoke(s)",
                            hub.clinic.name,
                            hub.clinic.location,
                            hub.spoke_clinics.len()
                        )?;
                        for spoke in &hub.spoke_clinics {
                            writeln!(f, "    spoke: {} ({})", spoke.name, spoke.location)?;
                        }
                    }
                    None => writeln!(f, "  no hub clinic found")?,
                }
            }
            Err(e) => writeln!(f, "database: error ({e})")?,
        }
        writeln!(f, "groq api key: {}", mark(self.groq_key))?;
        writeln!(f, "gemini api key: {}", mark(self.gemini_key))?;
        write!(f, "object storage: {}", mark(self.object_storage))
    }
}

async fn database_status(url: &str) -> Result<DatabaseStatus, StoreError> {
    let store = SqliteStore::new(url).await?;
    Ok(DatabaseStatus {
        clinic_count: store.clinic_count().await?,
        first_hub: store.first_hub().await?,
    })
}

/// Probe the database and report which credentials are usable.
///
/// Placeholder secrets are dropped while the config resolves them, so they
/// show up here as missing.
pub async fn run(config: &Config) -> CheckReport {
    let database = database_status(&config.database.url).await.map_err(|e| {
        tracing::error!("database check failed: {e}");
        e.to_string()
    });

    CheckReport {
        database,
        groq_key: config.secrets.groq_api_key.is_some(),
        gemini_key: config.secrets.gemini_api_key.is_some(),
        object_storage: config.storage_configured(),
    }
}
