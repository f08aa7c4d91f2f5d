use std::collections::HashMap;
use std::str::FromStr;

use fertihub_llm::ProviderKind;

use super::{SqliteStore, require};
use crate::error::StoreError;
use crate::types::{ApiKey, Clinic, ClinicId, ClinicType, ClinicWithLinks, NewClinic};

#[derive(sqlx::FromRow)]
struct ClinicRow {
    id: String,
    name: String,
    clinic_type: String,
    location: String,
    ai_provider: String,
    ai_api_key: Option<String>,
    hub_clinic_id: Option<String>,
    created_at: String,
}

impl TryFrom<ClinicRow> for Clinic {
    type Error = StoreError;

    fn try_from(row: ClinicRow) -> Result<Self, Self::Error> {
        let ai_provider = ProviderKind::from_str(&row.ai_provider)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Self {
            id: ClinicId(row.id),
            name: row.name,
            clinic_type: row.clinic_type.parse()?,
            location: row.location,
            ai_provider,
            ai_api_key: row.ai_api_key.filter(|k| !k.is_empty()).map(ApiKey::new),
            hub_clinic_id: row.hub_clinic_id.map(ClinicId),
            created_at: row.created_at,
        })
    }
}

fn into_clinics(rows: Vec<ClinicRow>) -> Result<Vec<Clinic>, StoreError> {
    rows.into_iter().map(Clinic::try_from).collect()
}

impl SqliteStore {
    /// Insert a clinic.
    ///
    /// A `hubClinicId` is only accepted on a `LEVEL1` clinic and must point at
    /// an existing `LEVEL2` clinic.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] when the hub link is invalid or a
    /// required field is blank, and [`StoreError::Sqlite`] if the insert fails.
    pub async fn create_clinic(&self, new: NewClinic) -> Result<Clinic, StoreError> {
        require(&new.name, "name")?;
        require(&new.location, "location")?;

        if let Some(hub_id) = &new.hub_clinic_id {
            if new.clinic_type != ClinicType::Level1 {
                return Err(StoreError::Validation(
                    "only LEVEL1 clinics can reference a hub clinic".into(),
                ));
            }
            match self.clinic(hub_id).await? {
                None => {
                    return Err(StoreError::Validation(format!(
                        "hub clinic {hub_id} does not exist"
                    )));
                }
                Some(hub) if !hub.is_hub() => {
                    return Err(StoreError::Validation(format!(
                        "clinic {hub_id} is not a LEVEL2 hub"
                    )));
                }
                Some(_) => {}
            }
        }

        let id = ClinicId::generate();
        let row: ClinicRow = sqlx::query_as(
            "INSERT INTO clinics (id, name, clinic_type, location, ai_provider, ai_api_key, hub_clinic_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             RETURNING id, name, clinic_type, location, ai_provider, ai_api_key, hub_clinic_id, created_at",
        )
        .bind(&id)
        .bind(new.name.trim())
        .bind(new.clinic_type.as_str())
        .bind(new.location.trim())
        .bind(new.ai_provider.as_str())
        .bind(new.ai_api_key.as_ref().map(ApiKey::expose))
        .bind(new.hub_clinic_id.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, "clinic"))?;

        tracing::info!(clinic_id = %id, clinic_type = %new.clinic_type, "clinic created");
        Clinic::try_from(row)
    }

    /// Fetch a single clinic without its links.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn clinic(&self, id: &ClinicId) -> Result<Option<Clinic>, StoreError> {
        let row: Option<ClinicRow> = sqlx::query_as(
            "SELECT id, name, clinic_type, location, ai_provider, ai_api_key, hub_clinic_id, created_at \
             FROM clinics WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Clinic::try_from).transpose()
    }

    /// Fetch a clinic together with its hub and spokes.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn clinic_with_links(
        &self,
        id: &ClinicId,
    ) -> Result<Option<ClinicWithLinks>, StoreError> {
        let Some(clinic) = self.clinic(id).await? else {
            return Ok(None);
        };
        let hub_clinic = match &clinic.hub_clinic_id {
            Some(hub_id) => self.clinic(hub_id).await?,
            None => None,
        };
        let spoke_clinics = self.spokes_of(id).await?;
        Ok(Some(ClinicWithLinks {
            clinic,
            hub_clinic,
            spoke_clinics,
        }))
    }

    /// Every clinic with its hub and spokes, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_clinics(&self) -> Result<Vec<ClinicWithLinks>, StoreError> {
        let rows: Vec<ClinicRow> = sqlx::query_as(
            "SELECT id, name, clinic_type, location, ai_provider, ai_api_key, hub_clinic_id, created_at \
             FROM clinics ORDER BY created_at, rowid",
        )
        .fetch_all(&self.pool)
        .await?;
        let clinics = into_clinics(rows)?;

        let by_id: HashMap<&ClinicId, &Clinic> = clinics.iter().map(|c| (&c.id, c)).collect();
        let linked = clinics
            .iter()
            .map(|clinic| ClinicWithLinks {
                clinic: clinic.clone(),
                hub_clinic: clinic
                    .hub_clinic_id
                    .as_ref()
                    .and_then(|hub_id| by_id.get(hub_id))
                    .map(|hub| (*hub).clone()),
                spoke_clinics: clinics
                    .iter()
                    .filter(|spoke| spoke.hub_clinic_id.as_ref() == Some(&clinic.id))
                    .cloned()
                    .collect(),
            })
            .collect();
        Ok(linked)
    }

    /// The oldest `LEVEL2` clinic, with links.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn first_hub(&self) -> Result<Option<ClinicWithLinks>, StoreError> {
        let id: Option<String> = sqlx::query_scalar(
            "SELECT id FROM clinics WHERE clinic_type = 'LEVEL2' ORDER BY created_at, rowid LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        match id {
            Some(id) => self.clinic_with_links(&ClinicId(id)).await,
            None => Ok(None),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn clinic_count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clinics")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn spokes_of(&self, hub_id: &ClinicId) -> Result<Vec<Clinic>, StoreError> {
        let rows: Vec<ClinicRow> = sqlx::query_as(
            "SELECT id, name, clinic_type, location, ai_provider, ai_api_key, hub_clinic_id, created_at \
             FROM clinics WHERE hub_clinic_id = ? ORDER BY created_at, rowid",
        )
        .bind(hub_id)
        .fetch_all(&self.pool)
        .await?;
        into_clinics(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{hub, new_clinic, store};
    use super::*;

    #[tokio::test]
    async fn create_and_fetch_clinic() {
        let store = store().await;
        let mut new = new_clinic("Hub Fertility Center", ClinicType::Level2, None);
        new.ai_api_key = Some(ApiKey::new("test-api-key"));

        let created = store.create_clinic(new).await.unwrap();
        assert_eq!(created.clinic_type, ClinicType::Level2);
        assert!(!created.created_at.is_empty());

        let fetched = store.clinic(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.ai_api_key.unwrap().expose(), "test-api-key");
    }

    #[tokio::test]
    async fn spoke_links_to_hub() {
        let store = store().await;
        let hub = hub(&store).await;
        let spoke = store
            .create_clinic(new_clinic("Rural Fertility Clinic", ClinicType::Level1, Some(&hub.id)))
            .await
            .unwrap();

        let hub_links = store.clinic_with_links(&hub.id).await.unwrap().unwrap();
        assert!(hub_links.hub_clinic.is_none());
        assert_eq!(hub_links.spoke_clinics, vec![spoke.clone()]);

        let spoke_links = store.clinic_with_links(&spoke.id).await.unwrap().unwrap();
        assert_eq!(spoke_links.hub_clinic.as_ref().map(|h| &h.id), Some(&hub.id));
        assert!(spoke_links.spoke_clinics.is_empty());
    }

    #[tokio::test]
    async fn list_includes_links_for_every_clinic() {
        let store = store().await;
        let hub = hub(&store).await;
        for name in ["Spoke A", "Spoke B"] {
            store
                .create_clinic(new_clinic(name, ClinicType::Level1, Some(&hub.id)))
                .await
                .unwrap();
        }
        store
            .create_clinic(new_clinic("Standalone", ClinicType::Level1, None))
            .await
            .unwrap();

        let all = store.list_clinics().await.unwrap();
        assert_eq!(all.len(), 4);
        let listed_hub = all.iter().find(|c| c.clinic.id == hub.id).unwrap();
        assert_eq!(listed_hub.spoke_clinics.len(), 2);
        let standalone = all.iter().find(|c| c.clinic.name == "Standalone").unwrap();
        assert!(standalone.hub_clinic.is_none());
        assert!(
            all.iter()
                .filter(|c| c.clinic.name.starts_with("Spoke"))
                .all(|c| c.hub_clinic.as_ref().map(|h| &h.id) == Some(&hub.id))
        );
    }

    #[tokio::test]
    async fn hub_cannot_reference_hub() {
        let store = store().await;
        let hub = hub(&store).await;
        let err = store
            .create_clinic(new_clinic("Second hub", ClinicType::Level2, Some(&hub.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "{err}");
    }

    #[tokio::test]
    async fn spoke_must_reference_existing_level2() {
        let store = store().await;
        let err = store
            .create_clinic(new_clinic(
                "Orphan",
                ClinicType::Level1,
                Some(&ClinicId::from("missing")),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let spoke = store
            .create_clinic(new_clinic("Spoke", ClinicType::Level1, None))
            .await
            .unwrap();
        let err = store
            .create_clinic(new_clinic("Spoke of spoke", ClinicType::Level1, Some(&spoke.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref m) if m.contains("LEVEL2")));
        assert_eq!(store.clinic_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn blank_name_rejected() {
        let store = store().await;
        let err = store
            .create_clinic(new_clinic("   ", ClinicType::Level2, None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_clinic_is_none() {
        let store = store().await;
        let id = ClinicId::from("nope");
        assert!(store.clinic(&id).await.unwrap().is_none());
        assert!(store.clinic_with_links(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn first_hub_skips_spokes() {
        let store = store().await;
        assert!(store.first_hub().await.unwrap().is_none());
        store
            .create_clinic(new_clinic("Spoke", ClinicType::Level1, None))
            .await
            .unwrap();
        let hub = hub(&store).await;
        let first = store.first_hub().await.unwrap().unwrap();
        assert_eq!(first.clinic.id, hub.id);
        assert_eq!(store.clinic_count().await.unwrap(), 2);
    }
}
