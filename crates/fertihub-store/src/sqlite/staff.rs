use super::{SqliteStore, require};
use crate::error::StoreError;
use crate::password::{hash_password, verify_password};
use crate::types::{ClinicId, NewStaff, Staff, StaffId};

#[derive(sqlx::FromRow)]
struct StaffRow {
    id: String,
    name: String,
    role: String,
    email: String,
    password_hash: String,
    clinic_id: String,
    created_at: String,
}

impl From<StaffRow> for Staff {
    fn from(row: StaffRow) -> Self {
        Self {
            id: StaffId(row.id),
            name: row.name,
            role: row.role,
            email: row.email,
            password_hash: row.password_hash,
            clinic_id: ClinicId(row.clinic_id),
            created_at: row.created_at,
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

impl SqliteStore {
    /// Insert a staff member, hashing the password off the async runtime.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for blank fields or an unknown clinic
    /// and [`StoreError::Conflict`] if the email is already registered.
    pub async fn create_staff(&self, new: NewStaff) -> Result<Staff, StoreError> {
        require(&new.name, "name")?;
        require(&new.role, "role")?;
        require(&new.password, "password")?;
        let email = normalize_email(&new.email);
        if !email.contains('@') {
            return Err(StoreError::Validation(format!("invalid email {email:?}")));
        }

        let iterations = self.password_iterations;
        let password = new.password;
        let password_hash =
            tokio::task::spawn_blocking(move || hash_password(&password, iterations))
                .await
                .map_err(|e| StoreError::Password(e.to_string()))?;

        let id = StaffId::generate();
        let row: StaffRow = sqlx::query_as(
            "INSERT INTO staff (id, name, role, email, password_hash, clinic_id) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING id, name, role, email, password_hash, clinic_id, created_at",
        )
        .bind(&id)
        .bind(new.name.trim())
        .bind(new.role.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(&new.clinic_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, "staff member"))?;

        tracing::info!(staff_id = %id, clinic_id = %new.clinic_id, "staff member created");
        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn staff_by_email(&self, email: &str) -> Result<Option<Staff>, StoreError> {
        let row: Option<StaffRow> = sqlx::query_as(
            "SELECT id, name, role, email, password_hash, clinic_id, created_at \
             FROM staff WHERE email = ?",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Staff::from))
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_staff(&self, clinic_id: &ClinicId) -> Result<Vec<Staff>, StoreError> {
        let rows: Vec<StaffRow> = sqlx::query_as(
            "SELECT id, name, role, email, password_hash, clinic_id, created_at \
             FROM staff WHERE clinic_id = ? ORDER BY created_at, rowid",
        )
        .bind(clinic_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Staff::from).collect())
    }

    /// Look up a staff member by email and check the password.
    ///
    /// Returns `None` for an unknown email or a wrong password.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored hash is malformed.
    pub async fn verify_staff_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Staff>, StoreError> {
        let Some(staff) = self.staff_by_email(email).await? else {
            return Ok(None);
        };
        let encoded = staff.password_hash.clone();
        let password = password.to_owned();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &encoded))
            .await
            .map_err(|e| StoreError::Password(e.to_string()))??;
        Ok(valid.then_some(staff))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{hub, store};
    use super::*;

    fn doctor(clinic_id: &ClinicId) -> NewStaff {
        NewStaff {
            name: "Dr. Anjali Sharma".into(),
            role: "Fertility Specialist".into(),
            email: "Anjali@HubClinic.com".into(),
            password: "password123".into(),
            clinic_id: clinic_id.clone(),
        }
    }

    #[tokio::test]
    async fn create_hashes_password_and_normalizes_email() {
        let store = store().await;
        let hub = hub(&store).await;

        let staff = store.create_staff(doctor(&hub.id)).await.unwrap();

        assert_eq!(staff.email, "anjali@hubclinic.com");
        assert!(staff.password_hash.starts_with("pbkdf2-sha256$1000$"));
        assert!(!staff.password_hash.contains("password123"));
    }

    #[tokio::test]
    async fn verify_password_roundtrip() {
        let store = store().await;
        let hub = hub(&store).await;
        store.create_staff(doctor(&hub.id)).await.unwrap();

        let ok = store
            .verify_staff_password("anjali@hubclinic.com", "password123")
            .await
            .unwrap();
        assert_eq!(ok.map(|s| s.name), Some("Dr. Anjali Sharma".to_string()));

        let wrong = store
            .verify_staff_password("anjali@hubclinic.com", "hunter2")
            .await
            .unwrap();
        assert!(wrong.is_none());

        let unknown = store
            .verify_staff_password("nobody@hubclinic.com", "password123")
            .await
            .unwrap();
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = store().await;
        let hub = hub(&store).await;
        store.create_staff(doctor(&hub.id)).await.unwrap();
        let err = store.create_staff(doctor(&hub.id)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "{err}");
    }

    #[tokio::test]
    async fn unknown_clinic_is_validation_error() {
        let store = store().await;
        let err = store
            .create_staff(doctor(&ClinicId::from("missing")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "{err}");
    }

    #[tokio::test]
    async fn list_staff_filters_by_clinic() {
        let store = store().await;
        let hub = hub(&store).await;
        store.create_staff(doctor(&hub.id)).await.unwrap();

        assert_eq!(store.list_staff(&hub.id).await.unwrap().len(), 1);
        assert!(
            store
                .list_staff(&ClinicId::from("other"))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn invalid_email_rejected() {
        let store = store().await;
        let hub = hub(&store).await;
        let mut new = doctor(&hub.id);
        new.email = "not-an-email".into();
        assert!(matches!(
            store.create_staff(new).await.unwrap_err(),
            StoreError::Validation(_)
        ));
    }
}
