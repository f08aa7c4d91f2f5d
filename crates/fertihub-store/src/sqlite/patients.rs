use super::{SqliteStore, require};
use crate::error::StoreError;
use crate::types::{ClinicId, NewPatient, Patient, PatientId};

#[derive(sqlx::FromRow)]
struct PatientRow {
    id: String,
    mrn: String,
    name: String,
    age: i64,
    phone: String,
    location: String,
    medical_history: String,
    clinic_id: String,
    created_at: String,
}

impl TryFrom<PatientRow> for Patient {
    type Error = StoreError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let age = u32::try_from(row.age)
            .map_err(|_| StoreError::Corrupt(format!("patient {} has age {}", row.id, row.age)))?;
        let medical_history = serde_json::from_str(&row.medical_history)
            .map_err(|e| StoreError::Corrupt(format!("patient {} history: {e}", row.id)))?;
        Ok(Self {
            id: PatientId(row.id),
            mrn: row.mrn,
            name: row.name,
            age,
            phone: row.phone,
            location: row.location,
            medical_history,
            clinic_id: ClinicId(row.clinic_id),
            created_at: row.created_at,
        })
    }
}

impl SqliteStore {
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for blank fields or an unknown clinic
    /// and [`StoreError::Conflict`] if the MRN is already taken.
    pub async fn create_patient(&self, new: NewPatient) -> Result<Patient, StoreError> {
        require(&new.mrn, "mrn")?;
        require(&new.name, "name")?;

        let id = PatientId::generate();
        let row: PatientRow = sqlx::query_as(
            "INSERT INTO patients (id, mrn, name, age, phone, location, medical_history, clinic_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING id, mrn, name, age, phone, location, medical_history, clinic_id, created_at",
        )
        .bind(&id)
        .bind(new.mrn.trim())
        .bind(new.name.trim())
        .bind(i64::from(new.age))
        .bind(&new.phone)
        .bind(&new.location)
        .bind(new.medical_history.to_string())
        .bind(&new.clinic_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, "patient"))?;

        tracing::info!(patient_id = %id, clinic_id = %new.clinic_id, "patient registered");
        Patient::try_from(row)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn patient(&self, id: &PatientId) -> Result<Option<Patient>, StoreError> {
        let row: Option<PatientRow> = sqlx::query_as(
            "SELECT id, mrn, name, age, phone, location, medical_history, clinic_id, created_at \
             FROM patients WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Patient::try_from).transpose()
    }

    /// All patients, optionally restricted to one clinic.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_patients(
        &self,
        clinic_id: Option<&ClinicId>,
    ) -> Result<Vec<Patient>, StoreError> {
        let rows: Vec<PatientRow> = match clinic_id {
            Some(clinic_id) => {
                sqlx::query_as(
                    "SELECT id, mrn, name, age, phone, location, medical_history, clinic_id, created_at \
                     FROM patients WHERE clinic_id = ? ORDER BY created_at, rowid",
                )
                .bind(clinic_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT id, mrn, name, age, phone, location, medical_history, clinic_id, created_at \
                     FROM patients ORDER BY created_at, rowid",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter().map(Patient::try_from).collect()
    }
}
