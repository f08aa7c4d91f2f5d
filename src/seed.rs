//! Demo data for a fresh database: one hub, one spoke, a specialist at the
//! hub, a nurse at the spoke and a patient registered at each clinic.

use std::fmt;

use fertihub_llm::ProviderKind;
use fertihub_store::{
    Clinic, ClinicType, NewClinic, NewPatient, NewStaff, SqliteStore, StoreError,
};
use serde_json::{Value, json};

const DEMO_PASSWORD: &str = "password123";

#[derive(Debug)]
pub enum SeedReport {
    /// The database already had clinics; nothing was inserted.
    Skipped { existing_clinics: u64 },
    Seeded {
        hub: Clinic,
        spoke: Clinic,
        staff: usize,
        patients: usize,
    },
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped { existing_clinics } => write!(
                f,
                "database already holds {existing_clinics} clinic(s); seed skipped"
            ),
            Self::Seeded {
                hub,
                spoke,
                staff,
                patients,
            } => {
                writeln!(f, "seeded demo data:")?;
                writeln!(f, "  hub:   {} ({})", hub.name, hub.id)?;
                writeln!(f, "  spoke: {} ({})", spoke.name, spoke.id)?;
                write!(f, "  {staff} staff, {patients} patients")
            }
        }
    }
}

fn intake(chief_complaint: &str) -> Value {
    json!({
        "chiefComplaint": chief_complaint,
        "historyPresent": [],
        "history": {},
    })
}

/// Insert the demo records unless the database already has clinics.
///
/// # Errors
///
/// Returns an error if any insert fails.
pub async fn run(store: &SqliteStore) -> Result<SeedReport, StoreError> {
    let existing_clinics = store.clinic_count().await?;
    if existing_clinics > 0 {
        tracing::info!(existing_clinics, "skipping seed");
        return Ok(SeedReport::Skipped { existing_clinics });
    }

    let hub = store
        .create_clinic(NewClinic {
            name: "Hub Fertility Center".into(),
            clinic_type: ClinicType::Level2,
            location: "Mumbai, Maharashtra".into(),
            ai_provider: ProviderKind::Groq,
            ai_api_key: None,
            hub_clinic_id: None,
        })
        .await?;

    let spoke = store
        .create_clinic(NewClinic {
            name: "Rural Fertility Clinic".into(),
            clinic_type: ClinicType::Level1,
            location: "Pune, Maharashtra".into(),
            ai_provider: ProviderKind::Gemini,
            ai_api_key: None,
            hub_clinic_id: Some(hub.id.clone()),
        })
        .await?;

    let staff = [
        NewStaff {
            name: "Dr. Anjali Sharma".into(),
            role: "Fertility Specialist".into(),
            email: "anjali@hubclinic.com".into(),
            password: DEMO_PASSWORD.into(),
            clinic_id: hub.id.clone(),
        },
        NewStaff {
            name: "Nurse Priya Patel".into(),
            role: "Nurse".into(),
            email: "priya@spokeclinic.com".into(),
            password: DEMO_PASSWORD.into(),
            clinic_id: spoke.id.clone(),
        },
    ];
    let staff_count = staff.len();
    for member in staff {
        store.create_staff(member).await?;
    }

    let patients = [
        NewPatient {
            mrn: "P001".into(),
            name: "Sunita Desai".into(),
            age: 32,
            phone: "+91 98765 43210".into(),
            location: "Pune, Maharashtra".into(),
            medical_history: intake("Primary infertility for 2 years"),
            clinic_id: spoke.id.clone(),
        },
        NewPatient {
            mrn: "P002".into(),
            name: "Meera Reddy".into(),
            age: 28,
            phone: "+91 98765 43211".into(),
            location: "Mumbai, Maharashtra".into(),
            medical_history: intake("Secondary infertility for 1 year"),
            clinic_id: hub.id.clone(),
        },
    ];
    let patient_count = patients.len();
    for patient in patients {
        store.create_patient(patient).await?;
    }

    tracing::info!(hub = %hub.id, spoke = %spoke.id, "demo data seeded");
    Ok(SeedReport::Seeded {
        hub,
        spoke,
        staff: staff_count,
        patients: patient_count,
    })
}
