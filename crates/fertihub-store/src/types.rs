use std::fmt;
use std::str::FromStr;

use fertihub_llm::ProviderKind;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::StoreError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Fresh random (v4) identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

uuid_id!(
    /// Strongly typed wrapper for clinic ids.
    ClinicId
);
uuid_id!(
    /// Strongly typed wrapper for staff ids.
    StaffId
);
uuid_id!(
    /// Strongly typed wrapper for patient ids.
    PatientId
);

/// Tier of a clinic in the hub-and-spoke network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClinicType {
    /// Rural spoke clinic.
    #[serde(rename = "LEVEL1")]
    Level1,
    /// Specialist hub clinic.
    #[serde(rename = "LEVEL2")]
    Level2,
}

impl ClinicType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Level1 => "LEVEL1",
            Self::Level2 => "LEVEL2",
        }
    }
}

impl fmt::Display for ClinicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClinicType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LEVEL1" => Ok(Self::Level1),
            "LEVEL2" => Ok(Self::Level2),
            other => Err(StoreError::Corrupt(format!("unknown clinic type {other:?}"))),
        }
    }
}

/// Per-clinic vendor key. Never printed and never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for ApiKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self)
    }
}

#[allow(clippy::ref_option)]
fn serialize_presence<S: Serializer>(key: &Option<ApiKey>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_bool(key.is_some())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Clinic {
    pub id: ClinicId,
    pub name: String,
    #[serde(rename = "type")]
    pub clinic_type: ClinicType,
    pub location: String,
    pub ai_provider: ProviderKind,
    #[serde(rename = "hasAiApiKey", serialize_with = "serialize_presence")]
    pub ai_api_key: Option<ApiKey>,
    pub hub_clinic_id: Option<ClinicId>,
    pub created_at: String,
}

impl Clinic {
    #[must_use]
    pub fn is_hub(&self) -> bool {
        self.clinic_type == ClinicType::Level2
    }
}

/// A clinic together with its hub and spokes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicWithLinks {
    #[serde(flatten)]
    pub clinic: Clinic,
    pub hub_clinic: Option<Clinic>,
    pub spoke_clinics: Vec<Clinic>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClinic {
    pub name: String,
    #[serde(rename = "type")]
    pub clinic_type: ClinicType,
    pub location: String,
    #[serde(default)]
    pub ai_provider: ProviderKind,
    #[serde(default)]
    pub ai_api_key: Option<ApiKey>,
    #[serde(default)]
    pub hub_clinic_id: Option<ClinicId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: StaffId,
    pub name: String,
    pub role: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub clinic_id: ClinicId,
    pub created_at: String,
}

#[derive(Clone)]
pub struct NewStaff {
    pub name: String,
    pub role: String,
    pub email: String,
    pub password: String,
    pub clinic_id: ClinicId,
}

impl fmt::Debug for NewStaff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewStaff")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("clinic_id", &self.clinic_id)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: PatientId,
    pub mrn: String,
    pub name: String,
    pub age: u32,
    pub phone: String,
    pub location: String,
    pub medical_history: Value,
    pub clinic_id: ClinicId,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub mrn: String,
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default = "empty_object")]
    pub medical_history: Value,
    pub clinic_id: ClinicId,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
