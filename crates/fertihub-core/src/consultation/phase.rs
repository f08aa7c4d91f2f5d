use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::ConsultationError;

/// One of the five fixed stages of the consultation wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    ChiefComplaint,
    SystematicHistory,
    PatientProfile,
    InvestigationPlan,
    TreatmentPlan,
}

impl Phase {
    pub const ALL: [Self; 5] = [
        Self::ChiefComplaint,
        Self::SystematicHistory,
        Self::PatientProfile,
        Self::InvestigationPlan,
        Self::TreatmentPlan,
    ];

    /// Wire name used by the wizard.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChiefComplaint => "chiefComplaint",
            Self::SystematicHistory => "systematicHistory",
            Self::PatientProfile => "patientProfile",
            Self::InvestigationPlan => "investigationPlan",
            Self::TreatmentPlan => "treatmentPlan",
        }
    }

    #[must_use]
    pub fn max_tokens(self) -> u32 {
        match self {
            Self::ChiefComplaint => 1000,
            Self::SystematicHistory | Self::InvestigationPlan => 1500,
            Self::PatientProfile | Self::TreatmentPlan => 2000,
        }
    }

    /// Phases whose answer must come back as a structured JSON document.
    #[must_use]
    pub fn expects_json(self) -> bool {
        matches!(
            self,
            Self::PatientProfile | Self::InvestigationPlan | Self::TreatmentPlan
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Phase {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ConsultationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ConsultationError::InvalidPhase(s.to_owned()))
    }
}
