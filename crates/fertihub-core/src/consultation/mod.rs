//! Five-phase consultation pipeline on top of an [`LlmProvider`].
//!
//! Every call yields a [`ConsultationOutcome`] that records whether the data
//! came from the provider or from the static fallback for the phase, so a
//! failing vendor is never indistinguishable from a working one.

pub mod fallback;
mod phase;
pub mod prompt;
pub mod types;

use fertihub_llm::{ChatOptions, LlmError, LlmProvider, Message, extract_json_object};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use phase::Phase;
use types::{InvestigationPlan, PatientData, PatientProfile, TreatmentPlan};

#[derive(Debug, thiserror::Error)]
pub enum ConsultationError {
    #[error("invalid phase: {0:?}")]
    InvalidPhase(String),

    #[error("invalid patient data: {0}")]
    InvalidPatientData(String),

    #[error("{provider} request failed: {source}")]
    Provider {
        provider: String,
        #[source]
        source: LlmError,
    },

    #[error("{provider} returned an unusable {document}: {reason}")]
    Malformed {
        provider: String,
        document: &'static str,
        reason: String,
    },

    #[error("failed to encode consultation result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ConsultationError {
    /// Errors caused by the vendor rather than by the caller or by us.
    #[must_use]
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::Malformed { .. })
    }
}

/// Where a phase result came from.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum ConsultationOutcome {
    Provider {
        provider: String,
        phase: Phase,
        data: Value,
    },
    Fallback {
        provider: String,
        phase: Phase,
        reason: String,
        data: Value,
    },
}

impl ConsultationOutcome {
    #[must_use]
    pub fn data(&self) -> &Value {
        match self {
            Self::Provider { data, .. } | Self::Fallback { data, .. } => data,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

pub struct ConsultationService<P> {
    provider: P,
    fallback_enabled: bool,
}

impl<P: LlmProvider> ConsultationService<P> {
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            fallback_enabled: true,
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    /// Run one consultation phase over the wizard's `patient_data`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsultationError::InvalidPatientData`] when the payload is not
    /// a JSON object of the expected shape, and provider errors when fallback
    /// is disabled.
    pub async fn run(
        &self,
        phase: Phase,
        patient_data: &Value,
    ) -> Result<ConsultationOutcome, ConsultationError> {
        if !patient_data.is_object() {
            return Err(ConsultationError::InvalidPatientData(
                "patientData must be a JSON object".into(),
            ));
        }
        let data: PatientData = serde_json::from_value(patient_data.clone())
            .map_err(|e| ConsultationError::InvalidPatientData(e.to_string()))?;
        let provider = self.provider.name().to_owned();

        tracing::info!(%phase, %provider, "running consultation phase");

        match self.ask(phase, patient_data, &data).await {
            Ok(data) => Ok(ConsultationOutcome::Provider {
                provider,
                phase,
                data,
            }),
            Err(e) if self.fallback_enabled && e.is_provider_failure() => {
                tracing::warn!(%phase, %provider, "serving fallback payload: {e}");
                Ok(ConsultationOutcome::Fallback {
                    provider,
                    phase,
                    reason: e.to_string(),
                    data: fallback_for(phase, &data)?,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn ask(
        &self,
        phase: Phase,
        raw: &Value,
        data: &PatientData,
    ) -> Result<Value, ConsultationError> {
        let prompt = match phase {
            Phase::ChiefComplaint | Phase::SystematicHistory | Phase::PatientProfile => {
                prompt::build(phase, &[("Patient Data", raw)])
            }
            Phase::InvestigationPlan => prompt::build(phase, &[("Patient Profile", raw)]),
            Phase::TreatmentPlan => {
                let results = data.investigation_results.clone().unwrap_or(Value::Null);
                let profile = data.patient_profile.clone().unwrap_or(Value::Null);
                prompt::build(
                    phase,
                    &[
                        ("Investigation Results", &results),
                        ("Patient Profile", &profile),
                    ],
                )
            }
        };

        let mut options = ChatOptions::with_max_tokens(phase.max_tokens());
        if phase.expects_json() {
            options = options.json();
        }

        let reply = self
            .provider
            .chat(&[Message::user(prompt)], &options)
            .await
            .map_err(|source| ConsultationError::Provider {
                provider: self.provider.name().to_owned(),
                source,
            })?;

        let value = match phase {
            Phase::ChiefComplaint => {
                let mut summary = fallback::chief_complaint(data);
                summary.analysis = Some(reply.trim().to_owned());
                serde_json::to_value(summary)?
            }
            Phase::SystematicHistory => {
                let mut summary = fallback::systematic_history(data);
                summary.analysis = Some(reply.trim().to_owned());
                serde_json::to_value(summary)?
            }
            Phase::PatientProfile => {
                serde_json::to_value(self.parse_document::<PatientProfile>(&reply, "patient profile")?)?
            }
            Phase::InvestigationPlan => serde_json::to_value(
                self.parse_document::<InvestigationPlan>(&reply, "investigation plan")?,
            )?,
            Phase::TreatmentPlan => serde_json::to_value(
                self.parse_document::<TreatmentPlan>(&reply, "treatment plan")?,
            )?,
        };
        Ok(value)
    }

    fn parse_document<T: DeserializeOwned>(
        &self,
        reply: &str,
        document: &'static str,
    ) -> Result<T, ConsultationError> {
        let malformed = |reason: String| ConsultationError::Malformed {
            provider: self.provider.name().to_owned(),
            document,
            reason,
        };
        let json = extract_json_object(reply).ok_or_else(|| malformed("no JSON object".into()))?;
        serde_json::from_str(json).map_err(|e| malformed(e.to_string()))
    }
}

fn fallback_for(phase: Phase, data: &PatientData) -> Result<Value, ConsultationError> {
    let value = match phase {
        Phase::ChiefComplaint => serde_json::to_value(fallback::chief_complaint(data))?,
        Phase::SystematicHistory => serde_json::to_value(fallback::systematic_history(data))?,
        Phase::PatientProfile => serde_json::to_value(fallback::patient_profile(data))?,
        Phase::InvestigationPlan => serde_json::to_value(fallback::investigation_plan())?,
        Phase::TreatmentPlan => serde_json::to_value(fallback::treatment_plan())?,
    };
    Ok(value)
}
