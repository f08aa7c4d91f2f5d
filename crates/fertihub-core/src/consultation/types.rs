//! Request-scoped consultation payloads exchanged with the wizard.
//!
//! Nothing here is persisted. The three planning documents are what the LLM
//! must return; a response that does not deserialize into them is treated as
//! a provider failure.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Treat an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Intake data collected by the wizard.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientData {
    #[serde(deserialize_with = "null_as_default")]
    pub chief_complaint: String,
    #[serde(deserialize_with = "null_as_default")]
    pub history_present: Vec<Value>,
    pub menstrual_history: Value,
    pub obstetric_history: Value,
    pub medical_history: Value,
    pub family_history: Value,
    pub social_history: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investigation_results: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_profile: Option<Value>,
}

impl PatientData {
    /// Age recorded under `medicalHistory.age`, as a number or numeric string.
    #[must_use]
    pub fn recorded_age(&self) -> Option<u32> {
        let age = self.medical_history.get("age")?;
        age.as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .or_else(|| age.as_str().and_then(|s| s.trim().parse().ok()))
            .filter(|&n| n > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TryingDuration {
    pub value: u32,
    pub unit: String,
}

/// Result of the chief-complaint phase: the intake fields plus the model's notes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChiefComplaintSummary {
    pub chief_complaint: String,
    pub trying_duration: TryingDuration,
    pub history_present: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
}

/// Result of the systematic-history phase.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystematicHistorySummary {
    pub menstrual_history: Value,
    pub obstetric_history: Value,
    pub medical_history: Value,
    pub family_history: Value,
    pub social_history: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub summary: String,
    pub age: u32,
    pub trying_duration: String,
    pub risk_factors: RiskFactors,
    pub fertility_score: FertilityScore,
    pub key_concerns: Vec<String>,
    pub estimated_time_to_conception: TimeToConception,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactors {
    pub modifiable: Vec<String>,
    pub non_modifiable: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FertilityScore {
    pub overall: f64,
    pub age_factor_score: f64,
    pub ovarian_reserve_score: f64,
    pub uterine_factor: f64,
    pub male_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeToConception {
    pub with_treatment: String,
    pub confidence: String,
}

/// Which tier of the network can perform an investigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum CareLevel {
    #[serde(rename = "LEVEL1")]
    Level1,
    #[serde(rename = "LEVEL2")]
    Level2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Routine,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationPlan {
    pub investigations: Vec<Investigation>,
    pub requires_hub_review: bool,
    pub urgency_level: Urgency,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Investigation {
    pub test: String,
    pub priority: u32,
    pub indication: String,
    pub timing: String,
    pub expected_findings: String,
    pub level: CareLevel,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentPlan {
    pub treatment_plan: TreatmentPlanBody,
    pub projected_outcome: ProjectedOutcome,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentPlanBody {
    pub phase1: TreatmentPhase,
    pub escalation_criteria: Vec<String>,
    pub level2_referral: Level2Referral,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TreatmentPhase {
    pub duration: String,
    pub interventions: Vec<Intervention>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Intervention {
    pub intervention: String,
    pub details: String,
    pub monitoring: String,
    pub success_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Level2Referral {
    pub required: bool,
    pub timing: String,
    pub indications: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedOutcome {
    pub cumulative_success_rate: CumulativeSuccessRate,
    pub confidence_interval: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CumulativeSuccessRate {
    #[serde(rename = "3months")]
    pub three_months: f64,
    #[serde(rename = "6months")]
    pub six_months: f64,
    #[serde(rename = "12months")]
    pub twelve_months: f64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn patient_data_tolerates_missing_sections() {
        let data: PatientData =
            serde_json::from_value(json!({"chiefComplaint": "Irregular cycles"})).unwrap();
        assert_eq!(data.chief_complaint, "Irregular cycles");
        assert!(data.history_present.is_empty());
        assert!(data.medical_history.is_null());
        assert!(data.investigation_results.is_none());
    }

    #[test]
    fn patient_data_treats_null_as_empty() {
        let data: PatientData = serde_json::from_value(json!({
            "chiefComplaint": null,
            "historyPresent": null,
            "medicalHistory": null
        }))
        .unwrap();
        assert_eq!(data.chief_complaint, "");
        assert!(data.history_present.is_empty());
        assert!(data.medical_history.is_null());
    }

    #[test]
    fn patient_data_rejects_non_object() {
        assert!(serde_json::from_value::<PatientData>(json!("just text")).is_err());
    }

    #[test]
    fn recorded_age_reads_number_or_string() {
        let mut data = PatientData {
            medical_history: json!({"age": 34}),
            ..PatientData::default()
        };
        assert_eq!(data.recorded_age(), Some(34));

        data.medical_history = json!({"age": "29"});
        assert_eq!(data.recorded_age(), Some(29));

        data.medical_history = json!({"age": 0});
        assert_eq!(data.recorded_age(), None);

        data.medical_history = json!({});
        assert_eq!(data.recorded_age(), None);
    }

    #[test]
    fn investigation_plan_parses_wire_format() {
        let plan: InvestigationPlan = serde_json::from_value(json!({
            "investigations": [{
                "test": "HSG",
                "priority": 1,
                "indication": "Tubal patency",
                "timing": "Day 7-10",
                "expectedFindings": "Bilateral spill",
                "level": "LEVEL2"
            }],
            "requiresHubReview": true,
            "urgencyLevel": "URGENT"
        }))
        .unwrap();
        assert_eq!(plan.investigations[0].level, CareLevel::Level2);
        assert_eq!(plan.urgency_level, Urgency::Urgent);
        assert!(plan.requires_hub_review);
    }

    #[test]
    fn investigation_plan_rejects_unknown_level() {
        let result = serde_json::from_value::<InvestigationPlan>(json!({
            "investigations": [{
                "test": "HSG", "priority": 1, "indication": "", "timing": "",
                "expectedFindings": "", "level": "LEVEL3"
            }],
            "requiresHubReview": false,
            "urgencyLevel": "ROUTINE"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn cumulative_success_rate_uses_month_keys() {
        let rate = CumulativeSuccessRate {
            three_months: 0.1,
            six_months: 0.2,
            twelve_months: 0.3,
        };
        let v = serde_json::to_value(&rate).unwrap();
        assert!(v.get("3months").is_some());
        assert!(v.get("12months").is_some());
    }
}
