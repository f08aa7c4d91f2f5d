//! Static per-phase payloads returned when the provider cannot answer.

use super::types::{
    CareLevel, ChiefComplaintSummary, CumulativeSuccessRate, FertilityScore, Intervention,
    Investigation, InvestigationPlan, Level2Referral, PatientData, PatientProfile,
    ProjectedOutcome, RiskFactors, SystematicHistorySummary, TimeToConception, TreatmentPhase,
    TreatmentPlan, TreatmentPlanBody, TryingDuration, Urgency,
};

const DEFAULT_AGE: u32 = 30;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

#[must_use]
pub fn chief_complaint(data: &PatientData) -> ChiefComplaintSummary {
    ChiefComplaintSummary {
        chief_complaint: data.chief_complaint.clone(),
        trying_duration: TryingDuration {
            value: 12,
            unit: "months".into(),
        },
        history_present: data.history_present.clone(),
        analysis: None,
    }
}

#[must_use]
pub fn systematic_history(data: &PatientData) -> SystematicHistorySummary {
    SystematicHistorySummary {
        menstrual_history: data.menstrual_history.clone(),
        obstetric_history: data.obstetric_history.clone(),
        medical_history: data.medical_history.clone(),
        family_history: data.family_history.clone(),
        social_history: data.social_history.clone(),
        analysis: None,
    }
}

#[must_use]
pub fn patient_profile(data: &PatientData) -> PatientProfile {
    let age = data.recorded_age().unwrap_or(DEFAULT_AGE);
    PatientProfile {
        summary: format!(
            "Patient is a {age} year old female presenting with {}.",
            data.chief_complaint
        ),
        age,
        trying_duration: "12 months".into(),
        risk_factors: RiskFactors {
            modifiable: strings(&["Weight management", "Stress reduction"]),
            non_modifiable: strings(&["Age", "Family history of early menopause"]),
        },
        fertility_score: FertilityScore {
            overall: 75.0,
            age_factor_score: 80.0,
            ovarian_reserve_score: 70.0,
            uterine_factor: 85.0,
            male_factor: 75.0,
        },
        key_concerns: strings(&["Ovulatory dysfunction", "Tubal factor", "Male factor"]),
        estimated_time_to_conception: TimeToConception {
            with_treatment: "6-12 months".into(),
            confidence: "High".into(),
        },
    }
}

#[must_use]
pub fn investigation_plan() -> InvestigationPlan {
    InvestigationPlan {
        investigations: vec![
            Investigation {
                test: "Transvaginal USG".into(),
                priority: 1,
                indication: "Ovarian reserve assessment".into(),
                timing: "Any cycle day".into(),
                expected_findings: "AFC, ovarian volume, antral follicles".into(),
                level: CareLevel::Level1,
            },
            Investigation {
                test: "Day 2-3 Hormone Panel (FSH, LH, E2, AMH)".into(),
                priority: 2,
                indication: "Ovarian reserve and function".into(),
                timing: "Cycle days 2-3".into(),
                expected_findings: "FSH <10, AMH >1.1 ng/mL".into(),
                level: CareLevel::Level1,
            },
            Investigation {
                test: "Husband's Semen Analysis".into(),
                priority: 3,
                indication: "Male factor evaluation".into(),
                timing: "Anytime".into(),
                expected_findings: "Normal parameters per WHO 2010".into(),
                level: CareLevel::Level1,
            },
        ],
        requires_hub_review: false,
        urgency_level: Urgency::Routine,
    }
}

#[must_use]
pub fn treatment_plan() -> TreatmentPlan {
    TreatmentPlan {
        treatment_plan: TreatmentPlanBody {
            phase1: TreatmentPhase {
                duration: "3 cycles".into(),
                interventions: vec![Intervention {
                    intervention: "Letrozole 2.5mg".into(),
                    details: "From cycle day 3-7, timed intercourse".into(),
                    monitoring: "Follicular monitoring via USG".into(),
                    success_probability: 0.15,
                }],
            },
            escalation_criteria: strings(&[
                "Failure to conceive after 3 cycles",
                "Poor response to ovulation induction",
            ]),
            level2_referral: Level2Referral {
                required: false,
                timing: "After 3 cycles of ovulation induction".into(),
                indications: Vec::new(),
            },
        },
        projected_outcome: ProjectedOutcome {
            cumulative_success_rate: CumulativeSuccessRate {
                three_months: 0.15,
                six_months: 0.25,
                twelve_months: 0.35,
            },
            confidence_interval: "70%".into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn chief_complaint_echoes_input() {
        let data = PatientData {
            chief_complaint: "Primary infertility for 2 years".into(),
            history_present: vec![json!({"symptom": "dysmenorrhea"})],
            ..PatientData::default()
        };
        let out = chief_complaint(&data);
        assert_eq!(out.chief_complaint, "Primary infertility for 2 years");
        assert_eq!(out.history_present, data.history_present);
        assert_eq!(out.trying_duration.value, 12);
        assert!(out.analysis.is_none());
    }

    #[test]
    fn profile_uses_recorded_age() {
        let data = PatientData {
            chief_complaint: "irregular periods".into(),
            medical_history: json!({"age": 36}),
            ..PatientData::default()
        };
        let profile = patient_profile(&data);
        assert_eq!(profile.age, 36);
        assert_eq!(
            profile.summary,
            "Patient is a 36 year old female presenting with irregular periods."
        );
    }

    #[test]
    fn profile_defaults_age_to_thirty() {
        let profile = patient_profile(&PatientData::default());
        assert_eq!(profile.age, 30);
        assert!((profile.fertility_score.overall - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn investigation_fallback_is_routine_level1() {
        let plan = investigation_plan();
        assert_eq!(plan.investigations.len(), 3);
        assert!(plan.investigations.iter().all(|i| i.level == CareLevel::Level1));
        assert_eq!(plan.urgency_level, Urgency::Routine);
        assert!(!plan.requires_hub_review);
    }

    #[test]
    fn treatment_fallback_serializes_month_keys() {
        let v = serde_json::to_value(treatment_plan()).unwrap();
        assert_eq!(
            v["projectedOutcome"]["cumulativeSuccessRate"]["12months"].as_f64(),
            Some(0.35)
        );
        assert_eq!(v["treatmentPlan"]["level2Referral"]["required"], false);
    }
}
