use serde_json::Value;

use super::Phase;

const PERSONA: &str = "You are an expert fertility specialist AI assistant.";

const JSON_INSTRUCTION: &str = "Respond with a single JSON object only, using exactly the field names \
shown in the schema below. Do not wrap it in markdown.";

/// Build the single user prompt sent for `phase`.
///
/// `sections` are the labelled JSON documents embedded in the prompt, e.g.
/// `("Patient Data", &data)`.
#[must_use]
pub fn build(phase: Phase, sections: &[(&str, &Value)]) -> String {
    let mut prompt = format!("{PERSONA} {}\n", task(phase));

    for (label, value) in sections {
        let rendered =
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        prompt.push_str(&format!("\n{label}:\n{rendered}\n"));
    }

    prompt.push_str("\nPlease provide a structured response with:\n");
    for (i, item) in requested_items(phase).iter().enumerate() {
        prompt.push_str(&format!("{}. {item}\n", i + 1));
    }

    if let Some(schema) = response_schema(phase) {
        prompt.push_str(&format!("\n{JSON_INSTRUCTION}\n{schema}\n"));
    }
    prompt
}

fn task(phase: Phase) -> &'static str {
    match phase {
        Phase::ChiefComplaint => {
            "Process the chief complaint and history of present illness."
        }
        Phase::SystematicHistory => "Process the systematic history.",
        Phase::PatientProfile => "Generate a comprehensive patient profile.",
        Phase::InvestigationPlan => {
            "Generate an investigation plan based on the patient profile."
        }
        Phase::TreatmentPlan => {
            "Generate a treatment plan based on investigation results and patient profile."
        }
    }
}

fn requested_items(phase: Phase) -> &'static [&'static str] {
    match phase {
        Phase::ChiefComplaint => &[
            "Chief complaint analysis",
            "Duration of trying to conceive",
            "Key symptoms with timeline",
        ],
        Phase::SystematicHistory => &[
            "Menstrual history analysis",
            "Obstetric history analysis",
            "Medical history analysis",
            "Family history analysis",
            "Social history analysis",
        ],
        Phase::PatientProfile => &[
            "Clinical summary",
            "Age",
            "Trying duration",
            "Risk factors (modifiable and non-modifiable)",
            "Fertility score with breakdown",
            "Key concerns",
            "Estimated time to conception",
        ],
        Phase::InvestigationPlan => &[
            "List of investigations with priority, indication, timing, and expected findings",
            "Whether hub review is required",
            "Urgency level",
        ],
        Phase::TreatmentPlan => &[
            "Treatment plan with phases, interventions, and monitoring",
            "Escalation criteria",
            "Level 2 referral requirements",
            "Projected outcomes with confidence intervals",
        ],
    }
}

fn response_schema(phase: Phase) -> Option<&'static str> {
    match phase {
        Phase::ChiefComplaint | Phase::SystematicHistory => None,
        Phase::PatientProfile => Some(
            r#"{"summary": string, "age": integer, "tryingDuration": string,
 "riskFactors": {"modifiable": [string], "nonModifiable": [string]},
 "fertilityScore": {"overall": number, "ageFactorScore": number, "ovarianReserveScore": number, "uterineFactor": number, "maleFactor": number},
 "keyConcerns": [string],
 "estimatedTimeToConception": {"withTreatment": string, "confidence": string}}"#,
        ),
        Phase::InvestigationPlan => Some(
            r#"{"investigations": [{"test": string, "priority": integer, "indication": string, "timing": string, "expectedFindings": string, "level": "LEVEL1" | "LEVEL2"}],
 "requiresHubReview": boolean, "urgencyLevel": "ROUTINE" | "URGENT"}"#,
        ),
        Phase::TreatmentPlan => Some(
            r#"{"treatmentPlan": {"phase1": {"duration": string, "interventions": [{"intervention": string, "details": string, "monitoring": string, "successProbability": number}]},
   "escalationCriteria": [string],
   "level2Referral": {"required": boolean, "timing": string, "indications": [string]}},
 "projectedOutcome": {"cumulativeSuccessRate": {"3months": number, "6months": number, "12months": number}, "confidenceInterval": string}}"#,
        ),
    }
}
