use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::{CaseId, CaseSection, QuestionId};

/// Reads an explicit `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequentialQuestion {
    pub id: QuestionId,
    pub field: String,
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultipleChoiceQuestion {
    pub question: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeTextQuestion {
    pub question: String,
}

/// A generated patient scenario as returned by `GET /api/simulation/new`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationCase {
    #[serde(default)]
    pub id: CaseId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub patient_info: Map<String, Value>,
    #[serde(default)]
    pub presenting_complaint: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub history: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub examination: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vitals: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions: Vec<SequentialQuestion>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub multiple_choice_questions: Vec<MultipleChoiceQuestion>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub free_text_questions: Vec<FreeTextQuestion>,
    /// Top-level fields outside the known shape, e.g. reference answers
    /// keyed by question field.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SimulationCase {
    /// Key/value entries for one of the mapping sections. The presenting
    /// complaint is a single value and has no entries.
    pub fn section_entries(&self, section: CaseSection) -> Option<&Map<String, Value>> {
        match section {
            CaseSection::PatientInfo => Some(&self.patient_info),
            CaseSection::History => Some(&self.history),
            CaseSection::Examination => Some(&self.examination),
            CaseSection::Vitals => Some(&self.vitals),
            CaseSection::PresentingComplaint => None,
        }
    }

    /// Reference value the case carries for a question field, if any.
    pub fn reference_answer(&self, field: &str) -> Option<&Value> {
        self.extra
            .get(field)
            .filter(|value| !value.is_null() && value.as_str() != Some(""))
    }

    /// Id echoed back on submit. Untagged cases use [`CaseId::default`].
    pub fn submission_id(&self) -> CaseId {
        if self.id.0.trim().is_empty() {
            CaseId::default()
        } else {
            self.id.clone()
        }
    }

    pub fn has_batched_questions(&self) -> bool {
        !self.multiple_choice_questions.is_empty() || !self.free_text_questions.is_empty()
    }
}

/// Body of `POST /api/simulation/submit` for the one-question-at-a-time flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequentialSubmission {
    pub answers: BTreeMap<String, String>,
    pub case_id: CaseId,
}

/// Body of `POST /api/simulation/submit` for the combined form. Answers are
/// keyed by the zero-based question index rendered as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchedSubmission {
    pub mc_answers: BTreeMap<String, String>,
    pub ft_answers: BTreeMap<String, String>,
    pub case_id: CaseId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmitRequest {
    Sequential(SequentialSubmission),
    Batched(BatchedSubmission),
}

impl SubmitRequest {
    pub fn case_id(&self) -> &CaseId {
        match self {
            SubmitRequest::Sequential(body) => &body.case_id,
            SubmitRequest::Batched(body) => &body.case_id,
        }
    }

    pub fn answer_count(&self) -> usize {
        match self {
            SubmitRequest::Sequential(body) => body.answers.len(),
            SubmitRequest::Batched(body) => body.mc_answers.len() + body.ft_answers.len(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionResult {
    #[serde(default)]
    pub id: Option<QuestionId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub question: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub field: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub correct: bool,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultipleChoiceResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub question: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_answer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub correct_answer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub correct: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FreeTextResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub question: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_answer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ideal_answer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub matched_concepts: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub missing_concepts: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DifferentialDiagnosis {
    #[serde(default, deserialize_with = "null_as_default")]
    pub diagnosis: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Scoring payload returned by `POST /api/simulation/submit`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions: Vec<QuestionResult>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mc_results: Vec<MultipleChoiceResult>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ft_results: Vec<FreeTextResult>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub differential_diagnoses: Vec<DifferentialDiagnosis>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub differential_topic: Option<String>,
}

impl SimulationResult {
    /// The confirmed diagnosis. Some servers only name it as the case topic.
    pub fn confirmed_diagnosis(&self) -> Option<&str> {
        [&self.diagnosis, &self.topic]
            .into_iter()
            .filter_map(|value| value.as_deref())
            .find(|value| !value.trim().is_empty())
    }
}
