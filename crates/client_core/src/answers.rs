use std::collections::{BTreeMap, HashMap};

use shared::{
    domain::CaseId,
    protocol::{BatchedSubmission, SequentialSubmission},
};

/// Where an answer belongs: a named field in the sequential flow, or a
/// question index in one of the two batched lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnswerKey {
    Field(String),
    MultipleChoice(usize),
    FreeText(usize),
}

/// Answers collected for the current case. Blank answers are never stored.
#[derive(Debug, Clone, Default)]
pub struct AnswerSet {
    answers: HashMap<AnswerKey, String>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `text` after trimming. Returns false, and removes any previous
    /// answer, when the trimmed text is empty.
    pub fn record(&mut self, key: AnswerKey, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            self.answers.remove(&key);
            return false;
        }
        self.answers.insert(key, text.to_string());
        true
    }

    pub fn get(&self, key: &AnswerKey) -> Option<&str> {
        self.answers.get(key).map(String::as_str)
    }

    pub fn field(&self, field: &str) -> Option<&str> {
        self.get(&AnswerKey::Field(field.to_string()))
    }

    pub fn contains(&self, key: &AnswerKey) -> bool {
        self.answers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    /// Keys in `required` that have no recorded answer.
    pub fn missing<'a>(&self, required: &'a [AnswerKey]) -> Vec<&'a AnswerKey> {
        required.iter().filter(|key| !self.contains(key)).collect()
    }

    pub fn to_sequential(&self, case_id: CaseId) -> SequentialSubmission {
        let answers = self
            .answers
            .iter()
            .filter_map(|(key, value)| match key {
                AnswerKey::Field(field) => Some((field.clone(), value.clone())),
                _ => None,
            })
            .collect();
        SequentialSubmission { answers, case_id }
    }

    pub fn to_batched(&self, case_id: CaseId) -> BatchedSubmission {
        let mut mc_answers = BTreeMap::new();
        let mut ft_answers = BTreeMap::new();
        for (key, value) in &self.answers {
            match key {
                AnswerKey::MultipleChoice(index) => {
                    mc_answers.insert(index.to_string(), value.clone());
                }
                AnswerKey::FreeText(index) => {
                    ft_answers.insert(index.to_string(), value.clone());
                }
                AnswerKey::Field(_) => {}
            }
        }
        BatchedSubmission {
            mc_answers,
            ft_answers,
            case_id,
        }
    }
}
