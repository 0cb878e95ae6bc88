//! The single view-model object every render function reads from.

use std::collections::BTreeSet;

use shared::{
    domain::{CaseSection, PresentationMode},
    protocol::{SequentialQuestion, SimulationCase, SimulationResult},
};

use crate::answers::{AnswerKey, AnswerSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Presenting,
    Submitting,
    ShowingResults,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Loading => "loading",
            Phase::Presenting => "showing questions",
            Phase::Submitting => "submitting",
            Phase::ShowingResults => "showing results",
        }
    }
}

/// Concrete presentation chosen for the loaded case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Sequential,
    Batched,
}

impl Presentation {
    pub fn resolve(mode: PresentationMode, case: &SimulationCase) -> Self {
        match mode {
            PresentationMode::Sequential => Presentation::Sequential,
            PresentationMode::Batched => Presentation::Batched,
            PresentationMode::Auto => {
                if case.questions.is_empty() && case.has_batched_questions() {
                    Presentation::Batched
                } else {
                    Presentation::Sequential
                }
            }
        }
    }
}

/// What the case area currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentArea {
    Empty,
    Loading,
    Error(String),
    Case,
}

/// A slide between two sequential question cards that has not settled yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone)]
pub struct ViewModel {
    pub case: Option<SimulationCase>,
    pub presentation: Presentation,
    pub content: ContentArea,
    pub phase: Phase,
    pub current_question: usize,
    /// Sequential cards materialised so far; cards appear lazily.
    pub rendered_cards: usize,
    pub transition: Option<Transition>,
    pub answers: AnswerSet,
    pub expanded: BTreeSet<CaseSection>,
    pub result: Option<SimulationResult>,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewModel {
    pub fn new() -> Self {
        Self {
            case: None,
            presentation: Presentation::Sequential,
            content: ContentArea::Empty,
            phase: Phase::Idle,
            current_question: 0,
            rendered_cards: 0,
            transition: None,
            answers: AnswerSet::new(),
            expanded: BTreeSet::new(),
            result: None,
        }
    }

    /// Drops everything tied to the previous attempt. The last case object is
    /// kept until a replacement arrives.
    pub fn reset_for_load(&mut self) {
        self.current_question = 0;
        self.rendered_cards = 0;
        self.transition = None;
        self.answers.clear();
        self.result = None;
        self.content = ContentArea::Loading;
        self.phase = Phase::Loading;
    }

    pub fn install_case(&mut self, case: SimulationCase, presentation: Presentation) {
        self.presentation = presentation;
        self.rendered_cards = match presentation {
            Presentation::Sequential if !case.questions.is_empty() => 1,
            _ => 0,
        };
        self.expanded = CaseSection::ALL
            .into_iter()
            .filter(|section| section.expanded_by_default())
            .collect();
        self.case = Some(case);
        self.content = ContentArea::Case;
        self.phase = Phase::Presenting;
    }

    pub fn sequential_questions(&self) -> &[SequentialQuestion] {
        self.case
            .as_ref()
            .map(|case| case.questions.as_slice())
            .unwrap_or_default()
    }

    pub fn question_count(&self) -> usize {
        let Some(case) = &self.case else {
            return 0;
        };
        match self.presentation {
            Presentation::Sequential => case.questions.len(),
            Presentation::Batched => {
                case.multiple_choice_questions.len() + case.free_text_questions.len()
            }
        }
    }

    /// Every answer key the active presentation needs before submission.
    pub fn required_keys(&self) -> Vec<AnswerKey> {
        let Some(case) = &self.case else {
            return Vec::new();
        };
        match self.presentation {
            Presentation::Sequential => case
                .questions
                .iter()
                .map(|q| AnswerKey::Field(q.field.clone()))
                .collect(),
            Presentation::Batched => (0..case.multiple_choice_questions.len())
                .map(AnswerKey::MultipleChoice)
                .chain((0..case.free_text_questions.len()).map(AnswerKey::FreeText))
                .collect(),
        }
    }

    pub fn is_last_question(&self, index: usize) -> bool {
        index + 1 == self.sequential_questions().len()
    }

    /// Position classes for sequential card `index`.
    pub fn card_classes(&self, index: usize) -> &'static str {
        match self.transition {
            Some(t) if t.from == index => "slide-out",
            Some(t) if t.to == index => "active slide-in",
            _ if index == self.current_question => "active",
            _ if index < self.current_question => "prev",
            _ => "next",
        }
    }

    pub fn is_expanded(&self, section: CaseSection) -> bool {
        self.expanded.contains(&section)
    }
}
