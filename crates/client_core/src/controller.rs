//! Case flow: load a case, collect answers, submit, show the score.
//!
//! The controller is the only writer of the [`ViewModel`]. Each network round
//! trip is split into a `begin_*` step that updates the model synchronously
//! and a `complete_*` step that applies the response, so a front end can
//! render the in-flight state in between. The `load_new_case` and `submit`
//! helpers run both halves back to back.

use std::sync::Arc;

use shared::{
    domain::{CaseSection, PresentationMode},
    protocol::{SimulationCase, SimulationResult, SubmitRequest},
};
use tracing::{debug, error, info, warn};

use crate::{
    answers::AnswerKey,
    error::{ApiFailure, FlowError},
    hooks::{Collaborators, Notification},
    model::{ContentArea, Phase, Presentation, Transition, ViewModel},
    render::{self, LOAD_FAILED_MESSAGE},
    view::{Action, Node},
    SimulationApi,
};

const SUBMIT_FAILED_MESSAGE: &str = "An error occurred submitting your answers";
const EMPTY_ANSWER_MESSAGE: &str = "Please provide an answer";
const INCOMPLETE_MESSAGE: &str = "Please answer all questions";
const NO_QUESTIONS_MESSAGE: &str = "This case has no questions to answer";
/// Points shown when the server returned no usable score.
const FALLBACK_POINTS: u32 = 50;

#[derive(Debug, Clone, Copy, Default)]
pub struct FlowOptions {
    pub presentation: PresentationMode,
}

/// Result of answering the current sequential question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    Advanced { index: usize },
    /// The last question was answered; the answer set is ready to submit.
    ReadyToSubmit,
    Submitted { score: f64 },
}

pub fn points_for_score(score: f64) -> u32 {
    if score > 0.0 {
        score.round() as u32
    } else {
        FALLBACK_POINTS
    }
}

pub struct CaseFlowController {
    api: Arc<dyn SimulationApi>,
    hooks: Arc<dyn Collaborators>,
    options: FlowOptions,
    model: ViewModel,
}

impl CaseFlowController {
    pub fn new(
        api: Arc<dyn SimulationApi>,
        hooks: Arc<dyn Collaborators>,
        options: FlowOptions,
    ) -> Self {
        Self {
            api,
            hooks,
            options,
            model: ViewModel::new(),
        }
    }

    pub fn model(&self) -> &ViewModel {
        &self.model
    }

    pub fn phase(&self) -> Phase {
        self.model.phase
    }

    pub fn api(&self) -> Arc<dyn SimulationApi> {
        Arc::clone(&self.api)
    }

    /// Declarative view of the current state.
    pub fn view(&self) -> Node {
        render::render_page(&self.model)
    }

    fn ensure_phase(&self, expected: Phase, action: &'static str) -> Result<(), FlowError> {
        if self.model.phase == expected {
            Ok(())
        } else {
            Err(FlowError::WrongPhase {
                action,
                phase: self.model.phase.label(),
            })
        }
    }

    fn reject(&self, message: &str) -> FlowError {
        self.hooks.notify(&Notification::error(message));
        FlowError::Validation(message.to_string())
    }

    pub async fn load_new_case(&mut self) -> Result<(), FlowError> {
        self.begin_load();
        let response = self.api.new_case().await;
        self.complete_load(response)
    }

    /// Clears the previous attempt and shows the loading placeholder.
    pub fn begin_load(&mut self) {
        info!("simulation: loading new case");
        self.model.reset_for_load();
    }

    pub fn complete_load(
        &mut self,
        response: Result<SimulationCase, ApiFailure>,
    ) -> Result<(), FlowError> {
        match response {
            Ok(case) => {
                let presentation = Presentation::resolve(self.options.presentation, &case);
                info!(
                    case_id = %case.id,
                    mode = ?presentation,
                    "simulation: case ready"
                );
                self.model.install_case(case, presentation);
                self.hooks.haptic_feedback();
                self.hooks.replace_icons();
                Ok(())
            }
            Err(failure) => {
                error!(error = %failure, "simulation: failed to load case");
                let message = failure
                    .server_message()
                    .unwrap_or(LOAD_FAILED_MESSAGE)
                    .to_string();
                self.model.content = ContentArea::Error(message);
                self.model.phase = Phase::Idle;
                Err(failure.into())
            }
        }
    }

    pub fn toggle_card(&mut self, section: CaseSection) {
        if !self.model.expanded.remove(&section) {
            self.model.expanded.insert(section);
        }
    }

    /// Records the answer for the current sequential question and advances.
    /// Answering the last question does not submit; see [`Self::answer_current`].
    pub fn record_current(&mut self, text: &str) -> Result<StepOutcome, FlowError> {
        self.ensure_phase(Phase::Presenting, "answering")?;
        if self.model.presentation != Presentation::Sequential {
            return Err(FlowError::WrongPhase {
                action: "answering one question",
                phase: "showing the combined form",
            });
        }
        let index = self.model.current_question;
        let Some(question) = self.model.sequential_questions().get(index) else {
            return Err(FlowError::NoActiveCase);
        };
        let key = AnswerKey::Field(question.field.clone());

        if text.trim().is_empty() {
            return Err(self.reject(EMPTY_ANSWER_MESSAGE));
        }
        self.model.answers.record(key, text);
        debug!(index, "simulation: answer recorded");

        if self.model.is_last_question(index) {
            Ok(StepOutcome::ReadyToSubmit)
        } else {
            self.move_to_next_question();
            Ok(StepOutcome::Advanced {
                index: self.model.current_question,
            })
        }
    }

    /// Records the current answer, then either moves on or submits everything.
    pub async fn answer_current(&mut self, text: &str) -> Result<StepOutcome, FlowError> {
        match self.record_current(text)? {
            StepOutcome::ReadyToSubmit => {
                let score = self.submit().await?.score;
                Ok(StepOutcome::Submitted { score })
            }
            outcome => Ok(outcome),
        }
    }

    /// Slides to the next sequential card. Returns false on the last one.
    pub fn move_to_next_question(&mut self) -> bool {
        let count = self.model.sequential_questions().len();
        let from = self.model.current_question;
        if from + 1 >= count {
            return false;
        }
        let to = from + 1;
        self.model.current_question = to;
        self.model.rendered_cards = self.model.rendered_cards.max(to + 1);
        self.model.transition = Some(Transition { from, to });
        self.hooks.replace_icons();
        true
    }

    /// Ends the slide animation: the old card settles as `prev`.
    pub fn settle_transition(&mut self) {
        self.model.transition = None;
    }

    pub fn select_option(&mut self, question: usize, option: usize) -> Result<(), FlowError> {
        self.ensure_phase(Phase::Presenting, "selecting an option")?;
        let case = self.model.case.as_ref().ok_or(FlowError::NoActiveCase)?;
        let Some(text) = case
            .multiple_choice_questions
            .get(question)
            .and_then(|q| q.options.get(option))
            .cloned()
        else {
            return Err(FlowError::Validation(format!(
                "no option {option} for multiple choice question {question}"
            )));
        };
        self.model
            .answers
            .record(AnswerKey::MultipleChoice(question), &text);
        Ok(())
    }

    pub fn set_free_text(&mut self, question: usize, text: &str) -> Result<(), FlowError> {
        self.ensure_phase(Phase::Presenting, "answering")?;
        let case = self.model.case.as_ref().ok_or(FlowError::NoActiveCase)?;
        if question >= case.free_text_questions.len() {
            return Err(FlowError::Validation(format!(
                "no free text question {question}"
            )));
        }
        self.model.answers.record(AnswerKey::FreeText(question), text);
        Ok(())
    }

    pub async fn submit(&mut self) -> Result<&SimulationResult, FlowError> {
        let request = self.begin_submit()?;
        let response = self.api.submit(&request).await;
        self.complete_submit(response)
    }

    /// Validates the answer set and enters the submitting state.
    pub fn begin_submit(&mut self) -> Result<SubmitRequest, FlowError> {
        self.ensure_phase(Phase::Presenting, "submitting")?;
        let case_id = match &self.model.case {
            Some(case) => case.submission_id(),
            None => return Err(FlowError::NoActiveCase),
        };

        let required = self.model.required_keys();
        if required.is_empty() {
            return Err(self.reject(NO_QUESTIONS_MESSAGE));
        }
        let missing = self.model.answers.missing(&required);
        if !missing.is_empty() {
            warn!(
                missing = missing.len(),
                required = required.len(),
                "simulation: submission blocked, unanswered questions"
            );
            return Err(self.reject(INCOMPLETE_MESSAGE));
        }

        let request = match self.model.presentation {
            Presentation::Sequential => {
                SubmitRequest::Sequential(self.model.answers.to_sequential(case_id))
            }
            Presentation::Batched => SubmitRequest::Batched(self.model.answers.to_batched(case_id)),
        };
        self.model.phase = Phase::Submitting;
        Ok(request)
    }

    pub fn complete_submit(
        &mut self,
        response: Result<SimulationResult, ApiFailure>,
    ) -> Result<&SimulationResult, FlowError> {
        match response {
            Ok(result) => {
                info!(score = result.score, "simulation: showing results");
                self.model.transition = None;
                self.model.phase = Phase::ShowingResults;
                self.hooks.replace_icons();
                self.hooks.haptic_feedback();
                if self.hooks.is_logged_in() {
                    self.hooks.award_points(points_for_score(result.score));
                }
                Ok(self.model.result.insert(result))
            }
            Err(failure) => {
                error!(error = %failure, "simulation: submission failed");
                let message = failure
                    .server_message()
                    .unwrap_or(SUBMIT_FAILED_MESSAGE)
                    .to_string();
                self.hooks.notify(&Notification::error(message));
                self.model.phase = Phase::Presenting;
                Err(failure.into())
            }
        }
    }

    /// Runs the action attached to an interactive view node. `input` carries
    /// the text of the bound field for [`Action::AnswerCurrent`].
    pub async fn perform(&mut self, action: Action, input: &str) -> Result<(), FlowError> {
        match action {
            Action::NewCase => self.load_new_case().await,
            Action::ToggleCard(section) => {
                self.toggle_card(section);
                Ok(())
            }
            Action::AnswerCurrent => self.answer_current(input).await.map(|_| ()),
            Action::SelectOption { question, option } => self.select_option(question, option),
            Action::SubmitAnswers => self.submit().await.map(|_| ()),
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
