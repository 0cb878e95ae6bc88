//! View builders. Each function is a pure projection of the view model.

use serde_json::{Map, Value};
use shared::{
    domain::CaseSection,
    protocol::{SimulationCase, SimulationResult},
};

use crate::{
    answers::AnswerKey,
    format::{format_complaint, format_value, title_case_key},
    model::{ContentArea, Phase, Presentation, ViewModel},
    view::{Action, Button, Element, Icon, Node, RadioOption, Tag, TextInput},
};

/// Scores at or above this count as a pass.
pub const PASS_THRESHOLD: f64 = 70.0;

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load case. Please try again.";

pub fn is_passing(score: f64) -> bool {
    score >= PASS_THRESHOLD
}

/// Whole page: case area, question area and, once scored, the results.
pub fn render_page(model: &ViewModel) -> Node {
    let case_content = match &model.content {
        ContentArea::Empty => Element::div("case-content"),
        ContentArea::Loading => Element::div("case-content").child(Node::Skeleton),
        ContentArea::Error(message) => {
            Element::div("case-content").child(Element::div("alert alert-danger").text(message))
        }
        ContentArea::Case => match &model.case {
            Some(case) => render_case(case, model),
            None => Element::div("case-content"),
        },
    };

    let mut questions = Element::div("question-container");
    if model.content == ContentArea::Case {
        if let Some(case) = &model.case {
            let hidden = model.phase == Phase::ShowingResults;
            match model.presentation {
                Presentation::Sequential => {
                    questions = questions.children(
                        (0..model.rendered_cards.min(case.questions.len()))
                            .map(|index| render_question_card(model, index).hidden(hidden)),
                    );
                }
                Presentation::Batched => {
                    questions = questions.child(render_questions(case, model).hidden(hidden));
                }
            }
            if let (Phase::ShowingResults, Some(result)) = (model.phase, &model.result) {
                questions = questions.child(render_results(result, model));
            }
        }
    }

    Element::div("simulation-container")
        .child(case_content)
        .child(questions)
        .into()
}

fn expandable_card(section: CaseSection, expanded: bool, body: Element) -> Element {
    let state = if expanded { " expanded" } else { "" };
    Element::div("expandable-card")
        .key(format!("card-{section:?}"))
        .child(
            Element::div("card-header")
                .child(Button::new(section.title(), Action::ToggleCard(section)).icon(Icon::ChevronDown))
                .child(Element::new(Tag::Span).class(&format!("toggle-icon{state}"))),
        )
        .child(
            Element::div(&format!("card-body{state}"))
                .hidden(!expanded)
                .child(Element::div("card-content").child(body)),
        )
}

fn info_grid(entries: &Map<String, Value>) -> Element {
    Element::div("info-grid").children(entries.iter().map(|(key, value)| {
        Element::div("info-item")
            .child(Element::div("info-label").text(title_case_key(key)))
            .child(Element::div("info-value").text(format_value(value)))
    }))
}

fn findings_list(entries: &Map<String, Value>) -> Element {
    Element::div("findings-list").children(entries.iter().map(|(key, value)| {
        Element::div("finding-item")
            .child(Element::new(Tag::Strong).text(format!("{}: ", title_case_key(key))))
            .text(format_value(value))
    }))
}

/// The five expandable case cards.
pub fn render_case(case: &SimulationCase, model: &ViewModel) -> Element {
    let cards = CaseSection::ALL.into_iter().map(|section| {
        let body = match section {
            CaseSection::PatientInfo => info_grid(&case.patient_info),
            CaseSection::PresentingComplaint => {
                Element::new(Tag::Paragraph).text(format_complaint(&case.presenting_complaint))
            }
            _ => match case.section_entries(section) {
                Some(entries) => findings_list(entries),
                None => Element::div("findings-list"),
            },
        };
        expandable_card(section, model.is_expanded(section), body)
    });
    Element::div("case-content").children(cards)
}

fn submit_button(model: &ViewModel, label: &str, action: Action) -> Button {
    let mut button = Button::new(label, action);
    if model.phase == Phase::Submitting {
        button.label = "Evaluating...".to_string();
        button.disabled = true;
        button.busy = true;
    }
    button
}

/// One sequential question card. The last card's control reads "Submit",
/// every earlier one "Next".
pub fn render_question_card(model: &ViewModel, index: usize) -> Element {
    let questions = model.sequential_questions();
    let Some(question) = questions.get(index) else {
        return Element::div("question-card");
    };
    let key = AnswerKey::Field(question.field.clone());
    let label = if model.is_last_question(index) {
        "Submit"
    } else {
        "Next"
    };
    let button = if index == model.current_question {
        submit_button(model, label, Action::AnswerCurrent)
    } else {
        Button::new(label, Action::AnswerCurrent)
    };

    Element::div(&format!("question-card {}", model.card_classes(index)))
        .key(format!("question-{}", question.id))
        .child(Element::new(Tag::Heading(3)).text(&question.question))
        .child(Element::div("answer-area").child(TextInput {
            value: model.answers.get(&key).unwrap_or_default().to_string(),
            binding: key,
            placeholder: "Enter your answer...",
            multiline: true,
        }))
        .child(button)
}

fn question_text(index: usize, text: &str) -> Element {
    Element::div("question-text")
        .child(Element::new(Tag::Span).class("question-number").text((index + 1).to_string()))
        .text(format!(" {text}"))
}

/// The combined multiple-choice and free-text form.
pub fn render_questions(case: &SimulationCase, model: &ViewModel) -> Element {
    let mut mc = Element::div("mc-questions-container");
    if case.multiple_choice_questions.is_empty() {
        mc = mc.child(
            Element::div("alert alert-warning").text("No multiple choice questions available."),
        );
    }
    for (index, question) in case.multiple_choice_questions.iter().enumerate() {
        let selected = model.answers.get(&AnswerKey::MultipleChoice(index));
        let options = question.options.iter().enumerate().map(|(opt_index, option)| {
            let checked = selected == Some(option.trim());
            let class = if checked {
                "option-item selected"
            } else {
                "option-item"
            };
            Element::new(Tag::ListItem).class(class).child(RadioOption {
                group: format!("mc-question-{index}"),
                value: option.clone(),
                checked,
                action: Action::SelectOption {
                    question: index,
                    option: opt_index,
                },
            })
        });
        mc = mc.child(
            Element::div("question-item mc-question")
                .key(format!("mc-{index}"))
                .child(question_text(index, &question.question))
                .child(Element::new(Tag::List).class("options-list").children(options)),
        );
    }

    let mut ft = Element::div("ft-questions-container");
    if case.free_text_questions.is_empty() {
        ft = ft.child(Element::div("alert alert-warning").text("No free text questions available."));
    }
    for (index, question) in case.free_text_questions.iter().enumerate() {
        let key = AnswerKey::FreeText(index);
        ft = ft.child(
            Element::div("question-item ft-question")
                .key(format!("ft-{index}"))
                .child(question_text(index, &question.question))
                .child(TextInput {
                    value: model.answers.get(&key).unwrap_or_default().to_string(),
                    binding: key,
                    placeholder: "Type your answer here...",
                    multiline: true,
                }),
        );
    }

    Element::div("questions-form")
        .child(mc)
        .child(ft)
        .child(submit_button(model, "Submit Answers", Action::SubmitAnswers))
}

fn result_header(score: f64) -> Element {
    let (state, icon, title) = if is_passing(score) {
        ("correct", Icon::CheckCircle, "Good job!")
    } else {
        ("incorrect", Icon::XCircle, "Needs improvement")
    };
    Element::div("result-header")
        .child(Element::div(&format!("result-icon {state}")).child(icon))
        .child(Element::new(Tag::Heading(3)).class("result-title").text(title))
}

fn concept_tags(title: &str, concepts: &[String], matched: bool) -> Option<Element> {
    if concepts.is_empty() {
        return None;
    }
    let class = if matched {
        "key-concept matched"
    } else {
        "key-concept"
    };
    Some(
        Element::div("concepts")
            .child(Element::new(Tag::Paragraph).text(title))
            .child(Element::div("key-concepts").children(
                concepts
                    .iter()
                    .map(|concept| Element::new(Tag::Span).class(class).text(concept)),
            )),
    )
}

fn sequential_results(result: &SimulationResult, model: &ViewModel) -> Vec<Element> {
    let case = model.case.as_ref();
    result
        .questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let user_answer = model
                .answers
                .field(&question.field)
                .unwrap_or("No answer provided")
                .to_string();
            let expected = case
                .and_then(|case| case.reference_answer(&question.field))
                .map(format_value)
                .unwrap_or_else(|| "No reference answer available".to_string());

            let mut section = Element::div("results-section")
                .child(
                    Element::new(Tag::Heading(4))
                        .text(format!("Question {}: {}", index + 1, question.question)),
                )
                .child(
                    Element::div("answer-comparison")
                        .child(
                            Element::div("user-answer-box")
                                .child(Element::new(Tag::Heading(5)).text("Your Answer"))
                                .child(Element::new(Tag::Paragraph).text(user_answer)),
                        )
                        .child(
                            Element::div("correct-answer-box")
                                .child(Element::new(Tag::Heading(5)).text("Expected Answer"))
                                .child(Element::new(Tag::Paragraph).text(expected)),
                        ),
                );
            if let Some(feedback) = question.feedback.as_deref().filter(|f| !f.is_empty()) {
                let (state, title) = if question.correct {
                    ("correct", "Feedback: Good answer!")
                } else {
                    ("incorrect", "Feedback: Needs improvement")
                };
                section = section.child(
                    Element::div(&format!("question-result {state}"))
                        .child(Element::new(Tag::Heading(5)).text(title))
                        .child(Element::new(Tag::Paragraph).text(feedback)),
                );
            }
            section
        })
        .collect()
}

fn multiple_choice_results(result: &SimulationResult) -> Option<Element> {
    if result.mc_results.is_empty() {
        return None;
    }
    let items = result.mc_results.iter().enumerate().map(|(index, item)| {
        let state = if item.correct { "correct" } else { "incorrect" };
        let mut answer = Element::div("result-answer")
            .text("Your answer: ")
            .child(Element::new(Tag::Strong).text(&item.user_answer));
        if !item.correct {
            answer = answer
                .text("\nCorrect answer: ")
                .child(Element::new(Tag::Strong).text(&item.correct_answer));
        }
        Element::div(&format!("question-result {state}"))
            .child(
                Element::div("result-question")
                    .text(format!("Question {}: {}", index + 1, item.question)),
            )
            .child(answer)
    });
    Some(
        Element::div("question-results-section mc-results")
            .child(Element::new(Tag::Heading(4)).text("Multiple Choice Questions"))
            .children(items),
    )
}

fn free_text_results(result: &SimulationResult) -> Option<Element> {
    if result.ft_results.is_empty() {
        return None;
    }
    let items = result.ft_results.iter().enumerate().map(|(index, item)| {
        let state = if is_passing(item.score) {
            "correct"
        } else {
            "incorrect"
        };
        Element::div(&format!("question-result {state}"))
            .child(
                Element::div("result-question")
                    .text(format!("Question {}: {}", index + 1, item.question)),
            )
            .child(
                Element::div("result-answer")
                    .text("Your answer: ")
                    .child(Element::new(Tag::Strong).text(&item.user_answer)),
            )
            .child(
                Element::div("result-ideal-answer")
                    .text(format!("Ideal answer: {}", item.ideal_answer)),
            )
            .children(concept_tags(
                "Key concepts identified in your answer:",
                &item.matched_concepts,
                true,
            ))
            .children(concept_tags(
                "Key concepts missing from your answer:",
                &item.missing_concepts,
                false,
            ))
    });
    Some(
        Element::div("question-results-section ft-results")
            .child(Element::new(Tag::Heading(4)).text("Free Text Questions"))
            .children(items),
    )
}

fn diagnosis_section(result: &SimulationResult) -> Element {
    let or_fallback = |value: &Option<String>, fallback: &str| {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(fallback)
            .to_string()
    };

    let mut differentials = Element::div("differential-diagnoses")
        .child(Element::new(Tag::Heading(4)).text("Differential Diagnoses"));
    if result.differential_diagnoses.is_empty() {
        differentials = differentials
            .child(Element::new(Tag::Paragraph).text("No differential diagnoses provided."));
    }
    for differential in &result.differential_diagnoses {
        let mut item = Element::div("differential-item")
            .child(Element::new(Tag::Strong).text(&differential.diagnosis));
        if let Some(reason) = differential.reason.as_deref().filter(|r| !r.is_empty()) {
            item = item.child(Element::new(Tag::Paragraph).text(reason));
        }
        differentials = differentials.child(item);
    }
    if let Some(topic) = result.differential_topic.as_deref().filter(|t| !t.is_empty()) {
        differentials = differentials.child(
            Element::new(Tag::Paragraph)
                .class("differential-topic")
                .text(format!("Consider also: {topic}")),
        );
    }

    Element::div("diagnosis-summary")
        .child(
            Element::div("correct-diagnosis")
                .child(Element::new(Tag::Heading(4)).text("Correct Diagnosis"))
                .child(
                    Element::new(Tag::Paragraph)
                        .text(result.confirmed_diagnosis().unwrap_or("No diagnosis provided.")),
                )
                .child(Element::new(Tag::Heading(4)).text("Diagnostic Reasoning"))
                .child(
                    Element::new(Tag::Paragraph)
                        .text(or_fallback(&result.reasoning, "No reasoning provided.")),
                ),
        )
        .child(differentials)
}

/// Scored summary for a submission, always closed by a "New Case" action.
pub fn render_results(result: &SimulationResult, model: &ViewModel) -> Element {
    let feedback = result
        .feedback
        .as_deref()
        .filter(|f| !f.is_empty())
        .unwrap_or("No feedback available.");

    Element::div("case-results")
        .key("case-results")
        .child(result_header(result.score))
        .child(Element::div("result-score").text(format!("Score: {}/100", result.score)))
        .child(Element::div("result-feedback").text(feedback))
        .children(sequential_results(result, model))
        .children(multiple_choice_results(result))
        .children(free_text_results(result))
        .child(diagnosis_section(result))
        .child(
            Element::div("action-buttons")
                .child(Button::new("New Case", Action::NewCase).icon(Icon::RefreshCw)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loaded(case: serde_json::Value) -> ViewModel {
        let case: SimulationCase = serde_json::from_value(case).expect("case");
        let presentation = Presentation::resolve(Default::default(), &case);
        let mut model = ViewModel::new();
        model.install_case(case, presentation);
        model
    }

    fn result(value: serde_json::Value) -> SimulationResult {
        serde_json::from_value(value).expect("result")
    }

    #[test]
    fn case_cards_follow_section_order_and_default_expansion() {
        let model = loaded(json!({
            "patient_info": {"age": 34, "gender": "female"},
            "presenting_complaint": "Fever for three days",
            "vitals": {"bp": {"systolic": 120, "diastolic": 80}, "heartRate": 96}
        }));
        let page = render_page(&model);
        let cards = page.find_by_class("expandable-card");
        assert_eq!(cards.len(), 5);

        let titles: Vec<String> = page
            .buttons()
            .iter()
            .filter(|b| matches!(b.action, Action::ToggleCard(_)))
            .map(|b| b.label.clone())
            .collect();
        assert_eq!(
            titles,
            [
                "Patient Information",
                "Presenting Complaint",
                "Medical History",
                "Examination Findings",
                "Vital Signs"
            ]
        );

        let bodies = page.find_by_class("card-body");
        let expanded: Vec<bool> = bodies.iter().map(|b| b.has_class("expanded")).collect();
        assert_eq!(expanded, [true, true, false, false, false]);
    }

    #[test]
    fn vitals_render_flattened_without_json_punctuation() {
        let mut model = loaded(json!({
            "vitals": {"bp": {"systolic": 120, "diastolic": 80}, "heartRate": 96}
        }));
        model.expanded.insert(CaseSection::Vitals);
        let page = render_page(&model);
        let vitals = page
            .find_by_key("card-Vitals")
            .expect("vitals card")
            .text_content();
        assert!(vitals.contains("Bp: systolic: 120\ndiastolic: 80"));
        assert!(vitals.contains("Heart Rate: 96"));
        assert!(!vitals.contains(['{', '}', '"', ',']));
    }

    #[test]
    fn last_sequential_card_is_labelled_submit() {
        let mut model = loaded(json!({"questions": [
            {"id": 1, "field": "diagnosis", "question": "What's your Diagnosis?"},
            {"id": 2, "field": "treatment", "question": "How would you treat it?"}
        ]}));
        assert_eq!(render_question_card(&model, 0).children.len(), 3);
        let first = Node::from(render_question_card(&model, 0));
        assert_eq!(first.buttons()[0].label, "Next");

        model.current_question = 1;
        let last = Node::from(render_question_card(&model, 1));
        assert_eq!(last.buttons()[0].label, "Submit");

        model.phase = Phase::Submitting;
        let busy = Node::from(render_question_card(&model, 1));
        assert_eq!(busy.buttons()[0].label, "Evaluating...");
        assert!(busy.buttons()[0].disabled);
    }

    #[test]
    fn batched_form_marks_selected_option_and_warns_on_empty_lists() {
        let mut model = loaded(json!({
            "multiple_choice_questions": [
                {"question": "Most likely diagnosis?", "options": ["Malaria", "Typhoid fever"]}
            ]
        }));
        model
            .answers
            .record(AnswerKey::MultipleChoice(0), "Typhoid fever");
        let page = render_page(&model);

        let selected = page.find_by_class("selected");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].text_content(), "Typhoid fever");
        assert!(page
            .text_content()
            .contains("No free text questions available."));
    }

    #[test]
    fn score_threshold_picks_header_state() {
        let model = loaded(json!({"questions": []}));
        let passing = Node::from(render_results(&result(json!({"score": 85})), &model));
        assert_eq!(passing.find_by_class("correct").len(), 1);
        assert_eq!(passing.icons(), [Icon::CheckCircle, Icon::RefreshCw]);
        assert!(passing.text_content().contains("Good job!"));

        let failing = Node::from(render_results(&result(json!({"score": 40})), &model));
        assert_eq!(failing.find_by_class("incorrect").len(), 1);
        assert!(failing.text_content().contains("Needs improvement"));
        assert!(failing.text_content().contains("Score: 40/100"));

        let boundary = Node::from(render_results(&result(json!({"score": 70})), &model));
        assert!(boundary.text_content().contains("Good job!"));
    }

    #[test]
    fn sequential_results_compare_user_and_expected_answers() {
        let mut model = loaded(json!({
            "questions": [
                {"id": 1, "field": "diagnosis", "question": "What's your Diagnosis?"},
                {"id": 2, "field": "treatment", "question": "How would you treat it?"}
            ],
            "treatment": "Oral rehydration salts"
        }));
        model.answers.record(AnswerKey::Field("diagnosis".into()), "Cholera");
        let scored = result(json!({
            "score": 64,
            "questions": [
                {"id": 1, "question": "What's your Diagnosis?", "field": "diagnosis",
                 "correct": false, "feedback": "Your diagnosis is different from the correct one."},
                {"id": 2, "question": "How would you treat it?", "field": "treatment",
                 "correct": true, "feedback": "Your treatment plan is appropriate for this condition."}
            ]
        }));
        let view = Node::from(render_results(&scored, &model));
        let text = view.text_content();
        assert!(text.contains("Question 1: What's your Diagnosis?"));
        assert!(text.contains("Cholera"));
        assert!(text.contains("No reference answer available"));
        assert!(text.contains("No answer provided"));
        assert!(text.contains("Oral rehydration salts"));
        assert!(text.contains("Feedback: Needs improvement"));
        assert!(text.contains("Feedback: Good answer!"));
        assert!(text.contains("No differential diagnoses provided."));
        assert_eq!(view.buttons().last().map(|b| &b.action), Some(&Action::NewCase));
    }

    #[test]
    fn free_text_results_show_concept_tags() {
        let model = loaded(json!({"free_text_questions": [{"question": "Investigations?"}]}));
        let scored = result(json!({
            "score": 72,
            "ft_results": [{
                "question": "Investigations?",
                "user_answer": "blood film",
                "ideal_answer": "Blood film and RDT",
                "score": 60,
                "matched_concepts": ["blood film"],
                "missing_concepts": ["RDT"]
            }],
            "mc_results": [{
                "question": "Drug of choice?",
                "user_answer": "Chloroquine",
                "correct_answer": "Artemether-lumefantrine",
                "correct": false
            }],
            "diagnosis": "Uncomplicated malaria",
            "differential_diagnoses": [{"diagnosis": "Typhoid fever", "reason": "Prolonged fever"}]
        }));
        let view = Node::from(render_results(&scored, &model));
        assert_eq!(view.find_by_class("matched").len(), 1);
        assert_eq!(view.find_by_class("key-concept").len(), 2);
        let text = view.text_content();
        assert!(text.contains("Correct answer: Artemether-lumefantrine"));
        assert!(text.contains("Ideal answer: Blood film and RDT"));
        assert!(text.contains("Uncomplicated malaria"));
        assert!(text.contains("Prolonged fever"));
        assert!(text.contains("No reasoning provided."));
    }

    #[test]
    fn diagnosis_falls_back_to_case_topic() {
        let model = loaded(json!({"questions": []}));
        let scored = result(json!({"score": 90, "topic": "Acute appendicitis", "diagnosis": ""}));
        let view = Node::from(render_results(&scored, &model));
        let summary = view.find_by_class("correct-diagnosis")[0].text_content();
        assert!(summary.contains("Acute appendicitis"), "{summary}");
        assert!(!summary.contains("No diagnosis provided."));

        let both = result(json!({"diagnosis": "Biliary colic", "topic": "Acute appendicitis"}));
        let view = Node::from(render_results(&both, &model));
        assert!(view.text_content().contains("Biliary colic"));

        let neither = Node::from(render_results(&result(json!({})), &model));
        assert!(neither.text_content().contains("No diagnosis provided."));
    }
}
