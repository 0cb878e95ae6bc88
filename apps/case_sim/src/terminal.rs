//! Plain-text rendering of the view tree plus the terminal's side of the
//! collaborator hooks.

use std::io::Write;

use chrono::Local;
use client_core::{
    view::{Action, Element, Icon, Node, Tag},
    Collaborators, Notification,
};

/// A painted view: the text to print and the numbered controls in it.
#[derive(Debug, Default)]
pub struct Screen {
    pub text: String,
    pub actions: Vec<Action>,
}

pub fn paint(node: &Node) -> Screen {
    let mut painter = Painter::default();
    painter.node(node);
    painter.flush();
    Screen {
        text: painter.out,
        actions: painter.actions,
    }
}

fn glyph(icon: Icon) -> &'static str {
    match icon {
        Icon::CheckCircle => "✔",
        Icon::XCircle => "✘",
        Icon::ChevronDown => "▾",
        Icon::RefreshCw => "↻",
    }
}

#[derive(Default)]
struct Painter {
    out: String,
    line: String,
    depth: usize,
    actions: Vec<Action>,
}

impl Painter {
    fn flush(&mut self) {
        let line = std::mem::take(&mut self.line);
        for part in line.lines().filter(|l| !l.trim().is_empty()) {
            self.out.push_str(&"  ".repeat(self.depth));
            self.out.push_str(part.trim_end());
            self.out.push('\n');
        }
    }

    fn register(&mut self, action: &Action) -> usize {
        self.actions.push(action.clone());
        self.actions.len()
    }

    fn node(&mut self, node: &Node) {
        match node {
            Node::Element(element) if element.hidden => {}
            Node::Element(element) => self.element(element),
            Node::Text(text) => self.line.push_str(text),
            Node::Icon(icon) => {
                self.line.push_str(glyph(*icon));
                self.line.push(' ');
            }
            Node::Button(button) => {
                let icon = button.icon.map(glyph).map(|g| format!("{g} ")).unwrap_or_default();
                if !self.line.is_empty() && !self.line.ends_with(' ') {
                    self.line.push(' ');
                }
                if button.disabled {
                    self.line.push_str(&format!("[-] {icon}{}", button.label));
                } else {
                    let n = self.register(&button.action);
                    self.line.push_str(&format!("[{n}] {icon}{}", button.label));
                }
            }
            Node::TextInput(input) => {
                self.flush();
                if input.value.is_empty() {
                    self.line.push_str(&format!("> ({})", input.placeholder));
                } else {
                    self.line.push_str(&format!("> {}", input.value));
                }
                self.flush();
            }
            Node::Radio(radio) => {
                self.flush();
                let n = self.register(&radio.action);
                let mark = if radio.checked { "*" } else { " " };
                self.line.push_str(&format!("[{n}] ({mark}) {}", radio.value));
                self.flush();
            }
            Node::Skeleton => {
                self.flush();
                self.line.push_str("Loading case...");
                self.flush();
            }
        }
    }

    fn children(&mut self, element: &Element) {
        for child in &element.children {
            self.node(child);
        }
    }

    fn element(&mut self, element: &Element) {
        match element.tag {
            Tag::Strong | Tag::Span => self.children(element),
            Tag::Heading(level) => {
                self.flush();
                self.line.push_str(&"#".repeat(usize::from(level)));
                self.line.push(' ');
                self.children(element);
                self.flush();
            }
            Tag::ListItem => {
                self.flush();
                self.line.push_str("- ");
                self.children(element);
                self.flush();
            }
            Tag::List => {
                self.flush();
                self.depth += 1;
                self.children(element);
                self.flush();
                self.depth -= 1;
            }
            Tag::Div | Tag::Paragraph => {
                self.flush();
                self.children(element);
                self.flush();
            }
        }
    }
}

/// Prints notifications and point awards inline; the bell stands in for
/// haptic feedback.
pub struct TerminalCollaborators {
    logged_in: bool,
}

impl TerminalCollaborators {
    pub fn new(logged_in: bool) -> Self {
        Self { logged_in }
    }
}

impl Collaborators for TerminalCollaborators {
    fn notify(&self, notification: &Notification) {
        println!(
            "[{}] ! {}: {}",
            Local::now().format("%H:%M:%S"),
            notification.title,
            notification.message
        );
    }

    fn haptic_feedback(&self) {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }

    fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    fn award_points(&self, points: u32) {
        println!("+{points} points");
    }
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NewCase,
    /// 1-based case card number.
    Toggle(usize),
    /// 1-based control number from the last painted screen.
    Press(usize),
    /// Question and option indexes, 0-based.
    Choose { question: usize, option: usize },
    FreeText { question: usize, text: String },
    Submit,
    Help,
    Quit,
    /// Anything not starting with `:` answers the current question.
    Answer(String),
}

pub const HELP: &str = "\
commands:
  <text>              answer the current question
  :press N            activate control [N]
  :toggle N           expand or collapse case card N (1-5)
  :mc Q O             pick option O for multiple choice question Q
  :ft Q <text>        answer free text question Q
  :submit             submit all answers
  :new                load a new case
  :help               show this help
  :quit               exit";

fn positive(raw: Option<&str>, what: &str) -> Result<usize, String> {
    let raw = raw.ok_or_else(|| format!("missing {what}"))?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("{what} must be a number from 1, got '{raw}'")),
    }
}

fn zero_based(raw: Option<&str>, what: &str) -> Result<usize, String> {
    positive(raw, what).map(|n| n - 1)
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix(':') else {
        return Ok(Command::Answer(trimmed.to_string()));
    };
    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let args = parts.next().unwrap_or_default().trim();
    let mut words = args.split_whitespace();

    match name {
        "new" | "n" => Ok(Command::NewCase),
        "submit" | "s" => Ok(Command::Submit),
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "q" => Ok(Command::Quit),
        "toggle" | "t" => Ok(Command::Toggle(positive(words.next(), "card")?)),
        "press" | "p" => Ok(Command::Press(positive(words.next(), "control")?)),
        "mc" => {
            let question = zero_based(words.next(), "question")?;
            let option = zero_based(words.next(), "option")?;
            Ok(Command::Choose { question, option })
        }
        "ft" => {
            let mut split = args.splitn(2, char::is_whitespace);
            let question = zero_based(split.next().filter(|s| !s.is_empty()), "question")?;
            let text = split.next().unwrap_or_default().trim().to_string();
            Ok(Command::FreeText { question, text })
        }
        other => Err(format!("unknown command ':{other}' (try :help)")),
    }
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;
