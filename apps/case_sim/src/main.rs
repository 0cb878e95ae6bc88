use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    view::Action, CaseFlowController, FlowError, FlowOptions, HttpSimulationApi, Phase,
    Presentation, StepOutcome,
};
use shared::domain::{CaseSection, PresentationMode};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod terminal;

use config::load_settings;
use terminal::{paint, parse_command, Command, TerminalCollaborators, HELP};

#[derive(Parser, Debug)]
#[command(about = "Work through generated clinical cases in the terminal")]
struct Args {
    /// Base URL of the simulation server.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    new_case_path: Option<String>,
    #[arg(long)]
    submit_path: Option<String>,
    /// auto, sequential or batched.
    #[arg(long)]
    presentation: Option<PresentationMode>,
    /// Delay before a slide transition settles.
    #[arg(long)]
    transition_ms: Option<u64>,
    /// Award points after each scored case.
    #[arg(long)]
    logged_in: bool,
}

struct Session {
    flow: CaseFlowController,
    transition: Duration,
    controls: Vec<Action>,
}

impl Session {
    fn draw(&mut self) {
        let screen = paint(&self.flow.view());
        println!("{}", "-".repeat(60));
        print!("{}", screen.text);
        self.controls = screen.actions;
    }

    async fn load(&mut self) {
        self.flow.begin_load();
        self.draw();
        let response = self.flow.api().new_case().await;
        report(self.flow.complete_load(response));
        self.draw();
    }

    async fn submit(&mut self) {
        match self.flow.begin_submit() {
            Ok(request) => {
                self.draw();
                let response = self.flow.api().submit(&request).await;
                report(self.flow.complete_submit(response).map(|_| ()));
                self.draw();
            }
            Err(err) => report(Err(err)),
        }
    }

    async fn answer(&mut self, text: &str) {
        match self.flow.record_current(text) {
            Ok(StepOutcome::ReadyToSubmit) => self.submit().await,
            Ok(_) => {
                self.draw();
                tokio::time::sleep(self.transition).await;
                self.flow.settle_transition();
                self.draw();
            }
            Err(err) => report(Err(err)),
        }
    }

    async fn activate(&mut self, action: Action) {
        match action {
            Action::NewCase => self.load().await,
            Action::AnswerCurrent => println!("type your answer and press enter"),
            Action::SubmitAnswers => self.submit().await,
            other => {
                report(self.flow.perform(other, "").await);
                self.draw();
            }
        }
    }

    /// Returns false once the user asks to quit.
    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => return false,
            Command::Help => println!("{HELP}"),
            Command::NewCase => self.load().await,
            Command::Submit => self.submit().await,
            Command::Toggle(card) => match CaseSection::ALL.get(card - 1) {
                Some(section) => {
                    self.flow.toggle_card(*section);
                    self.draw();
                }
                None => println!("there are {} case cards", CaseSection::ALL.len()),
            },
            Command::Press(n) => match self.controls.get(n - 1).cloned() {
                Some(action) => self.activate(action).await,
                None => println!("no control [{n}] on screen"),
            },
            Command::Choose { question, option } => {
                report(self.flow.select_option(question, option));
                self.draw();
            }
            Command::FreeText { question, text } => {
                report(self.flow.set_free_text(question, &text));
                self.draw();
            }
            Command::Answer(text) => match (self.flow.phase(), self.flow.model().presentation) {
                (Phase::Presenting, Presentation::Sequential) => self.answer(&text).await,
                (Phase::Presenting, Presentation::Batched) => {
                    println!("use :mc and :ft to answer, then :submit")
                }
                _ => println!("nothing to answer right now (:new loads a case)"),
            },
        }
        true
    }
}

/// Validation failures were already shown through the notification hook.
fn report(result: Result<(), FlowError>) {
    match result {
        Ok(()) => {}
        Err(err) if err.is_validation() => {}
        Err(err) => warn!(error = %err, "case_sim: action failed"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(v) = args.server_url {
        settings.server_url = v;
    }
    if let Some(v) = args.new_case_path {
        settings.new_case_path = v;
    }
    if let Some(v) = args.submit_path {
        settings.submit_path = v;
    }
    if let Some(v) = args.presentation {
        settings.presentation = v;
    }
    if let Some(v) = args.transition_ms {
        settings.transition_ms = v;
    }
    if args.logged_in {
        settings.logged_in = true;
    }

    let endpoints = settings.endpoints();
    endpoints
        .new_case_url()
        .with_context(|| format!("invalid server url '{}'", settings.server_url))?;
    info!(server_url = %settings.server_url, mode = ?settings.presentation, "case_sim: starting");

    let flow = CaseFlowController::new(
        Arc::new(HttpSimulationApi::new(endpoints)),
        Arc::new(TerminalCollaborators::new(settings.logged_in)),
        FlowOptions {
            presentation: settings.presentation,
        },
    );
    let mut session = Session {
        flow,
        transition: Duration::from_millis(settings.transition_ms),
        controls: Vec::new(),
    };

    println!("{HELP}");
    session.load().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("read command")? {
        match parse_command(&line) {
            Ok(command) => {
                if !session.handle(command).await {
                    break;
                }
            }
            Err(message) => println!("{message}"),
        }
    }

    Ok(())
}
