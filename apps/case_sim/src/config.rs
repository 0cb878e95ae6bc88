use std::{collections::HashMap, fs, path::Path};

use client_core::{ApiEndpoints, DEFAULT_NEW_CASE_PATH, DEFAULT_SUBMIT_PATH};
use shared::domain::PresentationMode;
use tracing::warn;

pub const SETTINGS_FILE: &str = "simulation.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_url: String,
    pub new_case_path: String,
    pub submit_path: String,
    pub presentation: PresentationMode,
    pub transition_ms: u64,
    pub logged_in: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            new_case_path: DEFAULT_NEW_CASE_PATH.into(),
            submit_path: DEFAULT_SUBMIT_PATH.into(),
            presentation: PresentationMode::Auto,
            transition_ms: 500,
            logged_in: false,
        }
    }
}

impl Settings {
    pub fn endpoints(&self) -> ApiEndpoints {
        ApiEndpoints {
            base_url: self.server_url.clone(),
            new_case_path: self.new_case_path.clone(),
            submit_path: self.submit_path.clone(),
        }
    }
}

/// Defaults, then `simulation.toml` in the working directory, then the
/// environment.
pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    file: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(file) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, env);
    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<HashMap<String, String>>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!(error = %err, "config: ignoring unreadable settings file");
            return;
        }
    };

    if let Some(v) = file_cfg.get("server_url") {
        settings.server_url = v.clone();
    }
    if let Some(v) = file_cfg.get("new_case_path") {
        settings.new_case_path = v.clone();
    }
    if let Some(v) = file_cfg.get("submit_path") {
        settings.submit_path = v.clone();
    }
    if let Some(v) = file_cfg.get("presentation") {
        set_presentation(settings, v);
    }
    if let Some(v) = file_cfg.get("transition_ms") {
        set_transition(settings, v);
    }
    if let Some(v) = file_cfg.get("logged_in") {
        set_logged_in(settings, v);
    }
}

fn apply_env(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("SIMULATION_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("APP__NEW_CASE_PATH") {
        settings.new_case_path = v;
    }
    if let Some(v) = env("APP__SUBMIT_PATH") {
        settings.submit_path = v;
    }

    if let Some(v) = env("APP__PRESENTATION") {
        set_presentation(settings, &v);
    }
    if let Some(v) = env("APP__TRANSITION_MS") {
        set_transition(settings, &v);
    }
    if let Some(v) = env("APP__LOGGED_IN") {
        set_logged_in(settings, &v);
    }
}

fn set_presentation(settings: &mut Settings, raw: &str) {
    match raw.parse::<PresentationMode>() {
        Ok(mode) => settings.presentation = mode,
        Err(err) => warn!(error = %err, "config: keeping presentation {:?}", settings.presentation),
    }
}

fn set_transition(settings: &mut Settings, raw: &str) {
    if let Ok(parsed) = raw.trim().parse::<u64>() {
        settings.transition_ms = parsed;
    }
}

fn set_logged_in(settings: &mut Settings, raw: &str) {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => settings.logged_in = true,
        "0" | "false" | "no" | "off" => settings.logged_in = false,
        _ => {}
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
