use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn no_env(_: &str) -> Option<String> {
    None
}

fn temp_settings_file(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("case_sim_settings_{suffix}.toml"));
    fs::write(&path, contents).expect("write settings");
    path
}

#[test]
fn missing_file_keeps_defaults() {
    let settings = load_settings_from(Path::new("/nonexistent/simulation.toml"), no_env);
    assert_eq!(settings, Settings::default());
    assert_eq!(
        settings.endpoints().new_case_url().expect("url").as_str(),
        "http://127.0.0.1:5000/api/simulation/new"
    );
}

#[test]
fn file_values_override_defaults() {
    let path = temp_settings_file(
        r#"
server_url = "http://sim.local:8080"
submit_path = "/v2/submit"
presentation = "batched"
transition_ms = "0"
logged_in = "true"
"#,
    );
    let settings = load_settings_from(&path, no_env);
    fs::remove_file(&path).expect("cleanup");

    assert_eq!(settings.server_url, "http://sim.local:8080");
    assert_eq!(settings.new_case_path, DEFAULT_NEW_CASE_PATH);
    assert_eq!(settings.submit_path, "/v2/submit");
    assert_eq!(settings.presentation, PresentationMode::Batched);
    assert_eq!(settings.transition_ms, 0);
    assert!(settings.logged_in);
}

#[test]
fn environment_wins_over_file() {
    let path = temp_settings_file("server_url = \"http://from-file:1\"\n");
    let settings = load_settings_from(&path, |key| match key {
        "SIMULATION_SERVER_URL" => Some("http://legacy:2".into()),
        "APP__SERVER_URL" => Some("http://from-env:3".into()),
        "APP__PRESENTATION" => Some("Sequential".into()),
        _ => None,
    });
    fs::remove_file(&path).expect("cleanup");

    assert_eq!(settings.server_url, "http://from-env:3");
    assert_eq!(settings.presentation, PresentationMode::Sequential);
}

#[test]
fn invalid_values_are_ignored() {
    let settings = load_settings_from(Path::new("/nonexistent/simulation.toml"), |key| {
        match key {
            "APP__PRESENTATION" => Some("carousel".into()),
            "APP__TRANSITION_MS" => Some("soon".into()),
            "APP__LOGGED_IN" => Some("maybe".into()),
            _ => None,
        }
    });
    assert_eq!(settings, Settings::default());
}

#[test]
fn unparseable_file_is_skipped() {
    let path = temp_settings_file("server_url = [1, 2");
    let settings = load_settings_from(&path, no_env);
    fs::remove_file(&path).expect("cleanup");
    assert_eq!(settings, Settings::default());
}
