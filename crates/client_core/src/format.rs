//! Text formatting for arbitrary case values and keys.

use serde_json::Value;

/// Turns a server key such as `heartRate` or `blood_pressure` into a label
/// such as `Heart Rate` or `Blood Pressure`.
pub fn title_case_key(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;

    for ch in key.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }
        let boundary = ch.is_uppercase()
            && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit());
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(ch);
        prev = Some(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Human-readable text for a case value. Scalars render as themselves, null
/// renders empty, and objects or arrays are flattened into indented
/// `key: value` lines with no JSON punctuation.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Object(_) | Value::Array(_) => flatten_structured(value),
    }
}

fn flatten_structured(value: &Value) -> String {
    let pretty = match serde_json::to_string_pretty(value) {
        Ok(pretty) => pretty,
        Err(_) => value.to_string(),
    };
    let stripped: String = pretty
        .chars()
        .filter(|ch| !matches!(ch, '{' | '}' | '[' | ']' | '"' | ','))
        .collect();

    let lines: Vec<&str> = stripped
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect();
    // Pretty printing indents with ASCII spaces only; string contents may
    // start with any other whitespace and must stay intact.
    let indent = lines
        .iter()
        .map(|line| line.len() - line.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| &line[indent..])
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Text for the presenting complaint, which may be a sentence or a record.
pub fn format_complaint(value: &Value) -> String {
    let text = format_value(value);
    if text.is_empty() {
        "No presenting complaint provided.".to_string()
    } else {
        text
    }
}
