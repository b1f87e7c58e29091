//! Offline responder for the `local` provider. It answers the three study
//! prompts with well-formed output derived from the prompt itself, so the
//! whole workflow can run without network access.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use crate::LlmRequest;

/// Precedes the identifier of each slide in a group-notes prompt.
pub const SLIDE_ID_MARKER: &str = "SLIDE_ID:";
/// Precedes the JSON array of group notes in a summary prompt.
pub const NOTES_MARKER: &str = "NOTES:";
/// Precedes the markdown summary in a mind-map prompt.
pub const SUMMARY_MARKER: &str = "SUMMARY:";

const MAX_BULLETS: usize = 5;
const MAX_ECHO_CHARS: usize = 800;

pub(crate) fn synthesize(req: &LlmRequest) -> String {
    let user = req.user.as_str();
    if user.contains(SLIDE_ID_MARKER) {
        group_note(user).to_string()
    } else if let Some(notes) = after_marker(user, NOTES_MARKER) {
        summary(notes)
    } else if let Some(markdown) = after_marker(user, SUMMARY_MARKER) {
        mind_map(markdown).to_string()
    } else {
        user.trim().chars().take(MAX_ECHO_CHARS).collect()
    }
}

fn after_marker<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.find(marker).map(|at| &text[at + marker.len()..])
}

fn group_note(user: &str) -> Value {
    let mut slide_ids = Vec::new();
    let mut topics = Vec::new();
    let mut bullets = Vec::new();
    let mut seen = BTreeSet::new();
    let body = after_marker(user, SLIDE_ID_MARKER)
        .map(|rest| format!("{SLIDE_ID_MARKER}{rest}"))
        .unwrap_or_default();
    for line in body.lines() {
        let line = line.trim();
        if let Some(id) = line.strip_prefix(SLIDE_ID_MARKER) {
            slide_ids.push(id.trim().to_string());
            continue;
        }
        let text = strip_markup(line);
        if text.is_empty() || !seen.insert(text.to_lowercase()) {
            continue;
        }
        if line.starts_with('#') {
            topics.push(text.clone());
        }
        if bullets.len() < MAX_BULLETS {
            bullets.push(text);
        }
    }
    if topics.is_empty() {
        topics.extend(bullets.first().cloned());
    }
    json!({
        "slide_ids": slide_ids,
        "summary_bullets": bullets,
        "topics": topics,
        "connections": [],
        "uncertainties": [],
    })
}

fn summary(notes: &str) -> String {
    let parsed: Vec<Value> = serde_json::from_str(notes.trim()).unwrap_or_default();
    let mut out = String::from("# Lecture summary\n");
    for note in &parsed {
        let heading = note["topics"]
            .as_array()
            .and_then(|topics| topics.first())
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| strings(&note["slide_ids"]).join(", "));
        out.push_str(&format!("\n## {heading}\n"));
        for bullet in strings(&note["summary_bullets"]) {
            out.push_str(&format!("- {bullet}\n"));
        }
    }
    out
}

fn mind_map(markdown: &str) -> Value {
    let mut nodes: Vec<(String, String)> = Vec::new();
    let mut edges = Vec::new();
    let mut root: Option<String> = None;
    let mut section: Option<String> = None;
    for line in markdown.lines() {
        let line = line.trim();
        let level = line.chars().take_while(|c| *c == '#').count();
        let bullet = line.starts_with("- ") || line.starts_with("* ");
        if level == 0 && !bullet {
            continue;
        }
        let label = strip_markup(line);
        if label.is_empty() {
            continue;
        }
        let id = unique_id(&nodes, &label);
        nodes.push((id.clone(), label));
        let parent = match (level, &root) {
            (1, None) => {
                root = Some(id.clone());
                None
            }
            (0, _) => section.clone().or_else(|| root.clone()),
            _ => {
                let parent = root.clone();
                section = Some(id.clone());
                parent
            }
        };
        if let Some(parent) = parent {
            edges.push(json!({ "from": parent, "to": id, "label": "includes" }));
        }
    }
    if nodes.is_empty() {
        nodes.push(("lecture".to_string(), "Lecture".to_string()));
    }
    let nodes: Vec<Value> = nodes
        .into_iter()
        .map(|(id, label)| json!({ "id": id, "label": label }))
        .collect();
    json!({ "nodes": nodes, "edges": edges })
}

fn strip_markup(line: &str) -> String {
    line.trim_start_matches(|c: char| c == '#' || c == '-' || c == '*' || c == '>')
        .trim()
        .to_string()
}

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn unique_id(nodes: &[(String, String)], label: &str) -> String {
    let mut base = String::new();
    for c in label.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            base.push(c);
        } else if !base.is_empty() && !base.ends_with('_') {
            base.push('_');
        }
    }
    let base = base.trim_end_matches('_');
    let base = if base.is_empty() || base.starts_with(|c: char| c.is_ascii_digit()) {
        format!("node_{base}").trim_end_matches('_').to_string()
    } else {
        base.to_string()
    };
    let mut candidate = base.clone();
    let mut suffix = 2;
    while nodes.iter().any(|(id, _)| *id == candidate) {
        candidate = format!("{base}_{suffix}");
        suffix += 1;
    }
    candidate
}
