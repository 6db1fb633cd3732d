//! Rubric prompts and grader output parsing.

use crate::error::{EvalResult, GradingError};
use rubricate_core::{GradingResult, Vars};
use rubricate_prompts::files::{file_reference, resolve_path};
use rubricate_prompts::TemplateEngine;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Rubric prompt used when none is configured.
///
/// A JSON chat array; `{{ output }}` and `{{ rubric }}` are filled in before
/// the call.
pub const DEFAULT_GRADING_PROMPT: &str = r#"[
  {
    "role": "system",
    "content": "You are grading output according to a user-specified rubric. If the statement in the rubric is true, then the output passes the test. You respond with a JSON object with this structure: {\"reason\": string, \"pass\": boolean, \"score\": number}\n\nExamples:\n\n<Output>Hello world</Output>\n<Rubric>Content contains a greeting</Rubric>\n{\"reason\": \"the content contains the word 'Hello'\", \"pass\": true, \"score\": 1.0}\n\n<Output>Avast ye swabs, repel the invaders!</Output>\n<Rubric>Does not speak like a pirate</Rubric>\n{\"reason\": \"'avast ye' is a common pirate term\", \"pass\": false, \"score\": 0.0}"
  },
  {
    "role": "user",
    "content": "<Output>\n{{ output }}\n</Output>\n<Rubric>\n{{ rubric }}\n</Rubric>"
  }
]"#;

/// Resolve a configured rubric prompt.
///
/// Literal prompts are returned as-is. A `file://` prompt is read relative to
/// `base_path`; a missing file is an error and nothing else is attempted.
pub async fn load_rubric_prompt(prompt: &str, base_path: &Path) -> EvalResult<String> {
    let Some(reference) = file_reference(prompt) else {
        return Ok(prompt.to_string());
    };

    let path = resolve_path(base_path, reference);
    if !tokio::fs::try_exists(&path).await? {
        return Err(GradingError::FileNotFound { path });
    }
    debug!(path = %path.display(), "Loading rubric prompt from file");
    Ok(tokio::fs::read_to_string(&path).await?)
}

/// Escape text for embedding inside a JSON string literal.
fn json_escape(text: &str) -> String {
    let quoted = Value::String(text.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

/// Escape every string inside `value`.
fn json_escape_value(value: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(json_escape(text)),
        Value::Array(items) => Value::Array(items.iter().map(json_escape_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), json_escape_value(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Render a rubric prompt with `output`, `rubric` and the caller's vars.
///
/// When the template is a JSON document, every string in the context is
/// escaped so the rendered prompt stays valid JSON.
pub fn render_rubric_prompt(
    engine: &dyn TemplateEngine,
    template: &str,
    rubric: &str,
    output: &str,
    vars: &Vars,
) -> EvalResult<String> {
    let is_json = matches!(template.trim_start().chars().next(), Some('[') | Some('{'));

    let mut context = vars.clone();
    context.insert("output".to_string(), Value::String(output.to_string()));
    context.insert("rubric".to_string(), Value::String(rubric.to_string()));
    if is_json {
        for value in context.values_mut() {
            *value = json_escape_value(value);
        }
    }
    Ok(engine.render_string(template, &context)?)
}

/// Find the first balanced `{...}` in `text` that parses as a JSON object.
fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let bytes = text.as_bytes();
    for (start, _) in text.match_indices('{') {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        for (offset, &byte) in bytes[start..].iter().enumerate() {
            if in_string {
                match byte {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match byte {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        let candidate = &text[start..=start + offset];
                        if let Ok(Value::Object(map)) = serde_json::from_str(candidate) {
                            return Some(map);
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
    }
    None
}

/// Parse a grading provider's output into a [`GradingResult`].
///
/// Accepts a JSON object, a string holding one, or a string with one embedded
/// in surrounding prose. `pass` and `reason` are required; `score` defaults
/// to 1 for a pass and 0 otherwise.
pub fn parse_grading_output(output: &Value) -> EvalResult<GradingResult> {
    let raw = match output {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let object = match output {
        Value::Object(map) => map.clone(),
        Value::String(text) => match serde_json::from_str(text.trim()) {
            Ok(Value::Object(map)) => map,
            _ => extract_json_object(text)
                .ok_or_else(|| GradingError::malformed(&raw, "no JSON object found"))?,
        },
        _ => return Err(GradingError::malformed(raw, "expected a JSON object")),
    };

    let pass = object
        .get("pass")
        .and_then(Value::as_bool)
        .ok_or_else(|| GradingError::malformed(&raw, "missing boolean 'pass'"))?;
    let reason = object
        .get("reason")
        .and_then(Value::as_str)
        .ok_or_else(|| GradingError::malformed(&raw, "missing string 'reason'"))?;
    let score = object
        .get("score")
        .and_then(Value::as_f64)
        .unwrap_or(if pass { 1.0 } else { 0.0 });

    Ok(GradingResult::new(pass, score, reason))
}
