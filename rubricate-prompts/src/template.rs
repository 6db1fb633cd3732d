//! Template engines.
//!
//! Everything that expands a template goes through [`TemplateEngine`], so the
//! renderer and graders never depend on a particular engine. [`TeraEngine`]
//! is the default; [`PassthroughEngine`] returns the template untouched and is
//! selected when templating is disabled for a run.

use crate::error::PromptResult;
use regex::Regex;
use rubricate_core::{RunContext, Vars};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tera::{Context, Tera};

/// String template rendering.
pub trait TemplateEngine: Send + Sync + fmt::Debug {
    /// Expand `template` against `vars`.
    fn render_string(&self, template: &str, vars: &Vars) -> PromptResult<String>;
}

/// Shared template engine.
pub type SharedEngine = Arc<dyn TemplateEngine>;

/// Jinja-style engine backed by `tera`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeraEngine {
    autoescape: bool,
}

impl TeraEngine {
    /// Create an engine without HTML autoescaping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable HTML autoescaping.
    #[must_use]
    pub fn autoescape(mut self, enabled: bool) -> Self {
        self.autoescape = enabled;
        self
    }
}

impl TemplateEngine for TeraEngine {
    /// Undefined variables printed by `{{ ... }}` render as empty strings.
    fn render_string(&self, template: &str, vars: &Vars) -> PromptResult<String> {
        let context = Context::from_value(blank_undefined(template, vars))?;
        Ok(Tera::one_off(template, &context, self.autoescape)?)
    }
}

fn expression_regex() -> &'static Regex {
    static EXPRESSION: OnceLock<Regex> = OnceLock::new();
    EXPRESSION.get_or_init(|| {
        Regex::new(r"\{\{-?\s*([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)").expect("valid expression regex")
    })
}

/// `vars` as a template context, with every variable path that `template`
/// prints but `vars` lacks set to `""`.
fn blank_undefined(template: &str, vars: &Vars) -> Value {
    let mut context: Map<String, Value> =
        vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    for captures in expression_regex().captures_iter(template) {
        let path: Vec<&str> = captures[1].split('.').collect();
        insert_blank(&mut context, &path);
    }
    Value::Object(context)
}

fn insert_blank(map: &mut Map<String, Value>, path: &[&str]) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    match map.get_mut(*first) {
        Some(Value::Object(inner)) => insert_blank(inner, rest),
        Some(_) => {}
        None => {
            let mut value = Value::String(String::new());
            for key in rest.iter().rev() {
                let mut inner = Map::new();
                inner.insert((*key).to_string(), value);
                value = Value::Object(inner);
            }
            map.insert((*first).to_string(), value);
        }
    }
}

/// Engine that returns templates verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughEngine;

impl TemplateEngine for PassthroughEngine {
    fn render_string(&self, template: &str, _vars: &Vars) -> PromptResult<String> {
        Ok(template.to_string())
    }
}

/// The engine a run should use.
pub fn engine_for(context: &RunContext) -> SharedEngine {
    if context.templating_disabled {
        Arc::new(PassthroughEngine)
    } else {
        Arc::new(TeraEngine::new())
    }
}
