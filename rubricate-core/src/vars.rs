//! Variable mappings and `{{ var }}` reference resolution.
//!
//! Variables may reference each other with `{{ name }}` placeholders.
//! [`resolve_variables`] substitutes those references repeatedly until a
//! fixed point, so chains like `var3 -> var2 -> var1` collapse to the final
//! value. References to unknown variables, self references and mutual cycles
//! are left as literal placeholder text.

use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

/// Ordered mapping from variable name to value.
///
/// Insertion order is the order substitution visits variables in.
pub type Vars = IndexMap<String, Value>;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("valid reference pattern"))
}

/// Render a variable value as text.
///
/// Strings are used as-is; anything else becomes its JSON text.
pub fn var_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolve `{{ name }}` references between variables.
///
/// Returns a new mapping; the input is untouched. Values updated earlier in
/// a pass are visible to later variables in the same pass. Passes stop once
/// nothing changes, and never exceed one more than the number of variables.
pub fn resolve_variables(vars: &Vars) -> Vars {
    let mut resolved = vars.clone();
    let pattern = reference_pattern();
    let max_passes = resolved.len() + 1;

    for pass in 0..max_passes {
        let mut changed = false;

        for index in 0..resolved.len() {
            let (key, current) = match resolved.get_index(index) {
                Some((key, Value::String(current))) => (key.clone(), current.clone()),
                _ => continue,
            };
            if !pattern.is_match(&current) {
                continue;
            }

            let substituted = pattern.replace_all(&current, |caps: &Captures<'_>| {
                let name = &caps[1];
                match resolved.get(name) {
                    Some(value) if name != key => var_to_string(value),
                    Some(_) => caps[0].to_string(),
                    None => {
                        debug!(variable = %name, "Variable not found for substitution");
                        caps[0].to_string()
                    }
                }
            });

            if substituted != current {
                let substituted = substituted.into_owned();
                resolved[index] = Value::String(substituted);
                changed = true;
            }
        }

        if !changed {
            debug!(passes = pass + 1, "Variables resolved");
            break;
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolves_chained_references() {
        let resolved = resolve_variables(&vars! {
            "var1" => "value1",
            "var2" => "{{ var1 }}",
            "var3" => "{{ var2 }}",
        });
        assert_eq!(
            resolved,
            vars! { "var1" => "value1", "var2" => "value1", "var3" => "value1" }
        );
    }

    #[test]
    fn test_chain_declared_in_reverse_order() {
        let resolved = resolve_variables(&vars! {
            "var3" => "{{ var2 }}",
            "var2" => "{{ var1 }}",
            "var1" => "value1",
        });
        assert_eq!(resolved["var3"], "value1");
        assert_eq!(resolved["var2"], "value1");
    }

    #[test]
    fn test_leaves_unknown_references() {
        let resolved = resolve_variables(&vars! {
            "var1" => "value1",
            "var2" => "{{ var3 }}",
        });
        assert_eq!(resolved, vars! { "var1" => "value1", "var2" => "{{ var3 }}" });
    }

    #[test]
    fn test_mutual_cycle_terminates() {
        let resolved = resolve_variables(&vars! {
            "var1" => "{{ var2 }}",
            "var2" => "{{ var1 }}",
        });
        assert_eq!(
            resolved,
            vars! { "var1" => "{{ var1 }}", "var2" => "{{ var1 }}" }
        );
    }

    #[test]
    fn test_self_reference_left_alone() {
        let resolved = resolve_variables(&vars! { "a" => "x {{ a }}" });
        assert_eq!(resolved["a"], "x {{ a }}");
    }

    #[test]
    fn test_multiple_references_in_one_value() {
        let resolved = resolve_variables(&vars! {
            "first" => "Ada",
            "last" => "Lovelace",
            "full" => "{{first}} {{ last }}",
        });
        assert_eq!(resolved["full"], "Ada Lovelace");
    }

    #[test]
    fn test_non_string_values() {
        let resolved = resolve_variables(&vars! {
            "count" => 3,
            "obj" => {"k": "v"},
            "text" => "n={{ count }} o={{ obj }}",
        });
        assert_eq!(resolved["count"], 3);
        assert_eq!(resolved["text"], r#"n=3 o={"k":"v"}"#);
    }

    #[test]
    fn test_idempotent_without_cycles() {
        let input = vars! {
            "a" => "{{ b }}-{{ c }}",
            "b" => "{{ c }}",
            "c" => "leaf",
            "d" => "{{ missing }}",
        };
        let once = resolve_variables(&input);
        assert_eq!(resolve_variables(&once), once);
    }

    #[test]
    fn test_input_not_mutated() {
        let input = vars! { "a" => "x", "b" => "{{ a }}" };
        let _ = resolve_variables(&input);
        assert_eq!(input["b"], "{{ a }}");
    }

    #[test]
    fn test_growth_is_bounded() {
        // b absorbs a again on every pass; only the pass cap stops it.
        let resolved = resolve_variables(&vars! {
            "a" => "x{{ b }}",
            "b" => "{{ a }}",
        });
        assert_eq!(resolved["a"], "x{{ a }}");
        assert_eq!(resolved["b"], "xxx{{ a }}");
    }

    #[test]
    fn test_var_to_string() {
        assert_eq!(var_to_string(&Value::from("s")), "s");
        assert_eq!(var_to_string(&Value::from(1.5)), "1.5");
        assert_eq!(var_to_string(&Value::Bool(true)), "true");
    }
}
