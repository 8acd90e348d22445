//! `$ref:stepId[.field.path]` substitution.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

/// Pure functions over a step's raw arguments JSON: extracting the
/// dependency set and substituting resolved outputs.
///
/// There is no teacher file implementing this exact micro-DSL; the
/// substitution and extraction both work by scanning the raw JSON text for
/// `"$ref:...` tokens rather than parsing a grammar, which keeps this
/// resolver a pure, allocation-light function pair in the same spirit as
/// `agentic_core::RetryPolicy` — a stateless policy object with no
/// dependencies of its own.
pub struct PlanReferenceResolver;

const REF_PREFIX: &str = "$ref:";

impl PlanReferenceResolver {
    /// Every step id textually referenced by `arguments_json`, via
    /// `$ref:stepId` or `$ref:stepId.field.path` tokens found anywhere a
    /// JSON string value appears.
    #[must_use]
    pub fn dependencies(arguments_json: &str) -> HashSet<String> {
        let mut deps = HashSet::new();
        let mut rest = arguments_json;
        while let Some(start) = rest.find(REF_PREFIX) {
            let after_prefix = &rest[start + REF_PREFIX.len()..];
            let token_end = after_prefix
                .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
                .unwrap_or(after_prefix.len());
            let token = &after_prefix[..token_end];
            let step_id = token.split('.').next().unwrap_or(token);
            if !step_id.is_empty() {
                deps.insert(step_id.to_string());
            }
            rest = &after_prefix[token_end..];
        }
        deps
    }

    /// Substitute every `$ref:stepId[.path]` token in `arguments_json`
    /// using already-resolved `outputs`, keyed by step id.
    ///
    /// A bare `$ref:stepId` is replaced by the referenced step's output,
    /// inlined unquoted if it parses as JSON, else as a JSON string. A
    /// `$ref:stepId.a.b` extracts `/a/b` from the referenced output parsed
    /// as JSON; a missing field yields `null`. Referencing a step whose
    /// output is not JSON-parseable while a field path is requested is an
    /// error attributed to the *referring* step.
    ///
    /// The token always sits inside the JSON string quotes of the raw
    /// arguments (`"$ref:stepId"`); those quotes are consumed along with
    /// the token itself so the substituted value — quoted or not — lands
    /// in valid JSON grammar rather than doubling up the quoting.
    ///
    /// # Errors
    ///
    /// Returns `Err(step_id)` naming the unresolved or malformed reference.
    pub fn resolve(arguments_json: &str, outputs: &HashMap<String, String>) -> Result<String, String> {
        let mut result = String::with_capacity(arguments_json.len());
        let mut rest = arguments_json;
        loop {
            let Some(start) = rest.find(REF_PREFIX) else {
                result.push_str(rest);
                break;
            };
            let literal = &rest[..start];
            let had_open_quote = literal.ends_with('"');
            let literal = if had_open_quote {
                &literal[..literal.len() - 1]
            } else {
                literal
            };
            result.push_str(literal);

            let after_prefix = &rest[start + REF_PREFIX.len()..];
            let token_end = after_prefix
                .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
                .unwrap_or(after_prefix.len());
            let token = &after_prefix[..token_end];
            let mut after_token = &after_prefix[token_end..];
            if had_open_quote {
                if let Some(stripped) = after_token.strip_prefix('"') {
                    after_token = stripped;
                }
            }
            rest = after_token;

            let mut parts = token.split('.');
            let step_id = parts.next().unwrap_or_default();
            let output = outputs.get(step_id).ok_or_else(|| step_id.to_string())?;

            let field_path: Vec<&str> = parts.collect();
            if field_path.is_empty() {
                match serde_json::from_str::<Value>(output) {
                    Ok(value) => result.push_str(&value.to_string()),
                    Err(_) => result.push_str(&serde_json::to_string(output).unwrap_or_default()),
                }
            } else {
                let parsed: Value = serde_json::from_str(output).map_err(|_| step_id.to_string())?;
                let mut cursor = &parsed;
                for field in &field_path {
                    cursor = cursor.get(field).unwrap_or(&Value::Null);
                }
                result.push_str(&cursor.to_string());
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependencies_finds_bare_ref() {
        let deps = PlanReferenceResolver::dependencies(r#"{"a":"$ref:s1","b":"world"}"#);
        assert_eq!(deps, HashSet::from(["s1".to_string()]));
    }

    #[test]
    fn dependencies_finds_field_path_ref() {
        let deps = PlanReferenceResolver::dependencies(r#"{"a":"$ref:s1.data.value"}"#);
        assert_eq!(deps, HashSet::from(["s1".to_string()]));
    }

    #[test]
    fn dependencies_finds_multiple_distinct_refs() {
        let deps =
            PlanReferenceResolver::dependencies(r#"{"a":"$ref:s1","b":"$ref:s2.x"}"#);
        assert_eq!(deps, HashSet::from(["s1".to_string(), "s2".to_string()]));
    }

    #[test]
    fn resolve_substitutes_non_json_output_as_string() {
        let mut outputs = HashMap::new();
        outputs.insert("s1".to_string(), "hello".to_string());
        let resolved =
            PlanReferenceResolver::resolve(r#"{"a":"$ref:s1","b":"world"}"#, &outputs).unwrap();
        assert_eq!(resolved, r#"{"a":"hello","b":"world"}"#);
    }

    #[test]
    fn resolve_inlines_json_output_unquoted() {
        let mut outputs = HashMap::new();
        outputs.insert("s1".to_string(), r#"{"x":1}"#.to_string());
        let resolved = PlanReferenceResolver::resolve(r#"{"a":"$ref:s1"}"#, &outputs).unwrap();
        assert_eq!(resolved, r#"{"a":{"x":1}}"#);
    }

    #[test]
    fn resolve_extracts_field_path() {
        let mut outputs = HashMap::new();
        outputs.insert("s1".to_string(), r#"{"data":{"value":42}}"#.to_string());
        let resolved =
            PlanReferenceResolver::resolve(r#"{"a":"$ref:s1.data.value"}"#, &outputs).unwrap();
        assert_eq!(resolved, r#"{"a":42}"#);
    }

    #[test]
    fn resolve_missing_field_yields_null() {
        let mut outputs = HashMap::new();
        outputs.insert("s1".to_string(), r#"{"data":{}}"#.to_string());
        let resolved =
            PlanReferenceResolver::resolve(r#"{"a":"$ref:s1.data.missing"}"#, &outputs).unwrap();
        assert_eq!(resolved, r#"{"a":null}"#);
    }

    #[test]
    fn resolve_unknown_step_is_an_error() {
        let outputs = HashMap::new();
        let err = PlanReferenceResolver::resolve(r#"{"a":"$ref:s1"}"#, &outputs).unwrap_err();
        assert_eq!(err, "s1");
    }
}
