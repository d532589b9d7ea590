//! Placeholder variables in prompt content.
//!
//! A placeholder is `{{name}}` or `{{name:default}}`. The name may not contain
//! `}` or `:`, the default may not contain `}`. Both are trimmed. Text that does
//! not match (an unclosed `{{`, a stray `}}`) is ordinary text and passes
//! through untouched; there is no parse error.

use std::collections::{HashMap, HashSet};
use std::hash::BuildHasher;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([^}:]+)(?::([^}]*))?\}\}").unwrap_or_else(|_| unreachable!())
});

/// A variable found in prompt content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptVariable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// Extract the unique variables of `content` in order of first occurrence.
///
/// When a name appears more than once the first occurrence wins, including
/// its default value (or lack of one).
pub fn extract_variables(content: &str) -> Vec<PromptVariable> {
    let mut seen = HashSet::new();
    let mut variables = Vec::new();

    for caps in PLACEHOLDER.captures_iter(content) {
        let name = caps[1].trim();
        if seen.insert(name.to_string()) {
            variables.push(PromptVariable {
                name: name.to_string(),
                default_value: caps.get(2).map(|m| m.as_str().trim().to_string()),
            });
        }
    }

    variables
}

/// Substitute placeholders with `values`.
///
/// A name present in `values` is replaced verbatim, even by an empty string.
/// A name absent from `values` is re-emitted as `{{name}}` with its default
/// segment dropped.
pub fn replace_variables<S: BuildHasher>(
    content: &str,
    values: &HashMap<String, String, S>,
) -> String {
    PLACEHOLDER
        .replace_all(content, |caps: &Captures<'_>| {
            let name = caps[1].trim();
            match values.get(name) {
                Some(value) => value.clone(),
                None => format!("{{{{{}}}}}", name),
            }
        })
        .into_owned()
}

/// Initial value map for a render: each variable's default, or empty.
pub fn default_values(variables: &[PromptVariable]) -> HashMap<String, String> {
    variables
        .iter()
        .map(|v| {
            (
                v.name.clone(),
                v.default_value.clone().unwrap_or_default(),
            )
        })
        .collect()
}

/// Parse a `name=value` assignment as given on the command line
pub fn parse_assignment(s: &str) -> Option<(String, String)> {
    let (name, value) = s.split_once('=')?;
    Some((name.trim().to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_extract_simple_and_default() {
        let vars = extract_variables("Hi {{name}}, you are {{ age : 30 }}");
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].name, "name");
        assert_eq!(vars[0].default_value, None);
        assert_eq!(vars[1].name, "age");
        assert_eq!(vars[1].default_value.as_deref(), Some("30"));
    }

    #[test]
    fn test_extract_first_occurrence_wins() {
        let vars = extract_variables("{{a}} and {{a:x}}");
        assert_eq!(vars, vec![PromptVariable { name: "a".to_string(), default_value: None }]);

        let vars = extract_variables("{{a:x}} and {{a:y}} and {{b}}");
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].default_value.as_deref(), Some("x"));
        assert_eq!(vars[1].name, "b");
    }

    #[test]
    fn test_extract_none() {
        assert!(extract_variables("plain text").is_empty());
        assert!(extract_variables("").is_empty());
    }

    #[test]
    fn test_extract_is_idempotent() {
        let content = "{{x}} {{y:1}} {{x:2}} {{ z }}";
        assert_eq!(extract_variables(content), extract_variables(content));
    }

    #[test]
    fn test_empty_default_is_present() {
        let vars = extract_variables("{{a:}}");
        assert_eq!(vars[0].default_value.as_deref(), Some(""));
    }

    #[test]
    fn test_whitespace_only_name() {
        let vars = extract_variables("[{{   }}]");
        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].name, "");

        assert_eq!(replace_variables("[{{   }}]", &values(&[("", "ok")])), "[ok]");
        assert_eq!(replace_variables("[{{   }}]", &values(&[])), "[{{}}]");
    }

    #[test]
    fn test_replace_absent_keeps_placeholder() {
        assert_eq!(
            replace_variables("Hi {{name:Bob}}", &values(&[])),
            "Hi {{name}}"
        );
        assert_eq!(replace_variables("Hi {{name}}", &values(&[])), "Hi {{name}}");
    }

    #[test]
    fn test_replace_present_empty_substitutes() {
        assert_eq!(
            replace_variables("Hi {{name:Bob}}", &values(&[("name", "")])),
            "Hi "
        );
    }

    #[test]
    fn test_replace_trims_name_and_ignores_default() {
        let out = replace_variables(
            "{{ greeting : Hello }}, {{name}}! {{greeting}}",
            &values(&[("greeting", "Hey"), ("name", "Ada")]),
        );
        assert_eq!(out, "Hey, Ada! Hey");
    }

    #[test]
    fn test_replace_values_are_verbatim() {
        let out = replace_variables("{{a}}", &values(&[("a", "{{b}} $1")]));
        assert_eq!(out, "{{b}} $1");
    }

    #[test]
    fn test_no_placeholders_round_trip() {
        for content in ["", "plain", "Just text with } and { braces", "{ single }", "}}{{"] {
            assert_eq!(replace_variables(content, &values(&[("x", "y")])), content);
        }
    }

    #[test]
    fn test_malformed_passes_through() {
        for content in ["{{open without close", "{{:nodefault}}", "{{}}", "{name}}"] {
            assert!(extract_variables(content).is_empty(), "{}", content);
            assert_eq!(replace_variables(content, &values(&[("name", "x")])), content);
        }
    }

    #[test]
    fn test_default_values() {
        let vars = extract_variables("{{a:1}} {{b}}");
        let defaults = default_values(&vars);
        assert_eq!(defaults.get("a").map(String::as_str), Some("1"));
        assert_eq!(defaults.get("b").map(String::as_str), Some(""));
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("name=Ada Lovelace"),
            Some(("name".to_string(), "Ada Lovelace".to_string()))
        );
        assert_eq!(
            parse_assignment(" x =a=b"),
            Some(("x".to_string(), "a=b".to_string()))
        );
        assert_eq!(parse_assignment("novalue"), None);
    }

    #[test]
    fn test_variable_serialization_omits_missing_default() {
        let json = serde_json::to_string(&PromptVariable {
            name: "a".to_string(),
            default_value: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"name":"a"}"#);
    }
}
