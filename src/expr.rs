//! Variable interpolation and condition evaluation.
//!
//! Both operations are side-effect-free and restricted to the session's
//! [`VariableStore`]: templates may reference variables through `{{name}}` or
//! `${name}` placeholders, and conditions compare interpolated operands with a
//! closed set of operators. No host-language code is ever evaluated.

use std::str::FromStr;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vars::VariableStore;

/// Replaces every `{{name}}` and `${name}` occurrence in `template` with the
/// current value of `name`, defaulting to the empty string when unbound.
///
/// Placeholder names are trimmed, so `{{ name }}` and `{{name}}` are
/// equivalent. Unterminated placeholders are passed through verbatim.
///
/// # Examples
///
/// ```
/// use convoflow::expr::interpolate;
/// use convoflow::vars::VariableStore;
///
/// let mut vars = VariableStore::new();
/// vars.set("user", "Ana");
/// assert_eq!(interpolate("Hello {{user}}!", &vars), "Hello Ana!");
/// assert_eq!(interpolate("Hello ${user}!", &vars), "Hello Ana!");
/// assert_eq!(interpolate("Hello {{missing}}!", &vars), "Hello !");
/// ```
#[must_use]
pub fn interpolate(template: &str, vars: &VariableStore) -> String {
    let mut out = String::with_capacity(template.len());
    let bytes = template.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'{' && bytes[i + 1..].first() == Some(&b'{') {
            if let Some(end) = template[i + 2..].find("}}") {
                let name = template[i + 2..i + 2 + end].trim();
                out.push_str(vars.get_or_empty(name));
                i += end + 4;
                continue;
            }
        } else if bytes[i] == b'$' && bytes[i + 1..].first() == Some(&b'{') {
            if let Some(end) = template[i + 2..].find('}') {
                let name = template[i + 2..i + 2 + end].trim();
                out.push_str(vars.get_or_empty(name));
                i += end + 3;
                continue;
            }
        }
        // Advance one whole character; placeholders are ASCII-delimited so
        // multi-byte characters can never begin one.
        let ch_len = template[i..].chars().next().map_or(1, char::len_utf8);
        out.push_str(&template[i..i + ch_len]);
        i += ch_len;
    }

    out
}

/// The closed set of condition operators.
///
/// Branching is restricted to these six comparisons; authored flow data can
/// never cause code evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    Empty,
    NotEmpty,
}

impl Operator {
    /// Returns `true` for operators that ignore the condition's `value` field.
    #[must_use]
    pub fn is_unary(&self) -> bool {
        matches!(self, Self::Empty | Self::NotEmpty)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::Empty => "empty",
            Self::NotEmpty => "not_empty",
        }
    }
}

impl FromStr for Operator {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" => Ok(Self::Equals),
            "not_equals" => Ok(Self::NotEquals),
            "contains" => Ok(Self::Contains),
            "not_contains" => Ok(Self::NotContains),
            "empty" => Ok(Self::Empty),
            "not_empty" => Ok(Self::NotEmpty),
            other => Err(EvalError::UnknownOperator {
                operator: other.to_string(),
            }),
        }
    }
}

/// Errors raised while evaluating a condition.
///
/// These are recoverable: the caller treats the condition as `false` and
/// surfaces the error through the session event stream rather than aborting.
#[derive(Debug, Error, Diagnostic)]
pub enum EvalError {
    /// The authored operator string is not one of the supported operators.
    #[error("unknown condition operator: {operator:?}")]
    #[diagnostic(
        code(convoflow::expr::unknown_operator),
        help("supported operators: equals, not_equals, contains, not_contains, empty, not_empty")
    )]
    UnknownOperator { operator: String },
}

/// A branch condition over the variable store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Condition<'a> {
    /// Variable name, or a template when it contains placeholder syntax.
    pub variable: &'a str,
    /// Operator string as authored; parsed during evaluation so an unknown
    /// operator is a runtime report, not a load failure.
    pub operator: &'a str,
    /// Right-hand operand template. Ignored by unary operators.
    pub value: &'a str,
}

impl Condition<'_> {
    /// Evaluates the condition against `vars`.
    ///
    /// The left operand is the value of the named variable; when the
    /// `variable` field itself contains placeholder syntax it is interpolated
    /// instead, so authors can write either `age` or `{{age}}`. The right
    /// operand is always interpolated.
    pub fn evaluate(&self, vars: &VariableStore) -> Result<bool, EvalError> {
        let operator: Operator = self.operator.parse()?;
        let left = resolve_operand(self.variable, vars);
        Ok(match operator {
            Operator::Empty => left.is_empty(),
            Operator::NotEmpty => !left.is_empty(),
            Operator::Equals => left == interpolate(self.value, vars),
            Operator::NotEquals => left != interpolate(self.value, vars),
            Operator::Contains => left.contains(&interpolate(self.value, vars)),
            Operator::NotContains => !left.contains(&interpolate(self.value, vars)),
        })
    }
}

fn resolve_operand(field: &str, vars: &VariableStore) -> String {
    if field.contains("{{") || field.contains("${") {
        interpolate(field, vars)
    } else {
        vars.get_or_empty(field.trim()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(pairs: &[(&str, &str)]) -> VariableStore {
        let mut vars = VariableStore::new();
        for (k, v) in pairs {
            vars.set(*k, *v);
        }
        vars
    }

    #[test]
    fn test_interpolate_both_syntaxes() {
        let vars = store(&[("user", "Ana"), ("city", "Recife")]);
        assert_eq!(
            interpolate("{{user}} mora em ${city}", &vars),
            "Ana mora em Recife"
        );
        assert_eq!(interpolate("{{ user }}", &vars), "Ana");
    }

    #[test]
    fn test_interpolate_unbound_is_empty() {
        let vars = VariableStore::new();
        assert_eq!(interpolate("a{{x}}b${y}c", &vars), "abc");
    }

    #[test]
    fn test_interpolate_unterminated_passthrough() {
        let vars = store(&[("x", "1")]);
        assert_eq!(interpolate("{{x", &vars), "{{x");
        assert_eq!(interpolate("${x", &vars), "${x");
        assert_eq!(interpolate("plain $5 {solo}", &vars), "plain $5 {solo}");
    }

    #[test]
    fn test_operator_parsing() {
        assert_eq!("equals".parse::<Operator>().unwrap(), Operator::Equals);
        assert_eq!("not_empty".parse::<Operator>().unwrap(), Operator::NotEmpty);
        assert!(Operator::Empty.is_unary());
        assert!(!Operator::Contains.is_unary());

        let err = "matches".parse::<Operator>().unwrap_err();
        assert!(matches!(err, EvalError::UnknownOperator { operator } if operator == "matches"));
    }

    #[test]
    fn test_equals_and_negation() {
        let vars = store(&[("age", "18")]);
        let cond = |op: &'static str, value: &'static str| Condition {
            variable: "age",
            operator: op,
            value,
        };
        assert!(cond("equals", "18").evaluate(&vars).unwrap());
        assert!(!cond("equals", "19").evaluate(&vars).unwrap());
        assert!(cond("not_equals", "19").evaluate(&vars).unwrap());
    }

    #[test]
    fn test_contains() {
        let vars = store(&[("answer", "yes please")]);
        let cond = Condition {
            variable: "answer",
            operator: "contains",
            value: "yes",
        };
        assert!(cond.evaluate(&vars).unwrap());
        let cond = Condition {
            variable: "answer",
            operator: "not_contains",
            value: "no",
        };
        assert!(cond.evaluate(&vars).unwrap());
    }

    #[test]
    fn test_unary_operators_ignore_value() {
        let vars = store(&[("filled", "x")]);
        let empty = Condition {
            variable: "missing",
            operator: "empty",
            value: "ignored",
        };
        assert!(empty.evaluate(&vars).unwrap());
        let not_empty = Condition {
            variable: "filled",
            operator: "not_empty",
            value: "ignored",
        };
        assert!(not_empty.evaluate(&vars).unwrap());
    }

    #[test]
    fn test_unbound_variable_compares_as_empty() {
        let vars = VariableStore::new();
        let cond = Condition {
            variable: "ghost",
            operator: "equals",
            value: "anything",
        };
        assert!(!cond.evaluate(&vars).unwrap());
    }

    #[test]
    fn test_templated_left_operand() {
        let vars = store(&[("a", "1"), ("b", "2")]);
        let cond = Condition {
            variable: "{{a}}-{{b}}",
            operator: "equals",
            value: "1-2",
        };
        assert!(cond.evaluate(&vars).unwrap());
    }

    #[test]
    fn test_unknown_operator_is_error() {
        let vars = VariableStore::new();
        let cond = Condition {
            variable: "x",
            operator: "regex",
            value: "y",
        };
        assert!(cond.evaluate(&vars).is_err());
    }
}
