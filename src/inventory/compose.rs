//! Closed expression language for inventory composition
//!
//! Only three forms parse: a dot path (`networks.public.ipv4`), a dot
//! path with a literal fallback (`path | default('x')`), and a
//! membership predicate (`'ubuntu' in image`). Anything else is a
//! config error, reported once at parse time rather than per host.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExprError {
    #[error("empty expression")]
    Empty,
    #[error("invalid path segment in `{0}`")]
    BadPath(String),
    #[error("malformed default clause in `{0}`, expected `path | default('literal')`")]
    BadDefault(String),
    #[error("malformed predicate `{0}`, expected `'literal' in path`")]
    BadPredicate(String),
}

/// A value-producing expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Path(Vec<String>),
    PathWithDefault { path: Vec<String>, default: String },
}

/// A boolean expression used for conditional groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub needle: String,
    pub path: Vec<String>,
}

fn parse_path(text: &str) -> Result<Vec<String>, ExprError> {
    let segments: Vec<String> = text.split('.').map(str::to_string).collect();
    if segments.iter().any(|s| {
        s.is_empty()
            || !s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }) {
        return Err(ExprError::BadPath(text.to_string()));
    }
    Ok(segments)
}

fn parse_quoted(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    if inner.contains('\'') {
        return None;
    }
    Some(inner)
}

impl Expr {
    pub fn parse(text: &str) -> Result<Self, ExprError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ExprError::Empty);
        }
        match text.split_once('|') {
            None => Ok(Expr::Path(parse_path(text)?)),
            Some((path_part, default_part)) => {
                let path = parse_path(path_part.trim())?;
                let clause = default_part.trim();
                let literal = clause
                    .strip_prefix("default(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .and_then(|inner| parse_quoted(inner.trim()))
                    .ok_or_else(|| ExprError::BadDefault(text.to_string()))?;
                Ok(Expr::PathWithDefault {
                    path,
                    default: literal.to_string(),
                })
            }
        }
    }

    /// Evaluate against a host record. A missing path yields the default
    /// when one was given, otherwise `None`.
    pub fn eval(&self, record: &Value) -> Option<Value> {
        match self {
            Expr::Path(path) => lookup(record, path).cloned(),
            Expr::PathWithDefault { path, default } => match lookup(record, path) {
                Some(Value::Null) | None => Some(Value::String(default.clone())),
                Some(found) => Some(found.clone()),
            },
        }
    }
}

impl Predicate {
    pub fn parse(text: &str) -> Result<Self, ExprError> {
        let text = text.trim();
        let (needle_part, path_part) = text
            .split_once(" in ")
            .ok_or_else(|| ExprError::BadPredicate(text.to_string()))?;
        let needle = parse_quoted(needle_part.trim())
            .ok_or_else(|| ExprError::BadPredicate(text.to_string()))?;
        Ok(Predicate {
            needle: needle.to_string(),
            path: parse_path(path_part.trim())?,
        })
    }

    /// Substring match on strings, membership on arrays. Any other
    /// attribute shape (or a missing attribute) is false.
    pub fn matches(&self, record: &Value) -> bool {
        match lookup(record, &self.path) {
            Some(Value::String(s)) => s.contains(&self.needle),
            Some(Value::Array(items)) => items
                .iter()
                .any(|item| item.as_str() == Some(self.needle.as_str())),
            _ => false,
        }
    }
}

fn lookup<'a>(record: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = record;
    for segment in path {
        current = current.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_path_eval() {
        let expr = Expr::parse("networks.public.ipv4").unwrap();
        let record = json!({"networks": {"public": {"ipv4": "203.0.113.9"}}});
        assert_eq!(expr.eval(&record), Some(json!("203.0.113.9")));
        assert_eq!(expr.eval(&json!({})), None);
    }

    #[test]
    fn default_fallback_covers_missing_and_null() {
        let expr = Expr::parse("project | default('none')").unwrap();
        assert_eq!(expr.eval(&json!({})), Some(json!("none")));
        assert_eq!(expr.eval(&json!({"project": null})), Some(json!("none")));
        assert_eq!(expr.eval(&json!({"project": "z5"})), Some(json!("z5")));
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        assert!(Expr::parse("").is_err());
        assert!(Expr::parse("a..b").is_err());
        assert!(Expr::parse("a | fallback('x')").is_err());
        assert!(Expr::parse("a | default(x)").is_err());
        assert!(Expr::parse("a b c").is_err());
    }

    #[test]
    fn predicate_substring_and_membership() {
        let pred = Predicate::parse("'ubuntu' in image").unwrap();
        assert!(pred.matches(&json!({"image": "ubuntu22"})));
        assert!(!pred.matches(&json!({"image": "debian12"})));
        assert!(!pred.matches(&json!({})));

        let tags = Predicate::parse("'ubuntu' in tags").unwrap();
        assert!(tags.matches(&json!({"tags": ["web", "ubuntu"]})));
        assert!(!tags.matches(&json!({"tags": ["ubuntu22"]})));
    }

    #[test]
    fn predicate_requires_quoted_needle() {
        assert!(Predicate::parse("ubuntu in image").is_err());
        assert!(Predicate::parse("'ubuntu' near image").is_err());
    }
}
