//! Declarative response-shape checks for provider JSON bodies.
//!
//! A path such as `choices[0].message.content` is written once as a slice of
//! `Step`s. Walking it yields either the string at the end or a single
//! `ShapeViolation` naming the first field that did not match.

use std::fmt::Write as _;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Key(&'static str),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{field}` {problem}")]
pub struct ShapeViolation {
    /// Dotted path of the offending field, or `response body` for the root.
    pub field: String,
    pub problem: &'static str,
}

fn violation(field: &str, problem: &'static str) -> ShapeViolation {
    let field = if field.is_empty() {
        "response body".to_string()
    } else {
        field.to_string()
    };
    ShapeViolation { field, problem }
}

/// Follows `path` from `root` and returns the non-null string found there.
pub fn require_str<'a>(root: &'a Value, path: &[Step]) -> Result<&'a str, ShapeViolation> {
    let mut current = root;
    let mut field = String::new();

    for step in path {
        match *step {
            Step::Key(key) => {
                let object = current
                    .as_object()
                    .ok_or_else(|| violation(&field, "is not an object"))?;
                if !field.is_empty() {
                    field.push('.');
                }
                field.push_str(key);
                current = object.get(key).ok_or_else(|| violation(&field, "is missing"))?;
            }
            Step::Index(i) => {
                let array = current
                    .as_array()
                    .ok_or_else(|| violation(&field, "is not an array"))?;
                let _ = write!(field, "[{i}]");
                current = array.get(i).ok_or_else(|| violation(&field, "is missing"))?;
            }
        }
    }

    match current {
        Value::String(s) => Ok(s.as_str()),
        Value::Null => Err(violation(&field, "is null")),
        _ => Err(violation(&field, "is not a string")),
    }
}
