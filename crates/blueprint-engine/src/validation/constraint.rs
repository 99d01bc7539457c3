use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use regex::Regex;
use serde_json::Value;

use super::{ValidationError, Validator};

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

// Wrap constraints up in an enum so a field can carry any mix of them.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, strum::AsRefStr, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Constraint {
    Length(LengthConstraint),
    Range(RangeConstraint),
    Pattern(String),
    OneOf(Vec<Value>),
    Email,
}

impl Constraint {
    pub fn length(min: Option<usize>, max: Option<usize>) -> Self {
        Self::Length(LengthConstraint { min, max })
    }

    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Self::Range(RangeConstraint { min, max })
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::Pattern(pattern.into())
    }

    pub fn one_of(values: impl IntoIterator<Item = Value>) -> Self {
        Self::OneOf(values.into_iter().collect())
    }

    pub fn email() -> Self {
        Self::Email
    }
}

/// Character count of a string or length of a list.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LengthConstraint {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RangeConstraint {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Checks every [`Constraint`] in order and reports the first one failing.
#[derive(Default)]
pub struct ConstraintValidator {
    patterns: Mutex<HashMap<String, Regex>>,
}

impl ConstraintValidator {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self, key: &str, value: &Value, constraint: &Constraint) -> Result<(), String> {
        match constraint {
            Constraint::Length(LengthConstraint { min, max }) => {
                let length = match value {
                    Value::String(string) => string.chars().count(),
                    Value::Array(items) => items.len(),
                    _ => return Err("expected a string or a list".to_owned()),
                };
                if let Some(min) = min.filter(|min| length < *min) {
                    return Err(format!("must be at least {min} long, got {length}"));
                }
                if let Some(max) = max.filter(|max| length > *max) {
                    return Err(format!("must be at most {max} long, got {length}"));
                }
                Ok(())
            }
            Constraint::Range(RangeConstraint { min, max }) => {
                let number = value.as_f64().ok_or_else(|| "expected a number".to_owned())?;
                if let Some(min) = min.filter(|min| number < *min) {
                    return Err(format!("must be at least {min}, got {number}"));
                }
                if let Some(max) = max.filter(|max| number > *max) {
                    return Err(format!("must be at most {max}, got {number}"));
                }
                Ok(())
            }
            Constraint::Pattern(pattern) => {
                let string = value.as_str().ok_or_else(|| "expected a string".to_owned())?;
                if self.is_match(pattern, string)? {
                    Ok(())
                } else {
                    Err(format!("must match `{pattern}`"))
                }
            }
            Constraint::OneOf(values) => {
                if values.contains(value) {
                    Ok(())
                } else {
                    Err(format!("must be one of {}", Value::Array(values.clone())))
                }
            }
            Constraint::Email => {
                let string = value.as_str().ok_or_else(|| "expected a string".to_owned())?;
                if self.is_match(EMAIL_PATTERN, string)? {
                    Ok(())
                } else {
                    Err(format!("`{string}` is not an email address"))
                }
            }
        }
        .map_err(|message| {
            tracing::debug!(key, constraint = constraint.as_ref(), message = message.as_str(), "constraint failed");
            message
        })
    }

    fn is_match(&self, pattern: &str, string: &str) -> Result<bool, String> {
        let mut patterns = self.patterns.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(regex) = patterns.get(pattern) {
            return Ok(regex.is_match(string));
        }

        let regex = Regex::new(pattern).map_err(|err| format!("invalid pattern: {err}"))?;
        let is_match = regex.is_match(string);
        patterns.insert(pattern.to_owned(), regex);

        Ok(is_match)
    }
}

#[async_trait::async_trait]
impl Validator for ConstraintValidator {
    async fn validate(&self, key: &str, value: &Value, constraints: &[Constraint]) -> Result<(), ValidationError> {
        for constraint in constraints {
            self.check(key, value, constraint)
                .map_err(|message| ValidationError::new(key, constraint.as_ref(), message))?;
        }
        Ok(())
    }
}
