//! Argument validation against a tool descriptor.
//!
//! Validation is total: every declared field is checked and every
//! violation is reported in one pass, so a caller sees all problems at
//! once. Unrecognized fields are ignored for forward compatibility.

use serde_json::{Map, Value};

use super::ToolDescriptor;
use crate::error::ToolError;

/// Arguments that passed schema checking, with defaults filled in.
///
/// Only [`validate`] constructs this, so an operation body can rely on
/// required fields being present with their declared types.
#[derive(Debug, Clone)]
pub struct ValidatedArguments(Map<String, Value>);

impl ValidatedArguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// A required (or defaulted) string argument.
    pub fn str(&self, name: &str) -> Result<&str, ToolError> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| missing(name))
    }

    /// A required (or defaulted) integer argument.
    pub fn u64(&self, name: &str) -> Result<u64, ToolError> {
        self.0
            .get(name)
            .and_then(Value::as_u64)
            .ok_or_else(|| missing(name))
    }

    /// An optional string argument with no default.
    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// A boolean argument, falling back when absent.
    pub fn bool_or(&self, name: &str, fallback: bool) -> bool {
        self.0
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(fallback)
    }

    /// A string-list argument.
    pub fn str_list(&self, name: &str) -> Result<Vec<String>, ToolError> {
        let items = self
            .0
            .get(name)
            .and_then(Value::as_array)
            .ok_or_else(|| missing(name))?;
        Ok(items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect())
    }
}

fn missing(name: &str) -> ToolError {
    // Unreachable after validation; kept as a classified error rather
    // than a panic so the dispatcher boundary holds regardless.
    ToolError::Internal(format!("validated argument '{}' is missing", name))
}

/// Checks raw arguments against a descriptor's schema.
///
/// On success, returns the defaulted argument set. On failure, returns a
/// `ValidationError` whose message is the comma-joined list of every
/// violation.
pub fn validate(
    descriptor: &ToolDescriptor,
    raw_arguments: &Value,
) -> Result<ValidatedArguments, ToolError> {
    let raw = match raw_arguments {
        Value::Null => Map::new(),
        Value::Object(map) => map.clone(),
        other => {
            return Err(ToolError::InvalidArguments(format!(
                "arguments must be a JSON object, got {}",
                super::value_type_name(other)
            )));
        }
    };

    let mut violations = Vec::new();
    let mut validated = Map::new();

    for spec in &descriptor.params {
        match raw.get(spec.name) {
            Some(value) => match spec.kind.check(value) {
                Ok(()) => {
                    validated.insert(spec.name.to_string(), value.clone());
                }
                Err(reason) => violations.push(format!("{}: {}", spec.name, reason)),
            },
            None if spec.required => {
                violations.push(format!("missing required argument: {}", spec.name));
            }
            None => {
                if let Some(default) = &spec.default {
                    validated.insert(spec.name.to_string(), default.clone());
                }
            }
        }
    }

    if violations.is_empty() {
        Ok(ValidatedArguments(validated))
    } else {
        Err(ToolError::InvalidArguments(violations.join(", ")))
    }
}
