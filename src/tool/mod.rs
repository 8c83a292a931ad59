//! Tool descriptors, the call envelope, and the dispatch machinery.

pub mod catalog;
pub mod dispatcher;
pub mod ops;
pub mod poll;
pub mod validate;

pub use catalog::ToolCatalog;
pub use dispatcher::Dispatcher;
pub use poll::{PollSession, PollState, RETRYABLE_STATUSES};
pub use validate::{ValidatedArguments, validate};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorKind, ToolError};

/// Declared type of a tool parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    Str,
    Int,
    Bool,
    StrList,
    /// String restricted to a fixed value set.
    Enum(&'static [&'static str]),
}

impl ParamKind {
    /// Checks a JSON value against this kind.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            ParamKind::Str => {
                if value.is_string() {
                    Ok(())
                } else {
                    Err(format!("expected string, got {}", value_type_name(value)))
                }
            }
            ParamKind::Int => {
                // Pages, sizes, and durations: negative values are as
                // invalid as non-integers, and must be caught here so
                // operation bodies never see one.
                if value.is_u64() {
                    Ok(())
                } else if value.is_i64() {
                    Err(format!("expected non-negative integer, got {}", value))
                } else {
                    Err(format!("expected integer, got {}", value_type_name(value)))
                }
            }
            ParamKind::Bool => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(format!("expected boolean, got {}", value_type_name(value)))
                }
            }
            ParamKind::StrList => match value.as_array() {
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        if !item.is_string() {
                            return Err(format!(
                                "expected string at index {}, got {}",
                                i,
                                value_type_name(item)
                            ));
                        }
                    }
                    Ok(())
                }
                None => Err(format!("expected array, got {}", value_type_name(value))),
            },
            ParamKind::Enum(allowed) => match value.as_str() {
                Some(s) if allowed.contains(&s) => Ok(()),
                Some(s) => Err(format!(
                    "invalid value '{}', expected one of: {}",
                    s,
                    allowed.join(", ")
                )),
                None => Err(format!("expected string, got {}", value_type_name(value))),
            },
        }
    }

    /// Short type name used when listing the catalog.
    pub fn display_name(&self) -> String {
        match self {
            ParamKind::Str => "string".to_string(),
            ParamKind::Int => "integer".to_string(),
            ParamKind::Bool => "boolean".to_string(),
            ParamKind::StrList => "string[]".to_string(),
            ParamKind::Enum(allowed) => format!("enum({})", allowed.join("|")),
        }
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    /// Substituted when the caller omits the field.
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
        }
    }

    pub fn with_default(name: &'static str, kind: ParamKind, default: Value) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: Some(default),
        }
    }
}

/// Immutable description of one tool: stable name, human description,
/// declared parameters. Owned by the catalog for the process lifetime.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
}

impl ToolDescriptor {
    pub fn new(name: &'static str, description: &'static str, params: Vec<ParamSpec>) -> Self {
        Self {
            name,
            description,
            params,
        }
    }

    /// One-line signature, e.g. `scan_mobile_app(hash: string, scan_type?: enum(apk|ipa|zip))`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                let optional = if p.required { "" } else { "?" };
                format!("{}{}: {}", p.name, optional, p.kind.display_name())
            })
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// One inbound tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    pub name: String,
    /// Raw arguments; absent or null is treated as empty.
    #[serde(default)]
    pub arguments: Value,
}

impl CallRequest {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// The uniform envelope every invocation resolves to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallResult {
    Success { payload: Value },
    Failure { kind: ErrorKind, message: String },
}

impl CallResult {
    pub fn success(payload: Value) -> Self {
        CallResult::Success { payload }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        CallResult::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallResult::Success { .. })
    }
}

impl From<ToolError> for CallResult {
    fn from(error: ToolError) -> Self {
        CallResult::Failure {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enum_kind_checks_membership() {
        let kind = ParamKind::Enum(&["apk", "ipa", "zip"]);
        assert!(kind.check(&json!("apk")).is_ok());
        assert!(kind.check(&json!("exe")).is_err());
        assert!(kind.check(&json!(3)).is_err());
    }

    #[test]
    fn int_kind_rejects_negative_values() {
        let kind = ParamKind::Int;
        assert!(kind.check(&json!(1)).is_ok());
        assert!(kind.check(&json!(0)).is_ok());
        assert!(kind.check(&json!(-1)).is_err());
        assert!(kind.check(&json!(1.5)).is_err());
        assert!(kind.check(&json!("1")).is_err());
    }

    #[test]
    fn str_list_kind_rejects_mixed_arrays() {
        let kind = ParamKind::StrList;
        assert!(kind.check(&json!(["a", "b"])).is_ok());
        assert!(kind.check(&json!(["a", 1])).is_err());
        assert!(kind.check(&json!("a")).is_err());
    }

    #[test]
    fn signature_marks_optional_params() {
        let descriptor = ToolDescriptor::new(
            "scan_mobile_app",
            "Trigger a scan",
            vec![
                ParamSpec::required("hash", ParamKind::Str),
                ParamSpec::with_default(
                    "scan_type",
                    ParamKind::Enum(&["apk", "ipa", "zip"]),
                    json!("apk"),
                ),
            ],
        );
        assert_eq!(
            descriptor.signature(),
            "scan_mobile_app(hash: string, scan_type?: enum(apk|ipa|zip))"
        );
    }

    #[test]
    fn call_request_defaults_arguments_to_null() {
        let request: CallRequest = serde_json::from_str(r#"{"name": "health_check"}"#).unwrap();
        assert_eq!(request.name, "health_check");
        assert!(request.arguments.is_null());
    }

    #[test]
    fn call_result_serializes_with_status_tag() {
        let rendered =
            serde_json::to_value(CallResult::failure(ErrorKind::NotFound, "Unknown tool: x"))
                .unwrap();
        assert_eq!(rendered["status"], "failure");
        assert_eq!(rendered["kind"], "not_found");
    }
}
