//! Block parameters and their advisory schema.
//!
//! Parameter values are plain JSON values so interactively edited,
//! half-typed values can be stored as-is. The schema never gates an edit; it
//! only reports issues for the caller to surface.

use core::fmt;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type ParamValue = serde_json::Value;

/// Parameter name -> value, ordered for deterministic output.
pub type Params = BTreeMap<String, ParamValue>;

/// Primitive shape of a single parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParamKind {
    Boolean,
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    String,
    Enum {
        variants: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: ParamKind,
    /// Optional parameters accept `null`.
    #[serde(default)]
    pub optional: bool,
}

/// One advisory finding about a parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamIssue {
    /// Offending parameter; empty for issues about the whole block.
    pub param: String,
    pub message: String,
}

impl ParamIssue {
    pub fn new(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            message: message.into(),
        }
    }

    pub fn block(message: impl Into<String>) -> Self {
        Self::new(String::new(), message)
    }
}

impl fmt::Display for ParamIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.param.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.param, self.message)
        }
    }
}

/// Per-parameter validation contract of a block type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSchema {
    specs: Vec<ParamSpec>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    pub fn spec(&self, name: &str) -> Option<&ParamSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn push(&mut self, spec: ParamSpec) {
        self.specs.retain(|s| s.name != spec.name);
        self.specs.push(spec);
    }

    /// Check `params` against the schema.
    ///
    /// Missing keys are fine (defaults apply) and keys the schema does not
    /// know are ignored.
    pub fn validate(&self, params: &Params) -> Vec<ParamIssue> {
        let mut issues = Vec::new();
        for spec in &self.specs {
            let Some(value) = params.get(&spec.name) else {
                continue;
            };
            if value.is_null() && spec.optional {
                continue;
            }
            if let Some(message) = check_value(&spec.kind, value) {
                issues.push(ParamIssue::new(spec.name.clone(), message));
            }
        }
        issues
    }
}

fn check_value(kind: &ParamKind, value: &ParamValue) -> Option<String> {
    match kind {
        ParamKind::Boolean => {
            if value.is_boolean() {
                None
            } else {
                Some(expected("boolean", value))
            }
        }
        ParamKind::Number { min, max } => {
            let Some(number) = value.as_f64() else {
                return Some(expected("number", value));
            };
            if let Some(min) = min {
                if number < *min {
                    return Some(format!("Number must be greater than or equal to {min}"));
                }
            }
            if let Some(max) = max {
                if number > *max {
                    return Some(format!("Number must be less than or equal to {max}"));
                }
            }
            None
        }
        ParamKind::String => {
            if value.is_string() {
                None
            } else {
                Some(expected("string", value))
            }
        }
        ParamKind::Enum { variants } => {
            let Some(text) = value.as_str() else {
                return Some(expected("string", value));
            };
            if variants.iter().any(|v| v == text) {
                None
            } else {
                let options = variants
                    .iter()
                    .map(|v| format!("'{v}'"))
                    .collect::<Vec<_>>()
                    .join(" | ");
                Some(format!(
                    "Invalid enum value. Expected {options}, received '{text}'"
                ))
            }
        }
    }
}

fn expected(kind: &str, value: &ParamValue) -> String {
    format!("Expected {kind}, received {}", json_type_name(value))
}

fn json_type_name(value: &ParamValue) -> &'static str {
    match value {
        ParamValue::Null => "null",
        ParamValue::Bool(_) => "boolean",
        ParamValue::Number(_) => "number",
        ParamValue::String(_) => "string",
        ParamValue::Array(_) => "array",
        ParamValue::Object(_) => "object",
    }
}
