//! Block types: the immutable, registry-defined kinds of network operation.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::params::{ParamIssue, ParamKind, ParamSchema, ParamSpec, ParamValue, Params};
use crate::port::Port;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockCategory {
    #[default]
    Layer,
    Activation,
    Operation,
    Attention,
}

impl BlockCategory {
    pub const ALL: [BlockCategory; 4] = [
        BlockCategory::Layer,
        BlockCategory::Activation,
        BlockCategory::Operation,
        BlockCategory::Attention,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockCategory::Layer => "layer",
            BlockCategory::Activation => "activation",
            BlockCategory::Operation => "operation",
            BlockCategory::Attention => "attention",
        }
    }
}

impl fmt::Display for BlockCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockCategory {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RegistryError::UnknownCategory { name: s.to_string() })
    }
}

/// A block type with its port contract, defaults and parameter schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockType {
    #[serde(rename = "type")]
    pub type_name: String,
    pub label: String,
    pub category: BlockCategory,
    #[serde(default)]
    pub description: String,
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
    pub default_params: Params,
    pub param_schema: ParamSchema,
}

impl BlockType {
    pub fn new(
        type_name: impl Into<String>,
        label: impl Into<String>,
        category: BlockCategory,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            label: label.into(),
            category,
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            default_params: Params::new(),
            param_schema: ParamSchema::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_input(mut self, port: Port) -> Self {
        self.inputs.push(port);
        self
    }

    pub fn with_output(mut self, port: Port) -> Self {
        self.outputs.push(port);
        self
    }

    /// Declare a parameter with its default value.
    pub fn with_param(mut self, name: &str, kind: ParamKind, default: impl Into<ParamValue>) -> Self {
        self.default_params.insert(name.to_string(), default.into());
        self.param_schema.push(ParamSpec {
            name: name.to_string(),
            kind,
            optional: false,
        });
        self
    }

    /// Declare a nullable parameter; `default` may be `ParamValue::Null`.
    pub fn with_optional_param(mut self, name: &str, kind: ParamKind, default: ParamValue) -> Self {
        self.default_params.insert(name.to_string(), default);
        self.param_schema.push(ParamSpec {
            name: name.to_string(),
            kind,
            optional: true,
        });
        self
    }

    pub fn input(&self, port_id: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.id == port_id)
    }

    pub fn output(&self, port_id: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.id == port_id)
    }

    pub fn has_input(&self, port_id: &str) -> bool {
        self.input(port_id).is_some()
    }

    pub fn has_output(&self, port_id: &str) -> bool {
        self.output(port_id).is_some()
    }

    /// Fresh, independently owned copy of the default parameters.
    pub fn instantiate_params(&self) -> Params {
        self.default_params.clone()
    }

    pub fn validate_params(&self, params: &Params) -> Vec<ParamIssue> {
        self.param_schema.validate(params)
    }

    /// First port id that appears twice on the same side, if any.
    pub(crate) fn duplicate_port(&self) -> Option<&str> {
        for ports in [&self.inputs, &self.outputs] {
            for (i, port) in ports.iter().enumerate() {
                if ports[..i].iter().any(|p| p.id == port.id) {
                    return Some(&port.id);
                }
            }
        }
        None
    }
}

/// Unbounded number.
pub fn number() -> ParamKind {
    ParamKind::Number { min: None, max: None }
}

/// Number with an inclusive lower bound.
pub fn at_least(min: f64) -> ParamKind {
    ParamKind::Number {
        min: Some(min),
        max: None,
    }
}

/// Number within an inclusive range.
pub fn between(min: f64, max: f64) -> ParamKind {
    ParamKind::Number {
        min: Some(min),
        max: Some(max),
    }
}

pub fn one_of(variants: &[&str]) -> ParamKind {
    ParamKind::Enum {
        variants: variants.iter().map(|v| v.to_string()).collect(),
    }
}
