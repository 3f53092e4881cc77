//! Port contracts.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Coarse compatibility class of the data flowing through a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Tensor,
    Scalar,
    /// Wildcard: compatible with every kind.
    Any,
}

impl DataKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DataKind::Tensor => "tensor",
            DataKind::Scalar => "scalar",
            DataKind::Any => "any",
        }
    }

    /// Whether an output of kind `self` may feed an input of kind `target`.
    pub fn is_compatible_with(self, target: DataKind) -> bool {
        self == target || self == DataKind::Any || target == DataKind::Any
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side of the node box a port handle is drawn on. Layout only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgePosition {
    Top,
    Right,
    Bottom,
    Left,
}

/// Direction of a port relative to its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    pub fn default_position(self) -> EdgePosition {
        match self {
            PortDirection::Input => EdgePosition::Left,
            PortDirection::Output => EdgePosition::Right,
        }
    }
}

/// A named, typed attachment point declared by a block type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub kind: DataKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<EdgePosition>,
}

impl Port {
    pub fn new(id: impl Into<String>, kind: DataKind) -> Self {
        Self {
            id: id.into(),
            kind,
            label: None,
            position: None,
        }
    }

    pub fn tensor(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, DataKind::Tensor).labeled(label)
    }

    pub fn scalar(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, DataKind::Scalar).labeled(label)
    }

    pub fn any(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, DataKind::Any).labeled(label)
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn at(mut self, position: EdgePosition) -> Self {
        self.position = Some(position);
        self
    }

    /// Handle placement, falling back to left for inputs and right for outputs.
    pub fn edge_position(&self, direction: PortDirection) -> EdgePosition {
        self.position.unwrap_or_else(|| direction.default_position())
    }
}
