//! Connection validation.
//!
//! Checks run in a fixed order and stop at the first failure: endpoints exist,
//! block types resolve, ports are declared, data kinds are compatible. Nothing
//! else (fan-in, cycles) is checked.

use core::fmt;

use nc_blocks::{BlockRegistry, DataKind};

use crate::graph::NodeInstance;

/// Why a connection is not well-typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionIssue {
    InvalidNodes,
    UnknownBlockType,
    InvalidPort,
    TypeMismatch { source: DataKind, target: DataKind },
}

impl fmt::Display for ConnectionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionIssue::InvalidNodes => f.write_str("Invalid nodes"),
            ConnectionIssue::UnknownBlockType => f.write_str("Unknown block type"),
            ConnectionIssue::InvalidPort => f.write_str("Invalid port"),
            ConnectionIssue::TypeMismatch { source, target } => {
                write!(f, "Type mismatch: {source} → {target}")
            }
        }
    }
}

/// Validity tag stored on every edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionVerdict {
    #[default]
    Valid,
    Invalid(ConnectionIssue),
}

impl ConnectionVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, ConnectionVerdict::Valid)
    }

    pub fn issue(&self) -> Option<ConnectionIssue> {
        match self {
            ConnectionVerdict::Valid => None,
            ConnectionVerdict::Invalid(issue) => Some(*issue),
        }
    }

    /// Human-readable reason, `None` for valid connections.
    pub fn message(&self) -> Option<String> {
        self.issue().map(|issue| issue.to_string())
    }
}

impl From<Result<(), ConnectionIssue>> for ConnectionVerdict {
    fn from(result: Result<(), ConnectionIssue>) -> Self {
        match result {
            Ok(()) => ConnectionVerdict::Valid,
            Err(issue) => ConnectionVerdict::Invalid(issue),
        }
    }
}

/// Judge a connection from `source_port` on `source` to `target_port` on `target`.
pub fn validate_connection(
    registry: &BlockRegistry,
    source: Option<&NodeInstance>,
    target: Option<&NodeInstance>,
    source_port: &str,
    target_port: &str,
) -> ConnectionVerdict {
    check(registry, source, target, source_port, target_port).into()
}

fn check(
    registry: &BlockRegistry,
    source: Option<&NodeInstance>,
    target: Option<&NodeInstance>,
    source_port: &str,
    target_port: &str,
) -> Result<(), ConnectionIssue> {
    let (Some(source), Some(target)) = (source, target) else {
        return Err(ConnectionIssue::InvalidNodes);
    };

    let (Some(source_block), Some(target_block)) = (
        registry.lookup(&source.block_type),
        registry.lookup(&target.block_type),
    ) else {
        return Err(ConnectionIssue::UnknownBlockType);
    };

    let (Some(out_port), Some(in_port)) = (
        source_block.output(source_port),
        target_block.input(target_port),
    ) else {
        return Err(ConnectionIssue::InvalidPort);
    };

    if !out_port.kind.is_compatible_with(in_port.kind) {
        return Err(ConnectionIssue::TypeMismatch {
            source: out_port.kind,
            target: in_port.kind,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nc_blocks::{BlockCategory, BlockType, Params, Port};
    use nc_core::{NodeId, Position};

    fn registry() -> BlockRegistry {
        let mut registry = BlockRegistry::new();
        let blocks = [
            BlockType::new("emit", "Emit", BlockCategory::Layer)
                .with_output(Port::tensor("out", "Out")),
            BlockType::new("takes_scalar", "Scalar", BlockCategory::Operation)
                .with_input(Port::scalar("in", "In")),
            BlockType::new("takes_any", "Any", BlockCategory::Operation)
                .with_input(Port::any("in", "In")),
        ];
        for block in blocks {
            registry.register(block).unwrap();
        }
        registry
    }

    fn node(id: &str, block_type: &str) -> NodeInstance {
        NodeInstance {
            id: NodeId::new(id),
            block_type: block_type.to_string(),
            label: block_type.to_string(),
            category: BlockCategory::Layer,
            params: Params::new(),
            position: Position::ORIGIN,
        }
    }

    #[test]
    fn missing_node() {
        let registry = registry();
        let a = node("node_1", "emit");
        let verdict = validate_connection(&registry, Some(&a), None, "out", "in");
        assert_eq!(verdict, ConnectionVerdict::Invalid(ConnectionIssue::InvalidNodes));
        assert_eq!(verdict.message().as_deref(), Some("Invalid nodes"));
    }

    #[test]
    fn unknown_type_precedes_port_check() {
        let registry = registry();
        let a = node("node_1", "emit");
        let b = node("node_2", "mystery");
        let verdict = validate_connection(&registry, Some(&a), Some(&b), "nope", "nope");
        assert_eq!(verdict.issue(), Some(ConnectionIssue::UnknownBlockType));
    }

    #[test]
    fn port_direction_matters() {
        let registry = registry();
        let a = node("node_1", "emit");
        let b = node("node_2", "takes_any");
        // "in" is an input of b, not an output of b.
        let verdict = validate_connection(&registry, Some(&b), Some(&a), "in", "out");
        assert_eq!(verdict.issue(), Some(ConnectionIssue::InvalidPort));
    }

    #[test]
    fn tensor_to_scalar_mismatch_and_wildcard() {
        let registry = registry();
        let a = node("node_1", "emit");
        let scalar = node("node_2", "takes_scalar");
        let any = node("node_3", "takes_any");

        let verdict = validate_connection(&registry, Some(&a), Some(&scalar), "out", "in");
        assert!(!verdict.is_valid());
        let message = verdict.message().unwrap();
        assert!(message.contains("tensor") && message.contains("scalar"));
        assert_eq!(message, "Type mismatch: tensor → scalar");

        let verdict = validate_connection(&registry, Some(&a), Some(&any), "out", "in");
        assert!(verdict.is_valid());
        assert_eq!(verdict.message(), None);
    }
}
