//! Offline code generator.
//!
//! Emits one constructor line and one call line per node, in topological
//! order, so the node mapping is exact rather than inferred. Useful without
//! network access and as a deterministic stand-in for the external service.

use std::sync::Arc;

use nc_blocks::{BlockRegistry, Params};
use nc_core::NodeId;
use nc_graph::ArchitectureGraph;
use serde_json::Value;
use tracing::debug;

use crate::codegen::{CodeGenerator, Framework, GenerateRequest, GenerateResponse, LineRange, NodeMapping};
use crate::error::{AppError, AppResult};

const CLASS_NAME: &str = "GeneratedModel";

#[derive(Debug, Clone)]
pub struct SkeletonGenerator {
    registry: Arc<BlockRegistry>,
}

impl Default for SkeletonGenerator {
    fn default() -> Self {
        Self::new(BlockRegistry::shared())
    }
}

/// Per-framework class scaffolding.
struct Dialect {
    base: &'static str,
    init: &'static str,
    super_call: bool,
    call: &'static str,
    layers: &'static str,
}

impl Dialect {
    fn of(framework: Framework) -> Self {
        match framework {
            Framework::Pytorch => Dialect {
                base: "nn.Module",
                init: "__init__",
                super_call: true,
                call: "forward",
                layers: "nn",
            },
            Framework::Tensorflow => Dialect {
                base: "keras.Model",
                init: "__init__",
                super_call: true,
                call: "call",
                layers: "layers",
            },
            Framework::Jax => Dialect {
                base: "nn.Module",
                init: "setup",
                super_call: false,
                call: "__call__",
                layers: "nn",
            },
        }
    }
}

impl SkeletonGenerator {
    pub fn new(registry: Arc<BlockRegistry>) -> Self {
        Self { registry }
    }

    fn render(&self, graph: &ArchitectureGraph, framework: Framework) -> (String, NodeMapping) {
        let dialect = Dialect::of(framework);
        let order = graph
            .topological_order()
            .unwrap_or_else(|| graph.nodes().iter().map(|n| n.id.clone()).collect());

        let mut lines: Vec<String> = framework.imports().lines().map(str::to_string).collect();
        lines.push(String::new());
        lines.push(String::new());
        lines.push(format!("class {CLASS_NAME}({}):", dialect.base));
        lines.push(format!("    \"\"\"Generated from {} nodes.\"\"\"", order.len()));
        lines.push(String::new());
        lines.push(format!("    def {}(self):", dialect.init));
        if dialect.super_call {
            lines.push("        super().__init__()".to_string());
        }

        let mut init_lines = Vec::with_capacity(order.len());
        for id in &order {
            let Some(node) = graph.node(id) else { continue };
            lines.push(format!(
                "        self.{} = {}.{}({})  # {}",
                attribute(id),
                dialect.layers,
                class_name(&node.block_type),
                python_kwargs(&node.params),
                node.label
            ));
            init_lines.push((id.clone(), lines.len()));
        }

        lines.push(String::new());
        lines.push(format!("    def {}(self, *inputs):", dialect.call));
        let mut mapping = NodeMapping::new();
        let mut free_inputs = 0usize;
        let mut last_var = None;
        for (id, init_line) in init_lines {
            let args = self.arguments(graph, &id, &mut free_inputs);
            let var = format!("h_{}", attribute(&id));
            lines.push(format!("        {var} = self.{}({})", attribute(&id), args.join(", ")));
            mapping.insert(
                id,
                LineRange {
                    start_line: init_line,
                    end_line: lines.len(),
                },
            );
            last_var = Some(var);
        }
        lines.push(format!("        return {}", last_var.unwrap_or_else(|| "None".to_string())));

        lines.push(String::new());
        lines.push(String::new());
        lines.push("if __name__ == \"__main__\":".to_string());
        lines.push(format!("    model = {CLASS_NAME}()"));
        lines.push("    print(model)".to_string());

        (lines.join("\n"), mapping)
    }

    /// Call arguments for a node: upstream outputs in declared input order,
    /// or the next positional model input for a node with no incoming edges.
    fn arguments(&self, graph: &ArchitectureGraph, id: &NodeId, free_inputs: &mut usize) -> Vec<String> {
        let port_rank = |port: &str| {
            graph
                .block_of(id)
                .and_then(|b| b.inputs.iter().position(|p| p.id == port))
                .unwrap_or(usize::MAX)
        };
        let mut incoming: Vec<_> = graph.incoming(id).collect();
        incoming.sort_by_key(|e| port_rank(&e.target_port));

        if incoming.is_empty() {
            let arg = format!("inputs[{free_inputs}]");
            *free_inputs += 1;
            return vec![arg];
        }
        incoming
            .into_iter()
            .map(|e| format!("h_{}", attribute(&e.source)))
            .collect()
    }
}

impl CodeGenerator for SkeletonGenerator {
    fn generate(&self, request: &GenerateRequest) -> AppResult<GenerateResponse> {
        if request.graph.nodes.is_empty() {
            return Err(AppError::EmptyGraph);
        }
        let (graph, report) = nc_project::deserialize(self.registry.clone(), &request.graph);
        let (code, node_mapping) = self.render(&graph, request.framework);
        debug!(
            framework = %request.framework,
            nodes = graph.nodes().len(),
            repairs = report.diagnostics.len(),
            "rendered skeleton"
        );
        Ok(GenerateResponse {
            code,
            framework: request.framework,
            node_mapping,
        })
    }
}

fn attribute(id: &NodeId) -> String {
    id.as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

/// `multihead_attention` -> `MultiheadAttention`.
fn class_name(block_type: &str) -> String {
    block_type
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn python_kwargs(params: &Params) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={}", python_literal(v)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Array(items) => format!("[{}]", items.iter().map(python_literal).collect::<Vec<_>>().join(", ")),
        Value::Object(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(k, v)| format!("{}: {}", Value::String(k.clone()), python_literal(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        other => other.to_string(),
    }
}
