//! Boundary to the external code-generation service.
//!
//! The service itself is a collaborator behind [`CodeGenerator`]; this module
//! owns the request/response shapes, the prompt text and the post-processing
//! applied to whatever text comes back.

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

use nc_core::NodeId;
use nc_project::{SerializedGraph, SerializedNode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Target framework of generated code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    #[default]
    Pytorch,
    Tensorflow,
    Jax,
}

impl Framework {
    pub const ALL: [Framework; 3] = [Framework::Pytorch, Framework::Tensorflow, Framework::Jax];

    pub fn as_str(self) -> &'static str {
        match self {
            Framework::Pytorch => "pytorch",
            Framework::Tensorflow => "tensorflow",
            Framework::Jax => "jax",
        }
    }

    /// Import block the generated module starts with.
    pub fn imports(self) -> &'static str {
        match self {
            Framework::Pytorch => "import torch\nimport torch.nn as nn\nimport torch.nn.functional as F",
            Framework::Tensorflow => {
                "import tensorflow as tf\nfrom tensorflow import keras\nfrom tensorflow.keras import layers"
            }
            Framework::Jax => "import jax\nimport jax.numpy as jnp\nfrom flax import linen as nn",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Framework::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::UnknownOption {
                what: "framework",
                value: s.to_string(),
            })
    }
}

/// Backing text-generation service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    Openai,
    Together,
    Openrouter,
    Mistral,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::Gemini,
        Provider::Openai,
        Provider::Together,
        Provider::Openrouter,
        Provider::Mistral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::Openai => "openai",
            Provider::Together => "together",
            Provider::Openrouter => "openrouter",
            Provider::Mistral => "mistral",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Openai => "OpenAI",
            Provider::Together => "Together",
            Provider::Openrouter => "OpenRouter",
            Provider::Mistral => "Mistral",
        }
    }

    /// Environment variable holding the provider's API key.
    pub fn env_var(self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::Openai => "OPENAI_API_KEY",
            Provider::Together => "TOGETHER_API_KEY",
            Provider::Openrouter => "OPENROUTER_API_KEY",
            Provider::Mistral => "MISTRAL_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::UnknownOption {
                what: "provider",
                value: s.to_string(),
            })
    }
}

/// 1-based inclusive line range of a node's code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRange {
    pub start_line: usize,
    pub end_line: usize,
}

impl LineRange {
    pub fn single(line: usize) -> Self {
        Self {
            start_line: line,
            end_line: line,
        }
    }

    pub fn contains(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}

/// Node id -> line range. May be empty or cover only some nodes.
pub type NodeMapping = BTreeMap<NodeId, LineRange>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub graph: SerializedGraph,
    #[serde(default)]
    pub framework: Framework,
    #[serde(default)]
    pub provider: Provider,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub code: String,
    pub framework: Framework,
    #[serde(default)]
    pub node_mapping: NodeMapping,
}

impl GenerateResponse {
    /// Build a response from raw service output: strip fences, infer mapping.
    pub fn from_raw(raw: &str, framework: Framework, nodes: &[SerializedNode]) -> Self {
        let code = clean_code_fences(raw);
        let node_mapping = infer_node_mapping(&code, nodes);
        Self {
            code,
            framework,
            node_mapping,
        }
    }
}

/// The external code-generation collaborator.
///
/// Implementations own transport, timeouts and retries.
pub trait CodeGenerator {
    fn generate(&self, request: &GenerateRequest) -> AppResult<GenerateResponse>;
}

/// System instruction sent alongside the prompt.
pub fn system_message(framework: Framework) -> String {
    format!(
        "You are an expert ML engineer who writes clean, production-ready {framework} code. \
         Generate only valid Python code without markdown formatting or code blocks. \
         The code should be immediately executable."
    )
}

/// Describe the graph as a generation prompt.
///
/// Nodes that are nobody's target come first, then nodes are ordered by
/// their vertical position.
pub fn build_prompt(graph: &SerializedGraph, framework: Framework) -> String {
    let is_target = |id: &NodeId| graph.edges.iter().any(|e| &e.target == id);
    let mut ordered: Vec<&SerializedNode> = graph.nodes.iter().collect();
    ordered.sort_by(|a, b| {
        is_target(&a.id)
            .cmp(&is_target(&b.id))
            .then(a.position.y.total_cmp(&b.position.y))
    });

    let nodes = ordered
        .iter()
        .map(|node| {
            let params = node
                .params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("- {} ({}): {}({})", node.id, node.label, node.block_type, params)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let label_of = |id: &NodeId| -> String {
        graph
            .nodes
            .iter()
            .find(|n| &n.id == id)
            .filter(|n| !n.label.is_empty())
            .map(|n| n.label.clone())
            .unwrap_or_else(|| id.to_string())
    };
    let connections = graph
        .edges
        .iter()
        .map(|e| {
            format!(
                "- {}.{} -> {}.{}",
                label_of(&e.source),
                e.source_handle,
                label_of(&e.target),
                e.target_handle
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let connections = if connections.is_empty() {
        "Sequential flow through nodes in order listed".to_string()
    } else {
        connections
    };

    format!(
        "Generate a {upper} neural network model based on the following architecture:

NODES (layers/operations):
{nodes}

DATA FLOW (connections):
{connections}

REQUIREMENTS:
1. Create a proper neural network class that implements this architecture
2. Use proper {framework} conventions and best practices
3. Handle the data flow correctly, especially for residual/skip connections if present
4. Include type hints and docstrings
5. The forward method should properly route tensors through the network
6. Include example usage showing how to instantiate and run the model

Start with:
{imports}

Generate clean, production-ready code. Only output the Python code, no explanations.",
        upper = framework.as_str().to_uppercase(),
        imports = framework.imports(),
    )
}

/// Remove markdown code fences and surrounding whitespace.
pub fn clean_code_fences(text: &str) -> String {
    text.replace("```python\n", "")
        .replace("```python", "")
        .replace("```\n", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Correlate nodes with code lines by attribute name, `layer<n>` or label.
///
/// Matching is case-insensitive; a node's range spans its first to last
/// matching line. Nodes with no match are absent from the mapping.
pub fn infer_node_mapping(code: &str, nodes: &[SerializedNode]) -> NodeMapping {
    let lines: Vec<String> = code.split('\n').map(|l| l.to_lowercase()).collect();
    let mut mapping = NodeMapping::new();

    for node in nodes {
        let label = node.label.to_lowercase();
        let compact: String = label
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            .collect();
        let number = node.id.as_str().replacen("node_", "", 1);

        let mut needles = Vec::with_capacity(3);
        if !compact.is_empty() {
            needles.push(format!("self.{compact}"));
        }
        if !number.is_empty() {
            needles.push(format!("self.layer{number}"));
        }
        if !label.is_empty() {
            needles.push(label);
        }

        for (i, line) in lines.iter().enumerate() {
            if needles.iter().any(|n| line.contains(n.as_str())) {
                mapping
                    .entry(node.id.clone())
                    .and_modify(|r| r.end_line = i + 1)
                    .or_insert_with(|| LineRange::single(i + 1));
            }
        }
    }
    mapping
}
