//! The standard block catalog.
//!
//! Port ids are what connections reference, so they are part of the wire
//! format: renaming one breaks every saved graph using it.

use serde_json::json;

use crate::block::{BlockCategory, BlockType, at_least, between, number, one_of};
use crate::params::ParamKind;
use crate::port::Port;

/// Every built-in block type, in palette order.
pub fn standard_blocks() -> Vec<BlockType> {
    let mut blocks = Vec::with_capacity(22);
    blocks.extend(layers());
    blocks.extend(activations());
    blocks.extend(operations());
    blocks.extend(attention());
    blocks
}

fn unary(type_name: &str, label: &str, category: BlockCategory) -> BlockType {
    BlockType::new(type_name, label, category)
        .with_input(Port::tensor("in", "Input"))
        .with_output(Port::tensor("out", "Output"))
}

fn binary(type_name: &str, label: &str) -> BlockType {
    BlockType::new(type_name, label, BlockCategory::Operation)
        .with_input(Port::tensor("a", "A"))
        .with_input(Port::tensor("b", "B"))
        .with_output(Port::tensor("out", "Output"))
}

fn layers() -> Vec<BlockType> {
    vec![
        BlockType::new("input", "Input", BlockCategory::Layer)
            .describe("Network input placeholder")
            .with_output(Port::tensor("out", "Output"))
            .with_param("shape", ParamKind::String, "batch, features")
            .with_param(
                "dtype",
                one_of(&["float32", "float16", "bfloat16", "int64"]),
                "float32",
            ),
        unary("linear", "Linear", BlockCategory::Layer)
            .describe("Fully connected layer")
            .with_param("inFeatures", at_least(1.0), 128)
            .with_param("outFeatures", at_least(1.0), 64)
            .with_param("bias", ParamKind::Boolean, true),
        unary("conv2d", "Conv2D", BlockCategory::Layer)
            .describe("2D convolution layer")
            .with_param("inChannels", at_least(1.0), 3)
            .with_param("outChannels", at_least(1.0), 64)
            .with_param("kernelSize", at_least(1.0), 3)
            .with_param("stride", at_least(1.0), 1)
            .with_param("padding", at_least(0.0), 1),
        BlockType::new("lstm", "LSTM", BlockCategory::Layer)
            .describe("Long short-term memory recurrent layer")
            .with_input(Port::tensor("in", "Input"))
            .with_output(Port::tensor("out", "Output"))
            .with_output(Port::tensor("hidden", "Hidden"))
            .with_param("inputSize", at_least(1.0), 128)
            .with_param("hiddenSize", at_least(1.0), 256)
            .with_param("numLayers", at_least(1.0), 1)
            .with_param("bidirectional", ParamKind::Boolean, false)
            .with_param("dropout", between(0.0, 1.0), 0),
        BlockType::new("gru", "GRU", BlockCategory::Layer)
            .describe("Gated recurrent unit layer")
            .with_input(Port::tensor("in", "Input"))
            .with_output(Port::tensor("out", "Output"))
            .with_output(Port::tensor("hidden", "Hidden"))
            .with_param("inputSize", at_least(1.0), 128)
            .with_param("hiddenSize", at_least(1.0), 256)
            .with_param("numLayers", at_least(1.0), 1)
            .with_param("bidirectional", ParamKind::Boolean, false),
        unary("embedding", "Embedding", BlockCategory::Layer)
            .describe("Lookup table mapping token ids to dense vectors")
            .with_param("numEmbeddings", at_least(1.0), 10000)
            .with_param("embeddingDim", at_least(1.0), 256),
    ]
}

fn activations() -> Vec<BlockType> {
    vec![
        unary("relu", "ReLU", BlockCategory::Activation).describe("Rectified linear unit"),
        unary("gelu", "GELU", BlockCategory::Activation).describe("Gaussian error linear unit"),
        unary("softmax", "Softmax", BlockCategory::Activation)
            .describe("Normalizes inputs into a probability distribution")
            .with_param("dim", number(), -1),
        unary("sigmoid", "Sigmoid", BlockCategory::Activation).describe("Logistic sigmoid"),
    ]
}

fn operations() -> Vec<BlockType> {
    vec![
        binary("add", "Add").describe("Element-wise addition, e.g. residual connections"),
        binary("concat", "Concatenate")
            .describe("Concatenates tensors along a dimension")
            .with_param("dim", number(), -1),
        unary("flatten", "Flatten", BlockCategory::Operation)
            .describe("Flattens a contiguous range of dimensions")
            .with_param("startDim", number(), 1)
            .with_param("endDim", number(), -1),
        unary("layernorm", "LayerNorm", BlockCategory::Operation)
            .describe("Layer normalization")
            .with_param("normalizedShape", at_least(1.0), 128)
            .with_param("eps", number(), 1e-5),
        unary("batchnorm", "BatchNorm", BlockCategory::Operation)
            .describe("Batch normalization")
            .with_param("numFeatures", at_least(1.0), 64)
            .with_param("eps", number(), 1e-5)
            .with_param("momentum", number(), 0.1),
        unary("dropout", "Dropout", BlockCategory::Operation)
            .describe("Randomly zeroes elements during training")
            .with_param("p", between(0.0, 1.0), 0.1),
        unary("positional_encoding", "Positional Encoding", BlockCategory::Operation)
            .describe("Adds position information to a sequence of embeddings")
            .with_param("maxLen", at_least(1.0), 512)
            .with_param("embeddingDim", at_least(1.0), 512)
            .with_param("dropout", between(0.0, 1.0), 0.1)
            .with_param("encoding", one_of(&["sinusoidal", "learned"]), "sinusoidal"),
        BlockType::new("identity", "Identity", BlockCategory::Operation)
            .describe("Passes any value through unchanged")
            .with_input(Port::any("in", "Input"))
            .with_output(Port::any("out", "Output")),
        BlockType::new("scale", "Scale", BlockCategory::Operation)
            .describe("Multiplies a tensor by a scalar factor")
            .with_input(Port::tensor("x", "Tensor"))
            .with_input(Port::scalar("factor", "Factor"))
            .with_output(Port::tensor("out", "Output")),
        BlockType::new("mse_loss", "MSE Loss", BlockCategory::Operation)
            .describe("Mean squared error between prediction and target")
            .with_input(Port::tensor("prediction", "Prediction"))
            .with_input(Port::tensor("target", "Target"))
            .with_output(Port::scalar("loss", "Loss"))
            .with_param("reduction", one_of(&["mean", "sum", "none"]), "mean"),
    ]
}

fn attention() -> Vec<BlockType> {
    let qkv = |block: BlockType| {
        block
            .with_input(Port::tensor("query", "Query"))
            .with_input(Port::tensor("key", "Key"))
            .with_input(Port::tensor("value", "Value"))
            .with_output(Port::tensor("out", "Output"))
    };
    vec![
        qkv(BlockType::new(
            "multihead_attention",
            "Multi-Head Attention",
            BlockCategory::Attention,
        ))
        .describe("Attention over several parallel heads")
        .with_output(Port::tensor("weights", "Weights"))
        .with_param("embedDim", at_least(1.0), 512)
        .with_param("numHeads", at_least(1.0), 8)
        .with_param("dropout", between(0.0, 1.0), 0.1)
        .with_param("batchFirst", ParamKind::Boolean, true),
        qkv(BlockType::new(
            "scaled_dot_product",
            "Scaled Dot-Product",
            BlockCategory::Attention,
        ))
        .describe("Scaled dot-product attention")
        .with_param("dropout", between(0.0, 1.0), 0.0)
        .with_optional_param("scale", number(), json!(null)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::DataKind;
    use std::collections::HashSet;

    #[test]
    fn type_keys_are_unique() {
        let blocks = standard_blocks();
        let keys: HashSet<_> = blocks.iter().map(|b| b.type_name.as_str()).collect();
        assert_eq!(keys.len(), blocks.len());
        assert_eq!(blocks.len(), 22);
    }

    #[test]
    fn no_block_declares_a_port_twice() {
        for block in standard_blocks() {
            assert_eq!(block.duplicate_port(), None, "{}", block.type_name);
        }
    }

    #[test]
    fn defaults_satisfy_their_own_schema() {
        for block in standard_blocks() {
            let issues = block.validate_params(&block.default_params);
            assert!(issues.is_empty(), "{}: {issues:?}", block.type_name);
        }
    }

    #[test]
    fn covers_port_arities() {
        let blocks = standard_blocks();
        let arities: HashSet<(usize, usize)> = blocks
            .iter()
            .map(|b| (b.inputs.len(), b.outputs.len()))
            .collect();
        for arity in [(0, 1), (1, 1), (2, 1), (3, 1), (3, 2), (1, 2)] {
            assert!(arities.contains(&arity), "missing arity {arity:?}");
        }
    }

    #[test]
    fn all_data_kinds_are_used() {
        let kinds: HashSet<DataKind> = standard_blocks()
            .iter()
            .flat_map(|b| b.inputs.iter().chain(b.outputs.iter()))
            .map(|p| p.kind)
            .collect();
        assert_eq!(kinds.len(), 3);
    }
}
