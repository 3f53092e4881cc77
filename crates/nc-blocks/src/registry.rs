//! The block-type registry: single source of truth for port contracts.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::block::{BlockCategory, BlockType};
use crate::catalog;
use crate::error::{RegistryError, RegistryResult};
use crate::params::{ParamIssue, Params};

use tracing::error;

/// Read-only catalog of block types keyed by their `type` string.
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    blocks: Vec<BlockType>,
    index: HashMap<String, usize>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry over `blocks`, failing on the first rejected block.
    pub fn from_blocks(blocks: impl IntoIterator<Item = BlockType>) -> RegistryResult<Self> {
        let mut registry = Self::new();
        for block in blocks {
            registry.register(block)?;
        }
        Ok(registry)
    }

    /// Registry holding the built-in catalog.
    ///
    /// A catalog entry the registry rejects is logged and skipped; the first
    /// registration of a type wins.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for block in catalog::standard_blocks() {
            if let Err(err) = registry.register(block) {
                error!(error = %err, "built-in block rejected");
            }
        }
        registry
    }

    /// Process-wide shared instance of [`BlockRegistry::standard`].
    pub fn shared() -> Arc<BlockRegistry> {
        static SHARED: OnceLock<Arc<BlockRegistry>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(Self::standard())).clone()
    }

    pub fn register(&mut self, block: BlockType) -> RegistryResult<()> {
        if self.index.contains_key(&block.type_name) {
            return Err(RegistryError::DuplicateType {
                type_name: block.type_name,
            });
        }
        if let Some(port) = block.duplicate_port() {
            return Err(RegistryError::DuplicatePort {
                type_name: block.type_name.clone(),
                port: port.to_string(),
            });
        }
        self.index.insert(block.type_name.clone(), self.blocks.len());
        self.blocks.push(block);
        Ok(())
    }

    pub fn lookup(&self, type_name: &str) -> Option<&BlockType> {
        self.index.get(type_name).map(|&i| &self.blocks[i])
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.index.contains_key(type_name)
    }

    /// Block types of one category, in registration order.
    pub fn list_by_category(&self, category: BlockCategory) -> Vec<&BlockType> {
        self.blocks
            .iter()
            .filter(|b| b.category == category)
            .collect()
    }

    /// Categories that have at least one block, in palette order.
    pub fn categories(&self) -> Vec<BlockCategory> {
        BlockCategory::ALL
            .into_iter()
            .filter(|c| self.blocks.iter().any(|b| b.category == *c))
            .collect()
    }

    /// Case-insensitive match on type key, label or description.
    pub fn search(&self, query: &str) -> Vec<&BlockType> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.blocks.iter().collect();
        }
        self.blocks
            .iter()
            .filter(|b| {
                b.type_name.to_lowercase().contains(&needle)
                    || b.label.to_lowercase().contains(&needle)
                    || b.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Advisory parameter check; never blocks an edit.
    pub fn validate_params(&self, type_name: &str, params: &Params) -> Vec<ParamIssue> {
        match self.lookup(type_name) {
            Some(block) => block.validate_params(params),
            None => vec![ParamIssue::block("Unknown block type")],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockType> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
