//! Built-in architecture templates.

use serde::{Deserialize, Serialize};

use crate::ProjectResult;
use crate::schema::SerializedGraph;

/// A named starting graph for the library panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub graph: SerializedGraph,
}

const SOURCES: [&str; 5] = [
    include_str!("../templates/simple-mlp.json"),
    include_str!("../templates/cnn-classifier.json"),
    include_str!("../templates/resnet-block.json"),
    include_str!("../templates/lstm-sequence.json"),
    include_str!("../templates/attention-block.json"),
];

/// All built-in templates, in library order.
pub fn builtin_templates() -> ProjectResult<Vec<ArchitectureTemplate>> {
    SOURCES
        .iter()
        .map(|source| -> ProjectResult<ArchitectureTemplate> { Ok(serde_json::from_str(source)?) })
        .collect()
}

pub fn find_template(id: &str) -> ProjectResult<Option<ArchitectureTemplate>> {
    Ok(builtin_templates()?.into_iter().find(|t| t.id == id))
}

/// Distinct template categories in library order.
pub fn template_categories() -> ProjectResult<Vec<String>> {
    let mut categories: Vec<String> = Vec::new();
    for template in builtin_templates()? {
        if !categories.contains(&template.category) {
            categories.push(template.category);
        }
    }
    Ok(categories)
}
