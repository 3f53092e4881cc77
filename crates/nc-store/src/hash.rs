//! Content hashing for version snapshots.

use nc_project::SerializedGraph;
use sha2::{Digest, Sha256};

use crate::StoreResult;

/// Hex SHA-256 of the graph's compact JSON encoding.
pub fn content_hash(graph: &SerializedGraph) -> StoreResult<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(graph)?);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nc_project::parse_json;

    #[test]
    fn hash_stability() {
        let graph = parse_json(r#"{"nodes": [], "edges": []}"#).unwrap();
        let a = content_hash(&graph).unwrap();
        assert_eq!(a, content_hash(&graph.clone()).unwrap());
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_graphs() {
        let empty = parse_json(r#"{"nodes": [], "edges": []}"#).unwrap();
        let one = parse_json(
            r#"{"nodes": [{"id": "node_1", "type": "relu", "position": {"x": 0, "y": 0}}], "edges": []}"#,
        )
        .unwrap();
        assert_ne!(content_hash(&empty).unwrap(), content_hash(&one).unwrap());
    }
}
