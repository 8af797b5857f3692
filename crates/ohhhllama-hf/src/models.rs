//! Wire shapes of the `HuggingFace` responses this crate reads.

use serde::Deserialize;

/// Subset of `GET /api/models/{repo}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ModelInfo {
    #[serde(default)]
    pub siblings: Vec<Sibling>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Sibling {
    pub rfilename: String,
}

/// Subset of a repository's `config.json`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ModelConfig {
    #[serde(default)]
    pub architectures: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_info_ignores_unknown_fields() {
        let info: ModelInfo = serde_json::from_value(json!({
            "id": "org/model",
            "downloads": 12,
            "siblings": [{"rfilename": "README.md", "size": 10}]
        }))
        .unwrap();
        assert_eq!(info.siblings.len(), 1);
        assert_eq!(info.siblings[0].rfilename, "README.md");
    }

    #[test]
    fn test_model_config_without_architectures() {
        let config: ModelConfig = serde_json::from_value(json!({"model_type": "llama"})).unwrap();
        assert!(config.architectures.is_empty());
    }
}
