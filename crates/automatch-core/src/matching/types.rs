//! Match request/result types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A model reference from a workflow that may point at a missing file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    /// Caller-chosen identifier, echoed back in the result (usually a node id).
    pub id: serde_json::Value,
    #[serde(default)]
    pub node_type: String,
    #[serde(default)]
    pub widget_name: String,
    pub current_value: String,
}

impl MatchRequest {
    pub fn new(id: impl Into<serde_json::Value>, current_value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: String::new(),
            widget_name: String::new(),
            current_value: current_value.into(),
        }
    }
}

/// Strategy that resolved a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchTier {
    /// Same normalized name (case and extension ignored).
    ExactName,
    /// Same basename, directories ignored.
    Basename,
    /// Plain-token overlap.
    TokenOverlap,
    /// Same model after quantization and precision words are stripped.
    CrossVariant,
    /// Character-level closeness of the whole name.
    Fuzzy,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::ExactName => "exact-name",
            MatchTier::Basename => "basename",
            MatchTier::TokenOverlap => "token-overlap",
            MatchTier::CrossVariant => "cross-variant",
            MatchTier::Fuzzy => "fuzzy",
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved replacement for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub id: serde_json::Value,
    pub node_type: String,
    pub widget_name: String,
    pub original_value: String,
    pub matched_value: String,
    /// Absolute path of the matched file.
    pub path: String,
    pub tier: MatchTier,
    /// Tier-specific score; 1.0 for exact tiers.
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: MatchRequest = serde_json::from_str(
            r#"{"id": 7, "nodeType": "CheckpointLoaderSimple", "widgetName": "ckpt_name", "currentValue": "a.ckpt"}"#,
        )
        .unwrap();
        assert_eq!(request.id, serde_json::json!(7));
        assert_eq!(request.widget_name, "ckpt_name");
    }

    #[test]
    fn test_request_without_node_fields() {
        let request: MatchRequest =
            serde_json::from_str(r#"{"id": "n1", "currentValue": "vae.pt"}"#).unwrap();
        assert!(request.node_type.is_empty());
    }

    #[test]
    fn test_tier_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(MatchTier::CrossVariant).unwrap(),
            serde_json::json!("cross-variant")
        );
    }
}
