//! Search modes and ranked results.

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Which index a search dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Semantic,
    Lexical,
    Graph,
    Temporal,
    Hybrid,
}

impl SearchMode {
    /// Parse a mode from its wire string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "semantic" => Some(Self::Semantic),
            "lexical" => Some(Self::Lexical),
            "graph" => Some(Self::Graph),
            "temporal" => Some(Self::Temporal),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }
}

/// Per-source scores attached to a hybrid hit. Absent components are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub lexical: f32,
    pub semantic: f32,
    pub graph: f32,
}

/// One ranked search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: NodeId,
    /// Fused or single-source score, higher = more relevant.
    pub score: f32,
    /// Content excerpt around the first query match, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default)]
    pub components: ComponentScores,
}
