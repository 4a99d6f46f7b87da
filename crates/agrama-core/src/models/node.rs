//! Graph entities: stable node identifiers, typed nodes, typed edges.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable 64-bit identifier for a graph entity.
///
/// Derived from the blake3 hash of the entity's canonical name (a content
/// path, a qualified symbol name, or an arbitrary key), so a logical entity
/// maps to one `NodeId` for the process lifetime and across processes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Derive the id from a canonical name.
    pub fn from_name(name: &str) -> Self {
        let hash = blake3::hash(name.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        Self(u64::from_le_bytes(bytes))
    }

    /// Raw id value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// The kind of entity a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Function,
    Module,
    Concept,
    Decision,
    Other,
}

/// Typed relation carried by an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Contains,
    DependsOn,
    Calls,
    EvolvedInto,
    SimilarTo,
    References,
    /// Free-form relation label supplied by an agent.
    Custom(String),
}

impl Relation {
    /// Parse a relation from its wire string.
    pub fn parse(s: &str) -> Self {
        match s {
            "contains" => Self::Contains,
            "depends_on" => Self::DependsOn,
            "calls" => Self::Calls,
            "evolved_into" => Self::EvolvedInto,
            "similar_to" => Self::SimilarTo,
            "references" => Self::References,
            other => Self::Custom(other.to_string()),
        }
    }

    /// The wire string for this relation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Contains => "contains",
            Self::DependsOn => "depends_on",
            Self::Calls => "calls",
            Self::EvolvedInto => "evolved_into",
            Self::SimilarTo => "similar_to",
            Self::References => "references",
            Self::Custom(s) => s,
        }
    }
}

/// A typed graph node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Human-readable display name (usually the canonical name).
    pub name: String,
    /// Optional free-form attributes.
    #[serde(default)]
    pub attrs: BTreeMap<String, serde_json::Value>,
}

impl GraphNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        let name = name.into();
        Self {
            id: NodeId::from_name(&name),
            kind,
            name,
            attrs: BTreeMap::new(),
        }
    }
}

/// A typed, weighted, directed edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub src: NodeId,
    pub dst: NodeId,
    pub relation: Relation,
    /// Nonnegative weight used as traversal distance.
    pub weight: f64,
    #[serde(default)]
    pub attrs: BTreeMap<String, serde_json::Value>,
}

/// Adjacency direction for neighbor lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Out,
    In,
    Both,
}

/// Edge-following direction for shortest-path traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalDirection {
    Forward,
    Reverse,
    Bidirectional,
}
