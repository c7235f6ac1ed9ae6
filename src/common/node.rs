use std::fmt;
use serde::{Deserialize, Serialize};
use crate::common::error::{GraphLabError, Result};

/// Where a graph came from. Decides the native node identifier type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphOrigin {
    /// Parsed from an uploaded edge list; nodes are string labels
    Uploaded,
    /// Produced by a generative model; nodes are integer indices
    Generated,
}

/// Stable node identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Index(u64),
    Label(String),
}

impl NodeId {
    /// Create a label identifier
    pub fn label(label: impl Into<String>) -> Self {
        NodeId::Label(label.into())
    }

    /// Coerce raw user input to the node identifier type native to `origin`
    pub fn parse_for(raw: &str, origin: GraphOrigin) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(GraphLabError::bad_parameter("node identifier cannot be empty"));
        }

        match origin {
            GraphOrigin::Uploaded => Ok(NodeId::Label(raw.to_string())),
            GraphOrigin::Generated => raw.parse::<u64>()
                .map(NodeId::Index)
                .map_err(|_| GraphLabError::bad_parameter(
                    format!("generated graphs use integer node ids, got '{}'", raw)
                )),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Index(i) => write!(f, "{}", i),
            NodeId::Label(label) => write!(f, "{}", label),
        }
    }
}

impl From<u64> for NodeId {
    fn from(index: u64) -> Self {
        NodeId::Index(index)
    }
}

impl From<&str> for NodeId {
    fn from(label: &str) -> Self {
        NodeId::Label(label.to_string())
    }
}
