use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::common::error::{GraphLabError, Result};
use crate::common::node::NodeId;

/// Graph type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphType {
    /// Directed graph
    Directed,
    /// Undirected graph
    Undirected,
}

impl GraphType {
    pub fn is_directed(&self) -> bool {
        matches!(self, GraphType::Directed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GraphType::Directed => "Directed",
            GraphType::Undirected => "Undirected",
        }
    }
}

impl FromStr for GraphType {
    type Err = GraphLabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "directed" => Ok(GraphType::Directed),
            "undirected" => Ok(GraphType::Undirected),
            other => Err(GraphLabError::bad_parameter(
                format!("graph type must be Directed or Undirected, got '{}'", other)
            )),
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connected component decomposition mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentMode {
    /// Weakly connected components of a directed graph
    Weak,
    /// Strongly connected components of a directed graph
    Strong,
    /// Connected components of an undirected graph
    Full,
}

impl ComponentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentMode::Weak => "weak",
            ComponentMode::Strong => "strong",
            ComponentMode::Full => "full",
        }
    }
}

/// Numeric per-node metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    Degree,
    InDegree,
    OutDegree,
    WeightedDegree,
    WeightedInDegree,
    WeightedOutDegree,
    Closeness,
    Betweenness,
    Eigenvector,
    PageRank,
    Clustering,
}

impl Metric {
    pub const ALL: [Metric; 11] = [
        Metric::Degree,
        Metric::InDegree,
        Metric::OutDegree,
        Metric::WeightedDegree,
        Metric::WeightedInDegree,
        Metric::WeightedOutDegree,
        Metric::Closeness,
        Metric::Betweenness,
        Metric::Eigenvector,
        Metric::PageRank,
        Metric::Clustering,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Degree => "degree",
            Metric::InDegree => "in_degree",
            Metric::OutDegree => "out_degree",
            Metric::WeightedDegree => "weighted_degree",
            Metric::WeightedInDegree => "weighted_in_degree",
            Metric::WeightedOutDegree => "weighted_out_degree",
            Metric::Closeness => "closeness",
            Metric::Betweenness => "betweenness",
            Metric::Eigenvector => "eigenvector",
            Metric::PageRank => "pagerank",
            Metric::Clustering => "clustering",
        }
    }

    /// Whether the metric is defined for the given graph type
    pub fn applies_to(&self, graph_type: GraphType) -> bool {
        match self {
            Metric::Degree | Metric::WeightedDegree | Metric::Clustering => !graph_type.is_directed(),
            Metric::InDegree | Metric::OutDegree |
            Metric::WeightedInDegree | Metric::WeightedOutDegree |
            Metric::PageRank => graph_type.is_directed(),
            Metric::Closeness | Metric::Betweenness | Metric::Eigenvector => true,
        }
    }
}

impl FromStr for Metric {
    type Err = GraphLabError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        Metric::ALL.iter()
            .copied()
            .find(|m| m.as_str() == key)
            .ok_or_else(|| GraphLabError::bad_parameter(format!("unknown metric '{}'", s)))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 2-D layout position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}

/// Typed per-node attribute record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAttributes {
    pub degree: Option<f64>,
    pub in_degree: Option<f64>,
    pub out_degree: Option<f64>,
    pub weighted_degree: Option<f64>,
    pub weighted_in_degree: Option<f64>,
    pub weighted_out_degree: Option<f64>,
    pub closeness: Option<f64>,
    pub betweenness: Option<f64>,
    pub eigenvector: Option<f64>,
    pub pagerank: Option<f64>,
    pub clustering: Option<f64>,
    /// Component labels ("A0", "A1", ...)
    pub weak: Option<String>,
    pub strong: Option<String>,
    pub full: Option<String>,
    pub position: Option<Position>,
}

impl NodeAttributes {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Degree => self.degree,
            Metric::InDegree => self.in_degree,
            Metric::OutDegree => self.out_degree,
            Metric::WeightedDegree => self.weighted_degree,
            Metric::WeightedInDegree => self.weighted_in_degree,
            Metric::WeightedOutDegree => self.weighted_out_degree,
            Metric::Closeness => self.closeness,
            Metric::Betweenness => self.betweenness,
            Metric::Eigenvector => self.eigenvector,
            Metric::PageRank => self.pagerank,
            Metric::Clustering => self.clustering,
        }
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        let slot = match metric {
            Metric::Degree => &mut self.degree,
            Metric::InDegree => &mut self.in_degree,
            Metric::OutDegree => &mut self.out_degree,
            Metric::WeightedDegree => &mut self.weighted_degree,
            Metric::WeightedInDegree => &mut self.weighted_in_degree,
            Metric::WeightedOutDegree => &mut self.weighted_out_degree,
            Metric::Closeness => &mut self.closeness,
            Metric::Betweenness => &mut self.betweenness,
            Metric::Eigenvector => &mut self.eigenvector,
            Metric::PageRank => &mut self.pagerank,
            Metric::Clustering => &mut self.clustering,
        };
        *slot = value;
    }

    pub fn component(&self, mode: ComponentMode) -> Option<&str> {
        match mode {
            ComponentMode::Weak => self.weak.as_deref(),
            ComponentMode::Strong => self.strong.as_deref(),
            ComponentMode::Full => self.full.as_deref(),
        }
    }

    pub fn set_component(&mut self, mode: ComponentMode, label: Option<String>) {
        match mode {
            ComponentMode::Weak => self.weak = label,
            ComponentMode::Strong => self.strong = label,
            ComponentMode::Full => self.full = label,
        }
    }

    /// Drop every computed value, keeping the layout position
    pub fn clear_metrics(&mut self) {
        let position = self.position.take();
        *self = NodeAttributes { position, ..NodeAttributes::default() };
    }
}

/// Typed per-edge attribute record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeAttributes {
    pub betweenness: Option<f64>,
}

/// Node payload stored in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub attributes: NodeAttributes,
}

impl NodeRecord {
    pub fn new(id: NodeId) -> Self {
        NodeRecord { id, attributes: NodeAttributes::default() }
    }
}

/// Edge payload stored in the graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Absent means unweighted (unit cost)
    pub weight: Option<f64>,
    pub attributes: EdgeAttributes,
}

impl EdgeRecord {
    pub fn new(weight: Option<f64>) -> Self {
        EdgeRecord { weight, attributes: EdgeAttributes::default() }
    }

    /// Cost used by weighted algorithms
    pub fn cost(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }
}

/// Owned edge listing entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeEntry {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: Option<f64>,
    pub betweenness: Option<f64>,
}

/// Structural properties derived from the topology
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphProperties {
    pub is_weighted: bool,
    pub has_negative_weights: bool,
    /// Only meaningful for weighted graphs
    pub negative_cycle: bool,
    pub diameter: Option<f64>,
    pub density: f64,
    /// `None` for undirected graphs
    pub is_dag: Option<bool>,
    pub is_connected: bool,
    pub node_count: usize,
    pub edge_count: usize,
    /// One entry per component of the undirected view, singletons excluded
    pub average_shortest_path_length: Vec<f64>,
    pub weighted_average_shortest_path_length: Option<Vec<f64>>,
    pub growing: bool,
}

/// Seed size of a graph produced by the preferential attachment model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthState {
    pub initial_nodes: usize,
    pub initial_degree: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_type_parse() {
        assert_eq!("Directed".parse::<GraphType>().unwrap(), GraphType::Directed);
        assert_eq!("undirected".parse::<GraphType>().unwrap(), GraphType::Undirected);
        assert!("mixed".parse::<GraphType>().is_err());
    }

    #[test]
    fn test_metric_names() {
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
        }
        assert!(Metric::PageRank.applies_to(GraphType::Directed));
        assert!(!Metric::Clustering.applies_to(GraphType::Directed));
    }

    #[test]
    fn test_clear_metrics_keeps_position() {
        let mut attrs = NodeAttributes::default();
        attrs.set(Metric::Closeness, Some(0.5));
        attrs.set_component(ComponentMode::Full, Some("A0".into()));
        attrs.position = Some(Position::new(1.0, 2.0));

        attrs.clear_metrics();
        assert_eq!(attrs.get(Metric::Closeness), None);
        assert_eq!(attrs.component(ComponentMode::Full), None);
        assert_eq!(attrs.position, Some(Position::new(1.0, 2.0)));
    }
}
