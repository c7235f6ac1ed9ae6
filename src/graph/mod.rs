pub mod model;
pub mod store;
pub mod import_export;
pub mod generators;
pub mod layout;
pub mod session;

// Re-export main types from the graph modules
pub use model::{
    ComponentMode,
    EdgeAttributes,
    EdgeEntry,
    GraphProperties,
    GraphType,
    GrowthState,
    Metric,
    NodeAttributes,
    Position,
};
pub use store::{GraphStore, GraphView};
pub use generators::{GeneratorParams, GraphModel};
pub use layout::LayoutAlgorithm;
pub use session::{AnalysisSession, SessionInfo, SessionRegistry};

use crate::analysis::community::CommunityLevels;
use crate::analysis::growth::EvolutionSeries;
use crate::analysis::path::{PathOutcome, PathType, WeightMode};
use crate::common::error::Result;
use crate::common::node::NodeId;

/// Graph operations trait
pub trait GraphOperations {
    /// The graph being analysed
    fn store(&self) -> &GraphStore;

    /// Compute every metric if the stored set is stale and return the properties
    fn compute_metrics(&mut self) -> Result<GraphProperties>;

    /// Switch layout algorithm and reposition every node
    fn set_layout(&mut self, algorithm: LayoutAlgorithm);

    /// Solve a path query; node ids are raw user input
    fn find_path(&self, source: &str, target: &str, path_type: PathType, weight_mode: WeightMode) -> Result<PathOutcome>;

    /// Girvan–Newman community levels
    fn detect_communities(&self) -> CommunityLevels;

    /// Maximal cliques
    fn find_cliques(&self) -> Result<Vec<Vec<NodeId>>>;

    /// Add one node by preferential attachment
    fn grow(&mut self) -> Result<Vec<(NodeId, NodeId)>>;

    /// Remove the newest node of a growing graph
    fn shrink(&mut self) -> Result<Option<NodeId>>;

    /// Time series of a growth simulation on a copy of the graph
    fn simulate_evolution(&mut self, steps: usize) -> Result<EvolutionSeries>;
}
