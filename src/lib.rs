// Mini GraphLab Library
// Graph analysis and path-finding engine

// Common modules
pub mod common {
    pub mod error;
    pub mod node;
    pub mod config;
    pub mod utils;
}

// Graph representation, construction and sessions
pub mod graph;

// Analysis passes over graph snapshots
pub mod analysis {
    pub mod linalg;
    pub mod properties;
    pub mod components;
    pub mod centrality;
    pub mod metrics;
    pub mod community;
    pub mod path;
    pub mod growth;
    pub mod ranking;
}

// Re-export commonly used types for convenience
pub use common::error::{ErrorCode, GraphLabError, Result};
pub use common::node::{GraphOrigin, NodeId};
pub use common::config::EngineConfig;

pub use graph::{
    AnalysisSession,
    GraphOperations,
    GraphProperties,
    GraphStore,
    GraphType,
    Metric,
    SessionRegistry,
};

pub use analysis::community::{CommunityDetector, CommunityLevels};
pub use analysis::growth::{EvolutionSeries, GrowthSimulator};
pub use analysis::metrics::{MetricsEngine, MetricsReport};
pub use analysis::path::{PathFinder, PathOutcome, PathRequest, PathResult, PathType, WeightMode};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Load the engine configuration, from `path` when given
pub fn init(path: Option<&std::path::Path>) -> Result<EngineConfig> {
    let config = EngineConfig::load(path)?;
    tracing::debug!("{} {} initialised", NAME, VERSION);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_initialization() {
        let config = init(None).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "mini-graphlab");
    }

    #[test]
    fn test_end_to_end_session() {
        let config = EngineConfig { rng_seed: Some(1), ..EngineConfig::default() };
        let mut session = AnalysisSession::from_edge_list("a b\nb c\nc a\nc d\n", GraphType::Undirected, config).unwrap();
        let properties = session.compute_metrics().unwrap();
        assert_eq!(properties.node_count, 4);
        assert!(properties.is_connected);
        assert_eq!(session.detect_communities().len(), 2);
        assert!(session.find_path("a", "d", PathType::Shortest, WeightMode::Unweighted).unwrap().is_found());
    }
}
