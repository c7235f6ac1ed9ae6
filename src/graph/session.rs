// AnalysisSession - one graph with its configuration and random source,
// plus a registry of concurrently held sessions

use std::sync::Arc;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::analysis::community::{CommunityDetector, CommunityLevels};
use crate::analysis::growth::{EvolutionSeries, GrowthSimulator};
use crate::analysis::metrics::{self, AverageEdgeMetrics, AverageMetrics, MetricsEngine};
use crate::analysis::path::{PathFinder, PathOutcome, PathRequest, PathType, WeightMode};
use crate::analysis::ranking::{self, ColorRanking, Distribution, HybridRanking, SizeRanking};
use crate::common::config::EngineConfig;
use crate::common::error::{GraphLabError, Result};
use crate::common::node::{GraphOrigin, NodeId};
use crate::common::utils::current_timestamp;
use super::generators::{self, GeneratorParams};
use super::import_export::{self, AttributeTable};
use super::layout::{compute_layout, LayoutAlgorithm};
use super::model::{GraphProperties, GraphType, Metric};
use super::store::GraphStore;
use super::GraphOperations;

/// A graph under analysis.
///
/// All randomised work (layouts, growth) draws from the session's own RNG,
/// seeded from `EngineConfig::rng_seed` when one is set.
#[derive(Debug)]
pub struct AnalysisSession {
    store: GraphStore,
    config: EngineConfig,
    rng: StdRng,
    layout: LayoutAlgorithm,
}

impl AnalysisSession {
    /// Wrap an existing store and lay it out with the configured default layout
    pub fn new(store: GraphStore, config: EngineConfig) -> Self {
        let rng = session_rng(&config);
        Self::with_rng(store, config, rng)
    }

    fn with_rng(store: GraphStore, config: EngineConfig, rng: StdRng) -> Self {
        let layout = LayoutAlgorithm::from_name(&config.default_layout);
        let mut session = AnalysisSession { store, config, rng, layout };
        session.relayout();
        session
    }

    /// Parse an uploaded edge list
    pub fn from_edge_list(text: &str, graph_type: GraphType, config: EngineConfig) -> Result<Self> {
        let store = import_export::build_from_edge_list(text, graph_type)?;
        Ok(Self::new(store, config))
    }

    /// Build a graph from a generative model
    pub fn from_model(params: &GeneratorParams, config: EngineConfig) -> Result<Self> {
        let mut rng = session_rng(&config);
        let store = generators::generate(params, &config, &mut rng)?;
        Ok(Self::with_rng(store, config, rng))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn layout(&self) -> LayoutAlgorithm {
        self.layout
    }

    /// Mutable access for direct topology edits; metrics are invalidated by the store
    pub fn store_mut(&mut self) -> &mut GraphStore {
        &mut self.store
    }

    fn relayout(&mut self) {
        let positions = compute_layout(
            &self.store.view(),
            self.layout,
            &self.config,
            &mut self.rng,
        );
        self.store.set_positions(positions);
    }

    pub fn node_table(&mut self) -> Result<AttributeTable> {
        self.compute_metrics()?;
        import_export::node_table(&self.store)
    }

    pub fn edge_table(&mut self) -> Result<AttributeTable> {
        self.compute_metrics()?;
        import_export::edge_table(&self.store)
    }

    pub fn average_metrics(&mut self) -> Result<AverageMetrics> {
        self.compute_metrics()?;
        metrics::average_metrics(&self.store)
    }

    pub fn average_edge_metrics(&mut self) -> Result<AverageEdgeMetrics> {
        self.compute_metrics()?;
        metrics::average_edge_metrics(&self.store)
    }

    pub fn color_ranking(&mut self, metric: Metric) -> Result<ColorRanking> {
        self.compute_metrics()?;
        ranking::color_ranking(&self.store, metric)
    }

    pub fn size_ranking(&mut self, metric: Metric) -> Result<SizeRanking> {
        self.compute_metrics()?;
        ranking::size_ranking(&self.store, metric)
    }

    pub fn hybrid_ranking(&mut self, size_metric: Metric, color_metric: Metric) -> Result<HybridRanking> {
        self.compute_metrics()?;
        ranking::hybrid_ranking(&self.store, size_metric, color_metric)
    }

    pub fn distribution(&mut self, metric: Metric) -> Result<Distribution> {
        self.compute_metrics()?;
        ranking::distribution(&self.store, metric)
    }

    /// Edge-list text accepted back by `from_edge_list`
    pub fn export_text(&self) -> String {
        import_export::to_text(&self.store)
    }
}

fn session_rng(config: &EngineConfig) -> StdRng {
    match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl GraphOperations for AnalysisSession {
    fn store(&self) -> &GraphStore {
        &self.store
    }

    fn compute_metrics(&mut self) -> Result<GraphProperties> {
        MetricsEngine::new(&self.config).ensure_metrics(&mut self.store)?;
        self.store.properties()
            .cloned()
            .ok_or_else(|| GraphLabError::internal("metrics applied without properties"))
    }

    fn set_layout(&mut self, algorithm: LayoutAlgorithm) {
        self.layout = algorithm;
        self.relayout();
    }

    fn find_path(&self, source: &str, target: &str, path_type: PathType, weight_mode: WeightMode) -> Result<PathOutcome> {
        let request = PathRequest::new(
            self.store.resolve_node(source)?,
            self.store.resolve_node(target)?,
            path_type,
            weight_mode,
        );
        PathFinder::new(&self.config).find_path(&self.store, &request)
    }

    fn detect_communities(&self) -> CommunityLevels {
        CommunityDetector::new(&self.config).detect_communities(&self.store)
    }

    fn find_cliques(&self) -> Result<Vec<Vec<NodeId>>> {
        CommunityDetector::new(&self.config).find_cliques(&self.store)
    }

    fn grow(&mut self) -> Result<Vec<(NodeId, NodeId)>> {
        let state = self.store.growth_state().ok_or_else(GraphLabError::not_growing)?;
        let edges = GrowthSimulator::new(&self.config)
            .add_node_preferential_attachment(&mut self.store, state.initial_degree, &mut self.rng)?;
        self.relayout();
        Ok(edges)
    }

    fn shrink(&mut self) -> Result<Option<NodeId>> {
        let removed = GrowthSimulator::new(&self.config).remove_last_node(&mut self.store)?;
        if removed.is_some() {
            self.relayout();
        }
        Ok(removed)
    }

    fn simulate_evolution(&mut self, steps: usize) -> Result<EvolutionSeries> {
        GrowthSimulator::new(&self.config).simulate_evolution(&self.store, steps, &mut self.rng)
    }
}

/// Session bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub graph_type: GraphType,
    pub origin: GraphOrigin,
    /// Creation timestamp
    pub created: DateTime<Utc>,
    /// Last access that went through the registry
    pub modified: DateTime<Utc>,
}

impl SessionInfo {
    fn new(id: Uuid, store: &GraphStore) -> Self {
        let now = current_timestamp();
        SessionInfo {
            id,
            graph_type: store.graph_type(),
            origin: store.origin(),
            created: now,
            modified: now,
        }
    }

    /// Update modification time
    pub fn touch(&mut self) {
        self.modified = current_timestamp();
    }
}

/// Sessions keyed by id. Each session sits behind its own lock, so calls on
/// one graph are serialised while different graphs proceed independently.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, Arc<Mutex<AnalysisSession>>>,
    info: DashMap<Uuid, SessionInfo>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return its id
    pub fn insert(&self, session: AnalysisSession) -> Uuid {
        let id = Uuid::new_v4();
        self.info.insert(id, SessionInfo::new(id, session.store()));
        self.sessions.insert(id, Arc::new(Mutex::new(session)));
        tracing::info!("Opened session {}", id);
        id
    }

    pub fn get(&self, id: &Uuid) -> Result<Arc<Mutex<AnalysisSession>>> {
        self.sessions.get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| GraphLabError::bad_parameter(format!("unknown session {}", id)))
    }

    /// Run `f` under the session lock and record the access
    pub fn with_session<T, F>(&self, id: &Uuid, f: F) -> Result<T>
    where
        F: FnOnce(&mut AnalysisSession) -> Result<T>,
    {
        let session = self.get(id)?;
        let result = {
            let mut guard = session.lock();
            f(&mut *guard)
        };
        if let Some(mut info) = self.info.get_mut(id) {
            info.touch();
        }
        result
    }

    pub fn info(&self, id: &Uuid) -> Option<SessionInfo> {
        self.info.get(id).map(|entry| entry.value().clone())
    }

    /// Every session, oldest first
    pub fn list(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> = self.info.iter().map(|entry| entry.value().clone()).collect();
        sessions.sort_by_key(|info| info.created);
        sessions
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.info.remove(id);
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::info!("Closed session {}", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorCode;
    use crate::graph::generators::GraphModel;

    fn seeded() -> EngineConfig {
        EngineConfig { rng_seed: Some(17), ..EngineConfig::default() }
    }

    #[test]
    fn test_session_lays_out_every_node() {
        let session = AnalysisSession::from_edge_list("a b\nb c\n", GraphType::Undirected, seeded()).unwrap();
        assert_eq!(session.layout(), LayoutAlgorithm::Random);
        for id in session.store().node_ids() {
            assert!(session.store().position(&id).is_some());
        }
    }

    #[test]
    fn test_path_through_raw_ids() {
        let session = AnalysisSession::from_edge_list("A B\nB C\nC D\n", GraphType::Undirected, seeded()).unwrap();
        let outcome = session.find_path("A", "D", PathType::Shortest, WeightMode::Unweighted).unwrap();
        let path = outcome.path().unwrap();
        assert_eq!(path.length, 3.0);

        let err = session.find_path("A", "Z", PathType::Shortest, WeightMode::Unweighted).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::NodeNotFound);
    }

    #[test]
    fn test_generated_ids_are_integers() {
        let params = GeneratorParams::new(GraphModel::Barabasi, 4, GraphType::Undirected).with_degree(2);
        let session = AnalysisSession::from_model(&params, seeded()).unwrap();
        assert!(session.find_path("0", "3", PathType::Shortest, WeightMode::Unweighted).unwrap().is_found());
        let err = session.find_path("zero", "3", PathType::Shortest, WeightMode::Unweighted).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::BadParameter);
    }

    #[test]
    fn test_grow_and_shrink_invalidate_metrics() {
        let params = GeneratorParams::new(GraphModel::Barabasi, 4, GraphType::Undirected).with_degree(2);
        let mut session = AnalysisSession::from_model(&params, seeded()).unwrap();
        let before = session.compute_metrics().unwrap();
        assert!(before.growing);

        let edges = session.grow().unwrap();
        assert_eq!(edges.len(), 2);
        assert!(!session.store().data_exists());
        assert!(session.store().position(&NodeId::Index(4)).is_some());

        assert_eq!(session.shrink().unwrap(), Some(NodeId::Index(4)));
        assert_eq!(session.shrink().unwrap(), None);
        assert_eq!(session.compute_metrics().unwrap().node_count, 4);
    }

    #[test]
    fn test_tables_compute_on_demand() {
        let mut session = AnalysisSession::from_edge_list("a b 2\nb c 1\n", GraphType::Directed, seeded()).unwrap();
        let table = session.node_table().unwrap();
        assert!(table.columns.contains(&"weighted_in_degree".to_string()));
        assert_eq!(table.rows.len(), 3);
        assert_eq!(session.edge_table().unwrap().rows.len(), 2);
        assert!(session.size_ranking(Metric::PageRank).is_ok());
        assert_eq!(session.export_text(), "a b 2\nb c 1\n");
    }

    #[test]
    fn test_registry_round_trip() {
        let registry = SessionRegistry::new();
        let session = AnalysisSession::from_edge_list("a b\n", GraphType::Undirected, seeded()).unwrap();
        let id = registry.insert(session);
        assert_eq!(registry.len(), 1);

        let created = registry.info(&id).unwrap().created;
        let count = registry.with_session(&id, |s| Ok(s.store().node_count())).unwrap();
        assert_eq!(count, 2);
        assert!(registry.info(&id).unwrap().modified >= created);
        assert_eq!(registry.list()[0].graph_type, GraphType::Undirected);

        assert!(registry.remove(&id));
        assert!(registry.is_empty());
        assert!(registry.get(&id).is_err());
    }
}
