// GrowthSimulator - Barabási–Albert preferential attachment on growing graphs

use std::collections::BTreeMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use crate::common::config::EngineConfig;
use crate::common::error::{GraphLabError, Result};
use crate::common::node::NodeId;
use crate::common::utils::mean;
use crate::graph::store::{GraphStore, GraphView};
use super::centrality::degree_centrality;
use super::properties::average_shortest_path_lengths;

/// Aggregate metrics per time step; step 0 is the starting graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvolutionSeries {
    pub degree: BTreeMap<usize, f64>,
    /// `None` when no component has two or more nodes
    pub path_length: BTreeMap<usize, Option<f64>>,
}

impl EvolutionSeries {
    fn record(&mut self, step: usize, view: &GraphView) -> Result<()> {
        self.degree.insert(step, mean(degree_centrality(view))?);
        let lengths = average_shortest_path_lengths(view, false);
        self.path_length.insert(step, mean(lengths).ok());
        Ok(())
    }
}

pub struct GrowthSimulator<'a> {
    config: &'a EngineConfig,
}

impl<'a> GrowthSimulator<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        GrowthSimulator { config }
    }

    /// Add one node and attach it until its degree reaches `initial_degree`.
    ///
    /// Candidates are drawn uniformly from the existing nodes and accepted with
    /// probability `degree / 2m`. On a directed graph a second draw decides
    /// between a reciprocated pair and a single outgoing edge. If the retry
    /// budget runs out the new node is rolled back and `GrowthStalled` is
    /// returned. Returns the created edges.
    pub fn add_node_preferential_attachment<R: Rng + ?Sized>(
        &self,
        store: &mut GraphStore,
        initial_degree: usize,
        rng: &mut R,
    ) -> Result<Vec<(NodeId, NodeId)>> {
        if !store.is_growing() {
            return Err(GraphLabError::not_growing());
        }

        let existing = store.node_ids();
        let node = NodeId::Index(store.node_count() as u64);
        if existing.is_empty() || store.contains_node(&node) {
            return Err(GraphLabError::bad_parameter(
                format!("cannot attach node {} to this graph", node)
            ));
        }

        store.add_node(node.clone());
        let mut created = Vec::new();
        let mut attempts = 0usize;
        let mut degree = 0usize;

        while degree < initial_degree {
            if attempts >= self.config.growth_retry_limit {
                store.remove_node(&node)?;
                tracing::warn!("Growth stalled for node {} at degree {}/{}", node, degree, initial_degree);
                return Err(GraphLabError::growth_stalled(attempts, degree, initial_degree));
            }
            attempts += 1;

            let candidate = &existing[rng.gen_range(0..existing.len())];
            let edges = store.edge_count();
            if edges == 0 {
                continue;
            }
            let p = store.degree(candidate).unwrap_or(0) as f64 / (2 * edges) as f64;
            if p <= rng.r#gen::<f64>() || store.has_edge(&node, candidate) {
                continue;
            }

            if !store.is_directed() {
                store.add_edge(node.clone(), candidate.clone(), None);
                created.push((node.clone(), candidate.clone()));
            } else if p > rng.r#gen::<f64>() {
                if !store.has_edge(candidate, &node) {
                    store.add_edge(node.clone(), candidate.clone(), None);
                    store.add_edge(candidate.clone(), node.clone(), None);
                    created.push((node.clone(), candidate.clone()));
                    created.push((candidate.clone(), node.clone()));
                }
            } else {
                store.add_edge(node.clone(), candidate.clone(), None);
                created.push((node.clone(), candidate.clone()));
            }
            degree = store.degree(&node).unwrap_or(0);
        }

        tracing::debug!("Node {} attached with {} edges after {} draws", node, created.len(), attempts);
        Ok(created)
    }

    /// Remove the most recently added node unless the graph is back at its
    /// seed size. Returns the removed node.
    pub fn remove_last_node(&self, store: &mut GraphStore) -> Result<Option<NodeId>> {
        let state = store.growth_state().ok_or_else(GraphLabError::not_growing)?;
        if store.node_count() <= state.initial_nodes {
            return Ok(None);
        }
        let Some(last) = store.last_node() else {
            return Ok(None);
        };
        store.remove_node(&last)?;
        tracing::debug!("Removed node {}; {} nodes remain", last, store.node_count());
        Ok(Some(last))
    }

    /// Grow a private copy for `steps` iterations, recording the average degree
    /// centrality and average shortest path length after every step.
    pub fn simulate_evolution<R: Rng + ?Sized>(
        &self,
        store: &GraphStore,
        steps: usize,
        rng: &mut R,
    ) -> Result<EvolutionSeries> {
        let state = store.growth_state().ok_or_else(GraphLabError::not_growing)?;
        let mut copy = store.clone();
        let mut series = EvolutionSeries::default();

        series.record(0, &copy.view())?;
        for step in 1..=steps {
            self.add_node_preferential_attachment(&mut copy, state.initial_degree, rng)?;
            series.record(step, &copy.view())?;
        }

        tracing::info!("Simulated {} growth steps from {} nodes", steps, store.node_count());
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use crate::common::error::ErrorCode;
    use crate::graph::generators::barabasi_seed;
    use crate::graph::import_export::build_from_edge_list;
    use crate::graph::model::GraphType;

    #[test]
    fn test_new_node_reaches_target_degree() {
        let config = EngineConfig::default();
        let growth = GrowthSimulator::new(&config);
        let mut rng = StdRng::seed_from_u64(7);
        let mut store = barabasi_seed(5, 3, GraphType::Undirected).unwrap();

        for expected in 5..12u64 {
            let edges = growth.add_node_preferential_attachment(&mut store, 3, &mut rng).unwrap();
            let node = NodeId::Index(expected);
            assert_eq!(edges.len(), 3);
            assert_eq!(store.degree(&node), Some(3));
            assert!(!store.has_edge(&node, &node));
            let mut targets: Vec<_> = edges.iter().map(|(_, t)| t.clone()).collect();
            targets.sort();
            targets.dedup();
            assert_eq!(targets.len(), 3);
        }
        assert_eq!(store.node_count(), 12);
    }

    #[test]
    fn test_directed_growth_has_no_duplicates() {
        let config = EngineConfig::default();
        let growth = GrowthSimulator::new(&config);
        let mut rng = StdRng::seed_from_u64(11);
        let mut store = barabasi_seed(4, 2, GraphType::Directed).unwrap();

        let edges = growth.add_node_preferential_attachment(&mut store, 2, &mut rng).unwrap();
        let mut sorted = edges.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), edges.len());
        assert!(store.degree(&NodeId::Index(4)).unwrap() >= 2);
    }

    #[test]
    fn test_stall_rolls_back() {
        let config = EngineConfig { growth_retry_limit: 500, ..EngineConfig::default() };
        let growth = GrowthSimulator::new(&config);
        let mut rng = StdRng::seed_from_u64(3);
        let mut store = barabasi_seed(2, 1, GraphType::Undirected).unwrap();

        let err = growth.add_node_preferential_attachment(&mut store, 3, &mut rng).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::GrowthStalled);
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn test_requires_growing_graph() {
        let config = EngineConfig::default();
        let growth = GrowthSimulator::new(&config);
        let mut rng = StdRng::seed_from_u64(1);
        let mut store = build_from_edge_list("a b\n", GraphType::Undirected).unwrap();
        let err = growth.add_node_preferential_attachment(&mut store, 1, &mut rng).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::NotGrowing);
        assert_eq!(growth.remove_last_node(&mut store).unwrap_err().error_code(), ErrorCode::NotGrowing);
    }

    #[test]
    fn test_remove_stops_at_seed_size() {
        let config = EngineConfig::default();
        let growth = GrowthSimulator::new(&config);
        let mut rng = StdRng::seed_from_u64(5);
        let mut store = barabasi_seed(3, 2, GraphType::Undirected).unwrap();

        growth.add_node_preferential_attachment(&mut store, 2, &mut rng).unwrap();
        assert_eq!(growth.remove_last_node(&mut store).unwrap(), Some(NodeId::Index(3)));
        assert_eq!(store.edge_count(), 3);
        assert_eq!(growth.remove_last_node(&mut store).unwrap(), None);
        assert_eq!(store.node_count(), 3);
    }

    #[test]
    fn test_evolution_leaves_live_graph_untouched() {
        let config = EngineConfig::default();
        let growth = GrowthSimulator::new(&config);
        let mut rng = StdRng::seed_from_u64(9);
        let store = barabasi_seed(4, 2, GraphType::Undirected).unwrap();

        let series = growth.simulate_evolution(&store, 5, &mut rng).unwrap();
        assert_eq!(store.node_count(), 4);
        assert_eq!(series.degree.len(), 6);
        assert_eq!(series.path_length.keys().copied().collect::<Vec<_>>(), (0..=5).collect::<Vec<_>>());
        assert!((series.degree[&0] - 1.0).abs() < 1e-12);
        assert_eq!(series.path_length[&0], Some(1.0));
    }
}
