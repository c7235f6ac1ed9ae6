// CommunityDetector - maximal cliques and Girvan–Newman decomposition

use serde::{Deserialize, Serialize};
use crate::common::config::EngineConfig;
use crate::common::error::{GraphLabError, Result};
use crate::common::node::NodeId;
use crate::common::utils::approx_eq;
use crate::graph::store::{GraphStore, GraphView};
use super::centrality::betweenness;
use super::components::weak_components;

/// Hierarchical community structure; level `i` is coarser than level `i + 1`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunityLevels {
    pub levels: Vec<Vec<Vec<NodeId>>>,
}

impl CommunityLevels {
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Index of the community holding `node` at `level`
    pub fn community_of(&self, level: usize, node: &NodeId) -> Option<usize> {
        self.levels.get(level)?
            .iter()
            .position(|community| community.contains(node))
    }
}

pub struct CommunityDetector<'a> {
    config: &'a EngineConfig,
}

impl<'a> CommunityDetector<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        CommunityDetector { config }
    }

    /// Maximal cliques of the undirected projection, ignoring weights
    pub fn find_cliques(&self, store: &GraphStore) -> Result<Vec<Vec<NodeId>>> {
        let view = store.view().undirected();
        if view.len() > self.config.max_clique_nodes {
            return Err(GraphLabError::graph_too_large("clique enumeration", view.len(), self.config.max_clique_nodes));
        }

        let neighbors: Vec<Vec<usize>> = (0..view.len()).map(|u| view.neighbors_any(u)).collect();
        let mut cliques = Vec::new();
        let candidates: Vec<usize> = (0..view.len()).collect();
        bron_kerbosch(&neighbors, &mut Vec::new(), candidates, Vec::new(), &mut cliques);

        tracing::debug!("Found {} maximal cliques", cliques.len());
        Ok(cliques.into_iter()
            .map(|mut clique| {
                clique.sort_unstable();
                clique.into_iter().map(|i| view.id(i).clone()).collect()
            })
            .collect())
    }

    /// Girvan–Newman on a private undirected copy.
    ///
    /// Every round removes all edges tied at the maximum unweighted edge
    /// betweenness; a level is recorded only when the component count grows.
    pub fn detect_communities(&self, store: &GraphStore) -> CommunityLevels {
        let mut current = store.view().undirected();
        let mut previous = weak_components(&current).len();
        let mut result = CommunityLevels::default();
        let mut round = 0usize;

        while current.edge_count() > 0 {
            round += 1;
            let scores = betweenness(&current, false, false).edges;
            let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let next = current.filter_edges(|i, _| !approx_eq(scores[i], max));

            let components = weak_components(&next);
            if components.len() > previous {
                previous = components.len();
                tracing::debug!(
                    "Community level {} after round {}: {} components",
                    result.levels.len(), round, components.len()
                );
                result.levels.push(label(&next, components));
            }
            current = next;
        }

        tracing::info!("Girvan-Newman finished: {} levels in {} rounds", result.len(), round);
        result
    }
}

fn label(view: &GraphView, components: Vec<Vec<usize>>) -> Vec<Vec<NodeId>> {
    components.into_iter()
        .map(|component| component.into_iter().map(|i| view.id(i).clone()).collect())
        .collect()
}

/// Bron–Kerbosch with pivoting
fn bron_kerbosch(
    neighbors: &[Vec<usize>],
    clique: &mut Vec<usize>,
    candidates: Vec<usize>,
    mut excluded: Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if candidates.is_empty() {
        if excluded.is_empty() {
            out.push(clique.clone());
        }
        return;
    }

    let pivot = candidates.iter()
        .chain(excluded.iter())
        .copied()
        .max_by_key(|&u| candidates.iter().filter(|v| neighbors[u].contains(v)).count())
        .unwrap_or(candidates[0]);

    let mut remaining = candidates.clone();
    for v in candidates.into_iter().filter(|v| !neighbors[pivot].contains(v)) {
        let adjacent = &neighbors[v];
        let next_candidates = remaining.iter().copied().filter(|u| adjacent.contains(u)).collect();
        let next_excluded = excluded.iter().copied().filter(|u| adjacent.contains(u)).collect();

        clique.push(v);
        bron_kerbosch(neighbors, clique, next_candidates, next_excluded, out);
        clique.pop();

        remaining.retain(|&u| u != v);
        excluded.push(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::node::GraphOrigin;
    use crate::graph::import_export::build_from_edge_list;
    use crate::graph::model::GraphType;

    fn names(groups: &[Vec<NodeId>]) -> Vec<Vec<String>> {
        let mut out: Vec<Vec<String>> = groups.iter()
            .map(|g| g.iter().map(|n| n.to_string()).collect())
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_no_edges_no_levels() {
        let config = EngineConfig::default();
        let mut store = GraphStore::new(GraphType::Undirected, GraphOrigin::Uploaded);
        store.add_node(NodeId::label("a"));
        store.add_node(NodeId::label("b"));
        assert!(CommunityDetector::new(&config).detect_communities(&store).is_empty());
    }

    #[test]
    fn test_triangle_splits_in_one_level() {
        let config = EngineConfig::default();
        let store = build_from_edge_list("a b\nb c\nc a\n", GraphType::Undirected).unwrap();
        let levels = CommunityDetector::new(&config).detect_communities(&store);
        assert_eq!(levels.len(), 1);
        assert_eq!(names(&levels.levels[0]), vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn test_two_triangles_bridge() {
        let config = EngineConfig::default();
        let text = "a b\nb c\nc a\nc d\nd e\ne f\nf d\n";
        let store = build_from_edge_list(text, GraphType::Undirected).unwrap();
        let levels = CommunityDetector::new(&config).detect_communities(&store);

        assert!(levels.len() >= 2);
        assert_eq!(names(&levels.levels[0]), vec![vec!["a", "b", "c"], vec!["d", "e", "f"]]);
        assert_eq!(levels.community_of(0, &NodeId::label("a")), levels.community_of(0, &NodeId::label("b")));
        let last = levels.levels.last().unwrap();
        assert_eq!(last.len(), 6);
        for pair in levels.levels.windows(2) {
            assert!(pair[0].len() < pair[1].len());
        }
    }

    #[test]
    fn test_directed_graph_uses_projection() {
        let config = EngineConfig::default();
        let store = build_from_edge_list("a b\nb a\n", GraphType::Directed).unwrap();
        let levels = CommunityDetector::new(&config).detect_communities(&store);
        assert_eq!(levels.len(), 1);
    }

    #[test]
    fn test_find_cliques() {
        let config = EngineConfig::default();
        let store = build_from_edge_list("a b\nb c\nc a\nc d\n", GraphType::Undirected).unwrap();
        let mut store = store;
        store.add_node(NodeId::label("e"));
        let cliques = CommunityDetector::new(&config).find_cliques(&store).unwrap();
        assert_eq!(names(&cliques), vec![vec!["a", "b", "c"], vec!["c", "d"], vec!["e"]]);
    }

    #[test]
    fn test_clique_guard() {
        let config = EngineConfig { max_clique_nodes: 2, ..EngineConfig::default() };
        let store = build_from_edge_list("a b\nb c\n", GraphType::Undirected).unwrap();
        let err = CommunityDetector::new(&config).find_cliques(&store).unwrap_err();
        assert_eq!(err.error_code(), crate::common::error::ErrorCode::GraphTooLarge);
    }
}
