// Structural graph properties: density, DAG-ness, connectivity, diameter,
// negative cycles and per-component average shortest path length

use crate::common::config::EngineConfig;
use crate::graph::model::GraphProperties;
use crate::graph::store::GraphView;
use super::components;
use super::path::{bfs_tree, dijkstra_tree};

/// Compute every structural property of a snapshot
pub fn compute_basic_properties(view: &GraphView, growing: bool, config: &EngineConfig) -> GraphProperties {
    let is_weighted = view.is_weighted();
    let has_negative_weights = view.has_negative_weights();
    let negative_cycle = is_weighted && has_negative_cycle(view);

    let diameter = if negative_cycle {
        None
    } else {
        diameter(view, is_weighted, config)
    };

    let weighted_average_shortest_path_length = if is_weighted && !has_negative_weights {
        Some(average_shortest_path_lengths(view, true))
    } else {
        None
    };

    let properties = GraphProperties {
        is_weighted,
        has_negative_weights,
        negative_cycle,
        diameter,
        density: density(view),
        is_dag: view.directed.then(|| components::is_dag(view)),
        is_connected: components::is_connected(view),
        node_count: view.len(),
        edge_count: view.edge_count(),
        average_shortest_path_length: average_shortest_path_lengths(view, false),
        weighted_average_shortest_path_length,
        growing,
    };

    tracing::debug!(
        "Basic properties: {} nodes, {} edges, density {:.4}, diameter {:?}, negative cycle {}",
        properties.node_count, properties.edge_count, properties.density,
        properties.diameter, properties.negative_cycle
    );
    properties
}

/// Edge density; zero for graphs with fewer than two nodes
pub fn density(view: &GraphView) -> f64 {
    let n = view.len() as f64;
    let m = view.edge_count() as f64;
    if view.len() <= 1 {
        return 0.0;
    }
    if view.directed {
        m / (n * (n - 1.0))
    } else {
        2.0 * m / (n * (n - 1.0))
    }
}

/// Bellman–Ford from a virtual source joined to every node.
///
/// Undirected edges are relaxed in both orientations, so any negative
/// undirected edge is a negative cycle.
pub fn has_negative_cycle(view: &GraphView) -> bool {
    if !view.has_negative_weights() {
        return false;
    }

    let n = view.len();
    let mut dist = vec![0.0; n];
    for _ in 0..n {
        let mut changed = false;
        for (u, a) in view.arcs() {
            let candidate = dist[u] + a.cost();
            if candidate < dist[a.to] {
                dist[a.to] = candidate;
                changed = true;
            }
        }
        if !changed {
            return false;
        }
    }

    view.arcs().any(|(u, a)| dist[u] + a.cost() < dist[a.to])
}

/// Longest finite shortest-path distance over ordered reachable pairs.
///
/// `None` when no pair is reachable, or when negative weights would need an
/// all-pairs pass above the configured size guard.
pub fn diameter(view: &GraphView, weighted: bool, config: &EngineConfig) -> Option<f64> {
    let n = view.len();
    let mut longest: Option<f64> = None;
    let mut record = |d: f64| {
        if d.is_finite() {
            longest = Some(longest.map_or(d, |m: f64| m.max(d)));
        }
    };

    if weighted && view.has_negative_weights() {
        if n > config.max_all_pairs_nodes {
            tracing::warn!(
                "Skipping diameter: {} nodes exceeds all-pairs limit {}",
                n, config.max_all_pairs_nodes
            );
            return None;
        }
        let dist = floyd_warshall(view);
        for (u, row) in dist.iter().enumerate() {
            for (v, &d) in row.iter().enumerate() {
                if u != v {
                    record(d);
                }
            }
        }
    } else {
        for u in 0..n {
            let tree = if weighted { dijkstra_tree(&view.out, u) } else { bfs_tree(&view.out, u) };
            for (v, &d) in tree.dist.iter().enumerate() {
                if u != v {
                    record(d);
                }
            }
        }
    }

    longest
}

/// All-pairs shortest distances; caller guarantees there is no negative cycle
pub fn floyd_warshall(view: &GraphView) -> Vec<Vec<f64>> {
    let n = view.len();
    let mut dist = vec![vec![f64::INFINITY; n]; n];
    for (u, row) in dist.iter_mut().enumerate() {
        row[u] = 0.0;
    }
    for (u, a) in view.arcs() {
        if a.cost() < dist[u][a.to] {
            dist[u][a.to] = a.cost();
        }
    }

    for k in 0..n {
        for i in 0..n {
            if dist[i][k].is_infinite() {
                continue;
            }
            for j in 0..n {
                let candidate = dist[i][k] + dist[k][j];
                if candidate < dist[i][j] {
                    dist[i][j] = candidate;
                }
            }
        }
    }

    dist
}

/// Average shortest path length per connected component of the undirected
/// view, in component discovery order. Singleton components are skipped.
pub fn average_shortest_path_lengths(view: &GraphView, weighted: bool) -> Vec<f64> {
    let undirected = view.undirected();
    let mut averages = Vec::new();

    for component in components::weak_components(&undirected) {
        let k = component.len();
        if k < 2 {
            continue;
        }
        let mut total = 0.0;
        for &u in &component {
            let tree = if weighted {
                dijkstra_tree(&undirected.out, u)
            } else {
                bfs_tree(&undirected.out, u)
            };
            total += component.iter().map(|&v| tree.dist[v]).sum::<f64>();
        }
        averages.push(total / (k * (k - 1)) as f64);
    }

    averages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::import_export::build_from_edge_list;
    use crate::graph::model::GraphType;

    fn props(text: &str, graph_type: GraphType) -> GraphProperties {
        let store = build_from_edge_list(text, graph_type).unwrap();
        compute_basic_properties(&store.view(), false, &EngineConfig::default())
    }

    #[test]
    fn test_line_graph_properties() {
        let p = props("A B\nB C\nC D\n", GraphType::Undirected);
        assert_eq!(p.node_count, 4);
        assert_eq!(p.edge_count, 3);
        assert!((p.density - 0.5).abs() < 1e-12);
        assert_eq!(p.diameter, Some(3.0));
        assert!(p.is_connected);
        assert_eq!(p.is_dag, None);
        assert_eq!(p.average_shortest_path_length.len(), 1);
        assert!((p.average_shortest_path_length[0] - 20.0 / 12.0).abs() < 1e-12);
        assert!(!p.is_weighted);
        assert_eq!(p.weighted_average_shortest_path_length, None);
    }

    #[test]
    fn test_negative_cycle_detected() {
        let p = props("A B -1\nB A -1\n", GraphType::Directed);
        assert!(p.is_weighted);
        assert!(p.has_negative_weights);
        assert!(p.negative_cycle);
        assert_eq!(p.diameter, None);
    }

    #[test]
    fn test_negative_weights_without_cycle() {
        let p = props("a b 2\nb c -1\n", GraphType::Directed);
        assert!(p.has_negative_weights);
        assert!(!p.negative_cycle);
        assert_eq!(p.diameter, Some(2.0));
        assert_eq!(p.is_dag, Some(true));
        assert!(!p.is_connected);
    }

    #[test]
    fn test_components_skip_singletons() {
        let store = build_from_edge_list("a b\nc d\nd e\n", GraphType::Undirected).unwrap();
        let mut store = store;
        store.add_node(crate::common::node::NodeId::label("lonely"));
        let p = compute_basic_properties(&store.view(), false, &EngineConfig::default());
        assert_eq!(p.average_shortest_path_length.len(), 2);
        assert!((p.average_shortest_path_length[0] - 1.0).abs() < 1e-12);
        assert!(!p.is_connected);
    }

    #[test]
    fn test_weighted_average_shortest_path() {
        let p = props("a b 2\nb c 2\n", GraphType::Undirected);
        let weighted = p.weighted_average_shortest_path_length.unwrap();
        assert!((weighted[0] - 16.0 / 6.0).abs() < 1e-12);
        assert_eq!(p.diameter, Some(4.0));
    }

    #[test]
    fn test_edgeless_diameter_is_none() {
        let mut store = crate::graph::store::GraphStore::new(GraphType::Directed, crate::common::node::GraphOrigin::Uploaded);
        store.add_node(crate::common::node::NodeId::label("x"));
        let p = compute_basic_properties(&store.view(), false, &EngineConfig::default());
        assert_eq!(p.diameter, None);
        assert_eq!(p.density, 0.0);
    }
}
