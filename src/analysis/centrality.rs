// Node and edge centrality measures

use crate::common::config::EngineConfig;
use crate::graph::store::GraphView;
use super::linalg;
use super::path::{bfs_tree, dijkstra_tree, ShortestPathTree};

/// Node and edge betweenness from one Brandes pass
#[derive(Debug, Clone, PartialEq)]
pub struct Betweenness {
    pub nodes: Vec<f64>,
    /// Indexed like [`GraphView::edges`]
    pub edges: Vec<f64>,
}

/// Degree divided by `n - 1`; every node scores 1 when `n <= 1`
pub fn degree_centrality(view: &GraphView) -> Vec<f64> {
    scaled_by_others(view, (0..view.len()).map(|u| view.degree(u) as f64).collect())
}

pub fn in_degree_centrality(view: &GraphView) -> Vec<f64> {
    scaled_by_others(view, view.inc.iter().map(|adj| adj.len() as f64).collect())
}

pub fn out_degree_centrality(view: &GraphView) -> Vec<f64> {
    scaled_by_others(view, view.out.iter().map(|adj| adj.len() as f64).collect())
}

fn scaled_by_others(view: &GraphView, degrees: Vec<f64>) -> Vec<f64> {
    let n = view.len();
    if n <= 1 {
        return vec![1.0; n];
    }
    let scale = 1.0 / (n - 1) as f64;
    degrees.into_iter().map(|d| d * scale).collect()
}

/// Sum of incident edge weights (unit when absent); self-loops count twice
pub fn weighted_degree(view: &GraphView) -> Vec<f64> {
    (0..view.len())
        .map(|u| {
            if view.directed {
                view.out[u].iter().chain(&view.inc[u]).map(|a| a.cost()).sum()
            } else {
                view.out[u].iter()
                    .map(|a| if a.to == u { 2.0 * a.cost() } else { a.cost() })
                    .sum()
            }
        })
        .collect()
}

pub fn weighted_in_degree(view: &GraphView) -> Vec<f64> {
    view.inc.iter().map(|adj| adj.iter().map(|a| a.cost()).sum()).collect()
}

pub fn weighted_out_degree(view: &GraphView) -> Vec<f64> {
    view.out.iter().map(|adj| adj.iter().map(|a| a.cost()).sum()).collect()
}

/// Hop-count closeness, scaled by the reachable fraction of the graph.
///
/// Directed graphs use incoming distance.
pub fn closeness_centrality(view: &GraphView) -> Vec<f64> {
    let n = view.len();
    let adjacency = if view.directed { &view.inc } else { &view.out };

    (0..n)
        .map(|u| {
            let tree = bfs_tree(adjacency, u);
            let reachable: Vec<f64> = tree.dist.iter().copied().filter(|d| d.is_finite()).collect();
            let total: f64 = reachable.iter().sum();
            let r = reachable.len() as f64;
            if total > 0.0 && n > 1 {
                ((r - 1.0) / total) * ((r - 1.0) / (n - 1) as f64)
            } else {
                0.0
            }
        })
        .collect()
}

/// Brandes betweenness for nodes and edges.
///
/// Weighted runs fall back to hop counts when the graph has negative weights.
/// Normalised node scores divide by `(n-1)(n-2)`, edge scores by `n(n-1)`.
/// Unnormalised scores on undirected graphs are halved.
pub fn betweenness(view: &GraphView, weighted: bool, normalized: bool) -> Betweenness {
    let n = view.len();
    let weighted = weighted && !view.has_negative_weights();
    let mut nodes = vec![0.0; n];
    let mut edges = vec![0.0; view.edge_count()];

    for s in 0..n {
        let tree = if weighted { dijkstra_tree(&view.out, s) } else { bfs_tree(&view.out, s) };
        accumulate(&tree, s, &mut nodes, &mut edges);
    }

    let node_scale = if normalized {
        (n > 2).then(|| 1.0 / ((n - 1) * (n - 2)) as f64)
    } else {
        (!view.directed).then_some(0.5)
    };
    let edge_scale = if normalized {
        (n > 1).then(|| 1.0 / (n * (n - 1)) as f64)
    } else {
        (!view.directed).then_some(0.5)
    };

    if let Some(scale) = node_scale {
        nodes.iter_mut().for_each(|v| *v *= scale);
    }
    if let Some(scale) = edge_scale {
        edges.iter_mut().for_each(|v| *v *= scale);
    }

    Betweenness { nodes, edges }
}

fn accumulate(tree: &ShortestPathTree, source: usize, nodes: &mut [f64], edges: &mut [f64]) {
    let mut delta = vec![0.0; nodes.len()];
    for &w in tree.order.iter().rev() {
        let coefficient = (1.0 + delta[w]) / tree.sigma[w];
        for &(v, edge) in &tree.preds[w] {
            let c = tree.sigma[v] * coefficient;
            edges[edge] += c;
            delta[v] += c;
        }
        if w != source {
            nodes[w] += delta[w];
        }
    }
}

/// Principal eigenvector of the adjacency matrix, unit Euclidean norm.
///
/// Undirected graphs up to `max_all_pairs_nodes` are solved densely with the
/// Jacobi eigensolver. Directed and larger graphs use power iteration on
/// `A^T + I`. Returns `None` when the graph has no edges, the principal
/// eigenvalue vanishes (e.g. any DAG), or iteration does not converge.
/// Isolated nodes score zero.
pub fn eigenvector_centrality(view: &GraphView, config: &EngineConfig) -> Option<Vec<f64>> {
    let n = view.len();
    if n == 0 || view.edge_count() == 0 {
        return None;
    }
    if !view.directed && n <= config.max_all_pairs_nodes {
        return dense_eigenvector(view);
    }

    let mut x = vec![1.0 / n as f64; n];
    let tolerance = n as f64 * config.eigenvector_tolerance;

    for iteration in 0..config.eigenvector_max_iterations {
        let previous = x.clone();
        // x_new[v] = x[v] + sum over arcs u -> v of x[u]
        let mut next = previous.clone();
        for (u, a) in view.arcs() {
            next[a.to] += previous[u];
        }
        if !linalg::normalize_l2(&mut next) {
            return None;
        }
        x = next;

        let change: f64 = x.iter().zip(&previous).map(|(a, b)| (a - b).abs()).sum();
        if change < tolerance {
            tracing::debug!("Eigenvector centrality converged after {} iterations", iteration + 1);
            let mut ax = vec![0.0; n];
            for (u, a) in view.arcs() {
                ax[a.to] += x[u];
            }
            let eigenvalue = linalg::dot(&x, &ax);
            return finish_eigenvector(view, x, eigenvalue);
        }
    }

    tracing::warn!(
        "Eigenvector centrality did not converge in {} iterations",
        config.eigenvector_max_iterations
    );
    None
}

/// Eigenvector of the largest adjacency eigenvalue, signed so the entries sum positive
fn dense_eigenvector(view: &GraphView) -> Option<Vec<f64>> {
    let mut adjacency = linalg::zeros(view.len());
    for (u, a) in view.arcs() {
        adjacency[u][a.to] += 1.0;
    }

    let (_, mut vectors) = linalg::symmetric_eigen(&adjacency);
    let mut x = vectors.pop()?;
    if x.iter().sum::<f64>() < 0.0 {
        x.iter_mut().for_each(|v| *v = -*v);
    }
    let eigenvalue = linalg::dot(&x, &linalg::mat_vec(&adjacency, &x));
    finish_eigenvector(view, x, eigenvalue)
}

fn finish_eigenvector(view: &GraphView, mut x: Vec<f64>, eigenvalue: f64) -> Option<Vec<f64>> {
    if eigenvalue.abs() < 1e-9 {
        tracing::debug!("Adjacency spectrum is degenerate; eigenvector centrality undefined");
        return None;
    }

    for (u, value) in x.iter_mut().enumerate() {
        if view.out[u].is_empty() && view.inc[u].is_empty() {
            *value = 0.0;
        }
    }
    linalg::normalize_l2(&mut x);
    Some(x)
}

/// PageRank as the stationary vector of the Google matrix.
///
/// Negative weights are clamped to zero; nodes without positive out-weight
/// are dangling and spread their rank uniformly.
pub fn pagerank(view: &GraphView, weighted: bool, config: &EngineConfig) -> Vec<f64> {
    let n = view.len();
    if n == 0 {
        return Vec::new();
    }

    let alpha = config.pagerank_damping;
    let uniform = 1.0 / n as f64;
    let edge_weight = |cost: f64| if weighted { cost.max(0.0) } else { 1.0 };

    let out_weight: Vec<f64> = view.out.iter()
        .map(|adj| adj.iter().map(|a| edge_weight(a.cost())).sum())
        .collect();

    let mut x = vec![uniform; n];
    for iteration in 0..config.pagerank_max_iterations {
        let dangling: f64 = (0..n).filter(|&u| out_weight[u] <= 0.0).map(|u| x[u]).sum();
        let mut next = vec![(1.0 - alpha) * uniform + alpha * dangling * uniform; n];
        for (u, a) in view.arcs() {
            if out_weight[u] > 0.0 {
                next[a.to] += alpha * x[u] * edge_weight(a.cost()) / out_weight[u];
            }
        }
        linalg::normalize_l1(&mut next);

        let change: f64 = next.iter().zip(&x).map(|(a, b)| (a - b).abs()).sum();
        x = next;
        if change < n as f64 * config.pagerank_tolerance {
            tracing::debug!("PageRank converged after {} iterations", iteration + 1);
            return x;
        }
    }

    tracing::warn!("PageRank stopped at {} iterations before converging", config.pagerank_max_iterations);
    x
}

/// Local clustering coefficient on an undirected graph.
///
/// The weighted form uses the geometric mean of triangle edge weights
/// normalised by the largest weight.
pub fn clustering(view: &GraphView, weighted: bool) -> Vec<f64> {
    let n = view.len();
    let mut weights: std::collections::HashMap<(usize, usize), f64> = std::collections::HashMap::new();
    for edge in &view.edges {
        weights.insert((edge.source.min(edge.target), edge.source.max(edge.target)), edge.cost());
    }
    let max_weight = if weighted {
        weights.values().copied().fold(f64::NEG_INFINITY, f64::max)
    } else {
        1.0
    };
    let max_weight = if max_weight.is_finite() && max_weight != 0.0 { max_weight } else { 1.0 };
    let w = |a: usize, b: usize| -> f64 {
        if !weighted {
            return 1.0;
        }
        weights.get(&(a.min(b), a.max(b))).copied().unwrap_or(1.0) / max_weight
    };

    let neighbor_sets: Vec<Vec<usize>> = (0..n).map(|u| view.neighbors_any(u)).collect();
    let mut is_neighbor = vec![false; n];

    (0..n)
        .map(|i| {
            let nbrs = &neighbor_sets[i];
            let degree = nbrs.len();
            if degree < 2 {
                return 0.0;
            }
            nbrs.iter().for_each(|&j| is_neighbor[j] = true);

            // Each triangle through i is seen from both of its other corners
            let mut triangles = 0.0;
            for &j in nbrs {
                for &k in &neighbor_sets[j] {
                    if k != i && is_neighbor[k] {
                        triangles += if weighted { (w(i, j) * w(j, k) * w(k, i)).cbrt() } else { 1.0 };
                    }
                }
            }

            nbrs.iter().for_each(|&j| is_neighbor[j] = false);
            if triangles == 0.0 {
                0.0
            } else {
                triangles / (degree * (degree - 1)) as f64
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::import_export::build_from_edge_list;
    use crate::graph::model::GraphType;

    fn view(text: &str, graph_type: GraphType) -> GraphView {
        build_from_edge_list(text, graph_type).unwrap().view()
    }

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn test_degree_centrality() {
        let star = view("c a\nc b\nc d\n", GraphType::Undirected);
        assert!(close(&degree_centrality(&star), &[1.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]));

        let directed = view("a b\na c\n", GraphType::Directed);
        assert!(close(&out_degree_centrality(&directed), &[1.0, 0.0, 0.0]));
        assert!(close(&in_degree_centrality(&directed), &[0.0, 0.5, 0.5]));
    }

    #[test]
    fn test_weighted_degrees() {
        let g = view("a b 2\nb c\n", GraphType::Undirected);
        assert!(close(&weighted_degree(&g), &[2.0, 3.0, 1.0]));

        let d = view("a b 2\nc b 3\n", GraphType::Directed);
        assert!(close(&weighted_in_degree(&d), &[0.0, 5.0, 0.0]));
        assert!(close(&weighted_out_degree(&d), &[2.0, 0.0, 3.0]));
    }

    #[test]
    fn test_closeness_on_path() {
        let g = view("a b\nb c\n", GraphType::Undirected);
        assert!(close(&closeness_centrality(&g), &[2.0 / 3.0, 1.0, 2.0 / 3.0]));

        // Directed closeness counts incoming distance
        let d = view("a b\n", GraphType::Directed);
        assert!(close(&closeness_centrality(&d), &[0.0, 1.0]));
    }

    #[test]
    fn test_betweenness_on_path() {
        let g = view("a b\nb c\nc d\n", GraphType::Undirected);
        let b = betweenness(&g, false, true);
        assert!(close(&b.nodes, &[0.0, 2.0 / 3.0, 2.0 / 3.0, 0.0]));
        // a-b carries 6 of the 12 ordered pairs, b-c carries 8
        assert!(close(&b.edges, &[0.5, 2.0 / 3.0, 0.5]));

        let raw = betweenness(&g, false, false);
        assert!(close(&raw.nodes, &[0.0, 2.0, 2.0, 0.0]));
        assert!(close(&raw.edges, &[3.0, 4.0, 3.0]));
    }

    #[test]
    fn test_weighted_betweenness_follows_weights() {
        let g = view("a b 1\nb c 1\na c 5\n", GraphType::Undirected);
        let weighted = betweenness(&g, true, true);
        assert!(weighted.nodes[1] > 0.0);
        let unweighted = betweenness(&g, false, true);
        assert!(close(&unweighted.nodes, &[0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_eigenvector_centrality() {
        let config = EngineConfig::default();
        let triangle = view("a b\nb c\nc a\n", GraphType::Undirected);
        let x = eigenvector_centrality(&triangle, &config).unwrap();
        let expected = 1.0 / 3f64.sqrt();
        assert!(close(&x, &[expected, expected, expected]));

        let star = view("c a\nc b\nc d\n", GraphType::Undirected);
        let x = eigenvector_centrality(&star, &config).unwrap();
        assert!(x[0] > x[1]);
        assert!((x[1] - x[2]).abs() < 1e-9);

        let dag = view("a b\nb c\n", GraphType::Directed);
        assert_eq!(eigenvector_centrality(&dag, &config), None);
    }

    #[test]
    fn test_eigenvector_dense_and_iterative_agree() {
        let g = view("a b\nb c\nc d\nd a\na c\nd e\n", GraphType::Undirected);
        let dense = eigenvector_centrality(&g, &EngineConfig::default()).unwrap();
        let small = EngineConfig { max_all_pairs_nodes: 2, ..EngineConfig::default() };
        let iterative = eigenvector_centrality(&g, &small).unwrap();
        assert!(dense.iter().all(|v| *v > 0.0));
        for (d, i) in dense.iter().zip(&iterative) {
            assert!((d - i).abs() < 1e-6);
        }

        // Path a-b-c: principal eigenvector (1, sqrt 2, 1) / 2
        let path = view("a b\nb c\n", GraphType::Undirected);
        let x = eigenvector_centrality(&path, &EngineConfig::default()).unwrap();
        assert!(close(&x, &[0.5, 2f64.sqrt() / 2.0, 0.5]));
    }

    #[test]
    fn test_pagerank_sums_to_one() {
        let config = EngineConfig::default();
        let g = view("a b\nb c\nc a\nc d\n", GraphType::Directed);
        let pr = pagerank(&g, false, &config);
        assert!((pr.iter().sum::<f64>() - 1.0).abs() < 1e-9);

        let cycle = view("a b\nb c\nc a\n", GraphType::Directed);
        assert!(close(&pagerank(&cycle, false, &config), &[1.0 / 3.0; 3]));
    }

    #[test]
    fn test_clustering() {
        let g = view("a b\nb c\nc a\nc d\n", GraphType::Undirected);
        assert!(close(&clustering(&g, false), &[1.0, 1.0, 1.0 / 3.0, 0.0]));

        let weighted = view("a b 1\nb c 1\nc a 1\n", GraphType::Undirected);
        assert!(close(&clustering(&weighted, true), &[1.0, 1.0, 1.0]));
    }
}
