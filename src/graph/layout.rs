// 2-D node layouts consumed by drawing collaborators

use std::f64::consts::PI;
use rand::Rng;
use serde::{Deserialize, Serialize};
use crate::analysis::linalg::{self, Matrix};
use crate::common::config::EngineConfig;
use crate::common::node::NodeId;
use crate::common::utils::rescale_positions;
use super::model::Position;
use super::store::GraphView;

/// Layout algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutAlgorithm {
    Circular,
    Random,
    Spring,
    Shell,
    Spectral,
}

impl LayoutAlgorithm {
    /// Parse a layout name; anything unrecognised selects spectral
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "circular" => LayoutAlgorithm::Circular,
            "random" => LayoutAlgorithm::Random,
            "spring" => LayoutAlgorithm::Spring,
            "shell" => LayoutAlgorithm::Shell,
            _ => LayoutAlgorithm::Spectral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutAlgorithm::Circular => "circular",
            LayoutAlgorithm::Random => "random",
            LayoutAlgorithm::Spring => "spring",
            LayoutAlgorithm::Shell => "shell",
            LayoutAlgorithm::Spectral => "spectral",
        }
    }

    /// Spring and spectral build a dense n x n matrix
    fn is_dense(&self) -> bool {
        matches!(self, LayoutAlgorithm::Spring | LayoutAlgorithm::Spectral)
    }
}

/// Compute positions for every node of the view.
///
/// Dense layouts fall back to circular above `max_all_pairs_nodes`.
pub fn compute_layout<R: Rng + ?Sized>(
    view: &GraphView,
    algorithm: LayoutAlgorithm,
    config: &EngineConfig,
    rng: &mut R,
) -> Vec<(NodeId, Position)> {
    let algorithm = if algorithm.is_dense() && view.len() > config.max_all_pairs_nodes {
        tracing::warn!(
            "{} layout skipped for {} nodes (limit {}), using circular",
            algorithm.as_str(), view.len(), config.max_all_pairs_nodes
        );
        LayoutAlgorithm::Circular
    } else {
        algorithm
    };

    let points = match algorithm {
        LayoutAlgorithm::Circular => circular(view.len()),
        LayoutAlgorithm::Random => random(view.len(), rng),
        LayoutAlgorithm::Spring => spring(view, config.spring_iterations, rng),
        LayoutAlgorithm::Shell => shell(&[(0..view.len()).collect()]),
        LayoutAlgorithm::Spectral => spectral(view),
    };

    tracing::debug!("Computed {} layout for {} nodes", algorithm.as_str(), view.len());

    view.ids.iter()
        .cloned()
        .zip(points)
        .map(|(id, (x, y))| (id, Position::new(x, y)))
        .collect()
}

fn circular(n: usize) -> Vec<(f64, f64)> {
    if n == 1 {
        return vec![(0.0, 0.0)];
    }
    let mut points: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            let theta = 2.0 * PI * i as f64 / n as f64;
            (theta.cos(), theta.sin())
        })
        .collect();
    rescale_positions(&mut points);
    points
}

/// Uniform positions in the unit square
fn random<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<(f64, f64)> {
    (0..n).map(|_| (rng.r#gen::<f64>(), rng.r#gen::<f64>())).collect()
}

/// Concentric circles, one per shell; a single-node first shell sits at the centre
fn shell(shells: &[Vec<usize>]) -> Vec<(f64, f64)> {
    let n: usize = shells.iter().map(Vec::len).sum();
    let mut points = vec![(0.0, 0.0); n];
    let mut radius = if shells.first().is_some_and(|s| s.len() == 1) { 0.0 } else { 1.0 };

    for nodes in shells {
        let count = nodes.len().max(1) as f64;
        for (i, &node) in nodes.iter().enumerate() {
            let theta = 2.0 * PI * i as f64 / count;
            points[node] = (radius * theta.cos(), radius * theta.sin());
        }
        radius += 1.0;
    }
    points
}

/// Fruchterman–Reingold force-directed placement
fn spring<R: Rng + ?Sized>(view: &GraphView, iterations: usize, rng: &mut R) -> Vec<(f64, f64)> {
    let n = view.len();
    if n <= 1 {
        return vec![(0.0, 0.0); n];
    }

    let mut adjacency: Matrix = linalg::zeros(n);
    for edge in &view.edges {
        let w = edge.weight.filter(|w| *w > 0.0).unwrap_or(1.0);
        adjacency[edge.source][edge.target] += w;
        if edge.source != edge.target {
            adjacency[edge.target][edge.source] += w;
        }
    }

    let mut pos = random(n, rng);
    let k = (1.0 / n as f64).sqrt();
    let mut t = 0.1;
    let dt = t / (iterations as f64 + 1.0);

    for _ in 0..iterations {
        let mut displacement = vec![(0.0, 0.0); n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let dx = pos[i].0 - pos[j].0;
                let dy = pos[i].1 - pos[j].1;
                let distance = (dx * dx + dy * dy).sqrt().max(0.01);
                let force = k * k / (distance * distance) - adjacency[i][j] * distance / k;
                displacement[i].0 += dx * force;
                displacement[i].1 += dy * force;
            }
        }
        for (p, (dx, dy)) in pos.iter_mut().zip(displacement) {
            let length = (dx * dx + dy * dy).sqrt().max(0.01);
            p.0 += dx * t / length;
            p.1 += dy * t / length;
        }
        t -= dt;
    }

    rescale_positions(&mut pos);
    pos
}

/// Positions from the 2nd and 3rd smallest eigenvectors of the graph Laplacian
fn spectral(view: &GraphView) -> Vec<(f64, f64)> {
    let n = view.len();
    match n {
        0 => return Vec::new(),
        1 => return vec![(0.0, 0.0)],
        2 => return vec![(-1.0, -1.0), (1.0, 1.0)],
        _ => {}
    }

    let mut laplacian = linalg::zeros(n);
    for edge in &view.edges {
        if edge.source == edge.target {
            continue;
        }
        laplacian[edge.source][edge.target] -= 1.0;
        laplacian[edge.target][edge.source] -= 1.0;
        laplacian[edge.source][edge.source] += 1.0;
        laplacian[edge.target][edge.target] += 1.0;
    }

    let (_, vectors) = linalg::symmetric_eigen(&laplacian);
    let mut points: Vec<(f64, f64)> = (0..n).map(|i| (vectors[1][i], vectors[2][i])).collect();
    rescale_positions(&mut points);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use crate::common::node::GraphOrigin;
    use crate::graph::model::GraphType;
    use crate::graph::store::GraphStore;

    fn path_view(n: u64) -> GraphView {
        let mut store = GraphStore::new(GraphType::Undirected, GraphOrigin::Generated);
        for i in 1..n {
            store.add_edge(NodeId::Index(i - 1), NodeId::Index(i), None);
        }
        store.view()
    }

    fn in_unit_box(positions: &[(NodeId, Position)]) -> bool {
        positions.iter().all(|(_, p)| p.x.abs() <= 1.0 + 1e-9 && p.y.abs() <= 1.0 + 1e-9)
    }

    #[test]
    fn test_unknown_name_is_spectral() {
        assert_eq!(LayoutAlgorithm::from_name("kamada_kawai"), LayoutAlgorithm::Spectral);
        assert_eq!(LayoutAlgorithm::from_name("Spring"), LayoutAlgorithm::Spring);
    }

    #[test]
    fn test_every_layout_places_every_node() {
        let view = path_view(6);
        let config = EngineConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        for algorithm in [
            LayoutAlgorithm::Circular,
            LayoutAlgorithm::Random,
            LayoutAlgorithm::Spring,
            LayoutAlgorithm::Shell,
            LayoutAlgorithm::Spectral,
        ] {
            let positions = compute_layout(&view, algorithm, &config, &mut rng);
            assert_eq!(positions.len(), 6);
            assert!(positions.iter().all(|(_, p)| p.x.is_finite() && p.y.is_finite()));
            if algorithm != LayoutAlgorithm::Random {
                assert!(in_unit_box(&positions), "{:?} escaped the unit box", algorithm);
            }
        }
    }

    #[test]
    fn test_dense_layouts_fall_back_to_circular_on_large_graphs() {
        let view = path_view(8);
        let config = EngineConfig { max_all_pairs_nodes: 4, ..EngineConfig::default() };
        let mut rng = StdRng::seed_from_u64(3);
        let expected = compute_layout(&view, LayoutAlgorithm::Circular, &config, &mut rng);
        for algorithm in [LayoutAlgorithm::Spring, LayoutAlgorithm::Spectral] {
            assert_eq!(compute_layout(&view, algorithm, &config, &mut rng), expected);
        }
    }

    #[test]
    fn test_spectral_orders_path() {
        // The Fiedler vector of a path is monotone along the path
        let view = path_view(5);
        let points = spectral(&view);
        let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        let increasing = xs.windows(2).all(|w| w[0] < w[1]);
        let decreasing = xs.windows(2).all(|w| w[0] > w[1]);
        assert!(increasing || decreasing);
    }
}
