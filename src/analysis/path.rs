// PathFinder - shortest, strongest and critical paths between two nodes

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use crate::common::config::EngineConfig;
use crate::common::error::{GraphLabError, Result};
use crate::common::node::NodeId;
use crate::graph::store::{Adjacent, GraphStore, GraphView};
use super::properties;

/// Path problem to solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathType {
    Shortest,
    Strongest,
    Critical,
}

impl PathType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathType::Shortest => "shortest",
            PathType::Strongest => "strongest",
            PathType::Critical => "critical",
        }
    }
}

impl FromStr for PathType {
    type Err = GraphLabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shortest" => Ok(PathType::Shortest),
            "strongest" => Ok(PathType::Strongest),
            "critical" => Ok(PathType::Critical),
            other => Err(GraphLabError::bad_parameter(format!("unknown path type '{}'", other))),
        }
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether edge weights are honoured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightMode {
    Weighted,
    Unweighted,
}

impl FromStr for WeightMode {
    type Err = GraphLabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weighted" => Ok(WeightMode::Weighted),
            "unweighted" => Ok(WeightMode::Unweighted),
            other => Err(GraphLabError::bad_parameter(format!("unknown weight mode '{}'", other))),
        }
    }
}

/// A single path query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRequest {
    pub source: NodeId,
    pub target: NodeId,
    pub path_type: PathType,
    pub weight_mode: WeightMode,
}

impl PathRequest {
    pub fn new(source: NodeId, target: NodeId, path_type: PathType, weight_mode: WeightMode) -> Self {
        PathRequest { source, target, path_type, weight_mode }
    }
}

/// Path query answer. Several sequences are reported when optima tie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    pub source: NodeId,
    pub target: NodeId,
    pub path_type: PathType,
    pub weight_mode: WeightMode,
    pub sequences: Vec<Vec<NodeId>>,
    /// Total cost (shortest), bottleneck weight (strongest) or accumulated weight (critical)
    pub length: f64,
}

impl PathResult {
    /// Consecutive node pairs of every sequence, without repeats
    pub fn path_edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for sequence in &self.sequences {
            for pair in sequence.windows(2) {
                let edge = (pair[0].clone(), pair[1].clone());
                if seen.insert(edge.clone()) {
                    edges.push(edge);
                }
            }
        }
        edges
    }

    /// Nodes that appear in no reported sequence
    pub fn nodes_not_in_paths(&self, store: &GraphStore) -> Vec<NodeId> {
        let on_path: HashSet<&NodeId> = self.sequences.iter().flatten().collect();
        store.node_ids().into_iter().filter(|n| !on_path.contains(n)).collect()
    }

    /// Graph edges that no reported sequence traverses
    pub fn edges_not_in_paths(&self, store: &GraphStore) -> Vec<(NodeId, NodeId)> {
        let mut on_path: HashSet<(NodeId, NodeId)> = self.path_edges().into_iter().collect();
        if !store.is_directed() {
            let reversed: Vec<_> = on_path.iter().map(|(a, b)| (b.clone(), a.clone())).collect();
            on_path.extend(reversed);
        }
        store.edges()
            .into_iter()
            .map(|e| (e.source, e.target))
            .filter(|e| !on_path.contains(e))
            .collect()
    }
}

/// Outcome of a path query. Absence of a path is ordinary data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathOutcome {
    Found(PathResult),
    NoPath,
    /// The graph holds a negative cycle; shortest distances are undefined
    NegativeCycle,
}

impl PathOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, PathOutcome::Found(_))
    }

    pub fn path(&self) -> Option<&PathResult> {
        match self {
            PathOutcome::Found(result) => Some(result),
            _ => None,
        }
    }

    /// Convert the negative-cycle signal into an error
    pub fn into_result(self) -> Result<Option<PathResult>> {
        match self {
            PathOutcome::Found(result) => Ok(Some(result)),
            PathOutcome::NoPath => Ok(None),
            PathOutcome::NegativeCycle => Err(GraphLabError::negative_cycle()),
        }
    }
}

/// Single-source shortest path DAG with path counts, as used by Brandes
#[derive(Debug, Clone)]
pub(crate) struct ShortestPathTree {
    /// `f64::INFINITY` when unreachable
    pub dist: Vec<f64>,
    /// Number of shortest paths from the source
    pub sigma: Vec<f64>,
    /// Predecessor node and edge index on some shortest path
    pub preds: Vec<Vec<(usize, usize)>>,
    /// Nodes in non-decreasing distance order
    pub order: Vec<usize>,
}

impl ShortestPathTree {
    fn new(n: usize, source: usize) -> Self {
        let mut tree = ShortestPathTree {
            dist: vec![f64::INFINITY; n],
            sigma: vec![0.0; n],
            preds: vec![Vec::new(); n],
            order: Vec::with_capacity(n),
        };
        tree.dist[source] = 0.0;
        tree.sigma[source] = 1.0;
        tree
    }
}

/// Hop-count shortest paths over the given adjacency
pub(crate) fn bfs_tree(adj: &[Vec<Adjacent>], source: usize) -> ShortestPathTree {
    let mut tree = ShortestPathTree::new(adj.len(), source);
    let mut queue = VecDeque::new();
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        tree.order.push(v);
        let next = tree.dist[v] + 1.0;
        for a in &adj[v] {
            let w = a.to;
            if tree.dist[w].is_infinite() {
                tree.dist[w] = next;
                queue.push_back(w);
            }
            if tree.dist[w] == next {
                tree.sigma[w] += tree.sigma[v];
                tree.preds[w].push((v, a.edge));
            }
        }
    }

    tree
}

/// Weighted shortest paths; requires non-negative costs
pub(crate) fn dijkstra_tree(adj: &[Vec<Adjacent>], source: usize) -> ShortestPathTree {
    let n = adj.len();
    let mut tree = ShortestPathTree::new(n, source);
    let mut settled = vec![false; n];
    let mut heap = BinaryHeap::new();
    let mut counter = 0usize;
    heap.push(Reverse((OrderedFloat(0.0), counter, source)));

    while let Some(Reverse((OrderedFloat(d), _, v))) = heap.pop() {
        if settled[v] || d > tree.dist[v] {
            continue;
        }
        settled[v] = true;
        tree.order.push(v);

        for a in &adj[v] {
            let w = a.to;
            if w == v {
                continue;
            }
            let candidate = d + a.cost();
            if !settled[w] && candidate < tree.dist[w] {
                tree.dist[w] = candidate;
                tree.sigma[w] = tree.sigma[v];
                tree.preds[w] = vec![(v, a.edge)];
                counter += 1;
                heap.push(Reverse((OrderedFloat(candidate), counter, w)));
            } else if candidate == tree.dist[w] {
                // Zero-cost arcs can tie with a node that is already settled
                tree.sigma[w] += tree.sigma[v];
                tree.preds[w].push((v, a.edge));
            }
        }
    }

    tree
}

/// Walk a predecessor map from `target` back to `source`.
///
/// Returns `None` when the chain dead-ends or loops before reaching `source`.
pub fn build_sequence(pred: &[Option<usize>], source: usize, target: usize) -> Option<Vec<usize>> {
    let mut visited = vec![false; pred.len()];
    let mut sequence = vec![target];
    let mut current = target;
    visited[target] = true;

    while current != source {
        let previous = pred[current]?;
        if visited[previous] {
            return None;
        }
        visited[previous] = true;
        sequence.push(previous);
        current = previous;
    }

    sequence.reverse();
    Some(sequence)
}

/// All simple source-to-target paths through a predecessor graph, at most `cap` of them
fn enumerate_paths(preds: &[Vec<(usize, usize)>], source: usize, target: usize, cap: usize) -> Vec<Vec<usize>> {
    let mut paths = Vec::new();
    let mut stack = vec![vec![target]];

    while let Some(partial) = stack.pop() {
        let Some(&last) = partial.last() else { continue };
        if last == source {
            let mut path = partial;
            path.reverse();
            paths.push(path);
            if paths.len() >= cap {
                tracing::warn!("Shortest path enumeration capped at {} paths", cap);
                break;
            }
            continue;
        }
        for &(previous, _) in preds[last].iter().rev() {
            if partial.contains(&previous) {
                continue;
            }
            let mut next = partial.clone();
            next.push(previous);
            stack.push(next);
        }
    }

    paths
}

/// Path finder over a graph snapshot
pub struct PathFinder<'a> {
    config: &'a EngineConfig,
}

impl<'a> PathFinder<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        PathFinder { config }
    }

    /// Answer a path query.
    ///
    /// Errors are reserved for bad input (unknown node, strongest path on an
    /// unweighted graph) and size guards; unreachable targets and negative
    /// cycles come back as [`PathOutcome`] values.
    pub fn find_path(&self, store: &GraphStore, request: &PathRequest) -> Result<PathOutcome> {
        for node in [&request.source, &request.target] {
            if !store.contains_node(node) {
                return Err(GraphLabError::node_not_found(node));
            }
        }

        if request.source == request.target {
            return Ok(PathOutcome::NoPath);
        }

        let view = store.view();
        let (Some(s), Some(t)) = (view.index_of(&request.source), view.index_of(&request.target)) else {
            return Err(GraphLabError::internal("path endpoints missing from graph snapshot"));
        };
        let weighted = request.weight_mode == WeightMode::Weighted && view.is_weighted();

        tracing::debug!(
            "Finding {} path {} -> {} (weighted: {})",
            request.path_type, request.source, request.target, weighted
        );

        let found = match request.path_type {
            PathType::Shortest => {
                let negative_cycle = match store.properties() {
                    Some(props) => props.negative_cycle,
                    None => properties::has_negative_cycle(&view),
                };
                if negative_cycle {
                    return Ok(PathOutcome::NegativeCycle);
                }
                if weighted && view.has_negative_weights() {
                    bellman_ford_path(&view, s, t)
                } else {
                    self.all_shortest_paths(&view, s, t, weighted)
                }
            }
            PathType::Strongest => {
                if !view.is_weighted() {
                    return Err(GraphLabError::bad_parameter("strongest path needs a weighted graph"));
                }
                if view.len() > self.config.max_all_pairs_nodes {
                    return Err(GraphLabError::graph_too_large(
                        "strongest path", view.len(), self.config.max_all_pairs_nodes
                    ));
                }
                strongest_path(&view, s, t)
            }
            PathType::Critical => critical_path(&view, s, t, weighted),
        };

        Ok(match found {
            Some((sequences, length)) => PathOutcome::Found(PathResult {
                source: request.source.clone(),
                target: request.target.clone(),
                path_type: request.path_type,
                weight_mode: request.weight_mode,
                sequences: sequences.into_iter()
                    .map(|seq| seq.into_iter().map(|i| view.id(i).clone()).collect())
                    .collect(),
                length,
            }),
            None => PathOutcome::NoPath,
        })
    }

    fn all_shortest_paths(&self, view: &GraphView, s: usize, t: usize, weighted: bool) -> Option<(Vec<Vec<usize>>, f64)> {
        let tree = if weighted { dijkstra_tree(&view.out, s) } else { bfs_tree(&view.out, s) };
        if tree.dist[t].is_infinite() {
            return None;
        }
        let paths = enumerate_paths(&tree.preds, s, t, self.config.max_enumerated_paths);
        Some((paths, tree.dist[t]))
    }
}

/// Single Bellman–Ford path; caller has ruled out negative cycles
fn bellman_ford_path(view: &GraphView, s: usize, t: usize) -> Option<(Vec<Vec<usize>>, f64)> {
    let n = view.len();
    let mut dist = vec![f64::INFINITY; n];
    let mut pred: Vec<Option<usize>> = vec![None; n];
    dist[s] = 0.0;

    for _ in 1..n.max(2) {
        let mut changed = false;
        for (u, a) in view.arcs() {
            if dist[u].is_finite() && dist[u] + a.cost() < dist[a.to] {
                dist[a.to] = dist[u] + a.cost();
                pred[a.to] = Some(u);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    pred[s] = None;

    if dist[t].is_infinite() {
        return None;
    }
    build_sequence(&pred, s, t).map(|seq| (vec![seq], dist[t]))
}

/// Max-min (bottleneck) all-pairs relaxation.
///
/// Missing edges start at negative infinity and the diagonal at zero. A
/// predecessor only changes on strict improvement, so with nodes visited in
/// insertion order the first improving intermediate wins.
fn strongest_path(view: &GraphView, s: usize, t: usize) -> Option<(Vec<Vec<usize>>, f64)> {
    let n = view.len();
    let mut strength = vec![vec![f64::NEG_INFINITY; n]; n];
    let mut pred: Vec<Vec<Option<usize>>> = vec![vec![None; n]; n];

    for (u, row) in strength.iter_mut().enumerate() {
        row[u] = 0.0;
    }
    for (u, a) in view.arcs() {
        if u != a.to {
            strength[u][a.to] = a.cost();
            pred[u][a.to] = Some(u);
        }
    }

    for k in 0..n {
        for i in 0..n {
            if i == k || strength[i][k] == f64::NEG_INFINITY {
                continue;
            }
            for j in 0..n {
                if j == i {
                    continue;
                }
                let candidate = strength[i][k].min(strength[k][j]);
                if candidate > strength[i][j] {
                    strength[i][j] = candidate;
                    pred[i][j] = pred[k][j];
                }
            }
        }
    }

    if strength[s][t] == f64::NEG_INFINITY {
        return None;
    }
    build_sequence(&pred[s], s, t).map(|seq| (vec![seq], strength[s][t]))
}

/// Whether `node` lies on the predecessor chain that starts at `from`
fn on_chain(pred: &[Option<(usize, f64)>], from: usize, node: usize) -> bool {
    let mut current = Some(from);
    for _ in 0..pred.len() {
        match current {
            Some(c) if c == node => return true,
            Some(c) => current = pred[c].map(|(p, _)| p),
            None => return false,
        }
    }
    true
}

/// Longest-path relaxation with |V| passes over every arc.
///
/// A relaxation u -> w is refused when w already precedes u, so every
/// predecessor chain stays a simple path back to the source. On cyclic input
/// the answer is best effort; the reported length is that of the returned
/// sequence.
fn critical_path(view: &GraphView, s: usize, t: usize, weighted: bool) -> Option<(Vec<Vec<usize>>, f64)> {
    let n = view.len();
    let mut best = vec![f64::NEG_INFINITY; n];
    let mut pred: Vec<Option<(usize, f64)>> = vec![None; n];
    best[s] = 0.0;

    for _ in 0..n {
        let mut changed = false;
        for (u, a) in view.arcs() {
            if best[u] == f64::NEG_INFINITY || a.to == s || a.to == u {
                continue;
            }
            let cost = if weighted { a.cost() } else { 1.0 };
            if best[u] + cost > best[a.to] && !on_chain(&pred, u, a.to) {
                best[a.to] = best[u] + cost;
                pred[a.to] = Some((u, cost));
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    if best[t] == f64::NEG_INFINITY {
        return None;
    }
    let nodes: Vec<Option<usize>> = pred.iter().map(|p| p.map(|(u, _)| u)).collect();
    let sequence = build_sequence(&nodes, s, t)?;
    let length: f64 = sequence.iter().skip(1).filter_map(|&v| pred[v].map(|(_, c)| c)).sum();
    Some((vec![sequence], length))
}
