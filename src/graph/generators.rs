// Generative graph models

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use crate::common::config::EngineConfig;
use crate::common::error::{GraphLabError, Result};
use crate::common::node::{GraphOrigin, NodeId};
use super::model::{GraphType, GrowthState};
use super::store::GraphStore;

/// Supported generative models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphModel {
    /// Erdős–Rényi G(n, p)
    Erdos,
    /// Binomial G(n, p); same distribution as Erdős–Rényi
    Binomial,
    /// Watts–Strogatz small world, always undirected
    WattsStrogatz,
    /// Random d-regular, always undirected
    Regular,
    /// Uniform G(n, m)
    Random,
    /// Complete seed graph for preferential attachment growth
    Barabasi,
}

impl GraphModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphModel::Erdos => "erdos",
            GraphModel::Binomial => "binomial",
            GraphModel::WattsStrogatz => "watts_strogatz",
            GraphModel::Regular => "regular",
            GraphModel::Random => "random",
            GraphModel::Barabasi => "barabasi",
        }
    }

    /// Whether the model honours a requested graph type
    pub fn supports_direction(&self) -> bool {
        !matches!(self, GraphModel::WattsStrogatz | GraphModel::Regular)
    }
}

impl FromStr for GraphModel {
    type Err = GraphLabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "erdos" => Ok(GraphModel::Erdos),
            "binomial" => Ok(GraphModel::Binomial),
            "watts_strogatz" => Ok(GraphModel::WattsStrogatz),
            "regular" => Ok(GraphModel::Regular),
            "random" => Ok(GraphModel::Random),
            "barabasi" => Ok(GraphModel::Barabasi),
            other => Err(GraphLabError::unsupported_model(other)),
        }
    }
}

impl fmt::Display for GraphModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    pub model: GraphModel,
    pub nodes: usize,
    pub graph_type: GraphType,
    /// Edge probability (Erdős–Rényi, binomial) or rewiring probability (Watts–Strogatz)
    pub probability: Option<f64>,
    /// Edge count (G(n, m)) or ring neighbourhood size (Watts–Strogatz)
    pub edges: Option<usize>,
    /// Regular degree, or the attachment degree for preferential attachment growth
    pub degree: Option<usize>,
    /// Retry Watts–Strogatz until the result is connected
    pub connected: bool,
}

impl GeneratorParams {
    pub fn new(model: GraphModel, nodes: usize, graph_type: GraphType) -> Self {
        GeneratorParams {
            model,
            nodes,
            graph_type,
            probability: None,
            edges: None,
            degree: None,
            connected: false,
        }
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }

    pub fn with_edges(mut self, edges: usize) -> Self {
        self.edges = Some(edges);
        self
    }

    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = Some(degree);
        self
    }

    pub fn connected(mut self, connected: bool) -> Self {
        self.connected = connected;
        self
    }

    /// Build parameters from a string map with keys `model`, `nodes`,
    /// `graphtype`, `probability`, `edges`, `degree` and `isConnected`
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self> {
        let model: GraphModel = map.get("model")
            .ok_or_else(|| GraphLabError::bad_parameter("missing parameter 'model'"))?
            .parse()?;
        let nodes = parse_required::<usize>(map, "nodes")?;
        let graph_type = match map.get("graphtype") {
            Some(raw) => raw.parse()?,
            None => GraphType::Undirected,
        };

        Ok(GeneratorParams {
            model,
            nodes,
            graph_type,
            probability: parse_optional(map, "probability")?,
            edges: parse_optional(map, "edges")?,
            degree: parse_optional(map, "degree")?,
            connected: map.get("isConnected")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "yes" | "true" | "1"))
                .unwrap_or(false),
        })
    }

    fn require_probability(&self) -> Result<f64> {
        let p = self.probability
            .ok_or_else(|| GraphLabError::bad_parameter(format!("model {} needs 'probability'", self.model)))?;
        if !(0.0..=1.0).contains(&p) {
            return Err(GraphLabError::bad_parameter(format!("probability must lie in [0, 1], got {}", p)));
        }
        Ok(p)
    }

    fn require_edges(&self) -> Result<usize> {
        self.edges
            .ok_or_else(|| GraphLabError::bad_parameter(format!("model {} needs 'edges'", self.model)))
    }

    fn require_degree(&self) -> Result<usize> {
        self.degree
            .ok_or_else(|| GraphLabError::bad_parameter(format!("model {} needs 'degree'", self.model)))
    }
}

fn parse_required<T: FromStr>(map: &HashMap<String, String>, key: &str) -> Result<T> {
    parse_optional(map, key)?
        .ok_or_else(|| GraphLabError::bad_parameter(format!("missing parameter '{}'", key)))
}

fn parse_optional<T: FromStr>(map: &HashMap<String, String>, key: &str) -> Result<Option<T>> {
    match map.get(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>()
            .map(Some)
            .map_err(|_| GraphLabError::bad_parameter(format!("parameter '{}' has invalid value '{}'", key, raw))),
    }
}

/// Generate a graph from a model.
///
/// Node identifiers are the integers `0..nodes`.
pub fn generate<R: Rng + ?Sized>(params: &GeneratorParams, config: &EngineConfig, rng: &mut R) -> Result<GraphStore> {
    let n = params.nodes;
    let graph_type = if params.model.supports_direction() {
        params.graph_type
    } else {
        GraphType::Undirected
    };

    let store = match params.model {
        GraphModel::Erdos | GraphModel::Binomial => {
            gnp(n, params.require_probability()?, graph_type, rng)
        }
        GraphModel::WattsStrogatz => {
            let k = params.require_edges()?;
            let p = params.require_probability()?;
            if params.connected {
                connected_watts_strogatz(n, k, p, config.generator_retry_limit, rng)?
            } else {
                watts_strogatz(n, k, p, rng)?
            }
        }
        GraphModel::Regular => {
            random_regular(params.require_degree()?, n, config.generator_retry_limit, rng)?
        }
        GraphModel::Random => gnm(n, params.require_edges()?, graph_type, rng),
        GraphModel::Barabasi => {
            let degree = params.degree.unwrap_or(n);
            barabasi_seed(n, degree, graph_type)?
        }
    };

    tracing::info!(
        "Generated {} graph: {} nodes, {} edges",
        params.model, store.node_count(), store.edge_count()
    );
    Ok(store)
}

fn empty_graph(n: usize, graph_type: GraphType) -> GraphStore {
    let mut store = GraphStore::new(graph_type, GraphOrigin::Generated);
    for i in 0..n {
        store.add_node(NodeId::Index(i as u64));
    }
    store
}

fn complete_graph(n: usize, graph_type: GraphType) -> GraphStore {
    let mut store = empty_graph(n, graph_type);
    for u in 0..n {
        for v in 0..n {
            if u == v || (!graph_type.is_directed() && v < u) {
                continue;
            }
            store.add_edge(NodeId::Index(u as u64), NodeId::Index(v as u64), None);
        }
    }
    store
}

/// G(n, p): every admissible pair is joined independently with probability `p`
pub fn gnp<R: Rng + ?Sized>(n: usize, p: f64, graph_type: GraphType, rng: &mut R) -> GraphStore {
    if p >= 1.0 {
        return complete_graph(n, graph_type);
    }
    let mut store = empty_graph(n, graph_type);
    if p <= 0.0 {
        return store;
    }

    for u in 0..n {
        let start = if graph_type.is_directed() { 0 } else { u + 1 };
        for v in start..n {
            if u != v && rng.r#gen::<f64>() < p {
                store.add_edge(NodeId::Index(u as u64), NodeId::Index(v as u64), None);
            }
        }
    }
    store
}

/// G(n, m): `m` distinct edges drawn uniformly
pub fn gnm<R: Rng + ?Sized>(n: usize, m: usize, graph_type: GraphType, rng: &mut R) -> GraphStore {
    if n <= 1 {
        return empty_graph(n, graph_type);
    }
    let max_edges = if graph_type.is_directed() { n * (n - 1) } else { n * (n - 1) / 2 };
    if m >= max_edges {
        return complete_graph(n, graph_type);
    }

    let mut store = empty_graph(n, graph_type);
    while store.edge_count() < m {
        let u = rng.gen_range(0..n) as u64;
        let v = rng.gen_range(0..n) as u64;
        if u == v || store.has_edge(&NodeId::Index(u), &NodeId::Index(v)) {
            continue;
        }
        store.add_edge(NodeId::Index(u), NodeId::Index(v), None);
    }
    store
}

/// Watts–Strogatz: ring lattice of `k` nearest neighbours, each lattice edge
/// rewired with probability `p`
pub fn watts_strogatz<R: Rng + ?Sized>(n: usize, k: usize, p: f64, rng: &mut R) -> Result<GraphStore> {
    if k > n {
        return Err(GraphLabError::bad_parameter(format!("ring degree {} exceeds node count {}", k, n)));
    }
    if k == n {
        return Ok(complete_graph(n, GraphType::Undirected));
    }

    let id = |i: usize| NodeId::Index(i as u64);
    let mut store = empty_graph(n, GraphType::Undirected);
    for j in 1..=k / 2 {
        for u in 0..n {
            store.add_edge(id(u), id((u + j) % n), None);
        }
    }

    for j in 1..=k / 2 {
        for u in 0..n {
            let v = (u + j) % n;
            if rng.r#gen::<f64>() >= p || !store.has_edge(&id(u), &id(v)) {
                continue;
            }
            if store.degree(&id(u)).unwrap_or(0) >= n - 1 {
                continue;
            }
            let mut w = rng.gen_range(0..n);
            while w == u || store.has_edge(&id(u), &id(w)) {
                w = rng.gen_range(0..n);
            }
            store.remove_edge(&id(u), &id(v));
            store.add_edge(id(u), id(w), None);
        }
    }

    Ok(store)
}

/// Watts–Strogatz retried until the result is connected
pub fn connected_watts_strogatz<R: Rng + ?Sized>(
    n: usize,
    k: usize,
    p: f64,
    tries: usize,
    rng: &mut R,
) -> Result<GraphStore> {
    for attempt in 1..=tries {
        let store = watts_strogatz(n, k, p, rng)?;
        if is_connected_undirected(&store) {
            tracing::debug!("Connected Watts-Strogatz graph after {} attempts", attempt);
            return Ok(store);
        }
    }
    Err(GraphLabError::generation_failed(
        format!("no connected Watts-Strogatz graph after {} attempts", tries)
    ))
}

fn is_connected_undirected(store: &GraphStore) -> bool {
    let view = store.view();
    if view.is_empty() {
        return false;
    }
    let mut seen = vec![false; view.len()];
    let mut stack = vec![0];
    seen[0] = true;
    let mut count = 1;
    while let Some(u) = stack.pop() {
        for a in &view.out[u] {
            if !seen[a.to] {
                seen[a.to] = true;
                count += 1;
                stack.push(a.to);
            }
        }
    }
    count == view.len()
}

/// Random `d`-regular graph by repeated stub pairing
pub fn random_regular<R: Rng + ?Sized>(d: usize, n: usize, tries: usize, rng: &mut R) -> Result<GraphStore> {
    if (n * d) % 2 != 0 {
        return Err(GraphLabError::bad_parameter("n * d must be even"));
    }
    if d >= n {
        return Err(GraphLabError::bad_parameter(format!("degree {} must be smaller than node count {}", d, n)));
    }

    let mut store = empty_graph(n, GraphType::Undirected);
    if d == 0 {
        return Ok(store);
    }

    for attempt in 1..=tries {
        if let Some(edges) = try_pair_stubs(d, n, rng) {
            for (u, v) in edges {
                store.add_edge(NodeId::Index(u as u64), NodeId::Index(v as u64), None);
            }
            tracing::debug!("Random {}-regular graph after {} attempts", d, attempt);
            return Ok(store);
        }
    }

    Err(GraphLabError::generation_failed(
        format!("no {}-regular graph on {} nodes after {} attempts", d, n, tries)
    ))
}

fn try_pair_stubs<R: Rng + ?Sized>(d: usize, n: usize, rng: &mut R) -> Option<Vec<(usize, usize)>> {
    let mut edges: HashSet<(usize, usize)> = HashSet::new();
    let mut ordered: Vec<(usize, usize)> = Vec::new();
    let mut stubs: Vec<usize> = (0..d).flat_map(|_| 0..n).collect();

    while !stubs.is_empty() {
        let mut potential: BTreeMap<usize, usize> = BTreeMap::new();
        stubs.shuffle(rng);

        for pair in stubs.chunks_exact(2) {
            let (s1, s2) = (pair[0].min(pair[1]), pair[0].max(pair[1]));
            if s1 != s2 && edges.insert((s1, s2)) {
                ordered.push((s1, s2));
            } else {
                *potential.entry(s1).or_default() += 1;
                *potential.entry(s2).or_default() += 1;
            }
        }

        if !suitable(&edges, &potential) {
            return None;
        }

        stubs = potential.iter()
            .flat_map(|(&node, &count)| std::iter::repeat(node).take(count))
            .collect();
    }

    Some(ordered)
}

/// Whether the leftover stubs can still form at least one new edge
fn suitable(edges: &HashSet<(usize, usize)>, potential: &BTreeMap<usize, usize>) -> bool {
    if potential.is_empty() {
        return true;
    }
    for &s1 in potential.keys() {
        for &s2 in potential.keys() {
            if s1 == s2 {
                break;
            }
            let key = (s1.min(s2), s1.max(s2));
            if !edges.contains(&key) {
                return true;
            }
        }
    }
    false
}

/// Complete seed graph for preferential attachment; reciprocal arcs when directed
pub fn barabasi_seed(n: usize, initial_degree: usize, graph_type: GraphType) -> Result<GraphStore> {
    if n < 2 {
        return Err(GraphLabError::bad_parameter("preferential attachment needs at least 2 seed nodes"));
    }
    let reachable = if graph_type.is_directed() { 2 * n } else { n };
    if initial_degree == 0 || initial_degree > reachable {
        return Err(GraphLabError::bad_parameter(
            format!("attachment degree must lie in 1..={}, got {}", reachable, initial_degree)
        ));
    }

    let mut store = complete_graph(n, graph_type);
    store.set_growth_state(Some(GrowthState { initial_nodes: n, initial_degree }));
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_unknown_model() {
        let err = "smallworld".parse::<GraphModel>().unwrap_err();
        assert_eq!(err.error_code(), crate::common::error::ErrorCode::UnsupportedModel);
    }

    #[test]
    fn test_params_from_map() {
        let map: HashMap<String, String> = [
            ("model", "watts_strogatz"),
            ("nodes", "20"),
            ("edges", "4"),
            ("probability", "0.1"),
            ("isConnected", "Yes"),
        ].iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();

        let params = GeneratorParams::from_map(&map).unwrap();
        assert_eq!(params.model, GraphModel::WattsStrogatz);
        assert_eq!(params.nodes, 20);
        assert!(params.connected);

        let mut bad = map.clone();
        bad.insert("nodes".into(), "many".into());
        assert!(GeneratorParams::from_map(&bad).is_err());
    }

    #[test]
    fn test_gnp_extremes() {
        let full = gnp(5, 1.0, GraphType::Directed, &mut rng());
        assert_eq!(full.edge_count(), 20);
        let none = gnp(5, 0.0, GraphType::Undirected, &mut rng());
        assert_eq!(none.node_count(), 5);
        assert_eq!(none.edge_count(), 0);
    }

    #[test]
    fn test_gnm_edge_count() {
        let store = gnm(10, 12, GraphType::Undirected, &mut rng());
        assert_eq!(store.node_count(), 10);
        assert_eq!(store.edge_count(), 12);
        assert!(store.node_ids().iter().all(|n| !store.has_edge(n, n)));
    }

    #[test]
    fn test_watts_strogatz_keeps_edge_count() {
        let store = watts_strogatz(20, 4, 0.3, &mut rng()).unwrap();
        assert_eq!(store.edge_count(), 40);
        assert!(watts_strogatz(3, 4, 0.1, &mut rng()).is_err());

        let connected = connected_watts_strogatz(20, 4, 0.1, 100, &mut rng()).unwrap();
        assert!(is_connected_undirected(&connected));
    }

    #[test]
    fn test_random_regular_degrees() {
        let store = random_regular(3, 10, 100, &mut rng()).unwrap();
        assert_eq!(store.edge_count(), 15);
        for node in store.node_ids() {
            assert_eq!(store.degree(&node), Some(3));
        }
        assert!(random_regular(3, 5, 100, &mut rng()).is_err());
    }

    #[test]
    fn test_barabasi_seed() {
        let store = barabasi_seed(4, 4, GraphType::Directed).unwrap();
        assert_eq!(store.edge_count(), 12);
        assert_eq!(store.growth_state(), Some(GrowthState { initial_nodes: 4, initial_degree: 4 }));

        let undirected = barabasi_seed(4, 3, GraphType::Undirected).unwrap();
        assert_eq!(undirected.edge_count(), 6);
        assert!(barabasi_seed(1, 1, GraphType::Undirected).is_err());
    }

    #[test]
    fn test_generate_forces_undirected_models() {
        let params = GeneratorParams::new(GraphModel::Regular, 6, GraphType::Directed).with_degree(2);
        let store = generate(&params, &EngineConfig::default(), &mut rng()).unwrap();
        assert_eq!(store.graph_type(), GraphType::Undirected);
        assert_eq!(store.origin(), GraphOrigin::Generated);
    }
}
