// GraphStore - sole owner of topology and per-node/per-edge attributes

use std::collections::HashMap;
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use crate::common::error::{GraphLabError, Result};
use crate::common::node::{GraphOrigin, NodeId};
use super::model::{
    EdgeAttributes, EdgeEntry, EdgeRecord, GraphProperties, GraphType, GrowthState,
    NodeAttributes, NodeRecord, Position,
};

/// In-memory graph with typed attributes.
///
/// Undirected edges are stored once, in the orientation they were first added,
/// and looked up in either orientation.
#[derive(Debug, Clone)]
pub struct GraphStore {
    graph_type: GraphType,
    origin: GraphOrigin,
    graph: StableGraph<NodeRecord, EdgeRecord>,
    /// Node id -> petgraph index
    index: HashMap<NodeId, NodeIndex>,
    /// Insertion order of live nodes
    order: Vec<NodeIndex>,
    properties: Option<GraphProperties>,
    /// Clean flag for the whole metric set
    metrics_computed: bool,
    growth: Option<GrowthState>,
}

impl GraphStore {
    /// Create an empty graph
    pub fn new(graph_type: GraphType, origin: GraphOrigin) -> Self {
        GraphStore {
            graph_type,
            origin,
            graph: StableGraph::new(),
            index: HashMap::new(),
            order: Vec::new(),
            properties: None,
            metrics_computed: false,
            growth: None,
        }
    }

    pub fn graph_type(&self) -> GraphType {
        self.graph_type
    }

    pub fn is_directed(&self) -> bool {
        self.graph_type.is_directed()
    }

    pub fn origin(&self) -> GraphOrigin {
        self.origin
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Add a node if absent; returns whether it was created
    pub fn add_node(&mut self, id: NodeId) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }
        let idx = self.graph.add_node(NodeRecord::new(id.clone()));
        self.index.insert(id, idx);
        self.order.push(idx);
        self.invalidate();
        true
    }

    /// Add an edge, creating missing endpoints.
    ///
    /// Re-adding an existing edge overwrites its weight when one is given and
    /// keeps the old weight otherwise. Returns whether a new edge was created.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, weight: Option<f64>) -> bool {
        self.add_node(source.clone());
        self.add_node(target.clone());
        let a = self.index[&source];
        let b = self.index[&target];

        if let Some(edge) = self.find_edge_index(a, b) {
            if let (Some(w), Some(record)) = (weight, self.graph.edge_weight_mut(edge)) {
                record.weight = Some(w);
                self.invalidate();
            }
            return false;
        }

        self.graph.add_edge(a, b, EdgeRecord::new(weight));
        self.invalidate();
        true
    }

    /// Remove a node and every incident edge
    pub fn remove_node(&mut self, id: &NodeId) -> Result<()> {
        let idx = self.index.remove(id)
            .ok_or_else(|| GraphLabError::node_not_found(id))?;
        self.graph.remove_node(idx);
        self.order.retain(|&i| i != idx);
        self.invalidate();
        Ok(())
    }

    /// Remove a single edge; returns whether it existed
    pub fn remove_edge(&mut self, source: &NodeId, target: &NodeId) -> bool {
        let edge = match (self.index.get(source), self.index.get(target)) {
            (Some(&a), Some(&b)) => self.find_edge_index(a, b),
            _ => None,
        };
        match edge {
            Some(edge) => {
                self.graph.remove_edge(edge);
                self.invalidate();
                true
            }
            None => false,
        }
    }

    fn find_edge_index(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        if self.is_directed() {
            self.graph.find_edge(a, b)
        } else {
            self.graph.find_edge_undirected(a, b).map(|(edge, _)| edge)
        }
    }

    pub fn has_edge(&self, source: &NodeId, target: &NodeId) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&a), Some(&b)) => self.find_edge_index(a, b).is_some(),
            _ => false,
        }
    }

    /// Weight of an edge: `None` if the edge is missing, `Some(None)` if unweighted
    pub fn edge_weight(&self, source: &NodeId, target: &NodeId) -> Option<Option<f64>> {
        let a = *self.index.get(source)?;
        let b = *self.index.get(target)?;
        let edge = self.find_edge_index(a, b)?;
        self.graph.edge_weight(edge).map(|record| record.weight)
    }

    /// Number of incident edge endpoints; a self-loop counts twice
    pub fn degree(&self, id: &NodeId) -> Option<usize> {
        let idx = *self.index.get(id)?;
        let out = self.graph.neighbors_directed(idx, Direction::Outgoing).count();
        let inc = self.graph.neighbors_directed(idx, Direction::Incoming).count();
        Some(out + inc)
    }

    /// Node ids in insertion order
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.order.iter()
            .filter_map(|&idx| self.graph.node_weight(idx))
            .map(|record| record.id.clone())
            .collect()
    }

    /// Most recently inserted node
    pub fn last_node(&self) -> Option<NodeId> {
        self.order.last()
            .and_then(|&idx| self.graph.node_weight(idx))
            .map(|record| record.id.clone())
    }

    fn edge_records(&self) -> impl Iterator<Item = (&NodeId, &NodeId, &EdgeRecord)> + '_ {
        self.graph.edge_indices().filter_map(move |edge| {
            let (a, b) = self.graph.edge_endpoints(edge)?;
            let record = self.graph.edge_weight(edge)?;
            Some((&self.graph[a].id, &self.graph[b].id, record))
        })
    }

    /// Edge listing in storage order
    pub fn edges(&self) -> Vec<EdgeEntry> {
        self.edge_records()
            .map(|(source, target, record)| EdgeEntry {
                source: source.clone(),
                target: target.clone(),
                weight: record.weight,
                betweenness: record.attributes.betweenness,
            })
            .collect()
    }

    /// True iff at least one edge carries a weight
    pub fn is_weighted(&self) -> bool {
        self.edge_records().any(|(_, _, record)| record.weight.is_some())
    }

    pub fn has_negative_weights(&self) -> bool {
        self.edge_records().any(|(_, _, record)| record.weight.is_some_and(|w| w < 0.0))
    }

    pub fn node_attributes(&self, id: &NodeId) -> Option<&NodeAttributes> {
        self.index.get(id).and_then(|&idx| self.graph.node_weight(idx)).map(|r| &r.attributes)
    }

    pub fn edge_attributes(&self, source: &NodeId, target: &NodeId) -> Option<&EdgeAttributes> {
        let a = *self.index.get(source)?;
        let b = *self.index.get(target)?;
        let edge = self.find_edge_index(a, b)?;
        self.graph.edge_weight(edge).map(|record| &record.attributes)
    }

    /// Replace the attribute record of a node, keeping its layout position
    pub fn set_node_attributes(&mut self, id: &NodeId, mut attributes: NodeAttributes) -> Result<()> {
        let idx = *self.index.get(id).ok_or_else(|| GraphLabError::node_not_found(id))?;
        if let Some(record) = self.graph.node_weight_mut(idx) {
            if attributes.position.is_none() {
                attributes.position = record.attributes.position;
            }
            record.attributes = attributes;
        }
        Ok(())
    }

    pub fn set_edge_attributes(&mut self, source: &NodeId, target: &NodeId, attributes: EdgeAttributes) -> Result<()> {
        let edge = match (self.index.get(source), self.index.get(target)) {
            (Some(&a), Some(&b)) => self.find_edge_index(a, b),
            _ => None,
        }.ok_or_else(|| GraphLabError::bad_parameter(
            format!("edge {} -> {} not found in graph", source, target)
        ))?;
        if let Some(record) = self.graph.edge_weight_mut(edge) {
            record.attributes = attributes;
        }
        Ok(())
    }

    /// Store layout positions
    pub fn set_positions(&mut self, positions: Vec<(NodeId, Position)>) {
        for (id, position) in positions {
            if let Some(&idx) = self.index.get(&id) {
                if let Some(record) = self.graph.node_weight_mut(idx) {
                    record.attributes.position = Some(position);
                }
            }
        }
    }

    pub fn position(&self, id: &NodeId) -> Option<Position> {
        self.node_attributes(id).and_then(|attrs| attrs.position)
    }

    pub fn properties(&self) -> Option<&GraphProperties> {
        self.properties.as_ref()
    }

    pub fn set_properties(&mut self, properties: GraphProperties) {
        self.properties = Some(properties);
    }

    /// Whether the metric set is present and clean
    pub fn data_exists(&self) -> bool {
        self.metrics_computed
    }

    pub fn mark_metrics_computed(&mut self) {
        self.metrics_computed = true;
    }

    /// Mark derived data stale after a structural change
    pub fn invalidate(&mut self) {
        if self.metrics_computed {
            tracing::debug!("Invalidating computed metrics for {} nodes", self.graph.node_count());
            for &idx in &self.order {
                if let Some(record) = self.graph.node_weight_mut(idx) {
                    record.attributes.clear_metrics();
                }
            }
            let edges: Vec<EdgeIndex> = self.graph.edge_indices().collect();
            for edge in edges {
                if let Some(record) = self.graph.edge_weight_mut(edge) {
                    record.attributes = EdgeAttributes::default();
                }
            }
        }
        self.metrics_computed = false;
        self.properties = None;
    }

    pub fn growth_state(&self) -> Option<GrowthState> {
        self.growth
    }

    pub fn set_growth_state(&mut self, state: Option<GrowthState>) {
        self.growth = state;
    }

    pub fn is_growing(&self) -> bool {
        self.growth.is_some()
    }

    /// Coerce raw user input to a node id of this graph and check it exists
    pub fn resolve_node(&self, raw: &str) -> Result<NodeId> {
        let id = NodeId::parse_for(raw, self.origin)?;
        if !self.contains_node(&id) {
            return Err(GraphLabError::node_not_found(&id));
        }
        Ok(id)
    }

    /// Immutable dense snapshot for algorithms
    pub fn view(&self) -> GraphView {
        GraphView::from_parts(
            self.is_directed(),
            self.node_ids(),
            self.edge_records().map(|(s, t, record)| (s, t, record.weight)),
        )
    }
}

/// Adjacency entry in a [`GraphView`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjacent {
    pub to: usize,
    pub weight: Option<f64>,
    /// Position in [`GraphView::edges`]
    pub edge: usize,
}

impl Adjacent {
    pub fn cost(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }
}

/// Stored edge of a [`GraphView`] by dense index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewEdge {
    pub source: usize,
    pub target: usize,
    pub weight: Option<f64>,
}

impl ViewEdge {
    pub fn cost(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }
}

/// Read-only, index-based snapshot of a graph.
///
/// Nodes are numbered `0..len()` in insertion order. For undirected graphs
/// `out` and `inc` both hold every neighbour.
#[derive(Debug, Clone)]
pub struct GraphView {
    pub directed: bool,
    pub ids: Vec<NodeId>,
    index_of: HashMap<NodeId, usize>,
    pub out: Vec<Vec<Adjacent>>,
    pub inc: Vec<Vec<Adjacent>>,
    pub edges: Vec<ViewEdge>,
}

impl GraphView {
    /// Build a view from node ids and edges given by id; unknown endpoints are skipped
    pub fn from_parts<'a, I>(directed: bool, ids: Vec<NodeId>, edges: I) -> Self
    where
        I: IntoIterator<Item = (&'a NodeId, &'a NodeId, Option<f64>)>,
    {
        let index_of: HashMap<NodeId, usize> = ids.iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let indexed = edges.into_iter()
            .filter_map(|(s, t, w)| Some(ViewEdge {
                source: *index_of.get(s)?,
                target: *index_of.get(t)?,
                weight: w,
            }))
            .collect();

        Self::from_indexed(directed, ids, index_of, indexed)
    }

    fn from_indexed(directed: bool, ids: Vec<NodeId>, index_of: HashMap<NodeId, usize>, edges: Vec<ViewEdge>) -> Self {
        let n = ids.len();
        let mut out = vec![Vec::new(); n];
        let mut inc = vec![Vec::new(); n];

        for (i, edge) in edges.iter().enumerate() {
            let forward = Adjacent { to: edge.target, weight: edge.weight, edge: i };
            let backward = Adjacent { to: edge.source, weight: edge.weight, edge: i };
            if directed {
                out[edge.source].push(forward);
                inc[edge.target].push(backward);
            } else {
                out[edge.source].push(forward);
                if edge.source != edge.target {
                    out[edge.target].push(backward);
                }
            }
        }
        if !directed {
            inc = out.clone();
        }

        GraphView { directed, ids, index_of, out, inc, edges }
    }

    /// Same nodes, keeping only the edges accepted by `keep`
    pub fn filter_edges<F>(&self, mut keep: F) -> GraphView
    where
        F: FnMut(usize, &ViewEdge) -> bool,
    {
        let edges = self.edges.iter()
            .enumerate()
            .filter(|(i, e)| keep(*i, e))
            .map(|(_, e)| *e)
            .collect();
        Self::from_indexed(self.directed, self.ids.clone(), self.index_of.clone(), edges)
    }

    /// Undirected projection; for reciprocal arcs the first stored one wins
    pub fn undirected(&self) -> GraphView {
        if !self.directed {
            return self.clone();
        }
        let mut seen = std::collections::HashSet::new();
        let edges = self.edges.iter()
            .filter(|e| seen.insert((e.source.min(e.target), e.source.max(e.target))))
            .copied()
            .collect();
        Self::from_indexed(false, self.ids.clone(), self.index_of.clone(), edges)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index_of.get(id).copied()
    }

    pub fn id(&self, idx: usize) -> &NodeId {
        &self.ids[idx]
    }

    pub fn is_weighted(&self) -> bool {
        self.edges.iter().any(|e| e.weight.is_some())
    }

    pub fn has_negative_weights(&self) -> bool {
        self.edges.iter().any(|e| e.weight.is_some_and(|w| w < 0.0))
    }

    /// Every arc relaxable from a node, with undirected edges in both orientations
    pub fn arcs(&self) -> impl Iterator<Item = (usize, &Adjacent)> + '_ {
        self.out.iter()
            .enumerate()
            .flat_map(|(u, adj)| adj.iter().map(move |a| (u, a)))
    }

    /// Distinct neighbours of `u` in either direction, excluding `u`
    pub fn neighbors_any(&self, u: usize) -> Vec<usize> {
        let mut seen = vec![false; self.len()];
        let mut result = Vec::new();
        for a in self.out[u].iter().chain(self.inc[u].iter()) {
            if a.to != u && !seen[a.to] {
                seen[a.to] = true;
                result.push(a.to);
            }
        }
        result
    }

    /// Number of incident edge endpoints, self-loops counted twice
    pub fn degree(&self, u: usize) -> usize {
        if self.directed {
            self.out[u].len() + self.inc[u].len()
        } else {
            self.out[u].len() + self.out[u].iter().filter(|a| a.to == u).count()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::label(s)
    }

    #[test]
    fn test_add_edge_is_idempotent() {
        let mut store = GraphStore::new(GraphType::Undirected, GraphOrigin::Uploaded);
        assert!(store.add_edge(id("a"), id("b"), None));
        assert!(!store.add_edge(id("b"), id("a"), None));
        assert_eq!(store.edge_count(), 1);
        assert!(!store.is_weighted());

        // Overwrite with a weight, then re-add unweighted keeps it
        store.add_edge(id("a"), id("b"), Some(2.5));
        store.add_edge(id("a"), id("b"), None);
        assert_eq!(store.edge_weight(&id("b"), &id("a")), Some(Some(2.5)));
        assert!(store.is_weighted());
    }

    #[test]
    fn test_directed_edges_are_ordered() {
        let mut store = GraphStore::new(GraphType::Directed, GraphOrigin::Uploaded);
        store.add_edge(id("a"), id("b"), Some(-1.0));
        assert!(store.has_edge(&id("a"), &id("b")));
        assert!(!store.has_edge(&id("b"), &id("a")));
        assert!(store.has_negative_weights());
    }

    #[test]
    fn test_remove_node_drops_incident_edges() {
        let mut store = GraphStore::new(GraphType::Undirected, GraphOrigin::Generated);
        store.add_edge(NodeId::Index(0), NodeId::Index(1), None);
        store.add_edge(NodeId::Index(1), NodeId::Index(2), None);
        store.remove_node(&NodeId::Index(1)).unwrap();

        assert_eq!(store.node_ids(), vec![NodeId::Index(0), NodeId::Index(2)]);
        assert_eq!(store.edge_count(), 0);
        assert!(store.remove_node(&NodeId::Index(1)).is_err());
    }

    #[test]
    fn test_invalidate_clears_metrics() {
        let mut store = GraphStore::new(GraphType::Undirected, GraphOrigin::Uploaded);
        store.add_edge(id("a"), id("b"), None);
        let mut attrs = NodeAttributes::default();
        attrs.closeness = Some(1.0);
        store.set_node_attributes(&id("a"), attrs).unwrap();
        store.mark_metrics_computed();
        assert!(store.data_exists());

        store.add_edge(id("b"), id("c"), None);
        assert!(!store.data_exists());
        assert_eq!(store.node_attributes(&id("a")).unwrap().closeness, None);
    }

    #[test]
    fn test_resolve_node_by_origin() {
        let mut store = GraphStore::new(GraphType::Undirected, GraphOrigin::Generated);
        store.add_node(NodeId::Index(3));
        assert_eq!(store.resolve_node("3").unwrap(), NodeId::Index(3));
        assert!(store.resolve_node("4").is_err());
        assert!(store.resolve_node("x").is_err());
    }

    #[test]
    fn test_view_adjacency() {
        let mut store = GraphStore::new(GraphType::Undirected, GraphOrigin::Uploaded);
        store.add_edge(id("a"), id("b"), Some(2.0));
        store.add_edge(id("b"), id("c"), None);
        let view = store.view();

        assert_eq!(view.len(), 3);
        let b = view.index_of(&id("b")).unwrap();
        assert_eq!(view.out[b].len(), 2);
        assert_eq!(view.degree(b), 2);
        assert!(view.is_weighted());

        let pruned = view.filter_edges(|_, e| e.weight.is_none());
        assert_eq!(pruned.edge_count(), 1);
    }

    #[test]
    fn test_directed_view_projection() {
        let mut store = GraphStore::new(GraphType::Directed, GraphOrigin::Uploaded);
        store.add_edge(id("a"), id("b"), None);
        store.add_edge(id("b"), id("a"), None);
        store.add_edge(id("b"), id("c"), None);
        let view = store.view();
        assert_eq!(view.edge_count(), 3);
        assert_eq!(view.undirected().edge_count(), 2);
        assert_eq!(view.neighbors_any(0), vec![1]);
    }
}
