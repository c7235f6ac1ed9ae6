// MetricsEngine - computes analytic attributes over a snapshot and hands
// them back for the store to apply

use serde::{Deserialize, Serialize};
use crate::common::config::EngineConfig;
use crate::common::error::{GraphLabError, Result};
use crate::common::node::NodeId;
use crate::common::utils::mean;
use crate::graph::model::{ComponentMode, EdgeAttributes, GraphProperties, Metric, NodeAttributes};
use crate::graph::store::{GraphStore, GraphView};
use super::{centrality, components, properties};

/// Computed attributes for every node and edge, plus structural properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub properties: GraphProperties,
    pub nodes: Vec<(NodeId, NodeAttributes)>,
    pub edges: Vec<(NodeId, NodeId, EdgeAttributes)>,
}

impl MetricsReport {
    /// Write the report into the store and mark the metric set clean
    pub fn apply(self, store: &mut GraphStore) -> Result<()> {
        for (id, attributes) in self.nodes {
            store.set_node_attributes(&id, attributes)?;
        }
        for (source, target, attributes) in self.edges {
            store.set_edge_attributes(&source, &target, attributes)?;
        }
        store.set_properties(self.properties);
        store.mark_metrics_computed();
        Ok(())
    }
}

/// Average node metrics for a directed graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectedAverages {
    pub in_degree: f64,
    pub out_degree: f64,
    pub betweenness: f64,
    pub closeness: f64,
    pub eigenvector: Option<f64>,
    pub pagerank: f64,
    pub weighted_in_degree: Option<f64>,
    pub weighted_out_degree: Option<f64>,
}

/// Average node metrics for an undirected graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndirectedAverages {
    pub degree: f64,
    pub betweenness: f64,
    pub closeness: f64,
    pub eigenvector: Option<f64>,
    pub clustering: f64,
    pub weighted_degree: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "graph_type")]
pub enum AverageMetrics {
    Directed(DirectedAverages),
    Undirected(UndirectedAverages),
}

/// Average edge weight (unit when absent) and edge betweenness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageEdgeMetrics {
    pub weight: f64,
    pub betweenness: f64,
}

/// Metric computation over graph snapshots
pub struct MetricsEngine<'a> {
    config: &'a EngineConfig,
}

impl<'a> MetricsEngine<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        MetricsEngine { config }
    }

    pub fn compute_basic_properties(&self, store: &GraphStore) -> GraphProperties {
        properties::compute_basic_properties(&store.view(), store.is_growing(), self.config)
    }

    /// Component label per node, in view order
    pub fn find_connected_components(&self, view: &GraphView, mode: ComponentMode) -> Vec<String> {
        components::component_labels(view, mode)
    }

    /// Compute the full metric set. Pure: the store is not touched.
    pub fn compute_metrics(&self, store: &GraphStore) -> MetricsReport {
        let view = store.view();
        let weighted = view.is_weighted();
        let n = view.len();

        tracing::info!("Computing metrics for {} nodes, {} edges", n, view.edge_count());

        let mut nodes: Vec<NodeAttributes> = vec![NodeAttributes::default(); n];
        let mut set = |metric: Metric, values: Vec<f64>| {
            for (attrs, value) in nodes.iter_mut().zip(values) {
                attrs.set(metric, Some(value));
            }
        };

        let between = centrality::betweenness(&view, weighted, true);
        set(Metric::Betweenness, between.nodes);
        set(Metric::Closeness, centrality::closeness_centrality(&view));

        if view.directed {
            set(Metric::PageRank, centrality::pagerank(&view, weighted, self.config));
            set(Metric::InDegree, centrality::in_degree_centrality(&view));
            set(Metric::OutDegree, centrality::out_degree_centrality(&view));
            if weighted {
                set(Metric::WeightedInDegree, centrality::weighted_in_degree(&view));
                set(Metric::WeightedOutDegree, centrality::weighted_out_degree(&view));
            }
        } else {
            set(Metric::Clustering, centrality::clustering(&view, weighted));
            set(Metric::Degree, centrality::degree_centrality(&view));
            if weighted {
                set(Metric::WeightedDegree, centrality::weighted_degree(&view));
            }
        }

        match centrality::eigenvector_centrality(&view, self.config) {
            Some(values) => set(Metric::Eigenvector, values),
            None => tracing::debug!("Eigenvector centrality left unset"),
        }

        let modes: &[ComponentMode] = if view.directed {
            &[ComponentMode::Weak, ComponentMode::Strong]
        } else {
            &[ComponentMode::Full]
        };
        for &mode in modes {
            let labels = self.find_connected_components(&view, mode);
            for (attrs, label) in nodes.iter_mut().zip(labels) {
                attrs.set_component(mode, Some(label));
            }
        }

        let edges = view.edges.iter()
            .zip(between.edges)
            .map(|(edge, value)| (
                view.id(edge.source).clone(),
                view.id(edge.target).clone(),
                EdgeAttributes { betweenness: Some(value) },
            ))
            .collect();

        MetricsReport {
            properties: properties::compute_basic_properties(&view, store.is_growing(), self.config),
            nodes: view.ids.iter().cloned().zip(nodes).collect(),
            edges,
        }
    }

    /// Compute and apply metrics unless the store already holds a clean set
    pub fn ensure_metrics(&self, store: &mut GraphStore) -> Result<()> {
        if store.data_exists() {
            return Ok(());
        }
        self.compute_metrics(store).apply(store)
    }
}

/// Mean of a node metric over the nodes that carry it
pub fn average_value(store: &GraphStore, metric: Metric) -> Result<f64> {
    if !store.data_exists() {
        return Err(GraphLabError::metrics_not_computed());
    }
    let values = store.node_ids()
        .iter()
        .filter_map(|id| store.node_attributes(id).and_then(|attrs| attrs.get(metric)))
        .collect::<Vec<_>>();
    if values.is_empty() {
        return Err(GraphLabError::empty_graph(format!("no node carries metric '{}'", metric)));
    }
    mean(values)
}

fn optional_average(store: &GraphStore, metric: Metric) -> Result<Option<f64>> {
    match average_value(store, metric) {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.error_code() == crate::common::error::ErrorCode::EmptyGraph => Ok(None),
        Err(err) => Err(err),
    }
}

/// Per-graph-type average metric summary
pub fn average_metrics(store: &GraphStore) -> Result<AverageMetrics> {
    if store.is_directed() {
        Ok(AverageMetrics::Directed(DirectedAverages {
            in_degree: average_value(store, Metric::InDegree)?,
            out_degree: average_value(store, Metric::OutDegree)?,
            betweenness: average_value(store, Metric::Betweenness)?,
            closeness: average_value(store, Metric::Closeness)?,
            eigenvector: optional_average(store, Metric::Eigenvector)?,
            pagerank: average_value(store, Metric::PageRank)?,
            weighted_in_degree: optional_average(store, Metric::WeightedInDegree)?,
            weighted_out_degree: optional_average(store, Metric::WeightedOutDegree)?,
        }))
    } else {
        Ok(AverageMetrics::Undirected(UndirectedAverages {
            degree: average_value(store, Metric::Degree)?,
            betweenness: average_value(store, Metric::Betweenness)?,
            closeness: average_value(store, Metric::Closeness)?,
            eigenvector: optional_average(store, Metric::Eigenvector)?,
            clustering: average_value(store, Metric::Clustering)?,
            weighted_degree: optional_average(store, Metric::WeightedDegree)?,
        }))
    }
}

pub fn average_edge_metrics(store: &GraphStore) -> Result<AverageEdgeMetrics> {
    if !store.data_exists() {
        return Err(GraphLabError::metrics_not_computed());
    }
    let edges = store.edges();
    if edges.is_empty() {
        return Err(GraphLabError::empty_graph("graph has no edges to average"));
    }
    Ok(AverageEdgeMetrics {
        weight: mean(edges.iter().map(|e| e.weight.unwrap_or(1.0)))?,
        betweenness: mean(edges.iter().filter_map(|e| e.betweenness))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorCode;
    use crate::common::node::GraphOrigin;
    use crate::graph::import_export::build_from_edge_list;
    use crate::graph::model::GraphType;

    #[test]
    fn test_compute_metrics_is_idempotent() {
        let config = EngineConfig::default();
        let engine = MetricsEngine::new(&config);
        let store = build_from_edge_list("a b 2\nb c\nc a 3\nc d\n", GraphType::Directed).unwrap();
        assert_eq!(engine.compute_metrics(&store), engine.compute_metrics(&store));
    }

    #[test]
    fn test_apply_sets_clean_flag_and_attributes() {
        let config = EngineConfig::default();
        let engine = MetricsEngine::new(&config);
        let mut store = build_from_edge_list("a b\nb c\nc a\nc d\n", GraphType::Undirected).unwrap();
        assert!(!store.data_exists());

        engine.ensure_metrics(&mut store).unwrap();
        assert!(store.data_exists());

        let c = store.node_attributes(&NodeId::label("c")).unwrap();
        assert!(c.closeness.is_some());
        assert_eq!(c.full.as_deref(), Some("A0"));
        assert!(c.pagerank.is_none());
        assert!((c.clustering.unwrap() - 1.0 / 3.0).abs() < 1e-9);
        assert!(store.edge_attributes(&NodeId::label("a"), &NodeId::label("b")).unwrap().betweenness.is_some());
        assert!(store.properties().is_some());
    }

    #[test]
    fn test_directed_metrics_and_averages() {
        let config = EngineConfig::default();
        let engine = MetricsEngine::new(&config);
        let mut store = build_from_edge_list("a b\nb a\nb c\n", GraphType::Directed).unwrap();
        engine.ensure_metrics(&mut store).unwrap();

        let a = store.node_attributes(&NodeId::label("a")).unwrap();
        assert_eq!(a.weak.as_deref(), Some("A0"));
        assert!(a.strong.is_some());
        assert!(a.pagerank.is_some());

        match average_metrics(&store).unwrap() {
            AverageMetrics::Directed(avg) => {
                assert!((avg.pagerank - 1.0 / 3.0).abs() < 1e-9);
                assert_eq!(avg.weighted_in_degree, None);
            }
            other => panic!("unexpected summary {:?}", other),
        }
        let edges = average_edge_metrics(&store).unwrap();
        assert_eq!(edges.weight, 1.0);
    }

    #[test]
    fn test_average_on_empty_graph() {
        let config = EngineConfig::default();
        let engine = MetricsEngine::new(&config);
        let mut store = GraphStore::new(GraphType::Undirected, GraphOrigin::Uploaded);
        engine.ensure_metrics(&mut store).unwrap();

        let err = average_value(&store, Metric::Closeness).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::EmptyGraph);
        assert_eq!(average_edge_metrics(&store).unwrap_err().error_code(), ErrorCode::EmptyGraph);
    }

    #[test]
    fn test_average_requires_metrics() {
        let store = build_from_edge_list("a b\n", GraphType::Undirected).unwrap();
        let err = average_value(&store, Metric::Degree).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::MetricsNotComputed);
    }
}
