// Node rankings and metric distributions for presentation layers

use serde::{Deserialize, Serialize};
use crate::common::error::{GraphLabError, Result};
use crate::common::node::NodeId;
use crate::common::utils::min_max;
use crate::graph::model::Metric;
use crate::graph::store::GraphStore;

/// Smallest rendered node size; every strictly larger value adds one step
pub const BASE_NODE_SIZE: u32 = 50;
pub const NODE_SIZE_STEP: u32 = 50;

/// Metric values in node insertion order, with their range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRanking {
    pub metric: Metric,
    pub nodes: Vec<NodeId>,
    pub values: Vec<f64>,
    pub min: f64,
    pub max: f64,
}

/// Nodes sorted ascending by value with their display sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeRanking {
    pub metric: Metric,
    pub nodes: Vec<NodeId>,
    pub sizes: Vec<u32>,
}

/// A size ranking plus a colour metric listed in the size ranking's node order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridRanking {
    pub size: SizeRanking,
    pub color_metric: Metric,
    pub colors: Vec<Option<f64>>,
}

/// Histogram and frequency polygon of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub metric: Metric,
    pub class_width: f64,
    /// Half-open `[lo, hi)` classes
    pub classes: Vec<(f64, f64)>,
    pub bar_frequencies: Vec<usize>,
    /// Bar frequencies with a leading zero
    pub polygon_frequencies: Vec<usize>,
    /// Class midpoints, led by the midpoint of the empty class below the first
    pub central_values: Vec<f64>,
}

/// Nodes carrying `metric`, in insertion order
fn metric_values(store: &GraphStore, metric: Metric) -> Result<Vec<(NodeId, f64)>> {
    if !store.data_exists() {
        return Err(GraphLabError::metrics_not_computed());
    }
    let values: Vec<(NodeId, f64)> = store.node_ids()
        .into_iter()
        .filter_map(|id| {
            let value = store.node_attributes(&id)?.get(metric)?;
            Some((id, value))
        })
        .collect();
    if values.is_empty() {
        return Err(GraphLabError::empty_graph(format!("no node carries metric '{}'", metric)));
    }
    Ok(values)
}

pub fn color_ranking(store: &GraphStore, metric: Metric) -> Result<ColorRanking> {
    let values = metric_values(store, metric)?;
    let (min, max) = min_max(values.iter().map(|(_, v)| *v))
        .ok_or_else(|| GraphLabError::empty_graph(format!("metric '{}' has no finite values", metric)))?;
    let (nodes, values) = values.into_iter().unzip();
    Ok(ColorRanking { metric, nodes, values, min, max })
}

pub fn size_ranking(store: &GraphStore, metric: Metric) -> Result<SizeRanking> {
    let mut values = metric_values(store, metric)?;
    values.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut sizes = Vec::with_capacity(values.len());
    let mut size = BASE_NODE_SIZE;
    let mut previous: Option<f64> = None;
    for &(_, value) in &values {
        if previous.is_some_and(|p| value > p) {
            size += NODE_SIZE_STEP;
        }
        sizes.push(size);
        previous = Some(value);
    }

    Ok(SizeRanking {
        metric,
        nodes: values.into_iter().map(|(id, _)| id).collect(),
        sizes,
    })
}

pub fn hybrid_ranking(store: &GraphStore, size_metric: Metric, color_metric: Metric) -> Result<HybridRanking> {
    let size = size_ranking(store, size_metric)?;
    let colors = size.nodes.iter()
        .map(|id| store.node_attributes(id).and_then(|attrs| attrs.get(color_metric)))
        .collect();
    Ok(HybridRanking { size, color_metric, colors })
}

/// Histogram over `ceil(1 + 3.3·log10 n) + 1` classes of equal width.
///
/// One extra class past the maximum holds the top value, since classes are
/// half-open. When every value is equal the width is zero and all values are
/// counted in the first class.
pub fn distribution(store: &GraphStore, metric: Metric) -> Result<Distribution> {
    let values: Vec<f64> = metric_values(store, metric)?.into_iter().map(|(_, v)| v).collect();
    let (min, max) = min_max(values.iter().copied())
        .ok_or_else(|| GraphLabError::empty_graph(format!("metric '{}' has no finite values", metric)))?;

    let class_count = (1.0 + 3.3 * (values.len() as f64).log10()).ceil() as usize + 1;
    let class_width = (max - min) / class_count as f64;

    let classes: Vec<(f64, f64)> = (0..=class_count)
        .map(|i| (min + i as f64 * class_width, min + (i + 1) as f64 * class_width))
        .collect();

    let bar_frequencies: Vec<usize> = if class_width > 0.0 {
        classes.iter()
            .map(|&(lo, hi)| values.iter().filter(|&&v| lo <= v && v < hi).count())
            .collect()
    } else {
        let mut counts = vec![0; classes.len()];
        counts[0] = values.len();
        counts
    };

    let mut polygon_frequencies = Vec::with_capacity(bar_frequencies.len() + 1);
    polygon_frequencies.push(0);
    polygon_frequencies.extend(&bar_frequencies);

    let mut central_values = Vec::with_capacity(classes.len() + 1);
    central_values.push(min - class_width / 2.0);
    central_values.extend(classes.iter().map(|&(lo, hi)| (lo + hi) / 2.0));

    tracing::debug!("Distribution of {}: {} classes of width {}", metric, classes.len(), class_width);
    Ok(Distribution {
        metric,
        class_width,
        classes,
        bar_frequencies,
        polygon_frequencies,
        central_values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metrics::MetricsEngine;
    use crate::common::config::EngineConfig;
    use crate::common::error::ErrorCode;
    use crate::graph::import_export::build_from_edge_list;
    use crate::graph::model::GraphType;

    fn star() -> GraphStore {
        let config = EngineConfig::default();
        let mut store = build_from_edge_list("hub a\nhub b\nhub c\nc d\n", GraphType::Undirected).unwrap();
        MetricsEngine::new(&config).ensure_metrics(&mut store).unwrap();
        store
    }

    fn ids(nodes: &[NodeId]) -> Vec<String> {
        nodes.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_size_ranking_steps() {
        let store = star();
        let ranking = size_ranking(&store, Metric::Degree).unwrap();
        // degrees: hub 3, a 1, b 1, c 2, d 1
        assert_eq!(ids(&ranking.nodes), vec!["a", "b", "d", "c", "hub"]);
        assert_eq!(ranking.sizes, vec![50, 50, 50, 100, 150]);
    }

    #[test]
    fn test_color_and_hybrid_ranking() {
        let store = star();
        let colors = color_ranking(&store, Metric::Degree).unwrap();
        assert_eq!(ids(&colors.nodes), vec!["hub", "a", "b", "c", "d"]);
        assert!((colors.max - 0.75).abs() < 1e-12);
        assert!((colors.min - 0.25).abs() < 1e-12);

        let hybrid = hybrid_ranking(&store, Metric::Degree, Metric::Closeness).unwrap();
        assert_eq!(hybrid.colors.len(), 5);
        let hub_closeness = store.node_attributes(&NodeId::label("hub")).unwrap().closeness;
        assert_eq!(hybrid.colors[4], hub_closeness);
    }

    #[test]
    fn test_distribution_counts_every_value() {
        let store = star();
        let dist = distribution(&store, Metric::Degree).unwrap();
        // n = 5: ceil(1 + 3.3 * log10 5) + 1 = 5 classes, plus the top class
        assert_eq!(dist.classes.len(), 6);
        assert_eq!(dist.bar_frequencies.iter().sum::<usize>(), 5);
        assert_eq!(dist.polygon_frequencies[0], 0);
        assert_eq!(dist.polygon_frequencies.len(), dist.central_values.len());
        assert!((dist.class_width - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_distribution_of_constant_metric() {
        let config = EngineConfig::default();
        let mut store = build_from_edge_list("a b\nb c\nc a\n", GraphType::Undirected).unwrap();
        MetricsEngine::new(&config).ensure_metrics(&mut store).unwrap();
        let dist = distribution(&store, Metric::Clustering).unwrap();
        assert_eq!(dist.class_width, 0.0);
        assert_eq!(dist.bar_frequencies[0], 3);
    }

    #[test]
    fn test_rankings_need_metrics() {
        let store = build_from_edge_list("a b\n", GraphType::Undirected).unwrap();
        assert_eq!(size_ranking(&store, Metric::Degree).unwrap_err().error_code(), ErrorCode::MetricsNotComputed);

        let metric_free = star();
        let err = color_ranking(&metric_free, Metric::PageRank).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::EmptyGraph);
    }
}
