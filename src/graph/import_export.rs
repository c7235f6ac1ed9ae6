use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::common::error::{GraphLabError, Result};
use crate::common::node::{GraphOrigin, NodeId};
use super::model::{ComponentMode, GraphType, Metric, NodeAttributes};
use super::store::GraphStore;

/// Parse whitespace-separated edge-list text.
///
/// Every non-blank row must hold 2 tokens (unweighted edge) or 3 tokens
/// (weighted edge). Any other row aborts the whole parse.
pub fn build_from_edge_list(text: &str, graph_type: GraphType) -> Result<GraphStore> {
    let mut store = GraphStore::new(graph_type, GraphOrigin::Uploaded);

    for (line_no, line) in text.lines().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let weight = match tokens.len() {
            0 => continue,
            2 => None,
            3 => Some(tokens[2].parse::<f64>()
                .ok()
                .filter(|w| w.is_finite())
                .ok_or_else(|| GraphLabError::malformed_input(
                    line_no + 1,
                    format!("weight '{}' is not a number", tokens[2])
                ))?),
            n => return Err(GraphLabError::malformed_input(
                line_no + 1,
                format!("expected 2 or 3 tokens, found {}", n)
            )),
        };

        store.add_edge(NodeId::label(tokens[0]), NodeId::label(tokens[1]), weight);
    }

    tracing::info!(
        "Built {} graph from edge list: {} nodes, {} edges",
        graph_type, store.node_count(), store.edge_count()
    );
    Ok(store)
}

/// Render the graph as edge-list text, one `source target [weight]` row per edge.
///
/// The weight column is written iff the graph is weighted; unweighted edges
/// of a weighted graph are written with unit weight.
pub fn to_text(store: &GraphStore) -> String {
    let weighted = store.is_weighted();
    let mut out = String::new();

    for edge in store.edges() {
        out.push_str(&edge.source.to_string());
        out.push(' ');
        out.push_str(&edge.target.to_string());
        if weighted {
            out.push(' ');
            out.push_str(&edge.weight.unwrap_or(1.0).to_string());
        }
        out.push('\n');
    }

    out
}

/// Column-ordered attribute rows for a tabular export collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl AttributeTable {
    fn new(columns: &[&str]) -> Self {
        AttributeTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Render as comma-separated text with a header row
    pub fn to_csv(&self) -> String {
        let mut out = self.columns.join(",");
        out.push('\n');
        for row in &self.rows {
            let cells: Vec<String> = row.iter()
                .map(|cell| match cell {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect();
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        out
    }
}

fn metric_cell(attrs: &NodeAttributes, metric: Metric) -> Value {
    attrs.get(metric).map(Value::from).unwrap_or(Value::Null)
}

fn component_cell(attrs: &NodeAttributes, mode: ComponentMode) -> Value {
    attrs.component(mode).map(Value::from).unwrap_or(Value::Null)
}

fn node_cell(id: &NodeId) -> Value {
    match id {
        NodeId::Index(i) => Value::from(*i),
        NodeId::Label(label) => Value::from(label.as_str()),
    }
}

/// Per-node attribute rows.
///
/// Directed: node, in_degree, out_degree, closeness, betweenness, eigenvector,
/// pagerank, weak, strong, then weighted_in_degree and weighted_out_degree when
/// weighted. Undirected: node, degree, closeness, betweenness, eigenvector,
/// clustering, full, then weighted_degree when weighted.
pub fn node_table(store: &GraphStore) -> Result<AttributeTable> {
    if !store.data_exists() {
        return Err(GraphLabError::metrics_not_computed());
    }

    let weighted = store.is_weighted();
    let mut table = if store.is_directed() {
        let mut columns = vec![
            "node", "in_degree", "out_degree", "closeness", "betweenness",
            "eigenvector", "pagerank", "weak", "strong",
        ];
        if weighted {
            columns.extend(["weighted_in_degree", "weighted_out_degree"]);
        }
        AttributeTable::new(&columns)
    } else {
        let mut columns = vec![
            "node", "degree", "closeness", "betweenness", "eigenvector", "clustering", "full",
        ];
        if weighted {
            columns.push("weighted_degree");
        }
        AttributeTable::new(&columns)
    };

    for id in store.node_ids() {
        let attrs = store.node_attributes(&id)
            .ok_or_else(|| GraphLabError::node_not_found(&id))?;

        let row = if store.is_directed() {
            let mut row = vec![
                node_cell(&id),
                metric_cell(attrs, Metric::InDegree),
                metric_cell(attrs, Metric::OutDegree),
                metric_cell(attrs, Metric::Closeness),
                metric_cell(attrs, Metric::Betweenness),
                metric_cell(attrs, Metric::Eigenvector),
                metric_cell(attrs, Metric::PageRank),
                component_cell(attrs, ComponentMode::Weak),
                component_cell(attrs, ComponentMode::Strong),
            ];
            if weighted {
                row.push(metric_cell(attrs, Metric::WeightedInDegree));
                row.push(metric_cell(attrs, Metric::WeightedOutDegree));
            }
            row
        } else {
            let mut row = vec![
                node_cell(&id),
                metric_cell(attrs, Metric::Degree),
                metric_cell(attrs, Metric::Closeness),
                metric_cell(attrs, Metric::Betweenness),
                metric_cell(attrs, Metric::Eigenvector),
                metric_cell(attrs, Metric::Clustering),
                component_cell(attrs, ComponentMode::Full),
            ];
            if weighted {
                row.push(metric_cell(attrs, Metric::WeightedDegree));
            }
            row
        };
        table.rows.push(row);
    }

    Ok(table)
}

/// Per-edge rows: source, target, weight (unit when absent), betweenness
pub fn edge_table(store: &GraphStore) -> Result<AttributeTable> {
    if !store.data_exists() {
        return Err(GraphLabError::metrics_not_computed());
    }

    let mut table = AttributeTable::new(&["source", "target", "weight", "betweenness"]);
    for edge in store.edges() {
        table.rows.push(vec![
            node_cell(&edge.source),
            node_cell(&edge.target),
            Value::from(edge.weight.unwrap_or(1.0)),
            edge.betweenness.map(Value::from).unwrap_or(Value::Null),
        ]);
    }
    Ok(table)
}
