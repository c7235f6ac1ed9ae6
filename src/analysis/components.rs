// Connected components, strong connectivity and acyclicity

use std::collections::VecDeque;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use crate::graph::model::ComponentMode;
use crate::graph::store::GraphView;

/// Mirror a snapshot into a petgraph digraph whose node indices match the view
pub(crate) fn to_digraph(view: &GraphView) -> DiGraph<(), f64> {
    let mut graph = DiGraph::with_capacity(view.len(), view.edge_count());
    for _ in 0..view.len() {
        graph.add_node(());
    }
    for (u, a) in view.arcs() {
        graph.add_edge(NodeIndex::new(u), NodeIndex::new(a.to), a.cost());
    }
    graph
}

/// Components ignoring direction, discovered by BFS in node order
pub fn weak_components(view: &GraphView) -> Vec<Vec<usize>> {
    let n = view.len();
    let mut seen = vec![false; n];
    let mut components = Vec::new();

    for start in 0..n {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut component = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(u) = queue.pop_front() {
            for v in view.neighbors_any(u) {
                if !seen[v] {
                    seen[v] = true;
                    component.push(v);
                    queue.push_back(v);
                }
            }
        }
        component.sort_unstable();
        components.push(component);
    }

    components
}

/// Strongly connected components in the order Tarjan's algorithm emits them
pub fn strong_components(view: &GraphView) -> Vec<Vec<usize>> {
    tarjan_scc(&to_digraph(view))
        .into_iter()
        .map(|scc| {
            let mut component: Vec<usize> = scc.into_iter().map(|idx| idx.index()).collect();
            component.sort_unstable();
            component
        })
        .collect()
}

pub fn components(view: &GraphView, mode: ComponentMode) -> Vec<Vec<usize>> {
    match mode {
        ComponentMode::Strong if view.directed => strong_components(view),
        _ => weak_components(view),
    }
}

/// Label every node with its component, `"A0"`, `"A1"`, ...
pub fn component_labels(view: &GraphView, mode: ComponentMode) -> Vec<String> {
    let mut labels = vec![String::new(); view.len()];
    for (i, component) in components(view, mode).iter().enumerate() {
        for &node in component {
            labels[node] = format!("A{}", i);
        }
    }
    labels
}

/// Strong connectivity for directed graphs, plain connectivity otherwise.
/// The empty graph is not connected.
pub fn is_connected(view: &GraphView) -> bool {
    if view.is_empty() {
        return false;
    }
    let count = if view.directed {
        strong_components(view).len()
    } else {
        weak_components(view).len()
    };
    count == 1
}

/// Whether a directed graph has no cycle; self-loops count as cycles
pub fn is_dag(view: &GraphView) -> bool {
    view.directed && toposort(&to_digraph(view), None).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::import_export::build_from_edge_list;
    use crate::graph::model::GraphType;

    #[test]
    fn test_weak_and_strong_labels() {
        let store = build_from_edge_list("a b\nb a\nb c\nd e\n", GraphType::Directed).unwrap();
        let view = store.view();

        let weak = component_labels(&view, ComponentMode::Weak);
        assert_eq!(weak, vec!["A0", "A0", "A0", "A1", "A1"]);

        let strong = strong_components(&view);
        assert_eq!(strong.len(), 4);
        assert!(strong.contains(&vec![0, 1]));

        let labels = component_labels(&view, ComponentMode::Strong);
        assert_eq!(labels[0], labels[1]);
        assert_ne!(labels[1], labels[2]);
        assert!(!is_connected(&view));
    }

    #[test]
    fn test_dag_detection() {
        let dag = build_from_edge_list("a b\nb c\na c\n", GraphType::Directed).unwrap();
        assert!(is_dag(&dag.view()));

        let cyclic = build_from_edge_list("a b\nb c\nc a\n", GraphType::Directed).unwrap();
        assert!(!is_dag(&cyclic.view()));
        assert!(is_connected(&cyclic.view()));

        let looped = build_from_edge_list("a a\n", GraphType::Directed).unwrap();
        assert!(!is_dag(&looped.view()));
    }

    #[test]
    fn test_full_components_on_undirected() {
        let store = build_from_edge_list("x y\ny z\nu v\n", GraphType::Undirected).unwrap();
        let view = store.view();
        assert_eq!(component_labels(&view, ComponentMode::Full), vec!["A0", "A0", "A0", "A1", "A1"]);
        assert!(!is_dag(&view));
    }
}
