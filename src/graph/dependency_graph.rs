use crate::timeline::{Timeline, TimelineId};
use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// The dependency overlay as a directed graph, for diagnosis only: the
/// resolver never walks this, but consumers use it to explain why nodes
/// ended up unresolved.
pub struct DependencyGraph {
    graph: DiGraph<TimelineId, ()>,
    id_to_index: HashMap<TimelineId, NodeIndex>,
}

impl DependencyGraph {
    /// Build from a flattened node set. Edges run predecessor -> task;
    /// references to ids outside the set are skipped.
    pub fn build<'a, I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = &'a Timeline>,
    {
        let nodes: Vec<&Timeline> = nodes.into_iter().collect();
        let mut graph: DiGraph<TimelineId, ()> = DiGraph::new();
        let mut id_to_index: HashMap<TimelineId, NodeIndex> = HashMap::new();

        for node in &nodes {
            let index = graph.add_node(node.id().clone());
            id_to_index.insert(node.id().clone(), index);
        }

        for node in &nodes {
            if let Timeline::Task(task) = node {
                let target = id_to_index[&task.id];
                for prev in &task.previous {
                    if let Some(&source) = id_to_index.get(prev) {
                        graph.add_edge(source, target, ());
                    }
                }
            }
        }

        Self { graph, id_to_index }
    }

    pub fn contains(&self, id: &TimelineId) -> bool {
        self.id_to_index.contains_key(id)
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    /// Dependency cycles as id groups: strongly connected components of two
    /// or more nodes, plus single nodes with a self-edge. Sorted for stable
    /// output.
    pub fn cycles(&self) -> Vec<Vec<TimelineId>> {
        let mut cycles: Vec<Vec<TimelineId>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || self.graph.find_edge(component[0], component[0]).is_some()
            })
            .map(|component| {
                let mut ids: Vec<TimelineId> = component
                    .into_iter()
                    .map(|index| self.graph[index].clone())
                    .collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();
        cycles
    }
}
