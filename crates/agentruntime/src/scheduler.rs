//! Linearizes a flow into the order its nodes run in.

use agentcore::{Connection, FlowError, NodeId, NodeSpec};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};

/// Kahn's topological sort.
///
/// Every node id appears at most once and every edge between two known
/// nodes is respected. Edges touching unknown ids are ignored. Ties are
/// broken FIFO: roots in `nodes` order, then successors in edge order.
/// Nodes on a cycle never become ready and are left out without error; use
/// [`strict_order`] to have that reported.
pub fn order(nodes: &[NodeSpec], edges: &[Connection]) -> Vec<NodeId> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    for node in nodes {
        in_degree.entry(node.id.as_str()).or_insert(0);
    }

    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        if !in_degree.contains_key(edge.from.as_str()) {
            continue;
        }
        let Some(degree) = in_degree.get_mut(edge.to.as_str()) else {
            continue;
        };
        *degree += 1;
        successors
            .entry(edge.from.as_str())
            .or_default()
            .push(edge.to.as_str());
    }

    let mut seeded = HashSet::new();
    let mut queue: VecDeque<&str> = nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| in_degree.get(id) == Some(&0) && seeded.insert(*id))
        .collect();

    let mut result = Vec::with_capacity(in_degree.len());
    while let Some(current) = queue.pop_front() {
        result.push(current.to_string());

        for &next in successors.get(current).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(next) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(next);
                }
            }
        }
    }

    result
}

/// Like [`order`], but a flow whose nodes cannot all be scheduled is an
/// error naming the nodes that sit on a cycle.
pub fn strict_order(nodes: &[NodeSpec], edges: &[Connection]) -> Result<Vec<NodeId>, FlowError> {
    let scheduled = order(nodes, edges);
    let expected: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

    if scheduled.len() == expected.len() {
        return Ok(scheduled);
    }

    Err(FlowError::CyclicGraph {
        nodes: cycle_members(nodes, edges),
    })
}

/// Ids of nodes that belong to a cycle, in `nodes` order.
pub fn cycle_members(nodes: &[NodeSpec], edges: &[Connection]) -> Vec<NodeId> {
    let (graph, index) = build_graph(nodes, edges);

    let mut on_cycle = HashSet::new();
    for component in tarjan_scc(&graph) {
        let looped = component.len() == 1 && graph.contains_edge(component[0], component[0]);
        if component.len() > 1 || looped {
            on_cycle.extend(component.into_iter().map(|idx| graph[idx]));
        }
    }

    let mut members: Vec<NodeId> = Vec::new();
    for node in nodes {
        let Some(idx) = index.get(node.id.as_str()) else {
            continue;
        };
        if on_cycle.contains(graph[*idx]) && !members.contains(&node.id) {
            members.push(node.id.clone());
        }
    }
    members
}

/// Dependency graph over the known node ids
fn build_graph<'a>(
    nodes: &'a [NodeSpec],
    edges: &'a [Connection],
) -> (DiGraph<&'a str, ()>, HashMap<&'a str, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut index = HashMap::new();

    for node in nodes {
        index
            .entry(node.id.as_str())
            .or_insert_with(|| graph.add_node(node.id.as_str()));
    }

    for edge in edges {
        if let (Some(from), Some(to)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str())) {
            graph.add_edge(*from, *to, ());
        }
    }

    (graph, index)
}
