use agentcore::{Flow, NodeTemplate, NodeType};
use std::collections::HashSet;

/// Cheap precondition for running a flow: it must have at least one node,
/// one `input` node and one `output` node. Connectivity and acyclicity are
/// not checked here.
pub fn validate(flow: &Flow) -> bool {
    !flow.nodes.is_empty()
        && flow.has_node_type(&NodeType::Input)
        && flow.has_node_type(&NodeType::Output)
}

/// Advisory findings about a flow that do not stop it from running: unknown
/// node types, suspicious property values and connections that the canvas
/// would not have produced.
pub fn lint(flow: &Flow) -> Vec<String> {
    let mut findings = Vec::new();

    for node in &flow.nodes {
        match NodeTemplate::for_type(&node.node_type) {
            Some(template) => {
                for problem in template.check(&node.properties) {
                    findings.push(format!("Node {}: {}", node.id, problem));
                }
            }
            None => findings.push(format!(
                "Node {}: Unknown node type: {}",
                node.id, node.node_type
            )),
        }
    }

    let mut seen_ids = HashSet::new();
    for node in &flow.nodes {
        if !seen_ids.insert(node.id.as_str()) {
            findings.push(format!("Duplicate node id: {}", node.id));
        }
    }

    let mut seen_pairs = HashSet::new();
    for conn in &flow.connections {
        if conn.from == conn.to {
            findings.push(format!("Connection {} loops on node {}", conn.id, conn.from));
        }
        if !seen_pairs.insert((conn.from.as_str(), conn.to.as_str())) {
            findings.push(format!(
                "Duplicate connection from {} to {}",
                conn.from, conn.to
            ));
        }
        for endpoint in [&conn.from, &conn.to] {
            if flow.find_node(endpoint).is_none() {
                findings.push(format!(
                    "Connection {} references missing node {}",
                    conn.id, endpoint
                ));
            }
        }
    }

    findings
}
