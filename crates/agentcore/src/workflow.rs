use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

pub type NodeId = String;
pub type Properties = Map<String, Value>;

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Missing, null and empty ids all get a fresh id.
fn id_or_generate<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let id: Option<String> = Option::deserialize(deserializer)?;
    Ok(id.filter(|id| !id.is_empty()).unwrap_or_else(generate_id))
}

/// Declared type of a node. Tags outside the known set are kept verbatim in
/// `Unknown` so they round-trip and can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    Input,
    Llm,
    Prompt,
    Tool,
    Memory,
    Router,
    Parser,
    Validator,
    Webhook,
    Output,
    Unknown(String),
}

impl NodeType {
    pub const ALL: [NodeType; 10] = [
        NodeType::Input,
        NodeType::Llm,
        NodeType::Prompt,
        NodeType::Tool,
        NodeType::Memory,
        NodeType::Router,
        NodeType::Parser,
        NodeType::Validator,
        NodeType::Webhook,
        NodeType::Output,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Input => "input",
            NodeType::Llm => "llm",
            NodeType::Prompt => "prompt",
            NodeType::Tool => "tool",
            NodeType::Memory => "memory",
            NodeType::Router => "router",
            NodeType::Parser => "parser",
            NodeType::Validator => "validator",
            NodeType::Webhook => "webhook",
            NodeType::Output => "output",
            NodeType::Unknown(tag) => tag,
        }
    }
}

impl From<&str> for NodeType {
    fn from(tag: &str) -> Self {
        match tag {
            "input" => NodeType::Input,
            "llm" => NodeType::Llm,
            "prompt" => NodeType::Prompt,
            "tool" => NodeType::Tool,
            "memory" => NodeType::Memory,
            "router" => NodeType::Router,
            "parser" => NodeType::Parser,
            "validator" => NodeType::Validator,
            "webhook" => NodeType::Webhook,
            "output" => NodeType::Output,
            other => NodeType::Unknown(other.to_string()),
        }
    }
}

impl From<String> for NodeType {
    fn from(tag: String) -> Self {
        NodeType::from(tag.as_str())
    }
}

impl From<NodeType> for String {
    fn from(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete flow definition as produced by the canvas
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Flow {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Flow {
    pub fn new() -> Self {
        let mut metadata = Map::new();
        metadata.insert("created_at".into(), Value::String(Utc::now().to_rfc3339()));
        metadata.insert("version".into(), Value::String("1.0".into()));
        metadata.insert("description".into(), Value::String(String::new()));

        Self {
            nodes: Vec::new(),
            connections: Vec::new(),
            metadata,
        }
    }

    /// Add a node, re-keying it if its id is already taken.
    pub fn add_node(&mut self, mut node: NodeSpec) -> NodeId {
        if node.id.is_empty() || self.find_node(&node.id).is_some() {
            node.id = generate_id();
        }
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    /// Connect two nodes output -> input. Self-loops and repeated
    /// (from, to) pairs are rejected and leave the flow untouched.
    pub fn connect(&mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> bool {
        let from = from.into();
        let to = to.into();

        if !self.can_connect(&from, &to) {
            debug!("Rejected connection {} -> {}", from, to);
            return false;
        }

        self.connections.push(Connection::new(from, to));
        true
    }

    pub fn can_connect(&self, from: &str, to: &str) -> bool {
        from != to
            && !self
                .connections
                .iter()
                .any(|conn| conn.from == from && conn.to == to)
    }

    pub fn find_node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn has_node_type(&self, node_type: &NodeType) -> bool {
        self.nodes.iter().any(|n| &n.node_type == node_type)
    }
}

/// A single processing step on the canvas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default = "generate_id", deserialize_with = "id_or_generate")]
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub position: Position,
    #[serde(default)]
    pub properties: Properties,
}

impl NodeSpec {
    pub fn new(node_type: NodeType) -> Self {
        let id = generate_id();
        let name = format!("{}_{}", node_type, &id[..8]);
        Self {
            id,
            node_type,
            name,
            position: Position::default(),
            properties: Properties::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Position { x, y };
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Resolve a scalar property. Template option lists resolve to their
    /// first entry, which is what the canvas preselects.
    fn selected(&self, key: &str) -> Option<&Value> {
        match self.properties.get(key)? {
            Value::Array(options) => options.first(),
            Value::Null => None,
            value => Some(value),
        }
    }

    pub fn prop_str(&self, key: &str, default: &str) -> String {
        self.selected(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    pub fn prop_f64(&self, key: &str, default: f64) -> f64 {
        self.selected(key).and_then(Value::as_f64).unwrap_or(default)
    }

    /// Non-negative integer property. Whole-number floats such as `512.0`
    /// count; fractional or negative values fall back to `default`.
    pub fn prop_u64(&self, key: &str, default: u64) -> u64 {
        let Some(value) = self.selected(key) else {
            return default;
        };
        value
            .as_u64()
            .or_else(|| {
                value
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && (0.0..=u64::MAX as f64).contains(f))
                    .map(|f| f as u64)
            })
            .unwrap_or(default)
    }

    /// List property; a lone string counts as a one-element list.
    pub fn prop_str_list(&self, key: &str, default: &[&str]) -> Vec<String> {
        match self.properties.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(item)) => vec![item.clone()],
            _ => default.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Directed link from one node's output to another node's input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default = "generate_id", deserialize_with = "id_or_generate")]
    pub id: String,
    pub from: NodeId,
    pub to: NodeId,
    #[serde(rename = "fromPort", default = "output_port")]
    pub from_port: String,
    #[serde(rename = "toPort", default = "input_port")]
    pub to_port: String,
    /// Reserved for conditional routing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

fn output_port() -> String {
    "output".to_string()
}

fn input_port() -> String {
    "input".to_string()
}

impl Connection {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            id: generate_id(),
            from: from.into(),
            to: to.into(),
            from_port: output_port(),
            to_port: input_port(),
            condition: None,
        }
    }
}

/// Node position in the visual editor
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_type_round_trips_unknown_tags() {
        let node: NodeSpec = serde_json::from_value(json!({
            "id": "n1",
            "type": "summarizer",
        }))
        .unwrap();
        assert_eq!(node.node_type, NodeType::Unknown("summarizer".into()));

        let back = serde_json::to_value(&node).unwrap();
        assert_eq!(back["type"], "summarizer");
    }

    #[test]
    fn test_missing_or_empty_id_is_generated() {
        let missing: NodeSpec = serde_json::from_value(json!({"type": "input"})).unwrap();
        let empty: NodeSpec = serde_json::from_value(json!({"id": "", "type": "input"})).unwrap();
        assert!(!missing.id.is_empty());
        assert!(!empty.id.is_empty());
        assert_ne!(missing.id, empty.id);
    }

    #[test]
    fn test_position_is_flat_on_the_wire() {
        let node: NodeSpec = serde_json::from_value(json!({
            "id": "n1", "type": "llm", "x": 120.0, "y": 40.5,
        }))
        .unwrap();
        assert_eq!(node.position, Position { x: 120.0, y: 40.5 });
    }

    #[test]
    fn test_option_lists_resolve_to_first_entry() {
        let node = NodeSpec::new(NodeType::Llm)
            .with_property("model", json!(["gpt-4o", "gpt-4"]))
            .with_property("temperature", json!(0.2));
        assert_eq!(node.prop_str("model", "gpt-3.5-turbo"), "gpt-4o");
        assert_eq!(node.prop_f64("temperature", 0.7), 0.2);
        assert_eq!(node.prop_u64("max_tokens", 2000), 2000);
    }

    #[test]
    fn test_integer_property_accepts_whole_floats() {
        let node = NodeSpec::new(NodeType::Llm)
            .with_property("whole", json!(512.0))
            .with_property("fraction", json!(512.5))
            .with_property("negative", json!(-3))
            .with_property("text", json!("512"));
        assert_eq!(node.prop_u64("whole", 2000), 512);
        assert_eq!(node.prop_u64("fraction", 2000), 2000);
        assert_eq!(node.prop_u64("negative", 2000), 2000);
        assert_eq!(node.prop_u64("text", 2000), 2000);
    }

    #[test]
    fn test_connect_rejects_self_loops_and_duplicates() {
        let mut flow = Flow::new();
        let a = flow.add_node(NodeSpec::new(NodeType::Input));
        let b = flow.add_node(NodeSpec::new(NodeType::Output));

        assert!(flow.connect(a.clone(), b.clone()));
        assert!(!flow.connect(a.clone(), b.clone()));
        assert!(!flow.connect(a.clone(), a.clone()));
        assert_eq!(flow.connections.len(), 1);
    }

    #[test]
    fn test_add_node_rekeys_duplicate_ids() {
        let mut flow = Flow::new();
        let first = flow.add_node(NodeSpec::new(NodeType::Input).with_id("same"));
        let second = flow.add_node(NodeSpec::new(NodeType::Output).with_id("same"));
        assert_eq!(first, "same");
        assert_ne!(second, "same");
    }
}
