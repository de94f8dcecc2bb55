use agentcore::{ChatClient, EventEmitter, NodeError, NodeSpec, NodeTemplate, NodeType};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, warn};

/// Transformation behind one node type.
///
/// A handler turns the value flowing into a node into the value flowing out
/// of it. Returning `Err` never aborts a run: the registry converts the error
/// into the node's output.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    /// Node type this handler serves
    fn node_type(&self) -> NodeType;

    async fn execute(
        &self,
        node: &NodeSpec,
        input: &str,
        ctx: &NodeContext,
    ) -> Result<String, NodeError>;

    fn metadata(&self) -> HandlerMetadata {
        HandlerMetadata::for_type(&self.node_type())
    }
}

/// Collaborators available to a handler while it runs
#[derive(Clone)]
pub struct NodeContext {
    pub client: Arc<dyn ChatClient>,
    pub events: EventEmitter,
    /// Whether the caller asked for streamed output. Handlers may ignore it.
    pub stream: bool,
}

impl NodeContext {
    pub fn new(client: Arc<dyn ChatClient>, events: EventEmitter, stream: bool) -> Self {
        Self {
            client,
            events,
            stream,
        }
    }
}

/// Metadata about a node type
#[derive(Debug, Clone)]
pub struct HandlerMetadata {
    pub description: String,
    pub category: String,
}

impl HandlerMetadata {
    pub fn for_type(node_type: &NodeType) -> Self {
        match NodeTemplate::for_type(node_type) {
            Some(template) => Self {
                description: template.description.to_string(),
                category: template.category.to_string(),
            },
            None => Self::default(),
        }
    }
}

impl Default for HandlerMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            category: "general".to_string(),
        }
    }
}

/// Registry of handlers keyed by node type
pub struct HandlerRegistry {
    handlers: HashMap<NodeType, Arc<dyn NodeHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler, replacing any previous one for the same type
    pub fn register(&mut self, handler: Arc<dyn NodeHandler>) {
        let node_type = handler.node_type();
        tracing::info!("Registering node type: {}", node_type);
        self.handlers.insert(node_type, handler);
    }

    pub fn get(&self, node_type: &NodeType) -> Option<&Arc<dyn NodeHandler>> {
        self.handlers.get(node_type)
    }

    /// Run one node. Types without a handler pass the value through and
    /// handler errors become `"Error in <type>: <message>"`.
    pub async fn execute_node(&self, node: &NodeSpec, input: &str, ctx: &NodeContext) -> String {
        let Some(handler) = self.handlers.get(&node.node_type) else {
            warn!("Unknown node type: {}", node.node_type);
            ctx.events
                .warn(format!("Unknown node type: {}", node.node_type));
            return input.to_string();
        };

        match handler.execute(node, input, ctx).await {
            Ok(output) => output,
            Err(e) => {
                error!("Error executing {} node {}: {}", node.node_type, node.id, e);
                format!("Error in {}: {}", node.node_type, e)
            }
        }
    }

    /// Registered node types, known types first in palette order
    pub fn list_node_types(&self) -> Vec<NodeType> {
        let mut types: Vec<NodeType> = self.handlers.keys().cloned().collect();
        types.sort_by_key(|t| {
            let rank = NodeType::ALL
                .iter()
                .position(|known| known == t)
                .unwrap_or(NodeType::ALL.len());
            (rank, t.to_string())
        });
        types
    }

    pub fn get_metadata(&self, node_type: &NodeType) -> Option<HandlerMetadata> {
        self.handlers.get(node_type).map(|h| h.metadata())
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
