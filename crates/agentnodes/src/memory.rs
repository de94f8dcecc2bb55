use agentcore::{NodeError, NodeSpec, NodeType};
use agentruntime::{NodeContext, NodeHandler};
use async_trait::async_trait;

/// Tags the value with the configured memory kind. Nothing is stored.
pub struct MemoryNode;

#[async_trait]
impl NodeHandler for MemoryNode {
    fn node_type(&self) -> NodeType {
        NodeType::Memory
    }

    async fn execute(
        &self,
        node: &NodeSpec,
        input: &str,
        _ctx: &NodeContext,
    ) -> Result<String, NodeError> {
        let memory_type = node.prop_str("memory_type", "conversation_buffer");
        Ok(format!("Memory ({}): {}", memory_type, input))
    }
}
