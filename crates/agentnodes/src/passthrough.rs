use agentcore::{NodeError, NodeSpec, NodeType};
use agentruntime::{NodeContext, NodeHandler};
use async_trait::async_trait;
use tracing::debug;

/// Entry point of a flow; forwards the run input unchanged
pub struct InputNode;

#[async_trait]
impl NodeHandler for InputNode {
    fn node_type(&self) -> NodeType {
        NodeType::Input
    }

    async fn execute(
        &self,
        _node: &NodeSpec,
        input: &str,
        _ctx: &NodeContext,
    ) -> Result<String, NodeError> {
        Ok(input.to_string())
    }
}

/// Routing is not applied yet; the configured strategy is only read and logged.
pub struct RouterNode;

#[async_trait]
impl NodeHandler for RouterNode {
    fn node_type(&self) -> NodeType {
        NodeType::Router
    }

    async fn execute(
        &self,
        node: &NodeSpec,
        input: &str,
        _ctx: &NodeContext,
    ) -> Result<String, NodeError> {
        let routing_type = node.prop_str("routing_type", "keyword");
        debug!("Router {} using {} routing", node.id, routing_type);
        Ok(input.to_string())
    }
}

pub struct ValidatorNode;

#[async_trait]
impl NodeHandler for ValidatorNode {
    fn node_type(&self) -> NodeType {
        NodeType::Validator
    }

    async fn execute(
        &self,
        _node: &NodeSpec,
        input: &str,
        _ctx: &NodeContext,
    ) -> Result<String, NodeError> {
        Ok(input.to_string())
    }
}
