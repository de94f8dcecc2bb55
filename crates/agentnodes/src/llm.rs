use agentcore::{ChatMessage, ChatRequest, NodeError, NodeSpec, NodeType};
use agentruntime::{NodeContext, NodeHandler};
use async_trait::async_trait;
use tracing::{debug, error};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Sends the value as the user message of a chat completion.
///
/// Client failures are folded into the output as `"LLM Error: <message>"`,
/// so an unreachable provider never stops the run.
pub struct LlmNode;

impl LlmNode {
    fn build_request(node: &NodeSpec, input: &str) -> ChatRequest {
        ChatRequest {
            model: node.prop_str("model", DEFAULT_MODEL),
            messages: vec![
                ChatMessage::system(node.prop_str("system_prompt", DEFAULT_SYSTEM_PROMPT)),
                ChatMessage::user(input),
            ],
            temperature: node.prop_f64("temperature", 0.7),
            max_tokens: node.prop_u64("max_tokens", 2000),
        }
    }
}

#[async_trait]
impl NodeHandler for LlmNode {
    fn node_type(&self) -> NodeType {
        NodeType::Llm
    }

    async fn execute(
        &self,
        node: &NodeSpec,
        input: &str,
        ctx: &NodeContext,
    ) -> Result<String, NodeError> {
        let request = Self::build_request(node, input);
        debug!(
            "LLM node {} calling {} with model {}",
            node.id,
            ctx.client.id(),
            request.model
        );

        match ctx.client.chat_completion(request).await {
            Ok(text) => Ok(text),
            Err(e) => {
                error!("LLM execution error: {}", e);
                ctx.events.warn(format!("LLM call failed: {}", e));
                Ok(format!("LLM Error: {}", e))
            }
        }
    }
}
