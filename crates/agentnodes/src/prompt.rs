use agentcore::{NodeError, NodeSpec, NodeType};
use agentruntime::{NodeContext, NodeHandler};
use async_trait::async_trait;

const INPUT_PLACEHOLDER: &str = "{input}";

/// Fills `{input}` in the node's template when `input` is a declared variable
pub struct PromptNode;

#[async_trait]
impl NodeHandler for PromptNode {
    fn node_type(&self) -> NodeType {
        NodeType::Prompt
    }

    async fn execute(
        &self,
        node: &NodeSpec,
        input: &str,
        _ctx: &NodeContext,
    ) -> Result<String, NodeError> {
        let template = node.prop_str("template", INPUT_PLACEHOLDER);
        let variables = node.prop_str_list("variables", &["input"]);

        if variables.iter().any(|v| v == "input") {
            Ok(template.replace(INPUT_PLACEHOLDER, input))
        } else {
            Ok(template)
        }
    }
}

/// Final formatting step. A template without `{input}` is ignored.
pub struct OutputNode;

#[async_trait]
impl NodeHandler for OutputNode {
    fn node_type(&self) -> NodeType {
        NodeType::Output
    }

    async fn execute(
        &self,
        node: &NodeSpec,
        input: &str,
        _ctx: &NodeContext,
    ) -> Result<String, NodeError> {
        let template = node.prop_str("template", INPUT_PLACEHOLDER);

        if template.contains(INPUT_PLACEHOLDER) {
            Ok(template.replace(INPUT_PLACEHOLDER, input))
        } else {
            Ok(input.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcore::{EchoChatClient, EventBus};
    use std::sync::Arc;

    fn ctx() -> NodeContext {
        let bus = EventBus::new(8);
        NodeContext::new(
            Arc::new(EchoChatClient),
            bus.create_emitter(Default::default(), "n".into()),
            false,
        )
    }

    #[tokio::test]
    async fn test_prompt_substitution_is_single_pass() {
        let node = NodeSpec::new(NodeType::Prompt).with_property("template", "{input} and {input}");
        let out = PromptNode.execute(&node, "<{input}>", &ctx()).await.unwrap();
        assert_eq!(out, "<{input}> and <{input}>");
    }

    #[tokio::test]
    async fn test_prompt_without_input_variable_keeps_template() {
        let node = NodeSpec::new(NodeType::Prompt)
            .with_property("template", "Hi {input}")
            .with_property("variables", serde_json::json!(["name"]));
        let out = PromptNode.execute(&node, "x", &ctx()).await.unwrap();
        assert_eq!(out, "Hi {input}");
    }

    #[tokio::test]
    async fn test_output_ignores_template_without_placeholder() {
        let node = NodeSpec::new(NodeType::Output).with_property("template", "static");
        assert_eq!(OutputNode.execute(&node, "v", &ctx()).await.unwrap(), "v");

        let empty = NodeSpec::new(NodeType::Output).with_property("template", "");
        assert_eq!(OutputNode.execute(&empty, "v", &ctx()).await.unwrap(), "v");
    }
}
