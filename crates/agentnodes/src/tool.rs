use crate::calculator;
use agentcore::{NodeError, NodeSpec, NodeType};
use agentruntime::{NodeContext, NodeHandler};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Digits, arithmetic operators, parentheses, dots and whitespace only
static CALCULATOR_INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9+\-*/().\s]+$").expect("valid calculator pattern"));

/// Built-in tools selected by `tool_type`
pub struct ToolNode;

impl ToolNode {
    fn calculate(expression: &str) -> String {
        if !CALCULATOR_INPUT.is_match(expression) {
            return "Invalid mathematical expression".to_string();
        }
        match calculator::evaluate(expression) {
            Ok(value) => value.to_string(),
            Err(e) => {
                debug!("Calculator rejected {:?}: {}", expression, e);
                "Calculation error".to_string()
            }
        }
    }
}

#[async_trait]
impl NodeHandler for ToolNode {
    fn node_type(&self) -> NodeType {
        NodeType::Tool
    }

    async fn execute(
        &self,
        node: &NodeSpec,
        input: &str,
        _ctx: &NodeContext,
    ) -> Result<String, NodeError> {
        let tool_type = node.prop_str("tool_type", "calculator");

        let output = match tool_type.as_str() {
            "calculator" => Self::calculate(input),
            "web_search" => format!("Web search results for: {} (simulated)", input),
            other => format!("Tool {} executed with input: {}", other, input),
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list() {
        assert_eq!(ToolNode::calculate("2 + 3 * 4"), "14");
        assert_eq!(ToolNode::calculate("rm -rf /"), "Invalid mathematical expression");
        assert_eq!(ToolNode::calculate(""), "Invalid mathematical expression");
        assert_eq!(ToolNode::calculate("2 ^ 3"), "Invalid mathematical expression");
        assert_eq!(ToolNode::calculate("١ + ٢"), "Invalid mathematical expression");
    }

    #[test]
    fn test_evaluation_failures() {
        assert_eq!(ToolNode::calculate("1 / 0"), "Calculation error");
        assert_eq!(ToolNode::calculate("((2)"), "Calculation error");
        assert_eq!(ToolNode::calculate("   "), "Calculation error");
    }

    #[test]
    fn test_large_products() {
        assert_eq!(ToolNode::calculate("2 ** 100"), "1267650600228229401496703205376");
        assert_eq!(ToolNode::calculate("99999999999 * 99999999999"), "9999999999800000000001");
    }
}
