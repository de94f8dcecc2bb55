use agentcore::{NodeError, NodeSpec, NodeType};
use agentruntime::{NodeContext, NodeHandler};
use async_trait::async_trait;
use tracing::debug;

/// Normalizes structured text. `json` input is re-emitted pretty printed;
/// anything that does not parse is passed through untouched.
pub struct ParserNode;

impl ParserNode {
    fn pretty_json(input: &str) -> Option<String> {
        let parsed: serde_json::Value = serde_json::from_str(input).ok()?;
        serde_json::to_string_pretty(&parsed).ok()
    }
}

#[async_trait]
impl NodeHandler for ParserNode {
    fn node_type(&self) -> NodeType {
        NodeType::Parser
    }

    async fn execute(
        &self,
        node: &NodeSpec,
        input: &str,
        _ctx: &NodeContext,
    ) -> Result<String, NodeError> {
        let parser_type = node.prop_str("parser_type", "json");
        if parser_type != "json" {
            return Ok(input.to_string());
        }

        match Self::pretty_json(input) {
            Some(pretty) => Ok(pretty),
            None => {
                debug!("Parser {} left non-JSON input unchanged", node.id);
                Ok(input.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_json_keeps_key_order() {
        let pretty = ParserNode::pretty_json(r#"{"b":1,"a":[true,null]}"#).unwrap();
        assert_eq!(
            pretty,
            "{\n  \"b\": 1,\n  \"a\": [\n    true,\n    null\n  ]\n}"
        );
    }

    #[test]
    fn test_non_json_is_rejected() {
        assert!(ParserNode::pretty_json("not json").is_none());
        assert!(ParserNode::pretty_json("").is_none());
    }
}
