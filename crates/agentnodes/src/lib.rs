//! Standard node library
//!
//! Handlers for every built-in node type, plus an OpenAI-compatible chat
//! client for `llm` nodes.

mod calculator;
mod http;
mod llm;
mod memory;
pub mod openai;
mod passthrough;
mod prompt;
mod tool;
mod transform;

pub use calculator::{evaluate, CalcError, Number};
pub use http::{WebhookNode, WEBHOOK_TIMEOUT};
pub use llm::LlmNode;
pub use memory::MemoryNode;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use passthrough::{InputNode, RouterNode, ValidatorNode};
pub use prompt::{OutputNode, PromptNode};
pub use tool::ToolNode;
pub use transform::ParserNode;

use agentruntime::HandlerRegistry;
use std::sync::Arc;

/// Register all standard nodes with a registry
pub fn register_all(registry: &mut HandlerRegistry) {
    registry.register(Arc::new(InputNode));
    registry.register(Arc::new(LlmNode));
    registry.register(Arc::new(PromptNode));
    registry.register(Arc::new(ToolNode));
    registry.register(Arc::new(MemoryNode));
    registry.register(Arc::new(RouterNode));
    registry.register(Arc::new(ParserNode));
    registry.register(Arc::new(ValidatorNode));
    registry.register(Arc::new(WebhookNode::new()));
    registry.register(Arc::new(OutputNode));
}

/// A registry holding every standard node
pub fn standard_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    register_all(&mut registry);
    registry
}
