//! Core abstractions for the agent flow engine
//!
//! This crate provides the flow model, the run result and statistics types,
//! node templates and the chat-client capability that every other crate
//! depends on. It does not execute anything itself.

pub mod client;
mod error;
pub mod events;
mod execution;
mod export;
mod stats;
mod template;
mod workflow;

pub use client::{ChatClient, ChatMessage, ChatRequest, ChatRole, EchoChatClient, MockChatClient};
pub use error::{ClientError, FlowError, NodeError, WorkflowError};
pub use events::*;
pub use execution::{ExecutionMode, ExecutionResult, NodeTrace};
pub use export::{import_flow, AgentConfig, SavedAgent, EXPORT_VERSION};
pub use stats::{ExecutionRecord, ExecutionStats, HISTORY_LIMIT};
pub use template::NodeTemplate;
pub use workflow::{Connection, Flow, NodeId, NodeSpec, NodeType, Position, Properties};

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;
