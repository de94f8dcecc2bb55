//! Flow execution runtime
//!
//! This crate validates and schedules flows, dispatches each node to its
//! registered handler and aggregates run statistics.

mod executor;
mod registry;
mod runtime;
pub mod scheduler;
pub mod validator;

pub use executor::{CyclePolicy, EngineConfig, FlowExecutor};
pub use registry::{HandlerMetadata, HandlerRegistry, NodeContext, NodeHandler};
pub use runtime::{AgentRuntime, RuntimeConfig, StatsStore};
