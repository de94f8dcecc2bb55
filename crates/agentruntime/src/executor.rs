use crate::registry::{HandlerRegistry, NodeContext};
use crate::{scheduler, validator};
use agentcore::{
    ChatClient, EventBus, ExecutionEvent, ExecutionId, ExecutionMode, ExecutionResult, Flow,
    FlowError, NodeSpec, NodeTrace,
};
use chrono::Utc;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// What to do with nodes that sit on a cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Fail the run, naming the nodes on the cycle.
    #[default]
    Reject,
    /// Run what can be scheduled and skip the rest.
    Omit,
}

/// Engine settings
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub cycle_policy: CyclePolicy,
    /// Record each node's output in `intermediate_results`.
    pub trace_nodes: bool,
    /// Deadline for a whole run.
    pub max_execution_time: Option<Duration>,
}

/// Runs flows one node at a time in topological order
pub struct FlowExecutor {
    config: EngineConfig,
}

/// Everything a single run needs, borrowed for its duration
struct Run<'a> {
    flow: &'a Flow,
    input: &'a str,
    registry: &'a HandlerRegistry,
    event_bus: &'a EventBus,
    client: Arc<dyn ChatClient>,
    execution_id: ExecutionId,
    stream: bool,
}

impl FlowExecutor {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute a flow against one input value.
    ///
    /// Never fails: precondition violations, cycles, timeouts and panics all
    /// come back as an unsuccessful `ExecutionResult`.
    #[allow(clippy::too_many_arguments)]
    pub async fn execute_flow(
        &self,
        flow: &Flow,
        input_text: &str,
        client: Arc<dyn ChatClient>,
        mode: ExecutionMode,
        stream: bool,
        registry: &HandlerRegistry,
        event_bus: &EventBus,
    ) -> ExecutionResult {
        let execution_id = ExecutionId::new_v4();
        let start_time = Instant::now();

        event_bus.emit(ExecutionEvent::RunStarted {
            execution_id,
            mode,
            stream,
            timestamp: Utc::now(),
        });

        info!(
            "Starting flow execution {} ({} nodes, {} mode)",
            execution_id,
            flow.nodes.len(),
            mode
        );

        let run = Run {
            flow,
            input: input_text,
            registry,
            event_bus,
            client,
            execution_id,
            stream,
        };

        let outcome = self
            .guarded(run.execute(mode, &self.config))
            .await
            .and_then(|outcome| outcome);

        let elapsed = start_time.elapsed();
        let response_time = elapsed.as_secs_f64();

        let result = match outcome {
            Ok((output, trace)) => {
                info!("Flow execution {} completed in {:?}", execution_id, elapsed);
                ExecutionResult::success(output, response_time, trace)
            }
            Err(e) => {
                error!("Execution error: {}", e);
                ExecutionResult::failure(e.to_string(), response_time)
            }
        };

        event_bus.emit(ExecutionEvent::RunCompleted {
            execution_id,
            success: result.success,
            error: result.error.clone(),
            duration_ms: elapsed.as_millis() as u64,
            timestamp: Utc::now(),
        });

        result
    }

    /// Apply the deadline and turn a panic into an error.
    async fn guarded<F, T>(&self, run: F) -> Result<T, FlowError>
    where
        F: std::future::Future<Output = T>,
    {
        let run = AssertUnwindSafe(run).catch_unwind();

        let caught = match self.config.max_execution_time {
            Some(limit) => timeout(limit, run)
                .await
                .map_err(|_| FlowError::Timeout {
                    seconds: limit.as_secs_f64(),
                })?,
            None => run.await,
        };

        caught.map_err(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            FlowError::Execution(format!("node panicked: {}", message))
        })
    }
}

impl Default for FlowExecutor {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Run<'_> {
    async fn execute(
        &self,
        mode: ExecutionMode,
        config: &EngineConfig,
    ) -> Result<(String, Vec<NodeTrace>), FlowError> {
        if !validator::validate(self.flow) {
            return Err(FlowError::InvalidFlow);
        }

        if !mode.is_implemented() {
            warn!(
                "{} execution is not yet implemented, falling back to sequential",
                mode
            );
        }

        self.execute_sequential(config).await
    }

    async fn execute_sequential(
        &self,
        config: &EngineConfig,
    ) -> Result<(String, Vec<NodeTrace>), FlowError> {
        let flow = self.flow;
        let order = match config.cycle_policy {
            CyclePolicy::Reject => scheduler::strict_order(&flow.nodes, &flow.connections)?,
            CyclePolicy::Omit => {
                let order = scheduler::order(&flow.nodes, &flow.connections);
                if order.len() < flow.nodes.len() {
                    warn!(
                        "{} node(s) could not be scheduled and will not run",
                        flow.nodes.len() - order.len()
                    );
                }
                order
            }
        };

        let mut nodes: HashMap<&str, &NodeSpec> = HashMap::new();
        for node in &flow.nodes {
            nodes.entry(node.id.as_str()).or_insert(node);
        }

        let mut current = self.input.to_string();
        let mut trace = Vec::new();

        for node_id in &order {
            let Some(node) = nodes.get(node_id.as_str()) else {
                continue;
            };

            self.event_bus.emit(ExecutionEvent::NodeStarted {
                execution_id: self.execution_id,
                node_id: node.id.clone(),
                node_type: node.node_type.clone(),
                timestamp: Utc::now(),
            });
            debug!("Executing {} node {}", node.node_type, node.id);

            let ctx = NodeContext::new(
                self.client.clone(),
                self.event_bus.create_emitter(self.execution_id, node.id.clone()),
                self.stream,
            );

            let start = Instant::now();
            current = self.registry.execute_node(node, &current, &ctx).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            debug!("Node {} completed in {}ms", node.id, duration_ms);
            self.event_bus.emit(ExecutionEvent::NodeCompleted {
                execution_id: self.execution_id,
                node_id: node.id.clone(),
                output: current.clone(),
                duration_ms,
                timestamp: Utc::now(),
            });

            if config.trace_nodes {
                trace.push(NodeTrace {
                    node_id: node.id.clone(),
                    node_type: node.node_type.clone(),
                    output: current.clone(),
                    duration_ms,
                });
            }
        }

        Ok((current, trace))
    }
}
