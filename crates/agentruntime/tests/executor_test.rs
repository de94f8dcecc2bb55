// crates/agentruntime/tests/executor_test.rs

use agentcore::{
    ChatClient, EchoChatClient, EventBus, ExecutionEvent, ExecutionMode, Flow, NodeError,
    NodeSpec, NodeType,
};
use agentruntime::{
    AgentRuntime, CyclePolicy, EngineConfig, FlowExecutor, HandlerRegistry, NodeContext,
    NodeHandler, RuntimeConfig,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Appends a property to the value flowing through
struct SuffixHandler(NodeType);

#[async_trait]
impl NodeHandler for SuffixHandler {
    fn node_type(&self) -> NodeType {
        self.0.clone()
    }

    async fn execute(
        &self,
        node: &NodeSpec,
        input: &str,
        _ctx: &NodeContext,
    ) -> Result<String, NodeError> {
        Ok(format!("{}{}", input, node.prop_str("suffix", "")))
    }
}

struct FailingHandler;

#[async_trait]
impl NodeHandler for FailingHandler {
    fn node_type(&self) -> NodeType {
        NodeType::Tool
    }

    async fn execute(
        &self,
        _node: &NodeSpec,
        _input: &str,
        _ctx: &NodeContext,
    ) -> Result<String, NodeError> {
        Err(NodeError::ExecutionFailed("boom".to_string()))
    }
}

struct SlowHandler;

#[async_trait]
impl NodeHandler for SlowHandler {
    fn node_type(&self) -> NodeType {
        NodeType::Memory
    }

    async fn execute(
        &self,
        _node: &NodeSpec,
        input: &str,
        _ctx: &NodeContext,
    ) -> Result<String, NodeError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(input.to_string())
    }
}

struct PanickingHandler;

#[async_trait]
impl NodeHandler for PanickingHandler {
    fn node_type(&self) -> NodeType {
        NodeType::Router
    }

    async fn execute(
        &self,
        _node: &NodeSpec,
        _input: &str,
        _ctx: &NodeContext,
    ) -> Result<String, NodeError> {
        panic!("handler bug");
    }
}

fn test_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(SuffixHandler(NodeType::Input)));
    registry.register(Arc::new(SuffixHandler(NodeType::Prompt)));
    registry.register(Arc::new(SuffixHandler(NodeType::Output)));
    registry.register(Arc::new(FailingHandler));
    registry.register(Arc::new(SlowHandler));
    registry.register(Arc::new(PanickingHandler));
    registry
}

fn client() -> Arc<dyn ChatClient> {
    Arc::new(EchoChatClient)
}

/// input -> middle -> output, with `middle` of the given type
fn chain(middle: NodeSpec) -> Flow {
    let mut flow = Flow::new();
    let input = flow.add_node(NodeSpec::new(NodeType::Input).with_id("in"));
    let mid = flow.add_node(middle.with_id("mid"));
    let output = flow.add_node(
        NodeSpec::new(NodeType::Output)
            .with_id("out")
            .with_property("suffix", "!"),
    );
    flow.connect(input.clone(), mid.clone());
    flow.connect(mid, output);
    flow
}

async fn run(executor: &FlowExecutor, flow: &Flow, input: &str) -> agentcore::ExecutionResult {
    executor
        .execute_flow(
            flow,
            input,
            client(),
            ExecutionMode::Sequential,
            false,
            &test_registry(),
            &EventBus::default(),
        )
        .await
}

#[tokio::test]
async fn test_value_is_threaded_through_nodes_in_order() {
    let flow = chain(NodeSpec::new(NodeType::Prompt).with_property("suffix", " world"));
    let result = run(&FlowExecutor::default(), &flow, "hello").await;

    assert!(result.success);
    assert_eq!(result.output.as_deref(), Some("hello world!"));
    assert!(result.error.is_none());
    assert!(result.intermediate_results.is_empty());
}

#[tokio::test]
async fn test_flow_without_output_node_is_invalid() {
    let mut flow = Flow::new();
    flow.add_node(NodeSpec::new(NodeType::Input));
    flow.add_node(NodeSpec::new(NodeType::Prompt));

    let result = run(&FlowExecutor::default(), &flow, "x").await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Invalid flow configuration"));
    assert!(result.output.is_none());
}

#[tokio::test]
async fn test_empty_and_input_less_flows_are_invalid() {
    let empty = Flow::new();
    let mut no_input = Flow::new();
    no_input.add_node(NodeSpec::new(NodeType::Output));

    for flow in [&empty, &no_input] {
        let result = run(&FlowExecutor::default(), flow, "x").await;
        assert_eq!(result.error.as_deref(), Some("Invalid flow configuration"));
    }
}

#[tokio::test]
async fn test_handler_error_degrades_value_instead_of_failing() {
    let flow = chain(NodeSpec::new(NodeType::Tool));
    let result = run(&FlowExecutor::default(), &flow, "x").await;

    assert!(result.success);
    assert_eq!(
        result.output.as_deref(),
        Some("Error in tool: Execution failed: boom!")
    );
}

#[tokio::test]
async fn test_unknown_node_type_passes_value_through() {
    let flow = chain(NodeSpec::new(NodeType::Unknown("translator".into())));
    let result = run(&FlowExecutor::default(), &flow, "bonjour").await;

    assert!(result.success);
    assert_eq!(result.output.as_deref(), Some("bonjour!"));
}

#[tokio::test]
async fn test_cycle_is_rejected_by_default() {
    let mut flow = chain(NodeSpec::new(NodeType::Prompt));
    flow.add_node(NodeSpec::new(NodeType::Prompt).with_id("loop"));
    flow.connect("mid", "loop");
    flow.connect("loop", "mid");

    let result = run(&FlowExecutor::default(), &flow, "x").await;
    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Cyclic dependency detected: mid, loop")
    );
}

#[tokio::test]
async fn test_cycle_is_skipped_when_omission_is_allowed() {
    let mut flow = chain(NodeSpec::new(NodeType::Prompt).with_property("suffix", "?"));
    flow.add_node(NodeSpec::new(NodeType::Prompt).with_id("loop"));
    flow.connect("mid", "loop");
    flow.connect("loop", "mid");

    let executor = FlowExecutor::new(EngineConfig {
        cycle_policy: CyclePolicy::Omit,
        ..EngineConfig::default()
    });
    let result = run(&executor, &flow, "x").await;

    // Only the input node is schedulable; mid, loop and out never run.
    assert!(result.success);
    assert_eq!(result.output.as_deref(), Some("x"));
}

#[tokio::test]
async fn test_trace_records_each_node() {
    let flow = chain(NodeSpec::new(NodeType::Prompt).with_property("suffix", "-b"));
    let executor = FlowExecutor::new(EngineConfig {
        trace_nodes: true,
        ..EngineConfig::default()
    });
    let result = run(&executor, &flow, "a").await;

    let outputs: Vec<(&str, &str)> = result
        .intermediate_results
        .iter()
        .map(|t| (t.node_id.as_str(), t.output.as_str()))
        .collect();
    assert_eq!(outputs, vec![("in", "a"), ("mid", "a-b"), ("out", "a-b!")]);
}

#[tokio::test]
async fn test_parallel_and_conditional_fall_back_to_sequential() {
    let flow = chain(NodeSpec::new(NodeType::Prompt).with_property("suffix", "+"));
    let executor = FlowExecutor::default();
    let registry = test_registry();
    let bus = EventBus::default();

    let mut outputs = Vec::new();
    for mode in [
        ExecutionMode::Sequential,
        ExecutionMode::Parallel,
        ExecutionMode::Conditional,
    ] {
        let result = executor
            .execute_flow(&flow, "v", client(), mode, true, &registry, &bus)
            .await;
        outputs.push(result.output);
    }

    assert!(outputs.iter().all(|o| o.as_deref() == Some("v+!")));
}

#[tokio::test]
async fn test_deadline_turns_into_failed_run() {
    let flow = chain(NodeSpec::new(NodeType::Memory));
    let executor = FlowExecutor::new(EngineConfig {
        max_execution_time: Some(Duration::from_millis(50)),
        ..EngineConfig::default()
    });
    let result = run(&executor, &flow, "x").await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Execution timed out after 0.05s"));
}

#[tokio::test]
async fn test_panicking_handler_fails_the_run() {
    let flow = chain(NodeSpec::new(NodeType::Router));
    let result = run(&FlowExecutor::default(), &flow, "x").await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("handler bug"));
}

#[tokio::test]
async fn test_events_are_emitted_for_run_and_nodes() {
    let flow = chain(NodeSpec::new(NodeType::Prompt));
    let bus = EventBus::new(64);
    let mut events = bus.subscribe();

    FlowExecutor::default()
        .execute_flow(
            &flow,
            "x",
            client(),
            ExecutionMode::Sequential,
            false,
            &test_registry(),
            &bus,
        )
        .await;

    let mut started = Vec::new();
    let mut finished = None;
    while let Ok(event) = events.try_recv() {
        match event {
            ExecutionEvent::NodeStarted { node_id, .. } => started.push(node_id),
            ExecutionEvent::RunCompleted { success, .. } => finished = Some(success),
            _ => {}
        }
    }

    assert_eq!(started, vec!["in", "mid", "out"]);
    assert_eq!(finished, Some(true));
}

#[tokio::test]
async fn test_runtime_records_statistics() {
    let runtime = AgentRuntime::with_registry(
        Arc::new(test_registry()),
        client(),
        RuntimeConfig::default(),
    );

    let good = chain(NodeSpec::new(NodeType::Prompt));
    let bad = Flow::new();

    let ok = runtime.execute(&good, "x", ExecutionMode::Sequential, false).await;
    let failed = runtime.execute(&bad, "x", ExecutionMode::Sequential, false).await;

    let stats = runtime.stats().await;
    assert_eq!(stats.total_runs, 2);
    assert_eq!(stats.successful_runs, 1);
    assert_eq!(stats.failed_runs, 1);
    assert_eq!(stats.execution_history.len(), 2);
    let mean = (ok.response_time + failed.response_time) / 2.0;
    assert!((stats.avg_response_time - mean).abs() < 1e-9);
}

#[tokio::test]
async fn test_runtime_executes_saved_agents() {
    let runtime = AgentRuntime::with_registry(
        Arc::new(test_registry()),
        client(),
        RuntimeConfig::default(),
    );
    let flow = chain(NodeSpec::new(NodeType::Prompt).with_property("suffix", "."));
    let id = runtime
        .save_agent(agentcore::SavedAgent::new("echo", flow))
        .await;

    let result = runtime
        .execute_agent(id, "saved", ExecutionMode::Sequential, false)
        .await
        .unwrap();
    assert_eq!(result.output.as_deref(), Some("saved.!"));

    assert!(runtime.delete_agent(id).await.is_some());
    assert!(runtime
        .execute_agent(id, "saved", ExecutionMode::Sequential, false)
        .await
        .is_err());
}
