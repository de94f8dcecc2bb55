use crate::{registry::HandlerRegistry, EngineConfig, FlowExecutor};
use agentcore::{
    ChatClient, EventBus, ExecutionEvent, ExecutionMode, ExecutionResult, ExecutionStats, Flow,
    FlowError, SavedAgent, WorkflowError,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Main runtime bundling the handler registry, the engine, the event bus,
/// run statistics and saved agents
pub struct AgentRuntime {
    registry: Arc<HandlerRegistry>,
    executor: Arc<FlowExecutor>,
    event_bus: Arc<EventBus>,
    client: Arc<dyn ChatClient>,
    stats: StatsStore,
    agents: Arc<RwLock<HashMap<Uuid, SavedAgent>>>,
}

impl AgentRuntime {
    /// Create a runtime with a pre-configured registry
    pub fn with_registry(
        registry: Arc<HandlerRegistry>,
        client: Arc<dyn ChatClient>,
        config: RuntimeConfig,
    ) -> Self {
        let executor = Arc::new(FlowExecutor::new(config.engine));
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));

        Self {
            registry,
            executor,
            event_bus,
            client,
            stats: StatsStore::new(),
            agents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Execute a flow with the runtime's chat client and record the outcome
    pub async fn execute(
        &self,
        flow: &Flow,
        input: &str,
        mode: ExecutionMode,
        stream: bool,
    ) -> ExecutionResult {
        self.execute_with_client(flow, input, self.client.clone(), mode, stream)
            .await
    }

    /// Execute a flow with an explicit chat client and record the outcome
    pub async fn execute_with_client(
        &self,
        flow: &Flow,
        input: &str,
        client: Arc<dyn ChatClient>,
        mode: ExecutionMode,
        stream: bool,
    ) -> ExecutionResult {
        let result = self
            .executor
            .execute_flow(
                flow,
                input,
                client,
                mode,
                stream,
                &self.registry,
                &self.event_bus,
            )
            .await;

        self.stats.record(&result).await;
        result
    }

    /// Save a flow under a name, returning its id
    pub async fn save_agent(&self, agent: SavedAgent) -> Uuid {
        let id = agent.id;
        tracing::info!("Saving agent: {} ({})", agent.name, id);
        self.agents.write().await.insert(id, agent);
        id
    }

    pub async fn get_agent(&self, id: Uuid) -> Option<SavedAgent> {
        self.agents.read().await.get(&id).cloned()
    }

    pub async fn list_agents(&self) -> Vec<SavedAgent> {
        let mut agents: Vec<SavedAgent> = self.agents.read().await.values().cloned().collect();
        agents.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        agents
    }

    pub async fn delete_agent(&self, id: Uuid) -> Option<SavedAgent> {
        self.agents.write().await.remove(&id)
    }

    /// Execute a saved agent by id
    pub async fn execute_agent(
        &self,
        id: Uuid,
        input: &str,
        mode: ExecutionMode,
        stream: bool,
    ) -> Result<ExecutionResult, FlowError> {
        let agent = self
            .get_agent(id)
            .await
            .ok_or_else(|| FlowError::Workflow(WorkflowError::NotFound(id.to_string())))?;

        Ok(self.execute(&agent.canvas_data, input, mode, stream).await)
    }

    /// Snapshot of the statistics recorded so far
    pub async fn stats(&self) -> ExecutionStats {
        self.stats.snapshot().await
    }

    pub fn stats_store(&self) -> &StatsStore {
        &self.stats
    }

    /// Subscribe to execution events
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }
}

/// Shared statistics. Counters, running mean and history truncation are
/// updated under one write lock.
#[derive(Clone, Default)]
pub struct StatsStore {
    inner: Arc<RwLock<ExecutionStats>>,
}

impl StatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, result: &ExecutionResult) {
        self.inner.write().await.record(result);
    }

    pub async fn snapshot(&self) -> ExecutionStats {
        self.inner.read().await.clone()
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub engine: EngineConfig,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            event_buffer_size: 1000,
        }
    }
}
