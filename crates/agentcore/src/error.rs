use thiserror::Error;

/// Top-level failure of a run. Anything reaching the engine boundary as a
/// `FlowError` marks the run as failed.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Invalid flow configuration")]
    InvalidFlow,

    #[error("Cyclic dependency detected: {}", nodes.join(", "))]
    CyclicGraph { nodes: Vec<String> },

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Execution timed out after {seconds}s")]
    Timeout { seconds: f64 },

    #[error("Execution error: {0}")]
    Execution(String),
}

/// Failure inside a single node handler. The dispatch layer turns these into
/// the node's output string instead of aborting the run.
#[derive(Error, Debug, Clone)]
pub enum NodeError {
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("{0}")]
    Client(#[from] ClientError),
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Agent not found: {0}")]
    NotFound(String),
}

/// Errors surfaced by a chat-completion client.
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No scripted response left")]
    Exhausted,
}
