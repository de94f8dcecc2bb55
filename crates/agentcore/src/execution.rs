use crate::{NodeId, NodeType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requested execution strategy. Only `Sequential` has a dedicated strategy;
/// the other modes currently fall back to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,
    Conditional,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Sequential => "sequential",
            ExecutionMode::Parallel => "parallel",
            ExecutionMode::Conditional => "conditional",
        }
    }

    pub fn is_implemented(&self) -> bool {
        matches!(self, ExecutionMode::Sequential)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(ExecutionMode::Sequential),
            "parallel" => Ok(ExecutionMode::Parallel),
            "conditional" => Ok(ExecutionMode::Conditional),
            other => Err(format!("unknown execution mode: {other}")),
        }
    }
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time of the run in seconds.
    pub response_time: f64,
    #[serde(default)]
    pub intermediate_results: Vec<NodeTrace>,
}

impl ExecutionResult {
    pub fn success(output: String, response_time: f64, trace: Vec<NodeTrace>) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
            response_time,
            intermediate_results: trace,
        }
    }

    pub fn failure(error: impl Into<String>, response_time: f64) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            response_time,
            intermediate_results: Vec::new(),
        }
    }
}

/// Output of a single node, captured when tracing is enabled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTrace {
    pub node_id: NodeId,
    pub node_type: NodeType,
    pub output: String,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing_ignores_case() {
        assert_eq!("Parallel".parse::<ExecutionMode>(), Ok(ExecutionMode::Parallel));
        assert!("batch".parse::<ExecutionMode>().is_err());
    }

    #[test]
    fn test_only_sequential_is_implemented() {
        assert!(ExecutionMode::Sequential.is_implemented());
        assert!(!ExecutionMode::Parallel.is_implemented());
        assert!(!ExecutionMode::Conditional.is_implemented());
    }
}
