use crate::ExecutionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum number of runs kept in the history.
pub const HISTORY_LIMIT: usize = 100;

/// Aggregate statistics over every run recorded since creation.
///
/// The caller owns this value and feeds it each `ExecutionResult`; nothing is
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStats {
    pub total_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    /// Running mean of response times in seconds.
    pub avg_response_time: f64,
    pub execution_history: VecDeque<ExecutionRecord>,
}

/// One entry of the execution history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub response_time: f64,
    pub error: Option<String>,
}

impl ExecutionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &ExecutionResult) {
        self.add_execution(result.success, result.response_time, result.error.clone());
    }

    pub fn add_execution(&mut self, success: bool, response_time: f64, error: Option<String>) {
        self.total_runs += 1;
        if success {
            self.successful_runs += 1;
        } else {
            self.failed_runs += 1;
        }

        let n = self.total_runs as f64;
        self.avg_response_time = (self.avg_response_time * (n - 1.0) + response_time) / n;

        self.execution_history.push_back(ExecutionRecord {
            timestamp: Utc::now(),
            success,
            response_time,
            error,
        });
        while self.execution_history.len() > HISTORY_LIMIT {
            self.execution_history.pop_front();
        }
    }

    /// Percentage of successful runs, 0 when nothing has run yet.
    pub fn success_rate(&self) -> f64 {
        if self.total_runs == 0 {
            return 0.0;
        }
        self.successful_runs as f64 / self.total_runs as f64 * 100.0
    }
}
