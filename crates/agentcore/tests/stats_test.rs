// crates/agentcore/tests/stats_test.rs

use agentcore::{ExecutionResult, ExecutionStats, HISTORY_LIMIT};

#[test]
fn test_one_success_and_one_failure() {
    let mut stats = ExecutionStats::new();

    stats.record(&ExecutionResult::success("ok".into(), 1.5, Vec::new()));
    stats.record(&ExecutionResult::failure("Invalid flow configuration", 0.5));

    assert_eq!(stats.total_runs, 2);
    assert_eq!(stats.successful_runs, 1);
    assert_eq!(stats.failed_runs, 1);
    assert!((stats.avg_response_time - 1.0).abs() < 1e-12);
    assert_eq!(stats.execution_history.len(), 2);

    let last = stats.execution_history.back().unwrap();
    assert!(!last.success);
    assert_eq!(last.error.as_deref(), Some("Invalid flow configuration"));
    assert_eq!(stats.success_rate(), 50.0);
}

#[test]
fn test_running_mean_matches_arithmetic_mean() {
    let mut stats = ExecutionStats::new();
    let times = [0.2, 0.4, 1.1, 3.0, 0.05];
    for t in times {
        stats.add_execution(true, t, None);
    }

    let mean = times.iter().sum::<f64>() / times.len() as f64;
    assert!((stats.avg_response_time - mean).abs() < 1e-12);
}

#[test]
fn test_history_keeps_most_recent_hundred() {
    let mut stats = ExecutionStats::new();
    for i in 0..(HISTORY_LIMIT + 25) {
        stats.add_execution(i % 2 == 0, i as f64, None);
    }

    assert_eq!(stats.total_runs as usize, HISTORY_LIMIT + 25);
    assert_eq!(stats.execution_history.len(), HISTORY_LIMIT);
    // Oldest entries were evicted first.
    assert_eq!(stats.execution_history.front().unwrap().response_time, 25.0);
    assert_eq!(
        stats.execution_history.back().unwrap().response_time,
        (HISTORY_LIMIT + 24) as f64
    );
}

#[test]
fn test_empty_stats() {
    let stats = ExecutionStats::default();
    assert_eq!(stats.success_rate(), 0.0);
    assert_eq!(stats.avg_response_time, 0.0);
    assert!(stats.execution_history.is_empty());
}

#[test]
fn test_stats_serialize_for_export() {
    let mut stats = ExecutionStats::new();
    stats.add_execution(false, 0.25, Some("boom".into()));

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["total_runs"], 1);
    assert_eq!(json["execution_history"][0]["error"], "boom");
}
