use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary statistics for one service over one lookback window.
///
/// Latencies are in the backend's duration unit. Request time diffs are in
/// seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub average_latency: f64,
    pub median_latency: f64,
    pub average_request_time_diff: f64,
    pub median_request_time_diff: f64,
    pub request_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceRecord {
    pub service_name: String,
}

/// A persisted [`AnalysisResult`] as read back from the history table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRow {
    pub id: i64,
    pub service_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: AnalysisResult,
}
