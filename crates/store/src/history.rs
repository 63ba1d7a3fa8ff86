use chrono::NaiveDateTime;
use duckdb::params_from_iter;
use duckdb::types::Value;
use worm_core::error::{Result, WormError};
use worm_core::model::analysis::{AnalysisResult, AnalysisRow};

use crate::Store;

impl Store {
    /// Most recent analysis rows first, optionally for one service.
    pub fn recent_analyses(&self, service: Option<&str>, limit: usize) -> Result<Vec<AnalysisRow>> {
        let mut sql = String::from(
            "SELECT id, service_name, created_at, average_latency, median_latency,
                    average_request_time_diff, median_request_time_diff, request_count
             FROM analysis_results",
        );
        let mut args: Vec<Value> = Vec::new();
        if let Some(service) = service {
            sql.push_str(" WHERE service_name = ?");
            args.push(Value::Text(service.to_string()));
        }
        sql.push_str(" ORDER BY id DESC LIMIT ?");
        args.push(Value::BigInt(limit as i64));

        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| WormError::Store(format!("prepare history query failed: {e}")))?;
            let rows = stmt
                .query_map(params_from_iter(args.iter()), |row| {
                    let created_at: NaiveDateTime = row.get(2)?;
                    Ok(AnalysisRow {
                        id: row.get(0)?,
                        service_name: row.get(1)?,
                        created_at: created_at.and_utc(),
                        result: AnalysisResult {
                            average_latency: row.get(3)?,
                            median_latency: row.get(4)?,
                            average_request_time_diff: row.get(5)?,
                            median_request_time_diff: row.get(6)?,
                            request_count: row.get::<_, i64>(7)? as u64,
                        },
                    })
                })
                .map_err(|e| WormError::Store(format!("history query failed: {e}")))?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| WormError::Store(format!("read history row failed: {e}")))
        })
    }
}
