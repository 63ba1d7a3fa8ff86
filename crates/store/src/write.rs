use chrono::Utc;
use duckdb::params;
use tracing::debug;
use worm_core::error::{Result, WormError};
use worm_core::model::analysis::AnalysisResult;

use crate::Store;

impl Store {
    /// Appends one row to `analysis_results`. Earlier rows are never touched.
    pub fn insert_analysis(&self, service_name: &str, result: &AnalysisResult) -> Result<()> {
        self.with_connection(|conn| {
            let tx = conn
                .transaction()
                .map_err(|e| WormError::Store(format!("begin tx failed: {e}")))?;

            tx.execute(
                "INSERT INTO analysis_results
                 (id, service_name, average_latency, median_latency,
                  average_request_time_diff, median_request_time_diff, request_count, created_at)
                 VALUES (nextval('analysis_id_seq'), ?, ?, ?, ?, ?, ?, ?)",
                params![
                    service_name,
                    result.average_latency,
                    result.median_latency,
                    result.average_request_time_diff,
                    result.median_request_time_diff,
                    result.request_count as i64,
                    Utc::now().naive_utc(),
                ],
            )
            .map_err(|e| WormError::Store(format!("insert analysis failed: {e}")))?;

            tx.commit()
                .map_err(|e| WormError::Store(format!("commit analysis failed: {e}")))?;
            debug!(service = service_name, "analysis row appended");
            Ok(())
        })
    }

    /// Registers a service for monitoring. Adding a known service is a no-op.
    pub fn add_service(&self, service_name: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO services (service_name) VALUES (?) ON CONFLICT DO NOTHING",
                params![service_name],
            )
            .map(|_| ())
            .map_err(|e| WormError::Store(format!("insert service failed: {e}")))
        })
    }

    /// Returns whether a row was removed. Analysis history is kept.
    pub fn remove_service(&self, service_name: &str) -> Result<bool> {
        self.with_connection(|conn| {
            conn.execute(
                "DELETE FROM services WHERE service_name = ?",
                params![service_name],
            )
            .map(|n| n > 0)
            .map_err(|e| WormError::Store(format!("delete service failed: {e}")))
        })
    }
}
