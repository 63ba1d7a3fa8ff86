pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS services (
  service_name TEXT PRIMARY KEY
);

CREATE SEQUENCE IF NOT EXISTS analysis_id_seq;

CREATE TABLE IF NOT EXISTS analysis_results (
  id BIGINT PRIMARY KEY,
  service_name TEXT NOT NULL,
  average_latency DOUBLE NOT NULL,
  median_latency DOUBLE NOT NULL,
  average_request_time_diff DOUBLE NOT NULL,
  median_request_time_diff DOUBLE NOT NULL,
  request_count BIGINT NOT NULL,
  created_at TIMESTAMP NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_analysis_service_created ON analysis_results(service_name, created_at);
"#;
