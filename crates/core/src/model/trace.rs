//! Jaeger query API trace model.
//!
//! Field renames follow the Jaeger JSON wire format and must not change.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub key: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Process {
    #[serde(rename = "serviceName")]
    pub service_name: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Span {
    #[serde(rename = "traceID")]
    pub trace_id: String,
    #[serde(rename = "spanID")]
    pub span_id: String,
    #[serde(default)]
    pub flags: u32,
    #[serde(rename = "operationName")]
    pub operation_name: String,
    #[serde(default)]
    pub references: Vec<Value>,
    #[serde(rename = "startTime", with = "crate::time::unix_micros")]
    pub start_time: DateTime<Utc>,
    pub duration: i64,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub logs: Vec<Value>,
    #[serde(rename = "processID")]
    pub process_id: String,
    #[serde(default)]
    pub warnings: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trace {
    #[serde(rename = "traceID")]
    pub trace_id: String,
    pub spans: Vec<Span>,
    pub processes: BTreeMap<String, Process>,
    #[serde(default)]
    pub warnings: Option<Value>,
}

impl Trace {
    /// First process id (in key order) whose service name matches.
    pub fn process_id_for(&self, service_name: &str) -> Option<&str> {
        self.processes
            .iter()
            .find(|(_, process)| process.service_name == service_name)
            .map(|(id, _)| id.as_str())
    }

    /// Earliest span start, i.e. when the traced request began.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.spans.iter().map(|span| span.start_time).min()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn wire_trace() -> Value {
        json!({
            "traceID": "4bf92f3577b34da6",
            "spans": [
                {
                    "traceID": "4bf92f3577b34da6",
                    "spanID": "00f067aa0ba902b7",
                    "flags": 1,
                    "operationName": "GET /orders",
                    "references": [],
                    "startTime": 1_769_904_000_000_123i64,
                    "duration": 1800,
                    "tags": [{"key": "http.status_code", "type": "int64", "value": 200}],
                    "logs": [],
                    "processID": "p1",
                    "warnings": null
                },
                {
                    "traceID": "4bf92f3577b34da6",
                    "spanID": "a1b2c3d4e5f60718",
                    "flags": 1,
                    "operationName": "cache.get",
                    "references": [{"refType": "CHILD_OF", "traceID": "4bf92f3577b34da6", "spanID": "00f067aa0ba902b7"}],
                    "startTime": 1_769_904_000_000_900i64,
                    "duration": 700,
                    "tags": [],
                    "logs": [],
                    "processID": "p2",
                    "warnings": null
                }
            ],
            "processes": {
                "p1": {"serviceName": "api", "tags": [{"key": "hostname", "type": "string", "value": "api-0"}]},
                "p2": {"serviceName": "redis", "tags": []}
            },
            "warnings": null
        })
    }

    #[test]
    fn decodes_wire_names() {
        let trace: Trace = serde_json::from_value(wire_trace()).unwrap();
        assert_eq!(trace.trace_id, "4bf92f3577b34da6");
        assert_eq!(trace.spans.len(), 2);

        let root = &trace.spans[0];
        assert_eq!(root.trace_id, "4bf92f3577b34da6");
        assert_eq!(root.span_id, "00f067aa0ba902b7");
        assert_eq!(root.process_id, "p1");
        assert_eq!(root.operation_name, "GET /orders");
        assert_eq!(root.duration, 1800);
        assert_eq!(root.start_time.timestamp_micros(), 1_769_904_000_000_123);
        assert_eq!(root.tags[0].value_type, "int64");
        assert_eq!(trace.processes["p1"].service_name, "api");
    }

    #[test]
    fn reencodes_with_wire_names() {
        let trace: Trace = serde_json::from_value(wire_trace()).unwrap();
        let encoded = serde_json::to_value(&trace).unwrap();
        assert_eq!(encoded["traceID"], "4bf92f3577b34da6");
        assert_eq!(encoded["spans"][0]["spanID"], "00f067aa0ba902b7");
        assert_eq!(encoded["spans"][0]["processID"], "p1");
        assert_eq!(encoded["spans"][0]["startTime"], 1_769_904_000_000_123i64);
        assert_eq!(encoded["processes"]["p2"]["serviceName"], "redis");

        let decoded: Trace = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, trace);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let mut raw = wire_trace();
        raw["spans"][0].as_object_mut().unwrap().remove("processID");
        assert!(serde_json::from_value::<Trace>(raw).is_err());
    }

    #[test]
    fn resolves_process_and_start_time() {
        let trace: Trace = serde_json::from_value(wire_trace()).unwrap();
        assert_eq!(trace.process_id_for("redis"), Some("p2"));
        assert_eq!(trace.process_id_for("billing"), None);

        let expected = DateTime::from_timestamp_micros(1_769_904_000_000_123).unwrap();
        assert_eq!(trace.start_time(), Some(expected));
    }
}
