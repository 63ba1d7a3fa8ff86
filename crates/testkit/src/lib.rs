use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Value, json};
use worm_core::model::trace::Trace;

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()
}

/// One span as the Jaeger query API encodes it.
pub fn span_json(
    trace_id: &str,
    span_id: &str,
    process_id: &str,
    start: DateTime<Utc>,
    duration: i64,
) -> Value {
    json!({
        "traceID": trace_id,
        "spanID": span_id,
        "flags": 1,
        "operationName": format!("op-{span_id}"),
        "references": [],
        "startTime": start.timestamp_micros(),
        "duration": duration,
        "tags": [{"key": "span.kind", "type": "string", "value": "server"}],
        "logs": [],
        "processID": process_id,
        "warnings": null
    })
}

/// Wire trace where every duration in `durations` belongs to `service`
/// (process `p1`) and one extra 999-unit span belongs to a `downstream`
/// process (`p2`). Spans start 1ms apart from `start`.
pub fn trace_json(
    trace_id: &str,
    service: &str,
    start: DateTime<Utc>,
    durations: &[i64],
) -> Value {
    let mut spans: Vec<Value> = durations
        .iter()
        .enumerate()
        .map(|(i, d)| {
            span_json(
                trace_id,
                &format!("{trace_id}-s{i}"),
                "p1",
                start + Duration::milliseconds(i as i64),
                *d,
            )
        })
        .collect();
    spans.push(span_json(
        trace_id,
        &format!("{trace_id}-downstream"),
        "p2",
        start + Duration::milliseconds(durations.len() as i64),
        999,
    ));

    json!({
        "traceID": trace_id,
        "spans": spans,
        "processes": {
            "p1": {
                "serviceName": service,
                "tags": [{"key": "hostname", "type": "string", "value": format!("{service}-0")}]
            },
            "p2": {"serviceName": "downstream", "tags": []}
        },
        "warnings": null
    })
}

pub fn sample_trace(
    trace_id: &str,
    service: &str,
    start: DateTime<Utc>,
    durations: &[i64],
) -> Trace {
    serde_json::from_value(trace_json(trace_id, service, start, durations)).unwrap()
}

/// Query API response body wrapping `traces` under `data`.
pub fn envelope(traces: Vec<Value>) -> Value {
    json!({
        "data": traces,
        "total": 0,
        "limit": 0,
        "offset": 0,
        "errors": null
    })
}
