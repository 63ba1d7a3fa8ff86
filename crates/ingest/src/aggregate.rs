use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};
use worm_core::error::{Result, WormError};
use worm_core::model::analysis::AnalysisResult;
use worm_core::model::trace::Trace;
use worm_core::stats::{mean, median};
use worm_core::time::seconds_between;

/// Latency samples for `service_name` in one trace: the durations of every
/// span owned by the service's process.
pub fn aggregate_trace(service_name: &str, trace: &Trace) -> Result<Vec<i64>> {
    debug!(
        trace_id = %trace.trace_id,
        spans = trace.spans.len(),
        "analysing trace"
    );
    let process_id = trace
        .process_id_for(service_name)
        .ok_or_else(|| WormError::Attribution {
            trace_id: trace.trace_id.clone(),
            service: service_name.to_string(),
        })?;

    Ok(trace
        .spans
        .iter()
        .filter(|span| span.process_id == process_id)
        .map(|span| span.duration)
        .collect())
}

/// Summary statistics for one service, or `None` when there are no traces.
///
/// Every input trace counts toward `request_count` and contributes its
/// earliest span start as a request timestamp, even when none of its spans
/// can be attributed to the service.
pub fn analyse_traces(service_name: &str, traces: &[Trace]) -> Option<AnalysisResult> {
    if traces.is_empty() {
        return None;
    }

    let mut latencies = Vec::new();
    let mut timestamps: Vec<DateTime<Utc>> = Vec::with_capacity(traces.len());
    for trace in traces {
        match trace.start_time() {
            Some(ts) => timestamps.push(ts),
            None => warn!(trace_id = %trace.trace_id, "trace has no spans"),
        }
        match aggregate_trace(service_name, trace) {
            Ok(samples) => latencies.extend(samples.into_iter().map(|d| d as f64)),
            Err(e) => error!(error = %e, "unable to attribute trace spans"),
        }
    }

    timestamps.sort();
    let gaps: Vec<f64> = timestamps
        .windows(2)
        .map(|pair| seconds_between(pair[0], pair[1]))
        .collect();

    let result = AnalysisResult {
        average_latency: mean(&latencies).unwrap_or(0.0),
        median_latency: median(&latencies).unwrap_or(0.0),
        average_request_time_diff: mean(&gaps).map(f64::abs).unwrap_or(0.0),
        median_request_time_diff: median(&gaps).map(f64::abs).unwrap_or(0.0),
        request_count: traces.len() as u64,
    };
    debug!(
        service = service_name,
        average_latency = result.average_latency,
        median_latency = result.median_latency,
        "analysed service"
    );
    Some(result)
}
