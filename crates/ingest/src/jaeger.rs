use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};
use worm_core::config::Config;
use worm_core::error::{Result, WormError};
use worm_core::model::trace::Trace;
use worm_core::time::format_lookback;

/// Client for the Jaeger query API (`GET /api/traces`).
#[derive(Debug, Clone)]
pub struct JaegerClient {
    base_url: String,
    client: Client,
}

impl JaegerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WormError::Internal(format!("failed to build http client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(&cfg.jaeger_query_url, cfg.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Traces for `service_name` started within `lookback`.
    ///
    /// Transport failures and non-success statuses are [`WormError::Fetch`];
    /// a body without a `data` array is [`WormError::MalformedResponse`].
    pub async fn fetch_traces(&self, service_name: &str, lookback: Duration) -> Result<Vec<Trace>> {
        let url = format!("{}/api/traces", self.base_url);
        let since = format_lookback(lookback);
        debug!(service = service_name, since = %since, "retrieving jaeger traces");

        let response = self
            .client
            .get(&url)
            .query(&[("service", service_name), ("since", since.as_str())])
            .send()
            .await
            .map_err(|e| WormError::Fetch(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WormError::Fetch(format!(
                "jaeger query returned {status} for service {service_name}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| WormError::MalformedResponse(format!("body is not json: {e}")))?;
        parse_traces(body)
    }
}

/// Extracts traces from a query API envelope, dropping elements that do not
/// decode.
pub fn parse_traces(body: Value) -> Result<Vec<Trace>> {
    let data = match body {
        Value::Object(mut map) => map.remove("data"),
        _ => None,
    };
    let Some(Value::Array(items)) = data else {
        return Err(WormError::MalformedResponse(
            "missing or null data field".to_string(),
        ));
    };

    let mut traces = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Trace>(item) {
            Ok(trace) => traces.push(trace),
            Err(e) => {
                let err = WormError::Validation(format!("trace at index {index}: {e}"));
                error!(error = %err, "dropping invalid trace");
            }
        }
    }
    Ok(traces)
}
