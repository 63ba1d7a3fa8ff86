use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use tracing::{error, info, warn};
use worm_core::error::{Result, WormError};
use worm_core::model::analysis::{AnalysisResult, ServiceRecord};
use worm_core::model::trace::Trace;
use worm_store::Store;

use crate::aggregate::analyse_traces;
use crate::jaeger::JaegerClient;

/// Where traces come from.
pub trait TraceSource {
    fn fetch_traces(
        &self,
        service_name: &str,
        lookback: Duration,
    ) -> impl Future<Output = Result<Vec<Trace>>>;
}

/// Where the monitored services are read from and results are written to.
pub trait ResultStore {
    fn list_services(&self) -> Result<Vec<ServiceRecord>>;
    fn insert_analysis(&self, service_name: &str, result: &AnalysisResult) -> Result<()>;
}

impl TraceSource for JaegerClient {
    async fn fetch_traces(&self, service_name: &str, lookback: Duration) -> Result<Vec<Trace>> {
        JaegerClient::fetch_traces(self, service_name, lookback).await
    }
}

impl ResultStore for Store {
    fn list_services(&self) -> Result<Vec<ServiceRecord>> {
        Store::list_services(self)
    }

    fn insert_analysis(&self, service_name: &str, result: &AnalysisResult) -> Result<()> {
        Store::insert_analysis(self, service_name, result)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub persisted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Traces handed to the aggregator, keyed by service.
    pub traces_analysed: BTreeMap<String, u64>,
}

impl CycleReport {
    pub fn total_traces_analysed(&self) -> u64 {
        self.traces_analysed.values().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServiceOutcome {
    Persisted,
    NoData,
    FetchFailed,
    StoreFailed,
}

/// One polling cycle: list services, then fetch, aggregate and persist each.
pub struct AnalysisWorker<S, R> {
    source: S,
    store: R,
    lookback: Duration,
    concurrency: usize,
}

impl<S: TraceSource, R: ResultStore> AnalysisWorker<S, R> {
    pub fn new(source: S, store: R, lookback: Duration) -> Self {
        Self {
            source,
            store,
            lookback,
            concurrency: 1,
        }
    }

    /// Services processed at once within a cycle. `1` is sequential.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fails only when the service list cannot be read. Failures for a single
    /// service are logged and counted; the other services still run.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let services = self
            .store
            .list_services()
            .map_err(|e| WormError::Cycle(format!("unable to retrieve services: {e}")))?;
        if services.is_empty() {
            warn!("no services registered for analysis");
        }

        let outcomes: Vec<(String, ServiceOutcome, u64)> = stream::iter(services)
            .map(|service| self.process_service(service.service_name))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = CycleReport::default();
        for (service_name, outcome, traces) in outcomes {
            report.traces_analysed.insert(service_name, traces);
            match outcome {
                ServiceOutcome::Persisted => report.persisted += 1,
                ServiceOutcome::NoData => report.skipped += 1,
                ServiceOutcome::FetchFailed | ServiceOutcome::StoreFailed => report.failed += 1,
            }
        }
        info!(
            persisted = report.persisted,
            skipped = report.skipped,
            failed = report.failed,
            traces_analysed = report.total_traces_analysed(),
            "cycle finished"
        );
        Ok(report)
    }

    async fn process_service(&self, service_name: String) -> (String, ServiceOutcome, u64) {
        info!(service = %service_name, "analysing spans for service");
        let (outcome, traces) = self.analyse_service(&service_name).await;
        (service_name, outcome, traces)
    }

    async fn analyse_service(&self, service_name: &str) -> (ServiceOutcome, u64) {
        let fetched = self.source.fetch_traces(service_name, self.lookback).await;
        let (traces, fetch_failed) = match fetched {
            Ok(traces) => (traces, false),
            Err(e) => {
                error!(service = %service_name, error = %e, "unable to retrieve traces");
                (Vec::new(), true)
            }
        };

        let traces_analysed = traces.len() as u64;
        let Some(result) = analyse_traces(service_name, &traces) else {
            if fetch_failed {
                return (ServiceOutcome::FetchFailed, 0);
            }
            warn!(service = %service_name, "no traces in lookback window; skipping");
            return (ServiceOutcome::NoData, 0);
        };
        info!(service = %service_name, traces_analysed, "traces analysed");

        let outcome = match self.store.insert_analysis(service_name, &result) {
            Ok(()) => ServiceOutcome::Persisted,
            Err(e) => {
                error!(service = %service_name, error = %e, "unable to persist analysis");
                ServiceOutcome::StoreFailed
            }
        };
        (outcome, traces_analysed)
    }
}
