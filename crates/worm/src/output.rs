use chrono::SecondsFormat;
use worm_core::model::analysis::{AnalysisRow, ServiceRecord};

pub fn print_services_human(services: &[ServiceRecord]) {
    for service in services {
        println!("{}", service.service_name);
    }
    println!("-- {} services --", services.len());
}

pub fn print_history_human(rows: &[AnalysisRow]) {
    for row in rows {
        println!(
            "{} {} requests={} latency.avg={:.2} latency.p50={:.2} gap.avg={:.3}s gap.p50={:.3}s",
            row.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            row.service_name,
            row.result.request_count,
            row.result.average_latency,
            row.result.median_latency,
            row.result.average_request_time_diff,
            row.result.median_request_time_diff,
        );
    }
    println!("-- {} rows --", rows.len());
}
