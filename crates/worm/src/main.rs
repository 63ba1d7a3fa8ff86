mod output;
mod telemetry;

use std::future::Future;
use std::io;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use worm_core::config::Config;
use worm_ingest::jaeger::JaegerClient;
use worm_ingest::scheduler::Scheduler;
use worm_ingest::worker::AnalysisWorker;
use worm_store::Store;

use crate::output::{print_history_human, print_services_human};
use crate::telemetry::{init_cli_tracing, init_run_tracing, shutdown_tracing};

#[derive(Parser, Debug)]
#[command(name = "worm")]
#[command(about = "Periodic Jaeger latency and request-rate analysis worker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run the polling worker (default)")]
    Run {
        #[arg(long, help = "Run a single cycle and exit")]
        once: bool,
    },
    #[command(about = "Manage the monitored service list")]
    Services {
        #[command(subcommand)]
        action: ServicesCommand,
    },
    #[command(about = "Show recent analysis results")]
    History {
        #[arg(long)]
        service: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum ServicesCommand {
    List,
    Add { name: String },
    Remove { name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load().context("load configuration")?;

    match cli.command.unwrap_or(Commands::Run { once: false }) {
        Commands::Run { once } => {
            init_run_tracing(cfg.log_level);
            let result = run_worker(&cfg, once).await;
            shutdown_tracing();
            result
        }
        Commands::Services { action } => {
            init_cli_tracing(cfg.log_level);
            let store = open_store(&cfg)?;
            match action {
                ServicesCommand::List => {
                    let services = store.list_services()?;
                    if cli.json {
                        print_json(&services)?;
                    } else {
                        print_services_human(&services);
                    }
                }
                ServicesCommand::Add { name } => {
                    store.add_service(&name)?;
                    println!("added {name}");
                }
                ServicesCommand::Remove { name } => {
                    if store.remove_service(&name)? {
                        println!("removed {name}");
                    } else {
                        println!("{name} was not registered");
                    }
                }
            }
            Ok(())
        }
        Commands::History { service, limit } => {
            init_cli_tracing(cfg.log_level);
            let store = open_store(&cfg)?;
            let rows = store.recent_analyses(service.as_deref(), limit)?;
            if cli.json {
                print_json(&rows)?;
            } else {
                print_history_human(&rows);
            }
            Ok(())
        }
    }
}

async fn run_worker(cfg: &Config, once: bool) -> anyhow::Result<()> {
    let store = open_store(cfg)?;
    let client = JaegerClient::from_config(cfg).context("build jaeger client")?;
    info!(
        jaeger = client.base_url(),
        db_path = %cfg.db_path.display(),
        interval_secs = cfg.interval.as_secs(),
        lookback_secs = cfg.lookback.as_secs(),
        fail_on_error = cfg.fail_on_error,
        "starting worker"
    );

    let worker =
        AnalysisWorker::new(client, store, cfg.lookback).with_concurrency(cfg.concurrency);
    let mut scheduler = Scheduler::new(cfg.interval, cfg.fail_on_error);
    if once {
        scheduler = scheduler.with_max_cycles(1);
    }

    run_until_shutdown(
        async { scheduler.run(|| worker.run_cycle()).await.context("worker cycle failed") },
        tokio::signal::ctrl_c(),
    )
    .await
}

/// Drives `work` until it finishes or `shutdown` resolves. A shutdown listener
/// that fails to register is an error, not a stop request.
async fn run_until_shutdown<W, S>(work: W, shutdown: S) -> anyhow::Result<()>
where
    W: Future<Output = anyhow::Result<()>>,
    S: Future<Output = io::Result<()>>,
{
    tokio::select! {
        res = work => res,
        signal = shutdown => match signal {
            Ok(()) => {
                info!("shutdown signal received");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "unable to listen for shutdown signal");
                Err(anyhow::Error::new(e).context("listen for shutdown signal"))
            }
        }
    }
}

fn open_store(cfg: &Config) -> anyhow::Result<Store> {
    Store::open(&cfg.db_path)
        .with_context(|| format!("open result store {}", cfg.db_path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["worm"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["worm", "run", "--once"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Run { once: true })));
    }

    #[tokio::test]
    async fn shutdown_signal_stops_worker_cleanly() {
        let shutdown = async { Ok::<(), io::Error>(()) };
        let result = run_until_shutdown(std::future::pending(), shutdown).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn failed_signal_listener_is_an_error() {
        let result = run_until_shutdown(std::future::pending(), async {
            Err::<(), _>(io::Error::other("no signal driver"))
        })
        .await;

        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("no signal driver"), "{err:#}");
    }

    #[tokio::test]
    async fn worker_error_wins_when_it_finishes_first() {
        let result = run_until_shutdown(
            async { Err::<(), _>(anyhow::anyhow!("cycle failed")) },
            std::future::pending(),
        )
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn history_defaults() {
        let cli = Cli::try_parse_from(["worm", "history", "--service", "api"]).unwrap();
        match cli.command {
            Some(Commands::History { service, limit }) => {
                assert_eq!(service.as_deref(), Some("api"));
                assert_eq!(limit, 20);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
