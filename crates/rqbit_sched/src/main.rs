use std::{ops::ControlFlow, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use request_strategy::{
    Input, PieceIndex, PieceRequestOrder, PieceScheduler, PieceState, RequestStrategyStats,
    SchedulerConfig, TransferId, TransferView,
};
use serde::Serialize;
use size_format::SizeFormatterBinary as SF;
use tracing::info;

mod scenario;

use scenario::Scenario;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Parser)]
#[command(version, author, about)]
struct Opts {
    /// The loglevel
    #[arg(value_enum, short = 'v')]
    log_level: Option<LogLevel>,

    /// Path to the JSON scenario describing torrents and their pieces.
    scenario: PathBuf,

    /// Free storage in bytes, shared by all torrents. Overrides the scenario's config.
    #[arg(long = "storage-capacity")]
    storage_capacity: Option<u64>,

    /// Max bytes admitted per round across all torrents, 0 for no limit.
    /// Overrides the scenario's config.
    #[arg(long = "max-unverified-bytes")]
    max_unverified_bytes: Option<u64>,

    /// Stop after this many pieces.
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Print admitted pieces as JSON.
    #[arg(long)]
    json: bool,

    /// Print scheduler counters after the round.
    #[arg(long)]
    stats: bool,
}

#[derive(Serialize)]
struct AdmittedPiece {
    info_hash: TransferId,
    index: PieceIndex,
    length: u64,
    #[serde(flatten)]
    state: PieceState,
}

fn init_logging(opts: &Opts) {
    let default_rust_log = match opts.log_level.as_ref() {
        Some(level) => match level {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        },
        None => "warn",
    };
    let stderr_filter = match std::env::var("RUST_LOG").ok() {
        Some(rust_log) => EnvFilter::builder()
            .parse(&rust_log)
            .expect("can't parse RUST_LOG"),
        None => EnvFilter::builder()
            .parse(default_rust_log)
            .expect("can't parse default_rust_log"),
    };

    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(stderr_filter)
        .init();
}

fn effective_config(opts: &Opts, scenario: &Scenario) -> SchedulerConfig {
    let mut config = scenario.config;
    if let Some(c) = opts.storage_capacity {
        config.storage_capacity = Some(c);
    }
    if let Some(m) = opts.max_unverified_bytes {
        config.max_unverified_bytes = m;
    }
    config
}

/// Runs one round, stopping early once `limit` pieces were admitted.
fn admit_pieces<I: Input>(
    scheduler: &PieceScheduler,
    order: &PieceRequestOrder,
    input: &I,
    limit: Option<usize>,
) -> Vec<AdmittedPiece> {
    let mut admitted = Vec::new();
    scheduler.schedule_round(order, input, |info_hash, index, state| {
        // Every transfer in the order was added to the input by Scenario::build.
        let length = input
            .transfer(&info_hash)
            .map(|t| t.piece_length())
            .unwrap_or_default();
        admitted.push(AdmittedPiece {
            info_hash,
            index,
            length,
            state,
        });
        match limit {
            Some(limit) if admitted.len() >= limit => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    });
    admitted
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    init_logging(&opts);

    let scenario = Scenario::load(&opts.scenario)?;
    let config = effective_config(&opts, &scenario);
    info!(?config, transfers = scenario.transfers.len(), "loaded scenario");

    let stats = RequestStrategyStats::new();
    let mut order = PieceRequestOrder::new(stats.order.clone());
    let input = scenario
        .build(&config, &mut order)
        .context("invalid scenario")?;
    let scheduler = PieceScheduler::new(Arc::clone(&stats.scheduler));

    let admitted = admit_pieces(&scheduler, &order, &input, opts.limit);

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&admitted)?);
    } else {
        for p in admitted.iter() {
            println!(
                "{} piece={} priority={} partial={} availability={} size={}",
                p.info_hash,
                p.index,
                p.state.priority,
                p.state.partial,
                p.state.availability,
                SF::new(p.length),
            );
        }
        let total: u64 = admitted.iter().map(|p| p.length).sum();
        println!(
            "{} of {} pieces admitted, {}",
            admitted.len(),
            order.len(),
            SF::new(total)
        );
    }

    if opts.stats {
        println!("{}", serde_json::to_string_pretty(&stats.snapshot())?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use request_strategy::{InMemoryInput, InMemoryTransfer, PieceKey, PiecePriority};

    use super::*;

    fn parse(args: &[&str]) -> Opts {
        Opts::try_parse_from(std::iter::once("rqbit-sched").chain(args.iter().copied())).unwrap()
    }

    fn scenario(config: &str) -> Scenario {
        serde_json::from_str(&format!(r#"{{"config": {config}, "transfers": []}}"#)).unwrap()
    }

    #[test]
    fn test_effective_config_overrides() {
        let s = scenario(r#"{"storage_capacity": 100, "max_unverified_bytes": 7}"#);

        let config = effective_config(&parse(&["s.json"]), &s);
        assert_eq!(config.storage_capacity, Some(100));
        assert_eq!(config.max_unverified_bytes, 7);

        let opts = parse(&[
            "s.json",
            "--storage-capacity",
            "5",
            "--max-unverified-bytes",
            "0",
        ]);
        let config = effective_config(&opts, &s);
        assert_eq!(config.storage_capacity, Some(5));
        assert_eq!(config.max_unverified_bytes, 0);
    }

    #[test]
    fn test_limit_stops_round() {
        let info_hash = TransferId::new([1; 20]);
        let mut input = InMemoryInput::default();
        input.add_transfer(info_hash, InMemoryTransfer::new(16)).unwrap();
        let mut order = PieceRequestOrder::default();
        for index in 0..5 {
            order.upsert(
                PieceKey::new(info_hash, index),
                PieceState {
                    priority: PiecePriority::Normal,
                    partial: false,
                    availability: 0,
                },
            );
        }

        let stats = RequestStrategyStats::new();
        let scheduler = PieceScheduler::new(stats.scheduler.clone());
        let opts = parse(&["s.json", "-n", "2"]);
        let admitted = admit_pieces(&scheduler, &order, &input, opts.limit);
        assert_eq!(admitted.iter().map(|p| p.index).collect::<Vec<_>>(), vec![0, 1]);
        assert!(admitted.iter().all(|p| p.length == 16));
        assert_eq!(stats.snapshot().scheduler.sink_stops, 1);

        assert_eq!(admit_pieces(&scheduler, &order, &input, None).len(), 5);
    }
}
