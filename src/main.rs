// statusmesh binary - CLI entry point for the exchange agent
//
// The external timer (cron on the lab nodes) invokes `statusmesh cycle`;
// everything else is layout setup and read-only views over the stores and
// the ledger. Outcomes surface through logs and the exit status only.

use clap::{Parser, Subcommand};
use statusmesh::artifact::{ExchangeLayout, ExchangeSnapshot, ReceivedStore, SentStore};
use statusmesh::config::MeshConfig;
use statusmesh::exchange::{ExchangeScheduler, FanOutSelector};
use statusmesh::ledger::{summarize, HistoryLedger};
use statusmesh::membership::NodeName;
use statusmesh::transport::{LocalTransport, ScpTransport, SecureTransport};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "statusmesh", about = "Status-report exchange agent", version)]
struct Cli {
    /// Path to the mesh configuration file
    #[arg(short, long, default_value = "/etc/statusmesh.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the exchange directory layout
    Init,

    /// Run one exchange cycle (what the external timer invokes)
    Cycle {
        /// This node's identity in the roster
        #[arg(long)]
        node: String,

        /// Seed the target selector for a deterministic run
        #[arg(long)]
        seed: Option<u64>,

        /// Deliver into a local directory tree instead of scp
        #[arg(long, value_name = "DIR")]
        local_net: Option<PathBuf>,
    },

    /// Summarize received artifacts and store counts
    Report,

    /// Show recent ledger rows
    History {
        /// Maximum number of rows to show, newest last
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match MeshConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("statusmesh: {e}");
            return ExitCode::FAILURE;
        }
    };

    let layout = ExchangeLayout::new(&config.exchange_root);
    init_tracing(&layout);

    match run(cli.command, config, layout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    command: Command,
    config: MeshConfig,
    layout: ExchangeLayout,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Init => {
            layout.ensure()?;
            println!("created layout under {}", layout.root().display());
        }

        Command::Cycle { node, seed, local_net } => {
            let node = NodeName::new(&node)?;
            layout.ensure()?;

            let roster = config.roster()?;
            let transport: Box<dyn SecureTransport> = match local_net {
                Some(dir) => Box::new(LocalTransport::new(dir)),
                None => Box::new(ScpTransport::new(config.scp_config())),
            };

            let mut scheduler = ExchangeScheduler::new(node, roster, layout, transport);
            if let Some(seed) = seed {
                scheduler = scheduler.with_selector(Box::new(FanOutSelector::with_seed(seed)));
            }
            scheduler.run_cycle().await?;
        }

        Command::Report => {
            let sent = SentStore::new(layout.sent_dir());
            let received = ReceivedStore::new(layout.received_dir());

            let summary = summarize(&received)?;
            print!("{summary}");
            for (sender, count) in summary.per_sender() {
                println!("  from {sender}: {count}");
            }

            let snapshot = ExchangeSnapshot::take(&sent, &received)?;
            println!("Sent: {}  Received: {}", snapshot.sent, snapshot.received);
        }

        Command::History { limit } => {
            let ledger = HistoryLedger::new(layout.history_file());
            let records = ledger.read_records()?;

            let start = records.len().saturating_sub(limit);
            for record in &records[start..] {
                println!(
                    "{}  {:<8} {} -> {}  {}  {}",
                    record.timestamp().format("%Y-%m-%d %H:%M:%S"),
                    record.action().to_string(),
                    record.hostname(),
                    record.target(),
                    record.file(),
                    record.status()
                );
            }
        }
    }
    Ok(())
}

/// Route tracing output to stderr and, when the layout exists, to the
/// free-text operational log
fn init_tracing(layout: &ExchangeLayout) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    match open_operational_log(layout) {
        Some(file) => {
            let file_layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(file));
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
        }
    }
}

fn open_operational_log(layout: &ExchangeLayout) -> Option<std::fs::File> {
    std::fs::create_dir_all(layout.logs_dir()).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(layout.exchange_log_file())
        .ok()
}
