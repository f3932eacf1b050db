mod batch_cmd;
mod config;
mod host;
mod pending_cmd;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tabsum_core::{ConfirmationSignal, Scope};

#[derive(Parser)]
#[command(name = "tabsum", about = "Open a summarizer for every tab in a window or selection")]
struct Cli {
    /// Config file (default: ~/.config/tabsum/tabsum.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pending batch store (default: ~/.local/share/tabsum/pending.db)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open + summarize tabs of the trigger tab's window
    Open {
        /// JSON array of tab records for the current browser state
        #[arg(long)]
        tabs: PathBuf,

        /// Id of the tab the command was triggered from
        #[arg(long)]
        trigger: i64,

        /// all | selected
        #[arg(long, default_value = "all")]
        scope: Scope,
    },

    /// Confirm a staged batch
    Run {
        token: String,

        /// Current tab snapshot used to re-check staged tabs
        #[arg(long)]
        tabs: PathBuf,
    },

    /// Cancel a staged batch
    Cancel { token: String },

    /// Deliver a raw decision message ({"action": ..., "token": ...})
    Message {
        json: String,

        /// Current tab snapshot, required for run messages
        #[arg(long)]
        tabs: Option<PathBuf>,
    },

    /// Inspect or clean up staged batches
    Pending {
        #[command(subcommand)]
        action: PendingAction,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Subcommand)]
enum PendingAction {
    /// List staged batches, oldest first
    List,
    /// Discard batches older than the TTL
    Sweep {
        /// Override batch.pending_ttl_secs
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = config::load_config(cli.config.as_deref())?;
    let store = batch_cmd::resolve_store_path(cli.store.as_deref())?;

    match cli.command {
        Commands::Open {
            tabs,
            trigger,
            scope,
        } => batch_cmd::run_open(&cfg, &store, &tabs, trigger, scope).await,
        Commands::Run { token, tabs } => {
            batch_cmd::run_signal(&cfg, &store, Some(&tabs), ConfirmationSignal::Run(token)).await
        }
        Commands::Cancel { token } => {
            batch_cmd::run_signal(&cfg, &store, None, ConfirmationSignal::Cancel(token)).await
        }
        Commands::Message { json, tabs } => {
            let message = batch_cmd::parse_message(&json)?;
            batch_cmd::run_message(&cfg, &store, tabs.as_deref(), &message).await
        }
        Commands::Pending { action } => match action {
            PendingAction::List => pending_cmd::list_pending(&store).await,
            PendingAction::Sweep { ttl_secs } => {
                pending_cmd::sweep_pending(&cfg, &store, ttl_secs).await
            }
        },
        Commands::Config => config::show_config(&cfg),
    }
}
