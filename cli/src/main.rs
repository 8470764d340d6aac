//! kfwd CLI - Groups of Kubernetes port-forward tunnels
//!
//! Starts the services of a group declared in the grouping file as detached
//! port-forwards, and lists or stops whatever port-forwards are running.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::Context;

#[derive(Parser)]
#[command(name = "kfwd")]
#[command(author, version, about = "Start, list and stop groups of port-forwards")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Grouping file (default: ~/.kfwd/groups.conf)
    #[arg(short, long, global = true, env = "KFWD_CONFIG")]
    config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the services of a group
    Up {
        /// Group name from the grouping file
        group: String,

        /// Only start services whose name starts with this
        prefix: Option<String>,
    },

    /// Stop port-forwards whose service name starts with a prefix
    Stop { prefix: String },

    /// Stop every running port-forward
    StopAll,

    /// List running port-forwards
    #[command(alias = "list")]
    Ls {
        /// Show every process, including wrapper processes, with PIDs
        #[arg(short, long)]
        all: bool,
    },

    /// Show the groups declared in the grouping file
    Groups,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}

/// Exit status for a failed run, taken from the core error when there is one.
fn exit_status(err: &anyhow::Error) -> u8 {
    let code = err
        .downcast_ref::<kfwd_core::Error>()
        .map(kfwd_core::Error::exit_code)
        .unwrap_or(kfwd_core::error::EXIT_FAILURE);
    u8::try_from(code).unwrap_or(1)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Up { group, prefix } => {
            commands::up::run(&ctx, &group, prefix.as_deref()).await?;
        }
        Commands::Stop { prefix } => {
            commands::stop::run(&ctx, &prefix).await?;
        }
        Commands::StopAll => {
            commands::stop::run_all(&ctx).await?;
        }
        Commands::Ls { all } => {
            commands::list::run(&ctx, all, cli.json).await?;
        }
        Commands::Groups => {
            commands::groups::run(&ctx, cli.json).await?;
        }
    }

    Ok(())
}
