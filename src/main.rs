use clap::Parser;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use water_monitor::args::{Args, Command};
use water_monitor::{commands, Result};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");

    // An in-flight form submission can't be aborted without leaving the
    // portal session in an indeterminate state. Ctrl-C requests cancellation
    // and the retrieval stops before its next batch.
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    // Route to the appropriate command handler
    match args.command() {
        Command::Daily(retrieve_args) => {
            commands::daily(retrieve_args, args.common(), &cancel).await
        }
        Command::Hourly(retrieve_args) => {
            commands::hourly(retrieve_args, args.common(), &cancel).await
        }
        Command::Monitor(monitor_args) => {
            commands::monitor(monitor_args, args.common(), &cancel).await
        }
        Command::Summarize(summarize_args) => commands::summarize(summarize_args).await,
    }
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use the default log level for this
            // crate only.
            EnvFilter::new(format!("water={level},water_monitor={level}"))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
