//! sitedeploy CLI - publish versioned static sites to Azure Blob Storage

use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod args;
mod commands;
mod display;
mod error;
mod exit_codes;
mod logging;

use args::{RequestArgs, StoreArgs};
use error::{CliError, Result};
use logging::LogFormat;

#[derive(Parser)]
#[command(name = "sitedeploy")]
#[command(version)]
#[command(about = "Publish versioned static sites to Azure Blob Storage", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "SITEDEPLOY_LOG_FORMAT")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish the desired version unless it is already live
    Deploy {
        #[command(flatten)]
        request: RequestArgs,

        #[command(flatten)]
        store: StoreArgs,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the version currently published
    Status {
        #[command(flatten)]
        request: RequestArgs,

        #[command(flatten)]
        store: StoreArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reconcile Webapp objects in a Kubernetes cluster
    Controller {
        /// Only watch this namespace
        #[arg(short, long, env = "SITEDEPLOY_NAMESPACE")]
        namespace: Option<String>,

        /// Delay between two passes over the same Webapp
        #[arg(long, default_value = "5m")]
        requeue_interval: String,

        /// Delay before retrying after a failure
        #[arg(long, default_value = "60s")]
        error_backoff: String,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Print the Webapp CustomResourceDefinition as YAML
    Crd,
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Crd = cli.command {
        return commands::crd::run();
    }

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::internal(format!("cannot start async runtime: {}", e)))?;

    match cli.command {
        Commands::Deploy {
            request,
            store,
            json,
        } => runtime.block_on(commands::deploy::run(&request, &store, json)),

        Commands::Status {
            request,
            store,
            json,
        } => runtime.block_on(commands::status::run(&request, &store, json)),

        Commands::Controller {
            namespace,
            requeue_interval,
            error_backoff,
            store,
        } => {
            let config =
                commands::controller::config(namespace, &store, &requeue_interval, &error_backoff)?;
            runtime.block_on(commands::controller::run(config))
        }

        Commands::Crd => commands::crd::run(),
    }
}

fn main() -> ExitCode {
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = e.print();
            return ExitCode::from(code as u8);
        }
    };

    logging::init(cli.debug, cli.log_format);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e.exit_code();
            eprintln!("{:?}", miette::Report::new(e));
            ExitCode::from(code as u8)
        }
    }
}
