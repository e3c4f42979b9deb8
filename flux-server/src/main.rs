//! Flux Financial - demo bank server and admin CLI

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod api;
mod commands;
mod output;

use commands::{generate, init, serve, status};

/// Flux Financial - a demo bank backed by a spreadsheet
#[derive(Parser)]
#[command(name = "flux", version, about, long_about = None)]
struct Cli {
    /// Directory holding settings.json and the local workbook
    #[arg(long, global = true, env = "FLUX_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and serve the frontend
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        /// Directory with index.html and user/ pages
        #[arg(long)]
        static_dir: Option<PathBuf>,
        /// Keep all data in memory (nothing is saved)
        #[arg(long)]
        memory: bool,
    },

    /// Create an empty local workbook and settings file
    Init {
        /// Overwrite an existing workbook
        #[arg(long, short)]
        force: bool,
    },

    /// Show storage backend and record counts
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a synthetic labelled activity dataset as CSV
    Generate {
        /// Number of activity rows
        #[arg(long, default_value_t = flux_core::services::generator::DEFAULT_ROWS)]
        rows: usize,
        /// Number of distinct users
        #[arg(long, default_value_t = flux_core::services::generator::DEFAULT_USERS)]
        users: usize,
        /// RNG seed
        #[arg(long, default_value_t = flux_core::services::generator::DEFAULT_SEED)]
        seed: u64,
        /// Output CSV path
        #[arg(long, short, default_value = "banking_activity_logs.csv")]
        output: PathBuf,
        /// Output summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let data_dir = commands::get_data_dir(cli.data_dir);
    match cli.command {
        Commands::Serve { host, port, static_dir, memory } => serve::run(
            &data_dir,
            serve::ServeOptions {
                host,
                port,
                static_dir,
                memory,
            },
        ),
        Commands::Init { force } => init::run(&data_dir, force),
        Commands::Status { json } => status::run(&data_dir, json),
        Commands::Generate { rows, users, seed, output, json } => {
            generate::run(rows, users, seed, &output, json)
        }
    }
}
