mod cli;
mod db;
mod error;
mod fmt;
mod headers;
mod importer;
mod lookup;
mod mapping;
mod materializer;
mod models;
mod reader;
mod resolver;
mod settings;
mod sink;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli::{AccountsCommands, Cli, Commands, TypesCommands};

fn main() {
    let cli = Cli::parse();
    init_logger(cli.log_level);
    debug!("Log level set to {}", cli.log_level.to_string().to_lowercase());

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Accounts { command } => match command {
            AccountsCommands::Add { name, institution } => cli::accounts::add(&name, institution.as_deref()),
            AccountsCommands::List => cli::accounts::list(),
        },
        Commands::Types { command } => match command {
            TypesCommands::List => cli::types::list(),
        },
        Commands::Inspect { file, mode, reader } => cli::inspect::run(&file, mode, &reader),
        Commands::Import(args) => cli::import::run(&args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// RUST_LOG wins when set; otherwise `level` applies to this crate only.
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
