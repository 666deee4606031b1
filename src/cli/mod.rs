pub mod accounts;
pub mod import;
pub mod init;
pub mod inspect;
pub mod types;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

use crate::error::{ImportError, Result};
use crate::headers::HeaderIndex;
use crate::models::LayoutMode;

/// Parse a column reference: `#N` is a zero-based index, an empty string is
/// unset (-1), anything else is a header name.
pub(crate) fn parse_column(spec: &str, headers: &HeaderIndex) -> Result<i64> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Ok(-1);
    }
    if let Some(n) = spec.strip_prefix('#') {
        return n
            .parse::<usize>()
            .map(|i| i as i64)
            .map_err(|_| ImportError::Other(format!("Bad column index: {spec}")));
    }
    headers
        .position(spec)
        .map(|i| i as i64)
        .ok_or_else(|| ImportError::Other(format!("No column named '{spec}' in the header row")))
}

#[derive(Parser)]
#[command(name = "budget", about = "Import bank exports into a personal budget ledger.")]
pub struct Cli {
    /// Log level when RUST_LOG is unset: off, error, warn, info, debug, trace
    #[arg(long = "log-level", global = true, default_value_t = LevelFilter::WARN)]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for budget data (default: ~/Documents/budget)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Manage transaction types.
    Types {
        #[command(subcommand)]
        command: TypesCommands,
    },
    /// Show how the columns of a file would map onto transactions.
    Inspect {
        /// Path to the delimited file
        file: String,
        /// Layout mode: single or combined
        #[arg(long, default_value = "single")]
        mode: LayoutMode,
        #[command(flatten)]
        reader: ReaderArgs,
    },
    /// Import a delimited file into the ledger.
    Import(ImportArgs),
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add a new account.
    Add {
        /// Account name, e.g. 'Joint Checking'
        name: String,
        /// Institution name
        #[arg(long)]
        institution: Option<String>,
    },
    /// List all accounts.
    List,
}

#[derive(Subcommand)]
pub enum TypesCommands {
    /// List transaction types and whether they count as income or spend.
    List,
}

#[derive(Args, Clone, Debug, Default)]
pub struct ReaderArgs {
    /// Leading lines to skip; the last skipped line is the header (default from settings)
    #[arg(long = "skip-lines")]
    pub skip_lines: Option<usize>,
    /// Field delimiter (default from settings)
    #[arg(long)]
    pub delimiter: Option<char>,
}

#[derive(Args, Clone, Debug)]
pub struct ImportArgs {
    /// Path to the delimited file
    pub file: String,
    /// Layout mode: single or combined (default: from --session, else single)
    #[arg(long)]
    pub mode: Option<LayoutMode>,
    /// Account name or id every imported transaction belongs to
    #[arg(long)]
    pub account: Option<String>,
    /// Transaction type (name or id) for income
    #[arg(long = "income-type")]
    pub income_type: Option<String>,
    /// Transaction type (name or id) for spending
    #[arg(long = "spend-type")]
    pub spend_type: Option<String>,
    /// Map a field to a column: FIELD=HEADER or FIELD=#INDEX (repeatable)
    #[arg(long = "map", value_name = "FIELD=COLUMN")]
    pub map: Vec<String>,
    /// Column holding income amounts (combined mode)
    #[arg(long = "income-column")]
    pub income_column: Option<String>,
    /// Column holding spend amounts (combined mode)
    #[arg(long = "spend-column")]
    pub spend_column: Option<String>,
    /// JSON file with layout_mode and field_selections
    #[arg(long)]
    pub session: Option<String>,
    /// Show the transactions that would be imported without saving them
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    #[command(flatten)]
    pub reader: ReaderArgs,
}
