use std::path::{Path, PathBuf};

use comfy_table::{Cell, Table};
use rusqlite::Connection;
use tracing::debug;

use crate::cli::{parse_column, ImportArgs};
use crate::db::{find_account, find_transaction_type, get_connection};
use crate::error::{ImportError, Result};
use crate::fmt::money;
use crate::headers::HeaderIndex;
use crate::importer::{compute_checksum, import_file, inspect};
use crate::mapping::{Selection, SessionInput};
use crate::models::{
    TransactionDraft, FIELD_ACCOUNT, FIELD_AMOUNT, FIELD_DATE, FIELD_DESCRIPTION, FIELD_TRANSACTION_TYPE,
    FIELD_VENDOR,
};
use crate::settings::load_settings;
use crate::sink::{PreviewSink, SqliteSink};

pub fn run(args: &ImportArgs) -> Result<()> {
    let settings = load_settings()?;
    let options = settings.reader_options(args.reader.skip_lines, args.reader.delimiter)?;
    let file_path = PathBuf::from(&args.file);
    let conn = get_connection(&settings.db_path())?;

    let mut input = match &args.session {
        Some(path) => load_session(Path::new(path))?,
        None => SessionInput::default(),
    };
    if let Some(mode) = args.mode {
        input.layout_mode = mode;
    }

    let setup = inspect(&file_path, &options, input.layout_mode)?;
    apply_flags(&mut input, args, &conn, &setup.headers)?;
    debug!(?input, "session input");

    if args.dry_run {
        let mut sink = PreviewSink::default();
        import_file(&file_path, &options, input, &conn, &mut sink)?;
        print_preview(&sink.drafts);
        println!("{} records would be imported", sink.drafts.len());
        return Ok(());
    }

    let checksum = compute_checksum(&file_path)?;
    let filename = file_path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let tx = conn.unchecked_transaction()?;
    let mut sink = SqliteSink::begin(&tx, filename, input.layout_mode, Some(&checksum))?;
    debug!(import_id = sink.import_id(), "writing import");
    import_file(&file_path, &options, input, &*tx, &mut sink)?;
    let imported = sink.finish()?;
    tx.commit()?;

    println!("{imported} records have been imported");
    Ok(())
}

fn load_session(path: &Path) -> Result<SessionInput> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| ImportError::Other(format!("Invalid session file {}: {e}", path.display())))
}

/// Fold command-line choices into `input`, translating names to ids and
/// header names to column positions.
fn apply_flags(input: &mut SessionInput, args: &ImportArgs, conn: &Connection, headers: &HeaderIndex) -> Result<()> {
    let selections = &mut input.field_selections;

    for entry in &args.map {
        let (field, column) = entry
            .split_once('=')
            .ok_or_else(|| ImportError::Other(format!("Expected FIELD=COLUMN, got '{entry}'")))?;
        selections.insert(field.trim().to_lowercase(), Selection::One(parse_column(column, headers)?));
    }

    match (&args.income_column, &args.spend_column) {
        (Some(income), Some(spend)) => {
            selections.insert(
                FIELD_AMOUNT.to_string(),
                Selection::Pair(parse_column(income, headers)?, parse_column(spend, headers)?),
            );
        }
        (None, None) => {}
        _ => {
            return Err(ImportError::Other(
                "--income-column and --spend-column must be given together".to_string(),
            ))
        }
    }

    if let Some(account) = &args.account {
        selections.insert(FIELD_ACCOUNT.to_string(), Selection::One(find_account(conn, account)?));
    }

    match (&args.income_type, &args.spend_type) {
        (Some(income), Some(spend)) => {
            selections.insert(
                FIELD_TRANSACTION_TYPE.to_string(),
                Selection::Pair(
                    find_transaction_type(conn, income, true)?,
                    find_transaction_type(conn, spend, false)?,
                ),
            );
        }
        (None, None) => {}
        _ => {
            return Err(ImportError::Other(
                "--income-type and --spend-type must be given together".to_string(),
            ))
        }
    }
    Ok(())
}

fn print_preview(drafts: &[TransactionDraft]) {
    let mut table = Table::new();
    table.set_header(vec!["Line", "Date", "Description", "Amount", "Type", "Vendor"]);
    for d in drafts {
        table.add_row(vec![
            Cell::new(d.source_line),
            Cell::new(d.text(FIELD_DATE).unwrap_or_default()),
            Cell::new(d.text(FIELD_DESCRIPTION).unwrap_or_default()),
            Cell::new(d.amount().map(money).unwrap_or_default()),
            Cell::new(d.reference(FIELD_TRANSACTION_TYPE).map(|id| id.to_string()).unwrap_or_default()),
            Cell::new(d.text(FIELD_VENDOR).unwrap_or_default()),
        ]);
    }
    println!("{table}");
}
