use std::path::PathBuf;

use comfy_table::{Cell, Table};

use crate::cli::ReaderArgs;
use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::column_selection;
use crate::importer::inspect;
use crate::lookup::LookupProvider;
use crate::mapping::SelectorSpec;
use crate::models::LayoutMode;
use crate::settings::load_settings;

pub fn run(file: &str, mode: LayoutMode, reader: &ReaderArgs) -> Result<()> {
    let settings = load_settings()?;
    let options = settings.reader_options(reader.skip_lines, reader.delimiter)?;
    let setup = inspect(&PathBuf::from(file), &options, mode)?;

    if setup.headers.is_empty() {
        println!("No header row (skip-lines is {}).", options.skip_lines);
    } else {
        let labels: Vec<_> = setup
            .headers
            .choices()
            .into_iter()
            .enumerate()
            .map(|(i, (_, label))| match i {
                0 => "(blank)".to_string(),
                _ => format!("#{} {label}", i - 1),
            })
            .collect();
        println!("Source columns: {}", labels.join(", "));
    }

    let mut table = Table::new();
    table.set_header(vec!["Field", "Required", "Selector", "Default"]);
    for selector in &setup.model.selectors {
        let default = match selector.spec {
            SelectorSpec::Column | SelectorSpec::DualColumn => {
                column_selection(&setup.headers, setup.defaults.get(selector.name()))
            }
            SelectorSpec::Lookup(_) | SelectorSpec::DualLookup { .. } => "(choose)".to_string(),
        };
        table.add_row(vec![
            Cell::new(selector.name()),
            Cell::new(if selector.required() { "yes" } else { "" }),
            Cell::new(selector.label()),
            Cell::new(default),
        ]);
    }
    println!("Mapping ({mode} layout)\n{table}");

    let db = settings.db_path();
    if db.exists() {
        let conn = get_connection(&db)?;
        for selector in &setup.model.selectors {
            let sources = match selector.spec {
                SelectorSpec::Lookup(source) => vec![source],
                SelectorSpec::DualLookup { income, spend } => vec![income, spend],
                SelectorSpec::Column | SelectorSpec::DualColumn => continue,
            };
            for source in sources {
                let choices: Vec<_> = conn
                    .choices(source)?
                    .into_iter()
                    .map(|c| format!("{} ({})", c.label, c.id))
                    .collect();
                let listed = if choices.is_empty() {
                    "(none)".to_string()
                } else {
                    choices.join(", ")
                };
                println!("{} {}: {listed}", selector.name(), source.describe());
            }
        }
    }
    Ok(())
}
