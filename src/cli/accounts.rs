use comfy_table::{Cell, Table};

use crate::db::{get_connection, list_accounts};
use crate::error::Result;
use crate::settings::db_path;

pub fn add(name: &str, institution: Option<&str>) -> Result<()> {
    let conn = get_connection(&db_path()?)?;
    conn.execute(
        "INSERT INTO accounts (name, institution) VALUES (?1, ?2)",
        rusqlite::params![name, institution],
    )?;
    println!("Added account: {name}");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path()?)?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Institution"]);
    for account in list_accounts(&conn)? {
        table.add_row(vec![
            Cell::new(account.id),
            Cell::new(account.name),
            Cell::new(account.institution.unwrap_or_default()),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}
