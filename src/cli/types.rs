use comfy_table::{Cell, Table};

use crate::db::{get_connection, list_transaction_types};
use crate::error::Result;
use crate::settings::db_path;

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path()?)?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Class"]);
    for t in list_transaction_types(&conn)? {
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(t.name),
            Cell::new(if t.is_income { "income" } else { "spend" }),
        ]);
    }
    println!("Transaction types\n{table}");
    Ok(())
}
