use std::path::Path;

use rusqlite::Connection;

use crate::error::{ImportError, Result};
use crate::models::{Account, TransactionType};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    institution TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS transaction_types (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    is_income INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    layout_mode TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    checksum TEXT
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    transaction_type_id INTEGER NOT NULL,
    date TEXT NOT NULL,
    description TEXT NOT NULL,
    amount REAL NOT NULL,
    vendor TEXT,
    notes TEXT,
    import_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (transaction_type_id) REFERENCES transaction_types(id),
    FOREIGN KEY (import_id) REFERENCES imports(id)
);
";

// (name, is_income)
const DEFAULT_TRANSACTION_TYPES: &[(&str, bool)] = &[
    // Income
    ("Salary", true),
    ("Interest", true),
    ("Refund", true),
    ("Transfer In", true),
    ("Other Income", true),
    // Spend
    ("Groceries", false),
    ("Dining", false),
    ("Rent / Mortgage", false),
    ("Utilities", false),
    ("Transport", false),
    ("Insurance", false),
    ("Subscriptions", false),
    ("Bank Fees", false),
    ("Transfer Out", false),
    ("Uncategorized", false),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM transaction_types", [], |row| row.get(0))?;
    if count == 0 {
        for (name, is_income) in DEFAULT_TRANSACTION_TYPES {
            conn.execute(
                "INSERT INTO transaction_types (name, is_income) VALUES (?1, ?2)",
                rusqlite::params![name, is_income],
            )?;
        }
    }
    Ok(())
}

pub fn list_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare("SELECT id, name, institution FROM accounts ORDER BY name")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Account {
                id: row.get(0)?,
                name: row.get(1)?,
                institution: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_transaction_types(conn: &Connection) -> Result<Vec<TransactionType>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, is_income FROM transaction_types ORDER BY is_income DESC, name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(TransactionType {
                id: row.get(0)?,
                name: row.get(1)?,
                is_income: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Resolve an account by numeric id or by name.
pub fn find_account(conn: &Connection, key: &str) -> Result<i64> {
    let by_id = key.parse::<i64>().ok();
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE id = ?1 OR name = ?2")?;
    match stmt.query_row(rusqlite::params![by_id, key], |row| row.get(0)) {
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(ImportError::UnknownAccount(key.to_string())),
        other => Ok(other?),
    }
}

/// Resolve a transaction type by numeric id or by name within one class.
pub fn find_transaction_type(conn: &Connection, key: &str, income: bool) -> Result<i64> {
    let by_id = key.parse::<i64>().ok();
    let mut stmt = conn.prepare(
        "SELECT id FROM transaction_types WHERE (id = ?1 OR name = ?2) AND is_income = ?3",
    )?;
    match stmt.query_row(rusqlite::params![by_id, key, income], |row| row.get(0)) {
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            let class = if income { "income" } else { "spend" };
            Err(ImportError::Other(format!("Unknown {class} transaction type: {key}")))
        }
        other => Ok(other?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["accounts", "transaction_types", "transactions", "imports"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
        let count: i64 = conn.query_row("SELECT count(*) FROM transaction_types", [], |r| r.get(0)).unwrap();
        assert_eq!(count as usize, DEFAULT_TRANSACTION_TYPES.len());
    }

    #[test]
    fn test_seeds_both_classes() {
        let (_dir, conn) = test_db();
        let types = list_transaction_types(&conn).unwrap();
        assert!(types.iter().filter(|t| t.is_income).count() >= 5);
        assert!(types.iter().filter(|t| !t.is_income).count() >= 10);
    }

    #[test]
    fn test_find_account_by_name_or_id() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO accounts (name) VALUES ('Checking')", []).unwrap();
        let id = conn.last_insert_rowid();
        assert_eq!(find_account(&conn, "Checking").unwrap(), id);
        assert_eq!(find_account(&conn, &id.to_string()).unwrap(), id);
        assert!(matches!(
            find_account(&conn, "Nope"),
            Err(ImportError::UnknownAccount(_))
        ));
    }

    #[test]
    fn test_find_transaction_type_respects_class() {
        let (_dir, conn) = test_db();
        assert!(find_transaction_type(&conn, "Salary", true).is_ok());
        assert!(find_transaction_type(&conn, "Salary", false).is_err());
        assert!(find_transaction_type(&conn, "Groceries", false).is_ok());
    }

    #[test]
    fn test_lookup_failures_other_than_no_match_propagate() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(matches!(find_account(&conn, "Checking"), Err(ImportError::Db(_))));
        assert!(matches!(
            find_transaction_type(&conn, "Salary", true),
            Err(ImportError::Db(_))
        ));
    }
}
