use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use rusqlite::Connection;
use tempfile::TempDir;

struct Home {
    dir: TempDir,
}

impl Home {
    fn new() -> Self {
        let home = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        home.cmd()
            .args(["init", "--data-dir"])
            .arg(home.data_dir())
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized budget"));
        home.cmd().args(["accounts", "add", "Checking"]).assert().success();
        home
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("budget").unwrap();
        cmd.env("HOME", self.dir.path()).env_remove("RUST_LOG");
        cmd
    }

    fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn db(&self) -> Connection {
        Connection::open(self.data_dir().join("budget.db")).unwrap()
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))
        .unwrap()
}

fn import(home: &Home, file: &Path) -> Command {
    let mut cmd = home.cmd();
    cmd.arg("import")
        .arg(file)
        .args(["--account", "Checking", "--income-type", "Salary", "--spend-type", "Groceries"]);
    cmd
}

#[test]
fn test_types_list_shows_both_classes() {
    let home = Home::new();
    home.cmd()
        .args(["types", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Salary").and(predicate::str::contains("spend")));
}

#[test]
fn test_accounts_list() {
    let home = Home::new();
    home.cmd()
        .args(["accounts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Checking"));
}

#[test]
fn test_inspect_lists_columns_and_defaults() {
    let home = Home::new();
    let file = home.write("stmt.csv", "Date,Description,Amount\n2024-01-01,Coffee,-4.50\n");
    home.cmd()
        .arg("inspect")
        .arg(&file)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("#2 Amount")
                .and(predicate::str::contains("account_id"))
                .and(predicate::str::contains("Checking")),
        );
}

#[test]
fn test_single_import_writes_rows() {
    let home = Home::new();
    let file = home.write(
        "stmt.csv",
        "Date,Description,Amount\n2024-01-01,Coffee,-4.50\n2024-01-02,Paycheck,1500\n",
    );
    import(&home, &file)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 records have been imported"));

    let conn = home.db();
    assert_eq!(count(&conn, "transactions"), 2);
    let (amount, kind): (f64, String) = conn
        .query_row(
            "SELECT t.amount, y.name FROM transactions t JOIN transaction_types y ON y.id = t.transaction_type_id
             WHERE t.description = 'Coffee'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(amount, -4.5);
    assert_eq!(kind, "Groceries");
    let recorded: i64 = conn
        .query_row("SELECT record_count FROM imports", [], |r| r.get(0))
        .unwrap();
    assert_eq!(recorded, 2);
}

#[test]
fn test_combined_import_writes_two_per_row() {
    let home = Home::new();
    let file = home.write(
        "joint.csv",
        "Date,Description,Debit,Credit\n2024-01-01,Coffee,4.50,0\n2024-01-02,Refund,0,12.00\n",
    );
    import(&home, &file)
        .args(["--mode", "combined"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4 records have been imported"));

    let conn = home.db();
    let mut stmt = conn
        .prepare("SELECT amount FROM transactions ORDER BY id")
        .unwrap();
    let amounts: Vec<f64> = stmt
        .query_map([], |r| r.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(amounts, vec![4.5, 0.0, 0.0, 12.0]);
}

#[test]
fn test_dry_run_saves_nothing() {
    let home = Home::new();
    let file = home.write("stmt.csv", "Date,Description,Amount\n2024-01-01,Coffee,-4.50\n");
    import(&home, &file)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Coffee").and(predicate::str::contains("1 records would be imported")));
    let conn = home.db();
    assert_eq!(count(&conn, "transactions"), 0);
    assert_eq!(count(&conn, "imports"), 0);
}

#[test]
fn test_missing_account_imports_nothing() {
    let home = Home::new();
    let file = home.write("stmt.csv", "Date,Description,Amount\n2024-01-01,Coffee,-4.50\n");
    home.cmd()
        .arg("import")
        .arg(&file)
        .args(["--income-type", "Salary", "--spend-type", "Groceries"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("account_id"));
    let conn = home.db();
    assert_eq!(count(&conn, "transactions"), 0);
    assert_eq!(count(&conn, "imports"), 0);
}

#[test]
fn test_bad_amount_rolls_back_whole_import() {
    let home = Home::new();
    let file = home.write(
        "stmt.csv",
        "Date,Description,Amount\n2024-01-01,Coffee,-4.50\n2024-01-02,Broken,oops\n",
    );
    import(&home, &file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Row 3"));
    let conn = home.db();
    assert_eq!(count(&conn, "transactions"), 0);
    assert_eq!(count(&conn, "imports"), 0);
}

#[test]
fn test_map_flag_overrides_default_column() {
    let home = Home::new();
    let file = home.write(
        "stmt.csv",
        "Date,Description,Amount,Memo\n2024-01-01,Coffee,-4.50,Card purchase\n",
    );
    import(&home, &file)
        .args(["--map", "description=Memo"])
        .assert()
        .success();
    let description: String = home
        .db()
        .query_row("SELECT description FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(description, "Card purchase");
}
