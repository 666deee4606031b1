use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{ImportError, Result};
use crate::models::{
    LayoutMode, TransactionDraft, FIELD_ACCOUNT, FIELD_DATE, FIELD_DESCRIPTION, FIELD_NOTES,
    FIELD_TRANSACTION_TYPE, FIELD_VENDOR,
};

/// Accepts drafts one at a time. Any error is fatal for the run.
pub trait ImportSink {
    fn accept(&mut self, draft: &TransactionDraft) -> Result<()>;
}

/// Hand every draft to `sink` in order, returning how many it accepted.
/// Stops at the first materialization or sink error.
pub fn drain_into<I, S>(drafts: I, sink: &mut S) -> Result<usize>
where
    I: Iterator<Item = Result<TransactionDraft>>,
    S: ImportSink + ?Sized,
{
    let mut accepted = 0usize;
    for draft in drafts {
        let draft = draft?;
        sink.accept(&draft).map_err(|e| match e {
            rejection @ ImportError::SinkRejection { .. } => rejection,
            other => ImportError::SinkRejection {
                draft: accepted + 1,
                reason: other.to_string(),
            },
        })?;
        accepted += 1;
    }
    info!(accepted, "drafts accepted");
    Ok(accepted)
}

/// Writes drafts to the `transactions` table under one `imports` record.
pub struct SqliteSink<'c> {
    conn: &'c Connection,
    import_id: i64,
    accepted: usize,
}

impl<'c> SqliteSink<'c> {
    pub fn begin(conn: &'c Connection, filename: &str, mode: LayoutMode, checksum: Option<&str>) -> Result<Self> {
        conn.execute(
            "INSERT INTO imports (filename, layout_mode, record_count, checksum) VALUES (?1, ?2, 0, ?3)",
            rusqlite::params![filename, mode.key(), checksum],
        )?;
        let import_id = conn.last_insert_rowid();
        debug!(import_id, filename, "import record created");
        Ok(Self {
            conn,
            import_id,
            accepted: 0,
        })
    }

    pub fn import_id(&self) -> i64 {
        self.import_id
    }

    /// Record the final count on the import record.
    pub fn finish(self) -> Result<usize> {
        self.conn.execute(
            "UPDATE imports SET record_count = ?1 WHERE id = ?2",
            rusqlite::params![self.accepted as i64, self.import_id],
        )?;
        Ok(self.accepted)
    }
}

impl ImportSink for SqliteSink<'_> {
    fn accept(&mut self, draft: &TransactionDraft) -> Result<()> {
        let missing = |field: &str| ImportError::SinkRejection {
            draft: self.accepted + 1,
            reason: format!("line {}: no value for '{field}'", draft.source_line),
        };
        let account_id = draft.reference(FIELD_ACCOUNT).ok_or_else(|| missing(FIELD_ACCOUNT))?;
        let type_id = draft
            .reference(FIELD_TRANSACTION_TYPE)
            .ok_or_else(|| missing(FIELD_TRANSACTION_TYPE))?;
        let date = draft.text(FIELD_DATE).ok_or_else(|| missing(FIELD_DATE))?;
        let description = draft.text(FIELD_DESCRIPTION).ok_or_else(|| missing(FIELD_DESCRIPTION))?;
        let amount = draft.amount().ok_or_else(|| missing("amount"))?;

        self.conn.execute(
            "INSERT INTO transactions (account_id, transaction_type_id, date, description, amount, vendor, notes, import_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                account_id,
                type_id,
                date,
                description,
                amount,
                draft.text(FIELD_VENDOR),
                draft.text(FIELD_NOTES),
                self.import_id,
            ],
        )?;
        self.accepted += 1;
        Ok(())
    }
}

/// Keeps drafts in memory; used for dry runs.
#[derive(Debug, Default)]
pub struct PreviewSink {
    pub drafts: Vec<TransactionDraft>,
}

impl ImportSink for PreviewSink {
    fn accept(&mut self, draft: &TransactionDraft) -> Result<()> {
        self.drafts.push(draft.clone());
        Ok(())
    }
}
