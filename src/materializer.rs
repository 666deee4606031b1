use tracing::trace;

use crate::error::{ImportError, Result};
use crate::mapping::CombinedRoles;
use crate::models::{DraftValue, SourceRow, TransactionDraft, FIELD_AMOUNT};
use crate::reader::NumberedRow;
use crate::resolver::{coerce_amount, AmountSource, ResolvedMapping};

/// One of the two drafts a combined-layout row produces, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Spend,
    Income,
}

/// Project a combined-layout row for one pass. The income slot is always
/// removed; the income pass first moves its value into the spend slot.
///
/// With the default roles, `[date, desc, spend, balance]` becomes
/// `[date, desc, spend]` for the spend pass and `[date, desc, balance]` for
/// the income pass.
pub fn split_row(row: &[String], roles: CombinedRoles, pass: Pass) -> Option<SourceRow> {
    if row.len() <= roles.income || roles.spend >= roles.income {
        return None;
    }
    let mut projected = row.to_vec();
    if pass == Pass::Income {
        projected[roles.spend] = row[roles.income].clone();
    }
    projected.remove(roles.income);
    Some(projected)
}

/// Pulls rows from `rows` and yields drafts: one per row in single mode, a
/// spend draft then an income draft per row in combined mode. Stops after the
/// first error.
pub struct Materializer<'m, I> {
    rows: I,
    mapping: &'m ResolvedMapping,
    pending: Option<TransactionDraft>,
    done: bool,
}

impl<'m, I> Materializer<'m, I>
where
    I: Iterator<Item = Result<NumberedRow>>,
{
    pub fn new(rows: I, mapping: &'m ResolvedMapping) -> Self {
        Self {
            rows,
            mapping,
            pending: None,
            done: false,
        }
    }

    fn single(&self, row: &NumberedRow) -> Result<TransactionDraft> {
        let mut draft = self.mapping.resolve(row)?;
        if let Some((field, types)) = self.mapping.type_field() {
            let negative = draft.amount().is_some_and(|a| a < 0.0);
            let id = if negative { types.spend } else { types.income };
            draft.set(field, DraftValue::Reference(id));
        }
        self.mapping.check_required(&draft)?;
        Ok(draft)
    }

    fn combined(&self, row: &NumberedRow, roles: CombinedRoles) -> Result<[TransactionDraft; 2]> {
        let base = self.mapping.resolve(row)?;
        let build = |pass: Pass| -> Result<TransactionDraft> {
            let projected = split_row(&row.row, roles, pass).ok_or_else(|| ImportError::RowMaterialization {
                row: row.line,
                field: FIELD_AMOUNT.to_string(),
                reason: format!(
                    "row has {} columns; the combined layout reads columns {} and {}",
                    row.row.len(),
                    roles.spend,
                    roles.income
                ),
            })?;
            let mut draft = base.clone();
            draft.set(FIELD_AMOUNT, DraftValue::Amount(coerce_amount(row.line, &projected[roles.spend])?));
            if let Some((field, types)) = self.mapping.type_field() {
                let id = match pass {
                    Pass::Spend => types.spend,
                    Pass::Income => types.income,
                };
                draft.set(field, DraftValue::Reference(id));
            }
            self.mapping.check_required(&draft)?;
            Ok(draft)
        };
        Ok([build(Pass::Spend)?, build(Pass::Income)?])
    }

    fn materialize(&mut self, row: NumberedRow) -> Result<TransactionDraft> {
        trace!(line = row.line, "materializing row");
        match self.mapping.amount_source() {
            Some(AmountSource::Combined(roles)) => {
                let [spend, income] = self.combined(&row, roles)?;
                self.pending = Some(income);
                Ok(spend)
            }
            _ => self.single(&row),
        }
    }
}

impl<I> Iterator for Materializer<'_, I>
where
    I: Iterator<Item = Result<NumberedRow>>,
{
    type Item = Result<TransactionDraft>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(draft) = self.pending.take() {
            return Some(Ok(draft));
        }
        if self.done {
            return None;
        }
        let result = match self.rows.next()? {
            Ok(row) => self.materialize(row),
            Err(e) => Err(e),
        };
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}
