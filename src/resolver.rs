use tracing::debug;

use crate::error::{ImportError, Result};
use crate::lookup::{LookupProvider, LookupSource};
use crate::mapping::{CombinedRoles, FieldSelections, MappingModel, Selection, SelectorSpec};
use crate::models::{DraftValue, LayoutMode, TransactionDraft, FIELD_AMOUNT};
use crate::reader::NumberedRow;

/// Parse a money string: strips thousands separators, currency symbols and
/// quotes; `(12.00)` is negative. Blank is zero.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.replace(',', "").replace('"', "").replace('$', "");
    let s = s.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return inner.trim().parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| -v);
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountSource {
    Column(usize),
    Combined(CombinedRoles),
}

/// The two transaction types chosen for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypePair {
    pub income: i64,
    pub spend: i64,
}

/// Validated session selections, ready to apply to rows. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMapping {
    pub mode: LayoutMode,
    columns: Vec<(&'static str, usize)>,
    constants: Vec<(&'static str, i64)>,
    amount: Option<AmountSource>,
    type_field: Option<(&'static str, TypePair)>,
    required: Vec<&'static str>,
}

/// Check `selections` against `model` and the lookup sets. Fails on the first
/// missing or malformed selection without touching any row.
pub fn resolve_mapping<L: LookupProvider + ?Sized>(
    model: &MappingModel,
    selections: &FieldSelections,
    lookups: &L,
) -> Result<ResolvedMapping> {
    for key in selections.keys() {
        if model.selector(key).is_none() {
            return Err(ImportError::UnknownField(key.clone()));
        }
    }

    let mut resolved = ResolvedMapping {
        mode: model.mode,
        columns: Vec::new(),
        constants: Vec::new(),
        amount: None,
        type_field: None,
        required: Vec::new(),
    };

    for selector in &model.selectors {
        let name = selector.name();
        let missing = || ImportError::MissingRequiredMapping { field: name.to_string() };
        let invalid = |reason: &str| ImportError::InvalidSelection {
            field: name.to_string(),
            reason: reason.to_string(),
        };
        let mut submitted = selections.iter().filter(|(k, _)| k.eq_ignore_ascii_case(name));
        let selection = match (submitted.next(), submitted.next()) {
            (Some(_), Some(_)) => return Err(invalid("selected more than once under different spellings")),
            (Some((_, v)), None) => *v,
            (None, _) => Selection::Unset,
        };

        if selector.field.required {
            resolved.required.push(name);
        }

        match selector.spec {
            SelectorSpec::Column => match selection {
                Selection::One(i) if i >= 0 => {
                    let column = i as usize;
                    if name == FIELD_AMOUNT {
                        resolved.amount = Some(AmountSource::Column(column));
                    } else {
                        resolved.columns.push((name, column));
                    }
                }
                Selection::Pair(..) => return Err(invalid("expected a single column")),
                _ if selector.required() => return Err(missing()),
                _ => {}
            },
            SelectorSpec::DualColumn => match (selection, CombinedRoles::from_selection(selection)) {
                (_, Some(roles)) => {
                    if roles.spend >= roles.income {
                        return Err(invalid("the spend column must come before the income column"));
                    }
                    resolved.amount = Some(AmountSource::Combined(roles));
                }
                (Selection::One(i), None) if i >= 0 => {
                    return Err(invalid("expected an income column and a spend column"))
                }
                _ if selector.required() => return Err(missing()),
                _ => {}
            },
            SelectorSpec::Lookup(source) => match selection {
                Selection::One(id) if id >= 0 => {
                    check_lookup(lookups, source, name, id)?;
                    resolved.constants.push((name, id));
                }
                Selection::Pair(..) => return Err(invalid("expected a single choice")),
                _ => return Err(missing()),
            },
            SelectorSpec::DualLookup { income, spend } => match selection {
                Selection::Pair(income_id, spend_id) if income_id >= 0 && spend_id >= 0 => {
                    check_lookup(lookups, income, name, income_id)?;
                    check_lookup(lookups, spend, name, spend_id)?;
                    resolved.type_field = Some((
                        name,
                        TypePair {
                            income: income_id,
                            spend: spend_id,
                        },
                    ));
                }
                Selection::One(id) if id >= 0 => {
                    return Err(invalid("expected an income choice and a spend choice"))
                }
                _ => return Err(missing()),
            },
        }
    }

    if let Some(AmountSource::Combined(roles)) = resolved.amount {
        for (field, column) in &resolved.columns {
            if !roles.reserves(*column) {
                continue;
            }
            if *column == roles.spend || *column == roles.income {
                return Err(ImportError::InvalidSelection {
                    field: field.to_string(),
                    reason: format!("column {column} holds the combined amount"),
                });
            }
            if *column > roles.income {
                return Err(ImportError::InvalidSelection {
                    field: field.to_string(),
                    reason: format!(
                        "column {column} lies past the combined amount columns; \
                         combined layouts only map columns before column {}",
                        roles.income
                    ),
                });
            }
        }
    }

    debug!(
        mode = %resolved.mode,
        columns = resolved.columns.len(),
        constants = resolved.constants.len(),
        "mapping resolved"
    );
    Ok(resolved)
}

fn check_lookup<L: LookupProvider + ?Sized>(
    lookups: &L,
    source: LookupSource,
    field: &str,
    id: i64,
) -> Result<()> {
    if lookups.contains(source, id)? {
        Ok(())
    } else {
        Err(ImportError::UnknownLookup {
            field: field.to_string(),
            id,
        })
    }
}

impl ResolvedMapping {
    pub fn amount_source(&self) -> Option<AmountSource> {
        self.amount
    }

    pub fn type_field(&self) -> Option<(&'static str, TypePair)> {
        self.type_field
    }

    /// Fields shared by every draft of `row`: mapped columns, session
    /// constants and, in single mode, the amount.
    pub fn resolve(&self, row: &NumberedRow) -> Result<TransactionDraft> {
        let mut draft = TransactionDraft::new(row.line);
        for &(field, column) in &self.columns {
            let value = cell(row, field, column)?;
            draft.set(field, DraftValue::Text(value.to_string()));
        }
        for &(field, id) in &self.constants {
            draft.set(field, DraftValue::Reference(id));
        }
        if let Some(AmountSource::Column(column)) = self.amount {
            let raw = cell(row, FIELD_AMOUNT, column)?;
            draft.set(FIELD_AMOUNT, DraftValue::Amount(coerce_amount(row.line, raw)?));
        }
        Ok(draft)
    }

    /// Every required field must carry a value.
    pub fn check_required(&self, draft: &TransactionDraft) -> Result<()> {
        for field in &self.required {
            if draft.get(field).is_none() {
                return Err(ImportError::RowMaterialization {
                    row: draft.source_line,
                    field: field.to_string(),
                    reason: "required value is missing".to_string(),
                });
            }
        }
        Ok(())
    }
}

pub(crate) fn cell<'a>(row: &'a NumberedRow, field: &str, column: usize) -> Result<&'a str> {
    row.row
        .get(column)
        .map(String::as_str)
        .ok_or_else(|| ImportError::RowMaterialization {
            row: row.line,
            field: field.to_string(),
            reason: format!("column {column} is out of range for a row of {} columns", row.row.len()),
        })
}

pub(crate) fn coerce_amount(line: u64, raw: &str) -> Result<f64> {
    parse_amount(raw).ok_or_else(|| ImportError::RowMaterialization {
        row: line,
        field: FIELD_AMOUNT.to_string(),
        reason: format!("'{raw}' is not an amount"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::StaticLookup;
    use crate::mapping::build_mapping_model;
    use crate::models::{FIELD_ACCOUNT, FIELD_DATE, FIELD_DESCRIPTION, FIELD_TRANSACTION_TYPE, TRANSACTION_SCHEMA};

    fn selections(pairs: &[(&str, Selection)]) -> FieldSelections {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn single_selections() -> FieldSelections {
        selections(&[
            (FIELD_ACCOUNT, Selection::One(1)),
            (FIELD_TRANSACTION_TYPE, Selection::Pair(10, 20)),
            (FIELD_DATE, Selection::One(0)),
            (FIELD_DESCRIPTION, Selection::One(1)),
            (FIELD_AMOUNT, Selection::One(2)),
        ])
    }

    fn row(line: u64, cells: &[&str]) -> NumberedRow {
        NumberedRow {
            line,
            row: cells.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("\"500.00\""), Some(500.0));
        assert_eq!(parse_amount("  -42.50  "), Some(-42.5));
        assert_eq!(parse_amount("(1,234.56)"), Some(-1234.56));
        assert_eq!(parse_amount("-$50.00"), Some(-50.0));
        assert_eq!(parse_amount(""), Some(0.0));
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("-Infinity"), None);
        assert_eq!(parse_amount("(inf)"), None);
    }

    #[test]
    fn test_non_finite_amount_is_row_error() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Single);
        let mapping = resolve_mapping(&model, &single_selections(), &StaticLookup::sample()).unwrap();
        let err = mapping.resolve(&row(4, &["2024-01-01", "Coffee", "NaN"])).unwrap_err();
        assert!(matches!(err, ImportError::RowMaterialization { row: 4, field, .. } if field == FIELD_AMOUNT));
    }

    #[test]
    fn test_resolve_single_row() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Single);
        let mapping = resolve_mapping(&model, &single_selections(), &StaticLookup::sample()).unwrap();
        let draft = mapping.resolve(&row(2, &["2024-01-01", "Coffee", "-4.50"])).unwrap();
        assert_eq!(draft.text(FIELD_DATE), Some("2024-01-01"));
        assert_eq!(draft.text(FIELD_DESCRIPTION), Some("Coffee"));
        assert_eq!(draft.amount(), Some(-4.5));
        assert_eq!(draft.reference(FIELD_ACCOUNT), Some(1));
        assert_eq!(draft.source_line, 2);
    }

    #[test]
    fn test_missing_account_fails() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Single);
        let mut sel = single_selections();
        sel.remove(FIELD_ACCOUNT);
        let err = resolve_mapping(&model, &sel, &StaticLookup::sample()).unwrap_err();
        assert!(matches!(err, ImportError::MissingRequiredMapping { field } if field == FIELD_ACCOUNT));
    }

    #[test]
    fn test_blank_required_column_fails() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Single);
        let mut sel = single_selections();
        sel.insert(FIELD_DATE.into(), Selection::One(-1));
        let err = resolve_mapping(&model, &sel, &StaticLookup::sample()).unwrap_err();
        assert!(matches!(err, ImportError::MissingRequiredMapping { field } if field == FIELD_DATE));
    }

    #[test]
    fn test_optional_column_may_stay_unset() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Single);
        let mut sel = single_selections();
        sel.insert("vendor".into(), Selection::Unset);
        let mapping = resolve_mapping(&model, &sel, &StaticLookup::sample()).unwrap();
        let draft = mapping.resolve(&row(2, &["d", "x", "1"])).unwrap();
        assert!(draft.get("vendor").is_none());
    }

    #[test]
    fn test_unknown_lookup_id_rejected() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Single);
        let mut sel = single_selections();
        // 20 is a spend type, not an income type
        sel.insert(FIELD_TRANSACTION_TYPE.into(), Selection::Pair(20, 20));
        let err = resolve_mapping(&model, &sel, &StaticLookup::sample()).unwrap_err();
        assert!(matches!(err, ImportError::UnknownLookup { id: 20, .. }));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Single);
        let mut sel = single_selections();
        sel.insert("balance".into(), Selection::One(3));
        let err = resolve_mapping(&model, &sel, &StaticLookup::sample()).unwrap_err();
        assert!(matches!(err, ImportError::UnknownField(f) if f == "balance"));
    }

    #[test]
    fn test_field_names_match_case_insensitively() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Single);
        let mut sel = single_selections();
        let date = sel.remove(FIELD_DATE).unwrap();
        sel.insert("Date".into(), date);
        assert!(resolve_mapping(&model, &sel, &StaticLookup::sample()).is_ok());
    }

    #[test]
    fn test_same_field_under_two_spellings_rejected() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Single);
        let mut sel = single_selections();
        sel.insert("Date".into(), Selection::One(1));
        let err = resolve_mapping(&model, &sel, &StaticLookup::sample()).unwrap_err();
        assert!(matches!(err, ImportError::InvalidSelection { field, .. } if field == FIELD_DATE));
    }

    #[test]
    fn test_combined_allows_columns_between_split_slots() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Combined);
        let mut sel = single_selections();
        sel.insert(FIELD_AMOUNT.into(), Selection::Pair(5, 2));
        sel.insert("notes".into(), Selection::One(3));
        assert!(resolve_mapping(&model, &sel, &StaticLookup::sample()).is_ok());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Combined);
        let mut sel = single_selections();
        sel.insert(FIELD_AMOUNT.into(), Selection::One(2));
        let err = resolve_mapping(&model, &sel, &StaticLookup::sample()).unwrap_err();
        assert!(matches!(err, ImportError::InvalidSelection { .. }));
    }

    #[test]
    fn test_combined_rejects_plain_mapping_on_amount_slots() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Combined);
        let mut sel = single_selections();
        sel.insert(FIELD_AMOUNT.into(), Selection::Pair(3, 2));
        sel.insert("notes".into(), Selection::One(3));
        let err = resolve_mapping(&model, &sel, &StaticLookup::sample()).unwrap_err();
        assert!(matches!(err, ImportError::InvalidSelection { field, .. } if field == "notes"));
    }

    #[test]
    fn test_combined_rejects_columns_past_layout() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Combined);
        let mut sel = single_selections();
        sel.insert(FIELD_AMOUNT.into(), Selection::Pair(3, 2));
        sel.insert("vendor".into(), Selection::One(4));
        let err = resolve_mapping(&model, &sel, &StaticLookup::sample()).unwrap_err();
        assert!(matches!(err, ImportError::InvalidSelection { field, .. } if field == "vendor"));
    }

    #[test]
    fn test_combined_requires_spend_before_income() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Combined);
        let mut sel = single_selections();
        sel.insert(FIELD_AMOUNT.into(), Selection::Pair(2, 3));
        assert!(resolve_mapping(&model, &sel, &StaticLookup::sample()).is_err());
    }

    #[test]
    fn test_out_of_range_column_is_row_error() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Single);
        let mapping = resolve_mapping(&model, &single_selections(), &StaticLookup::sample()).unwrap();
        let err = mapping.resolve(&row(7, &["2024-01-01", "Coffee"])).unwrap_err();
        assert!(matches!(err, ImportError::RowMaterialization { row: 7, field, .. } if field == FIELD_AMOUNT));
    }

    #[test]
    fn test_bad_amount_is_row_error() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Single);
        let mapping = resolve_mapping(&model, &single_selections(), &StaticLookup::sample()).unwrap();
        let err = mapping.resolve(&row(3, &["2024-01-01", "Coffee", "abc"])).unwrap_err();
        assert!(matches!(err, ImportError::RowMaterialization { row: 3, .. }));
    }

    #[test]
    fn test_resolving_twice_behaves_identically() {
        let model = build_mapping_model(TRANSACTION_SCHEMA, LayoutMode::Single);
        let lookups = StaticLookup::sample();
        let a = resolve_mapping(&model, &single_selections(), &lookups).unwrap();
        let b = resolve_mapping(&model, &single_selections(), &lookups).unwrap();
        assert_eq!(a, b);
        let r = row(2, &["2024-01-01", "Coffee", "4.50"]);
        assert_eq!(a.resolve(&r).unwrap(), b.resolve(&r).unwrap());
    }
}
