//! The field mapping model: which selector each target field exposes for a
//! given layout mode, and the shape of the selections submitted against it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::headers::HeaderIndex;
use crate::lookup::LookupSource;
use crate::models::{FieldKind, LayoutMode, TargetField, FIELD_AMOUNT};

/// Physical slots of the amount in a combined-layout row.
///
/// The usual export shape is `[date, description, spend, balance-or-income]`,
/// so the defaults are columns 2 and 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombinedRoles {
    pub spend: usize,
    pub income: usize,
}

impl Default for CombinedRoles {
    fn default() -> Self {
        Self { spend: 2, income: 3 }
    }
}

impl CombinedRoles {
    /// Read the roles from an `[income, spend]` amount selection.
    pub fn from_selection(selection: Selection) -> Option<Self> {
        match selection {
            Selection::Pair(income, spend) if income >= 0 && spend >= 0 => Some(Self {
                spend: spend as usize,
                income: income as usize,
            }),
            _ => None,
        }
    }

    /// Whether a plain field may not read `column`: either amount slot, or
    /// anything past the income slot.
    pub fn reserves(&self, column: usize) -> bool {
        column == self.spend || column >= self.income
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorSpec {
    /// One source column, optionally left blank.
    Column,
    /// Income column and spend column.
    DualColumn,
    /// One id from a finite set, chosen once per session.
    Lookup(LookupSource),
    /// An income-classified id and a spend-classified id.
    DualLookup {
        income: LookupSource,
        spend: LookupSource,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelector {
    pub field: TargetField,
    pub spec: SelectorSpec,
}

impl FieldSelector {
    pub fn name(&self) -> &'static str {
        self.field.name
    }

    pub fn required(&self) -> bool {
        match self.spec {
            SelectorSpec::Lookup(_) | SelectorSpec::DualLookup { .. } => true,
            SelectorSpec::Column | SelectorSpec::DualColumn => self.field.required,
        }
    }

    pub fn label(&self) -> String {
        match self.spec {
            SelectorSpec::Column => self.field.name.to_string(),
            SelectorSpec::DualColumn => "income column / spend column".to_string(),
            SelectorSpec::Lookup(source) => format!("one of {}", source.describe()),
            SelectorSpec::DualLookup { .. } => "income type / spend type".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingModel {
    pub mode: LayoutMode,
    pub selectors: Vec<FieldSelector>,
}

/// Attach one selector to every non-key field of `schema`. Depends only on
/// its arguments.
pub fn build_mapping_model(schema: &[TargetField], mode: LayoutMode) -> MappingModel {
    let selectors = schema
        .iter()
        .filter(|f| !f.primary_key)
        .map(|field| {
            let spec = match field.kind {
                FieldKind::AccountRef => SelectorSpec::Lookup(LookupSource::Accounts),
                FieldKind::CategoryTypeRef => SelectorSpec::DualLookup {
                    income: LookupSource::TransactionTypes { income: true },
                    spend: LookupSource::TransactionTypes { income: false },
                },
                FieldKind::Amount if mode == LayoutMode::Combined => SelectorSpec::DualColumn,
                FieldKind::Amount | FieldKind::Plain => SelectorSpec::Column,
            };
            FieldSelector { field: *field, spec }
        })
        .collect();
    MappingModel { mode, selectors }
}

impl MappingModel {
    pub fn selector(&self, name: &str) -> Option<&FieldSelector> {
        self.selectors.iter().find(|s| s.field.name.eq_ignore_ascii_case(name))
    }

    /// Pre-filled selections for every column selector: the matching header
    /// for plain columns, the standard slots for a dual amount column.
    pub fn defaults(&self, headers: &HeaderIndex) -> FieldSelections {
        let fields: Vec<TargetField> = self.selectors.iter().map(|s| s.field).collect();
        let mut selections = FieldSelections::new();
        for (name, position) in headers.suggest(&fields) {
            let Some(selector) = self.selector(name) else { continue };
            match (selector.spec, position) {
                (SelectorSpec::Column, Some(i)) => {
                    selections.insert(name.to_string(), Selection::One(i as i64));
                }
                (SelectorSpec::DualColumn, _) => {
                    let roles = CombinedRoles::default();
                    selections.insert(
                        name.to_string(),
                        Selection::Pair(roles.income as i64, roles.spend as i64),
                    );
                }
                _ => {}
            }
        }
        selections
    }
}

/// A submitted value for one selector. Its meaning (column index or lookup
/// id) depends on the selector it answers. Negative values mean unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    Unset,
    One(i64),
    /// `[income, spend]`
    Pair(i64, i64),
}

pub type FieldSelections = BTreeMap<String, Selection>;

/// What the user submitted for one import session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInput {
    #[serde(default)]
    pub layout_mode: LayoutMode,
    #[serde(default)]
    pub field_selections: FieldSelections,
}

impl SessionInput {
    /// The selection submitted for `field`, matched case-insensitively.
    pub fn selection(&self, field: &str) -> Option<Selection> {
        self.field_selections
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(field))
            .map(|(_, v)| *v)
    }

    /// Fill every selection the user left out from `defaults`. In the
    /// combined layout, a plain-column default that lands on a column the
    /// amount reserves is dropped instead.
    pub fn with_defaults(mut self, defaults: FieldSelections) -> Self {
        let roles = match self.layout_mode {
            LayoutMode::Combined => Some(
                self.selection(FIELD_AMOUNT)
                    .and_then(CombinedRoles::from_selection)
                    .unwrap_or_default(),
            ),
            LayoutMode::Single => None,
        };
        for (field, selection) in defaults {
            if self.selection(&field).is_some() {
                continue;
            }
            if let (Some(roles), Selection::One(i)) = (roles, selection) {
                if field != FIELD_AMOUNT && i >= 0 && roles.reserves(i as usize) {
                    debug!(field = %field, column = i, "default dropped; column belongs to the combined amount");
                    continue;
                }
            }
            self.field_selections.insert(field, selection);
        }
        self
    }
}
