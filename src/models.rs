use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// One decoded source line, index-addressed. No schema of its own.
pub type SourceRow = Vec<String>;

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub institution: Option<String>,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct TransactionType {
    pub id: i64,
    pub name: String,
    pub is_income: bool,
}

// ---------------------------------------------------------------------------
// Target schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Plain,
    AccountRef,
    CategoryTypeRef,
    Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetField {
    pub name: &'static str,
    pub required: bool,
    pub primary_key: bool,
    pub kind: FieldKind,
}

impl TargetField {
    const fn new(name: &'static str, required: bool, kind: FieldKind) -> Self {
        Self {
            name,
            required,
            primary_key: false,
            kind,
        }
    }
}

pub const FIELD_ID: &str = "id";
pub const FIELD_ACCOUNT: &str = "account_id";
pub const FIELD_TRANSACTION_TYPE: &str = "transaction_type_id";
pub const FIELD_DATE: &str = "date";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_AMOUNT: &str = "amount";
pub const FIELD_VENDOR: &str = "vendor";
pub const FIELD_NOTES: &str = "notes";

/// Columns of the `transactions` table, in table order.
pub const TRANSACTION_SCHEMA: &[TargetField] = &[
    TargetField {
        name: FIELD_ID,
        required: false,
        primary_key: true,
        kind: FieldKind::Plain,
    },
    TargetField::new(FIELD_ACCOUNT, true, FieldKind::AccountRef),
    TargetField::new(FIELD_TRANSACTION_TYPE, true, FieldKind::CategoryTypeRef),
    TargetField::new(FIELD_DATE, true, FieldKind::Plain),
    TargetField::new(FIELD_DESCRIPTION, true, FieldKind::Plain),
    TargetField::new(FIELD_AMOUNT, true, FieldKind::Amount),
    TargetField::new(FIELD_VENDOR, false, FieldKind::Plain),
    TargetField::new(FIELD_NOTES, false, FieldKind::Plain),
];

// ---------------------------------------------------------------------------
// Layout mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// One amount column maps straight through.
    #[default]
    Single,
    /// Spend and income share a physical line; each row yields two drafts.
    Combined,
}

impl LayoutMode {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Combined => "combined",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for LayoutMode {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(Self::Single),
            // "separate" is what older exports called the split layout
            "combined" | "separate" | "seperate" => Ok(Self::Combined),
            other => Err(ImportError::Other(format!(
                "Unknown layout mode: {other} (expected single or combined)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum DraftValue {
    Text(String),
    Amount(f64),
    Reference(i64),
}

impl DraftValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<f64> {
        match self {
            Self::Amount(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<i64> {
        match self {
            Self::Reference(id) => Some(*id),
            _ => None,
        }
    }
}

/// A materialized, not-yet-persisted transaction keyed by target field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionDraft {
    /// Physical source line this draft came from.
    pub source_line: u64,
    pub values: BTreeMap<&'static str, DraftValue>,
}

impl TransactionDraft {
    pub fn new(source_line: u64) -> Self {
        Self {
            source_line,
            values: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, field: &'static str, value: DraftValue) {
        self.values.insert(field, value);
    }

    pub fn get(&self, field: &str) -> Option<&DraftValue> {
        self.values.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(DraftValue::as_text)
    }

    pub fn amount(&self) -> Option<f64> {
        self.get(FIELD_AMOUNT).and_then(DraftValue::as_amount)
    }

    pub fn reference(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(DraftValue::as_reference)
    }
}
