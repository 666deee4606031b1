use rusqlite::Connection;

use crate::db;
use crate::error::Result;

/// One entry of a finite selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupChoice {
    pub id: i64,
    pub label: String,
}

/// Which finite set a reference selector draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    Accounts,
    TransactionTypes { income: bool },
}

impl LookupSource {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::TransactionTypes { income: true } => "income transaction types",
            Self::TransactionTypes { income: false } => "spend transaction types",
        }
    }
}

/// Supplies the choice sets for reference fields.
pub trait LookupProvider {
    fn accounts(&self) -> Result<Vec<LookupChoice>>;
    fn transaction_types(&self, income: bool) -> Result<Vec<LookupChoice>>;

    fn choices(&self, source: LookupSource) -> Result<Vec<LookupChoice>> {
        match source {
            LookupSource::Accounts => self.accounts(),
            LookupSource::TransactionTypes { income } => self.transaction_types(income),
        }
    }

    fn contains(&self, source: LookupSource, id: i64) -> Result<bool> {
        Ok(self.choices(source)?.iter().any(|c| c.id == id))
    }
}

impl LookupProvider for Connection {
    fn accounts(&self) -> Result<Vec<LookupChoice>> {
        Ok(db::list_accounts(self)?
            .into_iter()
            .map(|a| LookupChoice {
                id: a.id,
                label: a.name,
            })
            .collect())
    }

    fn transaction_types(&self, income: bool) -> Result<Vec<LookupChoice>> {
        Ok(db::list_transaction_types(self)?
            .into_iter()
            .filter(|t| t.is_income == income)
            .map(|t| LookupChoice {
                id: t.id,
                label: t.name,
            })
            .collect())
    }
}

/// Fixed in-memory choice sets.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    pub accounts: Vec<LookupChoice>,
    pub income_types: Vec<LookupChoice>,
    pub spend_types: Vec<LookupChoice>,
}

#[cfg(test)]
impl StaticLookup {
    pub fn sample() -> Self {
        let choice = |id: i64, label: &str| LookupChoice {
            id,
            label: label.to_string(),
        };
        Self {
            accounts: vec![choice(1, "Checking"), choice(2, "Savings")],
            income_types: vec![choice(10, "Salary"), choice(11, "Interest")],
            spend_types: vec![choice(20, "Groceries"), choice(21, "Dining")],
        }
    }
}

#[cfg(test)]
impl LookupProvider for StaticLookup {
    fn accounts(&self) -> Result<Vec<LookupChoice>> {
        Ok(self.accounts.clone())
    }

    fn transaction_types(&self, income: bool) -> Result<Vec<LookupChoice>> {
        Ok(if income {
            self.income_types.clone()
        } else {
            self.spend_types.clone()
        })
    }
}
