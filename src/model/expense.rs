use crate::model::{Amount, CategoryLabel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry in the ledger.
///
/// `category` and `date` are fixed when the record is created. Later submissions with the same
/// description only ever add to `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub(crate) description: String,
    pub(crate) amount: Amount,
    /// Entries written before categorization existed have no category.
    #[serde(default)]
    pub(crate) category: CategoryLabel,
    pub(crate) date: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        description: impl Into<String>,
        amount: Amount,
        category: CategoryLabel,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            category,
            date,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> CategoryLabel {
        self.category
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// True when `description` names this record, ignoring case.
    pub fn matches(&self, description: &str) -> bool {
        self.description.to_lowercase() == description.to_lowercase()
    }
}
