use crate::error::{IndexError, ValidationError};
use crate::model::{Amount, CategoryLabel, Expense};
use crate::normalize::{exceeds_max, NormalizedInput};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The ordered collection of expense records.
///
/// Records keep their insertion order. A submission whose description already exists is folded
/// into that record rather than appended, so at most one record exists per description when
/// compared without regard to case.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    data: Vec<Expense>,
}

/// What `Ledger::apply` did with a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum Applied {
    /// The amount was added to the existing record at `index`.
    Merged { index: usize },
    /// A new record was appended at `index`.
    Created { index: usize },
}

impl Applied {
    pub fn index(&self) -> usize {
        match self {
            Applied::Merged { index } | Applied::Created { index } => *index,
        }
    }
}

impl Ledger {
    pub fn new(data: Vec<Expense>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[Expense] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Expense> {
        self.data.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expense> {
        self.data.iter()
    }

    /// Returns the position of the first record named `description`, ignoring case. Loaded data
    /// may contain duplicates, in which case the earliest one wins.
    pub fn position(&self, description: &str) -> Option<usize> {
        self.data.iter().position(|e| e.matches(description))
    }

    /// Folds `input` into the ledger.
    ///
    /// If a record with the same description exists, its amount grows by `input.amount()` and
    /// nothing else about it changes: `category` is ignored in that case. Otherwise a new record
    /// is appended with `category` and `now` as its creation date.
    ///
    /// A merge whose total would exceed `MAX_AMOUNT` is rejected and the ledger is unchanged.
    pub fn apply(
        &mut self,
        input: NormalizedInput,
        category: CategoryLabel,
        now: DateTime<Utc>,
    ) -> Result<Applied, ValidationError> {
        match self.position(input.description()) {
            Some(index) => {
                let existing = &mut self.data[index];
                let merged = existing
                    .amount
                    .checked_add(input.amount())
                    .filter(|total| !exceeds_max(*total))
                    .ok_or_else(|| {
                        ValidationError::AmountTooLarge(format!(
                            "{} + {}",
                            existing.amount.value(),
                            input.amount().value()
                        ))
                    })?;
                existing.amount = merged;
                Ok(Applied::Merged { index })
            }
            None => {
                let (description, amount) = input.into_parts();
                self.data
                    .push(Expense::new(description, amount, category, now));
                Ok(Applied::Created {
                    index: self.data.len() - 1,
                })
            }
        }
    }

    /// Removes and returns the record at `index`. The remaining records keep their order.
    pub fn remove(&mut self, index: usize) -> Result<Expense, IndexError> {
        if index >= self.data.len() {
            return Err(IndexError::new(index, self.data.len()));
        }
        Ok(self.data.remove(index))
    }

    /// The sum of all amounts in the ledger.
    pub fn total(&self) -> Amount {
        self.data.iter().map(|e| e.amount).sum()
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a Expense;
    type IntoIter = std::slice::Iter<'a, Expense>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
