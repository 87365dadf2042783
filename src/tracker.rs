//! The `Tracker` owns the ledger and coordinates everything that happens to it: normalizing
//! input, classifying new descriptions, merging, and writing the result back to the store.

use crate::classify::{categorize, Classifier};
use crate::model::{Applied, CategoryLabel, Expense, Ledger};
use crate::normalize::normalize;
use crate::store::{load_ledger, save_ledger, Store};
use crate::summary::{Budgets, Summary};
use crate::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

/// Application state: the in-memory ledger plus the collaborators it depends on.
///
/// Every mutating method takes `&mut self`, so while `add` awaits the classifier no other add or
/// delete can observe the ledger it is about to change.
pub struct Tracker {
    ledger: Ledger,
    store: Box<dyn Store + Send + Sync>,
    classifier: Box<dyn Classifier + Send + Sync>,
    budgets: Budgets,
}

/// The result of a successful `Tracker::add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Added {
    #[serde(flatten)]
    pub applied: Applied,
    pub expense: Expense,
}

impl Tracker {
    /// Loads the ledger from `store`. A missing or unreadable ledger starts out empty.
    pub async fn open(
        store: Box<dyn Store + Send + Sync>,
        classifier: Box<dyn Classifier + Send + Sync>,
        budgets: Budgets,
    ) -> Self {
        let ledger = load_ledger(store.as_ref()).await;
        Self {
            ledger,
            store,
            classifier,
            budgets,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn budgets(&self) -> &Budgets {
        &self.budgets
    }

    pub fn store(&self) -> &(dyn Store + Send + Sync) {
        self.store.as_ref()
    }

    /// Records an expense.
    ///
    /// Invalid input is rejected with a `ValidationError` before anything else happens. A
    /// description that is already in the ledger is merged without consulting the classifier,
    /// since the existing record keeps its category. New descriptions are classified, falling
    /// back to `Other` if that fails. The ledger is saved afterwards. If saving fails, the ledger in
    /// memory is left as it was.
    pub async fn add(&mut self, raw_description: &str, raw_amount: &str) -> Result<Added> {
        let input = normalize(raw_description, raw_amount)?;
        let category = match self.ledger.position(input.description()) {
            Some(ix) => {
                debug!(
                    "'{}' matches the expense at index {ix}, skipping classification",
                    input.description()
                );
                CategoryLabel::Other
            }
            None => categorize(self.classifier.as_ref(), input.description()).await,
        };

        let mut next = self.ledger.clone();
        let applied = next.apply(input, category, Utc::now())?;
        self.commit(next).await?;

        let expense = self.ledger.data()[applied.index()].clone();
        match applied {
            Applied::Merged { index } => info!(
                "Added to '{}' at index {index}, now {}",
                expense.description(),
                expense.amount()
            ),
            Applied::Created { index } => info!(
                "Created '{}' ({}) at index {index}",
                expense.description(),
                expense.category()
            ),
        }
        Ok(Added { applied, expense })
    }

    /// Deletes the expense at `index`. Fails with an `IndexError` for a position that does not
    /// exist, in which case nothing is written.
    pub async fn remove(&mut self, index: usize) -> Result<Expense> {
        let mut next = self.ledger.clone();
        let removed = next.remove(index)?;
        self.commit(next).await?;
        info!("Deleted '{}' from index {index}", removed.description());
        Ok(removed)
    }

    /// Computes totals and budget status from the current ledger.
    pub fn summary(&self) -> Summary {
        Summary::new(&self.ledger, &self.budgets)
    }

    /// Writes `next` to the store and only then makes it the current ledger, so a failed write
    /// leaves memory matching what is stored.
    async fn commit(&mut self, next: Ledger) -> Result<()> {
        save_ledger(self.store.as_mut(), &next).await?;
        self.ledger = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{IndexError, ValidationError};
    use crate::model::CategoryLabel;
    use crate::store::{load_ledger, EXPENSES};
    use crate::test::{ReadOnlyStore, Script, ScriptedClassifier, TestEnv};
    use crate::tracker::Tracker;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_coffee_scenario() {
        let env = TestEnv::new().await;
        let mut tracker = env.tracker(Script::Always(CategoryLabel::Food)).await;

        tracker.add("Coffee", "3.50").await.unwrap();
        let added = tracker.add("coffee", "2.00").await.unwrap();

        assert_eq!(added.applied.index(), 0);
        assert_eq!(tracker.ledger().len(), 1);
        let e = tracker.ledger().get(0).unwrap();
        assert_eq!(e.description(), "Coffee");
        assert_eq!(e.amount().value(), Decimal::from_str("5.50").unwrap());
        assert_eq!(e.category(), CategoryLabel::Food);
    }

    #[tokio::test]
    async fn test_bus_scenario() {
        let env = TestEnv::new().await;
        let mut tracker = env.tracker(Script::Always(CategoryLabel::Transport)).await;

        let added = tracker.add("Bus", "2.00").await.unwrap();
        assert_eq!(added.expense.category(), CategoryLabel::Transport);

        tracker.remove(0).await.unwrap();
        assert!(tracker.ledger().is_empty());
        assert!(load_ledger(tracker.store()).await.is_empty());
    }

    #[tokio::test]
    async fn test_classifier_failure_gives_other() {
        let env = TestEnv::new().await;
        let mut tracker = env.tracker(Script::Fail).await;
        let added = tracker.add("Mystery box", "10").await.unwrap();
        assert_eq!(added.expense.category(), CategoryLabel::Other);
        assert_eq!(tracker.ledger().len(), 1);
    }

    #[tokio::test]
    async fn test_merge_does_not_reclassify() {
        let env = TestEnv::new().await;
        let mut tracker = env
            .tracker(Script::Sequence(vec![
                CategoryLabel::Food,
                CategoryLabel::Shopping,
            ]))
            .await;
        tracker.add("Lunch", "10").await.unwrap();
        tracker.add("LUNCH", "5").await.unwrap();
        tracker.add("Shoes", "60").await.unwrap();

        let ledger = tracker.ledger();
        assert_eq!(ledger.get(0).unwrap().category(), CategoryLabel::Food);
        // The second classification went to the new description, not the merge.
        assert_eq!(ledger.get(1).unwrap().category(), CategoryLabel::Shopping);
    }

    #[tokio::test]
    async fn test_validation_rejects_without_writing() {
        let env = TestEnv::new().await;
        let mut tracker = env.tracker(Script::Always(CategoryLabel::Food)).await;

        let err = tracker.add("   ", "3").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::EmptyDescription)
        );
        let err = tracker.add("Coffee", "-3").await.unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_some());

        assert!(tracker.ledger().is_empty());
        assert!(tracker.store().get(EXPENSES).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_out_of_range() {
        let env = TestEnv::new().await;
        let mut tracker = env.tracker(Script::Always(CategoryLabel::Food)).await;
        tracker.add("Coffee", "3").await.unwrap();

        let err = tracker.remove(3).await.unwrap_err();
        let index_error = err.downcast_ref::<IndexError>().unwrap();
        assert_eq!(index_error.index(), 3);
        assert_eq!(tracker.ledger().len(), 1);
    }

    #[tokio::test]
    async fn test_every_mutation_is_persisted() {
        let env = TestEnv::new().await;
        let mut tracker = env.tracker(Script::Always(CategoryLabel::Bills)).await;
        tracker.add("Rent", "900").await.unwrap();
        tracker.add("Water", "30").await.unwrap();
        tracker.add("rent", "100").await.unwrap();
        assert_eq!(&load_ledger(tracker.store()).await, tracker.ledger());

        tracker.remove(1).await.unwrap();
        let stored = load_ledger(tracker.store()).await;
        assert_eq!(&stored, tracker.ledger());
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.total().value(), Decimal::from(1000));
    }

    #[tokio::test]
    async fn test_reopen_from_file_store() {
        let env = TestEnv::new().await;
        {
            let mut tracker = env.file_tracker(Script::Always(CategoryLabel::Health)).await;
            tracker.add("Pharmacy", "12.40").await.unwrap();
        }
        let tracker = env.file_tracker(Script::Fail).await;
        assert_eq!(tracker.ledger().len(), 1);
        assert_eq!(
            tracker.ledger().get(0).unwrap().category(),
            CategoryLabel::Health
        );
    }

    #[tokio::test]
    async fn test_failed_save_leaves_ledger_unchanged() {
        let env = TestEnv::new().await;
        let mut seeded = env.tracker(Script::Always(CategoryLabel::Food)).await;
        seeded.add("Coffee", "3").await.unwrap();
        let raw = seeded.store().get(EXPENSES).await.unwrap().unwrap();

        let mut tracker = Tracker::open(
            Box::new(ReadOnlyStore::with_ledger(&raw)),
            Box::new(ScriptedClassifier::new(Script::Always(CategoryLabel::Food))),
            env.config().budgets().clone(),
        )
        .await;
        assert_eq!(tracker.ledger().len(), 1);

        assert!(tracker.add("Coffee", "2").await.is_err());
        assert!(tracker.add("Bagel", "4").await.is_err());
        assert_eq!(tracker.ledger().len(), 1);
        assert_eq!(
            tracker.ledger().get(0).unwrap().amount().value(),
            Decimal::from(3)
        );

        assert!(tracker.remove(0).await.is_err());
        assert_eq!(tracker.ledger().len(), 1);
        assert_eq!(&load_ledger(tracker.store()).await, tracker.ledger());
    }

    #[tokio::test]
    async fn test_overflowing_merge_is_rejected() {
        let env = TestEnv::new().await;
        let mut tracker = env.tracker(Script::Always(CategoryLabel::Other)).await;
        tracker.add("Big", "1000000000000").await.unwrap();
        let err = tracker.add("big", "1").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::AmountTooLarge(_))
        ));
        assert_eq!(&load_ledger(tracker.store()).await, tracker.ledger());
        assert_eq!(
            tracker.ledger().get(0).unwrap().amount().value(),
            Decimal::from(1_000_000_000_000u64)
        );

        let err = tracker
            .add("Huge", "79228162514264337593543950335")
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_some());
        assert_eq!(tracker.ledger().len(), 1);
    }

    #[tokio::test]
    async fn test_summary_uses_configured_budgets() {
        let env = TestEnv::new().await;
        let mut tracker = env.tracker(Script::Always(CategoryLabel::Food)).await;
        tracker.add("Groceries", "250").await.unwrap();
        let summary = tracker.summary();
        let over: Vec<CategoryLabel> = summary.over_budget().map(|b| b.category).collect();
        assert_eq!(over, vec![CategoryLabel::Food]);
    }
}
