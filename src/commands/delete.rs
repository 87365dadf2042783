//! Delete command handler.

use crate::args::DeleteArgs;
use crate::classify::Mode;
use crate::commands::{open_tracker, Out};
use crate::model::Expense;
use crate::{Config, Result};

/// Deletes the expense at the index given in `args`. Later expenses move up by one.
///
/// An index past the end of the ledger is an error and nothing is written.
pub async fn delete(config: Config, mode: Mode, args: DeleteArgs) -> Result<Out<Expense>> {
    let mut tracker = open_tracker(&config, mode).await?;
    let removed = tracker.remove(args.index()).await?;
    let message = format!(
        "Deleted '{}' ({}), {} expense{} left",
        removed.description(),
        removed.amount(),
        tracker.ledger().len(),
        if tracker.ledger().len() == 1 { "" } else { "s" }
    );
    Ok(Out::new(message, removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::AddArgs;
    use crate::commands::{add, read_ledger};
    use crate::error::IndexError;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_delete_shifts_later_expenses() {
        let env = TestEnv::new().await;
        for (d, a) in [("Coffee", "3"), ("Bus", "2"), ("Rent", "900")] {
            add(env.config(), Mode::Test, AddArgs::new(d, a)).await.unwrap();
        }

        let out = delete(env.config(), Mode::Test, DeleteArgs::new(1))
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().description(), "Bus");
        assert!(out.message().ends_with("2 expenses left"));

        let ledger = read_ledger(&env.config()).await;
        let names: Vec<&str> = ledger.iter().map(|e| e.description()).collect();
        assert_eq!(names, vec!["Coffee", "Rent"]);
    }

    #[tokio::test]
    async fn test_delete_out_of_range() {
        let env = TestEnv::new().await;
        let err = delete(env.config(), Mode::Test, DeleteArgs::new(0))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<IndexError>().is_some());
        assert!(err.to_string().contains("the ledger is empty"));
    }
}
