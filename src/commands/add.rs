use crate::args::AddArgs;
use crate::classify::Mode;
use crate::commands::{open_tracker, Out};
use crate::error::ValidationError;
use crate::model::Applied;
use crate::tracker::Added;
use crate::{Config, Result};

/// Records an expense, merging it into an existing one with the same description.
///
/// Input that fails validation is not an error: the ledger is left untouched and the returned
/// message says why. Failures to read the configuration or write the store are errors.
pub async fn add(config: Config, mode: Mode, args: AddArgs) -> Result<Out<Added>> {
    let mut tracker = open_tracker(&config, mode).await?;
    let added = match tracker.add(args.description(), args.amount()).await {
        Ok(added) => added,
        Err(e) => {
            return match e.downcast::<ValidationError>() {
                Ok(invalid) => Ok(Out::new_message(format!("Expense not added: {invalid}"))),
                Err(e) => Err(e),
            }
        }
    };

    let e = &added.expense;
    let message = match added.applied {
        Applied::Merged { index } => format!(
            "Added {} to '{}' at index {index}, the total is now {}",
            args.amount().trim(),
            e.description(),
            e.amount()
        ),
        Applied::Created { index } => format!(
            "Added '{}' for {} as {} at index {index}",
            e.description(),
            e.amount(),
            e.category()
        ),
    };
    Ok(Out::new(message, added))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CategoryLabel;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_add_and_merge() {
        let env = TestEnv::new().await;
        let out = add(env.config(), Mode::Test, AddArgs::new("coffee", "3.50"))
            .await
            .unwrap();
        let added = out.structure().unwrap();
        assert!(matches!(added.applied, Applied::Created { index: 0 }));
        assert_eq!(added.expense.description(), "Coffee");
        assert_eq!(added.expense.category(), CategoryLabel::Food);

        let out = add(env.config(), Mode::Test, AddArgs::new("COFFEE", "$2"))
            .await
            .unwrap();
        let added = out.structure().unwrap();
        assert!(matches!(added.applied, Applied::Merged { index: 0 }));
        assert_eq!(added.expense.amount().to_string(), "$5.50");
        assert!(out.message().contains("$5.50"));
    }

    #[tokio::test]
    async fn test_add_rejects_bad_input() {
        let env = TestEnv::new().await;
        let out = add(env.config(), Mode::Test, AddArgs::new("Coffee", "abc"))
            .await
            .unwrap();
        assert!(out.structure().is_none());
        assert!(out.message().starts_with("Expense not added"));

        let out = add(env.config(), Mode::Test, AddArgs::new("  ", "3"))
            .await
            .unwrap();
        assert!(out.structure().is_none());

        let ledger = crate::commands::read_ledger(&env.config()).await;
        assert!(ledger.is_empty());
    }
}
