//! Types that represent the core data model, such as `Expense` and `Ledger`.
mod amount;
mod category;
mod expense;
mod ledger;

pub use amount::{Amount, AmountError};
pub use category::CategoryLabel;
pub use expense::Expense;
pub use ledger::{Applied, Ledger};
