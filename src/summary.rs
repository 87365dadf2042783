//! Derived, read-only views of the ledger: totals per category, totals per month and budget
//! status.
//!
//! Nothing here is cached. Every function walks the full ledger each time it is called.

use crate::model::{Amount, CategoryLabel, Ledger};
use chrono::{DateTime, Datelike, Month, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A calendar month, ordered chronologically and displayed as e.g. `March 2025`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// The month that `date` falls in, in UTC.
    pub fn of(date: DateTime<Utc>) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// 1 through 12.
    pub fn month(&self) -> u32 {
        self.month
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match u8::try_from(self.month).ok().and_then(|m| Month::try_from(m).ok()) {
            Some(month) => write!(f, "{} {}", month.name(), self.year),
            None => write!(f, "{:02}/{}", self.month, self.year),
        }
    }
}

impl Serialize for MonthKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Sums amounts per category. Categories without any records are left out.
pub fn by_category(ledger: &Ledger) -> BTreeMap<CategoryLabel, Amount> {
    let mut totals = BTreeMap::new();
    for expense in ledger {
        *totals.entry(expense.category()).or_insert(Amount::ZERO) += expense.amount();
    }
    totals
}

/// Sums amounts per calendar month of each record's creation date.
pub fn by_month(ledger: &Ledger) -> BTreeMap<MonthKey, Amount> {
    let mut totals = BTreeMap::new();
    for expense in ledger {
        *totals
            .entry(MonthKey::of(expense.date()))
            .or_insert(Amount::ZERO) += expense.amount();
    }
    totals
}

/// Spending limits per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Budgets(BTreeMap<CategoryLabel, Amount>);

impl Default for Budgets {
    fn default() -> Self {
        let limits = [
            (CategoryLabel::Food, "200"),
            (CategoryLabel::Transport, "100"),
            (CategoryLabel::Entertainment, "100"),
            (CategoryLabel::Shopping, "150"),
            (CategoryLabel::Health, "100"),
            (CategoryLabel::Bills, "300"),
        ];
        Self(
            limits
                .into_iter()
                .filter_map(|(c, s)| Amount::from_str(s).ok().map(|a| (c, a)))
                .collect(),
        )
    }
}

impl Budgets {
    pub fn new(limits: impl IntoIterator<Item = (CategoryLabel, Amount)>) -> Self {
        Self(limits.into_iter().collect())
    }

    pub fn limit(&self, category: CategoryLabel) -> Option<Amount> {
        self.0.get(&category).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CategoryLabel, Amount)> + '_ {
        self.0.iter().map(|(c, a)| (*c, *a))
    }
}

/// How one category's spending compares to its limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetStatus {
    pub category: CategoryLabel,
    pub spent: Amount,
    pub limit: Amount,
    /// Negative once the limit is exceeded.
    pub remaining: Amount,
    pub over: bool,
}

/// True iff `spent` is strictly greater than `limit`.
pub fn is_over_budget(spent: Amount, limit: Amount) -> bool {
    spent.value() > limit.value()
}

/// Compares category totals against every budgeted category. A category with no spending counts
/// as zero.
pub fn budget_report(
    totals: &BTreeMap<CategoryLabel, Amount>,
    budgets: &Budgets,
) -> Vec<BudgetStatus> {
    budgets
        .iter()
        .map(|(category, limit)| {
            let spent = totals.get(&category).copied().unwrap_or(Amount::ZERO);
            BudgetStatus {
                category,
                spent,
                limit,
                remaining: Amount::new(
                    limit
                        .value()
                        .checked_sub(spent.value())
                        .unwrap_or(Decimal::MIN),
                ),
                over: is_over_budget(spent, limit),
            }
        })
        .collect()
}

/// Everything the `summary` output shows, computed in one pass over the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: Amount,
    pub count: usize,
    pub by_category: BTreeMap<CategoryLabel, Amount>,
    pub by_month: BTreeMap<MonthKey, Amount>,
    pub budgets: Vec<BudgetStatus>,
}

impl Summary {
    pub fn new(ledger: &Ledger, budgets: &Budgets) -> Self {
        let by_category = by_category(ledger);
        let budgets = budget_report(&by_category, budgets);
        Self {
            total: ledger.total(),
            count: ledger.len(),
            by_month: by_month(ledger),
            by_category,
            budgets,
        }
    }

    /// The statuses of categories that have gone over their limit.
    pub fn over_budget(&self) -> impl Iterator<Item = &BudgetStatus> {
        self.budgets.iter().filter(|b| b.over)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Expense;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    fn on(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 30, 0).unwrap()
    }

    fn sample() -> Ledger {
        Ledger::new(vec![
            Expense::new("Coffee", amt("5.50"), CategoryLabel::Food, on(2025, 3, 2)),
            Expense::new("Bus", amt("2.00"), CategoryLabel::Transport, on(2025, 3, 20)),
            Expense::new("Groceries", amt("40"), CategoryLabel::Food, on(2025, 4, 1)),
            Expense::new("Cinema", amt("12"), CategoryLabel::Entertainment, on(2025, 4, 30)),
        ])
    }

    #[test]
    fn test_by_category() {
        let totals = by_category(&sample());
        assert_eq!(totals.len(), 3);
        assert_eq!(totals[&CategoryLabel::Food].value(), Decimal::new(4550, 2));
        assert_eq!(totals[&CategoryLabel::Transport], amt("2.00"));
        assert!(!totals.contains_key(&CategoryLabel::Health));
    }

    #[test]
    fn test_totals_of_huge_loaded_ledger_do_not_panic() {
        let ledger = Ledger::new(vec![
            Expense::new("A", Amount::new(Decimal::MAX), CategoryLabel::Food, on(2025, 3, 1)),
            Expense::new("B", Amount::new(Decimal::MAX), CategoryLabel::Food, on(2025, 3, 2)),
        ]);
        assert_eq!(by_category(&ledger)[&CategoryLabel::Food].value(), Decimal::MAX);
        assert_eq!(by_month(&ledger).values().next().unwrap().value(), Decimal::MAX);
        let summary = Summary::new(&ledger, &Budgets::default());
        assert!(summary.over_budget().any(|b| b.category == CategoryLabel::Food));
    }

    #[test]
    fn test_by_category_empty() {
        assert!(by_category(&Ledger::default()).is_empty());
    }

    #[test]
    fn test_by_month_two_months() {
        let totals = by_month(&sample());
        let keys: Vec<String> = totals.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["March 2025", "April 2025"]);
        let values: Vec<Decimal> = totals.values().map(|a| a.value()).collect();
        assert_eq!(values, vec![Decimal::new(750, 2), Decimal::from(52)]);
    }

    #[test]
    fn test_month_keys_sort_chronologically_across_years() {
        let ledger = Ledger::new(vec![
            Expense::new("A", amt("1"), CategoryLabel::Other, on(2025, 1, 5)),
            Expense::new("B", amt("1"), CategoryLabel::Other, on(2024, 12, 5)),
        ]);
        let keys: Vec<MonthKey> = by_month(&ledger).into_keys().collect();
        assert_eq!(keys[0].year(), 2024);
        assert_eq!(keys[0].month(), 12);
        assert_eq!(keys[1].to_string(), "January 2025");
    }

    #[test]
    fn test_over_budget_is_strict() {
        assert!(is_over_budget(amt("120"), amt("100")));
        assert!(!is_over_budget(amt("80"), amt("100")));
        assert!(!is_over_budget(amt("100"), amt("100")));
    }

    #[test]
    fn test_budget_report() {
        let budgets = Budgets::new([
            (CategoryLabel::Food, amt("100")),
            (CategoryLabel::Health, amt("50")),
        ]);
        let mut totals = BTreeMap::new();
        totals.insert(CategoryLabel::Food, amt("120"));
        totals.insert(CategoryLabel::Shopping, amt("999"));

        let report = budget_report(&totals, &budgets);
        assert_eq!(report.len(), 2);

        let food = &report[0];
        assert_eq!(food.category, CategoryLabel::Food);
        assert!(food.over);
        assert_eq!(food.remaining.value(), Decimal::from(-20));

        let health = &report[1];
        assert_eq!(health.category, CategoryLabel::Health);
        assert!(health.spent.is_zero());
        assert!(!health.over);

        totals.insert(CategoryLabel::Food, amt("80"));
        assert!(!budget_report(&totals, &budgets)[0].over);
    }

    #[test]
    fn test_summary() {
        let budgets = Budgets::new([(CategoryLabel::Food, amt("40"))]);
        let summary = Summary::new(&sample(), &budgets);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.total.value(), Decimal::new(5950, 2));
        let over: Vec<CategoryLabel> = summary.over_budget().map(|b| b.category).collect();
        assert_eq!(over, vec![CategoryLabel::Food]);
    }

    #[test]
    fn test_summary_serializes_month_keys_as_strings() {
        let summary = Summary::new(&sample(), &Budgets::default());
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["by_month"]["March 2025"], "7.50");
        assert_eq!(value["by_category"]["Food"], "45.50");
    }

    #[test]
    fn test_default_budgets_cover_all_but_other() {
        let budgets = Budgets::default();
        assert_eq!(budgets.iter().count(), 6);
        assert!(budgets.limit(CategoryLabel::Other).is_none());
        assert_eq!(budgets.limit(CategoryLabel::Food), Some(amt("200")));
    }
}
