//! Read-only commands: listing, summarizing and charting the ledger.

use crate::chart::{pie_slices, render_svg, Slice};
use crate::commands::{read_ledger, Out};
use crate::model::Ledger;
use crate::summary::Summary;
use crate::{utils, Config, Result};
use std::fmt::Write;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Lists every expense with the index the delete command takes.
pub async fn list(config: Config) -> Result<Out<Ledger>> {
    let ledger = read_ledger(&config).await;
    if ledger.is_empty() {
        return Ok(Out::new("No expenses yet", ledger));
    }

    let width = ledger
        .iter()
        .map(|e| e.description().chars().count())
        .max()
        .unwrap_or_default();
    let mut message = String::new();
    for (ix, e) in ledger.iter().enumerate() {
        let _ = writeln!(
            message,
            "{ix:>4}  {:<width$}  {:<13}  {:>12}  {}",
            e.description(),
            e.category().as_str(),
            e.amount().to_string(),
            e.date().format(DATE_FORMAT),
        );
    }
    let _ = write!(message, "Total: {}", ledger.total());
    Ok(Out::new(message, ledger))
}

/// Shows totals per category and per month, then each budget and whether it is exceeded.
pub async fn summary(config: Config) -> Result<Out<Summary>> {
    let ledger = read_ledger(&config).await;
    let summary = Summary::new(&ledger, config.budgets());

    let mut message = format!(
        "Total: {} across {} expense{}",
        summary.total,
        summary.count,
        if summary.count == 1 { "" } else { "s" }
    );

    if !summary.by_category.is_empty() {
        message.push_str("\n\nBy category:");
        for (category, total) in &summary.by_category {
            let _ = write!(message, "\n  {:<13}  {:>12}", category.as_str(), total.to_string());
        }
    }

    if !summary.by_month.is_empty() {
        message.push_str("\n\nBy month:");
        for (month, total) in &summary.by_month {
            let _ = write!(message, "\n  {:<15}  {:>12}", month.to_string(), total.to_string());
        }
    }

    if !summary.budgets.is_empty() {
        message.push_str("\n\nBudgets:");
        for status in &summary.budgets {
            let _ = write!(
                message,
                "\n  {:<13}  {:>12} of {:>10}  {}",
                status.category.as_str(),
                status.spent.to_string(),
                status.limit.to_string(),
                if status.over {
                    "OVER BUDGET".to_string()
                } else {
                    format!("{} left", status.remaining)
                }
            );
        }
    }

    Ok(Out::new(message, summary))
}

/// Writes a pie chart of the per-category totals to `output` as SVG.
pub async fn chart(config: Config, output: &Path) -> Result<Out<Vec<Slice>>> {
    let ledger = read_ledger(&config).await;
    let summary = Summary::new(&ledger, config.budgets());
    let slices = pie_slices(&summary.by_category);
    utils::write(output, render_svg(&slices)).await?;
    Ok(Out::new(
        format!(
            "Wrote a chart of {} categor{} to {}",
            slices.len(),
            if slices.len() == 1 { "y" } else { "ies" },
            output.display()
        ),
        slices,
    ))
}
