//! Pure aggregation and rendering over ledger records.
//!
//! Nothing in here touches the state machine; the budget narrative is a
//! stateless text transform over per-category totals.

use crate::domain::{CategoryTotals, LedgerRecord, TransactionKind};
use crate::formatting::format_idr;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MonthlyTotals {
    pub income: f64,
    pub expense: f64,
}

impl MonthlyTotals {
    pub fn net(&self) -> f64 {
        self.income - self.expense
    }
}

pub fn sum_by_kind(records: &[LedgerRecord]) -> MonthlyTotals {
    let mut totals = MonthlyTotals::default();
    for record in records {
        match record.kind {
            TransactionKind::Income => totals.income += record.amount,
            TransactionKind::Expense => totals.expense += record.amount,
        }
    }
    totals
}

pub fn totals_from_records(records: &[LedgerRecord]) -> CategoryTotals {
    let mut totals = CategoryTotals::default();
    for record in records {
        totals.add(record.kind, &record.category, record.amount);
    }
    totals
}

/// Deterministic budget report: income/expense totals plus the top-3 expense
/// categories by amount, descending, ties broken by first-seen order.
pub fn render_budget(totals: &CategoryTotals, month: u32, year: i32) -> String {
    let income: f64 = totals.income.iter().map(|(_, t)| t).sum();
    let expense: f64 = totals.expense.iter().map(|(_, t)| t).sum();

    let mut out = format!(
        "📊 Budget Analysis — {} {year}\n\n💰 Income: {}\n💸 Expenses: {}\n💵 Net: {}",
        month_name(month),
        format_idr(income),
        format_idr(expense),
        format_idr(income - expense),
    );

    let top = top_expense_categories(totals, 3);
    if top.is_empty() {
        out.push_str("\n\nNo expenses recorded this month.");
    } else {
        out.push_str("\n\nTop spending categories:");
        for (i, (category, total)) in top.iter().enumerate() {
            out.push_str(&format!("\n{}. {category}: {}", i + 1, format_idr(*total)));
        }
    }
    out
}

fn top_expense_categories(totals: &CategoryTotals, n: usize) -> Vec<(String, f64)> {
    let mut ranked = totals.expense.clone();
    // Stable sort keeps first-seen order for equal totals.
    ranked.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(n);
    ranked
}

/// Prompt for the AI-narrated variant of the budget report.
pub fn budget_prompt(totals: &CategoryTotals, month: u32, year: i32) -> String {
    let mut lines = String::new();
    for (category, total) in &totals.income {
        lines.push_str(&format!("income / {category}: {total}\n"));
    }
    for (category, total) in &totals.expense {
        lines.push_str(&format!("expense / {category}: {total}\n"));
    }
    if lines.is_empty() {
        lines.push_str("(no records this month)\n");
    }

    format!(
        "You are a personal-finance assistant. Write a short, friendly budget \
analysis for {} {year} from the per-category totals below (amounts in \
Indonesian rupiah). Point out the biggest spending categories and one \
practical suggestion. Plain text only, under 1000 characters.\n\n{lines}",
        month_name(month)
    )
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(kind: TransactionKind, amount: f64, category: &str) -> LedgerRecord {
        LedgerRecord {
            timestamp: Utc::now(),
            kind,
            amount,
            category: category.to_string(),
            description: category.to_string(),
            balance: 0.0,
        }
    }

    #[test]
    fn sums_by_kind() {
        let records = vec![
            record(TransactionKind::Expense, 30_000.0, "food"),
            record(TransactionKind::Expense, 20_000.0, "transport"),
            record(TransactionKind::Income, 500_000.0, "salary"),
        ];
        let totals = sum_by_kind(&records);
        assert_eq!(totals.income, 500_000.0);
        assert_eq!(totals.expense, 50_000.0);
        assert_eq!(totals.net(), 450_000.0);
    }

    #[test]
    fn category_totals_example() {
        let records = vec![
            record(TransactionKind::Expense, 30_000.0, "food"),
            record(TransactionKind::Expense, 20_000.0, "transport"),
            record(TransactionKind::Income, 500_000.0, "salary"),
        ];
        let totals = totals_from_records(&records);
        assert_eq!(
            totals.expense,
            vec![("food".to_string(), 30_000.0), ("transport".to_string(), 20_000.0)]
        );
        assert_eq!(totals.income, vec![("salary".to_string(), 500_000.0)]);
    }

    #[test]
    fn top_categories_rank_descending_with_first_seen_ties() {
        let mut totals = CategoryTotals::default();
        totals.add(TransactionKind::Expense, "food", 10_000.0);
        totals.add(TransactionKind::Expense, "transport", 25_000.0);
        totals.add(TransactionKind::Expense, "bills", 10_000.0);
        totals.add(TransactionKind::Expense, "misc", 1_000.0);

        let top = top_expense_categories(&totals, 3);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].0, "transport");
        // food and bills tie; food was seen first.
        assert_eq!(top[1].0, "food");
        assert_eq!(top[2].0, "bills");
    }

    #[test]
    fn render_budget_mentions_totals_and_ranking() {
        let mut totals = CategoryTotals::default();
        totals.add(TransactionKind::Income, "salary", 500_000.0);
        totals.add(TransactionKind::Expense, "food", 30_000.0);
        totals.add(TransactionKind::Expense, "transport", 20_000.0);

        let text = render_budget(&totals, 8, 2026);
        assert!(text.contains("August 2026"));
        assert!(text.contains("Rp 500.000"));
        assert!(text.contains("1. food: Rp 30.000"));
        assert!(text.contains("2. transport: Rp 20.000"));
    }

    #[test]
    fn render_budget_with_no_expenses() {
        let totals = CategoryTotals::default();
        let text = render_budget(&totals, 1, 2026);
        assert!(text.contains("No expenses recorded"));
    }
}
