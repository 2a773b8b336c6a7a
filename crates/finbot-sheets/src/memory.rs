use async_trait::async_trait;
use chrono::{Datelike, Utc};
use tokio::sync::Mutex;

use finbot_core::{
    domain::{CategoryTotals, LedgerRecord, TransactionProposal},
    ports::Ledger,
    report, Result,
};

/// In-memory ledger.
///
/// Doubles as the mock variant (no Sheets credentials) and as the
/// degradation buffer inside `SheetsLedger`. Append-only; the running
/// balance is derived from the previous record at append time.
#[derive(Default)]
pub struct MemoryLedger {
    records: Mutex<Vec<LedgerRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn append(&self, proposal: &TransactionProposal) -> Result<LedgerRecord> {
        let mut records = self.records.lock().await;
        let previous = records.last().map(|r| r.balance).unwrap_or(0.0);
        let record = LedgerRecord {
            timestamp: Utc::now(),
            kind: proposal.kind,
            amount: proposal.amount,
            category: proposal.category.clone(),
            description: proposal.description.clone(),
            balance: previous + proposal.kind.signed(proposal.amount),
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn current_balance(&self) -> Result<f64> {
        Ok(self.records.lock().await.last().map(|r| r.balance).unwrap_or(0.0))
    }

    async fn monthly_report(&self, month: u32, year: i32) -> Result<Vec<LedgerRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .filter(|r| r.timestamp.month() == month && r.timestamp.year() == year)
            .cloned()
            .collect())
    }

    async fn category_totals(&self, month: u32, year: i32) -> Result<CategoryTotals> {
        Ok(report::totals_from_records(
            &self.monthly_report(month, year).await?,
        ))
    }

    async fn recent_records(&self, limit: usize) -> Result<Vec<LedgerRecord>> {
        let records = self.records.lock().await;
        let skip = records.len().saturating_sub(limit);
        Ok(records[skip..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finbot_core::domain::TransactionKind;

    fn proposal(kind: TransactionKind, amount: f64, category: &str) -> TransactionProposal {
        TransactionProposal {
            kind,
            amount,
            category: category.to_string(),
            description: format!("{category} {amount}"),
        }
    }

    #[tokio::test]
    async fn running_balance_is_derived_at_append_time() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.current_balance().await.unwrap(), 0.0);

        let first = ledger
            .append(&proposal(TransactionKind::Income, 1_000_000.0, "salary"))
            .await
            .unwrap();
        assert_eq!(first.balance, 1_000_000.0);

        let second = ledger
            .append(&proposal(TransactionKind::Expense, 50_000.0, "food"))
            .await
            .unwrap();
        assert_eq!(second.balance, 950_000.0);
        assert_eq!(ledger.current_balance().await.unwrap(), 950_000.0);
    }

    #[tokio::test]
    async fn monthly_report_and_totals_cover_current_month() {
        let ledger = MemoryLedger::new();
        ledger
            .append(&proposal(TransactionKind::Expense, 30_000.0, "food"))
            .await
            .unwrap();
        ledger
            .append(&proposal(TransactionKind::Expense, 20_000.0, "transport"))
            .await
            .unwrap();
        ledger
            .append(&proposal(TransactionKind::Income, 500_000.0, "salary"))
            .await
            .unwrap();

        let now = Utc::now();
        let records = ledger.monthly_report(now.month(), now.year()).await.unwrap();
        assert_eq!(records.len(), 3);

        let totals = ledger.category_totals(now.month(), now.year()).await.unwrap();
        assert_eq!(
            totals.expense,
            vec![("food".to_string(), 30_000.0), ("transport".to_string(), 20_000.0)]
        );
        assert_eq!(totals.income, vec![("salary".to_string(), 500_000.0)]);

        // A different month is empty.
        let other_month = if now.month() == 1 { 2 } else { now.month() - 1 };
        assert!(ledger.monthly_report(other_month, now.year()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn recent_records_keeps_the_tail() {
        let ledger = MemoryLedger::new();
        for i in 1..=5 {
            ledger
                .append(&proposal(TransactionKind::Expense, i as f64, "general"))
                .await
                .unwrap();
        }

        let recent = ledger.recent_records(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].amount, 4.0);
        assert_eq!(recent[1].amount, 5.0);

        assert_eq!(ledger.recent_records(50).await.unwrap().len(), 5);
    }
}
