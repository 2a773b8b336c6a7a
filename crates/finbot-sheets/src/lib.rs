//! Google Sheets ledger adapter.
//!
//! Persists confirmed transactions as rows in a `Transactions` sheet
//! (`timestamp, kind, amount, category, description, balance`) via the
//! Sheets v4 values API. Any append/query failure logs a degradation
//! warning and transparently falls back to an in-memory buffer — the
//! caller-visible flow keeps working and the user is not told the write is
//! unpersisted.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde_json::{json, Value};

use finbot_core::{
    domain::{CategoryTotals, LedgerRecord, TransactionKind, TransactionProposal},
    errors::Error,
    ports::Ledger,
    report, Result,
};

pub mod memory;

pub use memory::MemoryLedger;

const RANGE: &str = "Transactions!A2:F";
const APPEND_RANGE: &str = "Transactions!A:F";

pub struct SheetsLedger {
    spreadsheet_id: String,
    token: String,
    http: reqwest::Client,
    fallback: MemoryLedger,
}

impl SheetsLedger {
    pub fn new(spreadsheet_id: impl Into<String>, token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("reqwest client build");
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            token: token.into(),
            http,
            fallback: MemoryLedger::new(),
        }
    }

    async fn fetch_rows(&self) -> Result<Vec<LedgerRecord>> {
        let url = format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{RANGE}",
            self.spreadsheet_id
        );
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::External(format!("sheets request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "sheets read failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let v: Value = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("sheets json error: {e}")))?;

        let rows = v
            .get("values")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match row.as_array().and_then(|cells| parse_row(cells)) {
                Some(record) => records.push(record),
                None => tracing::warn!(?row, "skipping malformed ledger row"),
            }
        }
        Ok(records)
    }

    async fn try_append(&self, proposal: &TransactionProposal) -> Result<LedgerRecord> {
        let previous = self
            .fetch_rows()
            .await?
            .last()
            .map(|r| r.balance)
            .unwrap_or(0.0);

        let record = LedgerRecord {
            timestamp: Utc::now(),
            kind: proposal.kind,
            amount: proposal.amount,
            category: proposal.category.clone(),
            description: proposal.description.clone(),
            balance: previous + proposal.kind.signed(proposal.amount),
        };

        let url = format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{APPEND_RANGE}:append?valueInputOption=RAW",
            self.spreadsheet_id
        );
        let body = json!({
            "values": [[
                record.timestamp.to_rfc3339(),
                record.kind.label(),
                record.amount,
                record.category,
                record.description,
                record.balance,
            ]]
        });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::External(format!("sheets request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "sheets append failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(record)
    }
}

#[async_trait]
impl Ledger for SheetsLedger {
    async fn append(&self, proposal: &TransactionProposal) -> Result<LedgerRecord> {
        match self.try_append(proposal).await {
            Ok(record) => Ok(record),
            Err(err) => {
                tracing::warn!(%err, "persistence degraded; buffering append in memory");
                self.fallback.append(proposal).await
            }
        }
    }

    async fn current_balance(&self) -> Result<f64> {
        match self.fetch_rows().await {
            Ok(records) => Ok(records.last().map(|r| r.balance).unwrap_or(0.0)),
            Err(err) => {
                tracing::warn!(%err, "persistence degraded; answering balance from buffer");
                self.fallback.current_balance().await
            }
        }
    }

    async fn monthly_report(&self, month: u32, year: i32) -> Result<Vec<LedgerRecord>> {
        match self.fetch_rows().await {
            Ok(records) => Ok(records
                .into_iter()
                .filter(|r| r.timestamp.month() == month && r.timestamp.year() == year)
                .collect()),
            Err(err) => {
                tracing::warn!(%err, "persistence degraded; answering report from buffer");
                self.fallback.monthly_report(month, year).await
            }
        }
    }

    async fn category_totals(&self, month: u32, year: i32) -> Result<CategoryTotals> {
        Ok(report::totals_from_records(
            &self.monthly_report(month, year).await?,
        ))
    }

    async fn recent_records(&self, limit: usize) -> Result<Vec<LedgerRecord>> {
        match self.fetch_rows().await {
            Ok(records) => {
                let skip = records.len().saturating_sub(limit);
                Ok(records[skip..].to_vec())
            }
            Err(err) => {
                tracing::warn!(%err, "persistence degraded; answering records from buffer");
                self.fallback.recent_records(limit).await
            }
        }
    }
}

/// One sheet row → record. Cells arrive as strings with RAW input, but
/// numeric cells may come back as JSON numbers; accept both.
fn parse_row(cells: &[Value]) -> Option<LedgerRecord> {
    if cells.len() < 6 {
        return None;
    }

    let timestamp = DateTime::parse_from_rfc3339(cells[0].as_str()?)
        .ok()?
        .with_timezone(&Utc);
    let kind = match cells[1].as_str()? {
        "income" => TransactionKind::Income,
        "expense" => TransactionKind::Expense,
        _ => return None,
    };

    Some(LedgerRecord {
        timestamp,
        kind,
        amount: cell_number(&cells[2])?,
        category: cells[3].as_str()?.to_string(),
        description: cells[4].as_str()?.to_string(),
        balance: cell_number(&cells[5])?,
    })
}

fn cell_number(cell: &Value) -> Option<f64> {
    match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
