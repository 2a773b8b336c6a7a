use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable handle identifying one conversation partner.
///
/// Phone-number-like; the transport prefix (`whatsapp:`) is stripped at the
/// webhook boundary so the rest of the system never sees it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SenderId(pub String);

impl SenderId {
    /// Build a sender identity from the raw transport `From` field.
    pub fn from_transport(raw: &str) -> Self {
        Self(raw.strip_prefix("whatsapp:").unwrap_or(raw).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SenderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Apply the kind's sign to an amount (income adds, expense subtracts).
    pub fn signed(self, amount: f64) -> f64 {
        match self {
            Self::Income => amount,
            Self::Expense => -amount,
        }
    }
}

/// An unconfirmed, extracted transaction awaiting user confirmation.
///
/// All four fields must be present and non-empty for a proposal to be valid;
/// an incomplete extraction is a failure, never a partial proposal.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionProposal {
    pub kind: TransactionKind,
    pub amount: f64,
    pub category: String,
    pub description: String,
}

impl TransactionProposal {
    pub fn is_valid(&self) -> bool {
        self.amount > 0.0
            && self.amount.is_finite()
            && !self.category.trim().is_empty()
            && !self.description.trim().is_empty()
    }
}

/// One confirmed, persisted transaction.
///
/// `balance` is the running balance after this record, derived as
/// `previous balance ± amount` at append time — never recomputed globally.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LedgerRecord {
    pub timestamp: DateTime<Utc>,
    pub kind: TransactionKind,
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub balance: f64,
}

/// Per-category totals for one month, split by kind.
///
/// Categories keep first-seen order; the budget renderer depends on that for
/// deterministic tie-breaking.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CategoryTotals {
    pub income: Vec<(String, f64)>,
    pub expense: Vec<(String, f64)>,
}

impl CategoryTotals {
    pub fn add(&mut self, kind: TransactionKind, category: &str, amount: f64) {
        let bucket = match kind {
            TransactionKind::Income => &mut self.income,
            TransactionKind::Expense => &mut self.expense,
        };
        match bucket.iter_mut().find(|(c, _)| c == category) {
            Some((_, total)) => *total += amount,
            None => bucket.push((category.to_string(), amount)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Queued,
    Error,
}

/// Outcome of one outbound send. Synthetic on mock/failed deliveries.
#[derive(Clone, Debug, Serialize)]
pub struct DeliveryReceipt {
    pub sid: String,
    pub status: DeliveryStatus,
    pub to: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_id_strips_transport_prefix() {
        assert_eq!(SenderId::from_transport("whatsapp:+628123").as_str(), "+628123");
        assert_eq!(SenderId::from_transport("+628123").as_str(), "+628123");
    }

    #[test]
    fn proposal_validity() {
        let p = TransactionProposal {
            kind: TransactionKind::Expense,
            amount: 50_000.0,
            category: "general".to_string(),
            description: "spent 50000 on lunch".to_string(),
        };
        assert!(p.is_valid());
        assert!(!TransactionProposal { amount: 0.0, ..p.clone() }.is_valid());
        assert!(!TransactionProposal { category: " ".to_string(), ..p.clone() }.is_valid());
        assert!(!TransactionProposal { description: String::new(), ..p }.is_valid());
    }

    #[test]
    fn category_totals_keep_first_seen_order() {
        let mut totals = CategoryTotals::default();
        totals.add(TransactionKind::Expense, "food", 30_000.0);
        totals.add(TransactionKind::Expense, "transport", 20_000.0);
        totals.add(TransactionKind::Expense, "food", 5_000.0);
        totals.add(TransactionKind::Income, "salary", 500_000.0);

        assert_eq!(
            totals.expense,
            vec![("food".to_string(), 35_000.0), ("transport".to_string(), 20_000.0)]
        );
        assert_eq!(totals.income, vec![("salary".to_string(), 500_000.0)]);
    }
}
