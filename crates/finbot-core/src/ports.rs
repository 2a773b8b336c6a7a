use async_trait::async_trait;

use crate::{
    domain::{CategoryTotals, DeliveryReceipt, LedgerRecord, SenderId, TransactionProposal},
    Result,
};

/// Pending-proposal store: at most one proposal per sender.
///
/// Only the conversation engine creates or deletes entries. The trait exists
/// so the in-memory map can be swapped for a durable or distributed store
/// without touching state-machine logic.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn has(&self, sender: &SenderId) -> bool;
    async fn get(&self, sender: &SenderId) -> Option<TransactionProposal>;
    /// Overwrites any existing entry; proposals are never merged.
    async fn set(&self, sender: &SenderId, proposal: TransactionProposal);
    /// No-op when there is nothing to remove.
    async fn remove(&self, sender: &SenderId);
}

/// Append-only financial record store with a running balance.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Append a confirmed transaction and return the persisted record
    /// (carrying the running balance after the append).
    async fn append(&self, proposal: &TransactionProposal) -> Result<LedgerRecord>;

    async fn current_balance(&self) -> Result<f64>;

    /// All records falling in the given month (1-12) of the given year.
    async fn monthly_report(&self, month: u32, year: i32) -> Result<Vec<LedgerRecord>>;

    async fn category_totals(&self, month: u32, year: i32) -> Result<CategoryTotals>;

    /// Most recent records, oldest first. Dashboard surface.
    async fn recent_records(&self, limit: usize) -> Result<Vec<LedgerRecord>>;
}

/// Outbound message delivery.
///
/// Sending never fails the caller: implementations log delivery errors and
/// return a synthetic `Error` receipt instead. A confirmed ledger append is
/// never rolled back because its receipt could not be delivered.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send(&self, to: &SenderId, body: &str) -> DeliveryReceipt;
}

/// Black-box generative text backend (Gemini today).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
