//! The conversational state machine.
//!
//! State per sender is implicit in store membership: no pending entry means
//! Idle, a pending entry means AwaitingConfirmation. The confirm/cancel
//! step is the only checkpoint between free-text guesswork and a durable,
//! hard-to-reverse ledger mutation, so the pending branch accepts nothing
//! else.

use std::sync::Arc;

use chrono::{Datelike, Utc};

use crate::{
    domain::{SenderId, TransactionProposal},
    errors::ExtractionError,
    extract::TextExtractor,
    formatting::{clamp_message, format_idr, WHATSAPP_MESSAGE_LIMIT},
    ports::{ConversationStore, Ledger, MessagingPort, TextGenerator},
    report,
    store::SenderLocks,
    Result,
};

const HELP_TEXT: &str = "🤖 Financial Assistant Help\n\n\
📝 To record transactions:\n\
• Expense: 'spent 50000 on lunch'\n\
• Income: 'received 1000000 salary'\n\n\
📊 Reports:\n\
• 'balance' - Check current balance\n\
• 'report' - Monthly report\n\
• 'budget' - Budget analysis\n\n\
❓ Other commands:\n\
• 'help' - Show this message\n\
• 'cancel' - Cancel current operation";

/// Reserved Idle commands. `confirm`/`cancel` are not listed here: outside
/// the pending branch they are ordinary text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Help,
    Balance,
    Report,
    Budget,
}

impl Command {
    /// Case-insensitive match against the entire trimmed message. A message
    /// merely containing a keyword falls through to extraction.
    fn parse(trimmed: &str) -> Option<Self> {
        match trimmed.to_lowercase().as_str() {
            "help" => Some(Self::Help),
            "balance" => Some(Self::Balance),
            "report" => Some(Self::Report),
            "budget" => Some(Self::Budget),
            _ => None,
        }
    }
}

pub struct ConversationEngine {
    store: Arc<dyn ConversationStore>,
    ledger: Arc<dyn Ledger>,
    messenger: Arc<dyn MessagingPort>,
    extractor: TextExtractor,
    generator: Option<Arc<dyn TextGenerator>>,
    locks: SenderLocks,
}

impl ConversationEngine {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        ledger: Arc<dyn Ledger>,
        messenger: Arc<dyn MessagingPort>,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        Self {
            store,
            ledger,
            messenger,
            extractor: TextExtractor::new(generator.clone()),
            generator,
            locks: SenderLocks::default(),
        }
    }

    /// Handle one inbound message to completion.
    ///
    /// The sender's lock is held across the whole read-decide-write
    /// sequence; messages from different senders touch disjoint keys and
    /// proceed in parallel.
    pub async fn handle_message(&self, sender: &SenderId, text: &str) -> Result<()> {
        let _guard = self.locks.lock_sender(sender).await;
        let trimmed = text.trim();

        match self.store.get(sender).await {
            Some(pending) => self.resolve_pending(sender, pending, trimmed).await,
            None => self.handle_idle(sender, trimmed).await,
        }
    }

    async fn resolve_pending(
        &self,
        sender: &SenderId,
        pending: TransactionProposal,
        trimmed: &str,
    ) -> Result<()> {
        match trimmed.to_lowercase().as_str() {
            "confirm" => {
                let record = self.ledger.append(&pending).await?;
                self.store.remove(sender).await;
                tracing::info!(
                    sender = %sender,
                    kind = record.kind.label(),
                    amount = record.amount,
                    "transaction confirmed"
                );
                let msg = format!(
                    "✅ Transaction recorded successfully!\n💰 Current balance: {}",
                    format_idr(record.balance)
                );
                self.messenger.send(sender, &msg).await;
            }
            "cancel" => {
                self.store.remove(sender).await;
                self.messenger.send(sender, "❌ Transaction cancelled.").await;
            }
            _ => {
                // Entry stays put; the reply is not reprocessed as a new
                // message.
                self.messenger
                    .send(
                        sender,
                        "❓ Please type \"confirm\" to save the transaction or \"cancel\" to discard it.",
                    )
                    .await;
            }
        }
        Ok(())
    }

    async fn handle_idle(&self, sender: &SenderId, trimmed: &str) -> Result<()> {
        match Command::parse(trimmed) {
            Some(Command::Help) => {
                self.messenger.send(sender, HELP_TEXT).await;
            }
            Some(Command::Balance) => {
                let balance = self.ledger.current_balance().await?;
                let msg = format!("💰 Current Balance: {}", format_idr(balance));
                self.messenger.send(sender, &msg).await;
            }
            Some(Command::Report) => {
                let (month, year) = current_month_year();
                let records = self.ledger.monthly_report(month, year).await?;
                let totals = report::sum_by_kind(&records);
                let msg = format!(
                    "📊 Monthly Report\n\n💰 Total Income: {}\n💸 Total Expenses: {}\n💵 Net: {}",
                    format_idr(totals.income),
                    format_idr(totals.expense),
                    format_idr(totals.net())
                );
                self.messenger.send(sender, &msg).await;
            }
            Some(Command::Budget) => {
                let (month, year) = current_month_year();
                let totals = self.ledger.category_totals(month, year).await?;
                let msg = self.budget_message(&totals, month, year).await;
                self.messenger.send(sender, &msg).await;
            }
            None => return self.extract_new_proposal(sender, trimmed).await,
        }
        Ok(())
    }

    async fn budget_message(
        &self,
        totals: &crate::domain::CategoryTotals,
        month: u32,
        year: i32,
    ) -> String {
        if let Some(generator) = &self.generator {
            match generator.generate(&report::budget_prompt(totals, month, year)).await {
                Ok(text) if !text.trim().is_empty() => {
                    return clamp_message(&text, WHATSAPP_MESSAGE_LIMIT);
                }
                Ok(_) => tracing::warn!("empty budget narrative; using deterministic report"),
                Err(err) => {
                    tracing::warn!(%err, "budget narrative failed; using deterministic report");
                }
            }
        }
        report::render_budget(totals, month, year)
    }

    async fn extract_new_proposal(&self, sender: &SenderId, trimmed: &str) -> Result<()> {
        match self.extractor.extract(trimmed).await {
            Ok(proposal) => {
                let prompt = confirmation_prompt(&proposal);
                self.store.set(sender, proposal).await;
                self.messenger.send(sender, &prompt).await;
            }
            Err(err) => {
                tracing::debug!(sender = %sender, %err, "extraction failed");
                self.messenger.send(sender, clarification(&err)).await;
            }
        }
        Ok(())
    }
}

// Ledger timestamps are UTC; "current month" has to mean the same thing.
fn current_month_year() -> (u32, i32) {
    let now = Utc::now();
    (now.month(), now.year())
}

fn confirmation_prompt(proposal: &TransactionProposal) -> String {
    format!(
        "📝 New {} detected:\n💰 Amount: {}\n🏷️ Category: {}\n📄 Description: {}\n\n\
Type \"confirm\" to save or \"cancel\" to discard.",
        proposal.kind.label(),
        format_idr(proposal.amount),
        proposal.category,
        proposal.description
    )
}

fn clarification(err: &ExtractionError) -> &'static str {
    match err {
        ExtractionError::NoAmount => {
            "❓ I couldn't find an amount in that message. Try 'spent 50000 on lunch'."
        }
        _ => {
            "❓ I couldn't understand that as a transaction. Try 'spent 50000 on lunch' \
or 'received 1000000 salary', or type 'help'."
        }
    }
}
