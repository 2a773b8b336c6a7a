use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    domain::{SenderId, TransactionProposal},
    ports::ConversationStore,
};

/// Process-local pending-proposal store.
///
/// Unbounded and non-persistent: a restart silently discards all pending
/// proposals. Confirmed transactions already in the ledger are unaffected.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<SenderId, TransactionProposal>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn has(&self, sender: &SenderId) -> bool {
        self.inner.lock().await.contains_key(sender)
    }

    async fn get(&self, sender: &SenderId) -> Option<TransactionProposal> {
        self.inner.lock().await.get(sender).cloned()
    }

    async fn set(&self, sender: &SenderId, proposal: TransactionProposal) {
        self.inner.lock().await.insert(sender.clone(), proposal);
    }

    async fn remove(&self, sender: &SenderId) {
        self.inner.lock().await.remove(sender);
    }
}

/// Per-sender mutual exclusion.
///
/// The engine holds a sender's lock across its whole read-decide-write
/// sequence, so two concurrent messages from the same sender serialize while
/// different senders proceed in parallel.
#[derive(Default)]
pub struct SenderLocks {
    inner: Mutex<HashMap<SenderId, Arc<Mutex<()>>>>,
}

impl SenderLocks {
    pub async fn lock_sender(&self, sender: &SenderId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(sender.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
