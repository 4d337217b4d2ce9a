use crate::domain::ports::{Notice, Notifier};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Collects notices in memory for a host-side dispatcher to drain.
///
/// Services enqueue only after the state change a notice describes has
/// committed, so draining and delivering best-effort is safe.
#[derive(Default, Clone)]
pub struct OutboxNotifier {
    queue: Arc<RwLock<Vec<Notice>>>,
}

impl OutboxNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes all queued notices, leaving the outbox empty.
    pub async fn drain(&self) -> Vec<Notice> {
        let mut queue = self.queue.write().await;
        std::mem::take(&mut *queue)
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn enqueue(&self, notice: Notice) -> Result<()> {
        let mut queue = self.queue.write().await;
        queue.push(notice);
        Ok(())
    }
}
