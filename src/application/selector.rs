use crate::domain::performance::TaskPerformance;
use crate::domain::ports::{Role, TaskStore, UserDirectory};
use crate::domain::task::TaskKind;
use crate::domain::wallet::UserId;
use crate::error::{EngineError, Result};
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::info;

/// Hands out tasks to earners.
///
/// Selection is uniform-random over the eligible set so early tasks do not
/// starve late ones. Both refusals, an attempt already in flight and an
/// empty eligible set, are ordinary control flow for callers.
#[derive(Clone)]
pub struct Selector {
    tasks: Arc<dyn TaskStore>,
    users: Arc<dyn UserDirectory>,
}

impl Selector {
    pub fn new(tasks: Arc<dyn TaskStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { tasks, users }
    }

    /// Assigns the user a random eligible task of the given kind whose
    /// filter field matches, and opens a pending performance for it.
    pub async fn assign(
        &self,
        user: UserId,
        kind: TaskKind,
        filter: &str,
    ) -> Result<TaskPerformance> {
        if self
            .tasks
            .active_performance(user, kind, filter)
            .await?
            .is_some()
        {
            return Err(EngineError::PendingTask);
        }

        let candidates = self.tasks.eligible_tasks(kind, filter, user).await?;
        let picked = {
            let mut rng = rand::thread_rng();
            candidates.choose(&mut rng).cloned()
        }
        .ok_or(EngineError::NoUnassignedTask)?;

        // The store re-checks uniqueness and capacity under its own lock;
        // a lost race surfaces as the same refusals as above.
        let perf = self.tasks.begin_performance(user, picked.id).await?;
        self.users.grant_role(user, Role::Earner).await?;
        info!(user, task = picked.id, key = %perf.key, "task assigned");
        Ok(perf)
    }
}
