use super::wallet_service::WalletService;
use crate::config::EngineConfig;
use crate::domain::ledger::CreditReason;
use crate::domain::money::Amount;
use crate::domain::performance::{PerformanceStatus, Proof, TaskPerformance};
use crate::domain::ports::{CompletionOutcome, Notice, Notifier, TaskStore};
use crate::domain::task::TaskKind;
use crate::domain::wallet::UserId;
use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Drives task performances through review to payout.
///
/// Every transition is a compare-and-swap against the stored status, so a
/// reviewer, the performer and the timeout sweep can never push the same
/// row past a terminal state.
#[derive(Clone)]
pub struct ReviewDesk {
    config: Arc<EngineConfig>,
    tasks: Arc<dyn TaskStore>,
    wallet: WalletService,
    notifier: Arc<dyn Notifier>,
}

impl ReviewDesk {
    pub fn new(
        config: Arc<EngineConfig>,
        tasks: Arc<dyn TaskStore>,
        wallet: WalletService,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            tasks,
            wallet,
            notifier,
        }
    }

    /// Submits proof, moving a pending performance into review.
    /// Engagement tasks must include a screenshot.
    pub async fn submit(&self, key: &str, proof: Proof) -> Result<TaskPerformance> {
        let perf = self
            .tasks
            .performance(key)
            .await?
            .ok_or_else(|| EngineError::PerformanceMissing(key.to_string()))?;
        if perf.task_kind == TaskKind::Engagement && proof.screenshot.is_none() {
            return Err(EngineError::Validation(
                "engagement proof requires a screenshot".to_string(),
            ));
        }
        self.tasks
            .transition_performance(
                key,
                &[PerformanceStatus::Pending],
                PerformanceStatus::InReview,
                Some(proof),
            )
            .await
    }

    /// Pulls a submission back out of review so the performer can fix it.
    pub async fn edit(&self, key: &str, proof: Proof) -> Result<TaskPerformance> {
        self.tasks
            .transition_performance(
                key,
                &[PerformanceStatus::InReview],
                PerformanceStatus::Pending,
                Some(proof),
            )
            .await
    }

    /// Approves an in-review performance and pays the snapshotted reward.
    ///
    /// Idempotent: approving an already-completed row returns it without
    /// crediting the performer a second time.
    pub async fn approve(&self, key: &str) -> Result<TaskPerformance> {
        let perf = self
            .tasks
            .performance(key)
            .await?
            .ok_or_else(|| EngineError::PerformanceMissing(key.to_string()))?;
        // Completion is terminal, so the payout must be known good before
        // the claim: validate the reward and make sure the wallet exists.
        let reward = Amount::new(perf.reward_money)?;
        self.wallet.ensure_wallet(perf.user).await?;

        match self.tasks.complete_performance(key).await? {
            CompletionOutcome::Completed(perf) => {
                self.wallet
                    .credit(perf.user, reward, CreditReason::TaskReward)
                    .await?;
                let notice = Notice::PerformanceReviewed {
                    user: perf.user,
                    key: perf.key.clone(),
                    status: PerformanceStatus::Completed,
                };
                if let Err(err) = self.notifier.enqueue(notice).await {
                    warn!(key = %perf.key, error = %err, "failed to enqueue review notice");
                }
                info!(key = %perf.key, user = perf.user, "performance approved");
                Ok(perf)
            }
            CompletionOutcome::AlreadyCompleted(perf) => {
                info!(key = %perf.key, "performance was already approved");
                Ok(perf)
            }
        }
    }

    /// Rejects an in-review performance. The performer gets nothing and
    /// the task's success count is untouched.
    pub async fn reject(&self, key: &str) -> Result<TaskPerformance> {
        let perf = self
            .tasks
            .transition_performance(
                key,
                &[PerformanceStatus::InReview],
                PerformanceStatus::Rejected,
                None,
            )
            .await?;
        let notice = Notice::PerformanceReviewed {
            user: perf.user,
            key: perf.key.clone(),
            status: PerformanceStatus::Rejected,
        };
        if let Err(err) = self.notifier.enqueue(notice).await {
            warn!(key = %perf.key, error = %err, "failed to enqueue review notice");
        }
        Ok(perf)
    }

    /// Lets a performer abandon their own active attempt. The task's
    /// allocation counter is left as is; only successes gate capacity.
    pub async fn cancel(&self, key: &str, requested_by: UserId) -> Result<TaskPerformance> {
        let perf = self
            .tasks
            .performance(key)
            .await?
            .ok_or_else(|| EngineError::PerformanceMissing(key.to_string()))?;
        if perf.user != requested_by {
            return Err(EngineError::Forbidden);
        }
        self.tasks
            .transition_performance(
                key,
                &[PerformanceStatus::Pending, PerformanceStatus::InReview],
                PerformanceStatus::Cancelled,
                None,
            )
            .await
    }

    /// Times out pending performances older than the configured window.
    /// Returns how many rows were swept; per-row conflicts are logged and
    /// skipped so one contested row cannot stall the sweep.
    pub async fn sweep_timeouts(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now - self.config.performance_timeout();
        let rows = self.tasks.pending_older_than(cutoff).await?;
        let mut swept = 0;
        for row in rows {
            match self
                .tasks
                .transition_performance(
                    &row.key,
                    &[PerformanceStatus::Pending],
                    PerformanceStatus::TimedOut,
                    None,
                )
                .await
            {
                Ok(_) => swept += 1,
                Err(err) => {
                    warn!(key = %row.key, error = %err, "skipping performance during timeout sweep");
                }
            }
        }
        if swept > 0 {
            info!(swept, "timed out stale performances");
        }
        Ok(swept)
    }
}
