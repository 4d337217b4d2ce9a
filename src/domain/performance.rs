use super::task::{TaskId, TaskKind};
use super::wallet::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle of a task attempt.
///
/// pending -> in_review -> completed | rejected
/// pending -> cancelled | timed_out
/// in_review -> pending (proof edited) | cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceStatus {
    Pending,
    InReview,
    Completed,
    Rejected,
    Cancelled,
    TimedOut,
}

impl PerformanceStatus {
    /// Active attempts count against the one-per-task-per-user limit.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::InReview)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

/// Evidence an earner submits for review. Engagement tasks require the
/// screenshot; advert tasks are verified from the post link alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub account_name: String,
    pub post_link: String,
    pub screenshot: Option<String>,
}

/// One user's attempt at one task. The reward is snapshotted at assignment
/// time so later task edits cannot change what an earner is owed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPerformance {
    pub key: String,
    pub user: UserId,
    pub task_id: TaskId,
    pub task_kind: TaskKind,
    pub reward_money: Decimal,
    pub proof: Option<Proof>,
    pub status: PerformanceStatus,
    pub started_at: DateTime<Utc>,
    pub date_completed: Option<DateTime<Utc>>,
}
