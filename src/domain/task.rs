use super::ledger::TxStatus;
use super::wallet::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type TaskId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Advert,
    Engagement,
}

/// Moderation state of a task. `Declined` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskModeration {
    Pending,
    Approved,
    Declined,
}

/// Kind-specific task payload.
///
/// Advert tasks ask earners to publish posts; engagement tasks ask them to
/// perform a goal (follow, like, comment) against an account or post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TaskVariant {
    Advert {
        posts_count: u32,
        caption: Option<String>,
        hashtags: Option<String>,
    },
    Engagement {
        goal: String,
        account_link: String,
        engagements_count: u32,
    },
}

/// An advertiser's task. Selectable for assignment only once its funding
/// payment is complete, moderation has approved it, and it still has
/// capacity left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub task_key: String,
    pub owner: UserId,
    pub platform: String,
    pub fee_paid: Decimal,
    pub reward_money: Decimal,
    pub payment_status: TxStatus,
    pub status: TaskModeration,
    pub total_allocated: u32,
    pub total_success: u32,
    pub variant: TaskVariant,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        match self.variant {
            TaskVariant::Advert { .. } => TaskKind::Advert,
            TaskVariant::Engagement { .. } => TaskKind::Engagement,
        }
    }

    /// Number of successful performances this task pays for.
    pub fn target_count(&self) -> u32 {
        match self.variant {
            TaskVariant::Advert { posts_count, .. } => posts_count,
            TaskVariant::Engagement {
                engagements_count, ..
            } => engagements_count,
        }
    }

    /// The field earners filter on when requesting a task of this kind:
    /// platform for adverts, goal for engagements.
    pub fn filter_value(&self) -> &str {
        match &self.variant {
            TaskVariant::Advert { .. } => &self.platform,
            TaskVariant::Engagement { goal, .. } => goal,
        }
    }

    pub fn selectable(&self) -> bool {
        self.payment_status == TxStatus::Complete
            && self.status == TaskModeration::Approved
            && self.total_success < self.target_count()
    }
}
