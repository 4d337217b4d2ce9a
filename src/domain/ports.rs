use super::ledger::{Payment, PaymentType, Transaction, TxStatus, Withdrawal, WithdrawalStatus};
use super::money::Balance;
use super::performance::{PerformanceStatus, Proof, TaskPerformance};
use super::task::{Task, TaskId, TaskKind, TaskModeration};
use super::wallet::{UserId, Wallet};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Direction of a balance movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Credit,
    Debit,
}

/// A ledger row written alongside a balance movement.
#[derive(Debug, Clone)]
pub enum LedgerRecord {
    Payment(Payment),
    Transaction(Transaction),
    Withdrawal(Withdrawal),
}

/// A compound wallet mutation: one balance movement plus the ledger rows
/// that document it. Stores apply the whole posting atomically; a failed
/// posting leaves no partial write behind.
#[derive(Debug, Clone)]
pub struct Posting {
    pub user: UserId,
    pub entry: Entry,
    pub amount: Decimal,
    pub records: Vec<LedgerRecord>,
}

/// Outcome of an approval attempt against a performance row.
#[derive(Debug, Clone)]
pub enum CompletionOutcome {
    /// This call won the completion; the reward has not been paid yet.
    Completed(TaskPerformance),
    /// The row was already completed by an earlier call.
    AlreadyCompleted(TaskPerformance),
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Returns the user's wallet, creating an empty one if absent.
    async fn create_wallet(&self, user: UserId, currency_code: &str) -> Result<Wallet>;
    async fn wallet(&self, user: UserId) -> Result<Option<Wallet>>;

    /// Applies a posting atomically and returns the new balance.
    /// Debits fail with `InsufficientBalance` without writing anything.
    async fn apply(&self, posting: Posting) -> Result<Balance>;

    /// Writes ledger rows with no balance movement, for gateway-funded
    /// payments awaiting reconciliation.
    async fn record(&self, records: Vec<LedgerRecord>) -> Result<()>;

    async fn transaction(&self, key: &str) -> Result<Option<Transaction>>;
    async fn payment(&self, key: &str) -> Result<Option<Payment>>;
    async fn withdrawal(&self, reference: &str) -> Result<Option<Withdrawal>>;

    /// Idempotency claim for reconciliation: moves the transaction (and its
    /// payment, if any) to `status` only while the current status is
    /// non-terminal. Returns `false` when the row is already settled.
    async fn claim(&self, key: &str, status: TxStatus) -> Result<bool>;

    /// Advances a withdrawal's status. Settled rows are monotonic: setting
    /// the same terminal status again is a no-op, any other transition off
    /// a terminal status fails with `TerminalState`.
    async fn set_withdrawal_status(
        &self,
        reference: &str,
        status: WithdrawalStatus,
    ) -> Result<Withdrawal>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persists a new task, assigning its id.
    async fn insert_task(&self, task: Task) -> Result<Task>;
    async fn task(&self, id: TaskId) -> Result<Option<Task>>;
    async fn task_by_key(&self, key: &str) -> Result<Option<Task>>;

    /// Marks the task's funding payment complete, keyed by `task_key`.
    async fn mark_payment_complete(&self, task_key: &str) -> Result<Task>;

    /// Moderation transition. Idempotent for a repeated target status;
    /// fails with `TerminalState` once a task is declined.
    async fn set_moderation(&self, id: TaskId, status: TaskModeration) -> Result<Task>;

    /// Tasks the user could be assigned: selectable, matching kind and
    /// filter field, not owned by the user, and without an active attempt
    /// by the user.
    async fn eligible_tasks(&self, kind: TaskKind, filter: &str, user: UserId)
    -> Result<Vec<Task>>;

    /// The user's active attempt for this kind and filter, if any.
    async fn active_performance(
        &self,
        user: UserId,
        kind: TaskKind,
        filter: &str,
    ) -> Result<Option<TaskPerformance>>;

    /// Creates a pending performance and bumps the task's allocation
    /// counter in one step, re-checking uniqueness and capacity under the
    /// store's lock.
    async fn begin_performance(&self, user: UserId, task_id: TaskId) -> Result<TaskPerformance>;

    async fn performance(&self, key: &str) -> Result<Option<TaskPerformance>>;

    /// Moves a performance to `to` only if its current status is one of
    /// `from`, optionally replacing the proof. A terminal current status
    /// fails with `TerminalState`.
    async fn transition_performance(
        &self,
        key: &str,
        from: &[PerformanceStatus],
        to: PerformanceStatus,
        proof: Option<Proof>,
    ) -> Result<TaskPerformance>;

    /// Completes an in-review performance and bumps the task's success
    /// counter atomically. A second call on the same row reports
    /// `AlreadyCompleted` instead of double-counting.
    async fn complete_performance(&self, key: &str) -> Result<CompletionOutcome>;

    /// Pending performances started before `cutoff`.
    async fn pending_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<TaskPerformance>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Earner,
    Advertiser,
}

/// User administration the engine delegates to the host platform.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn grant_role(&self, user: UserId, role: Role) -> Result<()>;
    async fn activate_membership(&self, user: UserId) -> Result<()>;
}

/// A charge looked up from the gateway, either pushed in a webhook or
/// pulled through verification.
#[derive(Debug, Clone)]
pub struct GatewayCharge {
    pub reference: String,
    pub amount: Option<Decimal>,
    pub status: String,
    pub payment_type: Option<PaymentType>,
    pub task_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GatewayTransfer {
    pub reference: String,
    pub status: String,
}

/// Payout instruction sent to the gateway.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub reference: String,
    pub amount: Decimal,
    pub currency_code: String,
    pub bank_code: String,
    pub account_no: String,
    pub narration: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn verify_charge(&self, reference: &str) -> Result<GatewayCharge>;
    async fn verify_transfer(&self, reference: &str) -> Result<GatewayTransfer>;
    async fn initiate_transfer(&self, request: TransferRequest) -> Result<GatewayTransfer>;
}

/// Events the host platform may turn into user-facing notifications.
/// Enqueued strictly after the state change they describe has committed.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    WalletCredited {
        user: UserId,
        amount: Decimal,
        description: String,
    },
    WalletDebited {
        user: UserId,
        amount: Decimal,
    },
    PaymentSettled {
        user: UserId,
        reference: String,
        status: TxStatus,
    },
    WithdrawalSettled {
        user: UserId,
        reference: String,
        status: WithdrawalStatus,
    },
    PerformanceReviewed {
        user: UserId,
        key: String,
        status: PerformanceStatus,
    },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn enqueue(&self, notice: Notice) -> Result<()>;
}
