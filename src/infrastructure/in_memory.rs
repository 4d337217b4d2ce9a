use crate::domain::ledger::{Payment, Transaction, TxStatus, Withdrawal, WithdrawalStatus};
use crate::domain::money::Balance;
use crate::domain::performance::{PerformanceStatus, Proof, TaskPerformance};
use crate::domain::ports::{
    CompletionOutcome, Entry, LedgerRecord, LedgerStore, Posting, Role, TaskStore, UserDirectory,
};
use crate::domain::task::{Task, TaskId, TaskKind, TaskModeration};
use crate::domain::wallet::{UserId, Wallet};
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default, Clone)]
struct LedgerState {
    wallets: HashMap<UserId, Wallet>,
    payments: HashMap<String, Payment>,
    transactions: HashMap<String, Transaction>,
    withdrawals: HashMap<String, Withdrawal>,
}

/// A thread-safe in-memory ledger.
///
/// All tables live behind one `Arc<RwLock<_>>` so a compound mutation can
/// touch the wallet and its ledger rows under a single write lock. Ideal for
/// testing or embedding where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against a draft of the state and commits only on success,
    /// so a mid-mutation error observes no partial write.
    async fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut LedgerState) -> Result<T>,
    {
        let mut guard = self.state.write().await;
        let mut draft = guard.clone();
        let out = f(&mut draft)?;
        *guard = draft;
        Ok(out)
    }
}

fn insert_records(state: &mut LedgerState, records: Vec<LedgerRecord>) {
    for record in records {
        match record {
            LedgerRecord::Payment(payment) => {
                state.payments.insert(payment.key.clone(), payment);
            }
            LedgerRecord::Transaction(tx) => {
                state.transactions.insert(tx.key.clone(), tx);
            }
            LedgerRecord::Withdrawal(withdrawal) => {
                state
                    .withdrawals
                    .insert(withdrawal.reference.clone(), withdrawal);
            }
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_wallet(&self, user: UserId, currency_code: &str) -> Result<Wallet> {
        let mut state = self.state.write().await;
        let wallet = state
            .wallets
            .entry(user)
            .or_insert_with(|| Wallet::new(user, currency_code));
        Ok(wallet.clone())
    }

    async fn wallet(&self, user: UserId) -> Result<Option<Wallet>> {
        let state = self.state.read().await;
        Ok(state.wallets.get(&user).cloned())
    }

    async fn apply(&self, posting: Posting) -> Result<Balance> {
        self.transact(|state| {
            let wallet = state
                .wallets
                .get_mut(&posting.user)
                .ok_or(EngineError::WalletMissing(posting.user))?;
            match posting.entry {
                Entry::Credit => wallet.credit(posting.amount),
                Entry::Debit => wallet.debit(posting.amount)?,
            }
            let balance = wallet.balance;
            insert_records(state, posting.records);
            Ok(balance)
        })
        .await
    }

    async fn record(&self, records: Vec<LedgerRecord>) -> Result<()> {
        let mut state = self.state.write().await;
        insert_records(&mut state, records);
        Ok(())
    }

    async fn transaction(&self, key: &str) -> Result<Option<Transaction>> {
        let state = self.state.read().await;
        Ok(state.transactions.get(key).cloned())
    }

    async fn payment(&self, key: &str) -> Result<Option<Payment>> {
        let state = self.state.read().await;
        Ok(state.payments.get(key).cloned())
    }

    async fn withdrawal(&self, reference: &str) -> Result<Option<Withdrawal>> {
        let state = self.state.read().await;
        Ok(state.withdrawals.get(reference).cloned())
    }

    async fn claim(&self, key: &str, status: TxStatus) -> Result<bool> {
        self.transact(|state| {
            let tx = state
                .transactions
                .get_mut(key)
                .ok_or_else(|| EngineError::TransactionMissing(key.to_string()))?;
            if tx.status.is_terminal() {
                return Ok(false);
            }
            tx.status = status.clone();
            if let Some(payment) = state.payments.get_mut(key)
                && !payment.status.is_terminal()
            {
                payment.status = status;
            }
            Ok(true)
        })
        .await
    }

    async fn set_withdrawal_status(
        &self,
        reference: &str,
        status: WithdrawalStatus,
    ) -> Result<Withdrawal> {
        self.transact(|state| {
            let withdrawal = state
                .withdrawals
                .get_mut(reference)
                .ok_or_else(|| EngineError::TransactionMissing(reference.to_string()))?;
            if withdrawal.status.is_terminal() {
                if withdrawal.status == status {
                    return Ok(withdrawal.clone());
                }
                return Err(EngineError::TerminalState(format!(
                    "withdrawal {reference}"
                )));
            }
            withdrawal.status = status;
            Ok(withdrawal.clone())
        })
        .await
    }
}

#[derive(Default, Clone)]
struct TaskState {
    next_id: TaskId,
    tasks: HashMap<TaskId, Task>,
    by_key: HashMap<String, TaskId>,
    performances: HashMap<String, TaskPerformance>,
}

impl TaskState {
    fn has_active_attempt(&self, user: UserId, task_id: TaskId) -> bool {
        self.performances
            .values()
            .any(|p| p.user == user && p.task_id == task_id && p.status.is_active())
    }
}

/// A thread-safe in-memory store for tasks and their performances.
///
/// Both tables share one lock so assignment can re-check uniqueness and
/// capacity atomically with the counter bump.
#[derive(Default, Clone)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<TaskState>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TaskState) -> Result<T>,
    {
        let mut guard = self.state.write().await;
        let mut draft = guard.clone();
        let out = f(&mut draft)?;
        *guard = draft;
        Ok(out)
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert_task(&self, mut task: Task) -> Result<Task> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        task.id = state.next_id;
        state.by_key.insert(task.task_key.clone(), task.id);
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn task(&self, id: TaskId) -> Result<Option<Task>> {
        let state = self.state.read().await;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn task_by_key(&self, key: &str) -> Result<Option<Task>> {
        let state = self.state.read().await;
        Ok(state
            .by_key
            .get(key)
            .and_then(|id| state.tasks.get(id))
            .cloned())
    }

    async fn mark_payment_complete(&self, task_key: &str) -> Result<Task> {
        self.transact(|state| {
            let id = *state
                .by_key
                .get(task_key)
                .ok_or_else(|| EngineError::Validation(format!("unknown task key {task_key}")))?;
            let task = state
                .tasks
                .get_mut(&id)
                .ok_or(EngineError::TaskMissing(id))?;
            task.payment_status = TxStatus::Complete;
            Ok(task.clone())
        })
        .await
    }

    async fn set_moderation(&self, id: TaskId, status: TaskModeration) -> Result<Task> {
        self.transact(|state| {
            let task = state
                .tasks
                .get_mut(&id)
                .ok_or(EngineError::TaskMissing(id))?;
            if task.status == status {
                return Ok(task.clone());
            }
            if task.status == TaskModeration::Declined {
                return Err(EngineError::TerminalState(format!("task {id}")));
            }
            task.status = status;
            Ok(task.clone())
        })
        .await
    }

    async fn eligible_tasks(
        &self,
        kind: TaskKind,
        filter: &str,
        user: UserId,
    ) -> Result<Vec<Task>> {
        let state = self.state.read().await;
        let tasks = state
            .tasks
            .values()
            .filter(|t| {
                t.kind() == kind
                    && t.filter_value() == filter
                    && t.selectable()
                    && t.owner != user
                    && !state.has_active_attempt(user, t.id)
            })
            .cloned()
            .collect();
        Ok(tasks)
    }

    async fn active_performance(
        &self,
        user: UserId,
        kind: TaskKind,
        filter: &str,
    ) -> Result<Option<TaskPerformance>> {
        let state = self.state.read().await;
        let found = state
            .performances
            .values()
            .find(|p| {
                p.user == user
                    && p.task_kind == kind
                    && p.status.is_active()
                    && state
                        .tasks
                        .get(&p.task_id)
                        .is_some_and(|t| t.filter_value() == filter)
            })
            .cloned();
        Ok(found)
    }

    async fn begin_performance(&self, user: UserId, task_id: TaskId) -> Result<TaskPerformance> {
        self.transact(|state| {
            if state.has_active_attempt(user, task_id) {
                return Err(EngineError::PendingTask);
            }
            let task = state
                .tasks
                .get_mut(&task_id)
                .ok_or(EngineError::TaskMissing(task_id))?;
            if !task.selectable() || task.owner == user {
                return Err(EngineError::NoUnassignedTask);
            }
            let perf = TaskPerformance {
                key: Uuid::new_v4().to_string(),
                user,
                task_id,
                task_kind: task.kind(),
                reward_money: task.reward_money,
                proof: None,
                status: PerformanceStatus::Pending,
                started_at: Utc::now(),
                date_completed: None,
            };
            task.total_allocated += 1;
            state.performances.insert(perf.key.clone(), perf.clone());
            Ok(perf)
        })
        .await
    }

    async fn performance(&self, key: &str) -> Result<Option<TaskPerformance>> {
        let state = self.state.read().await;
        Ok(state.performances.get(key).cloned())
    }

    async fn transition_performance(
        &self,
        key: &str,
        from: &[PerformanceStatus],
        to: PerformanceStatus,
        proof: Option<Proof>,
    ) -> Result<TaskPerformance> {
        self.transact(|state| {
            let perf = state
                .performances
                .get_mut(key)
                .ok_or_else(|| EngineError::PerformanceMissing(key.to_string()))?;
            if !from.contains(&perf.status) {
                if perf.status.is_terminal() {
                    return Err(EngineError::TerminalState(format!("performance {key}")));
                }
                return Err(EngineError::Validation(format!(
                    "performance {key} cannot move to {to:?} from {:?}",
                    perf.status
                )));
            }
            perf.status = to;
            if let Some(proof) = proof {
                perf.proof = Some(proof);
            }
            if to.is_terminal() {
                perf.date_completed = Some(Utc::now());
            }
            Ok(perf.clone())
        })
        .await
    }

    async fn complete_performance(&self, key: &str) -> Result<CompletionOutcome> {
        self.transact(|state| {
            let perf = state
                .performances
                .get_mut(key)
                .ok_or_else(|| EngineError::PerformanceMissing(key.to_string()))?;
            match perf.status {
                PerformanceStatus::Completed => {
                    return Ok(CompletionOutcome::AlreadyCompleted(perf.clone()));
                }
                PerformanceStatus::InReview => {}
                status if status.is_terminal() => {
                    return Err(EngineError::TerminalState(format!("performance {key}")));
                }
                status => {
                    return Err(EngineError::Validation(format!(
                        "performance {key} is {status:?}, not in review"
                    )));
                }
            }
            perf.status = PerformanceStatus::Completed;
            perf.date_completed = Some(Utc::now());
            let perf = perf.clone();
            let task = state
                .tasks
                .get_mut(&perf.task_id)
                .ok_or(EngineError::TaskMissing(perf.task_id))?;
            task.total_success += 1;
            Ok(CompletionOutcome::Completed(perf))
        })
        .await
    }

    async fn pending_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<TaskPerformance>> {
        let state = self.state.read().await;
        let rows = state
            .performances
            .values()
            .filter(|p| p.status == PerformanceStatus::Pending && p.started_at < cutoff)
            .cloned()
            .collect();
        Ok(rows)
    }
}

#[derive(Default, Clone)]
struct UserRecord {
    roles: HashSet<Role>,
    membership_active: bool,
}

/// In-memory stand-in for the host platform's user administration.
#[derive(Default, Clone)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<UserId, UserRecord>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn has_role(&self, user: UserId, role: Role) -> bool {
        let users = self.users.read().await;
        users.get(&user).is_some_and(|u| u.roles.contains(&role))
    }

    pub async fn is_member(&self, user: UserId) -> bool {
        let users = self.users.read().await;
        users.get(&user).is_some_and(|u| u.membership_active)
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn grant_role(&self, user: UserId, role: Role) -> Result<()> {
        let mut users = self.users.write().await;
        users.entry(user).or_default().roles.insert(role);
        Ok(())
    }

    async fn activate_membership(&self, user: UserId) -> Result<()> {
        let mut users = self.users.write().await;
        users.entry(user).or_default().membership_active = true;
        Ok(())
    }
}
