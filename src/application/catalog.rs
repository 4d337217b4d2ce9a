use super::wallet_service::WalletService;
use crate::domain::ledger::{
    Payment, PaymentMethod, PaymentType, Transaction, TransactionType, TxStatus,
};
use crate::domain::money::Amount;
use crate::domain::ports::{LedgerRecord, LedgerStore, Role, TaskStore, UserDirectory};
use crate::domain::task::{Task, TaskId, TaskModeration, TaskVariant};
use crate::domain::wallet::UserId;
use crate::error::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// What an advertiser submits to open a task.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub platform: String,
    pub reward_money: Decimal,
    pub variant: TaskVariant,
}

/// How the advertiser pays the task fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Funding {
    Wallet,
    Gateway,
}

/// A freshly created task. `payment_reference` is set for gateway funding
/// so the host can send the advertiser to checkout; the task stays
/// payment-pending until the reconciler settles that reference.
#[derive(Debug, Clone)]
pub struct CreatedTask {
    pub task: Task,
    pub payment_reference: Option<String>,
}

/// Task creation, funding and moderation.
#[derive(Clone)]
pub struct Catalog {
    ledger: Arc<dyn LedgerStore>,
    tasks: Arc<dyn TaskStore>,
    users: Arc<dyn UserDirectory>,
    wallet: WalletService,
}

impl Catalog {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        tasks: Arc<dyn TaskStore>,
        users: Arc<dyn UserDirectory>,
        wallet: WalletService,
    ) -> Self {
        Self {
            ledger,
            tasks,
            users,
            wallet,
        }
    }

    /// Creates a task and takes its fee.
    ///
    /// Wallet funding debits the fee up front and the task arrives
    /// payment-complete; gateway funding only writes the pending ledger
    /// rows and leaves settlement to the reconciler.
    pub async fn create_task(
        &self,
        owner: UserId,
        draft: TaskDraft,
        fee: Amount,
        funding: Funding,
    ) -> Result<CreatedTask> {
        let reward = Amount::new(draft.reward_money)?;
        let task_key = Uuid::new_v4().to_string();
        let mut task = Task {
            id: 0,
            task_key: task_key.clone(),
            owner,
            platform: draft.platform,
            fee_paid: fee.value(),
            reward_money: reward.value(),
            payment_status: TxStatus::Pending,
            status: TaskModeration::Pending,
            total_allocated: 0,
            total_success: 0,
            variant: draft.variant,
            created_at: Utc::now(),
        };

        let payment_reference = match funding {
            Funding::Wallet => {
                self.wallet
                    .debit(owner, fee, PaymentType::TaskCreation, Some(task_key.clone()))
                    .await?;
                task.payment_status = TxStatus::Complete;
                None
            }
            Funding::Gateway => {
                let reference = Uuid::new_v4().to_string();
                let now = Utc::now();
                let payment = Payment {
                    key: reference.clone(),
                    user: owner,
                    amount: fee.value(),
                    payment_type: PaymentType::TaskCreation,
                    payment_method: PaymentMethod::Gateway,
                    status: TxStatus::Pending,
                    task_key: Some(task_key.clone()),
                    created_at: now,
                };
                let tx = Transaction {
                    key: reference.clone(),
                    user: owner,
                    amount: fee.value(),
                    transaction_type: TransactionType::Payment,
                    status: TxStatus::Pending,
                    description: None,
                    created_at: now,
                };
                self.ledger
                    .record(vec![
                        LedgerRecord::Payment(payment),
                        LedgerRecord::Transaction(tx),
                    ])
                    .await?;
                Some(reference)
            }
        };

        let task = self.tasks.insert_task(task).await?;
        self.users.grant_role(owner, Role::Advertiser).await?;
        info!(owner, task = task.id, ?funding, "task created");
        Ok(CreatedTask {
            task,
            payment_reference,
        })
    }

    /// Clears a task for assignment.
    pub async fn approve_task(&self, id: TaskId) -> Result<Task> {
        self.tasks.set_moderation(id, TaskModeration::Approved).await
    }

    /// Declines a task. A funded fee goes back to the advertiser minus
    /// the platform fee.
    pub async fn decline_task(&self, id: TaskId) -> Result<Task> {
        let task = self.tasks.set_moderation(id, TaskModeration::Declined).await?;
        if task.payment_status == TxStatus::Complete && task.fee_paid > Decimal::ZERO {
            self.wallet
                .refund(task.owner, Amount::new(task.fee_paid)?)
                .await?;
        }
        info!(task = task.id, "task declined");
        Ok(task)
    }
}
