use crate::config::EngineConfig;
use crate::domain::ledger::{
    PaymentType, Transaction, TransactionType, TxStatus, WithdrawalStatus,
};
use crate::domain::ports::{
    Entry, LedgerRecord, LedgerStore, Notice, Notifier, PaymentGateway, Posting, TaskStore,
    UserDirectory,
};
use crate::error::{EngineError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of reconciling one gateway event against the ledger.
///
/// `applied` is `false` when the referenced row was already settled; the
/// event was a duplicate and had no effect.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub reference: String,
    pub status: TxStatus,
    pub applied: bool,
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(default)]
    #[allow(dead_code)]
    event: Option<String>,
    data: WebhookData,
    #[serde(default, alias = "metadata")]
    meta: Option<WebhookMeta>,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    #[serde(alias = "tx_ref")]
    reference: String,
    #[serde(default)]
    amount: Option<Decimal>,
    status: String,
}

#[derive(Debug, Deserialize)]
struct WebhookMeta {
    #[serde(default)]
    payment_type: Option<PaymentType>,
    #[serde(default)]
    task_key: Option<String>,
}

/// Settles asynchronous gateway events against the ledger, exactly once
/// per reference.
///
/// Events arrive twice over: pushed as webhooks and pulled through
/// verification calls. Both paths funnel into the same claim-before-apply
/// settlement, so replays and races collapse into a single applied effect.
#[derive(Clone)]
pub struct Reconciler {
    config: Arc<EngineConfig>,
    ledger: Arc<dyn LedgerStore>,
    tasks: Arc<dyn TaskStore>,
    users: Arc<dyn UserDirectory>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
}

impl Reconciler {
    pub fn new(
        config: Arc<EngineConfig>,
        ledger: Arc<dyn LedgerStore>,
        tasks: Arc<dyn TaskStore>,
        users: Arc<dyn UserDirectory>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            ledger,
            tasks,
            users,
            gateway,
            notifier,
        }
    }

    /// Handles a pushed gateway event.
    ///
    /// The signature header must equal the configured shared secret; a
    /// missing or wrong signature is rejected before any state is read.
    pub async fn handle_webhook(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<ReconcileOutcome> {
        match signature {
            Some(sig) if sig == self.config.webhook_secret => {}
            _ => return Err(EngineError::Signature),
        }
        let event: WebhookEvent = serde_json::from_slice(raw_body)?;
        let (payment_type, task_key) = match event.meta {
            Some(meta) => (meta.payment_type, meta.task_key),
            None => (None, None),
        };

        let tx = self.lookup(&event.data.reference).await?;
        match tx.transaction_type {
            TransactionType::Withdrawal => self.settle_transfer(tx, &event.data.status).await,
            _ => {
                self.settle_charge(tx, &event.data.status, event.data.amount, payment_type, task_key)
                    .await
            }
        }
    }

    /// Pulls the gateway's current view of a reference and settles it.
    /// Used when a webhook was missed or a user asks "where is my money".
    pub async fn verify(&self, reference: &str) -> Result<ReconcileOutcome> {
        let tx = self.lookup(reference).await?;
        match tx.transaction_type {
            TransactionType::Withdrawal => {
                let transfer = self.gateway.verify_transfer(reference).await?;
                self.settle_transfer(tx, &transfer.status).await
            }
            _ => {
                let charge = self.gateway.verify_charge(reference).await?;
                self.settle_charge(
                    tx,
                    &charge.status,
                    charge.amount,
                    charge.payment_type,
                    charge.task_key,
                )
                .await
            }
        }
    }

    async fn lookup(&self, reference: &str) -> Result<Transaction> {
        self.ledger
            .transaction(reference)
            .await?
            .ok_or_else(|| EngineError::TransactionMissing(reference.to_string()))
    }

    async fn settle_charge(
        &self,
        tx: Transaction,
        raw_status: &str,
        amount: Option<Decimal>,
        payment_type: Option<PaymentType>,
        task_key: Option<String>,
    ) -> Result<ReconcileOutcome> {
        let status = charge_status(raw_status);
        let applied = self.ledger.claim(&tx.key, status.clone()).await?;
        if !applied {
            info!(reference = %tx.key, %status, "duplicate charge event ignored");
            return Ok(ReconcileOutcome {
                reference: tx.key,
                status,
                applied: false,
            });
        }

        if status == TxStatus::Complete {
            let payment = self.ledger.payment(&tx.key).await?;
            if let (Some(reported), Some(payment)) = (amount, &payment)
                && reported != payment.amount
            {
                warn!(
                    reference = %tx.key,
                    %reported,
                    recorded = %payment.amount,
                    "gateway amount differs from the recorded payment; using the recorded amount"
                );
            }
            let payment_type =
                payment_type.or_else(|| payment.as_ref().map(|p| p.payment_type));
            let task_key = task_key.or_else(|| payment.as_ref().and_then(|p| p.task_key.clone()));
            let amount = payment.as_ref().map(|p| p.amount).unwrap_or(tx.amount);

            match payment_type {
                Some(PaymentType::MembershipFee) => {
                    self.users.activate_membership(tx.user).await?;
                }
                Some(PaymentType::TaskCreation) => match task_key {
                    Some(key) => {
                        self.tasks.mark_payment_complete(&key).await?;
                    }
                    None => {
                        warn!(reference = %tx.key, "task payment settled without a task key");
                    }
                },
                Some(PaymentType::CreditWallet) => {
                    self.ledger
                        .apply(Posting {
                            user: tx.user,
                            entry: Entry::Credit,
                            amount,
                            records: vec![],
                        })
                        .await?;
                }
                Some(PaymentType::Withdrawal) | None => {
                    warn!(reference = %tx.key, "charge settled without a usable payment type");
                }
            }
        }

        if status.is_terminal() {
            let notice = Notice::PaymentSettled {
                user: tx.user,
                reference: tx.key.clone(),
                status: status.clone(),
            };
            if let Err(err) = self.notifier.enqueue(notice).await {
                warn!(reference = %tx.key, error = %err, "failed to enqueue settlement notice");
            }
        }
        info!(reference = %tx.key, %status, "charge reconciled");
        Ok(ReconcileOutcome {
            reference: tx.key,
            status,
            applied: true,
        })
    }

    async fn settle_transfer(
        &self,
        tx: Transaction,
        raw_status: &str,
    ) -> Result<ReconcileOutcome> {
        let (status, withdrawal_status) = transfer_status(raw_status);
        let applied = self.ledger.claim(&tx.key, status.clone()).await?;
        if !applied {
            info!(reference = %tx.key, %status, "duplicate transfer event ignored");
            return Ok(ReconcileOutcome {
                reference: tx.key,
                status,
                applied: false,
            });
        }

        let withdrawal = self
            .ledger
            .set_withdrawal_status(&tx.key, withdrawal_status.clone())
            .await?;

        if withdrawal_status == WithdrawalStatus::Failed {
            // The user was debited amount plus fee up front; give both back.
            let reversal = Transaction {
                key: Uuid::new_v4().to_string(),
                user: tx.user,
                amount: withdrawal.amount + withdrawal.fee,
                transaction_type: TransactionType::Credit,
                status: TxStatus::Complete,
                description: Some("withdrawal-reversal".to_string()),
                created_at: Utc::now(),
            };
            self.ledger
                .apply(Posting {
                    user: tx.user,
                    entry: Entry::Credit,
                    amount: withdrawal.amount + withdrawal.fee,
                    records: vec![LedgerRecord::Transaction(reversal)],
                })
                .await?;
        }

        if status.is_terminal() {
            let notice = Notice::WithdrawalSettled {
                user: tx.user,
                reference: tx.key.clone(),
                status: withdrawal_status,
            };
            if let Err(err) = self.notifier.enqueue(notice).await {
                warn!(reference = %tx.key, error = %err, "failed to enqueue settlement notice");
            }
        }
        info!(reference = %tx.key, %status, "transfer reconciled");
        Ok(ReconcileOutcome {
            reference: tx.key,
            status,
            applied: true,
        })
    }
}

/// Maps the gateway's charge vocabulary onto ledger statuses. Unknown
/// words are stored literally and keep the row claimable.
fn charge_status(raw: &str) -> TxStatus {
    match raw.to_lowercase().as_str() {
        "successful" => TxStatus::Complete,
        "failed" => TxStatus::Failed,
        "abandoned" => TxStatus::Abandoned,
        "pending" => TxStatus::Pending,
        _ => TxStatus::Other(raw.to_string()),
    }
}

/// Transfers report an uppercase vocabulary of their own.
fn transfer_status(raw: &str) -> (TxStatus, WithdrawalStatus) {
    match raw.to_lowercase().as_str() {
        "successful" => (TxStatus::Complete, WithdrawalStatus::Successful),
        "failed" => (TxStatus::Failed, WithdrawalStatus::Failed),
        "pending" => (TxStatus::Pending, WithdrawalStatus::Pending),
        _ => (
            TxStatus::Other(raw.to_string()),
            WithdrawalStatus::Other(raw.to_string()),
        ),
    }
}
