#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use taskpay::application::engine::Engine;
use taskpay::config::EngineConfig;
use taskpay::domain::ledger::{PaymentType, TxStatus};
use taskpay::domain::ports::{
    Entry, GatewayCharge, GatewayTransfer, LedgerStore, PaymentGateway, Posting, TaskStore,
    TransferRequest,
};
use taskpay::domain::task::{Task, TaskModeration, TaskVariant};
use taskpay::domain::wallet::UserId;
use taskpay::error::{EngineError, Result};
use taskpay::infrastructure::in_memory::{
    InMemoryLedgerStore, InMemoryTaskStore, InMemoryUserDirectory,
};
use taskpay::infrastructure::outbox::OutboxNotifier;
use tokio::sync::RwLock;

pub const WEBHOOK_SECRET: &str = "whsec-test";

/// Programmable gateway double: tests load the charge or transfer the
/// gateway should report, and `initiate_transfer` accepts everything.
#[derive(Default)]
pub struct StubGateway {
    charges: RwLock<HashMap<String, GatewayCharge>>,
    transfers: RwLock<HashMap<String, GatewayTransfer>>,
}

impl StubGateway {
    pub async fn set_charge(
        &self,
        reference: &str,
        status: &str,
        amount: Decimal,
        payment_type: Option<PaymentType>,
        task_key: Option<&str>,
    ) {
        self.charges.write().await.insert(
            reference.to_string(),
            GatewayCharge {
                reference: reference.to_string(),
                amount: Some(amount),
                status: status.to_string(),
                payment_type,
                task_key: task_key.map(str::to_string),
            },
        );
    }

    pub async fn set_transfer(&self, reference: &str, status: &str) {
        self.transfers.write().await.insert(
            reference.to_string(),
            GatewayTransfer {
                reference: reference.to_string(),
                status: status.to_string(),
            },
        );
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn verify_charge(&self, reference: &str) -> Result<GatewayCharge> {
        self.charges
            .read()
            .await
            .get(reference)
            .cloned()
            .ok_or_else(|| EngineError::GatewayProtocol("no charge for reference".to_string()))
    }

    async fn verify_transfer(&self, reference: &str) -> Result<GatewayTransfer> {
        self.transfers
            .read()
            .await
            .get(reference)
            .cloned()
            .ok_or_else(|| EngineError::GatewayProtocol("no transfer for reference".to_string()))
    }

    async fn initiate_transfer(&self, request: TransferRequest) -> Result<GatewayTransfer> {
        let transfer = GatewayTransfer {
            reference: request.reference.clone(),
            status: "NEW".to_string(),
        };
        self.transfers
            .write()
            .await
            .insert(request.reference, transfer.clone());
        Ok(transfer)
    }
}

pub struct Harness {
    pub engine: Engine,
    pub ledger: Arc<InMemoryLedgerStore>,
    pub tasks: Arc<InMemoryTaskStore>,
    pub users: Arc<InMemoryUserDirectory>,
    pub gateway: Arc<StubGateway>,
    pub outbox: Arc<OutboxNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        let config = EngineConfig {
            webhook_secret: WEBHOOK_SECRET.to_string(),
            ..EngineConfig::default()
        };
        let ledger = Arc::new(InMemoryLedgerStore::new());
        let tasks = Arc::new(InMemoryTaskStore::new());
        let users = Arc::new(InMemoryUserDirectory::new());
        let gateway = Arc::new(StubGateway::default());
        let outbox = Arc::new(OutboxNotifier::new());
        let engine = Engine::new(
            config,
            ledger.clone(),
            tasks.clone(),
            users.clone(),
            gateway.clone(),
            outbox.clone(),
        );
        Self {
            engine,
            ledger,
            tasks,
            users,
            gateway,
            outbox,
        }
    }

    /// Creates the user's wallet and funds it without ledger rows, as an
    /// opening balance.
    pub async fn seed_wallet(&self, user: UserId, amount: Decimal) {
        self.ledger.create_wallet(user, "NGN").await.unwrap();
        if amount > Decimal::ZERO {
            self.ledger
                .apply(Posting {
                    user,
                    entry: Entry::Credit,
                    amount,
                    records: vec![],
                })
                .await
                .unwrap();
        }
    }

    /// Inserts a task that is already funded and approved.
    pub async fn seed_ready_task(&self, owner: UserId, variant: TaskVariant) -> Task {
        self.seed_task(owner, variant, TxStatus::Complete, TaskModeration::Approved)
            .await
    }

    pub async fn seed_task(
        &self,
        owner: UserId,
        variant: TaskVariant,
        payment_status: TxStatus,
        status: TaskModeration,
    ) -> Task {
        self.seed_task_with_reward(owner, variant, payment_status, status, Decimal::from(110))
            .await
    }

    /// Inserts a task directly through the store, bypassing the catalog's
    /// validation. Lets tests stage rows a buggy or migrated host might
    /// have written.
    pub async fn seed_task_with_reward(
        &self,
        owner: UserId,
        variant: TaskVariant,
        payment_status: TxStatus,
        status: TaskModeration,
        reward_money: Decimal,
    ) -> Task {
        let task = Task {
            id: 0,
            task_key: uuid::Uuid::new_v4().to_string(),
            owner,
            platform: "instagram".to_string(),
            fee_paid: Decimal::from(5000),
            reward_money,
            payment_status,
            status,
            total_allocated: 0,
            total_success: 0,
            variant,
            created_at: chrono::Utc::now(),
        };
        self.tasks.insert_task(task).await.unwrap()
    }
}

pub fn advert(posts_count: u32) -> TaskVariant {
    TaskVariant::Advert {
        posts_count,
        caption: None,
        hashtags: None,
    }
}

pub fn engagement(goal: &str, engagements_count: u32) -> TaskVariant {
    TaskVariant::Engagement {
        goal: goal.to_string(),
        account_link: "https://x.com/acme".to_string(),
        engagements_count,
    }
}

/// Builds a gateway webhook body in the shape the reconciler parses.
pub fn webhook_body(
    reference: &str,
    status: &str,
    amount: Decimal,
    payment_type: Option<&str>,
    task_key: Option<&str>,
) -> Vec<u8> {
    let mut meta = serde_json::Map::new();
    if let Some(pt) = payment_type {
        meta.insert("payment_type".to_string(), pt.into());
    }
    if let Some(key) = task_key {
        meta.insert("task_key".to_string(), key.into());
    }
    serde_json::json!({
        "event": "charge.completed",
        "data": {
            "tx_ref": reference,
            "amount": amount,
            "status": status,
        },
        "meta": meta,
    })
    .to_string()
    .into_bytes()
}
