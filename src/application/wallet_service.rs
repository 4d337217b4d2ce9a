use crate::config::EngineConfig;
use crate::domain::ledger::{
    BankRecipient, CreditReason, Payment, PaymentMethod, PaymentType, Transaction,
    TransactionType, TxStatus, Withdrawal, WithdrawalStatus,
};
use crate::domain::money::{Amount, Balance};
use crate::domain::ports::{
    Entry, LedgerRecord, LedgerStore, Notice, Notifier, PaymentGateway, Posting, TransferRequest,
};
use crate::domain::wallet::{UserId, Wallet};
use crate::error::{EngineError, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Safe wallet mutations: every balance movement commits atomically with
/// the ledger rows that document it.
#[derive(Clone)]
pub struct WalletService {
    config: Arc<EngineConfig>,
    ledger: Arc<dyn LedgerStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
}

impl WalletService {
    pub fn new(
        config: Arc<EngineConfig>,
        ledger: Arc<dyn LedgerStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            ledger,
            gateway,
            notifier,
        }
    }

    /// Returns the user's wallet, creating an empty one if absent.
    pub async fn ensure_wallet(&self, user: UserId) -> Result<Wallet> {
        self.ledger
            .create_wallet(user, &self.config.currency_code)
            .await
    }

    /// Adds funds to a user's wallet, recording a credit transaction.
    pub async fn credit(
        &self,
        user: UserId,
        amount: Amount,
        reason: CreditReason,
    ) -> Result<Balance> {
        let tx = Transaction {
            key: Uuid::new_v4().to_string(),
            user,
            amount: amount.value(),
            transaction_type: TransactionType::Credit,
            status: TxStatus::Complete,
            description: Some(reason.description().to_string()),
            created_at: Utc::now(),
        };
        let balance = self
            .ledger
            .apply(Posting {
                user,
                entry: Entry::Credit,
                amount: amount.value(),
                records: vec![LedgerRecord::Transaction(tx)],
            })
            .await?;
        let notice = Notice::WalletCredited {
            user,
            amount: amount.value(),
            description: reason.description().to_string(),
        };
        if let Err(err) = self.notifier.enqueue(notice).await {
            warn!(user, error = %err, "failed to enqueue credit notice");
        }
        Ok(balance)
    }

    /// Spends from a user's wallet, writing a completed payment and its
    /// mirror transaction in the same commit as the balance change.
    pub async fn debit(
        &self,
        user: UserId,
        amount: Amount,
        payment_type: PaymentType,
        task_key: Option<String>,
    ) -> Result<Balance> {
        let key = Uuid::new_v4().to_string();
        let now = Utc::now();
        let payment = Payment {
            key: key.clone(),
            user,
            amount: amount.value(),
            payment_type,
            payment_method: PaymentMethod::Wallet,
            status: TxStatus::Complete,
            task_key,
            created_at: now,
        };
        let tx = Transaction {
            key,
            user,
            amount: amount.value(),
            transaction_type: TransactionType::Debit,
            status: TxStatus::Complete,
            description: None,
            created_at: now,
        };
        let balance = self
            .ledger
            .apply(Posting {
                user,
                entry: Entry::Debit,
                amount: amount.value(),
                records: vec![
                    LedgerRecord::Payment(payment),
                    LedgerRecord::Transaction(tx),
                ],
            })
            .await?;
        let notice = Notice::WalletDebited {
            user,
            amount: amount.value(),
        };
        if let Err(err) = self.notifier.enqueue(notice).await {
            warn!(user, error = %err, "failed to enqueue debit notice");
        }
        Ok(balance)
    }

    /// Returns money to a user minus the platform fee.
    pub async fn refund(&self, user: UserId, gross: Amount) -> Result<Balance> {
        let net = Amount::new(gross.net_of_fee())?;
        self.credit(user, net, CreditReason::Refund).await
    }

    /// Opens a gateway-funded wallet top-up: writes the pending ledger rows
    /// keyed by the reference the gateway will echo back, without touching
    /// the balance. Settlement happens through the reconciler.
    pub async fn initiate_deposit(&self, user: UserId, amount: Amount) -> Result<Payment> {
        self.record_pending(user, amount, PaymentType::CreditWallet)
            .await
    }

    /// Opens a gateway-funded membership payment. Membership activates when
    /// the reconciler settles the reference.
    pub async fn initiate_membership_fee(&self, user: UserId, amount: Amount) -> Result<Payment> {
        self.record_pending(user, amount, PaymentType::MembershipFee)
            .await
    }

    async fn record_pending(
        &self,
        user: UserId,
        amount: Amount,
        payment_type: PaymentType,
    ) -> Result<Payment> {
        let key = Uuid::new_v4().to_string();
        let now = Utc::now();
        let payment = Payment {
            key: key.clone(),
            user,
            amount: amount.value(),
            payment_type,
            payment_method: PaymentMethod::Gateway,
            status: TxStatus::Pending,
            task_key: None,
            created_at: now,
        };
        let tx = Transaction {
            key,
            user,
            amount: amount.value(),
            transaction_type: TransactionType::Payment,
            status: TxStatus::Pending,
            description: None,
            created_at: now,
        };
        self.ledger
            .record(vec![
                LedgerRecord::Payment(payment.clone()),
                LedgerRecord::Transaction(tx),
            ])
            .await?;
        Ok(payment)
    }

    /// Sends a payout to the user's bank account.
    ///
    /// The wallet is debited the amount plus the platform fee once the
    /// gateway accepts the transfer; the rows stay pending until the
    /// reconciler settles them, and a failed transfer reverses the debit.
    pub async fn request_withdrawal(
        &self,
        user: UserId,
        amount: Amount,
        bank: BankRecipient,
    ) -> Result<Withdrawal> {
        if amount.value() < self.config.min_withdrawal {
            return Err(EngineError::Validation(format!(
                "withdrawal amount is below the minimum of {}",
                self.config.min_withdrawal
            )));
        }
        let wallet = self
            .ledger
            .wallet(user)
            .await?
            .ok_or(EngineError::WalletMissing(user))?;
        if wallet.balance < Balance::new(amount.with_fee()) {
            return Err(EngineError::InsufficientBalance);
        }

        let reference = Uuid::new_v4().to_string();
        self.gateway
            .initiate_transfer(TransferRequest {
                reference: reference.clone(),
                amount: amount.value(),
                currency_code: self.config.currency_code.clone(),
                bank_code: bank.bank_code.clone(),
                account_no: bank.account_no.clone(),
                narration: format!("wallet payout for user {user}"),
            })
            .await?;

        let now = Utc::now();
        let withdrawal = Withdrawal {
            reference: reference.clone(),
            user,
            amount: amount.value(),
            fee: amount.platform_fee(),
            bank_name: bank.bank_name,
            account_no: bank.account_no,
            currency_code: self.config.currency_code.clone(),
            status: WithdrawalStatus::Pending,
            created_at: now,
        };
        let tx = Transaction {
            key: reference,
            user,
            amount: amount.value(),
            transaction_type: TransactionType::Withdrawal,
            status: TxStatus::Pending,
            description: None,
            created_at: now,
        };
        self.ledger
            .apply(Posting {
                user,
                entry: Entry::Debit,
                amount: amount.with_fee(),
                records: vec![
                    LedgerRecord::Transaction(tx),
                    LedgerRecord::Withdrawal(withdrawal.clone()),
                ],
            })
            .await?;
        let notice = Notice::WalletDebited {
            user,
            amount: amount.with_fee(),
        };
        if let Err(err) = self.notifier.enqueue(notice).await {
            warn!(user, error = %err, "failed to enqueue debit notice");
        }
        Ok(withdrawal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{GatewayCharge, GatewayTransfer};
    use crate::infrastructure::in_memory::InMemoryLedgerStore;
    use crate::infrastructure::outbox::OutboxNotifier;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct AcceptingGateway;

    #[async_trait]
    impl PaymentGateway for AcceptingGateway {
        async fn verify_charge(&self, _reference: &str) -> Result<GatewayCharge> {
            unimplemented!("not used by wallet tests")
        }

        async fn verify_transfer(&self, _reference: &str) -> Result<GatewayTransfer> {
            unimplemented!("not used by wallet tests")
        }

        async fn initiate_transfer(&self, request: TransferRequest) -> Result<GatewayTransfer> {
            Ok(GatewayTransfer {
                reference: request.reference,
                status: "NEW".to_string(),
            })
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn enqueue(&self, _notice: Notice) -> Result<()> {
            Err(EngineError::Validation("outbox unavailable".to_string()))
        }
    }

    fn service(ledger: Arc<InMemoryLedgerStore>) -> WalletService {
        WalletService::new(
            Arc::new(EngineConfig::default()),
            ledger,
            Arc::new(AcceptingGateway),
            Arc::new(OutboxNotifier::new()),
        )
    }

    #[tokio::test]
    async fn test_credit_records_transaction() {
        let ledger = Arc::new(InMemoryLedgerStore::new());
        ledger.create_wallet(1, "NGN").await.unwrap();
        let wallet = service(ledger.clone());

        let balance = wallet
            .credit(1, Amount::new(dec!(110)).unwrap(), CreditReason::TaskReward)
            .await
            .unwrap();
        assert_eq!(balance, Balance::new(dec!(110)));
    }

    #[tokio::test]
    async fn test_credit_succeeds_when_notifier_fails() {
        let ledger = Arc::new(InMemoryLedgerStore::new());
        ledger.create_wallet(1, "NGN").await.unwrap();
        let wallet = WalletService::new(
            Arc::new(EngineConfig::default()),
            ledger.clone(),
            Arc::new(AcceptingGateway),
            Arc::new(FailingNotifier),
        );

        // Notices are best-effort; the committed credit must stand.
        let balance = wallet
            .credit(1, Amount::new(dec!(110)).unwrap(), CreditReason::TaskReward)
            .await
            .unwrap();
        assert_eq!(balance, Balance::new(dec!(110)));
        assert_eq!(
            ledger.wallet(1).await.unwrap().unwrap().balance,
            Balance::new(dec!(110))
        );
    }

    #[tokio::test]
    async fn test_debit_insufficient_leaves_no_rows() {
        let ledger = Arc::new(InMemoryLedgerStore::new());
        ledger.create_wallet(1, "NGN").await.unwrap();
        let wallet = service(ledger.clone());

        let result = wallet
            .debit(
                1,
                Amount::new(dec!(50)).unwrap(),
                PaymentType::TaskCreation,
                None,
            )
            .await;
        assert!(matches!(result, Err(EngineError::InsufficientBalance)));
    }

    #[tokio::test]
    async fn test_refund_deducts_platform_fee() {
        let ledger = Arc::new(InMemoryLedgerStore::new());
        ledger.create_wallet(1, "NGN").await.unwrap();
        let wallet = service(ledger.clone());

        let balance = wallet
            .refund(1, Amount::new(dec!(1000)).unwrap())
            .await
            .unwrap();
        assert_eq!(balance, Balance::new(dec!(985.00)));
    }

    #[tokio::test]
    async fn test_withdrawal_below_minimum() {
        let ledger = Arc::new(InMemoryLedgerStore::new());
        ledger.create_wallet(1, "NGN").await.unwrap();
        let wallet = service(ledger.clone());

        let result = wallet
            .request_withdrawal(
                1,
                Amount::new(dec!(500)).unwrap(),
                BankRecipient {
                    bank_name: "Acme Bank".to_string(),
                    bank_code: "044".to_string(),
                    account_no: "0690000040".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn test_withdrawal_debits_amount_plus_fee() {
        let ledger = Arc::new(InMemoryLedgerStore::new());
        ledger.create_wallet(1, "NGN").await.unwrap();
        let wallet = service(ledger.clone());
        wallet
            .credit(1, Amount::new(dec!(2000)).unwrap(), CreditReason::Referral)
            .await
            .unwrap();

        let withdrawal = wallet
            .request_withdrawal(
                1,
                Amount::new(dec!(1000)).unwrap(),
                BankRecipient {
                    bank_name: "Acme Bank".to_string(),
                    bank_code: "044".to_string(),
                    account_no: "0690000040".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(withdrawal.fee, dec!(15.00));
        assert_eq!(withdrawal.status, WithdrawalStatus::Pending);

        let balance = ledger.wallet(1).await.unwrap().unwrap().balance;
        assert_eq!(balance, Balance::new(dec!(985.00)));

        let tx = ledger
            .transaction(&withdrawal.reference)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Withdrawal);
        assert_eq!(tx.status, TxStatus::Pending);
    }

    #[tokio::test]
    async fn test_withdrawal_insufficient_for_fee() {
        let ledger = Arc::new(InMemoryLedgerStore::new());
        ledger.create_wallet(1, "NGN").await.unwrap();
        let wallet = service(ledger.clone());
        // Exactly the amount, but not the fee on top.
        wallet
            .credit(1, Amount::new(dec!(1000)).unwrap(), CreditReason::Referral)
            .await
            .unwrap();

        let result = wallet
            .request_withdrawal(
                1,
                Amount::new(dec!(1000)).unwrap(),
                BankRecipient {
                    bank_name: "Acme Bank".to_string(),
                    bank_code: "044".to_string(),
                    account_no: "0690000040".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(EngineError::InsufficientBalance)));
    }
}
