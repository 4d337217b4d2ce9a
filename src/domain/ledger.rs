use super::wallet::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a payment is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentType {
    TaskCreation,
    MembershipFee,
    CreditWallet,
    Withdrawal,
}

/// Where the money for a payment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Wallet,
    Gateway,
}

/// Settlement status shared by payments and transactions.
///
/// `Complete`, `Failed` and `Abandoned` are terminal; once a row reaches one
/// of them it never changes again. Gateway vocabulary the engine does not
/// recognize is stored literally as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TxStatus {
    Pending,
    Complete,
    Failed,
    Abandoned,
    Other(String),
}

impl TxStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Abandoned)
    }
}

impl From<String> for TxStatus {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "pending" => Self::Pending,
            "complete" => Self::Complete,
            "failed" => Self::Failed,
            "abandoned" => Self::Abandoned,
            _ => Self::Other(value),
        }
    }
}

impl From<TxStatus> for String {
    fn from(status: TxStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
            Self::Abandoned => write!(f, "abandoned"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// A request for money movement, keyed by the reference shared with the
/// payment gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub key: String,
    pub user: UserId,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub payment_method: PaymentMethod,
    pub status: TxStatus,
    /// Set when the payment funds a task, so reconciliation can find it.
    pub task_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
    Payment,
    Withdrawal,
}

/// A ledger entry mirroring a payment or a pure wallet movement.
/// The amount is immutable once written; only the status advances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub key: String,
    pub user: UserId,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub status: TxStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Transfer vocabulary reported by the gateway for payouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WithdrawalStatus {
    Pending,
    Successful,
    Failed,
    Other(String),
}

impl WithdrawalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Successful | Self::Failed)
    }
}

impl From<String> for WithdrawalStatus {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "pending" => Self::Pending,
            "successful" => Self::Successful,
            "failed" => Self::Failed,
            _ => Self::Other(value),
        }
    }
}

impl From<WithdrawalStatus> for String {
    fn from(status: WithdrawalStatus) -> Self {
        match status {
            WithdrawalStatus::Pending => "pending".to_string(),
            WithdrawalStatus::Successful => "successful".to_string(),
            WithdrawalStatus::Failed => "failed".to_string(),
            WithdrawalStatus::Other(s) => s,
        }
    }
}

/// Bank details for an outbound transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankRecipient {
    pub bank_name: String,
    pub bank_code: String,
    pub account_no: String,
}

/// A payout request. `reference` doubles as the ledger transaction key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub reference: String,
    pub user: UserId,
    pub amount: Decimal,
    pub fee: Decimal,
    pub bank_name: String,
    pub account_no: String,
    pub currency_code: String,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
}

/// Why a wallet is being credited, recorded on the ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditReason {
    TaskReward,
    Referral,
    Refund,
}

impl CreditReason {
    pub fn description(&self) -> &'static str {
        match self {
            Self::TaskReward => "task-reward",
            Self::Referral => "referral-bonus",
            Self::Refund => "refund",
        }
    }
}
