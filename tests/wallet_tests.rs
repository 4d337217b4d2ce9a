mod common;

use common::{webhook_body, Harness, WEBHOOK_SECRET};
use rust_decimal_macros::dec;
use taskpay::domain::ledger::{BankRecipient, TxStatus, WithdrawalStatus};
use taskpay::domain::money::{Amount, Balance};
use taskpay::domain::ports::{LedgerStore, Notice};

fn bank() -> BankRecipient {
    BankRecipient {
        bank_name: "Acme Bank".to_string(),
        bank_code: "044".to_string(),
        account_no: "0690000040".to_string(),
    }
}

#[tokio::test]
async fn test_deposit_settles_into_balance() {
    let h = Harness::new();
    h.seed_wallet(1, dec!(0)).await;

    let payment = h
        .engine
        .wallet
        .initiate_deposit(1, Amount::new(dec!(500)).unwrap())
        .await
        .unwrap();
    assert_eq!(payment.status, TxStatus::Pending);
    assert_eq!(
        h.ledger.wallet(1).await.unwrap().unwrap().balance,
        Balance::ZERO
    );

    let body = webhook_body(&payment.key, "successful", dec!(500), Some("credit-wallet"), None);
    let outcome = h
        .engine
        .reconciler
        .handle_webhook(&body, Some(WEBHOOK_SECRET))
        .await
        .unwrap();
    assert!(outcome.applied);
    assert_eq!(outcome.status, TxStatus::Complete);

    assert_eq!(
        h.ledger.wallet(1).await.unwrap().unwrap().balance,
        Balance::new(dec!(500))
    );
    assert_eq!(
        h.ledger.payment(&payment.key).await.unwrap().unwrap().status,
        TxStatus::Complete
    );
}

#[tokio::test]
async fn test_withdrawal_success_keeps_debit() {
    let h = Harness::new();
    h.seed_wallet(1, dec!(2000)).await;

    let withdrawal = h
        .engine
        .wallet
        .request_withdrawal(1, Amount::new(dec!(1000)).unwrap(), bank())
        .await
        .unwrap();
    // Debited amount plus the 1.5% fee up front.
    assert_eq!(
        h.ledger.wallet(1).await.unwrap().unwrap().balance,
        Balance::new(dec!(985.00))
    );

    h.gateway
        .set_transfer(&withdrawal.reference, "SUCCESSFUL")
        .await;
    let outcome = h
        .engine
        .reconciler
        .verify(&withdrawal.reference)
        .await
        .unwrap();
    assert!(outcome.applied);

    let settled = h
        .ledger
        .withdrawal(&withdrawal.reference)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(settled.status, WithdrawalStatus::Successful);
    assert_eq!(
        h.ledger.wallet(1).await.unwrap().unwrap().balance,
        Balance::new(dec!(985.00))
    );
}

#[tokio::test]
async fn test_failed_withdrawal_reverses_amount_and_fee() {
    let h = Harness::new();
    h.seed_wallet(1, dec!(2000)).await;

    let withdrawal = h
        .engine
        .wallet
        .request_withdrawal(1, Amount::new(dec!(1000)).unwrap(), bank())
        .await
        .unwrap();
    h.outbox.drain().await;

    h.gateway.set_transfer(&withdrawal.reference, "FAILED").await;
    let outcome = h
        .engine
        .reconciler
        .verify(&withdrawal.reference)
        .await
        .unwrap();
    assert!(outcome.applied);
    assert_eq!(outcome.status, TxStatus::Failed);

    // Back to where the user started.
    assert_eq!(
        h.ledger.wallet(1).await.unwrap().unwrap().balance,
        Balance::new(dec!(2000))
    );
    let settled = h
        .ledger
        .withdrawal(&withdrawal.reference)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(settled.status, WithdrawalStatus::Failed);

    let notices = h.outbox.drain().await;
    assert!(notices.iter().any(|n| matches!(
        n,
        Notice::WithdrawalSettled {
            status: WithdrawalStatus::Failed,
            ..
        }
    )));
}

#[tokio::test]
async fn test_failed_withdrawal_reversal_applies_once() {
    let h = Harness::new();
    h.seed_wallet(1, dec!(2000)).await;

    let withdrawal = h
        .engine
        .wallet
        .request_withdrawal(1, Amount::new(dec!(1000)).unwrap(), bank())
        .await
        .unwrap();

    let body = serde_json::json!({
        "event": "transfer.completed",
        "data": {"reference": withdrawal.reference, "status": "FAILED"},
    })
    .to_string()
    .into_bytes();

    let first = h
        .engine
        .reconciler
        .handle_webhook(&body, Some(WEBHOOK_SECRET))
        .await
        .unwrap();
    assert!(first.applied);
    let second = h
        .engine
        .reconciler
        .handle_webhook(&body, Some(WEBHOOK_SECRET))
        .await
        .unwrap();
    assert!(!second.applied);

    assert_eq!(
        h.ledger.wallet(1).await.unwrap().unwrap().balance,
        Balance::new(dec!(2000))
    );
}

#[tokio::test]
async fn test_membership_fee_activates_on_settlement() {
    let h = Harness::new();
    h.seed_wallet(7, dec!(0)).await;

    let payment = h
        .engine
        .wallet
        .initiate_membership_fee(7, Amount::new(dec!(1000)).unwrap())
        .await
        .unwrap();
    assert!(!h.users.is_member(7).await);

    let body = webhook_body(&payment.key, "successful", dec!(1000), Some("membership-fee"), None);
    h.engine
        .reconciler
        .handle_webhook(&body, Some(WEBHOOK_SECRET))
        .await
        .unwrap();

    assert!(h.users.is_member(7).await);
    // Membership money is not wallet money.
    assert_eq!(
        h.ledger.wallet(7).await.unwrap().unwrap().balance,
        Balance::ZERO
    );
}
