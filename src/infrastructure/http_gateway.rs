use crate::domain::ledger::PaymentType;
use crate::domain::ports::{GatewayCharge, GatewayTransfer, PaymentGateway, TransferRequest};
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

/// HTTP client for the payment gateway's REST API.
///
/// Every response arrives in an envelope whose `status` field says whether
/// the call itself succeeded; anything but `"success"` is a protocol error,
/// distinct from the settlement status carried in `data`.
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ChargeData {
    #[serde(alias = "tx_ref")]
    reference: String,
    amount: Option<Decimal>,
    status: String,
    meta: Option<ChargeMeta>,
}

#[derive(Debug, Deserialize)]
struct ChargeMeta {
    payment_type: Option<PaymentType>,
    task_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransferData {
    reference: String,
    status: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, secret_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        }
    }

    fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T> {
        if envelope.status != "success" {
            return Err(EngineError::GatewayProtocol(
                envelope
                    .message
                    .unwrap_or_else(|| envelope.status.clone()),
            ));
        }
        envelope
            .data
            .ok_or_else(|| EngineError::GatewayProtocol("response has no data".to_string()))
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn verify_charge(&self, reference: &str) -> Result<GatewayCharge> {
        let url = format!("{}/transactions/verify_by_reference", self.base_url);
        let envelope: Envelope<ChargeData> = self
            .http
            .get(url)
            .query(&[("tx_ref", reference)])
            .bearer_auth(&self.secret_key)
            .send()
            .await?
            .json()
            .await?;
        let data = Self::unwrap_envelope(envelope)?;
        let (payment_type, task_key) = match data.meta {
            Some(meta) => (meta.payment_type, meta.task_key),
            None => (None, None),
        };
        Ok(GatewayCharge {
            reference: data.reference,
            amount: data.amount,
            status: data.status,
            payment_type,
            task_key,
        })
    }

    async fn verify_transfer(&self, reference: &str) -> Result<GatewayTransfer> {
        let url = format!("{}/transfers", self.base_url);
        let envelope: Envelope<Vec<TransferData>> = self
            .http
            .get(url)
            .query(&[("reference", reference)])
            .bearer_auth(&self.secret_key)
            .send()
            .await?
            .json()
            .await?;
        let transfers = Self::unwrap_envelope(envelope)?;
        let transfer = transfers
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::GatewayProtocol("transfer not found".to_string()))?;
        Ok(GatewayTransfer {
            reference: transfer.reference,
            status: transfer.status,
        })
    }

    async fn initiate_transfer(&self, request: TransferRequest) -> Result<GatewayTransfer> {
        let url = format!("{}/transfers", self.base_url);
        let body = json!({
            "account_bank": request.bank_code,
            "account_number": request.account_no,
            "amount": request.amount,
            "currency": request.currency_code,
            "narration": request.narration,
            "reference": request.reference,
        });
        let envelope: Envelope<TransferData> = self
            .http
            .post(url)
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        let data = Self::unwrap_envelope(envelope)?;
        Ok(GatewayTransfer {
            reference: data.reference,
            status: data.status,
        })
    }
}
