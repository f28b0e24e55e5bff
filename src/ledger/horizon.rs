//! HorizonClient - Horizon REST API over reqwest

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{AccountSnapshot, BalanceSource, LedgerClient, LedgerError, SubmitResponse};
use crate::amount::Amount;
use crate::identity::{decode_account_id, encode_account_id};
use crate::tx::SignedTransaction;

#[derive(Debug, Deserialize)]
struct AccountRecord {
    account_id: String,
    sequence: String,
    #[serde(default)]
    balances: Vec<BalanceRecord>,
}

#[derive(Debug, Deserialize)]
struct BalanceRecord {
    asset_type: String,
    balance: String,
}

#[derive(Debug, Deserialize)]
struct FeeStats {
    last_ledger_base_fee: String,
}

/// Stateless Horizon client. Cheap to clone; shares one connection pool.
#[derive(Debug, Clone)]
pub struct HorizonClient {
    http: Client,
    base_url: String,
}

impl HorizonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, LedgerError> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        let response = check_status(response).await?;
        response.json::<T>().await.map_err(|e| LedgerError::Decode(e.to_string()))
    }

    async fn account(&self, account_id: &str) -> Result<AccountRecord, LedgerError> {
        match self.get_json::<AccountRecord>(&format!("/accounts/{}", account_id)).await {
            Err(LedgerError::Http { status: 404, .. }) => Err(LedgerError::AccountNotFound(account_id.to_string())),
            other => other,
        }
    }
}

/// Map non-success statuses to errors; 429 is kept distinct for the retry loop
async fn check_status(response: Response) -> Result<Response, LedgerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(LedgerError::RateLimited(body));
    }
    Err(LedgerError::Http { status: status.as_u16(), body })
}

/// `Transaction failed: tx_bad_seq` style reason from a Horizon problem document
fn rejection_reason(problem: &Value) -> String {
    let codes = &problem["extras"]["result_codes"];
    let mut parts: Vec<String> = Vec::new();
    if let Some(tx) = codes["transaction"].as_str() {
        parts.push(tx.to_string());
    }
    if let Some(ops) = codes["operations"].as_array() {
        parts.extend(ops.iter().filter_map(|op| op.as_str()).map(str::to_string));
    }
    if parts.is_empty() {
        match problem["title"].as_str() {
            Some(title) => format!("Transaction failed: {}", title),
            None => "Transaction failed".to_string(),
        }
    } else {
        format!("Transaction failed: {}", parts.join(", "))
    }
}

fn native_balance_of(record: &AccountRecord) -> Result<Amount, LedgerError> {
    record
        .balances
        .iter()
        .find(|b| b.asset_type == "native")
        .map(|b| b.balance.parse::<Amount>().map_err(|e| LedgerError::Decode(e.to_string())))
        .unwrap_or(Ok(Amount::ZERO))
}

#[async_trait]
impl LedgerClient for HorizonClient {
    async fn load_account(&self, public_key: &[u8; 32]) -> Result<AccountSnapshot, LedgerError> {
        let record = self.account(&encode_account_id(public_key)).await?;
        let sequence = record
            .sequence
            .parse::<i64>()
            .map_err(|e| LedgerError::Decode(format!("sequence {}: {}", record.sequence, e)))?;
        let public_key = decode_account_id(&record.account_id).map_err(|e| LedgerError::Decode(e.to_string()))?;
        Ok(AccountSnapshot { public_key, sequence })
    }

    async fn fetch_base_fee(&self) -> Result<u32, LedgerError> {
        let stats: FeeStats = self.get_json("/fee_stats").await?;
        stats
            .last_ledger_base_fee
            .parse::<u32>()
            .map_err(|e| LedgerError::Decode(format!("base fee {}: {}", stats.last_ledger_base_fee, e)))
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<SubmitResponse, LedgerError> {
        debug!(hash = %tx.hash_hex(), "Submitting transaction");
        let response = self
            .http
            .post(self.url("/transactions"))
            .form(&[("tx", tx.to_base64())])
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        // 400 is a ledger verdict, not a transport problem
        if response.status() == StatusCode::BAD_REQUEST {
            let problem: Value = response.json().await.unwrap_or(Value::Null);
            return Ok(SubmitResponse::Rejected { reason: rejection_reason(&problem) });
        }

        let body: Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| LedgerError::Decode(e.to_string()))?;
        Ok(match body["hash"].as_str() {
            Some(hash) => SubmitResponse::Accepted { hash: hash.to_string() },
            None => SubmitResponse::Rejected { reason: "Transaction failed".into() },
        })
    }
}

#[async_trait]
impl BalanceSource for HorizonClient {
    async fn native_balance(&self, account_id: &str) -> Result<Amount, LedgerError> {
        let record = self.account(account_id).await?;
        native_balance_of(&record)
    }
}
