//! Ledger - the remote collaborator the submit loop talks to
//!
//! # Architecture
//!
//! ```text
//! submit_payment ──→ LedgerClient (trait)
//!                       │
//!                       ├── HorizonClient   (REST, production)
//!                       └── fakes           (tests)
//! ```
//!
//! | Call | Horizon | Result |
//! |------|---------|--------|
//! | `load_account` | `GET /accounts/{id}` | sequence snapshot |
//! | `fetch_base_fee` | `GET /fee_stats` | stroops per operation |
//! | `submit` | `POST /transactions` | accepted hash or rejection |
//! | `native_balance` | `GET /accounts/{id}` | native balance |

#[cfg(feature = "native")]
mod horizon;

use async_trait::async_trait;
use thiserror::Error;

use crate::amount::Amount;
use crate::identity::encode_account_id;
use crate::tx::SignedTransaction;

#[cfg(feature = "native")]
pub use horizon::HorizonClient;

/// Account state captured once before the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub public_key: [u8; 32],
    /// Current sequence; the next transaction uses `sequence + 1`
    pub sequence: i64,
}

impl AccountSnapshot {
    pub fn account_id(&self) -> String {
        encode_account_id(&self.public_key)
    }
}

/// Answer to a submission that reached the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResponse {
    Accepted { hash: String },
    Rejected { reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("429 Too Many Requests: {0}")]
    RateLimited(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl LedgerError {
    /// HTTP 429 or anything whose message carries the 429 marker
    pub fn is_rate_limited(&self) -> bool {
        match self {
            LedgerError::RateLimited(_) => true,
            LedgerError::Http { status, .. } if *status == 429 => true,
            other => other.to_string().contains("429"),
        }
    }
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn load_account(&self, public_key: &[u8; 32]) -> Result<AccountSnapshot, LedgerError>;
    async fn fetch_base_fee(&self) -> Result<u32, LedgerError>;
    async fn submit(&self, tx: &SignedTransaction) -> Result<SubmitResponse, LedgerError>;
}

/// Spendable native balance, queried by the caller before submitting
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn native_balance(&self, account_id: &str) -> Result<Amount, LedgerError>;
}
