//! Submit - bounded retry loop that builds, signs and broadcasts one payment
//!
//! ```text
//! load account + base fee ──(error)──→ Failure{attempts: 0}
//!          │
//!          ▼
//! ┌─→ Building → Signing → Submitting ─┬─→ Accepted ──→ Success
//! │                                    ├─→ Rejected ──┐
//! │                                    └─→ Error ─────┤ (429: pause)
//! └──────────── attempt < max_attempts ◄──────────────┘
//!                      │
//!                      ▼
//!               Failure{last_error}
//! ```
//!
//! The account snapshot, base fee and send amount are fixed for the whole
//! loop. Retries are flat: no backoff growth, no fee bump. The only delay is
//! the fixed pause after a rate-limit error.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::amount::{send_amount, Amount};
use crate::config::SendConfig;
use crate::identity::KeyPair;
use crate::ledger::{AccountSnapshot, LedgerClient, LedgerError, SubmitResponse};
use crate::tx::{PaymentTransaction, TxError};

pub const AMOUNT_TOO_SMALL: &str = "Amount too small or insufficient balance";
pub const NO_ATTEMPTS: &str = "No attempts made";
pub const ACCOUNT_LOAD_PREFIX: &str = "Failed to load account";

/// Emitted at the start of every attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub attempt: u32,
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Bad input, rejected before any derivation or network activity
    Validation,
    /// Initial account, fee or balance fetch failed
    AccountLoad,
    /// Every attempt was rejected or failed in transit
    Submission,
    /// Nothing above the reserve to send
    InsufficientAmount,
}

/// Terminal result, returned exactly once per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success { hash: String, amount: Amount, attempts: u32 },
    Failure { kind: FailureKind, reason: String, attempts: u32 },
}

impl AttemptOutcome {
    pub fn failure(kind: FailureKind, reason: impl Into<String>, attempts: u32) -> Self {
        AttemptOutcome::Failure { kind, reason: reason.into(), attempts }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            AttemptOutcome::Success { attempts, .. } | AttemptOutcome::Failure { attempts, .. } => *attempts,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            AttemptOutcome::Failure { kind, .. } => Some(*kind),
            AttemptOutcome::Success { .. } => None,
        }
    }
}

/// What to send, fixed for the life of one loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub destination: String,
    /// Zero means "everything above the reserve"
    pub requested: Amount,
    pub sweep: bool,
    /// Native balance as seen by the caller before the loop
    pub balance: Amount,
}

impl SendRequest {
    pub fn send_amount(&self, reserve: Amount) -> Amount {
        send_amount(self.requested, self.balance, reserve, self.sweep)
    }
}

#[derive(Error, Debug)]
enum AttemptError {
    #[error(transparent)]
    Tx(#[from] TxError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Run the retry loop. Takes the keypair by value so the signing key is
/// dropped (and zeroed) on every exit path.
pub async fn submit_payment<L, F>(
    ledger: &L,
    keypair: KeyPair,
    request: &SendRequest,
    config: &SendConfig,
    mut on_progress: F,
) -> AttemptOutcome
where
    L: LedgerClient + ?Sized,
    F: FnMut(Progress) + Send,
{
    let amount = request.send_amount(config.reserve);
    let max_attempts = config.max_attempts;

    // Loaded once: a stale sequence is not refreshed between attempts
    let (account, base_fee) = match load_snapshot(ledger, &keypair).await {
        Ok(loaded) => loaded,
        Err(e) => {
            warn!(error = %e, "Account load failed");
            return AttemptOutcome::failure(FailureKind::AccountLoad, format!("{}: {}", ACCOUNT_LOAD_PREFIX, e), 0);
        }
    };
    info!(
        account = %account.account_id(),
        sequence = account.sequence,
        base_fee,
        amount = %amount,
        max_attempts,
        "Starting submission"
    );

    let mut last_error: Option<(FailureKind, String)> = None;
    let mut attempts = 0;
    while attempts < max_attempts {
        attempts += 1;
        on_progress(Progress { attempt: attempts, max_attempts });

        if amount.is_zero() {
            last_error = Some((FailureKind::InsufficientAmount, AMOUNT_TOO_SMALL.into()));
            continue;
        }

        match attempt(ledger, &keypair, &account, base_fee, request, amount, config).await {
            Ok(SubmitResponse::Accepted { hash }) => {
                info!(%hash, attempts, "Payment accepted");
                return AttemptOutcome::Success { hash, amount, attempts };
            }
            Ok(SubmitResponse::Rejected { reason }) => {
                debug!(attempt = attempts, %reason, "Rejected");
                last_error = Some((FailureKind::Submission, reason));
            }
            Err(e) => {
                let rate_limited = matches!(&e, AttemptError::Ledger(le) if le.is_rate_limited());
                debug!(attempt = attempts, error = %e, rate_limited, "Attempt failed");
                last_error = Some((FailureKind::Submission, e.to_string()));
                if rate_limited && attempts < max_attempts {
                    tokio::time::sleep(config.rate_limit_pause).await;
                }
            }
        }
    }

    let (kind, reason) = last_error.unwrap_or((FailureKind::Submission, NO_ATTEMPTS.into()));
    warn!(attempts, %reason, "Giving up");
    AttemptOutcome::failure(kind, reason, attempts)
}

async fn load_snapshot<L: LedgerClient + ?Sized>(
    ledger: &L,
    keypair: &KeyPair,
) -> Result<(AccountSnapshot, u32), LedgerError> {
    let account = ledger.load_account(keypair.public_key()).await?;
    let base_fee = ledger.fetch_base_fee().await?;
    Ok((account, base_fee))
}

/// Building → Signing → Submitting
async fn attempt<L: LedgerClient + ?Sized>(
    ledger: &L,
    keypair: &KeyPair,
    account: &AccountSnapshot,
    base_fee: u32,
    request: &SendRequest,
    amount: Amount,
    config: &SendConfig,
) -> Result<SubmitResponse, AttemptError> {
    let valid_until = unix_now().saturating_add(config.tx_timeout.as_secs());
    let tx = PaymentTransaction::build(account, &request.destination, amount, base_fee, valid_until)?;
    let signed = tx.sign(keypair, &config.network_passphrase)?;
    Ok(ledger.submit(&signed).await?)
}

fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serializes_tagged() {
        let success = AttemptOutcome::Success { hash: "H".into(), amount: "4.99".parse().unwrap(), attempts: 4 };
        let json = serde_json::to_value(&success).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["amount"], "4.99");
        assert_eq!(json["attempts"], 4);

        let failure = AttemptOutcome::failure(FailureKind::AccountLoad, "Failed to load account: x", 0);
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["kind"], "account_load");
    }

    #[test]
    fn test_outcome_accessors() {
        let failure = AttemptOutcome::failure(FailureKind::Submission, "x", 50);
        assert!(!failure.is_success());
        assert_eq!(failure.attempts(), 50);
        assert_eq!(failure.failure_kind(), Some(FailureKind::Submission));
    }

    #[test]
    fn test_request_send_amount() {
        let request = SendRequest {
            destination: String::new(),
            requested: "10".parse().unwrap(),
            sweep: false,
            balance: "5".parse().unwrap(),
        };
        assert_eq!(request.send_amount("0.01".parse().unwrap()).to_string(), "4.99");
    }
}
