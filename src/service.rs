//! Service - one send request from raw input to final report
//!
//! ```text
//! SendOrder ─→ validate ─→ derive ─→ native balance ─→ submit_payment ─→ SendReport
//!                 │                       │
//!                 └─ Validation           └─ AccountLoad (0 attempts)
//! ```
//!
//! Shared by the CLI and the HTTP router. The mnemonic is wiped when the
//! order is dropped and the keypair when the submit loop returns.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};
use zeroize::Zeroize;

use crate::amount::Amount;
use crate::config::SendConfig;
use crate::identity::{decode_account_id, derive_from_phrase, DerivationError, KeyPair};
use crate::ledger::{BalanceSource, LedgerClient, LedgerError};
use crate::submit::{submit_payment, AttemptOutcome, FailureKind, Progress, SendRequest, ACCOUNT_LOAD_PREFIX};

pub const MISSING_INPUT: &str = "Enter both mnemonic and destination address.";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Derivation(#[from] DerivationError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Raw send input as typed by a user
#[derive(Clone, Default, Deserialize)]
pub struct SendOrder {
    pub mnemonic: String,
    pub destination: String,
    /// Zero (or absent) sends everything above the reserve
    #[serde(default)]
    pub amount: Amount,
    #[serde(default)]
    pub sweep: bool,
}

impl SendOrder {
    pub fn new(mnemonic: impl Into<String>, destination: impl Into<String>) -> Self {
        Self { mnemonic: mnemonic.into(), destination: destination.into(), amount: Amount::ZERO, sweep: false }
    }

    pub fn with_amount(mut self, amount: Amount) -> Self { self.amount = amount; self }
    pub fn with_sweep(mut self, sweep: bool) -> Self { self.sweep = sweep; self }
}

impl Drop for SendOrder {
    fn drop(&mut self) {
        self.mnemonic.zeroize();
    }
}

impl fmt::Debug for SendOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendOrder")
            .field("mnemonic", &"<redacted>")
            .field("destination", &self.destination)
            .field("amount", &self.amount)
            .field("sweep", &self.sweep)
            .finish()
    }
}

/// Outcome plus what the front ends display around it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendReport {
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
    /// Source address, once derivation succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Amount>,
    pub elapsed_secs: f64,
}

impl SendReport {
    fn new(outcome: AttemptOutcome, started: Instant) -> Self {
        Self { outcome, address: None, balance: None, elapsed_secs: started.elapsed().as_secs_f64() }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

pub struct SendService<L> {
    ledger: Arc<L>,
    config: SendConfig,
}

impl<L> Clone for SendService<L> {
    fn clone(&self) -> Self {
        Self { ledger: Arc::clone(&self.ledger), config: self.config.clone() }
    }
}

impl<L: LedgerClient + BalanceSource> SendService<L> {
    pub fn new(ledger: Arc<L>, config: SendConfig) -> Self {
        Self { ledger, config }
    }

    pub fn config(&self) -> &SendConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Derived account address; no network access
    pub fn address(&self, mnemonic: &str) -> Result<String, ServiceError> {
        Ok(derive_from_phrase(mnemonic)?.address())
    }

    /// Address and native balance of the derived account
    pub async fn balance(&self, mnemonic: &str) -> Result<(String, Amount), ServiceError> {
        let address = self.address(mnemonic)?;
        let balance = self.ledger.native_balance(&address).await?;
        Ok((address, balance))
    }

    /// Run one send to completion. Always returns a report, never an error.
    pub async fn send<F>(&self, order: &SendOrder, on_progress: F) -> SendReport
    where
        F: FnMut(Progress) + Send,
    {
        let started = Instant::now();

        let keypair = match validate(order) {
            Ok(keypair) => keypair,
            Err(reason) => {
                warn!(%reason, "Rejected send order");
                return SendReport::new(AttemptOutcome::failure(FailureKind::Validation, reason, 0), started);
            }
        };
        let address = keypair.address();

        let balance = match self.ledger.native_balance(&address).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(%address, error = %e, "Balance fetch failed");
                let outcome = AttemptOutcome::failure(FailureKind::AccountLoad, format!("{}: {}", ACCOUNT_LOAD_PREFIX, e), 0);
                let mut report = SendReport::new(outcome, started);
                report.address = Some(address);
                return report;
            }
        };
        info!(%address, %balance, destination = %order.destination.trim(), "Sending");

        let request = SendRequest {
            destination: order.destination.trim().to_string(),
            requested: order.amount,
            sweep: order.sweep,
            balance,
        };
        let outcome = submit_payment(self.ledger.as_ref(), keypair, &request, &self.config, on_progress).await;

        let mut report = SendReport::new(outcome, started);
        report.address = Some(address);
        report.balance = Some(balance);
        report
    }
}

/// Input gate: nothing is derived or fetched unless both fields are usable
fn validate(order: &SendOrder) -> Result<KeyPair, String> {
    let destination = order.destination.trim();
    if order.mnemonic.trim().is_empty() || destination.is_empty() {
        return Err(MISSING_INPUT.to_string());
    }
    decode_account_id(destination).map_err(|e| format!("Invalid destination address: {}", e))?;
    derive_from_phrase(&order.mnemonic).map_err(|e| e.to_string())
}
