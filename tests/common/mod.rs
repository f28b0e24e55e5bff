//! Scripted in-memory ledger shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use pisweep::{AccountSnapshot, Amount, BalanceSource, LedgerClient, LedgerError, SignedTransaction, SubmitResponse};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// Well-known test mnemonic, never use with real funds
pub const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon \
    abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon \
    abandon abandon abandon art";

pub fn destination() -> String {
    pisweep::identity::encode_account_id(&[0x42u8; 32])
}

pub fn amount(s: &str) -> Amount {
    s.parse().expect("amount")
}

/// One recorded submission
#[derive(Debug, Clone)]
pub struct Submitted {
    pub sequence: i64,
    pub amount: Amount,
    pub fee: u32,
    pub at: tokio::time::Instant,
}

/// Replays scripted submit results in order; once the script runs out every
/// further submit gets `fallback`.
pub struct FakeLedger {
    pub sequence: i64,
    pub base_fee: u32,
    pub balance: Result<Amount, LedgerError>,
    pub load_error: Option<LedgerError>,
    pub fee_error: Option<LedgerError>,
    script: Mutex<VecDeque<Result<SubmitResponse, LedgerError>>>,
    fallback: Result<SubmitResponse, LedgerError>,
    submitted: Mutex<Vec<Submitted>>,
    loads: AtomicUsize,
    balance_calls: AtomicUsize,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self {
            sequence: 1_000,
            base_fee: 100_000,
            balance: Ok(amount("10.5")),
            load_error: None,
            fee_error: None,
            script: Mutex::new(VecDeque::new()),
            fallback: Err(LedgerError::Transport("connection reset".into())),
            submitted: Mutex::new(Vec::new()),
            loads: AtomicUsize::new(0),
            balance_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_balance(mut self, balance: Amount) -> Self {
        self.balance = Ok(balance);
        self
    }

    pub fn with_balance_error(mut self, e: LedgerError) -> Self {
        self.balance = Err(e);
        self
    }

    pub fn with_load_error(mut self, e: LedgerError) -> Self {
        self.load_error = Some(e);
        self
    }

    pub fn with_fee_error(mut self, e: LedgerError) -> Self {
        self.fee_error = Some(e);
        self
    }

    pub fn then(self, result: Result<SubmitResponse, LedgerError>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn then_n(self, n: usize, result: Result<SubmitResponse, LedgerError>) -> Self {
        (0..n).fold(self, |ledger, _| ledger.then(result.clone()))
    }

    pub fn otherwise(mut self, result: Result<SubmitResponse, LedgerError>) -> Self {
        self.fallback = result;
        self
    }

    pub fn submitted(&self) -> Vec<Submitted> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn submit_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }
}

pub fn accepted(hash: &str) -> Result<SubmitResponse, LedgerError> {
    Ok(SubmitResponse::Accepted { hash: hash.into() })
}

pub fn rejected(reason: &str) -> Result<SubmitResponse, LedgerError> {
    Ok(SubmitResponse::Rejected { reason: reason.into() })
}

pub fn rate_limited() -> Result<SubmitResponse, LedgerError> {
    Err(LedgerError::RateLimited("Too Many Requests".into()))
}

pub fn transport(msg: &str) -> Result<SubmitResponse, LedgerError> {
    Err(LedgerError::Transport(msg.into()))
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn load_account(&self, public_key: &[u8; 32]) -> Result<AccountSnapshot, LedgerError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match &self.load_error {
            Some(e) => Err(e.clone()),
            None => Ok(AccountSnapshot { public_key: *public_key, sequence: self.sequence }),
        }
    }

    async fn fetch_base_fee(&self) -> Result<u32, LedgerError> {
        match &self.fee_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.base_fee),
        }
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<SubmitResponse, LedgerError> {
        let inner = tx.transaction();
        self.submitted.lock().unwrap().push(Submitted {
            sequence: inner.sequence,
            amount: inner.amount,
            fee: inner.fee,
            at: tokio::time::Instant::now(),
        });
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl BalanceSource for FakeLedger {
    async fn native_balance(&self, _account_id: &str) -> Result<Amount, LedgerError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.balance.clone()
    }
}
