//! Payment transactions - build, encode, sign
//!
//! One native-asset payment operation per transaction, encoded as a v1
//! `TransactionEnvelope`:
//!
//! ```text
//! hash      = SHA256( SHA256(network passphrase) || ENVELOPE_TYPE_TX || tx )
//! signature = ed25519(secret, hash)
//! envelope  = ENVELOPE_TYPE_TX || tx || [ (hint, signature) ]
//! ```

mod xdr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::amount::Amount;
use crate::identity::{decode_account_id, encode_account_id, KeyPair, StrKeyError};
use crate::ledger::AccountSnapshot;
use xdr::XdrWriter;

pub const ENVELOPE_TYPE_TX: u32 = 2;
const KEY_TYPE_ED25519: u32 = 0;
const PRECOND_TIME: u32 = 1;
const MEMO_NONE: u32 = 0;
const OPERATION_PAYMENT: u32 = 1;
const ASSET_TYPE_NATIVE: u32 = 0;
const NO_SOURCE_ACCOUNT: u32 = 0;
const NO_EXTENSION: u32 = 0;

#[derive(Error, Debug)]
pub enum TxError {
    #[error("Invalid destination address: {0}")]
    InvalidDestination(#[from] StrKeyError),
    #[error("Payment amount must be positive")]
    ZeroAmount,
    #[error("Sequence number overflow")]
    SequenceOverflow,
    #[error("Signing key does not match source account {0}")]
    SourceMismatch(String),
}

/// Validity window in unix seconds. `max_time == 0` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

/// Unsigned single-payment transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentTransaction {
    pub source: [u8; 32],
    pub fee: u32,
    pub sequence: i64,
    pub time_bounds: TimeBounds,
    pub destination: [u8; 32],
    pub amount: Amount,
}

impl PaymentTransaction {
    /// Payment from `account`, using its next sequence number.
    ///
    /// The snapshot is not mutated: building twice yields the same sequence.
    pub fn build(
        account: &AccountSnapshot,
        destination: &str,
        amount: Amount,
        base_fee: u32,
        valid_until: u64,
    ) -> Result<Self, TxError> {
        let destination = decode_account_id(destination.trim())?;
        if amount.is_zero() {
            return Err(TxError::ZeroAmount);
        }
        let sequence = account.sequence.checked_add(1).ok_or(TxError::SequenceOverflow)?;

        Ok(Self {
            source: account.public_key,
            // One operation
            fee: base_fee,
            sequence,
            time_bounds: TimeBounds { min_time: 0, max_time: valid_until },
            destination,
            amount,
        })
    }

    pub fn source_address(&self) -> String {
        encode_account_id(&self.source)
    }

    pub fn destination_address(&self) -> String {
        encode_account_id(&self.destination)
    }

    /// XDR `Transaction`
    pub fn to_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        w.u32(KEY_TYPE_ED25519).fixed_opaque(&self.source);
        w.u32(self.fee);
        w.i64(self.sequence);
        w.u32(PRECOND_TIME).u64(self.time_bounds.min_time).u64(self.time_bounds.max_time);
        w.u32(MEMO_NONE);

        // operations<100>: a single payment
        w.u32(1);
        w.u32(NO_SOURCE_ACCOUNT);
        w.u32(OPERATION_PAYMENT);
        w.u32(KEY_TYPE_ED25519).fixed_opaque(&self.destination);
        w.u32(ASSET_TYPE_NATIVE);
        w.i64(self.amount.stroops());

        w.u32(NO_EXTENSION);
        w.into_bytes()
    }

    /// Network-bound hash that gets signed
    pub fn hash(&self, network_passphrase: &str) -> [u8; 32] {
        let network_id = Sha256::digest(network_passphrase.as_bytes());
        let mut w = XdrWriter::new();
        w.fixed_opaque(&network_id).u32(ENVELOPE_TYPE_TX).raw(&self.to_xdr());
        Sha256::digest(w.into_bytes()).into()
    }

    pub fn sign(self, keypair: &KeyPair, network_passphrase: &str) -> Result<SignedTransaction, TxError> {
        if keypair.public_key() != &self.source {
            return Err(TxError::SourceMismatch(self.source_address()));
        }
        let hash = self.hash(network_passphrase);
        let signature = keypair.sign(&hash);
        Ok(SignedTransaction { tx: self, hash, hint: keypair.signature_hint(), signature })
    }
}

/// Transaction plus one decorated signature, ready for submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    tx: PaymentTransaction,
    hash: [u8; 32],
    hint: [u8; 4],
    signature: [u8; 64],
}

impl SignedTransaction {
    pub fn transaction(&self) -> &PaymentTransaction {
        &self.tx
    }

    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Hex hash as reported by the ledger
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn signature(&self) -> &[u8; 64] {
        &self.signature
    }

    /// XDR `TransactionEnvelope`
    pub fn envelope_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        w.u32(ENVELOPE_TYPE_TX).raw(&self.tx.to_xdr());
        w.u32(1).fixed_opaque(&self.hint).var_opaque(&self.signature);
        w.into_bytes()
    }

    /// Base64 envelope, the form accepted by `POST /transactions`
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.envelope_xdr())
    }
}
