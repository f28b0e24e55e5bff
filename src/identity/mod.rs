//! Identity - Derives the Pi Network keypair from a 24-word mnemonic.
//!
//! ```text
//! Mnemonic (BIP39, 24 words)
//!     │  PBKDF2-HMAC-SHA512, empty passphrase
//!     ▼
//! 64-byte seed
//!     │  SLIP-0010 ed25519, m/44'/314159'/0'
//!     ▼
//! 32-byte ed25519 seed ──→ KeyPair (G... address, S... secret)
//! ```
//!
//! The seed and every intermediate node are zeroed on drop. The mnemonic is
//! never retained past the call.

mod slip10;
mod strkey;

use bip39::{Language, Mnemonic};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

pub use slip10::{DerivationPath, ExtendedKey, HARDENED_OFFSET};
pub use strkey::{
    decode_account_id, decode_secret_seed, encode_account_id, encode_secret_seed, StrKeyError,
    ENCODED_KEY_LEN,
};

/// Pi Network account path. Coin type 314159 is registered to Pi.
pub const PI_DERIVATION_PATH: &str = "m/44'/314159'/0'";

/// Pi wallets are always 24 words
pub const MNEMONIC_WORDS: usize = 24;

/// Errors during key derivation
#[derive(Debug, Error)]
pub enum DerivationError {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
    #[error("Requires 24-word mnemonic, got {0} words")]
    InvalidWordCount(usize),
    #[error("Invalid seed length: {0} bytes")]
    InvalidSeedLength(usize),
    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),
}

/// Ed25519 keypair for a ledger account.
///
/// The signing key zeroes itself on drop. `Debug` only shows the address.
pub struct KeyPair {
    signing_key: SigningKey,
    public_key: [u8; 32],
}

impl KeyPair {
    /// Expand a raw 32-byte ed25519 seed
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let public_key = signing_key.verifying_key().to_bytes();
        Self { signing_key, public_key }
    }

    /// Restore from an `S...` secret
    pub fn from_secret(secret: &str) -> Result<Self, StrKeyError> {
        let seed = decode_secret_seed(secret)?;
        Ok(Self::from_seed(&seed))
    }

    pub fn public_key(&self) -> &[u8; 32] {
        &self.public_key
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// `G...` account address
    pub fn address(&self) -> String {
        encode_account_id(&self.public_key)
    }

    /// `S...` secret seed. Callers must not log or persist it.
    pub fn secret(&self) -> Zeroizing<String> {
        encode_secret_seed(&self.signing_key.to_bytes())
    }

    /// Last four bytes of the public key, used as the signature hint
    pub fn signature_hint(&self) -> [u8; 4] {
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&self.public_key[28..]);
        hint
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Trim, lowercase and collapse whitespace the way wallets accept input
pub fn normalize_mnemonic(input: &str) -> Zeroizing<String> {
    Zeroizing::new(
        input
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// Upstream gate: English wordlist, valid checksum, exactly 24 words.
pub fn validate_mnemonic(phrase: &str) -> Result<Mnemonic, DerivationError> {
    let normalized = normalize_mnemonic(phrase);
    let words = normalized.split(' ').filter(|w| !w.is_empty()).count();
    // Word count is checked before the wordlist and checksum
    if words != MNEMONIC_WORDS {
        return Err(DerivationError::InvalidWordCount(words));
    }
    Mnemonic::parse_in_normalized(Language::English, &normalized)
        .map_err(|e| DerivationError::InvalidMnemonic(e.to_string()))
}

/// Derive the Pi Network keypair at `m/44'/314159'/0'`
pub fn derive(mnemonic: &Mnemonic) -> Result<KeyPair, DerivationError> {
    let words = mnemonic.word_count();
    if words != MNEMONIC_WORDS {
        return Err(DerivationError::InvalidWordCount(words));
    }
    let path: DerivationPath = PI_DERIVATION_PATH.parse()?;
    derive_at(mnemonic, &path)
}

/// Derive along any hardened path. No word-count restriction.
pub fn derive_at(mnemonic: &Mnemonic, path: &DerivationPath) -> Result<KeyPair, DerivationError> {
    let seed = Zeroizing::new(mnemonic.to_seed(""));
    let node = ExtendedKey::master(seed.as_slice())?.derive_path(path)?;
    Ok(KeyPair::from_seed(node.private_key()))
}

/// Validate then derive
pub fn derive_from_phrase(phrase: &str) -> Result<KeyPair, DerivationError> {
    let mnemonic = validate_mnemonic(phrase)?;
    derive(&mnemonic)
}
