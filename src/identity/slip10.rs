//! SLIP-0010 - Hierarchical deterministic keys on the Ed25519 curve
//!
//! Ed25519 supports hardened derivation only: every path segment must carry
//! the `'` (or `h`) marker.
//!
//! Reference: https://github.com/satoshilabs/slips/blob/master/slip-0010.md

use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

use super::DerivationError;

type HmacSha512 = Hmac<Sha512>;

/// Offset added to an index to mark it hardened
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// HMAC key for the master node on Ed25519
const ED25519_CURVE_KEY: &[u8] = b"ed25519 seed";

/// BIP32 allows seeds between 128 and 512 bits
const MIN_SEED_LEN: usize = 16;
const MAX_SEED_LEN: usize = 64;

/// A fully hardened derivation path such as `m/44'/314159'/0'`.
///
/// Indices are stored without the hardened offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath(Vec<u32>);

impl DerivationPath {
    pub fn new(indices: Vec<u32>) -> Result<Self, DerivationError> {
        if let Some(bad) = indices.iter().find(|&&i| i >= HARDENED_OFFSET) {
            return Err(DerivationError::InvalidPath(format!("index {} out of range", bad)));
        }
        Ok(Self(indices))
    }

    pub fn indices(&self) -> &[u32] {
        &self.0
    }
}

impl FromStr for DerivationPath {
    type Err = DerivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');
        if parts.next() != Some("m") {
            return Err(DerivationError::InvalidPath(format!("{} must start with m", s)));
        }

        let mut indices = Vec::new();
        for part in parts {
            let number = part
                .strip_suffix('\'')
                .or_else(|| part.strip_suffix('h'))
                .ok_or_else(|| {
                    DerivationError::InvalidPath(format!(
                        "segment {} is not hardened (ed25519 requires hardened derivation)",
                        part
                    ))
                })?;
            let index = number
                .parse::<u32>()
                .map_err(|_| DerivationError::InvalidPath(format!("bad segment {}", part)))?;
            indices.push(index);
        }

        Self::new(indices)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for index in &self.0 {
            write!(f, "/{}'", index)?;
        }
        Ok(())
    }
}

/// Extended private key: 32-byte key plus 32-byte chain code. Zeroed on drop.
pub struct ExtendedKey {
    key: Zeroizing<[u8; 32]>,
    chain_code: Zeroizing<[u8; 32]>,
}

impl ExtendedKey {
    /// Master node from a BIP39 seed
    pub fn master(seed: &[u8]) -> Result<Self, DerivationError> {
        if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&seed.len()) {
            return Err(DerivationError::InvalidSeedLength(seed.len()));
        }
        Ok(Self::from_hmac(ED25519_CURVE_KEY, &[seed]))
    }

    /// Hardened child at `index` (offset is applied here)
    pub fn derive_hardened(&self, index: u32) -> Result<Self, DerivationError> {
        if index >= HARDENED_OFFSET {
            return Err(DerivationError::InvalidPath(format!("index {} out of range", index)));
        }
        let hardened = (index | HARDENED_OFFSET).to_be_bytes();
        Ok(Self::from_hmac(self.chain_code.as_slice(), &[&[0u8][..], self.key.as_slice(), &hardened[..]]))
    }

    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self, DerivationError> {
        let mut node = Self { key: self.key.clone(), chain_code: self.chain_code.clone() };
        for &index in path.indices() {
            node = node.derive_hardened(index)?;
        }
        Ok(node)
    }

    pub fn private_key(&self) -> &[u8; 32] {
        &self.key
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    fn from_hmac(hmac_key: &[u8], data: &[&[u8]]) -> Self {
        let mut mac = HmacSha512::new_from_slice(hmac_key).expect("HMAC accepts any key length");
        for chunk in data {
            mac.update(chunk);
        }
        let mut out = Zeroizing::new([0u8; 64]);
        out.copy_from_slice(&mac.finalize().into_bytes());

        let mut key = Zeroizing::new([0u8; 32]);
        let mut chain_code = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(&out[..32]);
        chain_code.copy_from_slice(&out[32..]);
        Self { key, chain_code }
    }
}
