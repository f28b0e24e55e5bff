//! StrKey - Stellar-protocol key encoding used by Pi Network addresses
//!
//! `base32(version || payload || crc16_xmodem(version || payload))`, checksum
//! little endian, RFC 4648 alphabet without padding.

use thiserror::Error;
use zeroize::Zeroizing;

/// `G...` account ids
const VERSION_ACCOUNT_ID: u8 = 6 << 3;
/// `S...` secret seeds
const VERSION_SECRET_SEED: u8 = 18 << 3;

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Encoded length of a 32-byte key: (1 + 32 + 2) bytes * 8 / 5
pub const ENCODED_KEY_LEN: usize = 56;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrKeyError {
    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid base32 character: {0:?}")]
    InvalidCharacter(char),

    #[error("Invalid version byte: expected {expected}, got {got}")]
    InvalidVersion { expected: u8, got: u8 },

    #[error("Checksum mismatch")]
    InvalidChecksum,
}

/// Encode an Ed25519 public key as a `G...` address
pub fn encode_account_id(public_key: &[u8; 32]) -> String {
    encode_check(VERSION_ACCOUNT_ID, public_key)
}

/// Decode a `G...` address back to the raw public key
pub fn decode_account_id(address: &str) -> Result<[u8; 32], StrKeyError> {
    let payload = decode_check(VERSION_ACCOUNT_ID, address)?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&payload);
    Ok(key)
}

/// Encode an Ed25519 seed as an `S...` secret. Zeroed on drop.
pub fn encode_secret_seed(seed: &[u8; 32]) -> Zeroizing<String> {
    Zeroizing::new(encode_check(VERSION_SECRET_SEED, seed))
}

pub fn decode_secret_seed(secret: &str) -> Result<Zeroizing<[u8; 32]>, StrKeyError> {
    let payload = Zeroizing::new(decode_check(VERSION_SECRET_SEED, secret)?);
    let mut seed = Zeroizing::new([0u8; 32]);
    seed.copy_from_slice(&payload);
    Ok(seed)
}

fn encode_check(version: u8, payload: &[u8; 32]) -> String {
    let mut raw = Zeroizing::new(Vec::with_capacity(35));
    raw.push(version);
    raw.extend_from_slice(payload);
    let crc = crc16_xmodem(&raw);
    raw.extend_from_slice(&crc.to_le_bytes());
    base32_encode(&raw)
}

fn decode_check(version: u8, encoded: &str) -> Result<Vec<u8>, StrKeyError> {
    if encoded.len() != ENCODED_KEY_LEN {
        return Err(StrKeyError::InvalidLength { expected: ENCODED_KEY_LEN, got: encoded.len() });
    }
    let raw = Zeroizing::new(base32_decode(encoded)?);
    let (body, checksum) = raw.split_at(raw.len() - 2);

    if body[0] != version {
        return Err(StrKeyError::InvalidVersion { expected: version, got: body[0] });
    }
    if crc16_xmodem(body).to_le_bytes() != checksum {
        return Err(StrKeyError::InvalidChecksum);
    }
    Ok(body[1..].to_vec())
}

/// CRC-16/XMODEM: poly 0x1021, init 0, no reflection
fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x1021 } else { crc << 1 };
        }
    }
    crc
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer: u16 = 0;
    let mut bits = 0;
    for &byte in data {
        buffer = (buffer << 8) | u16::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[usize::from((buffer >> bits) & 0x1f)] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[usize::from((buffer << (5 - bits)) & 0x1f)] as char);
    }
    out
}

fn base32_decode(encoded: &str) -> Result<Vec<u8>, StrKeyError> {
    let mut out = Vec::with_capacity(encoded.len() * 5 / 8);
    let mut buffer: u16 = 0;
    let mut bits = 0;
    for c in encoded.chars() {
        let value = ALPHABET
            .iter()
            .position(|&a| a as char == c)
            .ok_or(StrKeyError::InvalidCharacter(c))? as u16;
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
    }
    // Leftover bits must be zero padding
    if bits > 0 && buffer & ((1 << bits) - 1) != 0 {
        return Err(StrKeyError::InvalidChecksum);
    }
    Ok(out)
}
