//! Configuration - send parameters and client settings passed from front ends

use std::env;
use std::time::Duration;

use crate::amount::Amount;

/// Pi mainnet Horizon endpoint
pub const DEFAULT_HORIZON_URL: &str = "https://api.mainnet.minepi.com";
pub const PI_NETWORK_PASSPHRASE: &str = "Pi Network";
/// 0.01 Pi left behind on every send
pub const RESERVE_AMOUNT: Amount = match Amount::from_stroops(100_000) {
    Some(reserve) => reserve,
    None => Amount::ZERO,
};
pub const DEFAULT_MAX_ATTEMPTS: u32 = 50;
pub const RATE_LIMIT_PAUSE: Duration = Duration::from_millis(100);
/// Ledger-side expiry of each built transaction
pub const TX_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PORT: u16 = 8080;

/// Parameters of one submission loop. Defaults are the production constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendConfig {
    pub reserve: Amount,
    pub max_attempts: u32,
    pub rate_limit_pause: Duration,
    pub tx_timeout: Duration,
    pub network_passphrase: String,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            reserve: RESERVE_AMOUNT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            rate_limit_pause: RATE_LIMIT_PAUSE,
            tx_timeout: TX_TIMEOUT,
            network_passphrase: PI_NETWORK_PASSPHRASE.into(),
        }
    }
}

impl SendConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_reserve(mut self, reserve: Amount) -> Self { self.reserve = reserve; self }
    pub fn with_max_attempts(mut self, n: u32) -> Self { self.max_attempts = n; self }
    pub fn with_rate_limit_pause(mut self, pause: Duration) -> Self { self.rate_limit_pause = pause; self }
    pub fn with_tx_timeout(mut self, timeout: Duration) -> Self { self.tx_timeout = timeout; self }
    pub fn with_network_passphrase(mut self, p: impl Into<String>) -> Self { self.network_passphrase = p.into(); self }
}

/// Where to talk to the ledger and where to listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub horizon_url: String,
    pub network_passphrase: String,
    pub port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            horizon_url: DEFAULT_HORIZON_URL.into(),
            network_passphrase: PI_NETWORK_PASSPHRASE.into(),
            port: DEFAULT_PORT,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `PISWEEP_HORIZON_URL`, `PISWEEP_NETWORK_PASSPHRASE`, `PISWEEP_PORT`.
    /// The platform `PORT` is honoured when `PISWEEP_PORT` is unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |key: &str| env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            horizon_url: var("PISWEEP_HORIZON_URL").unwrap_or(defaults.horizon_url),
            network_passphrase: var("PISWEEP_NETWORK_PASSPHRASE").unwrap_or(defaults.network_passphrase),
            port: var("PISWEEP_PORT")
                .or_else(|| var("PORT"))
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    pub fn with_horizon_url(mut self, url: impl Into<String>) -> Self { self.horizon_url = url.into(); self }
    pub fn with_network_passphrase(mut self, p: impl Into<String>) -> Self { self.network_passphrase = p.into(); self }
    pub fn with_port(mut self, port: u16) -> Self { self.port = port; self }

    /// Send parameters bound to this client's network
    pub fn send_config(&self) -> SendConfig {
        SendConfig::default().with_network_passphrase(&self.network_passphrase)
    }
}

/// Load `KEY=value` lines from `.env` into variables that are not already set
pub fn load_dotenv() {
    let Ok(contents) = std::fs::read_to_string(".env") else { return };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() && env::var(key.trim()).is_err() {
                env::set_var(key.trim(), value);
            }
        }
    }
}
