//! Pisweep: derive a Pi Network account from its 24-word mnemonic and push a
//! native payment out of it, retrying until the ledger accepts it.
//!
//! # Architecture
//!
//! ```text
//! SendService (entry point)
//!   │
//!   ├── identity   mnemonic → SLIP-10 m/44'/314159'/0' → Ed25519 KeyPair
//!   │
//!   ├── amount     stroop arithmetic, send amount above the reserve
//!   │
//!   ├── submit     bounded retry loop (build → sign → submit → interpret)
//!   │     └── tx   single-payment TransactionEnvelope XDR + signature
//!   │
//!   └── ledger     LedgerClient / BalanceSource traits
//!         └── HorizonClient (REST)
//! ```
//!
//! # Operations
//!
//! | Operation | Function | Result |
//! |-----------|----------|--------|
//! | derive | `identity::derive(&mnemonic)` | `KeyPair` |
//! | submit | `submit::submit_payment(ledger, keypair, &request, &config, on_progress)` | `AttemptOutcome` |
//! | send | `SendService::send(&order, on_progress)` | `SendReport` |
//!
//! # Features
//!
//! - `native` (default) - Horizon client, HTTP server, CLI, logging
//!
//! # Usage
//!
//! ```ignore
//! use pisweep::{HorizonClient, SendOrder, SendService, SendConfig};
//! use std::sync::Arc;
//!
//! let service = SendService::new(Arc::new(HorizonClient::new(DEFAULT_HORIZON_URL)), SendConfig::default());
//! let report = service
//!     .send(&SendOrder::new(mnemonic, "GDRX...").with_sweep(true), |p| println!("{}/{}", p.attempt, p.max_attempts))
//!     .await;
//! ```

// =============================================================================
// Core modules (no I/O)
// =============================================================================
pub mod amount;
pub mod config;
pub mod identity;
pub mod ledger;
pub mod service;
pub mod submit;
pub mod tx;

// =============================================================================
// Native-only modules (server, CLI, tokio runtime)
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;
#[cfg(feature = "native")]
pub mod runtime;
#[cfg(feature = "native")]
pub mod server;

// =============================================================================
// Re-exports
// =============================================================================
pub use amount::{send_amount, Amount, AmountError};
pub use config::{ClientConfig, SendConfig, DEFAULT_HORIZON_URL, PI_NETWORK_PASSPHRASE, RESERVE_AMOUNT};
pub use identity::{derive, derive_from_phrase, validate_mnemonic, DerivationError, KeyPair};
pub use ledger::{AccountSnapshot, BalanceSource, LedgerClient, LedgerError, SubmitResponse};
pub use service::{SendOrder, SendReport, SendService, ServiceError};
pub use submit::{submit_payment, AttemptOutcome, FailureKind, Progress, SendRequest};
pub use tx::{PaymentTransaction, SignedTransaction, TxError};

#[cfg(feature = "native")]
pub use ledger::HorizonClient;
#[cfg(feature = "native")]
pub use runtime::{install_signal_handlers, Shutdown};
#[cfg(feature = "native")]
pub use server::create_router;
