//! Rewards Ledger Core
//!
//! In-memory points ledger fed by third-party payers, with FIFO redemption.
//!
//! # Architecture
//!
//! - **Ordered Records**: Grants keyed by `(timestamp, insertion seq)`
//! - **Balance Table**: Running net points per payer, never negative
//! - **Lazy Claw-backs**: Negative adjustments settle against the payer's oldest grants
//! - **Single Writer**: One actor task owns the ledger and serializes every operation
//!
//! # Invariants
//!
//! - Non-negativity: `balance[payer] >= 0` for every payer, always
//! - Conservation: Σ(balances) == Σ(applied adds) - Σ(redeemed)
//! - FIFO: Redemption always draws from the oldest remaining grant first
//! - Atomicity: A failed operation leaves the ledger untouched

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod ledger;
pub mod error;
pub mod actor;
pub mod config;

// Re-exports
pub use error::{Error, Result};
pub use types::{PayerId, RecordKey, RewardRecord, Deductions, Balances};
pub use ledger::RewardLedger;
pub use actor::{spawn_ledger_actor, LedgerHandle};
pub use config::Config;
