//! Core types for the ledger
//!
//! Points are whole integers (`i64`). Maps returned to callers are ordered
//! so snapshots serialize the same way every time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Payer identifier (brand, partner, etc.)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayerId(String);

impl PayerId {
    /// Create new payer ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier is blank
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Ordering key for reward records.
///
/// `seq` is the insertion counter; it breaks ties between equal timestamps
/// so redemption over an unchanged ledger is reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    /// Grant time (primary ordering)
    pub timestamp: DateTime<Utc>,
    /// Insertion sequence (tie-break)
    pub seq: u64,
}

/// One positive grant of points from a payer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRecord {
    /// Grant time
    pub timestamp: DateTime<Utc>,

    /// Payer that granted the points
    pub payer: PayerId,

    /// Points originally granted
    pub points: i64,

    /// Points still available for redemption
    pub remaining: i64,
}

impl RewardRecord {
    /// Create a fresh record with everything still available
    pub fn new(timestamp: DateTime<Utc>, payer: PayerId, points: i64) -> Self {
        Self {
            timestamp,
            payer,
            points,
            remaining: points,
        }
    }

    /// Points already consumed by redemption or claw-back settlement
    pub fn used(&self) -> i64 {
        self.points - self.remaining
    }
}

/// Balance snapshot: payer -> net points
pub type Balances = BTreeMap<PayerId, i64>;

/// Redemption result: payer -> negative amount deducted
pub type Deductions = BTreeMap<PayerId, i64>;
