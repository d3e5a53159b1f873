//! Reward ledger engine
//!
//! Owns every reward record and the per-payer balance table, and implements
//! FIFO redemption across all payers.
//!
//! Negative adjustments (claw-backs) are applied lazily: the balance drops
//! immediately, and the amount is parked as a pending deduction that is
//! settled against the payer's oldest records during the next redemption
//! walk that reaches them.
//!
//! # Example
//!
//! ```
//! use rewards_ledger::{PayerId, RewardLedger};
//!
//! let mut ledger = RewardLedger::new();
//! ledger.add_reward("2020-11-02T14:00:00Z", PayerId::new("DANNON"), 1000).unwrap();
//!
//! let deducted = ledger.use_points(400).unwrap();
//! assert_eq!(deducted[&PayerId::new("DANNON")], -400);
//! assert_eq!(ledger.check_balance()[&PayerId::new("DANNON")], 600);
//! ```

use crate::{
    types::{Balances, Deductions, PayerId, RecordKey, RewardRecord},
    Error, Result,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// Parse an RFC 3339 timestamp into UTC
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::InvalidTimestamp(format!("{:?}: {}", raw, e)))
}

/// One planned change to a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlanStep {
    key: RecordKey,
    /// Pending claw-back attributed to this record
    settled: i64,
    /// Points redeemed from this record
    redeemed: i64,
}

/// In-memory points ledger
#[derive(Debug, Default)]
pub struct RewardLedger {
    /// Live records in FIFO order
    records: BTreeMap<RecordKey, RewardRecord>,

    /// Net points per payer
    balances: Balances,

    /// Claw-backs not yet attributed to records
    pending: BTreeMap<PayerId, i64>,

    /// Next insertion sequence
    next_seq: u64,
}

impl RewardLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a grant (`points >= 0`) or claw-back (`points < 0`).
    ///
    /// The call is atomic: on error nothing changes.
    pub fn add_reward(&mut self, timestamp: &str, payer: PayerId, points: i64) -> Result<()> {
        let timestamp = parse_timestamp(timestamp).map_err(|e| {
            tracing::warn!(payer = %payer, points, "Rejected reward: {}", e);
            e
        })?;
        self.add_reward_at(timestamp, payer, points)
    }

    /// Same as [`add_reward`](Self::add_reward) with an already-parsed timestamp
    pub fn add_reward_at(
        &mut self,
        timestamp: DateTime<Utc>,
        payer: PayerId,
        points: i64,
    ) -> Result<()> {
        if payer.is_empty() {
            return Err(Error::InvalidRequest("payer must not be empty".to_string()));
        }

        let balance = self.balance_of(&payer);
        let new_balance = balance.checked_add(points).ok_or_else(|| {
            Error::InvalidRequest(format!("points overflow for payer {}", payer))
        })?;

        if points < 0 {
            if new_balance < 0 {
                tracing::warn!(
                    payer = %payer,
                    balance,
                    points,
                    "Rejected claw-back: balance would go negative"
                );
                return Err(Error::InsufficientPoints {
                    payer: payer.to_string(),
                    balance,
                    requested: points,
                });
            }

            // new_balance >= 0 rules out i64::MIN here
            let owed = self
                .pending
                .get(&payer)
                .copied()
                .unwrap_or(0)
                .checked_add(-points)
                .ok_or_else(|| {
                    Error::InvalidRequest(format!("pending overflow for payer {}", payer))
                })?;
            self.pending.insert(payer.clone(), owed);
        } else if points > 0 {
            let key = RecordKey {
                timestamp,
                seq: self.next_seq,
            };
            self.next_seq += 1;
            self.records
                .insert(key, RewardRecord::new(timestamp, payer.clone(), points));
        }

        tracing::debug!(
            payer = %payer,
            points,
            balance = new_balance,
            %timestamp,
            "Reward applied"
        );
        self.balances.insert(payer, new_balance);

        Ok(())
    }

    /// Snapshot of every payer's balance, zero balances included
    pub fn check_balance(&self) -> Balances {
        self.balances.clone()
    }

    /// Balance for one payer (0 if never seen)
    pub fn balance_of(&self, payer: &PayerId) -> i64 {
        self.balances.get(payer).copied().unwrap_or(0)
    }

    /// Sum of all balances
    pub fn total_available(&self) -> i64 {
        self.balances
            .values()
            .fold(0i64, |acc, balance| acc.saturating_add(*balance))
    }

    /// Live records, oldest first
    pub fn records(&self) -> Vec<RewardRecord> {
        self.records.values().cloned().collect()
    }

    /// Claw-backs not yet attributed to specific records
    pub fn pending_deductions(&self) -> BTreeMap<PayerId, i64> {
        self.pending.clone()
    }

    /// Redeem `requested` points, oldest grants first across all payers.
    ///
    /// Returns the negative amount taken from each payer. Fails without
    /// touching the ledger when fewer than `requested` points exist.
    pub fn use_points(&mut self, requested: i64) -> Result<Deductions> {
        if requested < 0 {
            return Err(Error::InvalidRequest(format!(
                "points to use must not be negative, got {}",
                requested
            )));
        }

        if requested == 0 {
            return Ok(Deductions::new());
        }

        let plan = self.plan_redemption(requested)?;
        let deductions = self.commit_redemption(&plan);

        tracing::debug!(
            requested,
            records_touched = plan.len(),
            payers = deductions.len(),
            "Points redeemed"
        );

        Ok(deductions)
    }

    /// Walk records in FIFO order without mutating anything
    fn plan_redemption(&self, requested: i64) -> Result<Vec<PlanStep>> {
        let available = self.total_available();
        if available < requested {
            tracing::warn!(requested, available, "Rejected redemption: not enough points");
            return Err(Error::InsufficientTotalPoints {
                requested,
                available,
            });
        }

        let mut owed: HashMap<&PayerId, i64> =
            self.pending.iter().map(|(payer, amount)| (payer, *amount)).collect();
        let mut still_needed = requested;
        let mut plan = Vec::new();

        for (key, record) in &self.records {
            if still_needed == 0 {
                break;
            }

            let mut left = record.remaining;
            let mut settled = 0;
            if let Some(debt) = owed.get_mut(&record.payer) {
                settled = left.min(*debt);
                *debt -= settled;
                left -= settled;
            }

            let redeemed = left.min(still_needed);
            still_needed -= redeemed;

            if settled > 0 || redeemed > 0 {
                plan.push(PlanStep {
                    key: *key,
                    settled,
                    redeemed,
                });
            }
        }

        if still_needed > 0 {
            tracing::warn!(requested, still_needed, "Rejected redemption: records exhausted");
            return Err(Error::InsufficientTotalPoints {
                requested,
                available: requested - still_needed,
            });
        }

        Ok(plan)
    }

    /// Apply a plan produced by `plan_redemption` against the same state
    fn commit_redemption(&mut self, plan: &[PlanStep]) -> Deductions {
        let mut deductions = Deductions::new();

        for step in plan {
            let (payer, exhausted) = match self.records.get_mut(&step.key) {
                Some(record) => {
                    record.remaining -= step.settled + step.redeemed;
                    (record.payer.clone(), record.remaining == 0)
                }
                None => continue,
            };

            if exhausted {
                self.records.remove(&step.key);
            }

            if step.settled > 0 {
                if let Some(debt) = self.pending.get_mut(&payer) {
                    *debt -= step.settled;
                    if *debt == 0 {
                        self.pending.remove(&payer);
                    }
                }
            }

            if step.redeemed > 0 {
                if let Some(balance) = self.balances.get_mut(&payer) {
                    *balance -= step.redeemed;
                }
                *deductions.entry(payer).or_insert(0) -= step.redeemed;
            }
        }

        deductions
    }
}
