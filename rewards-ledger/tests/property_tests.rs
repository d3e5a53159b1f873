//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Non-negativity: No payer balance ever drops below zero
//! - Conservation: Σ(balances) == Σ(applied adds) - Σ(redeemed)
//! - FIFO: Redemption results do not depend on the order grants were added
//! - Atomicity: Failed operations leave the ledger untouched

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rewards_ledger::{spawn_ledger_actor, Error, PayerId, RewardLedger};
use std::collections::BTreeMap;

const PAYERS: [&str; 4] = ["DANNON", "UNILEVER", "MILLER COORS", "KRAFT"];

#[derive(Debug, Clone)]
enum Op {
    Add { hour: i64, payer: usize, points: i64 },
    Use { points: i64 },
}

fn timestamp(hour: i64) -> String {
    let base = Utc.with_ymd_and_hms(2020, 10, 1, 0, 0, 0).unwrap();
    (base + Duration::hours(hour)).to_rfc3339()
}

/// Strategy for generating ledger operations
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0i64..720, 0usize..PAYERS.len(), -500i64..2000)
            .prop_map(|(hour, payer, points)| Op::Add { hour, payer, points }),
        1 => (0i64..3000).prop_map(|points| Op::Use { points }),
    ]
}

/// Σ remaining - pending must equal the balance for every payer
fn assert_internal_consistency(ledger: &RewardLedger) -> Result<(), TestCaseError> {
    let mut remaining: BTreeMap<PayerId, i64> = BTreeMap::new();
    for record in ledger.records() {
        prop_assert!(record.remaining > 0);
        prop_assert!(record.remaining <= record.points);
        *remaining.entry(record.payer.clone()).or_insert(0) += record.remaining;
    }

    let pending = ledger.pending_deductions();
    for (payer, balance) in ledger.check_balance() {
        prop_assert!(balance >= 0, "negative balance for {}", payer);
        let held = remaining.get(&payer).copied().unwrap_or(0);
        let owed = pending.get(&payer).copied().unwrap_or(0);
        prop_assert_eq!(held - owed, balance);
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: Balances stay non-negative and points are conserved
    #[test]
    fn prop_conservation_and_non_negativity(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut ledger = RewardLedger::new();
        let mut applied: i64 = 0;
        let mut redeemed: i64 = 0;

        for op in ops {
            let records_before = ledger.records();
            let balances_before = ledger.check_balance();

            match op {
                Op::Add { hour, payer, points } => {
                    match ledger.add_reward(&timestamp(hour), PayerId::new(PAYERS[payer]), points) {
                        Ok(()) => applied += points,
                        Err(Error::InsufficientPoints { .. }) => {
                            prop_assert!(points < 0);
                            prop_assert_eq!(ledger.records(), records_before);
                            prop_assert_eq!(ledger.check_balance(), balances_before);
                        }
                        Err(e) => prop_assert!(false, "unexpected error: {}", e),
                    }
                }
                Op::Use { points } => {
                    match ledger.use_points(points) {
                        Ok(deducted) => {
                            prop_assert!(deducted.values().all(|amount| *amount < 0));
                            prop_assert_eq!(deducted.values().sum::<i64>(), -points);
                            redeemed += points;
                        }
                        Err(Error::InsufficientTotalPoints { .. }) => {
                            prop_assert!(points > balances_before.values().sum::<i64>());
                            prop_assert_eq!(ledger.records(), records_before);
                            prop_assert_eq!(ledger.check_balance(), balances_before);
                        }
                        Err(e) => prop_assert!(false, "unexpected error: {}", e),
                    }
                }
            }

            assert_internal_consistency(&ledger)?;
            prop_assert_eq!(ledger.check_balance().values().sum::<i64>(), applied - redeemed);
        }
    }

    /// Property: Redemption only fails when it asks for more than exists
    #[test]
    fn prop_redeem_everything_succeeds(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut ledger = RewardLedger::new();
        for op in ops {
            if let Op::Add { hour, payer, points } = op {
                let _ = ledger.add_reward(&timestamp(hour), PayerId::new(PAYERS[payer]), points);
            }
        }

        let total = ledger.total_available();
        let deducted = ledger.use_points(total).unwrap();
        prop_assert_eq!(deducted.values().sum::<i64>(), -total);
        prop_assert!(ledger.check_balance().values().all(|balance| *balance == 0));
        prop_assert!(ledger.records().is_empty());
        prop_assert!(ledger.pending_deductions().is_empty());
    }

    /// Property: Grant order does not change which points are redeemed
    #[test]
    fn prop_fifo_independent_of_add_order(
        grants in prop::collection::vec((0usize..PAYERS.len(), 1i64..1000), 1..30),
        fraction in 0.0f64..=1.0,
    ) {
        // Distinct timestamps so insertion order never acts as a tie-break
        let mut forward = RewardLedger::new();
        for (hour, (payer, points)) in grants.iter().enumerate() {
            forward.add_reward(&timestamp(hour as i64), PayerId::new(PAYERS[*payer]), *points).unwrap();
        }

        let mut reversed = RewardLedger::new();
        for (hour, (payer, points)) in grants.iter().enumerate().rev() {
            reversed.add_reward(&timestamp(hour as i64), PayerId::new(PAYERS[*payer]), *points).unwrap();
        }

        let requested = (forward.total_available() as f64 * fraction) as i64;
        prop_assert_eq!(forward.use_points(requested).unwrap(), reversed.use_points(requested).unwrap());
        prop_assert_eq!(forward.records(), reversed.records());
    }

    /// Property: Redemption through the actor matches the engine
    #[test]
    fn prop_actor_matches_engine(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let handle = spawn_ledger_actor(RewardLedger::new(), 32);
            let mut ledger = RewardLedger::new();

            for op in ops {
                match op {
                    Op::Add { hour, payer, points } => {
                        let ts = timestamp(hour);
                        let direct = ledger.add_reward(&ts, PayerId::new(PAYERS[payer]), points);
                        let via_actor = handle.add_reward(ts, PayerId::new(PAYERS[payer]), points).await;
                        prop_assert_eq!(direct, via_actor);
                    }
                    Op::Use { points } => {
                        let direct = ledger.use_points(points);
                        let via_actor = handle.use_points(points).await;
                        prop_assert_eq!(direct, via_actor);
                    }
                }
            }

            prop_assert_eq!(ledger.check_balance(), handle.check_balance().await.unwrap());
            handle.shutdown().await.unwrap();
            Ok(())
        })?;
    }
}
