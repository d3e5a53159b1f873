//! Actor-based concurrency for the ledger
//!
//! One tokio task owns the [`RewardLedger`] and handles one message at a
//! time, so every operation sees a single serialization point:
//! - No locks around the engine
//! - Redemption plans always run against a consistent snapshot
//! - Bounded mailbox gives backpressure under load
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 HTTP handlers (axum)                  │
//! │            Many concurrent request tasks              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │     add_reward / check_balance / use_points           │
//! │          applied to the owned RewardLedger            │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::types::{Balances, Deductions, PayerId, RewardRecord};
use crate::{Error, Result, RewardLedger};
use tokio::sync::{mpsc, oneshot};

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Record a grant or claw-back
    AddReward {
        /// RFC 3339 timestamp, parsed by the engine
        timestamp: String,
        /// Payer
        payer: PayerId,
        /// Signed points
        points: i64,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Snapshot balances
    CheckBalance {
        /// Reply channel
        response: oneshot::Sender<Balances>,
    },

    /// Redeem points FIFO
    UsePoints {
        /// Points to redeem
        points: i64,
        /// Reply channel
        response: oneshot::Sender<Result<Deductions>>,
    },

    /// Snapshot live records
    GetRecords {
        /// Reply channel
        response: oneshot::Sender<Vec<RewardRecord>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns the ledger
#[derive(Debug)]
pub struct LedgerActor {
    /// The engine
    ledger: RewardLedger,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(ledger: RewardLedger, mailbox: mpsc::Receiver<LedgerMessage>) -> Self {
        Self { ledger, mailbox }
    }

    /// Run the actor event loop until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                LedgerMessage::Shutdown => {
                    tracing::info!("Ledger actor shutting down");
                    break;
                }
                msg => self.handle_message(msg),
            }
        }

        tracing::debug!(
            records = self.ledger.records().len(),
            available = self.ledger.total_available(),
            "Ledger actor stopped"
        );
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        // A dropped receiver means the caller went away; the operation still stands
        match msg {
            LedgerMessage::AddReward {
                timestamp,
                payer,
                points,
                response,
            } => {
                let result = self.ledger.add_reward(&timestamp, payer, points);
                let _ = response.send(result);
            }

            LedgerMessage::CheckBalance { response } => {
                let _ = response.send(self.ledger.check_balance());
            }

            LedgerMessage::UsePoints { points, response } => {
                let result = self.ledger.use_points(points);
                let _ = response.send(result);
            }

            LedgerMessage::GetRecords { response } => {
                let _ = response.send(self.ledger.records());
            }

            LedgerMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> LedgerMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Record a grant (`points >= 0`) or claw-back (`points < 0`)
    pub async fn add_reward(
        &self,
        timestamp: impl Into<String>,
        payer: PayerId,
        points: i64,
    ) -> Result<()> {
        let timestamp = timestamp.into();
        self.request(|response| LedgerMessage::AddReward {
            timestamp,
            payer,
            points,
            response,
        })
        .await?
    }

    /// Snapshot balances
    pub async fn check_balance(&self) -> Result<Balances> {
        self.request(|response| LedgerMessage::CheckBalance { response })
            .await
    }

    /// Redeem points FIFO across all payers
    pub async fn use_points(&self, points: i64) -> Result<Deductions> {
        self.request(|response| LedgerMessage::UsePoints { points, response })
            .await?
    }

    /// Snapshot live records, oldest first
    pub async fn records(&self) -> Result<Vec<RewardRecord>> {
        self.request(|response| LedgerMessage::GetRecords { response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(ledger: RewardLedger, mailbox_capacity: usize) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1)); // Bounded channel for backpressure
    let actor = LedgerActor::new(ledger, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_actor_spawn_and_shutdown() {
        let handle = spawn_ledger_actor(RewardLedger::new(), 16);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_actor_add_and_use() {
        let handle = spawn_ledger_actor(RewardLedger::new(), 16);

        handle
            .add_reward("2020-01-01T00:00:00Z", PayerId::new("A"), 100)
            .await
            .unwrap();
        handle
            .add_reward("2020-01-02T00:00:00Z", PayerId::new("B"), 200)
            .await
            .unwrap();

        let deducted = handle.use_points(150).await.unwrap();
        assert_eq!(deducted[&PayerId::new("A")], -100);
        assert_eq!(deducted[&PayerId::new("B")], -50);

        let balances = handle.check_balance().await.unwrap();
        assert_eq!(balances[&PayerId::new("A")], 0);
        assert_eq!(balances[&PayerId::new("B")], 150);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_actor_propagates_engine_errors() {
        let handle = spawn_ledger_actor(RewardLedger::new(), 16);

        let err = handle
            .add_reward("yesterday", PayerId::new("A"), 100)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp(_)));

        let err = handle.use_points(1).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientTotalPoints { .. }));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_mailbox_reports_concurrency_error() {
        let handle = spawn_ledger_actor(RewardLedger::new(), 16);
        handle.shutdown().await.unwrap();

        // Give the actor a chance to exit and drop its receiver
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let err = handle.check_balance().await.unwrap_err();
        assert!(matches!(err, Error::Concurrency(_)));
    }

    #[tokio::test]
    async fn test_concurrent_redemptions_never_overdraw() {
        let handle = spawn_ledger_actor(RewardLedger::new(), 64);
        handle
            .add_reward("2020-01-01T00:00:00Z", PayerId::new("A"), 1000)
            .await
            .unwrap();

        let mut tasks = Vec::new();
        for _ in 0..20 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move { handle.use_points(100).await }));
        }

        let mut succeeded = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 10);
        let balances = handle.check_balance().await.unwrap();
        assert_eq!(balances[&PayerId::new("A")], 0);
        assert!(handle.records().await.unwrap().is_empty());

        handle.shutdown().await.unwrap();
    }
}
