// HTTP handlers for the rewards API
// Each handler translates JSON into one or more LedgerHandle calls.

use axum::{extract::State, Json};
use rewards_ledger::{Balances, Deductions, LedgerHandle};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::ApiError;
use crate::metrics::METRICS;
use crate::models::{parse_use_points, AddPointsEntry, ApiResponse, HealthResponse};

#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerHandle,
}

// POST /add-points
// Entries are applied one by one; the first failure stops the batch and
// earlier entries stay applied.
pub async fn add_points(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let started = Instant::now();
    let result = apply_batch(&state.ledger, &body).await;
    METRICS.track_request("/add-points", started);

    result.map(|_| Json(ApiResponse::empty()))
}

async fn apply_batch(ledger: &LedgerHandle, body: &str) -> Result<usize, ApiError> {
    let entries: Vec<Value> = serde_json::from_str(body).map_err(|e| {
        warn!("Failed to decode reward batch: {}", e);
        ApiError::from(e)
    })?;

    for (index, value) in entries.iter().enumerate() {
        let applied = match AddPointsEntry::from_value(value) {
            Ok(entry) => {
                ledger
                    .add_reward(entry.timestamp, entry.payer, entry.points)
                    .await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = applied {
            METRICS.rewards_rejected_total.inc();
            warn!(index, batch_size = entries.len(), "Reward batch stopped: {}", e);
            return Err(e.into());
        }

        METRICS.rewards_added_total.inc();
    }

    info!(count = entries.len(), "Applied reward batch");
    Ok(entries.len())
}

// POST /use-points
pub async fn use_points(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ApiResponse<Deductions>>, ApiError> {
    let started = Instant::now();
    let result = redeem(&state.ledger, &body).await;
    METRICS.track_request("/use-points", started);

    result.map(|deducted| Json(ApiResponse::ok(deducted)))
}

async fn redeem(ledger: &LedgerHandle, body: &str) -> Result<Deductions, ApiError> {
    let value: Value = serde_json::from_str(body)?;
    let points = parse_use_points(&value)?;

    match ledger.use_points(points).await {
        Ok(deducted) => {
            METRICS.track_redemption(points, deducted.len());
            info!(points, payers = deducted.len(), "Points redeemed");
            Ok(deducted)
        }
        Err(e) => {
            METRICS.redemption_failures_total.inc();
            warn!(points, "Redemption rejected: {}", e);
            Err(e.into())
        }
    }
}

// GET /check-balance
pub async fn check_balance(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Balances>>, ApiError> {
    let started = Instant::now();
    let result = state.ledger.check_balance().await;
    METRICS.track_request("/check-balance", started);

    let balances = result?;
    debug!(payers = balances.len(), "Balance snapshot served");
    Ok(Json(ApiResponse::ok(balances)))
}

// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ledger_alive = state.ledger.check_balance().await.is_ok();

    Json(HealthResponse {
        status: (if ledger_alive { "healthy" } else { "degraded" }).to_string(),
        service: "rewards-gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// Prometheus metrics endpoint
pub async fn metrics_handler() -> Result<String, ApiError> {
    METRICS
        .export()
        .map_err(|e| ApiError::Internal(format!("Failed to export metrics: {}", e)))
}
