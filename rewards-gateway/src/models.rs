// Wire models for the rewards API
// Request bodies are read as loose JSON so missing fields map to the
// "Missing required parameters" envelope instead of a transport rejection.

use rewards_ledger::{Error as LedgerError, PayerId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope shared by all ledger routes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// One entry of an /add-points batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPointsEntry {
    pub timestamp: String,
    pub payer: PayerId,
    pub points: i64,
}

impl AddPointsEntry {
    pub fn from_value(value: &Value) -> Result<Self, LedgerError> {
        let fields = value
            .as_object()
            .ok_or_else(|| LedgerError::InvalidRequest("reward must be a JSON object".to_string()))?;

        let timestamp = required(fields, "timestamp")?;
        let payer = required(fields, "payer")?;
        let points = required(fields, "points")?;

        let timestamp = timestamp
            .as_str()
            .ok_or_else(|| LedgerError::InvalidRequest("timestamp must be a string".to_string()))?;
        let payer = payer
            .as_str()
            .ok_or_else(|| LedgerError::InvalidRequest("payer must be a string".to_string()))?;

        Ok(Self {
            timestamp: timestamp.to_string(),
            payer: PayerId::new(payer),
            points: integer_points(points)?,
        })
    }
}

/// Body of /use-points
pub fn parse_use_points(value: &Value) -> Result<i64, LedgerError> {
    let fields = value
        .as_object()
        .ok_or_else(|| LedgerError::InvalidRequest("body must be a JSON object".to_string()))?;

    integer_points(required(fields, "points")?)
}

fn required<'a>(
    fields: &'a serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<&'a Value, LedgerError> {
    match fields.get(name) {
        Some(Value::Null) | None => Err(LedgerError::MissingField(name)),
        Some(value) => Ok(value),
    }
}

/// Whole-number points; `10.0` is accepted, `10.5` is not
fn integer_points(value: &Value) -> Result<i64, LedgerError> {
    if let Some(points) = value.as_i64() {
        return Ok(points);
    }

    match value.as_f64() {
        Some(points)
            if points.fract() == 0.0 && points >= i64::MIN as f64 && points < i64::MAX as f64 =>
        {
            Ok(points as i64)
        }
        _ => Err(LedgerError::InvalidRequest(
            "points must be an integer".to_string(),
        )),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}
