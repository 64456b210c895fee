use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// Reject a `null` body; neither the status nor the action endpoints
/// ever answer with one on purpose.
pub fn require_body(body: Value) -> Result<Value, ClientError> {
    match body {
        Value::Null => Err(ClientError::NullBody),
        body => Ok(body),
    }
}

/// Where a receipt job stands according to `/job-status/{id}`.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Finished(Value),
    Failed,
    /// Any other status string (`queued`, `started`, ...). Empty when the
    /// body carried no usable `status`.
    Pending(String),
}

impl JobState {
    pub fn from_response(body: &Value) -> Self {
        match body.get("status").and_then(Value::as_str) {
            Some("finished") => {
                JobState::Finished(body.get("result").cloned().unwrap_or(Value::Null))
            }
            Some("failed") => JobState::Failed,
            Some(other) => JobState::Pending(other.to_string()),
            None => JobState::Pending(String::new()),
        }
    }
}

/// Result of a JSON action call: exactly one of the two branches.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Success(Value),
    Error(String),
}

impl MutationOutcome {
    pub fn from_response(body: Value) -> Self {
        match body.get("error").and_then(error_message) {
            Some(message) => MutationOutcome::Error(message),
            None => MutationOutcome::Success(body),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MutationOutcome::Success(_))
    }
}

/// Text of an `error` field, or `None` when the field is empty or falsy.
fn error_message(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

/// Body for `/create-product`.
///
/// With `product_id` set the server attaches `barcode` to that existing
/// product instead of creating a new one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewProduct {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qu_id_purchase: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qu_id_stock: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qu_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

/// Body for `/add-purchase`. Every key is sent; the server indexes them
/// directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Purchase {
    pub product_id: u64,
    pub amount: f64,
    pub price: f64,
    pub days_out: i64,
    pub shopping_location_id: Option<u64>,
}
