//! Read/write semantics for the single saved string.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;

use crate::errors::ServiceError;
use crate::store::StringStore;

/// Body field carrying the new value on write.
pub const SAVED_STRING_FIELD: &str = "saved-string";

#[derive(Clone)]
pub struct StringService {
    store: Arc<dyn StringStore>,
    record_key: String,
}

impl StringService {
    pub fn new(store: Arc<dyn StringStore>, record_key: impl Into<String>) -> Self {
        Self { store, record_key: record_key.into() }
    }

    pub fn record_key(&self) -> &str {
        &self.record_key
    }

    /// Current value. `NotFound` until the first write.
    pub async fn read(&self) -> Result<String, ServiceError> {
        self.store
            .get(&self.record_key)
            .await?
            .ok_or_else(|| ServiceError::not_found("saved string"))
    }

    /// Overwrite the value with `body["saved-string"]`.
    pub async fn write(&self, body: &Map<String, Value>) -> Result<(), ServiceError> {
        let value = saved_string(body)?;
        self.store.put(&self.record_key, value).await?;
        info!(key = %self.record_key, len = value.len(), "saved string updated");
        Ok(())
    }
}

/// Extract the new value from a write body.
pub fn saved_string(body: &Map<String, Value>) -> Result<&str, ServiceError> {
    match body.get(SAVED_STRING_FIELD) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ServiceError::Validation(format!(
            "field `{SAVED_STRING_FIELD}` must be a string, got {}",
            json_type(other)
        ))),
        None => Err(ServiceError::Validation(format!("missing field `{SAVED_STRING_FIELD}`"))),
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
