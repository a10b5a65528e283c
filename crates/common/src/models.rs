//! Common data models for the orchestration framework
//!
//! This module defines the uniform result returned by every orchestration call
//! and the parameter bag handed to every orchestrator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::types::ErrorCategory;

/// Parameter key used by orchestrators that route several logical operations
/// through their single entry point
pub const OPERATION_KEY: &str = "operation";

/// Classified failure carried by a failed outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeError {
    /// Human readable message
    pub message: String,
    /// Category drawn from the closed taxonomy
    pub category: ErrorCategory,
}

/// Result of one orchestrator invocation
///
/// Exactly one of data or error exists, enforced by the variants. Outcomes are
/// built once per call and never mutated after being returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Successful invocation with its payload
    Success(Value),
    /// Failed invocation with a classified error
    Failure(OutcomeError),
}

impl Outcome {
    /// Creates a successful outcome
    pub fn success(data: impl Into<Value>) -> Self {
        Outcome::Success(data.into())
    }

    /// Creates a failed outcome
    pub fn failure(category: ErrorCategory, message: impl Into<String>) -> Self {
        Outcome::Failure(OutcomeError {
            message: message.into(),
            category,
        })
    }

    /// Creates a `validation` failure
    pub fn validation(message: impl Into<String>) -> Self {
        Self::failure(ErrorCategory::Validation, message)
    }

    /// Creates a `not_found` failure
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::failure(ErrorCategory::NotFound, message)
    }

    /// Creates a `timeout` failure
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::failure(ErrorCategory::Timeout, message)
    }

    /// Creates an `unavailable` failure
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::failure(ErrorCategory::Unavailable, message)
    }

    /// Creates an `internal` failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::failure(ErrorCategory::Internal, message)
    }

    /// Converts a detected error into a failed outcome
    pub fn from_error(error: &Error) -> Self {
        Self::failure(error.category(), error.to_string())
    }

    /// Returns true if the invocation succeeded
    pub fn succeeded(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Payload of a successful outcome
    pub fn data(&self) -> Option<&Value> {
        match self {
            Outcome::Success(data) => Some(data),
            Outcome::Failure(_) => None,
        }
    }

    /// Error of a failed outcome
    pub fn error(&self) -> Option<&OutcomeError> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(error) => Some(error),
        }
    }

    /// Category of a failed outcome
    pub fn error_category(&self) -> Option<ErrorCategory> {
        self.error().map(|e| e.category)
    }
}

impl From<std::result::Result<Value, Error>> for Outcome {
    fn from(result: std::result::Result<Value, Error>) -> Self {
        match result {
            Ok(data) => Outcome::Success(data),
            Err(error) => Outcome::from_error(&error),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct OutcomeRepr {
    succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<OutcomeError>,
}

impl Serialize for Outcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = OutcomeRepr {
            succeeded: self.succeeded(),
            data: self.data().cloned(),
            error: self.error().cloned(),
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Outcome {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = OutcomeRepr::deserialize(deserializer)?;
        match (repr.succeeded, repr.data, repr.error) {
            (true, Some(data), None) => Ok(Outcome::Success(data)),
            (true, None, None) => Ok(Outcome::Success(Value::Null)),
            (false, None, Some(error)) => Ok(Outcome::Failure(error)),
            _ => Err(serde::de::Error::custom(
                "outcome must carry exactly one of data or error",
            )),
        }
    }
}

/// Variadic parameter bag passed to an orchestrator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    /// Creates an empty parameter bag
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builds a parameter bag from a JSON value; anything but an object is rejected
    pub fn from_value(value: Value) -> crate::error::Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(Error::Validation(format!(
                "parameters must be a JSON object, got {}",
                other
            ))),
        }
    }

    /// Adds a parameter, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Sets a parameter
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// Required string parameter, `validation` error when missing or not a string
    pub fn require_str(&self, key: &str) -> crate::error::Result<&str> {
        self.get_str(key)
            .ok_or_else(|| Error::Validation(format!("missing string parameter '{}'", key)))
    }

    /// Operation selector for orchestrators with several logical operations
    pub fn operation(&self) -> Option<&str> {
        self.get_str(OPERATION_KEY)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_exactly_one_side() {
        let ok = Outcome::success(json!({"score": 0.9}));
        assert!(ok.succeeded());
        assert!(ok.data().is_some());
        assert!(ok.error().is_none());

        let failed = Outcome::validation("unknown operation 'bogus'");
        assert!(!failed.succeeded());
        assert!(failed.data().is_none());
        assert_eq!(failed.error_category(), Some(ErrorCategory::Validation));
    }

    #[test]
    fn test_outcome_from_error() {
        let outcome = Outcome::from_error(&Error::Unavailable("llm router".into()));
        assert_eq!(outcome.error_category(), Some(ErrorCategory::Unavailable));
        assert!(outcome.error().unwrap().message.contains("llm router"));
    }

    #[test]
    fn test_outcome_json_shape() {
        let failed = Outcome::not_found("no orchestrator 'x'");
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["succeeded"], json!(false));
        assert_eq!(value["error"]["category"], json!("not_found"));
        assert!(value.get("data").is_none());

        let parsed: Outcome = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, failed);
    }

    #[test]
    fn test_outcome_rejects_both_sides() {
        let value = json!({
            "succeeded": true,
            "data": 1,
            "error": {"message": "x", "category": "internal"}
        });
        assert!(serde_json::from_value::<Outcome>(value).is_err());
    }

    #[test]
    fn test_params_accessors() {
        let params = Params::new()
            .with("operation", "submit")
            .with("value", 0.5)
            .with("metadata", json!({"source": "discord", "attempt": 2}));

        assert_eq!(params.operation(), Some("submit"));
        assert_eq!(params.get_f64("value"), Some(0.5));
        assert!(params.require_str("component").is_err());
        assert_eq!(params.get("metadata").unwrap()["attempt"], json!(2));
    }

    #[test]
    fn test_params_from_value() {
        assert!(Params::from_value(json!({"url": "http://x"})).is_ok());
        assert!(Params::from_value(Value::Null).unwrap().is_empty());
        assert!(Params::from_value(json!([1, 2])).is_err());
    }
}
