//! Decoding of the `{ success, data | results, error? }` response envelope.
//!
//! Some endpoints wrap their payload in `data`, the time-series endpoints
//! use `results`, and a few put the payload fields next to `success`.
//! Every variant reports `success: false` with an `error` or `message`
//! field, which becomes `DashboardError::Unknown`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DashboardError, Result};

/// Fails if the body carries `success: false`.
///
/// A missing `success` field counts as success.
pub fn check_success(body: &Value) -> Result<()> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = ["error", "message"]
            .iter()
            .find_map(|field| body.get(*field).and_then(Value::as_str))
            .unwrap_or("request was not successful");
        return Err(DashboardError::unknown(message));
    }
    Ok(())
}

/// Decodes the `data` field of a successful envelope.
pub fn decode_data<T: DeserializeOwned>(mut body: Value) -> Result<T> {
    check_success(&body)?;
    let data = take_field(&mut body, "data")?;
    Ok(serde_json::from_value(data)?)
}

/// Decodes the `results` array of a successful envelope.
pub fn decode_results<T: DeserializeOwned>(mut body: Value) -> Result<Vec<T>> {
    check_success(&body)?;
    let results = take_field(&mut body, "results")?;
    Ok(serde_json::from_value(results)?)
}

/// Decodes the whole body of a successful envelope, for endpoints that put
/// their fields next to `success`.
pub fn decode_body<T: DeserializeOwned>(body: Value) -> Result<T> {
    check_success(&body)?;
    Ok(serde_json::from_value(body)?)
}

fn take_field(body: &mut Value, field: &str) -> Result<Value> {
    body.get_mut(field)
        .map(Value::take)
        .ok_or_else(|| DashboardError::unknown(format!("response has no '{}' field", field)))
}

/// Response of mutation endpoints that return no payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

impl Acknowledgement {
    /// Decodes an acknowledgement; an empty body is a plain success.
    pub fn decode(body: Value) -> Result<Self> {
        if body.is_null() {
            return Ok(Self {
                success: true,
                message: None,
            });
        }
        decode_body(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unsuccessful_envelope() {
        let err = decode_data::<Value>(json!({ "success": false, "error": "DB timeout" }))
            .unwrap_err();
        assert_eq!(err, DashboardError::unknown("DB timeout"));

        let err = check_success(&json!({ "success": false })).unwrap_err();
        assert_eq!(err, DashboardError::unknown("request was not successful"));
    }

    #[test]
    fn test_missing_success_is_ok() {
        let value: u32 = decode_data(json!({ "data": 7 })).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_missing_payload_field() {
        let err = decode_results::<u32>(json!({ "success": true, "data": [] })).unwrap_err();
        assert!(err.to_string().contains("results"));
    }

    #[test]
    fn test_results_and_body() {
        let results: Vec<u32> = decode_results(json!({ "success": true, "results": [1, 2] })).unwrap();
        assert_eq!(results, vec![1, 2]);

        #[derive(Deserialize)]
        struct Sites {
            sites: Vec<String>,
        }
        let sites: Sites = decode_body(json!({ "success": true, "sites": ["A"] })).unwrap();
        assert_eq!(sites.sites, vec!["A"]);
    }

    #[test]
    fn test_acknowledgement() {
        assert!(Acknowledgement::decode(Value::Null).unwrap().success);
        let ack = Acknowledgement::decode(json!({ "success": true, "message": "cleared" })).unwrap();
        assert_eq!(ack.message.as_deref(), Some("cleared"));
        assert!(Acknowledgement::decode(json!({ "success": false })).is_err());
    }
}
