//! Action wire format
//!
//! Requests carry a JSON document in `client_data`; every answered request
//! gets the same small success object back. There is no error result: a
//! request that cannot be decoded is never answered.

use crate::domain::error::ActionError;
use crate::domain::models::{ActionRequest, ActionResponse};
use serde::Serialize;
use serde_json::Value;

/// Literal carried in `result_code` for answered requests
pub const RESULT_SUCCESS: &str = "success";

#[derive(Debug, Serialize)]
struct ResultPayload {
    result_code: &'static str,
}

/// Decode the client payload. Any well-formed JSON document is accepted,
/// whatever its shape.
pub fn parse_payload(request: &ActionRequest) -> Result<Value, ActionError> {
    serde_json::from_str::<Value>(&request.client_data).map_err(|e| {
        ActionError::MalformedPayload {
            request_id: request.request_id.clone(),
            reason: e.to_string(),
        }
    })
}

pub fn success_response(request_id: &str) -> ActionResponse {
    let payload = ResultPayload {
        result_code: RESULT_SUCCESS,
    };
    ActionResponse {
        request_id: request_id.to_string(),
        // A single static field cannot fail to serialize
        payload: serde_json::to_string(&payload)
            .unwrap_or_else(|_| format!(r#"{{"result_code":"{}"}}"#, RESULT_SUCCESS)),
    }
}
