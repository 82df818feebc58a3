// src/validate.rs
//! Shape check for candidate payloads.

use serde_json::Value;

/// The one field a status payload must carry.
pub const REQUIRED_FIELD: &str = "online_user";

/// True iff `payload` is a JSON object with an `online_user` key.
/// The value is not inspected: zero, strings, even `null` all count as present.
pub fn is_valid(payload: &Value) -> bool {
    payload
        .as_object()
        .is_some_and(|obj| obj.contains_key(REQUIRED_FIELD))
}
