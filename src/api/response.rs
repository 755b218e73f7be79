//! Response envelope parsing.
//!
//! The device signals failure in one of two ways:
//! - mutating actions: `{"response": {"status": "fail", "err": {...}}}`
//! - read actions: the expected top-level key is absent and the same
//!   `response` section describes the error
//!
//! Anything that fits neither shape is a `MalformedResponse`.

use serde_json::Value;

use crate::error::{RemoteError, RotationError, RotationResult};

const STATUS_FAIL: &str = "fail";

/// Longest rendering of a body kept in a malformed-response error.
const DETAIL_LEN: usize = 512;

/// Extract `(message, code)` from a failed response.
pub fn extract_error(action: &'static str, body: &Value) -> RotationResult<RemoteError> {
    let response = body
        .get("response")
        .ok_or_else(|| malformed(action, body))?;

    if response.get("status").and_then(Value::as_str) != Some(STATUS_FAIL) {
        return Err(malformed(action, body));
    }

    let err = response.get("err").ok_or_else(|| malformed(action, body))?;
    let message = err
        .get("msg")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(action, body))?;
    let code = err
        .get("code")
        .and_then(Value::as_i64)
        .ok_or_else(|| malformed(action, body))?;

    Ok(RemoteError::new(message.trim(), code))
}

/// For mutating actions: `Some(error)` if the response reports failure.
pub fn mutation_failure(action: &'static str, body: &Value) -> RotationResult<Option<RemoteError>> {
    let status = body
        .get("response")
        .and_then(|r| r.get("status"))
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(action, body))?;

    if status == STATUS_FAIL {
        extract_error(action, body).map(Some)
    } else {
        Ok(None)
    }
}

/// Truthiness of a JSON value: false, null, 0, "" and empty containers are false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

pub(crate) fn malformed(action: &'static str, body: &Value) -> RotationError {
    let mut detail = body.to_string();
    if detail.len() > DETAIL_LEN {
        let cut = (0..=DETAIL_LEN).rev().find(|i| detail.is_char_boundary(*i)).unwrap_or(0);
        detail.truncate(cut);
        detail.push_str("...");
    }
    RotationError::MalformedResponse { action, detail }
}
