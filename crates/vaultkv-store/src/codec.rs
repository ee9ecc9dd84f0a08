//! Conversions between stored bytes and typed values.
//!
//! Strings are UTF-8. Booleans and integers are JSON scalars (`true`, `42`),
//! so they stay readable by anything that speaks JSON. The scalar decoders
//! return `None` on a mismatch; the generic JSON path returns an error.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

pub fn encode_string(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}

/// `None` if the bytes are not valid UTF-8.
pub fn decode_string(bytes: &[u8]) -> Option<String> {
    std::str::from_utf8(bytes).ok().map(str::to_owned)
}

pub fn encode_bool(value: bool) -> Vec<u8> {
    Value::Bool(value).to_string().into_bytes()
}

/// `None` unless the bytes are the JSON literal `true` or `false`.
pub fn decode_bool(bytes: &[u8]) -> Option<bool> {
    parse_scalar(bytes)?.as_bool()
}

pub fn encode_int(value: i64) -> Vec<u8> {
    Value::from(value).to_string().into_bytes()
}

/// `None` unless the bytes are a JSON integer that fits in an `i64`.
pub fn decode_int(bytes: &[u8]) -> Option<i64> {
    parse_scalar(bytes)?.as_i64()
}

fn parse_scalar(bytes: &[u8]) -> Option<Value> {
    serde_json::from_slice(bytes).ok()
}

/// Encode any JSON value, bare scalars included.
pub fn encode_value(value: &Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode_value(bytes: &[u8]) -> Result<Value> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}
