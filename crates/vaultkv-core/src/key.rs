//! Rules for vault key names.

/// Maximum key length in bytes.
pub const MAX_KEY_LEN: usize = 256;

/// Check `key` against the rules every backing store can address.
///
/// Returns a description of the first rule broken.
pub fn check_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("key must not be empty".to_string());
    }
    if key.len() > MAX_KEY_LEN {
        return Err(format!("key exceeds maximum length of {MAX_KEY_LEN} bytes"));
    }
    if key.chars().any(char::is_control) {
        return Err("key must not contain control characters".to_string());
    }
    Ok(())
}
