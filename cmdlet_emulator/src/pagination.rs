//! Token pagination over in-memory lists.
//!
//! Tokens are opaque to clients: a version prefix plus the scrambled offset of
//! the next item. Anything that does not decode to an offset inside the list
//! is rejected with `InvalidNextToken`.
use serde_json::Value;

use crate::fault::{OperationResult, ServiceFault};

const TOKEN_PREFIX: &str = "v1.";
const TOKEN_KEY: u64 = 0x5f3a_9c41_d2e7_0b68;
/// Largest page the emulator serves.
pub const MAX_PAGE_SIZE: usize = 100;

/// Token pointing at `offset`.
pub fn encode_token(offset: usize) -> String {
    format!("{TOKEN_PREFIX}{:016x}", offset as u64 ^ TOKEN_KEY)
}

/// Offset a token points at.
pub fn decode_token(token: &str) -> OperationResult<usize> {
    token
        .strip_prefix(TOKEN_PREFIX)
        .filter(|hex| hex.len() == 16)
        .and_then(|hex| u64::from_str_radix(hex, 16).ok())
        .and_then(|raw| usize::try_from(raw ^ TOKEN_KEY).ok())
        .ok_or_else(|| {
            ServiceFault::new("InvalidNextToken", "The service couldn't decode the token.")
        })
}

/// Page size requested in `member` of `request`, clamped to `1..=MAX_PAGE_SIZE`.
///
/// Numbers and numeric strings are both accepted.
pub fn page_size(request: &Value, member: &str, default: usize) -> OperationResult<usize> {
    let requested = match request.get(member) {
        None | Some(Value::Null) => return Ok(default.clamp(1, MAX_PAGE_SIZE)),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    }
    .ok_or_else(|| ServiceFault::validation(format!("{member} must be an integer")))?;
    Ok(requested.clamp(1, MAX_PAGE_SIZE as i64) as usize)
}

/// One page of `items` starting at the offset encoded in `token`.
///
/// Returns the page and the token for the following page, if any.
pub fn page_of<T: Clone>(
    items: &[T],
    token: Option<&str>,
    page_size: usize,
) -> OperationResult<(Vec<T>, Option<String>)> {
    let start = match token {
        None | Some("") => 0,
        Some(token) => decode_token(token)?,
    };
    if start > items.len() || (start == items.len() && start != 0) {
        return Err(ServiceFault::new("InvalidNextToken", "The token is past the end of the list."));
    }
    let end = start.saturating_add(page_size.max(1)).min(items.len());
    let next = (end < items.len()).then(|| encode_token(end));
    Ok((items[start..end].to_vec(), next))
}

/// Token member of `request`, if it is a string.
pub fn request_token<'a>(request: &'a Value, member: &str) -> Option<&'a str> {
    request.get(member).and_then(Value::as_str)
}
