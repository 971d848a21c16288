//! Continuation tokens returned by paginated operations.
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque, non-empty continuation token.
///
/// Services signal "no more pages" either by omitting the token member or by
/// sending an empty string; both collapse to `None` through `ContinuationToken::new`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    /// Wraps `raw`, returning `None` for an empty string.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() { None } else { Some(Self(raw)) }
    }

    /// Normalizes an optional raw token.
    pub fn from_option(raw: Option<String>) -> Option<Self> {
        raw.and_then(Self::new)
    }

    /// Reads the token stored at `member` of a JSON response.
    ///
    /// Missing members, `null` and empty strings all mean "exhausted".
    pub fn from_member(response: &Value, member: &str) -> Option<Self> {
        match response.get(member) {
            Some(Value::String(s)) => Self::new(s.as_str()),
            _ => None,
        }
    }

    /// Borrow the raw token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the raw token text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_string_is_no_token() {
        assert_eq!(ContinuationToken::new(""), None);
        assert_eq!(ContinuationToken::from_option(Some(String::new())), None);
        assert_eq!(ContinuationToken::from_option(None), None);
    }

    #[test]
    fn reads_token_member() {
        let page = json!({"Metrics": [], "NextToken": "abc"});
        assert_eq!(
            ContinuationToken::from_member(&page, "NextToken").map(ContinuationToken::into_string),
            Some("abc".to_string())
        );
        assert_eq!(ContinuationToken::from_member(&json!({"NextToken": null}), "NextToken"), None);
        assert_eq!(ContinuationToken::from_member(&json!({"NextToken": ""}), "NextToken"), None);
        assert_eq!(ContinuationToken::from_member(&json!({}), "NextToken"), None);
    }
}
