//! Line-delimited JSON envelope exchanged between client and endpoint.
//!
//! A call is one TCP connection: the client writes a `ServiceCall` followed by
//! `\n`, the endpoint answers with one `ServiceReply` line and closes.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cmdlet::ServiceId;
use crate::error::CmdletError;
use crate::result::Result;

/// One operation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    /// Target service.
    pub service: ServiceId,
    /// Operation name, e.g. `ListMetrics`.
    pub operation: String,
    /// Region the call is addressed to.
    pub region: String,
    /// Profile name attached to the call, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Request body.
    #[serde(default)]
    pub payload: Value,
}

impl ServiceCall {
    /// Creates a call with an empty payload.
    pub fn new(service: ServiceId, operation: &str, region: &str) -> Self {
        Self {
            service,
            operation: operation.to_string(),
            region: region.to_string(),
            profile: None,
            payload: Value::Object(Default::default()),
        }
    }

    /// Sets the request body.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Encodes the call as one line, newline included.
    pub fn to_line(&self) -> Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

/// Endpoint answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ServiceReply {
    /// Successful call with the response body.
    Ok {
        /// Response body.
        payload: Value,
    },
    /// Service-side failure.
    Error {
        /// Error code, e.g. `ValidationException`.
        code: String,
        /// Human-readable message.
        message: String,
    },
}

impl ServiceReply {
    /// Error reply.
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        ServiceReply::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Encodes the reply as one line, newline included.
    pub fn to_line(&self) -> Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }

    /// Turns the reply into the response body or a `CmdletError::Service`.
    pub fn into_result(self) -> Result<Value> {
        match self {
            ServiceReply::Ok { payload } => Ok(payload),
            ServiceReply::Error { code, message } => Err(CmdletError::Service { code, message }),
        }
    }
}
