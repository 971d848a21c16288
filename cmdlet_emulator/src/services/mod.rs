//! Operation handlers, one module per emulated service.
use cmdlet_common::ServiceId;
use cmdlet_common::wire::ServiceCall;
use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::fault::{OperationResult, ServiceFault};
use crate::pagination::MAX_PAGE_SIZE;
use crate::store::Store;

pub mod chime_messaging;
pub mod cloudwatch;
pub mod greengrass;

/// Settings every handler sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Page size when the request names none (or the operation has no page-size member).
    pub default_page_size: usize,
}

impl Limits {
    /// Limits with the default page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn new(default_page_size: usize) -> Self {
        Self {
            default_page_size: default_page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Page size for operations without a page-size member.
    pub fn page_size(&self) -> usize {
        self.default_page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

/// Runs `call` against `store`.
pub fn dispatch(call: &ServiceCall, store: &mut Store, limits: Limits) -> OperationResult<Value> {
    debug!("Dispatching {}:{}", call.service, call.operation);
    if !call.payload.is_object() {
        return Err(ServiceFault::new(
            "SerializationException",
            "Request body must be a JSON object",
        ));
    }
    let op = call.operation.as_str();
    let payload = &call.payload;
    match call.service {
        ServiceId::CloudWatch => cloudwatch::handle(op, payload, store, limits),
        ServiceId::ChimeSdkMessaging => chime_messaging::handle(op, payload, store, limits),
        ServiceId::Greengrass => greengrass::handle(op, payload, store, limits),
    }
}

pub(crate) fn unknown_operation(service: ServiceId, operation: &str) -> ServiceFault {
    ServiceFault::new(
        "UnknownOperationException",
        format!("Operation {operation} is not supported by {service}"),
    )
}

pub(crate) fn required_str<'a>(payload: &'a Value, member: &str) -> OperationResult<&'a str> {
    match payload.get(member) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(Value::String(_)) | None | Some(Value::Null) => Err(ServiceFault::missing(member)),
        Some(_) => Err(ServiceFault::validation(format!("{member} must be a string"))),
    }
}

pub(crate) fn optional_str<'a>(payload: &'a Value, member: &str) -> Option<&'a str> {
    payload.get(member).and_then(Value::as_str).filter(|s| !s.is_empty())
}

pub(crate) fn to_value<T: Serialize>(value: &T) -> OperationResult<Value> {
    serde_json::to_value(value).map_err(|e| ServiceFault::new("InternalFailure", e.to_string()))
}

/// `{items_member: [...], "NextToken": token}`, omitting the token on the last page.
pub(crate) fn list_response<T: Serialize>(
    items_member: &str,
    items: &[T],
    next_token: Option<String>,
) -> OperationResult<Value> {
    let mut body = serde_json::Map::new();
    body.insert(items_member.to_string(), to_value(&items)?);
    if let Some(token) = next_token {
        body.insert("NextToken".to_string(), Value::String(token));
    }
    Ok(Value::Object(body))
}
