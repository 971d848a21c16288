//! Service-side failures the emulator reports.
use cmdlet_common::wire::ServiceReply;
use thiserror::Error;

/// An error reply, as the real service would send it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ServiceFault {
    /// Error code, e.g. `InvalidNextToken`.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl ServiceFault {
    /// Fault with `code`.
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// `ValidationException`, the catch-all for bad input.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("ValidationException", message)
    }

    /// A required request member is missing.
    pub fn missing(member: &str) -> Self {
        Self::new("MissingParameter", format!("The parameter {member} is required."))
    }
}

impl From<ServiceFault> for ServiceReply {
    fn from(fault: ServiceFault) -> Self {
        ServiceReply::error(fault.code, fault.message)
    }
}

/// Result of one emulated operation.
pub type OperationResult<T> = std::result::Result<T, ServiceFault>;

/// Counts served calls and fails every call after the first `fail_after`.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    fail_after: Option<usize>,
    served: usize,
}

impl FaultPlan {
    /// Plan failing after `fail_after` calls; `None` never fails.
    pub fn new(fail_after: Option<usize>) -> Self {
        Self {
            fail_after,
            served: 0,
        }
    }

    /// Admits the next call or rejects it with `ServiceUnavailable`.
    pub fn admit(&mut self) -> OperationResult<()> {
        self.served += 1;
        match self.fail_after {
            Some(limit) if self.served > limit => Err(ServiceFault::new(
                "ServiceUnavailable",
                format!("Injected failure on call {} (fail-after {})", self.served, limit),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fails_every_call_after_the_limit() {
        let mut plan = FaultPlan::new(Some(2));
        assert!(plan.admit().is_ok());
        assert!(plan.admit().is_ok());
        assert_eq!(plan.admit().unwrap_err().code, "ServiceUnavailable");
        assert!(plan.admit().is_err());
    }

    #[test]
    fn no_limit_never_fails() {
        let mut plan = FaultPlan::default();
        assert!((0..100).all(|_| plan.admit().is_ok()));
    }
}
