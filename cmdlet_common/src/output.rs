//! Output projection: which part of a response a cmdlet writes.
//!
//! The `Projection` trait is the write delegate. `Selector` is the
//! implementation behind `-Select`, and any `Fn(&Value) -> Vec<Value>` closure
//! works too, so a call site can plug in its own shaping.
use std::str::FromStr;

use serde_json::Value;

use crate::error::CmdletError;
use crate::params::BoundParameters;

/// Chooses the values to write for one response.
pub trait Projection {
    /// Values to write, in order, for `response`.
    fn project(&self, response: &Value, params: &BoundParameters) -> Vec<Value>;
}

impl<F> Projection for F
where
    F: Fn(&Value) -> Vec<Value>,
{
    fn project(&self, response: &Value, _params: &BoundParameters) -> Vec<Value> {
        self(response)
    }
}

/// Parsed `-Select` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Write nothing.
    Nothing,
    /// `*`: the whole response.
    Whole,
    /// `^Name`: the value bound to a parameter.
    Parameter(String),
    /// `A.B.C`: a member path in the response.
    Path(Vec<String>),
}

impl Selector {
    /// Selector for `expression`, or the cmdlet default when absent.
    pub fn resolve(expression: Option<&str>, default: &str) -> Result<Self, CmdletError> {
        expression.unwrap_or(default).parse()
    }
}

impl FromStr for Selector {
    type Err = CmdletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Selector::Nothing);
        }
        if s == "*" {
            return Ok(Selector::Whole);
        }
        if let Some(name) = s.strip_prefix('^') {
            if name.is_empty() {
                return Err(CmdletError::invalid(
                    "Select",
                    "'^' must be followed by a parameter name",
                ));
            }
            return Ok(Selector::Parameter(name.to_string()));
        }
        let path: Vec<String> = s.split('.').map(str::to_string).collect();
        if path.iter().any(String::is_empty) {
            return Err(CmdletError::invalid("Select", format!("'{s}' is not a valid member path")));
        }
        Ok(Selector::Path(path))
    }
}

impl Projection for Selector {
    fn project(&self, response: &Value, params: &BoundParameters) -> Vec<Value> {
        match self {
            Selector::Nothing => Vec::new(),
            Selector::Whole => vec![response.clone()],
            Selector::Parameter(name) => params.get_json(name).map(flatten).unwrap_or_default(),
            Selector::Path(path) => lookup(response, path)
                .cloned()
                .map(flatten)
                .unwrap_or_default(),
        }
    }
}

/// Member lookup by path; keys are matched case-insensitively when no exact key exists.
fn lookup<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| {
        let object = current.as_object()?;
        object.get(key).or_else(|| {
            object
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    })
}

/// Arrays are written element by element; `null` writes nothing.
fn flatten(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    }
}
