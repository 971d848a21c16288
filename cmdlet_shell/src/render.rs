//! Writes emitted values and errors.
//!
//! Every value is flushed as soon as it is written, so a listing that fails
//! on a later page still leaves its earlier values on stdout.
use std::io::Write;

use clap::ValueEnum;
use cmdlet_common::{CmdletError, Result};
use serde_json::{Map, Value, json};
use strum_macros::Display;

/// How emitted values are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum OutputFormat {
    /// Pretty-printed JSON per value.
    Json,
    /// One compact JSON document per line.
    JsonLines,
    /// Scalars as plain text, objects as `Key : Value` lists.
    Text,
}

/// Value writer for one output stream.
pub struct Renderer<W: Write> {
    format: OutputFormat,
    out: W,
    written: usize,
}

impl<W: Write> Renderer<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self {
            format,
            out,
            written: 0,
        }
    }

    /// Values written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut self.out, value)?;
                writeln!(self.out)?;
            }
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.out, value)?;
                writeln!(self.out)?;
            }
            OutputFormat::Text => match value {
                Value::Object(members) => self.write_members(members)?,
                other => writeln!(self.out, "{}", scalar_text(other))?,
            },
        }
        self.out.flush()?;
        self.written += 1;
        Ok(())
    }

    fn write_members(&mut self, members: &Map<String, Value>) -> Result<()> {
        let width = members.keys().map(String::len).max().unwrap_or(0);
        for (key, value) in members {
            writeln!(self.out, "{key:<width$} : {}", scalar_text(value))?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Strings unquoted, nested values as compact JSON.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Structured form of an error: `{"error": kind, "message": text}`, plus `code`
/// for service errors.
pub fn error_object(err: &CmdletError) -> Value {
    match err {
        CmdletError::Service { code, message } => json!({
            "error": err.kind(),
            "message": message,
            "code": code,
        }),
        other => json!({
            "error": other.kind(),
            "message": other.to_string(),
        }),
    }
}

/// Writes the structured error as one line.
pub fn write_error<W: Write>(out: &mut W, err: &CmdletError) -> Result<()> {
    serde_json::to_writer(&mut *out, &error_object(err))?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(format: OutputFormat, values: &[Value]) -> String {
        let mut renderer = Renderer::new(format, Vec::new());
        for value in values {
            renderer.write_value(value).unwrap();
        }
        assert_eq!(renderer.written(), values.len());
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn json_lines_writes_one_document_per_line() {
        let text = render(OutputFormat::JsonLines, &[json!({"Id": 1}), json!("two")]);
        assert_eq!(text, "{\"Id\":1}\n\"two\"\n");
    }

    #[test]
    fn text_lists_object_members_aligned() {
        let text = render(
            OutputFormat::Text,
            &[
                json!({"Name": "group-1", "LatestVersion": "v1", "Tags": {"env": "dev"}}),
                json!("msg-1"),
            ],
        );
        assert!(text.contains("Name          : group-1\n"));
        assert!(text.contains("LatestVersion : v1\n"));
        assert!(text.contains("Tags          : {\"env\":\"dev\"}\n"));
        assert!(text.ends_with("\nmsg-1\n"));
    }

    #[test]
    fn format_names_are_kebab_case() {
        assert_eq!(OutputFormat::JsonLines.to_string(), "json-lines");
        assert_eq!(OutputFormat::from_str("json-lines", false), Ok(OutputFormat::JsonLines));
    }

    #[test]
    fn service_errors_carry_their_code() {
        let err = CmdletError::Service {
            code: "ServiceUnavailable".into(),
            message: "try again".into(),
        };
        assert_eq!(
            error_object(&err),
            json!({"error": "ServiceError", "message": "try again", "code": "ServiceUnavailable"})
        );

        let mut out = Vec::new();
        write_error(&mut out, &CmdletError::UnknownCmdlet("Get-Nothing".into())).unwrap();
        let line: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(line["error"], "CommandNotFound");
        assert!(line.get("code").is_none());
    }
}
