//! Subcommand implementations.
use std::io::Write;
use std::str::FromStr;

use cmdlet_common::params::{ParameterSpec, bind};
use cmdlet_common::{CmdletError, CmdletSpec, Result, ServiceId, catalog};
use log::{debug, info};
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::config::ShellConfig;
use crate::render::Renderer;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CmdletRow {
    name: &'static str,
    service: ServiceId,
    operation: &'static str,
    paginated: bool,
    synopsis: &'static str,
}

impl From<&CmdletSpec> for CmdletRow {
    fn from(spec: &CmdletSpec) -> Self {
        Self {
            name: spec.name,
            service: spec.service,
            operation: spec.operation,
            paginated: spec.is_paginated(),
            synopsis: spec.synopsis,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterRow {
    name: &'static str,
    #[serde(rename = "Type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<&'static [&'static str]>,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<usize>,
    aliases: &'static [&'static str],
    description: &'static str,
}

impl From<&ParameterSpec> for ParameterRow {
    fn from(param: &ParameterSpec) -> Self {
        Self {
            name: param.name,
            kind: param.kind.to_string(),
            values: Some(param.kind.allowed_values()).filter(|v| !v.is_empty()),
            required: param.required,
            position: param.position,
            aliases: param.aliases,
            description: param.help,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CmdletDescription {
    #[serde(flatten)]
    summary: CmdletRow,
    default_select: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_size_parameter: Option<&'static str>,
    parameters: Vec<ParameterRow>,
}

/// Accepts a service id (`monitoring`) or a noun prefix (`CW`).
fn parse_service(raw: &str) -> Result<ServiceId> {
    ServiceId::from_str(raw)
        .ok()
        .or_else(|| ServiceId::iter().find(|s| s.noun_prefix().eq_ignore_ascii_case(raw)))
        .ok_or_else(|| CmdletError::invalid("service", format!("unknown service '{raw}'")))
}

fn find(name: &str) -> Result<&'static CmdletSpec> {
    catalog::find(name).ok_or_else(|| CmdletError::UnknownCmdlet(name.to_string()))
}

pub fn list<W: Write>(service: Option<&str>, renderer: &mut Renderer<W>) -> Result<()> {
    let service = service.map(parse_service).transpose()?;
    for spec in catalog::all().filter(|spec| service.is_none_or(|s| spec.service == s)) {
        renderer.write_value(&serde_json::to_value(CmdletRow::from(spec))?)?;
    }
    Ok(())
}

pub fn describe<W: Write>(name: &str, renderer: &mut Renderer<W>) -> Result<()> {
    let spec = find(name)?;
    let description = CmdletDescription {
        summary: CmdletRow::from(spec),
        default_select: spec.default_selection(),
        page_size_parameter: spec.pagination.and_then(|p| p.page_size),
        parameters: spec.all_parameters().into_iter().map(ParameterRow::from).collect(),
    };
    renderer.write_value(&serde_json::to_value(description)?)
}

/// Binds `args`, runs the cmdlet and renders what it writes.
///
/// When the caller controls paging the continuation token goes to stderr as
/// `NextToken: <token>`; nothing is printed once the listing is exhausted.
pub fn invoke<W: Write>(
    config: &ShellConfig,
    name: &str,
    args: &[String],
    renderer: &mut Renderer<W>,
) -> Result<()> {
    let spec = find(name)?;
    let bound = bind(spec, args)?;
    let client = config.client_for(&bound.common);
    info!(
        "Invoking {} ({}:{}) on {}",
        spec.name,
        spec.service,
        spec.operation,
        client.endpoint()
    );

    let settings = config.call_settings();
    let summary = cmdlet_common::invoke::invoke(&client, spec, &bound, &settings, |value| {
        renderer.write_value(&value)
    })?;
    debug!(
        "{} finished: {} call(s), {} value(s) written",
        spec.name, summary.pages, summary.emitted
    );
    if let Some(token) = summary.next_token {
        eprintln!("NextToken: {token}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::OutputFormat;
    use serde_json::Value;

    fn lines(out: Vec<u8>) -> Vec<Value> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn list_filters_by_service_or_prefix() {
        let mut renderer = Renderer::new(OutputFormat::JsonLines, Vec::new());
        list(Some("GG"), &mut renderer).unwrap();
        let rows = lines(renderer.into_inner());
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row["Service"] == "greengrass"));

        let mut renderer = Renderer::new(OutputFormat::JsonLines, Vec::new());
        list(Some("monitoring"), &mut renderer).unwrap();
        assert_eq!(lines(renderer.into_inner()).len(), 4);
    }

    #[test]
    fn unknown_service_is_rejected() {
        let mut renderer = Renderer::new(OutputFormat::JsonLines, Vec::new());
        let err = list(Some("s3"), &mut renderer).unwrap_err();
        assert_eq!(err.kind(), "ParameterBindingError");
    }

    #[test]
    fn describe_includes_common_and_paging_parameters() {
        let mut renderer = Renderer::new(OutputFormat::JsonLines, Vec::new());
        describe("get-cwalarm", &mut renderer).unwrap();
        let rows = lines(renderer.into_inner());
        let names: Vec<&str> = rows[0]["Parameters"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p["Name"].as_str())
            .collect();
        assert_eq!(rows[0]["Name"], "Get-CWAlarm");
        assert_eq!(rows[0]["DefaultSelect"], "MetricAlarms");
        assert_eq!(rows[0]["PageSizeParameter"], "MaxRecord");
        assert!(names.contains(&"MaxRecord"));
        assert!(names.contains(&"NextToken"));
        assert!(names.contains(&"Select"));

        let state = rows[0]["Parameters"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["Name"] == "StateValue")
            .unwrap();
        assert_eq!(state["Type"], "String");
        assert_eq!(state["Values"], serde_json::json!(["OK", "ALARM", "INSUFFICIENT_DATA"]));
    }

    #[test]
    fn binding_errors_surface_before_any_call() {
        let config = ShellConfig {
            endpoint: "127.0.0.1:1".into(),
            ..ShellConfig::default()
        };
        let mut renderer = Renderer::new(OutputFormat::JsonLines, Vec::new());
        let err = invoke(&config, "Get-GGDeploymentList", &[], &mut renderer).unwrap_err();
        assert!(matches!(err, CmdletError::MissingParameter(_)));
        assert_eq!(renderer.written(), 0);
    }
}
