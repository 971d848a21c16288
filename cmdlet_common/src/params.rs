//! Shell-style parameter binding.
//!
//! Arguments arrive as they were typed: `-ChannelArn arn:... -MaxResult 10
//! -NoAutoIteration`. Binding resolves every name against the cmdlet's
//! parameters (exact name, alias, then unambiguous prefix, all
//! case-insensitive), converts values to the declared kind, and checks that
//! required parameters are present. The bound values are then written into a
//! JSON request object at each parameter's member path.
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use log::debug;
use serde_json::{Map, Value};
use strum_macros::Display;

use crate::cmdlet::CmdletSpec;
use crate::error::CmdletError;
use crate::result::Result;

/// Value kind a parameter accepts; displays as the shell type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ParamKind {
    /// Free text.
    #[strum(serialize = "String")]
    String,
    /// 64-bit signed integer.
    #[strum(serialize = "Int64")]
    Integer,
    /// Flag without a value; `-Name:false` turns it off.
    #[strum(serialize = "SwitchParameter")]
    Switch,
    /// Comma-separated values; repeated bindings accumulate.
    #[strum(serialize = "String[]")]
    StringList,
    /// RFC 3339 timestamp (or a plain `YYYY-MM-DD` date), normalized to UTC.
    #[strum(serialize = "DateTime")]
    Timestamp,
    /// Arbitrary JSON, used for object arrays such as metric dimensions.
    #[strum(serialize = "Object")]
    Json,
    /// One of a fixed set of values.
    #[strum(serialize = "String")]
    Enum(&'static [&'static str]),
}

impl ParamKind {
    /// Values an `Enum` parameter accepts; empty for every other kind.
    pub fn allowed_values(&self) -> &'static [&'static str] {
        match self {
            ParamKind::Enum(values) => values,
            _ => &[],
        }
    }
}

/// Static description of one cmdlet parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Canonical parameter name, e.g. `ChannelArn`.
    pub name: &'static str,
    /// Dotted member path in the request body. Empty for common parameters.
    pub member: &'static str,
    /// Accepted value kind.
    pub kind: ParamKind,
    /// Whether binding fails when the parameter is absent.
    pub required: bool,
    /// Alternative names.
    pub aliases: &'static [&'static str],
    /// Position for unnamed arguments.
    pub position: Option<usize>,
    /// One-line description shown by `describe`.
    pub help: &'static str,
}

impl ParameterSpec {
    /// Optional parameter written to `member`.
    pub const fn new(name: &'static str, member: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            member,
            kind,
            required: false,
            aliases: &[],
            position: None,
            help: "",
        }
    }

    /// Marks the parameter as mandatory.
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Adds alternative names.
    pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    /// Accepts the parameter positionally.
    pub const fn position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Sets the description.
    pub const fn help(mut self, help: &'static str) -> Self {
        self.help = help;
        self
    }

    fn matches_exactly(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    fn matches_prefix(&self, prefix: &str) -> bool {
        let prefix = prefix.to_ascii_lowercase();
        std::iter::once(self.name)
            .chain(self.aliases.iter().copied())
            .any(|n| n.to_ascii_lowercase().starts_with(&prefix))
    }
}

/// `-Select`: which part of the response to write.
pub const SELECT: &str = "Select";
/// `-NoAutoIteration`: fetch a single page.
pub const NO_AUTO_ITERATION: &str = "NoAutoIteration";
/// `-NextToken`: continue from a cursor; also implies a single page.
pub const NEXT_TOKEN: &str = "NextToken";
/// `-Region`: per-call region override.
pub const REGION: &str = "Region";
/// `-ProfileName`: per-call profile override.
pub const PROFILE_NAME: &str = "ProfileName";
/// `-EndpointUrl`: per-call endpoint override.
pub const ENDPOINT_URL: &str = "EndpointUrl";

/// Parameters every cmdlet accepts.
pub const COMMON_PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::new(SELECT, "", ParamKind::String)
        .help("'*' for the whole response, '^Param' to pass a parameter through, or a member path"),
    ParameterSpec::new(REGION, "", ParamKind::String).help("Region to send the call to"),
    ParameterSpec::new(PROFILE_NAME, "", ParamKind::String)
        .aliases(&["StoredCredentials", "AWSProfileName"])
        .help("Profile name attached to the call"),
    ParameterSpec::new(ENDPOINT_URL, "", ParamKind::String)
        .help("Endpoint address overriding configuration"),
];

/// Parameters only paginated cmdlets accept.
pub const PAGING_PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::new(NEXT_TOKEN, "", ParamKind::String)
        .help("Continuation token from a previous call; fetches a single page"),
    ParameterSpec::new(NO_AUTO_ITERATION, "", ParamKind::Switch)
        .help("Fetch a single page instead of following continuation tokens"),
];

/// A converted parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// String or enum value.
    Str(String),
    /// Integer value.
    Int(i64),
    /// Switch state.
    Switch(bool),
    /// List of strings.
    List(Vec<String>),
    /// Parsed JSON.
    Json(Value),
}

impl BoundValue {
    /// JSON form written into the request.
    pub fn to_json(&self) -> Value {
        match self {
            BoundValue::Str(s) => Value::String(s.clone()),
            BoundValue::Int(i) => Value::from(*i),
            BoundValue::Switch(b) => Value::Bool(*b),
            BoundValue::List(items) => Value::from(items.clone()),
            BoundValue::Json(v) => v.clone(),
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            BoundValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Values of the parameters every cmdlet shares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonParameters {
    /// Raw `-Select` expression.
    pub select: Option<String>,
    /// `-NoAutoIteration` was given.
    pub no_auto_iteration: bool,
    /// `-NextToken` exactly as bound; `Some("")` means "from the beginning".
    pub next_token: Option<String>,
    /// `-Region` override.
    pub region: Option<String>,
    /// `-ProfileName` override.
    pub profile_name: Option<String>,
    /// `-EndpointUrl` override.
    pub endpoint_url: Option<String>,
}

impl CommonParameters {
    /// Caller controls paging by asking for one page or by continuing from a token.
    pub fn user_controls_paging(&self) -> bool {
        self.no_auto_iteration || self.next_token.is_some()
    }
}

/// Result of binding a command line against a cmdlet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundParameters {
    values: BTreeMap<&'static str, BoundValue>,
    /// Common parameter values.
    pub common: CommonParameters,
}

impl BoundParameters {
    /// Value bound to the cmdlet parameter `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&BoundValue> {
        self.values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// JSON value for `name`, including common parameters.
    pub fn get_json(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.get(name) {
            return Some(value.to_json());
        }
        let common = &self.common;
        let text = match name.to_ascii_lowercase().as_str() {
            "select" => common.select.clone(),
            "nexttoken" => common.next_token.clone(),
            "region" => common.region.clone(),
            "profilename" => common.profile_name.clone(),
            "endpointurl" => common.endpoint_url.clone(),
            "noautoiteration" => return Some(Value::Bool(common.no_auto_iteration)),
            _ => None,
        };
        text.map(Value::String)
    }

    /// Sets a cmdlet parameter directly, bypassing argument parsing.
    pub fn insert(&mut self, name: &'static str, value: BoundValue) {
        self.values.insert(name, value);
    }

    /// Builds the request body from the bound cmdlet parameters.
    pub fn to_request(&self, spec: &CmdletSpec) -> Result<Value> {
        let mut body = Value::Object(Map::new());
        for param in spec.parameters {
            if param.member.is_empty() {
                continue;
            }
            if let Some(value) = self.values.get(param.name) {
                set_member(&mut body, param.member, value.to_json())?;
            }
        }
        Ok(body)
    }
}

/// Writes `value` at the dotted `path`, creating intermediate objects.
pub fn set_member(target: &mut Value, path: &str, value: Value) -> Result<()> {
    let mut segments = path.split('.').peekable();
    let mut current = target;
    while let Some(segment) = segments.next() {
        let object = current.as_object_mut().ok_or_else(|| {
            CmdletError::Format(format!("member path '{path}' crosses a non-object value"))
        })?;
        if segments.peek().is_none() {
            object.insert(segment.to_string(), value);
            return Ok(());
        }
        current = object
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    Err(CmdletError::Format(format!("empty member path '{path}'")))
}

/// Binds `args` against `spec`.
pub fn bind(spec: &CmdletSpec, args: &[String]) -> Result<BoundParameters> {
    let candidates = spec.all_parameters();
    let mut bound = BoundParameters::default();
    let mut seen: Vec<&'static str> = Vec::new();
    let mut positional: Vec<&ParameterSpec> = spec
        .parameters
        .iter()
        .filter(|p| p.position.is_some())
        .collect();
    positional.sort_by_key(|p| p.position);

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        i += 1;

        let (param, inline) = match parameter_name(arg) {
            Some((name, inline)) => (resolve(&candidates, name)?, inline),
            None => {
                let param = positional
                    .iter()
                    .find(|p| !seen.contains(&p.name))
                    .ok_or_else(|| {
                        CmdletError::Format(format!(
                            "A positional parameter cannot be found that accepts argument '{arg}'"
                        ))
                    })?;
                (*param, Some(arg.as_str()))
            }
        };

        let raw = match (param.kind, inline) {
            (ParamKind::Switch, inline) => inline.unwrap_or("true").to_string(),
            (_, Some(value)) => value.to_string(),
            (_, None) => {
                let value = args
                    .get(i)
                    .ok_or_else(|| CmdletError::invalid(param.name, "missing an argument"))?;
                i += 1;
                value.clone()
            }
        };

        let value = convert(param, &raw)?;
        if seen.contains(&param.name) {
            match (bound.values.get_mut(param.name), value) {
                (Some(BoundValue::List(existing)), BoundValue::List(more)) => existing.extend(more),
                _ => return Err(CmdletError::invalid(param.name, "specified more than once")),
            }
            continue;
        }
        seen.push(param.name);
        debug!("Bound -{} = {:?}", param.name, value);
        store(&mut bound, param, value);
    }

    for param in spec.parameters {
        if param.required && !seen.contains(&param.name) {
            return Err(CmdletError::MissingParameter(param.name.to_string()));
        }
    }
    Ok(bound)
}

/// Splits `-Name` / `-Name:value`; anything else (including `-5`) is a value.
fn parameter_name(arg: &str) -> Option<(&str, Option<&str>)> {
    let rest = arg.strip_prefix('-')?;
    let rest = rest.strip_prefix('-').unwrap_or(rest);
    if !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    match rest.split_once(':') {
        Some((name, value)) => Some((name, Some(value))),
        None => Some((rest, None)),
    }
}

fn resolve<'a>(candidates: &[&'a ParameterSpec], name: &str) -> Result<&'a ParameterSpec> {
    if let Some(exact) = candidates.iter().copied().find(|p| p.matches_exactly(name)) {
        return Ok(exact);
    }
    let matches: Vec<&ParameterSpec> = candidates
        .iter()
        .copied()
        .filter(|p| p.matches_prefix(name))
        .collect();
    match matches.as_slice() {
        [] => Err(CmdletError::UnknownParameter(name.to_string())),
        [only] => Ok(*only),
        many => {
            let names: Vec<&str> = many.iter().map(|p| p.name).collect();
            Err(CmdletError::invalid(
                name,
                format!("parameter name is ambiguous, possible matches: {}", names.join(", ")),
            ))
        }
    }
}

fn convert(param: &ParameterSpec, raw: &str) -> Result<BoundValue> {
    match param.kind {
        ParamKind::String => Ok(BoundValue::Str(raw.to_string())),
        ParamKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(BoundValue::Int)
            .map_err(|e| {
                CmdletError::invalid(param.name, format!("'{raw}' is not an integer: {e}"))
            }),
        ParamKind::Switch => match raw.trim_start_matches('$').to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(BoundValue::Switch(true)),
            "false" | "0" => Ok(BoundValue::Switch(false)),
            _ => Err(CmdletError::invalid(param.name, format!("'{raw}' is not a boolean"))),
        },
        ParamKind::StringList => Ok(BoundValue::List(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )),
        ParamKind::Timestamp => parse_timestamp(raw)
            .map(|ts| BoundValue::Str(ts.to_rfc3339_opts(SecondsFormat::Secs, true)))
            .ok_or_else(|| {
                CmdletError::invalid(param.name, format!("'{raw}' is not an RFC 3339 timestamp"))
            }),
        ParamKind::Json => serde_json::from_str(raw)
            .map(BoundValue::Json)
            .map_err(|e| CmdletError::invalid(param.name, format!("invalid JSON: {e}"))),
        ParamKind::Enum(values) => values
            .iter()
            .find(|v| v.eq_ignore_ascii_case(raw))
            .map(|v| BoundValue::Str(v.to_string()))
            .ok_or_else(|| {
                CmdletError::invalid(
                    param.name,
                    format!("'{raw}' is not one of: {}", values.join(", ")),
                )
            }),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn store(bound: &mut BoundParameters, param: &ParameterSpec, value: BoundValue) {
    let common = &mut bound.common;
    match param.name {
        SELECT => common.select = value.as_str().map(str::to_string),
        NEXT_TOKEN => common.next_token = value.as_str().map(str::to_string),
        REGION => common.region = value.as_str().map(str::to_string),
        PROFILE_NAME => common.profile_name = value.as_str().map(str::to_string),
        ENDPOINT_URL => common.endpoint_url = value.as_str().map(str::to_string),
        NO_AUTO_ITERATION => common.no_auto_iteration = value == BoundValue::Switch(true),
        name => bound.insert(name, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use serde_json::json;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn spec(name: &str) -> &'static CmdletSpec {
        catalog::find(name).unwrap()
    }

    #[test]
    fn binds_named_values_and_builds_the_request() {
        let spec = spec("Get-CHMMGChannelMessageList");
        let bound = bind(
            spec,
            &args(&[
                "-ChannelArn",
                "arn:chan/1",
                "-ChimeBearer",
                "arn:user/1",
                "-SortOrder",
                "descending",
                "-MaxResult",
                "7",
            ]),
        )
        .unwrap();

        let request = bound.to_request(spec).unwrap();
        assert_eq!(
            request,
            json!({
                "ChannelArn": "arn:chan/1",
                "ChimeBearer": "arn:user/1",
                "SortOrder": "DESCENDING",
                "MaxResults": 7
            })
        );
    }

    #[test]
    fn accepts_prefixes_aliases_and_inline_values() {
        let spec = spec("Get-CHMMGChannelMessageList");
        let bound = bind(
            spec,
            &args(&["-channelarn:arn:chan/1", "-ChimeB", "arn:user/1", "-NoAuto", "-Select", "*"]),
        )
        .unwrap();
        assert_eq!(bound.get("ChannelArn"), Some(&BoundValue::Str("arn:chan/1".into())));
        assert!(bound.common.no_auto_iteration);
        assert_eq!(bound.common.select.as_deref(), Some("*"));
    }

    #[test]
    fn binds_positional_arguments_in_order() {
        let spec = spec("Get-CHMMGChannelMessageList");
        let bound = bind(spec, &args(&["arn:chan/1", "-ChimeBearer", "arn:user/1"])).unwrap();
        assert_eq!(bound.get("ChannelArn"), Some(&BoundValue::Str("arn:chan/1".into())));
    }

    #[test]
    fn rejects_missing_required_parameter() {
        let spec = spec("Get-CHMMGChannelMessageList");
        let err = bind(spec, &args(&["-ChimeBearer", "arn:user/1"])).unwrap_err();
        assert!(matches!(err, CmdletError::MissingParameter(name) if name == "ChannelArn"));
    }

    #[test]
    fn rejects_bad_enum_integer_and_unknown_names() {
        let spec = spec("Get-CHMMGChannelMessageList");
        let base = ["-ChannelArn", "a", "-ChimeBearer", "b"];

        let mut bad_enum = args(&base);
        bad_enum.extend(args(&["-SortOrder", "sideways"]));
        assert!(matches!(bind(spec, &bad_enum), Err(CmdletError::InvalidParameter { .. })));

        let mut bad_int = args(&base);
        bad_int.extend(args(&["-MaxResult", "ten"]));
        assert!(matches!(bind(spec, &bad_int), Err(CmdletError::InvalidParameter { .. })));

        let mut unknown = args(&base);
        unknown.extend(args(&["-Colour", "blue"]));
        assert!(matches!(
            bind(spec, &unknown),
            Err(CmdletError::UnknownParameter(n)) if n == "Colour"
        ));

        let mut dangling = args(&base);
        dangling.push("-MaxResult".into());
        assert!(matches!(bind(spec, &dangling), Err(CmdletError::InvalidParameter { .. })));
    }

    #[test]
    fn rejects_duplicates_but_accumulates_lists() {
        let spec = spec("Get-CWAlarm");
        let bound = bind(spec, &args(&["-AlarmName", "a,b", "-AlarmName", "c"])).unwrap();
        assert_eq!(
            bound.get("AlarmName"),
            Some(&BoundValue::List(vec!["a".into(), "b".into(), "c".into()]))
        );

        let err = bind(spec, &args(&["-StateValue", "OK", "-StateValue", "ALARM"])).unwrap_err();
        assert!(matches!(err, CmdletError::InvalidParameter { .. }));
    }

    #[test]
    fn ambiguous_prefix_is_rejected() {
        let spec = spec("Get-CWMetricStatistic");
        let err = bind(spec, &args(&["-E", "p99"])).unwrap_err();
        assert!(matches!(
            err,
            CmdletError::InvalidParameter { reason, .. } if reason.contains("ambiguous")
        ));
    }

    #[test]
    fn timestamps_and_json_are_normalized() {
        let spec = spec("Get-CWMetricStatistic");
        let bound = bind(
            spec,
            &args(&[
                "-Namespace",
                "AWS/EC2",
                "-MetricName",
                "CPUUtilization",
                "-UtcStartTime",
                "2024-01-01T02:00:00+02:00",
                "-UtcEndTime",
                "2024-01-02",
                "-Period",
                "3600",
                "-Statistic",
                "Average",
                "-Dimension",
                r#"[{"Name":"InstanceId","Value":"i-1"}]"#,
            ]),
        )
        .unwrap();
        let request = bound.to_request(spec).unwrap();
        assert_eq!(request["StartTime"], json!("2024-01-01T00:00:00Z"));
        assert_eq!(request["EndTime"], json!("2024-01-02T00:00:00Z"));
        assert_eq!(request["Dimensions"][0]["Name"], json!("InstanceId"));
        assert_eq!(request["Statistics"], json!(["Average"]));
    }

    #[test]
    fn explicit_empty_next_token_still_controls_paging() {
        let spec = spec("Get-GGGroupList");
        let bound = bind(spec, &args(&["-NextToken", ""])).unwrap();
        assert_eq!(bound.common.next_token.as_deref(), Some(""));
        assert!(bound.common.user_controls_paging());
    }

    #[test]
    fn negative_numbers_are_values_not_names() {
        let spec = spec("Get-CHMMGChannelList");
        let bound = bind(
            spec,
            &args(&[
                "-AppInstanceArn",
                "arn:app/1",
                "-ChimeBearer",
                "arn:user/1",
                "-MaxResult",
                "-5",
            ]),
        )
        .unwrap();
        assert_eq!(bound.get("MaxResult"), Some(&BoundValue::Int(-5)));
    }

    #[test]
    fn set_member_creates_nested_objects() {
        let mut body = json!({});
        set_member(&mut body, "Filter.Name", json!("x")).unwrap();
        set_member(&mut body, "Filter.Values", json!(["a"])).unwrap();
        assert_eq!(body, json!({"Filter": {"Name": "x", "Values": ["a"]}}));
    }

    #[test]
    fn rejects_bad_timestamp_and_json() {
        let spec = spec("Get-CWMetricStatistic");

        let err = bind(spec, &args(&["-UtcStartTime", "yesterday"])).unwrap_err();
        assert!(matches!(
            err,
            CmdletError::InvalidParameter { ref name, .. } if name == "UtcStartTime"
        ));

        let err = bind(spec, &args(&["-Dimension", r#"[{"Name": "InstanceId""#])).unwrap_err();
        assert!(matches!(
            err,
            CmdletError::InvalidParameter { ref name, .. } if name == "Dimension"
        ));
    }

    #[test]
    fn kinds_display_as_shell_type_names() {
        assert_eq!(ParamKind::Integer.to_string(), "Int64");
        assert_eq!(ParamKind::StringList.to_string(), "String[]");
        assert_eq!(ParamKind::Enum(&["A", "B"]).to_string(), "String");
        assert_eq!(ParamKind::Enum(&["A", "B"]).allowed_values(), &["A", "B"]);
        assert!(ParamKind::Timestamp.allowed_values().is_empty());
    }
}
