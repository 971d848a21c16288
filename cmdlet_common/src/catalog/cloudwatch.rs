//! Amazon CloudWatch cmdlets.
use crate::cmdlet::{CmdletSpec, PaginationSpec, ServiceId};
use crate::params::{ParamKind, ParameterSpec};

const STATE_VALUES: &[&str] = &["OK", "ALARM", "INSUFFICIENT_DATA"];
const STATISTICS: &[&str] = &["SampleCount", "Average", "Sum", "Minimum", "Maximum"];
const UNITS: &[&str] = &[
    "Seconds", "Microseconds", "Milliseconds", "Bytes", "Kilobytes", "Megabytes", "Bits", "Percent",
    "Count", "Bytes/Second", "Count/Second", "None",
];
const RECENTLY_ACTIVE: &[&str] = &["PT3H"];

/// CloudWatch cmdlets.
pub const CMDLETS: &[CmdletSpec] = &[
    CmdletSpec {
        name: "Get-CWMetricList",
        service: ServiceId::CloudWatch,
        operation: "ListMetrics",
        parameters: &[
            ParameterSpec::new("Namespace", "Namespace", ParamKind::String)
                .position(0)
                .help("Metric namespace to filter on"),
            ParameterSpec::new("MetricName", "MetricName", ParamKind::String)
                .help("Metric name to filter on"),
            ParameterSpec::new("Dimension", "Dimensions", ParamKind::Json)
                .aliases(&["Dimensions"])
                .help("JSON array of {Name, Value} dimension filters"),
            ParameterSpec::new("RecentlyActive", "RecentlyActive", ParamKind::Enum(RECENTLY_ACTIVE))
                .help("Only metrics with datapoints in the past three hours"),
        ],
        pagination: Some(PaginationSpec::next_token("Metrics")),
        default_select: None,
        synopsis: "List the metrics in the account",
    },
    CmdletSpec {
        name: "Get-CWAlarm",
        service: ServiceId::CloudWatch,
        operation: "DescribeAlarms",
        parameters: &[
            ParameterSpec::new("AlarmName", "AlarmNames", ParamKind::StringList)
                .position(0)
                .aliases(&["AlarmNames"])
                .help("Names of the alarms to describe"),
            ParameterSpec::new("AlarmNamePrefix", "AlarmNamePrefix", ParamKind::String)
                .help("Only alarms whose name starts with this prefix"),
            ParameterSpec::new("StateValue", "StateValue", ParamKind::Enum(STATE_VALUES))
                .help("Only alarms in this state"),
            ParameterSpec::new("ActionPrefix", "ActionPrefix", ParamKind::String)
                .help("Only alarms with an action starting with this prefix"),
            ParameterSpec::new("MaxRecord", "MaxRecords", ParamKind::Integer)
                .aliases(&["MaxRecords", "MaxItems"])
                .help("Alarms per page"),
        ],
        pagination: Some(PaginationSpec::next_token("MetricAlarms").page_size("MaxRecord")),
        default_select: None,
        synopsis: "Describe metric alarms",
    },
    CmdletSpec {
        name: "Get-CWMetricStatistic",
        service: ServiceId::CloudWatch,
        operation: "GetMetricStatistics",
        parameters: &[
            ParameterSpec::new("Namespace", "Namespace", ParamKind::String).required(),
            ParameterSpec::new("MetricName", "MetricName", ParamKind::String).required(),
            ParameterSpec::new("Dimension", "Dimensions", ParamKind::Json)
                .aliases(&["Dimensions"])
                .help("JSON array of {Name, Value} dimensions"),
            ParameterSpec::new("UtcStartTime", "StartTime", ParamKind::Timestamp)
                .required()
                .aliases(&["StartTime"]),
            ParameterSpec::new("UtcEndTime", "EndTime", ParamKind::Timestamp)
                .required()
                .aliases(&["EndTime"]),
            ParameterSpec::new("Period", "Period", ParamKind::Integer)
                .required()
                .help("Granularity in seconds"),
            ParameterSpec::new("Statistic", "Statistics", ParamKind::StringList)
                .aliases(&["Statistics"])
                .help("Comma-separated statistics: SampleCount, Average, Sum, Minimum, Maximum"),
            ParameterSpec::new("ExtendedStatistic", "ExtendedStatistics", ParamKind::StringList)
                .help("Percentile statistics such as p99"),
            ParameterSpec::new("Unit", "Unit", ParamKind::Enum(UNITS)),
        ],
        pagination: None,
        default_select: Some("Datapoints"),
        synopsis: "Get statistics for one metric",
    },
    CmdletSpec {
        name: "Write-CWMetricData",
        service: ServiceId::CloudWatch,
        operation: "PutMetricData",
        parameters: &[
            ParameterSpec::new("Namespace", "Namespace", ParamKind::String)
                .required()
                .position(0),
            ParameterSpec::new("MetricData", "MetricData", ParamKind::Json)
                .required()
                .help("JSON array of MetricDatum objects"),
        ],
        pagination: None,
        default_select: Some(""),
        synopsis: "Publish metric datapoints",
    },
];

/// Valid `-Statistic` values.
pub fn statistics() -> &'static [&'static str] {
    STATISTICS
}
