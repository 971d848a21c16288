//! Emulated CloudWatch: ListMetrics, DescribeAlarms, GetMetricStatistics, PutMetricData.
use std::hash::{DefaultHasher, Hash, Hasher};

use chrono::{DateTime, TimeDelta, Utc};
use cmdlet_common::ServiceId;
use cmdlet_common::catalog::cloudwatch::statistics;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::{Limits, list_response, optional_str, required_str, unknown_operation};
use crate::fault::{OperationResult, ServiceFault};
use crate::pagination::{page_of, page_size, request_token};
use crate::store::{Datum, Dimension, Metric, Store, timestamp};

/// Most datapoints one GetMetricStatistics call may return.
const MAX_DATAPOINTS: i64 = 1440;
/// Longest accepted period: one year.
const MAX_PERIOD: i64 = 365 * 24 * 3600;
/// Synthetic samples per period for seeded metrics.
const SAMPLES_PER_PERIOD: usize = 5;

pub(crate) fn handle(
    operation: &str,
    payload: &Value,
    store: &mut Store,
    limits: Limits,
) -> OperationResult<Value> {
    match operation {
        "ListMetrics" => list_metrics(payload, store, limits),
        "DescribeAlarms" => describe_alarms(payload, store, limits),
        "GetMetricStatistics" => get_metric_statistics(payload, store),
        "PutMetricData" => put_metric_data(payload, store),
        other => Err(unknown_operation(ServiceId::CloudWatch, other)),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DimensionFilter {
    name: String,
    value: Option<String>,
}

fn dimension_filters(payload: &Value) -> OperationResult<Vec<DimensionFilter>> {
    match payload.get("Dimensions") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| ServiceFault::new("InvalidParameterValue", format!("Dimensions: {e}"))),
    }
}

fn dimensions(payload: &Value) -> OperationResult<Vec<Dimension>> {
    match payload.get("Dimensions") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| ServiceFault::new("InvalidParameterValue", format!("Dimensions: {e}"))),
    }
}

fn list_metrics(payload: &Value, store: &Store, limits: Limits) -> OperationResult<Value> {
    let namespace = optional_str(payload, "Namespace");
    let metric_name = optional_str(payload, "MetricName");
    let filters = dimension_filters(payload)?;

    let matching: Vec<&Metric> = store
        .metrics
        .iter()
        .filter(|m| namespace.is_none_or(|ns| m.namespace == ns))
        .filter(|m| metric_name.is_none_or(|n| m.metric_name == n))
        .filter(|m| {
            filters.iter().all(|f| {
                m.dimensions
                    .iter()
                    .any(|d| d.name == f.name && f.value.as_ref().is_none_or(|v| *v == d.value))
            })
        })
        .collect();

    let (page, next) = page_of(&matching, request_token(payload, "NextToken"), limits.page_size())?;
    list_response("Metrics", &page, next)
}

fn describe_alarms(payload: &Value, store: &Store, limits: Limits) -> OperationResult<Value> {
    let names: Vec<String> = match payload.get("AlarmNames") {
        None | Some(Value::Null) => Vec::new(),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| ServiceFault::validation(format!("AlarmNames: {e}")))?,
    };
    let prefix = optional_str(payload, "AlarmNamePrefix");
    if !names.is_empty() && prefix.is_some() {
        return Err(ServiceFault::new(
            "InvalidParameterCombination",
            "AlarmNames and AlarmNamePrefix cannot be used together",
        ));
    }
    let state = optional_str(payload, "StateValue");
    let action_prefix = optional_str(payload, "ActionPrefix");

    let matching: Vec<_> = store
        .alarms
        .iter()
        .filter(|a| names.is_empty() || names.contains(&a.alarm_name))
        .filter(|a| prefix.is_none_or(|p| a.alarm_name.starts_with(p)))
        .filter(|a| state.is_none_or(|s| a.state_value == s))
        .filter(|a| {
            action_prefix.is_none_or(|p| a.alarm_actions.iter().any(|act| act.starts_with(p)))
        })
        .collect();

    let size = page_size(payload, "MaxRecords", limits.default_page_size)?;
    let (page, next) = page_of(&matching, request_token(payload, "NextToken"), size)?;
    list_response("MetricAlarms", &page, next)
}

fn parse_time(payload: &Value, member: &str) -> OperationResult<DateTime<Utc>> {
    let raw = required_str(payload, member)?;
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| ServiceFault::new("InvalidParameterValue", format!("{member}: {e}")))
}

fn string_list(payload: &Value, member: &str) -> OperationResult<Vec<String>> {
    match payload.get(member) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| ServiceFault::new("InvalidParameterValue", format!("{member}: {e}"))),
    }
}

fn percentile_of(name: &str) -> Option<f64> {
    name.strip_prefix('p')
        .and_then(|p| p.parse::<f64>().ok())
        .filter(|p| (0.0..=100.0).contains(p))
}

fn get_metric_statistics(payload: &Value, store: &Store) -> OperationResult<Value> {
    let namespace = required_str(payload, "Namespace")?;
    let metric_name = required_str(payload, "MetricName")?;
    let dims = dimensions(payload)?;
    let start = parse_time(payload, "StartTime")?;
    let end = parse_time(payload, "EndTime")?;
    if start >= end {
        return Err(ServiceFault::new(
            "InvalidParameterValue",
            "The parameter StartTime must be less than the parameter EndTime.",
        ));
    }
    let period = payload
        .get("Period")
        .and_then(Value::as_i64)
        .ok_or_else(|| ServiceFault::missing("Period"))?;
    if period <= 0 || period % 60 != 0 {
        return Err(ServiceFault::new(
            "InvalidParameterValue",
            "The parameter Period must be a multiple of 60.",
        ));
    }
    if period > MAX_PERIOD {
        return Err(ServiceFault::new(
            "InvalidParameterValue",
            format!("The parameter Period must not exceed {MAX_PERIOD} seconds."),
        ));
    }

    let stats = string_list(payload, "Statistics")?;
    let extended = string_list(payload, "ExtendedStatistics")?;
    if stats.is_empty() && extended.is_empty() {
        return Err(ServiceFault::missing("Statistics"));
    }
    if let Some(bad) = stats.iter().find(|s| !statistics().contains(&s.as_str())) {
        return Err(ServiceFault::new("InvalidParameterValue", format!("Unknown statistic {bad}")));
    }
    if let Some(bad) = extended.iter().find(|s| percentile_of(s).is_none()) {
        return Err(ServiceFault::new(
            "InvalidParameterValue",
            format!("Unknown extended statistic {bad}"),
        ));
    }

    let span = (end - start).num_seconds();
    let buckets = span
        .checked_add(period - 1)
        .map(|n| n / period)
        .ok_or_else(out_of_range)?;
    if buckets > MAX_DATAPOINTS {
        return Err(ServiceFault::new(
            "InvalidParameterCombination",
            format!(
                "You have requested up to {buckets} datapoints, \
                 which exceeds the limit of {MAX_DATAPOINTS}."
            ),
        ));
    }

    let unit = optional_str(payload, "Unit");
    let key = Metric {
        namespace: namespace.to_string(),
        metric_name: metric_name.to_string(),
        dimensions: dims,
    };
    let published: Vec<&Datum> = store
        .datums
        .iter()
        .filter(|d| d.metric == key)
        .filter(|d| unit.is_none_or(|u| d.unit.as_deref() == Some(u)))
        .collect();
    let seeded = published.is_empty() && store.metrics.contains(&key);

    let mut datapoints = Vec::new();
    for bucket in 0..buckets {
        let from = bucket_start(start, bucket, period)?;
        let to = bucket_start(start, bucket + 1, period)?;
        let samples: Vec<f64> = if seeded {
            synthetic_samples(&key, from)
        } else {
            published
                .iter()
                .filter(|d| d.timestamp >= from && d.timestamp < to)
                .map(|d| d.value)
                .collect()
        };
        if samples.is_empty() {
            continue;
        }
        datapoints.push(datapoint(from, &samples, &stats, &extended, unit.unwrap_or("None")));
    }

    Ok(json!({"Label": metric_name, "Datapoints": datapoints}))
}

fn out_of_range() -> ServiceFault {
    ServiceFault::new("InvalidParameterValue", "The requested time range is out of bounds.")
}

/// Start of the `bucket`-th period after `start`.
fn bucket_start(start: DateTime<Utc>, bucket: i64, period: i64) -> OperationResult<DateTime<Utc>> {
    bucket
        .checked_mul(period)
        .and_then(TimeDelta::try_seconds)
        .and_then(|offset| start.checked_add_signed(offset))
        .ok_or_else(out_of_range)
}

/// Deterministic samples for a seeded metric in the period starting at `from`.
fn synthetic_samples(metric: &Metric, from: DateTime<Utc>) -> Vec<f64> {
    let mut hasher = DefaultHasher::new();
    metric.namespace.hash(&mut hasher);
    metric.metric_name.hash(&mut hasher);
    for d in &metric.dimensions {
        d.name.hash(&mut hasher);
        d.value.hash(&mut hasher);
    }
    from.timestamp().hash(&mut hasher);
    let mut rng = StdRng::seed_from_u64(hasher.finish());
    (0..SAMPLES_PER_PERIOD).map(|_| rng.random_range(0.0..100.0)).collect()
}

fn datapoint(
    from: DateTime<Utc>,
    samples: &[f64],
    stats: &[String],
    extended: &[String],
    unit: &str,
) -> Value {
    let mut point = Map::new();
    point.insert("Timestamp".into(), Value::String(timestamp(from)));
    point.insert("Unit".into(), Value::String(unit.to_string()));

    let count = samples.len() as f64;
    let sum: f64 = samples.iter().sum();
    for stat in stats {
        let value = match stat.as_str() {
            "SampleCount" => count,
            "Sum" => sum,
            "Average" => sum / count,
            "Minimum" => samples.iter().copied().fold(f64::INFINITY, f64::min),
            "Maximum" => samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            _ => continue,
        };
        point.insert(stat.clone(), json!(value));
    }

    if !extended.is_empty() {
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mut percentiles = Map::new();
        for name in extended {
            if let Some(p) = percentile_of(name) {
                let rank = ((p / 100.0) * sorted.len() as f64).ceil().max(1.0) as usize;
                percentiles.insert(name.clone(), json!(sorted[rank.min(sorted.len()) - 1]));
            }
        }
        point.insert("ExtendedStatistics".into(), Value::Object(percentiles));
    }
    Value::Object(point)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MetricDatum {
    metric_name: String,
    #[serde(default)]
    dimensions: Vec<Dimension>,
    value: f64,
    timestamp: Option<DateTime<Utc>>,
    unit: Option<String>,
}

fn put_metric_data(payload: &Value, store: &mut Store) -> OperationResult<Value> {
    let namespace = required_str(payload, "Namespace")?;
    if namespace.starts_with("AWS/") {
        return Err(ServiceFault::new(
            "InvalidParameterValue",
            format!("The value {namespace} for parameter Namespace is invalid."),
        ));
    }
    let data: Vec<MetricDatum> = match payload.get("MetricData") {
        None | Some(Value::Null) => return Err(ServiceFault::missing("MetricData")),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| ServiceFault::new("InvalidParameterValue", format!("MetricData: {e}")))?,
    };
    if data.is_empty() || data.len() > 1000 {
        return Err(ServiceFault::new(
            "InvalidParameterValue",
            "MetricData must contain between 1 and 1000 items",
        ));
    }

    let now = Utc::now();
    for datum in data {
        let metric = Metric {
            namespace: namespace.to_string(),
            metric_name: datum.metric_name,
            dimensions: datum.dimensions,
        };
        if !store.metrics.contains(&metric) {
            store.metrics.push(metric.clone());
        }
        store.datums.push(Datum {
            metric,
            value: datum.value,
            timestamp: datum.timestamp.unwrap_or(now),
            unit: datum.unit,
        });
    }
    Ok(json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> Limits {
        Limits::new(10)
    }

    #[test]
    fn list_metrics_filters_and_pages() {
        let mut store = Store::seeded();
        let first =
            handle("ListMetrics", &json!({"Namespace": "AWS/EC2"}), &mut store, limits()).unwrap();
        assert_eq!(first["Metrics"].as_array().unwrap().len(), 10);
        let token = first["NextToken"].as_str().unwrap().to_string();

        let payload = json!({"Namespace": "AWS/EC2", "NextToken": token});
        let second = handle("ListMetrics", &payload, &mut store, limits()).unwrap();
        assert_eq!(second["Metrics"].as_array().unwrap().len(), 6);
        assert!(second.get("NextToken").is_none());

        let cpu_one = handle(
            "ListMetrics",
            &json!({"Dimensions": [{"Name": "InstanceId", "Value": "i-0001"}]}),
            &mut store,
            limits(),
        )
        .unwrap();
        assert_eq!(cpu_one["Metrics"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn describe_alarms_rejects_names_with_prefix() {
        let mut store = Store::seeded();
        let err = handle(
            "DescribeAlarms",
            &json!({"AlarmNames": ["sqs-backlog"], "AlarmNamePrefix": "cpu"}),
            &mut store,
            limits(),
        )
        .unwrap_err();
        assert_eq!(err.code, "InvalidParameterCombination");

        let payload = json!({"StateValue": "ALARM"});
        let alarming = handle("DescribeAlarms", &payload, &mut store, limits()).unwrap();
        assert_eq!(alarming["MetricAlarms"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn statistics_for_a_seeded_metric_are_deterministic() {
        let mut store = Store::seeded();
        let request = json!({
            "Namespace": "AWS/EC2",
            "MetricName": "CPUUtilization",
            "Dimensions": [{"Name": "InstanceId", "Value": "i-0002"}],
            "StartTime": "2024-01-01T00:00:00Z",
            "EndTime": "2024-01-01T03:00:00Z",
            "Period": 3600,
            "Statistics": ["Average", "Maximum"],
            "ExtendedStatistics": ["p90"]
        });
        let a = handle("GetMetricStatistics", &request, &mut store, limits()).unwrap();
        let b = handle("GetMetricStatistics", &request, &mut store, limits()).unwrap();
        assert_eq!(a, b);

        let points = a["Datapoints"].as_array().unwrap();
        assert_eq!(points.len(), 3);
        assert!(points[0]["Maximum"].as_f64().unwrap() >= points[0]["Average"].as_f64().unwrap());
        assert!(points[0]["ExtendedStatistics"]["p90"].is_number());
    }

    #[test]
    fn statistics_validate_period_and_range() {
        let mut store = Store::seeded();
        let mut request = json!({
            "Namespace": "AWS/EC2",
            "MetricName": "CPUUtilization",
            "StartTime": "2024-01-02T00:00:00Z",
            "EndTime": "2024-01-01T00:00:00Z",
            "Period": 60,
            "Statistics": ["Sum"]
        });
        let err = handle("GetMetricStatistics", &request, &mut store, limits()).unwrap_err();
        assert_eq!(err.code, "InvalidParameterValue");

        request["StartTime"] = json!("2023-12-01T00:00:00Z");
        let err = handle("GetMetricStatistics", &request, &mut store, limits()).unwrap_err();
        assert_eq!(err.code, "InvalidParameterCombination");

        request["Period"] = json!(90);
        let err = handle("GetMetricStatistics", &request, &mut store, limits()).unwrap_err();
        assert_eq!(err.code, "InvalidParameterValue");
    }

    #[test]
    fn statistics_reject_oversized_periods_and_ranges() {
        let mut store = Store::seeded();
        let mut request = json!({
            "Namespace": "AWS/EC2",
            "MetricName": "CPUUtilization",
            "StartTime": "2024-01-01T00:00:00Z",
            "EndTime": "2024-01-02T00:00:00Z",
            "Period": 6_000_000_000_000_000_000i64,
            "Statistics": ["Sum"]
        });
        let err = handle("GetMetricStatistics", &request, &mut store, limits()).unwrap_err();
        assert_eq!(err.code, "InvalidParameterValue");

        request["StartTime"] = json!("0001-01-01T00:00:00Z");
        request["EndTime"] = json!("9999-12-31T23:59:00Z");
        request["Period"] = json!(MAX_PERIOD);
        let err = handle("GetMetricStatistics", &request, &mut store, limits()).unwrap_err();
        assert_eq!(err.code, "InvalidParameterCombination");
    }

    #[test]
    fn published_data_is_listed_and_aggregated() {
        let mut store = Store::seeded();
        let put = json!({
            "Namespace": "Custom/App",
            "MetricData": [
                {
                    "MetricName": "Latency",
                    "Value": 10.0,
                    "Timestamp": "2024-03-01T00:00:10Z",
                    "Unit": "Milliseconds"
                },
                {
                    "MetricName": "Latency",
                    "Value": 30.0,
                    "Timestamp": "2024-03-01T00:00:20Z",
                    "Unit": "Milliseconds"
                }
            ]
        });
        handle("PutMetricData", &put, &mut store, limits()).unwrap();

        let payload = json!({"Namespace": "Custom/App"});
        let listed = handle("ListMetrics", &payload, &mut store, limits()).unwrap();
        assert_eq!(listed["Metrics"].as_array().unwrap().len(), 1);

        let stats = handle(
            "GetMetricStatistics",
            &json!({
                "Namespace": "Custom/App",
                "MetricName": "Latency",
                "StartTime": "2024-03-01T00:00:00Z",
                "EndTime": "2024-03-01T00:01:00Z",
                "Period": 60,
                "Statistics": ["Average", "SampleCount"]
            }),
            &mut store,
            limits(),
        )
        .unwrap();
        assert_eq!(stats["Datapoints"][0]["Average"], json!(20.0));
        assert_eq!(stats["Datapoints"][0]["SampleCount"], json!(2.0));
    }

    #[test]
    fn aws_namespaces_are_reserved() {
        let mut store = Store::seeded();
        let err = handle(
            "PutMetricData",
            &json!({"Namespace": "AWS/EC2", "MetricData": [{"MetricName": "X", "Value": 1.0}]}),
            &mut store,
            limits(),
        )
        .unwrap_err();
        assert_eq!(err.code, "InvalidParameterValue");
    }
}
