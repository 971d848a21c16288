//! In-memory state behind the emulated services.
//!
//! `Store::seeded` builds the same fixture every time so listings, page
//! boundaries and tokens are reproducible. Mutating operations append to the
//! store; nothing is persisted.
use std::collections::HashMap;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Account id used in every ARN.
pub const ACCOUNT: &str = "123456789012";
/// Region used in every ARN.
pub const REGION: &str = "us-east-1";
/// App instance that owns the seeded channels.
pub const APP_INSTANCE_ARN: &str = "arn:aws:chime:us-east-1:123456789012:app-instance/app-1";
/// User the seeded messages are sent by.
pub const BEARER_ARN: &str =
    "arn:aws:chime:us-east-1:123456789012:app-instance/app-1/user/operator";

/// 2024-01-01T00:00:00Z, the origin of every seeded timestamp.
pub fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default()
}

/// Timestamp text as the services format it.
pub fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Name/value pair qualifying a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    /// Dimension name.
    pub name: String,
    /// Dimension value.
    pub value: String,
}

/// A CloudWatch metric identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Metric {
    /// Namespace, e.g. `AWS/EC2`.
    pub namespace: String,
    /// Metric name.
    pub metric_name: String,
    /// Dimensions.
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
}

/// One published datapoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    /// Metric the value belongs to.
    pub metric: Metric,
    /// Value.
    pub value: f64,
    /// When the value was observed.
    pub timestamp: DateTime<Utc>,
    /// Unit, if published with one.
    pub unit: Option<String>,
}

/// A CloudWatch metric alarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricAlarm {
    pub alarm_name: String,
    pub alarm_arn: String,
    pub state_value: String,
    pub state_reason: String,
    pub namespace: String,
    pub metric_name: String,
    pub threshold: f64,
    pub comparison_operator: String,
    pub alarm_actions: Vec<String>,
}

/// Chime channel summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChannelSummary {
    pub name: String,
    pub channel_arn: String,
    pub mode: String,
    pub privacy: String,
    pub last_message_timestamp: String,
}

/// Identity of a message sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Identity {
    pub arn: String,
    pub name: String,
}

/// Chime channel message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChannelMessage {
    pub message_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(rename = "Type")]
    pub message_type: String,
    pub created_timestamp: String,
    pub sender: Identity,
    pub redacted: bool,
}

/// Greengrass group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupInformation {
    pub arn: String,
    pub creation_timestamp: String,
    pub id: String,
    pub last_updated_timestamp: String,
    pub latest_version: String,
    pub latest_version_arn: String,
    pub name: String,
}

/// Greengrass deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Deployment {
    pub created_at: String,
    pub deployment_arn: String,
    pub deployment_id: String,
    pub deployment_type: String,
    pub group_arn: String,
}

/// Everything the emulated services know.
#[derive(Debug, Clone, Default)]
pub struct Store {
    /// CloudWatch metrics, in listing order.
    pub metrics: Vec<Metric>,
    /// Datapoints published through PutMetricData.
    pub datums: Vec<Datum>,
    /// CloudWatch alarms.
    pub alarms: Vec<MetricAlarm>,
    /// Chime channels with the app instance that owns them.
    pub channels: Vec<(String, ChannelSummary)>,
    /// Chime messages per channel ARN, oldest first.
    pub messages: HashMap<String, Vec<ChannelMessage>>,
    /// Greengrass groups.
    pub groups: Vec<GroupInformation>,
    /// Greengrass deployments per group id.
    pub deployments: HashMap<String, Vec<Deployment>>,
    /// CreateGroup client tokens already used, mapped to the group id.
    pub client_tokens: HashMap<String, String>,
    sequence: u64,
}

impl Store {
    /// The fixture every emulator starts with.
    ///
    /// - 23 metrics over `AWS/EC2`, `AWS/Lambda` and `AWS/SQS`, and 7 alarms;
    /// - 12 channels in `APP_INSTANCE_ARN`; `ch-01` holds 30 messages, the rest 2;
    /// - 9 groups with 4 deployments each.
    pub fn seeded() -> Self {
        let mut store = Store::default();
        store.seed_cloudwatch();
        store.seed_chime();
        store.seed_greengrass();
        store
    }

    /// Next value of a store-wide counter, for generated ids.
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn seed_cloudwatch(&mut self) {
        for instance in 1..=4 {
            for name in ["CPUUtilization", "NetworkIn", "NetworkOut", "DiskReadOps"] {
                self.metrics
                    .push(metric("AWS/EC2", name, "InstanceId", &format!("i-{instance:04}")));
            }
        }
        for function in ["ingest", "resize"] {
            for name in ["Invocations", "Errors", "Duration"] {
                self.metrics.push(metric("AWS/Lambda", name, "FunctionName", function));
            }
        }
        self.metrics
            .push(metric("AWS/SQS", "NumberOfMessagesSent", "QueueName", "jobs"));

        let ops_topic = format!("arn:aws:sns:{REGION}:{ACCOUNT}:ops");
        for instance in 1..=4 {
            let state = if instance == 1 { "ALARM" } else { "OK" };
            self.alarms.push(alarm(
                &format!("cpu-high-i-{instance:04}"),
                state,
                "AWS/EC2",
                "CPUUtilization",
                80.0,
                vec![ops_topic.clone()],
            ));
        }
        for (function, state) in [("ingest", "INSUFFICIENT_DATA"), ("resize", "OK")] {
            self.alarms.push(alarm(
                &format!("lambda-errors-{function}"),
                state,
                "AWS/Lambda",
                "Errors",
                1.0,
                Vec::new(),
            ));
        }
        self.alarms.push(alarm(
            "sqs-backlog",
            "ALARM",
            "AWS/SQS",
            "NumberOfMessagesSent",
            1000.0,
            vec![format!("arn:aws:sns:{REGION}:{ACCOUNT}:pager")],
        ));
    }

    fn seed_chime(&mut self) {
        for n in 1..=12 {
            let arn = format!("{APP_INSTANCE_ARN}/channel/ch-{n:02}");
            let count = if n == 1 { 30 } else { 2 };
            let messages: Vec<ChannelMessage> = (0..count)
                .map(|i| ChannelMessage {
                    message_id: format!("msg-{n:02}-{i:03}"),
                    content: format!("message {i} in ch-{n:02}"),
                    metadata: None,
                    message_type: "STANDARD".into(),
                    created_timestamp: timestamp(
                        epoch() + Duration::minutes(i64::from(n) * 60 + i),
                    ),
                    sender: Identity {
                        arn: BEARER_ARN.into(),
                        name: "operator".into(),
                    },
                    redacted: false,
                })
                .collect();
            let last = messages
                .last()
                .map(|m| m.created_timestamp.clone())
                .unwrap_or_else(|| timestamp(epoch()));
            self.channels.push((
                APP_INSTANCE_ARN.to_string(),
                ChannelSummary {
                    name: format!("ch-{n:02}"),
                    channel_arn: arn.clone(),
                    mode: "RESTRICTED".into(),
                    privacy: if n % 2 == 0 { "PRIVATE" } else { "PUBLIC" }.into(),
                    last_message_timestamp: last,
                },
            ));
            self.messages.insert(arn, messages);
        }
    }

    fn seed_greengrass(&mut self) {
        for n in 1..=9u64 {
            let created = epoch() + Duration::days(n as i64);
            let group = self.new_group(&format!("group-{n}"), n, created);
            let deployments = (1..=4u64)
                .map(|d| {
                    let id = format!("{:08x}-0000-4000-8000-{:012x}", n, d);
                    Deployment {
                        created_at: timestamp(created + Duration::hours(d as i64)),
                        deployment_arn: format!("{}/deployments/{id}", group.arn),
                        deployment_id: id,
                        deployment_type: "NewDeployment".into(),
                        group_arn: group.arn.clone(),
                    }
                })
                .collect();
            self.deployments.insert(group.id.clone(), deployments);
            self.groups.push(group);
        }
    }

    /// Builds (but does not insert) a group with a deterministic id.
    pub fn new_group(&self, name: &str, seed: u64, created: DateTime<Utc>) -> GroupInformation {
        let id = format!("{:08x}-4d1c-4b7e-9a21-{:012x}", seed, seed);
        let arn = format!("arn:aws:greengrass:{REGION}:{ACCOUNT}:/greengrass/groups/{id}");
        let version = format!("{:08x}-0000-4000-8000-000000000001", seed);
        GroupInformation {
            latest_version_arn: format!("{arn}/versions/{version}"),
            arn,
            creation_timestamp: timestamp(created),
            id,
            last_updated_timestamp: timestamp(created),
            latest_version: version,
            name: name.to_string(),
        }
    }
}

fn metric(namespace: &str, name: &str, dimension: &str, value: &str) -> Metric {
    Metric {
        namespace: namespace.into(),
        metric_name: name.into(),
        dimensions: vec![Dimension {
            name: dimension.into(),
            value: value.into(),
        }],
    }
}

fn alarm(
    name: &str,
    state: &str,
    namespace: &str,
    metric_name: &str,
    threshold: f64,
    actions: Vec<String>,
) -> MetricAlarm {
    MetricAlarm {
        alarm_name: name.into(),
        alarm_arn: format!("arn:aws:cloudwatch:{REGION}:{ACCOUNT}:alarm:{name}"),
        state_value: state.into(),
        state_reason: format!("Threshold {threshold} evaluated"),
        namespace: namespace.into(),
        metric_name: metric_name.into(),
        threshold,
        comparison_operator: "GreaterThanThreshold".into(),
        alarm_actions: actions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_sizes_are_stable() {
        let store = Store::seeded();
        assert_eq!(store.metrics.len(), 23);
        assert_eq!(store.alarms.len(), 7);
        assert_eq!(store.channels.len(), 12);
        assert_eq!(store.messages[&format!("{APP_INSTANCE_ARN}/channel/ch-01")].len(), 30);
        assert_eq!(store.groups.len(), 9);
        assert!(store.deployments.values().all(|d| d.len() == 4));
    }

    #[test]
    fn metrics_serialize_with_service_member_names() {
        let store = Store::seeded();
        let json = serde_json::to_value(&store.metrics[0]).unwrap();
        assert_eq!(json["Namespace"], "AWS/EC2");
        assert_eq!(json["Dimensions"][0]["Name"], "InstanceId");
    }
}
