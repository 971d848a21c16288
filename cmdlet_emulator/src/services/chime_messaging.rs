//! Emulated Chime SDK Messaging: ListChannels, ListChannelMessages, SendChannelMessage.
use chrono::{DateTime, Utc};
use cmdlet_common::ServiceId;
use serde_json::{Value, json};

use super::{Limits, list_response, optional_str, required_str, unknown_operation};
use crate::fault::{OperationResult, ServiceFault};
use crate::pagination::{page_of, page_size, request_token};
use crate::store::{ChannelMessage, Identity, Store, timestamp};

pub(crate) fn handle(
    operation: &str,
    payload: &Value,
    store: &mut Store,
    limits: Limits,
) -> OperationResult<Value> {
    match operation {
        "ListChannels" => list_channels(payload, store, limits),
        "ListChannelMessages" => list_channel_messages(payload, store, limits),
        "SendChannelMessage" => send_channel_message(payload, store),
        other => Err(unknown_operation(ServiceId::ChimeSdkMessaging, other)),
    }
}

fn bad_request(message: impl Into<String>) -> ServiceFault {
    ServiceFault::new("BadRequestException", message)
}

fn channel_not_found(channel_arn: &str) -> ServiceFault {
    ServiceFault::new("NotFoundException", format!("Channel {channel_arn} not found"))
}

fn one_of(payload: &Value, member: &str, allowed: &[&str]) -> OperationResult<Option<String>> {
    match optional_str(payload, member) {
        None => Ok(None),
        Some(v) if allowed.contains(&v) => Ok(Some(v.to_string())),
        Some(v) => Err(bad_request(format!(
            "{member} must be one of {}, got {v}",
            allowed.join(", ")
        ))),
    }
}

fn list_channels(payload: &Value, store: &Store, limits: Limits) -> OperationResult<Value> {
    let app_instance = required_str(payload, "AppInstanceArn")?;
    required_str(payload, "ChimeBearer")?;
    let privacy = one_of(payload, "Privacy", &["PUBLIC", "PRIVATE"])?;

    let matching: Vec<_> = store
        .channels
        .iter()
        .filter(|(owner, _)| owner == app_instance)
        .map(|(_, channel)| channel)
        .filter(|c| privacy.as_ref().is_none_or(|p| c.privacy == *p))
        .collect();

    let size = page_size(payload, "MaxResults", limits.default_page_size)?;
    let (page, next) = page_of(&matching, request_token(payload, "NextToken"), size)?;
    list_response("Channels", &page, next)
}

fn time_bound(payload: &Value, member: &str) -> OperationResult<Option<DateTime<Utc>>> {
    optional_str(payload, member)
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| bad_request(format!("{member}: {e}")))
        })
        .transpose()
}

fn list_channel_messages(payload: &Value, store: &Store, limits: Limits) -> OperationResult<Value> {
    let channel_arn = required_str(payload, "ChannelArn")?;
    required_str(payload, "ChimeBearer")?;
    let order = one_of(payload, "SortOrder", &["ASCENDING", "DESCENDING"])?;
    let not_before = time_bound(payload, "NotBefore")?;
    let not_after = time_bound(payload, "NotAfter")?;

    let messages = store
        .messages
        .get(channel_arn)
        .ok_or_else(|| channel_not_found(channel_arn))?;

    let mut matching: Vec<&ChannelMessage> = messages
        .iter()
        .filter(|m| {
            let created = DateTime::parse_from_rfc3339(&m.created_timestamp)
                .map(|ts| ts.with_timezone(&Utc))
                .ok();
            not_before.is_none_or(|nb| created.is_some_and(|c| c >= nb))
                && not_after.is_none_or(|na| created.is_some_and(|c| c <= na))
        })
        .collect();
    if order.as_deref() != Some("ASCENDING") {
        matching.reverse();
    }

    let size = page_size(payload, "MaxResults", limits.default_page_size)?;
    let (page, next) = page_of(&matching, request_token(payload, "NextToken"), size)?;
    let mut body = list_response("ChannelMessages", &page, next)?;
    body["ChannelArn"] = Value::String(channel_arn.to_string());
    Ok(body)
}

fn send_channel_message(payload: &Value, store: &mut Store) -> OperationResult<Value> {
    let channel_arn = required_str(payload, "ChannelArn")?.to_string();
    let content = required_str(payload, "Content")?.to_string();
    let bearer = required_str(payload, "ChimeBearer")?.to_string();
    let message_type = one_of(payload, "Type", &["STANDARD", "CONTROL"])?
        .ok_or_else(|| ServiceFault::missing("Type"))?;
    one_of(payload, "Persistence", &["PERSISTENT", "NON_PERSISTENT"])?
        .ok_or_else(|| ServiceFault::missing("Persistence"))?;
    let metadata = optional_str(payload, "Metadata").map(str::to_string);

    if !store.messages.contains_key(&channel_arn) {
        return Err(channel_not_found(&channel_arn));
    }
    let message_id = format!("msg-sent-{:06}", store.next_sequence());
    let created = timestamp(Utc::now());
    let sender_name = bearer.rsplit('/').next().unwrap_or(bearer.as_str()).to_string();

    if let Some(messages) = store.messages.get_mut(&channel_arn) {
        messages.push(ChannelMessage {
            message_id: message_id.clone(),
            content,
            metadata,
            message_type,
            created_timestamp: created.clone(),
            sender: Identity {
                arn: bearer.clone(),
                name: sender_name,
            },
            redacted: false,
        });
    }
    if let Some((_, channel)) = store
        .channels
        .iter_mut()
        .find(|(_, c)| c.channel_arn == channel_arn)
    {
        channel.last_message_timestamp = created;
    }

    Ok(json!({
        "ChannelArn": channel_arn,
        "MessageId": message_id,
        "Status": {"Value": "SENT"}
    }))
}
