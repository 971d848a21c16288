//! Emulated Greengrass: ListGroups, ListDeployments, CreateGroup.
use chrono::Utc;
use cmdlet_common::ServiceId;
use serde_json::Value;

use super::{Limits, list_response, optional_str, required_str, to_value, unknown_operation};
use crate::fault::{OperationResult, ServiceFault};
use crate::pagination::{page_of, page_size, request_token};
use crate::store::Store;

pub(crate) fn handle(
    operation: &str,
    payload: &Value,
    store: &mut Store,
    limits: Limits,
) -> OperationResult<Value> {
    match operation {
        "ListGroups" => list_groups(payload, store, limits),
        "ListDeployments" => list_deployments(payload, store, limits),
        "CreateGroup" => create_group(payload, store),
        other => Err(unknown_operation(ServiceId::Greengrass, other)),
    }
}

fn list_groups(payload: &Value, store: &Store, limits: Limits) -> OperationResult<Value> {
    let size = page_size(payload, "MaxResults", limits.default_page_size)?;
    let (page, next) = page_of(&store.groups, request_token(payload, "NextToken"), size)?;
    list_response("Groups", &page, next)
}

fn list_deployments(payload: &Value, store: &Store, limits: Limits) -> OperationResult<Value> {
    let group_id = required_str(payload, "GroupId")?;
    let deployments = store
        .deployments
        .get(group_id)
        .ok_or_else(|| {
            ServiceFault::new("BadRequestException", format!("Group {group_id} does not exist"))
        })?;

    let size = page_size(payload, "MaxResults", limits.default_page_size)?;
    let (page, next) = page_of(deployments, request_token(payload, "NextToken"), size)?;
    list_response("Deployments", &page, next)
}

fn create_group(payload: &Value, store: &mut Store) -> OperationResult<Value> {
    let name = required_str(payload, "Name")?;
    if let Some(tags) = payload.get("tags") {
        if !tags.is_object() && !tags.is_null() {
            return Err(ServiceFault::new("BadRequestException", "tags must be an object"));
        }
    }

    let client_token = optional_str(payload, "AmznClientToken");
    if let Some(existing) = client_token
        .and_then(|token| store.client_tokens.get(token))
        .and_then(|id| store.groups.iter().find(|g| &g.id == id))
    {
        return to_value(existing);
    }

    let seed = 1000 + store.next_sequence();
    let group = store.new_group(name, seed, Utc::now());
    if let Some(token) = client_token {
        store.client_tokens.insert(token.to_string(), group.id.clone());
    }
    store.deployments.insert(group.id.clone(), Vec::new());
    let body = to_value(&group)?;
    store.groups.push(group);
    Ok(body)
}
