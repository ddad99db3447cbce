//! Normalizers for loosely shaped external records.
//!
//! Each normalizer fills every field with an explicit default so imported
//! data always matches the stored shape.

use super::ids::{
    CLIENT_PREFIX, ENGAGEMENT_PREFIX, INTERACTION_PREFIX, TASK_PREFIX, USER_PREFIX,
    generate_external_id, new_id,
};
use crate::error::{CoreError, CoreResult};
use crate::types::{
    ActionItem, ActionItems, Client, ClientInteraction, Engagement, InteractionStatus,
    InteractionType, Task, TaskStatus, User,
};
use serde_json::Value;
use std::collections::HashSet;

pub const UNTITLED_ENGAGEMENT: &str = "Untitled Engagement";
pub const DEFAULT_TASK_TITLE: &str = "Task";
pub const UNKNOWN_CLIENT: &str = "Unknown Client";
pub const UNKNOWN_CONTACT: &str = "Unknown Contact";

/// First non-empty string among `keys`.
fn text(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn text_or(raw: &Value, keys: &[&str], default: &str) -> String {
    text(raw, keys).unwrap_or_else(|| default.to_string())
}

fn action_items(raw: &Value) -> ActionItems {
    match raw.get("actionItems") {
        Some(Value::String(s)) => ActionItems::Text(s.clone()),
        Some(Value::Array(items)) => ActionItems::Items(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(ActionItem {
                        text: s.clone(),
                        owner: None,
                        due_date: None,
                        status: None,
                    }),
                    other => serde_json::from_value(other.clone()).ok(),
                })
                .collect(),
        ),
        _ => ActionItems::default(),
    }
}

/// Normalize an imported interaction. Never rejects a record.
///
/// Status goes through [`InteractionStatus::from_legacy`]; an unknown
/// interaction type becomes `Meeting`.
pub fn normalize_interaction(raw: &Value, now: &str) -> ClientInteraction {
    let interaction_type = text(raw, &["interactionType", "type"])
        .and_then(|t| InteractionType::parse(&t))
        .unwrap_or(InteractionType::Meeting);
    let status = text(raw, &["status"])
        .map(|s| InteractionStatus::from_legacy(&s))
        .unwrap_or(InteractionStatus::Scheduled);

    ClientInteraction {
        id: text(raw, &["id"]).unwrap_or_else(|| new_id(INTERACTION_PREFIX)),
        client_name: text_or(raw, &["clientName"], UNKNOWN_CLIENT),
        contact_person: text_or(raw, &["contactPerson"], UNKNOWN_CONTACT),
        interaction_type,
        date: text_or(raw, &["date"], now),
        notes: text_or(raw, &["notes"], ""),
        action_items: action_items(raw),
        status,
        created_at: text_or(raw, &["createdAt"], now),
        owner_user_id: text(raw, &["ownerUserId", "appId"]),
    }
}

/// Normalize an imported engagement and its embedded tasks.
///
/// A record without a client name is rejected. Duplicate task ids are
/// replaced and reported in the returned warnings.
pub fn normalize_engagement(
    raw: &Value,
    index: usize,
    now: &str,
) -> CoreResult<(Engagement, Vec<String>)> {
    let client_name = text(raw, &["clientName", "client"]).ok_or_else(|| {
        CoreError::missing_field("clientName")
            .with_details(format!("engagement record {} has no client name", index))
    })?;

    let id = text(raw, &["id"]).unwrap_or_else(|| new_id(ENGAGEMENT_PREFIX));
    let mut warnings = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut tasks = Vec::new();

    if let Some(Value::Array(raw_tasks)) = raw.get("tasks") {
        for raw_task in raw_tasks {
            let mut task = normalize_task(raw_task, &id, now);
            if !seen.insert(task.id.clone()) {
                let replacement = new_id(TASK_PREFIX);
                warnings.push(format!(
                    "Engagement {}: duplicate task id {} replaced with {}",
                    id, task.id, replacement
                ));
                task.id = replacement.clone();
                seen.insert(replacement);
            }
            tasks.push(task);
        }
    }

    let engagement = Engagement {
        name: text_or(raw, &["name", "title"], UNTITLED_ENGAGEMENT),
        client_name,
        description: text_or(raw, &["description", "notes"], ""),
        created_at: text_or(raw, &["createdAt"], now),
        tasks,
        owner_user_id: text(raw, &["ownerUserId", "appId"]),
        id,
    };
    Ok((engagement, warnings))
}

fn normalize_task(raw: &Value, engagement_id: &str, now: &str) -> Task {
    Task {
        id: text(raw, &["id"]).unwrap_or_else(|| new_id(TASK_PREFIX)),
        engagement_id: engagement_id.to_string(),
        title: text_or(raw, &["title"], DEFAULT_TASK_TITLE),
        description: text_or(raw, &["description", "notes"], ""),
        due_date: text_or(raw, &["dueDate"], ""),
        status: text(raw, &["status"])
            .and_then(|s| TaskStatus::parse(&s))
            .unwrap_or(TaskStatus::NotStarted),
        created_at: text_or(raw, &["createdAt"], now),
    }
}

/// Normalize an imported client. The name is required.
pub fn normalize_client(raw: &Value, index: usize, now: &str) -> CoreResult<Client> {
    let name = text(raw, &["name"]).ok_or_else(|| {
        CoreError::missing_field("name").with_details(format!("client record {} has no name", index))
    })?;
    let created_at = text_or(raw, &["createdAt"], now);
    Ok(Client {
        id: text(raw, &["id"]).unwrap_or_else(|| new_id(CLIENT_PREFIX)),
        name,
        primary_contact: text(raw, &["primaryContact", "contact"]),
        notes: text(raw, &["notes"]),
        updated_at: text(raw, &["updatedAt"]).unwrap_or_else(|| created_at.clone()),
        created_at,
    })
}

/// Normalize an imported user, generating an external id when absent.
///
/// `taken` holds the external ids already claimed in this import; a repeat
/// is rejected.
pub fn normalize_user(raw: &Value, now: &str, taken: &mut HashSet<String>) -> CoreResult<User> {
    let external_id = match text(raw, &["externalId"]) {
        Some(existing) => {
            if taken.contains(&existing) {
                return Err(CoreError::duplicate_external_id(&existing));
            }
            existing
        }
        None => {
            let claimed: HashSet<&str> = taken.iter().map(String::as_str).collect();
            generate_external_id(&claimed)?
        }
    };
    taken.insert(external_id.clone());

    Ok(User {
        id: text(raw, &["id"]).unwrap_or_else(|| new_id(USER_PREFIX)),
        first_name: text_or(raw, &["firstName"], ""),
        last_name: text_or(raw, &["lastName"], ""),
        external_id,
        created_at: text_or(raw, &["createdAt"], now),
    })
}
