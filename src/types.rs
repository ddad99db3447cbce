//! Core types for the engagement tracker.
//!
//! Field names serialize in camelCase to stay compatible with collections
//! written by the original dashboard.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Names of the stored collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionName {
    Clients,
    Engagements,
    ClientInteractions,
    Users,
    /// Session-only; never written to the store.
    Reports,
}

impl CollectionName {
    /// Collections that live in the persistent store.
    pub const PERSISTED: [CollectionName; 4] = [
        CollectionName::Clients,
        CollectionName::Engagements,
        CollectionName::ClientInteractions,
        CollectionName::Users,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionName::Clients => "clients",
            CollectionName::Engagements => "engagements",
            CollectionName::ClientInteractions => "client-interactions",
            CollectionName::Users => "users",
            CollectionName::Reports => "reports",
        }
    }

    pub fn is_persisted(&self) -> bool {
        !matches!(self, CollectionName::Reports)
    }

    /// Singular noun used in user-facing messages.
    pub fn record_noun(&self) -> &'static str {
        match self {
            CollectionName::Clients => "client",
            CollectionName::Engagements => "engagement",
            CollectionName::ClientInteractions => "interaction",
            CollectionName::Users => "user",
            CollectionName::Reports => "report",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clients" => Ok(CollectionName::Clients),
            "engagements" => Ok(CollectionName::Engagements),
            "client-interactions" | "interactions" => Ok(CollectionName::ClientInteractions),
            "users" => Ok(CollectionName::Users),
            "reports" => Ok(CollectionName::Reports),
            other => Err(CoreError::unknown_collection(other)),
        }
    }
}

// =============================================================================
// Tasks and engagements
// =============================================================================

/// Task progression. Ordered, but any transition is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Stalled,
    Finished,
    Delivered,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Stalled => "Stalled",
            TaskStatus::Finished => "Finished",
            TaskStatus::Delivered => "Delivered",
        }
    }

    /// Parse a status label. Accepts the canonical labels and their
    /// snake/kebab spellings (`not_started`, `in-progress`).
    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase().replace(['_', '-'], " ");
        match key.as_str() {
            "not started" => Some(TaskStatus::NotStarted),
            "in progress" => Some(TaskStatus::InProgress),
            "stalled" => Some(TaskStatus::Stalled),
            "finished" => Some(TaskStatus::Finished),
            "delivered" => Some(TaskStatus::Delivered),
            _ => None,
        }
    }

    /// Delivered and Finished both count as completed work.
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskStatus::Finished | TaskStatus::Delivered)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work embedded in an engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    /// Back-reference to the owning engagement.
    pub engagement_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: String,
    pub status: TaskStatus,
    pub created_at: String,
}

/// A client project containing an ordered list of tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engagement {
    pub id: String,
    pub name: String,
    pub client_name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default, alias = "appId", skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
}

impl Engagement {
    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }
}

// =============================================================================
// Client interactions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionType {
    Meeting,
    Call,
    Email,
    #[serde(rename = "Follow-up")]
    FollowUp,
    Review,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Meeting => "Meeting",
            InteractionType::Call => "Call",
            InteractionType::Email => "Email",
            InteractionType::FollowUp => "Follow-up",
            InteractionType::Review => "Review",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "meeting" => Some(InteractionType::Meeting),
            "call" => Some(InteractionType::Call),
            "email" | "e-mail" => Some(InteractionType::Email),
            "follow-up" | "followup" => Some(InteractionType::FollowUp),
            "review" => Some(InteractionType::Review),
            _ => None,
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl InteractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionStatus::Scheduled => "Scheduled",
            InteractionStatus::Completed => "Completed",
            InteractionStatus::Cancelled => "Cancelled",
        }
    }

    /// Strict, case-insensitive parse of the canonical values.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" => Some(InteractionStatus::Scheduled),
            "completed" => Some(InteractionStatus::Completed),
            "cancelled" | "canceled" => Some(InteractionStatus::Cancelled),
            _ => None,
        }
    }

    /// Map a status string, including legacy vocabulary, onto the canonical
    /// three values. Unknown input falls back to `Scheduled`.
    pub fn from_legacy(s: &str) -> Self {
        match s {
            "Scheduled" => InteractionStatus::Scheduled,
            "Completed" => InteractionStatus::Completed,
            "Cancelled" => InteractionStatus::Cancelled,
            "Pending" | "In Progress" | "Planned" => InteractionStatus::Scheduled,
            "Finished" | "Done" => InteractionStatus::Completed,
            _ => InteractionStatus::Scheduled,
        }
    }
}

impl fmt::Display for InteractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One follow-up captured during an interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Action items are either free text or a structured list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionItems {
    Text(String),
    Items(Vec<ActionItem>),
}

impl Default for ActionItems {
    fn default() -> Self {
        ActionItems::Text(String::new())
    }
}

/// A logged meeting, call or email with a client contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInteraction {
    pub id: String,
    pub client_name: String,
    pub contact_person: String,
    pub interaction_type: InteractionType,
    pub date: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub action_items: ActionItems,
    pub status: InteractionStatus,
    pub created_at: String,
    #[serde(default, alias = "appId", skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
}

// =============================================================================
// Clients
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Clients keyed by name, in insertion order.
///
/// Persisted as a JSON object keyed by client name. A JSON array of client
/// records is also accepted when reading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientRegistry {
    clients: Vec<Client>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Client> {
        self.clients.iter()
    }

    pub fn as_slice(&self) -> &[Client] {
        &self.clients
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, name: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.name == name)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert a client, replacing any client with the same name in place.
    pub fn insert(&mut self, client: Client) {
        match self.clients.iter_mut().find(|c| c.name == client.name) {
            Some(existing) => *existing = client,
            None => self.clients.push(client),
        }
    }

    /// Remove by name, returning the removed client.
    pub fn remove(&mut self, name: &str) -> Option<Client> {
        let idx = self.clients.iter().position(|c| c.name == name)?;
        Some(self.clients.remove(idx))
    }

    /// Re-key the entry stored under `old_name` with `client`, keeping its
    /// position. Any other entry already named `client.name` is dropped.
    pub fn rekey(&mut self, old_name: &str, client: Client) {
        let new_name = client.name.clone();
        if old_name != new_name {
            self.clients.retain(|c| c.name != new_name);
        }
        match self.clients.iter_mut().find(|c| c.name == old_name) {
            Some(existing) => *existing = client,
            None => self.clients.push(client),
        }
    }

    /// Build from a stored JSON value: an object keyed by name, or an array.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        let records: Vec<Value> = match value {
            Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
            Value::Array(items) => items,
            other => {
                return Err(de::Error::invalid_type(
                    de::Unexpected::Other(json_kind(&other)),
                    &"an object or array of clients",
                ));
            }
        };
        let mut registry = ClientRegistry::new();
        for record in records {
            registry.insert(serde_json::from_value(record)?);
        }
        Ok(registry)
    }
}

impl FromIterator<Client> for ClientRegistry {
    fn from_iter<I: IntoIterator<Item = Client>>(iter: I) -> Self {
        let mut registry = ClientRegistry::new();
        for client in iter {
            registry.insert(client);
        }
        registry
    }
}

impl<'a> IntoIterator for &'a ClientRegistry {
    type Item = &'a Client;
    type IntoIter = std::slice::Iter<'a, Client>;

    fn into_iter(self) -> Self::IntoIter {
        self.clients.iter()
    }
}

impl Serialize for ClientRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.clients.len()))?;
        for client in &self.clients {
            map.serialize_entry(&client.name, client)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ClientRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ClientRegistry::from_value(value).map_err(de::Error::custom)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Users
// =============================================================================

/// A team member; scopes engagements and interactions in multi-user setups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Unique, system-generated.
    pub external_id: String,
    pub created_at: String,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// True if a record's owner field refers to this user.
    pub fn owns(&self, owner_user_id: Option<&str>) -> bool {
        owner_user_id.is_some_and(|owner| owner == self.id || owner == self.external_id)
    }
}

// =============================================================================
// Timestamps
// =============================================================================

/// Current time as an ISO-8601 string with millisecond precision.
pub fn now_iso() -> String {
    to_iso(Utc::now())
}

/// Format a timestamp the way collections store it (`2025-01-15T09:30:00.000Z`).
pub fn to_iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp. Accepts RFC 3339, naive date-times (read as
/// UTC) and bare dates (midnight UTC). Returns `None` for anything else.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(name: &str) -> Client {
        Client {
            id: format!("cli-{}", name.to_lowercase()),
            name: name.to_string(),
            primary_contact: None,
            notes: None,
            created_at: "2025-01-01T00:00:00.000Z".to_string(),
            updated_at: "2025-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_task_status_labels() {
        assert_eq!(
            serde_json::to_value(TaskStatus::NotStarted).unwrap(),
            json!("Not Started")
        );
        assert_eq!(TaskStatus::parse("in_progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("Delivered"), Some(TaskStatus::Delivered));
        assert_eq!(TaskStatus::parse("Blocked"), None);
        assert!(TaskStatus::Finished.is_complete());
        assert!(!TaskStatus::Stalled.is_complete());
    }

    #[test]
    fn test_legacy_interaction_status_table() {
        assert_eq!(InteractionStatus::from_legacy("Pending"), InteractionStatus::Scheduled);
        assert_eq!(InteractionStatus::from_legacy("In Progress"), InteractionStatus::Scheduled);
        assert_eq!(InteractionStatus::from_legacy("Planned"), InteractionStatus::Scheduled);
        assert_eq!(InteractionStatus::from_legacy("Done"), InteractionStatus::Completed);
        assert_eq!(InteractionStatus::from_legacy("Finished"), InteractionStatus::Completed);
        assert_eq!(InteractionStatus::from_legacy("Cancelled"), InteractionStatus::Cancelled);
        assert_eq!(InteractionStatus::from_legacy("whatever"), InteractionStatus::Scheduled);

        assert_eq!(InteractionStatus::parse("completed"), Some(InteractionStatus::Completed));
        assert_eq!(InteractionStatus::parse("Done"), None);
    }

    #[test]
    fn test_action_items_accept_text_or_list() {
        let text: ActionItems = serde_json::from_value(json!("send deck")).unwrap();
        assert_eq!(text, ActionItems::Text("send deck".to_string()));

        let list: ActionItems =
            serde_json::from_value(json!([{ "text": "send deck", "owner": "kim" }])).unwrap();
        match list {
            ActionItems::Items(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].owner.as_deref(), Some("kim"));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_owner_accepts_legacy_app_id() {
        let eng: Engagement = serde_json::from_value(json!({
            "id": "eng-1",
            "name": "Rollout",
            "clientName": "Acme",
            "createdAt": "2025-01-01",
            "appId": "u-7"
        }))
        .unwrap();
        assert_eq!(eng.owner_user_id.as_deref(), Some("u-7"));
        assert!(eng.tasks.is_empty());
        assert_eq!(eng.description, "");
    }

    #[test]
    fn test_registry_serializes_as_object_in_insertion_order() {
        let registry: ClientRegistry = vec![client("Zeta"), client("Acme")].into_iter().collect();
        let text = serde_json::to_string(&registry).unwrap();
        let zeta = text.find("\"Zeta\"").unwrap();
        let acme = text.find("\"Acme\"").unwrap();
        assert!(zeta < acme, "insertion order must be preserved: {}", text);

        let back: ClientRegistry = serde_json::from_str(&text).unwrap();
        assert_eq!(back, registry);
    }

    #[test]
    fn test_registry_reads_array_form() {
        let value = json!([
            { "id": "c1", "name": "Acme", "createdAt": "x", "updatedAt": "x" },
            { "id": "c2", "name": "Globex", "createdAt": "x", "updatedAt": "x" }
        ]);
        let registry = ClientRegistry::from_value(value).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("Globex").unwrap().id, "c2");
    }

    #[test]
    fn test_registry_rejects_scalar() {
        assert!(ClientRegistry::from_value(json!(42)).is_err());
    }

    #[test]
    fn test_registry_rekey_keeps_position() {
        let mut registry: ClientRegistry =
            vec![client("Acme"), client("Globex")].into_iter().collect();
        let mut renamed = registry.get("Acme").unwrap().clone();
        renamed.name = "Acme Corp".to_string();
        registry.rekey("Acme", renamed);

        let names: Vec<&str> = registry.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Acme Corp", "Globex"]);
        assert!(!registry.contains("Acme"));
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2025-03-01T10:00:00.000Z").is_some());
        assert!(parse_timestamp("2025-03-01T10:00:00+02:00").is_some());
        assert!(parse_timestamp("2025-03-01T10:00").is_some());
        assert_eq!(
            parse_timestamp("2025-03-01").map(to_iso).as_deref(),
            Some("2025-03-01T00:00:00.000Z")
        );
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("next tuesday").is_none());
    }

    #[test]
    fn test_collection_name_roundtrip() {
        for name in CollectionName::PERSISTED {
            assert_eq!(name.as_str().parse::<CollectionName>().unwrap(), name);
            assert!(name.is_persisted());
        }
        assert!(!CollectionName::Reports.is_persisted());
        assert!("widgets".parse::<CollectionName>().is_err());
    }
}
