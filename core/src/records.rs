use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Current UTC time as RFC 3339 with millisecond precision (`2024-05-01T09:30:00.000Z`).
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Tool arguments exactly as the agent sent them, in the agent's key order.
///
/// The tool schema is advisory, so stored records keep every argument
/// verbatim: unknown keys, explicit `null`s and values of unexpected JSON
/// types included.
pub type ToolArguments = Map<String, Value>;

/// A stored user profile. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(flatten)]
    pub fields: ToolArguments,
    #[serde(rename = "savedAt")]
    pub saved_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    #[serde(flatten)]
    pub fields: ToolArguments,
    #[serde(rename = "savedAt")]
    pub saved_at: String,
}

/// A stored task.
///
/// `id` is the task count at creation time plus one. It is unique only because
/// tasks are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    #[serde(flatten)]
    pub fields: ToolArguments,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Which collections a `search_memory` call consults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    #[default]
    All,
    Users,
    Preferences,
    Tasks,
}

impl SearchScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Users => "users",
            Self::Preferences => "preferences",
            Self::Tasks => "tasks",
        }
    }

    pub fn includes_users(&self) -> bool {
        matches!(self, Self::All | Self::Users)
    }

    pub fn includes_preferences(&self) -> bool {
        matches!(self, Self::All | Self::Preferences)
    }

    pub fn includes_tasks(&self) -> bool {
        matches!(self, Self::All | Self::Tasks)
    }
}

impl std::fmt::Display for SearchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SearchScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "users" => Ok(Self::Users),
            "preferences" => Ok(Self::Preferences),
            "tasks" => Ok(Self::Tasks),
            _ => Err(format!(
                "unknown search type: {s} (expected one of all, users, preferences, tasks)"
            )),
        }
    }
}

/// A search hit. Serialized untagged so results read exactly like the stored records.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MemoryRecord {
    Profile(Profile),
    Preference(Preference),
    Task(Task),
}

/// Full copy of the store, exposed for operator inspection.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct MemorySnapshot {
    #[schema(value_type = Vec<Object>)]
    pub users: Vec<Profile>,
    #[schema(value_type = Vec<Object>)]
    pub preferences: Vec<Preference>,
    #[schema(value_type = Vec<Object>)]
    pub tasks: Vec<Task>,
}

/// Collection sizes, for status endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct MemoryCounts {
    pub users: usize,
    pub preferences: usize,
    pub tasks: usize,
}
