//! Domain DTOs for the todo API.
//!
//! # Design
//! Field names follow the backend's JSON contract exactly (`todo_id`,
//! `description`, `completed`, `created_at`). These types are defined
//! independently from the mock-server crate; integration tests catch any
//! schema drift between the two.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned identifier of a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(pub i64);

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TodoId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TodoId)
    }
}

/// A single todo item returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoItem {
    #[serde(rename = "todo_id")]
    pub id: TodoId,
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Request payload for creating a new todo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTodo {
    pub description: String,
}

/// Request payload for updating an existing todo. Always carries the full
/// resulting object, never a partial one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateTodo {
    pub description: String,
    pub completed: bool,
}

/// Local partial update of a todo. Fields left as `None` keep their current
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn description(text: impl Into<String>) -> Self {
        Self {
            description: Some(text.into()),
            completed: None,
        }
    }

    pub fn completed(flag: bool) -> Self {
        Self {
            description: None,
            completed: Some(flag),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.completed.is_none()
    }

    /// The full object the server should hold once this patch is applied to
    /// `item`.
    pub fn merged(&self, item: &TodoItem) -> UpdateTodo {
        UpdateTodo {
            description: self
                .description
                .clone()
                .unwrap_or_else(|| item.description.clone()),
            completed: self.completed.unwrap_or(item.completed),
        }
    }

    pub fn apply_to(&self, item: &mut TodoItem) {
        if let Some(description) = &self.description {
            item.description.clone_from(description);
        }
        if let Some(completed) = self.completed {
            item.completed = completed;
        }
    }
}

/// Lenient `created_at` codec.
///
/// Accepts RFC 3339 as well as offset-less ISO-8601 timestamps, which are
/// read as UTC. Always writes RFC 3339 with millisecond precision.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp `{raw}`")))
    }
}
