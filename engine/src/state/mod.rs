//! Session state data model
//!
//! Holds the per-session aggregate the assistant accumulates across turns:
//! rider preferences (`UserProfile`), trip facts (`TripSpec`), and the
//! conversation history. The merge operation overlays newly extracted,
//! non-blank fields onto an existing entity; fields the update omits keep
//! their previous values, and a blank value (null, empty string, empty
//! list) counts as "not provided", never as "clear this field".

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::llm::{Message, MessageRole};

/// A merge was rejected because the overlaid fields did not reconstruct a
/// valid entity; the entity keeps its pre-merge value.
#[derive(Debug, thiserror::Error)]
#[error("update rejected: {0}")]
pub struct MergeError(#[from] serde_json::Error);

/// Budget preference
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Budget {
    Low,
    Medium,
    High,
}

/// Travel pace preference
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    Relaxed,
    Moderate,
    FastPaced,
}

/// Accumulated rider preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    /// Budget preference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,

    /// Preferred travel pace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<Pace>,

    /// Interest tags (e.g., "history", "food"); grows append-only
    #[serde(default)]
    pub interests: Vec<String>,
}

impl UserProfile {
    /// Overlay an extracted update onto this profile and return the merged
    /// profile.
    ///
    /// `interests` is append-only: incoming tags never replace the existing
    /// list, they are appended after it, skipping exact duplicates.
    pub fn merged(&self, update: &Map<String, Value>) -> Result<Self, MergeError> {
        let mut update = update.clone();

        if let Some(Value::Array(tags)) = update.get("interests") {
            if !tags.is_empty() {
                let mut combined: Vec<Value> = self
                    .interests
                    .iter()
                    .map(|tag| Value::String(tag.clone()))
                    .collect();
                for tag in tags {
                    if !combined.contains(tag) {
                        combined.push(tag.clone());
                    }
                }
                update.insert("interests".to_string(), Value::Array(combined));
            }
        }

        overlay(self, &update)
    }
}

/// Accumulated trip facts
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TripSpec {
    /// Target destination city/country
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Where the user is traveling from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    /// ISO date or vague time (e.g., "next week")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// ISO date or vague time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    /// Number of days for the trip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<i64>,

    /// Who is traveling (e.g., "solo", "couple", "family")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travelers: Option<String>,
}

impl TripSpec {
    /// Overlay an extracted update onto this spec and return the merged spec.
    pub fn merged(&self, update: &Map<String, Value>) -> Result<Self, MergeError> {
        overlay(self, update)
    }
}

/// A single history entry: one role-tagged message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub role: MessageRole,
    pub content: String,
}

impl HistoryRecord {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Convert into a provider message for prompt assembly
    pub fn to_message(&self) -> Message {
        Message {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Per-session aggregate persisted between turns
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConversationState {
    #[serde(default)]
    pub user_profile: UserProfile,

    #[serde(default)]
    pub trip_spec: TripSpec,

    /// Full conversation history; grows by two records per completed turn
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
}

/// A value the extractor did not actually provide: null, empty string, or
/// empty list. Blank values never overwrite known fields.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

/// Overlay the non-blank fields of `update` onto the serialized form of
/// `current`, then reconstruct the typed entity. Reconstruction failure
/// (e.g. an out-of-range enum value) leaves `current` untouched and
/// surfaces as a `MergeError`.
fn overlay<T>(current: &T, update: &Map<String, Value>) -> Result<T, MergeError>
where
    T: Serialize + DeserializeOwned,
{
    let mut fields = match serde_json::to_value(current)? {
        Value::Object(map) => map,
        // Entities here are always structs, which serialize to objects
        _ => Map::new(),
    };

    for (key, value) in update {
        if is_blank(value) {
            continue;
        }
        fields.insert(key.clone(), value.clone());
    }

    Ok(serde_json::from_value(Value::Object(fields))?)
}
