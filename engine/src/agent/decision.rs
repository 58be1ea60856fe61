//! Classification result
//!
//! The structured completion that starts a turn returns a loose JSON
//! object. This module turns it into a typed `Decision` without ever
//! failing: a missing field, an unrecognized enum string, or a wrongly
//! shaped sub-object is simply "no signal", and the all-empty sentinel maps
//! to the all-`None` decision.

use serde_json::{json, Map, Value};
use std::str::FromStr;

/// Closed set of things a message can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    PlanTrip,
    Packing,
    Attractions,
    Chat,
}

impl FromStr for Intent {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plan_trip" => Ok(Intent::PlanTrip),
            "packing" => Ok(Intent::Packing),
            "attractions" => Ok(Intent::Attractions),
            "chat" => Ok(Intent::Chat),
            _ => Err(()),
        }
    }
}

/// Closed set of tools the classifier may request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    Weather,
    NoTool,
}

impl FromStr for ToolChoice {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weather" => Ok(ToolChoice::Weather),
            "none" => Ok(ToolChoice::NoTool),
            _ => Err(()),
        }
    }
}

/// Field-level update fragments extracted from the latest message.
///
/// Kept as raw field maps: the merge step filters blank values and
/// validates by reconstructing the typed entity, so invalid fragments must
/// survive parsing to be rejected there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedUpdates {
    pub trip_spec: Option<Map<String, Value>>,
    pub user_profile: Option<Map<String, Value>>,
}

/// Ephemeral per-turn classification output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decision {
    pub intent: Option<Intent>,
    pub tool_call: Option<ToolChoice>,
    pub extracted_updates: Option<ExtractedUpdates>,
    /// Advisory only; never used programmatically
    pub reasoning: Option<String>,
}

impl Decision {
    /// Parse a decision from the provider's loose field map.
    ///
    /// Anything unusable degrades to `None` rather than erroring; the empty
    /// sentinel map yields the default all-`None` decision.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let intent = fields
            .get("intent")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok());

        let tool_call = fields
            .get("tool_call")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok());

        let reasoning = fields
            .get("reasoning")
            .and_then(Value::as_str)
            .map(str::to_owned);

        let extracted_updates = fields
            .get("extracted_updates")
            .and_then(Value::as_object)
            .map(|updates| ExtractedUpdates {
                trip_spec: updates
                    .get("trip_spec")
                    .and_then(Value::as_object)
                    .cloned(),
                user_profile: updates
                    .get("user_profile")
                    .and_then(Value::as_object)
                    .cloned(),
            });

        Self {
            intent,
            tool_call,
            extracted_updates,
            reasoning,
        }
    }
}

/// JSON schema for the classification result, sent with every structured
/// completion.
pub fn classification_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "intent": {
                "type": "string",
                "enum": ["plan_trip", "packing", "attractions", "chat"],
            },
            "extracted_updates": {
                "type": "object",
                "properties": {
                    "trip_spec": { "type": "object" },
                    "user_profile": { "type": "object" },
                },
            },
            "tool_call": { "type": "string", "enum": ["weather", "none"] },
            "reasoning": { "type": "string" },
        },
        "required": ["intent", "tool_call", "reasoning"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_parse_full_decision() {
        let decision = Decision::from_fields(&fields(json!({
            "intent": "plan_trip",
            "tool_call": "weather",
            "reasoning": "user asked about weather",
            "extracted_updates": {
                "trip_spec": { "destination": "London" },
                "user_profile": { "budget": "low" },
            },
        })));

        assert_eq!(decision.intent, Some(Intent::PlanTrip));
        assert_eq!(decision.tool_call, Some(ToolChoice::Weather));
        assert_eq!(decision.reasoning.as_deref(), Some("user asked about weather"));

        let updates = decision.extracted_updates.unwrap();
        assert_eq!(
            updates.trip_spec.unwrap().get("destination"),
            Some(&json!("London"))
        );
        assert_eq!(updates.user_profile.unwrap().get("budget"), Some(&json!("low")));
    }

    #[test]
    fn test_empty_sentinel_is_all_none() {
        let decision = Decision::from_fields(&Map::new());
        assert_eq!(decision, Decision::default());
    }

    #[test]
    fn test_unrecognized_enums_are_no_signal() {
        let decision = Decision::from_fields(&fields(json!({
            "intent": "book_flight",
            "tool_call": "crystal_ball",
            "reasoning": "?",
        })));

        assert_eq!(decision.intent, None);
        assert_eq!(decision.tool_call, None);
    }

    #[test]
    fn test_non_string_enum_values_are_no_signal() {
        let decision = Decision::from_fields(&fields(json!({
            "intent": 3,
            "tool_call": ["weather"],
        })));

        assert_eq!(decision.intent, None);
        assert_eq!(decision.tool_call, None);
    }

    #[test]
    fn test_non_object_updates_are_dropped() {
        let decision = Decision::from_fields(&fields(json!({
            "intent": "chat",
            "tool_call": "none",
            "extracted_updates": {
                "trip_spec": "London",
                "user_profile": { "pace": "relaxed" },
            },
        })));

        let updates = decision.extracted_updates.unwrap();
        assert_eq!(updates.trip_spec, None);
        assert!(updates.user_profile.is_some());
    }

    #[test]
    fn test_missing_updates_field() {
        let decision = Decision::from_fields(&fields(json!({
            "intent": "chat",
            "tool_call": "none",
            "reasoning": "greeting",
        })));

        assert_eq!(decision.extracted_updates, None);
    }

    #[test]
    fn test_schema_names_required_fields() {
        let schema = classification_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();

        assert_eq!(required, vec!["intent", "tool_call", "reasoning"]);
    }

    #[test]
    fn test_tool_choice_none_parses() {
        assert_eq!("none".parse(), Ok(ToolChoice::NoTool));
        assert_eq!("weather".parse(), Ok(ToolChoice::Weather));
    }
}
