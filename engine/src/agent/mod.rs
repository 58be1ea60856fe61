//! Turn orchestration
//!
//! The agent module owns the per-turn pipeline: classify the latest user
//! message, merge extracted updates into session state, conditionally run
//! the weather lookup, synthesize a reply, and persist the session.

pub mod core;
pub mod decision;

pub use core::{AgentCore, MergeTarget, TurnError, TurnEvent, TurnOutcome};
pub use decision::{classification_schema, Decision, ExtractedUpdates, Intent, ToolChoice};
