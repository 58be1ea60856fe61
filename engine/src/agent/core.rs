//! Agent Core
//!
//! This module implements the turn orchestrator. Each call to
//! `process_turn` drives exactly one conversational turn through a fixed
//! sequence:
//!
//! 1. Load session state (unknown ids start empty), append the user message
//! 2. Classify the message with a structured completion
//! 3. Merge extracted updates into the trip spec and user profile
//! 4. Dispatch the weather lookup when (and only when) it was requested
//! 5. Synthesize the reply with a free-form completion over a bounded
//!    history window
//! 6. Append the reply and persist the session
//!
//! Only provider transport failures and store failures abort a turn, and
//! both do so before anything is persisted. Everything else (unusable
//! classifier output, rejected merges, unresolvable destinations) degrades
//! gracefully and is surfaced as a `TurnEvent` next to the reply.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::db::SessionStore;
use crate::llm::{ChatProvider, LLMError, Message};
use crate::prompts;
use crate::state::{ConversationState, HistoryRecord};
use crate::tools::LookupTool;

use super::decision::{classification_schema, Decision, ToolChoice};

/// Notice substituted for tool output when the destination is unknown
pub const DESTINATION_UNKNOWN_NOTICE: &str =
    "System: Destination unknown, cannot fetch weather.";

/// Errors that abort a turn
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// The language model transport failed outright
    #[error("provider failure: {0}")]
    Provider(#[from] LLMError),

    /// The session store failed to load or save
    #[error("session store failure: {0}")]
    Store(anyhow::Error),
}

/// Which entity a rejected merge targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeTarget {
    TripSpec,
    UserProfile,
}

/// Non-fatal conditions observed during a turn
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// The structured completion returned the empty sentinel
    ClassificationDegraded,

    /// An extracted update failed validation; the entity kept its prior value
    MergeRejected { target: MergeTarget },

    /// Weather was requested but no destination is known
    ToolSkipped,

    /// The destination could not be resolved to coordinates
    ToolUnresolved { destination: String },
}

/// Result of a completed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The assistant's reply
    pub reply: String,

    /// Non-fatal events observed while producing it
    pub events: Vec<TurnEvent>,
}

/// Turn orchestrator over injected provider, store, and lookup tool
pub struct AgentCore {
    provider: Arc<dyn ChatProvider>,
    store: Arc<dyn SessionStore>,
    lookup: Arc<dyn LookupTool>,

    /// Trailing history records (not turns) included in the response prompt
    context_window: usize,
}

impl AgentCore {
    /// Create a new agent core
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        store: Arc<dyn SessionStore>,
        lookup: Arc<dyn LookupTool>,
        context_window: usize,
    ) -> Self {
        Self {
            provider,
            store,
            lookup,
            context_window,
        }
    }

    /// Process one conversational turn for a session.
    ///
    /// Appends exactly one user and one assistant record to the session
    /// history on success; a failed turn persists nothing.
    pub async fn process_turn(
        &self,
        session_id: &str,
        user_text: &str,
    ) -> Result<TurnOutcome, TurnError> {
        info!(session_id, "Turn started");
        let mut events = Vec::new();

        // Load
        let mut state = self
            .store
            .load(session_id)
            .await
            .map_err(TurnError::Store)?;
        state.history.push(HistoryRecord::user(user_text));

        // Classify
        let decision = self.classify(&state, user_text, &mut events).await;
        info!(
            session_id,
            intent = ?decision.intent,
            tool = ?decision.tool_call,
            "Turn classified"
        );

        // Merge
        apply_updates(&mut state, &decision, &mut events);

        // Tool dispatch
        let tool_output = self.dispatch_tool(&state, &decision, &mut events).await;

        // Respond
        let reply = self.synthesize(&state, &tool_output).await?;

        // Persist
        state.history.push(HistoryRecord::assistant(&reply));
        self.store
            .save(session_id, &state)
            .await
            .map_err(TurnError::Store)?;

        info!(session_id, events = events.len(), "Turn completed");
        Ok(TurnOutcome { reply, events })
    }

    /// Run the structured classification completion.
    ///
    /// Classification failure is non-fatal: the empty sentinel degrades to
    /// the all-`None` decision and the turn proceeds without a tool call or
    /// updates.
    async fn classify(
        &self,
        state: &ConversationState,
        user_text: &str,
        events: &mut Vec<TurnEvent>,
    ) -> Decision {
        let messages = [
            Message::system(prompts::classifier_prompt(
                &state.user_profile,
                &state.trip_spec,
            )),
            Message::user(format!("User's latest message: {}", user_text)),
        ];

        let fields = self
            .provider
            .complete_json(&messages, &classification_schema())
            .await;

        if fields.is_empty() {
            warn!("Classification produced no usable output");
            events.push(TurnEvent::ClassificationDegraded);
        }

        Decision::from_fields(&fields)
    }

    /// Run the weather lookup when the classifier asked for it.
    ///
    /// Returns the tool output for the response prompt: a forecast summary,
    /// an in-band notice, or the empty string when no tool was requested.
    async fn dispatch_tool(
        &self,
        state: &ConversationState,
        decision: &Decision,
        events: &mut Vec<TurnEvent>,
    ) -> String {
        if decision.tool_call != Some(ToolChoice::Weather) {
            return String::new();
        }

        let Some(destination) = state.trip_spec.destination.as_deref() else {
            warn!("Weather requested but destination unknown");
            events.push(TurnEvent::ToolSkipped);
            return DESTINATION_UNKNOWN_NOTICE.to_string();
        };

        match self.lookup.resolve_place(destination).await {
            Some(place) => {
                debug!(destination, place = %place.name, "Fetching forecast");
                self.lookup.forecast(&place).await
            }
            None => {
                warn!(destination, "Place resolution failed");
                events.push(TurnEvent::ToolUnresolved {
                    destination: destination.to_string(),
                });
                format!(
                    "System: Could not find coordinates for {}. Cannot fetch weather.",
                    destination
                )
            }
        }
    }

    /// Run the free-form response completion over the bounded history
    /// window. Provider failure here aborts the turn.
    async fn synthesize(
        &self,
        state: &ConversationState,
        tool_output: &str,
    ) -> Result<String, LLMError> {
        let mut messages = vec![Message::system(prompts::response_prompt(
            &state.user_profile,
            &state.trip_spec,
            tool_output,
        ))];

        let window_start = state.history.len().saturating_sub(self.context_window);
        messages.extend(state.history[window_start..].iter().map(HistoryRecord::to_message));

        let reply = self.provider.complete(&messages).await?;
        Ok(strip_wrapping_quotes(reply))
    }
}

/// Overlay extracted updates onto the session entities.
///
/// Each entity merges independently; a rejected merge leaves that entity at
/// its pre-merge value and does not affect the other.
fn apply_updates(state: &mut ConversationState, decision: &Decision, events: &mut Vec<TurnEvent>) {
    let Some(updates) = &decision.extracted_updates else {
        return;
    };

    if let Some(update) = &updates.trip_spec {
        match state.trip_spec.merged(update) {
            Ok(merged) => state.trip_spec = merged,
            Err(e) => {
                warn!(error = %e, "Trip spec update rejected");
                events.push(TurnEvent::MergeRejected {
                    target: MergeTarget::TripSpec,
                });
            }
        }
    }

    if let Some(update) = &updates.user_profile {
        match state.user_profile.merged(update) {
            Ok(merged) => state.user_profile = merged,
            Err(e) => {
                warn!(error = %e, "User profile update rejected");
                events.push(TurnEvent::MergeRejected {
                    target: MergeTarget::UserProfile,
                });
            }
        }
    }
}

/// Strip exactly one pair of wrapping quote characters, if the reply both
/// starts and ends with one. A shallow unwrap, not unescaping.
fn strip_wrapping_quotes(reply: String) -> String {
    if reply.len() >= 2 && reply.starts_with('"') && reply.ends_with('"') {
        reply[1..reply.len() - 1].to_string()
    } else {
        reply
    }
}
