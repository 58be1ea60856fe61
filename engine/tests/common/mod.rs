//! Shared test doubles for integration tests
//!
//! In-memory implementations of the agent core's three collaborators:
//! a scripted chat provider, a HashMap session store, and a fake lookup
//! tool with call counters.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use wayfarer_engine::agent::AgentCore;
use wayfarer_engine::db::SessionStore;
use wayfarer_engine::llm::{ChatProvider, LLMError, Message};
use wayfarer_engine::state::ConversationState;
use wayfarer_engine::tools::{LookupTool, Place};

/// Chat provider that returns a fixed decision and a fixed reply,
/// recording every call it receives.
pub struct ScriptedProvider {
    decision: Map<String, Value>,
    reply: String,
    fail_complete: bool,
    pub complete_calls: Mutex<Vec<Vec<Message>>>,
    pub json_calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    /// Provider that classifies with `decision` and replies with `reply`.
    /// Pass a JSON object for `decision`; anything else scripts the empty
    /// sentinel.
    pub fn new(decision: Value, reply: impl Into<String>) -> Self {
        let decision = match decision {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            decision,
            reply: reply.into(),
            fail_complete: false,
            complete_calls: Mutex::new(Vec::new()),
            json_calls: Mutex::new(Vec::new()),
        }
    }

    /// Provider whose free-form completion fails with a transport error.
    pub fn failing(decision: Value) -> Self {
        let mut provider = Self::new(decision, "");
        provider.fail_complete = true;
        provider
    }

    /// System message of the most recent free-form completion call.
    pub fn last_completion_system(&self) -> String {
        let calls = self.complete_calls.lock().unwrap();
        calls
            .last()
            .and_then(|messages| messages.first())
            .map(|msg| msg.content.clone())
            .expect("no free-form completion was made")
    }

    /// Message count of the most recent free-form completion call.
    pub fn last_completion_len(&self) -> usize {
        let calls = self.complete_calls.lock().unwrap();
        calls.last().map(Vec::len).expect("no free-form completion was made")
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, LLMError> {
        self.complete_calls.lock().unwrap().push(messages.to_vec());
        if self.fail_complete {
            return Err(LLMError::NetworkError("scripted transport failure".to_string()));
        }
        Ok(self.reply.clone())
    }

    async fn complete_json(&self, messages: &[Message], _schema: &Value) -> Map<String, Value> {
        self.json_calls.lock().unwrap().push(messages.to_vec());
        self.decision.clone()
    }
}

/// In-memory session store
#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, ConversationState>>,
    fail_save: bool,
    pub save_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose save always fails.
    pub fn failing_save() -> Self {
        Self {
            fail_save: true,
            ..Default::default()
        }
    }

    /// Snapshot of a session's persisted state.
    pub fn state(&self, session_id: &str) -> Option<ConversationState> {
        self.sessions.lock().unwrap().get(session_id).cloned()
    }

    /// Pre-populate a session.
    pub fn seed(&self, session_id: &str, state: ConversationState) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), state);
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, session_id: &str) -> anyhow::Result<ConversationState> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, session_id: &str, state: &ConversationState) -> anyhow::Result<()> {
        if self.fail_save {
            anyhow::bail!("scripted storage failure");
        }
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), state.clone());
        Ok(())
    }
}

/// Lookup tool with scripted results and call counters
pub struct FakeLookup {
    place: Option<Place>,
    forecast: String,
    pub resolve_calls: AtomicUsize,
    pub forecast_calls: AtomicUsize,
}

impl FakeLookup {
    /// Lookup that resolves every name to the given place.
    pub fn resolving(name: &str, latitude: f64, longitude: f64, forecast: &str) -> Self {
        Self {
            place: Some(Place {
                name: name.to_string(),
                latitude,
                longitude,
            }),
            forecast: forecast.to_string(),
            resolve_calls: AtomicUsize::new(0),
            forecast_calls: AtomicUsize::new(0),
        }
    }

    /// Lookup that never finds a place.
    pub fn unresolvable() -> Self {
        Self {
            place: None,
            forecast: String::new(),
            resolve_calls: AtomicUsize::new(0),
            forecast_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LookupTool for FakeLookup {
    async fn resolve_place(&self, _name: &str) -> Option<Place> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.place.clone()
    }

    async fn forecast(&self, _place: &Place) -> String {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        self.forecast.clone()
    }
}

/// Assemble an agent core over the given doubles with a 10-record window.
pub fn agent(
    provider: &Arc<ScriptedProvider>,
    store: &Arc<MemoryStore>,
    lookup: &Arc<FakeLookup>,
) -> AgentCore {
    agent_with_window(provider, store, lookup, 10)
}

/// Assemble an agent core with an explicit history window.
pub fn agent_with_window(
    provider: &Arc<ScriptedProvider>,
    store: &Arc<MemoryStore>,
    lookup: &Arc<FakeLookup>,
    context_window: usize,
) -> AgentCore {
    AgentCore::new(
        provider.clone(),
        store.clone(),
        lookup.clone(),
        context_window,
    )
}
