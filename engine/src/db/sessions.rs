/// Session persistence operations
///
/// One row per session id holding the serialized `ConversationState`.
/// Loading an unknown session yields a fresh default state; the store has
/// no "not found" failure mode. Saving is an upsert and is the only
/// fallible path a turn depends on.
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::state::ConversationState;

/// Durable mapping from session id to conversation state
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the state for a session, defaulting to an empty state for an
    /// unknown id.
    async fn load(&self, session_id: &str) -> Result<ConversationState>;

    /// Persist the complete state for a session.
    async fn save(&self, session_id: &str, state: &ConversationState) -> Result<()>;
}

/// SQLite-backed session store
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Create a new session repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn load(&self, session_id: &str) -> Result<ConversationState> {
        let row = sqlx::query("SELECT data FROM sessions WHERE session_id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load session")?;

        let Some(row) = row else {
            return Ok(ConversationState::default());
        };

        let data: String = row.get("data");
        match serde_json::from_str(&data) {
            Ok(state) => Ok(state),
            Err(e) => {
                // A corrupt blob is unrecoverable; start the session over
                // rather than failing every subsequent turn.
                tracing::error!(session_id, error = %e, "Failed to decode session state");
                Ok(ConversationState::default())
            }
        }
    }

    async fn save(&self, session_id: &str, state: &ConversationState) -> Result<()> {
        let data = serde_json::to_string(state).context("Failed to serialize session state")?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;

        sqlx::query("INSERT OR REPLACE INTO sessions (session_id, data, updated_at) VALUES (?, ?, ?)")
            .bind(session_id)
            .bind(data)
            .bind(now)
            .execute(&self.pool)
            .await
            .context("Failed to save session")?;

        Ok(())
    }
}
