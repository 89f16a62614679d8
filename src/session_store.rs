use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Campaign, Persona};

/// Session identifier type
pub type SessionId = String;

// Explicit per-session context. Every cross-step value the generation flow
// reads lives here, initialized to a documented default when the session is
// created; handlers receive the session rather than reaching into any
// global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub id: SessionId,

    /// Loose analysis JSON from the first step. None until a generation ran.
    pub analysis: Option<Value>,

    /// Canonical personas from the latest generation. Empty until then.
    pub personas: Vec<Persona>,

    /// Canonical campaigns from the latest generation. Empty until then.
    pub campaigns: Vec<Campaign>,

    // Which steps were served from the fallback library (false until a
    // generation ran).
    pub analysis_from_fallback: bool,
    pub personas_from_fallback: bool,
    pub campaigns_from_fallback: bool,

    /// Persona count the caller asked for (default 3, the slider default).
    pub requested_personas: usize,

    /// When the latest generation completed. None until one did.
    pub generated_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl SessionData {
    fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            analysis: None,
            personas: Vec::new(),
            campaigns: Vec::new(),
            analysis_from_fallback: false,
            personas_from_fallback: false,
            campaigns_from_fallback: false,
            requested_personas: 3,
            generated_at: None,
            created_at: now,
            last_activity: now,
        }
    }

    /// Whether a generation has completed for this session.
    pub fn has_results(&self) -> bool {
        self.generated_at.is_some()
    }
}

/// In-memory store for per-session state. Nothing here is ever persisted;
/// sessions disappear on expiry or process exit.
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionData>>>,
    session_ttl: Duration,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(2))
    }

    pub fn with_ttl(session_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_ttl,
        }
    }

    pub async fn create_session(&self) -> SessionData {
        let session = SessionData::new(Uuid::new_v4().to_string());
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session.clone());
        session
    }

    pub async fn get_session(&self, id: &str) -> Option<SessionData> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id)?;
        session.last_activity = Utc::now();
        Some(session.clone())
    }

    /// Apply a mutation to one session and return the updated snapshot.
    pub async fn update_session<F>(&self, id: &str, mutate: F) -> Option<SessionData>
    where
        F: FnOnce(&mut SessionData),
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id)?;
        mutate(session);
        session.last_activity = Utc::now();
        Some(session.clone())
    }

    pub async fn remove_session(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id).is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle past the TTL. Returns how many were removed.
    pub async fn cleanup_expired_sessions(&self) -> usize {
        let cutoff = Utc::now() - self.session_ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_activity > cutoff);
        before - sessions.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodic expiry sweep, spawned once at startup.
pub fn spawn_cleanup(store: Arc<SessionStore>, interval: std::time::Duration) {
    tokio::spawn(async move {
        let mut cleanup_timer = tokio::time::interval(interval);

        loop {
            cleanup_timer.tick().await;

            let cleaned_count = store.cleanup_expired_sessions().await;
            if cleaned_count > 0 {
                tracing::info!("Cleaned up {} expired sessions", cleaned_count);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_session_has_documented_defaults() {
        let store = SessionStore::new();
        let session = store.create_session().await;

        assert!(!session.id.is_empty());
        assert!(session.analysis.is_none());
        assert!(session.personas.is_empty());
        assert!(session.campaigns.is_empty());
        assert!(!session.analysis_from_fallback);
        assert!(!session.personas_from_fallback);
        assert!(!session.campaigns_from_fallback);
        assert_eq!(session.requested_personas, 3);
        assert!(session.generated_at.is_none());
        assert!(!session.has_results());
    }

    #[tokio::test]
    async fn test_update_session_mutates_and_returns_snapshot() {
        let store = SessionStore::new();
        let session = store.create_session().await;

        let updated = store
            .update_session(&session.id, |data| {
                data.requested_personas = 5;
                data.generated_at = Some(Utc::now());
            })
            .await
            .unwrap();

        assert_eq!(updated.requested_personas, 5);
        assert!(updated.has_results());
    }

    #[tokio::test]
    async fn test_unknown_session_yields_none() {
        let store = SessionStore::new();
        assert!(store.get_session("no-such-session").await.is_none());
        assert!(store.update_session("no-such-session", |_| {}).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_swept() {
        let store = SessionStore::with_ttl(Duration::milliseconds(1));
        let session = store.create_session().await;

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let cleaned = store.cleanup_expired_sessions().await;
        assert_eq!(cleaned, 1);
        assert!(store.get_session(&session.id).await.is_none());
    }
}
