use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

/// A signed-in browser or client. Tokens carry the session id; revoking the
/// session invalidates the token before it expires.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub user_id: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Server-side registry of live sessions.
pub struct SessionRegistry {
    sessions: DashMap<Uuid, Session>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn open(&self, user_id: &str, username: &str) -> Session {
        let session = Session {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions.insert(session.id, session.clone());
        session
    }

    /// The session if it exists and has not expired. Expired entries are dropped.
    pub fn active(&self, id: &Uuid) -> Option<Session> {
        let session = self.sessions.get(id).map(|s| s.clone())?;
        if session.expires_at <= Utc::now() {
            self.sessions.remove(id);
            return None;
        }
        Some(session)
    }

    /// End one session. Returns whether it was live.
    pub fn close(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// End every session of `username`. Returns how many were ended.
    pub fn revoke_user(&self, username: &str) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, s| !s.username.eq_ignore_ascii_case(username));
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
