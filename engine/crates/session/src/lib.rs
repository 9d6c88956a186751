use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque per-connection identity. Assigned by the transport layer on accept
/// and never reused for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A serialized event on its way to one session's socket.
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    pub session_id: SessionId,
    /// Event JSON, ready to write as a single text frame.
    pub payload: String,
    /// When true, the output router drops the session's write channel after
    /// delivering this frame, which shuts the connection down.
    pub disconnect: bool,
}

impl OutboundFrame {
    pub fn new(session_id: SessionId, payload: impl Into<String>) -> Self {
        Self {
            session_id,
            payload: payload.into(),
            disconnect: false,
        }
    }

    /// A final frame that disconnects the session after delivery.
    pub fn closing(session_id: SessionId, payload: impl Into<String>) -> Self {
        Self {
            session_id,
            payload: payload.into(),
            disconnect: true,
        }
    }
}

/// Connection bookkeeping for one admitted session.
#[derive(Debug, Clone)]
pub struct SessionMeta {
    pub connected_at: DateTime<Utc>,
}

/// Tracks which session ids currently have a live transport binding.
///
/// The registry is the admission ledger, not the player table: game state for
/// a session lives with whoever owns the world. Removal is idempotent so the
/// disconnect path can fire twice without side effects.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: BTreeMap<SessionId, SessionMeta>,
    next_id: u64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a new session, returning its fresh id.
    pub fn admit(&mut self, now: DateTime<Utc>) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        self.sessions.insert(id, SessionMeta { connected_at: now });
        id
    }

    /// Admit a session under an id assigned by the transport layer.
    pub fn admit_with_id(&mut self, id: SessionId, now: DateTime<Utc>) {
        self.sessions.insert(id, SessionMeta { connected_at: now });
        if id.0 >= self.next_id {
            self.next_id = id.0 + 1;
        }
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn meta(&self, id: SessionId) -> Option<&SessionMeta> {
        self.sessions.get(&id)
    }

    /// Remove a session. Returns false when it was already gone.
    pub fn remove(&mut self, id: SessionId) -> bool {
        self.sessions.remove(&id).is_some()
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn all_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }
}
