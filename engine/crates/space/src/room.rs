use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Room identity. Seed rooms carry hand-authored ids; generated rooms get
/// `room-{n}` from the store's counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A directed edge out of a room. `target == None` means unexplored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub direction: String,
    pub target: Option<RoomId>,
}

impl Exit {
    pub fn unexplored(direction: impl Into<String>) -> Self {
        Self {
            direction: direction.into(),
            target: None,
        }
    }

    pub fn to(direction: impl Into<String>, target: RoomId) -> Self {
        Self {
            direction: direction.into(),
            target: Some(target),
        }
    }
}

/// A node in the world graph. Immutable once inserted, except that an exit's
/// target may be backfilled by materialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub description: String,
    pub region: Option<String>,
    pub hub: bool,
    pub exits: Vec<Exit>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn exit(&self, direction: &str) -> Option<&Exit> {
        self.exits
            .iter()
            .find(|e| e.direction.eq_ignore_ascii_case(direction))
    }

    fn exit_mut(&mut self, direction: &str) -> Option<&mut Exit> {
        self.exits
            .iter_mut()
            .find(|e| e.direction.eq_ignore_ascii_case(direction))
    }

    /// Write the target for `direction`, creating the exit if absent.
    /// Exit directions stay unique; an existing target is overwritten
    /// (last-writer-wins under concurrent materialization).
    pub(crate) fn set_exit_target(&mut self, direction: &str, target: RoomId) {
        match self.exit_mut(direction) {
            Some(exit) => exit.target = Some(target),
            None => self.exits.push(Exit::to(direction.to_string(), target)),
        }
    }
}
