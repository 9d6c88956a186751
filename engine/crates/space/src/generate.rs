use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::room::Room;

/// One candidate room proposed by the content generator. Target ids inside
/// `exits` are opaque references; the store copies them verbatim without
/// validating them against the room table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSeed {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub hub: bool,
    #[serde(default)]
    pub exits: Vec<ExitSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitSeed {
    pub direction: String,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Error)]
pub enum ExpandError {
    #[error("content generator failed: {0}")]
    Generator(String),
    #[error("content generator returned no rooms")]
    EmptyBatch,
}

/// Capability that invents the world beyond an unexplored exit.
///
/// Called with a snapshot of the origin room and the requested direction;
/// expected to return 1-2 candidates, of which the caller uses only the
/// first. Failures leave the exit exactly as it was.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn expand(&self, origin: &Room, direction: &str) -> Result<Vec<RoomSeed>, ExpandError>;
}
