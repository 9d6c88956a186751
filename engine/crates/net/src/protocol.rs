use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client-to-server command (internally tagged JSON, camelCase wire names).
/// Anything that fails to decode into this closed set is a protocol error.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientCommand {
    Look,
    Say {
        message: String,
    },
    Move {
        direction: String,
    },
    SetName {
        name: String,
    },
    Attack {
        target: String,
    },
    Status,
    Talk {
        target: String,
        #[serde(default)]
        action: Option<String>,
        #[serde(default)]
        item: Option<String>,
    },
    Equip {
        item: String,
    },
    Unequip {
        #[serde(default)]
        slot: Option<String>,
    },
    Topup,
}

impl ClientCommand {
    /// Stable label for logging and timing.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Look => "look",
            Self::Say { .. } => "say",
            Self::Move { .. } => "move",
            Self::SetName { .. } => "setName",
            Self::Attack { .. } => "attack",
            Self::Status => "status",
            Self::Talk { .. } => "talk",
            Self::Equip { .. } => "equip",
            Self::Unequip { .. } => "unequip",
            Self::Topup => "topup",
        }
    }
}

/// Server-to-client event (internally tagged JSON, camelCase wire names).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    Welcome {
        player: PlayerWire,
        room: RoomWire,
    },
    RoomDescription {
        room: RoomWire,
        other_players: Vec<OccupantWire>,
    },
    Chat {
        from_player_id: String,
        from_name: String,
        room_id: String,
        message: String,
    },
    System {
        message: String,
    },
    Error {
        message: String,
    },
}

/// Outbound envelope: every event carries a timestamp beside its tag.
#[derive(Debug, Clone, Serialize)]
pub struct EventFrame {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: ServerEvent,
}

impl EventFrame {
    pub fn new(timestamp: DateTime<Utc>, event: ServerEvent) -> Self {
        Self { timestamp, event }
    }

    pub fn now(event: ServerEvent) -> Self {
        Self::new(Utc::now(), event)
    }
}

/// Wire representation of the connecting player.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerWire {
    pub id: String,
    pub name: String,
    pub health: i32,
    pub max_health: i32,
    pub attack: i32,
    pub creds: i64,
    pub room_id: String,
    pub weapon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub armor: Option<String>,
    pub items: Vec<String>,
}

/// Wire representation of a room. Unexplored exits are flagged rather than
/// leaking unresolved target ids.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomWire {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub hub: bool,
    pub exits: Vec<ExitWire>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitWire {
    pub direction: String,
    pub explored: bool,
}

/// Wire representation of any other occupant of a room.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupantWire {
    pub id: String,
    pub name: String,
    /// "player", "normie" or "vendor".
    pub kind: String,
    pub health: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
