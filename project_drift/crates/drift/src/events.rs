use net::protocol::ServerEvent;
use session::SessionId;
use space::RoomId;

/// Who receives one outbound event.
#[derive(Debug, Clone)]
pub enum Audience {
    Session(SessionId),
    Room {
        room: RoomId,
        exclude: Option<SessionId>,
    },
}

/// One event with its audience, produced by a handler and resolved into
/// per-session frames by the engine at delivery time.
#[derive(Debug, Clone)]
pub struct Outgoing {
    pub audience: Audience,
    pub event: ServerEvent,
}

impl Outgoing {
    pub fn to(session: SessionId, event: ServerEvent) -> Self {
        Self {
            audience: Audience::Session(session),
            event,
        }
    }

    pub fn room(room: RoomId, event: ServerEvent) -> Self {
        Self {
            audience: Audience::Room {
                room,
                exclude: None,
            },
            event,
        }
    }

    pub fn room_except(room: RoomId, exclude: SessionId, event: ServerEvent) -> Self {
        Self {
            audience: Audience::Room {
                room,
                exclude: Some(exclude),
            },
            event,
        }
    }
}

/// Shorthand for the narration events most handlers emit.
pub fn system(message: impl Into<String>) -> ServerEvent {
    ServerEvent::System {
        message: message.into(),
    }
}
