use chrono::{DateTime, Utc};
use net::protocol::{ClientCommand, ServerEvent};
use session::SessionId;

use crate::error::GameError;
use crate::events::{system, Outgoing};
use crate::state::GameState;
use crate::{combat, equipment, trade};

pub const MAX_SAY_LEN: usize = 512;
pub const MAX_NAME_LEN: usize = 32;

/// Route every command that mutates under a single lock acquisition.
/// `move` never reaches here: it awaits the collaborators, so the engine
/// routes it before sync dispatch.
pub fn dispatch_sync(
    state: &mut GameState,
    session: SessionId,
    command: &ClientCommand,
    topup_base_url: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Outgoing>, GameError> {
    if let Some(p) = state.occupants.player_mut(session) {
        p.last_active = now;
    }

    match command {
        ClientCommand::Look => look(state, session),
        ClientCommand::Say { message } => say(state, session, message),
        ClientCommand::SetName { name } => set_name(state, session, name),
        ClientCommand::Attack { target } => combat::resolve_attack(state, session, target),
        ClientCommand::Status => status(state, session),
        ClientCommand::Talk {
            target,
            action,
            item,
        } => trade::talk(state, session, target, action.as_deref(), item.as_deref()),
        ClientCommand::Equip { item } => equipment::equip(state, session, item),
        ClientCommand::Unequip { slot } => equipment::unequip(state, session, slot.as_deref()),
        ClientCommand::Topup => topup(state, session, topup_base_url),
        ClientCommand::Move { .. } => Err(GameError::glitch("move routed to sync dispatch")),
    }
}

/// The mover's view of a room: description plus everyone else in it.
pub fn look(state: &GameState, session: SessionId) -> Result<Vec<Outgoing>, GameError> {
    let player = state
        .occupants
        .player(session)
        .ok_or_else(GameError::no_player)?;
    let room = state
        .rooms
        .get(&player.room)
        .ok_or_else(|| GameError::glitch(format!("player in unknown room {}", player.room)))?;
    Ok(vec![Outgoing::to(
        session,
        ServerEvent::RoomDescription {
            room: GameState::room_wire(room),
            other_players: state.occupant_wires(&player.room, session),
        },
    )])
}

fn say(
    state: &mut GameState,
    session: SessionId,
    message: &str,
) -> Result<Vec<Outgoing>, GameError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Ok(vec![]);
    }
    let capped: String = trimmed.chars().take(MAX_SAY_LEN).collect();

    let player = state
        .occupants
        .player(session)
        .ok_or_else(GameError::no_player)?;
    Ok(vec![Outgoing::room(
        player.room.clone(),
        ServerEvent::Chat {
            from_player_id: player.session.to_string(),
            from_name: player.name.clone(),
            room_id: player.room.to_string(),
            message: capped,
        },
    )])
}

fn set_name(
    state: &mut GameState,
    session: SessionId,
    name: &str,
) -> Result<Vec<Outgoing>, GameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(GameError::refusal("A name has to have letters in it."));
    }
    let capped: String = trimmed.chars().take(MAX_NAME_LEN).collect();

    let player = state
        .occupants
        .player_mut(session)
        .ok_or_else(GameError::no_player)?;
    player.name = capped.clone();
    Ok(vec![Outgoing::to(
        session,
        system(format!("You will be known as {capped}.")),
    )])
}

fn status(state: &GameState, session: SessionId) -> Result<Vec<Outgoing>, GameError> {
    let player = state
        .occupants
        .player(session)
        .ok_or_else(GameError::no_player)?;

    let armor = player.inventory.armor.as_deref().unwrap_or("none");
    let items = player.inventory.item_names();
    let pack = if items.is_empty() {
        "empty".to_string()
    } else {
        items.join(", ")
    };
    Ok(vec![Outgoing::to(
        session,
        system(format!(
            "{} | {}/{} hp | attack {} | {} creds | weapon: {} | armor: {} | pack: {}",
            player.name,
            player.health,
            player.max_health,
            player.attack,
            player.creds,
            player.inventory.weapon,
            armor,
            pack
        )),
    )])
}

fn topup(
    state: &GameState,
    session: SessionId,
    topup_base_url: &str,
) -> Result<Vec<Outgoing>, GameError> {
    if state.occupants.player(session).is_none() {
        return Err(GameError::no_player());
    }
    Ok(vec![Outgoing::to(
        session,
        system(format!(
            "The paymaster takes creds out of band: POST {topup_base_url}/sessions/{session}/topup"
        )),
    )])
}
