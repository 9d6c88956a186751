use session::SessionId;

use crate::error::GameError;
use crate::events::{system, Outgoing};
use crate::occupant::NpcClass;
use crate::state::GameState;

/// Resolve one attack command: damage, possible death and loot, possible
/// retaliation. Pure over the state; returns the ordered event fan-out.
///
/// Only Normies in the attacker's room are valid targets. Hitting zero
/// health is terminal for the NPC; for the attacker it is a soft state with
/// no further consequence here.
pub fn resolve_attack(
    state: &mut GameState,
    attacker: SessionId,
    target_name: &str,
) -> Result<Vec<Outgoing>, GameError> {
    let (attacker_name, attacker_rating, weapon, room) = {
        let p = state.occupants.player(attacker).ok_or_else(GameError::no_player)?;
        (
            p.name.clone(),
            p.attack,
            p.inventory.weapon.clone(),
            p.room.clone(),
        )
    };

    let target_id = match state.occupants.find_npc_in_room(&room, target_name) {
        Some(npc) => {
            if npc.class == NpcClass::Vendor {
                return Err(GameError::refusal(format!(
                    "{} steps back behind the counter. Vendors want your creds, not your fists.",
                    npc.name
                )));
            }
            npc.id
        }
        None => {
            if state.occupants.player_in_room_named(&room, target_name).is_some() {
                return Err(GameError::refusal(
                    "Raising a hand against another drifter is more than your luck is worth.",
                ));
            }
            return Err(GameError::refusal(format!(
                "There is no {target_name} here to fight."
            )));
        }
    };

    let damage = attacker_rating.max(0);
    let mut events = Vec::new();

    let (npc_name, npc_health, npc_attack, npc_creds) = {
        let npc = state
            .occupants
            .npc_mut(target_id)
            .ok_or_else(|| GameError::glitch("attack target vanished mid-resolution"))?;
        let remaining = npc.apply_damage(damage);
        (npc.name.clone(), remaining, npc.attack, npc.creds)
    };

    events.push(Outgoing::room(
        room.clone(),
        system(format!(
            "{attacker_name} hits {npc_name} with {weapon} for {damage} damage ({npc_health} hp left)."
        )),
    ));

    if npc_health == 0 {
        state.occupants.remove_npc(target_id);
        events.push(Outgoing::room(
            room.clone(),
            system(format!("{npc_name} collapses into the mist.")),
        ));
        if npc_creds > 0 {
            let p = state
                .occupants
                .player_mut(attacker)
                .ok_or_else(GameError::no_player)?;
            p.creds += npc_creds;
            events.push(Outgoing::to(
                attacker,
                system(format!(
                    "You shake {npc_creds} creds out of what {npc_name} left behind."
                )),
            ));
        }
        return Ok(events);
    }

    let retaliation = npc_attack.max(0);
    let attacker_health = {
        let p = state
            .occupants
            .player_mut(attacker)
            .ok_or_else(GameError::no_player)?;
        p.apply_damage(retaliation)
    };
    events.push(Outgoing::room(
        room,
        system(format!(
            "{npc_name} strikes back at {attacker_name} for {retaliation} damage ({attacker_health} hp left)."
        )),
    ));
    if attacker_health == 0 {
        events.push(Outgoing::to(
            attacker,
            system("You are overwhelmed and your vision swims. Everything hurts."),
        ));
    }

    Ok(events)
}
