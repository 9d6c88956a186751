use session::SessionId;

use crate::error::GameError;
use crate::events::{system, Outgoing};
use crate::items::{self, ItemCategory, BASE_ATTACK};
use crate::state::GameState;

/// Equip a named item out of the pack. Weapons and armor swap with the
/// current slot (stowing the old piece first, rolling back if that fails);
/// `item`-category entries are consumed on the spot for their heal.
pub fn equip(
    state: &mut GameState,
    session: SessionId,
    item_name: &str,
) -> Result<Vec<Outgoing>, GameError> {
    let player = state
        .occupants
        .player_mut(session)
        .ok_or_else(GameError::no_player)?;

    let Some(drawn) = player.inventory.take_named(item_name) else {
        return Err(GameError::refusal(format!(
            "You rummage through your pack but find no {item_name}."
        )));
    };

    let Some(entry) = items::lookup(&drawn) else {
        // unknown items go straight back where they came from
        player.inventory.stow(drawn.clone());
        return Err(GameError::refusal(format!(
            "You turn the {drawn} over in your hands. No idea how to equip that."
        )));
    };

    match entry.category {
        ItemCategory::Weapon => {
            if !items::is_fist(&player.inventory.weapon) {
                let previous = player.inventory.weapon.clone();
                if player.inventory.stow(previous.clone()).is_none() {
                    player.inventory.stow(drawn.clone());
                    return Err(GameError::refusal(format!(
                        "No room to stow the {previous}; the {drawn} goes back in your pack."
                    )));
                }
            }
            player.inventory.weapon = drawn.clone();
            player.attack = entry.attack.unwrap_or(BASE_ATTACK);
            Ok(vec![Outgoing::to(
                session,
                system(format!(
                    "You heft the {drawn}. Attack rating is now {}.",
                    player.attack
                )),
            )])
        }
        ItemCategory::Armor => {
            if let Some(previous) = player.inventory.armor.clone() {
                if player.inventory.stow(previous.clone()).is_none() {
                    player.inventory.stow(drawn.clone());
                    return Err(GameError::refusal(format!(
                        "No room to stow the {previous}; the {drawn} goes back in your pack."
                    )));
                }
            }
            player.inventory.armor = Some(drawn.clone());
            Ok(vec![Outgoing::to(
                session,
                system(format!("You strap on the {drawn}.")),
            )])
        }
        ItemCategory::Item => {
            let healed = player.heal(entry.heal.unwrap_or(0));
            Ok(vec![Outgoing::to(
                session,
                system(format!(
                    "You consume the {drawn}. {healed} hp restored ({} hp).",
                    player.health
                )),
            )])
        }
    }
}

/// Unequip a slot back into the pack. The weapon slot falls back to the
/// fist sentinel and base attack; the armor slot just empties.
pub fn unequip(
    state: &mut GameState,
    session: SessionId,
    slot: Option<&str>,
) -> Result<Vec<Outgoing>, GameError> {
    let player = state
        .occupants
        .player_mut(session)
        .ok_or_else(GameError::no_player)?;

    match slot.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("weapon") {
        s if s.eq_ignore_ascii_case("weapon") => {
            if items::is_fist(&player.inventory.weapon) {
                return Ok(vec![Outgoing::to(
                    session,
                    system("Your fists stay right where they are."),
                )]);
            }
            let weapon = player.inventory.weapon.clone();
            if player.inventory.stow(weapon.clone()).is_none() {
                return Err(GameError::refusal(format!(
                    "No room in your pack for the {weapon}; it stays equipped."
                )));
            }
            player.inventory.weapon = items::FIST.to_string();
            player.attack = BASE_ATTACK;
            Ok(vec![Outgoing::to(
                session,
                system(format!(
                    "You stow the {weapon} and flex your fingers. Attack rating back to {BASE_ATTACK}."
                )),
            )])
        }
        s if s.eq_ignore_ascii_case("armor") => {
            let Some(armor) = player.inventory.armor.clone() else {
                return Ok(vec![Outgoing::to(
                    session,
                    system("You aren't wearing any armor."),
                )]);
            };
            if player.inventory.stow(armor.clone()).is_none() {
                return Err(GameError::refusal(format!(
                    "No room in your pack for the {armor}; it stays on."
                )));
            }
            player.inventory.armor = None;
            Ok(vec![Outgoing::to(
                session,
                system(format!("You shrug off the {armor}.")),
            )])
        }
        other => Err(GameError::refusal(format!(
            "You can unequip 'weapon' or 'armor', not '{other}'."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::SLOT_CAPACITY;
    use crate::occupant::Player;
    use crate::seed;
    use chrono::Utc;
    use space::RoomId;

    fn setup() -> (GameState, SessionId) {
        let (mut state, hub) = seed::seed_world();
        let sid = SessionId(1);
        state
            .occupants
            .admit_player(Player::new(sid, "Vex".into(), hub, Utc::now()));
        (state, sid)
    }

    fn player(state: &GameState, sid: SessionId) -> &Player {
        state.occupants.player(sid).unwrap()
    }

    #[test]
    fn equip_weapon_sets_attack_rating() {
        let (mut state, sid) = setup();
        state
            .occupants
            .player_mut(sid)
            .unwrap()
            .inventory
            .stow("rusty sword");

        equip(&mut state, sid, "Rusty Sword").unwrap();

        let p = player(&state, sid);
        assert_eq!(p.inventory.weapon, "rusty sword");
        assert_eq!(p.attack, 18);
        assert!(!p.inventory.contains_item("rusty sword"));
    }

    #[test]
    fn equip_swap_stows_previous_weapon() {
        let (mut state, sid) = setup();
        {
            let p = state.occupants.player_mut(sid).unwrap();
            p.inventory.stow("drift saber");
            p.inventory.weapon = "rusty sword".to_string();
            p.attack = 18;
        }

        equip(&mut state, sid, "drift saber").unwrap();

        let p = player(&state, sid);
        assert_eq!(p.inventory.weapon, "drift saber");
        assert_eq!(p.attack, 25);
        assert!(p.inventory.contains_item("rusty sword"));
        assert_eq!(p.inventory.occupancy(), 2);
    }

    #[test]
    fn equip_missing_item_is_refused() {
        let (mut state, sid) = setup();
        let err = equip(&mut state, sid, "drift saber").unwrap_err();
        assert!(matches!(err, GameError::Refusal(_)));
    }

    #[test]
    fn equip_unknown_item_restores_it() {
        let (mut state, sid) = setup();
        state
            .occupants
            .player_mut(sid)
            .unwrap()
            .inventory
            .stow("cursed idol");

        let err = equip(&mut state, sid, "cursed idol").unwrap_err();
        assert!(err.to_string().contains("No idea"));
        assert!(player(&state, sid).inventory.contains_item("cursed idol"));
    }

    #[test]
    fn consume_item_heals_and_is_gone() {
        let (mut state, sid) = setup();
        {
            let p = state.occupants.player_mut(sid).unwrap();
            p.health = 70;
            p.inventory.stow("red tonic");
        }

        let events = equip(&mut state, sid, "red tonic").unwrap();
        let p = player(&state, sid);
        assert_eq!(p.health, 100);
        assert!(!p.inventory.contains_item("red tonic"));
        match &events[0].event {
            net::protocol::ServerEvent::System { message } => {
                assert!(message.contains("30 hp restored"));
            }
            other => panic!("expected system event, got {other:?}"),
        }
    }

    #[test]
    fn consume_at_full_health_reports_zero() {
        let (mut state, sid) = setup();
        state
            .occupants
            .player_mut(sid)
            .unwrap()
            .inventory
            .stow("hard bread");

        let events = equip(&mut state, sid, "hard bread").unwrap();
        match &events[0].event {
            net::protocol::ServerEvent::System { message } => {
                assert!(message.contains("0 hp restored"));
            }
            other => panic!("expected system event, got {other:?}"),
        }
        assert_eq!(player(&state, sid).health, 100);
    }

    #[test]
    fn unequip_fist_is_a_noop() {
        let (mut state, sid) = setup();
        let events = unequip(&mut state, sid, None).unwrap();
        assert_eq!(events.len(), 1);
        let p = player(&state, sid);
        assert_eq!(p.inventory.weapon, items::FIST);
        assert_eq!(p.attack, BASE_ATTACK);
    }

    #[test]
    fn unequip_weapon_resets_attack() {
        let (mut state, sid) = setup();
        {
            let p = state.occupants.player_mut(sid).unwrap();
            p.inventory.weapon = "rusty sword".to_string();
            p.attack = 18;
        }

        unequip(&mut state, sid, Some("weapon")).unwrap();

        let p = player(&state, sid);
        assert_eq!(p.inventory.weapon, items::FIST);
        assert_eq!(p.attack, BASE_ATTACK);
        assert!(p.inventory.contains_item("rusty sword"));
    }

    #[test]
    fn unequip_with_full_pack_changes_nothing() {
        let (mut state, sid) = setup();
        {
            let p = state.occupants.player_mut(sid).unwrap();
            p.inventory.weapon = "rusty sword".to_string();
            p.attack = 18;
            while p.inventory.stow("pebble").is_some() {}
        }

        let err = unequip(&mut state, sid, Some("weapon")).unwrap_err();
        assert!(matches!(err, GameError::Refusal(_)));

        let p = player(&state, sid);
        assert_eq!(p.inventory.weapon, "rusty sword");
        assert_eq!(p.attack, 18);
        assert_eq!(p.inventory.used_slots(), SLOT_CAPACITY);
    }

    #[test]
    fn unequip_armor_round_trips() {
        let (mut state, sid) = setup();
        {
            let p = state.occupants.player_mut(sid).unwrap();
            p.inventory.stow("leather jerkin");
        }

        equip(&mut state, sid, "leather jerkin").unwrap();
        assert_eq!(
            player(&state, sid).inventory.armor.as_deref(),
            Some("leather jerkin")
        );
        assert_eq!(player(&state, sid).inventory.used_slots(), 0);

        unequip(&mut state, sid, Some("armor")).unwrap();
        let p = player(&state, sid);
        assert!(p.inventory.armor.is_none());
        assert!(p.inventory.contains_item("leather jerkin"));
        assert_eq!(p.inventory.occupancy(), 1);
    }

    #[test]
    fn unequip_unknown_slot_is_refused() {
        let (mut state, sid) = setup();
        let err = unequip(&mut state, sid, Some("boots")).unwrap_err();
        assert!(err.to_string().contains("boots"));
    }

    #[test]
    fn equip_unequip_preserves_slot_count_invariant() {
        let (mut state, sid) = setup();
        {
            let p = state.occupants.player_mut(sid).unwrap();
            p.inventory.stow("rusty sword");
            p.inventory.stow("leather jerkin");
            p.inventory.stow("drift saber");
        }
        assert_eq!(player(&state, sid).inventory.occupancy(), 3);

        equip(&mut state, sid, "rusty sword").unwrap();
        equip(&mut state, sid, "leather jerkin").unwrap();
        assert_eq!(player(&state, sid).inventory.occupancy(), 3);

        equip(&mut state, sid, "drift saber").unwrap();
        assert_eq!(player(&state, sid).inventory.occupancy(), 3);

        unequip(&mut state, sid, Some("weapon")).unwrap();
        unequip(&mut state, sid, Some("armor")).unwrap();
        assert_eq!(player(&state, sid).inventory.occupancy(), 3);
        assert!(player(&state, sid).inventory.occupancy() <= SLOT_CAPACITY);
    }
}
