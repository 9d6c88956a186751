use net::protocol::{ExitWire, OccupantWire, PlayerWire, RoomWire};
use session::{SessionId, SessionRegistry};
use space::{Room, RoomId, RoomStore};

use crate::occupant::{NpcClass, OccupantStore, Player};

/// The whole mutable world: admitted sessions, the room table, every
/// occupant. Owned behind the engine's mutex; handlers mutate it in
/// synchronous critical sections.
#[derive(Debug, Default)]
pub struct GameState {
    pub sessions: SessionRegistry,
    pub rooms: RoomStore,
    pub occupants: OccupantStore,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions of every player currently in `room`, minus `exclude`.
    pub fn session_ids_in_room(&self, room: &RoomId, exclude: Option<SessionId>) -> Vec<SessionId> {
        self.occupants
            .players_in_room(room)
            .into_iter()
            .map(|p| p.session)
            .filter(|sid| Some(*sid) != exclude)
            .collect()
    }

    pub fn room_wire(room: &Room) -> RoomWire {
        RoomWire {
            id: room.id.to_string(),
            name: room.name.clone(),
            description: room.description.clone(),
            region: room.region.clone(),
            hub: room.hub,
            exits: room
                .exits
                .iter()
                .map(|e| ExitWire {
                    direction: e.direction.clone(),
                    explored: e.target.is_some(),
                })
                .collect(),
        }
    }

    pub fn player_wire(player: &Player) -> PlayerWire {
        PlayerWire {
            id: player.session.to_string(),
            name: player.name.clone(),
            health: player.health,
            max_health: player.max_health,
            attack: player.attack,
            creds: player.creds,
            room_id: player.room.to_string(),
            weapon: player.inventory.weapon.clone(),
            armor: player.inventory.armor.clone(),
            items: player.inventory.item_names(),
        }
    }

    /// Everyone in `room` except the viewer, players first, then NPCs.
    pub fn occupant_wires(&self, room: &RoomId, viewer: SessionId) -> Vec<OccupantWire> {
        let mut wires: Vec<OccupantWire> = self
            .occupants
            .players_in_room(room)
            .into_iter()
            .filter(|p| p.session != viewer)
            .map(|p| OccupantWire {
                id: p.session.to_string(),
                name: p.name.clone(),
                kind: "player".to_string(),
                health: p.health,
                description: p.description.clone(),
            })
            .collect();
        wires.extend(self.occupants.npcs_in_room(room).into_iter().map(|n| {
            OccupantWire {
                id: n.id.to_string(),
                name: n.name.clone(),
                kind: match n.class {
                    NpcClass::Normie => "normie",
                    NpcClass::Vendor => "vendor",
                }
                .to_string(),
                health: n.health,
                description: n.description.clone(),
            }
        }));
        wires
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    #[test]
    fn session_ids_in_room_respects_exclusion() {
        let (mut state, hub) = seed::seed_world();
        let now = chrono::Utc::now();
        for n in 1..=3 {
            state
                .occupants
                .admit_player(Player::new(SessionId(n), format!("P{n}"), hub.clone(), now));
        }

        let all = state.session_ids_in_room(&hub, None);
        assert_eq!(all.len(), 3);
        let others = state.session_ids_in_room(&hub, Some(SessionId(2)));
        assert_eq!(others.len(), 2);
        assert!(!others.contains(&SessionId(2)));
    }

    #[test]
    fn occupant_wires_exclude_viewer_and_tag_kinds() {
        let (mut state, hub) = seed::seed_world();
        let now = chrono::Utc::now();
        state
            .occupants
            .admit_player(Player::new(SessionId(1), "Vex".into(), hub.clone(), now));
        state
            .occupants
            .admit_player(Player::new(SessionId(2), "Nim".into(), hub.clone(), now));

        let wires = state.occupant_wires(&hub, SessionId(1));
        assert_eq!(wires.len(), 1);
        assert_eq!(wires[0].name, "Nim");
        assert_eq!(wires[0].kind, "player");

        // the seeded vendor shows up in its own room
        let emporium = space::RoomId::from("emporium");
        let wires = state.occupant_wires(&emporium, SessionId(1));
        assert_eq!(wires.len(), 1);
        assert_eq!(wires[0].kind, "vendor");
    }

    #[test]
    fn room_wire_flags_unexplored_exits() {
        let (state, hub) = seed::seed_world();
        let wire = GameState::room_wire(state.rooms.get(&hub).unwrap());
        let north = wire.exits.iter().find(|e| e.direction == "north").unwrap();
        assert!(north.explored);
        let south = wire.exits.iter().find(|e| e.direction == "south").unwrap();
        assert!(!south.explored);
    }
}
