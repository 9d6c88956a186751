use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::generate::RoomSeed;
use crate::room::{Exit, Room, RoomId};

/// Owns the room table. Rooms are added at seed time or through exit
/// materialization, never removed.
#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: HashMap<RoomId, Room>,
    next_id: u64,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a hand-authored room at startup. Returns false (and leaves the
    /// table untouched) if the id is already taken.
    pub fn seed(&mut self, room: Room) -> bool {
        if self.rooms.contains_key(&room.id) {
            return false;
        }
        self.rooms.insert(room.id.clone(), room);
        true
    }

    pub fn get(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn contains(&self, id: &RoomId) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn find_exit(&self, room: &RoomId, direction: &str) -> Option<&Exit> {
        self.rooms.get(room).and_then(|r| r.exit(direction))
    }

    /// Materialize a generated room behind `origin`'s `direction` exit.
    ///
    /// The seed's declared exits are copied verbatim (duplicate directions
    /// dropped, first wins), the room is inserted under a fresh id, and the
    /// origin exit's target is written last: created if the direction was
    /// previously absent, overwritten if a concurrent materialization got
    /// there first. The insert always succeeds even when the exit write is
    /// later overwritten, so every caller ends up with a usable room.
    pub fn admit_generated(
        &mut self,
        origin: &RoomId,
        direction: &str,
        seed: RoomSeed,
        now: DateTime<Utc>,
    ) -> Option<RoomId> {
        if !self.rooms.contains_key(origin) {
            return None;
        }

        self.next_id += 1;
        let id = RoomId(format!("room-{}", self.next_id));

        let mut exits: Vec<Exit> = Vec::with_capacity(seed.exits.len());
        for e in seed.exits {
            if exits
                .iter()
                .any(|x: &Exit| x.direction.eq_ignore_ascii_case(&e.direction))
            {
                tracing::debug!(room = %id, direction = %e.direction, "dropping duplicate exit direction from generator");
                continue;
            }
            exits.push(Exit {
                direction: e.direction,
                target: e.target.map(RoomId),
            });
        }

        let room = Room {
            id: id.clone(),
            name: seed.name,
            description: seed.description,
            region: seed.region,
            hub: seed.hub,
            exits,
            created_at: now,
        };
        self.rooms.insert(id.clone(), room);

        if let Some(origin_room) = self.rooms.get_mut(origin) {
            origin_room.set_exit_target(direction, id.clone());
        }

        Some(id)
    }
}
