use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use session::SessionId;
use space::RoomId;
use thiserror::Error;

use crate::inventory::Inventory;
use crate::items::{StockItem, BASE_ATTACK};

pub const START_HEALTH: i32 = 100;
pub const START_CREDS: i64 = 20;

pub const NORMIE_CAP: usize = 3;
pub const NORMIE_SPAWN_CHANCE: f64 = 0.35;
pub const NORMIE_ATTACK: i32 = 10;
pub const NORMIE_HEALTH_RANGE: std::ops::RangeInclusive<i32> = 15..=100;
pub const NORMIE_CREDS_RANGE: std::ops::RangeInclusive<i64> = 0..=50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NpcId(pub u64);

impl std::fmt::Display for NpcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "npc-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcClass {
    Normie,
    Vendor,
}

/// A connected session's in-world record. Created on admission, destroyed on
/// disconnect.
#[derive(Debug, Clone)]
pub struct Player {
    pub session: SessionId,
    pub name: String,
    pub description: Option<String>,
    pub health: i32,
    pub max_health: i32,
    pub attack: i32,
    pub creds: i64,
    pub room: RoomId,
    pub last_active: DateTime<Utc>,
    pub inventory: Inventory,
}

impl Player {
    pub fn new(session: SessionId, name: String, room: RoomId, now: DateTime<Utc>) -> Self {
        Self {
            session,
            name,
            description: None,
            health: START_HEALTH,
            max_health: START_HEALTH,
            attack: BASE_ATTACK,
            creds: START_CREDS,
            room,
            last_active: now,
            inventory: Inventory::new(),
        }
    }

    /// Apply damage, clamped at zero. Returns remaining health.
    pub fn apply_damage(&mut self, damage: i32) -> i32 {
        self.health = (self.health - damage.max(0)).max(0);
        self.health
    }

    /// Heal up to max. Returns the amount actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let healed = amount.max(0).min(self.max_health - self.health);
        self.health += healed;
        healed
    }
}

/// A server-controlled occupant. Normies are spawned by the policy below and
/// die permanently in combat; vendors are seeded with the world.
#[derive(Debug, Clone)]
pub struct Npc {
    pub id: NpcId,
    pub name: String,
    pub description: Option<String>,
    pub health: i32,
    pub max_health: i32,
    pub attack: i32,
    pub creds: i64,
    pub room: RoomId,
    pub class: NpcClass,
    pub stock: Vec<StockItem>,
}

impl Npc {
    pub fn apply_damage(&mut self, damage: i32) -> i32 {
        self.health = (self.health - damage.max(0)).max(0);
        self.health
    }
}

/// Display name and flavor for a freshly spawned NPC, keyed by its health.
#[derive(Debug, Clone)]
pub struct NpcProfile {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("npc profile generator failed: {0}")]
    Generator(String),
}

/// Capability that names and describes a spawned NPC. Failures are logged
/// and swallowed by the caller; spawning is best-effort.
#[async_trait]
pub trait NpcProfileGenerator: Send + Sync {
    async fn profile(&self, health: i32) -> Result<NpcProfile, ProfileError>;
}

/// The stats a spawn attempt rolled before the profile call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnRoll {
    pub health: i32,
    pub creds: i64,
}

/// Decide whether a Normie spawns in a room that currently holds
/// `current_normies` of them. Pure over the rng so tests can seed it.
pub fn roll_normie_spawn<R: Rng>(rng: &mut R, current_normies: usize) -> Option<SpawnRoll> {
    if current_normies >= NORMIE_CAP {
        return None;
    }
    if !rng.gen_bool(NORMIE_SPAWN_CHANCE) {
        return None;
    }
    Some(SpawnRoll {
        health: rng.gen_range(NORMIE_HEALTH_RANGE),
        creds: rng.gen_range(NORMIE_CREDS_RANGE),
    })
}

/// Owns every occupant record. Room-scoped queries filter on the occupant's
/// current room id; there is no secondary index to keep consistent.
#[derive(Debug, Default)]
pub struct OccupantStore {
    players: BTreeMap<SessionId, Player>,
    npcs: BTreeMap<NpcId, Npc>,
    next_npc: u64,
}

impl OccupantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit_player(&mut self, player: Player) {
        self.players.insert(player.session, player);
    }

    pub fn remove_player(&mut self, session: SessionId) -> Option<Player> {
        self.players.remove(&session)
    }

    pub fn player(&self, session: SessionId) -> Option<&Player> {
        self.players.get(&session)
    }

    pub fn player_mut(&mut self, session: SessionId) -> Option<&mut Player> {
        self.players.get_mut(&session)
    }

    pub fn insert_npc(&mut self, mut npc: Npc) -> NpcId {
        self.next_npc += 1;
        let id = NpcId(self.next_npc);
        npc.id = id;
        self.npcs.insert(id, npc);
        id
    }

    pub fn remove_npc(&mut self, id: NpcId) -> Option<Npc> {
        self.npcs.remove(&id)
    }

    pub fn npc(&self, id: NpcId) -> Option<&Npc> {
        self.npcs.get(&id)
    }

    pub fn npc_mut(&mut self, id: NpcId) -> Option<&mut Npc> {
        self.npcs.get_mut(&id)
    }

    /// Mutable access to a player and an NPC at once (trade needs both sides
    /// of the counter).
    pub fn player_and_npc_mut(
        &mut self,
        session: SessionId,
        npc: NpcId,
    ) -> (Option<&mut Player>, Option<&mut Npc>) {
        (self.players.get_mut(&session), self.npcs.get_mut(&npc))
    }

    pub fn players_in_room(&self, room: &RoomId) -> Vec<&Player> {
        self.players.values().filter(|p| &p.room == room).collect()
    }

    pub fn npcs_in_room(&self, room: &RoomId) -> Vec<&Npc> {
        self.npcs.values().filter(|n| &n.room == room).collect()
    }

    pub fn normie_count(&self, room: &RoomId) -> usize {
        self.npcs
            .values()
            .filter(|n| &n.room == room && n.class == NpcClass::Normie)
            .count()
    }

    /// First NPC in the room whose name matches case-insensitively.
    pub fn find_npc_in_room(&self, room: &RoomId, name: &str) -> Option<&Npc> {
        self.npcs
            .values()
            .find(|n| &n.room == room && n.name.eq_ignore_ascii_case(name))
    }

    pub fn player_in_room_named(&self, room: &RoomId, name: &str) -> Option<&Player> {
        self.players
            .values()
            .find(|p| &p.room == room && p.name.eq_ignore_ascii_case(name))
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}
