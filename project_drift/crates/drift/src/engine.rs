use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use net::channels::OutputTx;
use net::http::{CreditSink, GrantError};
use net::protocol::{ClientCommand, EventFrame, ServerEvent};
use net::ws_server::SessionHandler;
use observability::CommandTimer;
use session::{OutboundFrame, SessionId};
use space::{ContentGenerator, Room, RoomId};

use crate::dispatcher;
use crate::error::GameError;
use crate::events::{system, Audience, Outgoing};
use crate::occupant::{
    self, Npc, NpcClass, NpcId, NpcProfileGenerator, Player, SpawnRoll, NORMIE_ATTACK, NORMIE_CAP,
};
use crate::state::GameState;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub spawn_room: RoomId,
    pub topup_base_url: String,
}

/// The single writer of world state. All commands funnel through here; the
/// mutex is taken for synchronous stretches only and is never held across an
/// await. The two collaborator calls are the only suspension points.
pub struct Engine {
    state: Mutex<GameState>,
    output: OutputTx,
    content: Arc<dyn ContentGenerator>,
    profiles: Arc<dyn NpcProfileGenerator>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        state: GameState,
        output: OutputTx,
        content: Arc<dyn ContentGenerator>,
        profiles: Arc<dyn NpcProfileGenerator>,
        config: EngineConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
            output,
            content,
            profiles,
            config,
        })
    }

    /// Resolve audiences against the current occupancy and push frames to
    /// the output router. Called with the lock held so every broadcast sees
    /// one consistent world ordering.
    fn deliver(&self, state: &GameState, batch: Vec<Outgoing>) {
        for outgoing in batch {
            let recipients: Vec<SessionId> = match &outgoing.audience {
                Audience::Session(sid) => vec![*sid],
                Audience::Room { room, exclude } => state.session_ids_in_room(room, *exclude),
            };
            if recipients.is_empty() {
                continue;
            }
            let frame = EventFrame::now(outgoing.event);
            match serde_json::to_string(&frame) {
                Ok(json) => {
                    for sid in recipients {
                        let _ = self.output.send(OutboundFrame::new(sid, json.clone()));
                    }
                }
                Err(e) => tracing::error!("failed to serialize event frame: {e}"),
            }
        }
    }

    fn send_error(&self, session: SessionId, error: &GameError) {
        match error {
            GameError::Expansion(cause) => {
                tracing::warn!(session = session.0, %cause, "world expansion failed");
            }
            GameError::Glitch(detail) => {
                tracing::warn!(session = session.0, detail = %detail, "invariant violation surfaced as refusal");
            }
            GameError::Refusal(_) => {}
        }
        let frame = EventFrame::now(ServerEvent::Error {
            message: error.to_string(),
        });
        if let Ok(json) = serde_json::to_string(&frame) {
            let _ = self.output.send(OutboundFrame::new(session, json));
        }
    }

    pub async fn handle_command(&self, session: SessionId, command: ClientCommand) {
        let timer = CommandTimer::start(command.label(), session.0);
        let result = match &command {
            ClientCommand::Move { direction } => self.handle_move(session, direction).await,
            other => {
                let mut state = self.state.lock().unwrap();
                dispatcher::dispatch_sync(
                    &mut state,
                    session,
                    other,
                    &self.config.topup_base_url,
                    Utc::now(),
                )
                .map(|events| self.deliver(&state, events))
            }
        };
        if let Err(error) = result {
            self.send_error(session, &error);
        }
        timer.finish();
    }

    /// The one multi-phase command. Each phase is its own critical section;
    /// between them the world may change under our feet, so every phase
    /// revalidates what it needs.
    async fn handle_move(&self, session: SessionId, direction: &str) -> Result<(), GameError> {
        let direction = direction.trim();
        if direction.is_empty() {
            return Err(GameError::refusal("Which way? Name a direction."));
        }

        enum Resolution {
            Known(RoomId),
            NeedsExpansion(Room),
        }

        let resolution = {
            let state = self.state.lock().unwrap();
            let player = state
                .occupants
                .player(session)
                .ok_or_else(GameError::no_player)?;
            let room = state
                .rooms
                .get(&player.room)
                .ok_or_else(|| GameError::glitch(format!("player in unknown room {}", player.room)))?;
            match room.exit(direction) {
                Some(exit) => match &exit.target {
                    Some(target) if state.rooms.contains(target) => {
                        Resolution::Known(target.clone())
                    }
                    Some(target) => {
                        tracing::warn!(
                            room = %room.id,
                            direction,
                            target = %target,
                            "exit points at a room missing from the table"
                        );
                        return Err(GameError::refusal(format!(
                            "The way {direction} is blocked."
                        )));
                    }
                    None => Resolution::NeedsExpansion(room.clone()),
                },
                None => Resolution::NeedsExpansion(room.clone()),
            }
        };

        let destination = match resolution {
            Resolution::Known(id) => id,
            Resolution::NeedsExpansion(origin) => {
                // Suspension point: the lock is released while the generator
                // runs. Two sessions can race through here; both insert a
                // room, the later exit write wins.
                let seeds = self.content.expand(&origin, direction).await?;
                let seed = seeds
                    .into_iter()
                    .next()
                    .ok_or(space::ExpandError::EmptyBatch)?;

                let mut state = self.state.lock().unwrap();
                state
                    .rooms
                    .admit_generated(&origin.id, direction, seed, Utc::now())
                    .ok_or_else(|| GameError::glitch(format!("origin room {} vanished", origin.id)))?
            }
        };

        self.maybe_spawn_normie(&destination).await;

        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        if !state.rooms.contains(&destination) {
            return Err(GameError::glitch(format!(
                "destination room {destination} vanished before arrival"
            )));
        }
        let (name, old_room) = {
            let player = state
                .occupants
                .player_mut(session)
                .ok_or_else(GameError::no_player)?;
            let old_room = player.room.clone();
            player.room = destination.clone();
            player.last_active = Utc::now();
            (player.name.clone(), old_room)
        };

        let mut events = Vec::new();
        if old_room != destination {
            events.push(Outgoing::room_except(
                old_room,
                session,
                system(format!("{name} heads {direction}.")),
            ));
            events.push(Outgoing::room_except(
                destination.clone(),
                session,
                system(format!("{name} arrives.")),
            ));
        }
        events.extend(dispatcher::look(state, session)?);
        self.deliver(state, events);
        Ok(())
    }

    /// Best-effort Normie spawn on room entry. Profile failures are logged
    /// and swallowed; the move continues either way.
    async fn maybe_spawn_normie(&self, room: &RoomId) {
        let roll: Option<SpawnRoll> = {
            let state = self.state.lock().unwrap();
            if !state.rooms.contains(room) {
                None
            } else {
                let count = state.occupants.normie_count(room);
                let mut rng = rand::thread_rng();
                occupant::roll_normie_spawn(&mut rng, count)
            }
        };
        let Some(roll) = roll else { return };

        let profile = match self.profiles.profile(roll.health).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(room = %room, "npc profile generation failed: {e}");
                return;
            }
        };

        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        // the cap could have been reached while we awaited the profile
        if state.occupants.normie_count(room) >= NORMIE_CAP {
            return;
        }
        let name = profile.name.clone();
        state.occupants.insert_npc(Npc {
            id: NpcId(0),
            name: name.clone(),
            description: Some(profile.description),
            health: roll.health,
            max_health: roll.health,
            attack: NORMIE_ATTACK,
            creds: roll.creds,
            room: room.clone(),
            class: NpcClass::Normie,
            stock: vec![],
        });
        self.deliver(
            state,
            vec![Outgoing::room(
                room.clone(),
                system(format!("{name} shuffles out of the mist.")),
            )],
        );
    }

    /// Push a farewell frame to every connected session (used at shutdown).
    pub fn broadcast_farewell(&self, message: &str) {
        let state = self.state.lock().unwrap();
        let frame = EventFrame::now(system(message));
        if let Ok(json) = serde_json::to_string(&frame) {
            for sid in state.sessions.all_ids() {
                let _ = self.output.send(OutboundFrame::closing(sid, json.clone()));
            }
        }
    }

    pub fn player_count(&self) -> usize {
        self.state.lock().unwrap().occupants.player_count()
    }
}

#[async_trait]
impl SessionHandler for Engine {
    async fn session_opened(&self, session: SessionId) {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let now = Utc::now();
        state.sessions.admit_with_id(session, now);

        let name = format!("Drifter-{}", session.0);
        let player = Player::new(session, name.clone(), self.config.spawn_room.clone(), now);
        let player_wire = GameState::player_wire(&player);
        state.occupants.admit_player(player);

        let Some(room) = state.rooms.get(&self.config.spawn_room) else {
            tracing::error!(room = %self.config.spawn_room, "spawn room missing from the table");
            self.send_error(session, &GameError::glitch("spawn room missing"));
            return;
        };
        let events = vec![
            Outgoing::to(
                session,
                ServerEvent::Welcome {
                    player: player_wire,
                    room: GameState::room_wire(room),
                },
            ),
            Outgoing::room_except(
                self.config.spawn_room.clone(),
                session,
                system(format!("{name} condenses out of the drift.")),
            ),
        ];
        self.deliver(state, events);
        tracing::info!(session = session.0, "player admitted");
    }

    async fn command(&self, session: SessionId, command: ClientCommand) {
        self.handle_command(session, command).await;
    }

    async fn malformed(&self, session: SessionId, detail: String) {
        tracing::debug!(session = session.0, detail = %detail, "malformed command");
        let frame = EventFrame::now(ServerEvent::Error {
            message: "That made no sense. Check the command and try again.".to_string(),
        });
        if let Ok(json) = serde_json::to_string(&frame) {
            let _ = self.output.send(OutboundFrame::new(session, json));
        }
    }

    async fn session_closed(&self, session: SessionId) {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        if !state.sessions.remove(session) {
            return; // already cleaned up
        }
        if let Some(player) = state.occupants.remove_player(session) {
            self.deliver(
                state,
                vec![Outgoing::room(
                    player.room.clone(),
                    system(format!("{} thins out and is gone.", player.name)),
                )],
            );
        }
        tracing::info!(session = session.0, "session closed");
    }
}

#[async_trait]
impl CreditSink for Engine {
    async fn grant(&self, session: SessionId, amount: i64) -> Result<i64, GrantError> {
        if amount <= 0 {
            return Err(GrantError::InvalidAmount);
        }
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let player = state
            .occupants
            .player_mut(session)
            .ok_or(GrantError::UnknownSession)?;
        player.creds += amount;
        let balance = player.creds;
        self.deliver(
            state,
            vec![Outgoing::to(
                session,
                system(format!(
                    "The paymaster nods. +{amount} creds (balance {balance})."
                )),
            )],
        );
        tracing::info!(session = session.0, amount, balance, "creds granted");
        Ok(balance)
    }
}
