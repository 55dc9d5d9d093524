//! Live telemetry cache fed by inbound lines and read by the core.

use std::collections::HashMap;
use std::sync::Arc;

use cambot_core::{Pose, SessionEvent, Subject, World};
use parking_lot::RwLock;

use crate::protocol::Inbound;

#[derive(Debug, Default)]
struct TelemetryState {
    username: String,
    players: Vec<String>,
    pose: Option<Pose>,
    entities: HashMap<String, Subject>,
}

/// Cheap to clone; every clone sees the same cache.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    state: Arc<RwLock<TelemetryState>>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the cache and returns the session event the line carries,
    /// if any. Chat is not handled here.
    pub fn apply(&self, inbound: &Inbound) -> Option<SessionEvent> {
        let mut state = self.state.write();
        match inbound {
            Inbound::Spawn {
                username,
                position,
                yaw,
                pitch,
                players,
            } => {
                let respawn = state.pose.is_some();
                state.username.clone_from(username);
                state.players.clone_from(players);
                state.pose = Some(Pose::new(*position, *yaw, *pitch));
                respawn.then_some(SessionEvent::Moved(*position))
            }
            Inbound::PlayerJoined { name } => {
                if !state.players.contains(name) {
                    state.players.push(name.clone());
                }
                Some(SessionEvent::PlayerJoined(name.clone()))
            }
            Inbound::PlayerLeft { name } => {
                state.players.retain(|player| player != name);
                state.entities.remove(name);
                Some(SessionEvent::PlayerLeft(name.clone()))
            }
            Inbound::Message { text } => Some(SessionEvent::Message(text.clone())),
            Inbound::Move {
                position,
                yaw,
                pitch,
            } => {
                state.pose = Some(Pose::new(*position, *yaw, *pitch));
                Some(SessionEvent::Moved(*position))
            }
            Inbound::Entity {
                name,
                position,
                height,
            } => {
                state
                    .entities
                    .insert(name.clone(), Subject::new(*position, *height));
                None
            }
            Inbound::EntityGone { name } => {
                state.entities.remove(name);
                None
            }
            Inbound::End { reason } => {
                tracing::info!(reason = reason.as_deref().unwrap_or("unknown"), "Session ended by client");
                Some(SessionEvent::Ended)
            }
            Inbound::Chat { .. } => None,
        }
    }
}

impl World for Telemetry {
    fn username(&self) -> String {
        self.state.read().username.clone()
    }

    fn online_players(&self) -> Vec<String> {
        self.state.read().players.clone()
    }

    fn own_pose(&self) -> Option<Pose> {
        self.state.read().pose
    }

    fn subject(&self, name: &str) -> Option<Subject> {
        self.state.read().entities.get(name).copied()
    }
}
