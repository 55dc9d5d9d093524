//! Interfaces to the external collaborators.
//!
//! The core never talks to the game directly: it reads telemetry through
//! [`World`], issues best-effort commands through [`Outbound`], hands goal
//! points to a [`Pathfinder`], and reacts to [`SessionEvent`]s delivered
//! through a single queue.

use glam::DVec3;

use crate::geometry::{Pose, Subject};

/// Events delivered by the game session, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PlayerJoined(String),
    PlayerLeft(String),
    /// Free-text feedback printed by the server.
    Message(String),
    /// The avatar's own position changed.
    Moved(DVec3),
    Ended,
}

/// Commands produced by the state machines for the runtime to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Relocate the avatar to the named subject.
    Teleport { target: String },
    /// Send a raw text line (chat or slash command).
    Say(String),
}

/// Read-only view of live session telemetry.
pub trait World {
    /// Name of the controlled avatar.
    fn username(&self) -> String;

    /// Names of every connected participant, possibly including the avatar.
    fn online_players(&self) -> Vec<String>;

    fn own_pose(&self) -> Option<Pose>;

    /// Live telemetry of a participant, `None` when not loaded.
    fn subject(&self, name: &str) -> Option<Subject>;
}

/// Outbound operations of the session. Delivery is best effort.
pub trait Outbound {
    fn send_teleport(&mut self, target: &str);

    fn send_text(&mut self, text: &str);
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PathfinderError {
    #[error("Pathfinder is not available: {0}")]
    Unavailable(String),

    #[error("Goal rejected: {0}")]
    Rejected(String),
}

/// Locomotion subsystem that moves the avatar towards goal points.
pub trait Pathfinder {
    /// Move to within `tolerance` of `position`.
    fn set_goal_near(&mut self, position: DVec3, tolerance: f64) -> Result<(), PathfinderError>;

    /// Turn to face `point`.
    fn look_at(&mut self, point: DVec3) -> Result<(), PathfinderError>;
}

impl Action {
    /// Forwards this action to the session.
    pub fn send(&self, outbound: &mut impl Outbound) {
        match self {
            Self::Teleport { target } => outbound.send_teleport(target),
            Self::Say(text) => outbound.send_text(text),
        }
    }
}
