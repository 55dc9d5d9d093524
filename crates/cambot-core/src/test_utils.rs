//! In-memory collaborators for unit tests.

use std::collections::HashMap;

use glam::DVec3;

use crate::geometry::{Pose, Subject};
use crate::session::{Outbound, Pathfinder, PathfinderError, World};

/// Fixed telemetry: the avatar stands at the origin on y=64, every
/// player stands ten blocks in front of it.
#[derive(Debug, Clone)]
pub(crate) struct FakeWorld {
    pub username: String,
    pub players: Vec<String>,
    pub pose: Option<Pose>,
    pub subjects: HashMap<String, Subject>,
}

impl FakeWorld {
    pub fn new(username: &str, players: &[&str]) -> Self {
        let subjects = players
            .iter()
            .map(|name| {
                (
                    (*name).to_string(),
                    Subject::new(DVec3::new(0.0, 64.0, -10.0), 1.8),
                )
            })
            .collect();
        Self {
            username: username.to_string(),
            players: players.iter().map(|name| (*name).to_string()).collect(),
            pose: Some(Pose::new(DVec3::new(0.0, 64.0, 0.0), 0.0, 0.0)),
            subjects,
        }
    }
}

impl World for FakeWorld {
    fn username(&self) -> String {
        self.username.clone()
    }

    fn online_players(&self) -> Vec<String> {
        self.players.clone()
    }

    fn own_pose(&self) -> Option<Pose> {
        self.pose
    }

    fn subject(&self, name: &str) -> Option<Subject> {
        self.subjects.get(name).copied()
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeOutbound {
    pub teleports: Vec<String>,
    pub texts: Vec<String>,
}

impl Outbound for FakeOutbound {
    fn send_teleport(&mut self, target: &str) {
        self.teleports.push(target.to_string());
    }

    fn send_text(&mut self, text: &str) {
        self.texts.push(text.to_string());
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakePathfinder {
    pub looks: Vec<DVec3>,
    pub goals: Vec<(DVec3, f64)>,
    /// Reject every command.
    pub fail: bool,
}

impl Pathfinder for FakePathfinder {
    fn set_goal_near(&mut self, position: DVec3, tolerance: f64) -> Result<(), PathfinderError> {
        if self.fail {
            return Err(PathfinderError::Rejected("goal".to_string()));
        }
        self.goals.push((position, tolerance));
        Ok(())
    }

    fn look_at(&mut self, point: DVec3) -> Result<(), PathfinderError> {
        if self.fail {
            return Err(PathfinderError::Unavailable("test".to_string()));
        }
        self.looks.push(point);
        Ok(())
    }
}
