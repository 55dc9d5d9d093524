//! JSON-lines wire format between the game client process and the bridge.
//!
//! One JSON object per line, tagged by `type`. Vectors are `[x, y, z]`
//! arrays.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Lines read from stdin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    /// The avatar entered the world. Sent again on respawn.
    Spawn {
        username: String,
        position: DVec3,
        #[serde(default)]
        yaw: f64,
        #[serde(default)]
        pitch: f64,
        #[serde(default)]
        players: Vec<String>,
    },
    PlayerJoined {
        name: String,
    },
    PlayerLeft {
        name: String,
    },
    /// Server feedback or system text.
    Message {
        text: String,
    },
    /// Player chat.
    Chat {
        username: String,
        message: String,
    },
    /// Own position update.
    Move {
        position: DVec3,
        #[serde(default)]
        yaw: f64,
        #[serde(default)]
        pitch: f64,
    },
    /// Telemetry for a loaded player entity.
    Entity {
        name: String,
        position: DVec3,
        #[serde(default = "default_height")]
        height: f64,
    },
    EntityGone {
        name: String,
    },
    End {
        #[serde(default)]
        reason: Option<String>,
    },
}

fn default_height() -> f64 {
    1.8
}

/// Lines written to stdout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Chat line or slash command.
    Say { text: String },
    Teleport { target: String },
    SetGoal { position: DVec3, tolerance: f64 },
    LookAt { position: DVec3 },
    Settings { view_distance: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spawn() {
        let line = r#"{"type":"spawn","username":"cambot","position":[1.0,64.0,-3.5],"players":["cambot","alex"]}"#;
        let inbound: Inbound = serde_json::from_str(line).unwrap();
        assert_eq!(
            inbound,
            Inbound::Spawn {
                username: "cambot".into(),
                position: DVec3::new(1.0, 64.0, -3.5),
                yaw: 0.0,
                pitch: 0.0,
                players: vec!["cambot".into(), "alex".into()],
            }
        );
    }

    #[test]
    fn test_parse_entity_default_height() {
        let line = r#"{"type":"entity","name":"alex","position":[0,64,0]}"#;
        let inbound: Inbound = serde_json::from_str(line).unwrap();
        assert!(matches!(inbound, Inbound::Entity { height, .. } if (height - 1.8).abs() < f64::EPSILON));
    }

    #[test]
    fn test_parse_end_without_reason() {
        let inbound: Inbound = serde_json::from_str(r#"{"type":"end"}"#).unwrap();
        assert_eq!(inbound, Inbound::End { reason: None });
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(serde_json::from_str::<Inbound>(r#"{"type":"dance"}"#).is_err());
    }

    #[test]
    fn test_serialize_outbound() {
        let message = OutboundMessage::SetGoal {
            position: DVec3::new(1.0, 2.0, 3.0),
            tolerance: 1.0,
        };
        assert_eq!(
            serde_json::to_string(&message).unwrap(),
            r#"{"type":"set_goal","position":[1.0,2.0,3.0],"tolerance":1.0}"#
        );

        let message = OutboundMessage::Settings { view_distance: 6 };
        assert_eq!(
            serde_json::to_string(&message).unwrap(),
            r#"{"type":"settings","view_distance":6}"#
        );
    }
}
