//! Outbound side of the bridge: every command becomes one queued line.

use cambot_core::{Outbound, Pathfinder, PathfinderError};
use glam::DVec3;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::error::BridgeError;
use crate::protocol::OutboundMessage;

/// Handle onto the writer task. Clones share the same queue.
#[derive(Debug, Clone)]
pub struct Link {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl Link {
    pub fn new(tx: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self { tx }
    }

    pub fn send(&self, message: OutboundMessage) -> Result<(), BridgeError> {
        self.tx.send(message).map_err(|_| BridgeError::Closed)
    }

    pub fn say(&self, text: impl Into<String>) -> Result<(), BridgeError> {
        self.send(OutboundMessage::Say { text: text.into() })
    }
}

impl Outbound for Link {
    fn send_teleport(&mut self, target: &str) {
        if let Err(err) = self.send(OutboundMessage::Teleport {
            target: target.to_string(),
        }) {
            tracing::error!(target = %target, error = %err, "Failed to queue teleport");
        }
    }

    fn send_text(&mut self, text: &str) {
        if let Err(err) = self.say(text) {
            tracing::error!(error = %err, "Failed to queue text");
        }
    }
}

impl Pathfinder for Link {
    fn set_goal_near(&mut self, position: DVec3, tolerance: f64) -> Result<(), PathfinderError> {
        self.send(OutboundMessage::SetGoal {
            position,
            tolerance,
        })
        .map_err(|err| PathfinderError::Unavailable(err.to_string()))
    }

    fn look_at(&mut self, point: DVec3) -> Result<(), PathfinderError> {
        self.send(OutboundMessage::LookAt { position: point })
            .map_err(|err| PathfinderError::Unavailable(err.to_string()))
    }
}

/// Drains the queue into `writer`, one JSON object per line, until every
/// [`Link`] is dropped.
pub async fn write_lines<W>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<OutboundMessage>,
) -> Result<(), BridgeError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}
