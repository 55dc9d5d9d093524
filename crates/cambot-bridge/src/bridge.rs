//! Inbound side of the bridge: stdin lines become cache updates, core
//! session events and chat command replies.

use cambot_core::{SessionEvent, SharedSettings, World};
use tokio::io::{AsyncBufRead, Lines};
use tokio::sync::mpsc;

use crate::command;
use crate::error::BridgeError;
use crate::link::Link;
use crate::protocol::{Inbound, OutboundMessage};
use crate::telemetry::Telemetry;

#[derive(Debug, Clone)]
pub struct Bridge {
    telemetry: Telemetry,
    settings: SharedSettings,
    link: Link,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl Bridge {
    pub fn new(
        telemetry: Telemetry,
        settings: SharedSettings,
        link: Link,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            telemetry,
            settings,
            link,
            events,
        }
    }

    pub fn handle_line(&self, line: &str) -> Result<(), BridgeError> {
        let inbound: Inbound = serde_json::from_str(line)?;
        self.handle(&inbound)
    }

    pub fn handle(&self, inbound: &Inbound) -> Result<(), BridgeError> {
        if let Inbound::Chat { username, message } = inbound {
            return self.on_chat(username, message);
        }
        if let Some(event) = self.telemetry.apply(inbound) {
            self.events.send(event).map_err(|_| BridgeError::Closed)?;
        }
        Ok(())
    }

    /// Tells the core the session is over.
    pub fn end(&self) {
        // The runtime may already be gone.
        let _ = self.events.send(SessionEvent::Ended);
    }

    fn on_chat(&self, username: &str, message: &str) -> Result<(), BridgeError> {
        if username == self.telemetry.username() {
            return Ok(());
        }
        let Some(response) = command::handle(&self.settings, message) else {
            return Ok(());
        };
        tracing::info!(from = %username, command = %message, "Chat command");

        for reply in response.replies {
            self.link.say(reply)?;
        }
        if response.changed == Some("viewDistance") {
            let view_distance = self.settings.read().view_distance;
            self.link.send(OutboundMessage::Settings { view_distance })?;
        }
        Ok(())
    }
}

/// Reads lines until the `spawn` message arrives and applies it.
pub async fn wait_for_spawn<R>(lines: &mut Lines<R>, telemetry: &Telemetry) -> Result<String, BridgeError>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        match serde_json::from_str::<Inbound>(&line) {
            Ok(inbound @ Inbound::Spawn { .. }) => {
                telemetry.apply(&inbound);
                return Ok(telemetry.username());
            }
            Ok(Inbound::End { .. }) => return Err(BridgeError::Closed),
            Ok(other) => tracing::debug!(?other, "Ignoring line before spawn"),
            Err(err) => tracing::warn!(error = %err, "Malformed line before spawn"),
        }
    }
    Err(BridgeError::Closed)
}

/// Feeds every remaining line to `bridge`, then ends the session.
///
/// Malformed lines are logged and skipped.
pub async fn read_lines<R>(mut lines: Lines<R>, bridge: Bridge) -> Result<(), BridgeError>
where
    R: AsyncBufRead + Unpin,
{
    let result = loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(()),
            Err(err) => break Err(err.into()),
        };
        if line.trim().is_empty() {
            continue;
        }
        match bridge.handle_line(&line) {
            Ok(()) => {}
            Err(BridgeError::Json(err)) => tracing::warn!(error = %err, line = %line, "Malformed line"),
            Err(err) => break Err(err),
        }
    };
    tracing::info!("Input closed");
    bridge.end();
    result
}

#[cfg(test)]
mod tests {
    use cambot_core::Settings;
    use tokio::io::{AsyncBufReadExt, BufReader};

    use super::*;

    struct Harness {
        bridge: Bridge,
        settings: SharedSettings,
        events: mpsc::UnboundedReceiver<SessionEvent>,
        outbound: mpsc::UnboundedReceiver<OutboundMessage>,
    }

    fn harness() -> Harness {
        let telemetry = Telemetry::new();
        let settings = Settings::default().into_shared();
        let (out_tx, outbound) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();
        let bridge = Bridge::new(telemetry, settings.clone(), Link::new(out_tx), event_tx);
        bridge
            .handle_line(r#"{"type":"spawn","username":"cambot","position":[0,64,0],"players":["cambot"]}"#)
            .unwrap();
        Harness {
            bridge,
            settings,
            events,
            outbound,
        }
    }

    #[test]
    fn test_events_forwarded() {
        let mut h = harness();
        h.bridge
            .handle_line(r#"{"type":"player_joined","name":"alex"}"#)
            .unwrap();
        h.bridge
            .handle_line(r#"{"type":"message","text":"Teleported cambot to alex"}"#)
            .unwrap();
        assert_eq!(
            h.events.try_recv().unwrap(),
            SessionEvent::PlayerJoined("alex".into())
        );
        assert_eq!(
            h.events.try_recv().unwrap(),
            SessionEvent::Message("Teleported cambot to alex".into())
        );
    }

    #[test]
    fn test_chat_command_replies() {
        let mut h = harness();
        h.bridge
            .handle_line(r#"{"type":"chat","username":"alex","message":"cambot dwellMs 5000"}"#)
            .unwrap();
        assert_eq!(
            h.outbound.try_recv().unwrap(),
            OutboundMessage::Say {
                text: "Camera setting 'dwellMs' updated.".into()
            }
        );
        assert_eq!(h.settings.read().dwell_ms, 5000);
        assert!(h.events.try_recv().is_err());
    }

    #[test]
    fn test_view_distance_change_is_forwarded() {
        let mut h = harness();
        h.bridge
            .handle_line(r#"{"type":"chat","username":"alex","message":"cambot viewDistance 10"}"#)
            .unwrap();
        h.outbound.try_recv().unwrap();
        assert_eq!(
            h.outbound.try_recv().unwrap(),
            OutboundMessage::Settings { view_distance: 10 }
        );
    }

    #[test]
    fn test_own_chat_ignored() {
        let mut h = harness();
        h.bridge
            .handle_line(r#"{"type":"chat","username":"cambot","message":"cambot verbose"}"#)
            .unwrap();
        assert!(h.outbound.try_recv().is_err());
        assert!(!h.settings.read().verbose);
    }

    #[test]
    fn test_malformed_line_is_json_error() {
        let h = harness();
        assert!(matches!(
            h.bridge.handle_line("not json"),
            Err(BridgeError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_wait_for_spawn_skips_noise() {
        let input: &[u8] = b"garbage\n{\"type\":\"message\",\"text\":\"hi\"}\n{\"type\":\"spawn\",\"username\":\"cambot\",\"position\":[0,64,0]}\n";
        let mut lines = BufReader::new(input).lines();
        let telemetry = Telemetry::new();
        let username = wait_for_spawn(&mut lines, &telemetry).await.unwrap();
        assert_eq!(username, "cambot");
    }

    #[tokio::test]
    async fn test_wait_for_spawn_eof() {
        let input: &[u8] = b"";
        let mut lines = BufReader::new(input).lines();
        assert!(matches!(
            wait_for_spawn(&mut lines, &Telemetry::new()).await,
            Err(BridgeError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_read_lines_ends_session_on_eof() {
        let mut h = harness();
        let input: &[u8] = b"{\"type\":\"player_left\",\"name\":\"alex\"}\nbroken\n\n";
        read_lines(BufReader::new(input).lines(), h.bridge.clone())
            .await
            .unwrap();
        assert_eq!(
            h.events.try_recv().unwrap(),
            SessionEvent::PlayerLeft("alex".into())
        );
        assert_eq!(h.events.try_recv().unwrap(), SessionEvent::Ended);
    }
}
