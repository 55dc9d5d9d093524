//! Rate limiter for status announcements in chat.

use std::time::Duration;

use tokio::time::Instant;

/// Identical messages are suppressed for this long.
pub const DEDUPE_WINDOW: Duration = Duration::from_secs(5);

/// Minimum gap between any two announcements.
pub const COOLDOWN: Duration = Duration::from_secs(1);

/// Prefix of every announcement line.
pub const PREFIX: &str = "[Cambot] ";

#[derive(Debug, Clone, Default)]
pub struct Announcer {
    last: Option<(String, Instant)>,
}

impl Announcer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chat line to send, or `None` when the message is
    /// suppressed by verbosity, deduplication or cooldown.
    pub fn announce(&mut self, message: &str, now: Instant, verbose: bool) -> Option<String> {
        if !verbose {
            return None;
        }
        if let Some((last_message, at)) = &self.last {
            let elapsed = now.saturating_duration_since(*at);
            if last_message == message && elapsed < DEDUPE_WINDOW {
                return None;
            }
            if elapsed < COOLDOWN {
                return None;
            }
        }
        self.last = Some((message.to_string(), now));
        Some(format!("{PREFIX}{message}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_when_not_verbose() {
        let mut announcer = Announcer::new();
        assert_eq!(announcer.announce("hello", Instant::now(), false), None);
    }

    #[test]
    fn test_prefix() {
        let mut announcer = Announcer::new();
        assert_eq!(
            announcer.announce("hello", Instant::now(), true).as_deref(),
            Some("[Cambot] hello")
        );
    }

    #[test]
    fn test_identical_messages_deduped_for_five_seconds() {
        let mut announcer = Announcer::new();
        let start = Instant::now();
        assert!(announcer.announce("waiting", start, true).is_some());
        for secs in 1..5 {
            let now = start + Duration::from_secs(secs);
            assert!(announcer.announce("waiting", now, true).is_none());
        }
        assert!(
            announcer
                .announce("waiting", start + Duration::from_secs(5), true)
                .is_some()
        );
    }

    #[test]
    fn test_cooldown_applies_to_different_messages() {
        let mut announcer = Announcer::new();
        let start = Instant::now();
        assert!(announcer.announce("one", start, true).is_some());
        assert!(
            announcer
                .announce("two", start + Duration::from_millis(500), true)
                .is_none()
        );
        assert!(
            announcer
                .announce("two", start + Duration::from_millis(1000), true)
                .is_some()
        );
    }
}
