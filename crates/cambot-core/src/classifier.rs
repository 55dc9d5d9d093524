//! Classification of free-text server feedback.
//!
//! The game protocol never acknowledges a relocation command in a
//! structured way, so the only textual signal is whatever the server
//! prints back. Categories are checked in a fixed order and the first
//! match wins: every failure category is listed before the success
//! category, so a line that mentions both a denial and e.g. "teleported"
//! is always treated as a denial.

/// Outcome tag for a line of feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feedback {
    PermissionDenied,
    /// The named player or selector matched nothing.
    PlayerNotFound,
    UnknownCommand,
    /// The server accepted or at least parsed the command.
    Accepted,
}

impl Feedback {
    pub fn is_failure(self) -> bool {
        !matches!(self, Self::Accepted)
    }
}

/// Phrase table in priority order.
const RULES: &[(Feedback, &[&str])] = &[
    (Feedback::PermissionDenied, &["permission"]),
    (
        Feedback::PlayerNotFound,
        &["player not found", "no entity was found"],
    ),
    (
        Feedback::UnknownCommand,
        &["unknown or incomplete command", "unknown command"],
    ),
    (
        Feedback::Accepted,
        &["teleported", "invalid", "too high", "expected"],
    ),
];

/// Maps a feedback line to its category, or `None` when nothing matches.
pub fn classify(text: &str) -> Option<Feedback> {
    let lower = text.to_lowercase();
    if lower.trim().is_empty() {
        return None;
    }
    RULES
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|phrase| lower.contains(phrase)))
        .map(|(feedback, _)| *feedback)
}
