//! One-shot startup check for relocation permission.
//!
//! Sends a self-relocation to an out-of-range coordinate. A server that
//! lets us teleport answers with a validation error, while one that
//! doesn't answers with a permission error or does not know the command.

use std::fmt;

use tokio::time::Instant;

use crate::classifier::{self, Feedback};
use crate::session::Action;

/// Deliberately invalid self-relocation used for probing.
pub const PROBE_COMMAND: &str = "/tp @s 0 1000000 0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Granted,
    Denied,
    /// No classifiable feedback before the deadline.
    Undetermined,
}

impl Capability {
    /// Fail-closed: only an explicit grant allows teleporting.
    pub fn allows_teleport(self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Undetermined => "undetermined",
        })
    }
}

impl From<Feedback> for Capability {
    fn from(feedback: Feedback) -> Self {
        match feedback {
            Feedback::PermissionDenied | Feedback::UnknownCommand => Self::Denied,
            Feedback::PlayerNotFound | Feedback::Accepted => Self::Granted,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CapabilityProbe {
    deadline: Instant,
    result: Option<Capability>,
}

impl CapabilityProbe {
    /// Starts the probe; the returned action must be sent exactly once.
    pub fn start(now: Instant, timeout: std::time::Duration) -> (Self, Action) {
        let probe = Self {
            deadline: now + timeout,
            result: None,
        };
        (probe, Action::Say(PROBE_COMMAND.to_string()))
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn result(&self) -> Option<Capability> {
        self.result
    }

    pub fn on_message(&mut self, text: &str) -> Option<Capability> {
        if self.result.is_some() {
            return None;
        }
        let capability = Capability::from(classifier::classify(text)?);
        self.result = Some(capability);
        Some(capability)
    }

    pub fn on_deadline(&mut self, now: Instant) -> Option<Capability> {
        if self.result.is_some() || now < self.deadline {
            return None;
        }
        self.result = Some(Capability::Undetermined);
        self.result
    }
}
