//! Heuristic verification of a single relocation attempt.
//!
//! Two signal sources race until the deadline: server feedback text and
//! the avatar's own position. Displacement is the ground truth; a success
//! phrase is only a faster confirmation. Failure phrases resolve the
//! attempt immediately, and once resolved an attempt never changes.

use std::fmt;

use glam::DVec3;
use tokio::time::Instant;

use crate::classifier::{self, Feedback};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationReason {
    Permission,
    PlayerNotFound,
    ServerMessage,
    PositionChanged,
    Timeout,
}

impl VerificationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Permission => "permission",
            Self::PlayerNotFound => "player_not_found",
            Self::ServerMessage => "server_message",
            Self::PositionChanged => "position_changed",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for VerificationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationResult {
    pub success: bool,
    pub reason: VerificationReason,
}

impl VerificationResult {
    pub fn succeeded(reason: VerificationReason) -> Self {
        Self {
            success: true,
            reason,
        }
    }

    pub fn failed(reason: VerificationReason) -> Self {
        Self {
            success: false,
            reason,
        }
    }
}

impl From<Feedback> for VerificationResult {
    fn from(feedback: Feedback) -> Self {
        let reason = match feedback {
            Feedback::PermissionDenied => VerificationReason::Permission,
            Feedback::PlayerNotFound => VerificationReason::PlayerNotFound,
            Feedback::UnknownCommand | Feedback::Accepted => VerificationReason::ServerMessage,
        };
        if feedback.is_failure() {
            Self::failed(reason)
        } else {
            Self::succeeded(reason)
        }
    }
}

/// An in-flight relocation attempt.
#[derive(Debug, Clone)]
pub struct Verification {
    target: String,
    origin: Option<DVec3>,
    min_delta: f64,
    deadline: Instant,
    result: Option<VerificationResult>,
}

impl Verification {
    /// `origin` is the avatar position recorded right before the command
    /// was sent; without it displacement cannot be observed.
    pub fn new(target: String, origin: Option<DVec3>, min_delta: f64, deadline: Instant) -> Self {
        Self {
            target,
            origin,
            min_delta,
            deadline,
            result: None,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn result(&self) -> Option<VerificationResult> {
        self.result
    }

    /// Feeds one line of server feedback.
    pub fn on_message(&mut self, text: &str) -> Option<VerificationResult> {
        if self.result.is_some() {
            return None;
        }
        let feedback = classifier::classify(text)?;
        self.resolve(feedback.into())
    }

    /// Feeds an own-position update.
    pub fn on_moved(&mut self, position: DVec3) -> Option<VerificationResult> {
        if self.result.is_some() {
            return None;
        }
        let origin = self.origin?;
        if origin.distance(position) >= self.min_delta {
            return self.resolve(VerificationResult::succeeded(
                VerificationReason::PositionChanged,
            ));
        }
        None
    }

    /// Fails the attempt with `Timeout` once `now` reaches the deadline.
    pub fn on_deadline(&mut self, now: Instant) -> Option<VerificationResult> {
        if self.result.is_some() || now < self.deadline {
            return None;
        }
        self.resolve(VerificationResult::failed(VerificationReason::Timeout))
    }

    fn resolve(&mut self, result: VerificationResult) -> Option<VerificationResult> {
        self.result = Some(result);
        Some(result)
    }
}
