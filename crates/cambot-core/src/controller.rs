//! The session-scoped controller owning every piece of core state.
//!
//! Built once per session and dropped at session end. Sequences the
//! capability probe before the scheduler, and resolves the locked subject
//! before every movement tick.

use std::mem;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tokio::time::Instant;

use crate::geometry::Subject;
use crate::movement::{MovementController, TickOutcome};
use crate::probe::{Capability, CapabilityProbe};
use crate::scheduler::Scheduler;
use crate::session::{Action, Pathfinder, SessionEvent, World};
use crate::settings::{Settings, SharedSettings};

/// Sent once when relocation is not available.
pub const UNAVAILABLE_NOTICE: &str = "cambot can't teleport";

enum Phase {
    Created,
    Probing(CapabilityProbe),
    Running(Scheduler),
    Unavailable,
    Ended,
}

pub struct Controller<R = ChaCha8Rng> {
    settings: SharedSettings,
    phase: Phase,
    movement: MovementController<R>,
    capability: Option<Capability>,
}

impl<R: Rng> Controller<R> {
    pub fn new(settings: SharedSettings, movement: MovementController<R>) -> Self {
        Self {
            settings,
            phase: Phase::Created,
            movement,
            capability: None,
        }
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// Probe result, once known.
    pub fn capability(&self) -> Option<Capability> {
        self.capability
    }

    pub fn scheduler(&self) -> Option<&Scheduler> {
        match &self.phase {
            Phase::Running(scheduler) => Some(scheduler),
            _ => None,
        }
    }

    pub fn lock(&self) -> Option<&str> {
        self.scheduler().and_then(Scheduler::lock)
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Ended)
    }

    /// Switches game mode and launches the capability probe.
    pub fn start(&mut self, now: Instant) -> Vec<Action> {
        if !matches!(self.phase, Phase::Created) {
            return Vec::new();
        }
        let settings = self.snapshot();
        tracing::info!(gamemode = %settings.gamemode, "Controller started");

        let (probe, probe_action) = CapabilityProbe::start(now, settings.probe_timeout());
        self.phase = Phase::Probing(probe);
        vec![
            Action::Say(format!("/gamemode {}", settings.gamemode)),
            probe_action,
        ]
    }

    pub fn handle_event(&mut self, event: &SessionEvent, now: Instant, world: &impl World) -> Vec<Action> {
        if matches!(event, SessionEvent::Ended) {
            self.end();
            return Vec::new();
        }

        let settings = self.snapshot();
        match &mut self.phase {
            Phase::Probing(probe) => {
                if let SessionEvent::Message(text) = event
                    && let Some(capability) = probe.on_message(text)
                {
                    return self.on_capability(capability, now, world, &settings);
                }
                Vec::new()
            }
            Phase::Running(scheduler) => scheduler.handle_event(event, now, world, &settings),
            Phase::Created | Phase::Unavailable | Phase::Ended => Vec::new(),
        }
    }

    pub fn on_timer(&mut self, now: Instant, world: &impl World) -> Vec<Action> {
        let settings = self.snapshot();
        match &mut self.phase {
            Phase::Probing(probe) => match probe.on_deadline(now) {
                Some(capability) => self.on_capability(capability, now, world, &settings),
                None => Vec::new(),
            },
            Phase::Running(scheduler) => scheduler.on_timer(now, world, &settings),
            Phase::Created | Phase::Unavailable | Phase::Ended => Vec::new(),
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.phase {
            Phase::Probing(probe) => Some(probe.deadline()),
            Phase::Running(scheduler) => scheduler.next_deadline(),
            Phase::Created | Phase::Unavailable | Phase::Ended => None,
        }
    }

    /// The locked subject's live telemetry, or `None` when nothing is
    /// locked or the subject is not loaded or out of range.
    pub fn resolve_subject(&self, world: &impl World, settings: &Settings) -> Option<(String, Subject)> {
        let name = self.lock()?;
        let subject = world.subject(name)?;
        if let Some(own) = world.own_pose()
            && own.position.distance(subject.position) > settings.entity_search_radius
        {
            tracing::debug!(subject = %name, "Locked subject out of range");
            return None;
        }
        Some((name.to_string(), subject))
    }

    /// One movement tick. Errors are logged and the tick skipped.
    pub fn tick_movement(
        &mut self,
        now: Instant,
        world: &impl World,
        pathfinder: &mut impl Pathfinder,
    ) -> Option<TickOutcome> {
        if !self.is_active() {
            return None;
        }
        let settings = self.snapshot();
        let (name, subject) = self.resolve_subject(world, &settings)?;
        let own = world.own_pose()?;

        match self
            .movement
            .tick(now, &name, &subject, &own, &settings, pathfinder)
        {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                tracing::warn!(subject = %name, error = %err, "Movement tick skipped");
                None
            }
        }
    }

    fn snapshot(&self) -> Settings {
        self.settings.read().clone()
    }

    fn on_capability(
        &mut self,
        capability: Capability,
        now: Instant,
        world: &impl World,
        settings: &Settings,
    ) -> Vec<Action> {
        self.capability = Some(capability);
        if !capability.allows_teleport() {
            tracing::warn!(%capability, "Teleport capability unavailable");
            self.phase = Phase::Unavailable;
            return vec![Action::Say(UNAVAILABLE_NOTICE.to_string())];
        }

        tracing::info!(%capability, "Teleport capability confirmed");
        let mut scheduler = Scheduler::new(world.username());
        let actions = scheduler.start(now, world, settings);
        self.phase = Phase::Running(scheduler);
        actions
    }

    fn end(&mut self) {
        if let Phase::Running(mut scheduler) = mem::replace(&mut self.phase, Phase::Ended) {
            scheduler.stop();
        }
        self.movement.reset();
        tracing::info!("Session ended");
    }
}
