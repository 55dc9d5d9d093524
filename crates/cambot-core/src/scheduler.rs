//! Teleport scheduler: rotates the avatar through the online subjects.
//!
//! A deadline-driven state machine. The runtime feeds it session events
//! and wakes it at [`Scheduler::next_deadline`]; every transition pushes
//! [`Action`]s that the runtime sends. Only one relocation attempt or
//! dwell is ever in progress: `step` is a no-op while the scheduler is
//! `Attempting` or `Filming`, and only the transitions out of those
//! states call it again.

use std::collections::HashSet;
use std::mem;

use tokio::time::Instant;

use crate::announce::Announcer;
use crate::roster::{Queue, Roster};
use crate::session::{Action, SessionEvent, World};
use crate::settings::Settings;
use crate::verify::{Verification, VerificationResult};

/// Coarse scheduler state, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Queue empty, polling.
    Idle,
    /// Relocation in flight.
    Attempting,
    /// Dwell timer running on the locked subject.
    Filming,
    Stopped,
}

#[derive(Debug, Clone)]
enum Phase {
    /// Between transitions; `step` may run.
    Ready,
    Idle { poll_at: Instant },
    Attempting(Verification),
    Filming { until: Instant },
    Stopped,
}

pub struct Scheduler {
    roster: Roster,
    queue: Queue,
    /// Subjects that failed verification; skipped by roster snapshots.
    unreachable: HashSet<String>,
    lock: Option<String>,
    phase: Phase,
    debounce_at: Option<Instant>,
    announcer: Announcer,
    announced_first: bool,
    actions: Vec<Action>,
    rebuilds: u64,
    attempts: u64,
}

impl Scheduler {
    pub fn new(own_name: impl Into<String>) -> Self {
        Self {
            roster: Roster::new(own_name),
            queue: Queue::default(),
            unreachable: HashSet::new(),
            lock: None,
            phase: Phase::Ready,
            debounce_at: None,
            announcer: Announcer::new(),
            announced_first: false,
            actions: Vec::new(),
            rebuilds: 0,
            attempts: 0,
        }
    }

    /// Snapshots the live roster and takes the first step.
    pub fn start(&mut self, now: Instant, world: &impl World, settings: &Settings) -> Vec<Action> {
        tracing::info!("Teleport loop started");
        self.snapshot_roster(world);
        self.rebuild_queue();
        self.step(now, world, settings);
        self.drain()
    }

    /// Subject currently being filmed.
    pub fn lock(&self) -> Option<&str> {
        self.lock.as_deref()
    }

    pub fn state(&self) -> SchedulerState {
        match self.phase {
            Phase::Ready | Phase::Idle { .. } => SchedulerState::Idle,
            Phase::Attempting(_) => SchedulerState::Attempting,
            Phase::Filming { .. } => SchedulerState::Filming,
            Phase::Stopped => SchedulerState::Stopped,
        }
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Number of queue rebuilds so far.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Number of relocation commands issued so far.
    pub fn attempt_count(&self) -> u64 {
        self.attempts
    }

    /// Earliest pending timer, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.debounce_at, self.phase_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn handle_event(
        &mut self,
        event: &SessionEvent,
        now: Instant,
        world: &impl World,
        settings: &Settings,
    ) -> Vec<Action> {
        if matches!(self.phase, Phase::Stopped) {
            return Vec::new();
        }
        match event {
            SessionEvent::PlayerJoined(name) => self.on_joined(name, now, settings),
            SessionEvent::PlayerLeft(name) => self.on_left(name, now, world, settings),
            SessionEvent::Message(text) => {
                if let Phase::Attempting(verification) = &mut self.phase
                    && let Some(result) = verification.on_message(text)
                {
                    self.finish_attempt(result, now, world, settings);
                }
            }
            SessionEvent::Moved(position) => {
                if let Phase::Attempting(verification) = &mut self.phase
                    && let Some(result) = verification.on_moved(*position)
                {
                    self.finish_attempt(result, now, world, settings);
                }
            }
            SessionEvent::Ended => self.stop(),
        }
        self.drain()
    }

    /// Fires every timer due at `now`, earliest first.
    pub fn on_timer(&mut self, now: Instant, world: &impl World, settings: &Settings) -> Vec<Action> {
        let debounce_due = self.debounce_at.filter(|at| *at <= now);
        let phase_due = self.phase_deadline().filter(|at| *at <= now);

        match (debounce_due, phase_due) {
            (Some(debounce), Some(phase)) if phase < debounce => {
                self.fire_phase(now, world, settings);
                self.fire_debounce(now, world, settings);
            }
            (Some(_), Some(_)) => {
                self.fire_debounce(now, world, settings);
                self.fire_phase(now, world, settings);
            }
            (Some(_), None) => self.fire_debounce(now, world, settings),
            (None, Some(_)) => self.fire_phase(now, world, settings),
            (None, None) => {}
        }
        self.drain()
    }

    /// Tears down: clears timers and the lock; later input is ignored.
    pub fn stop(&mut self) {
        if matches!(self.phase, Phase::Stopped) {
            return;
        }
        tracing::info!("Teleport loop stopped");
        self.phase = Phase::Stopped;
        self.debounce_at = None;
        self.lock = None;
        self.actions.clear();
    }

    fn phase_deadline(&self) -> Option<Instant> {
        match &self.phase {
            Phase::Idle { poll_at } => Some(*poll_at),
            Phase::Attempting(verification) => Some(verification.deadline()),
            Phase::Filming { until } => Some(*until),
            Phase::Ready | Phase::Stopped => None,
        }
    }

    fn drain(&mut self) -> Vec<Action> {
        mem::take(&mut self.actions)
    }

    fn announce(&mut self, message: &str, now: Instant, settings: &Settings) {
        if let Some(line) = self.announcer.announce(message, now, settings.verbose) {
            self.actions.push(Action::Say(line));
        }
    }

    fn snapshot_roster(&mut self, world: &impl World) {
        for name in world.online_players() {
            if !self.unreachable.contains(&name) {
                self.roster.insert(&name);
            }
        }
    }

    fn rebuild_queue(&mut self) {
        self.queue.rebuild(&self.roster);
        self.rebuilds += 1;
        tracing::debug!(queue = ?self.queue.entries(), index = self.queue.index(), "Queue rebuilt");
    }

    fn step(&mut self, now: Instant, world: &impl World, settings: &Settings) {
        if !matches!(self.phase, Phase::Ready) {
            return;
        }

        let Some(target) = self.queue.current().map(str::to_string) else {
            tracing::debug!(poll_ms = settings.poll_ms, "No subjects online, waiting");
            self.announce("No players online. Waiting…", now, settings);
            self.phase = Phase::Idle {
                poll_at: now + settings.poll_interval(),
            };
            return;
        };

        tracing::info!(target = %target, "Teleport attempt");
        let origin = world.own_pose().map(|pose| pose.position);
        self.attempts += 1;
        self.actions.push(Action::Teleport {
            target: target.clone(),
        });
        self.phase = Phase::Attempting(Verification::new(
            target,
            origin,
            settings.min_delta,
            now + settings.verify_timeout(),
        ));
    }

    fn finish_attempt(
        &mut self,
        result: VerificationResult,
        now: Instant,
        world: &impl World,
        settings: &Settings,
    ) {
        let Phase::Attempting(verification) = mem::replace(&mut self.phase, Phase::Ready) else {
            return;
        };
        let target = verification.target().to_string();

        if result.success {
            tracing::info!(target = %target, reason = %result.reason, dwell_ms = settings.dwell_ms, "Teleport verified");
            let seconds = (settings.dwell().as_millis() + 500) / 1000;
            let verb = if self.announced_first {
                "Switched to"
            } else {
                "Teleported to"
            };
            self.announced_first = true;
            let message = format!(
                "{verb} {target}. Filming {seconds}s. Mode={}.",
                settings.view_mode
            );
            self.announce(&message, now, settings);
            self.lock = Some(target);
            self.phase = Phase::Filming {
                until: now + settings.dwell(),
            };
            return;
        }

        tracing::warn!(target = %target, reason = %result.reason, "Teleport not verified");
        self.announce(&format!("Teleport failed ({}).", result.reason), now, settings);
        self.lock = None;
        self.roster.remove(&target);
        self.unreachable.insert(target);
        self.rebuild_queue();
        self.step(now, world, settings);
    }

    fn fire_phase(&mut self, now: Instant, world: &impl World, settings: &Settings) {
        match &mut self.phase {
            Phase::Idle { poll_at } if *poll_at <= now => {
                self.phase = Phase::Ready;
                self.snapshot_roster(world);
                self.rebuild_queue();
                self.step(now, world, settings);
            }
            Phase::Attempting(verification) => {
                if let Some(result) = verification.on_deadline(now) {
                    self.finish_attempt(result, now, world, settings);
                }
            }
            Phase::Filming { until } if *until <= now => {
                tracing::debug!(subject = ?self.lock, "Dwell finished");
                self.phase = Phase::Ready;
                // A rebuild may already have moved the cursor off the subject.
                if self.queue.current() == self.lock.as_deref() {
                    self.queue.advance();
                }
                self.lock = None;
                self.step(now, world, settings);
            }
            _ => {}
        }
    }

    fn fire_debounce(&mut self, now: Instant, world: &impl World, settings: &Settings) {
        if !self.debounce_at.is_some_and(|at| at <= now) {
            return;
        }
        self.debounce_at = None;
        self.rebuild_queue();
        if matches!(self.phase, Phase::Idle { .. }) && !self.queue.is_empty() {
            self.phase = Phase::Ready;
            self.step(now, world, settings);
        }
    }

    fn on_joined(&mut self, name: &str, now: Instant, settings: &Settings) {
        // A rejoin is a fresh connection, so it gets another chance.
        self.unreachable.remove(name);
        if !self.roster.insert(name) {
            return;
        }
        tracing::debug!(name = %name, "Subject joined");
        if self.debounce_at.is_none() {
            self.debounce_at = Some(now + settings.debounce());
        }
    }

    fn on_left(&mut self, name: &str, now: Instant, world: &impl World, settings: &Settings) {
        self.roster.remove(name);
        self.rebuild_queue();

        if self.lock.as_deref() == Some(name) {
            tracing::info!(subject = %name, "Locked subject left");
            self.lock = None;
            self.phase = Phase::Ready;
            self.announce(&format!("{name} left. Continuing."), now, settings);
            self.step(now, world, settings);
        } else if matches!(&self.phase, Phase::Attempting(verification) if verification.target() == name) {
            // The rebuild already moved the cursor to the successor.
            tracing::info!(subject = %name, "Subject left during teleport attempt");
            self.phase = Phase::Ready;
            self.step(now, world, settings);
        }
    }
}
