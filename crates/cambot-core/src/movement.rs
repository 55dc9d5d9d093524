//! Camera movement around the locked subject.
//!
//! One [`MovementController::tick`] per second: resolve the view mode,
//! aim at the subject's head, compute where the camera should stand,
//! smooth it and hand it to the pathfinder when the throttle allows.

use std::f64::consts::TAU;

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::time::Instant;

use crate::geometry::{Pose, Subject, horizontal_distance};
use crate::session::{Pathfinder, PathfinderError};
use crate::settings::{Settings, ViewMode};
use crate::smoother::{GoalSmoother, SmoothingParams};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MovementError {
    #[error("Non-finite {0}")]
    NonFinite(&'static str),

    #[error(transparent)]
    Pathfinder(#[from] PathfinderError),
}

/// What a tick did, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    pub mode: ViewMode,
    pub look_at: DVec3,
    /// Smoothed goal, dispatched or not.
    pub goal: DVec3,
    pub dispatched: bool,
}

pub struct MovementController<R = ChaCha8Rng> {
    rng: R,
    circle_angle: f64,
    smoother: GoalSmoother,
    following: Option<String>,
}

impl MovementController<ChaCha8Rng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> MovementController<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            circle_angle: 0.0,
            smoother: GoalSmoother::new(),
            following: None,
        }
    }

    /// Current circle angle in radians, always in `[0, TAU)`.
    pub fn circle_angle(&self) -> f64 {
        self.circle_angle
    }

    pub fn smoother(&self) -> &GoalSmoother {
        &self.smoother
    }

    /// Drops smoothing history so the next subject starts fresh.
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.following = None;
    }

    /// `random` draws one concrete mode per call.
    pub fn resolve_mode(&mut self, configured: ViewMode) -> ViewMode {
        match configured {
            ViewMode::Random => {
                let index = self.rng.random_range(0..ViewMode::CONCRETE.len());
                ViewMode::CONCRETE[index]
            }
            mode => mode,
        }
    }

    /// Unsmoothed camera position for `mode`. Advances the circle angle
    /// when `mode` is [`ViewMode::Circle`].
    pub fn desired_position(
        &mut self,
        mode: ViewMode,
        own: &Pose,
        subject: &Subject,
        settings: &Settings,
    ) -> DVec3 {
        match mode {
            ViewMode::LookAt | ViewMode::Random => own.position,
            ViewMode::OverTheShoulder => {
                own.position - own.facing() * settings.over_shoulder_distance
            }
            ViewMode::Circle => {
                self.circle_angle = (self.circle_angle + settings.circle_speed).rem_euclid(TAU);
                let (sin, cos) = self.circle_angle.sin_cos();
                subject.position
                    + DVec3::new(
                        cos * settings.circle_radius,
                        subject.height * settings.circle_height_fraction,
                        sin * settings.circle_radius,
                    )
            }
            ViewMode::Wide => {
                let current = own.position.distance(subject.position);
                let distance = settings
                    .wide_min_distance
                    .max(current + settings.wide_backoff);
                own.position + own.facing() * distance + DVec3::Y * settings.wide_height
            }
        }
    }

    /// Runs one movement step for the subject `name`.
    ///
    /// The look command is sent every tick; the goal only when the
    /// smoother's throttle lets it through.
    pub fn tick(
        &mut self,
        now: Instant,
        name: &str,
        subject: &Subject,
        own: &Pose,
        settings: &Settings,
        pathfinder: &mut impl Pathfinder,
    ) -> Result<TickOutcome, MovementError> {
        if !own.is_finite() {
            return Err(MovementError::NonFinite("avatar pose"));
        }
        if !subject.is_finite() {
            return Err(MovementError::NonFinite("subject telemetry"));
        }
        if self.following.as_deref() != Some(name) {
            self.smoother.reset();
            self.following = Some(name.to_string());
        }

        let mode = self.resolve_mode(settings.view_mode);

        let look_at = subject.point_at_height(settings.head_fraction);
        pathfinder.look_at(look_at)?;

        let desired = self.desired_position(mode, own, subject, settings);
        if !desired.is_finite() {
            return Err(MovementError::NonFinite("goal"));
        }
        let goal = self.smoother.smooth(desired, settings.smoothing);

        let params = smoothing_params(settings);
        let dispatched = self
            .smoother
            .should_dispatch(goal, subject.position, now, &params);
        if dispatched {
            pathfinder.set_goal_near(goal, settings.goal_tolerance)?;
            self.smoother.record_dispatch(goal, now);
            tracing::trace!(%mode, ?goal, "Goal dispatched");
        } else {
            tracing::debug!(
                %mode,
                distance = horizontal_distance(own.position, subject.position),
                "Goal dispatch skipped"
            );
        }

        Ok(TickOutcome {
            mode,
            look_at,
            goal,
            dispatched,
        })
    }
}

fn smoothing_params(settings: &Settings) -> SmoothingParams {
    SmoothingParams {
        weight: settings.smoothing,
        min_interval: settings.min_dispatch_interval(),
        goal_epsilon: settings.goal_epsilon,
        subject_epsilon: settings.subject_epsilon,
    }
}
