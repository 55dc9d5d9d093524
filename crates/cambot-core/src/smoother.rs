//! Goal smoothing and dispatch throttling.
//!
//! Movement goals are blended with the last dispatched goal so the
//! pathfinder is never handed abrupt jumps, and a new goal is only
//! dispatched when enough time has passed *and* something actually moved.

use std::time::Duration;

use glam::DVec3;
use tokio::time::Instant;

/// Thresholds for [`GoalSmoother`], read from settings every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingParams {
    /// Weight of the new desired position, `0.0..=1.0`.
    pub weight: f64,
    pub min_interval: Duration,
    pub goal_epsilon: f64,
    pub subject_epsilon: f64,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            weight: 0.35,
            min_interval: Duration::from_millis(300),
            goal_epsilon: 0.5,
            subject_epsilon: 0.25,
        }
    }
}

/// State carried across ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GoalState {
    pub last_goal: Option<DVec3>,
    pub last_dispatch: Option<Instant>,
    pub last_subject: Option<DVec3>,
}

#[derive(Debug, Clone, Default)]
pub struct GoalSmoother {
    state: GoalState,
}

impl GoalSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GoalState {
        &self.state
    }

    /// Forgets all history, e.g. when the filmed subject changes.
    pub fn reset(&mut self) {
        self.state = GoalState::default();
    }

    /// Exponential moving average between the last dispatched goal and
    /// `desired`. Without a previous goal `desired` is returned unchanged.
    pub fn smooth(&self, desired: DVec3, weight: f64) -> DVec3 {
        match self.state.last_goal {
            Some(previous) => previous.lerp(desired, weight.clamp(0.0, 1.0)),
            None => desired,
        }
    }

    /// Decides whether `goal` should be dispatched now and records the
    /// subject position for the next tick's motion check.
    ///
    /// Returns `true` at most once per accepted goal; the caller must then
    /// call [`GoalSmoother::record_dispatch`].
    pub fn should_dispatch(
        &mut self,
        goal: DVec3,
        subject: DVec3,
        now: Instant,
        params: &SmoothingParams,
    ) -> bool {
        let subject_moved = self
            .state
            .last_subject
            .is_none_or(|previous| previous.distance(subject) > params.subject_epsilon);
        self.state.last_subject = Some(subject);

        let interval_elapsed = self
            .state
            .last_dispatch
            .is_none_or(|at| now.saturating_duration_since(at) >= params.min_interval);
        if !interval_elapsed {
            return false;
        }

        let goal_moved = self
            .state
            .last_goal
            .is_none_or(|previous| previous.distance(goal) > params.goal_epsilon);

        goal_moved || subject_moved
    }

    pub fn record_dispatch(&mut self, goal: DVec3, now: Instant) {
        self.state.last_goal = Some(goal);
        self.state.last_dispatch = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SmoothingParams {
        SmoothingParams::default()
    }

    #[test]
    fn test_first_goal_is_not_smoothed() {
        let smoother = GoalSmoother::new();
        let desired = DVec3::new(10.0, 64.0, 10.0);
        assert_eq!(smoother.smooth(desired, 0.35), desired);
    }

    #[test]
    fn test_smoothing_blends_towards_desired() {
        let mut smoother = GoalSmoother::new();
        let now = Instant::now();
        smoother.record_dispatch(DVec3::ZERO, now);

        let smoothed = smoother.smooth(DVec3::new(10.0, 0.0, 0.0), 0.35);
        assert!((smoothed.x - 3.5).abs() < 1e-9);
        assert!(smoothed.y.abs() < 1e-9);
    }

    #[test]
    fn test_smoothing_weight_is_clamped() {
        let mut smoother = GoalSmoother::new();
        smoother.record_dispatch(DVec3::ZERO, Instant::now());
        let desired = DVec3::new(4.0, 0.0, 0.0);
        assert_eq!(smoother.smooth(desired, 7.0), desired);
        assert_eq!(smoother.smooth(desired, -1.0), DVec3::ZERO);
    }

    #[test]
    fn test_first_goal_dispatches() {
        let mut smoother = GoalSmoother::new();
        let now = Instant::now();
        assert!(smoother.should_dispatch(DVec3::ONE, DVec3::ZERO, now, &params()));
    }

    #[test]
    fn test_throttle_blocks_until_interval_and_motion() {
        let mut smoother = GoalSmoother::new();
        let start = Instant::now();
        let subject = DVec3::new(0.0, 64.0, 0.0);
        let goal = DVec3::new(5.0, 64.0, 5.0);

        assert!(smoother.should_dispatch(goal, subject, start, &params()));
        smoother.record_dispatch(goal, start);

        // Small subject motion, too early: nothing.
        let jitter = subject + DVec3::new(0.1, 0.0, 0.0);
        let early = start + Duration::from_millis(100);
        assert!(!smoother.should_dispatch(goal, jitter, early, &params()));

        // Real motion but still too early: nothing.
        let moved = jitter + DVec3::new(2.0, 0.0, 0.0);
        let still_early = start + Duration::from_millis(200);
        assert!(!smoother.should_dispatch(goal, moved, still_early, &params()));

        // Interval elapsed and subject moved past epsilon: exactly one dispatch.
        let moved_again = moved + DVec3::new(2.0, 0.0, 0.0);
        let later = start + Duration::from_millis(300);
        assert!(smoother.should_dispatch(goal, moved_again, later, &params()));
        smoother.record_dispatch(goal, later);

        let right_after = later + Duration::from_millis(10);
        assert!(!smoother.should_dispatch(goal, moved_again, right_after, &params()));
    }

    #[test]
    fn test_no_dispatch_when_nothing_moves() {
        let mut smoother = GoalSmoother::new();
        let start = Instant::now();
        let subject = DVec3::ZERO;
        let goal = DVec3::new(1.0, 0.0, 0.0);

        assert!(smoother.should_dispatch(goal, subject, start, &params()));
        smoother.record_dispatch(goal, start);

        let later = start + Duration::from_secs(5);
        let nudged_goal = goal + DVec3::new(0.1, 0.0, 0.0);
        assert!(!smoother.should_dispatch(nudged_goal, subject, later, &params()));
    }

    #[test]
    fn test_goal_motion_alone_dispatches() {
        let mut smoother = GoalSmoother::new();
        let start = Instant::now();
        let subject = DVec3::ZERO;

        assert!(smoother.should_dispatch(DVec3::ZERO, subject, start, &params()));
        smoother.record_dispatch(DVec3::ZERO, start);

        let later = start + Duration::from_secs(1);
        let far_goal = DVec3::new(3.0, 0.0, 0.0);
        assert!(smoother.should_dispatch(far_goal, subject, later, &params()));
    }

    #[test]
    fn test_reset_clears_history() {
        let mut smoother = GoalSmoother::new();
        smoother.record_dispatch(DVec3::ONE, Instant::now());
        smoother.reset();
        assert_eq!(*smoother.state(), GoalState::default());
    }
}
