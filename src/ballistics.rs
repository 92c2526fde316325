//! Lead prediction for moving targets.
//!
//! Each tracked agent keeps a bounded [`PositionHistory`]. Velocity is
//! estimated across the newest three samples, which smooths out the jitter of
//! consecutive frames, and the aim point is placed where a projectile fired
//! now would meet the target under constant velocity.

use std::collections::VecDeque;

use glam::Vec2;
use hashbrown::HashMap;
use log::trace;

use crate::config::BallisticsConfig;
use crate::error::{EngineError, EngineResult, EntityRef};
use crate::numeric::expect_f32;
use crate::projection::{project, Projection};
use crate::vector_math::clamp_length;
use crate::world::AgentId;

/// Number of samples between the two ends of the velocity estimate.
const VELOCITY_SPAN: usize = 2;

/// Timestamped position of a tracked agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    /// Host clock in seconds.
    pub at: f64,
    /// World position at `at`.
    pub position: Vec2,
}

/// Bounded FIFO of position samples; the oldest sample is evicted first.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionHistory {
    samples: VecDeque<PositionSample>,
    capacity: usize,
}

impl PositionHistory {
    /// Empty history holding at most `capacity` samples.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `sample`, evicting from the front once full.
    pub fn push(&mut self, sample: PositionSample) {
        if self.capacity == 0 {
            return;
        }
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Number of samples held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample has been recorded since the last clear.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples from oldest to newest.
    pub fn samples(&self) -> impl Iterator<Item = &PositionSample> {
        self.samples.iter()
    }

    /// Drops every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Velocity between the sample [`VELOCITY_SPAN`] back and the newest one.
    ///
    /// Returns `None` while fewer than `config.min_samples` samples exist.
    /// Samples closer together than `config.min_sample_interval` give a zero
    /// velocity; faster estimates are clamped to `config.max_speed`.
    #[must_use]
    pub fn estimate_velocity(&self, config: &BallisticsConfig) -> Option<Vec2> {
        let len = self.samples.len();
        if len == 0 || len < config.min_samples {
            return None;
        }
        let newest = self.samples.back()?;
        let older = self.samples.get(len.saturating_sub(VELOCITY_SPAN + 1))?;
        let elapsed = newest.at - older.at;
        if !elapsed.is_finite() || elapsed <= config.min_sample_interval {
            return Some(Vec2::ZERO);
        }
        let velocity = (newest.position - older.position) / expect_f32(elapsed);
        if !velocity.is_finite() {
            return Some(Vec2::ZERO);
        }
        Some(clamp_length(velocity, config.max_speed))
    }
}

/// Outcome of solving for the projectile/target meeting time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intercept {
    /// Smallest positive root of the intercept quadratic.
    Ahead(f32),
    /// Target speed equals projectile speed; the equation is linear. The
    /// time is negative when the target moves away.
    Linear(f32),
    /// No positive solution; aim at the current position.
    Unreachable,
}

impl Intercept {
    /// Flight time to aim for, before clamping.
    #[must_use]
    pub const fn time(self) -> f32 {
        match self {
            Self::Ahead(t) | Self::Linear(t) => t,
            Self::Unreachable => 0.0,
        }
    }
}

/// Solves `(|v|² − s²)t² + 2(Δ·v)t + |Δ|² = 0` for the time at which a
/// projectile of speed `speed`, fired from the origin of `delta`, meets a
/// target at `delta` moving with `velocity`.
///
/// # Examples
/// ```
/// use glam::Vec2;
/// use marksman::ballistics::{solve_intercept, Intercept};
/// let t = solve_intercept(Vec2::new(100.0, 0.0), Vec2::ZERO, 1000.0);
/// assert_eq!(t, Intercept::Ahead(0.1));
/// ```
#[must_use]
pub fn solve_intercept(delta: Vec2, velocity: Vec2, speed: f32) -> Intercept {
    let offset = delta.as_dvec2();
    let motion = velocity.as_dvec2();
    let speed_sq = f64::from(speed) * f64::from(speed);

    let a = motion.length_squared() - speed_sq;
    let half_b = offset.dot(motion);
    let c = offset.length_squared();

    if a.abs() <= f64::EPSILON * (motion.length_squared() + speed_sq) {
        if half_b == 0.0 {
            return Intercept::Unreachable;
        }
        return in_f32(-c / (2.0 * half_b)).map_or(Intercept::Unreachable, Intercept::Linear);
    }

    let discriminant = half_b * half_b - a * c;
    if discriminant < 0.0 {
        return Intercept::Unreachable;
    }
    let root = discriminant.sqrt();
    let t1 = (-half_b - root) / a;
    let t2 = (-half_b + root) / a;
    let earliest = match (t1 > 0.0, t2 > 0.0) {
        (true, true) => t1.min(t2),
        (true, false) => t1,
        (false, true) => t2,
        (false, false) => return Intercept::Unreachable,
    };
    in_f32(earliest).map_or(Intercept::Unreachable, Intercept::Ahead)
}

/// Narrows a meeting time, rejecting values `f32` cannot hold.
fn in_f32(time: f64) -> Option<f32> {
    (time.is_finite() && time.abs() <= f64::from(f32::MAX)).then(|| expect_f32(time))
}

/// Inputs for one lead prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeadRequest {
    /// Agent being led.
    pub target: AgentId,
    /// Current world position of the target.
    pub position: Vec2,
    /// World position the projectile leaves from.
    pub shooter: Vec2,
    /// World units per second; non-positive values fall back to
    /// [`BallisticsConfig::default_projectile_speed`].
    pub projectile_speed: f32,
    /// Host clock in seconds.
    pub now: f64,
}

/// Predicted aim point for a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Lead aim point in world coordinates.
    pub aim_world: Vec2,
    /// `aim_world` mapped through the projection.
    pub aim_screen: Vec2,
    /// Velocity estimate the lead was computed from.
    pub velocity: Vec2,
    /// Clamped flight time used for the lead.
    pub lead_time: f32,
}

/// Per-agent tracking state and the intercept-based aim solver.
#[derive(Debug, Clone)]
pub struct BallisticPredictor {
    config: BallisticsConfig,
    strength: f32,
    histories: HashMap<AgentId, PositionHistory>,
    last_velocity: HashMap<AgentId, Vec2>,
}

impl BallisticPredictor {
    /// Creates a predictor scaling lead displacement by `strength`.
    #[must_use]
    pub fn new(config: BallisticsConfig, strength: f32) -> Self {
        Self {
            config,
            strength,
            histories: HashMap::new(),
            last_velocity: HashMap::new(),
        }
    }

    /// Records the target's current position and returns the lead aim point.
    ///
    /// Only the requested agent's history is touched.
    ///
    /// # Errors
    /// Fails on non-finite positions or when the projection returns a
    /// non-finite point.
    pub fn predict(
        &mut self,
        request: &LeadRequest,
        projection: &dyn Projection,
    ) -> EngineResult<Prediction> {
        if !request.position.is_finite() {
            return Err(EngineError::NonFinitePosition {
                entity: EntityRef::Agent(request.target),
            });
        }
        if !request.shooter.is_finite() {
            return Err(EngineError::NonFinitePosition {
                entity: EntityRef::Local,
            });
        }

        let capacity = self.config.history_capacity;
        let history = self
            .histories
            .entry(request.target)
            .or_insert_with(|| PositionHistory::with_capacity(capacity));
        history.push(PositionSample {
            at: request.now,
            position: request.position,
        });

        let Some(velocity) = history.estimate_velocity(&self.config) else {
            let aim_screen = project(projection, request.position)?;
            return Ok(Prediction {
                aim_world: request.position,
                aim_screen,
                velocity: Vec2::ZERO,
                lead_time: 0.0,
            });
        };
        self.last_velocity.insert(request.target, velocity);

        let speed = if request.projectile_speed.is_finite() && request.projectile_speed > 0.0 {
            request.projectile_speed
        } else {
            self.config.default_projectile_speed
        };
        let intercept = solve_intercept(request.position - request.shooter, velocity, speed);
        let lead_time = intercept
            .time()
            .max(0.0)
            .min(self.config.max_lead_time.max(0.0));
        let aim_world = request.position + velocity * lead_time * self.strength;
        trace!(
            "lead for {:?}: v={velocity} {intercept:?} t={lead_time}",
            request.target
        );

        Ok(Prediction {
            aim_world,
            aim_screen: project(projection, aim_world)?,
            velocity,
            lead_time,
        })
    }

    /// Swaps in new tracking parameters, keeping every history.
    ///
    /// Histories longer than the new capacity shrink on their next sample.
    pub fn reconfigure(&mut self, config: BallisticsConfig, strength: f32) {
        self.config = config;
        self.strength = strength;
    }

    /// Forgets everything tracked for `agent`.
    pub fn reset(&mut self, agent: AgentId) {
        self.histories.remove(&agent);
        self.last_velocity.remove(&agent);
    }

    /// Drops the tracking state of every agent for which `keep` is false.
    pub fn retain(&mut self, mut keep: impl FnMut(AgentId) -> bool) {
        self.histories.retain(|id, _| keep(*id));
        let histories = &self.histories;
        self.last_velocity.retain(|id, _| histories.contains_key(id));
    }

    /// Drops all tracking state.
    pub fn clear(&mut self) {
        self.histories.clear();
        self.last_velocity.clear();
    }

    /// Samples recorded for `agent`, if it is tracked.
    #[must_use]
    pub fn history(&self, agent: AgentId) -> Option<&PositionHistory> {
        self.histories.get(&agent)
    }

    /// Most recent velocity estimate for `agent`, if one was ever made.
    #[must_use]
    pub fn last_velocity(&self, agent: AgentId) -> Option<Vec2> {
        self.last_velocity.get(&agent).copied()
    }

    /// Number of agents with a history.
    #[must_use]
    pub fn tracked_agents(&self) -> usize {
        self.histories.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{IdentityProjection, MockProjection};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::{fixture, rstest};

    const SHOOTER: Vec2 = Vec2::ZERO;

    #[fixture]
    fn predictor() -> BallisticPredictor {
        BallisticPredictor::new(BallisticsConfig::default(), 1.0)
    }

    fn request(position: Vec2, now: f64) -> LeadRequest {
        LeadRequest {
            target: AgentId(2),
            position,
            shooter: SHOOTER,
            projectile_speed: 1000.0,
            now,
        }
    }

    fn feed(predictor: &mut BallisticPredictor, positions: &[Vec2]) -> Prediction {
        let mut last = None;
        for (frame, position) in positions.iter().enumerate() {
            let now = f64::from(u32::try_from(frame).expect("few frames")) * 0.1;
            last = Some(
                predictor
                    .predict(&request(*position, now), &IdentityProjection)
                    .expect("finite inputs"),
            );
        }
        last.expect("at least one position")
    }

    #[rstest]
    fn stationary_target_meets_at_distance_over_speed() {
        match solve_intercept(Vec2::new(100.0, 0.0), Vec2::ZERO, 1000.0) {
            Intercept::Ahead(t) => assert_relative_eq!(t, 0.1, epsilon = 1e-6),
            other => panic!("expected a positive root, got {other:?}"),
        }
    }

    #[rstest]
    fn approaching_faster_than_projectile_takes_smaller_root() {
        match solve_intercept(Vec2::new(100.0, 0.0), Vec2::new(-2000.0, 0.0), 1000.0) {
            Intercept::Ahead(t) => assert_relative_eq!(t, 1.0 / 30.0, epsilon = 1e-6),
            other => panic!("expected a positive root, got {other:?}"),
        }
    }

    #[rstest]
    fn equal_speeds_use_the_linear_form() {
        match solve_intercept(Vec2::new(100.0, 0.0), Vec2::new(-1000.0, 0.0), 1000.0) {
            Intercept::Linear(t) => assert_relative_eq!(t, 0.05, epsilon = 1e-6),
            other => panic!("expected the linear branch, got {other:?}"),
        }
    }

    #[rstest]
    #[case::equal_speed_crossing(Vec2::new(0.0, 1000.0))]
    #[case::negative_discriminant(Vec2::new(0.0, 2000.0))]
    #[case::fleeing_faster(Vec2::new(2000.0, 0.0))]
    fn unreachable_targets(#[case] velocity: Vec2) {
        let intercept = solve_intercept(Vec2::new(100.0, 0.0), velocity, 1000.0);
        assert_eq!(intercept, Intercept::Unreachable);
        assert_eq!(intercept.time(), 0.0);
    }

    #[rstest]
    fn intercepts_satisfy_the_meeting_condition() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let mut checked = 0;
        for _ in 0..500 {
            let delta = Vec2::new(rng.gen_range(-200.0..200.0), rng.gen_range(-200.0..200.0));
            let velocity = Vec2::new(rng.gen_range(-800.0..800.0), rng.gen_range(-800.0..800.0));
            let speed: f32 = rng.gen_range(200.0..1200.0);
            let Intercept::Ahead(t) = solve_intercept(delta, velocity, speed) else {
                continue;
            };
            assert!(t > 0.0);
            let meeting = (delta + velocity * t).length();
            assert_relative_eq!(meeting, speed * t, max_relative = 1e-3, epsilon = 1e-3);
            checked += 1;
        }
        assert!(checked > 100, "sweep exercised only {checked} solutions");
    }

    #[rstest]
    fn linear_time_beyond_f32_range_is_unreachable() {
        let intercept = solve_intercept(Vec2::new(0.0, 1e30), Vec2::new(-1000.0, -1e-20), 1000.0);
        assert_eq!(intercept, Intercept::Unreachable);
    }

    #[rstest]
    fn history_evicts_oldest_first() {
        let mut history = PositionHistory::with_capacity(20);
        for i in 0..25_u8 {
            history.push(PositionSample {
                at: f64::from(i),
                position: Vec2::splat(f32::from(i)),
            });
        }
        assert_eq!(history.len(), 20);
        let first = history.samples().next().expect("history not empty");
        assert_eq!(first.at, 5.0);
        let last = history.samples().last().expect("history not empty");
        assert_eq!(last.at, 24.0);
    }

    #[rstest]
    #[case::steady(&[(0.0, 0.0), (0.1, 10.0), (0.2, 20.0)], Vec2::new(100.0, 0.0))]
    #[case::uses_two_back(&[(0.0, 0.0), (0.1, 0.0), (0.2, 0.0), (0.3, 10.0)], Vec2::new(50.0, 0.0))]
    #[case::same_timestamp(&[(1.0, 0.0), (1.0, 5.0), (1.0, 10.0)], Vec2::ZERO)]
    #[case::teleport_clamped(&[(0.0, 0.0), (0.01, 50.0), (0.02, 100.0)], Vec2::new(2000.0, 0.0))]
    fn velocity_estimates(#[case] samples: &[(f64, f32)], #[case] expected: Vec2) {
        let mut history = PositionHistory::with_capacity(20);
        for &(at, x) in samples {
            history.push(PositionSample {
                at,
                position: Vec2::new(x, 0.0),
            });
        }
        let velocity = history
            .estimate_velocity(&BallisticsConfig::default())
            .expect("enough samples");
        assert_relative_eq!(velocity.x, expected.x, epsilon = 1e-2);
        assert_relative_eq!(velocity.y, expected.y, epsilon = 1e-2);
    }

    #[rstest]
    fn fewer_than_three_samples_aim_at_current_position(mut predictor: BallisticPredictor) {
        let prediction = feed(&mut predictor, &[Vec2::new(90.0, 0.0), Vec2::new(100.0, 0.0)]);
        assert_eq!(prediction.aim_world, Vec2::new(100.0, 0.0));
        assert_eq!(prediction.lead_time, 0.0);
        assert_eq!(predictor.last_velocity(AgentId(2)), None);
    }

    #[rstest]
    fn stationary_target_is_not_led(mut predictor: BallisticPredictor) {
        let prediction = feed(&mut predictor, &[Vec2::new(100.0, 0.0); 3]);
        assert_eq!(prediction.aim_world, Vec2::new(100.0, 0.0));
        assert_relative_eq!(prediction.lead_time, 0.1, epsilon = 1e-5);
    }

    #[rstest]
    fn moving_target_is_led_along_its_velocity(mut predictor: BallisticPredictor) {
        let prediction = feed(
            &mut predictor,
            &[Vec2::new(100.0, 0.0), Vec2::new(100.0, 5.0), Vec2::new(100.0, 10.0)],
        );
        assert_relative_eq!(prediction.velocity.y, 50.0, epsilon = 1e-3);
        assert!(prediction.aim_world.y > 10.0);
        assert!(prediction.aim_world.y <= 10.0 + 50.0 * 2.0);
        assert_relative_eq!(prediction.aim_world.x, 100.0);
    }

    #[rstest]
    #[case::negative(-1.0)]
    #[case::nan(f32::NAN)]
    fn unusable_lead_limit_aims_at_the_target(#[case] max_lead_time: f32) {
        let config = BallisticsConfig {
            max_lead_time,
            ..BallisticsConfig::default()
        };
        let mut predictor = BallisticPredictor::new(config, 1.0);
        let prediction = feed(
            &mut predictor,
            &[Vec2::new(100.0, 0.0), Vec2::new(100.0, 5.0), Vec2::new(100.0, 10.0)],
        );
        assert_eq!(prediction.lead_time, 0.0);
        assert_eq!(prediction.aim_world, Vec2::new(100.0, 10.0));
    }

    #[rstest]
    fn reconfigure_keeps_histories(mut predictor: BallisticPredictor) {
        feed(&mut predictor, &[Vec2::ONE; 4]);
        let config = BallisticsConfig {
            history_capacity: 2,
            ..BallisticsConfig::default()
        };
        predictor.reconfigure(config, 0.5);
        assert_eq!(predictor.history(AgentId(2)).map(PositionHistory::len), Some(4));
        predictor
            .predict(&request(Vec2::ONE, 1.0), &IdentityProjection)
            .expect("finite inputs");
        assert_eq!(predictor.history(AgentId(2)).map(PositionHistory::len), Some(2));
    }

    #[rstest]
    fn strength_scales_the_lead() {
        let mut full = BallisticPredictor::new(BallisticsConfig::default(), 1.0);
        let mut half = BallisticPredictor::new(BallisticsConfig::default(), 0.5);
        let path = [Vec2::new(100.0, 0.0), Vec2::new(100.0, 5.0), Vec2::new(100.0, 10.0)];
        let full_lead = feed(&mut full, &path).aim_world.y - 10.0;
        let half_lead = feed(&mut half, &path).aim_world.y - 10.0;
        assert_relative_eq!(half_lead * 2.0, full_lead, epsilon = 1e-4);
    }

    #[rstest]
    fn predictions_only_touch_the_requested_agent(mut predictor: BallisticPredictor) {
        feed(&mut predictor, &[Vec2::ONE; 4]);
        let other = LeadRequest {
            target: AgentId(9),
            ..request(Vec2::ONE, 1.0)
        };
        predictor
            .predict(&other, &IdentityProjection)
            .expect("finite inputs");
        assert_eq!(predictor.history(AgentId(2)).map(PositionHistory::len), Some(4));
        assert_eq!(predictor.history(AgentId(9)).map(PositionHistory::len), Some(1));
    }

    #[rstest]
    fn reset_and_retain_forget_agents(mut predictor: BallisticPredictor) {
        feed(&mut predictor, &[Vec2::ONE; 3]);
        predictor
            .predict(
                &LeadRequest {
                    target: AgentId(5),
                    ..request(Vec2::ONE, 1.0)
                },
                &IdentityProjection,
            )
            .expect("finite inputs");
        predictor.retain(|id| id == AgentId(5));
        assert!(predictor.history(AgentId(2)).is_none());
        assert_eq!(predictor.tracked_agents(), 1);
        predictor.reset(AgentId(5));
        assert_eq!(predictor.tracked_agents(), 0);
    }

    #[rstest]
    fn aim_point_goes_through_the_projection_once(mut predictor: BallisticPredictor) {
        let mut projection = MockProjection::new();
        projection
            .expect_world_to_screen()
            .times(1)
            .returning(|world| world * 2.0);
        let prediction = predictor
            .predict(&request(Vec2::new(10.0, 20.0), 0.0), &projection)
            .expect("finite inputs");
        assert_eq!(prediction.aim_screen, Vec2::new(20.0, 40.0));
    }

    #[rstest]
    fn non_finite_target_is_rejected(mut predictor: BallisticPredictor) {
        let err = predictor
            .predict(&request(Vec2::new(f32::NAN, 0.0), 0.0), &IdentityProjection)
            .expect_err("NaN must fail");
        assert_eq!(
            err,
            EngineError::NonFinitePosition {
                entity: EntityRef::Agent(AgentId(2))
            }
        );
        assert!(predictor.history(AgentId(2)).is_none());
    }
}
