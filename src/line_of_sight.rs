//! Line-of-fire evaluation.
//!
//! A fan of rays spanning the (widened) weapon spread is cast from the
//! shooter towards the target. The target counts as reachable once enough
//! rays pass every sight-blocking obstacle. Hits that land within
//! [`LosConfig::target_radius`] of the target are attributed to the target's
//! own body rather than to cover.

use glam::Vec2;
use hashbrown::HashMap;
use log::trace;
use ordered_float::OrderedFloat;

use crate::config::LosConfig;
use crate::error::{EngineError, EngineResult, EntityRef};
use crate::numeric::{ceil_to_usize, fraction_of, spread_position};
use crate::obstacle::{classify, ObstacleClass};
use crate::vector_math::bearing;
use crate::world::{Layer, WeaponProfile, WorldObject};

/// Endpoints of one line-of-fire check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LosQuery {
    /// Muzzle position of the shooter.
    pub origin: Vec2,
    /// Layer of the shooter; only obstacles visible from it can block.
    pub layer: Layer,
    /// Point being aimed at.
    pub target: Vec2,
    /// What is being aimed at. An object target never blocks itself.
    pub subject: EntityRef,
}

/// Tally of a ray sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaySweep {
    /// Rays in the fan.
    pub rays: usize,
    /// Rays actually tested before the verdict was reached.
    pub cast: usize,
    /// Tested rays that reached the target.
    pub unblocked: usize,
    /// Collider intersection tests computed (cache misses).
    pub intersections: usize,
    /// Verdict: enough rays got through.
    pub clear: bool,
}

impl RaySweep {
    const fn unobstructed(rays: usize) -> Self {
        Self {
            rays,
            cast: 0,
            unblocked: 0,
            intersections: 0,
            clear: true,
        }
    }
}

/// Number of rays fanned for a weapon spread and shot distance.
///
/// The spread term `ceil(spread × 2)` is clamped to
/// `[min_rays, max_rays]` and then raised to one ray per
/// [`LosConfig::range_step`] units of distance.
///
/// # Examples
/// ```
/// use marksman::config::LosConfig;
/// use marksman::line_of_sight::ray_count;
/// assert_eq!(ray_count(&LosConfig::default(), 10.0, 100.0), 20);
/// assert_eq!(ray_count(&LosConfig::default(), 10.0, 2000.0), 40);
/// ```
#[must_use]
pub fn ray_count(config: &LosConfig, spread_degrees: f32, distance: f32) -> usize {
    let ceiling = config.max_rays.max(config.min_rays);
    let by_spread = ceil_to_usize(spread_degrees * 2.0).clamp(config.min_rays, ceiling);
    let by_range = if config.range_step > 0.0 {
        ceil_to_usize(distance / config.range_step)
    } else {
        0
    };
    by_spread.max(by_range).max(1)
}

/// Runs the early-exit tally over `rays` rays, asking `is_blocked` for each
/// in fan order.
///
/// Returns as soon as more than [`LosConfig::early_exit_fraction`] of the
/// fan is known to be clear; otherwise the verdict is whether the clear
/// fraction strictly exceeds [`LosConfig::pass_fraction`].
pub fn sweep(config: &LosConfig, rays: usize, mut is_blocked: impl FnMut(usize) -> bool) -> RaySweep {
    let mut unblocked = 0;
    for index in 0..rays {
        if is_blocked(index) {
            continue;
        }
        unblocked += 1;
        if fraction_of(unblocked, rays) > config.early_exit_fraction {
            return RaySweep {
                rays,
                cast: index + 1,
                unblocked,
                intersections: 0,
                clear: true,
            };
        }
    }
    RaySweep {
        rays,
        cast: rays,
        unblocked,
        intersections: 0,
        clear: fraction_of(unblocked, rays) > config.pass_fraction,
    }
}

/// Casts ray fans against the sight-blocking objects of a snapshot.
#[derive(Debug, Clone, Default)]
pub struct LineOfSightEvaluator {
    config: LosConfig,
}

impl LineOfSightEvaluator {
    /// Evaluator using the given thresholds.
    #[must_use]
    pub const fn new(config: LosConfig) -> Self {
        Self { config }
    }

    /// Active thresholds.
    #[must_use]
    pub const fn config(&self) -> &LosConfig {
        &self.config
    }

    /// Whether enough of the fan reaches the target.
    ///
    /// # Errors
    /// Fails when either endpoint of `query` is not finite.
    pub fn has_line_of_fire(
        &self,
        query: &LosQuery,
        weapon: Option<&WeaponProfile>,
        objects: &[WorldObject],
    ) -> EngineResult<bool> {
        self.evaluate(query, weapon, objects).map(|sweep| sweep.clear)
    }

    /// Full sweep result for `query`.
    ///
    /// Without a weapon profile there is nothing to evaluate and the target
    /// is assumed reachable.
    ///
    /// # Errors
    /// Fails when either endpoint of `query` is not finite.
    pub fn evaluate(
        &self,
        query: &LosQuery,
        weapon: Option<&WeaponProfile>,
        objects: &[WorldObject],
    ) -> EngineResult<RaySweep> {
        if !query.origin.is_finite() {
            return Err(EngineError::NonFinitePosition {
                entity: EntityRef::Local,
            });
        }
        if !query.target.is_finite() {
            return Err(EngineError::NonFinitePosition {
                entity: query.subject,
            });
        }
        let Some(weapon) = weapon else {
            return Ok(RaySweep::unobstructed(0));
        };

        let distance = query.origin.distance(query.target);
        let rays = ray_count(&self.config, weapon.spread_degrees, distance);

        let blockers: Vec<&WorldObject> = objects
            .iter()
            .filter(|object| self.can_block(object, query))
            .collect();
        if blockers.is_empty() {
            return Ok(RaySweep::unobstructed(rays));
        }

        let aim = bearing(query.origin, query.target);
        let spread = weapon.spread_degrees.to_radians() * self.config.spread_scale;
        let reach = distance - self.config.target_radius;
        let mut cache: HashMap<(usize, OrderedFloat<f32>), Option<f32>> = HashMap::new();

        let mut result = sweep(&self.config, rays, |index| {
            let angle = aim - spread / 2.0 + spread * spread_position(index, rays);
            let end = query.origin + Vec2::from_angle(angle) * distance;
            blockers.iter().enumerate().any(|(slot, object)| {
                let hit = *cache.entry((slot, OrderedFloat(angle))).or_insert_with(|| {
                    object
                        .collider
                        .and_then(|collider| collider.intersect_segment(query.origin, end))
                        .map(|point| point.distance(query.origin))
                });
                hit.is_some_and(|hit_distance| hit_distance < reach)
            })
        });
        result.intersections = cache.len();

        trace!(
            "line of fire to {:?}: {}/{} rays clear after {} cast ({} blockers)",
            query.subject,
            result.unblocked,
            result.rays,
            result.cast,
            blockers.len()
        );
        Ok(result)
    }

    fn can_block(&self, object: &WorldObject, query: &LosQuery) -> bool {
        if object.dead || object.collider.is_none() {
            return false;
        }
        if query.subject == EntityRef::Object(object.id) {
            return false;
        }
        if object
            .height
            .is_some_and(|height| height < self.config.projectile_height)
        {
            return false;
        }
        object.visible_from(query.layer) && classify(object) == ObstacleClass::Blocking
    }
}
