//! Target scoring and selection.
//!
//! Agents are ranked by screen proximity to the field-of-view anchor, with
//! small bonuses for the target already locked and for targets with a clear
//! line of fire:
//!
//! ```text
//! score = exp(-d / falloff) + continuity·[previous] + shootable·[shootable]
//! ```
//!
//! The continuity bonus only breaks near-ties; a clearly closer target still
//! wins. Equal scores keep the candidate seen first.

use std::cmp::Reverse;

use glam::Vec2;
use log::trace;
use ordered_float::OrderedFloat;

use crate::config::ScoringConfig;
use crate::error::EngineResult;
use crate::projection::{project, Projection};
use crate::world::{Agent, AgentId, ObjectId, WorldObject};

/// A ranked target. `T` is the identifier type, [`AgentId`] or [`ObjectId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetCandidate<T> {
    /// Identifier of the ranked entity.
    pub target: T,
    /// Higher is better.
    pub score: OrderedFloat<f32>,
    /// Whether the entity had a clear line of fire when scored.
    pub shootable: bool,
}

/// Which otherwise-excluded agents may be targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetFilter {
    /// Include downed agents.
    pub allow_downed: bool,
    /// Include agents on the local team.
    pub allow_allies: bool,
}

/// Screen-space frame the field of view is measured in.
#[derive(Clone, Copy)]
pub struct Viewport<'a> {
    /// Maps world positions onto the screen.
    pub projection: &'a dyn Projection,
    /// Screen point the field-of-view circle is centred on.
    pub anchor: Vec2,
}

/// Ranks agents and loot objects for the engagement controller.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetScorer {
    scoring: ScoringConfig,
    fov_radius: f32,
}

impl TargetScorer {
    /// Scorer with the given weights and field-of-view radius in pixels.
    #[must_use]
    pub const fn new(scoring: ScoringConfig, fov_radius: f32) -> Self {
        Self {
            scoring,
            fov_radius,
        }
    }

    /// Whether `agent` may be engaged by `local` at all.
    ///
    /// Excludes inactive, dead and self entries, agents on an incompatible
    /// layer, and teammates or downed agents unless `filter` allows them.
    #[must_use]
    pub fn is_eligible(agent: &Agent, local: &Agent, filter: TargetFilter) -> bool {
        agent.is_present()
            && agent.id != local.id
            && agent.layer.is_compatible_with(local.layer)
            && (filter.allow_allies || agent.team != local.team)
            && (filter.allow_downed || !agent.downed)
    }

    /// Proximity score for a screen distance, plus the applicable bonuses.
    #[must_use]
    pub fn score(&self, screen_distance: f32, previous: bool, shootable: bool) -> OrderedFloat<f32> {
        let proximity = (-screen_distance / self.scoring.proximity_falloff).exp();
        let continuity = if previous {
            self.scoring.continuity_bonus
        } else {
            0.0
        };
        let reachable = if shootable {
            self.scoring.shootable_bonus
        } else {
            0.0
        };
        OrderedFloat(proximity + continuity + reachable)
    }

    /// Highest-scoring eligible agent inside the field of view.
    ///
    /// `previous` is the agent locked last tick; `shootable` reports whether a
    /// candidate can currently be hit.
    ///
    /// # Errors
    /// Propagates projection failures and errors from `shootable`.
    pub fn select_best_target(
        &self,
        agents: &[Agent],
        local: &Agent,
        filter: TargetFilter,
        viewport: Viewport<'_>,
        previous: Option<AgentId>,
        mut shootable: impl FnMut(&Agent) -> EngineResult<bool>,
    ) -> EngineResult<Option<TargetCandidate<AgentId>>> {
        let mut candidates = Vec::new();
        for agent in agents {
            if !Self::is_eligible(agent, local, filter) {
                continue;
            }
            let Some(screen_distance) = self.fov_distance(viewport, agent.position)? else {
                continue;
            };
            let clear = shootable(agent)?;
            let score = self.score(screen_distance, previous == Some(agent.id), clear);
            trace!("candidate {:?}: d={screen_distance} score={score}", agent.id);
            candidates.push(TargetCandidate {
                target: agent.id,
                score,
                shootable: clear,
            });
        }
        Ok(best_of(candidates))
    }

    /// Eligible agent closest to `local` in world space, ignoring the field
    /// of view.
    #[must_use]
    pub fn select_nearest_target<'a>(
        agents: &'a [Agent],
        local: &Agent,
        filter: TargetFilter,
    ) -> Option<&'a Agent> {
        agents
            .iter()
            .filter(|agent| Self::is_eligible(agent, local, filter))
            .min_by_key(|agent| OrderedFloat(agent.position.distance_squared(local.position)))
    }

    /// Highest-scoring loot object inside the field of view, scored like
    /// agents with continuity measured against `previous`.
    ///
    /// # Errors
    /// Propagates projection failures and errors from `shootable`.
    pub fn select_loot_target(
        &self,
        objects: &[WorldObject],
        local: &Agent,
        viewport: Viewport<'_>,
        previous: Option<ObjectId>,
        mut shootable: impl FnMut(&WorldObject) -> EngineResult<bool>,
    ) -> EngineResult<Option<TargetCandidate<ObjectId>>> {
        let mut candidates = Vec::new();
        for object in objects.iter().filter(|object| is_loot_target(object, local)) {
            let Some(screen_distance) = self.fov_distance(viewport, object.position)? else {
                continue;
            };
            let clear = shootable(object)?;
            candidates.push(TargetCandidate {
                target: object.id,
                score: self.score(screen_distance, previous == Some(object.id), clear),
                shootable: clear,
            });
        }
        Ok(best_of(candidates))
    }

    /// Nearest loot object within `max_distance` world units of `local`.
    #[must_use]
    pub fn select_melee_loot<'a>(
        objects: &'a [WorldObject],
        local: &Agent,
        max_distance: f32,
    ) -> Option<&'a WorldObject> {
        objects
            .iter()
            .filter(|object| is_loot_target(object, local))
            .map(|object| (object, object.position.distance(local.position)))
            .filter(|&(_, distance)| distance <= max_distance)
            .min_by_key(|&(_, distance)| OrderedFloat(distance))
            .map(|(object, _)| object)
    }

    /// Screen distance from the anchor, or `None` outside the field of view.
    fn fov_distance(&self, viewport: Viewport<'_>, world: Vec2) -> EngineResult<Option<f32>> {
        let screen = project(viewport.projection, world)?;
        let distance = screen.distance(viewport.anchor);
        Ok((distance <= self.fov_radius).then_some(distance))
    }
}

/// Intact loot container on a layer visible to `local`.
fn is_loot_target(object: &WorldObject, local: &Agent) -> bool {
    !object.dead
        && object.collider.is_some()
        && object.kind.is_loot()
        && object.visible_from(local.layer)
}

/// First candidate with the highest score.
fn best_of<T>(candidates: Vec<TargetCandidate<T>>) -> Option<TargetCandidate<T>> {
    candidates
        .into_iter()
        .min_by_key(|candidate| Reverse(candidate.score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EngineError, EntityRef};
    use crate::projection::IdentityProjection;
    use crate::world::{Layer, TeamId};
    use rstest::{fixture, rstest};

    const ME: Agent = Agent::new(AgentId(1), Vec2::ZERO, TeamId(1));

    fn enemy(id: u32, x: f32) -> Agent {
        Agent::new(AgentId(id), Vec2::new(x, 0.0), TeamId(2))
    }

    fn viewport() -> Viewport<'static> {
        Viewport {
            projection: &IdentityProjection,
            anchor: Vec2::ZERO,
        }
    }

    #[fixture]
    fn scorer() -> TargetScorer {
        TargetScorer::new(ScoringConfig::default(), 250.0)
    }

    fn best(
        scorer: &TargetScorer,
        agents: &[Agent],
        previous: Option<AgentId>,
        shootable: impl FnMut(&Agent) -> EngineResult<bool>,
    ) -> Option<AgentId> {
        scorer
            .select_best_target(agents, &ME, TargetFilter::default(), viewport(), previous, shootable)
            .expect("identity projection never fails")
            .map(|candidate| candidate.target)
    }

    #[rstest]
    fn closer_target_wins(scorer: TargetScorer) {
        let agents = [enemy(2, 150.0), enemy(3, 60.0)];
        assert_eq!(best(&scorer, &agents, None, |_| Ok(true)), Some(AgentId(3)));
    }

    #[rstest]
    fn continuity_breaks_near_ties(scorer: TargetScorer) {
        let agents = [enemy(2, 100.0), enemy(3, 101.0)];
        assert_eq!(
            best(&scorer, &agents, Some(AgentId(3)), |_| Ok(true)),
            Some(AgentId(3))
        );
    }

    #[rstest]
    fn continuity_does_not_override_a_real_gap(scorer: TargetScorer) {
        let agents = [enemy(2, 100.0), enemy(3, 130.0)];
        assert_eq!(
            best(&scorer, &agents, Some(AgentId(3)), |_| Ok(true)),
            Some(AgentId(2))
        );
    }

    #[rstest]
    fn shootable_target_preferred_at_equal_distance(scorer: TargetScorer) {
        let agents = [enemy(2, 80.0), Agent::new(AgentId(3), Vec2::new(0.0, 80.0), TeamId(2))];
        assert_eq!(
            best(&scorer, &agents, None, |agent| Ok(agent.id == AgentId(3))),
            Some(AgentId(3))
        );
    }

    #[rstest]
    fn ties_keep_the_first_seen(scorer: TargetScorer) {
        let agents = [enemy(4, 50.0), Agent::new(AgentId(2), Vec2::new(0.0, -50.0), TeamId(2))];
        assert_eq!(best(&scorer, &agents, None, |_| Ok(true)), Some(AgentId(4)));
    }

    #[rstest]
    #[case::myself(Agent::new(AgentId(1), Vec2::new(10.0, 0.0), TeamId(2)))]
    #[case::dead(enemy(2, 10.0).dead())]
    #[case::downed(enemy(2, 10.0).downed())]
    #[case::teammate(Agent::new(AgentId(2), Vec2::new(10.0, 0.0), TeamId(1)))]
    #[case::underground(enemy(2, 10.0).on_layer(Layer::UNDERGROUND))]
    #[case::outside_fov(enemy(2, 251.0))]
    fn filtered_candidates(scorer: TargetScorer, #[case] agent: Agent) {
        assert_eq!(best(&scorer, &[agent], None, |_| Ok(true)), None);
    }

    #[rstest]
    fn inactive_agents_are_skipped(scorer: TargetScorer) {
        let mut agent = enemy(2, 10.0);
        agent.active = false;
        assert_eq!(best(&scorer, &[agent], None, |_| Ok(true)), None);
    }

    #[rstest]
    fn fov_boundary_is_inclusive(scorer: TargetScorer) {
        assert_eq!(
            best(&scorer, &[enemy(2, 250.0)], None, |_| Ok(true)),
            Some(AgentId(2))
        );
    }

    #[rstest]
    fn filter_admits_allies_and_downed(scorer: TargetScorer) {
        let ally = Agent::new(AgentId(2), Vec2::new(10.0, 0.0), TeamId(1)).downed();
        let filter = TargetFilter {
            allow_downed: true,
            allow_allies: true,
        };
        let picked = scorer
            .select_best_target(&[ally], &ME, filter, viewport(), None, |_| Ok(false))
            .expect("identity projection never fails");
        assert_eq!(picked.map(|candidate| candidate.shootable), Some(false));
    }

    #[rstest]
    fn shootability_errors_propagate(scorer: TargetScorer) {
        let err = scorer
            .select_best_target(
                &[enemy(2, 10.0)],
                &ME,
                TargetFilter::default(),
                viewport(),
                None,
                |agent| {
                    Err(EngineError::NonFinitePosition {
                        entity: EntityRef::Agent(agent.id),
                    })
                },
            )
            .expect_err("error must surface");
        assert!(matches!(err, EngineError::NonFinitePosition { .. }));
    }

    #[rstest]
    fn nearest_ignores_the_field_of_view() {
        let agents = [enemy(2, 900.0), enemy(3, 400.0), enemy(4, 400.0)];
        let nearest = TargetScorer::select_nearest_target(&agents, &ME, TargetFilter::default());
        assert_eq!(nearest.map(|agent| agent.id), Some(AgentId(3)));
    }

    fn loot(id: u32, tag: &str, x: f32) -> WorldObject {
        WorldObject::new(ObjectId(id), tag, Vec2::new(x, 0.0)).with_radius(1.0)
    }

    #[rstest]
    fn loot_target_only_considers_containers(scorer: TargetScorer) {
        let objects = [loot(1, "tree_01", 5.0), loot(2, "crate_01", 40.0), loot(3, "barrel_01", 20.0)];
        let picked = scorer
            .select_loot_target(&objects, &ME, viewport(), None, |_| Ok(true))
            .expect("identity projection never fails");
        assert_eq!(picked.map(|candidate| candidate.target), Some(ObjectId(3)));
    }

    #[rstest]
    fn loot_target_skips_broken_and_colliderless(scorer: TargetScorer) {
        let mut broken = loot(1, "crate_01", 5.0);
        broken.dead = true;
        let bare = WorldObject::new(ObjectId(2), "crate_02", Vec2::new(6.0, 0.0));
        let picked = scorer
            .select_loot_target(&[broken, bare], &ME, viewport(), None, |_| Ok(true))
            .expect("identity projection never fails");
        assert_eq!(picked, None);
    }

    #[rstest]
    #[case::in_reach(6.5, Some(ObjectId(2)))]
    #[case::out_of_reach(6.0, None)]
    fn melee_loot_within_reach(#[case] reach: f32, #[case] expected: Option<ObjectId>) {
        let objects = [loot(1, "bush_01", 1.0), loot(2, "crate_01", 6.2), loot(3, "chest_01", 30.0)];
        let picked = TargetScorer::select_melee_loot(&objects, &ME, reach);
        assert_eq!(picked.map(|object| object.id), expected);
    }
}
