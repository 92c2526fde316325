//! The per-tick engagement state machine.

use glam::Vec2;
use hashbrown::HashSet;
use log::{debug, warn};

use super::intents::{Intent, IntentQueue};
use super::state::{AimState, EngagementState, MoveIntent, Preview, TargetRef};
use crate::ballistics::{BallisticPredictor, LeadRequest};
use crate::config::{EngineConfig, FovAnchor};
use crate::error::{EngineError, EngineResult, EntityRef};
use crate::line_of_sight::{LineOfSightEvaluator, LosQuery};
use crate::projection::{project, Projection};
use crate::targeting::{TargetFilter, TargetScorer, Viewport};
use crate::world::{Agent, AgentId, LocalAgent, ObjectId, ToolCategory, WorldSnapshot};

/// Per-tick inputs shared by the decision stages.
struct TickInputs<'a> {
    snapshot: &'a WorldSnapshot,
    local: &'a LocalAgent,
    projection: &'a dyn Projection,
    melee_equipped: bool,
    /// Fire held, or automatic mode with a valid target.
    should_engage: bool,
    wants_melee: bool,
}

impl TickInputs<'_> {
    fn me(&self) -> &Agent {
        &self.local.agent
    }

    const fn viewport(&self, anchor: FovAnchor) -> Viewport<'_> {
        Viewport {
            projection: self.projection,
            anchor: match anchor {
                FovAnchor::ViewportCenter => self.snapshot.viewport_center,
                FovAnchor::Pointer => self.snapshot.pointer,
            },
        }
    }
}

/// Result of a decision stage before it is published.
struct Outcome {
    state: EngagementState,
    immediate: bool,
    preview: Option<Preview>,
}

impl Outcome {
    const fn idle() -> Self {
        Self {
            state: EngagementState::Idle,
            immediate: false,
            preview: None,
        }
    }

    const fn engaged(state: EngagementState, preview: Option<Preview>) -> Self {
        Self {
            state,
            immediate: true,
            preview,
        }
    }

    const fn previewing(preview: Preview) -> Self {
        Self {
            state: EngagementState::Idle,
            immediate: false,
            preview: Some(preview),
        }
    }
}

/// Melee target resolved against the current snapshot.
#[derive(Debug, Clone, Copy)]
struct MeleeTarget {
    target: TargetRef,
    position: Vec2,
    /// Where to steer; led by the agent's last velocity when known.
    aim: Vec2,
    distance: f32,
}

/// Owns every piece of cross-tick engagement state.
///
/// Call [`EngagementController::tick`] once per host frame. The controller
/// never holds on to the snapshot.
///
/// # Examples
/// ```
/// use marksman::prelude::*;
///
/// let mut controller = EngagementController::new(EngineConfig::default());
/// let mut queue = IntentQueue::new();
/// let snapshot = WorldSnapshot::default();
/// let aim = controller.tick(&snapshot, &IdentityProjection, &mut queue);
/// assert_eq!(aim.mode, AimMode::Idle);
/// assert!(queue.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct EngagementController {
    config: EngineConfig,
    scorer: TargetScorer,
    los: LineOfSightEvaluator,
    predictor: BallisticPredictor,
    focused: Option<AgentId>,
    current: Option<AgentId>,
    current_shootable: bool,
    loot: Option<ObjectId>,
    melee: Option<TargetRef>,
    switching_to_melee: bool,
    state: EngagementState,
    aim: AimState,
}

impl EngagementController {
    /// Idle controller with no tracked targets.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scorer: TargetScorer::new(config.scoring.clone(), config.ranged.fov_radius),
            los: LineOfSightEvaluator::new(config.los.clone()),
            predictor: BallisticPredictor::new(
                config.ballistics.clone(),
                config.ranged.prediction_strength,
            ),
            config,
            focused: None,
            current: None,
            current_shootable: false,
            loot: None,
            melee: None,
            switching_to_melee: false,
            state: EngagementState::Idle,
            aim: AimState::idle(false),
        }
    }

    /// Settings in effect for the next tick.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces the settings from the next tick on.
    ///
    /// Position histories, focus and target references survive, so toggling
    /// a mode does not restart tracking.
    pub fn set_config(&mut self, config: EngineConfig) {
        self.scorer = TargetScorer::new(config.scoring.clone(), config.ranged.fov_radius);
        self.los = LineOfSightEvaluator::new(config.los.clone());
        self.predictor
            .reconfigure(config.ballistics.clone(), config.ranged.prediction_strength);
        self.config = config;
    }

    /// Evaluates one snapshot, appending any commands to `queue`.
    ///
    /// Faults in the snapshot never escape: they are logged, every transient
    /// target reference is dropped and the tick resolves to an immediate
    /// idle with no commands.
    pub fn tick(
        &mut self,
        snapshot: &WorldSnapshot,
        projection: &dyn Projection,
        queue: &mut IntentQueue,
    ) -> &AimState {
        let mut intents = Vec::new();
        match self.try_tick(snapshot, projection, &mut intents) {
            Ok(outcome) => {
                if outcome.state.mode() != self.state.mode() {
                    debug!(
                        "engagement {:?} -> {:?}",
                        self.state.mode(),
                        outcome.state.mode()
                    );
                }
                queue.extend(intents);
                self.aim = AimState::from_state(&outcome.state, outcome.immediate, outcome.preview);
                self.state = outcome.state;
            }
            Err(err) => {
                warn!("tick at {} abandoned: {err}", snapshot.now);
                self.clear_targets();
                self.state = EngagementState::Idle;
                self.aim = AimState::idle(true);
            }
        }
        &self.aim
    }

    fn try_tick(
        &mut self,
        snapshot: &WorldSnapshot,
        projection: &dyn Projection,
        intents: &mut Vec<Intent>,
    ) -> EngineResult<Outcome> {
        let Some(local) = snapshot.local.as_ref() else {
            return Ok(Outcome::idle());
        };
        if !snapshot.is_ready() || !self.config.any_mode_enabled() {
            return Ok(Outcome::idle());
        }
        self.config.validate()?;
        snapshot.validate()?;
        self.prune(snapshot);

        let fire_held = snapshot.fire_held;
        let has_target = self.has_valid_target(snapshot);
        let tick = TickInputs {
            snapshot,
            local,
            projection,
            melee_equipped: local.tool == ToolCategory::Melee,
            should_engage: fire_held || (self.config.ranged.automatic && has_target),
            wants_melee: self.config.melee.enabled && (self.config.ranged.automatic || fire_held),
        };

        if let Some(outcome) = self.melee_stage(&tick, intents)? {
            return Ok(outcome);
        }

        let holding_throwable = local.tool == ToolCategory::Throwable && !fire_held;
        if !self.config.ranged.enabled || tick.melee_equipped || holding_throwable {
            return Ok(Outcome::idle());
        }

        let (target, released_focus) = self.select_agent(&tick)?;
        let mut outcome = match target {
            Some(agent) => self.ranged_stage(&tick, agent, intents)?,
            None => self.loot_stage(&tick, intents)?,
        };
        outcome.immediate |= released_focus;
        Ok(outcome)
    }

    /// Drops tracking state for agents that left the snapshot.
    fn prune(&mut self, snapshot: &WorldSnapshot) {
        let present: HashSet<AgentId> = snapshot
            .agents
            .iter()
            .filter(|agent| agent.is_present())
            .map(|agent| agent.id)
            .collect();
        self.predictor.retain(|id| present.contains(&id));
    }

    /// Acquires, keeps or drops the melee target and decides whether the
    /// melee lock holds this tick.
    fn melee_stage(&mut self, tick: &TickInputs<'_>, intents: &mut Vec<Intent>) -> EngineResult<Option<Outcome>> {
        if !tick.wants_melee {
            self.melee = None;
            self.switching_to_melee = false;
            return Ok(None);
        }
        if self.melee.and_then(|target| resolve(tick.snapshot, target)).is_none() {
            let acquired = self.acquire_melee_target(tick);
            if acquired != self.melee {
                debug!("melee target {:?} -> {acquired:?}", self.melee);
            }
            self.melee = acquired;
        }

        let melee = &self.config.melee;
        let resolved = self.melee.and_then(|target| self.resolve_melee(tick, target));
        let distance = resolved.map_or(f32::INFINITY, |found| found.distance);
        let in_range = distance <= melee.lock_distance();
        let aggressive_range = self.config.ranged.aggressive
            && melee.auto_equip
            && distance <= melee.aggressive_distance();
        let reachable = in_range || aggressive_range;

        if melee.auto_equip && !tick.melee_equipped && reachable && resolved.is_some() {
            intents.push(Intent::Equip {
                slot: tick.snapshot.slots.melee,
            });
            self.switching_to_melee = true;
        }
        if tick.melee_equipped || !reachable {
            self.switching_to_melee = false;
        }

        if let Some(target) = resolved {
            if reachable && (tick.melee_equipped || self.switching_to_melee) {
                if let Some(outcome) = self.melee_lock(tick, target, intents)? {
                    return Ok(Some(outcome));
                }
            }
        }

        if distance > self.config.melee.detection_distance && self.melee.is_some() {
            debug!("melee target {:?} left detection range", self.melee);
            self.melee = None;
        }
        Ok(None)
    }

    fn acquire_melee_target(&self, tick: &TickInputs<'_>) -> Option<TargetRef> {
        let filter = TargetFilter {
            allow_downed: self.config.ranged.target_downed,
            allow_allies: self.config.melee.attack_allies || self.config.ranged.target_allies,
        };
        TargetScorer::select_nearest_target(&tick.snapshot.agents, tick.me(), filter)
            .map(|agent| TargetRef::Agent(agent.id))
            .or_else(|| {
                TargetScorer::select_melee_loot(
                    &tick.snapshot.objects,
                    tick.me(),
                    self.config.melee.lock_distance(),
                )
                .map(|object| TargetRef::Object(object.id))
            })
    }

    fn resolve_melee(&self, tick: &TickInputs<'_>, target: TargetRef) -> Option<MeleeTarget> {
        let position = resolve(tick.snapshot, target)?;
        let distance = tick.me().position.distance(position);
        let aim = match target {
            TargetRef::Agent(id) => self.predictor.last_velocity(id).map_or(position, |velocity| {
                let melee = &self.config.melee;
                let lead = (distance / melee.closing_speed).max(melee.min_lead_time);
                position + velocity * lead
            }),
            TargetRef::Object(_) => position,
        };
        Some(MeleeTarget {
            target,
            position,
            aim,
            distance,
        })
    }

    /// Builds the melee lock when the target can be struck.
    fn melee_lock(
        &self,
        tick: &TickInputs<'_>,
        target: MeleeTarget,
        intents: &mut Vec<Intent>,
    ) -> EngineResult<Option<Outcome>> {
        let shootable = match target.target {
            TargetRef::Object(_) => true,
            TargetRef::Agent(id) => {
                self.line_of_fire(tick, target.position, EntityRef::Agent(id))?
            }
        };
        if !shootable {
            return Ok(None);
        }

        let melee = &self.config.melee;
        if melee.auto_attack && tick.melee_equipped && target.distance < melee.engage_distance {
            intents.push(Intent::Fire);
        }
        let state = EngagementState::MeleeLock {
            aim_point: project(tick.projection, target.aim)?,
            move_intent: MoveIntent::toward(tick.me().position, target.aim),
        };
        Ok(Some(Outcome::engaged(state, None)))
    }

    /// Picks the ranged agent target: the focused agent while it stays
    /// valid, otherwise the best-scored one. Also reports whether a focus
    /// was released this tick.
    fn select_agent<'s>(&mut self, tick: &TickInputs<'s>) -> EngineResult<(Option<&'s Agent>, bool)> {
        let mut released = false;
        if let Some(id) = self.focused {
            match tick.snapshot.agent(id).filter(|agent| agent.is_present()) {
                Some(agent) if agent.layer.is_compatible_with(tick.me().layer) => {
                    self.switch_to(Some(id));
                    return Ok((Some(agent), false));
                }
                _ => {
                    debug!("focus on {id:?} released");
                    self.focused = None;
                    released = true;
                }
            }
        }

        let ranged = &self.config.ranged;
        let filter = TargetFilter {
            allow_downed: ranged.target_downed,
            allow_allies: ranged.target_allies,
        };
        let best = self.scorer.select_best_target(
            &tick.snapshot.agents,
            tick.me(),
            filter,
            tick.viewport(ranged.fov_anchor),
            self.current,
            |agent| self.line_of_fire(tick, agent.position, EntityRef::Agent(agent.id)),
        )?;
        let chosen = best.map(|candidate| candidate.target);
        self.switch_to(chosen);
        let agent = chosen
            .map(|id| {
                tick.snapshot
                    .agent(id)
                    .ok_or_else(|| missing(TargetRef::Agent(id)))
            })
            .transpose()?;
        Ok((agent, released))
    }

    /// Records `next` as the current target, resetting its history on a
    /// switch.
    fn switch_to(&mut self, next: Option<AgentId>) {
        if next == self.current {
            return;
        }
        debug!("target {:?} -> {next:?}", self.current);
        if let Some(id) = next {
            self.predictor.reset(id);
        }
        self.current = next;
    }

    fn ranged_stage(
        &mut self,
        tick: &TickInputs<'_>,
        agent: &Agent,
        intents: &mut Vec<Intent>,
    ) -> EngineResult<Outcome> {
        self.loot = None;
        let shooter = tick.me().position;
        let weapon = tick.snapshot.weapon.as_ref();
        let prediction = self.predictor.predict(
            &LeadRequest {
                target: agent.id,
                position: agent.position,
                shooter,
                projectile_speed: weapon.map_or(
                    self.config.ballistics.default_projectile_speed,
                    |profile| profile.projectile_speed,
                ),
                now: tick.snapshot.now,
            },
            tick.projection,
        )?;

        let in_range = weapon.map_or(true, |profile| profile.reaches(shooter.distance(agent.position)));
        let shootable =
            in_range && self.line_of_fire(tick, agent.position, EntityRef::Agent(agent.id))?;
        self.current_shootable = shootable;
        Ok(self.engage_or_preview(tick, prediction.aim_screen, shootable, intents))
    }

    fn loot_stage(&mut self, tick: &TickInputs<'_>, intents: &mut Vec<Intent>) -> EngineResult<Outcome> {
        self.current_shootable = false;
        let best = self.scorer.select_loot_target(
            &tick.snapshot.objects,
            tick.me(),
            tick.viewport(self.config.ranged.fov_anchor),
            self.loot,
            |object| self.line_of_fire(tick, object.position, EntityRef::Object(object.id)),
        )?;
        let Some(candidate) = best else {
            self.loot = None;
            return Ok(Outcome::idle());
        };
        let object = tick
            .snapshot
            .object(candidate.target)
            .ok_or_else(|| missing(TargetRef::Object(candidate.target)))?;
        if self.loot != Some(object.id) {
            debug!("loot target {:?} -> {:?}", self.loot, object.id);
        }
        self.loot = Some(object.id);
        if !tick.should_engage {
            return Ok(Outcome::idle());
        }

        let shooter = tick.me().position;
        let in_range = tick
            .snapshot
            .weapon
            .map_or(true, |weapon| weapon.reaches(shooter.distance(object.position)));
        let shootable =
            in_range && self.line_of_fire(tick, object.position, EntityRef::Object(object.id))?;
        self.current_shootable = shootable;
        let aim = project(tick.projection, object.position)?;
        Ok(self.engage_or_preview(tick, aim, shootable, intents))
    }

    fn engage_or_preview(
        &self,
        tick: &TickInputs<'_>,
        aim: Vec2,
        shootable: bool,
        intents: &mut Vec<Intent>,
    ) -> Outcome {
        if !(tick.should_engage && shootable) {
            return Outcome::previewing(Preview {
                point: aim,
                shootable,
            });
        }
        if self.config.ranged.auto_fire {
            intents.push(Intent::Fire);
        }
        let state = EngagementState::RangedEngage {
            aim_point: aim,
            move_intent: None,
        };
        Outcome::engaged(
            state,
            Some(Preview {
                point: aim,
                shootable: true,
            }),
        )
    }

    /// Line-of-fire check honouring the wall-awareness switch.
    fn line_of_fire(&self, tick: &TickInputs<'_>, target: Vec2, subject: EntityRef) -> EngineResult<bool> {
        if !self.config.ranged.wall_awareness {
            return Ok(true);
        }
        let me = tick.me();
        self.los.has_line_of_fire(
            &LosQuery {
                origin: me.position,
                layer: me.layer,
                target,
                subject,
            },
            tick.snapshot.weapon.as_ref(),
            &tick.snapshot.objects,
        )
    }

    const fn clear_targets(&mut self) {
        self.focused = None;
        self.current = None;
        self.current_shootable = false;
        self.loot = None;
        self.melee = None;
        self.switching_to_melee = false;
    }

    /// Pins `agent` as the ranged target for as long as it stays valid.
    pub const fn focus(&mut self, agent: AgentId) {
        self.focused = Some(agent);
    }

    /// Releases a pinned focus; scoring picks the target again.
    pub const fn clear_focus(&mut self) {
        self.focused = None;
    }

    /// Agent pinned by [`EngagementController::focus`], if still pinned.
    #[must_use]
    pub const fn focused(&self) -> Option<AgentId> {
        self.focused
    }

    /// Whether the current ranged target is still active and alive in
    /// `snapshot`.
    #[must_use]
    pub fn has_valid_target(&self, snapshot: &WorldSnapshot) -> bool {
        self.current
            .and_then(|id| snapshot.agent(id))
            .is_some_and(Agent::is_present)
    }

    /// Whether the last evaluated ranged target was in range with a clear
    /// line of fire.
    #[must_use]
    pub const fn is_current_target_shootable(&self) -> bool {
        self.current_shootable
    }

    /// Whether the ranged target is a loot container.
    #[must_use]
    pub const fn is_targeting_loot(&self) -> bool {
        self.loot.is_some()
    }

    /// The ranged target: an agent, or a loot container when no agent is
    /// in view.
    #[must_use]
    pub fn current_target(&self) -> Option<TargetRef> {
        self.current
            .map(TargetRef::Agent)
            .or(self.loot.map(TargetRef::Object))
    }

    /// Agent or loot object held as the melee target.
    #[must_use]
    pub const fn melee_target(&self) -> Option<TargetRef> {
        self.melee
    }

    /// Whether an equip command for the melee slot is pending.
    #[must_use]
    pub const fn is_switching_to_melee(&self) -> bool {
        self.switching_to_melee
    }

    /// Engagement state decided by the last tick.
    #[must_use]
    pub const fn state(&self) -> &EngagementState {
        &self.state
    }

    /// Aim published by the last tick.
    #[must_use]
    pub const fn aim_state(&self) -> &AimState {
        &self.aim
    }

    /// Tracking state used for lead prediction.
    #[must_use]
    pub const fn predictor(&self) -> &BallisticPredictor {
        &self.predictor
    }
}

/// World position of `target` if it is still a live entry of `snapshot`.
fn resolve(snapshot: &WorldSnapshot, target: TargetRef) -> Option<Vec2> {
    match target {
        TargetRef::Agent(id) => snapshot
            .agent(id)
            .filter(|agent| agent.is_present())
            .map(|agent| agent.position),
        TargetRef::Object(id) => snapshot
            .object(id)
            .filter(|object| !object.dead)
            .map(|object| object.position),
    }
}

fn missing(target: TargetRef) -> EngineError {
    EngineError::MissingTarget {
        entity: target.into(),
    }
}
