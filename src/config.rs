//! Engine configuration.
//!
//! Every section falls back to the tuned defaults from [`crate::constants`],
//! so a host only has to spell out what it changes:
//!
//! ```
//! use marksman::config::EngineConfig;
//! let config = EngineConfig::from_json_str(r#"{ "melee": { "enabled": true } }"#)
//!     .expect("partial config parses");
//! assert!(config.melee.enabled);
//! assert!(config.ranged.enabled);
//! ```
//!
//! Parsing only checks types. [`EngineConfig::validate`] checks ranges and
//! runs at the start of every tick.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::constants::{
    AGGRESSIVE_MELEE_FACTOR, CONTINUITY_BONUS, DEFAULT_FOV_RADIUS, DEFAULT_PREDICTION_STRENGTH,
    DEFAULT_PROJECTILE_SPEED, HISTORY_CAPACITY, LOS_EARLY_EXIT_FRACTION, LOS_MAX_RAYS,
    LOS_MIN_RAYS, LOS_PASS_FRACTION, LOS_RANGE_STEP, LOS_SPREAD_SCALE, LOS_TARGET_RADIUS,
    MAX_LEAD_TIME, MAX_TRACKED_SPEED, MELEE_CLOSING_SPEED, MELEE_DETECTION_DISTANCE,
    MELEE_ENGAGE_DISTANCE, MELEE_LOCK_HYSTERESIS, MELEE_MIN_LEAD_TIME, MIN_SAMPLE_INTERVAL,
    MIN_VELOCITY_SAMPLES, PROJECTILE_HEIGHT, PROXIMITY_FALLOFF, SHOOTABLE_BONUS,
};
use crate::error::{EngineError, EngineResult};

/// Top-level engine settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ranged engagement switches and field of view.
    pub ranged: RangedConfig,
    /// Melee lock switches and distances.
    pub melee: MeleeConfig,
    /// Target score weights.
    pub scoring: ScoringConfig,
    /// Line-of-fire ray fan.
    pub los: LosConfig,
    /// Tracking and lead prediction.
    pub ballistics: BallisticsConfig,
}

impl EngineConfig {
    /// Parses a (possibly partial) JSON configuration document.
    ///
    /// # Errors
    /// Returns the `serde_json` error when the document is malformed or a
    /// field has the wrong type.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether any engagement mode is switched on.
    #[must_use]
    pub const fn any_mode_enabled(&self) -> bool {
        self.ranged.enabled || self.melee.enabled
    }

    /// Checks that every numeric setting lies in its usable range.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidConfig`] naming the first offending
    /// setting.
    pub fn validate(&self) -> EngineResult<()> {
        let ranged = &self.ranged;
        non_negative("ranged.fov_radius", ranged.fov_radius)?;
        non_negative("ranged.prediction_strength", ranged.prediction_strength)?;

        let melee = &self.melee;
        non_negative("melee.engage_distance", melee.engage_distance)?;
        non_negative("melee.detection_distance", melee.detection_distance)?;
        non_negative("melee.hysteresis", melee.hysteresis)?;
        non_negative("melee.aggressive_factor", melee.aggressive_factor)?;
        positive("melee.closing_speed", melee.closing_speed)?;
        non_negative("melee.min_lead_time", melee.min_lead_time)?;

        positive("scoring.proximity_falloff", self.scoring.proximity_falloff)?;
        non_negative("scoring.continuity_bonus", self.scoring.continuity_bonus)?;
        non_negative("scoring.shootable_bonus", self.scoring.shootable_bonus)?;

        let los = &self.los;
        non_negative("los.spread_scale", los.spread_scale)?;
        non_negative("los.range_step", los.range_step)?;
        non_negative("los.target_radius", los.target_radius)?;
        fraction("los.early_exit_fraction", los.early_exit_fraction)?;
        fraction("los.pass_fraction", los.pass_fraction)?;
        non_negative("los.projectile_height", los.projectile_height)?;

        let ballistics = &self.ballistics;
        ensure(
            "ballistics.min_sample_interval",
            ballistics.min_sample_interval,
            ballistics.min_sample_interval.is_finite() && ballistics.min_sample_interval >= 0.0,
        )?;
        non_negative("ballistics.max_speed", ballistics.max_speed)?;
        non_negative("ballistics.max_lead_time", ballistics.max_lead_time)?;
        positive("ballistics.default_projectile_speed", ballistics.default_projectile_speed)
    }
}

fn ensure(setting: &str, value: impl Display, usable: bool) -> EngineResult<()> {
    if usable {
        Ok(())
    } else {
        Err(EngineError::invalid_config(format!("{setting} = {value}")))
    }
}

fn non_negative(setting: &str, value: f32) -> EngineResult<()> {
    ensure(setting, value, value.is_finite() && value >= 0.0)
}

fn positive(setting: &str, value: f32) -> EngineResult<()> {
    ensure(setting, value, value.is_finite() && value > 0.0)
}

fn fraction(setting: &str, value: f32) -> EngineResult<()> {
    ensure(setting, value, (0.0..=1.0).contains(&value))
}

/// Screen point the field-of-view circle is centred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FovAnchor {
    /// Centre of the host viewport.
    #[default]
    ViewportCenter,
    /// Current pointer position.
    Pointer,
}

/// Ranged engagement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangedConfig {
    /// Master switch for ranged engagement.
    pub enabled: bool,
    /// Engage without the fire control held while a valid target exists.
    pub automatic: bool,
    /// Check line of fire before treating a target as shootable.
    pub wall_awareness: bool,
    /// Consider knocked-down agents.
    pub target_downed: bool,
    /// Consider teammates.
    pub target_allies: bool,
    /// Screen-space radius around the anchor in which targets are considered.
    pub fov_radius: f32,
    /// Where the field-of-view circle is centred.
    pub fov_anchor: FovAnchor,
    /// Multiplier on the predicted lead displacement.
    pub prediction_strength: f32,
    /// Queue a fire command whenever a shootable target is engaged.
    pub auto_fire: bool,
    /// Widen the melee auto-equip radius.
    pub aggressive: bool,
}

impl Default for RangedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            automatic: false,
            wall_awareness: true,
            target_downed: false,
            target_allies: false,
            fov_radius: DEFAULT_FOV_RADIUS,
            fov_anchor: FovAnchor::ViewportCenter,
            prediction_strength: DEFAULT_PREDICTION_STRENGTH,
            auto_fire: false,
            aggressive: false,
        }
    }
}

/// Melee lock settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeConfig {
    /// Master switch for the melee lock.
    pub enabled: bool,
    /// Queue an equip command for the melee slot when a target closes in.
    pub auto_equip: bool,
    /// Queue fire commands while a locked target is within engage distance.
    pub auto_attack: bool,
    /// Let melee acquire teammates.
    pub attack_allies: bool,
    /// Distance within which auto-attack fires.
    pub engage_distance: f32,
    /// Radius at which a melee target is acquired and beyond which it is
    /// dropped.
    pub detection_distance: f32,
    /// Extra reach added to the engage distance for holding a lock.
    pub hysteresis: f32,
    /// Multiplier on the detection distance for the aggressive equip radius.
    pub aggressive_factor: f32,
    /// Assumed approach speed for melee lead, world units per second.
    pub closing_speed: f32,
    /// Floor on the melee lead time, seconds.
    pub min_lead_time: f32,
}

impl Default for MeleeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            auto_equip: true,
            auto_attack: true,
            attack_allies: false,
            engage_distance: MELEE_ENGAGE_DISTANCE,
            detection_distance: MELEE_DETECTION_DISTANCE,
            hysteresis: MELEE_LOCK_HYSTERESIS,
            aggressive_factor: AGGRESSIVE_MELEE_FACTOR,
            closing_speed: MELEE_CLOSING_SPEED,
            min_lead_time: MELEE_MIN_LEAD_TIME,
        }
    }
}

impl MeleeConfig {
    /// Distance within which a melee lock engages.
    #[must_use]
    pub const fn lock_distance(&self) -> f32 {
        self.engage_distance + self.hysteresis
    }

    /// Distance within which aggressive mode equips the melee slot.
    #[must_use]
    pub const fn aggressive_distance(&self) -> f32 {
        self.detection_distance * self.aggressive_factor
    }
}

/// Weights of the target score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Screen distance over which the proximity term falls by `1/e`.
    pub proximity_falloff: f32,
    /// Bonus for the target locked last tick.
    pub continuity_bonus: f32,
    /// Bonus for a target with a clear line of fire.
    pub shootable_bonus: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            proximity_falloff: PROXIMITY_FALLOFF,
            continuity_bonus: CONTINUITY_BONUS,
            shootable_bonus: SHOOTABLE_BONUS,
        }
    }
}

/// Ray-fan parameters of the line-of-fire check.
///
/// The thresholds are empirical; they favour firing through partial cover
/// over skipping reachable targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LosConfig {
    /// Widening applied to the weapon spread.
    pub spread_scale: f32,
    /// Fewest rays fanned by spread alone.
    pub min_rays: usize,
    /// Most rays fanned by spread alone.
    pub max_rays: usize,
    /// Distance covered per additional ray.
    pub range_step: f32,
    /// Hits this close to the target count as the target's own body.
    pub target_radius: f32,
    /// Clear fraction that ends the sweep early.
    pub early_exit_fraction: f32,
    /// Clear fraction the full sweep must exceed.
    pub pass_fraction: f32,
    /// Obstacles lower than this never block.
    pub projectile_height: f32,
}

impl Default for LosConfig {
    fn default() -> Self {
        Self {
            spread_scale: LOS_SPREAD_SCALE,
            min_rays: LOS_MIN_RAYS,
            max_rays: LOS_MAX_RAYS,
            range_step: LOS_RANGE_STEP,
            target_radius: LOS_TARGET_RADIUS,
            early_exit_fraction: LOS_EARLY_EXIT_FRACTION,
            pass_fraction: LOS_PASS_FRACTION,
            projectile_height: PROJECTILE_HEIGHT,
        }
    }
}

/// Tracking and lead-prediction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallisticsConfig {
    /// Samples kept per agent.
    pub history_capacity: usize,
    /// Samples needed before a velocity is estimated.
    pub min_samples: usize,
    /// Seconds.
    pub min_sample_interval: f64,
    /// Upper bound on estimated speed, world units per second.
    pub max_speed: f32,
    /// Seconds.
    pub max_lead_time: f32,
    /// Used when the equipped tool has no projectile profile.
    pub default_projectile_speed: f32,
}

impl Default for BallisticsConfig {
    fn default() -> Self {
        Self {
            history_capacity: HISTORY_CAPACITY,
            min_samples: MIN_VELOCITY_SAMPLES,
            min_sample_interval: MIN_SAMPLE_INTERVAL,
            max_speed: MAX_TRACKED_SPEED,
            max_lead_time: MAX_LEAD_TIME,
            default_projectile_speed: DEFAULT_PROJECTILE_SPEED,
        }
    }
}
