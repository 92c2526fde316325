//! Engagement tuning constants shared across modules.
//!
//! These values seed the defaults in [`crate::config::EngineConfig`]. Hosts
//! that need different tuning override the config rather than these.

/// Layers on which an entity is visible from, and can see, every layer.
pub const BYPASS_LAYERS: [u8; 2] = [2, 3];

/// Multiplier widening the weapon spread when fanning sight rays.
pub const LOS_SPREAD_SCALE: f32 = 1.5;
/// Fewest sight rays cast for one check.
pub const LOS_MIN_RAYS: usize = 15;
/// Most sight rays cast for one check.
pub const LOS_MAX_RAYS: usize = 30;
/// One extra ray per this many world units of shot distance.
pub const LOS_RANGE_STEP: f32 = 50.0;
/// Approximate body radius of a target. Hits closer to the target than this
/// land on the target itself.
pub const LOS_TARGET_RADIUS: f32 = 0.75;
/// Share of blocked rays at which a sweep stops early.
pub const LOS_EARLY_EXIT_FRACTION: f32 = 0.4;
/// Share of unblocked rays needed for a clear line of fire.
pub const LOS_PASS_FRACTION: f32 = 0.3;
/// Objects shorter than a projectile's flight height never block.
pub const PROJECTILE_HEIGHT: f32 = 0.25;
/// Remaining health above which an unknown destructible counts as solid.
pub const SOLID_HEALTH_THRESHOLD: f32 = 200.0;

/// Positions kept per tracked agent.
pub const HISTORY_CAPACITY: usize = 20;
/// Samples needed before a velocity is estimated.
pub const MIN_VELOCITY_SAMPLES: usize = 3;
/// Shortest sample interval, in seconds, used for velocity estimates.
pub const MIN_SAMPLE_INTERVAL: f64 = 0.001;
/// Speeds above this, in units per second, are treated as teleports.
pub const MAX_TRACKED_SPEED: f32 = 2000.0;
/// Upper bound, in seconds, on how far ahead a shot is led.
pub const MAX_LEAD_TIME: f32 = 2.0;
/// Projectile speed assumed when the weapon reports none.
pub const DEFAULT_PROJECTILE_SPEED: f32 = 1000.0;
/// Share of the computed lead that is applied.
pub const DEFAULT_PREDICTION_STRENGTH: f32 = 1.0;

/// Screen-space falloff of the proximity score.
pub const PROXIMITY_FALLOFF: f32 = 120.0;
/// Score bonus for the target picked last tick.
pub const CONTINUITY_BONUS: f32 = 0.02;
/// Score bonus for a target with a clear line of fire.
pub const SHOOTABLE_BONUS: f32 = 0.03;
/// Targeting radius around the anchor, in screen pixels.
pub const DEFAULT_FOV_RADIUS: f32 = 250.0;

/// Distance within which melee attacks are queued.
pub const MELEE_ENGAGE_DISTANCE: f32 = 5.5;
/// Melee targets further than this are dropped.
pub const MELEE_DETECTION_DISTANCE: f32 = 7.5;
/// Extra distance a melee lock holds beyond the engage distance.
pub const MELEE_LOCK_HYSTERESIS: f32 = 1.0;
/// Detection radius multiplier applied in aggressive auto-equip mode.
pub const AGGRESSIVE_MELEE_FACTOR: f32 = 1.5;
/// Closing speed assumed when leading a melee swing.
pub const MELEE_CLOSING_SPEED: f32 = 150.0;
/// Shortest lead applied to a melee swing, in seconds.
pub const MELEE_MIN_LEAD_TIME: f32 = 0.05;
