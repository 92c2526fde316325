//! Per-tick world snapshot supplied by the host.
//!
//! The host owns every agent and object; the engine only reads the snapshot
//! handed to [`crate::EngagementController::tick`] and never keeps
//! references past the call.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::constants::BYPASS_LAYERS;
use crate::error::{EngineError, EngineResult, EntityRef};
use crate::geometry::Collider;
use crate::obstacle::ObjectKind;

const fn yes() -> bool {
    true
}

/// Agent identifier with type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub u32);

impl From<u32> for AgentId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// World object identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl From<u32> for ObjectId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Team membership; agents sharing a team are allies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u32);

/// Coarse vertical partition of the world (ground, bunker, stairs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layer(pub u8);

impl Layer {
    /// Surface layer.
    pub const GROUND: Self = Self(0);
    /// Bunkers and cellars.
    pub const UNDERGROUND: Self = Self(1);

    /// Bypass layers connect every other layer, e.g. stairwells.
    #[must_use]
    pub fn is_bypass(self) -> bool {
        BYPASS_LAYERS.contains(&self.0)
    }

    /// Whether entities on `self` and `other` can see each other.
    ///
    /// The relation is reflexive and symmetric.
    ///
    /// # Examples
    /// ```
    /// use marksman::world::Layer;
    /// assert!(Layer::GROUND.is_compatible_with(Layer::GROUND));
    /// assert!(!Layer::GROUND.is_compatible_with(Layer::UNDERGROUND));
    /// assert!(Layer(2).is_compatible_with(Layer::UNDERGROUND));
    /// assert!(Layer::UNDERGROUND.is_compatible_with(Layer(2)));
    /// ```
    #[must_use]
    pub fn is_compatible_with(self, other: Self) -> bool {
        self == other || self.is_bypass() || other.is_bypass()
    }
}

/// A moving participant in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Host identifier.
    pub id: AgentId,
    /// World position.
    pub position: Vec2,
    /// Layer the agent stands on.
    #[serde(default)]
    pub layer: Layer,
    /// Team membership.
    #[serde(default)]
    pub team: TeamId,
    /// Cleared once the agent dies.
    #[serde(default = "yes")]
    pub alive: bool,
    /// Knocked down but not yet dead.
    #[serde(default)]
    pub downed: bool,
    /// Present in the current interest area of the host.
    #[serde(default = "yes")]
    pub active: bool,
}

impl Agent {
    /// Creates an active, living agent on the ground layer.
    #[must_use]
    pub const fn new(id: AgentId, position: Vec2, team: TeamId) -> Self {
        Self {
            id,
            position,
            layer: Layer::GROUND,
            team,
            alive: true,
            downed: false,
            active: true,
        }
    }

    /// Moves the agent onto `layer`.
    #[must_use]
    pub const fn on_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    /// Marks the agent as knocked down.
    #[must_use]
    pub const fn downed(mut self) -> Self {
        self.downed = true;
        self
    }

    /// Marks the agent as dead.
    #[must_use]
    pub const fn dead(mut self) -> Self {
        self.alive = false;
        self
    }

    /// Active and alive, i.e. still worth tracking.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.active && self.alive
    }
}

/// Category of the tool the local agent is holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    /// Guns and bows.
    #[default]
    Ranged,
    /// Fists and blades.
    Melee,
    /// Grenades and similar.
    Throwable,
}

/// The locally controlled agent plus what it is holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalAgent {
    /// The agent itself.
    #[serde(flatten)]
    pub agent: Agent,
    /// What it is holding.
    #[serde(default)]
    pub tool: ToolCategory,
}

impl LocalAgent {
    /// Wraps `agent` holding `tool`.
    #[must_use]
    pub const fn new(agent: Agent, tool: ToolCategory) -> Self {
        Self { agent, tool }
    }
}

/// Projectile characteristics of the equipped tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    /// Full spread cone in degrees.
    #[serde(default)]
    pub spread_degrees: f32,
    /// World units per second.
    pub projectile_speed: f32,
    /// Maximum travel distance; `None` means unbounded.
    #[serde(default)]
    pub max_range: Option<f32>,
}

impl WeaponProfile {
    /// Profile with the given spread, speed and range.
    #[must_use]
    pub const fn new(spread_degrees: f32, projectile_speed: f32, max_range: Option<f32>) -> Self {
        Self {
            spread_degrees,
            projectile_speed,
            max_range,
        }
    }

    /// Whether `distance` is within reach of this weapon.
    #[must_use]
    pub fn reaches(&self, distance: f32) -> bool {
        self.max_range.map_or(true, |range| distance <= range)
    }

    fn validate(&self) -> EngineResult<()> {
        if !self.spread_degrees.is_finite() || self.spread_degrees < 0.0 {
            return Err(EngineError::invalid_weapon(format!(
                "spread {} is not a finite non-negative angle",
                self.spread_degrees
            )));
        }
        if !self.projectile_speed.is_finite() || self.projectile_speed <= 0.0 {
            return Err(EngineError::invalid_weapon(format!(
                "projectile speed {} is not positive",
                self.projectile_speed
            )));
        }
        if let Some(range) = self.max_range {
            if range.is_nan() || range < 0.0 {
                return Err(EngineError::invalid_weapon(format!(
                    "range {range} is negative"
                )));
            }
        }
        Ok(())
    }
}

/// Inventory slot indices the host uses for equip commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipSlots {
    /// Main gun slot.
    pub primary: u8,
    /// Backup gun slot.
    pub secondary: u8,
    /// Melee weapon slot.
    pub melee: u8,
    /// Throwable slot.
    pub throwable: u8,
}

impl Default for EquipSlots {
    fn default() -> Self {
        Self {
            primary: 0,
            secondary: 1,
            melee: 2,
            throwable: 3,
        }
    }
}

/// Static or destructible object in the world: walls, trees, crates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldObject {
    /// Host identifier.
    pub id: ObjectId,
    /// Type tag with its resolved family.
    pub kind: ObjectKind,
    /// World position.
    pub position: Vec2,
    /// Collision footprint; objects without one never block.
    #[serde(default)]
    pub collider: Option<Collider>,
    /// Layer the object sits on; `None` means visible from every layer.
    #[serde(default)]
    pub layer: Option<Layer>,
    /// Vertical extent, when known.
    #[serde(default)]
    pub height: Option<f32>,
    /// Whether projectiles can collide with it at all.
    #[serde(default = "yes")]
    pub collidable: bool,
    /// Whether it can be shot apart.
    #[serde(default = "yes")]
    pub destructible: bool,
    /// Host-flagged wall.
    #[serde(default)]
    pub is_wall: bool,
    /// Remaining health, when known.
    #[serde(default)]
    pub health: Option<f32>,
    /// Destroyed objects stay in the snapshot with this set.
    #[serde(default)]
    pub dead: bool,
}

impl WorldObject {
    /// Creates a collidable, destructible object without a collider.
    #[must_use]
    pub fn new(id: ObjectId, kind: impl Into<ObjectKind>, position: Vec2) -> Self {
        Self {
            id,
            kind: kind.into(),
            position,
            collider: None,
            layer: None,
            height: None,
            collidable: true,
            destructible: true,
            is_wall: false,
            health: None,
            dead: false,
        }
    }

    /// Sets the collision footprint.
    #[must_use]
    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.collider = Some(collider);
        self
    }

    /// Circle collider of `radius` centred on the object's position.
    #[must_use]
    pub fn with_radius(self, radius: f32) -> Self {
        let center = self.position;
        self.with_collider(Collider::circle(center, radius))
    }

    /// Places the object on `layer`.
    #[must_use]
    pub fn on_layer(mut self, layer: Layer) -> Self {
        self.layer = Some(layer);
        self
    }

    /// Sets the vertical extent.
    #[must_use]
    pub fn with_height(mut self, height: f32) -> Self {
        self.height = Some(height);
        self
    }

    /// Sets the remaining health.
    #[must_use]
    pub fn with_health(mut self, health: f32) -> Self {
        self.health = Some(health);
        self
    }

    /// Flags the object as a wall.
    #[must_use]
    pub fn wall(mut self) -> Self {
        self.is_wall = true;
        self
    }

    /// Marks the object as indestructible.
    #[must_use]
    pub fn indestructible(mut self) -> Self {
        self.destructible = false;
        self
    }

    /// Whether the object lies on a layer visible from `layer`. Objects
    /// without a layer are visible everywhere.
    #[must_use]
    pub fn visible_from(&self, layer: Layer) -> bool {
        self.layer.map_or(true, |own| own.is_compatible_with(layer))
    }
}

/// Everything the engine reads from the host for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Host clock in seconds.
    #[serde(default)]
    pub now: f64,
    /// Cleared until the host has finished loading the match.
    #[serde(default = "yes")]
    pub initialized: bool,
    /// Set while the local player watches someone else.
    #[serde(default)]
    pub spectating: bool,
    /// The controlled agent, absent between lives.
    #[serde(default)]
    pub local: Option<LocalAgent>,
    /// Every other agent the host knows about.
    #[serde(default)]
    pub agents: Vec<Agent>,
    /// Obstacles and loot.
    #[serde(default)]
    pub objects: Vec<WorldObject>,
    /// Profile of the currently equipped tool, when it fires projectiles.
    #[serde(default)]
    pub weapon: Option<WeaponProfile>,
    /// Pixel position of the viewport centre.
    #[serde(default)]
    pub viewport_center: Vec2,
    /// Pointer position in screen pixels.
    #[serde(default)]
    pub pointer: Vec2,
    /// Whether the attack input is held this tick.
    #[serde(default)]
    pub fire_held: bool,
    /// Slot numbering for equip commands.
    #[serde(default)]
    pub slots: EquipSlots,
}

impl Default for WorldSnapshot {
    fn default() -> Self {
        Self {
            now: 0.0,
            initialized: true,
            spectating: false,
            local: None,
            agents: Vec::new(),
            objects: Vec::new(),
            weapon: None,
            viewport_center: Vec2::ZERO,
            pointer: Vec2::ZERO,
            fire_held: false,
            slots: EquipSlots::default(),
        }
    }
}

impl WorldSnapshot {
    /// Agent with `id`, if present.
    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id == id)
    }

    /// Object with `id`, if present.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&WorldObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    /// Whether the host has something for the engine to act on.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.initialized && !self.spectating && self.local.is_some()
    }

    /// Checks the numeric fields every stage relies on.
    ///
    /// # Errors
    /// Returns the first [`EngineError`] found, such as a non-finite clock
    /// or position, an invalid collider or an unusable weapon profile.
    pub fn validate(&self) -> EngineResult<()> {
        if !self.now.is_finite() {
            return Err(EngineError::NonFiniteClock { now: self.now });
        }
        if let Some(local) = &self.local {
            ensure_finite(local.agent.position, EntityRef::Local)?;
        }
        for agent in &self.agents {
            ensure_finite(agent.position, EntityRef::Agent(agent.id))?;
        }
        for object in &self.objects {
            ensure_finite(object.position, EntityRef::Object(object.id))?;
            if object.collider.is_some_and(|collider| !collider.is_valid()) {
                return Err(EngineError::InvalidCollider { object: object.id });
            }
        }
        if let Some(weapon) = &self.weapon {
            weapon.validate()?;
        }
        Ok(())
    }
}

fn ensure_finite(position: Vec2, entity: EntityRef) -> EngineResult<()> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(EngineError::NonFinitePosition { entity })
    }
}
