//! Convenience constructors for world records used in tests.

use glam::Vec2;
use marksman::geometry::Collider;
use marksman::world::{
    Agent, AgentId, LocalAgent, ObjectId, TeamId, ToolCategory, WeaponProfile, WorldObject,
    WorldSnapshot,
};

/// Identifier of the local agent in every fixture.
pub const LOCAL_ID: AgentId = AgentId(1);
pub const FRIENDLY: TeamId = TeamId(1);
pub const HOSTILE: TeamId = TeamId(2);

/// Narrow-spread rifle with a 300 unit range.
pub const RIFLE: WeaponProfile = WeaponProfile::new(5.0, 1000.0, Some(300.0));

/// Hostile agent on the ground layer.
pub fn enemy(id: u32, position: Vec2) -> Agent {
    Agent::new(AgentId(id), position, HOSTILE)
}

pub fn ally(id: u32, position: Vec2) -> Agent {
    Agent::new(AgentId(id), position, FRIENDLY)
}

/// Indestructible wall box centred on `center`.
pub fn wall(id: u32, center: Vec2, half_extents: Vec2) -> WorldObject {
    WorldObject::new(ObjectId(id), "brick_wall_ext_1", center)
        .with_collider(Collider::aabb_around(center, half_extents))
        .wall()
        .indestructible()
}

/// Breakable crate with a unit circle collider.
pub fn loot_crate(id: u32, position: Vec2) -> WorldObject {
    WorldObject::new(ObjectId(id), "crate_01", position).with_radius(1.0)
}

/// Fluent builder for [`WorldSnapshot`] values.
///
/// Starts with the local agent at the origin holding `tool`, a [`RIFLE`]
/// profile and the fire control held.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    snapshot: WorldSnapshot,
}

impl SnapshotBuilder {
    pub fn new(tool: ToolCategory) -> Self {
        Self {
            snapshot: WorldSnapshot {
                local: Some(LocalAgent::new(
                    Agent::new(LOCAL_ID, Vec2::ZERO, FRIENDLY),
                    tool,
                )),
                weapon: Some(RIFLE),
                fire_held: true,
                ..WorldSnapshot::default()
            },
        }
    }

    pub fn at(mut self, now: f64) -> Self {
        self.snapshot.now = now;
        self
    }

    pub fn agent(mut self, agent: Agent) -> Self {
        self.snapshot.agents.push(agent);
        self
    }

    pub fn object(mut self, object: WorldObject) -> Self {
        self.snapshot.objects.push(object);
        self
    }

    pub fn weapon(mut self, weapon: Option<WeaponProfile>) -> Self {
        self.snapshot.weapon = weapon;
        self
    }

    pub fn fire_held(mut self, held: bool) -> Self {
        self.snapshot.fire_held = held;
        self
    }

    pub fn build(self) -> WorldSnapshot {
        self.snapshot
    }
}
