//! Engagement state and the aim record published to the host.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::EntityRef;
use crate::vector_math::vec_direction;
use crate::world::{AgentId, ObjectId};

/// What the controller is locked onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TargetRef {
    /// Another agent.
    Agent(AgentId),
    /// A loot container.
    Object(ObjectId),
}

impl From<TargetRef> for EntityRef {
    fn from(target: TargetRef) -> Self {
        match target {
            TargetRef::Agent(id) => Self::Agent(id),
            TargetRef::Object(id) => Self::Object(id),
        }
    }
}

/// Requested movement towards a melee target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveIntent {
    /// Unit vector in world space.
    pub direction: Vec2,
}

impl MoveIntent {
    /// Movement from `from` straight at `to`.
    #[must_use]
    pub fn toward(from: Vec2, to: Vec2) -> Self {
        Self {
            direction: vec_direction(from, to),
        }
    }
}

/// Engagement mode of a tick. Aim points are in projected screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EngagementState {
    /// Nothing to aim at.
    #[default]
    Idle,
    /// Aiming a ranged weapon.
    RangedEngage {
        /// Led aim point.
        aim_point: Vec2,
        /// Always `None` for ranged fire; kept so hosts read both modes alike.
        move_intent: Option<MoveIntent>,
    },
    /// Closing on and swinging at a melee target.
    MeleeLock {
        /// Led aim point.
        aim_point: Vec2,
        /// Movement towards the target.
        move_intent: MoveIntent,
    },
}

impl EngagementState {
    /// Published mode for this state.
    #[must_use]
    pub const fn mode(&self) -> AimMode {
        match self {
            Self::Idle => AimMode::Idle,
            Self::RangedEngage { .. } => AimMode::Ranged,
            Self::MeleeLock { .. } => AimMode::Melee,
        }
    }

    /// Aim point, absent while idle.
    #[must_use]
    pub const fn aim_point(&self) -> Option<Vec2> {
        match *self {
            Self::Idle => None,
            Self::RangedEngage { aim_point, .. } | Self::MeleeLock { aim_point, .. } => {
                Some(aim_point)
            }
        }
    }

    /// Requested movement, if any.
    #[must_use]
    pub const fn move_intent(&self) -> Option<MoveIntent> {
        match *self {
            Self::Idle => None,
            Self::RangedEngage { move_intent, .. } => move_intent,
            Self::MeleeLock { move_intent, .. } => Some(move_intent),
        }
    }
}

/// Mode tag published in [`AimState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AimMode {
    /// No engagement.
    #[default]
    Idle,
    /// Ranged engagement.
    Ranged,
    /// Melee lock.
    Melee,
}

/// Overlay hint: where the controller would aim and whether it could hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    /// Projected point the controller would aim at.
    pub point: Vec2,
    /// Whether the target is in range with a clear line of fire.
    pub shootable: bool,
}

/// Snapshot of the controller's decision for the host.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AimState {
    /// Current engagement mode.
    pub mode: AimMode,
    /// Where to aim, in screen space.
    pub aim_point: Option<Vec2>,
    /// Requested movement, set during a melee lock.
    pub move_intent: Option<MoveIntent>,
    /// Snap to the aim point instead of easing towards it.
    pub immediate: bool,
    /// Overlay hint for a target that is not being engaged.
    pub preview: Option<Preview>,
}

impl AimState {
    /// Idle aim with no preview.
    #[must_use]
    pub const fn idle(immediate: bool) -> Self {
        Self {
            mode: AimMode::Idle,
            aim_point: None,
            move_intent: None,
            immediate,
            preview: None,
        }
    }

    /// Aim record describing `state`.
    #[must_use]
    pub const fn from_state(state: &EngagementState, immediate: bool, preview: Option<Preview>) -> Self {
        Self {
            mode: state.mode(),
            aim_point: state.aim_point(),
            move_intent: state.move_intent(),
            immediate,
            preview,
        }
    }
}
