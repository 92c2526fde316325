//! Faults raised while evaluating a tick.
//!
//! None of these escape [`crate::EngagementController::tick`]; they are
//! logged and converted into an idle decision for that tick.

use glam::Vec2;
use thiserror::Error;

use crate::world::{AgentId, ObjectId};

/// Reference to the snapshot entity a fault was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    /// The locally controlled agent.
    Local,
    /// Another agent in the snapshot.
    Agent(AgentId),
    /// A world object in the snapshot.
    Object(ObjectId),
}

/// Error raised by an engagement stage when snapshot data or settings are
/// unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A position or velocity field is NaN or infinite.
    #[error("non-finite position on {entity:?}")]
    NonFinitePosition {
        /// Entity carrying the bad position.
        entity: EntityRef,
    },
    /// The host clock is NaN or infinite.
    #[error("host clock {now} is not finite")]
    NonFiniteClock {
        /// Clock value as received.
        now: f64,
    },
    /// A collider has a negative radius or inverted bounds.
    #[error("invalid collider on object {object:?}")]
    InvalidCollider {
        /// Owner of the collider.
        object: ObjectId,
    },
    /// The equipped weapon profile carries unusable numbers.
    #[error("invalid weapon profile: {detail}")]
    InvalidWeapon {
        /// Which field is unusable and why.
        detail: String,
    },
    /// The projection collaborator returned a non-finite point.
    #[error("projection of {world} produced a non-finite point")]
    Projection {
        /// World point that was being projected.
        world: Vec2,
    },
    /// A tracked target reference points at nothing in the snapshot.
    #[error("target {entity:?} is missing from the snapshot")]
    MissingTarget {
        /// The dangling reference.
        entity: EntityRef,
    },
    /// An engine setting is out of its usable range.
    #[error("invalid configuration: {detail}")]
    InvalidConfig {
        /// Offending setting and its value.
        detail: String,
    },
}

impl EngineError {
    /// Convenience constructor for weapon profile faults.
    #[must_use]
    pub fn invalid_weapon(detail: impl Into<String>) -> Self {
        Self::InvalidWeapon {
            detail: detail.into(),
        }
    }

    /// Convenience constructor for configuration faults.
    #[must_use]
    pub fn invalid_config(detail: impl Into<String>) -> Self {
        Self::InvalidConfig {
            detail: detail.into(),
        }
    }
}

/// Result alias used by engagement stages.
pub type EngineResult<T> = Result<T, EngineError>;
