//! Library crate providing per-tick target selection for top-down games.
//! Scores agents in view, checks lines of fire against cover, leads moving
//! targets and drives the idle / ranged / melee engagement state machine.
pub mod ballistics;
pub mod config;
pub mod constants;
pub mod engagement;
pub mod error;
pub mod geometry;
pub mod line_of_sight;
pub mod logging;
pub mod numeric;
pub mod obstacle;
pub mod projection;
pub mod scenario;
pub mod targeting;
pub mod vector_math;
pub mod world;
pub use constants::*;

// Re-export commonly used items
pub use ballistics::{solve_intercept, BallisticPredictor, Intercept, PositionHistory};
pub use config::EngineConfig;
pub use engagement::{AimMode, AimState, EngagementController, EngagementState, Intent, IntentQueue};
pub use error::{EngineError, EngineResult};
pub use line_of_sight::LineOfSightEvaluator;
pub use logging::init as init_logging;
pub use obstacle::{classify, ObstacleClass, ObstacleFamily};
pub use projection::{CameraProjection, IdentityProjection, Projection};
pub use targeting::TargetScorer;
pub use vector_math::{bearing, vec_direction};
pub use world::{Agent, AgentId, LocalAgent, ObjectId, WorldObject, WorldSnapshot};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use marksman::prelude::*;
    //! ```

    pub use crate::config::EngineConfig;
    pub use crate::engagement::{AimMode, AimState, EngagementController, Intent, IntentQueue};
    pub use crate::projection::{IdentityProjection, Projection};
    pub use crate::world::{
        Agent, AgentId, Layer, LocalAgent, ObjectId, TeamId, ToolCategory, WeaponProfile,
        WorldObject, WorldSnapshot,
    };
}
