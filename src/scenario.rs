//! Recorded scenarios and their replay.
//!
//! A scenario is a JSON document holding an [`EngineConfig`], the projection
//! to publish aim points through and an ordered list of world snapshots.
//! Replaying feeds every snapshot through a fresh [`EngagementController`]
//! and reports what it decided.
//!
//! ```
//! use marksman::scenario::Scenario;
//! let scenario = Scenario::from_json_str(r#"{ "frames": [{ "now": 0.0 }] }"#)
//!     .expect("minimal scenario parses");
//! let reports = scenario.replay();
//! assert_eq!(reports.len(), 1);
//! ```

use glam::Vec2;
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::engagement::{AimState, EngagementController, Intent, IntentQueue};
use crate::projection::{CameraProjection, IdentityProjection, Projection};
use crate::world::WorldSnapshot;

/// How aim points are mapped for a replay.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionSpec {
    /// Aim points stay in world coordinates.
    #[default]
    World,
    /// A camera centred on the local agent each frame.
    Camera {
        /// Pixel position of the viewport centre.
        viewport_center: Vec2,
        /// Zoom factor.
        pixels_per_unit: f32,
    },
}

impl ProjectionSpec {
    fn for_frame(self, snapshot: &WorldSnapshot) -> Box<dyn Projection> {
        match self {
            Self::World => Box::new(IdentityProjection),
            Self::Camera {
                viewport_center,
                pixels_per_unit,
            } => Box::new(CameraProjection {
                camera: snapshot
                    .local
                    .as_ref()
                    .map_or(Vec2::ZERO, |local| local.agent.position),
                viewport_center,
                pixels_per_unit,
            }),
        }
    }
}

/// A recorded sequence of snapshots with the settings to replay them under.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Engine settings; omitted sections take their defaults.
    #[serde(default)]
    pub config: EngineConfig,
    /// Projection applied to every frame.
    #[serde(default)]
    pub projection: ProjectionSpec,
    /// Snapshots in tick order.
    pub frames: Vec<WorldSnapshot>,
}

/// What the controller decided for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    /// Frame index within the scenario.
    pub tick: usize,
    /// Host clock of the frame.
    pub now: f64,
    /// Published aim.
    pub aim: AimState,
    /// Commands queued during the frame.
    pub intents: Vec<Intent>,
}

impl Scenario {
    /// Parses a scenario document.
    ///
    /// # Errors
    /// Returns the `serde_json` error for malformed documents.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Replays every frame through a fresh controller.
    #[must_use]
    pub fn replay(&self) -> Vec<FrameReport> {
        let mut controller = EngagementController::new(self.config.clone());
        self.replay_with(&mut controller)
    }

    /// Replays every frame through `controller`, keeping whatever state it
    /// already carries.
    pub fn replay_with(&self, controller: &mut EngagementController) -> Vec<FrameReport> {
        info!("replaying {} frames", self.frames.len());
        let mut queue = IntentQueue::new();
        self.frames
            .iter()
            .enumerate()
            .map(|(tick, snapshot)| {
                let projection = self.projection.for_frame(snapshot);
                let aim = *controller.tick(snapshot, projection.as_ref(), &mut queue);
                FrameReport {
                    tick,
                    now: snapshot.now,
                    aim,
                    intents: queue.drain(),
                }
            })
            .collect()
    }
}
