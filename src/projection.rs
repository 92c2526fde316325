//! World-to-viewport projection collaborator.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Maps world coordinates into the coordinate space aim points are
/// published in.
#[cfg_attr(test, mockall::automock)]
pub trait Projection {
    /// Maps a world position to its published coordinates.
    fn world_to_screen(&self, world: Vec2) -> Vec2;
}

/// Publishes aim points in world space unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityProjection;

impl Projection for IdentityProjection {
    fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world
    }
}

/// Top-down camera with the screen y axis pointing down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraProjection {
    /// World position at the centre of the viewport.
    pub camera: Vec2,
    /// Pixel position of the viewport centre.
    pub viewport_center: Vec2,
    /// Zoom factor.
    pub pixels_per_unit: f32,
}

impl Projection for CameraProjection {
    fn world_to_screen(&self, world: Vec2) -> Vec2 {
        let offset = (world - self.camera) * self.pixels_per_unit;
        Vec2::new(
            self.viewport_center.x + offset.x,
            self.viewport_center.y - offset.y,
        )
    }
}

/// Projects `world` and rejects non-finite results.
pub(crate) fn project(projection: &dyn Projection, world: Vec2) -> EngineResult<Vec2> {
    let screen = projection.world_to_screen(world);
    if screen.is_finite() {
        Ok(screen)
    } else {
        Err(EngineError::Projection { world })
    }
}
