//! Utility helpers for tests.
//!
//! Fixture builders for snapshots and a tick driver shared by the
//! integration suites.

pub mod fixtures;

use glam::Vec2;
use marksman::engagement::{AimState, EngagementController, Intent, IntentQueue};
use marksman::projection::IdentityProjection;
use marksman::world::WorldSnapshot;

/// Runs one tick with world-space aim points and drains the queued intents.
pub fn tick(controller: &mut EngagementController, snapshot: &WorldSnapshot) -> (AimState, Vec<Intent>) {
    let mut queue = IntentQueue::new();
    let aim = *controller.tick(snapshot, &IdentityProjection, &mut queue);
    (aim, queue.drain())
}

/// Assert that `actual` lies within `tolerance` of `expected`.
///
/// # Panics
/// Panics with both points when they are further apart.
pub fn assert_vec2_near(actual: Vec2, expected: Vec2, tolerance: f32) {
    assert!(
        actual.distance(expected) <= tolerance,
        "{actual} is not within {tolerance} of {expected}"
    );
}
