//! Line-of-fire checks over mixed cover through the public API.

use glam::Vec2;
use marksman::config::LosConfig;
use marksman::error::{EngineError, EntityRef};
use marksman::line_of_sight::{LineOfSightEvaluator, LosQuery};
use marksman::world::{AgentId, Layer, ObjectId, WeaponProfile, WorldObject};
use rstest::{fixture, rstest};

const RIFLE: WeaponProfile = WeaponProfile::new(5.0, 1000.0, None);
const TARGET: Vec2 = Vec2::new(40.0, 0.0);

#[fixture]
fn evaluator() -> LineOfSightEvaluator {
    LineOfSightEvaluator::new(LosConfig::default())
}

fn query(layer: Layer) -> LosQuery {
    LosQuery {
        origin: Vec2::ZERO,
        layer,
        target: TARGET,
        subject: EntityRef::Agent(AgentId(2)),
    }
}

/// Obstacle of `kind` with a radius-3 collider halfway to the target.
fn midway(kind: &str) -> WorldObject {
    WorldObject::new(ObjectId(7), kind, Vec2::new(20.0, 0.0)).with_radius(3.0)
}

#[rstest]
#[case::tree("tree_01", false)]
#[case::stone("stone_01", false)]
#[case::glass("glass_wall_02", false)]
#[case::bush("bush_01", true)]
#[case::crate_("crate_02", true)]
#[case::window("window_03", true)]
#[case::untagged("mystery_prop", true)]
fn cover_families(evaluator: LineOfSightEvaluator, #[case] kind: &str, #[case] clear: bool) {
    let objects = [midway(kind)];
    let result = evaluator
        .has_line_of_fire(&query(Layer::GROUND), Some(&RIFLE), &objects)
        .expect("finite query");
    assert_eq!(result, clear, "{kind}");
}

#[rstest]
#[case::solid(Some(500.0), false)]
#[case::flimsy(Some(50.0), true)]
#[case::unknown(None, true)]
fn unknown_props_fall_back_to_health(
    evaluator: LineOfSightEvaluator,
    #[case] health: Option<f32>,
    #[case] clear: bool,
) {
    let mut prop = midway("mystery_prop");
    prop.health = health;
    let result = evaluator
        .has_line_of_fire(&query(Layer::GROUND), Some(&RIFLE), &[prop])
        .expect("finite query");
    assert_eq!(result, clear);
}

#[rstest]
fn walls_and_indestructible_objects_block_whatever_their_tag(evaluator: LineOfSightEvaluator) {
    let shooter = query(Layer::GROUND);
    let wall = midway("bush_decor").wall();
    let anchored = midway("crate_05").indestructible();
    for object in [wall, anchored] {
        let clear = evaluator
            .has_line_of_fire(&shooter, Some(&RIFLE), std::slice::from_ref(&object))
            .expect("finite query");
        assert!(!clear, "{:?} should block", object.kind);
    }
}

#[rstest]
fn non_collidable_low_and_dead_objects_are_ignored(evaluator: LineOfSightEvaluator) {
    let mut ghost = midway("tree_02");
    ghost.collidable = false;
    let stump = midway("tree_03").with_height(0.1);
    let mut felled = midway("tree_04");
    felled.dead = true;
    let objects = [ghost, stump, felled];
    let sweep = evaluator
        .evaluate(&query(Layer::GROUND), Some(&RIFLE), &objects)
        .expect("finite query");
    assert!(sweep.clear);
    assert_eq!(sweep.intersections, 0);
}

#[rstest]
#[case::same_layer(Layer::GROUND, Some(Layer::GROUND), false)]
#[case::other_layer(Layer::GROUND, Some(Layer::UNDERGROUND), true)]
#[case::stairs_from_ground(Layer::GROUND, Some(Layer(2)), false)]
#[case::from_stairs(Layer(2), Some(Layer::UNDERGROUND), false)]
#[case::unlayered(Layer::UNDERGROUND, None, false)]
fn obstacles_only_block_on_visible_layers(
    evaluator: LineOfSightEvaluator,
    #[case] shooter: Layer,
    #[case] tree_layer: Option<Layer>,
    #[case] clear: bool,
) {
    let mut tree = midway("tree_05");
    tree.layer = tree_layer;
    let result = evaluator
        .has_line_of_fire(&query(shooter), Some(&RIFLE), &[tree])
        .expect("finite query");
    assert_eq!(result, clear);
}

#[rstest]
fn a_gap_between_two_trees_lets_the_fan_through(evaluator: LineOfSightEvaluator) {
    // The fan is about 2.6 units wide at x = 20; the trees leave a gap of 2.
    let upper = WorldObject::new(ObjectId(1), "tree_01", Vec2::new(20.0, 2.0)).with_radius(1.0);
    let lower = WorldObject::new(ObjectId(2), "tree_01", Vec2::new(20.0, -2.0)).with_radius(1.0);
    let sweep = evaluator
        .evaluate(&query(Layer::GROUND), Some(&RIFLE), &[upper, lower])
        .expect("finite query");
    assert!(sweep.clear, "{sweep:?}");
    assert!(sweep.unblocked > 0);
}

#[rstest]
fn the_targeted_object_never_blocks_itself(evaluator: LineOfSightEvaluator) {
    let tree = midway("tree_06");
    let mut aimed = query(Layer::GROUND);
    aimed.subject = EntityRef::Object(tree.id);
    let result = evaluator
        .has_line_of_fire(&aimed, Some(&RIFLE), &[tree])
        .expect("finite query");
    assert!(result);
}

#[rstest]
fn non_finite_endpoints_are_reported(evaluator: LineOfSightEvaluator) {
    let mut broken = query(Layer::GROUND);
    broken.origin = Vec2::new(f32::INFINITY, 0.0);
    let err = evaluator
        .has_line_of_fire(&broken, Some(&RIFLE), &[])
        .expect_err("infinite origin");
    assert_eq!(
        err,
        EngineError::NonFinitePosition {
            entity: EntityRef::Local
        }
    );
}
