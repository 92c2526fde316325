//! Obstacle classification.
//!
//! World objects carry a free-form type tag such as `"brick_wall_ext_3"` or
//! `"crate_01"`. The tag is resolved once, when an [`ObjectKind`] is built,
//! into an [`ObstacleFamily`] through the static [`FAMILY_PATTERNS`] table.
//! Classification then works on the family and the object's flags, so no
//! string scanning happens while rays are cast.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::SOLID_HEALTH_THRESHOLD;
use crate::world::WorldObject;

/// Coarse family of a world object, derived from its type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[expect(missing_docs, reason = "each variant is named after the props it matches")]
pub enum ObstacleFamily {
    Wall,
    GlassWall,
    Silo,
    Bollard,
    Sandbags,
    Hedgehog,
    Stone,
    Tree,
    Locker,
    DepositBox,
    Bush,
    Brush,
    Crate,
    Barrel,
    Refrigerator,
    ControlPanel,
    Chest,
    Case,
    Oven,
    Bed,
    Bookshelf,
    Couch,
    Table,
    Drawers,
    Window,
    Toilet,
    Pot,
    Planter,
    Pumpkin,
    Potato,
    Egg,
    Woodpile,
    Decal,
}

/// Substring patterns mapped to families, checked in order.
///
/// Sight-blocking families come first so that, for instance,
/// `"glass_wall_"` wins over the later `"window"` pattern.
pub const FAMILY_PATTERNS: &[(&str, ObstacleFamily)] = &[
    ("metal_wall_", ObstacleFamily::Wall),
    ("brick_wall_", ObstacleFamily::Wall),
    ("concrete_wall_", ObstacleFamily::Wall),
    ("stone_wall_", ObstacleFamily::Wall),
    ("container_wall_", ObstacleFamily::Wall),
    ("_wall_int_", ObstacleFamily::Wall),
    ("bank_wall_", ObstacleFamily::Wall),
    ("barn_wall_", ObstacleFamily::Wall),
    ("cabin_wall_", ObstacleFamily::Wall),
    ("hut_wall_", ObstacleFamily::Wall),
    ("house_wall_", ObstacleFamily::Wall),
    ("mansion_wall_", ObstacleFamily::Wall),
    ("police_wall_", ObstacleFamily::Wall),
    ("shack_wall_", ObstacleFamily::Wall),
    ("outhouse_wall_", ObstacleFamily::Wall),
    ("teahouse_wall_", ObstacleFamily::Wall),
    ("warehouse_wall_", ObstacleFamily::Wall),
    ("glass_wall_", ObstacleFamily::GlassWall),
    ("silo_", ObstacleFamily::Silo),
    ("bollard_", ObstacleFamily::Bollard),
    ("sandbags_", ObstacleFamily::Sandbags),
    ("hedgehog", ObstacleFamily::Hedgehog),
    ("stone_0", ObstacleFamily::Stone),
    ("tree_", ObstacleFamily::Tree),
    ("locker_", ObstacleFamily::Locker),
    ("deposit_box_", ObstacleFamily::DepositBox),
    ("bush_", ObstacleFamily::Bush),
    ("brush_", ObstacleFamily::Brush),
    ("crate_", ObstacleFamily::Crate),
    ("barrel_", ObstacleFamily::Barrel),
    ("refrigerator_", ObstacleFamily::Refrigerator),
    ("control_panel_", ObstacleFamily::ControlPanel),
    ("chest_", ObstacleFamily::Chest),
    ("case_", ObstacleFamily::Case),
    ("oven_", ObstacleFamily::Oven),
    ("bed_", ObstacleFamily::Bed),
    ("bookshelf_", ObstacleFamily::Bookshelf),
    ("couch_", ObstacleFamily::Couch),
    ("table_", ObstacleFamily::Table),
    ("drawers_", ObstacleFamily::Drawers),
    ("window", ObstacleFamily::Window),
    ("toilet_", ObstacleFamily::Toilet),
    ("pot_", ObstacleFamily::Pot),
    ("planter_", ObstacleFamily::Planter),
    ("pumpkin_", ObstacleFamily::Pumpkin),
    ("potato_", ObstacleFamily::Potato),
    ("egg_", ObstacleFamily::Egg),
    ("woodpile_", ObstacleFamily::Woodpile),
    ("decal", ObstacleFamily::Decal),
];

impl ObstacleFamily {
    /// Resolves a type tag through [`FAMILY_PATTERNS`].
    #[must_use]
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        FAMILY_PATTERNS
            .iter()
            .find(|(pattern, _)| tag.contains(pattern))
            .map(|&(_, family)| family)
    }

    /// Whether members of this family stop projectiles.
    #[must_use]
    pub const fn blocks_sight(self) -> bool {
        matches!(
            self,
            Self::Wall
                | Self::GlassWall
                | Self::Silo
                | Self::Bollard
                | Self::Sandbags
                | Self::Hedgehog
                | Self::Stone
                | Self::Tree
                | Self::Locker
                | Self::DepositBox
        )
    }

    /// Whether breaking members of this family drops loot.
    #[must_use]
    pub const fn is_loot(self) -> bool {
        matches!(
            self,
            Self::Crate
                | Self::Chest
                | Self::Barrel
                | Self::Bookshelf
                | Self::Drawers
                | Self::Locker
                | Self::DepositBox
                | Self::Refrigerator
                | Self::ControlPanel
                | Self::Case
                | Self::Oven
                | Self::Bed
                | Self::Couch
                | Self::Table
                | Self::Window
                | Self::Pot
                | Self::Planter
        )
    }
}

/// Type tag of a world object together with its resolved family.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ObjectKind {
    tag: String,
    family: Option<ObstacleFamily>,
}

impl ObjectKind {
    /// The raw type tag supplied by the host.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The family resolved from the tag, if any pattern matched.
    #[must_use]
    pub const fn family(&self) -> Option<ObstacleFamily> {
        self.family
    }

    /// Whether the object is a loot container worth breaking.
    #[must_use]
    pub fn is_loot(&self) -> bool {
        self.family.is_some_and(ObstacleFamily::is_loot)
    }
}

impl From<String> for ObjectKind {
    fn from(tag: String) -> Self {
        let family = ObstacleFamily::from_type_tag(&tag);
        Self { tag, family }
    }
}

impl From<&str> for ObjectKind {
    fn from(tag: &str) -> Self {
        Self::from(String::from(tag))
    }
}

impl From<ObjectKind> for String {
    fn from(kind: ObjectKind) -> Self {
        kind.tag
    }
}

impl fmt::Debug for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.tag, self.family)
    }
}

/// Outcome of classifying an obstacle for line-of-fire purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleClass {
    /// Stops sight rays.
    Blocking,
    /// Sight rays pass through.
    NonBlocking,
    /// Nothing about the object says either way; callers treat it as
    /// passable.
    Indeterminate,
}

/// Classifies `object`, first matching rule wins:
///
/// 1. non-collidable objects never block;
/// 2. walls block;
/// 3. indestructible objects block;
/// 4. families from the blocking half of [`FAMILY_PATTERNS`] block;
/// 5. the remaining known families do not;
/// 6. unknown objects with more than [`SOLID_HEALTH_THRESHOLD`] health block;
/// 7. unknown objects with known health do not, and unknown objects without
///    health are [`ObstacleClass::Indeterminate`].
#[must_use]
pub fn classify(object: &WorldObject) -> ObstacleClass {
    if !object.collidable {
        return ObstacleClass::NonBlocking;
    }
    if object.is_wall || !object.destructible {
        return ObstacleClass::Blocking;
    }
    if let Some(family) = object.kind.family() {
        return if family.blocks_sight() {
            ObstacleClass::Blocking
        } else {
            ObstacleClass::NonBlocking
        };
    }
    match object.health {
        Some(health) if health > SOLID_HEALTH_THRESHOLD => ObstacleClass::Blocking,
        Some(_) => ObstacleClass::NonBlocking,
        None => ObstacleClass::Indeterminate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{ObjectId, WorldObject};
    use glam::Vec2;
    use rstest::rstest;

    fn object(tag: &str) -> WorldObject {
        WorldObject::new(ObjectId(1), tag, Vec2::ZERO)
    }

    #[rstest]
    #[case::brick("brick_wall_ext_12", Some(ObstacleFamily::Wall))]
    #[case::interior("bank_wall_int_4", Some(ObstacleFamily::Wall))]
    #[case::glass_before_window("glass_wall_10", Some(ObstacleFamily::GlassWall))]
    #[case::stone("stone_03", Some(ObstacleFamily::Stone))]
    #[case::tree("tree_07sp", Some(ObstacleFamily::Tree))]
    #[case::bush("bush_01", Some(ObstacleFamily::Bush))]
    #[case::window("house_window_01", Some(ObstacleFamily::Window))]
    #[case::decal("decal_blood", Some(ObstacleFamily::Decal))]
    #[case::unknown("mystery_thing", None)]
    fn families_resolve_from_tags(#[case] tag: &str, #[case] expected: Option<ObstacleFamily>) {
        assert_eq!(ObstacleFamily::from_type_tag(tag), expected);
        assert_eq!(ObjectKind::from(tag).family(), expected);
    }

    #[rstest]
    fn non_collidable_wins_over_wall_flag() {
        let mut wall = object("brick_wall_1").wall();
        wall.collidable = false;
        assert_eq!(classify(&wall), ObstacleClass::NonBlocking);
    }

    #[rstest]
    #[case::wall_flag(object("bush_01").wall())]
    #[case::indestructible(object("crate_01").indestructible())]
    #[case::tree(object("tree_01"))]
    #[case::locker(object("locker_02"))]
    #[case::sturdy_unknown(object("vault_door").with_health(500.0))]
    fn blocking_objects(#[case] obj: WorldObject) {
        assert_eq!(classify(&obj), ObstacleClass::Blocking);
    }

    #[rstest]
    #[case::bush(object("bush_01"))]
    #[case::crate_with_lots_of_health(object("crate_01").with_health(900.0))]
    #[case::flimsy_unknown(object("mystery").with_health(200.0))]
    fn non_blocking_objects(#[case] obj: WorldObject) {
        assert_eq!(classify(&obj), ObstacleClass::NonBlocking);
    }

    #[rstest]
    fn unknown_without_health_is_indeterminate() {
        assert_eq!(classify(&object("mystery")), ObstacleClass::Indeterminate);
    }

    #[rstest]
    #[case::crate_("crate_02", true)]
    #[case::locker("locker_01", true)]
    #[case::tree("tree_01", false)]
    #[case::unknown("thing", false)]
    fn loot_detection(#[case] tag: &str, #[case] loot: bool) {
        assert_eq!(ObjectKind::from(tag).is_loot(), loot);
    }

    #[rstest]
    fn kind_round_trips_through_its_tag() {
        let kind: ObjectKind =
            serde_json::from_str("\"tree_02\"").expect("tag deserialises from a string");
        assert_eq!(kind.family(), Some(ObstacleFamily::Tree));
        assert_eq!(
            serde_json::to_string(&kind).expect("tag serialises"),
            "\"tree_02\""
        );
    }
}
