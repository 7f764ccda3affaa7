// Core types shared across the planner.
//
// Defines the voxel-grid coordinate (`VoxelPos`), the horizontal rotation
// group (`Rotation`), material tokens (`Material`), the atomic placeable
// unit (`Bit`), and feature identifiers. All types derive `Serialize` and
// `Deserialize` for snapshots.
//
// **Critical constraint: determinism.** Feature IDs come from the
// settlement's monotonic counter, rotations and material choices from the
// planner's `PlanRng`. No OS entropy, no system time.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A position in the 3D voxel grid. Each component is in voxel units.
///
/// The coordinate system uses right-handed conventions:
/// - X: east  (positive) / west  (negative)
/// - Y: up    (positive) / down  (negative)
/// - Z: south (positive) / north (negative)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// This position shifted `dy` voxels up (negative values shift down).
    pub const fn up(self, dy: i32) -> Self {
        Self::new(self.x, self.y + dy, self.z)
    }

    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Squared distance in the horizontal (xz) plane.
    pub fn planar_dist_sq(self, other: Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dz * dz
    }

    /// Euclidean distance in the horizontal (xz) plane.
    pub fn planar_dist(self, other: Self) -> f64 {
        (self.planar_dist_sq(other) as f64).sqrt()
    }

    /// Angle of `other` as seen from `self` in the horizontal plane,
    /// measured from +X toward +Z, in radians.
    pub fn planar_angle_to(self, other: Self) -> f64 {
        ((other.z - self.z) as f64).atan2((other.x - self.x) as f64)
    }
}

impl fmt::Display for VoxelPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Rotation — the 4-element group acting on the horizontal plane
// ---------------------------------------------------------------------------

/// A quarter-turn rotation about the vertical axis.
///
/// Acts on (x, z) offsets and on directional material tags; y is invariant.
/// `Ccw90` maps (x,z)→(z,−x), `Opp` maps (x,z)→(−x,−z), `Cw90` maps
/// (x,z)→(−z,x).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Ccw90,
    Opp,
    Cw90,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::None, Rotation::Ccw90, Rotation::Opp, Rotation::Cw90];

    /// Draw one of the four rotations uniformly.
    pub fn random(rng: &mut burgwright_prng::PlanRng) -> Self {
        *rng.pick(&Self::ALL)
    }

    /// Apply this rotation to a horizontal offset.
    pub fn apply_xz(self, x: i32, z: i32) -> (i32, i32) {
        match self {
            Rotation::None => (x, z),
            Rotation::Ccw90 => (z, -x),
            Rotation::Opp => (-x, -z),
            Rotation::Cw90 => (-z, x),
        }
    }

    /// Apply this rotation to a position (about the origin; y unchanged).
    pub fn apply(self, pos: VoxelPos) -> VoxelPos {
        let (x, z) = self.apply_xz(pos.x, pos.z);
        VoxelPos::new(x, pos.y, z)
    }

    /// The rotation that undoes this one. `Opp` is self-inverse; the two
    /// quarter turns are mutual inverses.
    pub fn inverse(self) -> Self {
        match self {
            Rotation::None => Rotation::None,
            Rotation::Ccw90 => Rotation::Cw90,
            Rotation::Opp => Rotation::Opp,
            Rotation::Cw90 => Rotation::Ccw90,
        }
    }
}

/// Horizontal facing carried by directional materials (stairs, doors).
/// Rotated together with the positions of a feature's bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Facing {
    North,
    East,
    South,
    West,
}

impl Facing {
    /// One quarter turn counter-clockwise (viewed from above).
    fn ccw(self) -> Self {
        match self {
            Facing::North => Facing::West,
            Facing::West => Facing::South,
            Facing::South => Facing::East,
            Facing::East => Facing::North,
        }
    }

    /// Apply a `Rotation` to this facing.
    pub fn rotated(self, rotation: Rotation) -> Self {
        match rotation {
            Rotation::None => self,
            Rotation::Ccw90 => self.ccw(),
            Rotation::Opp => self.ccw().ccw(),
            Rotation::Cw90 => self.ccw().ccw().ccw(),
        }
    }
}

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

/// Broad material category. Collision rules treat same-class materials at
/// the same position as compatible (an access path may end flush against a
/// wall of the same class).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MaterialClass {
    Soil,
    Stone,
    Wood,
    Plant,
    Metal,
    Glass,
    Cloth,
    Fluid,
    Other,
}

/// An opaque block token from the external world, plus the planning-relevant
/// attributes: its broad class and an optional directional tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    /// Palette index owned by the host world / template data.
    pub block: u16,
    pub class: MaterialClass,
    /// Directional tag, rotated with the feature (stairs, doors).
    pub facing: Option<Facing>,
}

impl Material {
    pub const fn new(block: u16, class: MaterialClass) -> Self {
        Self {
            block,
            class,
            facing: None,
        }
    }

    pub const fn facing(block: u16, class: MaterialClass, facing: Facing) -> Self {
        Self {
            block,
            class,
            facing: Some(facing),
        }
    }

    /// This material with its directional tag rotated.
    pub fn rotated(self, rotation: Rotation) -> Self {
        Self {
            facing: self.facing.map(|f| f.rotated(rotation)),
            ..self
        }
    }
}

/// The atomic placeable unit: a voxel override belonging to a feature.
///
/// `material == None` means the position is claimed by the feature (it
/// participates in collision) but the world voxel is left untouched.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bit {
    pub pos: VoxelPos,
    pub material: Option<Material>,
}

impl Bit {
    pub const fn new(pos: VoxelPos, material: Option<Material>) -> Self {
        Self { pos, material }
    }
}

// ---------------------------------------------------------------------------
// Feature identity
// ---------------------------------------------------------------------------

/// Identifier for a placed feature (junction, edge, access path, structure).
///
/// Allocated from the settlement's monotonic `next_id` counter, so ids are
/// dense, ordered by creation, and reproducible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub u64);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeatureId({})", self.0)
    }
}

/// Coarse terrain classification at a sampled column, used to pick between
/// the dry and fluid column-template tables. Top and bottom contexts are
/// classified independently (a jetty has a dry top over a fluid bottom).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TerrainKind {
    Dry,
    Fluid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_formulas() {
        // CCW90: (x,z) -> (z,-x); OPP: (-x,-z); CW90: (-z,x).
        assert_eq!(Rotation::Ccw90.apply_xz(3, 5), (5, -3));
        assert_eq!(Rotation::Opp.apply_xz(3, 5), (-3, -5));
        assert_eq!(Rotation::Cw90.apply_xz(3, 5), (-5, 3));
        assert_eq!(Rotation::None.apply_xz(3, 5), (3, 5));
    }

    #[test]
    fn rotation_is_a_group_action() {
        let pos = VoxelPos::new(7, 2, -4);
        for r in Rotation::ALL {
            let back = r.inverse().apply(r.apply(pos));
            assert_eq!(back, pos, "rotation {r:?} then inverse must restore");
        }
        // OPP is self-inverse.
        assert_eq!(Rotation::Opp.inverse(), Rotation::Opp);
        // The quarter turns are mutual inverses.
        assert_eq!(Rotation::Ccw90.inverse(), Rotation::Cw90);
        assert_eq!(Rotation::Cw90.inverse(), Rotation::Ccw90);
    }

    #[test]
    fn rotation_preserves_y() {
        let pos = VoxelPos::new(1, 9, 2);
        for r in Rotation::ALL {
            assert_eq!(r.apply(pos).y, 9);
        }
    }

    #[test]
    fn facing_rotates_with_rotation() {
        let m = Material::facing(4, MaterialClass::Wood, Facing::North);
        assert_eq!(m.rotated(Rotation::Ccw90).facing, Some(Facing::West));
        assert_eq!(m.rotated(Rotation::Opp).facing, Some(Facing::South));
        assert_eq!(m.rotated(Rotation::Cw90).facing, Some(Facing::East));
        // Non-directional materials are unchanged.
        let plain = Material::new(4, MaterialClass::Wood);
        assert_eq!(plain.rotated(Rotation::Cw90), plain);
    }

    #[test]
    fn facing_rotation_composes_like_position_rotation() {
        // Four CCW quarter turns return to the start.
        let mut f = Facing::East;
        for _ in 0..4 {
            f = f.rotated(Rotation::Ccw90);
        }
        assert_eq!(f, Facing::East);
    }

    #[test]
    fn planar_distance() {
        let a = VoxelPos::new(0, 3, 0);
        let b = VoxelPos::new(3, -7, 4);
        assert_eq!(a.planar_dist_sq(b), 25);
        assert!((a.planar_dist(b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn voxel_pos_ordering() {
        // VoxelPos has a total order (needed for BTreeMap/BTreeSet keys).
        let a = VoxelPos::new(0, 0, 0);
        let b = VoxelPos::new(1, 0, 0);
        assert!(a < b);
    }

    #[test]
    fn bit_serialization_roundtrip() {
        let bit = Bit::new(
            VoxelPos::new(1, 2, 3),
            Some(Material::facing(9, MaterialClass::Stone, Facing::South)),
        );
        let json = serde_json::to_string(&bit).unwrap();
        let restored: Bit = serde_json::from_str(&json).unwrap();
        assert_eq!(bit, restored);
    }
}
