// Spatial features — placed bit sets with derived collision indexes.
//
// A `SpatialFeature` owns an ordered list of bits (voxel overrides) plus
// three layers of derived lookup data: an axis-aligned bound for O(1)
// rejection, coarse and fine cubic bucket key sets for O(buckets)
// approximate overlap tests, and an exact position→material map for bit
// level checks. Every mutation (`set_bits`, `add_bits`, `remove_bits`)
// recomputes all derived data, so bound and buckets are never stale.
//
// Only the id, the bit list, and the bucket edge lengths serialize; the
// derived fields are `#[serde(skip)]` and rebuilt after deserialization by
// `rebuild_transient()` (see `planner.rs::rebuild_transient_state`).
//
// See also: `collision.rs` for the pairwise predicates layered on these
// queries, `road.rs` and `structure.rs` for the feature kinds that embed
// this struct.

use crate::types::{Bit, FeatureId, Material, Rotation, VoxelPos};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box, inclusive on both corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bound {
    pub min: VoxelPos,
    pub max: VoxelPos,
}

impl Bound {
    /// O(1) interval-overlap test on all three axes.
    pub fn overlaps(self, other: Bound) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
            && self.min.z <= other.max.z
            && other.min.z <= self.max.z
    }
}

/// Key of a cubic spatial-index cell.
pub type BucketKey = (i32, i32, i32);

fn bucket_key(pos: VoxelPos, edge: i32) -> BucketKey {
    (
        pos.x.div_euclid(edge),
        pos.y.div_euclid(edge),
        pos.z.div_euclid(edge),
    )
}

fn sets_intersect(a: &FxHashSet<BucketKey>, b: &FxHashSet<BucketKey>) -> bool {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().any(|k| large.contains(k))
}

/// A placed feature's bit set with derived bound and bucket indexes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpatialFeature {
    pub id: FeatureId,
    bits: Vec<Bit>,
    /// Edge length of the coarse (mega-chunk) index cells.
    coarse_edge: i32,
    /// Edge length of the fine index cells.
    fine_edge: i32,

    #[serde(skip)]
    bound: Option<Bound>,
    #[serde(skip)]
    by_pos: FxHashMap<VoxelPos, Option<Material>>,
    #[serde(skip)]
    coarse_buckets: FxHashSet<BucketKey>,
    #[serde(skip)]
    fine_buckets: FxHashSet<BucketKey>,
}

impl SpatialFeature {
    pub fn new(id: FeatureId, coarse_edge: i32, fine_edge: i32) -> Self {
        assert!(
            coarse_edge > 0 && fine_edge > 0,
            "bucket edges must be positive"
        );
        Self {
            id,
            bits: Vec::new(),
            coarse_edge,
            fine_edge,
            bound: None,
            by_pos: FxHashMap::default(),
            coarse_buckets: FxHashSet::default(),
            fine_buckets: FxHashSet::default(),
        }
    }

    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bound(&self) -> Option<Bound> {
        self.bound
    }

    /// Replace all bits by re-anchoring and rotating a relative bit set.
    /// Both positions and directional material tags rotate.
    pub fn set_bits(&mut self, relative: &[Bit], anchor: VoxelPos, rotation: Rotation) {
        self.bits = relative
            .iter()
            .map(|bit| {
                let rotated = rotation.apply(bit.pos);
                Bit::new(
                    anchor.offset(rotated.x, rotated.y, rotated.z),
                    bit.material.map(|m| m.rotated(rotation)),
                )
            })
            .collect();
        self.recompute();
    }

    /// Append absolute bits.
    pub fn add_bits(&mut self, bits: impl IntoIterator<Item = Bit>) {
        self.bits.extend(bits);
        self.recompute();
    }

    /// Remove every bit at one of the given positions.
    pub fn remove_bits(&mut self, positions: &[VoxelPos]) {
        let doomed: FxHashSet<VoxelPos> = positions.iter().copied().collect();
        self.bits.retain(|bit| !doomed.contains(&bit.pos));
        self.recompute();
    }

    /// Recompute bound, position map, and both bucket key sets from the
    /// current bit list. Called after every mutation.
    fn recompute(&mut self) {
        self.bound = None;
        self.by_pos.clear();
        self.coarse_buckets.clear();
        self.fine_buckets.clear();

        for bit in &self.bits {
            let p = bit.pos;
            self.bound = Some(match self.bound {
                None => Bound { min: p, max: p },
                Some(b) => Bound {
                    min: VoxelPos::new(b.min.x.min(p.x), b.min.y.min(p.y), b.min.z.min(p.z)),
                    max: VoxelPos::new(b.max.x.max(p.x), b.max.y.max(p.y), b.max.z.max(p.z)),
                },
            });
            // Duplicate planar positions resolve last-write-wins, matching
            // the column emission order in road construction.
            self.by_pos.insert(p, bit.material);
            self.coarse_buckets.insert(bucket_key(p, self.coarse_edge));
            self.fine_buckets.insert(bucket_key(p, self.fine_edge));
        }
    }

    /// Rebuild derived fields after deserialization.
    pub fn rebuild_transient(&mut self) {
        self.recompute();
    }

    /// O(1) bound rejection — the cheap pre-filter before any bit check.
    pub fn bounds_overlap(&self, other: &SpatialFeature) -> bool {
        match (self.bound, other.bound) {
            (Some(a), Some(b)) => a.overlaps(b),
            _ => false,
        }
    }

    /// Approximate overlap: true only when a coarse bucket key is shared
    /// AND a fine bucket key is shared. Both levels must agree — the AND
    /// makes containment tests at junction scale behave correctly, not
    /// just faster.
    pub fn bucket_overlap(&self, other: &SpatialFeature) -> bool {
        sets_intersect(&self.coarse_buckets, &other.coarse_buckets)
            && sets_intersect(&self.fine_buckets, &other.fine_buckets)
    }

    /// Exact overlap: true when any bit position is shared.
    pub fn bit_overlap(&self, other: &SpatialFeature) -> bool {
        let (small, large) = if self.by_pos.len() <= other.by_pos.len() {
            (&self.by_pos, &other.by_pos)
        } else {
            (&other.by_pos, &self.by_pos)
        };
        small.keys().any(|pos| large.contains_key(pos))
    }

    pub fn contains_position(&self, pos: VoxelPos) -> bool {
        self.by_pos.contains_key(&pos)
    }

    /// The material stored at `pos`: `None` if the feature has no bit
    /// there, `Some(None)` for a claimed-but-untouched bit.
    pub fn material_at(&self, pos: VoxelPos) -> Option<Option<Material>> {
        self.by_pos.get(&pos).copied()
    }

    /// Iterate the distinct positions this feature claims.
    pub fn positions(&self) -> impl Iterator<Item = VoxelPos> + '_ {
        self.by_pos.keys().copied()
    }

    pub fn coarse_bucket_count(&self) -> usize {
        self.coarse_buckets.len()
    }

    #[cfg(test)]
    fn has_bucket_keys_for(&self, pos: VoxelPos) -> bool {
        self.coarse_buckets.contains(&bucket_key(pos, self.coarse_edge))
            && self.fine_buckets.contains(&bucket_key(pos, self.fine_edge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Facing, MaterialClass};

    const COARSE: i32 = 16;
    const FINE: i32 = 4;

    fn stone() -> Material {
        Material::new(1, MaterialClass::Stone)
    }

    fn feature(id: u64, positions: &[(i32, i32, i32)]) -> SpatialFeature {
        let mut f = SpatialFeature::new(FeatureId(id), COARSE, FINE);
        f.add_bits(
            positions
                .iter()
                .map(|&(x, y, z)| Bit::new(VoxelPos::new(x, y, z), Some(stone()))),
        );
        f
    }

    fn assert_consistent(f: &SpatialFeature) {
        match f.bound() {
            None => assert!(f.bits().is_empty()),
            Some(b) => {
                let min_x = f.bits().iter().map(|bit| bit.pos.x).min().unwrap();
                let max_x = f.bits().iter().map(|bit| bit.pos.x).max().unwrap();
                let min_y = f.bits().iter().map(|bit| bit.pos.y).min().unwrap();
                let max_y = f.bits().iter().map(|bit| bit.pos.y).max().unwrap();
                let min_z = f.bits().iter().map(|bit| bit.pos.z).min().unwrap();
                let max_z = f.bits().iter().map(|bit| bit.pos.z).max().unwrap();
                assert_eq!(b.min, VoxelPos::new(min_x, min_y, min_z));
                assert_eq!(b.max, VoxelPos::new(max_x, max_y, max_z));
            }
        }
        for bit in f.bits() {
            assert!(f.has_bucket_keys_for(bit.pos));
            assert!(f.contains_position(bit.pos));
        }
    }

    #[test]
    fn bound_and_index_track_mutations() {
        let mut f = feature(1, &[(0, 0, 0), (5, 2, -3)]);
        assert_consistent(&f);

        f.add_bits([Bit::new(VoxelPos::new(30, -8, 12), Some(stone()))]);
        assert_consistent(&f);
        assert_eq!(f.bound().unwrap().max, VoxelPos::new(30, 2, 12));
        assert_eq!(f.bound().unwrap().min, VoxelPos::new(0, -8, -3));

        f.remove_bits(&[VoxelPos::new(30, -8, 12)]);
        assert_consistent(&f);
        assert_eq!(f.bound().unwrap().max, VoxelPos::new(5, 2, 0));

        f.set_bits(
            &[Bit::new(VoxelPos::new(1, 0, 0), Some(stone()))],
            VoxelPos::new(100, 50, 100),
            Rotation::None,
        );
        assert_consistent(&f);
        assert_eq!(f.bits().len(), 1);
        assert_eq!(f.bits()[0].pos, VoxelPos::new(101, 50, 100));
    }

    #[test]
    fn set_bits_rotates_positions_and_facings() {
        let mut f = SpatialFeature::new(FeatureId(1), COARSE, FINE);
        let stairs = Material::facing(3, MaterialClass::Stone, Facing::North);
        f.set_bits(
            &[Bit::new(VoxelPos::new(2, 1, 0), Some(stairs))],
            VoxelPos::new(10, 0, 10),
            Rotation::Ccw90,
        );
        // (2,0) rotates CCW to (0,-2); y carried through.
        assert_eq!(f.bits()[0].pos, VoxelPos::new(10, 1, 8));
        assert_eq!(f.bits()[0].material.unwrap().facing, Some(Facing::West));
    }

    #[test]
    fn set_bits_roundtrip_through_inverse_rotation() {
        let relative: Vec<Bit> = [(1, 0, 2), (-3, 1, 0), (4, -1, -4)]
            .iter()
            .map(|&(x, y, z)| Bit::new(VoxelPos::new(x, y, z), Some(stone())))
            .collect();
        for r in Rotation::ALL {
            let mut f = SpatialFeature::new(FeatureId(1), COARSE, FINE);
            f.set_bits(&relative, VoxelPos::new(0, 0, 0), r);
            let rotated = f.bits().to_vec();
            let mut back = SpatialFeature::new(FeatureId(2), COARSE, FINE);
            back.set_bits(&rotated, VoxelPos::new(0, 0, 0), r.inverse());
            let mut original: Vec<VoxelPos> = relative.iter().map(|b| b.pos).collect();
            let mut restored: Vec<VoxelPos> = back.bits().iter().map(|b| b.pos).collect();
            original.sort_unstable();
            restored.sort_unstable();
            assert_eq!(original, restored, "rotation {r:?} must invert cleanly");
        }
    }

    #[test]
    fn bounds_overlap_is_an_interval_test() {
        let a = feature(1, &[(0, 0, 0), (10, 10, 10)]);
        let b = feature(2, &[(10, 10, 10), (20, 20, 20)]);
        let c = feature(3, &[(11, 0, 0), (20, 10, 10)]);
        assert!(a.bounds_overlap(&b));
        assert!(b.bounds_overlap(&a));
        assert!(!a.bounds_overlap(&c));
    }

    #[test]
    fn empty_feature_never_overlaps() {
        let empty = SpatialFeature::new(FeatureId(1), COARSE, FINE);
        let full = feature(2, &[(0, 0, 0)]);
        assert!(!empty.bounds_overlap(&full));
        assert!(!full.bounds_overlap(&empty));
        assert!(!empty.bucket_overlap(&full));
        assert!(!empty.bit_overlap(&full));
    }

    #[test]
    fn bucket_overlap_requires_both_levels() {
        // Same coarse bucket (0..16) but different fine buckets (0..4 vs 8..12).
        let a = feature(1, &[(0, 0, 0)]);
        let b = feature(2, &[(9, 0, 0)]);
        assert!(!a.bucket_overlap(&b));

        // Same coarse and same fine bucket, without sharing a position.
        let c = feature(3, &[(1, 0, 0)]);
        assert!(a.bucket_overlap(&c));
        assert!(!a.bit_overlap(&c));
    }

    #[test]
    fn bit_overlap_is_exact() {
        let a = feature(1, &[(0, 0, 0), (1, 0, 0)]);
        let b = feature(2, &[(1, 0, 0)]);
        let c = feature(3, &[(2, 0, 0)]);
        assert!(a.bit_overlap(&b));
        assert!(b.bit_overlap(&a));
        assert!(!a.bit_overlap(&c));
    }

    #[test]
    fn negative_coordinates_bucket_correctly() {
        // (-1,0,0) and (1,0,0) are in different coarse buckets under
        // euclidean division; a naive `/` would collapse both into 0.
        let a = feature(1, &[(-1, 0, 0)]);
        let b = feature(2, &[(1, 0, 0)]);
        assert!(!a.bucket_overlap(&b));
    }

    #[test]
    fn remove_bits_drops_all_matching_positions() {
        let mut f = feature(1, &[(0, 0, 0), (1, 0, 0), (2, 0, 0)]);
        f.remove_bits(&[VoxelPos::new(0, 0, 0), VoxelPos::new(2, 0, 0)]);
        assert_eq!(f.bits().len(), 1);
        assert_consistent(&f);
    }

    #[test]
    fn serialization_rebuild_restores_indexes() {
        let f = feature(1, &[(3, 4, 5), (19, -2, 7)]);
        let json = serde_json::to_string(&f).unwrap();
        let mut restored: SpatialFeature = serde_json::from_str(&json).unwrap();
        // Derived fields are skipped in serde; rebuild them.
        restored.rebuild_transient();
        assert_consistent(&restored);
        assert_eq!(restored.bound(), f.bound());
        assert!(restored.bit_overlap(&f));
    }
}
