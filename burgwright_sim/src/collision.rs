// Pairwise collision predicates between placed features.
//
// Layered from cheap to exact: every predicate starts with the O(1) bound
// rejection; `overlaps` then either consults the two-level bucket index
// (coarse mode, used for most placement-feasibility checks) or the exact
// bit positions (used where false positives are unacceptable). The splice
// predicate is the one place collision checking produces more than a
// boolean: coincident compatible bits are returned as a prune list for the
// caller to delete from the path after the whole placement validates.
//
// All predicates are pure, total, and symmetric in their feature
// arguments.

use crate::feature::SpatialFeature;
use crate::road::RoadEdge;
use crate::types::VoxelPos;

/// Bound check, then bucket (coarse) or exact bit overlap.
pub fn overlaps(a: &SpatialFeature, b: &SpatialFeature, coarse: bool) -> bool {
    if !a.bounds_overlap(b) {
        return false;
    }
    if coarse {
        a.bucket_overlap(b)
    } else {
        a.bit_overlap(b)
    }
}

/// Exact check that only counts a shared position as a collision when both
/// sides carry a material there and the materials differ by class. Lets an
/// access path terminate flush against a structure wall of the same class.
pub fn overlaps_ignoring_matching_material(a: &SpatialFeature, b: &SpatialFeature) -> bool {
    if !a.bounds_overlap(b) {
        return false;
    }
    let (small, large) = smaller_first(a, b);
    small.positions().any(|pos| {
        let Some(mb) = large.material_at(pos) else {
            return false;
        };
        let ma = small
            .material_at(pos)
            .expect("position iterated from the feature itself");
        matches!((ma, mb), (Some(x), Some(y)) if x.class != y.class)
    })
}

/// Exact bit overlap between two edges, ignoring shared positions within
/// their shared junction's same-height radius — adjoining edges
/// legitimately share blocks near a junction.
pub fn edges_overlap(e1: &RoadEdge, e2: &RoadEdge) -> bool {
    if !e1.feature.bounds_overlap(&e2.feature) {
        return false;
    }
    match e1.shared_junction(e2) {
        None => e1.feature.bit_overlap(&e2.feature),
        Some(shared) => {
            let exempt = shared.same_height_radius as f64;
            let (small, large) = smaller_first(&e1.feature, &e2.feature);
            small.positions().any(|pos| {
                large.contains_position(pos) && pos.planar_dist(shared.center) > exempt
            })
        }
    }
}

/// Verdict of an access-path splice check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpliceCheck {
    /// A shared position where exactly one side is empty: hard collision,
    /// the path is aborted.
    Collision,
    /// All shared positions were both-empty or both-non-empty; these
    /// path positions merge gracefully and should be deleted from the
    /// path once the whole placement succeeds.
    Merge(Vec<VoxelPos>),
}

/// Check a trial access path against an existing feature. Coincident bits
/// that are both empty or both non-empty merge (the path yields);
/// coincidences where exactly one side is empty are collisions.
pub fn access_path_splices(path: &SpatialFeature, other: &SpatialFeature) -> SpliceCheck {
    if !path.bounds_overlap(other) {
        return SpliceCheck::Merge(Vec::new());
    }
    let mut prune = Vec::new();
    for pos in path.positions() {
        let Some(other_mat) = other.material_at(pos) else {
            continue;
        };
        let path_mat = path
            .material_at(pos)
            .expect("position iterated from the path itself");
        if path_mat.is_some() == other_mat.is_some() {
            prune.push(pos);
        } else {
            return SpliceCheck::Collision;
        }
    }
    // Position iteration order is hash-map order; sort so callers see a
    // stable prune list.
    prune.sort_unstable();
    SpliceCheck::Merge(prune)
}

fn smaller_first<'a>(
    a: &'a SpatialFeature,
    b: &'a SpatialFeature,
) -> (&'a SpatialFeature, &'a SpatialFeature) {
    if a.bits().len() <= b.bits().len() {
        (a, b)
    } else {
        (b, a)
    }
}
