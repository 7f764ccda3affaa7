// Road network features — junctions and curved edges.
//
// A junction is an annular plaza stamped from per-band column templates;
// an edge walks a polynomial curve between two junctions and stamps merged
// top/bottom columns across its radius at every step. Both record road
// metadata (sidewalk and arch positions, pillar-seed bits) that adjoining
// features use to merge boundaries: an edge may only scar into a junction
// along recorded arch or sidewalk openings, unless it is an access path
// explicitly overriding junctions.
//
// Edge construction details that matter for correctness:
// - columns queue per category (outer/inner × special/normal), deduplicated
//   by (x, z) anchor with last-write-wins inside a category;
// - final emission order is outer-special, inner-special, outer-normal,
//   inner-normal, and later writes win at shared voxels;
// - radial anchors are projected onto the curve normal via
//   `1/sqrt(1 + slope²)`;
// - road dots are emitted along the centerline as access-path anchors;
// - spiral loops absorb whole height quanta at the curve midpoint.
//
// **Critical constraint: determinism.** All draws (curve degree and
// coefficients, spiral side, special variants) sample the caller's
// `PlanRng`; bit emission iterates ordered maps.

use crate::column::{BlockColumn, ColumnTag};
use crate::config::PlannerConfig;
use crate::curve::{CurveSpec, SpiralSide, SpiralSpec, TerrainProfile};
use crate::feature::SpatialFeature;
use crate::templates::{RoadType, Side};
use crate::types::{Bit, FeatureId, Material, Rotation, TerrainKind, VoxelPos};
use crate::world::World;
use burgwright_prng::PlanRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Road metadata
// ---------------------------------------------------------------------------

/// Sidewalk/arch positions and pillar-seed bits recorded while stamping a
/// road feature. Ordered sets so snapshots serialize stably.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoadMetadata {
    pub sidewalk: BTreeSet<VoxelPos>,
    pub arch: BTreeSet<VoxelPos>,
    pub pillar_seeds: Vec<Bit>,
}

impl RoadMetadata {
    fn record(&mut self, pos: VoxelPos, material: Option<Material>, tag: ColumnTag) {
        match tag {
            ColumnTag::Normal => {}
            ColumnTag::Sidewalk => {
                self.sidewalk.insert(pos);
            }
            ColumnTag::Arch => {
                self.arch.insert(pos);
            }
            ColumnTag::PillarSeed => {
                self.pillar_seeds.push(Bit::new(pos, material));
            }
        }
    }

    /// Drop all metadata at the given positions. Called whenever bits are
    /// removed from a road feature.
    pub fn prune(&mut self, positions: &[VoxelPos]) {
        for pos in positions {
            self.sidewalk.remove(pos);
            self.arch.remove(pos);
        }
        self.pillar_seeds
            .retain(|bit| !positions.contains(&bit.pos));
    }

    /// Whether an edge may cross a junction boundary at this position.
    pub fn permits_opening(&self, pos: VoxelPos) -> bool {
        self.sidewalk.contains(&pos) || self.arch.contains(&pos)
    }
}

// ---------------------------------------------------------------------------
// Orientation buckets
// ---------------------------------------------------------------------------

/// Classify a planar offset into a rotation bucket. Axis-dominant offsets
/// (one component at least twice the other) take that axis's rotation;
/// diagonal offsets resolve to the larger component's axis.
pub(crate) fn orientation_for_vector(dx: f64, dz: f64) -> Rotation {
    let ax = dx.abs();
    let az = dz.abs();
    let x_axis = if ax >= 2.0 * az {
        true
    } else if az >= 2.0 * ax {
        false
    } else {
        // Diagonal sector: coarser rule by dominant component.
        ax >= az
    };
    if x_axis {
        if dx >= 0.0 { Rotation::None } else { Rotation::Opp }
    } else if dz >= 0.0 {
        Rotation::Cw90
    } else {
        Rotation::Ccw90
    }
}

pub(crate) fn orientation_for_offset(dx: i32, dz: i32) -> Rotation {
    orientation_for_vector(dx as f64, dz as f64)
}

// ---------------------------------------------------------------------------
// Junction
// ---------------------------------------------------------------------------

/// A road-network node: an annular plaza with recorded openings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Junction {
    pub feature: SpatialFeature,
    pub center: VoxelPos,
    pub radius: i32,
    /// Inner radius within which adjoining edges apply no vertical terrain
    /// adjustment.
    pub same_height_radius: i32,
    pub top_terrain: TerrainKind,
    pub bottom_terrain: TerrainKind,
    pub road_type: String,
    pub meta: RoadMetadata,
}

impl Junction {
    /// Stamp a junction at `center` (a surface position).
    pub fn build(
        id: FeatureId,
        center: VoxelPos,
        road_type: &RoadType,
        world: &dyn World,
        rng: &mut PlanRng,
        config: &PlannerConfig,
    ) -> Junction {
        let top_terrain = classify(world, center, Side::Top);
        let bottom_terrain = classify(world, center, Side::Bottom);

        let mut feature = SpatialFeature::new(id, config.coarse_bucket_edge, config.fine_bucket_edge);
        let mut meta = RoadMetadata::default();
        let mut bits = Vec::new();

        let r = road_type.junction_radius;
        for dx in -r..=r {
            for dz in -r..=r {
                let dist_sq = (dx as i64) * (dx as i64) + (dz as i64) * (dz as i64);
                if dist_sq > (r as i64) * (r as i64) {
                    continue;
                }
                let Some(band) = road_type.band_for(dist_sq) else {
                    continue;
                };
                let top = road_type.normal_column(Side::Top, top_terrain, band);
                let bottom = road_type.normal_column(Side::Bottom, bottom_terrain, band);
                let mut column = BlockColumn::merge(top, bottom);
                if road_type.special_permitted(band) && rng.chance(road_type.special_chance) {
                    if let Some(special) = road_type.draw_special(rng) {
                        let overlay = BlockColumn::merge(&special.top, &special.bottom);
                        column = BlockColumn::merge(&overlay, &column);
                    }
                }
                let column = column.rotated(orientation_for_offset(dx, dz));
                let anchor = center.offset(dx, 0, dz);
                for (bit, tag) in column.bits_at(anchor) {
                    meta.record(bit.pos, bit.material, tag);
                    bits.push(bit);
                }
            }
        }

        feature.add_bits(bits);
        Junction {
            feature,
            center,
            radius: r,
            same_height_radius: road_type.same_height_radius,
            top_terrain,
            bottom_terrain,
            road_type: road_type.name.clone(),
            meta,
        }
    }

    /// Remove bits and prune any metadata at the same positions.
    pub fn remove_bits(&mut self, positions: &[VoxelPos]) {
        self.feature.remove_bits(positions);
        self.meta.prune(positions);
    }

    pub fn id(&self) -> FeatureId {
        self.feature.id
    }
}

fn classify(world: &dyn World, anchor: VoxelPos, side: Side) -> TerrainKind {
    let probe = match side {
        Side::Top => anchor.up(1),
        Side::Bottom => anchor.up(-1),
    };
    if world.is_fluid(probe) {
        TerrainKind::Fluid
    } else {
        TerrainKind::Dry
    }
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// The geometric facts edge construction needs about one endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub center: VoxelPos,
    pub radius: i32,
    pub same_height_radius: i32,
}

/// Whether an edge connects network junctions (by id) or embeds private
/// endpoint copies (access paths).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeEndpoints {
    Network { from: FeatureId, to: FeatureId },
    Access,
}

/// A borrowed endpoint view used during construction.
#[derive(Clone, Copy)]
pub struct EdgeEndpoint<'a> {
    pub id: Option<FeatureId>,
    pub info: EndpointInfo,
    pub meta: Option<&'a RoadMetadata>,
}

impl<'a> EdgeEndpoint<'a> {
    pub fn of_junction(junction: &'a Junction) -> Self {
        Self {
            id: Some(junction.id()),
            info: EndpointInfo {
                center: junction.center,
                radius: junction.radius,
                same_height_radius: junction.same_height_radius,
            },
            meta: Some(&junction.meta),
        }
    }

    /// A private endpoint copy for an access path (a structure access point
    /// or a road dot).
    pub fn access(center: VoxelPos, radius: i32) -> Self {
        Self {
            id: None,
            info: EndpointInfo {
                center,
                radius,
                same_height_radius: radius,
            },
            meta: None,
        }
    }
}

/// A curved road connector between two endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoadEdge {
    pub feature: SpatialFeature,
    pub endpoints: EdgeEndpoints,
    pub from_info: EndpointInfo,
    pub to_info: EndpointInfo,
    pub radius: i32,
    pub curve: CurveSpec,
    /// Vertical slope of the linear base line (spiral-consumed height
    /// excluded).
    pub slope: f64,
    pub spiral: Option<SpiralSpec>,
    /// Sparse centerline samples used as access-path anchors.
    pub road_dots: Vec<VoxelPos>,
    pub road_type: String,
    pub meta: RoadMetadata,
}

impl RoadEdge {
    pub fn id(&self) -> FeatureId {
        self.feature.id
    }

    pub fn is_access(&self) -> bool {
        matches!(self.endpoints, EdgeEndpoints::Access)
    }

    /// The shared network junction between two edges, with its geometry,
    /// if there is one.
    pub fn shared_junction(&self, other: &RoadEdge) -> Option<EndpointInfo> {
        let (EdgeEndpoints::Network { from: f1, to: t1 }, EdgeEndpoints::Network { from: f2, to: t2 }) =
            (self.endpoints, other.endpoints)
        else {
            return None;
        };
        for (id, info) in [(f1, self.from_info), (t1, self.to_info)] {
            if id == f2 || id == t2 {
                return Some(info);
            }
        }
        None
    }

    /// Remove bits and prune any metadata at the same positions.
    pub fn remove_bits(&mut self, positions: &[VoxelPos]) {
        self.feature.remove_bits(positions);
        self.meta.prune(positions);
    }
}

/// Everything needed to synthesize one edge.
pub struct EdgeSpec<'a> {
    pub id: FeatureId,
    pub from: EdgeEndpoint<'a>,
    pub to: EdgeEndpoint<'a>,
    pub radius: i32,
    /// Access paths may write inside junction radii and never spiral.
    pub is_access: bool,
    /// Access paths stamp this single column instead of the road tier's
    /// band tables.
    pub fixed_column: Option<&'a BlockColumn>,
}

/// Category queues for column dedup, in emission order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Category {
    OuterSpecial,
    InnerSpecial,
    OuterNormal,
    InnerNormal,
}

struct QueuedColumn {
    anchor: VoxelPos,
    column: BlockColumn,
}

/// Build an edge between two endpoints, stamping columns along the curve.
pub fn build_edge(
    spec: EdgeSpec<'_>,
    road_type: &RoadType,
    world: &dyn World,
    rng: &mut PlanRng,
    config: &PlannerConfig,
) -> RoadEdge {
    let from = spec.from.info;
    let to = spec.to.info;
    let d = from.center.planar_dist(to.center);
    assert!(d > 0.0, "zero-length edge");

    let dh = (to.center.y - from.center.y) as f64;
    let spiral = if spec.is_access {
        None
    } else {
        SpiralSpec::for_height_diff(dh, road_type.height_quantum as f64, rng)
    };
    let consumed = spiral
        .map(|s| s.consumed_height(dh, road_type.height_quantum as f64))
        .unwrap_or(0.0);
    let slope = (dh - consumed) / d;

    let curve = if spiral.is_some() {
        CurveSpec::straight(d)
    } else if spec.is_access {
        CurveSpec::random_quadratic(rng, d, config.access_curve_max_offset_frac)
    } else {
        CurveSpec::random(rng, d, config.curve_max_offset_frac)
    };

    let profile = TerrainProfile::sample(
        world,
        from.center,
        to.center,
        slope,
        from.same_height_radius,
        to.same_height_radius,
        &config.smoothing,
        config.surface_mode,
    );

    let ux = (to.center.x - from.center.x) as f64 / d;
    let uz = (to.center.z - from.center.z) as f64 / d;
    // Perpendicular, to the left of the direction of travel.
    let (px, pz) = (-uz, ux);

    let mut queues: BTreeMap<Category, BTreeMap<(i32, i32), QueuedColumn>> = BTreeMap::new();
    let mut road_dots = Vec::new();

    let mut top_terrain = classify(world, from.center, Side::Top);
    let mut bottom_terrain = classify(world, from.center, Side::Bottom);
    let mut next_dot_a = 0.0;
    let mut next_terrain_a = 0.0;
    let mut next_special_a = 0.0;

    let mut a = 0.0;
    while a <= d {
        let lateral = curve.offset(a);
        let curve_slope = curve.slope(a);
        let normal_correction = 1.0 / (1.0 + curve_slope * curve_slope).sqrt();

        let mut y = from.center.y as f64 + slope * a + profile.offset_at(a);
        if spiral.is_some() && a > d / 2.0 {
            y += consumed;
        }

        let center_voxel = VoxelPos::new(
            (from.center.x as f64 + ux * a + px * lateral).round() as i32,
            y.round() as i32,
            (from.center.z as f64 + uz * a + pz * lateral).round() as i32,
        );

        if a >= next_dot_a {
            road_dots.push(center_voxel);
            next_dot_a += config.road_dot_spacing;
        }

        let outside_junctions = center_voxel.planar_dist(from.center) > from.radius as f64
            && center_voxel.planar_dist(to.center) > to.radius as f64;
        if a >= next_terrain_a {
            if outside_junctions {
                top_terrain = classify(world, center_voxel, Side::Top);
                bottom_terrain = classify(world, center_voxel, Side::Bottom);
            }
            next_terrain_a += config.terrain_check_interval;
        }
        let special_station = a >= next_special_a;
        if special_station {
            next_special_a += config.special_column_interval;
        }

        let special = if special_station && !spec.is_access && rng.chance(road_type.special_chance)
        {
            road_type.draw_special(rng)
        } else {
            None
        };

        for rad in 0..=spec.radius {
            let signs: &[f64] = if rad == 0 { &[1.0] } else { &[1.0, -1.0] };
            for &sign in signs {
                let offset_perp = lateral + sign * rad as f64 * normal_correction;
                let anchor = VoxelPos::new(
                    (from.center.x as f64 + ux * a + px * offset_perp).round() as i32,
                    y.round() as i32,
                    (from.center.z as f64 + uz * a + pz * offset_perp).round() as i32,
                );
                queue_column(
                    &mut queues,
                    &spec,
                    road_type,
                    special,
                    rad,
                    (px * sign, pz * sign),
                    anchor,
                    top_terrain,
                    bottom_terrain,
                );
            }
        }

        a += config.edge_walk_step;
    }

    // Spiral loops at the curve midpoint.
    if let Some(sp) = spiral {
        stamp_spiral(
            &mut queues, &spec, road_type, sp, from, d, slope, consumed, (ux, uz), (px, pz),
            top_terrain, bottom_terrain, config,
        );
    }

    // Emission: category order, later writes win at shared voxels. A bit
    // lands only outside both junction radii, or on a recorded opening,
    // unless this edge is an access path overriding junctions.
    let mut emitted: BTreeMap<VoxelPos, (Option<Material>, ColumnTag)> = BTreeMap::new();
    for queue in queues.values() {
        for queued in queue.values() {
            for (bit, tag) in queued.column.bits_at(queued.anchor) {
                if !spec.is_access && !bit_permitted(bit.pos, &spec) {
                    continue;
                }
                emitted.insert(bit.pos, (bit.material, tag));
            }
        }
    }

    let mut feature = SpatialFeature::new(spec.id, config.coarse_bucket_edge, config.fine_bucket_edge);
    let mut meta = RoadMetadata::default();
    let mut bits = Vec::with_capacity(emitted.len());
    for (pos, (material, tag)) in emitted {
        meta.record(pos, material, tag);
        bits.push(Bit::new(pos, material));
    }
    feature.add_bits(bits);

    let endpoints = match (spec.from.id, spec.to.id) {
        (Some(f), Some(t)) => EdgeEndpoints::Network { from: f, to: t },
        _ => EdgeEndpoints::Access,
    };

    RoadEdge {
        feature,
        endpoints,
        from_info: from,
        to_info: to,
        radius: spec.radius,
        curve,
        slope,
        spiral,
        road_dots,
        road_type: road_type.name.clone(),
        meta,
    }
}

/// Whether a non-access edge bit may land at `pos`: outside both junction
/// radii, or on one of the junctions' recorded arch/sidewalk openings.
fn bit_permitted(pos: VoxelPos, spec: &EdgeSpec<'_>) -> bool {
    for endpoint in [&spec.from, &spec.to] {
        let inside = pos.planar_dist(endpoint.info.center) <= endpoint.info.radius as f64;
        if inside {
            let open = endpoint
                .meta
                .map(|m| m.permits_opening(pos))
                .unwrap_or(false);
            if !open {
                return false;
            }
        }
    }
    true
}

/// Select, merge, rotate, and queue one column at `anchor`.
#[allow(clippy::too_many_arguments)]
fn queue_column(
    queues: &mut BTreeMap<Category, BTreeMap<(i32, i32), QueuedColumn>>,
    spec: &EdgeSpec<'_>,
    road_type: &RoadType,
    special: Option<&crate::templates::SpecialColumns>,
    rad: i32,
    toward: (f64, f64),
    anchor: VoxelPos,
    top_terrain: TerrainKind,
    bottom_terrain: TerrainKind,
) {
    let outer = rad == spec.radius;

    let (column, category) = if let Some(fixed) = spec.fixed_column {
        (
            fixed.clone(),
            if outer { Category::OuterNormal } else { Category::InnerNormal },
        )
    } else {
        let dist_sq = (rad as i64) * (rad as i64);
        let Some(band) = road_type.band_for(dist_sq) else {
            return;
        };
        match special {
            Some(sp) if road_type.special_permitted(band) => (
                BlockColumn::merge(&sp.top, &sp.bottom),
                if outer { Category::OuterSpecial } else { Category::InnerSpecial },
            ),
            _ => {
                let top = road_type.normal_column(Side::Top, top_terrain, band);
                let bottom = road_type.normal_column(Side::Bottom, bottom_terrain, band);
                (
                    BlockColumn::merge(top, bottom),
                    if outer { Category::OuterNormal } else { Category::InnerNormal },
                )
            }
        }
    };

    let rotation = if rad == 0 {
        Rotation::None
    } else {
        orientation_for_vector(toward.0, toward.1)
    };

    // Duplicate (x, z) anchors replace the stored column — last write wins
    // within a category.
    queues.entry(category).or_default().insert(
        (anchor.x, anchor.z),
        QueuedColumn {
            anchor,
            column: column.rotated(rotation),
        },
    );
}

/// Stamp spiral-loop columns winding around a circle at the curve midpoint,
/// consuming one height quantum per revolution.
#[allow(clippy::too_many_arguments)]
fn stamp_spiral(
    queues: &mut BTreeMap<Category, BTreeMap<(i32, i32), QueuedColumn>>,
    spec: &EdgeSpec<'_>,
    road_type: &RoadType,
    sp: SpiralSpec,
    from: EndpointInfo,
    d: f64,
    slope: f64,
    consumed: f64,
    u: (f64, f64),
    p: (f64, f64),
    top_terrain: TerrainKind,
    bottom_terrain: TerrainKind,
    config: &PlannerConfig,
) {
    let side_sign = match sp.side {
        SpiralSide::Left => 1.0,
        SpiralSide::Right => -1.0,
    };
    let quantum = consumed / sp.loops as f64;
    let mid_a = d / 2.0;
    let y_mid = from.center.y as f64 + slope * mid_a;
    let r = config.spiral_radius;

    // Entry point sits on the main line; the winding circle's center is one
    // radius off to the chosen side.
    let mid_x = from.center.x as f64 + u.0 * mid_a;
    let mid_z = from.center.z as f64 + u.1 * mid_a;

    let steps_per_loop = ((2.0 * std::f64::consts::PI * r) / config.edge_walk_step).ceil() as u32;
    for loop_idx in 0..sp.loops {
        let center_x = mid_x
            + p.0 * side_sign * r
            + u.0 * config.spiral_axial_advance * loop_idx as f64;
        let center_z = mid_z
            + p.1 * side_sign * r
            + u.1 * config.spiral_axial_advance * loop_idx as f64;
        for step in 0..steps_per_loop {
            let t = step as f64 / steps_per_loop as f64;
            // Start each loop at the main line (angle pointing back at it).
            let theta = 2.0 * std::f64::consts::PI * t;
            let (sin, cos) = theta.sin_cos();
            // Radial direction from the circle center, rotated through the
            // loop; at t=0 it points back toward the entry point.
            let rx = -p.0 * side_sign * cos + u.0 * sin;
            let rz = -p.1 * side_sign * cos + u.1 * sin;
            let y = y_mid + quantum * (loop_idx as f64 + t);

            for rad in 0..=spec.radius {
                let signs: &[f64] = if rad == 0 { &[1.0] } else { &[1.0, -1.0] };
                for &sign in signs {
                    let dist = r + sign * rad as f64;
                    let anchor = VoxelPos::new(
                        (center_x + rx * dist).round() as i32,
                        y.round() as i32,
                        (center_z + rz * dist).round() as i32,
                    );
                    queue_column(
                        queues,
                        spec,
                        road_type,
                        None,
                        rad,
                        (rx * sign, rz * sign),
                        anchor,
                        top_terrain,
                        bottom_terrain,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::TemplateStore;
    use crate::types::MaterialClass;
    use crate::world::GridWorld;

    fn dirt() -> Material {
        Material::new(0, MaterialClass::Soil)
    }

    fn flat_world() -> GridWorld {
        GridWorld::flat(VoxelPos::new(-96, -8, -96), 192, 64, 192, 0, dirt())
    }

    fn demo_road() -> (TemplateStore, PlannerConfig) {
        (TemplateStore::demo(), PlannerConfig::default())
    }

    fn junction_at(x: i32, z: i32, id: u64, rng: &mut PlanRng) -> (Junction, GridWorld) {
        let (store, config) = demo_road();
        let world = flat_world();
        let road = store.road_type("dirt_lane").unwrap();
        let j = Junction::build(
            FeatureId(id),
            VoxelPos::new(x, 0, z),
            road,
            &world,
            rng,
            &config,
        );
        (j, world)
    }

    #[test]
    fn orientation_buckets() {
        assert_eq!(orientation_for_offset(5, 0), Rotation::None);
        assert_eq!(orientation_for_offset(-5, 1), Rotation::Opp);
        assert_eq!(orientation_for_offset(0, 5), Rotation::Cw90);
        assert_eq!(orientation_for_offset(1, -5), Rotation::Ccw90);
        // Diagonal resolves to the dominant component's axis.
        assert_eq!(orientation_for_offset(4, 3), Rotation::None);
        assert_eq!(orientation_for_offset(3, -4), Rotation::Ccw90);
    }

    #[test]
    fn junction_bits_stay_within_radius() {
        let mut rng = PlanRng::new(42);
        let (j, _) = junction_at(0, 0, 1, &mut rng);
        assert!(!j.feature.is_empty());
        for bit in j.feature.bits() {
            assert!(
                bit.pos.planar_dist_sq(j.center) <= (j.radius as i64) * (j.radius as i64),
                "bit {} outside junction radius",
                bit.pos
            );
        }
    }

    #[test]
    fn junction_records_rim_metadata() {
        let mut rng = PlanRng::new(42);
        let (j, _) = junction_at(0, 0, 1, &mut rng);
        // The demo rim column tags its base Sidewalk and its headroom Arch.
        assert!(!j.meta.sidewalk.is_empty());
        assert!(!j.meta.arch.is_empty());
        // Rim entries sit in the outermost band.
        for pos in &j.meta.sidewalk {
            assert!(pos.planar_dist_sq(j.center) > 3 * 3);
        }
    }

    #[test]
    fn junction_remove_bits_prunes_metadata() {
        let mut rng = PlanRng::new(42);
        let (mut j, _) = junction_at(0, 0, 1, &mut rng);
        let doomed: Vec<VoxelPos> = j.meta.sidewalk.iter().copied().take(3).collect();
        j.remove_bits(&doomed);
        for pos in &doomed {
            assert!(!j.meta.sidewalk.contains(pos));
            assert!(!j.feature.contains_position(*pos));
        }
    }

    #[test]
    fn junction_build_is_deterministic() {
        let mut a = PlanRng::new(9);
        let mut b = PlanRng::new(9);
        let (ja, _) = junction_at(4, -4, 1, &mut a);
        let (jb, _) = junction_at(4, -4, 1, &mut b);
        assert_eq!(ja.feature.bits(), jb.feature.bits());
        assert_eq!(ja.meta.sidewalk, jb.meta.sidewalk);
    }

    fn network_edge(seed: u64, from_z: i32, to_z: i32) -> (RoadEdge, Junction, Junction) {
        let (store, config) = demo_road();
        let world = flat_world();
        let road = store.road_type("dirt_lane").unwrap();
        let mut rng = PlanRng::new(seed);
        let ja = Junction::build(FeatureId(1), VoxelPos::new(0, 0, from_z), road, &world, &mut rng, &config);
        let jb = Junction::build(FeatureId(2), VoxelPos::new(0, 0, to_z), road, &world, &mut rng, &config);
        let edge = build_edge(
            EdgeSpec {
                id: FeatureId(3),
                from: EdgeEndpoint::of_junction(&ja),
                to: EdgeEndpoint::of_junction(&jb),
                radius: road.edge_radius,
                is_access: false,
                fixed_column: None,
            },
            road,
            &world,
            &mut rng,
            &config,
        );
        (edge, ja, jb)
    }

    #[test]
    fn flat_edge_has_zero_slope_and_no_spiral() {
        let (edge, _, _) = network_edge(42, -12, 12);
        assert_eq!(edge.slope, 0.0);
        assert!(edge.spiral.is_none());
        assert!(!edge.feature.is_empty());
    }

    #[test]
    fn edge_emits_road_dots_along_centerline() {
        let (edge, ja, jb) = network_edge(42, -16, 16);
        let d = ja.center.planar_dist(jb.center);
        let expected = (d / PlannerConfig::default().road_dot_spacing) as usize;
        // One dot roughly every 2.5 units, plus the start dot.
        assert!(edge.road_dots.len() >= expected && edge.road_dots.len() <= expected + 2);
        // Dots advance monotonically from one junction toward the other.
        let mut last = i32::MIN;
        for dot in &edge.road_dots {
            assert!(dot.z >= last);
            last = dot.z;
        }
    }

    #[test]
    fn edge_respects_junction_boundaries() {
        let (edge, ja, jb) = network_edge(7, -14, 14);
        for bit in edge.feature.bits() {
            for j in [&ja, &jb] {
                let inside =
                    bit.pos.planar_dist(j.center) <= j.radius as f64;
                if inside {
                    assert!(
                        j.meta.permits_opening(bit.pos),
                        "bit {} scars junction plaza",
                        bit.pos
                    );
                }
            }
        }
    }

    #[test]
    fn access_edge_overrides_junction_boundaries() {
        let (store, config) = demo_road();
        let world = flat_world();
        let road = store.road_type("dirt_lane").unwrap();
        let mut rng = PlanRng::new(5);
        let column = store.column("path_top").unwrap().clone();
        let edge = build_edge(
            EdgeSpec {
                id: FeatureId(9),
                from: EdgeEndpoint::access(VoxelPos::new(0, 0, 0), 1),
                to: EdgeEndpoint::access(VoxelPos::new(0, 0, 15), 1),
                radius: 1,
                is_access: true,
                fixed_column: Some(&column),
            },
            road,
            &world,
            &mut rng,
            &config,
        );
        assert!(edge.is_access());
        assert!(edge.spiral.is_none());
        // Access paths stamp the fixed column: every non-empty bit is the
        // path's gravel surface.
        let surface_blocks: Vec<u16> = edge
            .feature
            .bits()
            .iter()
            .filter_map(|b| b.material)
            .map(|m| m.block)
            .collect();
        assert!(!surface_blocks.is_empty());
        assert!(surface_blocks.iter().all(|&b| b == 0));
    }

    #[test]
    fn tall_drop_inserts_spiral_loops() {
        let (store, config) = demo_road();
        let mut world = flat_world();
        // Raise a plateau for the second junction, 14 voxels up.
        for x in -12..=12 {
            for z in 20..=44 {
                for y in 1..=14 {
                    world.set_material(VoxelPos::new(x, y, z), Some(dirt()));
                }
            }
        }
        let road = store.road_type("dirt_lane").unwrap();
        let mut rng = PlanRng::new(3);
        let ja = Junction::build(FeatureId(1), VoxelPos::new(0, 0, 0), road, &world, &mut rng, &config);
        let jb = Junction::build(FeatureId(2), VoxelPos::new(0, 14, 32), road, &world, &mut rng, &config);
        let edge = build_edge(
            EdgeSpec {
                id: FeatureId(3),
                from: EdgeEndpoint::of_junction(&ja),
                to: EdgeEndpoint::of_junction(&jb),
                radius: road.edge_radius,
                is_access: false,
                fixed_column: None,
            },
            road,
            &world,
            &mut rng,
            &config,
        );
        let spiral = edge.spiral.expect("14 voxels over quantum 6 must spiral");
        assert_eq!(spiral.loops, 2);
        // Spiral edges are straight.
        assert_eq!(edge.curve.degree, 1);
        // The base slope only covers the unconsumed remainder.
        assert!(edge.slope.abs() < 14.0 / ja.center.planar_dist(jb.center));
    }

    #[test]
    fn shared_junction_between_edges() {
        let (store, config) = demo_road();
        let world = flat_world();
        let road = store.road_type("dirt_lane").unwrap();
        let mut rng = PlanRng::new(13);
        let ja = Junction::build(FeatureId(1), VoxelPos::new(0, 0, 0), road, &world, &mut rng, &config);
        let jb = Junction::build(FeatureId(2), VoxelPos::new(0, 0, 20), road, &world, &mut rng, &config);
        let jc = Junction::build(FeatureId(3), VoxelPos::new(20, 0, 0), road, &world, &mut rng, &config);
        let make = |id: u64, from: &Junction, to: &Junction, rng: &mut PlanRng| {
            build_edge(
                EdgeSpec {
                    id: FeatureId(id),
                    from: EdgeEndpoint::of_junction(from),
                    to: EdgeEndpoint::of_junction(to),
                    radius: road.edge_radius,
                    is_access: false,
                    fixed_column: None,
                },
                road,
                &world,
                rng,
                &config,
            )
        };
        let e1 = make(10, &ja, &jb, &mut rng);
        let e2 = make(11, &ja, &jc, &mut rng);
        let e3 = make(12, &jb, &jc, &mut rng);
        assert_eq!(e1.shared_junction(&e2).map(|i| i.center), Some(ja.center));
        assert_eq!(e2.shared_junction(&e3).map(|i| i.center), Some(jc.center));
        assert_eq!(e1.shared_junction(&e3).map(|i| i.center), Some(jb.center));
    }

    #[test]
    fn edge_build_is_deterministic() {
        let (e1, _, _) = network_edge(21, -15, 15);
        let (e2, _, _) = network_edge(21, -15, 15);
        assert_eq!(e1.feature.bits(), e2.feature.bits());
        assert_eq!(e1.road_dots, e2.road_dots);
        assert_eq!(e1.curve.degree, e2.curve.degree);
    }
}
