// Structures — placed buildings instantiated from shared templates.
//
// A `StructureTemplate` is immutable and shared; placing one draws a
// uniformly random rotation, resolves any random-choice cells against the
// store's choice tables, and re-anchors the resulting bit set into world
// space. Every cell of the template grid claims its voxel: untouched cells
// become material-less bits, so the structure's full footprint participates
// in collision without altering the world there.
//
// Points of interest transform with the same rotation as the bits. An
// access point demands exactly one connecting path to the road network —
// `planner.rs::connect_access_points` — and a single unconnectable access
// point invalidates the whole placement.
//
// **Critical constraint: determinism.** Rotation and choice-cell draws
// sample the caller's `PlanRng` in cell order.

use crate::column::BlockColumn;
use crate::feature::SpatialFeature;
use crate::templates::TemplateStore;
use crate::types::{Bit, FeatureId, Material, Rotation, VoxelPos};
use burgwright_prng::PlanRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One voxel of a structure template.
#[derive(Clone, Debug, PartialEq)]
pub enum TemplateCell {
    /// Claimed but never written — interior air, door openings.
    Untouched,
    Block(Material),
    /// Resolved against the store's choice table at placement time.
    Choice(String),
}

/// An immutable, shared structure definition.
#[derive(Clone, Debug)]
pub struct StructureTemplate {
    name: String,
    size: (usize, usize, usize),
    /// The y layer placed at the anchor's height.
    base_level: usize,
    /// Flat storage: index = x + z * size_x + y * size_x * size_z.
    cells: Vec<TemplateCell>,
    points: Vec<PointOfInterest>,
    metadata: BTreeMap<String, f64>,
}

impl StructureTemplate {
    pub fn new(
        name: String,
        size: (usize, usize, usize),
        base_level: usize,
        cells: Vec<TemplateCell>,
        points: Vec<PointOfInterest>,
        metadata: BTreeMap<String, f64>,
    ) -> Self {
        debug_assert_eq!(cells.len(), size.0 * size.1 * size.2);
        Self {
            name,
            size,
            base_level,
            cells,
            points,
            metadata,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> (usize, usize, usize) {
        self.size
    }

    pub fn points(&self) -> &[PointOfInterest] {
        &self.points
    }

    pub fn metadata(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).copied()
    }

    fn cell(&self, x: usize, y: usize, z: usize) -> &TemplateCell {
        &self.cells[x + z * self.size.0 + y * self.size.0 * self.size.2]
    }
}

/// A point of interest attached to a structure, in template-relative or
/// world coordinates depending on context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub pos: VoxelPos,
    pub kind: PoiKind,
}

/// The closed set of point-of-interest kinds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PoiKind {
    Plain,
    /// Demands one connecting path to the road network.
    Access {
        /// Radius of the connecting path.
        radius: i32,
        /// Column stamped along the path surface.
        column: BlockColumn,
    },
    /// A spot for host-side planting; the planner attaches no behavior.
    Sapling,
}

/// A placed structure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Structure {
    pub feature: SpatialFeature,
    pub anchor: VoxelPos,
    pub rotation: Rotation,
    pub structure_type: String,
    /// Points of interest in world space (rotation applied).
    pub points: Vec<PointOfInterest>,
    pub metadata: BTreeMap<String, f64>,
}

impl Structure {
    /// Materialize a template at `anchor` with a random rotation.
    pub fn instantiate(
        id: FeatureId,
        template: &StructureTemplate,
        anchor: VoxelPos,
        store: &TemplateStore,
        rng: &mut PlanRng,
        coarse_edge: i32,
        fine_edge: i32,
    ) -> Self {
        let rotation = Rotation::random(rng);
        let (sx, sy, sz) = template.size;

        let mut relative = Vec::with_capacity(sx * sy * sz);
        for y in 0..sy {
            for z in 0..sz {
                for x in 0..sx {
                    let material = match template.cell(x, y, z) {
                        TemplateCell::Untouched => None,
                        TemplateCell::Block(m) => Some(*m),
                        TemplateCell::Choice(name) => {
                            // Choice tables were validated at load time.
                            Some(
                                store
                                    .draw_choice(name, rng)
                                    .expect("validated choice table"),
                            )
                        }
                    };
                    relative.push(Bit::new(
                        VoxelPos::new(x as i32, y as i32 - template.base_level as i32, z as i32),
                        material,
                    ));
                }
            }
        }

        let mut feature = SpatialFeature::new(id, coarse_edge, fine_edge);
        feature.set_bits(&relative, anchor, rotation);

        let points = template
            .points
            .iter()
            .map(|p| {
                let rotated = rotation.apply(p.pos);
                PointOfInterest {
                    pos: anchor.offset(rotated.x, rotated.y, rotated.z),
                    kind: match &p.kind {
                        PoiKind::Plain => PoiKind::Plain,
                        PoiKind::Sapling => PoiKind::Sapling,
                        PoiKind::Access { radius, column } => PoiKind::Access {
                            radius: *radius,
                            column: column.rotated(rotation),
                        },
                    },
                }
            })
            .collect();

        Self {
            feature,
            anchor,
            rotation,
            structure_type: template.name.clone(),
            points,
            metadata: template.metadata.clone(),
        }
    }

    /// The world-space access points this structure must wire into the
    /// road network.
    pub fn access_points(&self) -> impl Iterator<Item = &PointOfInterest> {
        self.points
            .iter()
            .filter(|p| matches!(p.kind, PoiKind::Access { .. }))
    }

    pub fn metadata_value(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).copied()
    }
}
