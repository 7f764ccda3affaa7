// The World Oracle — the planner's only window onto the voxel world.
//
// The planner never owns terrain; it consumes a `World` implementation for
// material reads, fluid queries, surface scans, and (on commit) material
// writes. Terrain sampling is a synchronous in-memory query: no I/O happens
// inside a planning step.
//
// `GridWorld` is the dense reference implementation: a flat
// `Vec<Option<Material>>` indexed by `x + z * size_x + y * size_x * size_z`
// relative to a min corner, giving O(1) read/write access. Out-of-bounds
// reads return air (`None`); out-of-bounds writes are no-ops. Positions can
// be marked protected, turning writes there into no-ops as well — the
// "untouched" tag of host worlds that reserve blocks from the planner.
//
// **Critical constraint: determinism.** World state only changes through
// `set_material` calls made by committed features. No concurrent mutation.

use crate::types::{Material, MaterialClass, VoxelPos};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// How `find_surface` treats fluid blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceMode {
    /// Fluid is neither ground nor air: a fluid top is simply not a surface.
    Ignore,
    /// Fluid counts as ground — the surface of a lake is a buildable top
    /// (coastal settlement styles).
    FluidAsGround,
    /// Fluid counts as air — the scan passes through water down to the bed
    /// (underwater settlement styles).
    FluidAsAir,
}

/// The voxel world as the planner sees it.
pub trait World {
    /// The material at `pos`, or `None` for air.
    fn material(&self, pos: VoxelPos) -> Option<Material>;

    /// Whether the block at `pos` is a fluid.
    fn is_fluid(&self, pos: VoxelPos) -> bool;

    /// Write a material (or carve to air with `None`). Implementations
    /// no-op for positions the host has reserved.
    fn set_material(&mut self, pos: VoxelPos, material: Option<Material>);

    /// Scan the column at (pos.x, pos.z) from `y_max` down to `y_min` for
    /// the topmost surface block, honoring `mode` for fluids. Returns the
    /// position of the surface block itself, or `None` when the scan finds
    /// nothing — a normal "no candidate" outcome for the planner.
    fn find_surface(
        &self,
        pos: VoxelPos,
        y_min: i32,
        y_max: i32,
        mode: SurfaceMode,
    ) -> Option<VoxelPos>;
}

/// Dense in-memory voxel grid over a bounded region.
#[derive(Clone, Debug)]
pub struct GridWorld {
    /// Flat storage: index = x + z * size_x + y * size_x * size_z,
    /// with (x, y, z) relative to `min`.
    cells: Vec<Option<Material>>,
    min: VoxelPos,
    pub size_x: u32,
    pub size_y: u32,
    pub size_z: u32,
    /// Positions the planner must not alter.
    protected: FxHashSet<VoxelPos>,
}

impl GridWorld {
    /// Create a new all-air world spanning `size` voxels from `min`.
    pub fn new(min: VoxelPos, size_x: u32, size_y: u32, size_z: u32) -> Self {
        let total = (size_x as usize) * (size_y as usize) * (size_z as usize);
        Self {
            cells: vec![None; total],
            min,
            size_x,
            size_y,
            size_z,
            protected: FxHashSet::default(),
        }
    }

    /// A world with a flat solid floor of `floor_material` filling every
    /// layer at or below `floor_y`. The usual test fixture.
    pub fn flat(
        min: VoxelPos,
        size_x: u32,
        size_y: u32,
        size_z: u32,
        floor_y: i32,
        floor_material: Material,
    ) -> Self {
        let mut world = Self::new(min, size_x, size_y, size_z);
        for x in min.x..min.x + size_x as i32 {
            for z in min.z..min.z + size_z as i32 {
                for y in min.y..=floor_y.min(min.y + size_y as i32 - 1) {
                    world.set_material(VoxelPos::new(x, y, z), Some(floor_material));
                }
            }
        }
        world
    }

    pub fn in_bounds(&self, pos: VoxelPos) -> bool {
        pos.x >= self.min.x
            && pos.y >= self.min.y
            && pos.z >= self.min.z
            && pos.x < self.min.x + self.size_x as i32
            && pos.y < self.min.y + self.size_y as i32
            && pos.z < self.min.z + self.size_z as i32
    }

    /// Mark a position as reserved by the host: writes there become no-ops.
    pub fn protect(&mut self, pos: VoxelPos) {
        self.protected.insert(pos);
    }

    /// Convert a position to a flat index. Returns `None` if out of bounds.
    fn index(&self, pos: VoxelPos) -> Option<usize> {
        if self.in_bounds(pos) {
            let x = (pos.x - self.min.x) as usize;
            let y = (pos.y - self.min.y) as usize;
            let z = (pos.z - self.min.z) as usize;
            let sx = self.size_x as usize;
            let sz = self.size_z as usize;
            Some(x + z * sx + y * sx * sz)
        } else {
            None
        }
    }
}

impl World for GridWorld {
    fn material(&self, pos: VoxelPos) -> Option<Material> {
        self.index(pos).and_then(|i| self.cells[i])
    }

    fn is_fluid(&self, pos: VoxelPos) -> bool {
        self.material(pos)
            .is_some_and(|m| m.class == MaterialClass::Fluid)
    }

    fn set_material(&mut self, pos: VoxelPos, material: Option<Material>) {
        if self.protected.contains(&pos) {
            return;
        }
        if let Some(i) = self.index(pos) {
            self.cells[i] = material;
        }
    }

    fn find_surface(
        &self,
        pos: VoxelPos,
        y_min: i32,
        y_max: i32,
        mode: SurfaceMode,
    ) -> Option<VoxelPos> {
        let y_top = y_max.min(self.min.y + self.size_y as i32 - 1);
        let y_bottom = y_min.max(self.min.y);
        for y in (y_bottom..=y_top).rev() {
            let at = VoxelPos::new(pos.x, y, pos.z);
            match self.material(at) {
                None => continue,
                Some(m) if m.class == MaterialClass::Fluid => match mode {
                    SurfaceMode::FluidAsGround => return Some(at),
                    SurfaceMode::FluidAsAir => continue,
                    SurfaceMode::Ignore => return None,
                },
                Some(_) => return Some(at),
            }
        }
        None
    }
}
