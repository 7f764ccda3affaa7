// Vertical block columns — the stamps junctions and edges are built from.
//
// A `BlockColumn` is an ordered stack of (optional material, tag) entries
// with a `base_level` index marking the "ground" slot. Road construction
// picks a top-terrain column and a bottom-terrain column per (x, z) sample
// and merges them into one placeable stack; the merged column is then
// rotated into the sample's orientation bucket and emitted as bits at the
// surface anchor.
//
// Tags mark entries with road roles (sidewalk, arch opening, pillar seed)
// that junctions record so adjoining edges can merge boundaries correctly.
//
// **Critical constraint: determinism.** Columns are pure values; the only
// randomness in column handling is the special-variant draw in `road.rs`,
// which samples the caller's `PlanRng`.

use crate::types::{Bit, Material, Rotation, VoxelPos};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Role of a column entry within a road feature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnTag {
    #[default]
    Normal,
    /// Walkable rim entry; edges may cross junction rims here.
    Sidewalk,
    /// Arch opening entry; edges may pass under junction plazas here.
    Arch,
    /// Seed for a support pillar continued downward to solid ground.
    PillarSeed,
}

/// One slot of a column: an optional material plus its road role.
///
/// `material == None` claims the voxel for collision without altering the
/// world (cleared headroom above a road surface).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnEntry {
    pub material: Option<Material>,
    pub tag: ColumnTag,
}

impl ColumnEntry {
    pub const fn new(material: Option<Material>, tag: ColumnTag) -> Self {
        Self { material, tag }
    }
}

/// An ordered vertical stack of entries with a designated ground slot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockColumn {
    entries: SmallVec<[ColumnEntry; 8]>,
    /// Index of the entry placed at the anchor's y level.
    base_level: usize,
}

impl BlockColumn {
    pub fn new(entries: impl Into<SmallVec<[ColumnEntry; 8]>>, base_level: usize) -> Self {
        let entries = entries.into();
        assert!(
            entries.is_empty() || base_level < entries.len(),
            "base_level {base_level} out of range for {} entries",
            entries.len()
        );
        Self {
            entries,
            base_level,
        }
    }

    /// The empty column — the identity element of `merge`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ColumnEntry] {
        &self.entries
    }

    pub fn base_level(&self) -> usize {
        self.base_level
    }

    /// Number of slots below the ground slot.
    fn depth(&self) -> i32 {
        self.base_level as i32
    }

    /// Number of slots at or above the ground slot.
    fn height(&self) -> i32 {
        self.entries.len() as i32 - self.base_level as i32
    }

    /// The entry at a slot relative to the ground level, if present.
    fn slot(&self, rel: i32) -> Option<ColumnEntry> {
        let idx = rel + self.base_level as i32;
        if idx < 0 {
            return None;
        }
        self.entries.get(idx as usize).copied()
    }

    /// Merge two columns slot by slot, aligned at their ground levels.
    ///
    /// A non-null `upper` entry wins its slot; otherwise the `lower` entry
    /// is used; a slot covered by only one column keeps that column's
    /// entry. `merge(a, a) == a`, and the empty column is the identity on
    /// both sides.
    pub fn merge(upper: &BlockColumn, lower: &BlockColumn) -> BlockColumn {
        if upper.is_empty() {
            return lower.clone();
        }
        if lower.is_empty() {
            return upper.clone();
        }
        let depth = upper.depth().max(lower.depth());
        let height = upper.height().max(lower.height());
        let mut entries: SmallVec<[ColumnEntry; 8]> = SmallVec::with_capacity((depth + height) as usize);
        for rel in -depth..height {
            let up = upper.slot(rel);
            let lo = lower.slot(rel);
            let entry = match (up, lo) {
                (Some(u), _) if u.material.is_some() => u,
                (_, Some(l)) => l,
                (Some(u), None) => u,
                (None, None) => unreachable!("slot {rel} covered by neither column"),
            };
            entries.push(entry);
        }
        BlockColumn::new(entries, depth as usize)
    }

    /// This column with every directional material rotated.
    pub fn rotated(&self, rotation: Rotation) -> BlockColumn {
        if rotation == Rotation::None {
            return self.clone();
        }
        BlockColumn {
            entries: self
                .entries
                .iter()
                .map(|e| ColumnEntry::new(e.material.map(|m| m.rotated(rotation)), e.tag))
                .collect(),
            base_level: self.base_level,
        }
    }

    /// Emit the column as bits with the ground slot at `anchor`, paired
    /// with each entry's tag so callers can record road metadata.
    pub fn bits_at(&self, anchor: VoxelPos) -> impl Iterator<Item = (Bit, ColumnTag)> + '_ {
        self.entries.iter().enumerate().map(move |(i, entry)| {
            let pos = anchor.up(i as i32 - self.base_level as i32);
            (Bit::new(pos, entry.material), entry.tag)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Facing, MaterialClass};

    fn stone() -> Material {
        Material::new(1, MaterialClass::Stone)
    }

    fn plank() -> Material {
        Material::new(2, MaterialClass::Wood)
    }

    fn column(mats: &[Option<Material>], base: usize) -> BlockColumn {
        BlockColumn::new(
            mats.iter()
                .map(|m| ColumnEntry::new(*m, ColumnTag::Normal))
                .collect::<SmallVec<[ColumnEntry; 8]>>(),
            base,
        )
    }

    #[test]
    fn merge_is_idempotent() {
        let a = column(&[Some(stone()), None, Some(plank())], 1);
        assert_eq!(BlockColumn::merge(&a, &a), a);
    }

    #[test]
    fn merge_with_empty_is_identity() {
        let a = column(&[Some(stone()), Some(plank())], 0);
        assert_eq!(BlockColumn::merge(&a, &BlockColumn::empty()), a);
        assert_eq!(BlockColumn::merge(&BlockColumn::empty(), &a), a);
    }

    #[test]
    fn upper_non_null_entries_win() {
        let upper = column(&[Some(stone()), None], 0);
        let lower = column(&[Some(plank()), Some(plank())], 0);
        let merged = BlockColumn::merge(&upper, &lower);
        assert_eq!(merged.entries()[0].material, Some(stone()));
        // Null upper slot falls through to the lower entry.
        assert_eq!(merged.entries()[1].material, Some(plank()));
    }

    #[test]
    fn merge_aligns_ground_levels() {
        // Upper has one slot below ground, lower has two.
        let upper = column(&[Some(stone()), Some(stone())], 1);
        let lower = column(&[Some(plank()), Some(plank()), Some(plank())], 2);
        let merged = BlockColumn::merge(&upper, &lower);
        assert_eq!(merged.base_level(), 2);
        assert_eq!(merged.entries().len(), 3);
        // Deepest slot only exists in the lower column.
        assert_eq!(merged.entries()[0].material, Some(plank()));
        // Ground slot comes from the upper column.
        assert_eq!(merged.entries()[2].material, Some(stone()));
    }

    #[test]
    fn merge_keeps_slots_covered_by_one_side() {
        let upper = column(&[Some(stone()), None, None], 0);
        let lower = column(&[Some(plank())], 0);
        let merged = BlockColumn::merge(&upper, &lower);
        assert_eq!(merged.entries().len(), 3);
        // Slots above the lower column's top keep the upper entries, even
        // when those are null clearance slots.
        assert_eq!(merged.entries()[1].material, None);
        assert_eq!(merged.entries()[2].material, None);
    }

    #[test]
    fn rotation_rotates_directional_materials() {
        let stairs = Material::facing(7, MaterialClass::Stone, Facing::North);
        let col = column(&[Some(stairs)], 0);
        let rotated = col.rotated(Rotation::Ccw90);
        assert_eq!(
            rotated.entries()[0].material.unwrap().facing,
            Some(Facing::West)
        );
    }

    #[test]
    fn bits_emitted_around_anchor() {
        let col = column(&[Some(stone()), Some(plank()), None], 1);
        let anchor = VoxelPos::new(10, 5, -3);
        let bits: Vec<Bit> = col.bits_at(anchor).map(|(b, _)| b).collect();
        assert_eq!(bits.len(), 3);
        // base_level slot lands exactly at the anchor.
        assert_eq!(bits[0].pos, anchor.up(-1));
        assert_eq!(bits[1].pos, anchor);
        assert_eq!(bits[2].pos, anchor.up(1));
        assert_eq!(bits[2].material, None);
    }

    #[test]
    fn tags_survive_merge() {
        let mut upper_entries: SmallVec<[ColumnEntry; 8]> = SmallVec::new();
        upper_entries.push(ColumnEntry::new(Some(stone()), ColumnTag::Sidewalk));
        let upper = BlockColumn::new(upper_entries, 0);
        let lower = column(&[Some(plank())], 0);
        let merged = BlockColumn::merge(&upper, &lower);
        assert_eq!(merged.entries()[0].tag, ColumnTag::Sidewalk);
    }

    #[test]
    fn serialization_roundtrip() {
        let col = column(&[Some(stone()), None, Some(plank())], 1);
        let json = serde_json::to_string(&col).unwrap();
        let restored: BlockColumn = serde_json::from_str(&json).unwrap();
        assert_eq!(col, restored);
    }
}
