// Template data — road tiers, structure templates, palettes, demand tables.
//
// A `TemplateStore` is constructed once per load cycle from JSON, fully
// validated, and then passed by shared reference into the planner. There is
// no global registry: reloading data means constructing a new store and
// swapping it in. The planner never sees invalid templates — every cross
// reference (palette names, column names, road/structure types) is resolved
// or rejected here with a `TemplateError`.
//
// The JSON shape is the same one the external region-export tool produces:
// structures are token grids (one character per voxel) with an abbreviation
// key, columns are entry lists with a ground index, and road tiers name
// their column tables per radius band.
//
// See also: `column.rs` for the resolved `BlockColumn` values, `road.rs`
// and `structure.rs` for the consumers, `planner.rs` for tier selection and
// demand draws.

use crate::column::{BlockColumn, ColumnEntry, ColumnTag};
use crate::structure::{PoiKind, PointOfInterest, StructureTemplate, TemplateCell};
use crate::types::{Facing, Material, MaterialClass, TerrainKind, VoxelPos};
use burgwright_prng::PlanRng;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A malformed-template failure. Fatal at load time; the planner never
/// receives a store that failed validation.
#[derive(Debug)]
pub enum TemplateError {
    Parse(serde_json::Error),
    EmptyPalette,
    PaletteTooLarge(usize),
    EmptyTierTable,
    UnknownBlock { context: String, name: String },
    UnknownColumn { context: String, name: String },
    UnknownChoice { context: String, name: String },
    EmptyChoice { name: String },
    InvalidColumn { name: String, reason: String },
    UnknownRoadType { context: String, name: String },
    UnknownStructureType { context: String, name: String },
    InvalidRoadType { name: String, reason: String },
    InvalidStructure { name: String, reason: String },
    InvalidDemand { structure_type: String, reason: String },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Parse(e) => write!(f, "template JSON parse error: {e}"),
            TemplateError::EmptyPalette => write!(f, "palette must not be empty"),
            TemplateError::PaletteTooLarge(n) => {
                write!(f, "palette has {n} entries; at most 65536 are supported")
            }
            TemplateError::EmptyTierTable => write!(f, "tier table must not be empty"),
            TemplateError::UnknownBlock { context, name } => {
                write!(f, "{context}: unknown palette block {name:?}")
            }
            TemplateError::UnknownColumn { context, name } => {
                write!(f, "{context}: unknown column {name:?}")
            }
            TemplateError::UnknownChoice { context, name } => {
                write!(f, "{context}: unknown choice table {name:?}")
            }
            TemplateError::EmptyChoice { name } => {
                write!(f, "choice table {name:?} must not be empty")
            }
            TemplateError::InvalidColumn { name, reason } => {
                write!(f, "column {name:?}: {reason}")
            }
            TemplateError::UnknownRoadType { context, name } => {
                write!(f, "{context}: unknown road type {name:?}")
            }
            TemplateError::UnknownStructureType { context, name } => {
                write!(f, "{context}: unknown structure type {name:?}")
            }
            TemplateError::InvalidRoadType { name, reason } => {
                write!(f, "road type {name:?}: {reason}")
            }
            TemplateError::InvalidStructure { name, reason } => {
                write!(f, "structure {name:?}: {reason}")
            }
            TemplateError::InvalidDemand {
                structure_type,
                reason,
            } => write!(f, "demand entry for {structure_type:?}: {reason}"),
        }
    }
}

impl std::error::Error for TemplateError {}

impl From<serde_json::Error> for TemplateError {
    fn from(e: serde_json::Error) -> Self {
        TemplateError::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Resolved runtime data
// ---------------------------------------------------------------------------

/// Which half of a sampled column a table belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Top,
    Bottom,
}

/// A special-column variant: top and bottom stamps selected together by
/// name.
#[derive(Clone, Debug)]
pub struct SpecialColumns {
    pub top: BlockColumn,
    pub bottom: BlockColumn,
}

/// One road tier: junction geometry plus the per-band column tables.
#[derive(Clone, Debug)]
pub struct RoadType {
    pub name: String,
    pub junction_radius: i32,
    pub same_height_radius: i32,
    pub edge_radius: i32,
    /// Vertical quantum above which edges insert spiral loops.
    pub height_quantum: i32,
    /// Ascending outer radii of the annular column bands.
    pub column_radii: Vec<i32>,
    /// Which bands may take special-column overrides.
    pub special_allowed: Vec<bool>,
    /// Per-position probability of a special override where permitted.
    pub special_chance: f64,
    top_dry: Vec<BlockColumn>,
    top_fluid: Vec<BlockColumn>,
    bottom_dry: Vec<BlockColumn>,
    bottom_fluid: Vec<BlockColumn>,
    pub specials: Vec<SpecialColumns>,
}

impl RoadType {
    /// The band index for a squared planar distance: the first band whose
    /// outer radius contains it (`dist_sq <= r·r`), or `None` beyond the
    /// last band.
    pub fn band_for(&self, dist_sq: i64) -> Option<usize> {
        self.column_radii
            .iter()
            .position(|&r| dist_sq <= (r as i64) * (r as i64))
    }

    /// The normal column for a band in the given side/terrain context.
    pub fn normal_column(&self, side: Side, terrain: TerrainKind, band: usize) -> &BlockColumn {
        let table = match (side, terrain) {
            (Side::Top, TerrainKind::Dry) => &self.top_dry,
            (Side::Top, TerrainKind::Fluid) => &self.top_fluid,
            (Side::Bottom, TerrainKind::Dry) => &self.bottom_dry,
            (Side::Bottom, TerrainKind::Fluid) => &self.bottom_fluid,
        };
        &table[band]
    }

    pub fn special_permitted(&self, band: usize) -> bool {
        self.special_allowed.get(band).copied().unwrap_or(false)
    }

    /// Draw one special variant, if the tier defines any.
    pub fn draw_special<'a>(&'a self, rng: &mut PlanRng) -> Option<&'a SpecialColumns> {
        if self.specials.is_empty() {
            None
        } else {
            Some(rng.pick(&self.specials))
        }
    }
}

/// One population tier: which road type and which structure types are
/// active from `min_population` upward.
#[derive(Clone, Debug)]
pub struct TierRule {
    pub min_population: u32,
    pub road_type: String,
    pub structure_types: Vec<String>,
}

/// One weighted entry of the structure demand table.
#[derive(Clone, Debug)]
pub struct DemandEntry {
    pub structure_type: String,
    /// Relative draw weight in the cumulative-chance table.
    pub chance: f64,
    /// Metadata key summed over placed structures to measure how many
    /// villagers this type already accounts for.
    pub capacity_key: String,
}

/// The validated, immutable template store for one planning session.
#[derive(Clone, Debug)]
pub struct TemplateStore {
    palette: Vec<(String, MaterialClass, Option<Facing>)>,
    choices: BTreeMap<String, Vec<Material>>,
    columns: BTreeMap<String, BlockColumn>,
    road_types: BTreeMap<String, RoadType>,
    structures: BTreeMap<String, StructureTemplate>,
    tiers: Vec<TierRule>,
    demand: Vec<DemandEntry>,
}

impl TemplateStore {
    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        let raw: RawStore = serde_json::from_str(json)?;
        Self::resolve(raw)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, TemplateError> {
        let raw: RawStore = serde_json::from_value(value)?;
        Self::resolve(raw)
    }

    pub fn road_type(&self, name: &str) -> Option<&RoadType> {
        self.road_types.get(name)
    }

    pub fn structure(&self, name: &str) -> Option<&StructureTemplate> {
        self.structures.get(name)
    }

    pub fn column(&self, name: &str) -> Option<&BlockColumn> {
        self.columns.get(name)
    }

    /// Resolve a choice table to one of its materials.
    pub fn draw_choice(&self, name: &str, rng: &mut PlanRng) -> Option<Material> {
        self.choices.get(name).map(|mats| *rng.pick(mats))
    }

    pub fn demand_entries(&self) -> &[DemandEntry] {
        &self.demand
    }

    /// The tier active at a population level: the last rule whose
    /// `min_population` is not above it.
    pub fn tier_for(&self, population: u32) -> &TierRule {
        self.tiers
            .iter()
            .rev()
            .find(|t| t.min_population <= population)
            .unwrap_or(&self.tiers[0])
    }

    /// Draw a structure type from the cumulative-chance demand table.
    pub fn draw_demand(&self, rng: &mut PlanRng) -> Option<&DemandEntry> {
        if self.demand.is_empty() {
            return None;
        }
        let total: f64 = self.demand.iter().map(|e| e.chance).sum();
        let mut roll = rng.next_f64() * total;
        for entry in &self.demand {
            roll -= entry.chance;
            if roll < 0.0 {
                return Some(entry);
            }
        }
        self.demand.last()
    }

    fn resolve(raw: RawStore) -> Result<Self, TemplateError> {
        if raw.palette.is_empty() {
            return Err(TemplateError::EmptyPalette);
        }
        if raw.palette.len() > u16::MAX as usize + 1 {
            return Err(TemplateError::PaletteTooLarge(raw.palette.len()));
        }
        if raw.tiers.is_empty() {
            return Err(TemplateError::EmptyTierTable);
        }

        let palette: Vec<(String, MaterialClass, Option<Facing>)> = raw
            .palette
            .into_iter()
            .map(|b| (b.name, b.class, b.facing))
            .collect();

        let lookup = |context: &str, name: &str| -> Result<Material, TemplateError> {
            palette
                .iter()
                .position(|(n, _, _)| n == name)
                .map(|i| Material {
                    block: i as u16,
                    class: palette[i].1,
                    facing: palette[i].2,
                })
                .ok_or_else(|| TemplateError::UnknownBlock {
                    context: context.to_string(),
                    name: name.to_string(),
                })
        };

        let mut choices = BTreeMap::new();
        for (name, blocks) in raw.choices {
            if blocks.is_empty() {
                return Err(TemplateError::EmptyChoice { name });
            }
            let mats = blocks
                .iter()
                .map(|b| lookup(&format!("choice table {name:?}"), b))
                .collect::<Result<Vec<_>, _>>()?;
            choices.insert(name, mats);
        }

        let mut columns = BTreeMap::new();
        for (name, def) in raw.columns {
            let entries = def
                .entries
                .iter()
                .map(|e| {
                    let material = match &e.block {
                        Some(b) => Some(lookup(&format!("column {name:?}"), b)?),
                        None => None,
                    };
                    Ok(ColumnEntry::new(material, e.tag))
                })
                .collect::<Result<Vec<_>, TemplateError>>()?;
            if entries.is_empty() || def.base_level >= entries.len() {
                return Err(TemplateError::InvalidColumn {
                    name,
                    reason: format!("base_level {} out of range", def.base_level),
                });
            }
            columns.insert(name, BlockColumn::new(entries, def.base_level));
        }

        let fetch_column = |context: &str, name: &str| -> Result<BlockColumn, TemplateError> {
            columns
                .get(name)
                .cloned()
                .ok_or_else(|| TemplateError::UnknownColumn {
                    context: context.to_string(),
                    name: name.to_string(),
                })
        };

        let mut specials = BTreeMap::new();
        for (name, def) in raw.specials {
            specials.insert(
                name.clone(),
                SpecialColumns {
                    top: fetch_column(&format!("special {name:?}"), &def.top)?,
                    bottom: fetch_column(&format!("special {name:?}"), &def.bottom)?,
                },
            );
        }

        let mut road_types = BTreeMap::new();
        for (name, def) in raw.road_types {
            let bands = def.column_radii.len();
            if bands == 0 {
                return Err(TemplateError::InvalidRoadType {
                    name,
                    reason: "column_radii must not be empty".to_string(),
                });
            }
            if !def.column_radii.windows(2).all(|w| w[0] < w[1]) {
                return Err(TemplateError::InvalidRoadType {
                    name,
                    reason: "column_radii must be strictly ascending".to_string(),
                });
            }
            if def.same_height_radius > def.junction_radius {
                return Err(TemplateError::InvalidRoadType {
                    name,
                    reason: "same_height_radius exceeds junction_radius".to_string(),
                });
            }
            for (field, list) in [
                ("special_allowed", def.special_allowed.len()),
                ("top_dry", def.top_dry.len()),
                ("top_fluid", def.top_fluid.len()),
                ("bottom_dry", def.bottom_dry.len()),
                ("bottom_fluid", def.bottom_fluid.len()),
            ] {
                if list != bands {
                    return Err(TemplateError::InvalidRoadType {
                        name,
                        reason: format!("{field} has {list} entries for {bands} bands"),
                    });
                }
            }
            let resolve_table = |table: &[String]| -> Result<Vec<BlockColumn>, TemplateError> {
                table
                    .iter()
                    .map(|n| fetch_column(&format!("road type {name:?}"), n))
                    .collect()
            };
            let tier_specials = def
                .specials
                .iter()
                .map(|n| {
                    specials
                        .get(n)
                        .cloned()
                        .ok_or_else(|| TemplateError::UnknownColumn {
                            context: format!("road type {name:?} specials"),
                            name: n.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let road_type = RoadType {
                name: name.clone(),
                junction_radius: def.junction_radius,
                same_height_radius: def.same_height_radius,
                edge_radius: def.edge_radius,
                height_quantum: def.height_quantum,
                column_radii: def.column_radii,
                special_allowed: def.special_allowed,
                special_chance: def.special_chance,
                top_dry: resolve_table(&def.top_dry)?,
                top_fluid: resolve_table(&def.top_fluid)?,
                bottom_dry: resolve_table(&def.bottom_dry)?,
                bottom_fluid: resolve_table(&def.bottom_fluid)?,
                specials: tier_specials,
            };
            road_types.insert(name, road_type);
        }

        let mut structures = BTreeMap::new();
        for (name, def) in raw.structures {
            structures.insert(
                name.clone(),
                resolve_structure(&name, def, &lookup, &choices, &columns)?,
            );
        }

        let mut tiers = raw.tiers;
        tiers.sort_by_key(|t| t.min_population);
        for tier in &tiers {
            if !road_types.contains_key(&tier.road_type) {
                return Err(TemplateError::UnknownRoadType {
                    context: format!("tier at population {}", tier.min_population),
                    name: tier.road_type.clone(),
                });
            }
            for s in &tier.structure_types {
                if !structures.contains_key(s) {
                    return Err(TemplateError::UnknownStructureType {
                        context: format!("tier at population {}", tier.min_population),
                        name: s.clone(),
                    });
                }
            }
        }

        for entry in &raw.demand {
            if !structures.contains_key(&entry.structure_type) {
                return Err(TemplateError::UnknownStructureType {
                    context: "demand table".to_string(),
                    name: entry.structure_type.clone(),
                });
            }
            if !(entry.chance > 0.0) {
                return Err(TemplateError::InvalidDemand {
                    structure_type: entry.structure_type.clone(),
                    reason: "chance must be positive".to_string(),
                });
            }
        }
        let demand = raw
            .demand
            .into_iter()
            .map(|e| DemandEntry {
                structure_type: e.structure_type,
                chance: e.chance,
                capacity_key: e.capacity_key,
            })
            .collect();

        let tiers = tiers
            .into_iter()
            .map(|t| TierRule {
                min_population: t.min_population,
                road_type: t.road_type,
                structure_types: t.structure_types,
            })
            .collect();

        Ok(Self {
            palette,
            choices,
            columns,
            road_types,
            structures,
            tiers,
            demand,
        })
    }

    /// Name of a palette block, for diagnostics.
    pub fn block_name(&self, block: u16) -> Option<&str> {
        self.palette.get(block as usize).map(|(n, _, _)| n.as_str())
    }
}

fn resolve_structure(
    name: &str,
    def: RawStructure,
    lookup: &impl Fn(&str, &str) -> Result<Material, TemplateError>,
    choices: &BTreeMap<String, Vec<Material>>,
    columns: &BTreeMap<String, BlockColumn>,
) -> Result<StructureTemplate, TemplateError> {
    let context = format!("structure {name:?}");
    let invalid = |reason: &str| TemplateError::InvalidStructure {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let size_y = def.layers.len();
    if size_y == 0 {
        return Err(invalid("no layers"));
    }
    let size_z = def.layers[0].len();
    let size_x = def.layers[0].first().map_or(0, |row| row.chars().count());
    if size_z == 0 || size_x == 0 {
        return Err(invalid("empty layer"));
    }
    if def.base_level >= size_y {
        return Err(invalid("base_level out of range"));
    }

    let mut cells = Vec::with_capacity(size_x * size_y * size_z);
    for (y, layer) in def.layers.iter().enumerate() {
        if layer.len() != size_z {
            return Err(invalid(&format!("layer {y} has ragged row count")));
        }
        for (z, row) in layer.iter().enumerate() {
            if row.chars().count() != size_x {
                return Err(invalid(&format!("layer {y} row {z} has ragged length")));
            }
            for token in row.chars() {
                let cell_def =
                    def.key
                        .get(&token.to_string())
                        .ok_or_else(|| TemplateError::InvalidStructure {
                            name: name.to_string(),
                            reason: format!("token {token:?} missing from key"),
                        })?;
                let cell = match (&cell_def.block, &cell_def.choice) {
                    (Some(_), Some(_)) => {
                        return Err(invalid(&format!(
                            "token {token:?} sets both block and choice"
                        )));
                    }
                    (Some(block), None) => TemplateCell::Block(lookup(&context, block)?),
                    (None, Some(choice)) => {
                        if !choices.contains_key(choice) {
                            return Err(TemplateError::UnknownChoice {
                                context: context.clone(),
                                name: choice.clone(),
                            });
                        }
                        TemplateCell::Choice(choice.clone())
                    }
                    (None, None) => TemplateCell::Untouched,
                };
                cells.push(cell);
            }
        }
    }

    let mut points = Vec::new();
    for p in def.points {
        let pos = VoxelPos::new(p.x, p.y, p.z);
        let kind = match p.kind.as_str() {
            "plain" => PoiKind::Plain,
            "sapling" => PoiKind::Sapling,
            "access" => {
                let column_name = p
                    .column
                    .as_deref()
                    .ok_or_else(|| invalid("access point missing column"))?;
                let column = columns.get(column_name).cloned().ok_or_else(|| {
                    TemplateError::UnknownColumn {
                        context: format!("structure {name:?} access point"),
                        name: column_name.to_string(),
                    }
                })?;
                PoiKind::Access {
                    radius: p.radius.unwrap_or(1),
                    column,
                }
            }
            other => {
                return Err(invalid(&format!("unknown point kind {other:?}")));
            }
        };
        points.push(PointOfInterest { pos, kind });
    }

    Ok(StructureTemplate::new(
        name.to_string(),
        (size_x, size_y, size_z),
        def.base_level,
        cells,
        points,
        def.metadata,
    ))
}

// ---------------------------------------------------------------------------
// Raw JSON shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawStore {
    palette: Vec<RawBlock>,
    #[serde(default)]
    choices: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    columns: BTreeMap<String, RawColumn>,
    #[serde(default)]
    specials: BTreeMap<String, RawSpecial>,
    #[serde(default)]
    road_types: BTreeMap<String, RawRoadType>,
    #[serde(default)]
    structures: BTreeMap<String, RawStructure>,
    tiers: Vec<RawTier>,
    #[serde(default)]
    demand: Vec<RawDemand>,
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    name: String,
    class: MaterialClass,
    #[serde(default)]
    facing: Option<Facing>,
}

#[derive(Debug, Deserialize)]
struct RawColumnEntry {
    #[serde(default)]
    block: Option<String>,
    #[serde(default)]
    tag: ColumnTag,
}

#[derive(Debug, Deserialize)]
struct RawColumn {
    entries: Vec<RawColumnEntry>,
    #[serde(default)]
    base_level: usize,
}

#[derive(Debug, Deserialize)]
struct RawSpecial {
    top: String,
    bottom: String,
}

#[derive(Debug, Deserialize)]
struct RawRoadType {
    junction_radius: i32,
    same_height_radius: i32,
    edge_radius: i32,
    height_quantum: i32,
    column_radii: Vec<i32>,
    special_allowed: Vec<bool>,
    #[serde(default = "default_special_chance")]
    special_chance: f64,
    top_dry: Vec<String>,
    top_fluid: Vec<String>,
    bottom_dry: Vec<String>,
    bottom_fluid: Vec<String>,
    #[serde(default)]
    specials: Vec<String>,
}

fn default_special_chance() -> f64 {
    0.15
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    x: i32,
    y: i32,
    z: i32,
    kind: String,
    #[serde(default)]
    radius: Option<i32>,
    #[serde(default)]
    column: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStructure {
    key: BTreeMap<String, RawCell>,
    layers: Vec<Vec<String>>,
    #[serde(default)]
    base_level: usize,
    #[serde(default)]
    points: Vec<RawPoint>,
    #[serde(default)]
    metadata: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    #[serde(default)]
    block: Option<String>,
    #[serde(default)]
    choice: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTier {
    min_population: u32,
    road_type: String,
    structure_types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawDemand {
    structure_type: String,
    chance: f64,
    capacity_key: String,
}

// ---------------------------------------------------------------------------
// Demo store
// ---------------------------------------------------------------------------

impl TemplateStore {
    /// A small self-contained store: one dirt road tier with three bands
    /// and a lantern special, plus a hut with a single access point. Used
    /// by tests and by hosts that want a working planner without authoring
    /// data first.
    pub fn demo() -> TemplateStore {
        TemplateStore::from_json(DEMO_JSON).expect("demo template store must validate")
    }
}

const DEMO_JSON: &str = r#####"{
    "palette": [
        {"name": "gravel", "class": "Stone"},
        {"name": "cobble", "class": "Stone"},
        {"name": "plank", "class": "Wood"},
        {"name": "log", "class": "Wood"},
        {"name": "dirt", "class": "Soil"},
        {"name": "rose", "class": "Plant"},
        {"name": "daisy", "class": "Plant"},
        {"name": "lantern", "class": "Metal"},
        {"name": "stair_n", "class": "Stone", "facing": "North"}
    ],
    "choices": {
        "flowers": ["rose", "daisy"]
    },
    "columns": {
        "plaza": {
            "base_level": 1,
            "entries": [
                {"block": "dirt"},
                {"block": "cobble"},
                {"block": null},
                {"block": null},
                {"block": null}
            ]
        },
        "road_top": {
            "base_level": 0,
            "entries": [
                {"block": "gravel"},
                {"block": null},
                {"block": null},
                {"block": null}
            ]
        },
        "road_bottom": {
            "base_level": 1,
            "entries": [
                {"block": "dirt", "tag": "PillarSeed"},
                {"block": "gravel"}
            ]
        },
        "rim_top": {
            "base_level": 0,
            "entries": [
                {"block": "cobble", "tag": "Sidewalk"},
                {"block": null, "tag": "Arch"},
                {"block": null, "tag": "Arch"}
            ]
        },
        "lantern_top": {
            "base_level": 0,
            "entries": [
                {"block": "cobble"},
                {"block": "log"},
                {"block": "lantern"}
            ]
        },
        "path_top": {
            "base_level": 0,
            "entries": [
                {"block": "gravel"},
                {"block": null},
                {"block": null}
            ]
        }
    },
    "specials": {
        "lantern_post": {"top": "lantern_top", "bottom": "road_bottom"}
    },
    "road_types": {
        "dirt_lane": {
            "junction_radius": 4,
            "same_height_radius": 2,
            "edge_radius": 2,
            "height_quantum": 6,
            "column_radii": [1, 3, 4],
            "special_allowed": [false, false, true],
            "special_chance": 0.2,
            "top_dry": ["plaza", "road_top", "rim_top"],
            "top_fluid": ["plaza", "road_top", "rim_top"],
            "bottom_dry": ["road_bottom", "road_bottom", "road_bottom"],
            "bottom_fluid": ["road_bottom", "road_bottom", "road_bottom"],
            "specials": ["lantern_post"]
        }
    },
    "structures": {
        "hut": {
            "base_level": 0,
            "key": {
                "#": {"block": "plank"},
                "L": {"block": "log"},
                "f": {"choice": "flowers"},
                ".": {}
            },
            "layers": [
                ["L##L", "#..#", "#..#", "L#fL"],
                ["L..L", "....", "....", "L..L"],
                ["####", "####", "####", "####"]
            ],
            "points": [
                {"x": 1, "y": 0, "z": -1, "kind": "access", "radius": 1, "column": "path_top"},
                {"x": 3, "y": 0, "z": 3, "kind": "sapling"},
                {"x": 0, "y": 2, "z": 0, "kind": "plain"}
            ],
            "metadata": {"capacity": 4}
        }
    },
    "tiers": [
        {"min_population": 0, "road_type": "dirt_lane", "structure_types": ["hut"]}
    ],
    "demand": [
        {"structure_type": "hut", "chance": 1.0, "capacity_key": "capacity"}
    ]
}"#####;
