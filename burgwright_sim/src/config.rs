// Data-driven planner configuration.
//
// All tunable parameters live here in `PlannerConfig`, loaded from JSON at
// startup and never mutated during a planning session. The planner reads
// every threshold, spacing, and cadence value from the config — no magic
// numbers in the search or generation code. This enables balance iteration
// without recompilation, and a snapshot taken under one config resumes
// identically under the same config.
//
// Road geometry that varies per road tier (junction radius, column tables,
// spiral quantum) lives in the template data instead — see `templates.rs`.
//
// **Critical constraint: determinism.** Config values feed directly into
// planning logic. Identical seed + config + templates means identical
// settlements.

use crate::world::SurfaceMode;
use serde::{Deserialize, Serialize};

/// Parameters of the terrain-adjustment smoothing applied to edge profiles.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SmoothingParams {
    /// Planar distance between sampled stations along an edge.
    pub station_spacing: f64,
    /// Surface samples are clamped to ±(window_frac · d) around the
    /// straight-line height.
    pub window_frac: f64,
    /// Upper bound on conditional smoothing passes.
    pub max_passes: u32,
    /// A station whose offset step to a neighbor exceeds this (per voxel of
    /// station spacing) gets averaged with its neighbors.
    pub max_slope_deviation: f64,
    /// Final outlier pass: a station differing from the average of its two
    /// neighbors by more than this is replaced by that average.
    pub bump_threshold: f64,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            station_spacing: 4.0,
            window_frac: 0.2,
            max_passes: 100,
            max_slope_deviation: 0.6,
            bump_threshold: 1.5,
        }
    }
}

/// Top-level planner configuration. Loaded from JSON, never mutated at
/// runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlannerConfig {
    // -- Spatial index -----------------------------------------------------
    /// Edge length of the coarse (mega-chunk) bucket cells.
    pub coarse_bucket_edge: i32,
    /// Edge length of the fine bucket cells.
    pub fine_bucket_edge: i32,

    // -- Curve generation --------------------------------------------------
    /// Cap on a network edge's lateral offset, as a fraction of the
    /// endpoint distance.
    pub curve_max_offset_frac: f64,
    /// Same cap for structure access paths (slightly looser, so paths can
    /// swing around obstacles).
    pub access_curve_max_offset_frac: f64,
    /// Parameter step when walking an edge's centerline.
    pub edge_walk_step: f64,
    /// Planar spacing between road dots emitted along an edge.
    pub road_dot_spacing: f64,
    /// Planar interval between terrain re-classification samples along an
    /// edge (outside both junctions' outer radius).
    pub terrain_check_interval: f64,
    /// Planar interval at which special columns become eligible.
    pub special_column_interval: f64,
    /// Terrain smoothing applied to every terrain-following edge.
    pub smoothing: SmoothingParams,

    // -- Spiral ramps ------------------------------------------------------
    /// Winding radius of spiral ramp loops.
    pub spiral_radius: f64,
    /// Planar advance along the main axis per spiral revolution.
    pub spiral_axial_advance: f64,

    // -- Candidate search --------------------------------------------------
    /// The ring search starts at a random radius in
    /// `[search_radius_min, search_radius_base)`.
    pub search_radius_min: f64,
    pub search_radius_base: f64,
    /// Radius growth after a fully failed sweep.
    pub search_radius_step: f64,
    /// Angle steps per full-circle sweep.
    pub search_angle_steps: u32,
    /// Half-height of the vertical window scanned when snapping candidates
    /// to the surface, centered on the cached mean surface height.
    pub surface_scan_range: i32,
    /// How fluid tops are treated when snapping to the surface — the
    /// settlement style knob (coastal builds on water, drowned under it).
    pub surface_mode: SurfaceMode,
    /// Minimum planar distance between junction centers.
    pub min_junction_spacing: f64,
    /// Allowed planar length band for new network edges.
    pub edge_length_min: f64,
    pub edge_length_max: f64,
    /// Maximum |vertical slope| for any edge or access path.
    pub max_edge_slope: f64,
    /// How many existing junctions a new junction tries to connect to.
    pub max_edges_per_junction_attempt: u32,
    /// A structure spot must see at least this many junctions...
    pub min_junctions_near_structure: u32,
    /// ...within this planar distance, before it is even attempted.
    pub structure_closeness_dist: f64,
    /// Maximum planar length of a structure access path.
    pub max_access_path_length: f64,
    /// Road-dot candidates tried per access point before giving up.
    pub access_attempts_per_point: u32,
    /// Cap on junction attempts per ROADS phase cycle.
    pub max_road_plans_per_cycle: u32,

    // -- Cadence -----------------------------------------------------------
    /// Ticks between planner steps at population 0.
    pub base_step_interval_ticks: u64,
    /// Floor on the step interval as population grows.
    pub min_step_interval_ticks: u64,
    /// Every this many villagers halves the interval.
    pub population_per_speedup: u32,

    // -- Demand ------------------------------------------------------------
    /// Structures are planned toward `population * demand_inflation`
    /// capacity, so growth stays slightly ahead of the signal.
    pub demand_inflation: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            coarse_bucket_edge: 16,
            fine_bucket_edge: 4,

            curve_max_offset_frac: 0.3,
            access_curve_max_offset_frac: 0.4,
            edge_walk_step: 0.5,
            road_dot_spacing: 2.5,
            terrain_check_interval: 6.0,
            special_column_interval: 5.0,
            smoothing: SmoothingParams::default(),

            spiral_radius: 4.0,
            spiral_axial_advance: 2.0,

            search_radius_min: 8.0,
            search_radius_base: 24.0,
            search_radius_step: 8.0,
            search_angle_steps: 16,
            surface_scan_range: 32,
            surface_mode: SurfaceMode::FluidAsGround,
            min_junction_spacing: 12.0,
            edge_length_min: 10.0,
            edge_length_max: 40.0,
            max_edge_slope: 0.5,
            max_edges_per_junction_attempt: 2,
            min_junctions_near_structure: 1,
            structure_closeness_dist: 24.0,
            max_access_path_length: 20.0,
            access_attempts_per_point: 8,
            max_road_plans_per_cycle: 3,

            base_step_interval_ticks: 200,
            min_step_interval_ticks: 20,
            population_per_speedup: 16,

            demand_inflation: 1.25,
        }
    }
}

impl PlannerConfig {
    /// The planner step interval for a given population. Halves every
    /// `population_per_speedup` villagers, floored at
    /// `min_step_interval_ticks`.
    pub fn step_interval(&self, population: u32) -> u64 {
        let speedups = (population / self.population_per_speedup.max(1)) as u64;
        let halvings = self.base_step_interval_ticks >> speedups.min(8);
        halvings.max(self.min_step_interval_ticks)
    }
}
