// Settlement state and the incremental planning state machine.
//
// `SettlementState` is the single source of truth for a growing settlement:
// every junction, edge, access path, and structure, the PRNG, the config,
// cached terrain statistics, and the planner's phase. It is exclusively
// owned by one planner instance; the host calls `update()` once per tick
// and feeds in the population signal via `set_population()`.
//
// The state machine cycles PAUSE → STRUCTURES → ROADS, one phase per
// planner step (steps fire every `config.step_interval(population)` ticks,
// shrinking as the settlement grows):
//
// - PAUSE refreshes cached terrain stats, re-selects the active tier from
//   the population table, and resets the per-cycle road-need counter.
// - STRUCTURES draws one structure type from the demand table; if the
//   placed capacity of that type is below the inflated population target,
//   it attempts a placement. A failed attempt increments road-need — more
//   roads are required before more structures fit.
// - ROADS attempts up to road-need junction placements (capped), each
//   wired to 1–2 existing junctions.
//
// Placement is all-or-nothing: a junction commits only with at least one
// accepted edge (once prior junctions exist), and a structure commits only
// with every access point connected. Failed attempts leave the state
// untouched — infeasibility is an expected, recoverable outcome.
//
// ## Save/load
//
// `SettlementState` derives `Serialize`/`Deserialize`. Derived spatial
// data (bounds, bucket indexes) is `#[serde(skip)]` inside each
// `SpatialFeature` and must be rebuilt after deserialization via
// `rebuild_transient_state()`; `to_json()`/`from_json()` wrap the full
// cycle. The PRNG serializes with the state, so a restored session
// continues the exact planning stream.
//
// **Critical constraint: determinism.** All randomness flows through the
// owned `PlanRng`; entity maps are `BTreeMap`; world queries are
// synchronous reads of the host's grid.

use crate::collision::{self, SpliceCheck};
use crate::config::PlannerConfig;
use crate::feature::SpatialFeature;
use crate::road::{EdgeEndpoint, EdgeSpec, Junction, RoadEdge, build_edge};
use crate::structure::{PoiKind, Structure};
use crate::templates::{DemandEntry, RoadType, TemplateStore};
use crate::types::{Bit, FeatureId, VoxelPos};
use crate::world::World;
use burgwright_prng::PlanRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::TAU;

/// The planner's current phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanPhase {
    Pause,
    Structures,
    Roads,
}

/// Narrative events emitted by `update()` for the host's log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlanEvent {
    TierChanged {
        road_type: String,
    },
    JunctionPlanned {
        id: FeatureId,
        center: VoxelPos,
    },
    EdgePlanned {
        id: FeatureId,
        from: FeatureId,
        to: FeatureId,
    },
    StructurePlanned {
        id: FeatureId,
        structure_type: String,
        access_paths: usize,
    },
    StructureAttemptFailed {
        structure_type: String,
    },
    RoadAttemptFailed,
}

/// Cached position/terrain statistics, refreshed during PAUSE.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainStats {
    /// Search center: the centroid of placed junctions, or the seed origin.
    pub center: VoxelPos,
    /// Mean surface height sampled around the center.
    pub surface_y_mean: f64,
}

/// The mutable aggregate: one settlement, owned by one planner.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SettlementState {
    pub tick: u64,
    pub rng: PlanRng,
    pub config: PlannerConfig,
    pub population: u32,

    next_id: u64,
    phase: PlanPhase,
    road_need: u32,
    ticks_until_step: u64,

    pub junctions: BTreeMap<FeatureId, Junction>,
    pub edges: BTreeMap<FeatureId, RoadEdge>,
    pub access_paths: BTreeMap<FeatureId, RoadEdge>,
    pub structures: BTreeMap<FeatureId, Structure>,

    pub terrain_stats: TerrainStats,
    active_road_type: String,
    active_structures: Vec<String>,
}

impl SettlementState {
    /// A fresh settlement seeded at `origin`.
    pub fn new(seed: u64, config: PlannerConfig, origin: VoxelPos) -> Self {
        Self {
            tick: 0,
            rng: PlanRng::new(seed),
            config,
            population: 0,
            next_id: 1,
            phase: PlanPhase::Pause,
            road_need: 0,
            ticks_until_step: 0,
            junctions: BTreeMap::new(),
            edges: BTreeMap::new(),
            access_paths: BTreeMap::new(),
            structures: BTreeMap::new(),
            terrain_stats: TerrainStats {
                center: origin,
                surface_y_mean: origin.y as f64,
            },
            active_road_type: String::new(),
            active_structures: Vec::new(),
        }
    }

    /// Feed in the growth signal.
    pub fn set_population(&mut self, population: u32) {
        self.population = population;
    }

    fn alloc_id(&mut self) -> FeatureId {
        let id = FeatureId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Advance one host tick. Runs at most one planner phase, bounded
    /// work, to completion — the tick never suspends mid-placement.
    pub fn update(&mut self, world: &mut dyn World, store: &TemplateStore) -> Vec<PlanEvent> {
        self.tick += 1;
        if self.ticks_until_step > 0 {
            self.ticks_until_step -= 1;
            return Vec::new();
        }
        self.ticks_until_step = self.config.step_interval(self.population);

        let mut events = Vec::new();
        match self.phase {
            PlanPhase::Pause => {
                self.do_pause(world, store, &mut events);
                self.phase = PlanPhase::Structures;
            }
            PlanPhase::Structures => {
                self.do_structures(world, store, &mut events);
                self.phase = PlanPhase::Roads;
            }
            PlanPhase::Roads => {
                self.do_roads(world, store, &mut events);
                self.phase = PlanPhase::Pause;
            }
        }
        events
    }

    // -- PAUSE -------------------------------------------------------------

    fn do_pause(&mut self, world: &dyn World, store: &TemplateStore, events: &mut Vec<PlanEvent>) {
        // Search center follows the network's centroid.
        if !self.junctions.is_empty() {
            let (mut sx, mut sy, mut sz) = (0i64, 0i64, 0i64);
            for j in self.junctions.values() {
                sx += j.center.x as i64;
                sy += j.center.y as i64;
                sz += j.center.z as i64;
            }
            let n = self.junctions.len() as i64;
            self.terrain_stats.center =
                VoxelPos::new((sx / n) as i32, (sy / n) as i32, (sz / n) as i32);
        }

        // Mean surface height on a sparse grid around the center.
        let center = self.terrain_stats.center;
        let scan = self.config.surface_scan_range;
        let y_mid = self.terrain_stats.surface_y_mean.round() as i32;
        let mut sum = 0.0;
        let mut count = 0u32;
        for dx in (-16..=16).step_by(8) {
            for dz in (-16..=16).step_by(8) {
                let probe = VoxelPos::new(center.x + dx, 0, center.z + dz);
                if let Some(surface) =
                    world.find_surface(probe, y_mid - scan, y_mid + scan, self.config.surface_mode)
                {
                    sum += surface.y as f64;
                    count += 1;
                }
            }
        }
        if count > 0 {
            self.terrain_stats.surface_y_mean = sum / count as f64;
        }

        // Tier selection from the population table.
        let tier = store.tier_for(self.population);
        if tier.road_type != self.active_road_type {
            self.active_road_type = tier.road_type.clone();
            events.push(PlanEvent::TierChanged {
                road_type: tier.road_type.clone(),
            });
        }
        self.active_structures = tier.structure_types.clone();

        self.road_need = 0;
    }

    // -- STRUCTURES --------------------------------------------------------

    fn do_structures(
        &mut self,
        world: &mut dyn World,
        store: &TemplateStore,
        events: &mut Vec<PlanEvent>,
    ) {
        let Some(entry) = self.draw_tier_demand(store) else {
            return;
        };

        // Villagers already accounted for by this structure type.
        let capacity: f64 = self
            .structures
            .values()
            .filter(|s| s.structure_type == entry.structure_type)
            .filter_map(|s| s.metadata_value(&entry.capacity_key))
            .sum();
        let target = self.population as f64 * self.config.demand_inflation;
        if capacity >= target {
            return;
        }

        let structure_type = entry.structure_type.clone();
        if self.plan_single_structure(world, store, &structure_type, events) {
            log::debug!("planned structure {structure_type}");
        } else {
            // Under-served but nowhere to build: ask for more roads.
            self.road_need += 1;
            events.push(PlanEvent::StructureAttemptFailed { structure_type });
        }
    }

    /// Weighted draw from the demand entries available in the active tier.
    fn draw_tier_demand<'a>(&mut self, store: &'a TemplateStore) -> Option<&'a DemandEntry> {
        let entries: Vec<&DemandEntry> = store
            .demand_entries()
            .iter()
            .filter(|e| self.active_structures.iter().any(|s| *s == e.structure_type))
            .collect();
        if entries.is_empty() {
            return None;
        }
        let total: f64 = entries.iter().map(|e| e.chance).sum();
        let mut roll = self.rng.next_f64() * total;
        for &entry in &entries {
            roll -= entry.chance;
            if roll < 0.0 {
                return Some(entry);
            }
        }
        entries.last().copied()
    }

    // -- ROADS -------------------------------------------------------------

    fn do_roads(
        &mut self,
        world: &mut dyn World,
        store: &TemplateStore,
        events: &mut Vec<PlanEvent>,
    ) {
        let attempts = self.road_need.min(self.config.max_road_plans_per_cycle);
        for _ in 0..attempts {
            if !self.plan_single_junction_with_edges(world, store, events) {
                events.push(PlanEvent::RoadAttemptFailed);
            }
        }
    }

    // -- Junction placement ------------------------------------------------

    /// Expanding-ring search for a junction spot, wired by edge to 1–2
    /// existing junctions. Commits nothing on failure.
    pub fn plan_single_junction_with_edges(
        &mut self,
        world: &mut dyn World,
        store: &TemplateStore,
        events: &mut Vec<PlanEvent>,
    ) -> bool {
        let Some(road_type) = store.road_type(&self.active_road_type) else {
            log::warn!("active road type {:?} missing from store", self.active_road_type);
            return false;
        };

        let search_center = self.terrain_stats.center;
        // Beyond this radius no candidate could reach the network.
        let max_reach = self
            .junctions
            .values()
            .map(|j| search_center.planar_dist(j.center) + self.config.edge_length_max)
            .fold(f64::NAN, f64::max);

        let mut radius = self
            .rng
            .range_f64(self.config.search_radius_min, self.config.search_radius_base);
        let angle_phase = self.rng.range_f64(0.0, TAU);

        loop {
            if !self.junctions.is_empty() && radius > max_reach {
                return false;
            }
            let mut any_candidate = false;
            for step in 0..self.config.search_angle_steps {
                let angle = angle_phase + TAU * step as f64 / self.config.search_angle_steps as f64;
                let Some(candidate) = self.snap_to_surface(world, search_center, radius, angle)
                else {
                    continue;
                };
                any_candidate = true;

                // Junction spacing: the candidate's plaza footprint must not
                // sit on top of an existing junction's.
                if self
                    .junctions
                    .values()
                    .any(|j| j.center.planar_dist(candidate) < self.config.min_junction_spacing)
                {
                    continue;
                }

                let trial = Junction::build(
                    FeatureId(self.next_id),
                    candidate,
                    road_type,
                    world,
                    &mut self.rng,
                    &self.config,
                );
                if self.junction_site_blocked(&trial.feature) {
                    continue;
                }

                // First junction needs no edges.
                if self.junctions.is_empty() {
                    self.commit_junction(world, trial, Vec::new(), events);
                    return true;
                }

                let accepted = self.try_connect(world, &trial, road_type);
                if accepted.is_empty() {
                    continue;
                }
                self.commit_junction(world, trial, accepted, events);
                return true;
            }
            if !any_candidate {
                return false;
            }
            radius += self.config.search_radius_step;
        }
    }

    /// Snap a polar candidate to the nearest valid surface voxel.
    fn snap_to_surface(
        &self,
        world: &dyn World,
        center: VoxelPos,
        radius: f64,
        angle: f64,
    ) -> Option<VoxelPos> {
        let (sin, cos) = angle.sin_cos();
        let probe = VoxelPos::new(
            center.x + (radius * cos).round() as i32,
            0,
            center.z + (radius * sin).round() as i32,
        );
        let y_mid = self.terrain_stats.surface_y_mean.round() as i32;
        let scan = self.config.surface_scan_range;
        world.find_surface(probe, y_mid - scan, y_mid + scan, self.config.surface_mode)
    }

    /// Coarse collision of a junction site against everything that is not
    /// a junction (junction-to-junction closeness is the spacing rule).
    fn junction_site_blocked(&self, feature: &SpatialFeature) -> bool {
        self.structures
            .values()
            .map(|s| &s.feature)
            .chain(self.edges.values().map(|e| &e.feature))
            .chain(self.access_paths.values().map(|p| &p.feature))
            .any(|other| collision::overlaps(feature, other, true))
    }

    /// Try to wire a trial junction to 1–2 existing junctions, shuffled.
    fn try_connect(
        &mut self,
        world: &dyn World,
        trial: &Junction,
        road_type: &RoadType,
    ) -> Vec<RoadEdge> {
        let mut candidates: Vec<FeatureId> = self
            .junctions
            .values()
            .filter(|j| {
                let d = j.center.planar_dist(trial.center);
                d >= self.config.edge_length_min && d <= self.config.edge_length_max
            })
            .map(|j| j.id())
            .collect();
        self.rng.shuffle(&mut candidates);

        let mut accepted: Vec<RoadEdge> = Vec::new();
        for target_id in candidates {
            if accepted.len() >= self.config.max_edges_per_junction_attempt as usize {
                break;
            }
            let target = &self.junctions[&target_id];
            let edge = build_edge(
                EdgeSpec {
                    id: FeatureId(self.next_id + 1 + accepted.len() as u64),
                    from: EdgeEndpoint::of_junction(trial),
                    to: EdgeEndpoint::of_junction(target),
                    radius: road_type.edge_radius,
                    is_access: false,
                    fixed_column: None,
                },
                road_type,
                world,
                &mut self.rng,
                &self.config,
            );
            if edge.slope.abs() > self.config.max_edge_slope {
                continue;
            }
            if self.edge_blocked(&edge, trial.id(), target_id, &accepted) {
                continue;
            }
            accepted.push(edge);
        }
        accepted
    }

    /// An edge candidate is discarded on any collision with existing
    /// structures, junctions (other than its endpoints), edges, access
    /// paths, or edges already accepted in this attempt.
    fn edge_blocked(
        &self,
        edge: &RoadEdge,
        from_id: FeatureId,
        to_id: FeatureId,
        accepted: &[RoadEdge],
    ) -> bool {
        if self
            .structures
            .values()
            .any(|s| collision::overlaps(&edge.feature, &s.feature, true))
        {
            return true;
        }
        if self
            .junctions
            .values()
            .filter(|j| j.id() != from_id && j.id() != to_id)
            .any(|j| collision::overlaps(&edge.feature, &j.feature, true))
        {
            return true;
        }
        if self
            .edges
            .values()
            .chain(self.access_paths.values())
            .any(|e| collision::edges_overlap(edge, e))
        {
            return true;
        }
        accepted.iter().any(|e| collision::edges_overlap(edge, e))
    }

    fn commit_junction(
        &mut self,
        world: &mut dyn World,
        junction: Junction,
        edges: Vec<RoadEdge>,
        events: &mut Vec<PlanEvent>,
    ) {
        let junction_id = self.alloc_id();
        debug_assert_eq!(junction_id, junction.feature.id);
        apply_bits(world, junction.feature.bits());
        grow_pillars(world, &junction.meta.pillar_seeds);
        events.push(PlanEvent::JunctionPlanned {
            id: junction_id,
            center: junction.center,
        });
        self.junctions.insert(junction_id, junction);

        for edge in edges {
            let edge_id = self.alloc_id();
            debug_assert_eq!(edge_id, edge.feature.id);
            apply_bits(world, edge.feature.bits());
            grow_pillars(world, &edge.meta.pillar_seeds);
            if let crate::road::EdgeEndpoints::Network { from, to } = edge.endpoints {
                events.push(PlanEvent::EdgePlanned {
                    id: edge_id,
                    from,
                    to,
                });
            }
            self.edges.insert(edge_id, edge);
        }
    }

    // -- Structure placement -----------------------------------------------

    /// Ring search for a structure spot near the road network; on success
    /// all access points are wired in, all-or-nothing.
    pub fn plan_single_structure(
        &mut self,
        world: &mut dyn World,
        store: &TemplateStore,
        structure_type: &str,
        events: &mut Vec<PlanEvent>,
    ) -> bool {
        let Some(template) = store.structure(structure_type) else {
            log::warn!("structure type {structure_type:?} missing from store");
            return false;
        };
        let Some(road_type) = store.road_type(&self.active_road_type) else {
            return false;
        };

        let search_center = self.terrain_stats.center;
        let max_reach = self
            .junctions
            .values()
            .map(|j| {
                search_center.planar_dist(j.center) + self.config.structure_closeness_dist
            })
            .fold(f64::NAN, f64::max);

        let mut radius = self
            .rng
            .range_f64(self.config.search_radius_min, self.config.search_radius_base);
        let angle_phase = self.rng.range_f64(0.0, TAU);

        loop {
            if self.junctions.is_empty() || radius > max_reach {
                return false;
            }
            let mut any_candidate = false;
            for step in 0..self.config.search_angle_steps {
                let angle = angle_phase + TAU * step as f64 / self.config.search_angle_steps as f64;
                let Some(surface) = self.snap_to_surface(world, search_center, radius, angle)
                else {
                    continue;
                };
                any_candidate = true;

                // The spot must be served by roads already.
                let nearby = self
                    .junctions
                    .values()
                    .filter(|j| {
                        j.center.planar_dist(surface) <= self.config.structure_closeness_dist
                    })
                    .count() as u32;
                if nearby < self.config.min_junctions_near_structure {
                    continue;
                }

                let trial = Structure::instantiate(
                    FeatureId(self.next_id),
                    template,
                    surface.up(1),
                    store,
                    &mut self.rng,
                    self.config.coarse_bucket_edge,
                    self.config.fine_bucket_edge,
                );
                if self.structure_site_blocked(&trial.feature) {
                    continue;
                }

                let Some(paths) = self.connect_access_points(world, &trial, road_type) else {
                    continue;
                };
                self.commit_structure(world, trial, paths, events);
                return true;
            }
            if !any_candidate {
                return false;
            }
            radius += self.config.search_radius_step;
        }
    }

    fn structure_site_blocked(&self, feature: &SpatialFeature) -> bool {
        self.structures
            .values()
            .map(|s| &s.feature)
            .chain(self.junctions.values().map(|j| &j.feature))
            .chain(self.edges.values().map(|e| &e.feature))
            .chain(self.access_paths.values().map(|p| &p.feature))
            .any(|other| collision::overlaps(feature, other, true))
    }

    /// Wire every access point of a trial structure to the road network.
    /// Returns the trial paths on success; `None` rejects the whole
    /// placement (no partial state is ever visible).
    fn connect_access_points(
        &mut self,
        world: &dyn World,
        structure: &Structure,
        road_type: &RoadType,
    ) -> Option<Vec<RoadEdge>> {
        let mut planned: Vec<RoadEdge> = Vec::new();

        let access_points: Vec<_> = structure.access_points().cloned().collect();
        for (point_idx, point) in access_points.iter().enumerate() {
            let PoiKind::Access { radius, column } = &point.kind else {
                unreachable!("access_points() filters on Access");
            };

            // All road dots within reach, nearest first.
            let mut dots: Vec<VoxelPos> = self
                .edges
                .values()
                .chain(self.access_paths.values())
                .flat_map(|e| e.road_dots.iter().copied())
                .chain(planned.iter().flat_map(|p| p.road_dots.iter().copied()))
                .filter(|dot| {
                    let d = dot.planar_dist(point.pos);
                    d > 0.0 && d <= self.config.max_access_path_length
                })
                .collect();

            let mut connected = false;
            for _ in 0..self.config.access_attempts_per_point {
                if dots.is_empty() {
                    break;
                }
                // Nearest unfailed dot.
                let (best_idx, _) = dots
                    .iter()
                    .enumerate()
                    .map(|(i, dot)| (i, dot.planar_dist(point.pos)))
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .expect("dots is non-empty");
                let dot = dots.swap_remove(best_idx);

                let mut path = build_edge(
                    EdgeSpec {
                        id: FeatureId(self.next_id + 1 + planned.len() as u64),
                        from: EdgeEndpoint::access(point.pos, *radius),
                        to: EdgeEndpoint::access(dot, *radius),
                        radius: *radius,
                        is_access: true,
                        fixed_column: Some(column),
                    },
                    road_type,
                    world,
                    &mut self.rng,
                    &self.config,
                );
                if path.slope.abs() > self.config.max_edge_slope {
                    continue;
                }
                if self.validate_access_path(&mut path, structure, &planned) {
                    planned.push(path);
                    connected = true;
                    break;
                }
            }
            if !connected {
                log::debug!(
                    "access point {point_idx} of {} found no path",
                    structure.structure_type
                );
                return None;
            }
        }
        Some(planned)
    }

    /// Validate one trial path: splice against every edge and access path,
    /// material-aware overlap against every other structure, coarse overlap
    /// against every junction. Compatible coincidences are deleted from the
    /// path (graceful merge).
    fn validate_access_path(
        &self,
        path: &mut RoadEdge,
        structure: &Structure,
        planned: &[RoadEdge],
    ) -> bool {
        let mut prune: Vec<VoxelPos> = Vec::new();
        for other in self
            .edges
            .values()
            .chain(self.access_paths.values())
            .chain(planned.iter())
        {
            match collision::access_path_splices(&path.feature, &other.feature) {
                SpliceCheck::Collision => return false,
                SpliceCheck::Merge(positions) => prune.extend(positions),
            }
        }
        for other in self.structures.values() {
            if other.feature.id == structure.feature.id {
                continue;
            }
            if collision::overlaps_ignoring_matching_material(&path.feature, &other.feature) {
                return false;
            }
        }
        for junction in self.junctions.values() {
            if collision::overlaps(&path.feature, &junction.feature, true) {
                return false;
            }
        }
        if !prune.is_empty() {
            path.remove_bits(&prune);
        }
        true
    }

    fn commit_structure(
        &mut self,
        world: &mut dyn World,
        structure: Structure,
        paths: Vec<RoadEdge>,
        events: &mut Vec<PlanEvent>,
    ) {
        let structure_id = self.alloc_id();
        debug_assert_eq!(structure_id, structure.feature.id);
        apply_bits(world, structure.feature.bits());
        events.push(PlanEvent::StructurePlanned {
            id: structure_id,
            structure_type: structure.structure_type.clone(),
            access_paths: paths.len(),
        });
        self.structures.insert(structure_id, structure);

        for path in paths {
            let path_id = self.alloc_id();
            debug_assert_eq!(path_id, path.feature.id);
            apply_bits(world, path.feature.bits());
            grow_pillars(world, &path.meta.pillar_seeds);
            self.access_paths.insert(path_id, path);
        }
    }

    // -- Persistence -------------------------------------------------------

    /// Rebuild all derived (`#[serde(skip)]`) spatial data after
    /// deserialization.
    pub fn rebuild_transient_state(&mut self) {
        for j in self.junctions.values_mut() {
            j.feature.rebuild_transient();
        }
        for e in self.edges.values_mut() {
            e.feature.rebuild_transient();
        }
        for p in self.access_paths.values_mut() {
            p.feature.rebuild_transient();
        }
        for s in self.structures.values_mut() {
            s.feature.rebuild_transient();
        }
    }

    /// Serialize the settlement to a JSON snapshot.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore a settlement from a JSON snapshot and rebuild derived
    /// spatial data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut state: SettlementState = serde_json::from_str(json)?;
        state.rebuild_transient_state();
        Ok(state)
    }

    /// Total features placed, for host dashboards.
    pub fn feature_count(&self) -> usize {
        self.junctions.len() + self.edges.len() + self.access_paths.len() + self.structures.len()
    }
}

/// Write a committed feature's bits into the world. Bits with no material
/// claim space without altering the world.
fn apply_bits(world: &mut dyn World, bits: &[Bit]) {
    for bit in bits {
        if let Some(material) = bit.material {
            world.set_material(bit.pos, Some(material));
        }
    }
}

/// Continue pillar-seed bits downward until solid ground, bounded.
fn grow_pillars(world: &mut dyn World, seeds: &[Bit]) {
    const MAX_PILLAR_DEPTH: i32 = 24;
    for seed in seeds {
        let Some(material) = seed.material else {
            continue;
        };
        for dy in 1..=MAX_PILLAR_DEPTH {
            let below = seed.pos.up(-dy);
            let open = world.material(below).is_none() || world.is_fluid(below);
            if !open {
                break;
            }
            world.set_material(below, Some(material));
        }
    }
}
