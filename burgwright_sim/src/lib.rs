// burgwright_sim — pure Rust settlement-planning library.
//
// This crate grows a settlement (roads, junctions, structures) inside a
// voxel world, incrementally and forever, reacting to a single population
// signal. It has zero engine dependencies and runs headless: the host
// feeds it a `World` implementation and a validated `TemplateStore`, ticks
// `SettlementState::update()`, and reads back `PlanEvent`s.
//
// Module overview:
// - `types.rs`:     VoxelPos, Rotation/Facing, Material, Bit, FeatureId.
// - `world.rs`:     The World Oracle trait + dense in-memory `GridWorld`.
// - `feature.rs`:   SpatialFeature — bit sets with bound + bucket indexes.
// - `column.rs`:    Vertical block-column stamps, tags, merge, rotation.
// - `curve.rs`:     Polynomial road curves, terrain smoothing, spirals.
// - `road.rs`:      Junction/RoadEdge construction from column templates.
// - `structure.rs`: Structure templates, placement, points of interest.
// - `collision.rs`: Pairwise overlap predicates, splice checks.
// - `templates.rs`: TemplateStore — JSON load + validation, tiers, demand.
// - `planner.rs`:   SettlementState + the PAUSE→STRUCTURES→ROADS machine.
// - `config.rs`:    PlannerConfig — every tunable scalar.
// - `prng`:         Re-exported from `burgwright_prng` — xoshiro256++ with
//                   SplitMix64 seeding.
//
// **Critical constraint: determinism.** Planning is a pure function:
// `(state, world, templates) -> (new_state, events)`. All randomness comes
// from the seeded `PlanRng` owned by the state; entity maps are `BTreeMap`;
// transient hash indexes use fixed-seed hashers. Same seed + same world +
// same templates means the same settlement, before or after a
// snapshot/restore.

pub mod collision;
pub mod column;
pub mod config;
pub mod curve;
pub mod feature;
pub mod planner;
pub use burgwright_prng as prng;
pub mod road;
pub mod structure;
pub mod templates;
pub mod types;
pub mod world;
