// Road curve geometry — pure math plus terrain sampling.
//
// An edge between two junctions is a straight planar baseline laterally
// displaced by a low-degree polynomial `f(a)` for `a ∈ [0, d]`, where `d`
// is the planar endpoint distance. `f(0) == f(d) == 0` always: endpoints
// lie exactly on the baseline. Coefficients are drawn so the peak offset
// never exceeds a configured fraction of `d` (the degree-3 bound comes from
// the polynomial's analytic local extrema).
//
// Vertical placement is a linear base slope between the endpoint heights
// plus a terrain-adjustment profile: surface heights sampled at fixed
// stations, iteratively smoothed where the local slope deviates from the
// base slope, then de-bumped, with stations inside either junction's
// same-height radius pinned to zero.
//
// Spiral ramps absorb height differences that exceed the road tier's
// vertical quantum: whole loops inserted at the curve midpoint, one
// quantum of height per revolution.
//
// **Critical constraint: determinism.** All draws come from the caller's
// `PlanRng`; terrain sampling is a synchronous world query.

use crate::config::SmoothingParams;
use crate::types::VoxelPos;
use crate::world::{SurfaceMode, World};
use burgwright_prng::PlanRng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Lateral offset polynomial
// ---------------------------------------------------------------------------

/// The lateral-offset polynomial of one edge.
///
/// - degree 1: `f ≡ 0` (straight)
/// - degree 2: `f(a) = c·a·(d−a)`
/// - degree 3: `f(a) = c·a·(d−a)·(e−a)` with `e ∈ [d/3, 2d/3]`
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CurveSpec {
    pub degree: u8,
    pub c: f64,
    pub e: f64,
    /// Straight-line planar distance between the endpoints.
    pub d: f64,
}

impl CurveSpec {
    /// The degenerate straight curve. Spiral-ramp edges are always straight.
    pub fn straight(d: f64) -> Self {
        assert!(d > 0.0, "zero-length edge");
        Self {
            degree: 1,
            c: 0.0,
            e: 0.0,
            d,
        }
    }

    /// Draw a curve of uniformly random degree 1–3 whose peak lateral
    /// offset stays within `max_frac · d`.
    pub fn random(rng: &mut PlanRng, d: f64, max_frac: f64) -> Self {
        assert!(d > 0.0, "zero-length edge");
        match rng.range_u64(1, 4) {
            1 => Self::straight(d),
            2 => Self::random_quadratic(rng, d, max_frac),
            _ => Self::random_cubic(rng, d, max_frac),
        }
    }

    /// Degree 2: the peak sits at `a = d/2` with value `c·d²/4`, so
    /// `|c| ≤ 4·max_frac/d` keeps the offset within the cap.
    pub fn random_quadratic(rng: &mut PlanRng, d: f64, max_frac: f64) -> Self {
        let c_max = 4.0 * max_frac / d;
        Self {
            degree: 2,
            c: rng.range_f64(-c_max, c_max),
            e: 0.0,
            d,
        }
    }

    /// Degree 3: local extrema of `a·(d−a)·(e−a)` sit at
    /// `a* = (d+e)/3 ± sqrt((d+e)² − 3·d·e)/3`; `|c|` is bounded by the
    /// larger extremum magnitude so the same fractional cap holds.
    pub fn random_cubic(rng: &mut PlanRng, d: f64, max_frac: f64) -> Self {
        let e = rng.range_f64(d / 3.0, 2.0 * d / 3.0);
        let mid = (d + e) / 3.0;
        let spread = ((d + e) * (d + e) - 3.0 * d * e).sqrt() / 3.0;
        let g = |a: f64| a * (d - a) * (e - a);
        let peak = g(mid - spread).abs().max(g(mid + spread).abs());
        debug_assert!(peak > 0.0, "degenerate cubic extrema for d={d} e={e}");
        let c_max = max_frac * d / peak;
        Self {
            degree: 3,
            c: rng.range_f64(-c_max, c_max),
            e,
            d,
        }
    }

    /// Lateral offset from the baseline at parameter `a`.
    pub fn offset(&self, a: f64) -> f64 {
        match self.degree {
            1 => 0.0,
            2 => self.c * a * (self.d - a),
            _ => self.c * a * (self.d - a) * (self.e - a),
        }
    }

    /// d/da of `offset` — the curve's planar slope against the baseline,
    /// used to project column anchors onto the curve normal.
    pub fn slope(&self, a: f64) -> f64 {
        match self.degree {
            1 => 0.0,
            2 => self.c * (self.d - 2.0 * a),
            _ => {
                self.c * (self.d * self.e - 2.0 * (self.d + self.e) * a + 3.0 * a * a)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Terrain-adjustment profile
// ---------------------------------------------------------------------------

/// Vertical offsets from the straight-line height, sampled at fixed
/// stations along an edge and smoothed. Linearly interpolated between
/// stations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TerrainProfile {
    stations: Vec<f64>,
    offsets: Vec<f64>,
}

impl TerrainProfile {
    /// The zero profile — used when terrain adjustment is disabled.
    pub fn flat() -> Self {
        Self::default()
    }

    /// Sample and smooth a profile for the baseline `from → to`.
    ///
    /// `pin_from` / `pin_to` are the endpoint junctions' same-height radii:
    /// stations planar-inside either radius keep a zero offset through
    /// every pass.
    #[allow(clippy::too_many_arguments)]
    pub fn sample(
        world: &dyn World,
        from: VoxelPos,
        to: VoxelPos,
        base_slope: f64,
        pin_from: i32,
        pin_to: i32,
        params: &SmoothingParams,
        mode: SurfaceMode,
    ) -> Self {
        let d = from.planar_dist(to);
        if d <= params.station_spacing {
            return Self::flat();
        }
        let ux = (to.x - from.x) as f64 / d;
        let uz = (to.z - from.z) as f64 / d;
        let window = params.window_frac * d;
        let y0 = from.y as f64;

        let count = (d / params.station_spacing).ceil() as usize + 1;
        let mut stations = Vec::with_capacity(count);
        let mut offsets = Vec::with_capacity(count);
        let mut pinned = Vec::with_capacity(count);

        for i in 0..count {
            let a = (i as f64 * params.station_spacing).min(d);
            let line_y = y0 + base_slope * a;
            let probe = VoxelPos::new(
                (from.x as f64 + ux * a).round() as i32,
                0,
                (from.z as f64 + uz * a).round() as i32,
            );
            let pin = i == 0
                || i == count - 1
                || a <= pin_from as f64
                || (d - a) <= pin_to as f64;
            let offset = if pin {
                0.0
            } else {
                world
                    .find_surface(
                        probe,
                        (line_y - window).floor() as i32,
                        (line_y + window).ceil() as i32,
                        mode,
                    )
                    .map(|surface| surface.y as f64 - line_y)
                    .unwrap_or(0.0)
            };
            stations.push(a);
            offsets.push(offset);
            pinned.push(pin);
        }

        // Conditional smoothing: average out any station whose step to a
        // neighbor deviates from the base slope beyond the limit.
        let spacing = params.station_spacing;
        for _ in 0..params.max_passes {
            let mut changed = false;
            for i in 1..count - 1 {
                if pinned[i] {
                    continue;
                }
                let dev_prev = (offsets[i] - offsets[i - 1]) / spacing;
                let dev_next = (offsets[i + 1] - offsets[i]) / spacing;
                if dev_prev.abs() > params.max_slope_deviation
                    || dev_next.abs() > params.max_slope_deviation
                {
                    offsets[i] = 0.5 * (offsets[i - 1] + offsets[i + 1]);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        // One unconditional pass.
        for i in 1..count - 1 {
            if !pinned[i] {
                offsets[i] = 0.5 * (offsets[i - 1] + offsets[i + 1]);
            }
        }

        // Outlier pass: flatten single-station bumps.
        for i in 1..count - 1 {
            if pinned[i] {
                continue;
            }
            let avg = 0.5 * (offsets[i - 1] + offsets[i + 1]);
            if (offsets[i] - avg).abs() > params.bump_threshold {
                offsets[i] = avg;
            }
        }

        Self { stations, offsets }
    }

    /// Offset at parameter `a`, linearly interpolated between stations.
    pub fn offset_at(&self, a: f64) -> f64 {
        if self.stations.len() < 2 {
            return 0.0;
        }
        if a <= self.stations[0] {
            return self.offsets[0];
        }
        for i in 1..self.stations.len() {
            if a <= self.stations[i] {
                let span = self.stations[i] - self.stations[i - 1];
                if span <= f64::EPSILON {
                    return self.offsets[i];
                }
                let t = (a - self.stations[i - 1]) / span;
                return self.offsets[i - 1] * (1.0 - t) + self.offsets[i] * t;
            }
        }
        *self.offsets.last().unwrap()
    }
}

// ---------------------------------------------------------------------------
// Spiral ramps
// ---------------------------------------------------------------------------

/// Which way a spiral ramp winds, seen along the edge direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpiralSide {
    Left,
    Right,
}

/// Spiral-ramp parameters for an edge whose height difference exceeds the
/// road tier's vertical quantum.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SpiralSpec {
    /// Number of full loops inserted at the curve midpoint.
    pub loops: u32,
    /// Winding side, drawn once per edge.
    pub side: SpiralSide,
}

impl SpiralSpec {
    /// `floor(|Δh| / quantum)` loops when `|Δh|` exceeds the quantum,
    /// otherwise no spiral.
    pub fn for_height_diff(dh: f64, quantum: f64, rng: &mut PlanRng) -> Option<Self> {
        if quantum <= 0.0 || dh.abs() <= quantum {
            return None;
        }
        let loops = (dh.abs() / quantum).floor() as u32;
        let side = if rng.chance(0.5) {
            SpiralSide::Left
        } else {
            SpiralSide::Right
        };
        Some(Self { loops, side })
    }

    /// Signed height consumed by the loops; the linear base slope only has
    /// to cover the remainder.
    pub fn consumed_height(&self, dh: f64, quantum: f64) -> f64 {
        quantum * self.loops as f64 * dh.signum()
    }
}
