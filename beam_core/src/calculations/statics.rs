//! Simply-Supported Beam Statics
//!
//! Solves the two support reactions of a single-span beam under point
//! loads and builds the exact piecewise shear and moment functions.
//!
//! ## Sign Convention
//! - Forces (loads and reactions): upward positive
//! - Shear just right of `x`: sum of all forces at or left of `x`
//! - Moment: sagging positive, `M(x) = Σ F·(x − a)` over forces left of `x`
//!
//! With this convention the equilibrium equations are
//! `R0 + RL + ΣP = 0` and `RL·L + ΣP·a = 0`.
//!
//! ## Example
//! ```rust
//! use beam_core::calculations::statics::solve;
//! use beam_core::loads::PointLoad;
//!
//! // 6 m beam, two downward 10 kN loads
//! let model = solve(6.0, &[PointLoad::new(2.0, -10.0), PointLoad::new(4.0, -10.0)]).unwrap();
//! assert!((model.left_reaction() - 10.0).abs() < 1e-9);
//! assert!((model.right_reaction() - 10.0).abs() < 1e-9);
//!
//! let diagram = model.diagram();
//! assert!((diagram.moment_at(2.0) - 20.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{CalcError, CalcResult};
use crate::loads::{sort_by_position, PointLoad};

/// A support and its solved vertical reaction (upward positive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Support {
    pub position: f64,
    pub reaction: f64,
}

/// Solved single-span beam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamModel {
    /// Span between the two supports
    pub length: f64,
    /// Point loads, ascending by position; coincident loads kept separate
    pub loads: Vec<PointLoad>,
    /// Left support at 0, right support at `length`
    pub supports: [Support; 2],
}

impl BeamModel {
    /// Reaction at x = 0
    pub fn left_reaction(&self) -> f64 {
        self.supports[0].reaction
    }

    /// Reaction at x = length
    pub fn right_reaction(&self) -> f64 {
        self.supports[1].reaction
    }

    /// Sum of load magnitudes
    pub fn total_load(&self) -> f64 {
        self.loads.iter().map(|l| l.magnitude).sum()
    }

    /// Force magnitude used to scale tolerances (never below 1)
    pub fn force_scale(&self) -> f64 {
        self.loads
            .iter()
            .map(|l| l.magnitude.abs())
            .sum::<f64>()
            .max(1.0)
    }

    /// Build the piecewise shear/moment functions.
    pub fn diagram(&self) -> PiecewiseDiagram {
        PiecewiseDiagram::from_model(self)
    }

    /// Residuals of every statics identity the model should satisfy.
    pub fn residuals(&self) -> EquilibriumResiduals {
        let r0 = self.left_reaction();
        let rl = self.right_reaction();
        let diagram = self.diagram();

        let loads_at_end: f64 = self
            .loads
            .iter()
            .filter(|l| l.position == self.length)
            .map(|l| l.magnitude)
            .sum();

        EquilibriumResiduals {
            force: r0 + rl + self.total_load(),
            moment: rl * self.length
                + self.loads.iter().map(PointLoad::moment_about_origin).sum::<f64>(),
            end_shear: diagram.shear_left_of(self.length) + loads_at_end + rl,
            start_moment: diagram.moment_at(0.0),
            end_moment: diagram.moment_at(self.length),
        }
    }
}

/// How far a solved model is from exact equilibrium.
///
/// All values are zero in exact arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumResiduals {
    /// R0 + RL + ΣP
    pub force: f64,
    /// RL·L + ΣP·a
    pub moment: f64,
    /// Shear just left of L, plus loads at L, plus RL
    pub end_shear: f64,
    /// M(0)
    pub start_moment: f64,
    /// M(L)
    pub end_moment: f64,
}

impl EquilibriumResiduals {
    /// True when every residual is within `tolerance` relative to the
    /// beam's force scale (and force scale × length for moments).
    pub fn within(&self, tolerance: f64, force_scale: f64, length: f64) -> bool {
        let force_tol = tolerance * force_scale;
        let moment_tol = tolerance * force_scale * length.max(1.0);
        self.force.abs() <= force_tol
            && self.end_shear.abs() <= force_tol
            && self.moment.abs() <= moment_tol
            && self.start_moment.abs() <= moment_tol
            && self.end_moment.abs() <= moment_tol
    }
}

/// Solve reactions for a simply-supported beam.
///
/// Loads may arrive in any order; the returned model holds them sorted.
///
/// # Errors
///
/// * `InvalidData` - `length` is not a positive finite number, or a load
///   value is not finite
/// * `OutOfRangeLoad` - a load lies outside `[0, length]`
pub fn solve(length: f64, loads: &[PointLoad]) -> CalcResult<BeamModel> {
    if !length.is_finite() || length <= 0.0 {
        return Err(CalcError::invalid_value(
            "length",
            length.to_string(),
            "Beam length must be a positive number",
        ));
    }

    for load in loads {
        if !load.position.is_finite() || !load.magnitude.is_finite() {
            return Err(CalcError::invalid_value(
                "load",
                format!("({}, {})", load.position, load.magnitude),
                "Load position and magnitude must be finite",
            ));
        }
        if load.position < 0.0 || load.position > length {
            return Err(CalcError::out_of_range_load(load.position, length));
        }
    }

    let mut sorted = loads.to_vec();
    sort_by_position(&mut sorted);

    // Moments about x = 0 give RL directly; vertical balance gives R0
    let sum_forces: f64 = sorted.iter().map(|l| l.magnitude).sum();
    let sum_moments: f64 = sorted.iter().map(PointLoad::moment_about_origin).sum();
    let right = -sum_moments / length;
    let left = -sum_forces - right;

    info!(length, loads = sorted.len(), r0 = left, rl = right, "solved support reactions");

    Ok(BeamModel {
        length,
        loads: sorted,
        supports: [
            Support {
                position: 0.0,
                reaction: left,
            },
            Support {
                position: length,
                reaction: right,
            },
        ],
    })
}

/// Like [`solve`], then warn if the solution drifts past `tolerance`.
pub fn solve_checked(length: f64, loads: &[PointLoad], tolerance: f64) -> CalcResult<BeamModel> {
    let model = solve(length, loads)?;
    let residuals = model.residuals();
    if !residuals.within(tolerance, model.force_scale(), model.length) {
        warn!(?residuals, "equilibrium residuals exceed tolerance");
    }
    Ok(model)
}

// ============================================================================
// Piecewise functions
// ============================================================================

/// One interval between consecutive load stations.
///
/// Shear is constant on `(start, end)` and moment is linear.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub shear: f64,
    /// Moment at `start`
    pub moment_start: f64,
}

impl Segment {
    /// Moment at `x` inside the segment
    pub fn moment_at(&self, x: f64) -> f64 {
        self.moment_start + self.shear * (x - self.start)
    }

    /// Moment at `end`
    pub fn moment_end(&self) -> f64 {
        self.moment_at(self.end)
    }
}

/// Exact shear (step) and moment (piecewise-linear) functions of a beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiecewiseDiagram {
    pub length: f64,
    /// Contiguous segments covering `[0, length]`
    pub segments: Vec<Segment>,
    /// Distinct x values where shear may jump: 0, load positions, length
    pub stations: Vec<f64>,
}

impl PiecewiseDiagram {
    /// Integrate the model's forces left to right.
    pub fn from_model(model: &BeamModel) -> Self {
        let length = model.length;

        let mut stations: Vec<f64> = Vec::with_capacity(model.loads.len() + 2);
        stations.push(0.0);
        stations.extend(model.loads.iter().map(|l| l.position));
        stations.push(length);
        stations.dedup();

        let load_sum_at = |x: f64| -> f64 {
            model
                .loads
                .iter()
                .filter(|l| l.position == x)
                .map(|l| l.magnitude)
                .sum()
        };

        let mut shear = model.left_reaction() + load_sum_at(0.0);
        let mut moment = 0.0;
        let mut segments = Vec::with_capacity(stations.len().saturating_sub(1));

        for pair in stations.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let segment = Segment {
                start,
                end,
                shear,
                moment_start: moment,
            };
            moment = segment.moment_end();
            shear += load_sum_at(end);
            segments.push(segment);
        }

        PiecewiseDiagram {
            length,
            segments,
            stations,
        }
    }

    /// Segment whose half-open interval `[start, end)` holds `x`
    fn segment_from(&self, x: f64) -> Option<&Segment> {
        self.segments.iter().find(|s| s.start <= x && x < s.end)
    }

    /// Segment whose half-open interval `(start, end]` holds `x`
    fn segment_until(&self, x: f64) -> Option<&Segment> {
        self.segments.iter().find(|s| s.start < x && x <= s.end)
    }

    /// Shear immediately left of `x` (0 at and before the left support)
    pub fn shear_left_of(&self, x: f64) -> f64 {
        self.segment_until(x).map_or(0.0, |s| s.shear)
    }

    /// Shear immediately right of `x` (0 at and past the right support)
    pub fn shear_right_of(&self, x: f64) -> f64 {
        self.segment_from(x).map_or(0.0, |s| s.shear)
    }

    /// Bending moment at `x`; continuous, so no side is needed
    pub fn moment_at(&self, x: f64) -> f64 {
        if let Some(s) = self.segment_from(x) {
            s.moment_at(x)
        } else if let Some(s) = self.segment_until(x) {
            s.moment_at(x)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TOL: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * b.abs().max(1.0)
    }

    fn two_load_beam() -> BeamModel {
        solve(6.0, &[PointLoad::new(4.0, -10.0), PointLoad::new(2.0, -10.0)]).unwrap()
    }

    #[test]
    fn test_symmetric_reactions() {
        let model = two_load_beam();
        assert!(approx_eq(model.left_reaction(), 10.0, TOL));
        assert!(approx_eq(model.right_reaction(), 10.0, TOL));
        assert_eq!(model.supports[0].position, 0.0);
        assert_eq!(model.supports[1].position, 6.0);
        // Sorted on the way in
        assert_eq!(model.loads[0].position, 2.0);
    }

    #[test]
    fn test_asymmetric_reactions() {
        // 10 m beam, 1000 down at 3 m: R0 = P(L-a)/L = 700, RL = Pa/L = 300
        let model = solve(10.0, &[PointLoad::downward(3.0, 1000.0)]).unwrap();
        assert!(approx_eq(model.left_reaction(), 700.0, TOL));
        assert!(approx_eq(model.right_reaction(), 300.0, TOL));
    }

    #[test]
    fn test_shear_steps() {
        let d = two_load_beam().diagram();
        assert_eq!(d.shear_left_of(0.0), 0.0);
        assert!(approx_eq(d.shear_right_of(0.0), 10.0, TOL));
        assert!(approx_eq(d.shear_left_of(2.0), 10.0, TOL));
        assert!(approx_eq(d.shear_right_of(2.0), 0.0, TOL));
        assert!(approx_eq(d.shear_right_of(4.0), -10.0, TOL));
        assert!(approx_eq(d.shear_left_of(6.0), -10.0, TOL));
        assert_eq!(d.shear_right_of(6.0), 0.0);
    }

    #[test]
    fn test_moment_diagram() {
        let d = two_load_beam().diagram();
        assert!(approx_eq(d.moment_at(0.0), 0.0, TOL));
        assert!(approx_eq(d.moment_at(1.0), 10.0, TOL));
        assert!(approx_eq(d.moment_at(2.0), 20.0, TOL));
        assert!(approx_eq(d.moment_at(3.0), 20.0, TOL));
        assert!(approx_eq(d.moment_at(4.0), 20.0, TOL));
        assert!(approx_eq(d.moment_at(6.0), 0.0, TOL));
        assert_eq!(d.stations, vec![0.0, 2.0, 4.0, 6.0]);
        assert_eq!(d.segments.len(), 3);
    }

    #[test]
    fn test_midspan_point_load() {
        // M_max = PL/4
        let d = solve(10.0, &[PointLoad::downward(5.0, 1000.0)]).unwrap().diagram();
        assert!(approx_eq(d.moment_at(5.0), 2500.0, TOL));
    }

    #[test]
    fn test_no_loads() {
        let model = solve(5.0, &[]).unwrap();
        assert_eq!(model.left_reaction(), 0.0);
        assert_eq!(model.right_reaction(), 0.0);
        let d = model.diagram();
        assert_eq!(d.segments.len(), 1);
        assert_eq!(d.moment_at(2.5), 0.0);
    }

    #[test]
    fn test_loads_on_supports() {
        let model = solve(4.0, &[PointLoad::new(0.0, -3.0), PointLoad::new(4.0, -5.0)]).unwrap();
        assert!(approx_eq(model.left_reaction(), 3.0, TOL));
        assert!(approx_eq(model.right_reaction(), 5.0, TOL));
        let d = model.diagram();
        // Load sits on the support, so nothing passes through the span
        assert!(approx_eq(d.shear_right_of(0.0), 0.0, TOL));
        assert!(approx_eq(d.moment_at(2.0), 0.0, TOL));
        assert!(model.residuals().within(TOL, model.force_scale(), model.length));
    }

    #[test]
    fn test_coincident_loads_kept() {
        let model = solve(6.0, &[PointLoad::new(3.0, -4.0), PointLoad::new(3.0, -6.0)]).unwrap();
        assert_eq!(model.loads.len(), 2);
        let d = model.diagram();
        assert_eq!(d.stations, vec![0.0, 3.0, 6.0]);
        assert!(approx_eq(d.shear_right_of(3.0), -5.0, TOL));
    }

    #[test]
    fn test_out_of_range_load() {
        let err = solve(6.0, &[PointLoad::new(7.0, -10.0)]).unwrap_err();
        assert_eq!(err, CalcError::out_of_range_load(7.0, 6.0));

        let err = solve(6.0, &[PointLoad::new(-0.5, -10.0)]).unwrap_err();
        assert_eq!(err.error_code(), "OUT_OF_RANGE_LOAD");
    }

    #[test]
    fn test_invalid_length() {
        for length in [0.0, -3.0, f64::NAN] {
            let err = solve(length, &[]).unwrap_err();
            assert_eq!(err.error_code(), "INVALID_DATA");
        }
    }

    fn beam_strategy() -> impl Strategy<Value = (f64, Vec<PointLoad>)> {
        (0.5f64..100.0).prop_flat_map(|length| {
            let load = (0.0..=length, -1000.0f64..1000.0)
                .prop_map(|(position, magnitude)| PointLoad::new(position, magnitude));
            (Just(length), prop::collection::vec(load, 0..12))
        })
    }

    proptest! {
        #[test]
        fn prop_equilibrium((length, loads) in beam_strategy()) {
            let model = solve(length, &loads).unwrap();
            let r = model.residuals();
            let scale = model.force_scale();
            prop_assert!(r.force.abs() <= 1e-9 * scale);
            prop_assert!(r.moment.abs() <= 1e-9 * scale * length);
        }

        #[test]
        fn prop_boundary_moments_vanish((length, loads) in beam_strategy()) {
            let model = solve(length, &loads).unwrap();
            let r = model.residuals();
            let tol = 1e-9 * model.force_scale() * length.max(1.0);
            prop_assert!(r.start_moment.abs() <= tol);
            prop_assert!(r.end_moment.abs() <= tol);
            prop_assert!(r.end_shear.abs() <= 1e-9 * model.force_scale());
        }
    }
}
