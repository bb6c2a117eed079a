//! Series Sampling
//!
//! Turns either a solved [`BeamModel`] or a tabulated shear/moment series
//! into the ordered `(x, shear, moment)` points handed to the renderer.
//! The renderer draws straight lines between consecutive points and never
//! re-interpolates, so every feature point must be present:
//!
//! - Both supports and every load position appear with their exact `x`.
//! - Where shear jumps, two points share the same `x`: the left value first,
//!   then the right value.
//! - Evenly-spaced grid points fill the spans in between.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::statics::{BeamModel, PiecewiseDiagram};
use crate::columns::{ColumnMapping, Role};
use crate::errors::{CalcError, CalcResult};
use crate::settings::AnalysisSettings;
use crate::table::RawTable;

/// One sample of the internal force diagrams
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub x: f64,
    pub shear: f64,
    pub moment: f64,
}

impl SeriesPoint {
    pub fn new(x: f64, shear: f64, moment: f64) -> Self {
        SeriesPoint { x, shear, moment }
    }
}

/// Points ordered by non-decreasing `x`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSeries {
    pub points: Vec<SeriesPoint>,
}

impl ResultSeries {
    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when there are no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over the points
    pub fn iter(&self) -> std::slice::Iter<'_, SeriesPoint> {
        self.points.iter()
    }

    /// First `x`, if any
    pub fn first_x(&self) -> Option<f64> {
        self.points.first().map(|p| p.x)
    }

    /// Last `x`, if any
    pub fn last_x(&self) -> Option<f64> {
        self.points.last().map(|p| p.x)
    }

    /// True when `x` never decreases
    pub fn is_ordered(&self) -> bool {
        is_ordered(&self.points)
    }
}

fn is_ordered(points: &[SeriesPoint]) -> bool {
    points.windows(2).all(|w| w[0].x <= w[1].x)
}

/// Input to the sampler
#[derive(Debug, Clone)]
pub enum SeriesInput<'a> {
    /// Mode A: evaluate a solved beam
    Model(&'a BeamModel),
    /// Mode B: pass through supplied rows, in input order
    Tabulated(Vec<SeriesPoint>),
}

/// Sampler output plus what happened to the input on the way through
#[derive(Debug, Clone, PartialEq)]
pub struct SampledSeries {
    pub series: ResultSeries,
    /// Tabulated rows had to be sorted by `x`
    pub reordered: bool,
    /// Human-readable notes for the result metadata
    pub warnings: Vec<String>,
}

/// Produce the plot-ready series for either mode.
///
/// # Errors
///
/// * `InvalidData` - a tabulated series with no rows or a non-finite value
pub fn sample(input: SeriesInput<'_>, settings: &AnalysisSettings) -> CalcResult<SampledSeries> {
    match input {
        SeriesInput::Model(model) => Ok(SampledSeries {
            series: sample_model(model, settings),
            reordered: false,
            warnings: Vec::new(),
        }),
        SeriesInput::Tabulated(rows) => sample_tabulated(rows),
    }
}

/// Evaluate the beam's piecewise functions at every station and on an even grid.
pub fn sample_model(model: &BeamModel, settings: &AnalysisSettings) -> ResultSeries {
    let diagram = model.diagram();
    let length = model.length;
    let merge_tol = settings.tolerance * length.max(1.0);
    let step_tol = settings.tolerance * model.force_scale();

    let n = settings.grid_size(length);
    let grid = (0..n).map(|i| {
        if i == n - 1 {
            length
        } else {
            length * i as f64 / (n - 1) as f64
        }
    });

    // Grid points that land on a station are replaced by the exact station
    let stations = &diagram.stations;
    let mut xs: Vec<(f64, bool)> = stations.iter().map(|&x| (x, true)).collect();
    xs.extend(
        grid.filter(|x| !stations.iter().any(|s| (s - x).abs() <= merge_tol))
            .map(|x| (x, false)),
    );
    xs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut points = Vec::with_capacity(xs.len() + stations.len());
    for (x, is_station) in xs {
        push_samples(&mut points, &diagram, x, is_station, step_tol);
    }

    debug!(
        grid = n,
        stations = stations.len(),
        points = points.len(),
        "sampled beam diagrams"
    );
    ResultSeries { points }
}

fn push_samples(
    points: &mut Vec<SeriesPoint>,
    diagram: &PiecewiseDiagram,
    x: f64,
    is_station: bool,
    step_tol: f64,
) {
    let moment = diagram.moment_at(x);
    let right = diagram.shear_right_of(x);
    if is_station {
        let left = diagram.shear_left_of(x);
        if (left - right).abs() > step_tol {
            points.push(SeriesPoint::new(x, left, moment));
        }
    }
    points.push(SeriesPoint::new(x, right, moment));
}

/// Validate supplied rows, sorting (and saying so) when `x` goes backwards.
///
/// # Errors
///
/// * `InvalidData` - no rows, a non-finite value, or a negative `x`
pub fn sample_tabulated(rows: Vec<SeriesPoint>) -> CalcResult<SampledSeries> {
    if rows.is_empty() {
        return Err(CalcError::invalid_table("Series has no rows"));
    }
    for (i, p) in rows.iter().enumerate() {
        if !(p.x.is_finite() && p.shear.is_finite() && p.moment.is_finite()) {
            return Err(CalcError::InvalidData {
                column: None,
                row: Some(i + 1),
                value: format!("({}, {}, {})", p.x, p.shear, p.moment),
                reason: "Series values must be finite".to_string(),
            });
        }
        if p.x < 0.0 {
            return Err(CalcError::InvalidData {
                column: None,
                row: Some(i + 1),
                value: p.x.to_string(),
                reason: "Series position lies left of the support at x = 0".to_string(),
            });
        }
    }

    if is_ordered(&rows) {
        return Ok(SampledSeries {
            series: ResultSeries { points: rows },
            reordered: false,
            warnings: Vec::new(),
        });
    }

    let mut points = rows;
    points.sort_by(|a, b| a.x.total_cmp(&b.x));
    warn!(rows = points.len(), "series rows were not sorted by x; reordered");
    Ok(SampledSeries {
        series: ResultSeries { points },
        reordered: true,
        warnings: vec![
            "Series rows were not in ascending position order and were sorted".to_string(),
        ],
    })
}

/// Read `(position, shear, moment)` rows out of a Mode B table, in input order.
pub fn series_from_table(
    table: &RawTable,
    mapping: &ColumnMapping,
) -> CalcResult<Vec<SeriesPoint>> {
    let xs = table.numeric_column(mapping.index(Role::Position)?)?;
    let shear = table.numeric_column(mapping.index(Role::Shear)?)?;
    let moment = table.numeric_column(mapping.index(Role::Moment)?)?;

    Ok(xs
        .into_iter()
        .zip(shear)
        .zip(moment)
        .map(|((x, v), m)| SeriesPoint::new(x, v, m))
        .collect())
}
