//! # Beam Calculations
//!
//! The analysis pipeline, one module per stage:
//!
//! - [`statics`] - reactions and piecewise shear/moment functions (Mode A)
//! - [`sampler`] - plot-ready `(x, shear, moment)` series for either mode
//! - [`result`] - packaging into [`BeamAnalysisResult`]
//!
//! Column resolution lives in [`crate::columns`]. [`analyze`] chains all
//! four stages for a single request.
//!
//! ## Example
//!
//! ```rust
//! use beam_core::calculations::analyze;
//! use beam_core::settings::AnalysisSettings;
//! use beam_core::table::RawTable;
//!
//! let table = RawTable::from_csv_str("Pos (m),Load (kN)\n2,-10\n4,-10\n").unwrap();
//! let result = analyze(&table, Some(6.0), &AnalysisSettings::default()).unwrap();
//!
//! let (r0, rl) = result.reactions().unwrap();
//! assert!((r0 - 10.0).abs() < 1e-9 && (rl - 10.0).abs() < 1e-9);
//! ```

pub mod result;
pub mod sampler;
pub mod statics;

use tracing::{info, warn};

pub use result::{assemble, AnalysisNotes, BeamAnalysisResult, ResultMetadata, SeriesSummary};
pub use sampler::{sample, ResultSeries, SampledSeries, SeriesInput, SeriesPoint};
pub use statics::{solve, BeamModel, PiecewiseDiagram, Support};

use crate::columns::{resolve, Mode};
use crate::errors::{CalcError, CalcResult};
use crate::loads::loads_from_table;
use crate::settings::AnalysisSettings;
use crate::table::RawTable;

/// Run the whole pipeline on one uploaded table.
///
/// `length` is the beam span. When it is `None` the largest load position
/// (Mode A) or largest series `x` (Mode B) is used instead, and the
/// assumption is recorded in the result metadata.
///
/// # Errors
///
/// Whatever the first failing stage reports; nothing is partially returned.
pub fn analyze(
    table: &RawTable,
    length: Option<f64>,
    settings: &AnalysisSettings,
) -> CalcResult<BeamAnalysisResult> {
    settings.validate()?;

    let (mapping, mode) = resolve(table, settings)?;
    let mut notes = AnalysisNotes {
        input_preview: Some(table.preview(settings.preview_rows)),
        ..Default::default()
    };

    match mode {
        Mode::Loads => {
            let loads = loads_from_table(table, &mapping)?;
            let max_position = loads.iter().map(|l| l.position).fold(f64::NEG_INFINITY, f64::max);
            let length = resolve_length(length, max_position, "load position", &mut notes)?;

            let model = statics::solve_checked(length, &loads, settings.tolerance)?;
            let sampled = sample(SeriesInput::Model(&model), settings)?;
            info!(samples = sampled.series.len(), "analysis complete");
            assemble(mapping, mode, Some(model), sampled, notes)
        }
        Mode::Series => {
            let rows = sampler::series_from_table(table, &mapping)?;
            let sampled = sample(SeriesInput::Tabulated(rows), settings)?;
            let max_x = sampled.series.last_x().unwrap_or(f64::NEG_INFINITY);
            let supplied = length.is_some();
            let length = resolve_length(length, max_x, "series position", &mut notes)?;

            let first_x = sampled.series.first_x().unwrap_or(0.0);
            if first_x > settings.tolerance * length.max(1.0) {
                notes.warnings.push(format!(
                    "Series starts at position {} rather than at the left support (0)",
                    first_x
                ));
            }
            if supplied && (length - max_x).abs() > settings.tolerance * length.max(1.0) {
                notes.warnings.push(format!(
                    "Supplied beam length {} differs from the last series position {}",
                    length, max_x
                ));
            }
            info!(samples = sampled.series.len(), "series accepted");
            assemble(mapping, mode, None, sampled, notes)
        }
    }
}

/// Use the supplied length, or fall back to `max_position` and record it.
fn resolve_length(
    supplied: Option<f64>,
    max_position: f64,
    source: &str,
    notes: &mut AnalysisNotes,
) -> CalcResult<f64> {
    let length = match supplied {
        Some(length) => length,
        None => {
            if !max_position.is_finite() || max_position <= 0.0 {
                return Err(CalcError::invalid_value(
                    "length",
                    max_position.to_string(),
                    format!(
                        "No beam length supplied and the largest {} cannot serve as one",
                        source
                    ),
                ));
            }
            warn!(length = max_position, "no beam length supplied; using largest {}", source);
            notes.length_assumed = true;
            notes
                .assumptions
                .push(format!("Beam length taken as the largest {} ({})", source, max_position));
            max_position
        }
    };

    if !length.is_finite() || length <= 0.0 {
        return Err(CalcError::invalid_value(
            "length",
            length.to_string(),
            "Beam length must be a positive number",
        ));
    }
    notes.length = length;
    Ok(length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::Role;

    fn settings() -> AnalysisSettings {
        AnalysisSettings::default()
    }

    #[test]
    fn test_two_load_scenario() {
        let table = RawTable::from_csv_str("Pos (m),Load (kN)\n4,-10\n2,-10\n").unwrap();
        let result = analyze(&table, Some(6.0), &settings()).unwrap();

        assert_eq!(result.mode, Mode::Loads);
        let model = result.model.as_ref().unwrap();
        assert_eq!(model.loads[0].position, 2.0);
        assert!((model.left_reaction() - 10.0).abs() < 1e-9);
        assert!((model.right_reaction() - 10.0).abs() < 1e-9);

        assert_eq!(result.series.first_x(), Some(0.0));
        assert_eq!(result.series.last_x(), Some(6.0));
        assert!((result.metadata.summary.max_moment.value - 20.0).abs() < 1e-9);
        assert_eq!(result.metadata.summary.max_moment.x, 2.0);
        assert!(!result.metadata.length_assumed);
        assert_eq!(result.metadata.column_mapping.header(Role::Load), Some("Load (kN)"));
        assert_eq!(result.metadata.input_preview.as_ref().unwrap().row_count(), 2);
    }

    #[test]
    fn test_length_fallback_recorded() {
        let table = RawTable::from_csv_str("position,load\n1,-5\n5,-5\n").unwrap();
        let result = analyze(&table, None, &settings()).unwrap();
        assert_eq!(result.metadata.length, 5.0);
        assert!(result.metadata.length_assumed);
        assert_eq!(result.metadata.assumptions.len(), 1);
        assert!(result.metadata.assumptions[0].contains("largest load position"));
    }

    #[test]
    fn test_length_fallback_needs_positive_position() {
        let table = RawTable::from_csv_str("position,load\n0,-5\n").unwrap();
        let err = analyze(&table, None, &settings()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATA");
    }

    #[test]
    fn test_out_of_range_propagates() {
        let table = RawTable::from_csv_str("position,load\n7,-10\n").unwrap();
        let err = analyze(&table, Some(6.0), &settings()).unwrap_err();
        assert_eq!(err, CalcError::out_of_range_load(7.0, 6.0));
    }

    #[test]
    fn test_mode_b_pipeline() {
        let table = RawTable::from_csv_str("x,Shear,Moment\n0,5,0\n2,-5,0\n1,0,5\n").unwrap();
        let result = analyze(&table, Some(3.0), &settings()).unwrap();
        assert_eq!(result.mode, Mode::Series);
        assert!(result.model.is_none());
        assert!(result.metadata.reordered);
        assert!(result.series.is_ordered());
        // One warning for the reorder, one for the length mismatch
        assert_eq!(result.metadata.warnings.len(), 2);
        assert_eq!(result.metadata.length, 3.0);
    }

    #[test]
    fn test_mode_b_fallback_length() {
        let table = RawTable::from_csv_str("x,Shear,Moment\n0,5,0\n1,0,5\n2,-5,0\n").unwrap();
        let result = analyze(&table, None, &settings()).unwrap();
        assert_eq!(result.metadata.length, 2.0);
        assert!(result.metadata.length_assumed);
        assert!(!result.metadata.reordered);
        assert!(result.metadata.warnings.is_empty());
    }

    #[test]
    fn test_mode_b_series_not_starting_at_zero() {
        let table = RawTable::from_csv_str("x,Shear,Moment\n1,5,0\n2,0,5\n3,-5,0\n").unwrap();
        let result = analyze(&table, Some(3.0), &settings()).unwrap();
        assert_eq!(result.series.first_x(), Some(1.0));
        assert_eq!(result.metadata.warnings.len(), 1);
        assert!(result.metadata.warnings[0].contains("starts at position 1"));
    }

    #[test]
    fn test_mode_b_negative_position_rejected() {
        let table = RawTable::from_csv_str("x,Shear,Moment\n-2,5,0\n4,-5,0\n").unwrap();
        let err = analyze(&table, None, &settings()).unwrap_err();
        assert!(matches!(err, CalcError::InvalidData { row: Some(1), .. }));
    }

    #[test]
    fn test_huge_length_gives_bounded_series() {
        let table = RawTable::from_csv_str("position,load\n5,-10\n").unwrap();
        let settings = settings();
        let result = analyze(&table, Some(1e30), &settings).unwrap();
        // Capped grid plus the three stations and their step duplicates
        assert!(result.series.len() <= settings.max_samples + 6);
        assert!(result.series.is_ordered());
        assert_eq!(result.series.first_x(), Some(0.0));
        assert_eq!(result.series.last_x(), Some(1e30));
        assert!(result.series.iter().any(|p| p.x == 5.0));
    }

    #[test]
    fn test_missing_columns_propagate() {
        let table = RawTable::from_csv_str("a,b\n1,2\n").unwrap();
        let err = analyze(&table, Some(6.0), &settings()).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_COLUMN");
    }

    #[test]
    fn test_concurrent_requests_are_independent() {
        let handles: Vec<_> = (1..=8)
            .map(|i| {
                std::thread::spawn(move || {
                    let csv = format!("position,load\n{},-10\n", i);
                    let table = RawTable::from_csv_str(&csv).unwrap();
                    let result = analyze(&table, Some(10.0), &AnalysisSettings::default()).unwrap();
                    (i, result.reactions().unwrap())
                })
            })
            .collect();

        for handle in handles {
            let (i, (r0, rl)) = handle.join().unwrap();
            let a = i as f64;
            assert!((r0 - 10.0 * (10.0 - a) / 10.0).abs() < 1e-9);
            assert!((rl - 10.0 * a / 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bad_cell_after_sample_rows() {
        let mut csv = String::from("position,load\n");
        for i in 0..20 {
            csv.push_str(&format!("{},-1\n", i));
        }
        csv.push_str("21,heavy\n");
        let table = RawTable::from_csv_str(&csv).unwrap();
        let err = analyze(&table, Some(30.0), &settings()).unwrap_err();
        assert!(matches!(err, CalcError::InvalidData { row: Some(21), .. }));
    }
}
