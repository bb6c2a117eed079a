//! Result Assembly
//!
//! Packages everything the renderer needs into one [`BeamAnalysisResult`].
//! Nothing is computed here beyond the summary extremes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sampler::{ResultSeries, SampledSeries};
use super::statics::{BeamModel, EquilibriumResiduals};
use crate::columns::{ColumnMapping, Mode};
use crate::errors::{CalcError, CalcResult};
use crate::table::RawTable;

/// An extreme value and where it first occurs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extreme {
    pub value: f64,
    pub x: f64,
}

/// Largest and smallest shear and moment in a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub max_shear: Extreme,
    pub min_shear: Extreme,
    pub max_moment: Extreme,
    pub min_moment: Extreme,
}

impl SeriesSummary {
    /// Single pass over the series; ties go to the smallest `x`.
    ///
    /// Returns `None` for an empty series.
    pub fn scan(series: &ResultSeries) -> Option<Self> {
        let first = series.points.first()?;
        let shear = Extreme {
            value: first.shear,
            x: first.x,
        };
        let moment = Extreme {
            value: first.moment,
            x: first.x,
        };
        let mut summary = SeriesSummary {
            max_shear: shear,
            min_shear: shear,
            max_moment: moment,
            min_moment: moment,
        };

        for p in series.iter().skip(1) {
            if p.shear > summary.max_shear.value {
                summary.max_shear = Extreme { value: p.shear, x: p.x };
            }
            if p.shear < summary.min_shear.value {
                summary.min_shear = Extreme { value: p.shear, x: p.x };
            }
            if p.moment > summary.max_moment.value {
                summary.max_moment = Extreme { value: p.moment, x: p.x };
            }
            if p.moment < summary.min_moment.value {
                summary.min_moment = Extreme { value: p.moment, x: p.x };
            }
        }
        Some(summary)
    }
}

/// Facts gathered by the pipeline before assembly
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisNotes {
    /// Beam length used for the analysis
    pub length: f64,
    /// The length was inferred rather than supplied
    pub length_assumed: bool,
    /// Defaults the pipeline applied, in plain words
    pub assumptions: Vec<String>,
    /// Anything the user should double-check
    pub warnings: Vec<String>,
    /// Leading rows of the input table
    pub input_preview: Option<RawTable>,
}

/// Everything about a result except the numbers themselves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub analysis_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub length: f64,
    pub length_assumed: bool,
    pub assumptions: Vec<String>,
    pub warnings: Vec<String>,
    /// Tabulated input was sorted before use
    pub reordered: bool,
    pub column_mapping: ColumnMapping,
    pub load_count: usize,
    pub sample_count: usize,
    pub summary: SeriesSummary,
    /// Statics residuals; only present for solved beams
    pub equilibrium: Option<EquilibriumResiduals>,
    pub input_preview: Option<RawTable>,
}

/// Canonical output handed to the report renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamAnalysisResult {
    /// Solved beam (Mode A); `None` when the series was supplied (Mode B)
    pub model: Option<BeamModel>,
    pub series: ResultSeries,
    pub mode: Mode,
    pub metadata: ResultMetadata,
}

impl BeamAnalysisResult {
    /// Left and right reactions, when the beam was solved
    pub fn reactions(&self) -> Option<(f64, f64)> {
        self.model
            .as_ref()
            .map(|m| (m.left_reaction(), m.right_reaction()))
    }
}

/// Build the final result.
///
/// # Errors
///
/// * `InvalidData` - the model's presence does not match the mode, or the
///   series is empty
pub fn assemble(
    mapping: ColumnMapping,
    mode: Mode,
    model: Option<BeamModel>,
    sampled: SampledSeries,
    notes: AnalysisNotes,
) -> CalcResult<BeamAnalysisResult> {
    match (mode, &model) {
        (Mode::Loads, None) => {
            return Err(CalcError::invalid_value("model", "none", "Mode A requires a solved beam"));
        }
        (Mode::Series, Some(_)) => {
            return Err(CalcError::invalid_value(
                "model",
                "solved beam",
                "Mode B results carry no beam model",
            ));
        }
        _ => {}
    }

    let summary = SeriesSummary::scan(&sampled.series)
        .ok_or_else(|| CalcError::invalid_table("Series has no points"))?;

    let mut warnings = notes.warnings;
    warnings.extend(sampled.warnings);

    let metadata = ResultMetadata {
        analysis_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        length: notes.length,
        length_assumed: notes.length_assumed,
        assumptions: notes.assumptions,
        warnings,
        reordered: sampled.reordered,
        column_mapping: mapping,
        load_count: model.as_ref().map_or(0, |m| m.loads.len()),
        sample_count: sampled.series.len(),
        summary,
        equilibrium: model.as_ref().map(BeamModel::residuals),
        input_preview: notes.input_preview,
    };

    Ok(BeamAnalysisResult {
        model,
        series: sampled.series,
        mode,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::sampler::{sample_model, SeriesPoint};
    use crate::calculations::statics::solve;
    use crate::loads::PointLoad;
    use crate::settings::AnalysisSettings;

    fn sampled(points: Vec<SeriesPoint>) -> SampledSeries {
        SampledSeries {
            series: ResultSeries { points },
            reordered: false,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_summary_first_occurrence_wins() {
        let series = ResultSeries {
            points: vec![
                SeriesPoint::new(0.0, 10.0, 0.0),
                SeriesPoint::new(2.0, 0.0, 20.0),
                SeriesPoint::new(4.0, -10.0, 20.0),
                SeriesPoint::new(6.0, -10.0, 0.0),
            ],
        };
        let s = SeriesSummary::scan(&series).unwrap();
        assert_eq!(s.max_shear, Extreme { value: 10.0, x: 0.0 });
        assert_eq!(s.min_shear, Extreme { value: -10.0, x: 4.0 });
        assert_eq!(s.max_moment, Extreme { value: 20.0, x: 2.0 });
        assert_eq!(s.min_moment, Extreme { value: 0.0, x: 0.0 });
    }

    #[test]
    fn test_summary_empty() {
        assert!(SeriesSummary::scan(&ResultSeries::default()).is_none());
    }

    #[test]
    fn test_assemble_mode_a() {
        let model = solve(6.0, &[PointLoad::new(2.0, -10.0), PointLoad::new(4.0, -10.0)]).unwrap();
        let series = sample_model(&model, &AnalysisSettings::default());
        let notes = AnalysisNotes {
            length: 6.0,
            ..Default::default()
        };
        let result = assemble(
            ColumnMapping::default(),
            Mode::Loads,
            Some(model),
            sampled(series.points),
            notes,
        )
        .unwrap();

        let (r0, rl) = result.reactions().unwrap();
        assert!((r0 - 10.0).abs() < 1e-9);
        assert!((rl - 10.0).abs() < 1e-9);
        assert_eq!(result.metadata.load_count, 2);
        assert_eq!(result.metadata.sample_count, result.series.len());
        assert!((result.metadata.summary.max_moment.value - 20.0).abs() < 1e-9);
        assert_eq!(result.metadata.summary.max_moment.x, 2.0);
        assert!(result.metadata.equilibrium.is_some());
    }

    #[test]
    fn test_assemble_mode_b_merges_warnings() {
        let mut input = sampled(vec![
            SeriesPoint::new(0.0, 1.0, 0.0),
            SeriesPoint::new(1.0, -1.0, 0.0),
        ]);
        input.reordered = true;
        input.warnings.push("sorted".to_string());
        let notes = AnalysisNotes {
            length: 1.0,
            warnings: vec!["length differs".to_string()],
            ..Default::default()
        };
        let result = assemble(ColumnMapping::default(), Mode::Series, None, input, notes).unwrap();
        assert!(result.model.is_none());
        assert!(result.reactions().is_none());
        assert!(result.metadata.reordered);
        assert_eq!(result.metadata.warnings, vec!["length differs", "sorted"]);
        assert!(result.metadata.equilibrium.is_none());
    }

    #[test]
    fn test_assemble_rejects_mode_mismatch() {
        let points = vec![SeriesPoint::new(0.0, 0.0, 0.0)];
        let err = assemble(
            ColumnMapping::default(),
            Mode::Loads,
            None,
            sampled(points),
            AnalysisNotes::default(),
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATA");
    }

    #[test]
    fn test_result_json_shape() {
        let points = vec![SeriesPoint::new(0.0, 1.0, 0.0), SeriesPoint::new(1.0, -1.0, 0.0)];
        let result = assemble(
            ColumnMapping::default(),
            Mode::Series,
            None,
            sampled(points),
            AnalysisNotes::default(),
        )
        .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["model"].is_null());
        assert_eq!(json["mode"], "Series");
        assert_eq!(json["series"][1]["shear"], -1.0);

        let roundtrip: BeamAnalysisResult = serde_json::from_value(json).unwrap();
        assert_eq!(roundtrip, result);
    }
}
