//! # beam_core - Beam Statics and Data-Normalization Engine
//!
//! `beam_core` turns a loosely-formatted table into the numbers a beam
//! report needs: support reactions and shear/bending-moment diagrams for a
//! simply-supported, single-span beam under point loads. Tables that
//! already contain shear and moment columns are validated and passed
//! through instead of being solved.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results;
//!   safe to call from any number of threads at once
//! - **JSON-First**: All data types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types the host can show verbatim
//!
//! ## Quick Start
//!
//! ```rust
//! use beam_core::{analyze, AnalysisSettings, Mode, RawTable};
//!
//! let table = RawTable::from_csv_str("Pos (m),Load (kN)\n2,-10\n4,-10\n").unwrap();
//! let result = analyze(&table, Some(6.0), &AnalysisSettings::default()).unwrap();
//!
//! assert_eq!(result.mode, Mode::Loads);
//! let json = serde_json::to_string_pretty(&result).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`columns`] - Header-to-role resolution and mode detection
//! - [`calculations`] - Statics solver, series sampler, result assembly
//! - [`loads`] - Point load type
//! - [`table`] - Untyped input tables
//! - [`settings`] - Analysis tunables
//! - [`errors`] - Structured error types
//! - [`file_io`] - Table (CSV, JSON, spreadsheet) and settings loading, atomic result saves

pub mod calculations;
pub mod columns;
pub mod errors;
pub mod file_io;
pub mod loads;
pub mod settings;
pub mod table;

// Re-export commonly used types at crate root for convenience
pub use calculations::{analyze, BeamAnalysisResult, BeamModel, ResultSeries, SeriesPoint};
pub use columns::{ColumnMapping, Mode, Role};
pub use errors::{CalcError, CalcResult};
pub use loads::PointLoad;
pub use settings::AnalysisSettings;
pub use table::RawTable;
