//! # File I/O Module
//!
//! Reading uploaded tables and settings, and writing results for the
//! renderer:
//! - **Tables**: `.csv` (header row required), spreadsheets
//!   (`.xlsx`, `.xlsm`, `.xls`, `.ods`; first worksheet, header in the first
//!   row) or `.json` (`{ "headers": [...], "rows": [[...]] }`)
//! - **Settings**: JSON, missing fields take their defaults
//! - **Results**: pretty JSON, written atomically (.tmp, fsync, rename)
//!
//! ## Example
//!
//! ```rust,no_run
//! use beam_core::calculations::analyze;
//! use beam_core::file_io::{load_table, save_result};
//! use beam_core::settings::AnalysisSettings;
//! use std::path::Path;
//!
//! let table = load_table(Path::new("loads.csv"))?;
//! let result = analyze(&table, Some(6.0), &AnalysisSettings::default())?;
//! save_result(&result, Path::new("result.json"))?;
//! # Ok::<(), beam_core::errors::CalcError>(())
//! ```

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use calamine::{open_workbook_auto, Reader};
use tracing::debug;

use crate::calculations::BeamAnalysisResult;
use crate::errors::{CalcError, CalcResult};
use crate::settings::AnalysisSettings;
use crate::table::RawTable;

fn read_to_string(path: &Path) -> CalcResult<String> {
    let mut file = File::open(path).map_err(|e| {
        CalcError::file_error("open", path.display().to_string(), e.to_string())
    })?;

    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|e| {
        CalcError::file_error("read", path.display().to_string(), e.to_string())
    })?;
    Ok(contents)
}

/// Input formats recognised by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableFormat {
    Csv,
    Json,
    Spreadsheet,
}

impl TableFormat {
    fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => TableFormat::Json,
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => TableFormat::Spreadsheet,
            _ => TableFormat::Csv,
        }
    }
}

fn load_workbook(path: &Path) -> CalcResult<RawTable> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        CalcError::file_error("open workbook", path.display().to_string(), e.to_string())
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CalcError::invalid_table("Workbook has no worksheets"))?
        .map_err(|e| {
            CalcError::file_error("read worksheet", path.display().to_string(), e.to_string())
        })?;

    RawTable::from_sheet(&range)
}

/// Load an input table, choosing the format by extension (CSV when unknown).
///
/// # Returns
///
/// * `Err(CalcError::FileError)` - I/O error or unreadable workbook
/// * `Err(CalcError::SerializationError)` - malformed JSON
/// * `Err(CalcError::InvalidData)` - malformed CSV or an empty worksheet
pub fn load_table(path: &Path) -> CalcResult<RawTable> {
    let table = match TableFormat::from_path(path) {
        TableFormat::Spreadsheet => load_workbook(path)?,
        TableFormat::Json => {
            let contents = read_to_string(path)?;
            let table: RawTable = serde_json::from_str(&contents).map_err(|e| {
                CalcError::serialization(format!(
                    "Invalid JSON table in {}: {}",
                    path.display(),
                    e
                ))
            })?;
            RawTable::new(table.headers, table.rows).with_source_rows(table.source_rows)
        }
        TableFormat::Csv => RawTable::from_csv_str(&read_to_string(path)?)?,
    };

    debug!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.headers.len(),
        "loaded table"
    );
    Ok(table)
}

/// Load analysis settings from a JSON file.
pub fn load_settings(path: &Path) -> CalcResult<AnalysisSettings> {
    let contents = read_to_string(path)?;
    let settings: AnalysisSettings = serde_json::from_str(&contents).map_err(|e| {
        CalcError::serialization(format!("Invalid settings JSON in {}: {}", path.display(), e))
    })?;
    settings.validate()?;
    Ok(settings)
}

/// Save a result with atomic write semantics.
///
/// The save process:
/// 1. Serialize to pretty JSON
/// 2. Write to `<path>.tmp`
/// 3. Sync to disk (fsync)
/// 4. Rename over `path`
pub fn save_result(result: &BeamAnalysisResult, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| CalcError::serialization(e.to_string()))?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    let mut tmp_file = File::create(tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    drop(tmp_file);

    fs::rename(tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    debug!(path = %path.display(), "saved result");
    Ok(())
}

/// Load a previously saved result.
pub fn load_result(path: &Path) -> CalcResult<BeamAnalysisResult> {
    let contents = read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| {
        CalcError::serialization(format!("Invalid result JSON in {}: {}", path.display(), e))
    })
}
