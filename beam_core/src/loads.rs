//! # Point Loads
//!
//! The only load kind this engine handles. Magnitudes are signed with
//! upward positive, so a downward 10 kN load is `-10.0`.
//!
//! ```rust
//! use beam_core::loads::PointLoad;
//!
//! let load = PointLoad::downward(2.0, 10.0);
//! assert_eq!(load.magnitude, -10.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::columns::{ColumnMapping, Role};
use crate::errors::CalcResult;
use crate::table::RawTable;

/// A concentrated force at a distance from the left support
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLoad {
    /// Distance from the left support
    pub position: f64,
    /// Signed magnitude, upward positive
    pub magnitude: f64,
}

impl PointLoad {
    /// Create a load with an already-signed magnitude
    pub fn new(position: f64, magnitude: f64) -> Self {
        PointLoad {
            position,
            magnitude,
        }
    }

    /// Create a downward (gravity) load from its absolute value
    pub fn downward(position: f64, value: f64) -> Self {
        PointLoad::new(position, -value.abs())
    }

    /// Moment of this load about the left support
    pub fn moment_about_origin(&self) -> f64 {
        self.magnitude * self.position
    }
}

/// Sort loads ascending by position. Stable, so coincident loads keep
/// their input order and are never merged.
pub fn sort_by_position(loads: &mut [PointLoad]) {
    loads.sort_by(|a, b| a.position.total_cmp(&b.position));
}

/// Read `(position, load)` rows out of a Mode A table, in input order.
pub fn loads_from_table(table: &RawTable, mapping: &ColumnMapping) -> CalcResult<Vec<PointLoad>> {
    let positions = table.numeric_column(mapping.index(Role::Position)?)?;
    let magnitudes = table.numeric_column(mapping.index(Role::Load)?)?;

    Ok(positions
        .into_iter()
        .zip(magnitudes)
        .map(|(position, magnitude)| PointLoad::new(position, magnitude))
        .collect())
}
