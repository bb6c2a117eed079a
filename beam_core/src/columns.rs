//! # Column Mapping
//!
//! Resolves arbitrarily-named spreadsheet headers onto the semantic roles
//! the analysis needs, and decides whether the table holds raw point loads
//! or an already-computed shear/moment series.
//!
//! ## Matching Rules
//!
//! Headers are normalized first: trimmed, case-folded, unit groups such as
//! `(kN)` or `[m]` removed (and remembered), `_`/`-` read as spaces.
//!
//! 1. An exact match against a role alias wins. Aliases are ranked, so
//!    `position` beats `x` when both headers are present.
//! 2. Without an exact match, a header *containing* an alias is accepted
//!    only if it is the single such header. Two or more is an ambiguity.
//!
//! Single-letter aliases (`x`, `p`, `v`, `m`) only match whole words, and
//! an exact hit on one of them is not decisive while another header also
//! matches the role.
//!
//! ## Example
//!
//! ```rust
//! use beam_core::columns::{resolve, Mode, Role};
//! use beam_core::settings::AnalysisSettings;
//! use beam_core::table::RawTable;
//!
//! let table = RawTable::new(["Pos (m)", "Load (kN)"], [["2", "-10"]]);
//! let (mapping, mode) = resolve(&table, &AnalysisSettings::default()).unwrap();
//!
//! assert_eq!(mode, Mode::Loads);
//! assert_eq!(mapping.header(Role::Position), Some("Pos (m)"));
//! assert_eq!(mapping.get(Role::Load).unwrap().unit.as_deref(), Some("kN"));
//! ```

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{CalcError, CalcResult};
use crate::settings::AnalysisSettings;
use crate::table::RawTable;

// ============================================================================
// Roles and Modes
// ============================================================================

/// Semantic meaning of an input column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Distance from the left support
    Position,
    /// Point load magnitude
    Load,
    /// Precomputed internal shear
    Shear,
    /// Precomputed internal bending moment
    Moment,
}

impl Role {
    /// All roles, in resolution order
    pub const ALL: [Role; 4] = [Role::Position, Role::Load, Role::Shear, Role::Moment];

    /// Lowercase role name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            Role::Position => "position",
            Role::Load => "load",
            Role::Shear => "shear",
            Role::Moment => "moment",
        }
    }

    /// Ranked aliases for this role (best first)
    pub fn aliases(&self) -> &'static [&'static str] {
        ALIASES
            .get(self)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Process-wide alias table. Built once, read-only afterwards.
static ALIASES: Lazy<BTreeMap<Role, Vec<&'static str>>> = Lazy::new(|| {
    BTreeMap::from([
        (
            Role::Position,
            vec!["position", "pos", "x", "dist", "distance", "location", "loc"],
        ),
        (Role::Load, vec!["load", "force", "p", "kn", "weight"]),
        (Role::Shear, vec!["shear", "shear force", "v", "sfd"]),
        (Role::Moment, vec!["moment", "bending moment", "m", "bmd"]),
    ])
});

/// What kind of data the table holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Mode A: point loads to be solved for reactions and diagrams
    Loads,
    /// Mode B: shear/moment series already computed upstream
    Series,
}

impl Mode {
    /// Roles that must resolve for this mode
    pub fn required_roles(&self) -> &'static [Role] {
        match self {
            Mode::Loads => &[Role::Position, Role::Load],
            Mode::Series => &[Role::Position, Role::Shear, Role::Moment],
        }
    }

    /// Short code ("A" or "B")
    pub fn code(&self) -> &'static str {
        match self {
            Mode::Loads => "A",
            Mode::Series => "B",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Loads => write!(f, "Mode A (point loads)"),
            Mode::Series => write!(f, "Mode B (precomputed series)"),
        }
    }
}

// ============================================================================
// Mapping
// ============================================================================

/// A source column chosen for a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedColumn {
    /// Header text as it appeared in the input
    pub header: String,
    /// Zero-based column index
    pub index: usize,
    /// Unit label stripped from the header, e.g. `kN` from `Load (kN)`
    pub unit: Option<String>,
}

/// Role → column assignment for exactly the roles the mode requires
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    pub columns: BTreeMap<Role, MappedColumn>,
}

impl ColumnMapping {
    /// Column assigned to a role
    pub fn get(&self, role: Role) -> Option<&MappedColumn> {
        self.columns.get(&role)
    }

    /// Original header assigned to a role
    pub fn header(&self, role: Role) -> Option<&str> {
        self.get(role).map(|c| c.header.as_str())
    }

    /// Column index for a role the mapping is required to contain
    pub fn index(&self, role: Role) -> CalcResult<usize> {
        self.get(role)
            .map(|c| c.index)
            .ok_or_else(|| CalcError::missing_column(role.name(), &[]))
    }

    /// Number of mapped roles
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when nothing is mapped
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// A header after normalization
#[derive(Debug, Clone, PartialEq)]
struct NormalizedHeader {
    text: String,
    unit: Option<String>,
}

/// Case-fold, trim, strip bracketed units and collapse separators.
fn normalize(header: &str) -> NormalizedHeader {
    let mut text = String::new();
    let mut unit = String::new();
    let mut depth = 0usize;

    for c in header.chars() {
        match c {
            '(' | '[' => {
                depth += 1;
                if depth == 1 && !unit.is_empty() {
                    unit.push(' ');
                }
            }
            ')' | ']' if depth > 0 => depth -= 1,
            _ if depth > 0 => unit.push(c),
            '_' | '-' => text.push(' '),
            _ => text.extend(c.to_lowercase()),
        }
    }

    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let unit = unit.trim().to_string();
    NormalizedHeader {
        text,
        unit: if unit.is_empty() { None } else { Some(unit) },
    }
}

fn is_weak(alias: &str) -> bool {
    alias.chars().count() == 1
}

/// Does the normalized header contain `alias`? Weak aliases must be a whole word.
fn contains_alias(text: &str, alias: &str) -> bool {
    if is_weak(alias) {
        text.split(' ').any(|word| word == alias)
    } else {
        text.contains(alias)
    }
}

/// Outcome of resolving one role
#[derive(Debug, Clone, PartialEq)]
enum Resolution {
    Resolved(usize),
    Ambiguous(Vec<usize>),
    Unresolved,
}

impl Resolution {
    fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Role a header exactly names, if any
fn exact_role(text: &str) -> Option<Role> {
    Role::ALL
        .into_iter()
        .find(|role| role.aliases().iter().any(|a| *a == text))
}

fn resolve_role(role: Role, headers: &[NormalizedHeader], claimed: &[Option<Role>]) -> Resolution {
    let aliases = role.aliases();

    // Headers containing an alias, excluding those another role names exactly
    let substring_candidates = |skip: Option<usize>| -> Vec<usize> {
        headers
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .filter(|(i, _)| claimed[*i].map_or(true, |r| r == role))
            .filter(|(_, h)| aliases.iter().any(|a| contains_alias(&h.text, a)))
            .map(|(i, _)| i)
            .collect()
    };

    let best_exact = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| aliases.iter().position(|a| *a == h.text).map(|rank| (rank, i)))
        .min_by_key(|(rank, _)| *rank);

    if let Some((rank, _)) = best_exact {
        let winners: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.text == aliases[rank])
            .map(|(i, _)| i)
            .collect();
        if winners.len() > 1 {
            return Resolution::Ambiguous(winners);
        }
        let col = winners[0];
        if !is_weak(aliases[rank]) {
            return Resolution::Resolved(col);
        }
        let others = substring_candidates(Some(col));
        if others.is_empty() {
            return Resolution::Resolved(col);
        }
        let mut all = vec![col];
        all.extend(others);
        all.sort_unstable();
        return Resolution::Ambiguous(all);
    }

    match substring_candidates(None).as_slice() {
        [] => Resolution::Unresolved,
        [only] => Resolution::Resolved(*only),
        many => Resolution::Ambiguous(many.to_vec()),
    }
}

fn role_error(role: Role, resolution: &Resolution, table: &RawTable) -> CalcError {
    match resolution {
        Resolution::Ambiguous(cols) => CalcError::ambiguous_column(
            role.name(),
            cols.iter().map(|&i| table.headers[i].clone()).collect(),
        ),
        _ => CalcError::missing_column(role.name(), &table.headers),
    }
}

/// Map table headers to roles and classify the table.
///
/// Checks the first `settings.validation_sample_rows` rows of every chosen
/// column for numeric content; full conversion happens later.
///
/// # Errors
///
/// * `InvalidData` - no headers, no data rows, or a non-numeric sample cell
/// * `AmbiguousColumn` - several headers compete for a required role
/// * `MissingColumn` - neither `[position, load]` nor `[position, shear, moment]` resolves
pub fn resolve(table: &RawTable, settings: &AnalysisSettings) -> CalcResult<(ColumnMapping, Mode)> {
    if table.headers.is_empty() {
        return Err(CalcError::invalid_table("Table has no header row"));
    }
    if table.is_empty() {
        return Err(CalcError::invalid_table("Table has no data rows"));
    }

    let headers: Vec<NormalizedHeader> = table.headers.iter().map(|h| normalize(h)).collect();
    let claimed: Vec<Option<Role>> = headers.iter().map(|h| exact_role(&h.text)).collect();

    let resolutions: BTreeMap<Role, Resolution> = Role::ALL
        .into_iter()
        .map(|role| (role, resolve_role(role, &headers, &claimed)))
        .collect();

    for (role, resolution) in &resolutions {
        debug!(role = role.name(), ?resolution, "column resolution");
    }

    let satisfied = |mode: Mode| mode.required_roles().iter().all(|r| resolutions[r].is_resolved());

    // Precomputed results supersede raw loads
    let mode = if satisfied(Mode::Series) {
        Mode::Series
    } else if satisfied(Mode::Loads) {
        Mode::Loads
    } else {
        let aiming_at_series = [Role::Shear, Role::Moment]
            .iter()
            .any(|r| resolutions[r] != Resolution::Unresolved);
        let target = if aiming_at_series { Mode::Series } else { Mode::Loads };
        let roles = target.required_roles();

        let failing = roles
            .iter()
            .find(|r| matches!(resolutions[*r], Resolution::Ambiguous(_)))
            .or_else(|| roles.iter().find(|r| !resolutions[*r].is_resolved()));

        return Err(match failing {
            Some(role) => role_error(*role, &resolutions[role], table),
            None => CalcError::missing_column(roles[0].name(), &table.headers),
        });
    };

    let mut mapping = ColumnMapping::default();
    for role in mode.required_roles() {
        let Resolution::Resolved(index) = resolutions[role] else {
            return Err(role_error(*role, &resolutions[role], table));
        };
        if let Some((other, _)) = mapping.columns.iter().find(|(_, c)| c.index == index) {
            return Err(CalcError::ambiguous_column(
                role.name(),
                vec![format!("{} (already used for {})", table.headers[index], other)],
            ));
        }
        table.numeric_prefix(index, settings.validation_sample_rows)?;
        mapping.columns.insert(
            *role,
            MappedColumn {
                header: table.headers[index].clone(),
                index,
                unit: headers[index].unit.clone(),
            },
        );
    }

    let chosen: Vec<&str> = mapping.columns.values().map(|c| c.header.as_str()).collect();
    info!(mode = mode.code(), columns = ?chosen, "resolved input columns");
    Ok((mapping, mode))
}

// ============================================================================
// Tests
// ============================================================================
