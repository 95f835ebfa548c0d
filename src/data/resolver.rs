//! Column Resolver Module
//! Maps the logical year and state fields onto actual CSV column names.

use crate::data::loader::{normalize_column_name, Dataset};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Exact name of the year column.
pub const YEAR_COLUMN: &str = "ano";
/// Exact name of the state-code column.
pub const STATE_COLUMN: &str = "sigla_uf";

/// Rule used to find the year and state columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Columns must be named exactly `ano` and `sigla_uf`
    Exact,
    /// First column containing `ano`; first containing `sigla`+`uf`, else `estado`
    #[default]
    FuzzySubstring,
}

impl fmt::Display for ResolutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionPolicy::Exact => write!(f, "Exact"),
            ResolutionPolicy::FuzzySubstring => write!(f, "Fuzzy"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Year,
    State,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::Year => write!(f, "year"),
            ColumnRole::State => write!(f, "state"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Required column(s) missing: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("No {role} column found (expected a name containing {hint})")]
    NoCandidate {
        role: ColumnRole,
        hint: &'static str,
    },
    #[error("Column '{0}' matches both the year and the state field")]
    SharedColumn(String),
}

/// Actual column names backing the year and state fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub year: String,
    pub state: String,
}

/// Resolve the year and state columns of a loaded dataset.
pub fn resolve_columns(
    dataset: &Dataset,
    policy: ResolutionPolicy,
) -> Result<ResolvedColumns, SchemaError> {
    let resolved = resolve_names(&dataset.column_names(), policy)?;
    info!(
        "{} resolution: year='{}', state='{}'",
        policy, resolved.year, resolved.state
    );
    Ok(resolved)
}

/// Resolve against raw header names. Names are normalized before matching.
pub fn resolve_names(
    names: &[String],
    policy: ResolutionPolicy,
) -> Result<ResolvedColumns, SchemaError> {
    let normalized: Vec<String> = names.iter().map(|n| normalize_column_name(n)).collect();

    match policy {
        ResolutionPolicy::Exact => {
            let missing: Vec<String> = [YEAR_COLUMN, STATE_COLUMN]
                .iter()
                .filter(|required| !normalized.iter().any(|n| n == *required))
                .map(|required| required.to_string())
                .collect();

            if !missing.is_empty() {
                return Err(SchemaError::MissingColumns(missing));
            }

            Ok(ResolvedColumns {
                year: YEAR_COLUMN.to_string(),
                state: STATE_COLUMN.to_string(),
            })
        }
        ResolutionPolicy::FuzzySubstring => {
            let year = normalized
                .iter()
                .find(|n| n.contains("ano"))
                .ok_or(SchemaError::NoCandidate {
                    role: ColumnRole::Year,
                    hint: "'ano'",
                })?;

            let is_state = |n: &&String| n.contains("sigla") && n.contains("uf");
            let is_estado = |n: &&String| n.contains("estado");
            let others: Vec<&String> = normalized.iter().filter(|n| *n != year).collect();

            let state = others
                .iter()
                .copied()
                .find(is_state)
                .or_else(|| others.iter().copied().find(is_estado))
                .ok_or_else(|| {
                    // Only the year column itself looks like a state column
                    if is_state(&year) || is_estado(&year) {
                        SchemaError::SharedColumn(year.clone())
                    } else {
                        SchemaError::NoCandidate {
                            role: ColumnRole::State,
                            hint: "'sigla' and 'uf', or 'estado'",
                        }
                    }
                })?;

            Ok(ResolvedColumns {
                year: year.clone(),
                state: state.clone(),
            })
        }
    }
}
