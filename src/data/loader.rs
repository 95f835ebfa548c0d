//! CSV Data Loader Module
//! Parses uploaded CSV bytes with Polars, normalizes column names and
//! classifies every column once for the lifetime of the dataset.

use log::{debug, info};
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// Rows sampled by Polars when inferring column types.
const INFER_SCHEMA_ROWS: usize = 10_000;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to parse CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("The uploaded file is empty")]
    Empty,
    #[error("The CSV file has no columns")]
    NoColumns,
    #[error("Two columns share the name '{0}' after normalization")]
    DuplicateColumn(String),
}

/// Column classification computed by the load-time schema pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Integer or floating point values, usable as a metric
    Numeric,
    /// Text-like values (state codes, names, flags)
    Categorical,
    /// Entirely null, or a type the pipeline cannot use
    Unusable,
}

/// Parsed CSV table with normalized column names.
///
/// Immutable once built: filters produce new frames and never touch this one.
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
    kinds: Vec<(String, ColumnKind)>,
}

impl Dataset {
    /// Normalize column names in place and run the schema pass.
    pub fn from_dataframe(mut df: DataFrame) -> Result<Self, LoaderError> {
        if df.width() == 0 {
            return Err(LoaderError::NoColumns);
        }

        let normalized: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| normalize_column_name(name))
            .collect();

        let mut seen = HashSet::new();
        for name in &normalized {
            if !seen.insert(name.as_str()) {
                return Err(LoaderError::DuplicateColumn(name.clone()));
            }
        }

        df.set_column_names(normalized.iter().map(String::as_str))?;

        let kinds: Vec<(String, ColumnKind)> = df
            .get_columns()
            .par_iter()
            .map(|col| (col.name().to_string(), classify_column(col)))
            .collect();

        for (name, kind) in &kinds {
            debug!("Column '{}' classified as {:?}", name, kind);
        }

        Ok(Self { df, kinds })
    }

    /// Get a reference to the underlying DataFrame.
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Normalized column names, in file order.
    pub fn column_names(&self) -> Vec<String> {
        self.kinds.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        self.kinds
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, kind)| *kind)
    }

    /// Names of the columns classified as numeric, in file order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.kinds
            .iter()
            .filter(|(_, kind)| *kind == ColumnKind::Numeric)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Trim surrounding whitespace (and a stray byte-order mark) and lowercase.
pub fn normalize_column_name(name: &str) -> String {
    name.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .to_lowercase()
}

fn classify_column(col: &Column) -> ColumnKind {
    if col.len() > 0 && col.null_count() == col.len() {
        return ColumnKind::Unusable;
    }

    match col.dtype() {
        DataType::Float32
        | DataType::Float64
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => ColumnKind::Numeric,
        DataType::String | DataType::Boolean | DataType::Categorical(..) | DataType::Date => {
            ColumnKind::Categorical
        }
        _ => ColumnKind::Unusable,
    }
}

/// Builds a [`Dataset`] from uploaded CSV content.
pub struct DataLoader;

impl DataLoader {
    /// Parse CSV bytes (comma separated, header row required).
    pub fn load_bytes(bytes: Vec<u8>) -> Result<Dataset, LoaderError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(LoaderError::Empty);
        }

        let size = bytes.len();
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;

        info!(
            "Parsed CSV ({} bytes): {} rows, {} columns",
            size,
            df.height(),
            df.width()
        );

        Dataset::from_dataframe(df)
    }

    /// Read a CSV file from disk and parse it.
    pub fn load_path(path: &Path) -> Result<Dataset, LoaderError> {
        info!("Loading CSV from {}", path.display());
        let bytes = std::fs::read(path)?;
        Self::load_bytes(bytes)
    }
}
