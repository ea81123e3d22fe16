//! Error types shared by the loader, the filter pipeline and the statistics helpers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce a record set from the input file. Always fatal.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("dataset '{}' does not exist", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read dataset '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("dataset is missing required column '{column}'")]
    MissingColumn { column: &'static str },
    #[error("non-finite {column} value {value} at line {line}")]
    NonFiniteValue {
        line: u64,
        column: &'static str,
        value: f64,
    },
    #[error("malformed row at line {line}: {source}")]
    MalformedRow {
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Conditions raised while narrowing a record set.
///
/// Page builders turn these into panel states instead of propagating them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("no records match the current filters ({context})")]
    EmptyFilterResult { context: &'static str },
    #[error("range for '{field}' collapses to the single value {value}")]
    DegenerateRange { field: &'static str, value: f64 },
    #[error("range lower bound {lo} exceeds upper bound {hi}")]
    InvertedRange { lo: f64, hi: f64 },
    #[error("range bounds must be finite numbers, got {lo}..{hi}")]
    NonFiniteBound { lo: f64, hi: f64 },
    #[error("invalid range '{0}', expected LO..HI")]
    Unparsable(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("cannot summarize an empty column")]
    EmptyData,
    #[error("quantile {q} must be in [0, 1]")]
    InvalidQuantile { q: f64 },
}
