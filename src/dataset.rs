//! Loading the project CSV into an immutable, US-only snapshot.
//!
//! [`load_projects`] reads the raw rows (plain or gzip-compressed CSV),
//! [`Dataset`] wraps the geography-filtered, category-normalized record set
//! every page works from, and [`DatasetCache`] memoizes snapshots by path.

use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DataLoadError;
use crate::pipeline::filter::{filter_country, normalize_categories};

/// Columns that must be present in the header row.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "name",
    "location_country",
    "location_state",
    "category_parent_name",
    "converted_pledged_amount",
    "backers_count",
    "goal",
];

/// Only projects located in this country are analyzed.
pub const TARGET_COUNTRY: &str = "US";

/// Label given to projects without a parent category.
pub const OTHER_CATEGORY: &str = "Other";

/// A single project row. Columns not listed here are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProjectRecord {
    pub id: u64,
    pub name: String,
    pub location_country: String,
    pub location_state: Option<String>,
    pub category_parent_name: Option<String>,
    pub converted_pledged_amount: f64,
    pub backers_count: u64,
    pub goal: f64,
}

impl ProjectRecord {
    pub fn category(&self) -> Option<&str> {
        self.category_parent_name.as_deref()
    }

    pub fn state(&self) -> Option<&str> {
        self.location_state.as_deref()
    }

    pub fn pledged(&self) -> f64 {
        self.converted_pledged_amount
    }
}

/// Reads every project row from `reader`.
///
/// # Errors
///
/// Returns [`DataLoadError::MissingColumn`] when the header lacks one of
/// [`REQUIRED_COLUMNS`], [`DataLoadError::MalformedRow`] for the first row
/// that cannot be parsed and [`DataLoadError::NonFiniteValue`] for a NaN or
/// infinite amount.
pub fn read_projects<R: Read>(reader: R) -> Result<Vec<ProjectRecord>, DataLoadError> {
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr.headers()?.clone();
    if let Some(column) = REQUIRED_COLUMNS
        .iter()
        .copied()
        .find(|column| !headers.iter().any(|h| h.trim() == *column))
    {
        return Err(DataLoadError::MissingColumn { column });
    }

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result.map_err(|source| DataLoadError::MalformedRow {
            line: source.position().map(|p| p.line()).unwrap_or_default(),
            source,
        })?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let record: ProjectRecord = row
            .deserialize(Some(&headers))
            .map_err(|source| DataLoadError::MalformedRow { line, source })?;
        check_finite(&record, line)?;
        records.push(record);
    }

    Ok(records)
}

fn check_finite(record: &ProjectRecord, line: u64) -> Result<(), DataLoadError> {
    for (column, value) in [
        ("converted_pledged_amount", record.converted_pledged_amount),
        ("goal", record.goal),
    ] {
        if !value.is_finite() {
            return Err(DataLoadError::NonFiniteValue {
                line,
                column,
                value,
            });
        }
    }
    Ok(())
}

/// Loads all rows of the CSV at `path`. Paths ending in `.gz` are gunzipped.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_projects(path: &Path) -> Result<Vec<ProjectRecord>, DataLoadError> {
    if !path.exists() {
        return Err(DataLoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let gzipped = path.extension().and_then(|e| e.to_str()) == Some("gz");
    let reader: Box<dyn Read> = if gzipped {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let records = read_projects(reader)?;
    debug!(rows = records.len(), gzipped, "Dataset rows parsed");
    Ok(records)
}

/// Read-only snapshot of the US projects with normalized categories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<ProjectRecord>,
}

impl Dataset {
    /// Builds the snapshot: geography filter first, then category normalization.
    pub fn from_records(records: Vec<ProjectRecord>) -> Self {
        let total = records.len();
        let records = normalize_categories(filter_country(records, TARGET_COUNTRY));
        info!(total, kept = records.len(), country = TARGET_COUNTRY, "Dataset snapshot built");
        Self { records }
    }

    pub fn open(path: &Path) -> Result<Self, DataLoadError> {
        Ok(Self::from_records(load_projects(path)?))
    }

    pub fn records(&self) -> &[ProjectRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct category labels, sorted.
    pub fn categories(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter_map(ProjectRecord::category)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Memoizes [`Dataset`] snapshots by path so repeated page builds share one
/// load.
///
/// Meant for long-lived callers that embed the library and build many views.
/// The CLI builds a single view per run and opens the dataset directly.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<PathBuf, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached snapshot for `path`, loading it on first use.
    ///
    /// Failed loads are not cached.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<Dataset>, DataLoadError> {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(dataset) = entries.get(&key) {
            debug!(path = %key.display(), "Dataset cache hit");
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(Dataset::open(path)?);
        entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
