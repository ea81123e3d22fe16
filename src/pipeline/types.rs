//! Data types used by the filter and aggregation pipeline.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dataset::ProjectRecord;
use crate::error::FilterError;
use crate::stats::percentage_of;

/// Column used to partition records before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    State,
    Category,
}

impl GroupKey {
    /// Returns the grouping value of `record`, or `None` when it has none.
    pub fn key_of<'a>(&self, record: &'a ProjectRecord) -> Option<&'a str> {
        match self {
            GroupKey::State => record.state(),
            GroupKey::Category => record.category(),
        }
    }
}

/// Numeric column of a project record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Pledged,
    Backers,
    Goal,
}

impl Field {
    pub fn value_of(&self, record: &ProjectRecord) -> f64 {
        match self {
            Field::Pledged => record.converted_pledged_amount,
            Field::Backers => record.backers_count as f64,
            Field::Goal => record.goal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Count,
    Mean,
}

/// One group of records with its summary metrics.
///
/// `count` is never zero: groups only exist for keys that occur in the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: String,
    pub count: usize,
    pub total_pledged: f64,
    pub average_pledged: f64,
    pub total_backers: f64,
    pub average_backers: f64,
    pub total_goal: f64,
    pub average_goal: f64,
}

impl AggregateRow {
    /// Looks up a single metric of this row.
    pub fn value(&self, field: Field, aggregation: Aggregation) -> f64 {
        match (aggregation, field) {
            (Aggregation::Count, _) => self.count as f64,
            (Aggregation::Sum, Field::Pledged) => self.total_pledged,
            (Aggregation::Sum, Field::Backers) => self.total_backers,
            (Aggregation::Sum, Field::Goal) => self.total_goal,
            (Aggregation::Mean, Field::Pledged) => self.average_pledged,
            (Aggregation::Mean, Field::Backers) => self.average_backers,
            (Aggregation::Mean, Field::Goal) => self.average_goal,
        }
    }

    /// Mean pledged as a percentage of mean goal; `None` when the mean goal is 0.
    pub fn percentage_of_goal(&self) -> Option<f64> {
        percentage_of(self.average_pledged, self.average_goal)
    }
}

/// Totals over a filtered record set, shown above the maps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineMetrics {
    pub total_projects: usize,
    pub total_pledged: f64,
    pub average_pledged: f64,
    pub average_backers: f64,
}

/// Which categories a page should keep.
///
/// `Only` with an empty set keeps nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySelection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl CategorySelection {
    pub fn only<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CategorySelection::Only(labels.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, category: Option<&str>) -> bool {
        match self {
            CategorySelection::All => true,
            CategorySelection::Only(labels) => category.is_some_and(|c| labels.contains(c)),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CategorySelection::Only(labels) if labels.is_empty())
    }
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    pub lo: f64,
    pub hi: f64,
}

impl RangeFilter {
    pub fn new(lo: f64, hi: f64) -> Result<Self, FilterError> {
        if !lo.is_finite() || !hi.is_finite() {
            return Err(FilterError::NonFiniteBound { lo, hi });
        }
        if lo > hi {
            return Err(FilterError::InvertedRange { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lo <= value && value <= self.hi
    }

    /// Narrows this range to `[min, max]`. A NaN bound widens to the limit.
    pub fn clamp_to(&self, min: f64, max: f64) -> Self {
        let lo = self.lo.max(min).min(max);
        let hi = self.hi.min(max).max(lo);
        Self { lo, hi }
    }
}

impl fmt::Display for RangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.lo, self.hi)
    }
}

impl FromStr for RangeFilter {
    type Err = FilterError;

    /// Parses `LO..HI`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unparsable = || FilterError::Unparsable(s.to_string());
        let (lo, hi) = s.split_once("..").ok_or_else(unparsable)?;
        let lo = lo.trim().parse::<f64>().map_err(|_| unparsable())?;
        let hi = hi.trim().parse::<f64>().map_err(|_| unparsable())?;
        RangeFilter::new(lo, hi)
    }
}

/// State of a range slider derived from the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RangeControl {
    /// The data spans a real interval; `selected` is the applied range.
    Active {
        min: f64,
        max: f64,
        selected: RangeFilter,
    },
    /// No slider can be offered; the filter is not applied.
    Skipped { reason: String },
}

impl RangeControl {
    pub fn active_range(&self) -> Option<&RangeFilter> {
        match self {
            RangeControl::Active { selected, .. } => Some(selected),
            RangeControl::Skipped { .. } => None,
        }
    }
}
