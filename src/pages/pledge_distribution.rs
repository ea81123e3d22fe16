//! Page 2: distribution of pledged amounts and per-category bars.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dataset::{Dataset, ProjectRecord};
use crate::error::StatsError;
use crate::pages::Panel;
use crate::pipeline::{
    Aggregation, CategorySelection, Field, GroupKey, RangeControl, RangeFilter, aggregate,
    filter_categories, filter_range, range_control,
};
use crate::stats::{HistogramBin, histogram, mean, median, percentile};

pub const DEFAULT_BINS: usize = 20;

/// Metric shown by the category bar chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BarMetric {
    #[default]
    TotalPledged,
    AveragePledged,
    TotalProjects,
}

impl BarMetric {
    fn selector(&self) -> (Field, Aggregation) {
        match self {
            BarMetric::TotalPledged => (Field::Pledged, Aggregation::Sum),
            BarMetric::AveragePledged => (Field::Pledged, Aggregation::Mean),
            BarMetric::TotalProjects => (Field::Pledged, Aggregation::Count),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BarMetric::TotalPledged => "total-pledged",
            BarMetric::AveragePledged => "average-pledged",
            BarMetric::TotalProjects => "total-projects",
        }
    }
}

impl fmt::Display for BarMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BarMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            BarMetric::TotalPledged,
            BarMetric::AveragePledged,
            BarMetric::TotalProjects,
        ]
        .into_iter()
        .find(|m| m.name() == s)
        .ok_or_else(|| {
            format!("unknown metric '{s}', expected total-pledged, average-pledged or total-projects")
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PledgeDistributionFilter {
    pub categories: CategorySelection,
    /// Range on a single project's pledged amount.
    pub pledged: Option<RangeFilter>,
    pub metric: BarMetric,
    pub bins: usize,
}

impl Default for PledgeDistributionFilter {
    fn default() -> Self {
        Self {
            categories: CategorySelection::All,
            pledged: None,
            metric: BarMetric::default(),
            bins: DEFAULT_BINS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PledgeSummary {
    pub projects: usize,
    pub median: f64,
    pub mean: f64,
    pub p25: f64,
    pub p75: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub category: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PledgeDistribution {
    pub pledged_control: RangeControl,
    pub summary: Panel<PledgeSummary>,
    pub histogram: Panel<Vec<HistogramBin>>,
    pub metric: BarMetric,
    /// Sorted ascending by value.
    pub bars: Panel<Vec<Bar>>,
}

fn summarize(values: &[f64]) -> Result<PledgeSummary, StatsError> {
    Ok(PledgeSummary {
        projects: values.len(),
        median: median(values)?,
        mean: mean(values),
        p25: percentile(values, 0.25)?,
        p75: percentile(values, 0.75)?,
    })
}

fn bars(records: &[&ProjectRecord], metric: BarMetric) -> Vec<Bar> {
    let (field, aggregation) = metric.selector();
    let mut bars: Vec<Bar> = aggregate(records.iter().copied(), GroupKey::Category)
        .into_iter()
        .map(|row| Bar {
            value: row.value(field, aggregation),
            category: row.key,
        })
        .collect();

    bars.sort_by(|a, b| {
        a.value
            .total_cmp(&b.value)
            .then_with(|| a.category.cmp(&b.category))
    });
    bars
}

#[tracing::instrument(skip_all, fields(metric = %filter.metric, bins = filter.bins))]
pub fn build(dataset: &Dataset, filter: &PledgeDistributionFilter) -> PledgeDistribution {
    let records = filter_categories(dataset.records(), &filter.categories);

    let pledged_control = range_control(
        "pledged",
        records.iter().map(|r| r.pledged()),
        filter.pledged,
    );
    let records = filter_range(records, pledged_control.active_range(), |r| r.pledged());

    let values: Vec<f64> = records.iter().map(|r| r.pledged()).collect();

    let summary = match summarize(&values) {
        Ok(summary) => Panel::Ready(summary),
        Err(StatsError::EmptyData) => Panel::empty("selected categories and pledged range"),
        Err(err) => {
            warn!(error = %err, "Pledge summary unavailable");
            Panel::no_data(err)
        }
    };

    let histogram = match histogram(&values, filter.bins) {
        Ok(bins) => Panel::Ready(bins),
        Err(_) => Panel::empty("pledged histogram"),
    };

    info!(records = records.len(), "Pledge distribution built");

    PledgeDistribution {
        pledged_control,
        summary,
        histogram,
        metric: filter.metric,
        bars: Panel::rows(bars(&records, filter.metric), "category bars"),
    }
}
