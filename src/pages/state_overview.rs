//! Page 1: headline metrics and the two state maps.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::Dataset;
use crate::pages::Panel;
use crate::pipeline::{
    AggregateRow, CategorySelection, GroupKey, HeadlineMetrics, RangeControl, RangeFilter,
    aggregate, filter_categories, filter_range, headline_metrics, range_control,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateOverviewFilter {
    pub categories: CategorySelection,
    /// Range on a state's total pledged amount.
    pub pledged_total: Option<RangeFilter>,
    /// Range on a state's number of projects.
    pub project_count: Option<RangeFilter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateOverview {
    pub metrics: Panel<HeadlineMetrics>,
    pub pledged_control: RangeControl,
    /// States shaded by total pledged.
    pub pledged_map: Panel<Vec<AggregateRow>>,
    pub count_control: RangeControl,
    /// States shaded by number of projects; also narrowed by the pledged range.
    pub count_map: Panel<Vec<AggregateRow>>,
}

#[tracing::instrument(skip_all, fields(categories = ?filter.categories))]
pub fn build(dataset: &Dataset, filter: &StateOverviewFilter) -> StateOverview {
    let records = filter_categories(dataset.records(), &filter.categories);

    let metrics = match headline_metrics(&records) {
        Some(metrics) => Panel::Ready(metrics),
        None => Panel::empty("selected categories"),
    };

    let by_state = aggregate(records.iter().copied(), GroupKey::State);

    let pledged_control = range_control(
        "total_pledged",
        by_state.iter().map(|r| r.total_pledged),
        filter.pledged_total,
    );
    let count_control = range_control(
        "project_count",
        by_state.iter().map(|r| r.count as f64),
        filter.project_count,
    );

    let pledged_rows = filter_range(by_state, pledged_control.active_range(), |r| {
        r.total_pledged
    });
    let count_rows = filter_range(pledged_rows.clone(), count_control.active_range(), |r| {
        r.count as f64
    });

    info!(
        records = records.len(),
        pledged_states = pledged_rows.len(),
        count_states = count_rows.len(),
        "State overview built"
    );

    StateOverview {
        metrics,
        pledged_control,
        pledged_map: Panel::rows(pledged_rows, "states in pledged range"),
        count_control,
        count_map: Panel::rows(count_rows, "states in project count range"),
    }
}
