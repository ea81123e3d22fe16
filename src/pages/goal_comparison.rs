//! Page 3: average pledged against average goal for well-supported categories.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dataset::{Dataset, OTHER_CATEGORY, ProjectRecord};
use crate::pages::Panel;
use crate::pipeline::{CategorySelection, GroupKey, aggregate, filter_categories};
use crate::stats::{LinearFit, linear_fit};

/// Categories need strictly more projects than this to be compared.
pub const DEFAULT_MIN_PROJECTS: usize = 10;

/// Head room added above the pledged value on the gauge axis.
const GAUGE_HEADROOM: f64 = 1.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalComparisonFilter {
    /// Category shown on the gauge; defaults to the top row of the table.
    pub category: Option<String>,
    pub min_projects: usize,
}

impl Default for GoalComparisonFilter {
    fn default() -> Self {
        Self {
            category: None,
            min_projects: DEFAULT_MIN_PROJECTS,
        }
    }
}

/// Per-category comparison, amounts rounded to whole dollars with halves to even.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalRow {
    pub category: String,
    pub projects: usize,
    pub average_pledged: f64,
    pub average_goal: f64,
    /// Rounded percentage; empty when the average goal is zero.
    pub percentage_of_goal: Option<f64>,
}

/// Bullet gauge: pledged bar with the goal as threshold marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulletGauge {
    pub category: String,
    pub value: f64,
    pub reference: f64,
    pub delta: f64,
    pub axis_max: f64,
    pub percentage_of_goal: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub category: String,
    pub points: Vec<(f64, f64)>,
    pub trendline: Option<LinearFit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalComparison {
    /// Sorted by percentage of goal, highest first.
    pub table: Panel<Vec<GoalRow>>,
    pub gauge: Panel<BulletGauge>,
    pub pledged_vs_goal: Panel<Vec<ScatterSeries>>,
    pub pledged_vs_backers: Panel<Vec<ScatterSeries>>,
}

fn eligible_categories(dataset: &Dataset, min_projects: usize) -> BTreeSet<String> {
    aggregate(dataset.records(), GroupKey::Category)
        .into_iter()
        .filter(|row| row.count > min_projects && row.key != OTHER_CATEGORY)
        .map(|row| row.key)
        .collect()
}

fn goal_table(records: &[&ProjectRecord]) -> Vec<GoalRow> {
    let mut rows: Vec<GoalRow> = aggregate(records.iter().copied(), GroupKey::Category)
        .into_iter()
        .map(|row| GoalRow {
            percentage_of_goal: row.percentage_of_goal().map(f64::round_ties_even),
            average_pledged: row.average_pledged.round_ties_even(),
            average_goal: row.average_goal.round_ties_even(),
            projects: row.count,
            category: row.key,
        })
        .collect();

    rows.sort_by(|a, b| match (a.percentage_of_goal, b.percentage_of_goal) {
        (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.category.cmp(&b.category)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.category.cmp(&b.category),
    });
    rows
}

fn gauge(table: &[GoalRow], selected: Option<&str>) -> Panel<BulletGauge> {
    let row = match selected {
        Some(category) => table.iter().find(|r| r.category == category),
        None => table.first(),
    };

    match row {
        Some(row) => Panel::Ready(BulletGauge {
            category: row.category.clone(),
            value: row.average_pledged,
            reference: row.average_goal,
            delta: row.average_pledged - row.average_goal,
            axis_max: row.average_pledged * GAUGE_HEADROOM,
            percentage_of_goal: row.percentage_of_goal,
        }),
        None => match selected {
            Some(category) => {
                warn!(category, "Selected category is not eligible for comparison");
                Panel::no_data(format!("category '{category}' has no eligible projects"))
            }
            None => Panel::empty("eligible categories"),
        },
    }
}

fn scatter<F>(records: &[&ProjectRecord], y: F) -> Vec<ScatterSeries>
where
    F: Fn(&ProjectRecord) -> f64,
{
    let mut by_category: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
    for &record in records {
        if let Some(category) = record.category() {
            by_category
                .entry(category)
                .or_default()
                .push((record.pledged(), y(record)));
        }
    }

    by_category
        .into_iter()
        .map(|(category, points)| ScatterSeries {
            category: category.to_string(),
            trendline: linear_fit(&points),
            points,
        })
        .collect()
}

#[tracing::instrument(skip_all, fields(category = ?filter.category, min_projects = filter.min_projects))]
pub fn build(dataset: &Dataset, filter: &GoalComparisonFilter) -> GoalComparison {
    let eligible = eligible_categories(dataset, filter.min_projects);
    let records = filter_categories(dataset.records(), &CategorySelection::Only(eligible));

    let table = goal_table(&records);
    let gauge = gauge(&table, filter.category.as_deref());

    info!(
        categories = table.len(),
        records = records.len(),
        "Goal comparison built"
    );

    GoalComparison {
        gauge,
        table: Panel::rows(table, "categories above the project threshold"),
        pledged_vs_goal: Panel::rows(scatter(&records, |r| r.goal), "pledged vs goal"),
        pledged_vs_backers: Panel::rows(
            scatter(&records, |r| r.backers_count as f64),
            "pledged vs backers",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, category: Option<&str>, pledged: f64, goal: f64) -> ProjectRecord {
        ProjectRecord {
            id,
            name: format!("project {id}"),
            location_country: "US".to_string(),
            location_state: Some("CA".to_string()),
            category_parent_name: category.map(str::to_string),
            converted_pledged_amount: pledged,
            backers_count: id,
            goal,
        }
    }

    fn dataset() -> Dataset {
        let mut records = Vec::new();
        let mut id = 0;
        let mut push = |category: Option<&str>, n: usize, pledged: f64, goal: f64| {
            for i in 0..n {
                id += 1;
                records.push(record(id, category, pledged + i as f64, goal));
            }
        };
        // Design: 12 projects, mean pledged 1005.5, goal 50
        push(Some("Design"), 12, 1000.0, 50.0);
        // Games: 11 projects, mean pledged 505, goal 500
        push(Some("Games"), 11, 500.0, 500.0);
        // Music: 11 projects, zero goal
        push(Some("Music"), 11, 50.0, 0.0);
        // Art: too few projects
        push(Some("Art"), 10, 10.0, 5.0);
        // Other: enough projects but excluded
        push(None, 15, 10.0, 1.0);
        Dataset::from_records(records)
    }

    #[test]
    fn test_table_keeps_supported_categories_sorted_by_percentage() {
        let view = build(&dataset(), &GoalComparisonFilter::default());
        let table = view.table.ready().unwrap();

        let order: Vec<_> = table.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(order, vec!["Design", "Games", "Music"]);

        assert_eq!(table[0].projects, 12);
        assert_eq!(table[0].average_pledged, 1006.0);
        assert_eq!(table[0].percentage_of_goal, Some(2011.0));
        assert_eq!(table[1].percentage_of_goal, Some(101.0));
        assert_eq!(table[2].percentage_of_goal, None);
    }

    #[test]
    fn test_table_rounds_halves_to_even() {
        let records = [
            record(1, Some("Film"), 2.0, 1.0),
            record(2, Some("Film"), 3.0, 1.0),
            record(3, Some("Food"), 3.0, 4.0),
            record(4, Some("Food"), 4.0, 4.0),
        ];
        let refs: Vec<&ProjectRecord> = records.iter().collect();
        let table = goal_table(&refs);

        let film = table.iter().find(|r| r.category == "Film").unwrap();
        assert_eq!(film.average_pledged, 2.0);
        assert_eq!(film.percentage_of_goal, Some(250.0));

        let food = table.iter().find(|r| r.category == "Food").unwrap();
        assert_eq!(food.average_pledged, 4.0);
        assert_eq!(food.percentage_of_goal, Some(88.0));
    }

    #[test]
    fn test_gauge_defaults_to_top_row() {
        let view = build(&dataset(), &GoalComparisonFilter::default());
        let gauge = view.gauge.ready().unwrap();

        assert_eq!(gauge.category, "Design");
        assert_eq!(gauge.reference, 50.0);
        assert_eq!(gauge.delta, 956.0);
        assert!((gauge.axis_max - 1106.6).abs() < 1e-9);
    }

    #[test]
    fn test_gauge_for_selected_and_unknown_category() {
        let filter = GoalComparisonFilter {
            category: Some("Games".into()),
            ..Default::default()
        };
        let view = build(&dataset(), &filter);
        assert_eq!(view.gauge.ready().unwrap().value, 505.0);

        let filter = GoalComparisonFilter {
            category: Some("Art".into()),
            ..Default::default()
        };
        assert!(!build(&dataset(), &filter).gauge.is_ready());
    }

    #[test]
    fn test_scatter_series_have_trendlines() {
        let view = build(&dataset(), &GoalComparisonFilter::default());

        let series = view.pledged_vs_backers.ready().unwrap();
        assert_eq!(series.len(), 3);
        assert!(series.iter().all(|s| s.trendline.is_some()));

        // goal is constant within each category, so the fit is flat
        let goal_series = view.pledged_vs_goal.ready().unwrap();
        let design = goal_series.iter().find(|s| s.category == "Design").unwrap();
        let fit = design.trendline.as_ref().unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 50.0);
    }

    #[test]
    fn test_threshold_excludes_everything() {
        let filter = GoalComparisonFilter {
            min_projects: 100,
            ..Default::default()
        };
        let view = build(&dataset(), &filter);

        assert!(!view.table.is_ready());
        assert!(!view.gauge.is_ready());
        assert!(!view.pledged_vs_goal.is_ready());
    }
}
