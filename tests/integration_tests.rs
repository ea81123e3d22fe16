use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kickstats::dataset::{Dataset, DatasetCache};
use kickstats::error::DataLoadError;
use kickstats::pages::goal_comparison::{self, GoalComparisonFilter};
use kickstats::pages::pledge_distribution::{self, PledgeDistributionFilter};
use kickstats::pages::state_overview::{self, StateOverviewFilter};
use kickstats::pages::{Panel, Report};
use kickstats::pipeline::{CategorySelection, GroupKey, aggregate};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/most_funded_sample.csv")
}

fn dataset() -> Dataset {
    Dataset::open(&fixture()).expect("Failed to load fixture")
}

#[test]
fn test_fixture_snapshot_is_us_only_and_normalized() {
    let dataset = dataset();

    assert_eq!(dataset.len(), 12);
    assert_eq!(
        dataset.categories(),
        vec![
            "Design",
            "Fashion",
            "Film & Video",
            "Games",
            "Other",
            "Publishing",
            "Technology"
        ]
    );
}

#[test]
fn test_state_overview_end_to_end() {
    let view = state_overview::build(&dataset(), &StateOverviewFilter::default());

    assert_eq!(view.metrics.ready().unwrap().total_projects, 12);

    let rows = view.pledged_map.ready().unwrap();
    let keys: Vec<_> = rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["CA", "MI", "NY", "OR", "UT", "WA"]);
    // the project without a state has no group
    assert_eq!(rows.iter().map(|r| r.count).sum::<usize>(), 11);
}

#[test]
fn test_distribution_for_one_category() {
    let filter = PledgeDistributionFilter {
        categories: CategorySelection::only(["Games"]),
        ..Default::default()
    };
    let view = pledge_distribution::build(&dataset(), &filter);

    let summary = view.summary.ready().unwrap();
    assert_eq!(summary.projects, 3);
    assert_eq!(summary.median, 12393139.0);

    let bars = view.bars.ready().unwrap();
    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0].category, "Games");
}

#[test]
fn test_goal_comparison_thresholds() {
    let filter = GoalComparisonFilter {
        min_projects: 2,
        ..Default::default()
    };
    let view = goal_comparison::build(&dataset(), &filter);
    let order: Vec<_> = view
        .table
        .ready()
        .unwrap()
        .iter()
        .map(|r| r.category.as_str())
        .collect();
    assert_eq!(order, vec!["Design", "Games"]);
    assert_eq!(view.gauge.ready().unwrap().category, "Design");

    let filter = GoalComparisonFilter {
        min_projects: 0,
        ..Default::default()
    };
    let view = goal_comparison::build(&dataset(), &filter);
    let table = view.table.ready().unwrap();
    assert!(table.iter().all(|r| r.category != "Other"));

    let last = table.last().unwrap();
    assert_eq!(last.category, "Technology");
    assert_eq!(last.percentage_of_goal, None);
}

#[test]
fn test_empty_selection_is_no_data_on_every_page() {
    let dataset = dataset();
    let nothing = CategorySelection::only(Vec::<String>::new());

    let states = state_overview::build(
        &dataset,
        &StateOverviewFilter {
            categories: nothing.clone(),
            ..Default::default()
        },
    );
    let distribution = pledge_distribution::build(
        &dataset,
        &PledgeDistributionFilter {
            categories: nothing,
            ..Default::default()
        },
    );

    assert!(matches!(states.metrics, Panel::NoData { .. }));
    assert!(matches!(states.pledged_map, Panel::NoData { .. }));
    assert!(matches!(distribution.summary, Panel::NoData { .. }));
    assert!(matches!(distribution.bars, Panel::NoData { .. }));
}

#[test]
fn test_group_counts_match_snapshot() {
    let dataset = dataset();
    let rows = aggregate(dataset.records(), GroupKey::Category);

    assert_eq!(rows.iter().map(|r| r.count).sum::<usize>(), dataset.len());
    assert!(rows.iter().all(|r| r.count > 0));
}

#[test]
fn test_missing_column_is_reported() {
    let path = std::env::temp_dir().join("kickstats_it_missing_goal.csv");
    fs::write(
        &path,
        "id,name,location_country,location_state,category_parent_name,converted_pledged_amount,backers_count\n1,A,US,CA,Art,10,1\n",
    )
    .unwrap();

    let err = Dataset::open(&path).unwrap_err();
    assert!(matches!(err, DataLoadError::MissingColumn { column: "goal" }));

    fs::remove_file(&path).unwrap();
}

#[test]
fn test_cache_shares_snapshot() {
    let cache = DatasetCache::new();
    let first = cache.get_or_load(&fixture()).unwrap();
    let second = cache.get_or_load(&fixture()).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_report_serializes_panels() {
    let dataset = dataset();
    let view = state_overview::build(&dataset, &StateOverviewFilter::default());
    let report = Report::new("states", "fixture", dataset.len(), view);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["page"], "states");
    assert_eq!(json["projects"], 12);
    assert_eq!(json["view"]["metrics"]["status"], "ready");
    assert_eq!(json["view"]["pledged_control"]["state"], "active");
}
