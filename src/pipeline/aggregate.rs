use std::collections::BTreeMap;

use tracing::debug;

use crate::dataset::ProjectRecord;
use crate::pipeline::types::{AggregateRow, GroupKey, HeadlineMetrics};
use crate::stats::mean;

#[derive(Default)]
struct GroupTotals {
    count: usize,
    pledged: f64,
    backers: f64,
    goal: f64,
}

/// Groups `records` by `key` and summarizes each group.
///
/// Rows come out sorted by key. Records without a value for `key` (a state
/// grouping over a project with no state) do not form a group.
pub fn aggregate<'a, I>(records: I, key: GroupKey) -> Vec<AggregateRow>
where
    I: IntoIterator<Item = &'a ProjectRecord>,
{
    let mut groups: BTreeMap<&str, GroupTotals> = BTreeMap::new();
    let mut unkeyed = 0usize;

    for record in records {
        let Some(group) = key.key_of(record) else {
            unkeyed += 1;
            continue;
        };

        let totals = groups.entry(group).or_default();
        totals.count += 1;
        totals.pledged += record.converted_pledged_amount;
        totals.backers += record.backers_count as f64;
        totals.goal += record.goal;
    }

    debug!(?key, groups = groups.len(), unkeyed, "Records aggregated");

    groups
        .into_iter()
        .map(|(group, t)| {
            let n = t.count as f64;
            AggregateRow {
                key: group.to_string(),
                count: t.count,
                total_pledged: t.pledged,
                average_pledged: t.pledged / n,
                total_backers: t.backers,
                average_backers: t.backers / n,
                total_goal: t.goal,
                average_goal: t.goal / n,
            }
        })
        .collect()
}

/// Summary figures over a whole record set. `None` when it is empty.
pub fn headline_metrics(records: &[&ProjectRecord]) -> Option<HeadlineMetrics> {
    if records.is_empty() {
        return None;
    }

    let pledged: Vec<f64> = records.iter().map(|r| r.converted_pledged_amount).collect();
    let backers: Vec<f64> = records.iter().map(|r| r.backers_count as f64).collect();

    Some(HeadlineMetrics {
        total_projects: records.len(),
        total_pledged: pledged.iter().sum(),
        average_pledged: mean(&pledged),
        average_backers: mean(&backers),
    })
}
