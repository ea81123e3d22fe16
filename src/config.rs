use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::pages::goal_comparison::GoalComparisonFilter;
use crate::pages::pledge_distribution::{BarMetric, PledgeDistributionFilter};
use crate::pages::state_overview::StateOverviewFilter;
use crate::pipeline::{CategorySelection, RangeFilter};

/// Default filter state read from a JSON file.
///
/// Every key is optional; command-line flags take precedence:
/// ```json
/// {
///   "categories": ["Games", "Design"],
///   "pledged_total": { "lo": 0, "hi": 50000000 },
///   "project_count": { "lo": 10, "hi": 500 },
///   "pledged": { "lo": 0, "hi": 2000000 },
///   "metric": "average-pledged",
///   "bins": 30,
///   "category": "Fashion",
///   "min_projects": 10
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    pub categories: Option<Vec<String>>,
    pub pledged_total: Option<RangeFilter>,
    pub project_count: Option<RangeFilter>,
    pub pledged: Option<RangeFilter>,
    pub metric: Option<BarMetric>,
    pub bins: Option<usize>,
    pub category: Option<String>,
    pub min_projects: Option<usize>,
}

impl FilterConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading filter file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing filter file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        for range in [config.pledged_total, config.project_count, config.pledged]
            .into_iter()
            .flatten()
        {
            RangeFilter::new(range.lo, range.hi)?;
        }
        Ok(config)
    }

    /// Category selection from explicit flags, falling back to the file.
    ///
    /// `none` selects no category at all.
    pub fn categories(&self, flags: &[String], none: bool) -> CategorySelection {
        if none {
            CategorySelection::only(Vec::<String>::new())
        } else if !flags.is_empty() {
            CategorySelection::only(flags.iter().cloned())
        } else {
            self.categories
                .clone()
                .map(CategorySelection::only)
                .unwrap_or_default()
        }
    }

    pub fn state_overview(&self) -> StateOverviewFilter {
        StateOverviewFilter {
            categories: self.categories(&[], false),
            pledged_total: self.pledged_total,
            project_count: self.project_count,
        }
    }

    pub fn pledge_distribution(&self) -> PledgeDistributionFilter {
        let defaults = PledgeDistributionFilter::default();
        PledgeDistributionFilter {
            categories: self.categories(&[], false),
            pledged: self.pledged,
            metric: self.metric.unwrap_or(defaults.metric),
            bins: self.bins.unwrap_or(defaults.bins),
        }
    }

    pub fn goal_comparison(&self) -> GoalComparisonFilter {
        let defaults = GoalComparisonFilter::default();
        GoalComparisonFilter {
            category: self.category.clone(),
            min_projects: self.min_projects.unwrap_or(defaults.min_projects),
        }
    }
}
