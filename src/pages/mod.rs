//! Page views of the dashboard.
//!
//! Each builder is a pure function of the dataset snapshot and the page's
//! filter state. Data-dependent sections are wrapped in [`Panel`] so that an
//! empty selection renders as a "no data" message instead of failing.

pub mod goal_comparison;
pub mod pledge_distribution;
pub mod state_overview;
pub mod takeaways;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::FilterError;

/// A section of a page that needs at least one record to be drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Panel<T> {
    Ready(T),
    NoData { reason: String },
}

impl<T> Panel<T> {
    pub fn no_data(reason: impl ToString) -> Self {
        Panel::NoData {
            reason: reason.to_string(),
        }
    }

    /// `NoData` for an empty filter result in `context`.
    pub fn empty(context: &'static str) -> Self {
        Self::no_data(FilterError::EmptyFilterResult { context })
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Panel::Ready(value) => Some(value),
            Panel::NoData { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Panel::Ready(_))
    }
}

impl<T> Panel<Vec<T>> {
    /// `Ready` when `rows` is non-empty.
    pub fn rows(rows: Vec<T>, context: &'static str) -> Self {
        if rows.is_empty() {
            Self::empty(context)
        } else {
            Panel::Ready(rows)
        }
    }
}

/// Envelope written around every page view.
#[derive(Debug, Serialize)]
pub struct Report<T> {
    pub page: &'static str,
    pub dataset: String,
    pub projects: usize,
    pub generated_at: DateTime<Utc>,
    pub view: T,
}

impl<T> Report<T> {
    pub fn new(page: &'static str, dataset: impl Into<String>, projects: usize, view: T) -> Self {
        Self {
            page,
            dataset: dataset.into(),
            projects,
            generated_at: Utc::now(),
            view,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_rows() {
        assert!(Panel::rows(vec![1, 2], "rows").is_ready());

        let empty: Panel<Vec<i32>> = Panel::rows(Vec::new(), "rows");
        assert!(!empty.is_ready());
        assert!(empty.ready().is_none());
    }

    #[test]
    fn test_panel_serializes_with_status_tag() {
        let ready = serde_json::to_value(Panel::Ready(vec![1, 2])).unwrap();
        assert_eq!(ready["status"], "ready");
        assert_eq!(ready["data"][1], 2);

        let empty = serde_json::to_value(Panel::<u8>::empty("state map")).unwrap();
        assert_eq!(empty["status"], "no_data");
        assert!(
            empty["data"]["reason"]
                .as_str()
                .unwrap()
                .contains("state map")
        );
    }
}
