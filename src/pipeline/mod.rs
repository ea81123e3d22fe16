//! Filtering and aggregation over the project snapshot.
//!
//! Every page goes through the same steps: category selection, optional
//! range filters, then a group-by on state or category. Filters borrow from
//! the snapshot and return new views; nothing here mutates a record.

pub mod aggregate;
pub mod filter;
pub mod types;

pub use aggregate::{aggregate, headline_metrics};
pub use filter::{
    filter_categories, filter_country, filter_range, normalize_categories, range_control,
};
pub use types::{
    AggregateRow, Aggregation, CategorySelection, Field, GroupKey, HeadlineMetrics, RangeControl,
    RangeFilter,
};
