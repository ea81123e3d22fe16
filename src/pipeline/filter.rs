use tracing::debug;

use crate::dataset::{OTHER_CATEGORY, ProjectRecord};
use crate::error::FilterError;
use crate::pipeline::types::{CategorySelection, RangeControl, RangeFilter};

/// Keeps the records located in `country`.
pub fn filter_country(records: Vec<ProjectRecord>, country: &str) -> Vec<ProjectRecord> {
    records
        .into_iter()
        .filter(|r| r.location_country == country)
        .collect()
}

/// Gives every record without a parent category the [`OTHER_CATEGORY`] label.
pub fn normalize_categories(records: Vec<ProjectRecord>) -> Vec<ProjectRecord> {
    records
        .into_iter()
        .map(|mut r| {
            if r.category_parent_name.is_none() {
                r.category_parent_name = Some(OTHER_CATEGORY.to_string());
            }
            r
        })
        .collect()
}

/// Borrows the records whose category is part of `selection`.
pub fn filter_categories<'a, I>(records: I, selection: &CategorySelection) -> Vec<&'a ProjectRecord>
where
    I: IntoIterator<Item = &'a ProjectRecord>,
{
    let kept: Vec<_> = records
        .into_iter()
        .filter(|r| selection.matches(r.category()))
        .collect();
    debug!(kept = kept.len(), "Category filter applied");
    kept
}

/// Keeps the items whose `value` lies inside `range`. `None` keeps everything.
pub fn filter_range<T, F>(items: Vec<T>, range: Option<&RangeFilter>, value: F) -> Vec<T>
where
    F: Fn(&T) -> f64,
{
    match range {
        Some(range) => items.into_iter().filter(|i| range.contains(value(i))).collect(),
        None => items,
    }
}

/// Derives slider bounds for `field` from `values` and applies `requested`.
///
/// Bounds are widened to whole units so every value stays selectable. The
/// requested range is clamped into the bounds; without one the full span is
/// selected. Non-finite values are ignored. Empty or constant data yields
/// [`RangeControl::Skipped`].
pub fn range_control<I>(field: &'static str, values: I, requested: Option<RangeFilter>) -> RangeControl
where
    I: IntoIterator<Item = f64>,
{
    match slider_bounds(field, values) {
        Ok((min, max)) => {
            let selected = requested
                .map(|r| r.clamp_to(min, max))
                .unwrap_or(RangeFilter { lo: min, hi: max });
            RangeControl::Active { min, max, selected }
        }
        Err(err) => {
            debug!(field, error = %err, "Range control skipped");
            RangeControl::Skipped {
                reason: err.to_string(),
            }
        }
    }
}

fn slider_bounds<I>(field: &'static str, values: I) -> Result<(f64, f64), FilterError>
where
    I: IntoIterator<Item = f64>,
{
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .ok_or(FilterError::EmptyFilterResult { context: field })?;

    if min >= max {
        return Err(FilterError::DegenerateRange { field, value: min });
    }
    Ok((min.floor(), max.ceil()))
}
