use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};

use super::model::{Dataset, Record};

// ---------------------------------------------------------------------------
// FilterSpec – date range plus segment membership
// ---------------------------------------------------------------------------

/// Lookback used for the default start date.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// User-chosen filter for one render cycle.
///
/// An empty segment set selects nothing. An inverted range (start after
/// end) is allowed and simply matches no rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub selected_segments: BTreeSet<String>,
}

impl FilterSpec {
    /// Last `window_days` of the dataset, every segment selected.
    ///
    /// Start is `max(min_date, max_date - window_days)`; a window reaching past
    /// the calendar's range starts at `min_date`. Returns `None` for an empty
    /// dataset, which has no dates to anchor on.
    pub fn default_for(dataset: &Dataset, window_days: i64) -> Option<Self> {
        let min_date = dataset.min_date()?;
        let max_date = dataset.max_date()?;
        let start_date = Duration::try_days(window_days)
            .and_then(|window| max_date.checked_sub_signed(window))
            .map_or(min_date, |start| start.max(min_date));
        Some(FilterSpec {
            start_date,
            end_date: max_date,
            selected_segments: dataset.segments(),
        })
    }

    /// Inclusion predicate for a single record.
    pub fn matches(&self, record: &Record) -> bool {
        self.start_date <= record.date
            && record.date <= self.end_date
            && self.selected_segments.contains(&record.segment)
    }

    /// `"{start} to {end}"`, as printed in the summary export.
    pub fn period_label(&self) -> String {
        format!("{} to {}", self.start_date, self.end_date)
    }
}

// ---------------------------------------------------------------------------
// FilteredView – the matching subset
// ---------------------------------------------------------------------------

/// Records passing a [`FilterSpec`], in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView {
    pub records: Vec<Record>,
}

impl FilteredView {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows sorted newest first; rows sharing a date keep source order.
    pub fn sorted_by_date_desc(&self) -> Vec<&Record> {
        let mut rows: Vec<&Record> = self.records.iter().collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows
    }
}

/// Stable filter: keep every record matching `spec`, preserving order.
pub fn apply(dataset: &Dataset, spec: &FilterSpec) -> FilteredView {
    let records = dataset
        .records
        .iter()
        .filter(|r| spec.matches(r))
        .cloned()
        .collect();
    FilteredView { records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_sample;
    use crate::data::model::DataSource;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn segments(labels: &[&str]) -> BTreeSet<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_segment_selection_yields_empty_view() {
        let ds = load_sample();
        let spec = FilterSpec {
            start_date: date(2024, 1, 1),
            end_date: date(2024, 12, 31),
            selected_segments: BTreeSet::new(),
        };
        assert!(apply(&ds, &spec).is_empty());
    }

    #[test]
    fn inverted_range_yields_empty_view() {
        let ds = load_sample();
        let spec = FilterSpec {
            start_date: date(2024, 6, 1),
            end_date: date(2024, 1, 1),
            selected_segments: ds.segments(),
        };
        assert!(apply(&ds, &spec).is_empty());
    }

    #[test]
    fn bounds_are_inclusive() {
        let ds = load_sample();
        let spec = FilterSpec {
            start_date: date(2024, 1, 3),
            end_date: date(2024, 1, 5),
            selected_segments: ds.segments(),
        };
        let view = apply(&ds, &spec);
        let dates: Vec<_> = view.records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 3), date(2024, 1, 4), date(2024, 1, 5)]);
    }

    #[test]
    fn filter_is_set_exact_and_order_preserving() {
        let ds = load_sample();
        let spec = FilterSpec {
            start_date: date(2024, 1, 10),
            end_date: date(2024, 1, 25),
            selected_segments: segments(&["Mobile"]),
        };
        let view = apply(&ds, &spec);

        assert!(view.records.iter().all(|r| spec.matches(r)));
        let expected: Vec<Record> = ds.records.iter().filter(|r| spec.matches(r)).cloned().collect();
        assert_eq!(view.records, expected);
        assert_eq!(view.len(), 8);
        assert!(view.records.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn unknown_segment_matches_nothing() {
        let ds = load_sample();
        let spec = FilterSpec {
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 30),
            selected_segments: segments(&["Tablet"]),
        };
        assert!(apply(&ds, &spec).is_empty());
    }

    #[test]
    fn default_spec_covers_last_week() {
        let ds = load_sample();
        let spec = FilterSpec::default_for(&ds, DEFAULT_WINDOW_DAYS).unwrap();
        assert_eq!(spec.start_date, date(2024, 1, 23));
        assert_eq!(spec.end_date, date(2024, 1, 30));
        assert_eq!(spec.selected_segments, segments(&["Desktop", "Mobile"]));
        assert_eq!(spec.period_label(), "2024-01-23 to 2024-01-30");
    }

    #[test]
    fn default_start_clamps_to_min_date() {
        let mut ds = load_sample();
        ds.records.truncate(3);
        let spec = FilterSpec::default_for(&ds, DEFAULT_WINDOW_DAYS).unwrap();
        assert_eq!(spec.start_date, date(2024, 1, 1));
        assert_eq!(spec.end_date, date(2024, 1, 3));
    }

    #[test]
    fn huge_window_starts_at_min_date() {
        let ds = load_sample();
        for window in [1_000_000_000, i64::MAX] {
            let spec = FilterSpec::default_for(&ds, window).unwrap();
            assert_eq!(spec.start_date, date(2024, 1, 1));
            assert_eq!(spec.end_date, date(2024, 1, 30));
        }
    }

    #[test]
    fn default_spec_needs_data() {
        let ds = Dataset::new(Vec::new(), DataSource::Sample);
        assert_eq!(FilterSpec::default_for(&ds, DEFAULT_WINDOW_DAYS), None);
    }

    #[test]
    fn sorted_desc_is_stable_for_shared_dates() {
        let mut ds = load_sample();
        let mut twin = ds.records[0].clone();
        twin.segment = "Tablet".into();
        ds.records.insert(1, twin);
        let view = FilteredView {
            records: ds.records[..3].to_vec(),
        };
        let sorted = view.sorted_by_date_desc();
        assert_eq!(sorted[0].date, date(2024, 1, 2));
        assert_eq!(sorted[1].segment, "Mobile");
        assert_eq!(sorted[2].segment, "Tablet");
    }
}
