use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Column contract
// ---------------------------------------------------------------------------

pub const DATE: &str = "Date";
pub const VISITORS: &str = "Visitors";
pub const ORDERS: &str = "Orders";
pub const REVENUE: &str = "Revenue";
pub const SEGMENT: &str = "Segment";

/// The five columns every dataset must carry, in canonical output order.
pub const REQUIRED_COLUMNS: [&str; 5] = [DATE, VISITORS, ORDERS, REVENUE, SEGMENT];

// ---------------------------------------------------------------------------
// Record – one row of business data
// ---------------------------------------------------------------------------

/// One day of traffic and sales for one segment.
///
/// `orders <= visitors` is not enforced; uploads are taken as given.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub visitors: u64,
    pub orders: u64,
    /// Currency units.
    pub revenue: f64,
    pub segment: String,
}

// ---------------------------------------------------------------------------
// RawTable – parsed but not yet typed
// ---------------------------------------------------------------------------

/// A delimited-text table after structural parsing: a header row and
/// string cells. Coercion into [`Record`]s happens after schema validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Position of a column by exact (case-sensitive) name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the canonical table for one render cycle
// ---------------------------------------------------------------------------

/// Where a dataset came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Sample,
    Upload { file_name: String },
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Sample => write!(f, "sample data"),
            DataSource::Upload { file_name } => write!(f, "{file_name}"),
        }
    }
}

/// An ordered, immutable sequence of records plus provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub records: Vec<Record>,
    pub source: DataSource,
}

impl Dataset {
    pub fn new(records: Vec<Record>, source: DataSource) -> Self {
        Dataset { records, source }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.date).min()
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.date).max()
    }

    /// Sorted set of distinct segment labels.
    pub fn segments(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.segment.clone()).collect()
    }

    /// Inclusive number of calendar days between the first and last date.
    pub fn day_span(&self) -> Option<i64> {
        let (min, max) = (self.min_date()?, self.max_date()?);
        Some((max - min).num_days() + 1)
    }

    /// One-line description shown above the dashboard.
    pub fn info_line(&self) -> String {
        match &self.source {
            DataSource::Sample => format!(
                "Sample dataset: {} rows, {} days",
                self.len(),
                self.day_span().unwrap_or(0)
            ),
            DataSource::Upload { .. } => format!(
                "Your data: {} rows, {} segments",
                self.len(),
                self.segments().len()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, segment: &str) -> Record {
        Record {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            visitors: 10,
            orders: 1,
            revenue: 5.0,
            segment: segment.to_string(),
        }
    }

    #[test]
    fn date_bounds_and_span() {
        let ds = Dataset::new(
            vec![
                record("2024-01-05", "Mobile"),
                record("2024-01-01", "Desktop"),
                record("2024-01-03", "Mobile"),
            ],
            DataSource::Sample,
        );
        assert_eq!(ds.min_date(), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(ds.max_date(), NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(ds.day_span(), Some(5));
        assert_eq!(ds.info_line(), "Sample dataset: 3 rows, 5 days");
    }

    #[test]
    fn upload_info_counts_segments() {
        let ds = Dataset::new(
            vec![record("2024-01-01", "Mobile"), record("2024-01-02", "Mobile")],
            DataSource::Upload {
                file_name: "shop.csv".into(),
            },
        );
        assert_eq!(ds.info_line(), "Your data: 2 rows, 1 segments");
        assert_eq!(ds.source.to_string(), "shop.csv");
    }

    #[test]
    fn empty_dataset_has_no_bounds() {
        let ds = Dataset::new(Vec::new(), DataSource::Sample);
        assert!(ds.is_empty());
        assert_eq!(ds.min_date(), None);
        assert_eq!(ds.day_span(), None);
    }
}
