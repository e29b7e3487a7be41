use std::collections::BTreeSet;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int32Type, Int64Type, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt32Type, UInt64Type,
};
use bytes::Bytes;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::{IngestError, LoadError};
use super::model::{
    DataSource, Dataset, RawTable, Record, DATE, ORDERS, REVENUE, SEGMENT, VISITORS,
};
use super::schema;

// ---------------------------------------------------------------------------
// Sample data
// ---------------------------------------------------------------------------

/// Number of consecutive days in the generated sample.
pub const SAMPLE_DAYS: i64 = 30;

/// Labels the sample alternates between, by row parity.
pub const SAMPLE_SEGMENTS: [&str; 2] = ["Mobile", "Desktop"];

fn sample_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// Deterministic 30-day sample starting 2024-01-01.
///
/// Every metric is `base + i * step + (i mod 7) * bump`, which gives a steady
/// upward trend with a weekly cycle on top.
pub fn load_sample() -> Dataset {
    let epoch = sample_epoch();
    let records = (0..SAMPLE_DAYS)
        .map(|i| {
            let cycle = (i % 7) as u64;
            let i_u = i as u64;
            Record {
                date: epoch + Duration::days(i),
                visitors: 1500 + i_u * 50 + cycle * 200,
                orders: 150 + i_u * 5 + cycle * 20,
                revenue: (15_000 + i_u * 500 + cycle * 2000) as f64,
                segment: SAMPLE_SEGMENTS[(i % 2) as usize].to_string(),
            }
        })
        .collect();
    Dataset::new(records, DataSource::Sample)
}

// ---------------------------------------------------------------------------
// Public entry-points for uploads
// ---------------------------------------------------------------------------

/// Supported upload encodings, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
    Parquet,
}

impl InputFormat {
    /// Files without an extension are read as CSV.
    pub fn from_file_name(file_name: &str) -> Result<Self, LoadError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("csv")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" | "txt" => Ok(InputFormat::Csv),
            "json" => Ok(InputFormat::Json),
            "parquet" | "pq" => Ok(InputFormat::Parquet),
            other => Err(LoadError::parse(format!("Unsupported file extension: .{other}"))),
        }
    }
}

/// Read a file from disk and load it as an upload.
pub fn load_file(path: &Path) -> Result<Dataset, IngestError> {
    let bytes = std::fs::read(path)
        .map_err(|e| LoadError::parse(format!("reading {}: {e}", path.display())))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    load_uploaded(&file_name, &bytes)
}

/// Parse, validate and coerce uploaded bytes into a [`Dataset`].
///
/// Nothing outside the returned value is touched, so a failed upload leaves
/// whatever dataset the caller already holds intact.
pub fn load_uploaded(file_name: &str, bytes: &[u8]) -> Result<Dataset, IngestError> {
    let table = match InputFormat::from_file_name(file_name)? {
        InputFormat::Csv => parse_csv(bytes)?,
        InputFormat::Json => parse_json(bytes)?,
        InputFormat::Parquet => parse_parquet(bytes)?,
    };

    if let Err(e) = schema::validate(&table) {
        log::warn!("{file_name}: {e}");
        return Err(e.into());
    }

    let dataset = into_dataset(
        &table,
        DataSource::Upload {
            file_name: file_name.to_string(),
        },
    )?;
    log::info!(
        "Loaded {} rows from {file_name} ({} segments)",
        dataset.len(),
        dataset.segments().len()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Header row plus string cells. Ragged rows are a structural error.
pub fn parse_csv(bytes: &[u8]) -> Result<RawTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LoadError::parse(format!("reading CSV header: {e}")))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::parse("No columns to parse from file"));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| LoadError::parse(format!("CSV {e}")))?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the shape `df.to_json(orient='records')` writes:
///
/// ```json
/// [
///   { "Date": "2024-01-01", "Visitors": 1500, "Orders": 150, "Revenue": 15000, "Segment": "Mobile" },
///   ...
/// ]
/// ```
pub fn parse_json(bytes: &[u8]) -> Result<RawTable, LoadError> {
    let root: JsonValue = serde_json::from_slice(bytes)
        .map_err(|e| LoadError::parse(format!("parsing JSON: {e}")))?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::parse("Expected top-level JSON array"))?;

    let mut headers: Vec<String> = Vec::new();
    let mut seen = BTreeSet::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::parse(format!("Row {} is not a JSON object", i + 1)))?;
        for key in obj.keys() {
            if seen.insert(key.clone()) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| match obj.get(h) {
                    None | Some(JsonValue::Null) => String::new(),
                    Some(JsonValue::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                })
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Flatten every record batch into string cells so Parquet goes through the
/// same validation and coercion as CSV. Works with files written by Pandas
/// (datetime columns arrive as nanosecond or microsecond timestamps), Polars
/// and the `generate_sample` binary.
pub fn parse_parquet(bytes: &[u8]) -> Result<RawTable, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::copy_from_slice(bytes))
        .map_err(|e| LoadError::parse(format!("reading parquet metadata: {e}")))?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder
        .build()
        .map_err(|e| LoadError::parse(format!("building parquet reader: {e}")))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch =
            batch_result.map_err(|e| LoadError::parse(format!("reading parquet batch: {e}")))?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .zip(&headers)
                .map(|(col, name)| arrow_cell(col, row, name))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(cells);
        }
    }

    Ok(RawTable { headers, rows })
}

fn arrow_cell(col: &ArrayRef, row: usize, name: &str) -> Result<String, LoadError> {
    if col.is_null(row) {
        return Ok(String::new());
    }
    let text = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row).to_string(),
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::UInt32 => col.as_primitive::<UInt32Type>().value(row).to_string(),
        DataType::UInt64 => col.as_primitive::<UInt64Type>().value(row).to_string(),
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row).to_string(),
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row).to_string(),
        DataType::Date32 => {
            let days = col.as_primitive::<Date32Type>().value(row);
            let unix_epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
            (unix_epoch + Duration::days(i64::from(days)))
                .format("%Y-%m-%d")
                .to_string()
        }
        DataType::Date64 => {
            let millis = col.as_primitive::<Date64Type>().value(row);
            timestamp_date(DateTime::from_timestamp_millis(millis), name)?
        }
        DataType::Timestamp(unit, _) => {
            let date = match unit {
                TimeUnit::Second => {
                    let secs = col.as_primitive::<TimestampSecondType>().value(row);
                    DateTime::from_timestamp(secs, 0)
                }
                TimeUnit::Millisecond => {
                    let millis = col.as_primitive::<TimestampMillisecondType>().value(row);
                    DateTime::from_timestamp_millis(millis)
                }
                TimeUnit::Microsecond => {
                    let micros = col.as_primitive::<TimestampMicrosecondType>().value(row);
                    DateTime::from_timestamp_micros(micros)
                }
                TimeUnit::Nanosecond => {
                    let nanos = col.as_primitive::<TimestampNanosecondType>().value(row);
                    Some(DateTime::from_timestamp_nanos(nanos))
                }
            };
            timestamp_date(date, name)?
        }
        other => {
            return Err(LoadError::parse(format!(
                "Column '{name}' has unsupported parquet type {other:?}"
            )))
        }
    };
    Ok(text)
}

/// Calendar date of a UTC timestamp; the time of day is dropped.
fn timestamp_date(ts: Option<DateTime<chrono::Utc>>, name: &str) -> Result<String, LoadError> {
    ts.map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
        .ok_or_else(|| LoadError::parse(format!("Column '{name}' holds an out-of-range timestamp")))
}

// ---------------------------------------------------------------------------
// Coercion: RawTable → Dataset
// ---------------------------------------------------------------------------

/// Type every row of a validated table. The first bad cell aborts the load.
///
/// Segment labels are kept verbatim; only date and numeric cells are trimmed.
/// Visitor and order totals must fit in a `u64` so every aggregate over a
/// subset does too.
pub fn into_dataset(table: &RawTable, source: DataSource) -> Result<Dataset, LoadError> {
    let column = |name: &str| {
        table
            .column_index(name)
            .ok_or_else(|| LoadError::parse(format!("'{name}'")))
    };
    let date_idx = column(DATE)?;
    let visitors_idx = column(VISITORS)?;
    let orders_idx = column(ORDERS)?;
    let revenue_idx = column(REVENUE)?;
    let segment_idx = column(SEGMENT)?;

    let mut records = Vec::with_capacity(table.rows.len());
    let (mut visitors_total, mut orders_total) = (0u64, 0u64);
    for (i, row) in table.rows.iter().enumerate() {
        let row_no = i + 1;
        let raw = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");
        let cell = |idx: usize| raw(idx).trim();

        let raw_date = cell(date_idx);
        let date = parse_date(raw_date).ok_or_else(|| {
            LoadError::parse(format!("Row {row_no}: unable to parse '{raw_date}' as a date"))
        })?;

        let visitors = parse_count(cell(visitors_idx), row_no, VISITORS)?;
        let orders = parse_count(cell(orders_idx), row_no, ORDERS)?;
        visitors_total = add_total(visitors_total, visitors, row_no, VISITORS)?;
        orders_total = add_total(orders_total, orders, row_no, ORDERS)?;

        records.push(Record {
            date,
            visitors,
            orders,
            revenue: parse_amount(cell(revenue_idx), row_no, REVENUE)?,
            segment: raw(segment_idx).to_string(),
        });
    }

    Ok(Dataset::new(records, source))
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Accepts the common ISO-like spellings; any time component is dropped.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Non-negative integer; integral floats such as `"120.0"` are accepted.
fn parse_count(s: &str, row: usize, col: &str) -> Result<u64, LoadError> {
    if let Ok(n) = s.parse::<u64>() {
        return Ok(n);
    }
    match s.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(LoadError::parse(format!(
            "Row {row}, {col}: '{s}' is not a non-negative integer"
        ))),
    }
}

fn add_total(total: u64, value: u64, row: usize, col: &str) -> Result<u64, LoadError> {
    total.checked_add(value).ok_or_else(|| {
        LoadError::parse(format!("Row {row}, {col}: column total exceeds {}", u64::MAX))
    })
}

fn parse_amount(s: &str, row: usize, col: &str) -> Result<f64, LoadError> {
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(f),
        _ => Err(LoadError::parse(format!("Row {row}, {col}: '{s}' is not a number"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::error::ValidationError;

    const GOOD_CSV: &str = "\
Date,Visitors,Orders,Revenue,Segment
2024-01-01,100,10,1000,Mobile
2024-01-02,200,30,3000.5,Desktop
";

    #[test]
    fn sample_is_deterministic() {
        assert_eq!(load_sample(), load_sample());
    }

    #[test]
    fn sample_follows_formula() {
        let ds = load_sample();
        assert_eq!(ds.len(), 30);
        assert_eq!(ds.source, DataSource::Sample);

        let first = &ds.records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(first.visitors, 1500);
        assert_eq!(first.orders, 150);
        assert_eq!(first.revenue, 15000.0);
        assert_eq!(first.segment, "Mobile");

        // i = 9: 9 mod 7 = 2
        let r = &ds.records[9];
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(r.visitors, 1500 + 450 + 400);
        assert_eq!(r.orders, 150 + 45 + 40);
        assert_eq!(r.revenue, 15000.0 + 4500.0 + 4000.0);
        assert_eq!(r.segment, "Desktop");

        assert_eq!(ds.max_date(), NaiveDate::from_ymd_opt(2024, 1, 30));
    }

    #[test]
    fn csv_upload_loads() {
        let ds = load_uploaded("shop.csv", GOOD_CSV.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(
            ds.source,
            DataSource::Upload {
                file_name: "shop.csv".into()
            }
        );
        assert_eq!(ds.records[1].revenue, 3000.5);
        assert_eq!(ds.records[1].segment, "Desktop");
    }

    #[test]
    fn same_bytes_same_dataset() {
        let a = load_uploaded("a.csv", GOOD_CSV.as_bytes()).unwrap();
        let b = load_uploaded("a.csv", GOOD_CSV.as_bytes()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_orders_column_is_a_validation_error() {
        let csv = "Date,Visitors,Revenue,Segment\n2024-01-01,100,1000,Mobile\n";
        let err = load_uploaded("x.csv", csv.as_bytes()).unwrap_err();
        assert_eq!(
            err,
            IngestError::Validation(ValidationError::MissingColumns(vec!["Orders".into()]))
        );
    }

    #[test]
    fn bad_date_is_a_parse_failure() {
        let csv = "Date,Visitors,Orders,Revenue,Segment\nnot-a-date,1,1,1,Mobile\n";
        let err = load_uploaded("x.csv", csv.as_bytes()).unwrap_err();
        match err {
            IngestError::Load(LoadError::ParseFailure(msg)) => {
                assert!(msg.contains("not-a-date"), "{msg}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ragged_rows_are_a_parse_failure() {
        let csv = "Date,Visitors,Orders,Revenue,Segment\n2024-01-01,1,1\n";
        let err = load_uploaded("x.csv", csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::Load(LoadError::ParseFailure(_))));
    }

    #[test]
    fn empty_upload_is_a_parse_failure() {
        let err = load_uploaded("x.csv", b"").unwrap_err();
        assert!(matches!(err, IngestError::Load(LoadError::ParseFailure(_))));
    }

    #[test]
    fn unknown_extension_rejected() {
        let err = load_uploaded("x.xlsx", GOOD_CSV.as_bytes()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported file extension: .xlsx"
        );
    }

    #[test]
    fn date_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(parse_date("2024-03-07"), Some(d));
        assert_eq!(parse_date("2024/03/07"), Some(d));
        assert_eq!(parse_date("03/07/2024"), Some(d));
        assert_eq!(parse_date("2024-03-07 13:45:00"), Some(d));
        assert_eq!(parse_date("2024-03-07T23:59:59"), Some(d));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn overflowing_totals_are_a_parse_failure() {
        let csv = "Date,Visitors,Orders,Revenue,Segment\n\
                   2024-01-01,18446744073709551615,1,1,Mobile\n\
                   2024-01-02,5,1,1,Mobile\n";
        let err = load_uploaded("big.csv", csv.as_bytes()).unwrap_err();
        match err {
            IngestError::Load(LoadError::ParseFailure(msg)) => {
                assert!(msg.starts_with("Row 2, Visitors"), "{msg}");
            }
            other => panic!("unexpected {other:?}"),
        }

        let csv = "Date,Visitors,Orders,Revenue,Segment\n2024-01-01,18446744073709551615,1,1,Mobile\n";
        let ds = load_uploaded("max.csv", csv.as_bytes()).unwrap();
        assert_eq!(ds.records[0].visitors, u64::MAX);
    }

    #[test]
    fn segment_labels_keep_whitespace() {
        let csv = "Date,Visitors,Orders,Revenue,Segment\n\
                   2024-01-01, 100 ,10,1000,Mobile\n\
                   2024-01-02,200,30,3000,Mobile \n";
        let ds = load_uploaded("shop.csv", csv.as_bytes()).unwrap();
        assert_eq!(ds.records[0].visitors, 100);
        assert_eq!(ds.records[1].segment, "Mobile ");
        assert_eq!(ds.segments().len(), 2);
    }

    #[test]
    fn integral_floats_count_as_integers() {
        assert_eq!(parse_count("120.0", 1, VISITORS), Ok(120));
        assert!(parse_count("1.5", 1, VISITORS).is_err());
        assert!(parse_count("-3", 1, VISITORS).is_err());
    }

    #[test]
    fn json_records_load() {
        let json = r#"[
            {"Date": "2024-01-01", "Visitors": 100, "Orders": 10, "Revenue": 1000, "Segment": "Mobile"},
            {"Date": "2024-01-02", "Visitors": 200, "Orders": 30, "Revenue": 3000.0, "Segment": "Desktop", "Note": null}
        ]"#;
        let ds = load_uploaded("shop.json", json.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].visitors, 100);
        assert_eq!(ds.records[1].revenue, 3000.0);
    }

    #[test]
    fn json_must_be_an_array() {
        let err = load_uploaded("shop.json", br#"{"Date": "2024-01-01"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Expected top-level JSON array");
    }

    #[test]
    fn load_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.csv");
        std::fs::write(&path, GOOD_CSV).unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.source.to_string(), "upload.csv");
    }
}
