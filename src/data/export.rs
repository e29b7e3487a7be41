use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use super::aggregate::{KpiSet, SegmentSummary};
use super::error::ExportError;
use super::filter::{FilterSpec, FilteredView};
use super::format::{format_aov, format_count, format_percent, format_revenue};
use super::model::{Dataset, Record, REQUIRED_COLUMNS};

// ---------------------------------------------------------------------------
// Export targets
// ---------------------------------------------------------------------------

/// Name of the sample file; it carries no date stamp.
pub const SAMPLE_FILE_NAME: &str = "quickshop_sample_data.csv";

/// The downloadable files the dashboard offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    RawData,
    Summary,
    Segments,
    Sample,
}

impl ExportKind {
    /// File name offered in the save dialog. `stamp` is the export date and is
    /// ignored for [`ExportKind::Sample`], which is always [`SAMPLE_FILE_NAME`].
    pub fn file_name(self, stamp: NaiveDate) -> String {
        let stamp = stamp.format("%Y%m%d");
        match self {
            ExportKind::RawData => format!("dashboard_data_{stamp}.csv"),
            ExportKind::Summary => format!("weekly_summary_{stamp}.csv"),
            ExportKind::Segments => format!("segment_analysis_{stamp}.csv"),
            ExportKind::Sample => SAMPLE_FILE_NAME.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serializers
// ---------------------------------------------------------------------------

fn to_text<F>(write_rows: F) -> Result<String, ExportError>
where
    F: FnOnce(&mut csv::Writer<Vec<u8>>) -> Result<(), csv::Error>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    write_rows(&mut writer)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.error().to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

fn write_records<'a, I>(writer: &mut csv::Writer<Vec<u8>>, records: I) -> Result<(), csv::Error>
where
    I: IntoIterator<Item = &'a Record>,
{
    writer.write_record(REQUIRED_COLUMNS)?;
    for r in records {
        writer.write_record([
            r.date.format("%Y-%m-%d").to_string(),
            r.visitors.to_string(),
            r.orders.to_string(),
            r.revenue.to_string(),
            r.segment.clone(),
        ])?;
    }
    Ok(())
}

/// Every filtered row, newest first, with a header and no index column.
pub fn export_raw(view: &FilteredView) -> Result<String, ExportError> {
    to_text(|w| write_records(w, view.sorted_by_date_desc()))
}

/// A whole dataset in source order; used for the sample-format download.
pub fn export_dataset(dataset: &Dataset) -> Result<String, ExportError> {
    to_text(|w| write_records(w, &dataset.records))
}

/// Five `Metric,Value,Period` rows with pre-formatted values.
pub fn export_kpi_summary(kpis: &KpiSet, spec: &FilterSpec) -> Result<String, ExportError> {
    let period = spec.period_label();
    let rows = [
        ("Total Visitors", format_count(kpis.total_visitors)),
        ("Total Orders", format_count(kpis.total_orders)),
        ("Total Revenue", format_revenue(kpis.total_revenue)),
        ("Conversion Rate", format_percent(kpis.conversion_rate)),
        ("Avg Order Value", format_aov(kpis.avg_order_value)),
    ];
    to_text(|w| {
        w.write_record(["Metric", "Value", "Period"])?;
        for (metric, value) in &rows {
            w.write_record([*metric, value.as_str(), period.as_str()])?;
        }
        Ok(())
    })
}

/// One row per segment, ordered by label.
///
/// `Conversion Rate` is always printed with exactly two decimals (`15.00`,
/// `0.00`), so a whole-number rate never shortens to `15.0` or `15`.
pub fn export_segment_summary(summary: &[SegmentSummary]) -> Result<String, ExportError> {
    to_text(|w| {
        w.write_record(["Segment", "Visitors", "Orders", "Revenue", "Conversion Rate"])?;
        for s in summary {
            w.write_record([
                s.segment.clone(),
                s.visitors.to_string(),
                s.orders.to_string(),
                s.revenue.to_string(),
                format!("{:.2}", s.conversion_rate),
            ])?;
        }
        Ok(())
    })
}

/// Write an export to disk.
pub fn save_export(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents)
        .with_context(|| format!("writing export to {}", path.display()))?;
    log::info!("Exported {} bytes to {}", contents.len(), path.display());
    Ok(())
}
