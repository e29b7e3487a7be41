//! Write the built-in sample dataset to disk.
//!
//! ```text
//! generate_sample [OUT_DIR] [--parquet]
//! ```
//!
//! Always writes `quickshop_sample_data.csv`; `--parquet` also writes
//! `quickshop_sample_data.parquet` with typed columns.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;

use quickshop_dashboard::data::export::{export_dataset, save_export, SAMPLE_FILE_NAME};
use quickshop_dashboard::data::loader::load_sample;
use quickshop_dashboard::data::model::{Dataset, DATE, ORDERS, REVENUE, SEGMENT, VISITORS};

fn write_parquet(dataset: &Dataset, path: &Path) -> Result<()> {
    let unix_epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("unix epoch")?;

    let dates: Vec<i32> = dataset
        .records
        .iter()
        .map(|r| (r.date - unix_epoch).num_days() as i32)
        .collect();
    let visitors: Vec<i64> = dataset.records.iter().map(|r| r.visitors as i64).collect();
    let orders: Vec<i64> = dataset.records.iter().map(|r| r.orders as i64).collect();
    let revenue: Vec<f64> = dataset.records.iter().map(|r| r.revenue).collect();
    let segments: Vec<&str> = dataset.records.iter().map(|r| r.segment.as_str()).collect();

    let schema = Arc::new(Schema::new(vec![
        Field::new(DATE, DataType::Date32, false),
        Field::new(VISITORS, DataType::Int64, false),
        Field::new(ORDERS, DataType::Int64, false),
        Field::new(REVENUE, DataType::Float64, false),
        Field::new(SEGMENT, DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Date32Array::from(dates)),
            Arc::new(Int64Array::from(visitors)),
            Arc::new(Int64Array::from(orders)),
            Arc::new(Float64Array::from(revenue)),
            Arc::new(StringArray::from(segments)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut out_dir = PathBuf::from(".");
    let mut parquet = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--parquet" => parquet = true,
            other => out_dir = PathBuf::from(other),
        }
    }

    let dataset = load_sample();
    let csv_path = out_dir.join(SAMPLE_FILE_NAME);
    let text = export_dataset(&dataset).context("serializing sample")?;
    save_export(&csv_path, &text)?;
    println!("Wrote {} rows to {}", dataset.len(), csv_path.display());

    if parquet {
        let parquet_path = csv_path.with_extension("parquet");
        write_parquet(&dataset, &parquet_path)?;
        println!("Wrote {} rows to {}", dataset.len(), parquet_path.display());
    }

    Ok(())
}
