//! Data layer: the filter-aggregate-export pipeline.
//!
//! Architecture:
//! ```text
//!  sample generator  /  .csv / .json / .parquet upload
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse bytes → RawTable      (cache: keyed by content hash)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  schema   │  required columns present?
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  Dataset  │  Vec<Record>, provenance
//!   └──────────┘
//!        │  FilterSpec
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  date range ∧ segment set → FilteredView
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐      ┌──────────┐
//!   │ aggregate  │ ───▶ │  export   │  raw / summary / segment CSV
//!   └───────────┘      └──────────┘
//! ```

pub mod aggregate;
pub mod cache;
pub mod error;
pub mod export;
pub mod filter;
pub mod format;
pub mod loader;
pub mod model;
pub mod schema;
