//! QuickShop analytics: load a shop's daily traffic table, filter it by date
//! range and segment, and turn the result into KPIs, charts and CSV exports.
//!
//! The pipeline under [`data`] and [`pipeline`] has no UI dependency; the
//! egui front end lives in [`app`], [`state`] and [`ui`].

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod session;
pub mod state;
pub mod ui;
