use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::data::aggregate::{
    compute_kpis, compute_segment_distribution, compute_segment_summary, trend_series, KpiSet,
    Metric, SegmentSummary,
};
use crate::data::error::ExportError;
use crate::data::export::{export_kpi_summary, export_raw, export_segment_summary, ExportKind};
use crate::data::filter::{apply, FilterSpec, FilteredView};
use crate::data::model::Dataset;
use crate::session::{ActiveDataset, SessionState};

// ---------------------------------------------------------------------------
// Render output
// ---------------------------------------------------------------------------

/// Everything the dashboard draws for one filter.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub filter: FilterSpec,
    pub view: FilteredView,
    pub kpis: KpiSet,
    pub segment_summary: Vec<SegmentSummary>,
    pub distribution: BTreeMap<String, u64>,
    pub trend: BTreeMap<String, Vec<(NaiveDate, f64)>>,
}

impl DashboardView {
    /// Serialize one of the filtered exports. The sample download is
    /// produced from the dataset, not from a view.
    pub fn export(&self, kind: ExportKind) -> Option<Result<String, ExportError>> {
        match kind {
            ExportKind::RawData => Some(export_raw(&self.view)),
            ExportKind::Summary => Some(export_kpi_summary(&self.kpis, &self.filter)),
            ExportKind::Segments => Some(export_segment_summary(&self.segment_summary)),
            ExportKind::Sample => None,
        }
    }
}

/// Result of one pass through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// No dataset is loaded.
    Welcome,
    /// Valid filters that match nothing. Not an error.
    NoMatches { filter: FilterSpec },
    Dashboard(Box<DashboardView>),
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Filter, then aggregate. Aggregates are only computed for a non-empty view.
pub fn run(dataset: &Dataset, filter: &FilterSpec, metric: Metric) -> RenderOutcome {
    let view = apply(dataset, filter);
    if view.is_empty() {
        log::warn!(
            "no rows match {} with {} segment(s) selected",
            filter.period_label(),
            filter.selected_segments.len()
        );
        return RenderOutcome::NoMatches {
            filter: filter.clone(),
        };
    }

    RenderOutcome::Dashboard(Box::new(DashboardView {
        filter: filter.clone(),
        kpis: compute_kpis(&view),
        segment_summary: compute_segment_summary(&view),
        distribution: compute_segment_distribution(&view),
        trend: trend_series(&view, metric),
        view,
    }))
}

/// One full render cycle: bind the session to the active dataset, run the
/// pipeline, and hand the (possibly adjusted) session back.
pub fn render(
    active: Option<&ActiveDataset>,
    mut session: SessionState,
    window_days: i64,
) -> (SessionState, RenderOutcome) {
    let Some(active) = active else {
        return (session, RenderOutcome::Welcome);
    };
    let Some(filter) = session.bind(active, window_days) else {
        return (session, RenderOutcome::Welcome);
    };
    let outcome = run(&active.dataset, &filter, session.metric);
    (session, outcome)
}
