use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::data::aggregate::Metric;
use crate::data::filter::FilterSpec;
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Active dataset
// ---------------------------------------------------------------------------

/// Key of the built-in sample in [`ActiveDataset::key`].
pub const SAMPLE_KEY: &str = "sample";

/// The dataset currently on screen together with its identity: the content
/// hash for uploads, [`SAMPLE_KEY`] for the sample.
#[derive(Debug, Clone)]
pub struct ActiveDataset {
    pub key: String,
    pub dataset: Arc<Dataset>,
}

// ---------------------------------------------------------------------------
// User choices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceChoice {
    #[default]
    Sample,
    Upload,
}

/// What the segment chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisType {
    /// Share of visitors per segment.
    #[default]
    Distribution,
    /// Conversion rate per segment.
    Performance,
}

/// Most recent upload the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadInfo {
    pub file_name: String,
    pub content_key: String,
}

/// One user interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SelectSource(SourceChoice),
    SetStartDate(NaiveDate),
    SetEndDate(NaiveDate),
    ToggleSegment(String),
    SelectAllSegments,
    ClearSegments,
    SetMetric(Metric),
    SetAnalysis(AnalysisType),
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Everything the user has chosen this session. Passed into each render and
/// handed back, possibly adjusted, afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub source: SourceChoice,
    pub last_upload: Option<UploadInfo>,
    /// Current filter and the key of the dataset it was built for.
    pub filter: Option<FilterSpec>,
    pub filter_key: Option<String>,
    pub metric: Metric,
    pub analysis: AnalysisType,
}

impl SessionState {
    /// Resolve the filter for `active`.
    ///
    /// A different dataset than last time resets to the default window with
    /// every segment selected. For the same dataset the user's choices are
    /// kept, with dates clamped into the dataset's range.
    pub fn bind(&mut self, active: &ActiveDataset, window_days: i64) -> Option<FilterSpec> {
        let dataset = &active.dataset;
        let (min_date, max_date) = (dataset.min_date()?, dataset.max_date()?);

        let same_dataset = self.filter_key.as_deref() == Some(active.key.as_str());
        let spec = match (&self.filter, same_dataset) {
            (Some(current), true) => FilterSpec {
                start_date: current.start_date.clamp(min_date, max_date),
                end_date: current.end_date.clamp(min_date, max_date),
                selected_segments: current.selected_segments.clone(),
            },
            _ => {
                log::debug!("resetting filters for dataset {}", active.key);
                FilterSpec::default_for(dataset, window_days)?
            }
        };

        self.filter = Some(spec.clone());
        self.filter_key = Some(active.key.clone());
        Some(spec)
    }

    /// Apply one interaction. Filter events are ignored until a dataset has
    /// been bound.
    pub fn handle(&mut self, event: SessionEvent, dataset: Option<&Dataset>) {
        match event {
            SessionEvent::SelectSource(source) => self.source = source,
            SessionEvent::SetMetric(metric) => self.metric = metric,
            SessionEvent::SetAnalysis(analysis) => self.analysis = analysis,
            SessionEvent::SetStartDate(date) => {
                if let Some(f) = &mut self.filter {
                    f.start_date = date;
                }
            }
            SessionEvent::SetEndDate(date) => {
                if let Some(f) = &mut self.filter {
                    f.end_date = date;
                }
            }
            SessionEvent::ToggleSegment(segment) => {
                if let Some(f) = &mut self.filter {
                    if !f.selected_segments.remove(&segment) {
                        f.selected_segments.insert(segment);
                    }
                }
            }
            SessionEvent::SelectAllSegments => {
                if let (Some(f), Some(ds)) = (&mut self.filter, dataset) {
                    f.selected_segments = ds.segments();
                }
            }
            SessionEvent::ClearSegments => {
                if let Some(f) = &mut self.filter {
                    f.selected_segments = BTreeSet::new();
                }
            }
        }
    }

    /// Remember an upload. Returns `true` when its content differs from the
    /// previous one.
    pub fn record_upload(&mut self, file_name: &str, content_key: &str) -> bool {
        let changed = self
            .last_upload
            .as_ref()
            .map_or(true, |u| u.content_key != content_key);
        self.last_upload = Some(UploadInfo {
            file_name: file_name.to_string(),
            content_key: content_key.to_string(),
        });
        changed
    }
}
