use std::path::Path;

use chrono::Local;

use crate::color::SegmentColors;
use crate::config::DashboardConfig;
use crate::data::cache::{content_key, DatasetCache};
use crate::data::error::ExportError;
use crate::data::export::{export_dataset, ExportKind};
use crate::pipeline::{self, RenderOutcome};
use crate::session::{ActiveDataset, SessionEvent, SessionState, SourceChoice, SAMPLE_KEY};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Memoized sample and uploads.
    pub cache: DatasetCache,

    /// Dataset on screen (None shows the welcome page).
    pub active: Option<ActiveDataset>,

    /// User choices, threaded through every render.
    pub session: SessionState,

    /// Output of the most recent render.
    pub outcome: RenderOutcome,

    /// Colours for the active dataset's segments.
    pub colors: SegmentColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let mut state = Self {
            config,
            cache: DatasetCache::new(),
            active: None,
            session: SessionState::default(),
            outcome: RenderOutcome::Welcome,
            colors: SegmentColors::default(),
            status_message: None,
        };
        if state.config.start_with_sample {
            state.use_sample();
        } else {
            state.select_source(SourceChoice::Upload);
        }
        state
    }

    /// Re-run the pipeline with the current session.
    pub fn refresh(&mut self) {
        let session = std::mem::take(&mut self.session);
        let (session, outcome) = pipeline::render(
            self.active.as_ref(),
            session,
            self.config.default_window_days,
        );
        self.session = session;
        self.outcome = outcome;
    }

    fn activate(&mut self, active: Option<ActiveDataset>) {
        self.colors = active
            .as_ref()
            .map(|a| SegmentColors::new(&a.dataset.segments()))
            .unwrap_or_default();
        self.active = active;
        self.refresh();
    }

    pub fn use_sample(&mut self) {
        self.session.handle(SessionEvent::SelectSource(SourceChoice::Sample), None);
        let dataset = self.cache.sample();
        self.status_message = None;
        self.activate(Some(ActiveDataset {
            key: SAMPLE_KEY.to_string(),
            dataset,
        }));
    }

    /// Switch source. Choosing uploads brings back the last good upload, if
    /// it is still cached.
    pub fn select_source(&mut self, source: SourceChoice) {
        match source {
            SourceChoice::Sample => self.use_sample(),
            SourceChoice::Upload => {
                self.session.handle(SessionEvent::SelectSource(source), None);
                let previous = self.session.last_upload.as_ref().and_then(|u| {
                    self.cache.get_upload(&u.content_key).map(|dataset| ActiveDataset {
                        key: u.content_key.clone(),
                        dataset,
                    })
                });
                self.activate(previous);
            }
        }
    }

    /// Load an uploaded file's bytes. On failure the welcome page is shown
    /// and the message is kept for the side panel.
    pub fn upload(&mut self, file_name: &str, bytes: &[u8]) {
        let key = content_key(bytes);
        if !self.session.record_upload(file_name, &key) {
            log::debug!("{file_name} unchanged since last upload");
        }
        self.session.handle(SessionEvent::SelectSource(SourceChoice::Upload), None);

        match self.cache.upload(file_name, bytes) {
            Ok(dataset) => {
                self.status_message = None;
                self.activate(Some(ActiveDataset { key, dataset }));
            }
            Err(e) => {
                log::error!("Failed to load {file_name}: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.activate(None);
            }
        }
    }

    pub fn upload_path(&mut self, path: &Path) {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match std::fs::read(path) {
            Ok(bytes) => self.upload(&file_name, &bytes),
            Err(e) => {
                log::error!("Failed to read {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
                self.activate(None);
            }
        }
    }

    /// Apply a user interaction and re-render.
    pub fn handle(&mut self, event: SessionEvent) {
        let dataset = self.active.as_ref().map(|a| a.dataset.clone());
        self.session.handle(event, dataset.as_deref());
        self.refresh();
    }

    /// Serialized contents and suggested file name for an export, if the
    /// current render has something to export.
    pub fn export(&mut self, kind: ExportKind) -> Option<Result<(String, String), ExportError>> {
        let file_name = kind.file_name(Local::now().date_naive());
        let contents = match kind {
            ExportKind::Sample => Some(export_dataset(&self.cache.sample())),
            _ => match &self.outcome {
                RenderOutcome::Dashboard(dash) => dash.export(kind),
                _ => None,
            },
        }?;
        Some(contents.map(|text| (file_name, text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Date,Visitors,Orders,Revenue,Segment\n\
                       2024-02-01,100,10,1000,Mobile\n\
                       2024-02-02,200,30,3000,Desktop\n";

    #[test]
    fn starts_on_sample_dashboard() {
        let state = AppState::new(DashboardConfig::default());
        assert!(matches!(state.outcome, RenderOutcome::Dashboard(_)));
        assert_eq!(state.session.source, SourceChoice::Sample);
    }

    #[test]
    fn upload_prompt_without_sample() {
        let config = DashboardConfig {
            start_with_sample: false,
            ..DashboardConfig::default()
        };
        let state = AppState::new(config);
        assert_eq!(state.outcome, RenderOutcome::Welcome);
    }

    #[test]
    fn failed_upload_falls_back_to_welcome() {
        let mut state = AppState::new(DashboardConfig::default());
        state.upload("bad.csv", b"Date,Visitors,Revenue,Segment\n2024-01-01,1,1,Mobile\n");
        assert_eq!(state.outcome, RenderOutcome::Welcome);
        assert_eq!(
            state.status_message.as_deref(),
            Some("Error: Missing columns: Orders")
        );
    }

    #[test]
    fn good_upload_then_source_toggle() {
        let mut state = AppState::new(DashboardConfig::default());
        state.upload("shop.csv", CSV.as_bytes());
        assert!(matches!(state.outcome, RenderOutcome::Dashboard(_)));

        state.select_source(SourceChoice::Sample);
        assert_eq!(state.active.as_ref().unwrap().key, SAMPLE_KEY);

        state.select_source(SourceChoice::Upload);
        let active = state.active.as_ref().unwrap();
        assert_eq!(active.key, content_key(CSV.as_bytes()));
    }

    #[test]
    fn export_needs_a_dashboard() {
        let mut state = AppState::new(DashboardConfig::default());
        let (name, text) = state.export(ExportKind::Summary).unwrap().unwrap();
        assert!(name.starts_with("weekly_summary_"));
        assert!(text.starts_with("Metric,Value,Period\n"));

        state.handle(SessionEvent::ClearSegments);
        assert!(state.export(ExportKind::RawData).is_none());
        let (name, _) = state.export(ExportKind::Sample).unwrap().unwrap();
        assert_eq!(name, "quickshop_sample_data.csv");
    }
}
