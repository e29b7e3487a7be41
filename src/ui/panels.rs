use chrono::NaiveDate;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::export::{save_export, ExportKind};
use crate::data::model::REQUIRED_COLUMNS;
use crate::session::{SessionEvent, SourceChoice};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – data source and filter widgets
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            data_source_section(ui, state);
            ui.add_space(8.0);
            filter_section(ui, state);
        });
}

fn data_source_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Data Management");
    ui.separator();

    let source = state.session.source;
    if ui.radio(source == SourceChoice::Sample, "Use Sample Data").clicked() {
        state.select_source(SourceChoice::Sample);
    }
    if ui.radio(source == SourceChoice::Upload, "Upload File").clicked() {
        state.select_source(SourceChoice::Upload);
    }
    ui.add_space(4.0);

    match state.session.source {
        SourceChoice::Sample => {
            ui.label(RichText::new("Sample data loaded").color(Color32::from_rgb(0, 150, 0)));
            if ui
                .button("Download Sample Format")
                .on_hover_text("Save the sample to see the expected CSV format")
                .clicked()
            {
                save_dialog(state, ExportKind::Sample);
            }
        }
        SourceChoice::Upload => {
            if ui
                .button("Open file…")
                .on_hover_text(format!("Required columns: {}", REQUIRED_COLUMNS.join(", ")))
                .clicked()
            {
                open_file_dialog(state);
            }
            if let Some(upload) = &state.session.last_upload {
                ui.label(RichText::new(&upload.file_name).small());
            }
        }
    }

    if let Some(msg) = &state.status_message {
        ui.label(RichText::new(msg).color(Color32::RED));
        ui.label(RichText::new("Required columns:").strong());
        for col in REQUIRED_COLUMNS {
            ui.label(format!("• {col}"));
        }
    } else if state.active.is_some() && state.session.source == SourceChoice::Upload {
        ui.label(RichText::new("Data loaded successfully!").color(Color32::from_rgb(0, 150, 0)));
    }
}

fn filter_section(ui: &mut Ui, state: &mut AppState) {
    let Some(active) = &state.active else {
        return;
    };
    let Some(filter) = state.session.filter.clone() else {
        return;
    };
    let dataset = active.dataset.clone();
    let (Some(min_date), Some(max_date)) = (dataset.min_date(), dataset.max_date()) else {
        return;
    };

    ui.heading("Dashboard Controls");
    ui.separator();

    // ---- Date range ----
    let mut events = Vec::new();
    ui.horizontal(|ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.label("Start Date");
            if let Some(date) = date_picker(ui, "start_date", filter.start_date, min_date, max_date) {
                events.push(SessionEvent::SetStartDate(date));
            }
        });
        ui.vertical(|ui: &mut Ui| {
            ui.label("End Date");
            if let Some(date) = date_picker(ui, "end_date", filter.end_date, min_date, max_date) {
                events.push(SessionEvent::SetEndDate(date));
            }
        });
    });
    ui.add_space(6.0);

    // ---- Segments ----
    let segments = dataset.segments();
    ui.strong(format!(
        "Segments  ({}/{})",
        filter.selected_segments.len(),
        segments.len()
    ));
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("Select All").clicked() {
            events.push(SessionEvent::SelectAllSegments);
        }
        if ui.small_button("Clear All").clicked() {
            events.push(SessionEvent::ClearSegments);
        }
    });
    for segment in &segments {
        let mut checked = filter.selected_segments.contains(segment);
        let text = RichText::new(segment).color(state.colors.color_for(segment));
        if ui.checkbox(&mut checked, text).changed() {
            events.push(SessionEvent::ToggleSegment(segment.clone()));
        }
    }

    for event in events {
        state.handle(event);
    }
}

/// Date picker bounded to `[min, max]`. Returns the new date if it changed.
fn date_picker(
    ui: &mut Ui,
    id: &str,
    current: NaiveDate,
    min: NaiveDate,
    max: NaiveDate,
) -> Option<NaiveDate> {
    let mut date = current;
    let response = ui.add(DatePickerButton::new(&mut date).id_salt(id));
    let date = date.clamp(min, max);
    (response.changed() && date != current).then_some(date)
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Use Sample Data").clicked() {
                state.select_source(SourceChoice::Sample);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(active) = &state.active {
            ui.label(active.dataset.info_line());
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open shop data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.upload_path(&path);
    }
}

/// Serialize `kind` and ask where to save it.
pub fn save_dialog(state: &mut AppState, kind: ExportKind) {
    let (file_name, contents) = match state.export(kind) {
        Some(Ok(export)) => export,
        Some(Err(e)) => {
            log::error!("Export failed: {e}");
            state.status_message = Some(format!("Error: {e}"));
            return;
        }
        None => return,
    };

    let mut dialog = rfd::FileDialog::new()
        .set_title("Save export")
        .set_file_name(&file_name)
        .add_filter("CSV", &["csv"]);
    if let Some(dir) = &state.config.export_dir {
        dialog = dialog.set_directory(dir);
    }

    if let Some(path) = dialog.save_file() {
        if let Err(e) = save_export(&path, &contents) {
            log::error!("{e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
