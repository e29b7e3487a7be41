use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::export::ExportKind;
use crate::data::filter::FilteredView;
use crate::data::format::{format_revenue, kpi_cards};
use crate::data::loader::load_sample;
use crate::data::model::REQUIRED_COLUMNS;
use crate::pipeline::{DashboardView, RenderOutcome};
use crate::state::AppState;
use crate::ui::{charts, panels};

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render whatever the last pipeline run produced.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    let outcome = state.outcome.clone();
    match outcome {
        RenderOutcome::Welcome => welcome(ui),
        RenderOutcome::NoMatches { .. } => {
            info_line(ui, state);
            ui.label(
                RichText::new(
                    "No data matches your current filters. \
                     Try adjusting your date range or segments.",
                )
                .color(Color32::from_rgb(200, 140, 0)),
            );
        }
        RenderOutcome::Dashboard(dash) => {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    info_line(ui, state);
                    dashboard(ui, state, &dash);
                });
        }
    }
}

fn info_line(ui: &mut Ui, state: &AppState) {
    if let Some(active) = &state.active {
        ui.label(RichText::new(active.dataset.info_line()).italics());
        ui.add_space(4.0);
    }
}

fn dashboard(ui: &mut Ui, state: &mut AppState, dash: &DashboardView) {
    // ---- KPI cards ----
    ui.heading("Key Performance Indicators");
    let cards = kpi_cards(&dash.kpis);
    ui.columns(cards.len(), |cols| {
        for (col, card) in cols.iter_mut().zip(cards.iter()) {
            col.group(|ui: &mut Ui| {
                ui.label(card.label);
                ui.label(RichText::new(&card.value).size(24.0).strong());
                ui.label(RichText::new(&card.delta).small().color(Color32::from_rgb(0, 150, 0)));
            });
        }
    });
    ui.separator();

    // ---- Charts ----
    let mut events = Vec::new();
    ui.columns(2, |cols| {
        events.extend(charts::trend_chart(
            &mut cols[0],
            dash,
            state.session.metric,
            &state.colors,
        ));
        events.extend(charts::segment_chart(
            &mut cols[1],
            dash,
            state.session.analysis,
            &state.colors,
        ));
    });
    for event in events {
        state.handle(event);
    }

    // ---- Detailed table ----
    egui::CollapsingHeader::new("View Detailed Data")
        .default_open(false)
        .show(ui, |ui: &mut Ui| records_table(ui, &dash.view));

    // ---- Exports ----
    ui.add_space(8.0);
    ui.heading("Export & Share");
    ui.horizontal(|ui: &mut Ui| {
        for (label, kind) in [
            ("Export Raw Data", ExportKind::RawData),
            ("Export Summary Report", ExportKind::Summary),
            ("Export Segment Analysis", ExportKind::Segments),
        ] {
            if ui.button(label).clicked() {
                panels::save_dialog(state, kind);
            }
        }
    });
}

fn records_table(ui: &mut Ui, view: &FilteredView) {
    let rows = view.sorted_by_date_desc();
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(320.0)
        .columns(Column::auto().at_least(80.0), REQUIRED_COLUMNS.len())
        .header(20.0, |mut header| {
            for name in REQUIRED_COLUMNS {
                header.col(|ui: &mut Ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let r = rows[row.index()];
                row.col(|ui: &mut Ui| {
                    ui.label(r.date.format("%Y-%m-%d").to_string());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(r.visitors.to_string());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(r.orders.to_string());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format_revenue(r.revenue));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(&r.segment);
                });
            });
        });
}

// ---------------------------------------------------------------------------
// Welcome page
// ---------------------------------------------------------------------------

fn welcome(ui: &mut Ui) {
    ui.heading("Welcome to QuickShop Analytics!");
    ui.add_space(8.0);
    ui.strong("Option 1: Try with sample data");
    ui.label("Choose \"Use Sample Data\" in the side panel to explore 30 days of e-commerce data.");
    ui.add_space(4.0);
    ui.strong("Option 2: Upload your own data");
    ui.label(format!(
        "Choose \"Upload File\" and open a CSV with the columns: {}.",
        REQUIRED_COLUMNS.join(", ")
    ));
    ui.add_space(8.0);

    egui::CollapsingHeader::new("Preview: Expected Data Format")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let mut preview = load_sample();
            preview.records.truncate(5);
            records_table(ui, &FilteredView { records: preview.records });
        });
}
