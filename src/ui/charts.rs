use chrono::{Datelike, NaiveDate};
use eframe::egui::{self, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints};

use crate::color::SegmentColors;
use crate::data::aggregate::{distribution_shares, Metric};
use crate::pipeline::DashboardView;
use crate::session::{AnalysisType, SessionEvent};

const CHART_HEIGHT: f32 = 280.0;

/// Dates are plotted as days since the common era so the axis is linear.
fn date_to_x(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

fn x_to_label(x: f64) -> String {
    if x.fract() != 0.0 {
        return String::new();
    }
    NaiveDate::from_num_days_from_ce_opt(x as i32)
        .map(|d| d.format("%b %d").to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Trend chart
// ---------------------------------------------------------------------------

/// Line per segment for the chosen metric, with a metric selector above it.
/// Returns the event if the user picked another metric.
pub fn trend_chart(
    ui: &mut Ui,
    dash: &DashboardView,
    metric: Metric,
    colors: &SegmentColors,
) -> Option<SessionEvent> {
    ui.heading("Performance Trends");

    let mut chosen = metric;
    egui::ComboBox::from_id_salt("metric_selector")
        .selected_text(chosen.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for m in Metric::ALL {
                ui.selectable_value(&mut chosen, m, m.to_string());
            }
        });

    Plot::new("trend_plot")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_formatter(|mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
            x_to_label(mark.value)
        })
        .y_axis_label(metric.to_string())
        .allow_drag(true)
        .allow_zoom(true)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (segment, points) in &dash.trend {
                let points: PlotPoints = points
                    .iter()
                    .map(|(date, value)| [date_to_x(*date), *value])
                    .collect();
                plot_ui.line(
                    Line::new(points)
                        .name(segment)
                        .color(colors.color_for(segment))
                        .width(2.0),
                );
            }
        });

    (chosen != metric).then_some(SessionEvent::SetMetric(chosen))
}

// ---------------------------------------------------------------------------
// Segment chart
// ---------------------------------------------------------------------------

/// Visitor share or conversion rate per segment, as bars.
pub fn segment_chart(
    ui: &mut Ui,
    dash: &DashboardView,
    analysis: AnalysisType,
    colors: &SegmentColors,
) -> Option<SessionEvent> {
    ui.heading("Segment Analysis");

    let mut chosen = analysis;
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Analysis type:");
        ui.selectable_value(&mut chosen, AnalysisType::Distribution, "Distribution");
        ui.selectable_value(&mut chosen, AnalysisType::Performance, "Performance");
    });

    let (title, values): (&str, Vec<(String, f64)>) = match analysis {
        AnalysisType::Distribution => (
            "Visitor Distribution by Segment (%)",
            distribution_shares(&dash.distribution).into_iter().collect(),
        ),
        AnalysisType::Performance => (
            "Conversion Rate by Segment (%)",
            dash.segment_summary
                .iter()
                .map(|s| (s.segment.clone(), s.conversion_rate))
                .collect(),
        ),
    };

    let bars: Vec<Bar> = values
        .iter()
        .enumerate()
        .map(|(i, (segment, value))| {
            Bar::new(i as f64, *value)
                .name(format!("{segment}: {value:.1}%"))
                .fill(colors.color_for(segment))
                .width(0.6)
        })
        .collect();
    let labels: Vec<String> = values.into_iter().map(|(segment, _)| segment).collect();

    ui.label(title);
    Plot::new("segment_plot")
        .height(CHART_HEIGHT)
        .x_axis_formatter(move |mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
            let x = mark.value;
            if x < 0.0 || x.fract() != 0.0 {
                return String::new();
            }
            labels.get(x as usize).cloned().unwrap_or_default()
        })
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name(title));
        });

    (chosen != analysis).then_some(SessionEvent::SetAnalysis(chosen))
}
