use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use super::filter::FilteredView;
use super::model::Record;

// ---------------------------------------------------------------------------
// Ratios
// ---------------------------------------------------------------------------

/// Orders per hundred visitors; zero when there were no visitors.
pub fn conversion_rate(orders: u64, visitors: u64) -> f64 {
    if visitors > 0 {
        orders as f64 / visitors as f64 * 100.0
    } else {
        0.0
    }
}

/// Revenue per order; zero when there were no orders.
pub fn average_order_value(revenue: f64, orders: u64) -> f64 {
    if orders > 0 {
        revenue / orders as f64
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// KpiSet
// ---------------------------------------------------------------------------

/// Scalar metrics over a filtered view. Values are stored unrounded;
/// rounding happens when they are formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiSet {
    pub total_visitors: u64,
    pub total_orders: u64,
    pub total_revenue: f64,
    /// Per-row means. `None` on an empty view.
    pub avg_daily_visitors: Option<f64>,
    pub avg_daily_orders: Option<f64>,
    pub avg_daily_revenue: Option<f64>,
    /// Percentage, 0–100 for well-formed data.
    pub conversion_rate: f64,
    pub avg_order_value: f64,
}

/// Count totals saturate at `u64::MAX`; the loader rejects datasets whose
/// totals would get there.
pub fn compute_kpis(view: &FilteredView) -> KpiSet {
    let total_visitors = saturating_total(view.records.iter().map(|r| r.visitors));
    let total_orders = saturating_total(view.records.iter().map(|r| r.orders));
    let total_revenue: f64 = view.records.iter().map(|r| r.revenue).sum();

    let n = view.len();
    let mean = |total: f64| (n > 0).then(|| total / n as f64);

    KpiSet {
        total_visitors,
        total_orders,
        total_revenue,
        avg_daily_visitors: mean(total_visitors as f64),
        avg_daily_orders: mean(total_orders as f64),
        avg_daily_revenue: mean(total_revenue),
        conversion_rate: conversion_rate(total_orders, total_visitors),
        avg_order_value: average_order_value(total_revenue, total_orders),
    }
}

fn saturating_total(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

// ---------------------------------------------------------------------------
// Per-segment grouping
// ---------------------------------------------------------------------------

/// Summed metrics for one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSummary {
    pub segment: String,
    pub visitors: u64,
    pub orders: u64,
    pub revenue: f64,
    /// Unrounded percentage; the segment export rounds it.
    pub conversion_rate: f64,
}

/// One entry per segment present in the view, ordered by segment label.
pub fn compute_segment_summary(view: &FilteredView) -> Vec<SegmentSummary> {
    let mut groups: BTreeMap<&str, (u64, u64, f64)> = BTreeMap::new();
    for r in &view.records {
        let entry = groups.entry(r.segment.as_str()).or_insert((0, 0, 0.0));
        entry.0 = entry.0.saturating_add(r.visitors);
        entry.1 = entry.1.saturating_add(r.orders);
        entry.2 += r.revenue;
    }

    groups
        .into_iter()
        .map(|(segment, (visitors, orders, revenue))| SegmentSummary {
            segment: segment.to_string(),
            visitors,
            orders,
            revenue,
            conversion_rate: conversion_rate(orders, visitors),
        })
        .collect()
}

/// Total visitors per segment.
pub fn compute_segment_distribution(view: &FilteredView) -> BTreeMap<String, u64> {
    let mut dist = BTreeMap::new();
    for r in &view.records {
        let total = dist.entry(r.segment.clone()).or_insert(0u64);
        *total = total.saturating_add(r.visitors);
    }
    dist
}

/// Each segment's share of the distribution total, in percent.
pub fn distribution_shares(dist: &BTreeMap<String, u64>) -> BTreeMap<String, f64> {
    let total = saturating_total(dist.values().copied());
    dist.iter()
        .map(|(segment, &visitors)| {
            let share = if total > 0 {
                visitors as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            (segment.clone(), share)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Trend series
// ---------------------------------------------------------------------------

/// Metric plotted by the trend chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    #[default]
    Revenue,
    Visitors,
    Orders,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Revenue, Metric::Visitors, Metric::Orders];

    pub fn value(self, record: &Record) -> f64 {
        match self {
            Metric::Revenue => record.revenue,
            Metric::Visitors => record.visitors as f64,
            Metric::Orders => record.orders as f64,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Metric::Revenue => "Revenue",
            Metric::Visitors => "Visitors",
            Metric::Orders => "Orders",
        };
        f.write_str(label)
    }
}

/// Per-segment `(date, value)` points, each series sorted by date.
pub fn trend_series(view: &FilteredView, metric: Metric) -> BTreeMap<String, Vec<(NaiveDate, f64)>> {
    let mut series: BTreeMap<String, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for r in &view.records {
        series
            .entry(r.segment.clone())
            .or_default()
            .push((r.date, metric.value(r)));
    }
    for points in series.values_mut() {
        points.sort_by_key(|(date, _)| *date);
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, visitors: u64, orders: u64, revenue: f64, segment: &str) -> Record {
        Record {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            visitors,
            orders,
            revenue,
            segment: segment.to_string(),
        }
    }

    fn two_day_view() -> FilteredView {
        FilteredView {
            records: vec![
                record("2024-01-01", 100, 10, 1000.0, "Mobile"),
                record("2024-01-02", 200, 30, 3000.0, "Desktop"),
            ],
        }
    }

    #[test]
    fn kpis_for_two_rows() {
        let k = compute_kpis(&two_day_view());
        assert_eq!(k.total_visitors, 300);
        assert_eq!(k.total_orders, 40);
        assert_eq!(k.total_revenue, 4000.0);
        assert!((k.conversion_rate - 13.333_333).abs() < 1e-4);
        assert_eq!(k.avg_order_value, 100.0);
        assert_eq!(k.avg_daily_visitors, Some(150.0));
        assert_eq!(k.avg_daily_orders, Some(20.0));
        assert_eq!(k.avg_daily_revenue, Some(2000.0));
    }

    #[test]
    fn kpis_on_empty_view_are_zero() {
        let k = compute_kpis(&FilteredView::default());
        assert_eq!(k.total_visitors, 0);
        assert_eq!(k.total_orders, 0);
        assert_eq!(k.total_revenue, 0.0);
        assert_eq!(k.conversion_rate, 0.0);
        assert_eq!(k.avg_order_value, 0.0);
        assert_eq!(k.avg_daily_visitors, None);
    }

    #[test]
    fn zero_visitors_and_orders_are_guarded() {
        let view = FilteredView {
            records: vec![record("2024-01-01", 0, 0, 0.0, "Mobile")],
        };
        let k = compute_kpis(&view);
        assert_eq!(k.conversion_rate, 0.0);
        assert_eq!(k.avg_order_value, 0.0);

        let summary = compute_segment_summary(&view);
        assert_eq!(summary[0].conversion_rate, 0.0);
    }

    #[test]
    fn segment_summary_partitions_totals() {
        let mut view = two_day_view();
        view.records.push(record("2024-01-03", 50, 5, 500.0, "Mobile"));

        let summary = compute_segment_summary(&view);
        let labels: Vec<_> = summary.iter().map(|s| s.segment.as_str()).collect();
        assert_eq!(labels, vec!["Desktop", "Mobile"]);

        let mobile = &summary[1];
        assert_eq!(mobile.visitors, 150);
        assert_eq!(mobile.orders, 15);
        assert_eq!(mobile.revenue, 1500.0);
        assert_eq!(mobile.conversion_rate, 10.0);

        let kpis = compute_kpis(&view);
        let visitors: u64 = summary.iter().map(|s| s.visitors).sum();
        assert_eq!(visitors, kpis.total_visitors);
    }

    #[test]
    fn totals_saturate_instead_of_wrapping() {
        let view = FilteredView {
            records: vec![
                record("2024-01-01", u64::MAX, u64::MAX, 1.0, "Mobile"),
                record("2024-01-02", 5, 5, 1.0, "Mobile"),
            ],
        };
        let k = compute_kpis(&view);
        assert_eq!(k.total_visitors, u64::MAX);
        assert_eq!(k.total_orders, u64::MAX);

        let summary = compute_segment_summary(&view);
        assert_eq!(summary[0].visitors, u64::MAX);

        let dist = compute_segment_distribution(&view);
        assert_eq!(dist["Mobile"], u64::MAX);
        assert_eq!(distribution_shares(&dist)["Mobile"], 100.0);
    }

    #[test]
    fn distribution_and_shares() {
        let dist = compute_segment_distribution(&two_day_view());
        assert_eq!(dist.get("Mobile"), Some(&100));
        assert_eq!(dist.get("Desktop"), Some(&200));

        let shares = distribution_shares(&dist);
        assert!((shares["Desktop"] - 66.666_666).abs() < 1e-4);
        assert!((shares["Mobile"] - 33.333_333).abs() < 1e-4);
        assert!(distribution_shares(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn trend_series_groups_and_sorts() {
        let view = FilteredView {
            records: vec![
                record("2024-01-03", 30, 3, 300.0, "Mobile"),
                record("2024-01-01", 10, 1, 100.0, "Mobile"),
                record("2024-01-02", 20, 2, 200.0, "Desktop"),
            ],
        };
        let series = trend_series(&view, Metric::Orders);
        assert_eq!(series.len(), 2);
        let mobile: Vec<f64> = series["Mobile"].iter().map(|(_, v)| *v).collect();
        assert_eq!(mobile, vec![1.0, 3.0]);
        assert_eq!(Metric::Revenue.to_string(), "Revenue");
    }
}
