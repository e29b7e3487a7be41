//! Display strings for KPI values, shared by the dashboard cards and the
//! summary export so both always agree.

use super::aggregate::KpiSet;

/// Insert `,` every three digits of an unsigned integer string.
fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1234567` → `"1,234,567"`.
pub fn format_count(n: u64) -> String {
    group_digits(&n.to_string())
}

/// `$`-prefixed amount with grouped thousands and a fixed number of decimals.
pub fn format_money(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };
    let sign = if value < 0.0 && text.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}${}.{f}", group_digits(int_part)),
        None => format!("{sign}${}", group_digits(int_part)),
    }
}

/// Whole amounts print without decimals, anything else with cents.
pub fn format_revenue(value: f64) -> String {
    if value.fract() == 0.0 {
        format_money(value, 0)
    } else {
        format_money(value, 2)
    }
}

/// One decimal place, e.g. `"13.3%"`.
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// Cents precision without grouping, e.g. `"$100.00"`.
pub fn format_aov(value: f64) -> String {
    format!("${value:.2}")
}

// ---------------------------------------------------------------------------
// KPI cards
// ---------------------------------------------------------------------------

/// A headline number with a secondary delta line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KpiCard {
    pub label: &'static str,
    pub value: String,
    pub delta: String,
}

/// The four dashboard cards: visitors, orders, revenue, conversion.
pub fn kpi_cards(kpis: &KpiSet) -> [KpiCard; 4] {
    let per_day = |avg: Option<f64>| match avg {
        Some(v) => format!("{v:.0} avg/day"),
        None => "n/a".to_string(),
    };

    [
        KpiCard {
            label: "Total Visitors",
            value: format_count(kpis.total_visitors),
            delta: per_day(kpis.avg_daily_visitors),
        },
        KpiCard {
            label: "Total Orders",
            value: format_count(kpis.total_orders),
            delta: per_day(kpis.avg_daily_orders),
        },
        KpiCard {
            label: "Total Revenue",
            value: format_revenue(kpis.total_revenue),
            delta: match kpis.avg_daily_revenue {
                Some(v) => format!("{} avg/day", format_money(v, 0)),
                None => "n/a".to_string(),
            },
        },
        KpiCard {
            label: "Conversion Rate",
            value: format_percent(kpis.conversion_rate),
            delta: format!("${:.0} AOV", kpis.avg_order_value),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn money() {
        assert_eq!(format_revenue(4000.0), "$4,000");
        assert_eq!(format_revenue(1234.5), "$1,234.50");
        assert_eq!(format_money(-1500.0, 0), "-$1,500");
        assert_eq!(format_money(-0.001, 2), "$0.00");
        assert_eq!(format_aov(100.0), "$100.00");
        assert_eq!(format_percent(13.3333), "13.3%");
    }

    #[test]
    fn cards_from_kpis() {
        let kpis = KpiSet {
            total_visitors: 300,
            total_orders: 40,
            total_revenue: 4000.0,
            avg_daily_visitors: Some(150.0),
            avg_daily_orders: Some(20.0),
            avg_daily_revenue: Some(2000.0),
            conversion_rate: 40.0 / 300.0 * 100.0,
            avg_order_value: 100.0,
        };
        let cards = kpi_cards(&kpis);
        assert_eq!(cards[0].value, "300");
        assert_eq!(cards[0].delta, "150 avg/day");
        assert_eq!(cards[2].value, "$4,000");
        assert_eq!(cards[2].delta, "$2,000 avg/day");
        assert_eq!(cards[3].value, "13.3%");
        assert_eq!(cards[3].delta, "$100 AOV");
    }
}
