use crate::models::{MetricValues, PageInsights};

/// One metric series as the insights endpoint reports it.
#[derive(Debug, Clone)]
pub struct MetricRow {
    pub name: String,
    pub period: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightPeriod {
    Day,
    Week,
    Days28,
}

impl InsightPeriod {
    pub fn parse(period: &str) -> Option<Self> {
        match period {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "days_28" => Some(Self::Days28),
            _ => None,
        }
    }

    pub fn comparison_text(self) -> &'static str {
        match self {
            Self::Day => "from yesterday",
            Self::Week => "from last week",
            Self::Days28 => "from 28 days ago",
        }
    }
}

impl MetricValues {
    fn slot(&mut self, period: InsightPeriod) -> &mut Option<Vec<f64>> {
        match period {
            InsightPeriod::Day => &mut self.day,
            InsightPeriod::Week => &mut self.week,
            InsightPeriod::Days28 => &mut self.days_28,
        }
    }

    pub fn for_period(&self, period: InsightPeriod) -> Option<&[f64]> {
        match period {
            InsightPeriod::Day => self.day.as_deref(),
            InsightPeriod::Week => self.week.as_deref(),
            InsightPeriod::Days28 => self.days_28.as_deref(),
        }
    }
}

/// Folds metric rows into the per-metric, per-period structure. The first
/// series wins for a given (metric, period); unknown metric names and
/// periods are dropped.
pub fn fold_metrics(rows: Vec<MetricRow>) -> PageInsights {
    let mut insights = PageInsights::default();

    for row in rows {
        let Some(period) = InsightPeriod::parse(&row.period) else {
            continue;
        };
        let metric = match row.name.as_str() {
            "page_impressions_unique" => &mut insights.page_impressions_unique,
            "page_impressions_paid" => &mut insights.page_impressions_paid,
            "page_reach" => &mut insights.page_reach,
            "page_engaged_users" => &mut insights.page_engaged_users,
            _ => continue,
        };
        let slot = metric.slot(period);
        if slot.is_none() {
            *slot = Some(row.values);
        }
    }

    insights
}

/// Signed percentage change between two readings. 0 to 0 is "0%"; any
/// other division by zero has no meaningful percentage.
pub fn calculate_change(current: f64, previous: f64) -> String {
    if previous == 0.0 {
        return if current == 0.0 {
            "0%".to_string()
        } else {
            "N/A".to_string()
        };
    }
    let change = (current - previous) / previous * 100.0;
    format!("{}{:.1}%", if change >= 0.0 { "+" } else { "" }, change)
}

/// Last and second-last readings of a series, oldest-first; series shorter
/// than two readings compare as (0, 0).
pub fn comparison_values(series: Option<&[f64]>) -> (f64, f64) {
    match series {
        Some(values) if values.len() >= 2 => {
            (values[values.len() - 1], values[values.len() - 2])
        }
        _ => (0.0, 0.0),
    }
}
