use serde::Serialize;

use crate::models::{RiskCategory, ScoredCustomer};

/// Aggregate view over one scored snapshot of the customer base.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioStats {
    pub total_customers: usize,
    pub high_risk_count: usize,
    pub medium_risk_count: usize,
    pub low_risk_count: usize,
    pub total_revenue: f64,
    pub at_risk_revenue: f64,
    pub average_probability: f64,
}

impl PortfolioStats {
    pub fn from_scored(scored: &[ScoredCustomer]) -> Self {
        let mut stats = PortfolioStats {
            total_customers: scored.len(),
            ..Self::default()
        };
        let mut probability_sum = 0.0;

        for customer in scored {
            stats.total_revenue += customer.record.total_spent;
            probability_sum += customer.score.probability;
            match customer.score.category {
                RiskCategory::High => {
                    stats.high_risk_count += 1;
                    stats.at_risk_revenue += customer.record.total_spent;
                }
                RiskCategory::Medium => stats.medium_risk_count += 1,
                RiskCategory::Low => stats.low_risk_count += 1,
            }
        }

        if stats.total_customers > 0 {
            stats.average_probability = probability_sum / stats.total_customers as f64;
        }
        stats
    }

    pub fn count_for(&self, category: RiskCategory) -> usize {
        match category {
            RiskCategory::High => self.high_risk_count,
            RiskCategory::Medium => self.medium_risk_count,
            RiskCategory::Low => self.low_risk_count,
        }
    }

    /// Share of customers in the High category, as a percentage.
    pub fn churn_rate(&self) -> f64 {
        percentage(self.high_risk_count as f64, self.total_customers as f64)
    }

    /// Share of revenue held by High-risk customers, as a percentage.
    pub fn at_risk_share(&self) -> f64 {
        percentage(self.at_risk_revenue, self.total_revenue)
    }
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Renders a dollar amount with thousands separators, e.g. `$12,345.60`.
pub fn format_currency(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (whole, cents) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}
