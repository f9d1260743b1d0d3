use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{RiskCategory, ScoredCustomer};
use crate::risk::churn_reasons;
use crate::stats::{format_currency, PortfolioStats};

const TOP_CUSTOMERS: usize = 10;
const REASONS_PER_CUSTOMER: usize = 2;

/// Renders a markdown churn report. `scored` should be ordered by
/// probability, highest first, as [`crate::risk::Scorer::score_all`] returns it.
pub fn build_report(as_of: NaiveDate, scored: &[ScoredCustomer]) -> String {
    let stats = PortfolioStats::from_scored(scored);
    let mut output = String::new();

    let _ = writeln!(output, "# Customer Churn Report");
    let _ = writeln!(output, "Scored as of {}", as_of);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Customers: {}", stats.total_customers);
    let _ = writeln!(output, "- Churn rate: {:.1}%", stats.churn_rate());
    let _ = writeln!(
        output,
        "- Average churn probability: {:.1}%",
        stats.average_probability * 100.0
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Mix");

    if stats.total_customers == 0 {
        let _ = writeln!(output, "No customers loaded.");
    } else {
        for category in RiskCategory::ALL {
            let count = stats.count_for(category);
            let _ = writeln!(
                output,
                "- {}: {} customers ({:.1}%)",
                category,
                count,
                count as f64 / stats.total_customers as f64 * 100.0
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Customers");

    let high_risk: Vec<&ScoredCustomer> = scored
        .iter()
        .filter(|customer| customer.score.category == RiskCategory::High)
        .take(TOP_CUSTOMERS)
        .collect();

    if high_risk.is_empty() {
        let _ = writeln!(output, "No high-risk customers.");
    } else {
        for customer in high_risk {
            let reasons: Vec<String> = churn_reasons(&customer.score.signals)
                .into_iter()
                .take(REASONS_PER_CUSTOMER)
                .map(|reason| reason.description)
                .collect();
            let _ = write!(
                output,
                "- {} ({}) churn probability {:.1}%",
                customer.record.name,
                customer.record.email,
                customer.score.probability * 100.0
            );
            if reasons.is_empty() {
                let _ = writeln!(output);
            } else {
                let _ = writeln!(output, ": {}", reasons.join("; "));
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Revenue at Risk");
    let _ = writeln!(output, "- Total revenue: {}", format_currency(stats.total_revenue));
    let _ = writeln!(
        output,
        "- Held by high-risk customers: {} ({:.1}%)",
        format_currency(stats.at_risk_revenue),
        stats.at_risk_share()
    );

    output
}
