use std::io::Write;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::CustomerRecord;

const NAMES: [&str; 24] = [
    "John Smith",
    "Emma Johnson",
    "Michael Brown",
    "Sarah Davis",
    "James Wilson",
    "Emily Taylor",
    "David Anderson",
    "Jessica Martinez",
    "Robert Thomas",
    "Ashley Garcia",
    "William Rodriguez",
    "Amanda Lopez",
    "Christopher Lee",
    "Melissa White",
    "Daniel Harris",
    "Jennifer Clark",
    "Matthew Lewis",
    "Stephanie Hall",
    "Joseph Allen",
    "Rebecca Young",
    "Ryan King",
    "Laura Wright",
    "Kevin Scott",
    "Michelle Green",
];

/// Spreads `index` over `low..=high` without randomness.
fn spread(index: usize, salt: usize, low: u32, high: u32) -> u32 {
    let span = (high - low + 1) as usize;
    low + ((index * 37 + salt * 11 + 7) % span) as u32
}

/// Synthetic customers with a fixed risk mix: every fourth customer looks
/// lapsed, the next one lukewarm, the remaining two healthy.
pub fn sample_customers(count: usize, as_of: NaiveDate) -> Vec<CustomerRecord> {
    (0..count)
        .map(|index| {
            let name = NAMES[index % NAMES.len()];
            let round = index / NAMES.len();
            let handle = name.to_lowercase().replace(' ', ".");
            let email = if round == 0 {
                format!("{handle}@example.com")
            } else {
                format!("{handle}{round}@example.com")
            };

            let (transactions, spent_cents, days_since, engagement, tickets) = match index % 4 {
                0 => (
                    spread(index, 1, 0, 2),
                    spread(index, 2, 0, 10_000),
                    spread(index, 3, 120, 365),
                    spread(index, 4, 10, 30),
                    spread(index, 5, 3, 8),
                ),
                1 => (
                    spread(index, 1, 3, 8),
                    spread(index, 2, 10_000, 50_000),
                    spread(index, 3, 30, 90),
                    spread(index, 4, 40, 60),
                    spread(index, 5, 1, 3),
                ),
                _ => (
                    spread(index, 1, 10, 50),
                    spread(index, 2, 50_000, 500_000),
                    spread(index, 3, 1, 30),
                    spread(index, 4, 70, 95),
                    spread(index, 5, 0, 2),
                ),
            };

            CustomerRecord {
                id: index as i64 + 1,
                name: name.to_string(),
                email,
                phone: Some(format!(
                    "+1-555-{:03}-{:04}",
                    spread(index, 6, 100, 999),
                    spread(index, 7, 1000, 9999)
                )),
                registration_date: Some(
                    as_of - Duration::days(i64::from(spread(index, 8, 180, 730))),
                ),
                last_transaction_date: Some(as_of - Duration::days(i64::from(days_since))),
                transaction_count: transactions,
                total_spent: f64::from(spent_cents) / 100.0,
                engagement_score: f64::from(engagement),
                support_tickets: tickets,
            }
        })
        .collect()
}

#[derive(Serialize)]
struct SampleRow<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    registration_date: Option<NaiveDate>,
    last_transaction_date: Option<NaiveDate>,
    transaction_count: u32,
    total_spent: f64,
    engagement_score: f64,
    support_tickets: u32,
}

/// Writes customers in the layout accepted by the CSV importer.
pub fn write_customers_csv<W: Write>(output: W, customers: &[CustomerRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    for customer in customers {
        writer.serialize(SampleRow {
            name: &customer.name,
            email: &customer.email,
            phone: customer.phone.as_deref().unwrap_or(""),
            registration_date: customer.registration_date,
            last_transaction_date: customer.last_transaction_date,
            transaction_count: customer.transaction_count,
            total_spent: customer.total_spent,
            engagement_score: customer.engagement_score,
            support_tickets: customer.support_tickets,
        })?;
    }
    writer.flush()?;
    Ok(())
}
