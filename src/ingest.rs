//! CSV ingestion and validation.
//!
//! Rows that are malformed, lack an email, or would hand the scorer
//! negative, non-numeric or out-of-range values are rejected here, so
//! everything past this point can assume validated input.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{CustomerRecord, NEUTRAL_ENGAGEMENT};

pub const REQUIRED_COLUMNS: [&str; 2] = ["name", "email"];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("failed to read customer csv: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("malformed row: {0}")]
    Malformed(String),

    #[error("email is required")]
    MissingEmail,

    #[error("{column} is not a number: {value:?}")]
    NotANumber { column: &'static str, value: String },

    #[error("{column} must not be negative: {value}")]
    Negative { column: &'static str, value: String },

    #[error("engagement_score must be between 0 and 100: {0}")]
    EngagementRange(f64),

    #[error("{column} is not a date: {value:?}")]
    InvalidDate { column: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// 1-based line in the source file, header included.
    pub line: usize,
    pub error: RowError,
}

#[derive(Debug, Default)]
pub struct ImportBatch {
    /// Accepted customers. Identifiers are 0; the record store assigns them.
    pub records: Vec<CustomerRecord>,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvRow {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    registration_date: Option<String>,
    last_transaction_date: Option<String>,
    transaction_count: Option<String>,
    total_spent: Option<String>,
    engagement_score: Option<String>,
    support_tickets: Option<String>,
}

pub fn read_customers_csv(path: &Path) -> Result<ImportBatch, IngestError> {
    let reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    read_customers(reader)
}

pub fn read_customers_from<R: Read>(input: R) -> Result<ImportBatch, IngestError> {
    let reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    read_customers(reader)
}

fn read_customers<R: Read>(mut reader: csv::Reader<R>) -> Result<ImportBatch, IngestError> {
    let headers: csv::StringRecord = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_ascii_lowercase())
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|header| header == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns(missing));
    }
    reader.set_headers(headers);

    let mut batch = ImportBatch::default();
    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = index + 2;
        let row = match result {
            Ok(row) => Ok(row),
            Err(error) if matches!(error.kind(), csv::ErrorKind::Io(_)) => return Err(error.into()),
            Err(error) => Err(RowError::Malformed(error.to_string())),
        };
        match row.and_then(clean_row) {
            Ok(record) => batch.records.push(record),
            Err(error) => {
                tracing::warn!(line, %error, "rejecting customer row");
                batch.rejected.push(RejectedRow { line, error });
            }
        }
    }

    tracing::info!(
        accepted = batch.records.len(),
        rejected = batch.rejected.len(),
        "customer csv parsed"
    );
    Ok(batch)
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn clean_row(row: CsvRow) -> Result<CustomerRecord, RowError> {
    let name = present(row.name).unwrap_or_else(|| "Unknown".to_string());
    // Email is the upsert key downstream.
    let email = present(row.email)
        .map(|email| email.to_lowercase())
        .ok_or(RowError::MissingEmail)?;

    let engagement_score = match present(row.engagement_score) {
        Some(value) => {
            let score = parse_amount("engagement_score", &value)?;
            if score > 100.0 {
                return Err(RowError::EngagementRange(score));
            }
            score
        }
        None => NEUTRAL_ENGAGEMENT,
    };

    Ok(CustomerRecord {
        id: 0,
        name,
        email,
        phone: present(row.phone),
        registration_date: present(row.registration_date)
            .map(|value| parse_date("registration_date", &value))
            .transpose()?,
        last_transaction_date: present(row.last_transaction_date)
            .map(|value| parse_date("last_transaction_date", &value))
            .transpose()?,
        transaction_count: present(row.transaction_count)
            .map(|value| parse_count("transaction_count", &value))
            .transpose()?
            .unwrap_or(0),
        total_spent: present(row.total_spent)
            .map(|value| parse_amount("total_spent", &value))
            .transpose()?
            .unwrap_or(0.0),
        engagement_score,
        support_tickets: present(row.support_tickets)
            .map(|value| parse_count("support_tickets", &value))
            .transpose()?
            .unwrap_or(0),
    })
}

fn parse_amount(column: &'static str, value: &str) -> Result<f64, RowError> {
    let parsed: f64 = value.parse().map_err(|_| RowError::NotANumber {
        column,
        value: value.to_string(),
    })?;
    if !parsed.is_finite() {
        return Err(RowError::NotANumber {
            column,
            value: value.to_string(),
        });
    }
    if parsed < 0.0 {
        return Err(RowError::Negative {
            column,
            value: value.to_string(),
        });
    }
    Ok(parsed)
}

fn parse_count(column: &'static str, value: &str) -> Result<u32, RowError> {
    if value.starts_with('-') {
        return Err(RowError::Negative {
            column,
            value: value.to_string(),
        });
    }
    // Spreadsheets export whole numbers as "3.0".
    let whole = value.strip_suffix(".0").unwrap_or(value);
    whole.parse().map_err(|_| RowError::NotANumber {
        column,
        value: value.to_string(),
    })
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` and RFC 3339 timestamps.
pub fn parse_date(column: &'static str, value: &str) -> Result<NaiveDate, RowError> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(timestamp.date());
        }
    }
    Err(RowError::InvalidDate {
        column,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn reads_full_rows() {
        let file = create_test_csv(&[
            "Name,Email,Phone,Registration_Date,Last_Transaction_Date,Transaction_Count,Total_Spent,Engagement_Score,Support_Tickets",
            "Avery Lee, Avery.Lee@Example.com ,+1-555-100-2000,2024-05-01,2026-02-20,12,840.50,72,1",
        ]);

        let batch = read_customers_csv(file.path()).unwrap();
        assert!(batch.rejected.is_empty());
        let record = &batch.records[0];
        assert_eq!(record.name, "Avery Lee");
        assert_eq!(record.email, "avery.lee@example.com");
        assert_eq!(record.phone.as_deref(), Some("+1-555-100-2000"));
        assert_eq!(record.registration_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(record.last_transaction_date, NaiveDate::from_ymd_opt(2026, 2, 20));
        assert_eq!(record.transaction_count, 12);
        assert!((record.total_spent - 840.5).abs() < 1e-9);
        assert_eq!(record.engagement_score, 72.0);
        assert_eq!(record.support_tickets, 1);
    }

    #[test]
    fn optional_columns_default_to_neutral_values() {
        let file = create_test_csv(&["name,email", ",jules@example.com"]);

        let batch = read_customers_csv(file.path()).unwrap();
        let record = &batch.records[0];
        assert_eq!(record.name, "Unknown");
        assert_eq!(record.transaction_count, 0);
        assert_eq!(record.total_spent, 0.0);
        assert_eq!(record.engagement_score, NEUTRAL_ENGAGEMENT);
        assert_eq!(record.support_tickets, 0);
        assert!(record.last_transaction_date.is_none());
    }

    #[test]
    fn missing_required_columns_fail_the_file() {
        let file = create_test_csv(&["name,phone", "Kiara,555"]);
        match read_customers_csv(file.path()) {
            Err(IngestError::MissingColumns(columns)) => assert_eq!(columns, vec!["email"]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn invalid_rows_are_rejected_with_line_numbers() {
        let input = "name,email,total_spent,engagement_score,transaction_count,last_transaction_date\n\
                     Ok,ok@example.com,10,50,2,2026-01-01\n\
                     Neg,neg@example.com,-5,50,2,2026-01-01\n\
                     Text,text@example.com,lots,50,2,2026-01-01\n\
                     Hot,hot@example.com,10,140,2,2026-01-01\n\
                     Date,date@example.com,10,50,2,yesterday\n\
                     Count,count@example.com,10,50,-1,2026-01-01\n";

        let batch = read_customers_from(input.as_bytes()).unwrap();
        assert_eq!(batch.records.len(), 1);
        let lines: Vec<usize> = batch.rejected.iter().map(|row| row.line).collect();
        assert_eq!(lines, vec![3, 4, 5, 6, 7]);
        assert!(matches!(batch.rejected[0].error, RowError::Negative { column: "total_spent", .. }));
        assert!(matches!(batch.rejected[1].error, RowError::NotANumber { .. }));
        assert!(matches!(batch.rejected[2].error, RowError::EngagementRange(_)));
        assert!(matches!(batch.rejected[3].error, RowError::InvalidDate { .. }));
        assert!(matches!(batch.rejected[4].error, RowError::Negative { column: "transaction_count", .. }));
    }

    #[test]
    fn short_rows_are_rejected_without_failing_the_file() {
        let input = "name,email,total_spent\nA,a@x.com,10\nB,b@x.com\nC,c@x.com,5\n";

        let batch = read_customers_from(input.as_bytes()).unwrap();
        let emails: Vec<&str> = batch.records.iter().map(|r| r.email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.com", "c@x.com"]);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].line, 3);
        assert!(matches!(batch.rejected[0].error, RowError::Malformed(_)));
    }

    #[test]
    fn rows_without_email_are_rejected() {
        let input = "name,email,total_spent\n\
                     Blank,,10\n\
                     Spaces,   ,20\n\
                     Kept,kept@example.com,30\n";

        let batch = read_customers_from(input.as_bytes()).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].email, "kept@example.com");
        let rejected: Vec<(usize, RowError)> = batch
            .rejected
            .into_iter()
            .map(|row| (row.line, row.error))
            .collect();
        assert_eq!(
            rejected,
            vec![(2, RowError::MissingEmail), (3, RowError::MissingEmail)]
        );
    }

    #[test]
    fn accepts_timestamp_dates_and_float_counts() {
        let input = "name,email,last_transaction_date,transaction_count\n\
                     A,a@example.com,2026-02-01T08:26:00Z,3.0\n\
                     B,b@example.com,2026-02-02 10:15:00,4\n";

        let batch = read_customers_from(input.as_bytes()).unwrap();
        assert_eq!(batch.records[0].last_transaction_date, NaiveDate::from_ymd_opt(2026, 2, 1));
        assert_eq!(batch.records[0].transaction_count, 3);
        assert_eq!(batch.records[1].last_transaction_date, NaiveDate::from_ymd_opt(2026, 2, 2));
    }
}
