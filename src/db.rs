use anyhow::Context;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use churn_early_warning::models::CustomerRecord;
use churn_early_warning::sample::sample_customers;

const SEED_CUSTOMERS: usize = 24;

const CUSTOMER_COLUMNS: &str = "id, full_name, email, phone, registration_date, \
     last_transaction_date, transaction_count, total_spent, engagement_score, support_tickets";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool, as_of: NaiveDate) -> anyhow::Result<usize> {
    let customers = sample_customers(SEED_CUSTOMERS, as_of);
    insert_customers(pool, &customers, Uuid::new_v4()).await
}

/// Upserts customers keyed by email; returns how many rows were written.
pub async fn insert_customers(
    pool: &PgPool,
    customers: &[CustomerRecord],
    batch: Uuid,
) -> anyhow::Result<usize> {
    let mut tx = pool.begin().await?;
    let mut written = 0usize;

    for customer in customers {
        let transaction_count = i32::try_from(customer.transaction_count)
            .context("transaction_count out of range")?;
        let support_tickets =
            i32::try_from(customer.support_tickets).context("support_tickets out of range")?;

        let result = sqlx::query(
            r#"
            INSERT INTO churn_early_warning.customers
            (full_name, email, phone, registration_date, last_transaction_date,
             transaction_count, total_spent, engagement_score, support_tickets, import_batch)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                phone = EXCLUDED.phone,
                registration_date = EXCLUDED.registration_date,
                last_transaction_date = EXCLUDED.last_transaction_date,
                transaction_count = EXCLUDED.transaction_count,
                total_spent = EXCLUDED.total_spent,
                engagement_score = EXCLUDED.engagement_score,
                support_tickets = EXCLUDED.support_tickets,
                import_batch = EXCLUDED.import_batch,
                updated_at = now()
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(customer.phone.as_deref())
        .bind(customer.registration_date)
        .bind(customer.last_transaction_date)
        .bind(transaction_count)
        .bind(customer.total_spent)
        .bind(customer.engagement_score)
        .bind(support_tickets)
        .bind(batch)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to store customer {}", customer.email))?;

        if result.rows_affected() > 0 {
            written += 1;
        }
    }

    tx.commit().await?;
    tracing::info!(%batch, written, "customers stored");
    Ok(written)
}

pub async fn fetch_customers(pool: &PgPool) -> anyhow::Result<Vec<CustomerRecord>> {
    let query = format!("SELECT {CUSTOMER_COLUMNS} FROM churn_early_warning.customers ORDER BY id");
    let rows = sqlx::query(&query).fetch_all(pool).await?;

    let mut customers = Vec::with_capacity(rows.len());
    for row in rows {
        customers.push(customer_from_row(&row)?);
    }

    tracing::debug!(count = customers.len(), "customers loaded");
    Ok(customers)
}

pub async fn fetch_customer(pool: &PgPool, id: i64) -> anyhow::Result<Option<CustomerRecord>> {
    let query = format!("SELECT {CUSTOMER_COLUMNS} FROM churn_early_warning.customers WHERE id = $1");
    let row = sqlx::query(&query).bind(id).fetch_optional(pool).await?;
    row.as_ref().map(customer_from_row).transpose()
}

fn customer_from_row(row: &PgRow) -> anyhow::Result<CustomerRecord> {
    let id: i64 = row.get("id");
    let transaction_count: i32 = row.get("transaction_count");
    let support_tickets: i32 = row.get("support_tickets");

    Ok(CustomerRecord {
        id,
        name: row.get("full_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        registration_date: row.get("registration_date"),
        last_transaction_date: row.get("last_transaction_date"),
        transaction_count: u32::try_from(transaction_count)
            .with_context(|| format!("customer {id} has a negative transaction_count"))?,
        total_spent: row.get("total_spent"),
        engagement_score: row.get("engagement_score"),
        support_tickets: u32::try_from(support_tickets)
            .with_context(|| format!("customer {id} has a negative support_tickets"))?,
    })
}
