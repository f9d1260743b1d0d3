use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use churn_early_warning::ingest::read_customers_csv;
use churn_early_warning::risk::churn_reasons;
use churn_early_warning::sample::{sample_customers, write_customers_csv};
use churn_early_warning::{report, QueryInterpreter, RiskCategory, Scorer, ScoringConfig};

mod db;

#[derive(Parser)]
#[command(name = "churn-early-warning")]
#[command(about = "Customer churn risk scoring and data questions", long_about = None)]
struct Cli {
    /// Scoring configuration file (JSON); defaults apply when omitted
    #[arg(long, global = true, env = "CHURN_SCORING_CONFIG")]
    config: Option<PathBuf>,
    /// Reference date for recency, YYYY-MM-DD (defaults to today, UTC)
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load the demo customer set
    Seed,
    /// Import customers from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Score every customer, highest risk first
    Score {
        #[arg(long)]
        category: Option<RiskCategory>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show the factor breakdown for one customer
    Customer { id: i64 },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "churn_report.md")]
        out: PathBuf,
    },
    /// Ask a question about the customer base
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
        /// Print the full response object as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a synthetic customer CSV
    Sample {
        #[arg(long, default_value_t = 50)]
        count: usize,
        #[arg(long, default_value = "sample_customers.csv")]
        out: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries command output; logs go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

fn reference_date(cli: &Cli) -> NaiveDate {
    cli.as_of.unwrap_or_else(|| Utc::now().date_naive())
}

fn build_scorer(cli: &Cli) -> anyhow::Result<Scorer> {
    let config = ScoringConfig::load_or_default(cli.config.as_deref())?;
    let as_of = reference_date(cli);
    tracing::info!(
        %as_of,
        config = ?cli.config,
        high = config.thresholds.high,
        medium = config.thresholds.medium,
        "scoring configuration ready"
    );
    Ok(Scorer::new(config, as_of))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    run(Cli::parse()).await
}

// Only the commands that score load the scoring config.
async fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            let written = db::seed(&pool, reference_date(&cli)).await?;
            println!("Seeded {written} customers.");
        }
        Commands::Import { csv } => {
            let batch = read_customers_csv(csv)
                .with_context(|| format!("failed to import {}", csv.display()))?;
            for rejected in &batch.rejected {
                println!("Skipped line {}: {}", rejected.line, rejected.error);
            }

            let pool = connect().await?;
            let written = db::insert_customers(&pool, &batch.records, Uuid::new_v4()).await?;
            println!(
                "Imported {written} customers from {} ({} rows skipped).",
                csv.display(),
                batch.rejected.len()
            );
        }
        Commands::Score { category, limit } => {
            let scorer = build_scorer(&cli)?;
            let pool = connect().await?;
            let customers = db::fetch_customers(&pool).await?;
            let scored = scorer.score_all(&customers);

            let selected: Vec<_> = scored
                .iter()
                .filter(|customer| category.map_or(true, |wanted| customer.score.category == wanted))
                .take(*limit)
                .collect();

            if selected.is_empty() {
                println!("No customers match.");
                return Ok(());
            }

            println!("Customers by churn probability:");
            for customer in selected {
                println!(
                    "- #{} {} ({}) {:.1}% {}",
                    customer.record.id,
                    customer.record.name,
                    customer.record.email,
                    customer.score.probability * 100.0,
                    customer.score.category
                );
            }
        }
        Commands::Customer { id } => {
            let scorer = build_scorer(&cli)?;
            let pool = connect().await?;
            let Some(customer) = db::fetch_customer(&pool, *id).await? else {
                println!("Customer with ID {id} not found.");
                return Ok(());
            };

            let score = scorer.score(&customer);
            println!(
                "{} ({}) churn probability {:.1}% [{}]",
                customer.name,
                customer.email,
                score.probability * 100.0,
                score.category
            );
            println!("Factors:");
            for factor in &score.factors {
                println!(
                    "- {:<15} sub-score {:.2} x weight {:.2} = {:.3}",
                    factor.factor.label(),
                    factor.sub_score,
                    factor.weight,
                    factor.contribution
                );
            }

            let reasons = churn_reasons(&score.signals);
            if !reasons.is_empty() {
                println!("Reasons:");
                for reason in reasons {
                    println!("- {}: {} ({:?} impact)", reason.factor, reason.description, reason.impact);
                }
            }
        }
        Commands::Report { out } => {
            let scorer = build_scorer(&cli)?;
            let pool = connect().await?;
            let customers = db::fetch_customers(&pool).await?;
            let scored = scorer.score_all(&customers);
            let report = report::build_report(scorer.as_of(), &scored);
            std::fs::write(out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Ask { question, json } => {
            let scorer = build_scorer(&cli)?;
            let pool = connect().await?;
            let customers = db::fetch_customers(&pool).await?;
            let scored = scorer.score_all(&customers);

            let response = QueryInterpreter::default().interpret(&question.join(" "), &scored);
            if *json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", response.text);
            }
        }
        Commands::Sample { count, out } => {
            let customers = sample_customers(*count, reference_date(&cli));
            let file = std::fs::File::create(out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            write_customers_csv(file, &customers)?;
            println!("Wrote {} sample customers to {}.", customers.len(), out.display());
        }
    }

    Ok(())
}
